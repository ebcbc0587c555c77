//! Platformer character specialization.
//!
//! A layered state machine over the kinematic body: it owns timers and
//! input shaping, computes a target velocity and gravity modifier each
//! tick, and leaves the actual movement to the motion world. This is the
//! reference client contract for the motion core.

use glam::Vec2;

use crate::motion::{ConfigError, KinematicBody, MotionConfig};

/// Platformer movement state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformerState {
    Idle,
    Walking,
    Running,
    Dashing,
    Jumping,
    WallJumping,
    Falling,
    WallSliding,
    /// Moving along a grabbed wall; sign of the climb axis picks the
    /// direction.
    Climbing,
    /// Holding onto a wall without moving.
    Grabbing,
}

/// How the jump-height pair maps onto gravity shaping.
///
/// Both modes express a variable button-hold jump from one
/// `(min_height, max_height)` pair without re-deriving physics per press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpMode {
    /// Normal gravity while rising; amplified once the button is released
    /// short of max height.
    Fast,
    /// Reduced gravity while the button is held; normal once released.
    Slow,
}

/// Tunables for the platformer state machine.
#[derive(Debug, Clone)]
pub struct PlatformerConfig {
    pub walk_speed: f32,
    pub run_speed: f32,
    /// Horizontal acceleration on the ground.
    pub acceleration: f32,
    /// Horizontal acceleration while airborne.
    pub air_acceleration: f32,
    /// Apex height of a tap jump.
    pub min_jump_height: f32,
    /// Apex height of a fully held jump.
    pub max_jump_height: f32,
    pub jump_mode: JumpMode,
    /// A jump press this long before becoming able to jump still registers.
    pub jump_buffer_time: f32,
    /// Grace window after leaving the ground during which a jump still
    /// counts as grounded.
    pub coyote_time: f32,
    pub dash_speed: f32,
    pub dash_duration: f32,
    pub dash_cooldown: f32,
    /// Maximum fall speed while sliding down a wall.
    pub wall_slide_speed: f32,
    /// Horizontal kick applied by a wall jump.
    pub wall_jump_speed: f32,
    /// How long a wall grab can be held before stamina runs out.
    pub wall_grab_duration: f32,
    pub climb_speed: f32,
}

impl Default for PlatformerConfig {
    fn default() -> Self {
        Self {
            walk_speed: 4.0,
            run_speed: 7.0,
            acceleration: 40.0,
            air_acceleration: 20.0,
            min_jump_height: 1.0,
            max_jump_height: 3.0,
            jump_mode: JumpMode::Fast,
            jump_buffer_time: 0.1,
            coyote_time: 0.1,
            dash_speed: 14.0,
            dash_duration: 0.15,
            dash_cooldown: 0.4,
            wall_slide_speed: 2.0,
            wall_jump_speed: 6.0,
            wall_grab_duration: 2.0,
            climb_speed: 3.0,
        }
    }
}

impl PlatformerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_jump_height <= 0.0 || self.min_jump_height > self.max_jump_height {
            return Err(ConfigError::JumpHeights {
                min: self.min_jump_height,
                max: self.max_jump_height,
            });
        }
        Ok(())
    }
}

/// Per-tick input command for one character.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformerInput {
    /// Horizontal axis, -1..1.
    pub move_x: f32,
    /// Climb axis while grabbing, -1..1.
    pub move_y: f32,
    pub run_held: bool,
    /// Edge-triggered jump press.
    pub jump_pressed: bool,
    pub jump_held: bool,
    pub dash_pressed: bool,
    pub grab_held: bool,
}

/// Platformer character component. Pair it with a [`KinematicBody`] and
/// feed `input` each frame before stepping.
#[derive(Debug)]
pub struct Platformer {
    pub config: PlatformerConfig,
    pub state: PlatformerState,
    pub input: PlatformerInput,
    /// Last non-zero horizontal direction, -1 or 1.
    pub facing: f32,
    jump_buffer: f32,
    dash_timer: f32,
    dash_cooldown_timer: f32,
    dash_direction: f32,
    grab_timer: f32,
    /// True between jump start and apex.
    rising: bool,
}

impl Platformer {
    pub fn new(config: PlatformerConfig) -> Self {
        Self {
            config,
            state: PlatformerState::Idle,
            input: PlatformerInput::default(),
            facing: 1.0,
            jump_buffer: 0.0,
            dash_timer: 0.0,
            dash_cooldown_timer: 0.0,
            dash_direction: 1.0,
            grab_timer: 0.0,
            rising: false,
        }
    }

    /// Initial vertical speed for a jump, from `v0 = sqrt(2 g h)` against
    /// the gravity that will act while rising, plus a half-step of that
    /// gravity to compensate the discrete integrator applying gravity
    /// before the first displacement.
    fn jump_velocity(&self, gravity: f32, dt: f32) -> f32 {
        let cfg = &self.config;
        let (height, rise_modifier) = match cfg.jump_mode {
            JumpMode::Fast => (cfg.max_jump_height, 1.0),
            JumpMode::Slow => (
                cfg.max_jump_height,
                cfg.min_jump_height / cfg.max_jump_height,
            ),
        };
        let g = gravity * rise_modifier;
        (2.0 * g * height).sqrt() + 0.5 * g * dt
    }

    /// Gravity modifier while rising, depending on whether the button is
    /// still held.
    fn rise_gravity_modifier(&self) -> f32 {
        let cfg = &self.config;
        match cfg.jump_mode {
            JumpMode::Fast => {
                if self.input.jump_held {
                    1.0
                } else {
                    cfg.max_jump_height / cfg.min_jump_height
                }
            }
            JumpMode::Slow => {
                if self.input.jump_held {
                    cfg.min_jump_height / cfg.max_jump_height
                } else {
                    1.0
                }
            }
        }
    }

    /// Advance timers and state, writing the tick's velocity and gravity
    /// commands into `body`.
    pub fn update(&mut self, body: &mut KinematicBody, gravity: Vec2, dt: f32) {
        let input = self.input;
        let g = -gravity.y;

        self.dash_cooldown_timer = (self.dash_cooldown_timer - dt).max(0.0);
        if input.jump_pressed {
            self.jump_buffer = self.config.jump_buffer_time;
        } else {
            self.jump_buffer = (self.jump_buffer - dt).max(0.0);
        }
        if input.move_x.abs() > 0.01 {
            self.facing = input.move_x.signum();
        }
        if body.grounded {
            self.grab_timer = 0.0;
            if body.velocity.y <= 0.0 {
                self.rising = false;
            }
        } else if body.velocity.y <= 0.0 {
            self.rising = false;
        }

        // An active dash overrides everything until it runs out.
        if self.state == PlatformerState::Dashing {
            self.dash_timer -= dt;
            if self.dash_timer > 0.0 {
                body.velocity = Vec2::new(self.dash_direction * self.config.dash_speed, 0.0);
                body.gravity_modifier = 0.0;
                return;
            }
            body.gravity_modifier = 1.0;
            self.state = if body.grounded {
                PlatformerState::Idle
            } else {
                PlatformerState::Falling
            };
        }

        if input.dash_pressed && self.dash_cooldown_timer == 0.0 {
            self.state = PlatformerState::Dashing;
            self.dash_timer = self.config.dash_duration;
            self.dash_cooldown_timer = self.config.dash_cooldown;
            self.dash_direction = self.facing;
            body.velocity = Vec2::new(self.dash_direction * self.config.dash_speed, 0.0);
            body.gravity_modifier = 0.0;
            return;
        }

        // Buffered jump, with the coyote window standing in for ground.
        let can_ground_jump =
            (body.grounded || body.time_in_air <= self.config.coyote_time) && !self.rising;
        if self.jump_buffer > 0.0 && can_ground_jump {
            self.jump_buffer = 0.0;
            self.rising = true;
            self.state = PlatformerState::Jumping;
            if !body.grounded {
                // Jumping out of coyote time keeps the run speed the body
                // carried off the ledge.
                body.velocity.x = body.last_ground_velocity.x;
            }
            body.velocity.y = self.jump_velocity(g, dt);
        } else if self.jump_buffer > 0.0 && !body.grounded {
            if let Some(wall_normal) = body.wall_normal {
                self.jump_buffer = 0.0;
                self.rising = true;
                self.state = PlatformerState::WallJumping;
                body.velocity.x = wall_normal.x * self.config.wall_jump_speed;
                body.velocity.y = self.jump_velocity(g, dt);
            }
        }

        if body.grounded {
            self.update_grounded(body, dt);
        } else {
            self.update_airborne(body, dt);
        }
    }

    fn update_grounded(&mut self, body: &mut KinematicBody, dt: f32) {
        body.gravity_modifier = 1.0;
        if self.rising {
            // Jump velocity was just issued; leave it untouched.
            return;
        }
        let input = self.input;
        let speed = if input.run_held {
            self.config.run_speed
        } else {
            self.config.walk_speed
        };
        accelerate_x(body, input.move_x * speed, self.config.acceleration, dt);

        self.state = if input.move_x.abs() < 0.01 {
            PlatformerState::Idle
        } else if input.run_held {
            PlatformerState::Running
        } else {
            PlatformerState::Walking
        };
    }

    fn update_airborne(&mut self, body: &mut KinematicBody, dt: f32) {
        let input = self.input;

        if let Some(wall_normal) = body.wall_normal {
            let pressing_into_wall = input.move_x * wall_normal.x < -0.01;

            if input.grab_held && self.grab_timer < self.config.wall_grab_duration {
                self.grab_timer += dt;
                body.gravity_modifier = 0.0;
                body.velocity.x = 0.0;
                if input.move_y.abs() > 0.01 {
                    self.state = PlatformerState::Climbing;
                    body.velocity.y = input.move_y.signum() * self.config.climb_speed;
                } else {
                    self.state = PlatformerState::Grabbing;
                    body.velocity.y = 0.0;
                }
                return;
            }

            if pressing_into_wall && body.velocity.y < 0.0 {
                self.state = PlatformerState::WallSliding;
                body.gravity_modifier = 1.0;
                body.velocity.y = body.velocity.y.max(-self.config.wall_slide_speed);
                return;
            }
        }

        // Plain air: keep jump states while rising, fall otherwise.
        if self.rising && body.velocity.y > 0.0 {
            if self.state != PlatformerState::WallJumping {
                self.state = PlatformerState::Jumping;
            }
            body.gravity_modifier = self.rise_gravity_modifier();
        } else {
            self.state = PlatformerState::Falling;
            body.gravity_modifier = 1.0;
        }

        let speed = if input.run_held {
            self.config.run_speed
        } else {
            self.config.walk_speed
        };
        accelerate_x(body, input.move_x * speed, self.config.air_acceleration, dt);
    }
}

fn accelerate_x(body: &mut KinematicBody, target: f32, acceleration: f32, dt: f32) {
    let step = acceleration * dt;
    let delta = target - body.velocity.x;
    body.velocity.x += delta.clamp(-step, step);
}

/// Run every platformer character in the world for one tick. Call before
/// the motion world's step so the issued commands move the bodies this
/// tick.
pub fn platformer_system(world: &mut hecs::World, config: &MotionConfig, dt: f32) {
    for (_, (platformer, body)) in world.query_mut::<(&mut Platformer, &mut KinematicBody)>() {
        platformer.update(body, config.gravity, dt);
    }
}
