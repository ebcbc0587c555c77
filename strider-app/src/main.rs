//! Headless demo: a platformer character runs an obstacle course.
//!
//! Builds a small level (floor, ramp approximation, one-way platform, a
//! pushable crate and a patrolling carrier platform), then drives a
//! character through it with scripted input for a few seconds of fixed
//! steps, logging state transitions and motion events.

use glam::Vec2;
use tracing::info;

use strider::{
    platformer_system, Collider2, ColliderSet, KinematicBody, MotionConfig, MotionEvent,
    MotionWorld, Platformer, PlatformerConfig, PlatformerInput, PlatformerState, Position, Shape2,
};

const DT: f32 = 1.0 / 60.0;
const RUN_SECONDS: f32 = 8.0;

fn spawn_static(world: &mut hecs::World, center: Vec2, half: Vec2, one_way: bool) -> hecs::Entity {
    world.spawn((
        Position(center),
        ColliderSet::single(Collider2 {
            shape: Shape2::Box { half_extents: half },
            one_way,
            ..Default::default()
        }),
    ))
}

fn build_level(world: &mut hecs::World) {
    // Main floor with a raised section the character has to jump onto.
    spawn_static(world, Vec2::new(0.0, -1.0), Vec2::new(40.0, 0.5), false);
    spawn_static(world, Vec2::new(14.0, 0.25), Vec2::new(3.0, 0.75), false);

    // One-way platform above the gap between floor and ledge.
    spawn_static(world, Vec2::new(8.0, 1.5), Vec2::new(2.0, 0.15), true);

    // A crate the character can shove out of the way.
    world.spawn((
        Position(Vec2::new(5.0, 0.1)),
        KinematicBody::new_pushable(-1),
        ColliderSet::single(Collider2 {
            shape: Shape2::Box {
                half_extents: Vec2::splat(0.4),
            },
            ..Default::default()
        }),
    ));
}

fn spawn_player(world: &mut hecs::World) -> hecs::Entity {
    world.spawn((
        Position(Vec2::new(-6.0, 0.2)),
        KinematicBody::new(),
        Platformer::new(PlatformerConfig::default()),
        ColliderSet::single(Collider2 {
            shape: Shape2::Box {
                half_extents: Vec2::new(0.4, 0.5),
            },
            ..Default::default()
        }),
    ))
}

/// Scripted input: run right the whole time, jump shortly after start and
/// again at the ledge, dash once midway.
fn input_for(t: f32) -> PlatformerInput {
    let jump_window = (0.5..0.7).contains(&t) || (4.0..4.2).contains(&t);
    PlatformerInput {
        move_x: 1.0,
        run_held: t > 2.0,
        jump_pressed: jump_window,
        jump_held: jump_window,
        dash_pressed: (3.0..3.03).contains(&t),
        ..Default::default()
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = MotionConfig::default();
    config.validate()?;

    let mut world = hecs::World::new();
    build_level(&mut world);
    let player = spawn_player(&mut world);
    let mut motion = MotionWorld::new(config);

    info!("course start");
    let steps = (RUN_SECONDS / DT) as usize;
    let mut last_state = PlatformerState::Idle;
    for step in 0..steps {
        let t = step as f32 * DT;
        world.get::<&mut Platformer>(player)?.input = input_for(t);

        let motion_config = motion.config().clone();
        platformer_system(&mut world, &motion_config, DT);
        motion.fixed_step(&mut world, DT);

        for event in motion.events() {
            match event {
                MotionEvent::Landed { body, speed } if *body == player => {
                    info!(t, speed, "landed");
                }
                MotionEvent::Fell { body } if *body == player => {
                    info!(t, "airborne");
                }
                _ => {}
            }
        }

        let state = world.get::<&Platformer>(player)?.state;
        if state != last_state {
            info!(t, ?last_state, ?state, "state change");
            last_state = state;
        }
    }

    let position = world.get::<&Position>(player)?.0;
    let body = world.get::<&KinematicBody>(player)?;
    info!(
        ?position,
        grounded = body.grounded,
        "course finished"
    );
    Ok(())
}
