//! Components describing a kinematic motion body.

use glam::Vec2;

use crate::query::Collider2;

/// Authoritative body location.
///
/// Mutated only through the motion world's translate routine during
/// simulation, so physics-level corrections happen atomically and ground
/// riders can observe pending platform moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct Position(pub Vec2);

/// Shapes attached to a body. Immutable for the duration of a tick; each
/// shape participates independently in casts and overlap queries.
#[derive(Debug, Clone, Default)]
pub struct ColliderSet {
    pub colliders: Vec<Collider2>,
}

impl ColliderSet {
    pub fn new(colliders: Vec<Collider2>) -> Self {
        Self { colliders }
    }

    pub fn single(collider: Collider2) -> Self {
        Self {
            colliders: vec![collider],
        }
    }
}

/// Surface classification by contact-normal angle.
///
/// The three classes are mutually exclusive and exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Supports standing; angle to world-up below the ground threshold.
    Ground,
    /// Blocks upward motion; angle to world-down below the ceiling threshold.
    Ceiling,
    /// Everything else.
    Wall,
}

/// Classify a surface normal against the configured angle thresholds
/// (both in degrees).
#[inline]
pub fn classify_normal(normal: Vec2, max_ground_angle: f32, max_ceiling_angle: f32) -> SurfaceKind {
    let up_angle = normal.dot(Vec2::Y).clamp(-1.0, 1.0).acos().to_degrees();
    if up_angle < max_ground_angle {
        SurfaceKind::Ground
    } else if 180.0 - up_angle < max_ceiling_angle {
        SurfaceKind::Ceiling
    } else {
        SurfaceKind::Wall
    }
}

/// Kinematic motion body component.
///
/// Clients write `velocity` between ticks; the motion world overwrites it
/// at the end of each tick with the realized, displacement-derived value.
/// Everything else is derived state, recomputed per tick.
#[derive(Debug, Clone)]
pub struct KinematicBody {
    /// Desired velocity going into the tick; realized velocity coming out.
    pub velocity: Vec2,
    /// Per-body gravity scale, long-lived configuration.
    pub gravity_multiplier: f32,
    /// Transient gravity scale for client states (dashing, jump shaping).
    pub gravity_modifier: f32,
    /// Componentwise speed clamps applied before movement.
    pub max_up_speed: f32,
    pub max_down_speed: f32,
    pub max_side_speed: f32,
    /// Layers this body collides with.
    pub collide_layers: crate::query::LayerMask,
    /// Arbitration for overlap resolution and pushing.
    pub push_priority: i32,
    pub pushable: bool,

    /// True when the downward ground probe found a standable surface.
    pub grounded: bool,
    /// Normal of the surface stood on; world-up when airborne.
    pub ground_normal: Vec2,
    /// Body stood on, when the ground is another body. Weak handle,
    /// re-resolved by lookup each tick.
    pub ground: Option<hecs::Entity>,
    /// Seconds since last grounded; zero while grounded. Used by clients
    /// for jump-grace windows.
    pub time_in_air: f32,
    /// Velocity recorded while last grounded, preserved into the air for
    /// jump logic.
    pub last_ground_velocity: Vec2,
    /// Normal of a wall currently touched, if any.
    pub wall_normal: Option<Vec2>,

    pub(crate) prev_grounded: bool,
    /// Set on the tick a landing happens; redirects keep using world-up
    /// until the tick after.
    pub(crate) landed_this_tick: bool,
    /// Distance to the ground surface from the last probe.
    pub(crate) ground_distance: f32,
}

impl KinematicBody {
    pub fn new() -> Self {
        Self {
            velocity: Vec2::ZERO,
            gravity_multiplier: 1.0,
            gravity_modifier: 1.0,
            max_up_speed: 25.0,
            max_down_speed: 25.0,
            max_side_speed: 12.0,
            collide_layers: crate::query::LayerMask::ALL,
            push_priority: 0,
            pushable: false,
            grounded: false,
            ground_normal: Vec2::Y,
            ground: None,
            time_in_air: 0.0,
            last_ground_velocity: Vec2::ZERO,
            wall_normal: None,
            prev_grounded: false,
            landed_this_tick: false,
            ground_distance: f32::MAX,
        }
    }

    /// A body others can push out of the way.
    pub fn new_pushable(priority: i32) -> Self {
        Self {
            pushable: true,
            push_priority: priority,
            ..Self::new()
        }
    }
}

impl Default for KinematicBody {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_flat_ground() {
        assert_eq!(classify_normal(Vec2::Y, 50.0, 50.0), SurfaceKind::Ground);
    }

    #[test]
    fn test_classify_slope_within_threshold() {
        // 30 degree slope normal.
        let n = Vec2::new(-(30.0f32.to_radians().sin()), 30.0f32.to_radians().cos());
        assert_eq!(classify_normal(n, 50.0, 50.0), SurfaceKind::Ground);
        assert_eq!(classify_normal(n, 20.0, 50.0), SurfaceKind::Wall);
    }

    #[test]
    fn test_classify_ceiling_and_wall() {
        assert_eq!(classify_normal(Vec2::NEG_Y, 50.0, 50.0), SurfaceKind::Ceiling);
        assert_eq!(classify_normal(Vec2::X, 50.0, 50.0), SurfaceKind::Wall);
        assert_eq!(classify_normal(Vec2::NEG_X, 50.0, 50.0), SurfaceKind::Wall);
    }

    #[test]
    fn test_classification_total_and_disjoint() {
        // Pseudo-random normals swept around the circle; every one lands in
        // exactly one class by construction of the if/else chain, and with a
        // zero ground threshold nothing classifies as ground.
        for i in 0..10_000 {
            let angle = (i as f32) * 0.017 + (i as f32 * 0.003).sin();
            let n = Vec2::new(angle.cos(), angle.sin());
            let _ = classify_normal(n, 50.0, 50.0);

            let strict = classify_normal(n, 0.0, 50.0);
            assert_ne!(
                strict,
                SurfaceKind::Ground,
                "normal {n:?} classified as ground with zero threshold"
            );
        }
    }
}
