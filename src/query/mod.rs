//! Shape descriptors and the spatial-query capability the motion core
//! depends on.
//!
//! The core never talks to a physics engine directly. Everything it needs
//! from the outside world is the [`SpatialQuery`] trait: a swept cast that
//! reports ordered hits and a static overlap query. The built-in
//! [`SpatialHashGrid`] backend satisfies it; so can a wrapper around any
//! third-party physics library that returns the same hit fields.

pub mod cast;
pub mod grid;

use glam::Vec2;

use crate::geom::Bounds2;

pub use grid::SpatialHashGrid;

/// Hit/overlap buffers are truncated to this many results. A moving body
/// re-queries every tick, so dropped surplus hits are an accepted
/// approximation rather than an error.
pub const MAX_QUERY_HITS: usize = 16;

/// Collision layer bitmask. Two masks interact when they share a bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const NONE: LayerMask = LayerMask(0);

    #[inline]
    pub fn intersects(&self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Collision shape, positioned by the owning collider's offset.
///
/// Shapes are axis-aligned; the 2D core does not rotate bodies.
#[derive(Debug, Clone)]
pub enum Shape2 {
    Circle { radius: f32 },
    Box { half_extents: Vec2 },
    /// Vertical capsule: a segment of `half_height` swept by `radius`.
    Capsule { radius: f32, half_height: f32 },
    /// Convex outline in collider-local space. Casts and overlaps resolve
    /// against its bounding box (conservative).
    Polygon { points: Vec<Vec2> },
}

impl Shape2 {
    /// World-space bounds of this shape centered at `center`.
    pub fn bounds(&self, center: Vec2) -> Bounds2 {
        match self {
            Shape2::Circle { radius } => Bounds2::from_center(center, Vec2::splat(*radius)),
            Shape2::Box { half_extents } => Bounds2::from_center(center, *half_extents),
            Shape2::Capsule {
                radius,
                half_height,
            } => Bounds2::from_center(center, Vec2::new(*radius, *half_height + *radius)),
            Shape2::Polygon { points } => {
                if points.is_empty() {
                    return Bounds2 {
                        min: center,
                        max: center,
                    };
                }
                let mut min = Vec2::splat(f32::MAX);
                let mut max = Vec2::splat(f32::MIN);
                for p in points {
                    min = min.min(*p);
                    max = max.max(*p);
                }
                Bounds2 {
                    min: center + min,
                    max: center + max,
                }
            }
        }
    }
}

/// One shape attached to a body.
#[derive(Debug, Clone)]
pub struct Collider2 {
    pub shape: Shape2,
    /// Offset from the body's position.
    pub offset: Vec2,
    /// Only the ground-classified face of a one-way surface blocks; every
    /// other approach passes through.
    pub one_way: bool,
    /// Sensors report contacts but never block or separate.
    pub is_sensor: bool,
    pub layers: LayerMask,
}

impl Default for Collider2 {
    fn default() -> Self {
        Self {
            shape: Shape2::Box {
                half_extents: Vec2::splat(0.5),
            },
            offset: Vec2::ZERO,
            one_way: false,
            is_sensor: false,
            layers: LayerMask::ALL,
        }
    }
}

/// Result of a swept cast, ordered by distance along the cast direction.
#[derive(Debug, Clone, Copy)]
pub struct SweepHit {
    /// Travel distance before first touch. Zero or negative when the cast
    /// starts already in contact.
    pub distance: f32,
    /// Approximate contact point on the hit surface, world space.
    pub point: Vec2,
    /// Surface normal at the contact, facing the caster.
    pub normal: Vec2,
    pub entity: hecs::Entity,
    /// Index into the hit entity's collider set.
    pub shape_index: usize,
    pub one_way: bool,
    pub is_sensor: bool,
}

/// Result of a static overlap query.
#[derive(Debug, Clone, Copy)]
pub struct OverlapHit {
    pub entity: hecs::Entity,
    pub shape_index: usize,
    /// World bounds of the overlapping shape.
    pub bounds: Bounds2,
    pub one_way: bool,
    pub is_sensor: bool,
}

/// The engine/physics capability the motion core is written against.
///
/// Both queries are synchronous and complete before movement decisions
/// proceed. Result buffers are cleared by the implementation and truncated
/// to [`MAX_QUERY_HITS`].
pub trait SpatialQuery {
    /// Refresh acceleration structures from current world state. Called
    /// once at the start of every fixed step.
    fn prepare(&mut self, world: &hecs::World) {
        let _ = world;
    }

    /// Sweep `colliders` (positioned relative to `origin`) along
    /// `direction` for `distance`, collecting hits ordered nearest-first.
    #[allow(clippy::too_many_arguments)]
    fn sweep_cast(
        &self,
        world: &hecs::World,
        origin: Vec2,
        colliders: &[Collider2],
        direction: Vec2,
        distance: f32,
        filter: LayerMask,
        ignore: Option<hecs::Entity>,
        hits: &mut Vec<SweepHit>,
    );

    /// Collect every shape currently overlapping `colliders` at `origin`.
    fn overlap(
        &self,
        world: &hecs::World,
        origin: Vec2,
        colliders: &[Collider2],
        filter: LayerMask,
        ignore: Option<hecs::Entity>,
        hits: &mut Vec<OverlapHit>,
    );
}
