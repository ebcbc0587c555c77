//! Strider kinematic motion engine
//!
//! An engine-agnostic 2D (and 3D) kinematic character motion core:
//! swept-shape casts, slide-and-project movement, surface classification,
//! overlap resolution with push priorities, and contact tracking.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **geom** - Pure 2D geometry helpers (bounds, segments, polygons)
//! 2. **query** - Shape descriptors and the [`SpatialQuery`] capability
//!    the core is written against, with a built-in spatial hash grid
//!    backend
//! 3. **motion** - The kinematic body, the slide algorithm, overlap/push
//!    resolution, contact tracking, and the fixed-timestep world
//! 4. **platformer** - A platformer character state machine, the
//!    reference client of the core (feature = "platformer")
//! 5. **dim3** - The 3D generalization of the slide core (feature =
//!    "dim3")
//!
//! Bodies live in a [`hecs::World`]; every cross-body reference is an
//! entity handle resolved by lookup each tick, never an owning pointer.

pub mod geom;
pub mod motion;
pub mod query;

#[cfg(feature = "platformer")]
pub mod platformer;

#[cfg(feature = "dim3")]
pub mod dim3;

// Re-export commonly used types
pub use geom::Bounds2;

pub use query::{
    Collider2, LayerMask, OverlapHit, Shape2, SpatialHashGrid, SpatialQuery, SweepHit,
    MAX_QUERY_HITS,
};

pub use motion::{
    classify_normal, move_by, resolve_overlaps, ColliderSet, ConfigError, Contact, ContactPhase,
    ContactTracker, KinematicBody, MotionConfig, MotionEvent, MotionWorld, Position, SurfaceKind,
    MAX_CONTACTS,
};

#[cfg(feature = "platformer")]
pub use platformer::{
    platformer_system, JumpMode, Platformer, PlatformerConfig, PlatformerInput, PlatformerState,
};

#[cfg(feature = "dim3")]
pub use dim3::{
    classify_normal3, Aabb3, Collider3, ColliderSet3, KinematicBody3, Motion3Config, Motion3World,
    Position3, Shape3, SpatialHashGrid3, SpatialQuery3, SweepHit3,
};

// Re-export glam for convenience
pub use glam;
