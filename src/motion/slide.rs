//! The slide movement routine.
//!
//! `move_by` displaces a body by a delta; obstruction does not stop it but
//! redirects the remaining distance along the contact surface, recursively,
//! up to a hard iteration bound. Pushable kinematic obstacles are slid out
//! of the way before the mover retries.

use glam::Vec2;
use tracing::{debug, trace};

use crate::motion::body::{classify_normal, ColliderSet, KinematicBody, Position, SurfaceKind};
use crate::motion::MotionConfig;
use crate::query::{Collider2, LayerMask, SpatialQuery, SweepHit};

/// Depth bound for the rider-chain walk when a carrying body translates.
const MAX_RIDER_DEPTH: u32 = 4;

struct BodySnapshot {
    position: Vec2,
    colliders: Vec<Collider2>,
    layers: LayerMask,
    velocity: Vec2,
    grounded: bool,
    push_priority: i32,
}

fn snapshot(world: &hecs::World, entity: hecs::Entity) -> Option<BodySnapshot> {
    let position = world.get::<&Position>(entity).ok()?.0;
    let body = world.get::<&KinematicBody>(entity).ok()?;
    // The body's own sensor shapes never obstruct its movement.
    let colliders: Vec<Collider2> = world
        .get::<&ColliderSet>(entity)
        .map(|set| {
            set.colliders
                .iter()
                .filter(|c| !c.is_sensor)
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    Some(BodySnapshot {
        position,
        colliders,
        layers: body.collide_layers,
        velocity: body.velocity,
        grounded: body.grounded,
        push_priority: body.push_priority,
    })
}

/// Attempt to displace `entity` by `delta`, sliding along obstructions.
///
/// Returns the realized displacement. Degenerate deltas (below the minimum
/// slide distance, or non-finite) are a silent no-op.
pub fn move_by<Q: SpatialQuery>(
    world: &mut hecs::World,
    query: &Q,
    config: &MotionConfig,
    entity: hecs::Entity,
    delta: Vec2,
) -> Vec2 {
    slide_move(world, query, config, entity, delta, 0)
}

pub(crate) fn slide_move<Q: SpatialQuery>(
    world: &mut hecs::World,
    query: &Q,
    config: &MotionConfig,
    entity: hecs::Entity,
    delta: Vec2,
    iterations: u32,
) -> Vec2 {
    if iterations > config.max_slide_iterations {
        debug!(?entity, "slide iteration bound reached, accepting partial move");
        return Vec2::ZERO;
    }
    if !delta.is_finite() {
        return Vec2::ZERO;
    }
    let length = delta.length();
    if length < config.min_slide_distance {
        return Vec2::ZERO;
    }
    let direction = delta / length;

    let Some(snap) = snapshot(world, entity) else {
        return Vec2::ZERO;
    };
    // No shapes means no collision possible: move unobstructed.
    if snap.colliders.is_empty() {
        translate(world, entity, delta);
        return delta;
    }

    let mut hits = Vec::new();
    query.sweep_cast(
        world,
        snap.position,
        &snap.colliders,
        direction,
        length + config.margin,
        snap.layers,
        Some(entity),
        &mut hits,
    );

    let Some(hit) = first_blocking_hit(&hits, config) else {
        translate(world, entity, delta);
        return delta;
    };

    // A marginal overlap the body is already separating from is a false
    // hit; moving on would wedge the body against nothing.
    if hit.distance <= 0.0 && snap.velocity.dot(hit.normal) > 0.0 {
        return Vec2::ZERO;
    }

    let advance = (hit.distance - config.margin).max(0.0).min(length);
    let mut moved = Vec2::ZERO;
    if advance > 0.0 {
        moved = direction * advance;
        translate(world, entity, moved);
    }

    let remaining = length - hit.distance.max(0.0);
    if remaining <= config.min_slide_distance {
        return moved;
    }

    // Pushable kinematic obstacle at lower-or-equal priority: slide it by
    // the remaining delta first, then retry with whatever room opened up.
    if let Some(priority) = pushable_priority(world, hit.entity) {
        if priority <= snap.push_priority {
            slide_move(world, query, config, hit.entity, direction * remaining, iterations + 1);
            let retried =
                slide_move(world, query, config, entity, direction * remaining, iterations + 1);
            return moved + retried;
        }
    }

    let kind = classify_normal(hit.normal, config.max_ground_angle, config.max_ceiling_angle);
    let redirect = match kind {
        SurfaceKind::Ground => true,
        SurfaceKind::Ceiling => !snap.grounded,
        SurfaceKind::Wall => false,
    };
    if !redirect {
        return moved;
    }

    // Remaining distance continues along the surface tangent. Only the
    // horizontal intent survives; the vertical remainder is dropped, which
    // is what kills vertical momentum on landing and ceiling bumps.
    let mut tangent = Vec2::new(hit.normal.y, -hit.normal.x);
    if tangent.dot(direction) < 0.0 {
        tangent = -tangent;
    }
    let horizontal = Vec2::new(direction.x * remaining, 0.0);
    let redirected = tangent * horizontal.dot(tangent);
    trace!(?entity, ?kind, distance = hit.distance, "slide redirect");

    moved + slide_move(world, query, config, entity, redirected, iterations + 1)
}

/// First hit that actually blocks: sensors never do, and a one-way surface
/// blocks only on its ground-classified face when not already overlapped.
pub(crate) fn first_blocking_hit<'a>(
    hits: &'a [SweepHit],
    config: &MotionConfig,
) -> Option<&'a SweepHit> {
    hits.iter().find(|hit| {
        if hit.is_sensor {
            return false;
        }
        if hit.one_way {
            let kind =
                classify_normal(hit.normal, config.max_ground_angle, config.max_ceiling_angle);
            return kind == SurfaceKind::Ground && hit.distance > 0.0;
        }
        true
    })
}

fn pushable_priority(world: &hecs::World, entity: hecs::Entity) -> Option<i32> {
    let body = world.get::<&KinematicBody>(entity).ok()?;
    if body.pushable {
        Some(body.push_priority)
    } else {
        None
    }
}

/// The single authorized mutation point for body positions.
///
/// Bodies standing on `entity` are translated by the same delta first, so
/// riders move in lockstep with their platform instead of lagging a tick.
pub(crate) fn translate(world: &mut hecs::World, entity: hecs::Entity, delta: Vec2) {
    translate_depth(world, entity, delta, 0);
}

fn translate_depth(world: &mut hecs::World, entity: hecs::Entity, delta: Vec2, depth: u32) {
    if depth < MAX_RIDER_DEPTH {
        let riders: Vec<hecs::Entity> = world
            .query::<&KinematicBody>()
            .iter()
            .filter(|(rider, body)| *rider != entity && body.ground == Some(entity))
            .map(|(rider, _)| rider)
            .collect();
        for rider in riders {
            translate_depth(world, rider, delta, depth + 1);
        }
    }
    if let Ok(mut position) = world.get::<&mut Position>(entity) {
        position.0 += delta;
    }
}
