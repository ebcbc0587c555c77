//! Interpenetration resolution between bodies, arbitrated by push priority.
//!
//! Runs before the main movement step so the slide algorithm starts from a
//! de-penetrated state. A strictly-lower-priority kinematic body yields its
//! position; anything else makes the resolving body itself back out.

use glam::Vec2;
use tracing::debug;

use crate::geom::{separation_bounds, Bounds2};
use crate::motion::body::{ColliderSet, KinematicBody, Position};
use crate::motion::slide::translate;
use crate::motion::MotionConfig;
use crate::query::{Collider2, SpatialQuery};

/// Below this speed a body is separated away from the obstacle's center
/// rather than back along its own velocity.
const NEAR_REST_SPEED: f32 = 1e-3;

/// Resolve `entity`'s overlaps, repeating up to the configured iteration
/// bound. Returns true when any separation was applied.
pub fn resolve_overlaps<Q: SpatialQuery>(
    world: &mut hecs::World,
    query: &Q,
    config: &MotionConfig,
    entity: hecs::Entity,
) -> bool {
    let mut any = false;
    for _ in 0..config.max_overlap_iterations {
        if !resolve_pass(world, query, config, entity, 0) {
            break;
        }
        any = true;
    }
    any
}

fn resolve_pass<Q: SpatialQuery>(
    world: &mut hecs::World,
    query: &Q,
    config: &MotionConfig,
    entity: hecs::Entity,
    depth: u32,
) -> bool {
    if depth > config.max_overlap_iterations {
        // Bounded imperfection: co-located bodies stop ping-ponging and
        // stay overlapped until next tick.
        debug!(?entity, "overlap resolution depth bound reached");
        return false;
    }

    let Some((position, colliders, layers, priority)) = solid_colliders(world, entity) else {
        return false;
    };
    if colliders.is_empty() {
        return false;
    }

    let mut hits = Vec::new();
    query.overlap(world, position, &colliders, layers, Some(entity), &mut hits);

    let Some(own_bounds) = body_bounds(world, entity) else {
        return false;
    };

    let mut any = false;
    for hit in &hits {
        // Sensors never separate; a one-way surface is expected to be
        // passed through.
        if hit.is_sensor || hit.one_way {
            continue;
        }

        let yields = world
            .get::<&KinematicBody>(hit.entity)
            .map(|other| other.pushable && other.push_priority < priority)
            .unwrap_or(false);

        if yields {
            separate(world, config, hit.entity, &own_bounds);
            // The pushed body may now overlap something else.
            resolve_pass(world, query, config, hit.entity, depth + 1);
        } else {
            separate(world, config, entity, &hit.bounds);
        }
        any = true;
    }
    any
}

/// Move `entity` just clear of `obstacle` plus the margin.
fn separate(world: &mut hecs::World, config: &MotionConfig, entity: hecs::Entity, obstacle: &Bounds2) {
    let Some(bounds) = body_bounds(world, entity) else {
        return;
    };
    let velocity = world
        .get::<&KinematicBody>(entity)
        .map(|b| b.velocity)
        .unwrap_or(Vec2::ZERO);

    // At rest: push away from the obstacle's center. Moving: push back the
    // way the body came, not sideways.
    let direction = if velocity.length_squared() < NEAR_REST_SPEED * NEAR_REST_SPEED {
        let away = bounds.center() - obstacle.center();
        if away.length_squared() > 1e-12 {
            away.normalize()
        } else {
            Vec2::Y
        }
    } else {
        -velocity.normalize()
    };

    let moved = separation_bounds(&bounds, obstacle, direction, config.margin);
    let delta = moved.min - bounds.min;
    if delta != Vec2::ZERO {
        translate(world, entity, delta);
    }
}

/// World bounds over the body's solid shapes.
fn body_bounds(world: &hecs::World, entity: hecs::Entity) -> Option<Bounds2> {
    let position = world.get::<&Position>(entity).ok()?.0;
    let set = world.get::<&ColliderSet>(entity).ok()?;
    let mut bounds: Option<Bounds2> = None;
    for collider in set.colliders.iter().filter(|c| !c.is_sensor) {
        let b = collider.shape.bounds(position + collider.offset);
        bounds = Some(match bounds {
            Some(acc) => acc.union(&b),
            None => b,
        });
    }
    bounds
}

type SolidColliders = (Vec2, Vec<Collider2>, crate::query::LayerMask, i32);

fn solid_colliders(world: &hecs::World, entity: hecs::Entity) -> Option<SolidColliders> {
    let position = world.get::<&Position>(entity).ok()?.0;
    let body = world.get::<&KinematicBody>(entity).ok()?;
    let colliders = world
        .get::<&ColliderSet>(entity)
        .map(|set| {
            set.colliders
                .iter()
                .filter(|c| !c.is_sensor)
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    Some((position, colliders, body.collide_layers, body.push_priority))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Shape2, SpatialHashGrid};

    fn spawn_kinematic(
        world: &mut hecs::World,
        center: Vec2,
        priority: i32,
        pushable: bool,
    ) -> hecs::Entity {
        let mut body = KinematicBody::new();
        body.push_priority = priority;
        body.pushable = pushable;
        world.spawn((
            Position(center),
            body,
            ColliderSet::single(Collider2 {
                shape: Shape2::Box {
                    half_extents: Vec2::splat(0.5),
                },
                ..Default::default()
            }),
        ))
    }

    fn prepared(world: &hecs::World) -> SpatialHashGrid {
        let mut grid = SpatialHashGrid::new();
        grid.prepare(world);
        grid
    }

    fn position(world: &hecs::World, entity: hecs::Entity) -> Vec2 {
        world.get::<&Position>(entity).unwrap().0
    }

    #[test]
    fn test_higher_priority_body_stays_put() {
        let mut world = hecs::World::new();
        let high = spawn_kinematic(&mut world, Vec2::ZERO, 5, true);
        let low = spawn_kinematic(&mut world, Vec2::new(0.4, 0.0), 0, true);
        let grid = prepared(&world);
        let config = MotionConfig::default();

        let resolved = resolve_overlaps(&mut world, &grid, &config, high);
        assert!(resolved);
        assert_eq!(position(&world, high), Vec2::ZERO, "high priority moved");

        let low_pos = position(&world, low);
        let gap = low_pos.x - 1.0; // surfaces separate at center distance 1.0
        assert!(
            gap >= config.margin - 1e-4,
            "low priority body not pushed clear: {low_pos:?}"
        );
    }

    #[test]
    fn test_non_pushable_obstacle_moves_the_resolver() {
        let mut world = hecs::World::new();
        let mover = spawn_kinematic(&mut world, Vec2::new(0.4, 0.0), 0, false);
        let rock = spawn_kinematic(&mut world, Vec2::ZERO, -5, false);
        let grid = prepared(&world);
        let config = MotionConfig::default();

        resolve_overlaps(&mut world, &grid, &config, mover);
        assert_eq!(position(&world, rock), Vec2::ZERO);
        let mover_pos = position(&world, mover);
        assert!(
            mover_pos.x - 1.0 >= config.margin - 1e-4,
            "mover should back out: {mover_pos:?}"
        );
    }

    #[test]
    fn test_moving_body_separates_against_its_velocity() {
        let mut world = hecs::World::new();
        let mover = spawn_kinematic(&mut world, Vec2::new(-0.3, 0.0), 0, false);
        world.get::<&mut KinematicBody>(mover).unwrap().velocity = Vec2::new(4.0, 0.0);
        let _wall = spawn_kinematic(&mut world, Vec2::ZERO, 10, false);
        let grid = prepared(&world);
        let config = MotionConfig::default();

        resolve_overlaps(&mut world, &grid, &config, mover);
        let pos = position(&world, mover);
        // Pushed back the way it came (negative x), not sideways.
        assert!(pos.x <= -1.0 - config.margin + 1e-4, "pos = {pos:?}");
        assert_eq!(pos.y, 0.0);
    }

    #[test]
    fn test_no_overlap_is_a_no_op() {
        let mut world = hecs::World::new();
        let a = spawn_kinematic(&mut world, Vec2::ZERO, 0, false);
        let _b = spawn_kinematic(&mut world, Vec2::new(5.0, 0.0), 0, false);
        let grid = prepared(&world);

        let resolved = resolve_overlaps(&mut world, &grid, &MotionConfig::default(), a);
        assert!(!resolved);
        assert_eq!(position(&world, a), Vec2::ZERO);
    }
}
