//! Shared world-setup helpers for the motion benchmarks.

use glam::Vec2;
use strider::{
    Collider2, ColliderSet, KinematicBody, MotionConfig, MotionWorld, Platformer,
    PlatformerConfig, PlatformerInput, Position, Shape2, SpatialHashGrid, SpatialQuery,
};

pub fn spawn_static_box(world: &mut hecs::World, center: Vec2, half: Vec2) -> hecs::Entity {
    world.spawn((
        Position(center),
        ColliderSet::single(Collider2 {
            shape: Shape2::Box { half_extents: half },
            ..Default::default()
        }),
    ))
}

pub fn spawn_character(world: &mut hecs::World, center: Vec2) -> hecs::Entity {
    world.spawn((
        Position(center),
        KinematicBody::new(),
        ColliderSet::single(Collider2 {
            shape: Shape2::Box {
                half_extents: Vec2::splat(0.5),
            },
            ..Default::default()
        }),
    ))
}

/// A caster in a corridor of `n` obstacles along +X, with a prepared grid.
pub fn setup_corridor(n: usize) -> (hecs::World, SpatialHashGrid, hecs::Entity) {
    let mut world = hecs::World::new();
    for i in 0..n {
        let x = 3.0 + i as f32 * 2.5;
        let y = if i % 2 == 0 { 2.0 } else { -2.0 };
        spawn_static_box(&mut world, Vec2::new(x, y), Vec2::splat(0.5));
    }
    let caster = spawn_character(&mut world, Vec2::ZERO);
    let mut grid = SpatialHashGrid::new();
    grid.prepare(&world);
    (world, grid, caster)
}

/// A long floor with walls and `bodies` kinematic boxes spread above it.
pub fn setup_course(bodies: usize) -> (hecs::World, MotionWorld) {
    let mut world = hecs::World::new();
    let span = (bodies as f32).max(8.0) * 2.0;
    spawn_static_box(&mut world, Vec2::new(0.0, -1.0), Vec2::new(span, 0.5));
    spawn_static_box(&mut world, Vec2::new(-span, 3.0), Vec2::new(0.5, 4.0));
    spawn_static_box(&mut world, Vec2::new(span, 3.0), Vec2::new(0.5, 4.0));

    for i in 0..bodies {
        let x = (i as f32 / bodies.max(1) as f32 - 0.5) * span * 1.6;
        let y = 0.1 + (i % 7) as f32 * 0.8;
        let body = spawn_character(&mut world, Vec2::new(x, y));
        world
            .get::<&mut KinematicBody>(body)
            .unwrap()
            .velocity = Vec2::new(if i % 2 == 0 { 2.0 } else { -2.0 }, 0.0);
    }

    (world, MotionWorld::new(MotionConfig::default()))
}

/// `n` pushable bodies spawned mutually overlapping around the origin,
/// plus a high-priority resolver in the middle. Returns the resolver.
pub fn setup_crowd(n: usize) -> (hecs::World, MotionWorld, hecs::Entity) {
    let mut world = hecs::World::new();
    spawn_static_box(&mut world, Vec2::new(0.0, -1.0), Vec2::new(50.0, 0.5));
    for i in 0..n {
        let angle = i as f32 * 2.4;
        let offset = Vec2::new(angle.cos(), angle.sin().abs()) * 0.4;
        world.spawn((
            Position(offset),
            KinematicBody::new_pushable(-1),
            ColliderSet::single(Collider2 {
                shape: Shape2::Box {
                    half_extents: Vec2::splat(0.5),
                },
                ..Default::default()
            }),
        ));
    }
    let resolver = world.spawn((
        Position(Vec2::ZERO),
        KinematicBody::new_pushable(10),
        ColliderSet::single(Collider2 {
            shape: Shape2::Box {
                half_extents: Vec2::splat(0.5),
            },
            ..Default::default()
        }),
    ));
    (world, MotionWorld::new(MotionConfig::default()), resolver)
}

/// A platformer character on a floor with a wall to climb and a gap to
/// cross, driven by a scripted input loop.
pub fn setup_platformer_course() -> (hecs::World, MotionWorld, hecs::Entity) {
    let mut world = hecs::World::new();
    spawn_static_box(&mut world, Vec2::new(0.0, -1.0), Vec2::new(30.0, 0.5));
    spawn_static_box(&mut world, Vec2::new(12.0, 2.0), Vec2::new(0.5, 3.0));
    spawn_static_box(&mut world, Vec2::new(6.0, 1.0), Vec2::new(2.0, 0.25));

    let player = world.spawn((
        Position(Vec2::new(-8.0, 0.2)),
        KinematicBody::new(),
        Platformer::new(PlatformerConfig::default()),
        ColliderSet::single(Collider2 {
            shape: Shape2::Box {
                half_extents: Vec2::splat(0.5),
            },
            ..Default::default()
        }),
    ));
    (world, MotionWorld::new(MotionConfig::default()), player)
}

/// Run the platformer course for `frames` fixed steps with scripted input:
/// run right, jumping every half second.
pub fn drive_platformer(world: &mut hecs::World, motion: &mut MotionWorld, frames: usize) {
    let dt = 1.0 / 60.0;
    let config = motion.config().clone();
    for frame in 0..frames {
        let jump = frame % 30 == 0;
        for (_, platformer) in world.query_mut::<&mut Platformer>() {
            platformer.input = PlatformerInput {
                move_x: 1.0,
                run_held: true,
                jump_pressed: jump,
                jump_held: jump,
                ..Default::default()
            };
        }
        strider::platformer_system(world, &config, dt);
        motion.fixed_step(world, dt);
    }
}
