//! Motion engine benchmarks (iai-callgrind - instruction counts).
//!
//! Requires valgrind:
//!     cargo bench --manifest-path benchmarks/Cargo.toml --bench motion_iai

use std::hint::black_box;

use glam::Vec2;
use iai_callgrind::{library_benchmark, library_benchmark_group, main};
use strider::{move_by, resolve_overlaps, LayerMask, MotionConfig, SpatialQuery};
use strider_bench::*;

#[library_benchmark]
fn iai_cast_corridor_64() -> usize {
    let (world, grid, caster) = setup_corridor(64);
    let colliders = world
        .get::<&strider::ColliderSet>(caster)
        .unwrap()
        .colliders
        .clone();
    let mut hits = Vec::new();
    grid.sweep_cast(
        &world,
        Vec2::ZERO,
        black_box(&colliders),
        Vec2::X,
        160.0,
        LayerMask::ALL,
        Some(caster),
        &mut hits,
    );
    hits.len()
}

#[library_benchmark]
fn iai_slide_blocked() -> Vec2 {
    let (mut world, grid, body) = setup_corridor(32);
    move_by(
        &mut world,
        &grid,
        &MotionConfig::default(),
        body,
        black_box(Vec2::new(40.0, 1.5)),
    )
}

#[library_benchmark]
fn iai_resolve_crowd_16() -> bool {
    let (mut world, _motion, resolver) = setup_crowd(16);
    let mut grid = strider::SpatialHashGrid::new();
    grid.prepare(&world);
    resolve_overlaps(&mut world, &grid, &MotionConfig::default(), black_box(resolver))
}

#[library_benchmark]
fn iai_step_100_bodies() {
    let (mut world, mut motion) = setup_course(100);
    motion.fixed_step(&mut world, black_box(1.0 / 60.0));
}

#[library_benchmark]
fn iai_platformer_60_frames() {
    let (mut world, mut motion, _player) = setup_platformer_course();
    drive_platformer(&mut world, &mut motion, black_box(60));
}

library_benchmark_group!(
    name = motion;
    benchmarks = iai_cast_corridor_64,
        iai_slide_blocked,
        iai_resolve_crowd_16,
        iai_step_100_bodies,
        iai_platformer_60_frames
);

main!(library_benchmark_groups = motion);
