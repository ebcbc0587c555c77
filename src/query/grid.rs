//! Built-in spatial-query backend using a spatial hash grid.
//!
//! Broad phase: every collider's world bounds, inflated by a slop margin,
//! is hashed into grid cells once per fixed step. Casts and overlaps walk
//! the cells their query region covers and narrow-test the candidates
//! against current positions. The inflation absorbs the motion bodies make
//! within a single step, so the grid does not need mid-step rebuilds.

use std::collections::{HashMap, HashSet};

use glam::Vec2;
use tracing::debug;

use crate::geom::Bounds2;
use crate::motion::body::{ColliderSet, Position};

use super::cast::{cast_shape_pair, overlap_shape_pair};
use super::{Collider2, LayerMask, OverlapHit, SpatialQuery, SweepHit, MAX_QUERY_HITS};

type CellKey = (i32, i32);

#[derive(Debug, Clone, Copy)]
struct GridEntry {
    entity: hecs::Entity,
    shape_index: usize,
    bounds: Bounds2,
    layers: LayerMask,
}

/// Spatial hash grid over collider bounds, O(n) average-case candidate
/// lookup.
pub struct SpatialHashGrid {
    cell_size: f32,
    /// Extra margin added to inserted bounds so entries stay valid while
    /// bodies move within the step.
    inflation: f32,
    cells: HashMap<CellKey, Vec<usize>>,
    entries: Vec<GridEntry>,
}

impl Default for SpatialHashGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialHashGrid {
    pub fn new() -> Self {
        Self {
            cell_size: 2.0,
            inflation: 0.5,
            cells: HashMap::new(),
            entries: Vec::new(),
        }
    }

    #[inline]
    fn cell_coords(&self, point: Vec2) -> CellKey {
        let inv = 1.0 / self.cell_size;
        ((point.x * inv).floor() as i32, (point.y * inv).floor() as i32)
    }

    fn insert(&mut self, index: usize, bounds: &Bounds2) {
        let min_cell = self.cell_coords(bounds.min);
        let max_cell = self.cell_coords(bounds.max);
        for cx in min_cell.0..=max_cell.0 {
            for cy in min_cell.1..=max_cell.1 {
                self.cells.entry((cx, cy)).or_default().push(index);
            }
        }
    }

    /// Deduplicated entries whose inflated bounds touch `region`.
    fn candidates(
        &self,
        region: &Bounds2,
        filter: LayerMask,
        ignore: Option<hecs::Entity>,
    ) -> Vec<GridEntry> {
        let mut seen: HashSet<(hecs::Entity, usize)> = HashSet::new();
        let mut out = Vec::new();

        let min_cell = self.cell_coords(region.min);
        let max_cell = self.cell_coords(region.max);
        for cx in min_cell.0..=max_cell.0 {
            for cy in min_cell.1..=max_cell.1 {
                let Some(cell) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                for &index in cell {
                    let entry = self.entries[index];
                    if Some(entry.entity) == ignore {
                        continue;
                    }
                    if !filter.intersects(entry.layers) {
                        continue;
                    }
                    if !entry.bounds.overlaps(region) {
                        continue;
                    }
                    if seen.insert((entry.entity, entry.shape_index)) {
                        out.push(entry);
                    }
                }
            }
        }
        out
    }

    /// Region covered by `colliders` swept from `origin` along
    /// `direction * distance`.
    fn swept_region(
        origin: Vec2,
        colliders: &[Collider2],
        direction: Vec2,
        distance: f32,
    ) -> Bounds2 {
        let offset = direction * distance;
        let mut region: Option<Bounds2> = None;
        for collider in colliders {
            let start = collider.shape.bounds(origin + collider.offset);
            let swept = start.union(&start.translated(offset));
            region = Some(match region {
                Some(r) => r.union(&swept),
                None => swept,
            });
        }
        region.unwrap_or(Bounds2 {
            min: origin,
            max: origin,
        })
    }

    /// Current shape of `entity`'s collider at `shape_index`, read from the
    /// world rather than the (possibly stale) grid entry.
    fn resolve_shape(
        world: &hecs::World,
        entity: hecs::Entity,
        shape_index: usize,
    ) -> Option<(Vec2, Collider2)> {
        let pos = world.get::<&Position>(entity).ok()?.0;
        let set = world.get::<&ColliderSet>(entity).ok()?;
        let collider = set.colliders.get(shape_index)?.clone();
        Some((pos, collider))
    }
}

impl SpatialQuery for SpatialHashGrid {
    fn prepare(&mut self, world: &hecs::World) {
        self.cells.clear();
        self.entries.clear();

        // Size cells to the largest collider so a shape rarely spans more
        // than a handful of cells.
        let mut max_extent: f32 = 0.0;
        for (entity, (pos, set)) in world.query::<(&Position, &ColliderSet)>().iter() {
            for (shape_index, collider) in set.colliders.iter().enumerate() {
                let bounds = collider
                    .shape
                    .bounds(pos.0 + collider.offset)
                    .grown(self.inflation);
                let extent = bounds.size().max_element();
                if extent > max_extent {
                    max_extent = extent;
                }
                self.entries.push(GridEntry {
                    entity,
                    shape_index,
                    bounds,
                    layers: collider.layers,
                });
            }
        }
        self.cell_size = (max_extent * 2.0).max(1.0);

        for index in 0..self.entries.len() {
            let bounds = self.entries[index].bounds;
            self.insert(index, &bounds);
        }
    }

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
    ) {
        hits.clear();
        let direction = direction.normalize_or_zero();
        if direction == Vec2::ZERO || distance <= 0.0 || colliders.is_empty() {
            return;
        }

        let region = Self::swept_region(origin, colliders, direction, distance).grown(self.inflation);
        for entry in self.candidates(&region, filter, ignore) {
            let Some((other_pos, other)) = Self::resolve_shape(world, entry.entity, entry.shape_index)
            else {
                continue;
            };
            for caster in colliders {
                let Some(hit) = cast_shape_pair(
                    &caster.shape,
                    origin + caster.offset,
                    &other.shape,
                    other_pos + other.offset,
                    direction,
                    distance,
                ) else {
                    continue;
                };
                hits.push(SweepHit {
                    distance: hit.distance,
                    point: hit.point,
                    normal: hit.normal,
                    entity: entry.entity,
                    shape_index: entry.shape_index,
                    one_way: other.one_way,
                    is_sensor: other.is_sensor,
                });
            }
        }

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if hits.len() > MAX_QUERY_HITS {
            debug!(dropped = hits.len() - MAX_QUERY_HITS, "sweep hit buffer full");
            hits.truncate(MAX_QUERY_HITS);
        }
    }

    fn overlap(
        &self,
        world: &hecs::World,
        origin: Vec2,
        colliders: &[Collider2],
        filter: LayerMask,
        ignore: Option<hecs::Entity>,
        hits: &mut Vec<OverlapHit>,
    ) {
        hits.clear();
        if colliders.is_empty() {
            return;
        }

        let region = Self::swept_region(origin, colliders, Vec2::ZERO, 0.0).grown(self.inflation);
        for entry in self.candidates(&region, filter, ignore) {
            let Some((other_pos, other)) = Self::resolve_shape(world, entry.entity, entry.shape_index)
            else {
                continue;
            };
            let other_center = other_pos + other.offset;
            let touching = colliders.iter().any(|caster| {
                overlap_shape_pair(&caster.shape, origin + caster.offset, &other.shape, other_center)
            });
            if !touching {
                continue;
            }
            if hits.len() == MAX_QUERY_HITS {
                debug!("overlap hit buffer full");
                break;
            }
            hits.push(OverlapHit {
                entity: entry.entity,
                shape_index: entry.shape_index,
                bounds: other.shape.bounds(other_center),
                one_way: other.one_way,
                is_sensor: other.is_sensor,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::body::{ColliderSet, Position};
    use crate::query::Shape2;

    fn static_box(world: &mut hecs::World, center: Vec2, half: Vec2) -> hecs::Entity {
        world.spawn((
            Position(center),
            ColliderSet::single(Collider2 {
                shape: Shape2::Box { half_extents: half },
                ..Default::default()
            }),
        ))
    }

    #[test]
    fn test_cast_hits_nearest_first() {
        let mut world = hecs::World::new();
        let near = static_box(&mut world, Vec2::new(3.0, 0.0), Vec2::splat(0.5));
        let _far = static_box(&mut world, Vec2::new(6.0, 0.0), Vec2::splat(0.5));

        let mut grid = SpatialHashGrid::new();
        grid.prepare(&world);

        let caster = [Collider2 {
            shape: Shape2::Box {
                half_extents: Vec2::splat(0.5),
            },
            ..Default::default()
        }];
        let mut hits = Vec::new();
        grid.sweep_cast(
            &world,
            Vec2::ZERO,
            &caster,
            Vec2::X,
            10.0,
            LayerMask::ALL,
            None,
            &mut hits,
        );

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entity, near);
        assert!((hits[0].distance - 2.0).abs() < 1e-5, "d = {}", hits[0].distance);
        assert!(hits[0].distance < hits[1].distance);
    }

    #[test]
    fn test_cast_respects_ignore_and_layers() {
        let mut world = hecs::World::new();
        let wall = static_box(&mut world, Vec2::new(3.0, 0.0), Vec2::splat(0.5));
        let caster = [Collider2 {
            shape: Shape2::Circle { radius: 0.5 },
            ..Default::default()
        }];

        let mut grid = SpatialHashGrid::new();
        grid.prepare(&world);

        let mut hits = Vec::new();
        grid.sweep_cast(
            &world,
            Vec2::ZERO,
            &caster,
            Vec2::X,
            10.0,
            LayerMask::ALL,
            Some(wall),
            &mut hits,
        );
        assert!(hits.is_empty(), "ignored entity still reported");

        grid.sweep_cast(
            &world,
            Vec2::ZERO,
            &caster,
            Vec2::X,
            10.0,
            LayerMask::NONE,
            None,
            &mut hits,
        );
        assert!(hits.is_empty(), "layer filter not applied");
    }

    #[test]
    fn test_overlap_reports_touching_shapes() {
        let mut world = hecs::World::new();
        let block = static_box(&mut world, Vec2::new(0.5, 0.0), Vec2::splat(0.5));
        let _away = static_box(&mut world, Vec2::new(10.0, 0.0), Vec2::splat(0.5));

        let mut grid = SpatialHashGrid::new();
        grid.prepare(&world);

        let caster = [Collider2 {
            shape: Shape2::Box {
                half_extents: Vec2::splat(0.5),
            },
            ..Default::default()
        }];
        let mut hits = Vec::new();
        grid.overlap(&world, Vec2::ZERO, &caster, LayerMask::ALL, None, &mut hits);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity, block);
    }

    #[test]
    fn test_cast_buffer_truncates() {
        let mut world = hecs::World::new();
        // A corridor with more obstacles than the hit buffer holds.
        for i in 0..(MAX_QUERY_HITS + 6) {
            static_box(&mut world, Vec2::new(2.0 + i as f32, 0.0), Vec2::splat(0.3));
        }
        let mut grid = SpatialHashGrid::new();
        grid.prepare(&world);

        let caster = [Collider2 {
            shape: Shape2::Circle { radius: 0.2 },
            ..Default::default()
        }];
        let mut hits = Vec::new();
        grid.sweep_cast(
            &world,
            Vec2::ZERO,
            &caster,
            Vec2::X,
            100.0,
            LayerMask::ALL,
            None,
            &mut hits,
        );
        assert_eq!(hits.len(), MAX_QUERY_HITS);
        // Closest hits survive truncation.
        assert!((hits[0].distance - 1.5).abs() < 1e-4, "d = {}", hits[0].distance);
    }
}
