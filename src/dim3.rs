//! 3D analogue of the kinematic motion core.
//!
//! The same swept-cast, margin, tangent-redirect and classification rules
//! as the 2D core, generalized to three dimensions. Deliberately smaller
//! in scope: no push arbitration, one-way surfaces, or contact tracking.
//! A 3D character or probe body that needs those composes them on top.

use std::collections::{HashMap, HashSet};

use glam::Vec3;
use tracing::debug;

use crate::motion::body::SurfaceKind;
use crate::query::LayerMask;

const CAST_EPS: f32 = 1e-6;

/// Axis-aligned 3D bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb3 {
    #[inline]
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    #[inline]
    pub fn overlaps(&self, other: &Aabb3) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    #[inline]
    pub fn union(&self, other: &Aabb3) -> Aabb3 {
        Aabb3 {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[inline]
    pub fn grown(&self, amount: f32) -> Aabb3 {
        Aabb3 {
            min: self.min - Vec3::splat(amount),
            max: self.max + Vec3::splat(amount),
        }
    }

    #[inline]
    pub fn translated(&self, offset: Vec3) -> Aabb3 {
        Aabb3 {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// 3D collision shape. Axis-aligned, like the 2D core's shapes.
#[derive(Debug, Clone)]
pub enum Shape3 {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
    /// Vertical capsule along Y.
    Capsule { radius: f32, half_height: f32 },
}

impl Shape3 {
    pub fn bounds(&self, center: Vec3) -> Aabb3 {
        match self {
            Shape3::Sphere { radius } => Aabb3::from_center(center, Vec3::splat(*radius)),
            Shape3::Box { half_extents } => Aabb3::from_center(center, *half_extents),
            Shape3::Capsule {
                radius,
                half_height,
            } => Aabb3::from_center(
                center,
                Vec3::new(*radius, *half_height + *radius, *radius),
            ),
        }
    }

    /// Rounded-box descriptor: inner box half extents plus dilation radius.
    fn descriptor(&self) -> (Vec3, f32) {
        match self {
            Shape3::Sphere { radius } => (Vec3::ZERO, *radius),
            Shape3::Box { half_extents } => (*half_extents, 0.0),
            Shape3::Capsule {
                radius,
                half_height,
            } => (Vec3::new(0.0, *half_height, 0.0), *radius),
        }
    }
}

/// One shape attached to a 3D body.
#[derive(Debug, Clone)]
pub struct Collider3 {
    pub shape: Shape3,
    pub offset: Vec3,
    pub layers: LayerMask,
}

impl Default for Collider3 {
    fn default() -> Self {
        Self {
            shape: Shape3::Box {
                half_extents: Vec3::splat(0.5),
            },
            offset: Vec3::ZERO,
            layers: LayerMask::ALL,
        }
    }
}

/// Authoritative 3D body location; mutated only by the motion routines.
#[derive(Debug, Clone, Copy, Default)]
pub struct Position3(pub Vec3);

/// Shapes attached to a 3D body.
#[derive(Debug, Clone, Default)]
pub struct ColliderSet3 {
    pub colliders: Vec<Collider3>,
}

impl ColliderSet3 {
    pub fn single(collider: Collider3) -> Self {
        Self {
            colliders: vec![collider],
        }
    }
}

/// 3D kinematic body state.
#[derive(Debug, Clone)]
pub struct KinematicBody3 {
    pub velocity: Vec3,
    pub gravity_multiplier: f32,
    /// Overall speed clamp.
    pub max_speed: f32,
    pub collide_layers: LayerMask,
    pub grounded: bool,
    pub ground_normal: Vec3,
    pub time_in_air: f32,
    pub(crate) ground_distance: f32,
}

impl KinematicBody3 {
    pub fn new() -> Self {
        Self {
            velocity: Vec3::ZERO,
            gravity_multiplier: 1.0,
            max_speed: 30.0,
            collide_layers: LayerMask::ALL,
            grounded: false,
            ground_normal: Vec3::Y,
            time_in_air: 0.0,
            ground_distance: f32::MAX,
        }
    }
}

impl Default for KinematicBody3 {
    fn default() -> Self {
        Self::new()
    }
}

/// Swept-cast result.
#[derive(Debug, Clone, Copy)]
pub struct SweepHit3 {
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
    pub entity: hecs::Entity,
}

/// Classify a 3D surface normal by its angle to world up/down (degrees).
#[inline]
pub fn classify_normal3(normal: Vec3, max_ground_angle: f32, max_ceiling_angle: f32) -> SurfaceKind {
    let up_angle = normal.dot(Vec3::Y).clamp(-1.0, 1.0).acos().to_degrees();
    if up_angle < max_ground_angle {
        SurfaceKind::Ground
    } else if 180.0 - up_angle < max_ceiling_angle {
        SurfaceKind::Ceiling
    } else {
        SurfaceKind::Wall
    }
}

/// The query capability the 3D core depends on.
pub trait SpatialQuery3 {
    fn prepare(&mut self, world: &hecs::World) {
        let _ = world;
    }

    #[allow(clippy::too_many_arguments)]
    fn sweep_cast(
        &self,
        world: &hecs::World,
        origin: Vec3,
        colliders: &[Collider3],
        direction: Vec3,
        distance: f32,
        filter: LayerMask,
        ignore: Option<hecs::Entity>,
        hits: &mut Vec<SweepHit3>,
    );
}

type CellKey = (i32, i32, i32);

#[derive(Debug, Clone, Copy)]
struct GridEntry3 {
    entity: hecs::Entity,
    shape_index: usize,
    bounds: Aabb3,
    layers: LayerMask,
}

/// Spatial hash grid over 3D collider bounds.
pub struct SpatialHashGrid3 {
    cell_size: f32,
    inflation: f32,
    cells: HashMap<CellKey, Vec<usize>>,
    entries: Vec<GridEntry3>,
}

impl Default for SpatialHashGrid3 {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialHashGrid3 {
    pub fn new() -> Self {
        Self {
            cell_size: 2.0,
            inflation: 0.5,
            cells: HashMap::new(),
            entries: Vec::new(),
        }
    }

    #[inline]
    fn cell_coords(&self, point: Vec3) -> CellKey {
        let inv = 1.0 / self.cell_size;
        (
            (point.x * inv).floor() as i32,
            (point.y * inv).floor() as i32,
            (point.z * inv).floor() as i32,
        )
    }

    fn insert(&mut self, index: usize, bounds: &Aabb3) {
        let min_cell = self.cell_coords(bounds.min);
        let max_cell = self.cell_coords(bounds.max);
        for cx in min_cell.0..=max_cell.0 {
            for cy in min_cell.1..=max_cell.1 {
                for cz in min_cell.2..=max_cell.2 {
                    self.cells.entry((cx, cy, cz)).or_default().push(index);
                }
            }
        }
    }
}

impl SpatialQuery3 for SpatialHashGrid3 {
    fn prepare(&mut self, world: &hecs::World) {
        self.cells.clear();
        self.entries.clear();

        let mut max_extent: f32 = 0.0;
        for (entity, (pos, set)) in world.query::<(&Position3, &ColliderSet3)>().iter() {
            for (shape_index, collider) in set.colliders.iter().enumerate() {
                let bounds = collider
                    .shape
                    .bounds(pos.0 + collider.offset)
                    .grown(self.inflation);
                let extent = bounds.size().max_element();
                if extent > max_extent {
                    max_extent = extent;
                }
                self.entries.push(GridEntry3 {
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
        origin: Vec3,
        colliders: &[Collider3],
        direction: Vec3,
        distance: f32,
        filter: LayerMask,
        ignore: Option<hecs::Entity>,
        hits: &mut Vec<SweepHit3>,
    ) {
        hits.clear();
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || distance <= 0.0 || colliders.is_empty() {
            return;
        }

        // Swept query region.
        let offset = direction * distance;
        let mut region: Option<Aabb3> = None;
        for collider in colliders {
            let start = collider.shape.bounds(origin + collider.offset);
            let swept = start.union(&start.translated(offset));
            region = Some(match region {
                Some(r) => r.union(&swept),
                None => swept,
            });
        }
        let Some(region) = region else {
            return;
        };
        let region = region.grown(self.inflation);

        let mut seen: HashSet<(hecs::Entity, usize)> = HashSet::new();
        let min_cell = self.cell_coords(region.min);
        let max_cell = self.cell_coords(region.max);
        for cx in min_cell.0..=max_cell.0 {
            for cy in min_cell.1..=max_cell.1 {
                for cz in min_cell.2..=max_cell.2 {
                    let Some(cell) = self.cells.get(&(cx, cy, cz)) else {
                        continue;
                    };
                    for &index in cell {
                        let entry = self.entries[index];
                        if Some(entry.entity) == ignore
                            || !filter.intersects(entry.layers)
                            || !entry.bounds.overlaps(&region)
                            || !seen.insert((entry.entity, entry.shape_index))
                        {
                            continue;
                        }
                        let Ok(pos) = world.get::<&Position3>(entry.entity) else {
                            continue;
                        };
                        let Ok(set) = world.get::<&ColliderSet3>(entry.entity) else {
                            continue;
                        };
                        let Some(other) = set.colliders.get(entry.shape_index) else {
                            continue;
                        };
                        let other_center = pos.0 + other.offset;
                        for caster in colliders {
                            if let Some((t, normal, point)) = cast_pair(
                                &caster.shape,
                                origin + caster.offset,
                                &other.shape,
                                other_center,
                                direction,
                                distance,
                            ) {
                                hits.push(SweepHit3 {
                                    distance: t,
                                    point,
                                    normal,
                                    entity: entry.entity,
                                });
                            }
                        }
                    }
                }
            }
        }

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if hits.len() > crate::query::MAX_QUERY_HITS {
            debug!(dropped = hits.len() - crate::query::MAX_QUERY_HITS, "3d sweep buffer full");
            hits.truncate(crate::query::MAX_QUERY_HITS);
        }
    }
}

/// Cast shape `a` against static shape `b` via their Minkowski rounded box.
fn cast_pair(
    a: &Shape3,
    a_center: Vec3,
    b: &Shape3,
    b_center: Vec3,
    direction: Vec3,
    distance: f32,
) -> Option<(f32, Vec3, Vec3)> {
    let (half_a, radius_a) = a.descriptor();
    let (half_b, radius_b) = b.descriptor();
    let half = half_a + half_b;
    let radius = radius_a + radius_b;
    let rel = a_center - b_center;

    let (t, normal) = ray_rounded_box3(rel, direction, distance, half, radius)?;
    let rel_at = rel + direction * t;
    let point = b_center + rel_at.clamp(-half, half);
    Some((t, normal, point))
}

/// Ray against a box dilated by `radius`. Edge and corner regions are
/// resolved with a sphere at the clamped surface point, a conservative
/// approximation that errs toward slightly early hits near edges.
fn ray_rounded_box3(
    origin: Vec3,
    dir: Vec3,
    max_t: f32,
    half: Vec3,
    radius: f32,
) -> Option<(f32, Vec3)> {
    let outer = half + Vec3::splat(radius);

    // Start in contact.
    let clamped = origin.clamp(-half, half);
    let to_surface = origin - clamped;
    let surface_dist = to_surface.length();
    if surface_dist <= radius + CAST_EPS {
        let normal = if surface_dist > CAST_EPS {
            to_surface / surface_dist
        } else {
            inner_face_normal3(origin, half)
        };
        return Some((0.0, normal));
    }

    let mut t_min = f32::MIN;
    let mut t_max = f32::MAX;
    let mut entry_axis = 0usize;
    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        if d.abs() < CAST_EPS {
            if o < -outer[axis] || o > outer[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t1 = (-outer[axis] - o) * inv;
        let mut t2 = (outer[axis] - o) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        if t1 > t_min {
            t_min = t1;
            entry_axis = axis;
        }
        t_max = t_max.min(t2);
    }
    if t_max < t_min || t_min > max_t || t_max < 0.0 {
        return None;
    }
    let t_min = t_min.max(0.0);

    let entry = origin + dir * t_min;
    let mut on_face = radius < CAST_EPS;
    if !on_face {
        on_face = (0..3)
            .filter(|&axis| axis != entry_axis)
            .all(|axis| entry[axis].abs() <= half[axis]);
    }
    if on_face {
        let mut normal = Vec3::ZERO;
        normal[entry_axis] = entry[entry_axis].signum();
        return Some((t_min, normal));
    }

    // Edge or corner: sphere at the nearest inner-box surface point.
    let nearest = entry.clamp(-half, half);
    let t = ray_sphere(origin - nearest, dir, radius, max_t)?;
    let normal = ((origin + dir * t) - nearest).normalize_or_zero();
    Some((t, normal))
}

fn ray_sphere(rel: Vec3, dir: Vec3, radius: f32, max_t: f32) -> Option<f32> {
    let b = rel.dot(dir);
    let c = rel.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    if t < 0.0 || t > max_t {
        return None;
    }
    Some(t)
}

fn inner_face_normal3(point: Vec3, half: Vec3) -> Vec3 {
    let mut best_axis = 0usize;
    let mut best_pen = f32::MAX;
    for axis in 0..3 {
        let pen = half[axis] - point[axis].abs();
        if pen < best_pen {
            best_pen = pen;
            best_axis = axis;
        }
    }
    let mut normal = Vec3::ZERO;
    normal[best_axis] = if point[best_axis] < 0.0 { -1.0 } else { 1.0 };
    normal
}

/// Configuration for the 3D simulation.
#[derive(Debug, Clone)]
pub struct Motion3Config {
    pub gravity: Vec3,
    pub margin: f32,
    pub min_slide_distance: f32,
    pub max_slide_iterations: u32,
    pub max_ground_angle: f32,
    pub max_ceiling_angle: f32,
    pub ground_check_distance: f32,
    pub launch_threshold: f32,
}

impl Default for Motion3Config {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            margin: 0.01,
            min_slide_distance: 1e-4,
            max_slide_iterations: 2,
            max_ground_angle: 50.0,
            max_ceiling_angle: 50.0,
            ground_check_distance: 0.1,
            launch_threshold: 0.1,
        }
    }
}

/// The 3D motion world.
pub struct Motion3World<Q: SpatialQuery3 = SpatialHashGrid3> {
    config: Motion3Config,
    query: Q,
}

impl Motion3World<SpatialHashGrid3> {
    pub fn new(config: Motion3Config) -> Self {
        Self::with_backend(config, SpatialHashGrid3::new())
    }
}

impl<Q: SpatialQuery3> Motion3World<Q> {
    pub fn with_backend(config: Motion3Config, query: Q) -> Self {
        Self { config, query }
    }

    pub fn config(&self) -> &Motion3Config {
        &self.config
    }

    /// Displace a body, sliding along obstructions.
    pub fn move_by(&mut self, world: &mut hecs::World, entity: hecs::Entity, delta: Vec3) -> Vec3 {
        self.query.prepare(world);
        self.slide(world, entity, delta, 0)
    }

    /// One fixed simulation step.
    pub fn fixed_step(&mut self, world: &mut hecs::World, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.query.prepare(world);

        let bodies: Vec<hecs::Entity> = world
            .query::<&KinematicBody3>()
            .iter()
            .map(|(entity, _)| entity)
            .collect();
        for entity in bodies {
            self.step_body(world, entity, dt);
        }
    }

    fn step_body(&mut self, world: &mut hecs::World, entity: hecs::Entity, dt: f32) {
        let Some(start) = read_position3(world, entity) else {
            return;
        };

        let probe = self.ground_probe(world, entity);
        let effective_normal;
        let displacement;
        {
            let Ok(mut body) = world.get::<&mut KinematicBody3>(entity) else {
                return;
            };
            let mut grounded = false;
            let mut normal = Vec3::Y;
            let mut ground_distance = f32::MAX;
            if let Some(hit) = &probe {
                if classify_normal3(
                    hit.normal,
                    self.config.max_ground_angle,
                    self.config.max_ceiling_angle,
                ) == SurfaceKind::Ground
                {
                    grounded = true;
                    normal = hit.normal;
                    ground_distance = hit.distance;
                }
            }
            if grounded && body.velocity.dot(normal) > self.config.launch_threshold {
                grounded = false;
                normal = Vec3::Y;
                ground_distance = f32::MAX;
            }
            body.grounded = grounded;
            body.ground_normal = normal;
            body.ground_distance = ground_distance;
            if grounded {
                body.time_in_air = 0.0;
            } else {
                body.time_in_air += dt;
            }

            if !body.velocity.is_finite() {
                body.velocity = Vec3::ZERO;
            }
            let resting = grounded && ground_distance <= self.config.margin * 1.5;
            if !resting {
                let gravity_multiplier = body.gravity_multiplier;
                body.velocity += self.config.gravity * dt * gravity_multiplier;
            }
            let speed = body.velocity.length();
            if speed > body.max_speed {
                let max_speed = body.max_speed;
                body.velocity *= max_speed / speed;
            }
            effective_normal = normal;
            displacement = body.velocity * dt;
        }

        // Ground-plane component first, then the normal component.
        let along_normal = effective_normal * displacement.dot(effective_normal);
        let along_plane = displacement - along_normal;
        self.slide(world, entity, along_plane, 0);
        self.slide(world, entity, along_normal, 0);

        let Some(end) = read_position3(world, entity) else {
            return;
        };
        let realized = (end - start) / dt;
        if let Ok(mut body) = world.get::<&mut KinematicBody3>(entity) {
            body.velocity = realized;
        }
    }

    fn slide(
        &self,
        world: &mut hecs::World,
        entity: hecs::Entity,
        delta: Vec3,
        iterations: u32,
    ) -> Vec3 {
        if iterations > self.config.max_slide_iterations {
            debug!(?entity, "3d slide iteration bound reached");
            return Vec3::ZERO;
        }
        if !delta.is_finite() {
            return Vec3::ZERO;
        }
        let length = delta.length();
        if length < self.config.min_slide_distance {
            return Vec3::ZERO;
        }
        let direction = delta / length;

        let Some((position, colliders, layers, velocity, grounded)) = snapshot3(world, entity)
        else {
            return Vec3::ZERO;
        };
        if colliders.is_empty() {
            translate3(world, entity, delta);
            return delta;
        }

        let mut hits = Vec::new();
        self.query.sweep_cast(
            world,
            position,
            &colliders,
            direction,
            length + self.config.margin,
            layers,
            Some(entity),
            &mut hits,
        );
        let Some(hit) = hits.first().copied() else {
            translate3(world, entity, delta);
            return delta;
        };

        if hit.distance <= 0.0 && velocity.dot(hit.normal) > 0.0 {
            return Vec3::ZERO;
        }

        let advance = (hit.distance - self.config.margin).max(0.0).min(length);
        let mut moved = Vec3::ZERO;
        if advance > 0.0 {
            moved = direction * advance;
            translate3(world, entity, moved);
        }
        let remaining = length - hit.distance.max(0.0);
        if remaining <= self.config.min_slide_distance {
            return moved;
        }

        let kind = classify_normal3(
            hit.normal,
            self.config.max_ground_angle,
            self.config.max_ceiling_angle,
        );
        let redirect = match kind {
            SurfaceKind::Ground => true,
            SurfaceKind::Ceiling => !grounded,
            // Walls deflect in 3D: grazing a wall continues along it
            // instead of stopping dead.
            SurfaceKind::Wall => true,
        };
        if !redirect {
            return moved;
        }

        // Project the remaining intent onto the contact plane; for ground
        // and ceiling hits only the horizontal part survives.
        let remainder = direction * remaining;
        let intent = if kind == SurfaceKind::Wall {
            remainder
        } else {
            Vec3::new(remainder.x, 0.0, remainder.z)
        };
        let redirected = intent - hit.normal * intent.dot(hit.normal);
        moved + self.slide(world, entity, redirected, iterations + 1)
    }

    fn ground_probe(&self, world: &hecs::World, entity: hecs::Entity) -> Option<SweepHit3> {
        let position = read_position3(world, entity)?;
        let body = world.get::<&KinematicBody3>(entity).ok()?;
        let layers = body.collide_layers;
        drop(body);
        let colliders = world
            .get::<&ColliderSet3>(entity)
            .map(|set| set.colliders.clone())
            .unwrap_or_default();
        if colliders.is_empty() {
            return None;
        }
        let mut hits = Vec::new();
        self.query.sweep_cast(
            world,
            position,
            &colliders,
            Vec3::NEG_Y,
            self.config.ground_check_distance,
            layers,
            Some(entity),
            &mut hits,
        );
        hits.first().copied()
    }
}

fn read_position3(world: &hecs::World, entity: hecs::Entity) -> Option<Vec3> {
    world.get::<&Position3>(entity).ok().map(|p| p.0)
}

type Snapshot3 = (Vec3, Vec<Collider3>, LayerMask, Vec3, bool);

fn snapshot3(world: &hecs::World, entity: hecs::Entity) -> Option<Snapshot3> {
    let position = read_position3(world, entity)?;
    let body = world.get::<&KinematicBody3>(entity).ok()?;
    let colliders = world
        .get::<&ColliderSet3>(entity)
        .map(|set| set.colliders.clone())
        .unwrap_or_default();
    Some((
        position,
        colliders,
        body.collide_layers,
        body.velocity,
        body.grounded,
    ))
}

fn translate3(world: &mut hecs::World, entity: hecs::Entity, delta: Vec3) {
    if let Ok(mut position) = world.get::<&mut Position3>(entity) {
        position.0 += delta;
    }
}
