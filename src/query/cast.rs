//! Analytic swept-shape tests.
//!
//! Every supported pair reduces to one primitive: a ray against a rounded
//! box (an axis-aligned box dilated by a radius). The Minkowski sum of two
//! shape descriptors gives the rounded box; circles are zero-size rounded
//! boxes, boxes are zero-radius ones, vertical capsules are rounded
//! segments, polygons contribute their bounding box.

use glam::Vec2;

use super::Shape2;

const CAST_EPS: f32 = 1e-6;

/// A box of `half` extents dilated by `radius`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RoundedBox {
    pub half: Vec2,
    pub radius: f32,
}

/// A resolved cast against a single obstacle shape.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CastHit {
    /// Travel distance before touch; zero when starting in contact.
    pub distance: f32,
    /// Surface normal facing the caster.
    pub normal: Vec2,
    /// Approximate contact point on the obstacle.
    pub point: Vec2,
}

/// Shape as a rounded box plus the offset of that box from the shape's
/// nominal center (non-zero only for polygons, whose bounding box need not
/// be centered on the collider origin).
pub(crate) fn descriptor(shape: &Shape2) -> (Vec2, RoundedBox) {
    match shape {
        Shape2::Circle { radius } => (
            Vec2::ZERO,
            RoundedBox {
                half: Vec2::ZERO,
                radius: *radius,
            },
        ),
        Shape2::Box { half_extents } => (
            Vec2::ZERO,
            RoundedBox {
                half: *half_extents,
                radius: 0.0,
            },
        ),
        Shape2::Capsule {
            radius,
            half_height,
        } => (
            Vec2::ZERO,
            RoundedBox {
                half: Vec2::new(0.0, *half_height),
                radius: *radius,
            },
        ),
        Shape2::Polygon { points } => {
            let bounds = shape.bounds(Vec2::ZERO);
            if points.is_empty() {
                (
                    Vec2::ZERO,
                    RoundedBox {
                        half: Vec2::ZERO,
                        radius: 0.0,
                    },
                )
            } else {
                (
                    bounds.center(),
                    RoundedBox {
                        half: bounds.size() * 0.5,
                        radius: 0.0,
                    },
                )
            }
        }
    }
}

/// Cast shape `a` moving from `a_center` along `direction` (unit length)
/// for `distance`, against static shape `b` at `b_center`.
pub(crate) fn cast_shape_pair(
    a: &Shape2,
    a_center: Vec2,
    b: &Shape2,
    b_center: Vec2,
    direction: Vec2,
    distance: f32,
) -> Option<CastHit> {
    let (a_off, da) = descriptor(a);
    let (b_off, db) = descriptor(b);
    let sum = RoundedBox {
        half: da.half + db.half,
        radius: da.radius + db.radius,
    };
    let rel = (a_center + a_off) - (b_center + b_off);

    let (t, normal) = ray_rounded_box(rel, direction, distance, &sum)?;
    let rel_at = rel + direction * t;
    let clamped = rel_at.clamp(-sum.half, sum.half);
    Some(CastHit {
        distance: t,
        normal,
        point: b_center + b_off + clamped,
    })
}

/// Static overlap test between two shapes.
pub(crate) fn overlap_shape_pair(a: &Shape2, a_center: Vec2, b: &Shape2, b_center: Vec2) -> bool {
    let (a_off, da) = descriptor(a);
    let (b_off, db) = descriptor(b);
    let half = da.half + db.half;
    let radius = da.radius + db.radius;
    let rel = (a_center + a_off) - (b_center + b_off);
    let clamped = rel.clamp(-half, half);
    (rel - clamped).length_squared() <= radius * radius + CAST_EPS
}

/// Ray from `origin` (relative to the box center) along unit `dir`, against
/// a rounded box. Returns travel distance and the surface normal at the
/// contact, or `None` when the ray misses within `max_t`.
fn ray_rounded_box(origin: Vec2, dir: Vec2, max_t: f32, rb: &RoundedBox) -> Option<(f32, Vec2)> {
    let outer = rb.half + Vec2::splat(rb.radius);

    // Start-in-contact: report distance zero with a separation normal so the
    // caller can apply its false-hit rule.
    let clamped = origin.clamp(-rb.half, rb.half);
    let to_surface = origin - clamped;
    let surface_dist = to_surface.length();
    if surface_dist <= rb.radius + CAST_EPS {
        let normal = if surface_dist > CAST_EPS {
            to_surface / surface_dist
        } else {
            inner_face_normal(origin, rb.half)
        };
        return Some((0.0, normal));
    }

    // Slab test against the dilated box.
    let mut t_min = f32::MIN;
    let mut t_max = f32::MAX;
    let mut entry_axis = 0usize;
    for axis in 0..2 {
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
    let other = 1 - entry_axis;
    if rb.radius < CAST_EPS || entry[other].abs() <= rb.half[other] {
        // Flat face.
        let mut normal = Vec2::ZERO;
        normal[entry_axis] = entry[entry_axis].signum();
        return Some((t_min, normal));
    }

    // Corner arc: a circle of the dilation radius at the nearest box corner.
    let corner = Vec2::new(
        rb.half.x.copysign(entry.x),
        rb.half.y.copysign(entry.y),
    );
    let t = ray_circle(origin - corner, dir, rb.radius, max_t)?;
    let normal = ((origin + dir * t) - corner).normalize_or_zero();
    Some((t, normal))
}

/// Ray against a circle of `radius` at the origin of `rel`'s frame.
fn ray_circle(rel: Vec2, dir: Vec2, radius: f32, max_t: f32) -> Option<f32> {
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

/// Axis face normal of least penetration for a point inside a box.
fn inner_face_normal(point: Vec2, half: Vec2) -> Vec2 {
    let pen_x = half.x - point.x.abs();
    let pen_y = half.y - point.y.abs();
    if pen_x < pen_y {
        Vec2::new(if point.x < 0.0 { -1.0 } else { 1.0 }, 0.0)
    } else {
        Vec2::new(0.0, if point.y < 0.0 { -1.0 } else { 1.0 })
    }
}
