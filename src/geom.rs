//! Pure 2D geometry helpers used by the motion core.

use glam::Vec2;

/// Tolerance for rejecting near-parallel segment pairs.
const PARALLEL_EPS: f32 = 1e-6;

/// Axis-aligned 2D bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds2 {
    /// Construct bounds from a center point and half extents.
    #[inline]
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Test whether two bounds overlap (shared edges count as overlap).
    #[inline]
    pub fn overlaps(&self, other: &Bounds2) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Smallest bounds containing both inputs.
    #[inline]
    pub fn union(&self, other: &Bounds2) -> Bounds2 {
        Bounds2 {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Bounds grown by `amount` on every side.
    #[inline]
    pub fn grown(&self, amount: f32) -> Bounds2 {
        Bounds2 {
            min: self.min - Vec2::splat(amount),
            max: self.max + Vec2::splat(amount),
        }
    }

    /// Bounds displaced by `offset`.
    #[inline]
    pub fn translated(&self, offset: Vec2) -> Bounds2 {
        Bounds2 {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

/// Intersection of two bounds. Zero-size bounds at `a`'s center when disjoint.
#[inline]
pub fn bounds_overlap(a: &Bounds2, b: &Bounds2) -> Bounds2 {
    if !a.overlaps(b) {
        let c = a.center();
        return Bounds2 { min: c, max: c };
    }
    Bounds2 {
        min: a.min.max(b.min),
        max: a.max.min(b.max),
    }
}

/// Intersection point of segments `p1->p2` and `q1->q2`.
///
/// Standard parametric cross-product test. Near-parallel pairs are rejected
/// rather than producing an unstable solution.
pub fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> Option<Vec2> {
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = r.perp_dot(s);
    if denom.abs() < PARALLEL_EPS {
        return None;
    }
    let qp = q1 - p1;
    let t = qp.perp_dot(s) / denom;
    let u = qp.perp_dot(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(p1 + r * t)
    } else {
        None
    }
}

/// Intersection point of the infinite lines through `p1->p2` and `q1->q2`.
fn lines_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> Option<Vec2> {
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = r.perp_dot(s);
    if denom.abs() < PARALLEL_EPS {
        return None;
    }
    let t = (q1 - p1).perp_dot(s) / denom;
    Some(p1 + r * t)
}

/// Signed polygon area via the shoelace formula.
///
/// Positive for counter-clockwise winding, negative for clockwise.
pub fn signed_area(polygon: &[Vec2]) -> f32 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        sum += a.perp_dot(b);
    }
    sum * 0.5
}

/// Distance from `point` to the segment `a->b`.
pub fn point_segment_distance(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < PARALLEL_EPS {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

/// Offset every edge of `polygon` outward by `amount`, joining adjacent
/// offset edges at their line intersection (miter joins).
///
/// Winding is detected from the signed area; degenerate polygons (fewer
/// than three vertices or near-parallel adjacent edges) are returned
/// unchanged at the affected vertex.
pub fn offset_polygon(polygon: &[Vec2], amount: f32) -> Vec<Vec2> {
    let n = polygon.len();
    if n < 3 {
        return polygon.to_vec();
    }
    // Outward is left of each edge for clockwise winding, right for CCW.
    let outward_sign = if signed_area(polygon) > 0.0 { -1.0 } else { 1.0 };

    let mut result = Vec::with_capacity(n);
    for i in 0..n {
        let prev = polygon[(i + n - 1) % n];
        let curr = polygon[i];
        let next = polygon[(i + 1) % n];

        let n1 = (curr - prev).perp().normalize_or_zero() * outward_sign;
        let n2 = (next - curr).perp().normalize_or_zero() * outward_sign;

        let a1 = prev + n1 * amount;
        let a2 = curr + n1 * amount;
        let b1 = curr + n2 * amount;
        let b2 = next + n2 * amount;

        match lines_intersect(a1, a2, b1, b2) {
            Some(p) => result.push(p),
            // Collinear edges: both offset lines coincide.
            None => result.push(curr + n1 * amount),
        }
    }
    result
}

/// Bounds `target` must occupy to clear `obstacle` by `min_gap` when moved
/// along `direction`.
///
/// Built from a ray cast out of the target's center: one intersection test
/// finds where the ray leaves the obstacle (its far face), a second finds
/// where the reversed ray leaves the target (its trailing face). The sum of
/// the two distances plus the gap is the required translation. Returns the
/// target unchanged when the bounds are already disjoint or the direction
/// is degenerate.
pub fn separation_bounds(
    target: &Bounds2,
    obstacle: &Bounds2,
    direction: Vec2,
    min_gap: f32,
) -> Bounds2 {
    if !target.overlaps(obstacle) {
        return *target;
    }
    let dir = direction.normalize_or_zero();
    if dir == Vec2::ZERO {
        return *target;
    }

    let center = target.center();
    let exit = match bounds_ray_exit(obstacle, center, dir) {
        Some(t) => t,
        // Center already outside the obstacle on the exit side: the overlap
        // region's extent along the direction bounds the remaining depth.
        None => {
            let region = bounds_overlap(target, obstacle).size();
            region.x * dir.x.abs() + region.y * dir.y.abs()
        }
    };
    // Trailing extent of the target behind its center, along the reversed ray.
    let trail = bounds_ray_exit(target, center, -dir).unwrap_or(0.0);

    target.translated(dir * (exit + trail + min_gap))
}

/// Distance from `origin` along `dir` to the point where the ray exits
/// `bounds`, found by intersecting the ray with each of the four edges.
fn bounds_ray_exit(bounds: &Bounds2, origin: Vec2, dir: Vec2) -> Option<f32> {
    let reach = (bounds.size().x + bounds.size().y) * 2.0 + 1.0;
    let end = origin + dir * reach;

    let corners = [
        bounds.min,
        Vec2::new(bounds.max.x, bounds.min.y),
        bounds.max,
        Vec2::new(bounds.min.x, bounds.max.y),
    ];

    let mut farthest: Option<f32> = None;
    for i in 0..4 {
        if let Some(p) = segments_intersect(origin, end, corners[i], corners[(i + 1) % 4]) {
            let t = p.distance(origin);
            if farthest.map_or(true, |f| t > f) {
                farthest = Some(t);
            }
        }
    }
    farthest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_overlap_intersecting() {
        let a = Bounds2 {
            min: Vec2::new(-1.0, -1.0),
            max: Vec2::new(1.0, 1.0),
        };
        let b = Bounds2 {
            min: Vec2::new(0.5, 0.0),
            max: Vec2::new(2.0, 2.0),
        };
        let region = bounds_overlap(&a, &b);
        let eps = 1e-6;
        assert!((region.min - Vec2::new(0.5, 0.0)).length() < eps);
        assert!((region.max - Vec2::new(1.0, 1.0)).length() < eps);
    }

    #[test]
    fn test_bounds_overlap_disjoint_is_zero_size() {
        let a = Bounds2 {
            min: Vec2::ZERO,
            max: Vec2::ONE,
        };
        let b = Bounds2 {
            min: Vec2::new(5.0, 5.0),
            max: Vec2::new(6.0, 6.0),
        };
        let region = bounds_overlap(&a, &b);
        assert_eq!(region.size(), Vec2::ZERO);
    }

    #[test]
    fn test_segments_intersect_crossing() {
        let p = segments_intersect(
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, -1.0),
            Vec2::new(0.0, 1.0),
        );
        assert!(p.is_some());
        assert!(p.unwrap().length() < 1e-6);
    }

    #[test]
    fn test_segments_intersect_parallel_rejected() {
        let p = segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
        );
        assert!(p.is_none());
    }

    #[test]
    fn test_segments_intersect_out_of_range() {
        // Lines cross but the segments stop short of the crossing point.
        let p = segments_intersect(
            Vec2::new(-1.0, 0.0),
            Vec2::new(-0.5, 0.0),
            Vec2::new(0.0, -1.0),
            Vec2::new(0.0, 1.0),
        );
        assert!(p.is_none());
    }

    #[test]
    fn test_signed_area_winding() {
        let ccw = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        let area = signed_area(&ccw);
        assert!((area - 4.0).abs() < 1e-6, "ccw area = {area}");

        let cw: Vec<Vec2> = ccw.iter().rev().copied().collect();
        assert!((signed_area(&cw) + 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_point_segment_distance() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(2.0, 0.0);
        assert!((point_segment_distance(Vec2::new(1.0, 1.5), a, b) - 1.5).abs() < 1e-6);
        // Beyond the endpoint the nearest feature is the endpoint itself.
        assert!((point_segment_distance(Vec2::new(3.0, 0.0), a, b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_offset_polygon_grows_square() {
        let square = [
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
        ];
        let grown = offset_polygon(&square, 0.5);
        assert_eq!(grown.len(), 4);
        for v in &grown {
            assert!((v.x.abs() - 1.5).abs() < 1e-5, "vertex = {v:?}");
            assert!((v.y.abs() - 1.5).abs() < 1e-5, "vertex = {v:?}");
        }
        // Area scales with the offset.
        assert!((signed_area(&grown) - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_separation_bounds_moves_clear() {
        let target = Bounds2::from_center(Vec2::new(0.3, 0.0), Vec2::splat(0.5));
        let obstacle = Bounds2::from_center(Vec2::ZERO, Vec2::splat(0.5));
        let gap = 0.01;

        let moved = separation_bounds(&target, &obstacle, Vec2::X, gap);
        assert!(!moved.overlaps(&obstacle), "moved = {moved:?}");
        assert!(moved.min.x >= obstacle.max.x + gap - 1e-5);
        // Vertical placement is untouched.
        assert!((moved.min.y - target.min.y).abs() < 1e-6);
    }

    #[test]
    fn test_separation_bounds_disjoint_unchanged() {
        let target = Bounds2::from_center(Vec2::new(5.0, 0.0), Vec2::splat(0.5));
        let obstacle = Bounds2::from_center(Vec2::ZERO, Vec2::splat(0.5));
        let moved = separation_bounds(&target, &obstacle, Vec2::X, 0.1);
        assert_eq!(moved, target);
    }

    #[test]
    fn test_separation_bounds_diagonal_direction() {
        let target = Bounds2::from_center(Vec2::new(0.1, 0.1), Vec2::splat(0.5));
        let obstacle = Bounds2::from_center(Vec2::ZERO, Vec2::splat(0.5));
        let dir = Vec2::new(1.0, 1.0).normalize();
        let moved = separation_bounds(&target, &obstacle, dir, 0.01);
        assert!(!moved.overlaps(&obstacle), "moved = {moved:?}");
    }
}
