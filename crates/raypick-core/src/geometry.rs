//! Intersection primitives used by the picking query.
//!
//! Everything here works on finite segments parameterized over `[0, 1]` from
//! `start` to `end`. Distances are compared squared; nothing in the hot path
//! takes a square root.

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Tolerance on barycentric bounds so rays through a shared edge hit one of
/// the adjacent triangles.
const EDGE_TOLERANCE: f32 = 1e-6;

/// Determinants smaller than this are treated as a segment parallel to the
/// triangle plane.
const PARALLEL_EPSILON: f32 = 1e-12;

/// A finite line segment in some reference space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Vec3,
    pub end: Vec3,
}

impl Segment {
    /// Creates a segment from `start` to `end`.
    #[must_use]
    pub const fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    /// Unnormalized direction, `end - start`.
    #[must_use]
    pub fn delta(&self) -> Vec3 {
        self.end - self.start
    }

    /// Normalized direction, or zero for a degenerate segment.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.delta().normalize_or_zero()
    }

    #[must_use]
    pub fn squared_length(&self) -> f32 {
        self.delta().length_squared()
    }

    /// Point at parameter `t`, where `0` is `start` and `1` is `end`.
    #[must_use]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.start + self.delta() * t
    }

    /// Both endpoints mapped through an affine transform.
    #[must_use]
    pub fn transformed(&self, transform: &Mat4) -> Self {
        Self {
            start: transform.transform_point3(self.start),
            end: transform.transform_point3(self.end),
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Creates a box from two corners, in any order.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// Box enclosing this one after an affine transform.
    #[must_use]
    pub fn transformed(&self, transform: &Mat4) -> Self {
        let corners = (0..8).map(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        });
        // Eight corners, never empty.
        Self::from_points(corners.map(|c| transform.transform_point3(c))).unwrap_or(*self)
    }
}

/// Intersects a segment with a box using the slab method.
///
/// Returns the segment parameter at which the segment enters the box. The
/// value is negative when `segment.start` already lies inside the box. Returns
/// `None` when the segment misses the box entirely.
#[must_use]
pub fn intersect_segment_aabb(segment: &Segment, aabb: &Aabb) -> Option<f32> {
    let origin = segment.start;
    let delta = segment.delta();

    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = delta[axis];
        let (lo, hi) = (aabb.min[axis], aabb.max[axis]);

        if d.abs() < f32::EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t0 = (lo - o) * inv;
        let mut t1 = (hi - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_exit < 0.0 || t_enter > 1.0 {
        return None;
    }

    // All three axes parallel and inside: the whole segment is in the box.
    if t_enter == f32::NEG_INFINITY {
        return Some(-1.0);
    }

    Some(t_enter)
}

/// Where a segment crossed a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentTriangleHit {
    /// Segment parameter in `[0, 1]`.
    pub t: f32,
    /// Barycentric weight of the second vertex.
    pub u: f32,
    /// Barycentric weight of the third vertex.
    pub v: f32,
}

/// Möller–Trumbore segment/triangle intersection. Both faces count.
#[must_use]
pub fn intersect_segment_triangle(
    segment: &Segment,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<SegmentTriangleHit> {
    let dir = segment.delta();
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = dir.cross(edge2);
    let a = edge1.dot(h);
    if a.abs() < PARALLEL_EPSILON {
        return None;
    }
    let f = 1.0 / a;
    let s = segment.start - v0;
    let u = f * s.dot(h);
    if !(-EDGE_TOLERANCE..=1.0 + EDGE_TOLERANCE).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = f * dir.dot(q);
    if v < -EDGE_TOLERANCE || u + v > 1.0 + EDGE_TOLERANCE {
        return None;
    }
    let t = f * edge2.dot(q);
    (0.0..=1.0).contains(&t).then_some(SegmentTriangleHit { t, u, v })
}

/// Nearest triangle crossed by a segment.
///
/// `triangles` yields `(triangle_index, [v0, v1, v2])`. Returns the index,
/// the segment parameter and the hit point of the smallest `t`. Ties keep the
/// earlier triangle.
pub fn nearest_segment_triangle<I>(segment: &Segment, triangles: I) -> Option<(u32, f32, Vec3)>
where
    I: IntoIterator<Item = (u32, [Vec3; 3])>,
{
    let mut best: Option<(u32, f32)> = None;
    for (index, [a, b, c]) in triangles {
        if let Some(hit) = intersect_segment_triangle(segment, a, b, c) {
            if best.map_or(true, |(_, best_t)| hit.t < best_t) {
                best = Some((index, hit.t));
            }
        }
    }
    best.map(|(index, t)| (index, t, segment.point_at(t)))
}

/// Barycentric weights of `p` relative to triangle `(a, b, c)`.
///
/// Weights come from ratios of signed sub-triangle areas projected onto the
/// triangle normal, so `p` may lie slightly off the plane. Points outside the
/// triangle produce negative weights. Returns `None` for a degenerate
/// triangle.
#[must_use]
pub fn barycentric(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    let normal = (b - a).cross(c - a).try_normalize()?;

    let signed_area = |p0: Vec3, p1: Vec3, p2: Vec3| (p1 - p0).cross(p2 - p0).dot(normal);

    let area = signed_area(a, b, c);
    if area.abs() <= f32::EPSILON * f32::EPSILON {
        return None;
    }
    let w_a = signed_area(p, b, c) / area;
    let w_b = signed_area(p, c, a) / area;
    Some(Vec3::new(w_a, w_b, 1.0 - w_a - w_b))
}

/// Interpolates per-vertex 2D attributes with barycentric weights.
#[must_use]
pub fn interpolate(weights: Vec3, a: Vec2, b: Vec2, c: Vec2) -> Vec2 {
    a * weights.x + b * weights.y + c * weights.z
}

/// Wraps a value into `[0, 1)` with floor semantics, so `-0.3` becomes `0.7`.
#[must_use]
pub fn wrap_unit(value: f32) -> f32 {
    let mut wrapped = value - value.floor();
    if wrapped < 0.0 {
        wrapped += 1.0;
    }
    // `x - floor(x)` rounds up to exactly 1.0 for tiny negative inputs.
    if wrapped >= 1.0 {
        wrapped = 0.0;
    }
    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::ZERO, Vec3::ONE)
    }

    #[test]
    fn test_segment_misses_box() {
        let seg = Segment::new(Vec3::new(-1.0, 2.0, 0.5), Vec3::new(2.0, 2.0, 0.5));
        assert!(intersect_segment_aabb(&seg, &unit_box()).is_none());
    }

    #[test]
    fn test_segment_enters_box() {
        let seg = Segment::new(Vec3::new(-1.0, 0.5, 0.5), Vec3::new(3.0, 0.5, 0.5));
        let t = intersect_segment_aabb(&seg, &unit_box()).unwrap();
        assert!((t - 0.25).abs() < 1e-6);
        assert!((seg.point_at(t) - Vec3::new(0.0, 0.5, 0.5)).length() < 1e-6);
    }

    #[test]
    fn test_segment_starting_inside_box_is_negative() {
        let seg = Segment::new(Vec3::splat(0.5), Vec3::new(4.0, 0.5, 0.5));
        let t = intersect_segment_aabb(&seg, &unit_box()).unwrap();
        assert!(t < 0.0);
    }

    #[test]
    fn test_segment_fully_inside_parallel() {
        let seg = Segment::new(Vec3::splat(0.25), Vec3::splat(0.25));
        assert_eq!(intersect_segment_aabb(&seg, &unit_box()), Some(-1.0));
    }

    #[test]
    fn test_segment_stops_short_of_box() {
        let seg = Segment::new(Vec3::new(-3.0, 0.5, 0.5), Vec3::new(-1.0, 0.5, 0.5));
        assert!(intersect_segment_aabb(&seg, &unit_box()).is_none());
    }

    #[test]
    fn test_segment_pointing_away_from_box() {
        let seg = Segment::new(Vec3::new(2.0, 0.5, 0.5), Vec3::new(5.0, 0.5, 0.5));
        assert!(intersect_segment_aabb(&seg, &unit_box()).is_none());
    }

    #[test]
    fn test_segment_triangle_hit_and_miss() {
        let (a, b, c) = (
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let through = Segment::new(Vec3::new(0.25, 0.25, 1.0), Vec3::new(0.25, 0.25, -1.0));
        let hit = intersect_segment_triangle(&through, a, b, c).unwrap();
        assert!((hit.t - 0.5).abs() < 1e-6);

        let short = Segment::new(Vec3::new(0.25, 0.25, 2.0), Vec3::new(0.25, 0.25, 1.0));
        assert!(intersect_segment_triangle(&short, a, b, c).is_none());

        let outside = Segment::new(Vec3::new(2.0, 2.0, 1.0), Vec3::new(2.0, 2.0, -1.0));
        assert!(intersect_segment_triangle(&outside, a, b, c).is_none());
    }

    #[test]
    fn test_segment_triangle_back_face_counts() {
        let (a, b, c) = (
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        );
        let seg = Segment::new(Vec3::new(0.25, 0.25, 1.0), Vec3::new(0.25, 0.25, -1.0));
        assert!(intersect_segment_triangle(&seg, a, b, c).is_some());
    }

    #[test]
    fn test_nearest_triangle_prefers_smaller_t() {
        let far = [
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(0.0, 1.0, -1.0),
        ];
        let near = [
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(0.0, 1.0, 1.0),
        ];
        let seg = Segment::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -5.0));
        let (index, _, point) = nearest_segment_triangle(&seg, [(0, far), (1, near)]).unwrap();
        assert_eq!(index, 1);
        assert!((point.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_barycentric_at_vertices() {
        let (a, b, c) = (Vec3::ZERO, Vec3::X, Vec3::Y);
        assert_eq!(barycentric(a, a, b, c), Some(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(barycentric(b, a, b, c), Some(Vec3::new(0.0, 1.0, 0.0)));
        assert_eq!(barycentric(c, a, b, c), Some(Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_barycentric_ignores_plane_offset() {
        let (a, b, c) = (Vec3::ZERO, Vec3::X, Vec3::Y);
        let w = barycentric(Vec3::new(0.25, 0.25, 0.3), a, b, c).unwrap();
        assert!((w - Vec3::new(0.5, 0.25, 0.25)).length() < 1e-6);
    }

    #[test]
    fn test_barycentric_degenerate() {
        assert!(barycentric(Vec3::ZERO, Vec3::ZERO, Vec3::X, Vec3::X * 2.0).is_none());
    }

    #[test]
    fn test_wrap_unit() {
        assert!((wrap_unit(-0.3) - 0.7).abs() < 1e-6);
        assert!((wrap_unit(1.7) - 0.7).abs() < 1e-6);
        assert_eq!(wrap_unit(2.0), 0.0);
        assert_eq!(wrap_unit(-1e-9), 0.0);
    }

    #[test]
    fn test_aabb_transformed() {
        let moved = unit_box().transformed(&Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        assert_eq!(moved.min, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(moved.max, Vec3::new(6.0, 1.0, 1.0));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn wrap_unit_stays_in_range(v in -1.0e4f32..1.0e4) {
                let w = wrap_unit(v);
                prop_assert!((0.0..1.0).contains(&w));
            }

            #[test]
            fn barycentric_weights_sum_to_one(
                x in -2.0f32..2.0,
                y in -2.0f32..2.0,
            ) {
                let w = barycentric(Vec3::new(x, y, 0.0), Vec3::ZERO, Vec3::X, Vec3::Y).unwrap();
                prop_assert!((w.x + w.y + w.z - 1.0).abs() < 1e-5);
            }

            #[test]
            fn entry_point_lies_on_box(
                y in 0.01f32..0.99,
                z in 0.01f32..0.99,
                start_x in -10.0f32..-0.1,
            ) {
                let seg = Segment::new(Vec3::new(start_x, y, z), Vec3::new(10.0, y, z));
                let t = intersect_segment_aabb(&seg, &Aabb::new(Vec3::ZERO, Vec3::ONE)).unwrap();
                prop_assert!(t >= 0.0);
                prop_assert!(seg.point_at(t).x.abs() < 1e-4);
            }
        }
    }
}
