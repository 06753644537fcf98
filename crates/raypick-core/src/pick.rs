//! Picking result.

use glam::{Mat4, Vec2, Vec3};

use crate::geometry::{barycentric, interpolate, wrap_unit};
use crate::scene::{ContainerId, NodeId, SceneGeometry, TriangleHit};

/// Best hit found by a picking query.
///
/// A query resets the result, then replaces the hit each time it finds a
/// strictly closer triangle. Distances are squared and measured in the
/// reference space: the container the query segment was given in, or the
/// picked object's own space for single-object queries.
#[derive(Debug, Clone, PartialEq)]
pub struct PickResult {
    hit_object: Option<NodeId>,
    geometry_index: u32,
    triangle_index: u32,
    local_point: Vec3,
    local_to_reference: Mat4,
    reference_container: Option<ContainerId>,
    reference_start: Vec3,
    nearest_squared_distance: f32,
}

impl Default for PickResult {
    fn default() -> Self {
        Self {
            hit_object: None,
            geometry_index: 0,
            triangle_index: 0,
            local_point: Vec3::ZERO,
            local_to_reference: Mat4::IDENTITY,
            reference_container: None,
            reference_start: Vec3::ZERO,
            nearest_squared_distance: -1.0,
        }
    }
}

impl PickResult {
    /// Creates an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the hit and the reference space.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Forgets any previous hit and starts a query whose segment begins at
    /// `reference_start` in the space of `reference_container`.
    pub fn begin(&mut self, reference_container: Option<ContainerId>, reference_start: Vec3) {
        *self = Self {
            reference_container,
            reference_start,
            ..Self::default()
        };
    }

    /// Records a hit if it is the first one or strictly closer than the
    /// current one. Returns whether the hit was taken.
    pub fn offer(
        &mut self,
        node: NodeId,
        hit: &TriangleHit,
        local_to_reference: Mat4,
        squared_distance: f32,
    ) -> bool {
        if self.has_hit() && squared_distance >= self.nearest_squared_distance {
            return false;
        }
        self.hit_object = Some(node);
        self.geometry_index = hit.geometry_index;
        self.triangle_index = hit.triangle_index;
        self.local_point = hit.point;
        self.local_to_reference = local_to_reference;
        self.nearest_squared_distance = squared_distance;
        true
    }

    /// Whether any hit has been recorded since the last [`PickResult::begin`].
    pub fn has_hit(&self) -> bool {
        self.hit_object.is_some() && self.nearest_squared_distance >= 0.0
    }

    /// The picked node.
    pub fn hit_object(&self) -> Option<NodeId> {
        self.hit_object
    }

    /// Sub-mesh of the picked triangle.
    pub fn geometry_index(&self) -> u32 {
        self.geometry_index
    }

    /// Index of the picked triangle within its sub-mesh.
    pub fn triangle_index(&self) -> u32 {
        self.triangle_index
    }

    /// Hit point in the picked node's local space.
    pub fn local_point(&self) -> Vec3 {
        self.local_point
    }

    /// Hit point in reference space.
    pub fn reference_point(&self) -> Vec3 {
        self.local_to_reference.transform_point3(self.local_point)
    }

    /// Transform from the picked node's local space into reference space.
    pub fn local_to_reference(&self) -> Mat4 {
        self.local_to_reference
    }

    /// Container the query was run in, `None` for single-object queries.
    pub fn reference_container(&self) -> Option<ContainerId> {
        self.reference_container
    }

    /// Query segment start in reference space.
    pub fn reference_start(&self) -> Vec3 {
        self.reference_start
    }

    /// Squared distance from the segment start to the hit, negative if
    /// nothing was hit.
    pub fn nearest_squared_distance(&self) -> f32 {
        self.nearest_squared_distance
    }

    /// Distance from the segment start to the hit.
    pub fn distance(&self) -> Option<f32> {
        self.has_hit().then(|| self.nearest_squared_distance.sqrt())
    }

    /// Texture coordinate at the hit point, interpolated barycentrically from
    /// the picked triangle's corners.
    ///
    /// The value is not wrapped and may fall outside `[0, 1]`.
    pub fn texture_coordinate<S>(&self, scene: &S, channel: u32) -> Option<Vec2>
    where
        S: SceneGeometry + ?Sized,
    {
        let node = self.hit_object?;
        let [a, b, c] =
            scene.triangle_corners(node, self.geometry_index, self.triangle_index, channel)?;
        let weights = barycentric(self.local_point, a.position, b.position, c.position)?;
        Some(interpolate(weights, a.tex_coord, b.tex_coord, c.tex_coord))
    }

    /// [`PickResult::texture_coordinate`] wrapped into `[0, 1)` per component.
    pub fn wrapped_texture_coordinate<S>(&self, scene: &S, channel: u32) -> Option<Vec2>
    where
        S: SceneGeometry + ?Sized,
    {
        self.texture_coordinate(scene, channel)
            .map(|uv| Vec2::new(wrap_unit(uv.x), wrap_unit(uv.y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Aabb, Segment};
    use crate::scene::TriangleCorner;

    struct OneTriangle {
        corners: [TriangleCorner; 3],
    }

    impl SceneGeometry for OneTriangle {
        fn has_mesh(&self, _node: NodeId) -> bool {
            true
        }

        fn local_aabb(&self, _node: NodeId) -> Option<Aabb> {
            Aabb::from_points(self.corners.iter().map(|c| c.position))
        }

        fn node_transform(&self, _node: NodeId) -> Option<Mat4> {
            Some(Mat4::IDENTITY)
        }

        fn node_container(&self, _node: NodeId) -> Option<ContainerId> {
            None
        }

        fn container_transform(&self, _from: ContainerId, _to: ContainerId) -> Option<Mat4> {
            None
        }

        fn find_nearest_triangle(
            &self,
            _node: NodeId,
            _segment: &Segment,
            _geometry_filter: Option<&[u32]>,
        ) -> Option<TriangleHit> {
            None
        }

        fn triangle_corners(
            &self,
            _node: NodeId,
            _geometry_index: u32,
            _triangle_index: u32,
            channel: u32,
        ) -> Option<[TriangleCorner; 3]> {
            (channel == 0).then_some(self.corners)
        }
    }

    fn scene_with_uvs(uvs: [Vec2; 3]) -> OneTriangle {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
        OneTriangle {
            corners: [0, 1, 2].map(|i| TriangleCorner {
                position: positions[i],
                tex_coord: uvs[i],
            }),
        }
    }

    fn hit_at(point: Vec3) -> PickResult {
        let mut result = PickResult::new();
        result.begin(None, Vec3::new(0.0, 0.0, 1.0));
        let hit = TriangleHit {
            geometry_index: 0,
            triangle_index: 0,
            point,
        };
        assert!(result.offer(NodeId::new(0), &hit, Mat4::IDENTITY, 1.0));
        result
    }

    #[test]
    fn test_new_result_is_empty() {
        let result = PickResult::new();
        assert!(!result.has_hit());
        assert!(result.hit_object().is_none());
        assert!(result.nearest_squared_distance() < 0.0);
        assert!(result.distance().is_none());
    }

    #[test]
    fn test_offer_keeps_nearest_and_first_on_tie() {
        let mut result = PickResult::new();
        result.begin(None, Vec3::ZERO);
        let hit = |triangle_index| TriangleHit {
            geometry_index: 0,
            triangle_index,
            point: Vec3::ZERO,
        };
        assert!(result.offer(NodeId::new(1), &hit(1), Mat4::IDENTITY, 4.0));
        assert!(!result.offer(NodeId::new(2), &hit(2), Mat4::IDENTITY, 9.0));
        assert!(!result.offer(NodeId::new(3), &hit(3), Mat4::IDENTITY, 4.0));
        assert_eq!(result.hit_object(), Some(NodeId::new(1)));
        assert!(result.offer(NodeId::new(4), &hit(4), Mat4::IDENTITY, 1.0));
        assert_eq!(result.hit_object(), Some(NodeId::new(4)));
        assert_eq!(result.triangle_index(), 4);
        assert_eq!(result.distance(), Some(1.0));
    }

    #[test]
    fn test_begin_resets() {
        let mut result = hit_at(Vec3::ZERO);
        result.begin(Some(ContainerId::new(3)), Vec3::ONE);
        assert!(!result.has_hit());
        assert_eq!(result.reference_container(), Some(ContainerId::new(3)));
        assert_eq!(result.reference_start(), Vec3::ONE);
    }

    #[test]
    fn test_reference_point_applies_transform() {
        let mut result = PickResult::new();
        result.begin(None, Vec3::ZERO);
        let hit = TriangleHit {
            geometry_index: 0,
            triangle_index: 0,
            point: Vec3::X,
        };
        let moved = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
        result.offer(NodeId::new(0), &hit, moved, 5.0);
        assert_eq!(result.reference_point(), Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(result.local_point(), Vec3::X);
    }

    #[test]
    fn test_texture_coordinate_at_vertices_is_exact() {
        let uvs = [Vec2::new(0.1, 0.2), Vec2::new(0.7, 0.3), Vec2::new(0.4, 0.9)];
        let scene = scene_with_uvs(uvs);
        for (point, uv) in [Vec3::ZERO, Vec3::X, Vec3::Y].into_iter().zip(uvs) {
            assert_eq!(hit_at(point).texture_coordinate(&scene, 0), Some(uv));
        }
    }

    #[test]
    fn test_texture_coordinate_interior() {
        let scene = scene_with_uvs([Vec2::ZERO, Vec2::X, Vec2::Y]);
        let uv = hit_at(Vec3::new(0.25, 0.5, 0.0))
            .texture_coordinate(&scene, 0)
            .unwrap();
        assert!((uv - Vec2::new(0.25, 0.5)).length() < 1e-6);
    }

    #[test]
    fn test_texture_coordinate_missing_channel() {
        let scene = scene_with_uvs([Vec2::ZERO, Vec2::X, Vec2::Y]);
        assert!(hit_at(Vec3::ZERO).texture_coordinate(&scene, 1).is_none());
        assert!(PickResult::new().texture_coordinate(&scene, 0).is_none());
    }

    #[test]
    fn test_wrapped_texture_coordinate() {
        // Constant UV over the triangle, so any hit point yields it.
        let uv = Vec2::new(-0.3, 1.7);
        let scene = scene_with_uvs([uv; 3]);
        let wrapped = hit_at(Vec3::new(0.2, 0.2, 0.0))
            .wrapped_texture_coordinate(&scene, 0)
            .unwrap();
        assert!((wrapped - Vec2::new(0.7, 0.7)).length() < 1e-5);
    }
}
