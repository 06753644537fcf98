//! Interfaces the picking query needs from a scene.
//!
//! The picking code never owns scene objects. It talks to the scene through
//! the copyable handles [`NodeId`] and [`ContainerId`] and the traits below.
//! `raypick-scene` provides an in-memory implementation.

use glam::{IVec2, Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::events::Subscription;
use crate::geometry::{Aabb, Segment};

/// Handle to a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Handle to a scene container, which also names a coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(u32);

impl ContainerId {
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Which nodes a line query skips before reporting candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CullMode {
    /// Report every node whose bounds intersect the line.
    None,
    /// Skip inactive nodes and everything inside inactive containers.
    #[default]
    Inactive,
    /// Additionally skip invisible nodes and containers.
    Invisible,
}

/// A line query against one container and everything below it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineQuery {
    /// Container the query starts in.
    pub container: ContainerId,
    /// The line, in `container` space.
    pub segment: Segment,
    pub cull_mode: CullMode,
}

impl LineQuery {
    #[must_use]
    pub fn new(container: ContainerId, segment: Segment) -> Self {
        Self {
            container,
            segment,
            cull_mode: CullMode::default(),
        }
    }

    #[must_use]
    pub fn with_cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }
}

/// Spatial query engine that enumerates candidate nodes.
pub trait SceneQuery {
    /// Calls `on_candidate` once for every node whose bounding volume
    /// intersects the query line.
    ///
    /// The order is up to the implementation but must be the same for
    /// repeated runs over an unchanged scene.
    fn query_line(&self, query: &LineQuery, on_candidate: &mut dyn FnMut(NodeId));
}

/// Nearest triangle reported by [`SceneGeometry::find_nearest_triangle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Sub-mesh the triangle belongs to.
    pub geometry_index: u32,
    /// Triangle index within that sub-mesh.
    pub triangle_index: u32,
    /// Collision point in node local space.
    pub point: Vec3,
}

/// One vertex of a picked triangle, as needed for attribute interpolation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleCorner {
    pub position: Vec3,
    pub tex_coord: Vec2,
}

/// Node transforms, bounds and mesh access.
pub trait SceneGeometry {
    /// Whether the node carries a polygonal mesh.
    fn has_mesh(&self, node: NodeId) -> bool;

    /// Bounding box in node local space.
    fn local_aabb(&self, node: NodeId) -> Option<Aabb>;

    /// Transform from node local space into its container's space.
    fn node_transform(&self, node: NodeId) -> Option<Mat4>;

    /// The container a node lives in.
    fn node_container(&self, node: NodeId) -> Option<ContainerId>;

    /// Transform from the space of `from` into the space of `to`.
    ///
    /// Returns `None` if the two containers share no ancestor.
    fn container_transform(&self, from: ContainerId, to: ContainerId) -> Option<Mat4>;

    /// Nearest triangle of the node's mesh crossed by a local-space segment.
    ///
    /// `geometry_filter` restricts the test to the listed sub-meshes.
    fn find_nearest_triangle(
        &self,
        node: NodeId,
        segment: &Segment,
        geometry_filter: Option<&[u32]>,
    ) -> Option<TriangleHit>;

    /// Positions and texture coordinates of one triangle's three corners.
    ///
    /// Returns `None` if the mesh, its first level of detail, the vertex
    /// buffer or the requested texture coordinate channel is missing.
    fn triangle_corners(
        &self,
        node: NodeId,
        geometry_index: u32,
        triangle_index: u32,
        channel: u32,
    ) -> Option<[TriangleCorner; 3]>;
}

/// Depth range used when unprojecting a cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthRange {
    pub near: f32,
    pub far: f32,
}

impl Default for DepthRange {
    fn default() -> Self {
        Self {
            near: 0.0001,
            far: 0.9999,
        }
    }
}

/// Cameras that can turn a cursor position into a segment.
pub trait CameraSource {
    /// Container the camera lives in. Its space is the space of the segments
    /// produced by [`CameraSource::cursor_segment`].
    fn camera_container(&self, camera: NodeId) -> Option<ContainerId>;

    /// Unprojects a window position at normalized `depth` in `[0, 1]` into
    /// the camera container's space.
    fn unproject_cursor(&self, camera: NodeId, cursor: IVec2, depth: f32) -> Option<Vec3>;

    /// Segment under the cursor, from the near depth toward the far depth.
    ///
    /// With a non-negative `max_distance` the segment is cut (or extended) to
    /// exactly that length along the view ray.
    fn cursor_segment(
        &self,
        camera: NodeId,
        cursor: IVec2,
        max_distance: f32,
        depths: DepthRange,
    ) -> Option<Segment> {
        let near = self.unproject_cursor(camera, cursor, depths.near)?;
        let far = self.unproject_cursor(camera, cursor, depths.far)?;
        if !near.is_finite() || !far.is_finite() {
            return None;
        }
        if max_distance < 0.0 {
            return Some(Segment::new(near, far));
        }
        let dir = (far - near).try_normalize()?;
        Some(Segment::new(near, near + dir * max_distance))
    }
}

/// Frontend that knows the current cursor position.
pub trait CursorSource {
    /// Cursor position in window pixels, or `None` if the cursor is not over
    /// the view.
    fn cursor_position(&self) -> Option<IVec2>;
}

impl<F> CursorSource for F
where
    F: Fn() -> Option<IVec2>,
{
    fn cursor_position(&self) -> Option<IVec2> {
        self()
    }
}

/// Scenes that announce node destruction.
pub trait DestructionEvents {
    /// Subscribes to the destruction of `node`. Returns `None` if the node
    /// does not exist anymore.
    fn watch_destroyed(&self, node: NodeId) -> Option<Subscription>;
}
