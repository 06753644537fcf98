//! Scene graph of nested containers and nodes.
//!
//! Every container defines a coordinate space related to its parent's by a
//! transform. Nodes live in exactly one container and carry a local transform
//! plus optional content: a triangle mesh, an explicit bounding box, or a
//! camera.

use glam::{IVec2, Mat4, Vec3};
use raypick_core::geometry::intersect_segment_aabb;
use raypick_core::{
    Aabb, CameraSource, ContainerId, CullMode, DestroySignal, DestructionEvents, LineQuery,
    NodeId, SceneGeometry, SceneQuery, Segment, Subscription, TriangleCorner, TriangleHit,
};

use crate::camera::Camera;
use crate::error::{Result, SceneError};
use crate::mesh::TriangleMesh;

/// Activity and visibility of a node or container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeFlags {
    pub active: bool,
    pub visible: bool,
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self {
            active: true,
            visible: true,
        }
    }
}

impl NodeFlags {
    fn culled_by(self, mode: CullMode) -> bool {
        match mode {
            CullMode::None => false,
            CullMode::Inactive => !self.active,
            CullMode::Invisible => !self.active || !self.visible,
        }
    }
}

/// What a node carries.
#[derive(Debug, Clone)]
pub enum NodeContent {
    /// Nothing, or only a bounding volume. Never pickable.
    Empty(Option<Aabb>),
    /// A polygonal mesh.
    Mesh(TriangleMesh),
    /// A viewport camera.
    Camera(Camera),
}

struct NodeEntry {
    name: String,
    container: ContainerId,
    transform: Mat4,
    flags: NodeFlags,
    content: NodeContent,
    destroyed: DestroySignal,
}

impl NodeEntry {
    fn local_aabb(&self) -> Option<Aabb> {
        match &self.content {
            NodeContent::Empty(bounds) => *bounds,
            NodeContent::Mesh(mesh) => mesh.aabb(),
            NodeContent::Camera(_) => None,
        }
    }
}

struct ContainerEntry {
    name: String,
    parent: Option<ContainerId>,
    transform: Mat4,
    flags: NodeFlags,
    containers: Vec<ContainerId>,
    nodes: Vec<NodeId>,
}

/// An in-memory scene.
///
/// Handles stay valid until their object is removed and are never reused.
pub struct Scene {
    containers: Vec<Option<ContainerEntry>>,
    nodes: Vec<Option<NodeEntry>>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates a scene holding only the root container.
    pub fn new() -> Self {
        let root = ContainerEntry {
            name: "root".to_string(),
            parent: None,
            transform: Mat4::IDENTITY,
            flags: NodeFlags::default(),
            containers: Vec::new(),
            nodes: Vec::new(),
        };
        Self {
            containers: vec![Some(root)],
            nodes: Vec::new(),
        }
    }

    /// The root container. Its space is world space.
    pub fn root(&self) -> ContainerId {
        ContainerId::new(0)
    }

    fn container(&self, id: ContainerId) -> Result<&ContainerEntry> {
        self.containers
            .get(id.index() as usize)
            .and_then(Option::as_ref)
            .ok_or(SceneError::ContainerNotFound(id))
    }

    fn container_mut(&mut self, id: ContainerId) -> Result<&mut ContainerEntry> {
        self.containers
            .get_mut(id.index() as usize)
            .and_then(Option::as_mut)
            .ok_or(SceneError::ContainerNotFound(id))
    }

    fn node(&self, id: NodeId) -> Result<&NodeEntry> {
        self.nodes
            .get(id.index() as usize)
            .and_then(Option::as_ref)
            .ok_or(SceneError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry> {
        self.nodes
            .get_mut(id.index() as usize)
            .and_then(Option::as_mut)
            .ok_or(SceneError::NodeNotFound(id))
    }

    fn name_taken(&self, container: &ContainerEntry, name: &str) -> bool {
        container
            .containers
            .iter()
            .filter_map(|&c| self.container(c).ok())
            .any(|c| c.name == name)
            || container
                .nodes
                .iter()
                .filter_map(|&n| self.node(n).ok())
                .any(|n| n.name == name)
    }

    /// Adds a child container. `transform` maps the new container's space
    /// into `parent`'s space.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_container(
        &mut self,
        parent: ContainerId,
        name: impl Into<String>,
        transform: Mat4,
    ) -> Result<ContainerId> {
        let name = name.into();
        if self.name_taken(self.container(parent)?, &name) {
            return Err(SceneError::NameExists(name));
        }

        let id = ContainerId::new(self.containers.len() as u32);
        self.containers.push(Some(ContainerEntry {
            name,
            parent: Some(parent),
            transform,
            flags: NodeFlags::default(),
            containers: Vec::new(),
            nodes: Vec::new(),
        }));
        self.container_mut(parent)?.containers.push(id);
        Ok(id)
    }

    /// Adds a node with the given content. `transform` maps node local space
    /// into `container`'s space.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_node(
        &mut self,
        container: ContainerId,
        name: impl Into<String>,
        transform: Mat4,
        content: NodeContent,
    ) -> Result<NodeId> {
        let name = name.into();
        if self.name_taken(self.container(container)?, &name) {
            return Err(SceneError::NameExists(name));
        }

        let id = NodeId::new(self.nodes.len() as u32);
        log::trace!("adding node '{name}' as {id:?}");
        self.nodes.push(Some(NodeEntry {
            name,
            container,
            transform,
            flags: NodeFlags::default(),
            content,
            destroyed: DestroySignal::new(),
        }));
        self.container_mut(container)?.nodes.push(id);
        Ok(id)
    }

    /// Adds a mesh node.
    pub fn add_mesh(
        &mut self,
        container: ContainerId,
        name: impl Into<String>,
        transform: Mat4,
        mesh: TriangleMesh,
    ) -> Result<NodeId> {
        self.add_node(container, name, transform, NodeContent::Mesh(mesh))
    }

    /// Adds a camera node. The node transform follows the camera's view and
    /// is only changed through [`Scene::set_camera`].
    pub fn add_camera(
        &mut self,
        container: ContainerId,
        name: impl Into<String>,
        camera: Camera,
    ) -> Result<NodeId> {
        let transform = camera.world_matrix();
        self.add_node(container, name, transform, NodeContent::Camera(camera))
    }

    /// Replaces a node's content.
    pub fn set_content(&mut self, node: NodeId, content: NodeContent) -> Result<()> {
        let entry = self.node_mut(node)?;
        if let NodeContent::Camera(camera) = &content {
            entry.transform = camera.world_matrix();
        }
        entry.content = content;
        Ok(())
    }

    /// Replaces a node's content with a mesh.
    pub fn set_mesh(&mut self, node: NodeId, mesh: TriangleMesh) -> Result<()> {
        self.set_content(node, NodeContent::Mesh(mesh))
    }

    /// Replaces a camera node's camera.
    pub fn set_camera(&mut self, node: NodeId, camera: Camera) -> Result<()> {
        if self.camera(node).is_none() {
            return Err(SceneError::NotACamera(node));
        }
        self.set_content(node, NodeContent::Camera(camera))
    }

    /// Moves a node within its container.
    ///
    /// Camera nodes follow their camera's pose and are moved through
    /// [`Scene::set_camera`] instead.
    pub fn set_node_transform(&mut self, node: NodeId, transform: Mat4) -> Result<()> {
        let entry = self.node_mut(node)?;
        if matches!(entry.content, NodeContent::Camera(_)) {
            return Err(SceneError::CameraTransform(node));
        }
        entry.transform = transform;
        Ok(())
    }

    pub fn set_container_transform(
        &mut self,
        container: ContainerId,
        transform: Mat4,
    ) -> Result<()> {
        self.container_mut(container)?.transform = transform;
        Ok(())
    }

    pub fn set_node_flags(&mut self, node: NodeId, flags: NodeFlags) -> Result<()> {
        self.node_mut(node)?.flags = flags;
        Ok(())
    }

    pub fn set_container_flags(&mut self, container: ContainerId, flags: NodeFlags) -> Result<()> {
        self.container_mut(container)?.flags = flags;
        Ok(())
    }

    pub fn node_flags(&self, node: NodeId) -> Option<NodeFlags> {
        self.node(node).ok().map(|n| n.flags)
    }

    pub fn node_name(&self, node: NodeId) -> Option<&str> {
        self.node(node).ok().map(|n| n.name.as_str())
    }

    pub fn content(&self, node: NodeId) -> Option<&NodeContent> {
        self.node(node).ok().map(|n| &n.content)
    }

    pub fn mesh(&self, node: NodeId) -> Option<&TriangleMesh> {
        match self.content(node)? {
            NodeContent::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn camera(&self, node: NodeId) -> Option<&Camera> {
        match self.content(node)? {
            NodeContent::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.node(node).is_ok()
    }

    /// Finds a direct child node of `container` by name.
    pub fn find_node(&self, container: ContainerId, name: &str) -> Option<NodeId> {
        self.container(container)
            .ok()?
            .nodes
            .iter()
            .copied()
            .find(|&n| self.node_name(n) == Some(name))
    }

    /// Finds a direct child container of `parent` by name.
    pub fn find_container(&self, parent: ContainerId, name: &str) -> Option<ContainerId> {
        self.container(parent)
            .ok()?
            .containers
            .iter()
            .copied()
            .find(|&c| self.container(c).is_ok_and(|e| e.name == name))
    }

    /// Number of live nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Removes a node and notifies its destruction subscribers.
    pub fn remove_node(&mut self, node: NodeId) -> Result<()> {
        let container = self.node(node)?.container;
        if let Ok(parent) = self.container_mut(container) {
            parent.nodes.retain(|&n| n != node);
        }
        if let Some(entry) = self.nodes[node.index() as usize].take() {
            log::debug!("removing node '{}'", entry.name);
            entry.destroyed.fire();
        }
        Ok(())
    }

    /// Removes a container with everything inside it.
    pub fn remove_container(&mut self, container: ContainerId) -> Result<()> {
        let entry = self.container(container)?;
        let Some(parent) = entry.parent else {
            return Err(SceneError::RemoveRoot);
        };
        let children = entry.containers.clone();
        let nodes = entry.nodes.clone();

        for child in children {
            self.remove_container(child)?;
        }
        for node in nodes {
            self.remove_node(node)?;
        }
        self.container_mut(parent)?
            .containers
            .retain(|&c| c != container);
        self.containers[container.index() as usize] = None;
        Ok(())
    }

    /// Transform from a container's space into world (root) space.
    pub fn container_to_world(&self, container: ContainerId) -> Option<Mat4> {
        let mut transform = Mat4::IDENTITY;
        let mut current = Some(container);
        while let Some(id) = current {
            let entry = self.container(id).ok()?;
            if entry.parent.is_some() {
                transform = entry.transform * transform;
            }
            current = entry.parent;
        }
        Some(transform)
    }

    /// Transform from node local space into world space.
    pub fn node_to_world(&self, node: NodeId) -> Option<Mat4> {
        let entry = self.node(node).ok()?;
        Some(self.container_to_world(entry.container)? * entry.transform)
    }

    /// World space box enclosing a node's local bounds.
    pub fn world_aabb(&self, node: NodeId) -> Option<Aabb> {
        let bounds = self.node(node).ok()?.local_aabb()?;
        Some(bounds.transformed(&self.node_to_world(node)?))
    }

    fn query_container(
        &self,
        container: ContainerId,
        segment: &Segment,
        cull_mode: CullMode,
        on_candidate: &mut dyn FnMut(NodeId),
    ) {
        let Ok(entry) = self.container(container) else {
            return;
        };

        for &node in &entry.nodes {
            let Ok(node_entry) = self.node(node) else {
                continue;
            };
            if node_entry.flags.culled_by(cull_mode) {
                continue;
            }
            let Some(aabb) = node_entry.local_aabb() else {
                continue;
            };
            let Some(to_local) = invert(&node_entry.transform) else {
                log::trace!("skipping '{}': singular transform", node_entry.name);
                continue;
            };
            let local = segment.transformed(&to_local);
            if intersect_segment_aabb(&local, &aabb).is_some() {
                on_candidate(node);
            }
        }

        for &child in &entry.containers {
            let Ok(child_entry) = self.container(child) else {
                continue;
            };
            if child_entry.flags.culled_by(cull_mode) {
                continue;
            }
            let Some(to_local) = invert(&child_entry.transform) else {
                log::trace!("skipping container '{}': singular transform", child_entry.name);
                continue;
            };
            let local = segment.transformed(&to_local);
            self.query_container(child, &local, cull_mode, on_candidate);
        }
    }
}

/// Inverse of an affine transform, `None` if it collapses a dimension.
fn invert(transform: &Mat4) -> Option<Mat4> {
    (transform.determinant().abs() > f32::EPSILON).then(|| transform.inverse())
}

impl SceneQuery for Scene {
    fn query_line(&self, query: &LineQuery, on_candidate: &mut dyn FnMut(NodeId)) {
        let Ok(root) = self.container(query.container) else {
            log::warn!("line query against unknown container {:?}", query.container);
            return;
        };
        if root.flags.culled_by(query.cull_mode) {
            return;
        }
        self.query_container(query.container, &query.segment, query.cull_mode, on_candidate);
    }
}

impl SceneGeometry for Scene {
    fn has_mesh(&self, node: NodeId) -> bool {
        self.mesh(node).is_some()
    }

    fn local_aabb(&self, node: NodeId) -> Option<Aabb> {
        self.node(node).ok()?.local_aabb()
    }

    fn node_transform(&self, node: NodeId) -> Option<Mat4> {
        self.node(node).ok().map(|n| n.transform)
    }

    fn node_container(&self, node: NodeId) -> Option<ContainerId> {
        self.node(node).ok().map(|n| n.container)
    }

    fn container_transform(&self, from: ContainerId, to: ContainerId) -> Option<Mat4> {
        if from == to {
            return self.container(from).ok().map(|_| Mat4::IDENTITY);
        }
        let from_world = self.container_to_world(from)?;
        let to_world = self.container_to_world(to)?;
        Some(invert(&to_world)? * from_world)
    }

    fn find_nearest_triangle(
        &self,
        node: NodeId,
        segment: &Segment,
        geometry_filter: Option<&[u32]>,
    ) -> Option<TriangleHit> {
        self.mesh(node)?.nearest_triangle(segment, geometry_filter)
    }

    fn triangle_corners(
        &self,
        node: NodeId,
        geometry_index: u32,
        triangle_index: u32,
        channel: u32,
    ) -> Option<[TriangleCorner; 3]> {
        self.mesh(node)?
            .triangle_corners(geometry_index, triangle_index, channel)
    }
}

impl CameraSource for Scene {
    fn camera_container(&self, camera: NodeId) -> Option<ContainerId> {
        self.camera(camera)?;
        self.node_container(camera)
    }

    fn unproject_cursor(&self, camera: NodeId, cursor: IVec2, depth: f32) -> Option<Vec3> {
        self.camera(camera)?.unproject(cursor, depth)
    }
}

impl DestructionEvents for Scene {
    fn watch_destroyed(&self, node: NodeId) -> Option<Subscription> {
        self.node(node).ok().map(|n| n.destroyed.subscribe())
    }
}
