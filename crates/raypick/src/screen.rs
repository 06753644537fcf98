//! Picking under a cursor through a camera.

use glam::IVec2;
use raypick_core::{
    CameraSource, CullMode, CursorSource, DestructionEvents, NodeId, PickError, PickResult,
    SceneGeometry, SceneQuery, Subscription,
};

use crate::caster::{AcceptAll, CandidateFilter, RayCaster};

/// Camera held by a [`ScreenRayPicker`] together with its destruction watch.
#[derive(Debug)]
struct WatchedCamera {
    node: NodeId,
    destroyed: Subscription,
}

/// Turns window positions into segments and picks along them.
///
/// The segment starts at the unprojected near depth and is expressed in the
/// space of the container the camera lives in. Once the scene destroys the
/// camera, picks fail until another camera is set.
pub struct ScreenRayPicker<F = AcceptAll> {
    caster: RayCaster<F>,
    camera: Option<WatchedCamera>,
    cursor: Option<Box<dyn CursorSource>>,
}

impl Default for ScreenRayPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenRayPicker {
    /// Creates a picker without camera or cursor source.
    pub fn new() -> Self {
        Self::with_caster(RayCaster::new())
    }
}

impl<F: CandidateFilter> ScreenRayPicker<F> {
    /// Creates a picker around an existing caster.
    pub fn with_caster(caster: RayCaster<F>) -> Self {
        Self {
            caster,
            camera: None,
            cursor: None,
        }
    }

    pub fn caster(&self) -> &RayCaster<F> {
        &self.caster
    }

    pub fn caster_mut(&mut self) -> &mut RayCaster<F> {
        &mut self.caster
    }

    /// Replaces the camera. Returns `false` if `camera` is not a live node of
    /// `scene`, in which case the picker is left without camera.
    pub fn set_camera<S>(&mut self, scene: &S, camera: Option<NodeId>) -> bool
    where
        S: DestructionEvents + ?Sized,
    {
        self.camera = None;
        let Some(node) = camera else {
            return true;
        };
        let Some(destroyed) = scene.watch_destroyed(node) else {
            log::warn!("cannot pick through {node:?}: not in the scene");
            return false;
        };
        self.camera = Some(WatchedCamera { node, destroyed });
        true
    }

    /// The current camera, unless it was destroyed.
    pub fn camera(&self) -> Option<NodeId> {
        self.camera
            .as_ref()
            .filter(|camera| !camera.destroyed.is_destroyed())
            .map(|camera| camera.node)
    }

    /// Sets where [`ScreenRayPicker::pick_at_cursor`] reads the cursor from.
    pub fn set_cursor_source(&mut self, source: Option<Box<dyn CursorSource>>) {
        self.cursor = source;
    }

    pub fn has_cursor_source(&self) -> bool {
        self.cursor.is_some()
    }

    fn live_camera(&mut self) -> Option<NodeId> {
        let camera = self.camera();
        if camera.is_none() {
            if let Some(stale) = self.camera.take() {
                log::debug!("camera {:?} was destroyed, clearing it", stale.node);
            }
        }
        camera
    }

    /// Picks under the current cursor position.
    ///
    /// With a negative `max_distance` the segment reaches the far depth.
    pub fn pick_at_cursor<S>(
        &mut self,
        scene: &S,
        result: &mut PickResult,
        max_distance: f32,
        cull_mode: CullMode,
    ) -> bool
    where
        S: SceneQuery + SceneGeometry + CameraSource + ?Sized,
    {
        self.try_pick_at_cursor(scene, result, max_distance, cull_mode)
            .is_ok()
    }

    /// [`ScreenRayPicker::pick_at_cursor`] with the configured distance and
    /// cull mode.
    pub fn pick_at_cursor_default<S>(&mut self, scene: &S, result: &mut PickResult) -> bool
    where
        S: SceneQuery + SceneGeometry + CameraSource + ?Sized,
    {
        let options = *self.caster.options();
        self.pick_at_cursor(scene, result, options.default_max_distance, options.cull_mode)
    }

    /// [`ScreenRayPicker::pick_at_cursor`] reporting why nothing was picked.
    pub fn try_pick_at_cursor<S>(
        &mut self,
        scene: &S,
        result: &mut PickResult,
        max_distance: f32,
        cull_mode: CullMode,
    ) -> Result<(), PickError>
    where
        S: SceneQuery + SceneGeometry + CameraSource + ?Sized,
    {
        let cursor = self
            .cursor
            .as_ref()
            .ok_or(PickError::MissingPrerequisite("cursor source"))?
            .cursor_position()
            .ok_or(PickError::MissingPrerequisite("cursor position"))?;
        self.try_pick_at_point(scene, result, cursor, max_distance, cull_mode)
    }

    /// Picks under a window position in pixels, origin top left.
    pub fn pick_at_point<S>(
        &mut self,
        scene: &S,
        result: &mut PickResult,
        cursor: IVec2,
        max_distance: f32,
        cull_mode: CullMode,
    ) -> bool
    where
        S: SceneQuery + SceneGeometry + CameraSource + ?Sized,
    {
        self.try_pick_at_point(scene, result, cursor, max_distance, cull_mode)
            .is_ok()
    }

    /// [`ScreenRayPicker::pick_at_point`] with the configured distance and
    /// cull mode.
    pub fn pick_at_point_default<S>(
        &mut self,
        scene: &S,
        result: &mut PickResult,
        cursor: IVec2,
    ) -> bool
    where
        S: SceneQuery + SceneGeometry + CameraSource + ?Sized,
    {
        let options = *self.caster.options();
        self.pick_at_point(
            scene,
            result,
            cursor,
            options.default_max_distance,
            options.cull_mode,
        )
    }

    /// [`ScreenRayPicker::pick_at_point`] reporting why nothing was picked.
    pub fn try_pick_at_point<S>(
        &mut self,
        scene: &S,
        result: &mut PickResult,
        cursor: IVec2,
        max_distance: f32,
        cull_mode: CullMode,
    ) -> Result<(), PickError>
    where
        S: SceneQuery + SceneGeometry + CameraSource + ?Sized,
    {
        let camera = self
            .live_camera()
            .ok_or(PickError::MissingPrerequisite("camera"))?;
        let container = scene
            .camera_container(camera)
            .ok_or(PickError::MissingPrerequisite("camera container"))?;
        let depths = self.caster.options().depth_range();
        let segment = scene
            .cursor_segment(camera, cursor, max_distance, depths)
            .ok_or(PickError::MissingPrerequisite("cursor segment"))?;

        log::trace!(
            "picking at {cursor} through {camera:?}: {} -> {}",
            segment.start,
            segment.end
        );
        self.caster.try_pick_in_container(
            scene,
            result,
            container,
            segment.start,
            segment.end,
            cull_mode,
        )
    }
}

impl<F> std::fmt::Debug for ScreenRayPicker<F>
where
    F: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenRayPicker")
            .field("caster", &self.caster)
            .field("camera", &self.camera)
            .field("cursor", &self.cursor.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec2;
    use raypick_core::{Mat4, Vec3};
    use raypick_scene::{Camera, Scene, TriangleMesh, VertexBuffer};

    fn scene_with_quad() -> (Scene, NodeId, NodeId) {
        let mut scene = Scene::new();
        let vertices = VertexBuffer::new(vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ]);
        let mesh = TriangleMesh::from_triangles(vertices, vec![[0, 1, 2], [0, 2, 3]]).unwrap();
        let root = scene.root();
        let quad = scene.add_mesh(root, "quad", Mat4::IDENTITY, mesh).unwrap();
        let camera =
            Camera::new(UVec2::new(200, 100)).looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        let camera = scene.add_camera(root, "camera", camera).unwrap();
        (scene, quad, camera)
    }

    #[test]
    fn test_pick_at_view_center() {
        let (scene, quad, camera) = scene_with_quad();
        let mut picker = ScreenRayPicker::new();
        assert!(picker.set_camera(&scene, Some(camera)));

        let mut result = PickResult::new();
        assert!(picker.pick_at_point(
            &scene,
            &mut result,
            IVec2::new(100, 50),
            -1.0,
            CullMode::None
        ));
        assert_eq!(result.hit_object(), Some(quad));
        assert!(result.reference_point().length() < 1e-3);
        assert_eq!(result.reference_container(), Some(scene.root()));
    }

    #[test]
    fn test_max_distance_cuts_segment() {
        let (scene, _quad, camera) = scene_with_quad();
        let mut picker = ScreenRayPicker::new();
        picker.set_camera(&scene, Some(camera));

        let mut result = PickResult::new();
        let center = IVec2::new(100, 50);
        assert!(!picker.pick_at_point(&scene, &mut result, center, 2.0, CullMode::None));
        assert!(picker.pick_at_point(&scene, &mut result, center, 10.0, CullMode::None));
    }

    #[test]
    fn test_cursor_source() {
        let (scene, quad, camera) = scene_with_quad();
        let mut picker = ScreenRayPicker::new();
        picker.set_camera(&scene, Some(camera));

        let mut result = PickResult::new();
        assert_eq!(
            picker.try_pick_at_cursor(&scene, &mut result, -1.0, CullMode::None),
            Err(PickError::MissingPrerequisite("cursor source"))
        );

        picker.set_cursor_source(Some(Box::new(|| Some(IVec2::new(100, 50)))));
        assert!(picker.pick_at_cursor_default(&scene, &mut result));
        assert_eq!(result.hit_object(), Some(quad));

        picker.set_cursor_source(Some(Box::new(|| None::<IVec2>)));
        assert!(!picker.pick_at_cursor(&scene, &mut result, -1.0, CullMode::None));
    }

    #[test]
    fn test_destroyed_camera_is_cleared() {
        let (mut scene, _quad, camera) = scene_with_quad();
        let mut picker = ScreenRayPicker::new();
        picker.set_camera(&scene, Some(camera));
        assert_eq!(picker.camera(), Some(camera));

        scene.remove_node(camera).unwrap();
        assert_eq!(picker.camera(), None);

        let mut result = PickResult::new();
        assert_eq!(
            picker.try_pick_at_point(
                &scene,
                &mut result,
                IVec2::new(100, 50),
                -1.0,
                CullMode::None
            ),
            Err(PickError::MissingPrerequisite("camera"))
        );
    }

    #[test]
    fn test_set_camera_rejects_unknown_node() {
        let (scene, _quad, _camera) = scene_with_quad();
        let mut picker = ScreenRayPicker::new();
        assert!(!picker.set_camera(&scene, Some(NodeId::new(42))));
        assert!(picker.camera().is_none());
        assert!(picker.set_camera(&scene, None));
    }

    #[test]
    fn test_non_camera_node_cannot_unproject() {
        let (scene, quad, _camera) = scene_with_quad();
        let mut picker = ScreenRayPicker::new();
        picker.set_camera(&scene, Some(quad));
        let mut result = PickResult::new();
        assert_eq!(
            picker.try_pick_at_point(
                &scene,
                &mut result,
                IVec2::new(100, 50),
                -1.0,
                CullMode::None
            ),
            Err(PickError::MissingPrerequisite("camera container"))
        );
    }
}
