//! Viewport camera.

use glam::{IVec2, Mat4, UVec2, Vec3, Vec4};
use raypick_core::Aabb;

/// Camera projection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    /// Perspective projection.
    #[default]
    Perspective,
    /// Orthographic projection.
    Orthographic,
}

/// A camera looking into its container's space through a viewport.
///
/// Position, target and up are expressed in the space of the container the
/// camera node lives in.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position.
    pub position: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Field of view in radians.
    pub fov: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Projection mode.
    pub projection_mode: ProjectionMode,
    /// Orthographic half height (used when `projection_mode` is Orthographic).
    pub ortho_scale: f32,
    /// Viewport size in pixels.
    pub viewport: UVec2,
}

impl Camera {
    /// Creates a new camera with default settings for the given viewport.
    #[must_use]
    pub fn new(viewport: UVec2) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: std::f32::consts::FRAC_PI_4, // 45 degrees
            near: 0.01,
            far: 1000.0,
            projection_mode: ProjectionMode::Perspective,
            ortho_scale: 1.0,
            viewport,
        }
    }

    /// Sets position and target.
    #[must_use]
    pub fn looking_at(mut self, position: Vec3, target: Vec3) -> Self {
        self.position = position;
        self.target = target;
        self
    }

    /// Width over height, or 1 for an empty viewport.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_ratio(&self) -> f32 {
        if self.viewport.y == 0 {
            1.0
        } else {
            self.viewport.x as f32 / self.viewport.y as f32
        }
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Returns the projection matrix. Depth maps to `[0, 1]`.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection_mode {
            ProjectionMode::Perspective => {
                Mat4::perspective_rh(self.fov, self.aspect_ratio(), self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let half_height = self.ortho_scale;
                let half_width = half_height * self.aspect_ratio();
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Camera-to-container transform.
    #[must_use]
    pub fn world_matrix(&self) -> Mat4 {
        self.view_matrix().inverse()
    }

    /// Maps a window position in pixels (origin top left) and a normalized
    /// depth to a point in container space.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn unproject(&self, cursor: IVec2, depth: f32) -> Option<Vec3> {
        if self.viewport.x == 0 || self.viewport.y == 0 {
            return None;
        }

        let half_width = self.viewport.x as f32 / 2.0;
        let half_height = self.viewport.y as f32 / 2.0;
        let ndc_x = (cursor.x as f32 / half_width) - 1.0;
        let ndc_y = 1.0 - (cursor.y as f32 / half_height);

        let inv_view_proj = self.view_projection_matrix().inverse();
        let p = inv_view_proj * Vec4::new(ndc_x, ndc_y, depth, 1.0);
        if p.w.abs() < 1e-6 {
            return None;
        }
        Some(p.truncate() / p.w)
    }

    /// Frames `bounds` from the +z side, keeping the whole box in view.
    pub fn frame(&mut self, bounds: &Aabb) {
        let extents = bounds.max - bounds.min;
        let size = extents.length().max(1e-3);
        let center = (bounds.min + bounds.max) * 0.5;

        self.target = center;
        self.position = center + Vec3::new(0.0, 0.0, size * 1.5);
        self.near = size * 0.001;
        self.far = size * 100.0;
        self.ortho_scale = (extents.y.max(extents.x / self.aspect_ratio()) * 0.6).max(0.1);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(UVec2::new(1280, 720))
    }
}
