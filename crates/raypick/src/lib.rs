//! raypick: find the nearest triangle under a segment or the mouse cursor.
//!
//! [`RayCaster`] answers "what is the closest mesh triangle crossed by this
//! segment" for a whole container hierarchy or a single object.
//! [`ScreenRayPicker`] builds that segment from a window position and a
//! camera. Hits land in a caller-owned [`PickResult`], which also derives
//! texture coordinates at the hit point.
//!
//! # Quick start
//!
//! ```no_run
//! use raypick::{CullMode, IVec2, PickResult, Scene, ScreenRayPicker};
//!
//! let scene = Scene::new();
//! # let camera = raypick::NodeId::new(0);
//! let mut picker = ScreenRayPicker::new();
//! picker.set_camera(&scene, Some(camera));
//!
//! let mut result = PickResult::new();
//! if picker.pick_at_point(&scene, &mut result, IVec2::new(640, 360), -1.0, CullMode::Inactive) {
//!     println!("picked {:?} at {}", result.hit_object(), result.reference_point());
//! }
//! ```
//!
//! The scene side is abstracted by the traits of [`raypick_core::scene`];
//! [`raypick_scene::Scene`] implements all of them.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Accessors returning Copy values don't need must_use
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod caster;
pub mod screen;

pub use caster::{AcceptAll, CandidateFilter, PickStats, RayCaster};
pub use screen::ScreenRayPicker;

pub use raypick_core::{
    Aabb, CameraSource, ContainerId, CullMode, CursorSource, DepthRange, DestroySignal,
    DestructionEvents, LineQuery, NodeId, PickError, PickResult, PickingOptions, RaypickError,
    Result, SceneGeometry, SceneQuery, Segment, Subscription, TriangleCorner, TriangleHit,
};
pub use raypick_core::{IVec2, Mat4, Vec2, Vec3};
pub use raypick_scene::{
    Camera, Geometry, MeshLod, NodeContent, NodeFlags, ProjectionMode, Scene, SceneError,
    TriangleMesh, VertexBuffer,
};
