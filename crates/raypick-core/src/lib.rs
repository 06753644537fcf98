//! Core types for raypick.
//!
//! This crate provides the pieces the picking query is built from:
//! - [`Segment`] and [`Aabb`] with the intersection math in [`geometry`]
//! - [`PickResult`], the running best hit with derived texture coordinates
//! - The scene collaborator traits ([`SceneQuery`], [`SceneGeometry`],
//!   [`CameraSource`], [`CursorSource`], [`DestructionEvents`])
//! - [`PickingOptions`] and the error types

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Accessors returning Copy values don't need must_use
#![allow(clippy::must_use_candidate)]
// Single-letter barycentric names are conventional
#![allow(clippy::many_single_char_names)]

pub mod error;
pub mod events;
pub mod geometry;
pub mod options;
pub mod pick;
pub mod scene;

pub use error::{PickError, RaypickError, Result};
pub use events::{DestroySignal, Subscription};
pub use geometry::{Aabb, Segment};
pub use options::PickingOptions;
pub use pick::PickResult;
pub use scene::{
    CameraSource, ContainerId, CullMode, CursorSource, DepthRange, DestructionEvents, LineQuery,
    NodeId, SceneGeometry, SceneQuery, TriangleCorner, TriangleHit,
};

// Re-export glam types for convenience
pub use glam::{IVec2, Mat4, Vec2, Vec3};
