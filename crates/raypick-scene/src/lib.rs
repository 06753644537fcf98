//! In-memory scene graph for raypick.
//!
//! [`Scene`] implements every collaborator trait the picking query needs:
//! line queries over nested containers, node transforms and bounds, triangle
//! mesh access, camera unprojection and destruction notifications. It tests
//! every node of a container against the query line and keeps no spatial
//! index.

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Scene methods are named after the objects they act on
#![allow(clippy::module_name_repetitions)]

pub mod camera;
pub mod error;
pub mod mesh;
pub mod scene;

pub use camera::{Camera, ProjectionMode};
pub use error::{Result, SceneError};
pub use mesh::{Geometry, MeshLod, TriangleMesh, VertexBuffer};
pub use scene::{NodeContent, NodeFlags, Scene};
