//! Scene error types.

use raypick_core::{ContainerId, NodeId};
use thiserror::Error;

/// Errors raised while building or editing a [`Scene`](crate::Scene).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// The container handle is unknown or was removed.
    #[error("container {0:?} not found")]
    ContainerNotFound(ContainerId),

    /// The node handle is unknown or was removed.
    #[error("node {0:?} not found")]
    NodeNotFound(NodeId),

    /// A sibling with the same name already exists in the container.
    #[error("'{0}' already exists in this container")]
    NameExists(String),

    /// The root container cannot be removed.
    #[error("the root container cannot be removed")]
    RemoveRoot,

    /// The node is not a camera.
    #[error("node {0:?} is not a camera")]
    NotACamera(NodeId),

    /// Camera nodes are placed by their camera's pose.
    #[error("node {0:?} is a camera, set its pose through the camera")]
    CameraTransform(NodeId),

    /// Mesh data is inconsistent.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// A specialized Result type for scene operations.
pub type Result<T> = std::result::Result<T, SceneError>;
