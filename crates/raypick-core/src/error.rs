//! Error types for raypick.

use thiserror::Error;

/// The main error type for raypick configuration and I/O.
#[derive(Error, Debug)]
pub enum RaypickError {
    /// Picking options failed validation.
    #[error("invalid picking options: {0}")]
    InvalidOptions(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Why a pick query reported "nothing picked".
///
/// None of these are fatal. The `bool` returning picking calls collapse them
/// to `false`, the `try_*` variants hand them to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PickError {
    /// Every candidate was rejected by the filter, lacked a mesh, or missed.
    #[error("no acceptable candidate was hit")]
    NoCandidateAcceptable,

    /// A hit was recorded but lies beyond the end of the query segment.
    #[error("nearest hit (squared distance {squared_distance}) exceeds the segment (squared length {squared_length})")]
    OutOfRange {
        squared_distance: f32,
        squared_length: f32,
    },

    /// Something the query depends on is not available.
    #[error("missing prerequisite: {0}")]
    MissingPrerequisite(&'static str),
}

/// A specialized Result type for raypick operations.
pub type Result<T> = std::result::Result<T, RaypickError>;
