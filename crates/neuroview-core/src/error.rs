//! Error types for neuroview-rs.

use thiserror::Error;

/// The main error type for neuroview-rs core operations.
#[derive(Error, Debug)]
pub enum NeuroviewError {
    /// A viewport with a non-positive width or height.
    #[error("invalid viewport {width}x{height}")]
    InvalidViewport { width: i32, height: i32 },

    /// A matrix that was expected to be invertible is singular.
    #[error("singular matrix: {0}")]
    SingularMatrix(&'static str),

    /// A tab index that has no viewing state.
    #[error("tab {0} not found")]
    TabNotFound(usize),

    /// Montage parameters that cannot produce a layout.
    #[error("invalid montage: {0}")]
    InvalidMontage(String),

    /// Geometry that references missing vertices or voxels.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for neuroview-rs operations.
pub type Result<T> = std::result::Result<T, NeuroviewError>;
