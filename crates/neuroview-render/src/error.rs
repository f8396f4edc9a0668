//! Rendering error types.

use thiserror::Error;

/// Errors raised by raster targets.
#[derive(Error, Debug)]
pub enum RenderError {
    /// No graphics adapter was found.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// A staging buffer could not be mapped for readback.
    #[error("buffer mapping failed: {0}")]
    BufferMapFailed(String),

    /// A target with zero width or height was requested.
    #[error("invalid target size {width}x{height}")]
    InvalidTargetSize { width: u32, height: u32 },

    /// A batch references vertices it does not have.
    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    /// Writing an image failed.
    #[error("image error: {0}")]
    ImageSaveFailed(#[from] image::ImageError),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
