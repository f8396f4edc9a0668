//! Errors of the viewer facade.

use neuroview_core::NeuroviewError;
use neuroview_render::RenderError;
use thiserror::Error;

/// Errors surfaced by [`crate::render_to_image`] and friends.
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error(transparent)]
    Core(#[from] NeuroviewError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A specialized Result type for viewer operations.
pub type Result<T> = std::result::Result<T, ViewerError>;
