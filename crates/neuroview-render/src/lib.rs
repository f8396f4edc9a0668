//! Raster targets for neuroview-rs.
//!
//! This crate turns composed matrices and plain geometry batches into pixels:
//! - [`RasterTarget`], the seam the scene renderer draws through
//! - [`SoftwareTarget`], a CPU rasterizer used for tests and GPU-less hosts
//! - [`GpuTarget`], an offscreen wgpu target with single-pixel readback
//! - Headlight shading shared by both targets

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Pixel math moves between i32 viewports, u32 textures and f32 coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]

pub mod error;
pub mod gpu;
pub mod shading;
pub mod software;
pub mod target;

pub use error::{RenderError, RenderResult};
pub use gpu::GpuTarget;
pub use software::SoftwareTarget;
pub use target::{
    BackendInfo, Colors, DrawState, LineBatch, PixelSample, RasterTarget, ShadingMode,
    TriangleBatch,
};
