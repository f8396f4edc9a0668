//! Drawable anatomical structures for neuroview-rs.
//!
//! This crate provides the plain data the scene renderer draws:
//! - Cortical surfaces with per-node colors and node symbols
//! - Voxel volumes with an index-to-space transform and a palette
//! - Borders, foci and fiber trajectories
//! - The [`Drawable`] views that combine them
//!
//! Palettes and text drawing are external services, modelled as the
//! [`Palette`] and [`TextRenderer`] traits.

// Graphics code intentionally uses casts for indices, colors, and coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]

pub mod annotations;
pub mod drawable;
pub mod palette;
pub mod surface;
pub mod text;
pub mod volume;

pub use annotations::{Annotations, Border, BorderFile, Fiber, FiberFile, FociFile, Focus};
pub use drawable::{
    Drawable, MontageSide, SurfaceMontageCell, SurfaceMontageView, SurfaceView, VolumeView,
    WholeBrainView,
};
pub use palette::{Grayscale, Palette};
pub use surface::{NodeSymbol, SurfaceDrawable, DEFAULT_SURFACE_COLOR};
pub use text::{
    HorizontalAlignment, NullTextRenderer, TextRenderer, TextStyle, VerticalAlignment,
};
pub use volume::{in_plane_dimensions, VolumeDrawable};
