//! neuroview-rs: rendering and color-ID selection for 3D anatomical brain scenes.
//!
//! Cortical surfaces, voxel volumes, borders, foci and fiber trajectories are
//! drawn through orthographic cameras into one or more sub-viewports, and the
//! same draw path answers "what is under the mouse?" by color identification.
//!
//! # Quick Start
//!
//! ```no_run
//! use neuroview::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let surface = SurfaceDrawable::new(
//!         "triangle",
//!         vec![Vec3::new(-40.0, -30.0, 0.0), Vec3::new(40.0, -30.0, 0.0), Vec3::new(0.0, 40.0, 0.0)],
//!         vec![[0, 1, 2]],
//!     )?;
//!     let drawable = Drawable::Surface(SurfaceView::new(surface));
//!
//!     let mut renderer = SceneRenderer::new(Options::default());
//!     renderer.transforms_mut().add_tab(0);
//!     let viewport = Viewport::new(0, 0, 320, 240);
//!     let content = ViewportContent::new(0, viewport, &drawable);
//!
//!     // Draw
//!     render_to_file("triangle.png", &mut renderer, Backend::Software, 320, 240, &[content])?;
//!
//!     // Pick
//!     let mut target = create_target(Backend::Software, 320, 240)?;
//!     let hits = renderer.select_model(
//!         target.as_mut(),
//!         &content,
//!         MousePosition::new(160.0, 120.0),
//!         SelectionTargets::all(),
//!     );
//!     println!("{:?}", hits.primary());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `neuroview-core` holds the math: viewing transforms, frusta, slice
//!   planes, layouts and the identification protocol.
//! - `neuroview-render` rasterizes batches through the [`RasterTarget`] seam,
//!   on the CPU ([`SoftwareTarget`]) or with wgpu ([`GpuTarget`]).
//! - `neuroview-structures` holds the drawable data.
//! - This crate's [`SceneRenderer`] ties them together.

// Graphics code intentionally uses casts for indices, colors, and coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Draw helpers take the frame, view and drawable separately
#![allow(clippy::too_many_arguments)]
#![allow(clippy::too_many_lines)]

pub mod context;
pub mod error;
pub mod headless;
pub mod renderer;

pub use context::{Mode, RenderContext, ViewportContent};
pub use error::{Result, ViewerError};
pub use headless::{create_target, render_to_file, render_to_image, Backend};
pub use renderer::{
    billboard_corners, SceneRenderer, SurfaceProjection, LAYER_DEPTH_BIAS, OVERLAY_DEPTH_BIAS,
};

// Re-export core types
pub use neuroview_core::{
    layout_cells, AllLayout, BarycentricPlacement, CameraTransform, CellContent, DepthRange,
    Hemisphere, IdentificationKind, IdentificationResult, IndexTuple, MontageParams,
    MousePosition, NeuroviewError, Options, OrthographicFrustum, SelectionCandidate,
    SelectionTargets, SliceAxis, SliceLayout, SliceProjection, StandardView, TabIndex,
    TransformSlot, ViewingState, ViewingTransforms, Viewport, Mat4, Vec2, Vec3, Vec4,
};

// Re-export render types
pub use neuroview_render::{GpuTarget, RasterTarget, RenderError, SoftwareTarget};

// Re-export structures
pub use neuroview_structures::{
    Annotations, Border, BorderFile, Drawable, Fiber, FiberFile, FociFile, Focus, Grayscale,
    NodeSymbol, NullTextRenderer, Palette, SurfaceDrawable, SurfaceMontageView, SurfaceView,
    TextRenderer, TextStyle, VolumeDrawable, VolumeView, WholeBrainView,
};

/// Installs an `env_logger` logger configured from `RUST_LOG`.
///
/// Safe to call more than once; later calls do nothing.
pub fn init_logging() {
    let _ = env_logger::try_init();
    log::info!("neuroview-rs {} initialized", env!("CARGO_PKG_VERSION"));
}
