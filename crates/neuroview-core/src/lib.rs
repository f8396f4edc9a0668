//! Core math and bookkeeping for neuroview-rs.
//!
//! This crate has no graphics dependency. It provides:
//! - Per-tab viewing transforms ([`ViewingTransforms`]) and camera composition
//! - Orthographic frusta and window projection ([`OrthographicFrustum`])
//! - Volume slice planes, screen quads and surface outlines
//! - Slice layouts (single, orthogonal triptych, montage)
//! - The color-identification protocol and depth arbitration used for picking
//! - Barycentric placement of a window point on a picked triangle

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Options structs legitimately have many boolean flags
#![allow(clippy::struct_excessive_bools)]
// Pixel math moves between i32 viewports and f32 coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
// Math code reads better with short names (s, t, u, v)
#![allow(clippy::many_single_char_names)]
#![allow(clippy::similar_names)]

pub mod barycentric;
pub mod error;
pub mod identification;
pub mod layout;
pub mod options;
pub mod projection;
pub mod selection;
pub mod slice_plane;
pub mod transform;
pub mod viewport;

pub use barycentric::{place_in_triangle, project_triangle, BarycentricPlacement};
pub use error::{NeuroviewError, Result};
pub use identification::{
    color_to_index, index_to_color, ColorIdentification, IdentificationKind, Identified,
    IndexTuple, BACKGROUND_COLOR,
};
pub use layout::{
    layout_cells, montage_layout, montage_slice_indices, orthogonal_layout, AllLayout,
    CellContent, LayoutCell, MontageParams, SliceLayout, MAX_MONTAGE_DIMENSION,
};
pub use options::Options;
pub use projection::{
    project_to_window, try_inverse, unproject_from_window, DepthRange, OrthographicFrustum,
};
pub use selection::{
    IdentificationResult, SelectionArbiter, SelectionCandidate, SelectionTargets,
};
pub use slice_plane::{
    build_plane, build_screen_quad, screen_to_texture, surface_outline, triangle_intersect_plane,
    ScreenQuadCorners, SliceAxis, SlicePlane, SliceProjection,
};
pub use transform::{
    compose_slice_camera, CameraTransform, Hemisphere, StandardView, TabIndex, TabViewingState,
    TransformSlot, ViewingState, ViewingTransforms,
};
pub use viewport::{MousePosition, Viewport};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
