//! Orthographic projection setup.
//!
//! The visible window height is the controlling dimension: the frustum's
//! `top`/`bottom` come from the half window height and `left`/`right` are
//! derived from the viewport aspect ratio.

use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::{NeuroviewError, Result};
use crate::viewport::Viewport;

/// Depth extent of a frustum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DepthRange {
    /// On-screen composites: near/far = ±1000.
    #[default]
    Composite,
    /// Legacy full-window mode: near/far = ±5000.
    Legacy,
}

impl DepthRange {
    /// Absolute value of the near/far planes.
    #[must_use]
    pub fn extent(self) -> f32 {
        match self {
            DepthRange::Composite => 1000.0,
            DepthRange::Legacy => 5000.0,
        }
    }
}

/// An orthographic viewing volume in eye coordinates.
///
/// `near`/`far` follow the classic `glOrtho` convention: they are distances
/// along `-Z`, so `near = -1000` admits geometry up to 1000 units in front
/// of the eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicFrustum {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl OrthographicFrustum {
    /// Computes the frustum for a viewport.
    ///
    /// Returns [`NeuroviewError::InvalidViewport`] when the viewport has no
    /// area; callers treat that as "nothing to draw".
    pub fn compute(
        viewport: Viewport,
        half_window_height: f32,
        depth: DepthRange,
        aspect_override: Option<f32>,
    ) -> Result<Self> {
        let viewport = viewport.validated()?;
        let aspect = aspect_override
            .filter(|a| a.is_finite() && *a > 0.0)
            .unwrap_or_else(|| viewport.aspect_ratio());
        let half_height = if half_window_height > 0.0 {
            half_window_height
        } else {
            log::warn!("non-positive half window height {half_window_height}, using 1.0");
            1.0
        };

        let right = half_height * aspect;
        let extent = depth.extent();
        Ok(Self {
            left: -right,
            right,
            bottom: -half_height,
            top: half_height,
            near: -extent,
            far: extent,
        })
    }

    /// Returns the frustum used for "opposite" montage views.
    ///
    /// Left/right and near/far are swapped rather than negated. The combined
    /// flip of X and Z is a rotation about Y, so the surface is seen from
    /// behind without reflecting its normals.
    #[must_use]
    pub fn mirrored(&self) -> Self {
        Self {
            left: self.right,
            right: self.left,
            bottom: self.bottom,
            top: self.top,
            near: self.far,
            far: self.near,
        }
    }

    /// Returns whether this frustum was produced by [`Self::mirrored`].
    #[must_use]
    pub fn is_mirrored(&self) -> bool {
        self.right < self.left
    }

    /// Signed width `right - left`.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Signed height `top - bottom`.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Ratio of width to height.
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        self.width().abs() / self.height().abs()
    }

    /// Right-handed orthographic matrix mapping depth into `[0, 1]`.
    #[must_use]
    pub fn to_projection_matrix(&self) -> Mat4 {
        Mat4::orthographic_rh(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        )
    }
}

/// Projects a model-space point into window coordinates.
///
/// Returns `(x, y, depth)` with `depth` in `[0, 1]` for visible points.
#[must_use]
pub fn project_to_window(mvp: &Mat4, viewport: Viewport, point: Vec3) -> Vec3 {
    let clip = *mvp * point.extend(1.0);
    let w = if clip.w.abs() > f32::EPSILON { clip.w } else { 1.0 };
    let ndc = clip.truncate() / w;
    Vec3::new(
        viewport.x as f32 + (ndc.x + 1.0) * 0.5 * viewport.width as f32,
        viewport.y as f32 + (ndc.y + 1.0) * 0.5 * viewport.height as f32,
        ndc.z,
    )
}

/// Maps a window position and depth back into model space.
///
/// `inverse_mvp` must be the inverse of the model-view-projection matrix
/// used to draw the viewport.
#[must_use]
pub fn unproject_from_window(
    inverse_mvp: &Mat4,
    viewport: Viewport,
    x: f32,
    y: f32,
    depth: f32,
) -> Vec3 {
    let width = viewport.width.max(1) as f32;
    let height = viewport.height.max(1) as f32;
    let ndc = Vec4::new(
        (x - viewport.x as f32) / width * 2.0 - 1.0,
        (y - viewport.y as f32) / height * 2.0 - 1.0,
        depth,
        1.0,
    );
    let p = *inverse_mvp * ndc;
    let w = if p.w.abs() > f32::EPSILON { p.w } else { 1.0 };
    p.truncate() / w
}

/// Inverts a matrix, reporting singular input as an error.
pub fn try_inverse(matrix: &Mat4, what: &'static str) -> Result<Mat4> {
    let det = matrix.determinant();
    if det.abs() < 1e-12 || !det.is_finite() {
        return Err(NeuroviewError::SingularMatrix(what));
    }
    Ok(matrix.inverse())
}
