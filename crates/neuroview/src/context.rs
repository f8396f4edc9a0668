//! Per-call rendering context.

use neuroview_core::{MousePosition, TabIndex, Viewport};
use neuroview_structures::Drawable;

/// What a render call produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Shaded pixels for display.
    #[default]
    Drawing,
    /// Pick colors; the pixel under the mouse names a primitive.
    Identification,
    /// Triangle ids, resolved to a point on the surface.
    Projection,
}

impl Mode {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Mode::Drawing => "drawing",
            Mode::Identification => "identification",
            Mode::Projection => "projection",
        }
    }

    /// Whether draw calls read back the pixel under the mouse.
    #[must_use]
    pub fn is_picking(self) -> bool {
        self != Mode::Drawing
    }
}

/// Explicit inputs of one render call, built fresh each time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub mode: Mode,
    pub mouse: MousePosition,
    pub tab: TabIndex,
    pub viewport: Viewport,
}

impl RenderContext {
    #[must_use]
    pub fn drawing(tab: TabIndex, viewport: Viewport) -> Self {
        Self {
            mode: Mode::Drawing,
            mouse: MousePosition::default(),
            tab,
            viewport,
        }
    }

    #[must_use]
    pub fn identification(tab: TabIndex, viewport: Viewport, mouse: MousePosition) -> Self {
        Self {
            mode: Mode::Identification,
            mouse,
            tab,
            viewport,
        }
    }

    #[must_use]
    pub fn projection(tab: TabIndex, viewport: Viewport, mouse: MousePosition) -> Self {
        Self {
            mode: Mode::Projection,
            mouse,
            tab,
            viewport,
        }
    }

    /// Whether a sub-viewport takes part in this call. Picking skips cells
    /// the mouse is not over.
    #[must_use]
    pub fn wants(&self, cell: Viewport) -> bool {
        cell.is_valid() && (!self.mode.is_picking() || cell.contains(self.mouse.x, self.mouse.y))
    }
}

/// A drawable shown in one viewport of one tab.
#[derive(Debug, Clone, Copy)]
pub struct ViewportContent<'a> {
    pub tab: TabIndex,
    pub viewport: Viewport,
    pub drawable: &'a Drawable,
}

impl<'a> ViewportContent<'a> {
    #[must_use]
    pub fn new(tab: TabIndex, viewport: Viewport, drawable: &'a Drawable) -> Self {
        Self {
            tab,
            viewport,
            drawable,
        }
    }
}
