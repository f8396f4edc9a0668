//! Text drawing collaborator.

use glam::{Mat4, Vec3};
use neuroview_core::{project_to_window, Viewport};

/// Horizontal anchoring of a label relative to its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizontalAlignment {
    Left,
    #[default]
    Center,
    Right,
}

/// Vertical anchoring of a label relative to its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAlignment {
    Bottom,
    #[default]
    Center,
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub color: [u8; 4],
    /// Font height in pixels.
    pub size: f32,
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: [255, 255, 255, 255],
            size: 14.0,
            horizontal: HorizontalAlignment::Center,
            vertical: VerticalAlignment::Center,
        }
    }
}

/// Draws annotation text over a viewport.
pub trait TextRenderer {
    /// Draws `text` at window position `(x, y)`.
    fn draw_text_at_viewport_coords(
        &mut self,
        viewport: Viewport,
        x: f32,
        y: f32,
        text: &str,
        style: &TextStyle,
    );

    /// Draws `text` at the window position of a model-space point.
    fn draw_text_at_model_coords(
        &mut self,
        mvp: &Mat4,
        viewport: Viewport,
        point: Vec3,
        text: &str,
        style: &TextStyle,
    ) {
        let window = project_to_window(mvp, viewport, point);
        self.draw_text_at_viewport_coords(viewport, window.x, window.y, text, style);
    }
}

/// Discards all text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTextRenderer;

impl TextRenderer for NullTextRenderer {
    fn draw_text_at_viewport_coords(
        &mut self,
        _viewport: Viewport,
        _x: f32,
        _y: f32,
        _text: &str,
        _style: &TextStyle,
    ) {
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<(f32, f32, String)>);

    impl TextRenderer for Recorder {
        fn draw_text_at_viewport_coords(
            &mut self,
            _viewport: Viewport,
            x: f32,
            y: f32,
            text: &str,
            _style: &TextStyle,
        ) {
            self.0.push((x, y, text.to_string()));
        }
    }

    #[test]
    fn test_model_coords_project_through_mvp() {
        let mut recorder = Recorder::default();
        let viewport = Viewport::new(0, 0, 100, 100);
        recorder.draw_text_at_model_coords(
            &Mat4::IDENTITY,
            viewport,
            Vec3::ZERO,
            "S",
            &TextStyle::default(),
        );
        let (x, y, text) = &recorder.0[0];
        assert!((x - 50.0).abs() < 1e-4);
        assert!((y - 50.0).abs() < 1e-4);
        assert_eq!(text, "S");
    }
}
