//! Mapping of scalar voxel values to colors.
//!
//! Palette computation lives outside this workspace; a drawable only needs
//! something that turns a value into RGBA, or declines to draw it.

/// Maps a scalar to a color. `None` means the value is not drawn
/// (below threshold, NaN, outside the palette range).
pub trait Palette {
    fn rgba(&self, value: f32) -> Option<[u8; 4]>;
}

impl<F> Palette for F
where
    F: Fn(f32) -> Option<[u8; 4]>,
{
    fn rgba(&self, value: f32) -> Option<[u8; 4]> {
        self(value)
    }
}

/// Linear gray ramp between `min` and `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grayscale {
    pub min: f32,
    pub max: f32,
    /// Values strictly below this are not drawn.
    pub threshold: Option<f32>,
}

impl Grayscale {
    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            threshold: None,
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

impl Default for Grayscale {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

impl Palette for Grayscale {
    fn rgba(&self, value: f32) -> Option<[u8; 4]> {
        if !value.is_finite() {
            return None;
        }
        if self.threshold.is_some_and(|t| value < t) {
            return None;
        }
        let range = self.max - self.min;
        let t = if range.abs() < f32::EPSILON {
            1.0
        } else {
            ((value - self.min) / range).clamp(0.0, 1.0)
        };
        let gray = (t * 255.0).round() as u8;
        Some([gray, gray, gray, 255])
    }
}
