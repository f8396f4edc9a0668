//! Window-space viewport rectangles and mouse positions.
//!
//! All window coordinates use a bottom-left origin: `y = 0` is the lowest
//! row of the window, matching the depth/color readback convention of the
//! raster targets.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{NeuroviewError, Result};

/// An integer rectangle in window pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewport {
    /// Left edge.
    pub x: i32,
    /// Bottom edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Viewport {
    /// Creates a new viewport.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns whether both dimensions are positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Returns `Ok(self)` for a drawable viewport.
    pub fn validated(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(NeuroviewError::InvalidViewport {
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Width divided by height. Invalid viewports report 1.0.
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        if self.is_valid() {
            self.width as f32 / self.height as f32
        } else {
            1.0
        }
    }

    /// Returns whether the window position lies inside this viewport.
    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x as f32
            && x < (self.x + self.width) as f32
            && y >= self.y as f32
            && y < (self.y + self.height) as f32
    }

    /// Center of the viewport in window coordinates.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.x as f32 + self.width as f32 * 0.5,
            self.y as f32 + self.height as f32 * 0.5,
        )
    }

    /// Right edge (exclusive).
    #[must_use]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Top edge (exclusive).
    #[must_use]
    pub fn top(&self) -> i32 {
        self.y + self.height
    }
}

/// Mouse position in window pixels, bottom-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MousePosition {
    pub x: f32,
    pub y: f32,
}

impl MousePosition {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Converts a position reported with a top-left origin (as windowing
    /// systems do) into the bottom-left convention.
    #[must_use]
    pub fn from_top_left(x: f32, y: f32, window_height: u32) -> Self {
        Self {
            x,
            y: window_height as f32 - 1.0 - y,
        }
    }

    /// Integer pixel containing this position.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn pixel(&self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }

    /// Center of [`Self::pixel`], the point rasterizers sample coverage at.
    #[must_use]
    pub fn pixel_center(&self) -> Vec2 {
        Vec2::new(self.x.floor() + 0.5, self.y.floor() + 0.5)
    }

    #[must_use]
    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_validity() {
        assert!(Viewport::new(0, 0, 10, 10).is_valid());
        assert!(!Viewport::new(0, 0, 0, 10).is_valid());
        assert!(!Viewport::new(0, 0, 10, -1).is_valid());
        assert!(Viewport::new(0, 0, 10, 0).validated().is_err());
    }

    #[test]
    fn test_contains_uses_half_open_bounds() {
        let vp = Viewport::new(10, 20, 100, 50);
        assert!(vp.contains(10.0, 20.0));
        assert!(vp.contains(109.5, 69.5));
        assert!(!vp.contains(110.0, 30.0));
        assert!(!vp.contains(50.0, 70.0));
    }

    #[test]
    fn test_mouse_from_top_left() {
        let m = MousePosition::from_top_left(5.0, 0.0, 100);
        assert_eq!(m.pixel(), (5, 99));
    }

    #[test]
    fn test_pixel_center() {
        assert_eq!(MousePosition::new(100.0, 7.9).pixel_center(), Vec2::new(100.5, 7.5));
        assert_eq!(MousePosition::new(-0.2, 3.5).pixel_center(), Vec2::new(-0.5, 3.5));
    }
}
