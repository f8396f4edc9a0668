//! Configuration options for rendering and identification.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::projection::DepthRange;

/// Global configuration options for the rendering pipeline.
///
/// Every field has a default, so a partial JSON document is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Background color of the drawing pass.
    pub background_color: [u8; 3],

    /// Depth range used for frusta.
    pub depth_range: DepthRange,

    /// Half of the visible window height in model units (millimeters) at scale 1.
    pub half_window_height: f32,

    /// Distance from a slice plane to the slice camera, along the plane normal.
    pub slice_look_at_offset: f32,

    /// Pixel gap between montage cells.
    pub montage_gap: i32,

    /// Samples per screen axis when resampling an oblique slice.
    pub oblique_samples_per_axis: u32,

    /// Mouse-drag rotation rate.
    pub rotation_degrees_per_pixel: f32,

    /// Edge length of billboarded foci and node symbols, in model units.
    pub symbol_size: f32,

    /// Pixel size of border and fiber points.
    pub point_size: f32,

    /// Pixel width of lines (borders, fibers, slice outlines).
    pub line_width: f32,

    /// Whether to draw orientation letters around volume slices.
    pub show_orientation_labels: bool,

    /// Whether the empty quadrant of an orthogonal grid layout shows axes.
    pub show_orientation_axes: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            background_color: [0, 0, 0],
            depth_range: DepthRange::Composite,
            half_window_height: 100.0,
            slice_look_at_offset: 1.0,
            montage_gap: 4,
            oblique_samples_per_axis: 128,
            rotation_degrees_per_pixel: 0.5,
            symbol_size: 3.0,
            point_size: 3.0,
            line_width: 1.0,
            show_orientation_labels: true,
            show_orientation_axes: true,
        }
    }
}

impl Options {
    /// Parses options from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let options = Self::from_json_str(&text)?;
        log::debug!("loaded render options: {options:?}");
        Ok(options)
    }

    /// Serializes options as pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
