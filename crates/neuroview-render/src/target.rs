//! The raster target abstraction.
//!
//! The scene renderer composes matrices on the CPU and hands each target a
//! [`DrawState`] plus plain geometry batches. Targets rasterize into a color
//! buffer and a depth buffer whose pixels can be read back individually,
//! which is all color identification needs.
//!
//! Window coordinates have their origin at the bottom-left pixel.

use glam::{Mat3, Mat4, Vec3};
use image::RgbaImage;
use neuroview_core::Viewport;

use crate::error::{RenderError, RenderResult};

/// How fragments get their color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadingMode {
    /// Lit colors with alpha blending.
    #[default]
    Shaded,
    /// Exact flat colors: no lighting, no blending, no interpolation.
    Identification,
}

/// Colors of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Colors {
    /// One color for everything.
    Uniform([u8; 4]),
    /// One color per vertex.
    PerVertex(Vec<[u8; 4]>),
    /// One color per triangle or segment.
    PerPrimitive(Vec<[u8; 4]>),
}

impl Colors {
    /// Colors of the vertices of primitive `primitive`.
    ///
    /// Per-vertex colors are interpolated when shading; identification uses
    /// the first vertex's color for the whole primitive.
    #[must_use]
    pub fn primitive_colors<const N: usize>(
        &self,
        primitive: usize,
        vertices: [u32; N],
        mode: ShadingMode,
    ) -> [[u8; 4]; N] {
        match self {
            Colors::Uniform(color) => [*color; N],
            Colors::PerPrimitive(colors) => [colors.get(primitive).copied().unwrap_or([0; 4]); N],
            Colors::PerVertex(colors) => {
                let lookup = |v: u32| colors.get(v as usize).copied().unwrap_or([0; 4]);
                match mode {
                    ShadingMode::Shaded => vertices.map(lookup),
                    ShadingMode::Identification => [lookup(vertices[0]); N],
                }
            }
        }
    }

    fn validate(&self, vertex_count: usize, primitive_count: usize) -> RenderResult<()> {
        match self {
            Colors::Uniform(_) => Ok(()),
            Colors::PerVertex(c) if c.len() < vertex_count => Err(RenderError::InvalidBatch(
                format!("{} vertex colors for {vertex_count} vertices", c.len()),
            )),
            Colors::PerPrimitive(c) if c.len() < primitive_count => {
                Err(RenderError::InvalidBatch(format!(
                    "{} primitive colors for {primitive_count} primitives",
                    c.len()
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Indexed triangles.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleBatch {
    pub positions: Vec<Vec3>,
    /// Vertex normals, used for lighting when present.
    pub normals: Option<Vec<Vec3>>,
    pub triangles: Vec<[u32; 3]>,
    pub colors: Colors,
}

impl TriangleBatch {
    #[must_use]
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>, colors: Colors) -> Self {
        Self {
            positions,
            normals: None,
            triangles,
            colors,
        }
    }

    #[must_use]
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Appends an axis-free quad given its four corners in drawing order.
    pub fn push_quad(&mut self, corners: [Vec3; 4], color: [u8; 4]) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&corners);
        self.triangles.push([base, base + 1, base + 2]);
        self.triangles.push([base, base + 2, base + 3]);
        match &mut self.colors {
            Colors::PerPrimitive(colors) => {
                colors.push(color);
                colors.push(color);
            }
            Colors::PerVertex(colors) => colors.extend_from_slice(&[color; 4]),
            Colors::Uniform(_) => {}
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Checks that every index and color reference is in range.
    pub fn validate(&self) -> RenderResult<()> {
        let n = self.positions.len();
        if let Some(bad) = self.triangles.iter().flatten().find(|i| **i as usize >= n) {
            return Err(RenderError::InvalidBatch(format!(
                "triangle index {bad} out of range for {n} vertices"
            )));
        }
        if let Some(normals) = &self.normals {
            if normals.len() < n {
                return Err(RenderError::InvalidBatch(format!(
                    "{} normals for {n} vertices",
                    normals.len()
                )));
            }
        }
        self.colors.validate(n, self.triangles.len())
    }
}

/// Indexed line segments with a width in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct LineBatch {
    pub positions: Vec<Vec3>,
    pub segments: Vec<[u32; 2]>,
    pub colors: Colors,
    pub width: f32,
}

impl LineBatch {
    #[must_use]
    pub fn new(positions: Vec<Vec3>, segments: Vec<[u32; 2]>, colors: Colors, width: f32) -> Self {
        Self {
            positions,
            segments,
            colors,
            width,
        }
    }

    /// Segments joining consecutive points.
    #[must_use]
    pub fn polyline(points: Vec<Vec3>, color: [u8; 4], width: f32) -> Self {
        let segments = (1..points.len() as u32).map(|i| [i - 1, i]).collect();
        Self::new(points, segments, Colors::Uniform(color), width)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn validate(&self) -> RenderResult<()> {
        let n = self.positions.len();
        if let Some(bad) = self.segments.iter().flatten().find(|i| **i as usize >= n) {
            return Err(RenderError::InvalidBatch(format!(
                "segment index {bad} out of range for {n} vertices"
            )));
        }
        self.colors.validate(n, self.segments.len())
    }
}

/// Matrices and fixed-function state of one draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    /// Model space to clip space.
    pub mvp: Mat4,
    /// Model space to eye space; its rotation part transforms normals.
    pub model_view: Mat4,
    /// Sub-viewport in target window coordinates.
    pub viewport: Viewport,
    pub shading: ShadingMode,
    /// Subtracted from window depth so lines and symbols win over the
    /// surface they lie on.
    pub depth_bias: f32,
}

impl DrawState {
    #[must_use]
    pub fn new(projection: Mat4, model_view: Mat4, viewport: Viewport, shading: ShadingMode) -> Self {
        Self {
            mvp: projection * model_view,
            model_view,
            viewport,
            shading,
            depth_bias: 0.0,
        }
    }

    #[must_use]
    pub fn with_depth_bias(mut self, bias: f32) -> Self {
        self.depth_bias = bias;
        self
    }

    /// Matrix taking model normals to eye space.
    #[must_use]
    pub fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(self.model_view).inverse().transpose()
    }
}

/// Color and depth of one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    pub color: [u8; 4],
    /// Window depth in `[0, 1]`; 1.0 where nothing was drawn.
    pub depth: f32,
}

impl PixelSample {
    #[must_use]
    pub fn rgb(&self) -> [u8; 3] {
        [self.color[0], self.color[1], self.color[2]]
    }
}

/// Identification of the backend, logged with backend errors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackendInfo {
    pub name: String,
    pub vendor: String,
    pub version: String,
}

impl std::fmt::Display for BackendInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.vendor, self.version)
    }
}

/// Something that can rasterize batches and read pixels back.
pub trait RasterTarget {
    /// Target size in pixels.
    fn size(&self) -> (u32, u32);

    fn backend_info(&self) -> BackendInfo;

    /// Clears color to `color` and depth to 1.0 over the whole target.
    fn clear(&mut self, color: [u8; 4]) -> RenderResult<()>;

    fn draw_triangles(&mut self, state: &DrawState, batch: &TriangleBatch) -> RenderResult<()>;

    fn draw_lines(&mut self, state: &DrawState, batch: &LineBatch) -> RenderResult<()>;

    /// Reads one pixel in window coordinates; `None` outside the target.
    fn read_pixel(&mut self, x: i32, y: i32) -> RenderResult<Option<PixelSample>>;

    /// Reads the whole color buffer, top row first.
    fn read_image(&mut self) -> RenderResult<RgbaImage>;

    /// Writes the color buffer to a PNG file.
    fn save_png(&mut self, path: &std::path::Path) -> RenderResult<()> {
        let image = self.read_image()?;
        image.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}
