//! CPU rasterizer.
//!
//! A small scanline-free rasterizer: triangles are filled by testing pixel
//! centers against edge functions inside their clipped bounding box, lines
//! are stepped one pixel at a time along their major axis. Depth test is
//! `Less` with a `[0, 1]` depth buffer cleared to 1.0.
//!
//! Used for tests and headless rendering on machines without a GPU; it
//! produces the same identification colors as the wgpu target.

use glam::{Vec2, Vec3};
use image::{Rgba, RgbaImage};
use neuroview_core::{project_to_window, Viewport};

use crate::error::{RenderError, RenderResult};
use crate::shading::lit_vertex_colors;
use crate::target::{
    BackendInfo, DrawState, LineBatch, PixelSample, RasterTarget, ShadingMode, TriangleBatch,
};

/// Pixel rectangle `[x0, x1) x [y0, y1)` in window coordinates.
#[derive(Debug, Clone, Copy)]
struct Scissor {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

impl Scissor {
    fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }
}

/// A color and depth buffer in main memory.
#[derive(Debug, Clone)]
pub struct SoftwareTarget {
    width: u32,
    height: u32,
    /// Row-major, top row first.
    color: Vec<[u8; 4]>,
    depth: Vec<f32>,
}

impl SoftwareTarget {
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTargetSize { width, height });
        }
        let len = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            color: vec![[0, 0, 0, 255]; len],
            depth: vec![1.0; len],
        })
    }

    /// Reallocates the buffers; contents are cleared.
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        *self = Self::new(width, height)?;
        Ok(())
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let (w, h) = (self.width as i32, self.height as i32);
        if x < 0 || y < 0 || x >= w || y >= h {
            return None;
        }
        let row = (h - 1 - y) as usize;
        Some(row * self.width as usize + x as usize)
    }

    fn scissor(&self, viewport: Viewport) -> Scissor {
        Scissor {
            x0: viewport.x.max(0),
            y0: viewport.y.max(0),
            x1: viewport.right().min(self.width as i32),
            y1: viewport.top().min(self.height as i32),
        }
    }

    fn write_fragment(&mut self, x: i32, y: i32, depth: f32, color: [u8; 4], mode: ShadingMode) {
        if !(0.0..=1.0).contains(&depth) {
            return;
        }
        let Some(i) = self.index(x, y) else {
            return;
        };
        if depth >= self.depth[i] {
            return;
        }
        self.depth[i] = depth;
        self.color[i] = match mode {
            ShadingMode::Shaded if color[3] < 255 => blend_over(color, self.color[i]),
            _ => color,
        };
    }

    fn fill_triangle(
        &mut self,
        scissor: Scissor,
        window: [Vec3; 3],
        colors: [[u8; 4]; 3],
        bias: f32,
        mode: ShadingMode,
    ) {
        let [a, b, c] = window;
        if !window.iter().all(|v| v.is_finite()) {
            return;
        }
        let (a2, b2, c2) = (a.truncate(), b.truncate(), c.truncate());
        let area = edge(a2, b2, c2);
        if area.abs() < f32::EPSILON {
            return;
        }

        let min = a2.min(b2).min(c2);
        let max = a2.max(b2).max(c2);
        let x0 = clamp_pixel(min.x.floor(), scissor.x0, scissor.x1);
        let x1 = clamp_pixel(max.x.ceil() + 1.0, scissor.x0, scissor.x1);
        let y0 = clamp_pixel(min.y.floor(), scissor.y0, scissor.y1);
        let y1 = clamp_pixel(max.y.ceil() + 1.0, scissor.y0, scissor.y1);

        for py in y0..y1 {
            for px in x0..x1 {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let w0 = edge(b2, c2, p) / area;
                let w1 = edge(c2, a2, p) / area;
                let w2 = edge(a2, b2, p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let depth = w0 * a.z + w1 * b.z + w2 * c.z - bias;
                let color = match mode {
                    ShadingMode::Shaded => mix3(colors, [w0, w1, w2]),
                    ShadingMode::Identification => colors[0],
                };
                self.write_fragment(px, py, depth, color, mode);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn stroke_segment(
        &mut self,
        scissor: Scissor,
        a: Vec3,
        b: Vec3,
        colors: [[u8; 4]; 2],
        width: f32,
        bias: f32,
        mode: ShadingMode,
    ) {
        if !a.is_finite() || !b.is_finite() {
            return;
        }
        let thickness = width.round().max(1.0) as i32;
        let pad = thickness as f32;
        let bounds = (
            Vec2::new(scissor.x0 as f32 - pad, scissor.y0 as f32 - pad),
            Vec2::new(scissor.x1 as f32 + pad, scissor.y1 as f32 + pad),
        );
        let Some((t0, t1)) = clip_segment(a.truncate(), b.truncate(), bounds) else {
            return;
        };
        let (start, end) = (a.lerp(b, t0), a.lerp(b, t1));
        let delta = (end - start).truncate();
        let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0) as i32;
        let lo = -(thickness - 1) / 2;
        let hi = thickness / 2;

        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let p = start.lerp(end, t);
            let color = match mode {
                ShadingMode::Shaded => mix2(colors, t0 + (t1 - t0) * t),
                ShadingMode::Identification => colors[0],
            };
            let (cx, cy) = (p.x.floor() as i32, p.y.floor() as i32);
            for dy in lo..=hi {
                for dx in lo..=hi {
                    let (x, y) = (cx + dx, cy + dy);
                    if x < scissor.x0 || x >= scissor.x1 || y < scissor.y0 || y >= scissor.y1 {
                        continue;
                    }
                    self.write_fragment(x, y, p.z - bias, color, mode);
                }
            }
        }
    }
}

impl RasterTarget for SoftwareTarget {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn backend_info(&self) -> BackendInfo {
        BackendInfo {
            name: "software".to_string(),
            vendor: "neuroview".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn clear(&mut self, color: [u8; 4]) -> RenderResult<()> {
        self.color.fill(color);
        self.depth.fill(1.0);
        Ok(())
    }

    fn draw_triangles(&mut self, state: &DrawState, batch: &TriangleBatch) -> RenderResult<()> {
        batch.validate()?;
        let scissor = self.scissor(state.viewport);
        if scissor.is_empty() || batch.is_empty() {
            return Ok(());
        }
        let window: Vec<Vec3> = batch
            .positions
            .iter()
            .map(|p| project_to_window(&state.mvp, state.viewport, *p))
            .collect();
        let lit = lit_vertex_colors(batch, state.normal_matrix(), state.shading);

        for (i, tri) in batch.triangles.iter().enumerate() {
            let colors = match &lit {
                Some(lit) => tri.map(|v| lit[v as usize]),
                None => batch.colors.primitive_colors(i, *tri, state.shading),
            };
            let corners = tri.map(|v| window[v as usize]);
            self.fill_triangle(scissor, corners, colors, state.depth_bias, state.shading);
        }
        Ok(())
    }

    fn draw_lines(&mut self, state: &DrawState, batch: &LineBatch) -> RenderResult<()> {
        batch.validate()?;
        let scissor = self.scissor(state.viewport);
        if scissor.is_empty() || batch.is_empty() {
            return Ok(());
        }
        for (i, seg) in batch.segments.iter().enumerate() {
            let [a, b] =
                seg.map(|v| project_to_window(&state.mvp, state.viewport, batch.positions[v as usize]));
            let colors = batch.colors.primitive_colors(i, *seg, state.shading);
            self.stroke_segment(
                scissor,
                a,
                b,
                colors,
                batch.width,
                state.depth_bias,
                state.shading,
            );
        }
        Ok(())
    }

    fn read_pixel(&mut self, x: i32, y: i32) -> RenderResult<Option<PixelSample>> {
        Ok(self.index(x, y).map(|i| PixelSample {
            color: self.color[i],
            depth: self.depth[i],
        }))
    }

    fn read_image(&mut self) -> RenderResult<RgbaImage> {
        let width = self.width as usize;
        Ok(RgbaImage::from_fn(self.width, self.height, |x, y| {
            Rgba(self.color[y as usize * width + x as usize])
        }))
    }
}

/// Twice the signed area of `(a, b, p)`.
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b - a).perp_dot(p - a)
}

fn clamp_pixel(value: f32, lo: i32, hi: i32) -> i32 {
    if value.is_nan() {
        return lo;
    }
    value.clamp(lo as f32, hi as f32) as i32
}

fn mix3(colors: [[u8; 4]; 3], w: [f32; 3]) -> [u8; 4] {
    std::array::from_fn(|c| {
        let v = f32::from(colors[0][c]) * w[0]
            + f32::from(colors[1][c]) * w[1]
            + f32::from(colors[2][c]) * w[2];
        v.round().clamp(0.0, 255.0) as u8
    })
}

fn mix2(colors: [[u8; 4]; 2], t: f32) -> [u8; 4] {
    std::array::from_fn(|c| {
        let v = f32::from(colors[0][c]) * (1.0 - t) + f32::from(colors[1][c]) * t;
        v.round().clamp(0.0, 255.0) as u8
    })
}

/// Source-over blending with an opaque result.
fn blend_over(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    let a = f32::from(src[3]) / 255.0;
    let mix = |s: u8, d: u8| (f32::from(s) * a + f32::from(d) * (1.0 - a)).round() as u8;
    [mix(src[0], dst[0]), mix(src[1], dst[1]), mix(src[2], dst[2]), 255]
}

/// Liang-Barsky clipping of `a -> b` against an axis-aligned box.
///
/// Returns the parameter range that lies inside.
fn clip_segment(a: Vec2, b: Vec2, (min, max): (Vec2, Vec2)) -> Option<(f32, f32)> {
    let d = b - a;
    let mut t0 = 0.0_f32;
    let mut t1 = 1.0_f32;
    for (p, q) in [
        (-d.x, a.x - min.x),
        (d.x, max.x - a.x),
        (-d.y, a.y - min.y),
        (d.y, max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Colors;
    use glam::Mat4;

    fn full_state(size: i32, shading: ShadingMode) -> DrawState {
        // Identity projection: model [-1, 1]² fills the viewport.
        DrawState::new(
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            Viewport::new(0, 0, size, size),
            shading,
        )
    }

    fn quad(z: f32, color: [u8; 4]) -> TriangleBatch {
        let mut batch = TriangleBatch::new(Vec::new(), Vec::new(), Colors::PerPrimitive(Vec::new()));
        batch.push_quad(
            [
                Vec3::new(-0.5, -0.5, z),
                Vec3::new(0.5, -0.5, z),
                Vec3::new(0.5, 0.5, z),
                Vec3::new(-0.5, 0.5, z),
            ],
            color,
        );
        batch
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            SoftwareTarget::new(0, 10),
            Err(RenderError::InvalidTargetSize { .. })
        ));
    }

    #[test]
    fn test_triangle_covers_center_only() {
        let mut target = SoftwareTarget::new(20, 20).unwrap();
        target.clear([0, 0, 0, 255]).unwrap();
        let state = full_state(20, ShadingMode::Identification);
        target.draw_triangles(&state, &quad(0.5, [0, 0, 7, 255])).unwrap();

        let center = target.read_pixel(10, 10).unwrap().unwrap();
        assert_eq!(center.rgb(), [0, 0, 7]);
        assert!((center.depth - 0.5).abs() < 1e-5);

        let corner = target.read_pixel(1, 1).unwrap().unwrap();
        assert_eq!(corner.rgb(), [0, 0, 0]);
        assert_eq!(corner.depth, 1.0);
    }

    #[test]
    fn test_depth_test_keeps_nearest() {
        let mut target = SoftwareTarget::new(16, 16).unwrap();
        target.clear([0, 0, 0, 255]).unwrap();
        let state = full_state(16, ShadingMode::Identification);
        target.draw_triangles(&state, &quad(0.2, [0, 0, 1, 255])).unwrap();
        target.draw_triangles(&state, &quad(0.6, [0, 0, 2, 255])).unwrap();
        let sample = target.read_pixel(8, 8).unwrap().unwrap();
        assert_eq!(sample.rgb(), [0, 0, 1]);
    }

    #[test]
    fn test_outside_depth_range_is_clipped() {
        let mut target = SoftwareTarget::new(16, 16).unwrap();
        target.clear([0, 0, 0, 255]).unwrap();
        let state = full_state(16, ShadingMode::Identification);
        target.draw_triangles(&state, &quad(1.5, [0, 0, 1, 255])).unwrap();
        assert_eq!(target.read_pixel(8, 8).unwrap().unwrap().rgb(), [0, 0, 0]);
    }

    #[test]
    fn test_sub_viewport_scissor() {
        let mut target = SoftwareTarget::new(20, 10).unwrap();
        target.clear([0, 0, 0, 255]).unwrap();
        let mut batch = quad(0.5, [0, 0, 3, 255]);
        for p in &mut batch.positions {
            p.x *= 4.0;
            p.y *= 4.0;
        }
        let state = DrawState::new(
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            Viewport::new(10, 0, 10, 10),
            ShadingMode::Identification,
        );
        target.draw_triangles(&state, &batch).unwrap();
        assert_eq!(target.read_pixel(15, 5).unwrap().unwrap().rgb(), [0, 0, 3]);
        assert_eq!(target.read_pixel(5, 5).unwrap().unwrap().rgb(), [0, 0, 0]);
    }

    #[test]
    fn test_bottom_left_origin() {
        let mut target = SoftwareTarget::new(10, 10).unwrap();
        target.clear([0, 0, 0, 255]).unwrap();
        let mut batch = TriangleBatch::new(Vec::new(), Vec::new(), Colors::Uniform([255, 0, 0, 255]));
        batch.push_quad(
            [
                Vec3::new(-1.0, -1.0, 0.5),
                Vec3::new(0.0, -1.0, 0.5),
                Vec3::new(0.0, 0.0, 0.5),
                Vec3::new(-1.0, 0.0, 0.5),
            ],
            [255, 0, 0, 255],
        );
        target
            .draw_triangles(&full_state(10, ShadingMode::Identification), &batch)
            .unwrap();
        assert_eq!(target.read_pixel(2, 2).unwrap().unwrap().rgb(), [255, 0, 0]);
        let image = target.read_image().unwrap();
        // Image rows are top first, so the lit quad is at the bottom.
        assert_eq!(image.get_pixel(2, 7).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(2, 2).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_line_is_drawn() {
        let mut target = SoftwareTarget::new(20, 20).unwrap();
        target.clear([0, 0, 0, 255]).unwrap();
        let batch = LineBatch::polyline(
            vec![Vec3::new(-0.9, 0.0, 0.5), Vec3::new(0.9, 0.0, 0.5)],
            [0, 9, 0, 255],
            1.0,
        );
        target
            .draw_lines(&full_state(20, ShadingMode::Identification), &batch)
            .unwrap();
        assert_eq!(target.read_pixel(10, 10).unwrap().unwrap().rgb(), [0, 9, 0]);
    }

    #[test]
    fn test_far_away_line_is_clipped() {
        let mut target = SoftwareTarget::new(8, 8).unwrap();
        let batch = LineBatch::polyline(
            vec![Vec3::new(-1e4, 0.0, 0.5), Vec3::new(1e4, 0.0, 0.5)],
            [0, 9, 0, 255],
            1.0,
        );
        target
            .draw_lines(&full_state(8, ShadingMode::Identification), &batch)
            .unwrap();
        assert_eq!(target.read_pixel(4, 4).unwrap().unwrap().rgb(), [0, 9, 0]);
    }

    #[test]
    fn test_translucent_blend() {
        let mut target = SoftwareTarget::new(8, 8).unwrap();
        target.clear([0, 0, 0, 255]).unwrap();
        target
            .draw_triangles(&full_state(8, ShadingMode::Shaded), &quad(0.5, [200, 0, 0, 128]))
            .unwrap();
        let c = target.read_pixel(4, 4).unwrap().unwrap().color;
        assert!(c[0] > 90 && c[0] < 110);
        assert_eq!(c[3], 255);
    }

    #[test]
    fn test_clip_segment() {
        let bounds = (Vec2::ZERO, Vec2::splat(10.0));
        let (t0, t1) = clip_segment(Vec2::new(-10.0, 5.0), Vec2::new(20.0, 5.0), bounds).unwrap();
        assert!((t0 - 1.0 / 3.0).abs() < 1e-5);
        assert!((t1 - 2.0 / 3.0).abs() < 1e-5);
        assert!(clip_segment(Vec2::new(-5.0, -5.0), Vec2::new(-1.0, -1.0), bounds).is_none());
    }
}
