//! Offscreen wgpu raster target.
//!
//! Renders into an `Rgba8Unorm` color texture (exact 8-bit values, so
//! identification colors survive the round trip) and a `Depth32Float` depth
//! texture. Vertices are transformed on the CPU and uploaded per draw call
//! in target clip space; the shader only passes them through. Single pixels
//! are read back through a 256-byte aligned staging buffer.

use glam::{Vec2, Vec3};
use image::RgbaImage;
use neuroview_core::{project_to_window, Viewport};
use wgpu::util::DeviceExt;

use crate::error::{RenderError, RenderResult};
use crate::shading::lit_vertex_colors;
use crate::target::{
    BackendInfo, DrawState, LineBatch, PixelSample, RasterTarget, ShadingMode, TriangleBatch,
};

/// Color attachment format.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// Depth attachment format.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Offset of the depth texel in the pixel readback buffer.
const DEPTH_READBACK_OFFSET: u64 = 256;

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuVertex {
    clip_position: [f32; 4],
    color: [u8; 4],
}

impl GpuVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x4, 1 => Unorm8x4];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

struct Pipelines {
    triangles_blend: wgpu::RenderPipeline,
    triangles_replace: wgpu::RenderPipeline,
    lines_blend: wgpu::RenderPipeline,
    lines_replace: wgpu::RenderPipeline,
}

impl Pipelines {
    fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("flat color shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/flat_color.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("flat color pipeline layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });
        let build = |label: &str, topology: wgpu::PrimitiveTopology, blend: Option<wgpu::BlendState>| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[GpuVertex::layout()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: COLOR_FORMAT,
                        blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    cull_mode: None, // Surfaces are seen from both sides
                    ..wgpu::PrimitiveState::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };
        Self {
            triangles_blend: build(
                "triangles (blended)",
                wgpu::PrimitiveTopology::TriangleList,
                Some(wgpu::BlendState::ALPHA_BLENDING),
            ),
            // No blending for identification
            triangles_replace: build("triangles", wgpu::PrimitiveTopology::TriangleList, None),
            lines_blend: build(
                "lines (blended)",
                wgpu::PrimitiveTopology::LineList,
                Some(wgpu::BlendState::ALPHA_BLENDING),
            ),
            lines_replace: build("lines", wgpu::PrimitiveTopology::LineList, None),
        }
    }

    fn select(&self, topology: wgpu::PrimitiveTopology, blend: bool) -> &wgpu::RenderPipeline {
        match (topology, blend) {
            (wgpu::PrimitiveTopology::LineList, true) => &self.lines_blend,
            (wgpu::PrimitiveTopology::LineList, false) => &self.lines_replace,
            (_, true) => &self.triangles_blend,
            (_, false) => &self.triangles_replace,
        }
    }
}

/// An offscreen color + depth target on the GPU.
pub struct GpuTarget {
    device: wgpu::Device,
    queue: wgpu::Queue,
    info: BackendInfo,
    width: u32,
    height: u32,
    color_texture: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    pixel_readback: wgpu::Buffer,
    pipelines: Pipelines,
}

impl GpuTarget {
    /// Creates a target on the default adapter, blocking until it is ready.
    ///
    /// Returns [`RenderError::AdapterCreationFailed`] on machines without a
    /// usable GPU.
    pub fn new_headless(width: u32, height: u32) -> RenderResult<Self> {
        pollster::block_on(Self::new_headless_async(width, height))
    }

    pub async fn new_headless_async(width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTargetSize { width, height });
        }
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("neuroview device (headless)"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        let adapter_info = adapter.get_info();
        let info = BackendInfo {
            name: adapter_info.name,
            vendor: format!("{:#06x}", adapter_info.vendor),
            version: format!("{:?} {}", adapter_info.backend, adapter_info.driver_info),
        };
        log::debug!("created GPU target {width}x{height} on {info}");

        let (color_texture, color_view) = create_texture(&device, "color target", COLOR_FORMAT, width, height);
        let (depth_texture, depth_view) = create_texture(&device, "depth target", DEPTH_FORMAT, width, height);

        // Color texel at offset 0, depth texel at offset 256.
        let pixel_readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pixel readback buffer"),
            size: DEPTH_READBACK_OFFSET * 2,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let pipelines = Pipelines::new(&device);

        Ok(Self {
            device,
            queue,
            info,
            width,
            height,
            color_texture,
            color_view,
            depth_texture,
            depth_view,
            pixel_readback,
            pipelines,
        })
    }

    /// Converts a window position of a sub-viewport to target clip space.
    fn to_target_clip(&self, window: Vec3, bias: f32) -> [f32; 4] {
        [
            window.x / self.width as f32 * 2.0 - 1.0,
            window.y / self.height as f32 * 2.0 - 1.0,
            window.z - bias,
            1.0,
        ]
    }

    /// Scissor rectangle `(x, y, w, h)` with a top-left origin.
    fn scissor(&self, viewport: Viewport) -> Option<(u32, u32, u32, u32)> {
        let x0 = viewport.x.clamp(0, self.width as i32);
        let x1 = viewport.right().clamp(0, self.width as i32);
        let y0 = viewport.y.clamp(0, self.height as i32);
        let y1 = viewport.top().clamp(0, self.height as i32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((
            x0 as u32,
            self.height - y1 as u32,
            (x1 - x0) as u32,
            (y1 - y0) as u32,
        ))
    }

    fn submit_vertices(
        &self,
        viewport: Viewport,
        vertices: &[GpuVertex],
        topology: wgpu::PrimitiveTopology,
        blend: bool,
    ) {
        let Some((sx, sy, sw, sh)) = self.scissor(viewport) else {
            return;
        };
        if vertices.is_empty() {
            return;
        }
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("draw vertices"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("draw encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("draw pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_pipeline(self.pipelines.select(topology, blend));
            pass.set_scissor_rect(sx, sy, sw, sh);
            pass.set_vertex_buffer(0, buffer.slice(..));
            pass.draw(0..vertices.len() as u32, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Maps a staging buffer, hands its bytes to `read` and unmaps it.
    fn map_and_read<T>(&self, buffer: &wgpu::Buffer, read: impl FnOnce(&[u8]) -> T) -> RenderResult<T> {
        let buffer_slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| RenderError::BufferMapFailed(e.to_string()))?;
        rx.recv()
            .map_err(|e| RenderError::BufferMapFailed(e.to_string()))?
            .map_err(|e| RenderError::BufferMapFailed(e.to_string()))?;

        let data = buffer_slice.get_mapped_range();
        let value = read(&data);
        drop(data);
        buffer.unmap();
        Ok(value)
    }

    /// Calculates bytes per row with proper alignment for wgpu buffer copies.
    fn aligned_bytes_per_row(width: u32) -> u32 {
        let unaligned = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        unaligned.div_ceil(align) * align
    }
}

fn create_texture(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Two triangles covering a line segment of `width` pixels in window space.
fn segment_quad(a: Vec3, b: Vec3, width: f32) -> Option<[Vec3; 6]> {
    let direction = (b - a).truncate().normalize_or_zero();
    if direction == Vec2::ZERO {
        return None;
    }
    let offset = direction.perp() * (width * 0.5);
    let offset = offset.extend(0.0);
    let (a0, a1, b0, b1) = (a - offset, a + offset, b - offset, b + offset);
    Some([a0, b0, b1, a0, b1, a1])
}

impl RasterTarget for GpuTarget {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn backend_info(&self) -> BackendInfo {
        self.info.clone()
    }

    fn clear(&mut self, color: [u8; 4]) -> RenderResult<()> {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("clear encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(color[0]) / 255.0,
                            g: f64::from(color[1]) / 255.0,
                            b: f64::from(color[2]) / 255.0,
                            a: f64::from(color[3]) / 255.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn draw_triangles(&mut self, state: &DrawState, batch: &TriangleBatch) -> RenderResult<()> {
        batch.validate()?;
        let lit = lit_vertex_colors(batch, state.normal_matrix(), state.shading);
        let mut vertices = Vec::with_capacity(batch.triangles.len() * 3);
        for (i, tri) in batch.triangles.iter().enumerate() {
            let colors = match &lit {
                Some(lit) => tri.map(|v| lit[v as usize]),
                None => batch.colors.primitive_colors(i, *tri, state.shading),
            };
            for (v, color) in tri.iter().zip(colors) {
                let window =
                    project_to_window(&state.mvp, state.viewport, batch.positions[*v as usize]);
                vertices.push(GpuVertex {
                    clip_position: self.to_target_clip(window, state.depth_bias),
                    color,
                });
            }
        }
        let blend = state.shading == ShadingMode::Shaded;
        self.submit_vertices(
            state.viewport,
            &vertices,
            wgpu::PrimitiveTopology::TriangleList,
            blend,
        );
        Ok(())
    }

    fn draw_lines(&mut self, state: &DrawState, batch: &LineBatch) -> RenderResult<()> {
        batch.validate()?;
        let wide = batch.width > 1.0;
        let mut vertices = Vec::new();
        for (i, seg) in batch.segments.iter().enumerate() {
            let [a, b] = seg
                .map(|v| project_to_window(&state.mvp, state.viewport, batch.positions[v as usize]));
            let [ca, cb] = batch.colors.primitive_colors(i, *seg, state.shading);
            if wide {
                let Some(quad) = segment_quad(a, b, batch.width) else {
                    continue;
                };
                // a0, b0, b1, a0, b1, a1
                for (corner, color) in quad.iter().zip([ca, cb, cb, ca, cb, ca]) {
                    vertices.push(GpuVertex {
                        clip_position: self.to_target_clip(*corner, state.depth_bias),
                        color,
                    });
                }
            } else {
                for (p, color) in [(a, ca), (b, cb)] {
                    vertices.push(GpuVertex {
                        clip_position: self.to_target_clip(p, state.depth_bias),
                        color,
                    });
                }
            }
        }
        let topology = if wide {
            wgpu::PrimitiveTopology::TriangleList
        } else {
            wgpu::PrimitiveTopology::LineList
        };
        let blend = state.shading == ShadingMode::Shaded;
        self.submit_vertices(state.viewport, &vertices, topology, blend);
        Ok(())
    }

    fn read_pixel(&mut self, x: i32, y: i32) -> RenderResult<Option<PixelSample>> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return Ok(None);
        }
        // Textures have a top-left origin.
        let origin = wgpu::Origin3d {
            x: x as u32,
            y: self.height - 1 - y as u32,
            z: 0,
        };
        let texel = wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("pixel readback encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.color_texture,
                mip_level: 0,
                origin,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.pixel_readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
                    rows_per_image: Some(1),
                },
            },
            texel,
        );
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.depth_texture,
                mip_level: 0,
                origin,
                aspect: wgpu::TextureAspect::DepthOnly,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.pixel_readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: DEPTH_READBACK_OFFSET,
                    bytes_per_row: Some(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
                    rows_per_image: Some(1),
                },
            },
            texel,
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let depth_offset = DEPTH_READBACK_OFFSET as usize;
        let sample = self.map_and_read(&self.pixel_readback, |data| PixelSample {
            color: [data[0], data[1], data[2], data[3]],
            depth: bytemuck::pod_read_unaligned::<f32>(&data[depth_offset..depth_offset + 4]),
        })?;
        Ok(Some(sample))
    }

    fn read_image(&mut self) -> RenderResult<RgbaImage> {
        let bytes_per_row = Self::aligned_bytes_per_row(self.width);
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("image readback buffer"),
            size: u64::from(bytes_per_row) * u64::from(self.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("image readback encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.color_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        // Copy data, removing row padding
        let (width, height) = (self.width, self.height);
        let pixels = self.map_and_read(&staging, |data| {
            let row_bytes = (width * 4) as usize;
            let mut pixels = Vec::with_capacity(row_bytes * height as usize);
            for row in 0..height {
                let start = (row * bytes_per_row) as usize;
                pixels.extend_from_slice(&data[start..start + row_bytes]);
            }
            pixels
        })?;
        RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| RenderError::BufferMapFailed("short image readback".to_string()))
    }
}
