//! The scene renderer.
//!
//! One entry point per mode: [`SceneRenderer::draw_models`] shades pixels,
//! [`SceneRenderer::select_model`] runs a color-identification pick and
//! [`SceneRenderer::project_to_model`] resolves the mouse to barycentric
//! coordinates on a surface triangle.
//!
//! Every sub-viewport gets its own frustum and camera. In the picking modes
//! each category of primitive is a separate identification draw call: the
//! target is cleared, the category is drawn in pick colors, and the pixel
//! under the mouse is decoded and offered to the [`SelectionArbiter`]. The
//! category order is surfaces, borders, foci, node symbols, fibers, voxels.

use glam::{Mat4, Vec2, Vec3};
use neuroview_core::{
    build_plane, build_screen_quad, compose_slice_camera, layout_cells, project_to_window,
    project_triangle, surface_outline, try_inverse, unproject_from_window, BarycentricPlacement,
    CameraTransform, CellContent, ColorIdentification, Hemisphere, IdentificationKind,
    IdentificationResult, Identified, IndexTuple, MousePosition, Options, OrthographicFrustum,
    ScreenQuadCorners, SelectionArbiter, SelectionCandidate, SelectionTargets, SliceAxis,
    SlicePlane, SliceProjection, TabIndex, TransformSlot, Viewport, ViewingState,
    ViewingTransforms, BACKGROUND_COLOR,
};
use neuroview_render::{
    Colors, DrawState, LineBatch, RasterTarget, RenderError, ShadingMode, TriangleBatch,
};
use neuroview_structures::{
    in_plane_dimensions, Annotations, Drawable, HorizontalAlignment, NullTextRenderer,
    SurfaceDrawable, SurfaceMontageView, SurfaceView, TextRenderer, TextStyle,
    VerticalAlignment, VolumeDrawable, VolumeView, WholeBrainView,
};

use crate::context::{Mode, RenderContext, ViewportContent};

/// Window-depth offset that keeps lines and symbols in front of the surface
/// or slice they lie on.
pub const OVERLAY_DEPTH_BIAS: f32 = 1e-3;

/// Window-depth offset between stacked volume layers.
pub const LAYER_DEPTH_BIAS: f32 = 1e-5;

/// Pixel distance of orientation labels from the viewport edge.
const LABEL_MARGIN: f32 = 12.0;

/// Half height, in axis lengths, of the orientation-axes cell.
const AXES_HALF_HEIGHT: f32 = 1.5;

/// Corners of a square of edge `size` centered on `center` that faces the
/// viewer of a camera whose rotation inverts to `inverse_rotation`.
#[must_use]
pub fn billboard_corners(center: Vec3, size: f32, inverse_rotation: &Mat4) -> [Vec3; 4] {
    let half = size * 0.5;
    let right = inverse_rotation.transform_vector3(Vec3::X) * half;
    let up = inverse_rotation.transform_vector3(Vec3::Y) * half;
    [
        center - right - up,
        center + right - up,
        center + right + up,
        center - right + up,
    ]
}

/// A point on a surface found by [`SceneRenderer::project_to_model`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceProjection {
    /// Index of the surface within its drawable.
    pub model: usize,
    pub triangle: usize,
    pub nodes: [u32; 3],
    pub placement: BarycentricPlacement,
    pub model_xyz: Vec3,
    pub screen_depth: f32,
}

/// Matrices of one sub-viewport.
#[derive(Debug, Clone, Copy)]
struct View {
    viewport: Viewport,
    projection: Mat4,
    camera: CameraTransform,
    /// Model units covered by one pixel.
    pixel_size: f32,
}

impl View {
    fn new(viewport: Viewport, frustum: &OrthographicFrustum, camera: CameraTransform, scale: f32) -> Self {
        let pixel_size = frustum.height().abs() / viewport.height.max(1) as f32 / scale.max(f32::EPSILON);
        Self {
            viewport,
            projection: frustum.to_projection_matrix(),
            camera,
            pixel_size,
        }
    }

    fn mvp(&self) -> Mat4 {
        self.projection * self.camera.model_view
    }

    fn state(&self, shading: ShadingMode) -> DrawState {
        DrawState::new(self.projection, self.camera.model_view, self.viewport, shading)
    }

    fn window(&self, point: Vec3) -> Vec2 {
        project_to_window(&self.mvp(), self.viewport, point).truncate()
    }

    fn unproject(&self, mouse: MousePosition, depth: f32) -> Option<Vec3> {
        let inverse = try_inverse(&self.mvp(), "model view projection").ok()?;
        Some(unproject_from_window(&inverse, self.viewport, mouse.x, mouse.y, depth))
    }
}

#[derive(Debug, Clone, Copy)]
enum Batch<'b> {
    Triangles(&'b TriangleBatch),
    Lines(&'b LineBatch),
}

impl Batch<'_> {
    fn is_empty(&self) -> bool {
        match self {
            Batch::Triangles(b) => b.is_empty(),
            Batch::Lines(b) => b.is_empty(),
        }
    }
}

/// What the pixel under the mouse showed after an identification draw call.
#[derive(Debug, Clone, Copy)]
struct Hit {
    identified: Identified,
    depth: f32,
}

/// Mutable state of one render call.
struct Frame<'a> {
    target: &'a mut dyn RasterTarget,
    text: &'a mut dyn TextRenderer,
    context: RenderContext,
    identification: ColorIdentification,
    arbiter: SelectionArbiter,
    projection: Option<SurfaceProjection>,
}

impl<'a> Frame<'a> {
    fn new(
        target: &'a mut dyn RasterTarget,
        text: &'a mut dyn TextRenderer,
        context: RenderContext,
        targets: SelectionTargets,
    ) -> Self {
        Self {
            target,
            text,
            context,
            identification: ColorIdentification::new(),
            arbiter: SelectionArbiter::new(targets),
            projection: None,
        }
    }

    fn is_picking(&self) -> bool {
        self.context.mode.is_picking()
    }

    fn shading(&self) -> ShadingMode {
        if self.is_picking() {
            ShadingMode::Identification
        } else {
            ShadingMode::Shaded
        }
    }

    /// Whether a picking pass can skip a category.
    fn skips(&self, kinds: &[IdentificationKind]) -> bool {
        self.is_picking() && !self.arbiter.targets().any_enabled(kinds)
    }

    /// Starts an identification draw call.
    fn begin_pass(&mut self) {
        self.identification.reset();
    }

    /// Display color when drawing, pick color when picking.
    fn key(&mut self, kind: IdentificationKind, indices: IndexTuple, color: [u8; 4]) -> [u8; 4] {
        if self.is_picking() {
            self.identification.encode_rgba(kind, indices)
        } else {
            color
        }
    }

    fn report(&self, what: &str, viewport: Viewport, err: &RenderError) {
        log::error!(
            "{what} failed in {} mode, viewport {viewport:?}, backend {}: {err}",
            self.context.mode.name(),
            self.target.backend_info()
        );
    }

    /// Issues one draw call. When picking, the target is cleared first and
    /// the pixel under the mouse is decoded afterwards.
    fn draw(&mut self, what: &str, calls: &[(DrawState, Batch<'_>)]) -> Option<Hit> {
        let viewport = calls.first()?.0.viewport;
        if self.is_picking() {
            if self.identification.is_empty() {
                return None;
            }
            let [r, g, b] = BACKGROUND_COLOR;
            if let Err(err) = self.target.clear([r, g, b, 255]) {
                self.report(what, viewport, &err);
                return None;
            }
        }

        for (state, batch) in calls.iter().filter(|(_, b)| !b.is_empty()) {
            let result = match batch {
                Batch::Triangles(b) => self.target.draw_triangles(state, b),
                Batch::Lines(b) => self.target.draw_lines(state, b),
            };
            if let Err(err) = result {
                self.report(what, state.viewport, &err);
                return None;
            }
        }

        if !self.is_picking() {
            return None;
        }
        let (x, y) = self.context.mouse.pixel();
        let sample = match self.target.read_pixel(x, y) {
            Ok(sample) => sample?,
            Err(err) => {
                self.report(what, viewport, &err);
                return None;
            }
        };
        let identified = self.identification.decode(sample.rgb())?;
        Some(Hit {
            identified,
            depth: sample.depth,
        })
    }

    fn consider(&mut self, hit: Hit, model_xyz: Option<Vec3>) {
        let mut candidate =
            SelectionCandidate::new(hit.identified.kind, hit.identified.indices, hit.depth);
        if let Some(xyz) = model_xyz {
            candidate = candidate.with_model_xyz(xyz);
        }
        self.arbiter.consider(candidate);
    }

    fn offer_projection(&mut self, projection: SurfaceProjection) {
        let nearer = self
            .projection
            .map_or(true, |held| projection.screen_depth < held.screen_depth);
        if nearer {
            self.projection = Some(projection);
        }
    }

    fn label(&mut self, viewport: Viewport, position: Vec2, text: &str, style: &TextStyle) {
        self.text
            .draw_text_at_viewport_coords(viewport, position.x, position.y, text, style);
    }
}

/// Renders drawables into raster targets and resolves picks.
#[derive(Debug, Clone, Default)]
pub struct SceneRenderer {
    options: Options,
    transforms: ViewingTransforms,
    /// Inverse rotation of the most recently composed camera; billboards
    /// are oriented with it.
    inverse_rotation: Option<Mat4>,
}

impl SceneRenderer {
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            options,
            transforms: ViewingTransforms::new(),
            inverse_rotation: None,
        }
    }

    #[must_use]
    pub fn with_transforms(mut self, transforms: ViewingTransforms) -> Self {
        self.transforms = transforms;
        self
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    #[must_use]
    pub fn transforms(&self) -> &ViewingTransforms {
        &self.transforms
    }

    pub fn transforms_mut(&mut self) -> &mut ViewingTransforms {
        &mut self.transforms
    }

    /// Inverse rotation cached by the last camera composition.
    #[must_use]
    pub fn cached_inverse_rotation(&self) -> Option<Mat4> {
        self.inverse_rotation
    }

    /// Draws every viewport's content. The target is cleared to the
    /// background color once; backend failures are logged and skipped.
    pub fn draw_models(
        &mut self,
        target: &mut dyn RasterTarget,
        text: &mut dyn TextRenderer,
        contents: &[ViewportContent<'_>],
    ) {
        let [r, g, b] = self.options.background_color;
        if let Err(err) = target.clear([r, g, b, 255]) {
            log::error!(
                "clear failed in drawing mode, backend {}: {err}",
                target.backend_info()
            );
            return;
        }
        for content in contents {
            let context = RenderContext::drawing(content.tab, content.viewport);
            let mut frame = Frame::new(&mut *target, &mut *text, context, SelectionTargets::none());
            self.draw_drawable(&mut frame, content.drawable);
        }
    }

    /// Identifies what lies under `mouse`.
    ///
    /// `target` is used as an off-screen identification buffer and is left
    /// holding pick colors.
    pub fn select_model(
        &mut self,
        target: &mut dyn RasterTarget,
        content: &ViewportContent<'_>,
        mouse: MousePosition,
        targets: SelectionTargets,
    ) -> IdentificationResult {
        let context = RenderContext::identification(content.tab, content.viewport, mouse);
        let mut text = NullTextRenderer;
        let mut frame = Frame::new(target, &mut text, context, targets);
        self.draw_drawable(&mut frame, content.drawable);
        let result = frame.arbiter.finish();
        log::debug!("identified {} item(s) at ({}, {})", result.hits().len(), mouse.x, mouse.y);
        result
    }

    /// Projects `mouse` onto the nearest surface triangle under it.
    pub fn project_to_model(
        &mut self,
        target: &mut dyn RasterTarget,
        content: &ViewportContent<'_>,
        mouse: MousePosition,
    ) -> Option<SurfaceProjection> {
        let context = RenderContext::projection(content.tab, content.viewport, mouse);
        let mut text = NullTextRenderer;
        let targets = SelectionTargets::only(&[IdentificationKind::SurfaceTriangle]);
        let mut frame = Frame::new(target, &mut text, context, targets);
        self.draw_drawable(&mut frame, content.drawable);
        frame.projection
    }

    fn draw_drawable(&mut self, frame: &mut Frame<'_>, drawable: &Drawable) {
        if !frame.context.viewport.is_valid() {
            log::debug!(
                "skipping {} in invalid viewport {:?}",
                drawable.kind_name(),
                frame.context.viewport
            );
            return;
        }
        match drawable {
            Drawable::Surface(view) => self.draw_surface_view(frame, view),
            Drawable::SurfaceMontage(view) => self.draw_surface_montage(frame, view),
            Drawable::Volume(view) => self.draw_volume_view(frame, view),
            Drawable::WholeBrain(view) => self.draw_whole_brain(frame, view),
        }
    }

    fn viewing_state(&self, tab: TabIndex, slot: TransformSlot) -> Option<ViewingState> {
        match self.transforms.state(tab, slot) {
            Ok(state) => Some(*state),
            Err(err) => {
                log::debug!("no viewing transform: {err}");
                None
            }
        }
    }

    fn frustum(&self, viewport: Viewport, half_height: f32) -> Option<OrthographicFrustum> {
        OrthographicFrustum::compute(viewport, half_height, self.options.depth_range, None)
            .map_err(|err| log::debug!("skipping viewport: {err}"))
            .ok()
    }

    /// Camera for a 3D model view, caching its inverse rotation.
    fn model_camera(
        &mut self,
        tab: TabIndex,
        slot: TransformSlot,
        viewport: Viewport,
        mirrored: bool,
        center: Option<Vec3>,
    ) -> Option<View> {
        let frustum = self.frustum(viewport, self.options.half_window_height)?;
        let frustum = if mirrored { frustum.mirrored() } else { frustum };
        let state = self.viewing_state(tab, slot)?;
        let camera = state.compose_model_view(center);
        self.inverse_rotation = camera.inverse_rotation;
        Some(View::new(viewport, &frustum, camera, state.scale()))
    }

    fn draw_surface_view(&mut self, frame: &mut Frame<'_>, view: &SurfaceView) {
        let viewport = frame.context.viewport;
        if !view.surface.is_enabled() || !frame.context.wants(viewport) {
            return;
        }
        let Some(camera) = self.model_camera(
            frame.context.tab,
            TransformSlot::Normal,
            viewport,
            false,
            view.surface.center(),
        ) else {
            return;
        };
        self.draw_scene(frame, &camera, &[(0, &view.surface)], &view.annotations);
    }

    /// Lateral and medial cells; the left hemisphere is model 0, the right
    /// model 1.
    fn draw_surface_montage(&mut self, frame: &mut Frame<'_>, view: &SurfaceMontageView) {
        for cell in view.cells(frame.context.viewport) {
            if !frame.context.wants(cell.viewport) {
                continue;
            }
            let Some(surface) = view.surface(cell.hemisphere) else {
                continue;
            };
            let model = match cell.hemisphere {
                Hemisphere::Left => 0,
                Hemisphere::Right => 1,
            };
            let Some(camera) = self.model_camera(
                frame.context.tab,
                cell.slot,
                cell.viewport,
                cell.mirrored(),
                surface.center(),
            ) else {
                continue;
            };
            self.draw_scene(frame, &camera, &[(model, surface)], &view.annotations);
        }
    }

    fn draw_whole_brain(&mut self, frame: &mut Frame<'_>, view: &WholeBrainView) {
        let viewport = frame.context.viewport;
        if !frame.context.wants(viewport) {
            return;
        }
        let Some(camera) =
            self.model_camera(frame.context.tab, TransformSlot::Normal, viewport, false, view.center())
        else {
            return;
        };
        let surfaces: Vec<(usize, &SurfaceDrawable)> = view
            .surfaces
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_enabled())
            .collect();
        self.draw_scene(frame, &camera, &surfaces, &view.annotations);

        let Some(underlay) = view.underlay() else {
            return;
        };
        if frame.skips(&[IdentificationKind::Voxel]) {
            return;
        }
        frame.begin_pass();
        let slice_point = underlay.voxel_center(underlay.clamp_indices(view.selected_indices));
        let batches: Vec<TriangleBatch> = view
            .unique_slice_axes()
            .into_iter()
            .flat_map(|axis| Self::voxel_slice_batches(frame, &view.layers, axis, slice_point))
            .collect();
        self.draw_voxels(frame, &camera, &view.layers, &batches, "whole brain slices");
    }

    /// Surfaces, borders, foci, node symbols and fibers in one 3D view.
    fn draw_scene(
        &self,
        frame: &mut Frame<'_>,
        view: &View,
        surfaces: &[(usize, &SurfaceDrawable)],
        annotations: &Annotations,
    ) {
        for (model, surface) in surfaces {
            self.draw_surface(frame, view, *model, surface);
        }
        self.draw_borders(frame, view, annotations);
        self.draw_foci(frame, view, annotations, None);
        for (model, surface) in surfaces {
            self.draw_node_symbols(frame, view, *model, surface);
        }
        self.draw_fibers(frame, view, annotations);
    }

    fn draw_surface(&self, frame: &mut Frame<'_>, view: &View, model: usize, surface: &SurfaceDrawable) {
        use IdentificationKind::{SurfaceNode, SurfaceTriangle};
        if !surface.is_enabled() || frame.skips(&[SurfaceNode, SurfaceTriangle]) {
            return;
        }
        frame.begin_pass();
        let batch = if frame.is_picking() {
            let colors = (0..surface.triangle_count())
                .map(|index| frame.key(SurfaceTriangle, IndexTuple::Single { model, index }, [0; 4]))
                .collect();
            TriangleBatch::new(
                surface.positions().to_vec(),
                surface.triangles().to_vec(),
                Colors::PerPrimitive(colors),
            )
        } else {
            TriangleBatch::new(
                surface.positions().to_vec(),
                surface.triangles().to_vec(),
                Colors::PerVertex(surface.node_colors().to_vec()),
            )
            .with_normals(surface.normals().to_vec())
        };

        let state = view.state(frame.shading());
        let Some(hit) = frame.draw("surface", &[(state, Batch::Triangles(&batch))]) else {
            return;
        };
        let IndexTuple::Single { index: triangle, .. } = hit.identified.indices else {
            return;
        };
        let (Some(nodes), Some(corners)) =
            (surface.triangle(triangle), surface.triangle_positions(triangle))
        else {
            return;
        };

        let mouse = frame.context.mouse;
        frame.consider(hit, view.unproject(mouse, hit.depth));

        // The node of the hit triangle nearest the mouse on screen.
        let distance = |i: usize| view.window(corners[i]).distance_squared(mouse.as_vec2());
        let nearest = (0..3)
            .min_by(|a, b| distance(*a).total_cmp(&distance(*b)))
            .unwrap_or(0);
        let node_hit = Hit {
            identified: Identified {
                kind: SurfaceNode,
                indices: IndexTuple::Single {
                    model,
                    index: nodes[nearest] as usize,
                },
            },
            depth: hit.depth,
        };
        frame.consider(node_hit, Some(corners[nearest]));

        if frame.context.mode == Mode::Projection {
            // Coverage was sampled at the pixel center, so place that point.
            let placement =
                project_triangle(&view.mvp(), view.viewport, corners, mouse.pixel_center());
            frame.offer_projection(SurfaceProjection {
                model,
                triangle,
                nodes,
                placement,
                model_xyz: placement.interpolate(corners),
                screen_depth: hit.depth,
            });
        }
    }

    /// Index of the endpoint of segment `start -> end` nearest the mouse.
    fn nearest_endpoint(
        view: &View,
        mouse: MousePosition,
        points: &[Vec3],
        start: usize,
        end: Option<usize>,
    ) -> usize {
        let Some(end) = end else {
            return start;
        };
        match (points.get(start), points.get(end)) {
            (Some(a), Some(b)) => {
                let m = mouse.as_vec2();
                if view.window(*b).distance_squared(m) < view.window(*a).distance_squared(m) {
                    end
                } else {
                    start
                }
            }
            _ => start,
        }
    }

    fn draw_borders(&self, frame: &mut Frame<'_>, view: &View, annotations: &Annotations) {
        if annotations.borders.is_empty() || frame.skips(&[IdentificationKind::BorderPoint]) {
            return;
        }
        frame.begin_pass();
        let point_size = self.options.point_size * view.pixel_size;
        let mut positions = Vec::new();
        let mut segments = Vec::new();
        let mut segment_colors = Vec::new();
        let mut points = TriangleBatch::new(Vec::new(), Vec::new(), Colors::PerPrimitive(Vec::new()));

        for (file, border_file) in annotations.borders.iter().enumerate() {
            if !border_file.enabled {
                continue;
            }
            for (item, border) in border_file.borders.iter().enumerate() {
                let base = positions.len() as u32;
                positions.extend_from_slice(&border.points);
                for [a, b] in border.segments() {
                    let indices = IndexTuple::Item {
                        file,
                        item,
                        sub: a as usize,
                    };
                    segments.push([base + a, base + b]);
                    segment_colors.push(frame.key(IdentificationKind::BorderPoint, indices, border.color));
                }
                let Some(inverse_rotation) = self.inverse_rotation else {
                    continue;
                };
                for (sub, point) in border.points.iter().enumerate() {
                    let indices = IndexTuple::Item { file, item, sub };
                    let color = frame.key(IdentificationKind::BorderPoint, indices, border.color);
                    points.push_quad(billboard_corners(*point, point_size, &inverse_rotation), color);
                }
            }
        }

        let lines = LineBatch::new(
            positions,
            segments,
            Colors::PerPrimitive(segment_colors),
            self.options.line_width,
        );
        let state = view
            .state(frame.shading())
            .with_depth_bias(OVERLAY_DEPTH_BIAS);
        let Some(mut hit) = frame.draw(
            "borders",
            &[(state, Batch::Lines(&lines)), (state, Batch::Triangles(&points))],
        ) else {
            return;
        };
        let IndexTuple::Item { file, item, sub } = hit.identified.indices else {
            return;
        };
        let Some(border) = annotations.borders.get(file).and_then(|f| f.borders.get(item)) else {
            return;
        };
        let end = border.segment_end(sub);
        let sub = Self::nearest_endpoint(view, frame.context.mouse, &border.points, sub, end);
        hit.identified.indices = IndexTuple::Item { file, item, sub };
        frame.consider(hit, annotations.border_point(file, item, sub));
    }

    /// Foci as billboards. On a slice only foci within `slab` of the plane
    /// are drawn, moved onto the plane.
    fn draw_foci(
        &self,
        frame: &mut Frame<'_>,
        view: &View,
        annotations: &Annotations,
        slab: Option<(&SlicePlane, f32)>,
    ) {
        if annotations.foci.is_empty() || frame.skips(&[IdentificationKind::Focus]) {
            return;
        }
        let Some(inverse_rotation) = self.inverse_rotation else {
            log::debug!("no inverse rotation, foci not drawn");
            return;
        };
        frame.begin_pass();
        let mut batch = TriangleBatch::new(Vec::new(), Vec::new(), Colors::PerPrimitive(Vec::new()));
        for (file, foci_file) in annotations.foci.iter().enumerate() {
            if !foci_file.enabled {
                continue;
            }
            for (item, focus) in foci_file.foci.iter().enumerate() {
                let position = match slab {
                    Some((plane, half_thickness)) => {
                        if plane.signed_distance(focus.position).abs() > half_thickness {
                            continue;
                        }
                        plane.project(focus.position)
                    }
                    None => focus.position,
                };
                let color = frame.key(
                    IdentificationKind::Focus,
                    IndexTuple::Item { file, item, sub: 0 },
                    focus.color,
                );
                batch.push_quad(
                    billboard_corners(position, self.options.symbol_size, &inverse_rotation),
                    color,
                );
            }
        }
        let state = view
            .state(frame.shading())
            .with_depth_bias(OVERLAY_DEPTH_BIAS);
        let Some(hit) = frame.draw("foci", &[(state, Batch::Triangles(&batch))]) else {
            return;
        };
        if let IndexTuple::Item { file, item, .. } = hit.identified.indices {
            frame.consider(hit, annotations.focus(file, item).map(|f| f.position));
        }
    }

    fn draw_node_symbols(
        &self,
        frame: &mut Frame<'_>,
        view: &View,
        model: usize,
        surface: &SurfaceDrawable,
    ) {
        if surface.node_symbols().is_empty() || frame.skips(&[IdentificationKind::NodeSymbol]) {
            return;
        }
        let Some(inverse_rotation) = self.inverse_rotation else {
            log::debug!("no inverse rotation, node symbols not drawn");
            return;
        };
        frame.begin_pass();
        let mut batch = TriangleBatch::new(Vec::new(), Vec::new(), Colors::PerPrimitive(Vec::new()));
        for symbol in surface.node_symbols() {
            let Some(position) = surface.node_position(symbol.node) else {
                continue;
            };
            let color = frame.key(
                IdentificationKind::NodeSymbol,
                IndexTuple::Single {
                    model,
                    index: symbol.node,
                },
                symbol.color,
            );
            batch.push_quad(
                billboard_corners(position, self.options.symbol_size, &inverse_rotation),
                color,
            );
        }
        let state = view
            .state(frame.shading())
            .with_depth_bias(OVERLAY_DEPTH_BIAS);
        let Some(hit) = frame.draw("node symbols", &[(state, Batch::Triangles(&batch))]) else {
            return;
        };
        if let IndexTuple::Single { index, .. } = hit.identified.indices {
            frame.consider(hit, surface.node_position(index));
        }
    }

    fn draw_fibers(&self, frame: &mut Frame<'_>, view: &View, annotations: &Annotations) {
        if annotations.fibers.is_empty() || frame.skips(&[IdentificationKind::FiberPoint]) {
            return;
        }
        frame.begin_pass();
        let mut positions = Vec::new();
        let mut segments = Vec::new();
        let mut colors = Vec::new();
        for (file, fiber_file) in annotations.fibers.iter().enumerate() {
            if !fiber_file.enabled {
                continue;
            }
            for (item, fiber) in fiber_file.fibers.iter().enumerate() {
                let base = positions.len() as u32;
                positions.extend_from_slice(&fiber.points);
                for sub in 1..fiber.points.len() {
                    let indices = IndexTuple::Item {
                        file,
                        item,
                        sub: sub - 1,
                    };
                    segments.push([base + sub as u32 - 1, base + sub as u32]);
                    colors.push(frame.key(IdentificationKind::FiberPoint, indices, fiber.color));
                }
            }
        }
        let lines = LineBatch::new(positions, segments, Colors::PerPrimitive(colors), self.options.line_width);
        let state = view
            .state(frame.shading())
            .with_depth_bias(OVERLAY_DEPTH_BIAS);
        let Some(mut hit) = frame.draw("fibers", &[(state, Batch::Lines(&lines))]) else {
            return;
        };
        let IndexTuple::Item { file, item, sub } = hit.identified.indices else {
            return;
        };
        let Some(fiber) = annotations.fibers.get(file).and_then(|f| f.fibers.get(item)) else {
            return;
        };
        let end = (sub + 1 < fiber.points.len()).then_some(sub + 1);
        let sub = Self::nearest_endpoint(view, frame.context.mouse, &fiber.points, sub, end);
        hit.identified.indices = IndexTuple::Item { file, item, sub };
        frame.consider(hit, annotations.fiber_point(file, item, sub));
    }

    /// Voxel quads of the slice through `slice_point` perpendicular to
    /// `axis`, one batch per enabled layer.
    fn voxel_slice_batches(
        frame: &mut Frame<'_>,
        layers: &[VolumeDrawable],
        axis: SliceAxis,
        slice_point: Vec3,
    ) -> Vec<TriangleBatch> {
        let dim = axis.dimension();
        let (u, v) = in_plane_dimensions(axis);
        let mut batches = Vec::new();
        for (layer_index, layer) in layers.iter().enumerate() {
            if !layer.is_enabled() {
                continue;
            }
            let dims = layer.dimensions();
            let slice = layer.continuous_index(slice_point)[dim].round() as i64;
            if slice < 0 || slice >= dims[dim] as i64 {
                continue;
            }
            let mut batch =
                TriangleBatch::new(Vec::new(), Vec::new(), Colors::PerPrimitive(Vec::new()));
            for b in 0..dims[v] as i64 {
                for a in 0..dims[u] as i64 {
                    let mut ijk = [0; 3];
                    ijk[dim] = slice;
                    ijk[u] = a;
                    ijk[v] = b;
                    let Some(color) = layer.rgba(ijk) else {
                        continue;
                    };
                    let key = frame.key(
                        IdentificationKind::Voxel,
                        IndexTuple::Voxel {
                            layer: layer_index,
                            ijk,
                        },
                        color,
                    );
                    batch.push_quad(layer.voxel_face(ijk, axis), key);
                }
            }
            batches.push(batch);
        }
        batches
    }

    /// Draws voxel batches bottom layer first; later layers win ties.
    fn draw_voxels(
        &self,
        frame: &mut Frame<'_>,
        view: &View,
        layers: &[VolumeDrawable],
        batches: &[TriangleBatch],
        what: &str,
    ) {
        let shading = frame.shading();
        let calls: Vec<(DrawState, Batch<'_>)> = batches
            .iter()
            .enumerate()
            .map(|(order, batch)| {
                let state = view
                    .state(shading)
                    .with_depth_bias(order as f32 * LAYER_DEPTH_BIAS);
                (state, Batch::Triangles(batch))
            })
            .collect();
        let Some(hit) = frame.draw(what, &calls) else {
            return;
        };
        if let IndexTuple::Voxel { layer, ijk } = hit.identified.indices {
            frame.consider(hit, layers.get(layer).map(|l| l.voxel_center(ijk)));
        }
    }

    fn draw_volume_view(&mut self, frame: &mut Frame<'_>, view: &VolumeView) {
        let Some(underlay) = view.underlay() else {
            log::debug!("volume view has no enabled layer");
            return;
        };
        let cells = layout_cells(
            frame.context.viewport,
            view.layout,
            view.selected_indices,
            underlay.dimensions(),
            self.options.montage_gap,
        );
        for cell in cells {
            if !frame.context.wants(cell.viewport) {
                continue;
            }
            match cell.content {
                CellContent::Slice { axis, slice_index } => {
                    self.draw_volume_slice(frame, view, cell.viewport, axis, slice_index);
                }
                CellContent::OrientationAxes => {
                    if !frame.is_picking() && self.options.show_orientation_axes {
                        self.draw_orientation_axes(frame, cell.viewport);
                    }
                }
            }
        }
    }

    fn draw_volume_slice(
        &mut self,
        frame: &mut Frame<'_>,
        view: &VolumeView,
        viewport: Viewport,
        axis: SliceAxis,
        slice_index: Option<i64>,
    ) {
        let Some(underlay) = view.underlay() else {
            return;
        };
        let Some(state) = self.viewing_state(frame.context.tab, TransformSlot::Normal) else {
            return;
        };
        let Some(frustum) = self.frustum(viewport, self.options.half_window_height) else {
            return;
        };

        let indices = view.indices_for(axis, slice_index);
        let slice_point = underlay.voxel_center(indices);
        let oblique_rotation = state.oblique_rotation();
        let plane = build_plane(axis, view.projection, Some(&oblique_rotation), slice_point);
        let camera = compose_slice_camera(
            &plane,
            axis,
            view.projection,
            &state,
            self.options.slice_look_at_offset,
        );
        self.inverse_rotation = camera.inverse_rotation;
        let slice_view = View::new(viewport, &frustum, camera, state.scale());

        let half_thickness = underlay.voxel_size().max_element() * 0.5;
        self.draw_foci(frame, &slice_view, &view.annotations, Some((&plane, half_thickness)));

        if !frame.is_picking() {
            self.draw_slice_outlines(frame, &slice_view, view, &plane);
        }

        if !frame.skips(&[IdentificationKind::Voxel]) {
            frame.begin_pass();
            let batches = match view.projection {
                SliceProjection::Orthogonal => {
                    Self::voxel_slice_batches(frame, &view.layers, axis, slice_point)
                }
                SliceProjection::Oblique => {
                    self.oblique_slice_batches(frame, &slice_view, &frustum, &state, &plane, &view.layers)
                }
            };
            self.draw_voxels(frame, &slice_view, &view.layers, &batches, "volume slice");
        }

        if !frame.is_picking() && self.options.show_orientation_labels {
            Self::draw_orientation_labels(frame, viewport, axis);
            if slice_index.is_some() {
                Self::draw_slice_coordinate(frame, viewport, axis, slice_point);
            }
        }
    }

    /// Resamples the layers on a grid over the visible part of the plane.
    fn oblique_slice_batches(
        &self,
        frame: &mut Frame<'_>,
        view: &View,
        frustum: &OrthographicFrustum,
        state: &ViewingState,
        plane: &SlicePlane,
        layers: &[VolumeDrawable],
    ) -> Vec<TriangleBatch> {
        let Some(inverse_model_view) = view.camera.inverse_model_view() else {
            log::warn!("slice camera is singular, oblique slice not drawn");
            return Vec::new();
        };
        let translation = state.translation();
        let quad = build_screen_quad(
            frustum,
            translation,
            &(inverse_model_view * Mat4::from_translation(translation)),
        );
        // The quad sits at the eye plane; move it onto the slice.
        let quad = ScreenQuadCorners {
            bottom_left: plane.project(quad.bottom_left),
            bottom_right: plane.project(quad.bottom_right),
            top_right: plane.project(quad.top_right),
            top_left: plane.project(quad.top_left),
        };

        let n = self.options.oblique_samples_per_axis.max(1);
        let step = 1.0 / n as f32;
        let mut batches = Vec::new();
        for (layer_index, layer) in layers.iter().enumerate() {
            if !layer.is_enabled() {
                continue;
            }
            let mut batch =
                TriangleBatch::new(Vec::new(), Vec::new(), Colors::PerPrimitive(Vec::new()));
            for j in 0..n {
                let (t0, t1) = (j as f32 * step, (j + 1) as f32 * step);
                for i in 0..n {
                    let (s0, s1) = (i as f32 * step, (i + 1) as f32 * step);
                    let center = quad.point_at((s0 + s1) * 0.5, (t0 + t1) * 0.5);
                    let Some(ijk) = layer.voxel_at(center) else {
                        continue;
                    };
                    let Some(color) = layer.rgba(ijk) else {
                        continue;
                    };
                    let key = frame.key(
                        IdentificationKind::Voxel,
                        IndexTuple::Voxel {
                            layer: layer_index,
                            ijk,
                        },
                        color,
                    );
                    batch.push_quad(
                        [
                            quad.point_at(s0, t0),
                            quad.point_at(s1, t0),
                            quad.point_at(s1, t1),
                            quad.point_at(s0, t1),
                        ],
                        key,
                    );
                }
            }
            batches.push(batch);
        }
        batches
    }

    fn draw_slice_outlines(&self, frame: &mut Frame<'_>, view: &View, volume: &VolumeView, plane: &SlicePlane) {
        let mut positions = Vec::new();
        for surface in volume.outline_surfaces.iter().filter(|s| s.is_enabled()) {
            for (a, b) in surface_outline(surface.positions(), surface.triangles(), plane) {
                positions.push(a);
                positions.push(b);
            }
        }
        let segments = (0..positions.len() as u32 / 2)
            .map(|i| [2 * i, 2 * i + 1])
            .collect();
        let lines = LineBatch::new(
            positions,
            segments,
            Colors::Uniform(volume.outline_color),
            self.options.line_width,
        );
        let state = view
            .state(ShadingMode::Shaded)
            .with_depth_bias(OVERLAY_DEPTH_BIAS);
        frame.draw("slice outlines", &[(state, Batch::Lines(&lines))]);
    }

    fn draw_orientation_labels(frame: &mut Frame<'_>, viewport: Viewport, axis: SliceAxis) {
        let [left, right, bottom, top] = axis.orientation_labels();
        let center = viewport.center();
        let x0 = viewport.x as f32 + LABEL_MARGIN;
        let x1 = viewport.right() as f32 - LABEL_MARGIN;
        let y0 = viewport.y as f32 + LABEL_MARGIN;
        let y1 = viewport.top() as f32 - LABEL_MARGIN;
        let style = TextStyle::default();
        frame.label(viewport, Vec2::new(x0, center.y), left, &TextStyle { horizontal: HorizontalAlignment::Left, ..style });
        frame.label(viewport, Vec2::new(x1, center.y), right, &TextStyle { horizontal: HorizontalAlignment::Right, ..style });
        frame.label(viewport, Vec2::new(center.x, y0), bottom, &TextStyle { vertical: VerticalAlignment::Bottom, ..style });
        frame.label(viewport, Vec2::new(center.x, y1), top, &TextStyle { vertical: VerticalAlignment::Top, ..style });
    }

    /// Montage cells show the model coordinate of their slice.
    fn draw_slice_coordinate(frame: &mut Frame<'_>, viewport: Viewport, axis: SliceAxis, slice_point: Vec3) {
        let (letter, value) = match axis {
            SliceAxis::Parasagittal => ("X", slice_point.x),
            SliceAxis::Coronal => ("Y", slice_point.y),
            SliceAxis::Axial => ("Z", slice_point.z),
        };
        let style = TextStyle {
            horizontal: HorizontalAlignment::Left,
            vertical: VerticalAlignment::Bottom,
            ..TextStyle::default()
        };
        let position = Vec2::new(
            viewport.x as f32 + LABEL_MARGIN * 0.5,
            viewport.y as f32 + LABEL_MARGIN * 0.5,
        );
        frame.label(viewport, position, &format!("{letter}={value:.1}"), &style);
    }

    /// Three unit axes (red X, green Y, blue Z) tilted for a 3/4 view.
    fn draw_orientation_axes(&self, frame: &mut Frame<'_>, viewport: Viewport) {
        let Some(frustum) = self.frustum(viewport, AXES_HALF_HEIGHT) else {
            return;
        };
        let model_view = Mat4::from_rotation_x(-60f32.to_radians()) * Mat4::from_rotation_z(-30f32.to_radians());
        let projection = frustum.to_projection_matrix();
        let state = DrawState::new(projection, model_view, viewport, ShadingMode::Shaded);
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::ZERO, Vec3::Y, Vec3::ZERO, Vec3::Z];
        let red = [255, 0, 0, 255];
        let green = [0, 255, 0, 255];
        let blue = [0, 0, 255, 255];
        let lines = LineBatch::new(
            positions,
            vec![[0, 1], [2, 3], [4, 5]],
            Colors::PerPrimitive(vec![red, green, blue]),
            self.options.line_width.max(2.0),
        );
        frame.draw("orientation axes", &[(state, Batch::Lines(&lines))]);

        let mvp = projection * model_view;
        for (tip, label, color) in [(Vec3::X, "R", red), (Vec3::Y, "A", green), (Vec3::Z, "S", blue)] {
            let style = TextStyle {
                color,
                ..TextStyle::default()
            };
            frame
                .text
                .draw_text_at_model_coords(&mvp, viewport, tip * 1.15, label, &style);
        }
    }
}
