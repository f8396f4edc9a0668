//! Camera composition seen through the renderer: cached inverse rotation,
//! billboards, yoking and slice screen quads.

use neuroview::*;
use neuroview_core::transform::invert_rotation;
use neuroview_core::{build_plane, build_screen_quad, compose_slice_camera, project_to_window};
use proptest::prelude::*;

fn triangle() -> Drawable {
    let surface = SurfaceDrawable::new(
        "triangle",
        vec![Vec3::new(-40.0, -30.0, 0.0), Vec3::new(40.0, -30.0, 0.0), Vec3::new(0.0, 40.0, 5.0)],
        vec![[0, 1, 2]],
    )
    .unwrap();
    Drawable::Surface(SurfaceView::new(surface))
}

/// A 10^3 grid of 10 unit voxels centered on the origin.
fn grid() -> VolumeDrawable {
    let index_to_space =
        Mat4::from_scale_rotation_translation(Vec3::splat(10.0), glam::Quat::IDENTITY, Vec3::splat(-45.0));
    VolumeDrawable::new("grid", [10, 10, 10], index_to_space, vec![1.0; 1000]).unwrap()
}

fn rotation(yaw: f32, pitch: f32, roll: f32) -> Mat4 {
    Mat4::from_quat(glam::Quat::from_euler(glam::EulerRot::YXZ, yaw, pitch, roll))
}

#[test]
fn test_draw_caches_inverse_rotation() {
    let mut renderer = SceneRenderer::new(Options::default());
    renderer.transforms_mut().add_tab(0);
    let r = rotation(0.4, -0.9, 0.2);
    renderer
        .transforms_mut()
        .set_rotation_matrix(0, TransformSlot::Normal, r)
        .unwrap();
    assert!(renderer.cached_inverse_rotation().is_none());

    let drawable = triangle();
    let mut target = SoftwareTarget::new(64, 64).unwrap();
    let content = ViewportContent::new(0, Viewport::new(0, 0, 64, 64), &drawable);
    renderer.draw_models(&mut target, &mut NullTextRenderer, &[content]);

    let stored = renderer
        .transforms()
        .rotation_matrix(0, TransformSlot::Normal)
        .unwrap();
    let expected = invert_rotation(&stored).unwrap();
    let cached = renderer.cached_inverse_rotation().unwrap();
    assert!(cached.abs_diff_eq(expected, 1e-5));
    assert!((cached * stored).abs_diff_eq(Mat4::IDENTITY, 1e-5));
}

#[test]
fn test_yoked_tab_renders_identically() {
    let mut renderer = SceneRenderer::new(Options::default());
    let transforms = renderer.transforms_mut();
    transforms.add_tab(0);
    transforms.add_tab(1);
    transforms
        .set_rotation_matrix(0, TransformSlot::Normal, rotation(1.1, 0.3, 0.0))
        .unwrap();
    transforms
        .set_translation(0, TransformSlot::MontageLeftOpposite, Vec3::new(3.0, -2.0, 0.0))
        .unwrap();
    transforms.set_scale(0, 1.5).unwrap();
    transforms.yoke(0, 1).unwrap();
    for slot in TransformSlot::ALL {
        assert_eq!(transforms.state(0, slot).unwrap(), transforms.state(1, slot).unwrap());
    }

    let drawable = triangle();
    let viewport = Viewport::new(0, 0, 96, 64);
    let mut images = Vec::new();
    for tab in [0, 1] {
        let content = ViewportContent::new(tab, viewport, &drawable);
        images.push(render_to_image(&mut renderer, Backend::Software, 96, 64, &[content]).unwrap());
    }
    assert_eq!(images[0], images[1]);
}

#[test]
fn test_slice_screen_quad_covers_viewport() {
    let viewport = Viewport::new(0, 0, 300, 200);
    let frustum = OrthographicFrustum::compute(viewport, 100.0, DepthRange::Composite, None).unwrap();
    let mut state = ViewingState::default();
    state.set_translation(Vec3::new(10.0, -5.0, 0.0));
    state.set_scale(2.0);

    let plane = build_plane(SliceAxis::Coronal, SliceProjection::Orthogonal, None, Vec3::new(1.0, 2.0, 3.0));
    let camera = compose_slice_camera(&plane, SliceAxis::Coronal, SliceProjection::Orthogonal, &state, 1.0);
    let inverse = camera.inverse_model_view().unwrap();
    let quad = build_screen_quad(
        &frustum,
        state.translation(),
        &(inverse * Mat4::from_translation(state.translation())),
    );

    let mvp = frustum.to_projection_matrix() * camera.model_view;
    let expected = [(0.0, 0.0), (300.0, 0.0), (300.0, 200.0), (0.0, 200.0)];
    for (corner, (x, y)) in quad.corners().iter().zip(expected) {
        let on_plane = plane.project(*corner);
        assert!(plane.signed_distance(on_plane).abs() < 1e-4);
        let window = project_to_window(&mvp, viewport, on_plane);
        assert!((window.x - x).abs() < 1e-2 && (window.y - y).abs() < 1e-2, "{window:?}");
    }
}

proptest! {
    #[test]
    fn billboards_are_screen_aligned_squares(
        yaw in -3.0f32..3.0,
        pitch in -1.5f32..1.5,
        roll in -3.0f32..3.0,
        center in (-40.0f32..40.0, -40.0f32..40.0, -40.0f32..40.0),
    ) {
        let viewport = Viewport::new(0, 0, 200, 200);
        let frustum = OrthographicFrustum::compute(viewport, 100.0, DepthRange::Composite, None).unwrap();
        let mut state = ViewingState::default();
        state.set_rotation(rotation(yaw, pitch, roll));
        let camera = state.compose_model_view(None);
        let inverse = camera.inverse_rotation.unwrap();

        let center = Vec3::new(center.0, center.1, center.2);
        let corners = billboard_corners(center, 4.0, &inverse);
        let mvp = frustum.to_projection_matrix() * camera.model_view;
        let window: Vec<Vec3> = corners.iter().map(|c| project_to_window(&mvp, viewport, *c)).collect();

        let right = window[1] - window[0];
        let up = window[3] - window[0];
        prop_assert!((right.x - 4.0).abs() < 1e-3 && right.y.abs() < 1e-3);
        prop_assert!((up.y - 4.0).abs() < 1e-3 && up.x.abs() < 1e-3);
        prop_assert!((window[2].z - window[0].z).abs() < 1e-5);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn oblique_slice_billboards_follow_slice_camera(
        yaw in -3.0f32..3.0,
        pitch in -1.5f32..1.5,
        roll in -3.0f32..3.0,
        offset in (-30.0f32..30.0, -30.0f32..30.0, -4.0f32..4.0),
    ) {
        let volume = grid();
        let plane_point = volume.voxel_center([5, 5, 5]);
        let mut view = VolumeView::new(vec![volume], SliceLayout::Single(SliceAxis::Axial));
        view.projection = SliceProjection::Oblique;

        let r = rotation(yaw, pitch, roll);
        let (u, v, n) = (
            r.transform_vector3(Vec3::X),
            r.transform_vector3(Vec3::Y),
            r.transform_vector3(Vec3::Z),
        );
        let focus = plane_point + u * offset.0 + v * offset.1 + n * offset.2;
        view.annotations.foci.push(FociFile::new(
            "foci",
            vec![Focus::new("f", focus, [255, 0, 0, 255])],
        ));
        let drawable = Drawable::Volume(view);

        let mut renderer = SceneRenderer::new(Options {
            oblique_samples_per_axis: 8,
            ..Options::default()
        });
        renderer.transforms_mut().add_tab(0);
        renderer.transforms_mut().set_oblique_rotation(0, Some(r)).unwrap();
        let state = *renderer.transforms().state(0, TransformSlot::Normal).unwrap();

        let viewport = Viewport::new(0, 0, 200, 200);
        let frustum = OrthographicFrustum::compute(viewport, 100.0, DepthRange::Composite, None).unwrap();
        let plane = build_plane(SliceAxis::Axial, SliceProjection::Oblique, Some(&state.oblique_rotation()), plane_point);
        let camera = compose_slice_camera(&plane, SliceAxis::Axial, SliceProjection::Oblique, &state, 1.0);
        let mvp = frustum.to_projection_matrix() * camera.model_view;

        let on_plane = plane.project(focus);
        let center = project_to_window(&mvp, viewport, on_plane);
        let mut target = SoftwareTarget::new(200, 200).unwrap();
        let content = ViewportContent::new(0, viewport, &drawable);
        let result = renderer.select_model(
            &mut target,
            &content,
            MousePosition::new(center.x.floor() + 0.5, center.y.floor() + 0.5),
            SelectionTargets::only(&[IdentificationKind::Focus]),
        );

        // The slice draw cached the slice camera's inverse rotation.
        let cached = renderer.cached_inverse_rotation().unwrap();
        prop_assert!((cached * camera.rotation).abs_diff_eq(Mat4::IDENTITY, 1e-4));

        // Billboards built from it face the screen.
        let corners = billboard_corners(on_plane, 4.0, &cached);
        let window: Vec<Vec3> = corners.iter().map(|c| project_to_window(&mvp, viewport, *c)).collect();
        let right = window[1] - window[0];
        let up = window[3] - window[0];
        prop_assert!((right.x - 4.0).abs() < 1e-3 && right.y.abs() < 1e-3);
        prop_assert!((up.y - 4.0).abs() < 1e-3 && up.x.abs() < 1e-3);

        // And the focus off the tilted plane is picked where it projects.
        let hit = result.get(IdentificationKind::Focus);
        prop_assert!(hit.is_some(), "focus at window {:?} not picked", center);
        prop_assert_eq!(hit.unwrap().indices, IndexTuple::Item { file: 0, item: 0, sub: 0 });
    }
}
