//! Headless rendering integration tests.
//!
//! The software tests always run. The GPU test needs an adapter (real or
//! software fallback) and returns early when none is available.

use neuroview::*;

/// Helper: check that an image is not uniform.
fn has_nontrivial_content(image: &image::RgbaImage) -> bool {
    let first = image.get_pixel(0, 0);
    image.pixels().any(|p| p != first)
}

fn scene() -> (Drawable, Drawable) {
    let surface = SurfaceDrawable::new(
        "triangle",
        vec![Vec3::new(-60.0, -50.0, 0.0), Vec3::new(60.0, -50.0, 0.0), Vec3::new(0.0, 60.0, 0.0)],
        vec![[0, 1, 2]],
    )
    .unwrap();
    let index_to_space = Mat4::from_scale_rotation_translation(
        Vec3::splat(10.0),
        glam::Quat::IDENTITY,
        Vec3::splat(-35.0),
    );
    let scalars = (0..512).map(|i| (i % 8) as f32).collect();
    let volume = VolumeDrawable::new("volume", [8, 8, 8], index_to_space, scalars).unwrap();
    let mut volume_view = VolumeView::new(
        vec![volume],
        SliceLayout::Orthogonal {
            layout: AllLayout::Grid,
            show_axes: true,
        },
    );
    volume_view.outline_surfaces.push(surface.clone());
    (
        Drawable::Surface(SurfaceView::new(surface)),
        Drawable::Volume(volume_view),
    )
}

fn renderer() -> SceneRenderer {
    let mut renderer = SceneRenderer::new(Options {
        background_color: [20, 20, 40],
        ..Options::default()
    });
    renderer.transforms_mut().add_tab(0);
    renderer
}

#[test]
fn test_software_surface_render() {
    let (surface, _) = scene();
    let mut renderer = renderer();
    let content = ViewportContent::new(0, Viewport::new(0, 0, 200, 150), &surface);
    let image = render_to_image(&mut renderer, Backend::Software, 200, 150, &[content]).unwrap();

    assert_eq!(image.dimensions(), (200, 150));
    assert!(has_nontrivial_content(&image));
    // Corners show the background; the center shows the lit surface.
    assert_eq!(image.get_pixel(0, 0).0, [20, 20, 40, 255]);
    assert_ne!(image.get_pixel(100, 75).0, [20, 20, 40, 255]);
}

#[test]
fn test_software_volume_triptych_render() {
    let (_, volume) = scene();
    let mut renderer = renderer();
    let content = ViewportContent::new(0, Viewport::new(0, 0, 240, 240), &volume);
    let image = render_to_image(&mut renderer, Backend::Software, 240, 240, &[content]).unwrap();
    assert!(has_nontrivial_content(&image));
}

#[test]
fn test_side_by_side_viewports() {
    let (surface, volume) = scene();
    let mut renderer = renderer();
    let contents = [
        ViewportContent::new(0, Viewport::new(0, 0, 160, 160), &surface),
        ViewportContent::new(0, Viewport::new(160, 0, 160, 160), &volume),
    ];
    let image = render_to_image(&mut renderer, Backend::Software, 320, 160, &contents).unwrap();
    // Each viewport draws only inside itself: the left viewport center is
    // the surface, not a voxel of the volume.
    assert_ne!(image.get_pixel(80, 80).0, [20, 20, 40, 255]);
    assert!(has_nontrivial_content(&image));
}

#[test]
fn test_render_to_file_writes_png() {
    let (surface, _) = scene();
    let mut renderer = renderer();
    let content = ViewportContent::new(0, Viewport::new(0, 0, 64, 48), &surface);
    let path = std::env::temp_dir().join(format!("neuroview_headless_{}.png", std::process::id()));
    render_to_file(&path, &mut renderer, Backend::Software, 64, 48, &[content]).unwrap();
    let image = image::open(&path).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (64, 48));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn headless_gpu_matches_software_pick() {
    let mut target = match create_target(Backend::Gpu, 200, 150) {
        Ok(target) => target,
        Err(err) => {
            eprintln!("skipping GPU test: {err}");
            return;
        }
    };
    let (surface, _) = scene();
    let mut renderer = renderer();
    let content = ViewportContent::new(0, Viewport::new(0, 0, 200, 150), &surface);
    let mouse = MousePosition::new(100.5, 75.5);

    let gpu = renderer.select_model(target.as_mut(), &content, mouse, SelectionTargets::all());
    let mut software = SoftwareTarget::new(200, 150).unwrap();
    let cpu = renderer.select_model(&mut software, &content, mouse, SelectionTargets::all());

    let kinds = |r: &IdentificationResult| r.hits().iter().map(|h| (h.kind, h.indices)).collect::<Vec<_>>();
    assert_eq!(kinds(&gpu), kinds(&cpu));
    assert!(gpu.get(IdentificationKind::SurfaceTriangle).is_some());
}
