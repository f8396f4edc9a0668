//! Demo showing basic neuroview-rs usage.
//!
//! Builds a sphere "hemisphere" and a synthetic volume, writes a surface
//! view, a surface montage and an orthogonal slice triptych to PNG files,
//! and picks what lies under the center of each view.

use neuroview::*;

/// A UV sphere of radius `r` centered on `center`.
fn sphere(name: &str, center: Vec3, r: f32) -> Result<SurfaceDrawable> {
    let (rings, segments) = (24u32, 48u32);
    let mut positions = Vec::new();
    for i in 0..=rings {
        let theta = std::f32::consts::PI * i as f32 / rings as f32;
        for j in 0..segments {
            let phi = std::f32::consts::TAU * j as f32 / segments as f32;
            positions.push(
                center
                    + r * Vec3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos()),
            );
        }
    }
    let mut triangles = Vec::new();
    for i in 0..rings {
        for j in 0..segments {
            let a = i * segments + j;
            let b = i * segments + (j + 1) % segments;
            let c = a + segments;
            let d = b + segments;
            triangles.push([a, c, b]);
            triangles.push([b, c, d]);
        }
    }
    Ok(SurfaceDrawable::new(name, positions, triangles)?)
}

/// A 64^3 volume whose intensity falls off from its center.
fn blob() -> Result<VolumeDrawable> {
    let n = 64usize;
    let mut scalars = Vec::with_capacity(n * n * n);
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                let p = Vec3::new(i as f32, j as f32, k as f32) - Vec3::splat(n as f32 / 2.0);
                scalars.push((1.0 - p.length() / n as f32 * 2.0).max(0.0));
            }
        }
    }
    let index_to_space = Mat4::from_scale_rotation_translation(
        Vec3::splat(2.0),
        glam::Quat::IDENTITY,
        Vec3::splat(-64.0),
    );
    Ok(VolumeDrawable::new("blob", [n, n, n], index_to_space, scalars)?
        .with_palette(Grayscale::new(0.0, 1.0).with_threshold(0.05)))
}

fn main() -> Result<()> {
    init_logging();

    let left = sphere("left", Vec3::new(-35.0, 0.0, 0.0), 30.0)?.with_hemisphere(Hemisphere::Left);
    let mut right =
        sphere("right", Vec3::new(35.0, 0.0, 0.0), 30.0)?.with_hemisphere(Hemisphere::Right);
    right.set_uniform_color([200, 120, 90, 255]);
    right.add_node_symbol(0, [255, 255, 0, 255]);

    let mut annotations = Annotations::default();
    annotations.foci.push(FociFile::new(
        "foci",
        vec![Focus::new("peak", Vec3::new(-35.0, 0.0, 30.0), [255, 0, 0, 255])],
    ));
    annotations.borders.push(BorderFile::new(
        "borders",
        vec![Border::new(
            "ring",
            (0..16)
                .map(|i| {
                    let a = std::f32::consts::TAU * i as f32 / 16.0;
                    Vec3::new(-35.0 + 20.0 * a.cos(), 20.0 * a.sin(), 23.0)
                })
                .collect(),
            [0, 200, 255, 255],
        )
        .closed()],
    ));

    let surface_view = Drawable::Surface(SurfaceView {
        surface: left.clone(),
        annotations: annotations.clone(),
    });
    let montage = Drawable::SurfaceMontage(SurfaceMontageView {
        left: Some(left.clone()),
        right: Some(right.clone()),
        annotations,
    });
    let mut volume_view = VolumeView::new(
        vec![blob()?],
        SliceLayout::Orthogonal {
            layout: AllLayout::Grid,
            show_axes: true,
        },
    );
    volume_view.outline_surfaces = vec![left, right];
    let volume = Drawable::Volume(volume_view);

    let mut renderer = SceneRenderer::new(Options::default());
    renderer.transforms_mut().add_tab(0);

    let (width, height) = (640, 480);
    let viewport = Viewport::new(0, 0, width as i32, height as i32);
    let mouse = MousePosition::new(width as f32 / 2.0, height as f32 / 2.0);
    let mut picker = create_target(Backend::Software, width, height)?;

    for (file, drawable) in [
        ("surface.png", &surface_view),
        ("montage.png", &montage),
        ("volume.png", &volume),
    ] {
        let content = ViewportContent::new(0, viewport, drawable);
        render_to_file(file, &mut renderer, Backend::Software, width, height, &[content])?;

        let result =
            renderer.select_model(picker.as_mut(), &content, mouse, SelectionTargets::all());
        for hit in result.hits() {
            println!("{file}: {} {:?} at depth {:.4}", hit.kind.name(), hit.indices, hit.screen_depth);
        }
    }

    let content = ViewportContent::new(0, viewport, &surface_view);
    if let Some(projection) = renderer.project_to_model(picker.as_mut(), &content, mouse) {
        println!(
            "projected onto triangle {} at {:?}",
            projection.triangle, projection.model_xyz
        );
    }

    Ok(())
}
