//! Headless rendering.
//!
//! Renders viewport contents into an offscreen target and returns the image,
//! without a window. Useful for integration tests, batch processing and
//! automated screenshots.

use std::path::Path;

use image::RgbaImage;
use neuroview_render::{GpuTarget, RasterTarget, SoftwareTarget};
use neuroview_structures::NullTextRenderer;

use crate::context::ViewportContent;
use crate::error::Result;
use crate::renderer::SceneRenderer;

/// Which raster target to render with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// The CPU rasterizer; always available.
    #[default]
    Software,
    /// An offscreen wgpu target; fails without an adapter.
    Gpu,
}

/// Creates an offscreen target of the requested backend.
pub fn create_target(backend: Backend, width: u32, height: u32) -> Result<Box<dyn RasterTarget>> {
    let target: Box<dyn RasterTarget> = match backend {
        Backend::Software => Box::new(SoftwareTarget::new(width, height)?),
        Backend::Gpu => Box::new(GpuTarget::new_headless(width, height)?),
    };
    log::debug!("created {width}x{height} target on {}", target.backend_info());
    Ok(target)
}

/// Draws `contents` into a fresh target and returns its pixels, top row
/// first.
///
/// # Example
/// ```no_run
/// use neuroview::*;
///
/// let surface = SurfaceDrawable::new(
///     "triangle",
///     vec![Vec3::ZERO, Vec3::X * 50.0, Vec3::Y * 50.0],
///     vec![[0, 1, 2]],
/// )
/// .unwrap();
/// let drawable = Drawable::Surface(SurfaceView::new(surface));
/// let mut renderer = SceneRenderer::new(Options::default());
/// renderer.transforms_mut().add_tab(0);
/// let contents = [ViewportContent::new(0, Viewport::new(0, 0, 320, 240), &drawable)];
/// let image = render_to_image(&mut renderer, Backend::Software, 320, 240, &contents).unwrap();
/// assert_eq!(image.dimensions(), (320, 240));
/// ```
pub fn render_to_image(
    renderer: &mut SceneRenderer,
    backend: Backend,
    width: u32,
    height: u32,
    contents: &[ViewportContent<'_>],
) -> Result<RgbaImage> {
    let mut target = create_target(backend, width, height)?;
    renderer.draw_models(target.as_mut(), &mut NullTextRenderer, contents);
    Ok(target.read_image()?)
}

/// Draws `contents` and writes the result as a PNG file.
pub fn render_to_file(
    path: impl AsRef<Path>,
    renderer: &mut SceneRenderer,
    backend: Backend,
    width: u32,
    height: u32,
    contents: &[ViewportContent<'_>],
) -> Result<()> {
    let mut target = create_target(backend, width, height)?;
    renderer.draw_models(target.as_mut(), &mut NullTextRenderer, contents);
    target.save_png(path.as_ref())?;
    log::info!("saved {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_size_target_is_rejected() {
        assert!(create_target(Backend::Software, 0, 10).is_err());
    }

    #[test]
    fn test_empty_scene_is_background() {
        let mut renderer = SceneRenderer::new(neuroview_core::Options {
            background_color: [10, 20, 30],
            ..neuroview_core::Options::default()
        });
        let image = render_to_image(&mut renderer, Backend::Software, 8, 6, &[]).unwrap();
        assert_eq!(image.dimensions(), (8, 6));
        assert!(image.pixels().all(|p| p.0 == [10, 20, 30, 255]));
    }
}
