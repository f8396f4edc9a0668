//! Voxel volume drawable.

use std::fmt;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use neuroview_core::{try_inverse, NeuroviewError, Result, SliceAxis};

use crate::palette::{Grayscale, Palette};

/// A scalar volume on a regular voxel grid.
///
/// Voxel `(i, j, k)` is stored at `i + j * ni + k * ni * nj`. Its center in
/// model space is `index_to_space * (i, j, k, 1)`.
#[derive(Clone)]
pub struct VolumeDrawable {
    name: String,
    dimensions: [usize; 3],
    index_to_space: Mat4,
    space_to_index: Mat4,
    scalars: Vec<f32>,
    palette: Arc<dyn Palette>,
    enabled: bool,
}

impl fmt::Debug for VolumeDrawable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VolumeDrawable")
            .field("name", &self.name)
            .field("dimensions", &self.dimensions)
            .field("index_to_space", &self.index_to_space)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl VolumeDrawable {
    /// Creates a volume with a grayscale palette spanning the data range.
    pub fn new(
        name: impl Into<String>,
        dimensions: [usize; 3],
        index_to_space: Mat4,
        scalars: Vec<f32>,
    ) -> Result<Self> {
        let expected = dimensions.iter().product::<usize>();
        if scalars.len() != expected {
            return Err(NeuroviewError::SizeMismatch {
                expected,
                actual: scalars.len(),
            });
        }
        let space_to_index = try_inverse(&index_to_space, "voxel index to space")?;

        let (min, max) = scalars
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        let palette = if min <= max {
            Grayscale::new(min, max)
        } else {
            Grayscale::default()
        };

        Ok(Self {
            name: name.into(),
            dimensions,
            index_to_space,
            space_to_index,
            scalars,
            palette: Arc::new(palette),
            enabled: true,
        })
    }

    #[must_use]
    pub fn with_palette(mut self, palette: impl Palette + 'static) -> Self {
        self.palette = Arc::new(palette);
        self
    }

    pub fn set_palette(&mut self, palette: Arc<dyn Palette>) {
        self.palette = palette;
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[must_use]
    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    #[must_use]
    pub fn index_to_space(&self) -> Mat4 {
        self.index_to_space
    }

    #[must_use]
    pub fn space_to_index(&self) -> Mat4 {
        self.space_to_index
    }

    /// Whether `ijk` lies inside the grid.
    #[must_use]
    pub fn contains(&self, ijk: [i64; 3]) -> bool {
        ijk.iter()
            .zip(self.dimensions)
            .all(|(&i, n)| i >= 0 && usize::try_from(i).is_ok_and(|i| i < n))
    }

    fn flat_index(&self, ijk: [i64; 3]) -> Option<usize> {
        if !self.contains(ijk) {
            return None;
        }
        let [ni, nj, _] = self.dimensions;
        let [i, j, k] = ijk.map(|v| v as usize);
        Some(i + j * ni + k * ni * nj)
    }

    #[must_use]
    pub fn value(&self, ijk: [i64; 3]) -> Option<f32> {
        self.scalars.get(self.flat_index(ijk)?).copied()
    }

    /// Palette color of a voxel; `None` outside the grid or when the
    /// palette hides the value.
    #[must_use]
    pub fn rgba(&self, ijk: [i64; 3]) -> Option<[u8; 4]> {
        self.palette.rgba(self.value(ijk)?)
    }

    /// Model-space center of a voxel (need not be inside the grid).
    #[must_use]
    pub fn voxel_center(&self, ijk: [i64; 3]) -> Vec3 {
        let [i, j, k] = ijk.map(|v| v as f32);
        self.index_to_space.transform_point3(Vec3::new(i, j, k))
    }

    /// Fractional voxel index of a model-space point.
    #[must_use]
    pub fn continuous_index(&self, point: Vec3) -> Vec3 {
        self.space_to_index.transform_point3(point)
    }

    /// Voxel containing a model-space point, if inside the grid.
    #[must_use]
    pub fn voxel_at(&self, point: Vec3) -> Option<[i64; 3]> {
        let index = self.continuous_index(point).round();
        let ijk = [index.x as i64, index.y as i64, index.z as i64];
        self.contains(ijk).then_some(ijk)
    }

    /// Edge lengths of one voxel in model units.
    #[must_use]
    pub fn voxel_size(&self) -> Vec3 {
        Vec3::new(
            self.index_to_space.x_axis.truncate().length(),
            self.index_to_space.y_axis.truncate().length(),
            self.index_to_space.z_axis.truncate().length(),
        )
    }

    /// Center of the grid in model space.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        let [ni, nj, nk] = self.dimensions.map(|n| n.saturating_sub(1) as f32 * 0.5);
        self.index_to_space.transform_point3(Vec3::new(ni, nj, nk))
    }

    /// Clamps an index triple into the grid.
    #[must_use]
    pub fn clamp_indices(&self, ijk: [i64; 3]) -> [i64; 3] {
        std::array::from_fn(|d| {
            let max = self.dimensions[d].saturating_sub(1) as i64;
            ijk[d].clamp(0, max.max(0))
        })
    }

    /// Cross-section of a voxel perpendicular to `axis`, as a quad through
    /// the voxel center.
    #[must_use]
    pub fn voxel_face(&self, ijk: [i64; 3], axis: SliceAxis) -> [Vec3; 4] {
        let (u, v) = in_plane_dimensions(axis);
        let columns = [
            self.index_to_space.x_axis.truncate(),
            self.index_to_space.y_axis.truncate(),
            self.index_to_space.z_axis.truncate(),
        ];
        let du = columns[u] * 0.5;
        let dv = columns[v] * 0.5;
        let c = self.voxel_center(ijk);
        [c - du - dv, c + du - dv, c + du + dv, c - du + dv]
    }

    /// Corners of the slab through slice `ijk` perpendicular to `axis`,
    /// spanning the whole grid in the other two dimensions.
    #[must_use]
    pub fn slice_extent(&self, ijk: [i64; 3], axis: SliceAxis) -> [Vec3; 4] {
        let (u, v) = in_plane_dimensions(axis);
        let corner = |a: f32, b: f32| {
            let mut index = ijk.map(|x| x as f32);
            index[u] = a;
            index[v] = b;
            self.index_to_space
                .transform_point3(Vec3::new(index[0], index[1], index[2]))
        };
        let max_u = self.dimensions[u] as f32 - 0.5;
        let max_v = self.dimensions[v] as f32 - 0.5;
        [
            corner(-0.5, -0.5),
            corner(max_u, -0.5),
            corner(max_u, max_v),
            corner(-0.5, max_v),
        ]
    }
}

/// Index dimensions spanning the plane of `axis`.
#[must_use]
pub fn in_plane_dimensions(axis: SliceAxis) -> (usize, usize) {
    match axis.dimension() {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    }
}
