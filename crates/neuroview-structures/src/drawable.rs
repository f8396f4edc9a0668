//! The models a scene renderer can draw.

use glam::Vec3;
use neuroview_core::{
    Hemisphere, SliceAxis, SliceLayout, SliceProjection, TransformSlot, Viewport,
};

use crate::annotations::Annotations;
use crate::surface::SurfaceDrawable;
use crate::volume::VolumeDrawable;

/// Everything one viewport can show.
#[derive(Debug, Clone)]
pub enum Drawable {
    Surface(SurfaceView),
    SurfaceMontage(SurfaceMontageView),
    Volume(VolumeView),
    WholeBrain(WholeBrainView),
}

impl Drawable {
    /// Short description used in log messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Drawable::Surface(_) => "surface",
            Drawable::SurfaceMontage(_) => "surface montage",
            Drawable::Volume(_) => "volume",
            Drawable::WholeBrain(_) => "whole brain",
        }
    }

    #[must_use]
    pub fn annotations(&self) -> &Annotations {
        match self {
            Drawable::Surface(view) => &view.annotations,
            Drawable::SurfaceMontage(view) => &view.annotations,
            Drawable::Volume(view) => &view.annotations,
            Drawable::WholeBrain(view) => &view.annotations,
        }
    }
}

/// A single surface in one 3D view.
#[derive(Debug, Clone)]
pub struct SurfaceView {
    pub surface: SurfaceDrawable,
    pub annotations: Annotations,
}

impl SurfaceView {
    #[must_use]
    pub fn new(surface: SurfaceDrawable) -> Self {
        Self {
            surface,
            annotations: Annotations::default(),
        }
    }
}

/// Which side of a hemisphere a montage cell shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MontageSide {
    Lateral,
    Medial,
}

/// One cell of a surface montage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceMontageCell {
    pub viewport: Viewport,
    pub hemisphere: Hemisphere,
    pub side: MontageSide,
    /// Viewing transform slot the cell reads.
    pub slot: TransformSlot,
}

impl SurfaceMontageCell {
    /// Medial cells look at the same transform from behind.
    #[must_use]
    pub fn mirrored(&self) -> bool {
        self.side == MontageSide::Medial
    }
}

/// Lateral and medial views of one or both hemispheres.
#[derive(Debug, Clone, Default)]
pub struct SurfaceMontageView {
    pub left: Option<SurfaceDrawable>,
    pub right: Option<SurfaceDrawable>,
    pub annotations: Annotations,
}

impl SurfaceMontageView {
    #[must_use]
    pub fn surface(&self, hemisphere: Hemisphere) -> Option<&SurfaceDrawable> {
        match hemisphere {
            Hemisphere::Left => self.left.as_ref(),
            Hemisphere::Right => self.right.as_ref(),
        }
    }

    /// Splits `viewport` into montage cells.
    ///
    /// With both hemispheres the top row is lateral (left, right) and the
    /// bottom row medial; with one hemisphere lateral and medial sit side by
    /// side.
    #[must_use]
    pub fn cells(&self, viewport: Viewport) -> Vec<SurfaceMontageCell> {
        let hemispheres: Vec<Hemisphere> = [Hemisphere::Left, Hemisphere::Right]
            .into_iter()
            .filter(|h| self.surface(*h).is_some_and(SurfaceDrawable::is_enabled))
            .collect();
        if hemispheres.is_empty() || !viewport.is_valid() {
            return Vec::new();
        }

        let cell = |hemisphere: Hemisphere, side: MontageSide, vp: Viewport| {
            let slot = match (hemisphere, side) {
                (Hemisphere::Left, MontageSide::Lateral) => TransformSlot::Normal,
                (Hemisphere::Right, MontageSide::Lateral) => TransformSlot::RightLateralMedialYoked,
                (Hemisphere::Left, MontageSide::Medial) => TransformSlot::MontageLeftOpposite,
                (Hemisphere::Right, MontageSide::Medial) => TransformSlot::MontageRightOpposite,
            };
            SurfaceMontageCell {
                viewport: vp,
                hemisphere,
                side,
                slot,
            }
        };

        let half_w = viewport.width / 2;
        let left_col = Viewport::new(viewport.x, viewport.y, half_w, viewport.height);
        let right_col = Viewport::new(
            viewport.x + half_w,
            viewport.y,
            viewport.width - half_w,
            viewport.height,
        );

        if let [only] = hemispheres.as_slice() {
            return vec![
                cell(*only, MontageSide::Lateral, left_col),
                cell(*only, MontageSide::Medial, right_col),
            ];
        }

        let half_h = viewport.height / 2;
        let top = |col: Viewport| {
            Viewport::new(col.x, col.y + half_h, col.width, col.height - half_h)
        };
        let bottom = |col: Viewport| Viewport::new(col.x, col.y, col.width, half_h);
        vec![
            cell(Hemisphere::Left, MontageSide::Lateral, top(left_col)),
            cell(Hemisphere::Right, MontageSide::Lateral, top(right_col)),
            cell(Hemisphere::Left, MontageSide::Medial, bottom(left_col)),
            cell(Hemisphere::Right, MontageSide::Medial, bottom(right_col)),
        ]
    }
}

/// Volume slices in a slice layout.
#[derive(Debug, Clone)]
pub struct VolumeView {
    /// Layers drawn bottom to top; the first enabled layer defines the grid.
    pub layers: Vec<VolumeDrawable>,
    pub layout: SliceLayout,
    pub projection: SliceProjection,
    /// Selected voxel `(i, j, k)`; each slice passes through it.
    pub selected_indices: [i64; 3],
    /// Surfaces whose intersection with each slice is outlined.
    pub outline_surfaces: Vec<SurfaceDrawable>,
    pub outline_color: [u8; 4],
    /// Foci near a slice are drawn on it.
    pub annotations: Annotations,
}

impl VolumeView {
    #[must_use]
    pub fn new(layers: Vec<VolumeDrawable>, layout: SliceLayout) -> Self {
        let selected_indices = layers
            .first()
            .map_or([0; 3], |v| v.dimensions().map(|n| (n / 2) as i64));
        Self {
            layers,
            layout,
            projection: SliceProjection::Orthogonal,
            selected_indices,
            outline_surfaces: Vec::new(),
            outline_color: [0, 255, 0, 255],
            annotations: Annotations::default(),
        }
    }

    /// The layer that defines the voxel grid.
    #[must_use]
    pub fn underlay(&self) -> Option<&VolumeDrawable> {
        self.layers.iter().find(|v| v.is_enabled())
    }

    #[must_use]
    pub fn dimensions(&self) -> [usize; 3] {
        self.underlay().map_or([0; 3], VolumeDrawable::dimensions)
    }

    /// Selected indices with the given axis' index replaced, as montage
    /// cells require.
    #[must_use]
    pub fn indices_for(&self, axis: SliceAxis, slice_index: Option<i64>) -> [i64; 3] {
        let mut indices = self.selected_indices;
        if let Some(index) = slice_index {
            indices[axis.dimension()] = index;
        }
        indices
    }
}

/// Surfaces and orthogonal volume slices in one 3D view.
#[derive(Debug, Clone, Default)]
pub struct WholeBrainView {
    pub surfaces: Vec<SurfaceDrawable>,
    pub layers: Vec<VolumeDrawable>,
    pub selected_indices: [i64; 3],
    /// Slice planes to show; at most one per axis.
    pub slice_axes: Vec<SliceAxis>,
    pub annotations: Annotations,
}

impl WholeBrainView {
    #[must_use]
    pub fn underlay(&self) -> Option<&VolumeDrawable> {
        self.layers.iter().find(|v| v.is_enabled())
    }

    /// Rotation center: the surfaces' combined bounds, else the volume.
    #[must_use]
    pub fn center(&self) -> Option<Vec3> {
        let bounds = self
            .surfaces
            .iter()
            .filter(|s| s.is_enabled())
            .filter_map(SurfaceDrawable::bounding_box)
            .reduce(|(lo1, hi1), (lo2, hi2)| (lo1.min(lo2), hi1.max(hi2)));
        bounds
            .map(|(lo, hi)| (lo + hi) * 0.5)
            .or_else(|| self.underlay().map(VolumeDrawable::center))
    }

    /// Distinct slice axes, in the order given.
    #[must_use]
    pub fn unique_slice_axes(&self) -> Vec<SliceAxis> {
        let mut axes: Vec<SliceAxis> = Vec::with_capacity(3);
        for axis in &self.slice_axes {
            if !axes.contains(axis) {
                axes.push(*axis);
            }
        }
        axes
    }
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;

    fn triangle(hemisphere: Hemisphere) -> SurfaceDrawable {
        SurfaceDrawable::new("t", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2]])
            .unwrap()
            .with_hemisphere(hemisphere)
    }

    #[test]
    fn test_montage_both_hemispheres() {
        let view = SurfaceMontageView {
            left: Some(triangle(Hemisphere::Left)),
            right: Some(triangle(Hemisphere::Right)),
            annotations: Annotations::default(),
        };
        let cells = view.cells(Viewport::new(0, 0, 200, 100));
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].viewport, Viewport::new(0, 50, 100, 50));
        assert_eq!(cells[0].slot, TransformSlot::Normal);
        assert_eq!(cells[3].viewport, Viewport::new(100, 0, 100, 50));
        assert_eq!(cells[3].slot, TransformSlot::MontageRightOpposite);
        assert!(cells[3].mirrored());
        assert!(!cells[1].mirrored());
    }

    #[test]
    fn test_montage_single_hemisphere() {
        let view = SurfaceMontageView {
            right: Some(triangle(Hemisphere::Right)),
            ..SurfaceMontageView::default()
        };
        let cells = view.cells(Viewport::new(0, 0, 200, 100));
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].side, MontageSide::Lateral);
        assert_eq!(cells[1].slot, TransformSlot::MontageRightOpposite);
        assert_eq!(cells[1].viewport, Viewport::new(100, 0, 100, 100));
    }

    #[test]
    fn test_volume_view_defaults_to_center() {
        let volume =
            VolumeDrawable::new("v", [5, 6, 7], Mat4::IDENTITY, vec![0.0; 210]).unwrap();
        let view = VolumeView::new(vec![volume], SliceLayout::default());
        assert_eq!(view.selected_indices, [2, 3, 3]);
        assert_eq!(view.indices_for(SliceAxis::Axial, Some(6)), [2, 3, 6]);
        assert_eq!(view.dimensions(), [5, 6, 7]);
    }

    #[test]
    fn test_whole_brain_axes_dedup() {
        let view = WholeBrainView {
            slice_axes: vec![SliceAxis::Axial, SliceAxis::Coronal, SliceAxis::Axial],
            ..WholeBrainView::default()
        };
        assert_eq!(view.unique_slice_axes(), vec![SliceAxis::Axial, SliceAxis::Coronal]);
        assert!(view.center().is_none());
    }
}
