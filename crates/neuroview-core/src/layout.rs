//! Sub-viewport layouts for volume views.
//!
//! A tab viewport is split into cells according to the active layout: one
//! slice, an orthogonal triptych, or a montage grid of parallel slices.

use serde::{Deserialize, Serialize};

use crate::error::{NeuroviewError, Result};
use crate::slice_plane::SliceAxis;
use crate::viewport::Viewport;

/// Arrangement of the three orthogonal slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AllLayout {
    /// 2x2 quadrants: parasagittal top-left, coronal top-right, axial
    /// bottom-left, optional orientation axes bottom-right.
    #[default]
    Grid,
    /// Parasagittal, coronal, axial from left to right.
    Row,
    /// Parasagittal, coronal, axial from top to bottom.
    Column,
}

/// Largest number of montage rows or columns.
pub const MAX_MONTAGE_DIMENSION: u32 = 64;

/// Montage grid parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MontageParams {
    pub rows: u32,
    pub columns: u32,
    /// Slices skipped between adjacent cells (at least 1).
    pub slice_spacing: u32,
}

impl Default for MontageParams {
    fn default() -> Self {
        Self {
            rows: 3,
            columns: 4,
            slice_spacing: 5,
        }
    }
}

impl MontageParams {
    /// Checks that the grid has between 1 and [`MAX_MONTAGE_DIMENSION`]
    /// rows and columns.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("rows", self.rows), ("columns", self.columns)] {
            if value == 0 || value > MAX_MONTAGE_DIMENSION {
                return Err(NeuroviewError::InvalidMontage(format!(
                    "{value} {name}, expected 1 to {MAX_MONTAGE_DIMENSION}"
                )));
            }
        }
        Ok(())
    }
}

/// Layout of a volume view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliceLayout {
    Single(SliceAxis),
    Orthogonal { layout: AllLayout, show_axes: bool },
    Montage { axis: SliceAxis, params: MontageParams },
}

impl Default for SliceLayout {
    fn default() -> Self {
        SliceLayout::Single(SliceAxis::Axial)
    }
}

/// What a layout cell shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellContent {
    /// A slice; `slice_index` is set for montage cells.
    Slice {
        axis: SliceAxis,
        slice_index: Option<i64>,
    },
    /// The orientation-axes glyph.
    OrientationAxes,
}

/// One sub-viewport of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutCell {
    pub viewport: Viewport,
    pub content: CellContent,
}

/// Splits a viewport according to `layout`.
///
/// `selected_indices` are the selected voxel indices (i, j, k) and
/// `dimensions` the voxel counts per index axis; only montages use them.
#[must_use]
pub fn layout_cells(
    viewport: Viewport,
    layout: SliceLayout,
    selected_indices: [i64; 3],
    dimensions: [usize; 3],
    montage_gap: i32,
) -> Vec<LayoutCell> {
    if !viewport.is_valid() {
        log::debug!("skipping layout of invalid viewport {viewport:?}");
        return Vec::new();
    }
    match layout {
        SliceLayout::Single(axis) => vec![LayoutCell {
            viewport,
            content: CellContent::Slice {
                axis,
                slice_index: None,
            },
        }],
        SliceLayout::Orthogonal { layout, show_axes } => {
            orthogonal_layout(viewport, layout, show_axes)
        }
        SliceLayout::Montage { axis, params } => {
            let dim = axis.dimension();
            montage_layout(
                viewport,
                axis,
                params,
                montage_gap,
                selected_indices[dim],
                i64::try_from(dimensions[dim]).unwrap_or(i64::MAX),
            )
        }
    }
}

fn slice_cell(viewport: Viewport, axis: SliceAxis) -> LayoutCell {
    LayoutCell {
        viewport,
        content: CellContent::Slice {
            axis,
            slice_index: None,
        },
    }
}

/// Triptych of parasagittal, coronal and axial slices.
#[must_use]
pub fn orthogonal_layout(viewport: Viewport, layout: AllLayout, show_axes: bool) -> Vec<LayoutCell> {
    let Viewport {
        x,
        y,
        width,
        height,
    } = viewport;
    let cells = match layout {
        AllLayout::Grid => {
            let left_w = width / 2;
            let right_w = width - left_w;
            let bottom_h = height / 2;
            let top_h = height - bottom_h;
            let mut cells = vec![
                slice_cell(
                    Viewport::new(x, y + bottom_h, left_w, top_h),
                    SliceAxis::Parasagittal,
                ),
                slice_cell(
                    Viewport::new(x + left_w, y + bottom_h, right_w, top_h),
                    SliceAxis::Coronal,
                ),
                slice_cell(Viewport::new(x, y, left_w, bottom_h), SliceAxis::Axial),
            ];
            if show_axes {
                cells.push(LayoutCell {
                    viewport: Viewport::new(x + left_w, y, right_w, bottom_h),
                    content: CellContent::OrientationAxes,
                });
            }
            cells
        }
        AllLayout::Row => {
            let third = width / 3;
            let last = width - 2 * third;
            vec![
                slice_cell(Viewport::new(x, y, third, height), SliceAxis::Parasagittal),
                slice_cell(Viewport::new(x + third, y, third, height), SliceAxis::Coronal),
                slice_cell(Viewport::new(x + 2 * third, y, last, height), SliceAxis::Axial),
            ]
        }
        AllLayout::Column => {
            let third = height / 3;
            let first = height - 2 * third;
            vec![
                slice_cell(
                    Viewport::new(x, y + 2 * third, width, first),
                    SliceAxis::Parasagittal,
                ),
                slice_cell(Viewport::new(x, y + third, width, third), SliceAxis::Coronal),
                slice_cell(Viewport::new(x, y, width, third), SliceAxis::Axial),
            ]
        }
    };
    cells
        .into_iter()
        .filter(|cell| cell.viewport.is_valid())
        .collect()
}

/// Slice index shown by each montage cell, in row-major order.
///
/// Stepping starts `(rows * columns / 2) * spacing` above the selected index
/// and moves down by `spacing` per cell, so the selected slice lands near the
/// middle of the grid with the highest index at the top-left. Cells whose
/// index falls outside `[0, slice_count)` are `None`; the counter still
/// advances past them. A start above the range is pulled back by `spacing`
/// without consuming cells; a negative start yields no slices at all.
///
/// Grids larger than [`MAX_MONTAGE_DIMENSION`] per side yield no cells.
#[must_use]
pub fn montage_slice_indices(
    rows: u32,
    columns: u32,
    slice_spacing: u32,
    selected_index: i64,
    slice_count: i64,
) -> Vec<Option<i64>> {
    if rows > MAX_MONTAGE_DIMENSION || columns > MAX_MONTAGE_DIMENSION {
        log::warn!("montage of {rows}x{columns} cells exceeds {MAX_MONTAGE_DIMENSION} per side");
        return Vec::new();
    }
    let cell_count = (rows as usize) * (columns as usize);
    let mut indices = vec![None; cell_count];
    if cell_count == 0 || slice_count <= 0 {
        return indices;
    }

    let spacing = i64::from(slice_spacing.max(1));
    let offset = (i64::from(rows) * i64::from(columns) / 2) * spacing;
    let mut index = selected_index.saturating_add(offset);
    if index >= slice_count {
        // Same as decrementing by `spacing` until below `slice_count`.
        let steps = (index - slice_count) / spacing + 1;
        index -= steps * spacing;
    }
    if index < 0 {
        log::debug!("montage start index {index} out of range, no cells drawn");
        return indices;
    }

    for slot in &mut indices {
        if (0..slice_count).contains(&index) {
            *slot = Some(index);
        }
        index -= spacing;
    }
    indices
}

/// Montage cells that show an in-range slice.
///
/// Cell size is `(viewport_size - total_gap) / count` along each direction;
/// row 0 is at the top of the viewport.
#[must_use]
pub fn montage_layout(
    viewport: Viewport,
    axis: SliceAxis,
    params: MontageParams,
    gap: i32,
    selected_index: i64,
    slice_count: i64,
) -> Vec<LayoutCell> {
    if let Err(err) = params.validate() {
        log::debug!("skipping montage: {err}");
        return Vec::new();
    }
    let rows = i32::try_from(params.rows).unwrap_or(0);
    let columns = i32::try_from(params.columns).unwrap_or(0);
    let gap = gap.max(0);
    let cell_width = (viewport.width - (columns - 1) * gap) / columns;
    let cell_height = (viewport.height - (rows - 1) * gap) / rows;
    if cell_width <= 0 || cell_height <= 0 {
        log::debug!("montage cells too small for viewport {viewport:?}");
        return Vec::new();
    }

    let indices = montage_slice_indices(
        params.rows,
        params.columns,
        params.slice_spacing,
        selected_index,
        slice_count,
    );

    let mut cells = Vec::new();
    for row in 0..rows {
        for column in 0..columns {
            let Some(slice_index) = indices[(row * columns + column) as usize] else {
                continue;
            };
            let cell = Viewport::new(
                viewport.x + column * (cell_width + gap),
                viewport.y + viewport.height - (row + 1) * cell_height - row * gap,
                cell_width,
                cell_height,
            );
            cells.push(LayoutCell {
                viewport: cell,
                content: CellContent::Slice {
                    axis,
                    slice_index: Some(slice_index),
                },
            });
        }
    }
    cells
}
