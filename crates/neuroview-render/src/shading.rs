//! Headlight lighting shared by every target.
//!
//! The light sits at the eye, so the diffuse term depends only on the eye
//! space normal's Z component. Lighting is two-sided: surfaces seen from
//! behind (medial montage cells) are lit the same as front faces.

use glam::{Mat3, Vec3};

use crate::target::{Colors, ShadingMode, TriangleBatch};

pub const AMBIENT: f32 = 0.3;
pub const DIFFUSE: f32 = 0.7;

/// Scales a color's RGB by the headlight intensity for `eye_normal`.
#[must_use]
pub fn headlight(color: [u8; 4], eye_normal: Vec3) -> [u8; 4] {
    let n = eye_normal.normalize_or_zero();
    let intensity = (AMBIENT + DIFFUSE * n.z.abs()).min(1.0);
    let scale = |c: u8| (f32::from(c) * intensity).round().clamp(0.0, 255.0) as u8;
    [scale(color[0]), scale(color[1]), scale(color[2]), color[3]]
}

/// Per-vertex colors of a batch after lighting.
///
/// Returns `None` when nothing changes: identification mode, or a batch
/// without normals.
#[must_use]
pub fn lit_vertex_colors(
    batch: &TriangleBatch,
    normal_matrix: Mat3,
    mode: ShadingMode,
) -> Option<Vec<[u8; 4]>> {
    if mode == ShadingMode::Identification {
        return None;
    }
    // Per-primitive colors stay flat.
    if matches!(batch.colors, Colors::PerPrimitive(_)) {
        return None;
    }
    let normals = batch.normals.as_ref()?;
    Some(
        normals
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let base = match &batch.colors {
                    Colors::Uniform(c) => *c,
                    Colors::PerVertex(c) | Colors::PerPrimitive(c) => {
                        c.get(i).copied().unwrap_or([0; 4])
                    }
                };
                headlight(base, normal_matrix * *n)
            })
            .collect(),
    )
}
