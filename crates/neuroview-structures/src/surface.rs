//! Cortical surface drawable.

use glam::Vec3;
use neuroview_core::{Hemisphere, NeuroviewError, Result};

/// Default surface color, a light gray.
pub const DEFAULT_SURFACE_COLOR: [u8; 4] = [178, 178, 178, 255];

/// A node highlighted with a billboard square, typically after a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSymbol {
    pub node: usize,
    pub color: [u8; 4],
}

/// A triangulated surface with per-node colors.
///
/// Vertex normals are area-weighted averages of the incident face normals
/// unless supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceDrawable {
    name: String,
    hemisphere: Option<Hemisphere>,
    positions: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    normals: Vec<Vec3>,
    node_colors: Vec<[u8; 4]>,
    node_symbols: Vec<NodeSymbol>,
    enabled: bool,
}

impl SurfaceDrawable {
    /// Creates a surface, rejecting triangles that reference missing nodes.
    pub fn new(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
    ) -> Result<Self> {
        let node_count = positions.len();
        if let Some(bad) = triangles
            .iter()
            .flatten()
            .find(|&&i| i as usize >= node_count)
        {
            return Err(NeuroviewError::InvalidGeometry(format!(
                "triangle references node {bad} of {node_count}"
            )));
        }

        let mut surface = Self {
            name: name.into(),
            hemisphere: None,
            node_colors: vec![DEFAULT_SURFACE_COLOR; node_count],
            positions,
            triangles,
            normals: Vec::new(),
            node_symbols: Vec::new(),
            enabled: true,
        };
        surface.compute_normals();
        Ok(surface)
    }

    #[must_use]
    pub fn with_hemisphere(mut self, hemisphere: Hemisphere) -> Self {
        self.hemisphere = Some(hemisphere);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn hemisphere(&self) -> Option<Hemisphere> {
        self.hemisphere
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[must_use]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    #[must_use]
    pub fn node_colors(&self) -> &[[u8; 4]] {
        &self.node_colors
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[must_use]
    pub fn triangle(&self, index: usize) -> Option<[u32; 3]> {
        self.triangles.get(index).copied()
    }

    /// Model-space corners of triangle `index`.
    #[must_use]
    pub fn triangle_positions(&self, index: usize) -> Option<[Vec3; 3]> {
        let [a, b, c] = self.triangle(index)?;
        Some([
            *self.positions.get(a as usize)?,
            *self.positions.get(b as usize)?,
            *self.positions.get(c as usize)?,
        ])
    }

    #[must_use]
    pub fn node_position(&self, node: usize) -> Option<Vec3> {
        self.positions.get(node).copied()
    }

    /// Replaces the normals; one per node.
    pub fn set_normals(&mut self, normals: Vec<Vec3>) -> Result<()> {
        if normals.len() != self.positions.len() {
            return Err(NeuroviewError::SizeMismatch {
                expected: self.positions.len(),
                actual: normals.len(),
            });
        }
        self.normals = normals;
        Ok(())
    }

    /// Replaces the node colors; one per node.
    pub fn set_node_colors(&mut self, colors: Vec<[u8; 4]>) -> Result<()> {
        if colors.len() != self.positions.len() {
            return Err(NeuroviewError::SizeMismatch {
                expected: self.positions.len(),
                actual: colors.len(),
            });
        }
        self.node_colors = colors;
        Ok(())
    }

    pub fn set_uniform_color(&mut self, color: [u8; 4]) {
        self.node_colors.fill(color);
    }

    #[must_use]
    pub fn node_symbols(&self) -> &[NodeSymbol] {
        &self.node_symbols
    }

    /// Adds a symbol over `node`; out-of-range nodes are ignored.
    pub fn add_node_symbol(&mut self, node: usize, color: [u8; 4]) {
        if node >= self.positions.len() {
            log::debug!("ignoring symbol for node {node} of surface {}", self.name);
            return;
        }
        self.node_symbols.push(NodeSymbol { node, color });
    }

    pub fn clear_node_symbols(&mut self) {
        self.node_symbols.clear();
    }

    /// Axis-aligned bounds, `None` for an empty surface.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))),
        )
    }

    /// Center of the bounding box; the point rotations pivot around.
    #[must_use]
    pub fn center(&self) -> Option<Vec3> {
        self.bounding_box().map(|(lo, hi)| (lo + hi) * 0.5)
    }

    /// Recomputes area-weighted vertex normals from the triangles.
    pub fn compute_normals(&mut self) {
        self.normals.clear();
        self.normals.resize(self.positions.len(), Vec3::ZERO);

        for tri in &self.triangles {
            let [a, b, c] = tri.map(|i| self.positions[i as usize]);
            // The cross product's length is twice the area, so it already
            // weights the face normal by area.
            let weighted = (b - a).cross(c - a) * 0.5;
            for &i in tri {
                self.normals[i as usize] += weighted;
            }
        }

        for normal in &mut self.normals {
            *normal = normal.normalize_or_zero();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> SurfaceDrawable {
        SurfaceDrawable::new(
            "square",
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_flat_normals_point_up() {
        let surface = square();
        for n in surface.normals() {
            assert!((*n - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_area_weighting() {
        // A large triangle in XY and a small one in XZ sharing node 0.
        let surface = SurfaceDrawable::new(
            "fold",
            vec![
                Vec3::ZERO,
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::new(0.0, 10.0, 0.0),
                Vec3::new(0.0, 0.0, -1.0),
            ],
            vec![[0, 1, 2], [0, 3, 1]],
        )
        .unwrap();
        let n = surface.normals()[0];
        assert!(n.z > 0.9, "large face should dominate, got {n:?}");
    }

    #[test]
    fn test_rejects_bad_triangle() {
        let result = SurfaceDrawable::new("bad", vec![Vec3::ZERO], vec![[0, 1, 2]]);
        assert!(matches!(result, Err(NeuroviewError::InvalidGeometry(_))));
    }

    #[test]
    fn test_color_count_must_match() {
        let mut surface = square();
        let result = surface.set_node_colors(vec![[0; 4]; 3]);
        assert!(matches!(
            result,
            Err(NeuroviewError::SizeMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_center_and_symbols() {
        let mut surface = square();
        assert_eq!(surface.center(), Some(Vec3::new(0.5, 0.5, 0.0)));
        surface.add_node_symbol(2, [255, 0, 0, 255]);
        surface.add_node_symbol(99, [255, 0, 0, 255]);
        assert_eq!(surface.node_symbols().len(), 1);
    }
}
