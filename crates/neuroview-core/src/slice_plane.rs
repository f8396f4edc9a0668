//! Volume slice planes and the screen quads they are drawn on.
//!
//! A slice plane is a unit normal plus a point on the plane, derived from an
//! anatomical axis and, under oblique projection, rotated by the volume's
//! oblique rotation. Planes are rebuilt every draw and never mutated.

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::projection::OrthographicFrustum;
use crate::viewport::Viewport;

/// Anatomical slicing axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SliceAxis {
    /// Horizontal plane, normal toward superior.
    Axial,
    /// Frontal plane, normal toward anterior.
    Coronal,
    /// Sagittal plane, normal toward right.
    Parasagittal,
}

impl SliceAxis {
    /// Axes in the order a triptych presents them.
    pub const ALL: [SliceAxis; 3] = [
        SliceAxis::Axial,
        SliceAxis::Coronal,
        SliceAxis::Parasagittal,
    ];

    /// Canonical plane normal in model (RAS) space.
    #[must_use]
    pub fn normal(self) -> Vec3 {
        match self {
            SliceAxis::Axial => Vec3::Z,
            SliceAxis::Coronal => Vec3::Y,
            SliceAxis::Parasagittal => Vec3::X,
        }
    }

    /// Direction that is "up" on screen when looking at the slice.
    #[must_use]
    pub fn up_vector(self) -> Vec3 {
        match self {
            SliceAxis::Axial => Vec3::Y,
            SliceAxis::Coronal | SliceAxis::Parasagittal => Vec3::Z,
        }
    }

    /// Voxel-index dimension that this axis steps through.
    #[must_use]
    pub fn dimension(self) -> usize {
        match self {
            SliceAxis::Parasagittal => 0,
            SliceAxis::Coronal => 1,
            SliceAxis::Axial => 2,
        }
    }

    /// Orientation letters for the (left, right, bottom, top) screen edges.
    ///
    /// The slice camera looks back along the normal, so coronal slices are
    /// seen from anterior with the patient's right on the left edge.
    #[must_use]
    pub fn orientation_labels(self) -> [&'static str; 4] {
        match self {
            SliceAxis::Axial => ["L", "R", "P", "A"],
            SliceAxis::Coronal => ["R", "L", "I", "S"],
            SliceAxis::Parasagittal => ["P", "A", "I", "S"],
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SliceAxis::Axial => "axial",
            SliceAxis::Coronal => "coronal",
            SliceAxis::Parasagittal => "parasagittal",
        }
    }
}

/// How slices relate to the voxel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SliceProjection {
    /// Planes aligned with the voxel axes.
    #[default]
    Orthogonal,
    /// Planes rotated by the tab's oblique rotation.
    Oblique,
}

/// An infinite plane: unit normal and a point on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlicePlane {
    point: Vec3,
    normal: Vec3,
}

impl SlicePlane {
    /// Creates a plane; the normal is normalized (a zero normal becomes +Z).
    #[must_use]
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal: normal.normalize_or(Vec3::Z),
        }
    }

    /// A point on the plane.
    #[must_use]
    pub fn point(&self) -> Vec3 {
        self.point
    }

    /// The unit normal.
    #[must_use]
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Signed distance from `point`; positive on the normal side.
    #[must_use]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        (point - self.point).dot(self.normal)
    }

    /// Orthogonal projection of `point` onto the plane.
    #[must_use]
    pub fn project(&self, point: Vec3) -> Vec3 {
        point - self.signed_distance(point) * self.normal
    }

    /// Intersection of a ray with the plane, `None` when parallel.
    ///
    /// Both directions along the ray are accepted: orthographic pick rays
    /// start on the near plane but slices can lie on either side of it.
    #[must_use]
    pub fn intersect_ray(&self, origin: Vec3, direction: Vec3) -> Option<Vec3> {
        let denom = self.normal.dot(direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (self.point - origin).dot(self.normal) / denom;
        Some(origin + direction * t)
    }
}

/// Builds the plane for an anatomical slice.
///
/// Under oblique projection the axis normal is rotated by `oblique_rotation`
/// (identity when absent) and renormalized.
#[must_use]
pub fn build_plane(
    axis: SliceAxis,
    projection: SliceProjection,
    oblique_rotation: Option<&Mat4>,
    slice_coordinate: Vec3,
) -> SlicePlane {
    let normal = match (projection, oblique_rotation) {
        (SliceProjection::Oblique, Some(rotation)) => rotation.transform_vector3(axis.normal()),
        _ => axis.normal(),
    };
    SlicePlane::new(slice_coordinate, normal)
}

/// The visible slab of a viewport expressed in model space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenQuadCorners {
    pub bottom_left: Vec3,
    pub bottom_right: Vec3,
    pub top_right: Vec3,
    pub top_left: Vec3,
}

impl ScreenQuadCorners {
    /// Corners in drawing order (counter-clockwise on screen).
    #[must_use]
    pub fn corners(&self) -> [Vec3; 4] {
        [
            self.bottom_left,
            self.bottom_right,
            self.top_right,
            self.top_left,
        ]
    }

    /// Bilinear position for texture coordinates `(s, t)` in `[0, 1]²`,
    /// `(0, 0)` at the bottom-left corner.
    #[must_use]
    pub fn point_at(&self, s: f32, t: f32) -> Vec3 {
        let bottom = self.bottom_left.lerp(self.bottom_right, s);
        let top = self.top_left.lerp(self.top_right, s);
        bottom.lerp(top, t)
    }

    /// Model-space point under a window position.
    #[must_use]
    pub fn point_at_window(&self, viewport: Viewport, x: f32, y: f32) -> Vec3 {
        let st = screen_to_texture(viewport, x, y);
        self.point_at(st.x, st.y)
    }

    /// Texture coordinates of a model point lying on the quad.
    ///
    /// The quad is a parallelogram (an affine image of the screen rectangle),
    /// so the coordinates come from projecting onto its two edge vectors.
    #[must_use]
    pub fn texture_coordinate(&self, point: Vec3) -> Option<Vec2> {
        let u = self.bottom_right - self.bottom_left;
        let v = self.top_left - self.bottom_left;
        let uu = u.length_squared();
        let vv = v.length_squared();
        if uu < f32::EPSILON || vv < f32::EPSILON {
            return None;
        }
        let d = point - self.bottom_left;
        Some(Vec2::new(d.dot(u) / uu, d.dot(v) / vv))
    }

    /// Normal of the quad (right-handed from its bottom and left edges).
    #[must_use]
    pub fn normal(&self) -> Vec3 {
        (self.bottom_right - self.bottom_left)
            .cross(self.top_left - self.bottom_left)
            .normalize_or_zero()
    }
}

/// Maps a window position to texture coordinates of the viewport,
/// `(0, 0)` at its bottom-left and `(1, 1)` at its top-right.
#[must_use]
pub fn screen_to_texture(viewport: Viewport, x: f32, y: f32) -> Vec2 {
    let width = viewport.width.max(1) as f32;
    let height = viewport.height.max(1) as f32;
    Vec2::new(
        (x - viewport.x as f32) / width,
        (y - viewport.y as f32) / height,
    )
}

/// Computes the model-space corners of the visible slice.
///
/// The frustum's corners at eye-space `z = 0` are shifted by the viewport
/// translation (pan) and taken through the inverse camera transform.
#[must_use]
pub fn build_screen_quad(
    frustum: &OrthographicFrustum,
    viewport_translation: Vec3,
    inverse_camera: &Mat4,
) -> ScreenQuadCorners {
    let to_model =
        |x: f32, y: f32| inverse_camera.transform_point3(Vec3::new(x, y, 0.0) - viewport_translation);
    ScreenQuadCorners {
        bottom_left: to_model(frustum.left, frustum.bottom),
        bottom_right: to_model(frustum.right, frustum.bottom),
        top_right: to_model(frustum.right, frustum.top),
        top_left: to_model(frustum.left, frustum.top),
    }
}

/// Intersects a triangle with a plane.
///
/// Returns the two points where the triangle's edges cross the plane, or
/// `None` when all vertices lie strictly on one side. A vertex exactly on the
/// plane counts as a crossing of both of its edges and is reported once.
#[must_use]
pub fn triangle_intersect_plane(
    p1: Vec3,
    p2: Vec3,
    p3: Vec3,
    plane: &SlicePlane,
) -> Option<(Vec3, Vec3)> {
    let verts = [p1, p2, p3];
    let d: [f32; 3] = std::array::from_fn(|i| plane.signed_distance(verts[i]));

    let all_above = d.iter().all(|&v| v > 0.0);
    let all_below = d.iter().all(|&v| v < 0.0);
    if all_above || all_below {
        return None;
    }

    let mut points: Vec<Vec3> = Vec::with_capacity(3);
    let mut push_unique = |p: Vec3| {
        if !points.iter().any(|q| (*q - p).length_squared() < 1e-12) {
            points.push(p);
        }
    };

    for &(i, j) in &[(0usize, 1usize), (1, 2), (2, 0)] {
        if d[i] == 0.0 {
            push_unique(verts[i]);
        }
        if d[i] * d[j] < 0.0 {
            let t = d[i] / (d[i] - d[j]);
            push_unique(verts[i].lerp(verts[j], t));
        }
    }

    // A triangle lying in the plane yields all three vertices; keep its first edge.
    match points.as_slice() {
        [a, b, ..] => Some((*a, *b)),
        _ => None,
    }
}

/// Line segments where a triangle mesh crosses a plane.
#[must_use]
pub fn surface_outline(
    positions: &[Vec3],
    triangles: &[[u32; 3]],
    plane: &SlicePlane,
) -> Vec<(Vec3, Vec3)> {
    triangles
        .iter()
        .filter_map(|tri| {
            let p1 = *positions.get(tri[0] as usize)?;
            let p2 = *positions.get(tri[1] as usize)?;
            let p3 = *positions.get(tri[2] as usize)?;
            triangle_intersect_plane(p1, p2, p3, plane)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::DepthRange;

    fn on_segment(p: Vec3, a: Vec3, b: Vec3) -> bool {
        let ab = b - a;
        let t = (p - a).dot(ab) / ab.length_squared();
        (0.0..=1.0).contains(&t) && (a + ab * t - p).length() < 1e-5
    }

    #[test]
    fn test_plane_normalizes() {
        let plane = SlicePlane::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(plane.normal(), Vec3::Z);
    }

    #[test]
    fn test_signed_distance_and_project() {
        let plane = SlicePlane::new(Vec3::new(0.0, 0.0, 2.0), Vec3::Z);
        assert!(plane.signed_distance(Vec3::new(1.0, 1.0, 5.0)) > 0.0);
        assert!(plane.signed_distance(Vec3::new(1.0, 1.0, -5.0)) < 0.0);
        let projected = plane.project(Vec3::new(1.0, 2.0, 7.0));
        assert!((projected - Vec3::new(1.0, 2.0, 2.0)).length() < 1e-6);
    }

    #[test]
    fn test_axis_normals() {
        assert_eq!(SliceAxis::Axial.normal(), Vec3::Z);
        assert_eq!(SliceAxis::Coronal.normal(), Vec3::Y);
        assert_eq!(SliceAxis::Parasagittal.normal(), Vec3::X);
        for axis in SliceAxis::ALL {
            assert_eq!(axis.normal().dot(axis.up_vector()), 0.0);
        }
    }

    #[test]
    fn test_build_plane_oblique() {
        let rotation = Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2);
        let point = Vec3::new(1.0, 2.0, 3.0);
        let plane = build_plane(
            SliceAxis::Axial,
            SliceProjection::Oblique,
            Some(&rotation),
            point,
        );
        assert!((plane.normal() - Vec3::NEG_Y).length() < 1e-6);
        assert_eq!(plane.point(), point);

        // Orthogonal projection ignores the rotation.
        let plane = build_plane(
            SliceAxis::Axial,
            SliceProjection::Orthogonal,
            Some(&rotation),
            point,
        );
        assert_eq!(plane.normal(), Vec3::Z);
    }

    #[test]
    fn test_triangle_straddling_plane() {
        let plane = SlicePlane::new(Vec3::ZERO, Vec3::Z);
        let a = Vec3::new(0.0, 0.0, -1.0);
        let b = Vec3::new(2.0, 0.0, 1.0);
        let c = Vec3::new(0.0, 2.0, 1.0);
        let (p, q) = triangle_intersect_plane(a, b, c, &plane).unwrap();
        assert!(p.z.abs() < 1e-6 && q.z.abs() < 1e-6);
        // Each point lies on an edge from the lone vertex below the plane.
        assert!(on_segment(p, a, b) || on_segment(p, c, a));
        assert!(on_segment(q, a, b) || on_segment(q, c, a));
        assert!((p - q).length() > 1e-3);
    }

    #[test]
    fn test_triangle_one_side_is_skipped() {
        let plane = SlicePlane::new(Vec3::ZERO, Vec3::Z);
        let result = triangle_intersect_plane(
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 2.0),
            Vec3::new(0.0, 1.0, 3.0),
            &plane,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_triangle_vertex_on_plane() {
        let plane = SlicePlane::new(Vec3::ZERO, Vec3::Z);
        let (p, q) = triangle_intersect_plane(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, -1.0),
            &plane,
        )
        .unwrap();
        assert!(p.z.abs() < 1e-6 && q.z.abs() < 1e-6);
        assert!((p - q).length() > 0.5);
    }

    #[test]
    fn test_surface_outline_counts_crossing_triangles() {
        let positions = vec![
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 2.0),
        ];
        let triangles = vec![[0, 1, 2], [1, 3, 2], [0, 1, 9]];
        let plane = SlicePlane::new(Vec3::ZERO, Vec3::Z);
        // The second triangle is above the plane; the third is out of range.
        assert_eq!(surface_outline(&positions, &triangles, &plane).len(), 1);
    }

    #[test]
    fn test_screen_quad_identity_camera() {
        let vp = Viewport::new(0, 0, 200, 100);
        let frustum = OrthographicFrustum::compute(vp, 50.0, DepthRange::Composite, None).unwrap();
        let quad = build_screen_quad(&frustum, Vec3::ZERO, &Mat4::IDENTITY);
        assert_eq!(quad.bottom_left, Vec3::new(-100.0, -50.0, 0.0));
        assert_eq!(quad.top_right, Vec3::new(100.0, 50.0, 0.0));
        assert_eq!(quad.point_at(0.5, 0.5), Vec3::ZERO);
        assert_eq!(quad.normal(), Vec3::Z);

        let p = quad.point_at_window(vp, 150.0, 75.0);
        assert!((p - Vec3::new(50.0, 25.0, 0.0)).length() < 1e-4);
        let st = quad.texture_coordinate(p).unwrap();
        assert!((st - Vec2::new(0.75, 0.75)).length() < 1e-5);
    }

    #[test]
    fn test_ray_intersection() {
        let plane = SlicePlane::new(Vec3::new(0.0, 0.0, 3.0), Vec3::Z);
        let hit = plane
            .intersect_ray(Vec3::new(1.0, 1.0, 10.0), Vec3::NEG_Z)
            .unwrap();
        assert!((hit - Vec3::new(1.0, 1.0, 3.0)).length() < 1e-6);
        assert!(plane.intersect_ray(Vec3::ZERO, Vec3::X).is_none());
    }
}
