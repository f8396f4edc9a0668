//! Placing a window position inside a picked triangle.
//!
//! The triangle's vertices are projected to window space and the mouse point
//! splits it into three sub-triangles. Each sub-area, divided by the total,
//! is the weight of the vertex opposite it.

use glam::{Mat4, Vec2, Vec3};

use crate::projection::project_to_window;
use crate::viewport::Viewport;

/// Window-space areas below this are treated as degenerate.
pub const MIN_SCREEN_AREA: f32 = 1e-6;

/// Signed area of a 2D triangle, positive when counter-clockwise.
#[must_use]
pub fn signed_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    0.5 * (b - a).perp_dot(c - a)
}

/// Where a window point landed on a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BarycentricPlacement {
    /// Sub-areas opposite each vertex: `areas[0]` is the area of
    /// `(v2, v3, p)`, and so on cyclically. They are non-negative and sum to
    /// `total`, the on-screen triangle area for points inside it.
    Areas { areas: [f32; 3], total: f32 },
    /// The triangle was degenerate on screen; the point snaps to this
    /// vertex (0, 1 or 2).
    NearestVertex(usize),
}

impl BarycentricPlacement {
    /// Normalized weights for the three vertices.
    #[must_use]
    pub fn weights(&self) -> [f32; 3] {
        match *self {
            BarycentricPlacement::Areas { areas, total } => {
                [areas[0] / total, areas[1] / total, areas[2] / total]
            }
            BarycentricPlacement::NearestVertex(i) => {
                let mut w = [0.0; 3];
                w[i] = 1.0;
                w
            }
        }
    }

    /// Interpolates vertex attributes with [`Self::weights`].
    #[must_use]
    pub fn interpolate(&self, vertices: [Vec3; 3]) -> Vec3 {
        let w = self.weights();
        vertices[0] * w[0] + vertices[1] * w[1] + vertices[2] * w[2]
    }

    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        matches!(self, BarycentricPlacement::NearestVertex(_))
    }
}

fn nearest_vertex(screen: [Vec2; 3], point: Vec2) -> usize {
    let mut best = 0;
    let mut best_distance = f32::MAX;
    for (i, v) in screen.iter().enumerate() {
        let d = v.distance_squared(point);
        if d < best_distance {
            best_distance = d;
            best = i;
        }
    }
    best
}

/// Computes the placement of `point` in a window-space triangle.
///
/// A point slightly outside the triangle (a mouse position next to an edge
/// whose pixel center is covered) has its negative sub-areas clamped to zero,
/// which places it on the nearest edge.
#[must_use]
pub fn place_in_triangle(screen: [Vec2; 3], point: Vec2) -> BarycentricPlacement {
    let [v1, v2, v3] = screen;
    let total = signed_area(v1, v2, v3);
    if total.abs() < MIN_SCREEN_AREA || !total.is_finite() {
        log::warn!("zero-area triangle on screen, snapping to nearest vertex");
        return BarycentricPlacement::NearestVertex(nearest_vertex(screen, point));
    }

    // Orient sub-areas the same way as the triangle so that a clockwise
    // winding on screen (mirrored views) still yields positive weights.
    let sign = total.signum();
    let areas = [
        signed_area(v2, v3, point) * sign,
        signed_area(v3, v1, point) * sign,
        signed_area(v1, v2, point) * sign,
    ];
    let areas = areas.map(|a| a.max(0.0));
    let clamped_total: f32 = areas.iter().sum();
    if clamped_total < MIN_SCREEN_AREA {
        return BarycentricPlacement::NearestVertex(nearest_vertex(screen, point));
    }

    BarycentricPlacement::Areas {
        areas,
        total: clamped_total,
    }
}

/// Projects a model-space triangle through `mvp` and places `point` on it.
#[must_use]
pub fn project_triangle(
    mvp: &Mat4,
    viewport: Viewport,
    vertices: [Vec3; 3],
    point: Vec2,
) -> BarycentricPlacement {
    let screen = vertices.map(|v| project_to_window(mvp, viewport, v).truncate());
    place_in_triangle(screen, point)
}
