//! Property tests for projection, identification, arbitration and geometry.

use neuroview_core::{
    montage_slice_indices, place_in_triangle, triangle_intersect_plane, BarycentricPlacement,
    ColorIdentification, DepthRange, IdentificationKind, IndexTuple, OrthographicFrustum,
    SelectionArbiter, SelectionCandidate, SelectionTargets, SlicePlane, Vec2, Vec3, Viewport,
    BACKGROUND_COLOR,
};
use proptest::prelude::*;

fn kind_strategy() -> impl Strategy<Value = IdentificationKind> {
    prop::sample::select(IdentificationKind::ALL.to_vec())
}

proptest! {
    #[test]
    fn frustum_aspect_matches_viewport(
        width in 1i32..4000,
        height in 1i32..4000,
        half_height in 0.1f32..1000.0,
    ) {
        let viewport = Viewport::new(0, 0, width, height);
        let frustum = OrthographicFrustum::compute(viewport, half_height, DepthRange::Composite, None)
            .expect("valid viewport");
        let expected = width as f32 / height as f32;
        prop_assert!((frustum.aspect_ratio() - expected).abs() <= expected * 1e-4);
        prop_assert!(frustum.right > frustum.left);
        prop_assert!(frustum.top > frustum.bottom);
    }

    #[test]
    fn identification_colors_decode_to_their_key(count in 1usize..10_000) {
        let mut table = ColorIdentification::new();
        let colors: Vec<[u8; 3]> = (0..count)
            .map(|i| table.encode(IdentificationKind::SurfaceNode, IndexTuple::Single { model: 0, index: i }))
            .collect();
        prop_assert_eq!(table.len(), count);
        for (i, color) in colors.iter().enumerate() {
            prop_assert_ne!(*color, BACKGROUND_COLOR);
            let decoded = table.decode(*color).expect("assigned color");
            prop_assert_eq!(decoded.indices, IndexTuple::Single { model: 0, index: i });
        }
        prop_assert!(table.decode(BACKGROUND_COLOR).is_none());
    }

    #[test]
    fn arbiter_keeps_minimum_depth(
        kind in kind_strategy(),
        depths in prop::collection::vec(0.0f32..1.0, 1..32),
    ) {
        let mut arbiter = SelectionArbiter::new(SelectionTargets::all());
        for (i, depth) in depths.iter().enumerate() {
            arbiter.consider(SelectionCandidate::new(
                kind,
                IndexTuple::Single { model: 0, index: i },
                *depth,
            ));
        }
        let min = depths.iter().copied().fold(f32::MAX, f32::min);
        let first_min = depths.iter().position(|d| *d == min).expect("non-empty");
        let held = arbiter.get(kind).expect("candidate held");
        prop_assert_eq!(held.screen_depth, min);
        prop_assert_eq!(held.indices, IndexTuple::Single { model: 0, index: first_min });
    }

    #[test]
    fn montage_indices_step_down_from_center(
        rows in 1u32..6,
        columns in 1u32..6,
        spacing in 1u32..8,
        count in 1i64..400,
        selected_fraction in 0.0f64..1.0,
    ) {
        let selected = ((count - 1) as f64 * selected_fraction) as i64;
        let indices = montage_slice_indices(rows, columns, spacing, selected, count);
        prop_assert_eq!(indices.len(), (rows * columns) as usize);
        let shown: Vec<i64> = indices.iter().flatten().copied().collect();
        for pair in shown.windows(2) {
            prop_assert_eq!(pair[0] - pair[1], i64::from(spacing));
        }
        for index in &shown {
            prop_assert!((0..count).contains(index));
        }
    }

    #[test]
    fn plane_crossing_points_lie_on_plane_and_edges(
        a in prop::array::uniform3(-10.0f32..10.0),
        b in prop::array::uniform3(-10.0f32..10.0),
        c in prop::array::uniform3(-10.0f32..10.0),
        offset in -5.0f32..5.0,
    ) {
        let (p1, p2, p3) = (Vec3::from(a), Vec3::from(b), Vec3::from(c));
        let plane = SlicePlane::new(Vec3::new(0.0, 0.0, offset), Vec3::Z);
        let distances = [p1, p2, p3].map(|p| plane.signed_distance(p));
        let straddles = distances.iter().any(|d| *d > 0.0) && distances.iter().any(|d| *d < 0.0);
        match triangle_intersect_plane(p1, p2, p3, &plane) {
            Some((q1, q2)) => {
                prop_assert!(plane.signed_distance(q1).abs() < 1e-3);
                prop_assert!(plane.signed_distance(q2).abs() < 1e-3);
            }
            None => prop_assert!(!straddles),
        }
    }

    #[test]
    fn barycentric_sub_areas_sum_to_triangle(
        u in 0.05f32..0.9,
        v_fraction in 0.05f32..0.95,
        a in prop::array::uniform2(-100.0f32..100.0),
        e1 in prop::array::uniform2(-100.0f32..100.0),
        e2 in prop::array::uniform2(-100.0f32..100.0),
    ) {
        let origin = Vec2::from(a);
        let e1 = Vec2::from(e1);
        let e2 = Vec2::from(e2);
        prop_assume!(e1.perp_dot(e2).abs() > 50.0);
        let v = (1.0 - u) * v_fraction;
        let point = origin + e1 * u + e2 * v;
        let placement = place_in_triangle([origin, origin + e1, origin + e2], point);
        match placement {
            BarycentricPlacement::Areas { areas, total } => {
                let sum: f32 = areas.iter().sum();
                let area = 0.5 * e1.perp_dot(e2).abs();
                prop_assert!((sum - area).abs() <= area * 1e-3 + 1e-3);
                prop_assert!((total - area).abs() <= area * 1e-3 + 1e-3);
                prop_assert!(areas.iter().all(|x| *x >= 0.0));
            }
            BarycentricPlacement::NearestVertex(_) => prop_assert!(false, "interior point snapped"),
        }
    }
}

#[test]
fn montage_example_visits_center_slices() {
    let indices = montage_slice_indices(2, 2, 1, 10, 100);
    assert_eq!(indices, vec![Some(12), Some(11), Some(10), Some(9)]);
}

#[test]
fn montage_negative_start_draws_nothing() {
    let indices = montage_slice_indices(2, 2, 1, -10, 100);
    assert!(indices.iter().all(Option::is_none));
}
