//! Per-tab viewing transforms.
//!
//! Each tab owns one [`ViewingState`] per [`TransformSlot`]. Composition
//! returns matrices by value; nothing here touches a graphics API.

use std::collections::BTreeMap;

use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{NeuroviewError, Result};
use crate::slice_plane::{SliceAxis, SlicePlane, SliceProjection};

/// Index of a browser tab.
pub type TabIndex = usize;

/// Named viewing transform of a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransformSlot {
    /// The transform used by every single-model view.
    Normal,
    /// Right hemisphere of a lateral/medial yoked pair.
    RightLateralMedialYoked,
    /// Left hemisphere medial cell of a surface montage.
    MontageLeftOpposite,
    /// Right hemisphere medial cell of a surface montage.
    MontageRightOpposite,
}

impl TransformSlot {
    /// Every slot, in storage order.
    pub const ALL: [TransformSlot; 4] = [
        TransformSlot::Normal,
        TransformSlot::RightLateralMedialYoked,
        TransformSlot::MontageLeftOpposite,
        TransformSlot::MontageRightOpposite,
    ];

    fn index(self) -> usize {
        match self {
            TransformSlot::Normal => 0,
            TransformSlot::RightLateralMedialYoked => 1,
            TransformSlot::MontageLeftOpposite => 2,
            TransformSlot::MontageRightOpposite => 3,
        }
    }
}

/// Camera state of one transform slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewingState {
    rotation: Mat4,
    translation: Vec3,
    scale: f32,
    oblique_rotation: Option<Mat4>,
}

impl Default for ViewingState {
    fn default() -> Self {
        Self {
            rotation: Mat4::IDENTITY,
            translation: Vec3::ZERO,
            scale: 1.0,
            oblique_rotation: None,
        }
    }
}

impl ViewingState {
    #[must_use]
    pub fn rotation(&self) -> Mat4 {
        self.rotation
    }

    /// Stores a rotation, re-orthonormalizing it and dropping any translation.
    pub fn set_rotation(&mut self, rotation: Mat4) {
        self.rotation = orthonormalize(rotation);
    }

    #[must_use]
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
    }

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Sets the zoom. Non-positive or non-finite values are ignored.
    pub fn set_scale(&mut self, scale: f32) {
        if scale > 0.0 && scale.is_finite() {
            self.scale = scale;
        } else {
            log::warn!("ignoring invalid scale {scale}");
        }
    }

    /// The oblique volume rotation, identity when never set.
    #[must_use]
    pub fn oblique_rotation(&self) -> Mat4 {
        self.oblique_rotation.unwrap_or(Mat4::IDENTITY)
    }

    pub fn set_oblique_rotation(&mut self, rotation: Option<Mat4>) {
        self.oblique_rotation = rotation.map(orthonormalize);
    }

    /// Rotation as a column-major float array for external persistence.
    #[must_use]
    pub fn rotation_array(&self) -> [f32; 16] {
        self.rotation.to_cols_array()
    }

    pub fn set_rotation_array(&mut self, values: &[f32; 16]) {
        self.set_rotation(Mat4::from_cols_array(values));
    }

    #[must_use]
    pub fn translation_array(&self) -> [f32; 3] {
        self.translation.to_array()
    }

    pub fn set_translation_array(&mut self, values: &[f32; 3]) {
        self.translation = Vec3::from_array(*values);
    }

    #[must_use]
    pub fn oblique_rotation_array(&self) -> Option<[f32; 16]> {
        self.oblique_rotation.map(|m| m.to_cols_array())
    }

    /// Builds the model-view matrix and caches the inverse rotation.
    ///
    /// Order: translate, rotate, uniform scale, then translate by `-center`
    /// so the given centroid ends up at the rotation origin.
    #[must_use]
    pub fn compose_model_view(&self, center: Option<Vec3>) -> CameraTransform {
        let mut model_view = Mat4::from_translation(self.translation)
            * self.rotation
            * Mat4::from_scale(Vec3::splat(self.scale));
        if let Some(center) = center {
            model_view *= Mat4::from_translation(-center);
        }

        let inverse_rotation = invert_rotation(&self.rotation);
        if inverse_rotation.is_none() {
            log::warn!("viewing rotation is singular, billboards disabled");
        }

        CameraTransform {
            model_view,
            rotation: self.rotation,
            inverse_rotation,
        }
    }
}

/// Result of composing a camera: the model-view matrix plus the inverse of
/// its rotation, which billboarded symbols use to face the viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    pub model_view: Mat4,
    pub rotation: Mat4,
    pub inverse_rotation: Option<Mat4>,
}

impl CameraTransform {
    /// Inverse of the full model-view matrix, if it exists.
    #[must_use]
    pub fn inverse_model_view(&self) -> Option<Mat4> {
        crate::projection::try_inverse(&self.model_view, "model view").ok()
    }
}

/// Builds the camera for a volume slice.
///
/// The eye sits `look_at_offset` units along the plane normal from the slice
/// point and looks back at it. The up vector is the axis' canonical up, which
/// is rotated with the oblique rotation under oblique projection so the
/// in-plane orientation follows free rotation. The viewing state's
/// translation and scale are applied in eye space (pan and zoom around the
/// slice point).
#[must_use]
pub fn compose_slice_camera(
    plane: &SlicePlane,
    axis: SliceAxis,
    projection: SliceProjection,
    state: &ViewingState,
    look_at_offset: f32,
) -> CameraTransform {
    let up = match projection {
        SliceProjection::Orthogonal => axis.up_vector(),
        SliceProjection::Oblique => state
            .oblique_rotation()
            .transform_vector3(axis.up_vector())
            .normalize_or(axis.up_vector()),
    };
    let normal = plane.normal();
    let eye = plane.point() + normal * look_at_offset;
    let look_at = Mat4::look_at_rh(eye, plane.point(), up);

    let model_view = Mat4::from_translation(state.translation())
        * Mat4::from_scale(Vec3::splat(state.scale()))
        * look_at;

    let rotation = Mat4::from_mat3(Mat3::from_mat4(look_at));
    let inverse_rotation = invert_rotation(&rotation);
    CameraTransform {
        model_view,
        rotation,
        inverse_rotation,
    }
}

/// Inverse of a (supposedly) pure rotation; `None` when singular.
#[must_use]
pub fn invert_rotation(rotation: &Mat4) -> Option<Mat4> {
    let det = rotation.determinant();
    if det.abs() < 1e-6 || !det.is_finite() {
        return None;
    }
    Some(rotation.inverse())
}

/// Gram-Schmidt re-orthonormalization of the rotation block of `m`.
///
/// Translation is dropped. A degenerate input becomes the identity.
#[must_use]
pub fn orthonormalize(m: Mat4) -> Mat4 {
    let m3 = Mat3::from_mat4(m);
    let x = m3.x_axis.normalize_or_zero();
    if x == Vec3::ZERO {
        return Mat4::IDENTITY;
    }
    let y = (m3.y_axis - x * x.dot(m3.y_axis)).normalize_or_zero();
    if y == Vec3::ZERO {
        return Mat4::IDENTITY;
    }
    let z = x.cross(y);
    Mat4::from_mat3(Mat3::from_cols(x, y, z))
}

/// Returns whether the rotation block is orthonormal within `tolerance`.
#[must_use]
pub fn is_orthonormal(m: &Mat4, tolerance: f32) -> bool {
    let m3 = Mat3::from_mat4(*m);
    let product = m3.transpose() * m3;
    product.abs_diff_eq(Mat3::IDENTITY, tolerance) && (m3.determinant() - 1.0).abs() < tolerance
}

/// Anatomical hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    Left,
    Right,
}

/// Predefined surface orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardView {
    Dorsal,
    Ventral,
    Anterior,
    Posterior,
    Lateral,
    Medial,
}

impl StandardView {
    /// Rotation that turns the given side of the model toward the viewer.
    ///
    /// Model space is RAS: +X right, +Y anterior, +Z superior. The viewer
    /// looks down eye-space -Z.
    #[must_use]
    pub fn rotation(self, hemisphere: Hemisphere) -> Mat4 {
        let (toward_viewer, up) = match (self, hemisphere) {
            (StandardView::Dorsal, _) => (Vec3::Z, Vec3::Y),
            (StandardView::Ventral, _) => (Vec3::NEG_Z, Vec3::Y),
            (StandardView::Anterior, _) => (Vec3::Y, Vec3::Z),
            (StandardView::Posterior, _) => (Vec3::NEG_Y, Vec3::Z),
            (StandardView::Lateral, Hemisphere::Left) | (StandardView::Medial, Hemisphere::Right) => {
                (Vec3::NEG_X, Vec3::Z)
            }
            (StandardView::Lateral, Hemisphere::Right) | (StandardView::Medial, Hemisphere::Left) => {
                (Vec3::X, Vec3::Z)
            }
        };
        let right = up.cross(toward_viewer);
        Mat4::from_mat3(Mat3::from_cols(right, up, toward_viewer).transpose())
    }
}

/// All viewing slots of a single tab.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TabViewingState {
    slots: [ViewingState; 4],
    /// When set, edits of the normal slot re-derive the right-hemisphere and
    /// montage slots.
    pub lateral_medial_yoked: bool,
}

impl TabViewingState {
    #[must_use]
    pub fn slot(&self, slot: TransformSlot) -> &ViewingState {
        &self.slots[slot.index()]
    }

    pub fn slot_mut(&mut self, slot: TransformSlot) -> &mut ViewingState {
        &mut self.slots[slot.index()]
    }

    /// Re-derives the yoked slots from the normal slot.
    ///
    /// The right hemisphere is the left hemisphere's view turned 180 degrees
    /// about the superior axis, with the horizontal pan mirrored. Montage
    /// opposite slots copy their hemisphere's slot; the mirrored frustum
    /// turns them around.
    pub fn sync_lateral_medial(&mut self) {
        let normal = self.slots[TransformSlot::Normal.index()];
        let mut right = normal;
        right.rotation = normal.rotation * Mat4::from_rotation_z(std::f32::consts::PI);
        right.translation.x = -normal.translation.x;
        self.slots[TransformSlot::RightLateralMedialYoked.index()] = right;
        self.slots[TransformSlot::MontageLeftOpposite.index()] = normal;
        self.slots[TransformSlot::MontageRightOpposite.index()] = right;
    }

    fn after_edit(&mut self, slot: TransformSlot) {
        if self.lateral_medial_yoked && slot == TransformSlot::Normal {
            self.sync_lateral_medial();
        }
    }
}

/// Viewing transforms of every tab.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewingTransforms {
    tabs: BTreeMap<TabIndex, TabViewingState>,
}

impl ViewingTransforms {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates identity state for a tab if it does not exist yet.
    pub fn add_tab(&mut self, tab: TabIndex) -> &mut TabViewingState {
        self.tabs.entry(tab).or_default()
    }

    /// Drops a closed tab's state.
    pub fn remove_tab(&mut self, tab: TabIndex) -> Option<TabViewingState> {
        self.tabs.remove(&tab)
    }

    #[must_use]
    pub fn contains_tab(&self, tab: TabIndex) -> bool {
        self.tabs.contains_key(&tab)
    }

    pub fn tab(&self, tab: TabIndex) -> Result<&TabViewingState> {
        self.tabs.get(&tab).ok_or(NeuroviewError::TabNotFound(tab))
    }

    pub fn tab_mut(&mut self, tab: TabIndex) -> Result<&mut TabViewingState> {
        self.tabs
            .get_mut(&tab)
            .ok_or(NeuroviewError::TabNotFound(tab))
    }

    pub fn state(&self, tab: TabIndex, slot: TransformSlot) -> Result<&ViewingState> {
        Ok(self.tab(tab)?.slot(slot))
    }

    pub fn translation(&self, tab: TabIndex, slot: TransformSlot) -> Result<Vec3> {
        Ok(self.state(tab, slot)?.translation())
    }

    pub fn rotation_matrix(&self, tab: TabIndex, slot: TransformSlot) -> Result<Mat4> {
        Ok(self.state(tab, slot)?.rotation())
    }

    /// Zoom of a tab, shared by all of its slots.
    pub fn scale(&self, tab: TabIndex) -> Result<f32> {
        Ok(self.state(tab, TransformSlot::Normal)?.scale())
    }

    pub fn oblique_rotation(&self, tab: TabIndex) -> Result<Mat4> {
        Ok(self.state(tab, TransformSlot::Normal)?.oblique_rotation())
    }

    pub fn set_translation(
        &mut self,
        tab: TabIndex,
        slot: TransformSlot,
        translation: Vec3,
    ) -> Result<()> {
        let state = self.tab_mut(tab)?;
        state.slot_mut(slot).set_translation(translation);
        state.after_edit(slot);
        Ok(())
    }

    pub fn set_rotation_matrix(
        &mut self,
        tab: TabIndex,
        slot: TransformSlot,
        rotation: Mat4,
    ) -> Result<()> {
        let state = self.tab_mut(tab)?;
        state.slot_mut(slot).set_rotation(rotation);
        state.after_edit(slot);
        Ok(())
    }

    /// Sets the zoom of every slot of a tab.
    pub fn set_scale(&mut self, tab: TabIndex, scale: f32) -> Result<()> {
        let state = self.tab_mut(tab)?;
        for slot in TransformSlot::ALL {
            state.slot_mut(slot).set_scale(scale);
        }
        Ok(())
    }

    pub fn set_oblique_rotation(&mut self, tab: TabIndex, rotation: Option<Mat4>) -> Result<()> {
        let state = self.tab_mut(tab)?;
        for slot in TransformSlot::ALL {
            state.slot_mut(slot).set_oblique_rotation(rotation);
        }
        Ok(())
    }

    /// Applies a mouse drag as a screen-space rotation.
    ///
    /// Horizontal motion spins about the screen Y axis, vertical motion about
    /// the screen X axis; the increment is pre-multiplied so it is relative
    /// to the viewer, not the model.
    pub fn rotate_by_mouse(
        &mut self,
        tab: TabIndex,
        slot: TransformSlot,
        dx: f32,
        dy: f32,
        degrees_per_pixel: f32,
    ) -> Result<()> {
        let increment = Mat4::from_rotation_y((dx * degrees_per_pixel).to_radians())
            * Mat4::from_rotation_x((-dy * degrees_per_pixel).to_radians());
        let state = self.tab_mut(tab)?;
        let current = state.slot(slot).rotation();
        state.slot_mut(slot).set_rotation(increment * current);
        state.after_edit(slot);
        Ok(())
    }

    /// Pans by a window-space delta expressed in model units.
    pub fn translate_by(&mut self, tab: TabIndex, slot: TransformSlot, dx: f32, dy: f32) -> Result<()> {
        let state = self.tab_mut(tab)?;
        let t = state.slot(slot).translation() + Vec3::new(dx, dy, 0.0);
        state.slot_mut(slot).set_translation(t);
        state.after_edit(slot);
        Ok(())
    }

    /// Multiplies the tab's zoom.
    pub fn zoom_by(&mut self, tab: TabIndex, factor: f32) -> Result<()> {
        let scale = self.scale(tab)? * factor;
        self.set_scale(tab, scale)
    }

    /// Composes an extra rotation about a model-space axis onto the oblique
    /// volume rotation.
    pub fn rotate_oblique(&mut self, tab: TabIndex, axis: Vec3, degrees: f32) -> Result<()> {
        let axis = axis.normalize_or(Vec3::Z);
        let current = self.oblique_rotation(tab)?;
        let rotation = Mat4::from_axis_angle(axis, degrees.to_radians()) * current;
        self.set_oblique_rotation(tab, Some(rotation))
    }

    /// Replaces the normal slot's rotation with a standard view.
    pub fn apply_standard_view(
        &mut self,
        tab: TabIndex,
        view: StandardView,
        hemisphere: Hemisphere,
    ) -> Result<()> {
        self.set_rotation_matrix(tab, TransformSlot::Normal, view.rotation(hemisphere))?;
        self.set_translation(tab, TransformSlot::Normal, Vec3::ZERO)
    }

    /// Copies every slot of `master` into `follower`.
    pub fn yoke(&mut self, master: TabIndex, follower: TabIndex) -> Result<()> {
        if master == follower {
            return Ok(());
        }
        let source = *self.tab(master)?;
        let target = self.tab_mut(follower)?;
        let yoked = target.lateral_medial_yoked;
        *target = source;
        target.lateral_medial_yoked = yoked;
        log::debug!("yoked tab {follower} to tab {master}");
        Ok(())
    }

    /// Restores identity rotation, zero translation and unit scale.
    pub fn reset(&mut self, tab: TabIndex) -> Result<()> {
        let state = self.tab_mut(tab)?;
        let yoked = state.lateral_medial_yoked;
        *state = TabViewingState::default();
        state.lateral_medial_yoked = yoked;
        if yoked {
            state.sync_lateral_medial();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_compose_order() {
        let mut state = ViewingState::default();
        state.set_translation(Vec3::new(10.0, 0.0, 0.0));
        state.set_rotation(Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2));
        state.set_scale(2.0);
        let center = Vec3::new(1.0, 0.0, 0.0);
        let camera = state.compose_model_view(Some(center));

        // The center maps to the translation.
        assert!(approx(camera.model_view.transform_point3(center), Vec3::new(10.0, 0.0, 0.0)));
        // One unit along +X from the center: scaled, rotated onto +Y, translated.
        let p = camera.model_view.transform_point3(Vec3::new(2.0, 0.0, 0.0));
        assert!(approx(p, Vec3::new(10.0, 2.0, 0.0)));
    }

    #[test]
    fn test_rotation_is_orthonormalized() {
        let mut state = ViewingState::default();
        let sheared = Mat4::from_cols_array(&[
            1.0, 0.1, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            5.0, 5.0, 5.0, 1.0,
        ]);
        state.set_rotation(sheared);
        assert!(is_orthonormal(&state.rotation(), 1e-5));
        assert_eq!(state.rotation().w_axis, glam::Vec4::W);
    }

    #[test]
    fn test_invalid_scale_ignored() {
        let mut state = ViewingState::default();
        state.set_scale(-1.0);
        state.set_scale(f32::NAN);
        assert_eq!(state.scale(), 1.0);
    }

    #[test]
    fn test_float_array_accessors() {
        let mut state = ViewingState::default();
        let rotation = Mat4::from_rotation_x(0.4);
        state.set_rotation_array(&rotation.to_cols_array());
        state.set_translation_array(&[1.0, 2.0, 3.0]);
        assert!(state.rotation().abs_diff_eq(rotation, 1e-6));
        assert_eq!(state.translation_array(), [1.0, 2.0, 3.0]);
        assert!(state.oblique_rotation_array().is_none());
    }

    #[test]
    fn test_missing_tab() {
        let transforms = ViewingTransforms::new();
        assert!(matches!(
            transforms.scale(3),
            Err(NeuroviewError::TabNotFound(3))
        ));
    }

    #[test]
    fn test_scale_applies_to_all_slots() {
        let mut transforms = ViewingTransforms::new();
        transforms.add_tab(0);
        transforms.set_scale(0, 3.0).unwrap();
        for slot in TransformSlot::ALL {
            assert_eq!(transforms.state(0, slot).unwrap().scale(), 3.0);
        }
        transforms.zoom_by(0, 0.5).unwrap();
        assert_eq!(transforms.scale(0).unwrap(), 1.5);
    }

    #[test]
    fn test_yoke_copies_every_slot() {
        let mut transforms = ViewingTransforms::new();
        transforms.add_tab(0);
        transforms.add_tab(1);
        for (i, slot) in TransformSlot::ALL.into_iter().enumerate() {
            transforms
                .set_translation(0, slot, Vec3::splat(i as f32 + 1.0))
                .unwrap();
            transforms
                .set_rotation_matrix(0, slot, Mat4::from_rotation_y(i as f32 * 0.3))
                .unwrap();
        }
        transforms.set_scale(0, 4.0).unwrap();
        transforms.yoke(0, 1).unwrap();
        for slot in TransformSlot::ALL {
            assert_eq!(transforms.state(0, slot).unwrap(), transforms.state(1, slot).unwrap());
        }
    }

    #[test]
    fn test_mouse_rotation_direction() {
        let mut transforms = ViewingTransforms::new();
        transforms.add_tab(0);
        // Dragging right by 180 pixels at 0.5 deg/px spins 90 degrees about Y:
        // the point nearest the viewer moves to the right.
        transforms
            .rotate_by_mouse(0, TransformSlot::Normal, 180.0, 0.0, 0.5)
            .unwrap();
        let r = transforms.rotation_matrix(0, TransformSlot::Normal).unwrap();
        assert!(approx(r.transform_vector3(Vec3::Z), Vec3::X));
        assert!(is_orthonormal(&r, 1e-5));
    }

    #[test]
    fn test_standard_views_face_viewer() {
        let left_lateral = StandardView::Lateral.rotation(Hemisphere::Left);
        assert!(approx(left_lateral.transform_vector3(Vec3::NEG_X), Vec3::Z));
        assert!(approx(left_lateral.transform_vector3(Vec3::Z), Vec3::Y));
        assert!(is_orthonormal(&left_lateral, 1e-6));

        let anterior = StandardView::Anterior.rotation(Hemisphere::Left);
        assert!(approx(anterior.transform_vector3(Vec3::Y), Vec3::Z));

        for view in [
            StandardView::Dorsal,
            StandardView::Ventral,
            StandardView::Anterior,
            StandardView::Posterior,
            StandardView::Lateral,
            StandardView::Medial,
        ] {
            for hemisphere in [Hemisphere::Left, Hemisphere::Right] {
                assert!(is_orthonormal(&view.rotation(hemisphere), 1e-6));
            }
        }
    }

    #[test]
    fn test_lateral_medial_yoking() {
        let mut transforms = ViewingTransforms::new();
        transforms.add_tab(0).lateral_medial_yoked = true;
        transforms
            .apply_standard_view(0, StandardView::Lateral, Hemisphere::Left)
            .unwrap();
        let right = transforms
            .rotation_matrix(0, TransformSlot::RightLateralMedialYoked)
            .unwrap();
        // The right hemisphere's lateral side (+X) faces the viewer.
        assert!(approx(right.transform_vector3(Vec3::X), Vec3::Z));
        assert_eq!(
            transforms.state(0, TransformSlot::MontageRightOpposite).unwrap(),
            transforms.state(0, TransformSlot::RightLateralMedialYoked).unwrap()
        );
    }

    #[test]
    fn test_reset() {
        let mut transforms = ViewingTransforms::new();
        transforms.add_tab(2);
        transforms.set_scale(2, 5.0).unwrap();
        transforms
            .set_translation(2, TransformSlot::Normal, Vec3::ONE)
            .unwrap();
        transforms.reset(2).unwrap();
        assert_eq!(transforms.scale(2).unwrap(), 1.0);
        assert_eq!(
            transforms.translation(2, TransformSlot::Normal).unwrap(),
            Vec3::ZERO
        );
    }

    #[test]
    fn test_singular_rotation_has_no_inverse() {
        assert!(invert_rotation(&Mat4::ZERO).is_none());
        assert!(invert_rotation(&Mat4::from_rotation_x(1.0)).is_some());
    }

    #[test]
    fn test_slice_camera_looks_at_plane() {
        let plane = SlicePlane::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        let state = ViewingState::default();
        let camera = compose_slice_camera(
            &plane,
            SliceAxis::Axial,
            SliceProjection::Orthogonal,
            &state,
            1.0,
        );
        // The slice point sits on the view axis, one unit in front of the eye.
        let p = camera.model_view.transform_point3(plane.point());
        assert!(approx(p, Vec3::new(0.0, 0.0, -1.0)));
        // Anterior (+Y) is up on an axial slice.
        let up = camera.model_view.transform_vector3(Vec3::Y);
        assert!(approx(up, Vec3::Y));
    }

    #[test]
    fn test_oblique_up_vector_follows_rotation() {
        let mut state = ViewingState::default();
        let oblique = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2);
        state.set_oblique_rotation(Some(oblique));
        let plane = crate::slice_plane::build_plane(
            SliceAxis::Axial,
            SliceProjection::Oblique,
            Some(&oblique),
            Vec3::ZERO,
        );
        let camera = compose_slice_camera(
            &plane,
            SliceAxis::Axial,
            SliceProjection::Oblique,
            &state,
            1.0,
        );
        // Rotating 90 degrees about Z turns the up vector from +Y to -X.
        let up = camera.model_view.transform_vector3(Vec3::NEG_X);
        assert!(approx(up, Vec3::Y));
    }
}
