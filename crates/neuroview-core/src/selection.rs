//! Depth arbitration among identification candidates.
//!
//! One slot is kept per [`IdentificationKind`]. Each identification draw call
//! offers at most one candidate per kind; the candidate closest to the viewer
//! (smallest window depth) wins its slot.

use glam::Vec3;

use crate::identification::{IdentificationKind, IndexTuple};

const KIND_COUNT: usize = IdentificationKind::ALL.len();

fn slot_index(kind: IdentificationKind) -> usize {
    kind as usize
}

/// A primitive found under the mouse during one draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionCandidate {
    pub kind: IdentificationKind,
    pub indices: IndexTuple,
    /// Window depth in `[0, 1]`, smaller is nearer.
    pub screen_depth: f32,
    /// Model-space position of the hit, when it could be recovered.
    pub model_xyz: Option<Vec3>,
}

impl SelectionCandidate {
    #[must_use]
    pub fn new(kind: IdentificationKind, indices: IndexTuple, screen_depth: f32) -> Self {
        Self {
            kind,
            indices,
            screen_depth,
            model_xyz: None,
        }
    }

    #[must_use]
    pub fn with_model_xyz(mut self, xyz: Vec3) -> Self {
        self.model_xyz = Some(xyz);
        self
    }
}

/// Which kinds of primitive a pick should look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionTargets {
    enabled: [bool; KIND_COUNT],
}

impl Default for SelectionTargets {
    fn default() -> Self {
        Self::all()
    }
}

impl SelectionTargets {
    /// Every kind enabled.
    #[must_use]
    pub fn all() -> Self {
        Self {
            enabled: [true; KIND_COUNT],
        }
    }

    /// Every kind disabled.
    #[must_use]
    pub fn none() -> Self {
        Self {
            enabled: [false; KIND_COUNT],
        }
    }

    /// Enables only the listed kinds.
    #[must_use]
    pub fn only(kinds: &[IdentificationKind]) -> Self {
        let mut targets = Self::none();
        for kind in kinds {
            targets.set_enabled(*kind, true);
        }
        targets
    }

    pub fn set_enabled(&mut self, kind: IdentificationKind, enabled: bool) {
        self.enabled[slot_index(kind)] = enabled;
    }

    #[must_use]
    pub fn is_enabled(&self, kind: IdentificationKind) -> bool {
        self.enabled[slot_index(kind)]
    }

    /// Returns whether any of the given kinds is enabled.
    #[must_use]
    pub fn any_enabled(&self, kinds: &[IdentificationKind]) -> bool {
        kinds.iter().any(|k| self.is_enabled(*k))
    }
}

/// Keeps the nearest candidate per kind across the draw calls of one pick.
#[derive(Debug, Clone, Default)]
pub struct SelectionArbiter {
    targets: SelectionTargets,
    slots: [Option<SelectionCandidate>; KIND_COUNT],
}

impl SelectionArbiter {
    #[must_use]
    pub fn new(targets: SelectionTargets) -> Self {
        Self {
            targets,
            slots: [None; KIND_COUNT],
        }
    }

    #[must_use]
    pub fn targets(&self) -> &SelectionTargets {
        &self.targets
    }

    /// Offers a candidate.
    ///
    /// It replaces the held candidate of its kind only if the slot is empty
    /// or it is strictly nearer. Disabled kinds are ignored.
    pub fn consider(&mut self, candidate: SelectionCandidate) {
        if !self.targets.is_enabled(candidate.kind) {
            return;
        }
        let slot = &mut self.slots[slot_index(candidate.kind)];
        let nearer = slot.map_or(true, |held| candidate.screen_depth < held.screen_depth);
        if nearer {
            *slot = Some(candidate);
        }
    }

    #[must_use]
    pub fn get(&self, kind: IdentificationKind) -> Option<&SelectionCandidate> {
        self.slots[slot_index(kind)].as_ref()
    }

    /// Clears every slot, keeping the targets.
    pub fn reset(&mut self) {
        self.slots = [None; KIND_COUNT];
    }

    /// Consumes the arbiter, listing populated slots in priority order.
    #[must_use]
    pub fn finish(self) -> IdentificationResult {
        IdentificationResult {
            hits: self.slots.into_iter().flatten().collect(),
        }
    }
}

/// Outcome of a pick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentificationResult {
    hits: Vec<SelectionCandidate>,
}

impl IdentificationResult {
    /// All hits, ordered by [`IdentificationKind`] priority.
    #[must_use]
    pub fn hits(&self) -> &[SelectionCandidate] {
        &self.hits
    }

    #[must_use]
    pub fn get(&self, kind: IdentificationKind) -> Option<&SelectionCandidate> {
        self.hits.iter().find(|h| h.kind == kind)
    }

    /// The highest-priority hit.
    #[must_use]
    pub fn primary(&self) -> Option<&SelectionCandidate> {
        self.hits.first()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focus(item: usize, depth: f32) -> SelectionCandidate {
        SelectionCandidate::new(
            IdentificationKind::Focus,
            IndexTuple::Item {
                file: 0,
                item,
                sub: 0,
            },
            depth,
        )
    }

    #[test]
    fn test_nearer_candidate_wins() {
        let mut arbiter = SelectionArbiter::new(SelectionTargets::all());
        arbiter.consider(focus(1, 0.6));
        arbiter.consider(focus(2, 0.4));
        arbiter.consider(focus(3, 0.5));
        let held = arbiter.get(IdentificationKind::Focus).unwrap();
        assert_eq!(
            held.indices,
            IndexTuple::Item {
                file: 0,
                item: 2,
                sub: 0
            }
        );
    }

    #[test]
    fn test_equal_depth_keeps_first() {
        let mut arbiter = SelectionArbiter::default();
        arbiter.consider(focus(1, 0.5));
        arbiter.consider(focus(2, 0.5));
        let held = arbiter.get(IdentificationKind::Focus).unwrap();
        assert!(matches!(held.indices, IndexTuple::Item { item: 1, .. }));
    }

    #[test]
    fn test_disabled_kind_is_ignored() {
        let mut arbiter =
            SelectionArbiter::new(SelectionTargets::only(&[IdentificationKind::Voxel]));
        arbiter.consider(focus(1, 0.1));
        assert!(arbiter.get(IdentificationKind::Focus).is_none());
        assert!(arbiter.finish().is_empty());
    }

    #[test]
    fn test_result_in_priority_order() {
        let mut arbiter = SelectionArbiter::default();
        arbiter.consider(SelectionCandidate::new(
            IdentificationKind::Voxel,
            IndexTuple::Voxel {
                layer: 0,
                ijk: [0, 0, 0],
            },
            0.1,
        ));
        arbiter.consider(focus(0, 0.9));
        arbiter.consider(SelectionCandidate::new(
            IdentificationKind::SurfaceNode,
            IndexTuple::Single { model: 0, index: 4 },
            0.5,
        ));
        let result = arbiter.finish();
        let kinds: Vec<_> = result.hits().iter().map(|h| h.kind).collect();
        assert_eq!(
            kinds,
            vec![
                IdentificationKind::SurfaceNode,
                IdentificationKind::Focus,
                IdentificationKind::Voxel
            ]
        );
        assert_eq!(
            result.primary().map(|h| h.kind),
            Some(IdentificationKind::SurfaceNode)
        );
    }

    #[test]
    fn test_reset_clears_slots() {
        let mut arbiter = SelectionArbiter::default();
        arbiter.consider(focus(1, 0.5));
        arbiter.reset();
        assert!(arbiter.get(IdentificationKind::Focus).is_none());
        assert!(arbiter.targets().is_enabled(IdentificationKind::Focus));
    }
}
