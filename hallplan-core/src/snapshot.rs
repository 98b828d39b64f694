use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::key::ContentKey;
use crate::layout::{FillDirection, LayoutConfig, SlotSpace};
use crate::slot::{ItemId, SlotId};
use crate::Diff;

/// Slot → item assignment table. Absent slots are unassigned.
pub type Assignments = BTreeMap<SlotId, ItemId>;

/// Complete planner state at one point in time.
///
/// Compared structurally; two snapshots with equal fields have equal
/// content keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Diff)]
pub struct Snapshot {
    #[diff(scalar)]
    pub config: LayoutConfig,
    #[diff(scalar)]
    #[serde(default)]
    pub fill_direction: FillDirection,
    #[serde(default)]
    pub assignments: Assignments,
    /// Display-name overrides keyed by `h{hall}`.
    #[serde(default)]
    pub display_names: BTreeMap<String, String>,
}

/// Display-name key of a hall.
pub fn hall_key(hall: u32) -> String {
    format!("h{hall}")
}

impl Snapshot {
    pub fn new(config: LayoutConfig, fill_direction: FillDirection) -> Self {
        Snapshot {
            config,
            fill_direction,
            assignments: Assignments::new(),
            display_names: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> ContentKey {
        ContentKey::of(self)
    }

    pub fn slot_space(&self) -> SlotSpace {
        SlotSpace::new(&self.config, self.fill_direction)
    }

    /// Slot currently holding `item`.
    pub fn item_slot(&self, item: &str) -> Option<&SlotId> {
        self.assignments
            .iter()
            .find(|(_, held)| held.as_str() == item)
            .map(|(slot, _)| slot)
    }

    /// Name shown for a hall: the override if set, else the configured name.
    pub fn hall_name(&self, hall: u32) -> Option<&str> {
        if let Some(name) = self.display_names.get(&hall_key(hall)) {
            return Some(name.as_str());
        }
        self.config
            .halls
            .get(hall as usize)
            .map(|h| h.name.as_str())
    }

    /// Drops assignments to slots outside `slots`, repeated items and
    /// display names of halls the configuration does not have.
    ///
    /// A repeated item keeps the slot that comes first in fill order.
    /// Returns the number of dropped entries.
    pub fn retain_valid(&mut self, slots: &SlotSpace) -> usize {
        let before = self.assignments.len() + self.display_names.len();
        let mut seen = HashSet::new();
        let mut kept = Assignments::new();

        for slot in slots.slots() {
            if let Some(item) = self.assignments.get(slot) {
                if seen.insert(item.clone()) {
                    kept.insert(slot.clone(), item.clone());
                }
            }
        }

        self.assignments = kept;
        let halls: HashSet<String> = (0..self.config.halls.len() as u32).map(hall_key).collect();
        self.display_names.retain(|key, _| halls.contains(key));
        before - self.assignments.len() - self.display_names.len()
    }

    /// True when no item occupies more than one slot.
    pub fn items_unique(&self) -> bool {
        let mut seen = HashSet::new();
        self.assignments.values().all(|item| seen.insert(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{HallConfig, SectionConfig};
    use crate::slot::Side;

    fn snapshot() -> Snapshot {
        Snapshot::new(
            LayoutConfig::new(vec![
                HallConfig::new("Main").with_side(Side::Left, vec![SectionConfig::rows(3)]),
            ]),
            FillDirection::Row,
        )
    }

    fn slot(row: u32) -> SlotId {
        SlotId::plain(0, Side::Left, 0, row)
    }

    #[test]
    fn retain_valid_drops_unknown_slots_and_repeats() {
        let mut s = snapshot();
        s.assignments.insert(slot(0), "a".into());
        s.assignments.insert(slot(2), "a".into());
        s.assignments.insert(slot(1), "b".into());
        s.assignments.insert(SlotId::from("h9.L.s0.r0"), "c".into());

        let dropped = s.retain_valid(&s.slot_space());
        assert_eq!(dropped, 2);
        assert_eq!(s.assignments.get(&slot(0)).map(String::as_str), Some("a"));
        assert!(!s.assignments.contains_key(&slot(2)));
        assert!(s.items_unique());
    }

    #[test]
    fn retain_valid_drops_names_of_missing_halls() {
        let mut s = snapshot();
        s.display_names.insert(hall_key(0), "Cellar".into());
        s.display_names.insert(hall_key(4), "Ghost".into());

        assert_eq!(s.retain_valid(&s.slot_space()), 1);
        assert_eq!(s.hall_name(0), Some("Cellar"));
        assert_eq!(s.hall_name(4), None);
        assert!(!s.display_names.contains_key(&hall_key(4)));
    }

    #[test]
    fn diff_touches_only_changed_fields() {
        let a = snapshot();
        let mut b = a.clone();
        b.assignments.insert(slot(1), "x".into());

        let delta = a.diff(&b).unwrap();
        assert!(delta.config.is_none());
        assert!(delta.fill_direction.is_none());
        assert!(delta.display_names.is_none());
        assert_eq!(delta.assignments.as_ref().map(|d| d.added.len()), Some(1));
    }

    #[test]
    fn snapshot_inverse_law() {
        let a = snapshot();
        let mut b = a.clone();
        b.fill_direction = FillDirection::Column;
        b.assignments.insert(slot(0), "x".into());
        b.display_names.insert(hall_key(0), "Cellar".into());

        let mut forward = a.clone();
        forward.apply(&a.diff(&b).unwrap()).unwrap();
        assert_eq!(forward, b);

        let mut backward = b.clone();
        backward.apply(&b.diff(&a).unwrap()).unwrap();
        assert_eq!(backward, a);
    }

    #[test]
    fn apply_is_atomic() {
        let a = snapshot();
        let mut b = a.clone();
        b.fill_direction = FillDirection::Column;
        b.assignments.insert(slot(0), "x".into());
        let delta = a.diff(&b).unwrap();

        // fill direction matches, assignments do not
        let mut stale = a.clone();
        stale.assignments.insert(slot(0), "y".into());
        let before = stale.clone();
        let err = stale.apply(&delta).unwrap_err();
        assert!(matches!(err, crate::DeltaError::Field { field: "assignments", .. }));
        assert_eq!(stale, before);
    }

    #[test]
    fn equal_snapshots_share_key() {
        assert_eq!(snapshot().key(), snapshot().key());
        let mut other = snapshot();
        other.display_names.insert(hall_key(0), "Renamed".into());
        assert_ne!(snapshot().key(), other.key());
        assert_eq!(other.hall_name(0), Some("Renamed"));
        assert_eq!(snapshot().hall_name(0), Some("Main"));
        assert_eq!(snapshot().hall_name(3), None);
    }

    #[test]
    fn item_slot_lookup() {
        let mut s = snapshot();
        s.assignments.insert(slot(2), "z".into());
        assert_eq!(s.item_slot("z"), Some(&slot(2)));
        assert_eq!(s.item_slot("missing"), None);
    }
}
