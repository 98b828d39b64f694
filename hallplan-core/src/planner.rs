//! The planner session: live snapshot, undo log and derived slot space.

use crate::catalog::ItemCatalog;
use crate::geometry::GeometryProjector;
use crate::history::History;
use crate::layout::{ConfigError, FillDirection, LayoutConfig, SlotSpace};
use crate::payload::DragPayload;
use crate::placement::{DropContext, Placement};
use crate::resolve::DropPlan;
use crate::settings::PlannerSettings;
use crate::slot::{ItemId, SlotId};
use crate::snapshot::{Snapshot, hall_key};

/// Result of committing a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Applied {
        placed: Vec<Placement>,
        swapped: Vec<Placement>,
        /// Items that found no slot and were left unassigned.
        dropped: Vec<ItemId>,
    },
    /// Nothing changed.
    NoOp,
    /// Displaced items had nowhere to go; the table is untouched.
    SwapInfeasible,
}

/// A single editing session over one layout.
///
/// Every edit that changes the snapshot's content key becomes exactly one
/// history entry. The slot space is rebuilt whenever the configuration or
/// fill direction of the live snapshot may have changed.
#[derive(Debug, Clone)]
pub struct Planner {
    history: History<Snapshot>,
    slots: SlotSpace,
    settings: PlannerSettings,
}

impl Planner {
    /// Starts an empty session over `config`.
    pub fn new(
        config: LayoutConfig,
        fill_direction: FillDirection,
        settings: PlannerSettings,
    ) -> Result<Self, ConfigError> {
        Self::from_snapshot(Snapshot::new(config, fill_direction), settings)
    }

    /// Starts a session from a stored snapshot with an empty history.
    ///
    /// Assignments to unknown slots, repeated items and names of unknown
    /// halls are dropped.
    pub fn from_snapshot(
        mut snapshot: Snapshot,
        settings: PlannerSettings,
    ) -> Result<Self, ConfigError> {
        snapshot.config.validate()?;
        let slots = snapshot.slot_space();
        let pruned = snapshot.retain_valid(&slots);
        if pruned > 0 {
            log::info!("dropped {pruned} invalid entries from loaded snapshot");
        }
        Ok(Planner {
            history: History::new(snapshot, settings.history_cap()),
            slots,
            settings,
        })
    }

    /// Resumes a session from a restored history.
    pub fn from_history(history: History<Snapshot>, settings: PlannerSettings) -> Self {
        let slots = history.current().slot_space();
        Planner {
            history,
            slots,
            settings,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        self.history.current()
    }

    pub fn history(&self) -> &History<Snapshot> {
        &self.history
    }

    pub fn slots(&self) -> &SlotSpace {
        &self.slots
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    pub fn assignment(&self, slot: &SlotId) -> Option<&ItemId> {
        self.snapshot().assignments.get(slot)
    }

    pub fn item_slot(&self, item: &str) -> Option<&SlotId> {
        self.snapshot().item_slot(item)
    }

    pub fn hall_name(&self, hall: u32) -> Option<&str> {
        self.snapshot().hall_name(hall)
    }

    /// Resolves a drop without committing it, for hover previews.
    pub fn preview_drop(
        &self,
        anchor: &SlotId,
        payload: &DragPayload,
        catalog: &dyn ItemCatalog,
        projector: &dyn GeometryProjector,
    ) -> DropPlan {
        let ctx = DropContext::new(&self.slots, catalog, projector);
        DropPlan::resolve(anchor, payload, &self.snapshot().assignments, &ctx)
    }

    /// Resolves and commits a drop.
    pub fn drop_payload(
        &mut self,
        anchor: &SlotId,
        payload: &DragPayload,
        catalog: &dyn ItemCatalog,
        projector: &dyn GeometryProjector,
    ) -> DropOutcome {
        let plan = self.preview_drop(anchor, payload, catalog, projector);
        let Some(assignments) = plan.apply_to(&self.snapshot().assignments) else {
            return match plan {
                DropPlan::SwapInfeasible { .. } => DropOutcome::SwapInfeasible,
                _ => DropOutcome::NoOp,
            };
        };
        let DropPlan::Ready {
            placements,
            swaps,
            dropped,
            ..
        } = plan
        else {
            return DropOutcome::NoOp;
        };

        let mut next = self.snapshot().clone();
        next.assignments = assignments;
        if !self.history.record(next) {
            return DropOutcome::NoOp;
        }
        if !dropped.is_empty() {
            log::debug!("{} items did not fit after {anchor}", dropped.len());
        }

        DropOutcome::Applied {
            placed: placements,
            swapped: swaps,
            dropped,
        }
    }

    /// Unassigns whatever sits in `slot`. Returns whether anything changed.
    pub fn clear_slot(&mut self, slot: &SlotId) -> bool {
        if !self.snapshot().assignments.contains_key(slot) {
            return false;
        }
        let mut next = self.snapshot().clone();
        next.assignments.remove(slot);
        self.history.record(next)
    }

    /// Unassigns every slot of a hall. Returns the number of cleared slots.
    pub fn clear_hall(&mut self, hall: u32) -> usize {
        let mut next = self.snapshot().clone();
        let before = next.assignments.len();
        next.assignments.retain(|slot, _| slot.hall() != Some(hall));
        let cleared = before - next.assignments.len();
        if cleared > 0 {
            self.history.record(next);
        }
        cleared
    }

    /// Overrides the name shown for a hall. A blank name restores the
    /// configured one.
    pub fn set_display_name(&mut self, hall: u32, name: &str) -> bool {
        if hall as usize >= self.snapshot().config.halls.len() {
            return false;
        }
        let mut next = self.snapshot().clone();
        let name = name.trim();
        if name.is_empty() {
            next.display_names.remove(&hall_key(hall));
        } else {
            next.display_names.insert(hall_key(hall), name.to_string());
        }
        self.history.record(next)
    }

    /// Replaces the layout configuration, dropping assignments to slots and
    /// names of halls that no longer exist.
    pub fn set_config(&mut self, config: LayoutConfig) -> Result<bool, ConfigError> {
        config.validate()?;
        let mut next = self.snapshot().clone();
        next.config = config;
        Ok(self.commit_reshaped(next))
    }

    pub fn set_fill_direction(&mut self, direction: FillDirection) -> bool {
        let mut next = self.snapshot().clone();
        next.fill_direction = direction;
        self.commit_reshaped(next)
    }

    /// Replaces the whole state, as when opening a file. Undoable.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) -> Result<bool, ConfigError> {
        snapshot.config.validate()?;
        Ok(self.commit_reshaped(snapshot))
    }

    fn commit_reshaped(&mut self, mut next: Snapshot) -> bool {
        let slots = next.slot_space();
        let pruned = next.retain_valid(&slots);
        if pruned > 0 {
            log::debug!("dropped {pruned} entries outside the new layout");
        }
        let changed = self.history.record(next);
        if changed {
            self.slots = slots;
        }
        changed
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo().is_some();
        if changed {
            self.slots = self.snapshot().slot_space();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo().is_some();
        if changed {
            self.slots = self.snapshot().slot_space();
        }
        changed
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, ItemInfo};
    use crate::geometry::GridProjector;
    use crate::layout::{HallConfig, SectionConfig};
    use crate::slot::Side;

    fn config(rows: u32) -> LayoutConfig {
        LayoutConfig::new(vec![
            HallConfig::new("Main").with_side(Side::Left, vec![SectionConfig::rows(rows)]),
            HallConfig::new("Annex").with_side(Side::Right, vec![SectionConfig::rows(2)]),
        ])
    }

    fn slot(row: u32) -> SlotId {
        SlotId::plain(0, Side::Left, 0, row)
    }

    fn catalog() -> Catalog {
        ["x", "y", "z"]
            .into_iter()
            .map(|id| (id, ItemInfo::new(id)))
            .collect()
    }

    fn planner() -> Planner {
        Planner::new(config(4), FillDirection::Row, PlannerSettings::default()).unwrap()
    }

    fn place(p: &mut Planner, item: &str, at: &SlotId) -> DropOutcome {
        let projector = GridProjector::new(&p.snapshot().config);
        p.drop_payload(at, &DragPayload::item(item), &catalog(), &projector)
    }

    #[test]
    fn catalog_drop_then_undo() {
        let mut p = planner();
        assert!(matches!(place(&mut p, "x", &slot(1)), DropOutcome::Applied { .. }));
        assert_eq!(p.item_slot("x"), Some(&slot(1)));

        assert!(p.undo());
        assert_eq!(p.assignment(&slot(1)), None);
        assert!(p.redo());
        assert_eq!(p.assignment(&slot(1)).map(String::as_str), Some("x"));
    }

    #[test]
    fn move_onto_own_slot_is_noop() {
        let mut p = planner();
        place(&mut p, "x", &slot(0));
        let entries = p.history().len();

        let projector = GridProjector::new(&p.snapshot().config);
        let payload = DragPayload::LayoutSingle {
            item: "x".into(),
            source: slot(0),
        };
        let outcome = p.drop_payload(&slot(0), &payload, &catalog(), &projector);
        assert_eq!(outcome, DropOutcome::NoOp);
        assert_eq!(p.history().len(), entries);
    }

    #[test]
    fn clear_operations() {
        let mut p = planner();
        place(&mut p, "x", &slot(0));
        place(&mut p, "y", &SlotId::plain(1, Side::Right, 0, 0));

        assert!(p.clear_slot(&slot(0)));
        assert!(!p.clear_slot(&slot(0)));
        assert_eq!(p.clear_hall(1), 1);
        assert_eq!(p.clear_hall(1), 0);
        assert!(p.snapshot().assignments.is_empty());
    }

    #[test]
    fn display_names() {
        let mut p = planner();
        assert!(p.set_display_name(1, "  Cold room "));
        assert_eq!(p.hall_name(1), Some("Cold room"));
        assert!(!p.set_display_name(1, "Cold room"));
        assert!(p.set_display_name(1, ""));
        assert_eq!(p.hall_name(1), Some("Annex"));
        assert!(!p.set_display_name(5, "Nowhere"));
    }

    #[test]
    fn shrinking_config_prunes_and_undoes() {
        let mut p = planner();
        place(&mut p, "x", &slot(3));
        assert!(p.set_config(config(2)).unwrap());
        assert_eq!(p.item_slot("x"), None);
        assert_eq!(p.slots().len(), 4);

        assert!(p.undo());
        assert_eq!(p.item_slot("x"), Some(&slot(3)));
        assert_eq!(p.slots().len(), 6);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut p = planner();
        assert!(p.set_config(LayoutConfig::default()).is_err());
        assert!(!p.can_undo());
    }

    #[test]
    fn set_config_drops_names_of_removed_halls() {
        let mut p = planner();
        assert!(p.set_display_name(1, "Cold room"));
        let one_hall = LayoutConfig::new(vec![
            HallConfig::new("Main").with_side(Side::Left, vec![SectionConfig::rows(4)]),
        ]);
        assert!(p.set_config(one_hall).unwrap());
        assert!(p.snapshot().display_names.is_empty());
        assert_eq!(p.hall_name(1), None);
    }

    #[test]
    fn load_snapshot_sanitizes_and_undoes() {
        let mut p = planner();
        place(&mut p, "x", &slot(0));
        let before = p.snapshot().clone();

        let mut loaded = Snapshot::new(config(2), FillDirection::Column);
        loaded.assignments.insert(slot(1), "y".into());
        loaded.assignments.insert(slot(3), "z".into());
        loaded.display_names.insert(hall_key(1), "Cold room".into());
        loaded.display_names.insert(hall_key(4), "Ghost".into());
        assert!(p.load_snapshot(loaded).unwrap());

        assert_eq!(p.item_slot("y"), Some(&slot(1)));
        assert_eq!(p.item_slot("z"), None);
        assert_eq!(p.hall_name(1), Some("Cold room"));
        assert_eq!(p.hall_name(4), None);
        assert_eq!(p.snapshot().display_names.len(), 1);
        assert_eq!(p.slots().len(), 4);

        assert!(p.undo());
        assert_eq!(p.snapshot(), &before);
        assert_eq!(p.slots().len(), 6);
    }

    #[test]
    fn load_snapshot_rejects_invalid_config() {
        let mut p = planner();
        let loaded = Snapshot::new(LayoutConfig::default(), FillDirection::Row);
        assert!(p.load_snapshot(loaded).is_err());
        assert!(!p.can_undo());
    }

    #[test]
    fn fill_direction_is_an_edit() {
        let mut p = planner();
        assert!(p.set_fill_direction(FillDirection::Column));
        assert!(!p.set_fill_direction(FillDirection::Column));
        assert!(p.undo());
        assert_eq!(p.snapshot().fill_direction, FillDirection::Row);
    }
}
