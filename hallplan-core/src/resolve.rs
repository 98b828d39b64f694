use crate::payload::{DragPayload, Incoming};
use crate::placement::{self, DropContext, Placement};
use crate::slot::{ItemId, SlotId};
use crate::snapshot::Assignments;
use crate::swap;

/// The fully resolved effect of a drop, computed without touching the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPlan {
    /// Nothing lands: invalid anchor or no recognized items.
    Empty,
    /// Items would land but the bumped occupants have nowhere to go.
    SwapInfeasible { placements: Vec<Placement> },
    Ready {
        placements: Vec<Placement>,
        swaps: Vec<Placement>,
        /// Recognized items that found no slot.
        dropped: Vec<ItemId>,
        incoming: Vec<ItemId>,
    },
}

impl DropPlan {
    /// Resolves a drop of `payload` on `anchor` against `assignments`.
    pub fn resolve(
        anchor: &SlotId,
        payload: &DragPayload,
        assignments: &Assignments,
        ctx: &DropContext<'_>,
    ) -> Self {
        let incoming = payload.incoming(ctx.catalog);
        let placements = placement::place_incoming(anchor, payload, &incoming, assignments, ctx);
        if placements.is_empty() {
            return DropPlan::Empty;
        }

        let Some(swaps) = swap::resolve_swaps(payload, &incoming, &placements, assignments) else {
            return DropPlan::SwapInfeasible { placements };
        };

        let dropped = incoming
            .iter()
            .filter(|i| !placements.iter().any(|p| p.item == i.item))
            .map(|i| i.item.clone())
            .collect();

        DropPlan::Ready {
            placements,
            swaps,
            dropped,
            incoming: incoming.into_iter().map(|Incoming { item, .. }| item).collect(),
        }
    }

    /// Placements to preview, feasible or not.
    pub fn placements(&self) -> &[Placement] {
        match self {
            DropPlan::Empty => &[],
            DropPlan::SwapInfeasible { placements } | DropPlan::Ready { placements, .. } => {
                placements
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, DropPlan::Ready { .. })
    }

    /// The table after the plan is carried out. None unless the plan is ready.
    ///
    /// Every incoming item is lifted out first, so an item that found no slot
    /// ends up unassigned.
    pub fn apply_to(&self, assignments: &Assignments) -> Option<Assignments> {
        let DropPlan::Ready {
            placements,
            swaps,
            incoming,
            ..
        } = self
        else {
            return None;
        };

        let mut next: Assignments = assignments
            .iter()
            .filter(|(_, item)| !incoming.contains(item))
            .map(|(slot, item)| (slot.clone(), item.clone()))
            .collect();

        for p in placements.iter().chain(swaps) {
            next.insert(p.slot.clone(), p.item.clone());
        }
        Some(next)
    }
}
