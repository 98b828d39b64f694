use std::collections::HashSet;

use crate::payload::{DragPayload, Incoming, Origin};
use crate::placement::Placement;
use crate::slot::SlotId;
use crate::snapshot::Assignments;

/// Finds new homes for items bumped by a layout move.
///
/// Catalog drops never displace anything and resolve to an empty list.
/// Returns None when there are fewer vacated source slots than displaced
/// items; the caller must then abandon the move.
pub fn resolve_swaps(
    payload: &DragPayload,
    incoming: &[Incoming],
    placements: &[Placement],
    assignments: &Assignments,
) -> Option<Vec<Placement>> {
    if payload.origin() == Origin::Catalog {
        return Some(Vec::new());
    }

    let moving: HashSet<&str> = incoming.iter().map(|i| i.item.as_str()).collect();
    let targets: HashSet<&SlotId> = placements.iter().map(|p| &p.slot).collect();

    // (displaced item, source of the item that pushed it out)
    let mut displaced = Vec::new();
    for placement in placements {
        let Some(occupant) = assignments.get(&placement.slot) else {
            continue;
        };
        if moving.contains(occupant.as_str()) {
            continue;
        }
        let preferred = incoming
            .iter()
            .find(|i| i.item == placement.item)
            .and_then(|i| i.source.as_ref());
        displaced.push((occupant, preferred));
    }

    if displaced.is_empty() {
        return Some(Vec::new());
    }

    let mut candidates: Vec<&SlotId> = Vec::new();
    for source in incoming.iter().filter_map(|i| i.source.as_ref()) {
        let held_by_other = assignments
            .get(source)
            .is_some_and(|item| !moving.contains(item.as_str()));
        if targets.contains(source) || held_by_other || candidates.contains(&source) {
            continue;
        }
        candidates.push(source);
    }

    if candidates.len() < displaced.len() {
        log::debug!(
            "{} displaced items but only {} free source slots, aborting move",
            displaced.len(),
            candidates.len()
        );
        return None;
    }

    let mut free: Vec<Option<&SlotId>> = candidates.into_iter().map(Some).collect();
    let mut homes: Vec<Option<&SlotId>> = vec![None; displaced.len()];

    for (home, (_, preferred)) in homes.iter_mut().zip(&displaced) {
        let Some(preferred) = preferred else {
            continue;
        };
        if let Some(claimed) = free.iter_mut().find(|c| **c == Some(*preferred)) {
            *home = claimed.take();
        }
    }

    let mut remaining = free.into_iter().flatten();
    let mut swaps = Vec::with_capacity(displaced.len());
    for (home, (item, _)) in homes.into_iter().zip(displaced) {
        let slot = match home {
            Some(slot) => slot,
            None => remaining.next()?,
        };
        log::debug!("swapping {} into {}", item, slot);
        swaps.push(Placement {
            slot: slot.clone(),
            item: item.clone(),
        });
    }

    Some(swaps)
}
