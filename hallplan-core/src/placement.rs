use std::collections::HashSet;

use crate::catalog::ItemCatalog;
use crate::geometry::GeometryProjector;
use crate::layout::SlotSpace;
use crate::payload::{DragPayload, Incoming, Origin};
use crate::slot::{ItemId, SlotId};
use crate::snapshot::Assignments;

/// An item landing on a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub slot: SlotId,
    pub item: ItemId,
}

impl Placement {
    pub fn new(slot: impl Into<SlotId>, item: impl Into<ItemId>) -> Self {
        Placement {
            slot: slot.into(),
            item: item.into(),
        }
    }
}

/// The collaborators a drop is resolved against.
#[derive(Clone, Copy)]
pub struct DropContext<'a> {
    pub slots: &'a SlotSpace,
    pub catalog: &'a dyn ItemCatalog,
    pub projector: &'a dyn GeometryProjector,
}

impl<'a> DropContext<'a> {
    pub fn new(
        slots: &'a SlotSpace,
        catalog: &'a dyn ItemCatalog,
        projector: &'a dyn GeometryProjector,
    ) -> Self {
        DropContext {
            slots,
            catalog,
            projector,
        }
    }
}

/// Computes where the payload's items land when dropped on `anchor`.
///
/// Returns an empty list when the anchor is not a valid slot or the
/// payload holds no recognized items. Pure: `assignments` is only read.
pub fn resolve_placements(
    anchor: &SlotId,
    payload: &DragPayload,
    assignments: &Assignments,
    ctx: &DropContext<'_>,
) -> Vec<Placement> {
    let incoming = payload.incoming(ctx.catalog);
    place_incoming(anchor, payload, &incoming, assignments, ctx)
}

pub(crate) fn place_incoming(
    anchor: &SlotId,
    payload: &DragPayload,
    incoming: &[Incoming],
    assignments: &Assignments,
    ctx: &DropContext<'_>,
) -> Vec<Placement> {
    if !ctx.slots.contains(anchor) || incoming.is_empty() {
        return Vec::new();
    }

    let working = without_items(assignments, incoming);

    if let DragPayload::LayoutGroup { anchor: origin, .. } = payload {
        if incoming.len() >= 2 {
            match preserve_shape(anchor, origin, incoming, ctx) {
                Some(placements) => return placements,
                None => log::debug!(
                    "group of {} cannot keep its shape at {}, placing sequentially",
                    incoming.len(),
                    anchor
                ),
            }
        }
    }

    place_sequentially(anchor, payload.origin(), incoming, &working, ctx.slots)
}

/// The table with every incoming item lifted out.
pub(crate) fn without_items(assignments: &Assignments, incoming: &[Incoming]) -> Assignments {
    let lifted: HashSet<&str> = incoming.iter().map(|i| i.item.as_str()).collect();
    assignments
        .iter()
        .filter(|(_, item)| !lifted.contains(item.as_str()))
        .map(|(slot, item)| (slot.clone(), item.clone()))
        .collect()
}

/// Moves every item by the anchor offset. All items must land on distinct
/// valid slots, otherwise the whole shape is abandoned.
fn preserve_shape(
    anchor: &SlotId,
    origin: &SlotId,
    incoming: &[Incoming],
    ctx: &DropContext<'_>,
) -> Option<Vec<Placement>> {
    let offset = ctx.projector.center(anchor)? - ctx.projector.center(origin)?;
    let mut taken = HashSet::new();
    let mut placements = Vec::with_capacity(incoming.len());

    for entry in incoming {
        let source = entry.source.as_ref()?;
        let target = ctx.projector.slot_at(ctx.projector.center(source)? + offset)?;
        if !ctx.slots.contains(&target) || !taken.insert(target.clone()) {
            return None;
        }
        placements.push(Placement {
            slot: target,
            item: entry.item.clone(),
        });
    }

    Some(placements)
}

/// Walks the fill order from the anchor. Catalog drops skip occupied slots;
/// layout moves land on them and leave the occupant to the swap resolver.
/// Items left over at the end of the sequence are not placed.
fn place_sequentially(
    anchor: &SlotId,
    origin: Origin,
    incoming: &[Incoming],
    working: &Assignments,
    slots: &SlotSpace,
) -> Vec<Placement> {
    let mut pending = incoming.iter();
    let mut placements = Vec::with_capacity(incoming.len());

    for slot in slots.walk_from(anchor) {
        if origin == Origin::Catalog && working.contains_key(slot) {
            continue;
        }
        let Some(entry) = pending.next() else {
            break;
        };
        placements.push(Placement {
            slot: slot.clone(),
            item: entry.item.clone(),
        });
    }

    placements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, ItemInfo};
    use crate::geometry::{GridProjector, Point};
    use crate::layout::{FillDirection, HallConfig, LayoutConfig, SectionConfig};
    use crate::slot::Side;

    struct Fixture {
        slots: SlotSpace,
        catalog: Catalog,
        projector: GridProjector,
    }

    impl Fixture {
        /// One hall, left side, three columns of four rows.
        fn new() -> Self {
            let config = LayoutConfig::new(vec![HallConfig::new("A").with_side(
                Side::Left,
                vec![
                    SectionConfig::rows(4),
                    SectionConfig::rows(4),
                    SectionConfig::rows(4),
                ],
            )]);
            Fixture {
                slots: SlotSpace::new(&config, FillDirection::Column),
                catalog: ["a", "b", "c", "d", "e"]
                    .into_iter()
                    .map(|id| (id, ItemInfo::new(id)))
                    .collect(),
                projector: GridProjector::new(&config),
            }
        }

        fn ctx(&self) -> DropContext<'_> {
            DropContext::new(&self.slots, &self.catalog, &self.projector)
        }
    }

    fn slot(section: u32, row: u32) -> SlotId {
        SlotId::plain(0, Side::Left, section, row)
    }

    fn table(entries: &[(SlotId, &str)]) -> Assignments {
        entries
            .iter()
            .map(|(s, i)| (s.clone(), i.to_string()))
            .collect()
    }

    #[test]
    fn invalid_anchor_is_a_noop() {
        let f = Fixture::new();
        let placed = resolve_placements(
            &SlotId::from("h7.L.s0.r0"),
            &DragPayload::item("a"),
            &Assignments::new(),
            &f.ctx(),
        );
        assert!(placed.is_empty());
    }

    #[test]
    fn unknown_items_are_a_noop() {
        let f = Fixture::new();
        let placed = resolve_placements(
            &slot(0, 0),
            &DragPayload::item("ghost"),
            &Assignments::new(),
            &f.ctx(),
        );
        assert!(placed.is_empty());
    }

    #[test]
    fn catalog_drop_skips_occupied_slots() {
        let f = Fixture::new();
        let current = table(&[(slot(0, 1), "e")]);
        let payload = DragPayload::Catalog {
            items: vec!["a".into(), "b".into()],
        };
        let placed = resolve_placements(&slot(0, 0), &payload, &current, &f.ctx());
        assert_eq!(
            placed,
            vec![Placement::new(slot(0, 0), "a"), Placement::new(slot(0, 2), "b")]
        );
    }

    #[test]
    fn catalog_drop_of_placed_item_frees_its_slot() {
        let f = Fixture::new();
        // "a" sits in r1; dropping "b", "a" on r0 may reuse r1
        let current = table(&[(slot(0, 1), "a")]);
        let payload = DragPayload::Catalog {
            items: vec!["b".into(), "a".into()],
        };
        let placed = resolve_placements(&slot(0, 0), &payload, &current, &f.ctx());
        assert_eq!(placed[1], Placement::new(slot(0, 1), "a"));
    }

    #[test]
    fn layout_move_lands_on_occupied_slots() {
        let f = Fixture::new();
        let current = table(&[(slot(0, 0), "a"), (slot(1, 0), "b")]);
        let payload = DragPayload::LayoutSingle {
            item: "a".into(),
            source: slot(0, 0),
        };
        let placed = resolve_placements(&slot(1, 0), &payload, &current, &f.ctx());
        assert_eq!(placed, vec![Placement::new(slot(1, 0), "a")]);
    }

    #[test]
    fn items_past_the_end_are_dropped() {
        let f = Fixture::new();
        let payload = DragPayload::Catalog {
            items: vec!["a".into(), "b".into(), "c".into()],
        };
        let placed = resolve_placements(&slot(2, 2), &payload, &Assignments::new(), &f.ctx());
        assert_eq!(
            placed,
            vec![Placement::new(slot(2, 2), "a"), Placement::new(slot(2, 3), "b")]
        );
    }

    #[test]
    fn group_keeps_shape() {
        let f = Fixture::new();
        // an L shape in column 0, grabbed by its top
        let current = table(&[(slot(0, 0), "a"), (slot(0, 1), "b"), (slot(1, 1), "c")]);
        let payload =
            DragPayload::lift(&current, &[slot(0, 0), slot(0, 1), slot(1, 1)], &slot(0, 0))
                .unwrap();

        let placed = resolve_placements(&slot(1, 2), &payload, &current, &f.ctx());
        assert_eq!(
            placed,
            vec![
                Placement::new(slot(1, 2), "a"),
                Placement::new(slot(1, 3), "b"),
                Placement::new(slot(2, 3), "c"),
            ]
        );
    }

    #[test]
    fn group_falls_back_when_shape_leaves_the_layout() {
        let f = Fixture::new();
        let current = table(&[(slot(0, 0), "a"), (slot(0, 1), "b")]);
        let payload =
            DragPayload::lift(&current, &[slot(0, 0), slot(0, 1)], &slot(0, 0)).unwrap();

        // r3 + 1 row is off the grid, so the pair is laid out in fill order
        let placed = resolve_placements(&slot(1, 3), &payload, &current, &f.ctx());
        assert_eq!(
            placed,
            vec![Placement::new(slot(1, 3), "a"), Placement::new(slot(2, 0), "b")]
        );
    }

    /// Draws every slot in the first column, so distinct slots share centers.
    struct FoldedColumns<'a>(&'a GridProjector);

    impl GeometryProjector for FoldedColumns<'_> {
        fn center(&self, slot: &SlotId) -> Option<Point> {
            let first = self.0.center(&SlotId::plain(0, Side::Left, 0, 0))?;
            let point = self.0.center(slot)?;
            Some(Point::new(first.x, point.y))
        }

        fn slot_at(&self, point: Point) -> Option<SlotId> {
            self.0.slot_at(point)
        }
    }

    #[test]
    fn group_falls_back_when_members_collide() {
        let f = Fixture::new();
        let current = table(&[(slot(0, 0), "a"), (slot(1, 0), "b")]);
        let payload =
            DragPayload::lift(&current, &[slot(0, 0), slot(1, 0)], &slot(0, 0)).unwrap();

        let placed = resolve_placements(&slot(0, 2), &payload, &current, &f.ctx());
        assert_eq!(
            placed,
            vec![Placement::new(slot(0, 2), "a"), Placement::new(slot(1, 2), "b")]
        );

        // both members project onto r2 of the first column
        let folded = FoldedColumns(&f.projector);
        let ctx = DropContext::new(&f.slots, &f.catalog, &folded);
        let placed = resolve_placements(&slot(0, 2), &payload, &current, &ctx);
        assert_eq!(
            placed,
            vec![Placement::new(slot(0, 2), "a"), Placement::new(slot(0, 3), "b")]
        );
    }

    #[test]
    fn without_items_lifts_incoming() {
        let current = table(&[(slot(0, 0), "a"), (slot(0, 1), "b")]);
        let incoming = vec![Incoming {
            item: "a".into(),
            source: None,
        }];
        let rest = without_items(&current, &incoming);
        assert_eq!(rest, table(&[(slot(0, 1), "b")]));
    }
}
