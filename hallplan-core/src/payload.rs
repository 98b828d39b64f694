use std::collections::{BTreeMap, HashSet};

use crate::catalog::{Catalog, ItemCatalog};
use crate::slot::{ItemId, SlotId};

/// Where the dragged items come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Catalog,
    Layout,
}

/// What is being dragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPayload {
    /// One item or a whole category pulled from the catalog.
    Catalog { items: Vec<ItemId> },
    /// A single item lifted from a layout slot.
    LayoutSingle { item: ItemId, source: SlotId },
    /// Several items lifted from layout slots. `sources` runs parallel to
    /// `items`; `anchor` is the source slot the pointer grabbed.
    LayoutGroup {
        items: Vec<ItemId>,
        sources: Vec<SlotId>,
        anchor: SlotId,
    },
}

/// A recognized incoming item and the slot it was lifted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub item: ItemId,
    pub source: Option<SlotId>,
}

impl DragPayload {
    /// A single catalog item.
    pub fn item(item: impl Into<ItemId>) -> Self {
        DragPayload::Catalog {
            items: vec![item.into()],
        }
    }

    /// Every item of a catalog category, in catalog order.
    pub fn category(catalog: &Catalog, category: &str) -> Self {
        DragPayload::Catalog {
            items: catalog.category(category),
        }
    }

    /// Lifts the items held by `slots` out of the table.
    ///
    /// Empty slots are skipped. Returns None when nothing is held; a single
    /// held slot yields `LayoutSingle`.
    pub fn lift(
        assignments: &BTreeMap<SlotId, ItemId>,
        slots: &[SlotId],
        anchor: &SlotId,
    ) -> Option<Self> {
        let held: Vec<(SlotId, ItemId)> = slots
            .iter()
            .filter_map(|slot| assignments.get(slot).map(|item| (slot.clone(), item.clone())))
            .collect();

        match held.len() {
            0 => None,
            1 => {
                let (source, item) = held.into_iter().next()?;
                Some(DragPayload::LayoutSingle { item, source })
            }
            _ => {
                let (sources, items) = held.into_iter().unzip();
                Some(DragPayload::LayoutGroup {
                    items,
                    sources,
                    anchor: anchor.clone(),
                })
            }
        }
    }

    pub fn origin(&self) -> Origin {
        match self {
            DragPayload::Catalog { .. } => Origin::Catalog,
            DragPayload::LayoutSingle { .. } | DragPayload::LayoutGroup { .. } => Origin::Layout,
        }
    }

    pub fn items(&self) -> &[ItemId] {
        match self {
            DragPayload::Catalog { items } | DragPayload::LayoutGroup { items, .. } => items,
            DragPayload::LayoutSingle { item, .. } => std::slice::from_ref(item),
        }
    }

    /// Items the catalog recognizes, first occurrence wins, each paired
    /// with its source slot.
    pub fn incoming(&self, catalog: &(impl ItemCatalog + ?Sized)) -> Vec<Incoming> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        let mut push = |item: &ItemId, source: Option<&SlotId>| {
            if catalog.contains(item) && seen.insert(item.clone()) {
                out.push(Incoming {
                    item: item.clone(),
                    source: source.cloned(),
                });
            }
        };

        match self {
            DragPayload::Catalog { items } => {
                for item in items {
                    push(item, None);
                }
            }
            DragPayload::LayoutSingle { item, source } => push(item, Some(source)),
            DragPayload::LayoutGroup { items, sources, .. } => {
                for (i, item) in items.iter().enumerate() {
                    push(item, sources.get(i));
                }
            }
        }

        out
    }
}
