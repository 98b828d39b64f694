use std::collections::{BTreeSet, HashSet};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::slot::ItemId;

/// Lookup of the item identifiers the resolvers accept.
///
/// Unknown identifiers in a drag payload are filtered out silently.
pub trait ItemCatalog {
    fn contains(&self, item: &str) -> bool;
}

impl<C: ItemCatalog + ?Sized> ItemCatalog for &C {
    fn contains(&self, item: &str) -> bool {
        (*self).contains(item)
    }
}

impl ItemCatalog for HashSet<ItemId> {
    fn contains(&self, item: &str) -> bool {
        HashSet::contains(self, item)
    }
}

impl ItemCatalog for BTreeSet<ItemId> {
    fn contains(&self, item: &str) -> bool {
        BTreeSet::contains(self, item)
    }
}

/// Metadata about a catalog item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub name: String,
    pub category: Option<String>,
}

impl ItemInfo {
    pub fn new(name: impl Into<String>) -> Self {
        ItemInfo {
            name: name.into(),
            category: None,
        }
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// An in-memory catalog that remembers insertion order.
///
/// Category drops place items in the order they were registered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    items: IndexMap<ItemId, ItemInfo>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an item, replacing any previous metadata for the id.
    pub fn insert(&mut self, id: impl Into<ItemId>, info: ItemInfo) {
        self.items.insert(id.into(), info);
    }

    pub fn get(&self, id: &str) -> Option<&ItemInfo> {
        self.items.get(id)
    }

    /// Item ids of a category, in registration order.
    pub fn category(&self, category: &str) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|(_, info)| info.category.as_deref() == Some(category))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Distinct category names in order of first appearance.
    pub fn categories(&self) -> IndexSet<&str> {
        self.items
            .values()
            .filter_map(|info| info.category.as_deref())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &ItemInfo)> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ItemCatalog for Catalog {
    fn contains(&self, item: &str) -> bool {
        self.items.contains_key(item)
    }
}

impl<I: Into<ItemId>> FromIterator<(I, ItemInfo)> for Catalog {
    fn from_iter<T: IntoIterator<Item = (I, ItemInfo)>>(iter: T) -> Self {
        Catalog {
            items: iter.into_iter().map(|(id, info)| (id.into(), info)).collect(),
        }
    }
}
