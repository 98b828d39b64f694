//! Directional deltas between two values of the same type.
//!
//! A delta records both sides of every change so it can be checked against
//! the state it is applied to. For any `a` and `b`:
//!
//! ```text
//! a.apply(a.diff(b)) == b
//! b.apply(b.diff(a)) == a
//! ```
//!
//! Records get their `Diff` impl from `#[derive(Diff)]`, which emits one
//! optional delta per field. Fields marked `#[diff(scalar)]` are compared as
//! a whole (optionally with `eq = path::to::fn`); other fields delegate to
//! their own `Diff` impl, e.g. maps diffed entry by entry.

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Error type for applying a delta to the wrong state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeltaError {
    #[error("value does not match the delta's starting point")]
    ValueMismatch,
    #[error("entry {0} is missing")]
    MissingKey(String),
    #[error("entry {0} already exists")]
    UnexpectedKey(String),
    #[error("field `{field}`: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: Box<DeltaError>,
    },
}

impl DeltaError {
    /// Attributes the error to a record field.
    pub fn in_field(self, field: &'static str) -> Self {
        DeltaError::Field {
            field,
            source: Box::new(self),
        }
    }
}

/// A value that can describe its difference to another value.
pub trait Diff {
    type Delta: Clone + Debug + PartialEq + Serialize + DeserializeOwned;

    /// Returns the delta leading from `self` to `target`, or None if they
    /// are equal.
    fn diff(&self, target: &Self) -> Option<Self::Delta>;

    /// Applies a delta computed from a value equal to `self`.
    ///
    /// On error `self` is left untouched.
    fn apply(&mut self, delta: &Self::Delta) -> Result<(), DeltaError>;
}

/// Whole-value replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change<T> {
    pub from: T,
    pub to: T,
}

impl<T: Clone> Change<T> {
    /// Builds a change unless `eq` considers the two values equal.
    pub fn between(from: &T, to: &T, eq: impl Fn(&T, &T) -> bool) -> Option<Self> {
        if eq(from, to) {
            None
        } else {
            Some(Change {
                from: from.clone(),
                to: to.clone(),
            })
        }
    }

    pub fn apply_to(&self, value: &mut T, eq: impl Fn(&T, &T) -> bool) -> Result<(), DeltaError> {
        if !eq(value, &self.from) {
            return Err(DeltaError::ValueMismatch);
        }
        *value = self.to.clone();
        Ok(())
    }

    pub fn inverse(&self) -> Self {
        Change {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

macro_rules! impl_scalar_diff {
    ($($t:ty),* $(,)?) => {
        $(
            impl Diff for $t {
                type Delta = Change<$t>;

                fn diff(&self, target: &Self) -> Option<Self::Delta> {
                    Change::between(self, target, <$t as PartialEq>::eq)
                }

                fn apply(&mut self, delta: &Self::Delta) -> Result<(), DeltaError> {
                    delta.apply_to(self, <$t as PartialEq>::eq)
                }
            }
        )*
    };
}

impl_scalar_diff!(bool, u8, u16, u32, u64, i32, i64, String);

/// Entry-level difference between two ordered maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDelta<K: Ord, V> {
    #[serde(default = "BTreeMap::new", skip_serializing_if = "BTreeMap::is_empty")]
    pub added: BTreeMap<K, V>,
    #[serde(default = "BTreeMap::new", skip_serializing_if = "BTreeMap::is_empty")]
    pub removed: BTreeMap<K, V>,
    #[serde(default = "BTreeMap::new", skip_serializing_if = "BTreeMap::is_empty")]
    pub changed: BTreeMap<K, Change<V>>,
}

impl<K: Ord, V> MapDelta<K, V> {
    pub fn new() -> Self {
        MapDelta {
            added: BTreeMap::new(),
            removed: BTreeMap::new(),
            changed: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Number of touched entries.
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }
}

impl<K: Ord, V> Default for MapDelta<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, V: Clone> MapDelta<K, V> {
    pub fn inverse(&self) -> Self {
        MapDelta {
            added: self.removed.clone(),
            removed: self.added.clone(),
            changed: self
                .changed
                .iter()
                .map(|(k, c)| (k.clone(), c.inverse()))
                .collect(),
        }
    }
}

impl<K, V> Diff for BTreeMap<K, V>
where
    K: Ord + Clone + Debug + Serialize + DeserializeOwned,
    V: Clone + PartialEq + Debug + Serialize + DeserializeOwned,
{
    type Delta = MapDelta<K, V>;

    fn diff(&self, target: &Self) -> Option<Self::Delta> {
        let mut delta = MapDelta::new();

        for (key, value) in self {
            match target.get(key) {
                None => {
                    delta.removed.insert(key.clone(), value.clone());
                }
                Some(next) if next != value => {
                    delta.changed.insert(
                        key.clone(),
                        Change {
                            from: value.clone(),
                            to: next.clone(),
                        },
                    );
                }
                Some(_) => {}
            }
        }
        for (key, value) in target {
            if !self.contains_key(key) {
                delta.added.insert(key.clone(), value.clone());
            }
        }

        if delta.is_empty() { None } else { Some(delta) }
    }

    fn apply(&mut self, delta: &Self::Delta) -> Result<(), DeltaError> {
        // Validate everything before touching the map.
        for (key, value) in &delta.removed {
            match self.get(key) {
                Some(current) if current == value => {}
                Some(_) => return Err(DeltaError::ValueMismatch),
                None => return Err(DeltaError::MissingKey(format!("{key:?}"))),
            }
        }
        for (key, change) in &delta.changed {
            match self.get(key) {
                Some(current) if *current == change.from => {}
                Some(_) => return Err(DeltaError::ValueMismatch),
                None => return Err(DeltaError::MissingKey(format!("{key:?}"))),
            }
        }
        for key in delta.added.keys() {
            if self.contains_key(key) && !delta.removed.contains_key(key) {
                return Err(DeltaError::UnexpectedKey(format!("{key:?}")));
            }
        }

        for key in delta.removed.keys() {
            self.remove(key);
        }
        for (key, change) in &delta.changed {
            self.insert(key.clone(), change.to.clone());
        }
        for (key, value) in &delta.added {
            self.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}
