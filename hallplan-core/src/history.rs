//! Linear undo/redo log of snapshot deltas.
//!
//! [`History`] owns the live state and a single-branch list of entries. Each
//! entry carries the forward and backward delta of one edit plus the content
//! key of the state it leads to. `cursor` counts the entries currently
//! applied:
//!
//! ```text
//! record(s3)
//!   base ── e1 ── e2 ── e3
//!                       ^ cursor = 3
//!
//! undo() x2
//!   base ── e1 ── e2 ── e3
//!           ^ cursor = 1
//!
//! record(s4)   entries after the cursor are discarded
//!   base ── e1 ── e4
//!                 ^ cursor = 2
//! ```
//!
//! When the log grows past its cap the oldest entry is evicted and its key
//! becomes the new base key, so the key at the cursor is always known.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::delta::{DeltaError, Diff};
use crate::key::ContentKey;

/// One recorded edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry<D> {
    pub forward: D,
    pub backward: D,
    /// Content key of the state after `forward`.
    pub key: ContentKey,
}

/// Error type for rebuilding a history from stored parts.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("cursor {cursor} is past the end of {len} entries")]
    CursorOutOfRange { cursor: usize, len: usize },
    #[error("content key mismatch at position {index}")]
    KeyMismatch { index: usize },
    #[error("entry {index} does not replay: {source}")]
    Delta {
        index: usize,
        #[source]
        source: DeltaError,
    },
}

/// Bounded undo/redo log over states of type `S`.
#[derive(Debug, Clone)]
pub struct History<S: Diff> {
    current: S,
    base_key: ContentKey,
    entries: VecDeque<HistoryEntry<S::Delta>>,
    cursor: usize,
    cap: usize,
}

impl<S> History<S>
where
    S: Diff + Clone + Serialize,
{
    /// Starts an empty log over `current`. A cap below 1 is raised to 1.
    pub fn new(current: S, cap: usize) -> Self {
        History {
            base_key: ContentKey::of(&current),
            current,
            entries: VecDeque::new(),
            cursor: 0,
            cap: cap.max(1),
        }
    }

    /// Rebuilds a log from stored parts.
    ///
    /// Every entry is replayed from `current` back to the base, forward to
    /// the end and back to the cursor, and the content key is checked at
    /// each step. A log longer than `cap` loses its oldest entries first,
    /// then its redo tail.
    pub fn restore(
        current: S,
        base_key: ContentKey,
        entries: impl IntoIterator<Item = HistoryEntry<S::Delta>>,
        cursor: usize,
        cap: usize,
    ) -> Result<Self, HistoryError> {
        let mut history = History {
            current,
            base_key,
            entries: entries.into_iter().collect(),
            cursor,
            cap: cap.max(1),
        };
        history.verify()?;

        while history.entries.len() > history.cap && history.cursor > 0 {
            history.evict_oldest();
        }
        history.entries.truncate(history.cap);

        Ok(history)
    }

    fn verify(&self) -> Result<(), HistoryError> {
        let len = self.entries.len();
        if self.cursor > len {
            return Err(HistoryError::CursorOutOfRange {
                cursor: self.cursor,
                len,
            });
        }
        if ContentKey::of(&self.current) != self.key_at(self.cursor) {
            return Err(HistoryError::KeyMismatch { index: self.cursor });
        }

        let mut state = self.current.clone();
        for index in (0..self.cursor).rev() {
            self.step(&mut state, index, false)?;
        }
        for index in 0..len {
            self.step(&mut state, index, true)?;
        }
        for index in (self.cursor..len).rev() {
            self.step(&mut state, index, false)?;
        }
        Ok(())
    }

    fn step(&self, state: &mut S, index: usize, forward: bool) -> Result<(), HistoryError> {
        let entry = &self.entries[index];
        let (delta, position) = if forward {
            (&entry.forward, index + 1)
        } else {
            (&entry.backward, index)
        };
        state
            .apply(delta)
            .map_err(|source| HistoryError::Delta { index, source })?;
        if ContentKey::of(state) != self.key_at(position) {
            return Err(HistoryError::KeyMismatch { index: position });
        }
        Ok(())
    }

    /// Key of the state reached after `position` entries.
    fn key_at(&self, position: usize) -> ContentKey {
        match position {
            0 => self.base_key,
            n => self.entries[n - 1].key,
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(evicted) = self.entries.pop_front() {
            self.base_key = evicted.key;
            self.cursor = self.cursor.saturating_sub(1);
        }
    }

    /// Makes `next` the live state.
    ///
    /// Returns false without touching the log when `next` has the same
    /// content key as the state at the cursor.
    pub fn record(&mut self, next: S) -> bool {
        let key = ContentKey::of(&next);
        if key == self.key_at_cursor() {
            return false;
        }
        let (Some(forward), Some(backward)) = (self.current.diff(&next), next.diff(&self.current))
        else {
            return false;
        };

        self.entries.truncate(self.cursor);
        self.entries.push_back(HistoryEntry {
            forward,
            backward,
            key,
        });
        self.cursor += 1;
        self.current = next;

        while self.entries.len() > self.cap {
            self.evict_oldest();
        }
        log::debug!("recorded {key}, {} of {} entries", self.cursor, self.entries.len());
        true
    }

    /// Steps back one entry. None at the oldest entry.
    pub fn undo(&mut self) -> Option<&S> {
        let index = self.cursor.checked_sub(1)?;
        let entry = &self.entries[index];
        if let Err(err) = self.current.apply(&entry.backward) {
            log::warn!("undo of entry {index} failed: {err}");
            return None;
        }
        self.cursor = index;
        Some(&self.current)
    }

    /// Steps forward one entry. None at the newest entry.
    pub fn redo(&mut self) -> Option<&S> {
        let entry = self.entries.get(self.cursor)?;
        if let Err(err) = self.current.apply(&entry.forward) {
            log::warn!("redo of entry {} failed: {err}", self.cursor);
            return None;
        }
        self.cursor += 1;
        Some(&self.current)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn current(&self) -> &S {
        &self.current
    }

    pub fn key_at_cursor(&self) -> ContentKey {
        self.key_at(self.cursor)
    }

    pub fn base_key(&self) -> ContentKey {
        self.base_key
    }

    pub fn entries(&self) -> &VecDeque<HistoryEntry<S::Delta>> {
        &self.entries
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    type State = BTreeMap<String, u32>;

    fn state(pairs: &[(&str, u32)]) -> State {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn record_undo_redo() {
        let mut h = History::new(state(&[]), 10);
        assert!(h.record(state(&[("a", 1)])));
        assert!(h.record(state(&[("a", 2)])));

        assert_eq!(h.undo(), Some(&state(&[("a", 1)])));
        assert_eq!(h.undo(), Some(&state(&[])));
        assert_eq!(h.undo(), None);
        assert!(!h.can_undo());

        assert_eq!(h.redo(), Some(&state(&[("a", 1)])));
        assert_eq!(h.redo(), Some(&state(&[("a", 2)])));
        assert_eq!(h.redo(), None);
        assert!(!h.can_redo());
    }

    #[test]
    fn equal_state_is_not_recorded() {
        let mut h = History::new(state(&[("a", 1)]), 10);
        assert!(!h.record(state(&[("a", 1)])));
        assert!(h.is_empty());
    }

    #[test]
    fn record_after_undo_discards_redo() {
        let mut h = History::new(state(&[]), 10);
        h.record(state(&[("a", 1)]));
        h.record(state(&[("a", 2)]));
        h.undo();
        h.record(state(&[("b", 1)]));
        assert_eq!(h.len(), 2);
        assert!(!h.can_redo());
        assert_eq!(h.undo(), Some(&state(&[("a", 1)])));
    }

    #[test]
    fn cap_evicts_oldest() {
        let mut h = History::new(state(&[]), 3);
        for v in 1..=5 {
            h.record(state(&[("a", v)]));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.cursor(), 3);
        assert_eq!(h.base_key(), ContentKey::of(&state(&[("a", 2)])));

        while h.undo().is_some() {}
        assert_eq!(h.current(), &state(&[("a", 2)]));
        assert_eq!(h.key_at_cursor(), h.base_key());
    }

    #[test]
    fn cap_is_at_least_one() {
        let mut h = History::new(state(&[]), 0);
        h.record(state(&[("a", 1)]));
        h.record(state(&[("a", 2)]));
        assert_eq!(h.cap(), 1);
        assert_eq!(h.len(), 1);
        assert_eq!(h.undo(), Some(&state(&[("a", 1)])));
    }

    #[test]
    fn restore_round_trips() {
        let mut h = History::new(state(&[]), 10);
        h.record(state(&[("a", 1)]));
        h.record(state(&[("a", 2)]));
        h.record(state(&[("a", 3)]));
        h.undo();

        let restored = History::restore(
            h.current().clone(),
            h.base_key(),
            h.entries().iter().cloned(),
            h.cursor(),
            10,
        )
        .unwrap();
        assert_eq!(restored.cursor(), 2);
        assert!(restored.can_redo());
    }

    #[test]
    fn restore_rejects_bad_cursor() {
        let h = History::new(state(&[]), 10);
        let err = History::restore(state(&[]), h.base_key(), Vec::new(), 1, 10).unwrap_err();
        assert!(matches!(err, HistoryError::CursorOutOfRange { cursor: 1, len: 0 }));
    }

    #[test]
    fn restore_rejects_foreign_state() {
        let mut h = History::new(state(&[]), 10);
        h.record(state(&[("a", 1)]));
        let err = History::restore(
            state(&[("z", 9)]),
            h.base_key(),
            h.entries().iter().cloned(),
            1,
            10,
        )
        .unwrap_err();
        assert!(matches!(err, HistoryError::KeyMismatch { index: 1 }));
    }

    #[test]
    fn restore_rejects_corrupt_delta() {
        let mut h = History::new(state(&[]), 10);
        h.record(state(&[("a", 1)]));
        h.record(state(&[("a", 2)]));
        let mut entries: Vec<_> = h.entries().iter().cloned().collect();
        entries[0].backward = entries[1].backward.clone();

        let err = History::restore(h.current().clone(), h.base_key(), entries, 2, 10).unwrap_err();
        assert!(matches!(err, HistoryError::Delta { index: 0, .. }));
    }

    #[test]
    fn restore_trims_to_cap() {
        let mut h = History::new(state(&[]), 10);
        for v in 1..=4 {
            h.record(state(&[("a", v)]));
        }
        h.undo();

        let restored = History::restore(
            h.current().clone(),
            h.base_key(),
            h.entries().iter().cloned(),
            h.cursor(),
            2,
        )
        .unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.cursor(), 1);
        assert_eq!(restored.base_key(), ContentKey::of(&state(&[("a", 2)])));
        assert_eq!(restored.current(), &state(&[("a", 3)]));
    }
}
