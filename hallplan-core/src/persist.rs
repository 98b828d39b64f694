//! Encoding of planner sessions into store records.
//!
//! A session is two records: the live snapshot and the undo history. The
//! snapshot is authoritative; a history that fails to decode, fails to
//! replay, or belongs to a different snapshot is discarded and a fresh log
//! is started.

use serde::{Deserialize, Serialize};

use crate::codec::{self, DecodeError};
use crate::history::{History, HistoryEntry, HistoryError};
use crate::key::ContentKey;
use crate::layout::ConfigError;
use crate::planner::Planner;
use crate::settings::PlannerSettings;
use crate::snapshot::{Snapshot, SnapshotDelta};
use crate::store::Store;

pub const SNAPSHOT_VERSION: u32 = 1;
pub const HISTORY_VERSION: u32 = 1;

pub const SNAPSHOT_RECORD: &str = "snapshot";
pub const HISTORY_RECORD: &str = "history";

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("cannot decode record: {0}")]
    Decode(#[from] DecodeError),
    #[error("unsupported {record} format version {found}, expected {expected}")]
    Version {
        record: &'static str,
        found: u32,
        expected: u32,
    },
    #[error("stored layout is invalid: {0}")]
    Config(#[from] ConfigError),
    #[error("stored history does not replay: {0}")]
    History(#[from] HistoryError),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError<E> {
    #[error("store error: {0}")]
    Store(#[source] E),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// On-disk form of a snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedSnapshot<S> {
    pub version: u32,
    pub snapshot: S,
}

/// On-disk form of an undo history.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedHistory<S, E> {
    pub version: u32,
    pub cursor: usize,
    pub base_key: ContentKey,
    pub entries: E,
    pub current: S,
}

#[derive(Deserialize)]
struct Header {
    version: u32,
}

fn check_version(data: &[u8], record: &'static str, expected: u32) -> Result<(), PersistError> {
    let header: Header = codec::from_bytes(data)?;
    if header.version != expected {
        return Err(PersistError::Version {
            record,
            found: header.version,
            expected,
        });
    }
    Ok(())
}

pub fn encode_snapshot(snapshot: &Snapshot) -> Vec<u8> {
    codec::to_bytes(&PersistedSnapshot {
        version: SNAPSHOT_VERSION,
        snapshot,
    })
}

/// Decodes and sanitizes a stored snapshot.
///
/// Assignments to slots outside the layout, repeated items and names of
/// unknown halls are dropped.
pub fn decode_snapshot(data: &[u8]) -> Result<Snapshot, PersistError> {
    check_version(data, SNAPSHOT_RECORD, SNAPSHOT_VERSION)?;
    let persisted: PersistedSnapshot<Snapshot> = codec::from_bytes(data)?;
    let mut snapshot = persisted.snapshot;
    snapshot.config.validate()?;

    let pruned = snapshot.retain_valid(&snapshot.slot_space());
    if pruned > 0 {
        log::info!("dropped {pruned} invalid entries while decoding snapshot");
    }
    Ok(snapshot)
}

pub fn encode_history(history: &History<Snapshot>) -> Vec<u8> {
    codec::to_bytes(&PersistedHistory {
        version: HISTORY_VERSION,
        cursor: history.cursor(),
        base_key: history.base_key(),
        entries: history.entries(),
        current: history.current(),
    })
}

/// Decodes a stored history and replays it to prove it is consistent.
pub fn decode_history(data: &[u8], cap: usize) -> Result<History<Snapshot>, PersistError> {
    check_version(data, HISTORY_RECORD, HISTORY_VERSION)?;
    let persisted: PersistedHistory<Snapshot, Vec<HistoryEntry<SnapshotDelta>>> =
        codec::from_bytes(data)?;
    Ok(History::restore(
        persisted.current,
        persisted.base_key,
        persisted.entries,
        persisted.cursor,
        cap,
    )?)
}

/// Writes the live snapshot and its history.
pub fn save_session<S: Store>(store: &S, planner: &Planner) -> Result<(), SessionError<S::Error>> {
    store
        .put(SNAPSHOT_RECORD, &encode_snapshot(planner.snapshot()))
        .map_err(SessionError::Store)?;
    store
        .put(HISTORY_RECORD, &encode_history(planner.history()))
        .map_err(SessionError::Store)?;
    Ok(())
}

/// Saves the session if autosave is enabled. Failures are logged and
/// otherwise ignored.
pub fn autosave<S: Store>(store: &S, planner: &Planner) {
    if !planner.settings().autosave {
        return;
    }
    if let Err(err) = save_session(store, planner) {
        log::warn!("autosave failed: {err}");
    }
}

/// Removes both session records.
pub fn clear_session<S: Store>(store: &S) -> Result<(), S::Error> {
    store.delete(SNAPSHOT_RECORD)?;
    store.delete(HISTORY_RECORD)
}

/// Loads the stored session.
///
/// Returns None when no snapshot has been saved. A snapshot that cannot be
/// decoded is an error; a bad history only costs the undo log.
pub fn restore_session<S: Store>(
    store: &S,
    settings: PlannerSettings,
) -> Result<Option<Planner>, SessionError<S::Error>> {
    let Some(bytes) = store.get(SNAPSHOT_RECORD).map_err(SessionError::Store)? else {
        return Ok(None);
    };
    let snapshot = decode_snapshot(&bytes)?;

    let history = match store.get(HISTORY_RECORD).map_err(SessionError::Store)? {
        Some(bytes) => match decode_history(&bytes, settings.history_cap()) {
            Ok(history) if history.key_at_cursor() == snapshot.key() => Some(history),
            Ok(_) => {
                log::info!("stored history belongs to another snapshot, starting fresh");
                None
            }
            Err(err) => {
                log::info!("discarding stored history: {err}");
                None
            }
        },
        None => None,
    };

    let planner = match history {
        Some(history) => {
            log::info!(
                "restored session with {} history entries",
                history.len()
            );
            Planner::from_history(history, settings)
        }
        None => Planner::from_snapshot(snapshot, settings).map_err(PersistError::from)?,
    };
    Ok(Some(planner))
}
