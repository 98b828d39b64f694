//! Hallplan is a slot-assignment engine for storage hall layouts.
//!
//! Core concepts:
//! - **Slot**: An addressable position in a hall that holds at most one item
//! - **Slot space**: Every valid slot of a layout, in fill order
//! - **Drag payload**: Items picked up from the catalog or from the layout
//! - **Snapshot**: The complete serializable state of a planner
//! - **Delta**: The per-field difference between two snapshots, used for undo
//! - **Planner**: Owns the live snapshot and its undo history
//!
//! # Example
//!
//! ```
//! use hallplan_core::{
//!     Catalog, DragPayload, DropOutcome, FillDirection, GridProjector, HallConfig, ItemInfo,
//!     LayoutConfig, Planner, PlannerSettings, SectionConfig, Side, SlotId,
//! };
//!
//! let config = LayoutConfig::new(vec![
//!     HallConfig::new("Main").with_side(Side::Left, vec![SectionConfig::rows(4)]),
//! ]);
//! let catalog: Catalog = [("crate-1", ItemInfo::new("Crate 1"))].into_iter().collect();
//! let projector = GridProjector::new(&config);
//!
//! let mut planner = Planner::new(config, FillDirection::Row, PlannerSettings::default())?;
//! let slot = SlotId::plain(0, Side::Left, 0, 2);
//!
//! let outcome = planner.drop_payload(&slot, &DragPayload::item("crate-1"), &catalog, &projector);
//! assert!(matches!(outcome, DropOutcome::Applied { .. }));
//! assert_eq!(planner.item_slot("crate-1"), Some(&slot));
//!
//! planner.undo();
//! assert_eq!(planner.item_slot("crate-1"), None);
//! # Ok::<(), hallplan_core::ConfigError>(())
//! ```
//!
//! # Canonical encoding
//!
//! Content keys hash the CBOR encoding of a value. Every map in a snapshot is
//! a `BTreeMap`, so equal snapshots always encode to the same bytes.

extern crate self as hallplan_core;

mod catalog;
pub mod codec;
mod delta;
mod geometry;
mod history;
mod key;
mod layout;
mod payload;
mod persist;
mod placement;
mod planner;
mod resolve;
mod settings;
mod slot;
mod snapshot;
mod store;
mod swap;

pub use catalog::{Catalog, ItemCatalog, ItemInfo};
pub use delta::{Change, DeltaError, Diff, MapDelta};
pub use geometry::{GeometryProjector, GridProjector, LANDING_TOLERANCE, Point};
pub use hallplan_derive::Diff;
pub use history::{History, HistoryEntry, HistoryError};
pub use key::ContentKey;
pub use layout::{
    ConfigError, FillDirection, HallConfig, LayoutConfig, SectionConfig, SectionKind, SideConfig,
    SlotSpace, ordered_slots,
};
pub use payload::{DragPayload, Incoming, Origin};
pub use persist::{
    HISTORY_RECORD, HISTORY_VERSION, PersistError, PersistedHistory, PersistedSnapshot,
    SNAPSHOT_RECORD, SNAPSHOT_VERSION, SessionError, autosave, clear_session, decode_history,
    decode_snapshot, encode_history, encode_snapshot, restore_session, save_session,
};
pub use placement::{DropContext, Placement, resolve_placements};
pub use planner::{DropOutcome, Planner};
pub use resolve::DropPlan;
pub use settings::{DEFAULT_HISTORY_CAP, PlannerSettings, SettingsError, load_settings};
pub use slot::{ItemId, Side, SlotAddress, SlotId};
pub use snapshot::{Assignments, Snapshot, SnapshotDelta, hall_key};
pub use store::{MemoryStore, Store};
pub use swap::resolve_swaps;
