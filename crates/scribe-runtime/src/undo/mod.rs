#![forbid(unsafe_code)]

//! Snapshot history.
//!
//! - [`DocumentSnapshot`]: immutable full-content capture
//! - [`SnapshotStore`]: bounded undo/redo stacks with debounced capture

pub mod snapshot;
pub mod snapshot_store;

pub use snapshot::DocumentSnapshot;
pub use snapshot_store::{HistoryStatus, SnapshotStore};
