#![forbid(unsafe_code)]

//! Scribe runtime: history, commands and change coordination.
//!
//! # Key Components
//!
//! - [`SnapshotStore`] - bounded snapshot undo/redo with debounced capture
//! - [`DebounceTimer`] - single-shot cancellable deadline
//! - [`CommandExecutor`] - best-effort dispatch of formatting commands
//! - [`ChangeCoordinator`] - owns a surface and wires the above together
//! - [`EditorConfig`] - history tuning from files or the environment
//!
//! Time is always passed in as an [`Instant`](web_time::Instant). Nothing
//! here spawns threads or reads a clock behind the caller's back.

pub mod config;
pub mod coordinator;
pub mod executor;
pub mod timer;
pub mod undo;

pub use config::{
    ConfigError, DEFAULT_MAX_STACK_SIZE, DEFAULT_SNAPSHOT_DELAY_MS, EditorConfig, HistoryConfig,
    MAX_SNAPSHOT_DELAY_MS,
};
pub use coordinator::{ChangeCoordinator, CoordinatorState, ListenerId};
pub use executor::{CommandExecutor, CommandOutcome};
pub use timer::{DebounceTimer, TimerHandle};
pub use undo::{DocumentSnapshot, HistoryStatus, SnapshotStore};
