#![forbid(unsafe_code)]

//! Scribe public facade crate.
//!
//! Scribe is the editing core of a rich-text surface: it tracks selections in
//! a structure-independent offset space, keeps a bounded snapshot undo/redo
//! history with debounced capture, and routes a closed set of formatting
//! commands to the host document engine. The host owns the document; Scribe
//! reaches it only through the [`DocumentSurface`] trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use scribe::prelude::*;
//! use web_time::{Duration, Instant};
//!
//! let t0 = Instant::now();
//! let mut editor = ChangeCoordinator::new(host_surface, HistoryConfig::default(), t0);
//! editor.subscribe(|event| println!("{}", event.kind()));
//!
//! // The host reports a keystroke, then its event loop ticks.
//! editor.on_content_mutated(t0);
//! editor.tick(t0 + Duration::from_millis(500));
//!
//! editor.execute(&CommandRequest::new(FormatCommand::Bold), t0);
//! assert!(editor.undo(t0));
//! ```

pub mod error;

// --- Core re-exports -------------------------------------------------------

pub use scribe_core::{
    COMMANDS, CommandError, CommandRequest, CommandSpec, DocumentSurface, DocumentTree,
    EditorEvent, FormatCommand, HistoryDirection, HistoryError, NativeSelection, NodeId, Position,
    Route, SelectionError, SelectionState, SelectionTracker, ValueKind,
};

// --- Runtime re-exports ----------------------------------------------------

pub use scribe_runtime::{
    ChangeCoordinator, CommandExecutor, CommandOutcome, ConfigError, CoordinatorState,
    DebounceTimer, DocumentSnapshot, EditorConfig, HistoryConfig, HistoryStatus, ListenerId,
    SnapshotStore, TimerHandle,
};

// --- Errors ---------------------------------------------------------------

pub use error::{DegradationAction, Error, Result};

pub mod prelude {
    pub use crate::{
        ChangeCoordinator, CommandOutcome, CommandRequest, DocumentSurface, DocumentTree,
        EditorConfig, EditorEvent, Error, FormatCommand, HistoryConfig, Result, SelectionState,
    };

    pub use crate::{core, runtime};
}

pub use scribe_core as core;
pub use scribe_runtime as runtime;

#[cfg(feature = "harness")]
pub use scribe_harness as harness;
