#![forbid(unsafe_code)]

//! Scribe core: the boundary between the editing engine and the host document.
//!
//! # Key Components
//!
//! - [`DocumentSurface`] / [`DocumentTree`] - capabilities the host injects
//! - [`SelectionTracker`] - selection in structure-independent char offsets
//! - [`FormatCommand`] / [`CommandRequest`] - closed command set and routing
//! - [`EditorEvent`] - notifications emitted to listeners
//!
//! # Role in Scribe
//! `scribe-core` has no notion of time or history. `scribe-runtime` builds the
//! snapshot history, command executor, and change coordinator on top of it.

pub mod command;
pub mod document;
pub mod error;
pub mod event;
pub mod selection;

pub use command::{COMMANDS, CommandRequest, CommandSpec, FormatCommand, Route, ValueKind};
pub use document::{DocumentSurface, DocumentTree, NativeSelection, NodeId, Position};
pub use error::{CommandError, HistoryDirection, HistoryError, SelectionError};
pub use event::EditorEvent;
pub use selection::{
    SelectionState, SelectionTracker, TextNodes, offset_to_position, position_to_offset,
    text_between, text_len,
};
