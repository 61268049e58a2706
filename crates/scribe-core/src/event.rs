#![forbid(unsafe_code)]

//! Notifications emitted by an editing surface.

use crate::command::FormatCommand;
use crate::selection::SelectionState;

/// Event delivered to listeners of an editing surface.
///
/// For a single mutation the order is: [`FormatChanged`](Self::FormatChanged)
/// (when a command caused it), then [`ContentChanged`](Self::ContentChanged).
/// History capture happens later on its own debounced cadence and is not an
/// event; [`HistoryChanged`](Self::HistoryChanged) reports the resulting
/// availability of undo/redo when it changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// Raw content mutation, not debounced. Payload is the serialized content.
    ContentChanged(String),
    /// A formatting command was applied.
    FormatChanged(FormatCommand),
    /// The selection moved.
    SelectionChanged(Option<SelectionState>),
    /// Undo/redo availability after a history transition.
    HistoryChanged { can_undo: bool, can_redo: bool },
}

impl EditorEvent {
    /// Stable label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ContentChanged(_) => "content_changed",
            Self::FormatChanged(_) => "format_changed",
            Self::SelectionChanged(_) => "selection_changed",
            Self::HistoryChanged { .. } => "history_changed",
        }
    }
}
