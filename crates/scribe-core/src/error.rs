#![forbid(unsafe_code)]

//! Domain errors for the editing core.
//!
//! None of these ever interrupt editing. Each public operation has a
//! degraded form (`Option`, `bool`, or a no-op outcome); the fallible
//! `try_*` variants return these errors for callers that want the reason.

use thiserror::Error;

use crate::command::FormatCommand;
use crate::document::NodeId;

/// Selection queried or restored outside the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no active selection")]
    NoSelection,

    #[error("selection endpoint {node} is not attached to the document")]
    Detached { node: NodeId },

    #[error("offset {offset} is outside the document (length {len})")]
    OutOfRange { offset: usize, len: usize },
}

/// A formatting command the host could not perform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unsupported command: {name}")]
    Unsupported { name: String },

    #[error("command `{command}` requires a value")]
    MissingValue { command: FormatCommand },

    #[error("host refused command `{command}`")]
    Refused { command: FormatCommand },

    #[error("no selection to apply `{command}` to")]
    NoSelection { command: FormatCommand },
}

impl CommandError {
    #[must_use]
    pub fn unsupported(name: impl Into<String>) -> Self {
        Self::Unsupported { name: name.into() }
    }
}

/// Which history stack an operation needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

impl std::fmt::Display for HistoryDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undo => write!(f, "undo"),
            Self::Redo => write!(f, "redo"),
        }
    }
}

/// Undo or redo requested with an empty stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("nothing to {direction}")]
    Exhausted { direction: HistoryDirection },
}

impl HistoryError {
    #[must_use]
    pub const fn exhausted(direction: HistoryDirection) -> Self {
        Self::Exhausted { direction }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_error_messages() {
        let err = SelectionError::OutOfRange { offset: 12, len: 5 };
        assert_eq!(err.to_string(), "offset 12 is outside the document (length 5)");

        let err = SelectionError::Detached {
            node: NodeId::new(7),
        };
        assert!(err.to_string().contains("#7"));
    }

    #[test]
    fn command_error_names_the_command() {
        let err = CommandError::MissingValue {
            command: FormatCommand::ForeColor,
        };
        assert_eq!(err.to_string(), "command `foreColor` requires a value");

        let err = CommandError::unsupported("sparkle");
        assert_eq!(err.to_string(), "unsupported command: sparkle");
    }

    #[test]
    fn history_error_direction() {
        assert_eq!(
            HistoryError::exhausted(HistoryDirection::Undo).to_string(),
            "nothing to undo"
        );
        assert_eq!(
            HistoryError::exhausted(HistoryDirection::Redo).to_string(),
            "nothing to redo"
        );
    }
}
