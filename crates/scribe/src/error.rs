#![forbid(unsafe_code)]

//! Scribe error model and graceful degradation.
//!
//! # Design Principles
//!
//! 1. **Editing never stops.** Every public editing operation has a degraded
//!    form (`Option`, `bool`, [`CommandOutcome::Ignored`]) and the domain
//!    errors only exist for callers that ask for the reason.
//! 2. **Domain-specific errors.** Each subsystem keeps its own typed error;
//!    [`Error`] wraps them for applications that want a single type.
//! 3. **Explicit degradation.** Every variant maps to a
//!    [`DegradationAction`] describing what the engine does instead.
//!
//! [`CommandOutcome::Ignored`]: scribe_runtime::CommandOutcome::Ignored

use std::fmt;

use scribe_core::{CommandError, HistoryError, SelectionError};
use scribe_runtime::ConfigError;
use thiserror::Error;

// ── Unified Error ───────────────────────────────────────────────────────

/// Top-level error type for Scribe applications.
#[derive(Debug, Error)]
pub enum Error {
    /// Selection queried or restored outside the document.
    #[error(transparent)]
    Selection(#[from] SelectionError),
    /// Formatting command the host could not perform.
    #[error(transparent)]
    Command(#[from] CommandError),
    /// Undo or redo with nothing to step to.
    #[error(transparent)]
    History(#[from] HistoryError),
    /// Configuration rejected before the engine was built.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Standard result type for Scribe APIs.
pub type Result<T> = std::result::Result<T, Error>;

// ── Graceful Degradation ────────────────────────────────────────────────

/// What the engine does in place of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradationAction {
    /// Report "no selection" (`None`).
    ReturnNone,
    /// Clamp offsets to the document and carry on.
    ClampSelection,
    /// Treat the command as a no-op.
    NoOp,
    /// Report `false` from undo/redo.
    ReturnFalse,
    /// Refuse to build the engine.
    RejectConfig,
}

impl Error {
    /// The degraded behavior that stands in for this error.
    #[must_use]
    pub fn degradation(&self) -> DegradationAction {
        match self {
            Self::Selection(SelectionError::NoSelection | SelectionError::Detached { .. }) => {
                DegradationAction::ReturnNone
            }
            Self::Selection(SelectionError::OutOfRange { .. }) => DegradationAction::ClampSelection,

            Self::Command(_) => DegradationAction::NoOp,

            Self::History(_) => DegradationAction::ReturnFalse,

            Self::Config(_) => DegradationAction::RejectConfig,
        }
    }

    /// Error type label for logs.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Selection(_) => "selection",
            Self::Command(_) => "command",
            Self::History(_) => "history",
            Self::Config(_) => "config",
        }
    }

    /// Whether editing continues past this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.degradation(), DegradationAction::RejectConfig)
    }
}

impl fmt::Display for DegradationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReturnNone => write!(f, "return_none"),
            Self::ClampSelection => write!(f, "clamp_selection"),
            Self::NoOp => write!(f, "no_op"),
            Self::ReturnFalse => write!(f, "return_false"),
            Self::RejectConfig => write!(f, "reject_config"),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────
