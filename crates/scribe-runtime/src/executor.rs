#![forbid(unsafe_code)]

//! Command executor: routes [`CommandRequest`]s to the host.
//!
//! Formatting is best-effort. Host capability varies, so every failure
//! (unknown command, missing value, no selection, host refusal) degrades to
//! [`CommandOutcome::Ignored`]. [`try_execute`](CommandExecutor::try_execute)
//! keeps the reason for callers that want it.
//!
//! History commands ([`FormatCommand::Undo`], [`FormatCommand::Redo`]) never
//! reach the host; the coordinator routes them to the snapshot store.

use scribe_core::{
    CommandError, CommandRequest, DocumentSurface, FormatCommand, Route, SelectionTracker,
};
use tracing::{debug, trace};

/// Result of executing a formatting command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Nothing happened: unsupported, missing value, no selection, or refused.
    Ignored,
    /// The host accepted the command but the content is unchanged.
    Applied,
    /// The content changed.
    Mutated,
}

impl CommandOutcome {
    /// Whether the host accepted the command.
    #[must_use]
    pub fn is_applied(self) -> bool {
        !matches!(self, Self::Ignored)
    }

    #[must_use]
    pub fn is_mutated(self) -> bool {
        matches!(self, Self::Mutated)
    }
}

/// Stateless dispatcher between the routing table and the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandExecutor;

impl CommandExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Apply `request` to the current selection, degrading every failure to
    /// [`CommandOutcome::Ignored`].
    pub fn execute<S: DocumentSurface + ?Sized>(
        &self,
        surface: &mut S,
        tracker: &mut SelectionTracker,
        request: &CommandRequest,
    ) -> CommandOutcome {
        match self.try_execute(surface, tracker, request) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(command = %request.command, error = %err, "command ignored");
                CommandOutcome::Ignored
            }
        }
    }

    /// Apply `request`, reporting why nothing happened.
    ///
    /// Focus is ensured first. Focusing may move the host selection, so the
    /// selection saved beforehand is restored when it changed.
    pub fn try_execute<S: DocumentSurface + ?Sized>(
        &self,
        surface: &mut S,
        tracker: &mut SelectionTracker,
        request: &CommandRequest,
    ) -> Result<CommandOutcome, CommandError> {
        let spec = request.command.spec();
        if spec.route == Route::History {
            return Err(CommandError::unsupported(spec.name));
        }
        let value = request.host_value()?;

        let saved = tracker.save(&*surface);
        if !surface.has_focus() {
            surface.focus();
            if tracker.current(&*surface) != saved {
                trace!(command = %request.command, "restoring selection after focus");
                tracker.restore(surface, saved);
            }
        }
        if saved.is_none() {
            return Err(CommandError::NoSelection {
                command: request.command,
            });
        }

        let before = surface.content();
        trace!(command = %request.command, host = spec.host_name, ?value, "dispatching");
        if !surface.exec_command(spec.host_name, value) {
            return Err(CommandError::Refused {
                command: request.command,
            });
        }

        if surface.content() == before {
            Ok(CommandOutcome::Applied)
        } else {
            Ok(CommandOutcome::Mutated)
        }
    }

    /// Whether `command` applies at the current selection.
    ///
    /// `false` for commands without queryable state and when there is no
    /// selection. Never touches the document or the selection.
    #[must_use]
    pub fn is_active<S: DocumentSurface + ?Sized>(
        &self,
        surface: &S,
        tracker: &SelectionTracker,
        command: FormatCommand,
    ) -> bool {
        if !command.is_queryable() {
            return false;
        }
        if tracker.current(surface).is_none() {
            return false;
        }
        surface.query_command_state(command.host_name())
    }

    /// [`is_active`](Self::is_active) by name; unknown names are inactive.
    #[must_use]
    pub fn is_active_name<S: DocumentSurface + ?Sized>(
        &self,
        surface: &S,
        tracker: &SelectionTracker,
        name: &str,
    ) -> bool {
        FormatCommand::from_name(name)
            .is_some_and(|command| self.is_active(surface, tracker, command))
    }
}
