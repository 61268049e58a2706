#![forbid(unsafe_code)]

//! Change coordinator: one editing surface and everything attached to it.
//!
//! The coordinator owns the host surface, its [`SnapshotStore`], its
//! [`SelectionTracker`] and a listener registry. The host drives it by calling
//! the `on_*` notification methods and [`tick`](ChangeCoordinator::tick);
//! toolbars and shortcut tables call [`execute`](ChangeCoordinator::execute),
//! [`undo`](ChangeCoordinator::undo) and [`redo`](ChangeCoordinator::redo).
//!
//! # State Machine
//!
//! ```text
//!          on_content_mutated              tick (deadline elapsed)
//! ┌──────┐ ─────────────────▶ ┌─────────────────┐ ────────────────▶ ┌──────┐
//! │ Idle │                    │ PendingSnapshot │                   │ Idle │
//! └──────┘                    └─────────────────┘                   └──────┘
//!    │ undo / redo                      │ undo / redo (pending flushed)
//!    ▼                                  ▼
//! ┌───────────┐  playback finished   ┌──────┐
//! │ Replaying │ ───────────────────▶ │ Idle │
//! └───────────┘                      └──────┘
//! ```
//!
//! `Replaying` only exists inside a single `undo`/`redo` call. Recording is
//! paused synchronously around the replace, so no mutation notification can
//! be captured as an edit while it lasts.
//!
//! # Event Order
//!
//! For a mutation: [`EditorEvent::FormatChanged`] (when a command caused it),
//! then [`EditorEvent::ContentChanged`], then the debounce is armed. Content
//! notifications are never debounced; only history capture is.
//!
//! Mutations caused by [`execute`](ChangeCoordinator::execute) are reported by
//! the coordinator itself. Hosts report user edits only.

use std::fmt;

use scribe_core::{
    CommandError, CommandRequest, DocumentSurface, EditorEvent, FormatCommand, Route,
    SelectionState, SelectionTracker,
};
use tracing::{debug, trace};
use web_time::Instant;

use crate::config::{ConfigError, EditorConfig, HistoryConfig};
use crate::executor::{CommandExecutor, CommandOutcome};
use crate::undo::{HistoryStatus, SnapshotStore};

/// Activity state of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatorState {
    #[default]
    Idle,
    /// A debounced snapshot is armed.
    PendingSnapshot,
    /// A history snapshot is being applied.
    Replaying,
}

/// Handle returned by [`ChangeCoordinator::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&EditorEvent)>;

/// Coordinates history, selection and commands for one surface.
pub struct ChangeCoordinator<S: DocumentSurface> {
    surface: S,
    store: SnapshotStore,
    tracker: SelectionTracker,
    executor: CommandExecutor,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    state: CoordinatorState,
}

impl<S: DocumentSurface + fmt::Debug> fmt::Debug for ChangeCoordinator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeCoordinator")
            .field("surface", &self.surface)
            .field("store", &self.store)
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<S: DocumentSurface> ChangeCoordinator<S> {
    /// Attach to `surface`; its current content becomes the history baseline.
    pub fn new(surface: S, config: HistoryConfig, now: Instant) -> Self {
        let store = SnapshotStore::new(config, &surface, now);
        Self {
            surface,
            store,
            tracker: SelectionTracker::new(),
            executor: CommandExecutor::new(),
            listeners: Vec::new(),
            next_listener: 0,
            state: CoordinatorState::Idle,
        }
    }

    /// Validate `config` and attach.
    pub fn with_config(surface: S, config: &EditorConfig, now: Instant) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(surface, config.history.clone(), now))
    }

    /// Tear down, cancelling any pending debounced snapshot.
    ///
    /// Returns the surface. Dropping the coordinator cancels the timer too.
    pub fn destroy(mut self) -> S {
        self.store.pause();
        self.listeners.clear();
        debug!("coordinator destroyed");
        self.surface
    }

    // ====================================================================
    // Host notifications
    // ====================================================================

    /// The host observed a user edit.
    pub fn on_content_mutated(&mut self, now: Instant) {
        self.emit(EditorEvent::ContentChanged(self.surface.content()));
        self.arm_snapshot(now);
    }

    /// The host's selection moved.
    pub fn on_selection_changed(&mut self) -> Option<SelectionState> {
        let state = self.tracker.on_selection_change(&self.surface);
        self.emit(EditorEvent::SelectionChanged(state));
        state
    }

    /// The user asked for focus (clicked the surface, tabbed in).
    ///
    /// The last known selection is re-established if focusing moved it or
    /// reversed its direction.
    pub fn on_focus_requested(&mut self) {
        if self.surface.has_focus() {
            return;
        }
        let saved = self.tracker.last_known();
        self.surface.focus();
        if saved.is_some() && self.tracker.current(&self.surface) != saved {
            self.tracker.restore(&mut self.surface, saved);
        }
    }

    /// Advance time: fire the debounced snapshot if it is due.
    ///
    /// Returns whether a snapshot was recorded.
    pub fn tick(&mut self, now: Instant) -> bool {
        let before = self.store.status();
        let recorded = self.store.poll(&self.surface, now);
        if !self.store.has_pending_snapshot() {
            self.state = CoordinatorState::Idle;
        }
        self.emit_history_if_changed(before);
        recorded
    }

    /// When [`tick`](Self::tick) next needs to run.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.store.next_deadline()
    }

    // ====================================================================
    // Commands
    // ====================================================================

    /// Run a command. Failures degrade to [`CommandOutcome::Ignored`].
    pub fn execute(&mut self, request: &CommandRequest, now: Instant) -> CommandOutcome {
        match self.try_execute(request, now) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(command = %request.command, error = %err, "command ignored");
                CommandOutcome::Ignored
            }
        }
    }

    /// Run a command, reporting why nothing happened.
    ///
    /// History commands are routed to [`undo`](Self::undo) /
    /// [`redo`](Self::redo); exhausted history is reported as
    /// [`CommandOutcome::Ignored`], not as an error.
    pub fn try_execute(
        &mut self,
        request: &CommandRequest,
        now: Instant,
    ) -> Result<CommandOutcome, CommandError> {
        if request.command.spec().route == Route::History {
            let moved = match request.command {
                FormatCommand::Redo => self.redo(now),
                _ => self.undo(now),
            };
            return Ok(if moved {
                CommandOutcome::Mutated
            } else {
                CommandOutcome::Ignored
            });
        }

        let outcome = self
            .executor
            .try_execute(&mut self.surface, &mut self.tracker, request)?;
        self.emit(EditorEvent::FormatChanged(request.command));
        if outcome.is_mutated() {
            self.emit(EditorEvent::ContentChanged(self.surface.content()));
            self.arm_snapshot(now);
        }
        Ok(outcome)
    }

    /// Whether `command` applies at the current selection.
    #[must_use]
    pub fn is_active(&self, command: FormatCommand) -> bool {
        self.executor.is_active(&self.surface, &self.tracker, command)
    }

    /// [`is_active`](Self::is_active) by command name.
    #[must_use]
    pub fn is_active_name(&self, name: &str) -> bool {
        self.executor
            .is_active_name(&self.surface, &self.tracker, name)
    }

    // ====================================================================
    // History
    // ====================================================================

    /// Step back one state. The selection is not restored.
    pub fn undo(&mut self, now: Instant) -> bool {
        self.replay(now, |store, surface, now| store.undo(surface, now))
    }

    /// Step forward one state. The selection is not restored.
    pub fn redo(&mut self, now: Instant) -> bool {
        self.replay(now, |store, surface, now| store.redo(surface, now))
    }

    fn replay(
        &mut self,
        now: Instant,
        step: impl FnOnce(&mut SnapshotStore, &mut S, Instant) -> bool,
    ) -> bool {
        let before = self.store.status();
        self.state = CoordinatorState::Replaying;
        let moved = step(&mut self.store, &mut self.surface, now);
        self.state = CoordinatorState::Idle;
        if moved {
            self.tracker.invalidate();
            self.emit(EditorEvent::ContentChanged(self.surface.content()));
        }
        self.emit_history_if_changed(before);
        moved
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.store.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.store.can_redo()
    }

    #[must_use]
    pub fn history_status(&self) -> HistoryStatus {
        self.store.status()
    }

    /// Read access to the history.
    #[must_use]
    pub fn history(&self) -> &SnapshotStore {
        &self.store
    }

    /// Replace the whole document programmatically. Prior history is dropped.
    pub fn set_content(&mut self, content: &str, now: Instant) {
        let before = self.store.status();
        self.surface.replace_content(content);
        self.store.clear(&self.surface, now);
        self.tracker.invalidate();
        self.state = CoordinatorState::Idle;
        self.emit(EditorEvent::ContentChanged(self.surface.content()));
        self.emit_history_if_changed(before);
    }

    // ====================================================================
    // Selection
    // ====================================================================

    #[must_use]
    pub fn selection(&self) -> Option<SelectionState> {
        self.tracker.current(&self.surface)
    }

    /// Alias of [`selection`](Self::selection) for call sites about to
    /// disturb it.
    #[must_use]
    pub fn save_selection(&self) -> Option<SelectionState> {
        self.tracker.save(&self.surface)
    }

    /// Re-establish a saved selection, clamped to the current document.
    pub fn restore_selection(&mut self, state: Option<SelectionState>) -> Option<SelectionState> {
        self.tracker.restore(&mut self.surface, state)
    }

    #[must_use]
    pub fn selected_text(&self) -> String {
        self.tracker.selected_text(&self.surface)
    }

    #[must_use]
    pub fn tracker(&self) -> &SelectionTracker {
        &self.tracker
    }

    // ====================================================================
    // Listeners
    // ====================================================================

    /// Register a listener for [`EditorEvent`]s.
    pub fn subscribe(&mut self, listener: impl FnMut(&EditorEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ====================================================================
    // Accessors
    // ====================================================================

    #[must_use]
    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    #[must_use]
    pub fn content(&self) -> String {
        self.surface.content()
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access for simulating or performing host edits. Report user
    /// edits made this way with [`on_content_mutated`](Self::on_content_mutated).
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    // ====================================================================
    // Internal
    // ====================================================================

    fn arm_snapshot(&mut self, now: Instant) {
        if self.store.record_snapshot_debounced(now).is_some() {
            self.state = CoordinatorState::PendingSnapshot;
        }
    }

    fn emit_history_if_changed(&mut self, before: HistoryStatus) {
        let after = self.store.status();
        if after != before {
            self.emit(EditorEvent::HistoryChanged {
                can_undo: after.can_undo,
                can_redo: after.can_redo,
            });
        }
    }

    fn emit(&mut self, event: EditorEvent) {
        trace!(kind = event.kind(), listeners = self.listeners.len(), "emit");
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_harness::{EventRecorder, MemoryDocument};
    use web_time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn coordinator(markup: &str) -> (ChangeCoordinator<MemoryDocument>, EventRecorder, Instant) {
        let t0 = Instant::now();
        let mut coord =
            ChangeCoordinator::new(MemoryDocument::from_markup(markup), HistoryConfig::default(), t0);
        let recorder = EventRecorder::new();
        coord.subscribe(recorder.listener());
        (coord, recorder, t0)
    }

    #[test]
    fn mutation_emits_content_then_arms_debounce() {
        let (mut coord, recorder, t0) = coordinator("<p>A</p>");
        coord.surface_mut().replace_content("<p>AB</p>");
        coord.on_content_mutated(t0);

        assert_eq!(recorder.kinds(), ["content_changed"]);
        assert_eq!(coord.state(), CoordinatorState::PendingSnapshot);
        assert_eq!(coord.next_deadline(), Some(t0 + ms(500)));
    }

    #[test]
    fn tick_records_and_returns_to_idle() {
        let (mut coord, recorder, t0) = coordinator("<p>A</p>");
        coord.surface_mut().replace_content("<p>AB</p>");
        coord.on_content_mutated(t0);

        assert!(!coord.tick(t0 + ms(100)));
        assert_eq!(coord.state(), CoordinatorState::PendingSnapshot);
        assert!(coord.tick(t0 + ms(500)));
        assert_eq!(coord.state(), CoordinatorState::Idle);
        assert!(coord.can_undo());
        assert_eq!(
            recorder.events().last(),
            Some(&EditorEvent::HistoryChanged {
                can_undo: true,
                can_redo: false
            })
        );
    }

    #[test]
    fn command_emits_format_before_content() {
        let (mut coord, recorder, t0) = coordinator("<p>Hello</p>");
        coord.restore_selection(Some(SelectionState::new(0, 5)));
        let outcome = coord.execute(&CommandRequest::new(FormatCommand::Bold), t0);

        assert_eq!(outcome, CommandOutcome::Mutated);
        assert_eq!(recorder.kinds(), ["format_changed", "content_changed"]);
        assert_eq!(coord.state(), CoordinatorState::PendingSnapshot);
    }

    #[test]
    fn ignored_command_emits_nothing() {
        let (mut coord, recorder, t0) = coordinator("<p>Hello</p>");
        let outcome = coord.execute(&CommandRequest::new(FormatCommand::Bold), t0);
        assert_eq!(outcome, CommandOutcome::Ignored);
        assert!(recorder.events().is_empty());
        assert_eq!(coord.state(), CoordinatorState::Idle);
    }

    #[test]
    fn undo_command_routes_to_history() {
        let (mut coord, _recorder, t0) = coordinator("<p>A</p>");
        assert_eq!(
            coord.execute(&CommandRequest::new(FormatCommand::Undo), t0),
            CommandOutcome::Ignored
        );

        coord.surface_mut().replace_content("<p>AB</p>");
        coord.on_content_mutated(t0);
        coord.tick(t0 + ms(500));
        assert_eq!(
            coord.execute(&CommandRequest::new(FormatCommand::Undo), t0 + ms(600)),
            CommandOutcome::Mutated
        );
        assert_eq!(coord.content(), "<p>A</p>");
        assert_eq!(
            coord.execute(&CommandRequest::new(FormatCommand::Redo), t0 + ms(700)),
            CommandOutcome::Mutated
        );
        assert_eq!(coord.content(), "<p>AB</p>");
    }

    #[test]
    fn undo_emits_content_then_history() {
        let (mut coord, recorder, t0) = coordinator("<p>A</p>");
        coord.surface_mut().replace_content("<p>AB</p>");
        coord.on_content_mutated(t0);
        coord.tick(t0 + ms(500));
        recorder.clear();

        assert!(coord.undo(t0 + ms(600)));
        assert_eq!(
            recorder.events(),
            [
                EditorEvent::ContentChanged("<p>A</p>".into()),
                EditorEvent::HistoryChanged {
                    can_undo: false,
                    can_redo: true
                },
            ]
        );
        assert_eq!(coord.state(), CoordinatorState::Idle);
    }

    #[test]
    fn set_content_clears_history() {
        let (mut coord, recorder, t0) = coordinator("<p>A</p>");
        coord.surface_mut().replace_content("<p>AB</p>");
        coord.on_content_mutated(t0);
        coord.tick(t0 + ms(500));
        recorder.clear();

        coord.set_content("<p>Loaded</p>", t0 + ms(600));
        assert!(!coord.can_undo());
        assert!(!coord.can_redo());
        assert_eq!(recorder.kinds(), ["content_changed", "history_changed"]);
        assert!(!coord.undo(t0 + ms(700)));
        assert_eq!(coord.content(), "<p>Loaded</p>");
    }

    #[test]
    fn set_content_cancels_pending_snapshot() {
        let (mut coord, _recorder, t0) = coordinator("<p>A</p>");
        coord.surface_mut().replace_content("<p>AB</p>");
        coord.on_content_mutated(t0);
        coord.set_content("<p>C</p>", t0 + ms(10));
        assert_eq!(coord.state(), CoordinatorState::Idle);
        assert!(!coord.tick(t0 + ms(1000)));
        assert!(!coord.can_undo());
    }

    #[test]
    fn selection_change_is_emitted() {
        let (mut coord, recorder, _) = coordinator("<p>Hello</p>");
        coord.surface_mut().select_offsets(1, 3);
        let state = coord.on_selection_changed();
        assert_eq!(state, Some(SelectionState::new(1, 3)));
        assert_eq!(
            recorder.events(),
            [EditorEvent::SelectionChanged(Some(SelectionState::new(1, 3)))]
        );
        assert_eq!(coord.selected_text(), "el");
    }

    #[test]
    fn focus_request_restores_last_selection() {
        let (mut coord, _recorder, _) = coordinator("<p>Hello</p>");
        coord.surface_mut().select_offsets(2, 4);
        coord.on_selection_changed();
        coord.surface_mut().blur();
        coord.surface_mut().set_focus_resets_selection(true);

        coord.on_focus_requested();
        assert!(coord.surface().has_focus());
        assert_eq!(coord.selection(), Some(SelectionState::new(2, 4)));
    }

    #[test]
    fn focus_request_keeps_backward_direction() {
        let (mut coord, _recorder, _) = coordinator("<p>Hello</p>");
        coord.surface_mut().select_offsets(4, 1);
        coord.on_selection_changed();
        coord.surface_mut().blur();
        coord.surface_mut().set_focus_resets_selection(true);

        coord.on_focus_requested();
        let restored = coord.selection();
        assert_eq!(restored, Some(SelectionState::from_anchor_focus(4, 1)));
        assert!(restored.is_some_and(|s| s.is_backward()));
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let (mut coord, recorder, t0) = coordinator("<p>A</p>");
        let other = EventRecorder::new();
        let id = coord.subscribe(other.listener());
        assert_eq!(coord.listener_count(), 2);
        assert!(coord.unsubscribe(id));
        assert!(!coord.unsubscribe(id));

        coord.on_content_mutated(t0);
        assert_eq!(recorder.events().len(), 1);
        assert!(other.events().is_empty());
    }

    #[test]
    fn destroy_returns_surface_and_cancels_timer() {
        let (mut coord, _recorder, t0) = coordinator("<p>A</p>");
        coord.surface_mut().replace_content("<p>AB</p>");
        coord.on_content_mutated(t0);
        assert!(coord.next_deadline().is_some());
        let doc = coord.destroy();
        assert_eq!(doc.content(), "<p>AB</p>");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EditorConfig {
            history: HistoryConfig::new(0, 500),
        };
        let result = ChangeCoordinator::with_config(
            MemoryDocument::from_markup("<p>A</p>"),
            &config,
            Instant::now(),
        );
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
