#![forbid(unsafe_code)]

//! Snapshot-based undo/redo store for one editing surface.
//!
//! [`SnapshotStore`] keeps full [`DocumentSnapshot`]s rather than deltas.
//! Every transition is "snapshot now, load then": undo captures the current
//! content onto the redo stack before loading the previous state, and redo
//! does the mirror image. No forward-delta code path exists.
//!
//! # Architecture
//!
//! ```text
//! record (content "AB")
//! ┌──────────────────────────────────────────────────┐
//! │ Undo Stack:  [s0, s1, "A"]                        │
//! │ Redo Stack:  []                                   │
//! │ Baseline:    "AB"   (lastSnapshot)                │
//! └──────────────────────────────────────────────────┘
//!
//! undo()
//! ┌──────────────────────────────────────────────────┐
//! │ Undo Stack:  [s0, s1]                             │
//! │ Redo Stack:  ["AB"]   (fresh capture of current)  │
//! │ Baseline:    "A"      (applied to the document)   │
//! └──────────────────────────────────────────────────┘
//!
//! record (content "AC") - new branch, clears redo
//! ┌──────────────────────────────────────────────────┐
//! │ Undo Stack:  [s0, s1, "A"]                        │
//! │ Redo Stack:  []                                   │
//! │ Baseline:    "AC"                                 │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! The baseline is the most recently recorded or applied state. Recording
//! moves the old baseline onto the undo stack, so every undo entry is a state
//! the document can go back to and `can_undo()` is exactly "the undo stack is
//! non-empty".
//!
//! # Debounce
//!
//! [`record_snapshot_debounced`](SnapshotStore::record_snapshot_debounced)
//! arms the store's single [`DebounceTimer`]; each call replaces the pending
//! deadline. The host loop calls [`poll`](SnapshotStore::poll) to fire it. A
//! pending snapshot is flushed before undo/redo so an edit made inside the
//! quiet window is never silently dropped. Dropping the store drops (and
//! cancels) the timer.
//!
//! # Playback
//!
//! Applying a historical snapshot pauses recording for the duration of the
//! replace. The pause is synchronous, so a recording can never observe the
//! playback mutation as a user edit.

use std::collections::VecDeque;
use std::fmt;

use scribe_core::{DocumentSurface, HistoryDirection, HistoryError};
use tracing::{debug, debug_span, trace};
use web_time::Instant;

use super::snapshot::DocumentSnapshot;
use crate::config::HistoryConfig;
use crate::timer::{DebounceTimer, TimerHandle};

/// Undo/redo availability, for toolbars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryStatus {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_depth: usize,
    pub redo_depth: usize,
}

/// Bounded snapshot history with debounced capture.
///
/// # Invariants
///
/// 1. `undo_stack.len() <= config.max_stack_size` (after any operation).
/// 2. Every successful [`record_snapshot`](Self::record_snapshot) clears the
///    redo stack.
/// 3. Recording content equal to the baseline is a no-op.
/// 4. While recording is paused nothing is recorded and no timer is armed.
/// 5. At most one debounce deadline is pending.
pub struct SnapshotStore {
    /// States available for undo (most recent at back).
    undo_stack: VecDeque<DocumentSnapshot>,
    /// States displaced by undo (most recent at back).
    redo_stack: Vec<DocumentSnapshot>,
    /// Most recently recorded or applied state.
    baseline: DocumentSnapshot,
    is_recording: bool,
    timer: DebounceTimer,
    config: HistoryConfig,
}

impl fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("is_recording", &self.is_recording)
            .field("pending", &self.timer.is_pending())
            .field("config", &self.config)
            .finish()
    }
}

impl SnapshotStore {
    /// Create a store whose baseline is the surface's current content.
    #[must_use]
    pub fn new<S: DocumentSurface + ?Sized>(
        config: HistoryConfig,
        surface: &S,
        now: Instant,
    ) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            baseline: DocumentSnapshot::new(surface.content(), now),
            is_recording: true,
            timer: DebounceTimer::new(config.snapshot_delay()),
            config,
        }
    }

    // ====================================================================
    // Recording
    // ====================================================================

    /// Capture the current content if it differs from the baseline.
    ///
    /// Any pending debounced snapshot is superseded. Returns whether a new
    /// undo entry was pushed.
    pub fn record_snapshot<S: DocumentSurface + ?Sized>(
        &mut self,
        surface: &S,
        now: Instant,
    ) -> bool {
        self.timer.cancel();
        if !self.is_recording {
            trace!("record skipped: recording paused");
            return false;
        }

        let content = surface.content();
        if self.baseline.matches(&content) {
            trace!("record skipped: content unchanged");
            return false;
        }

        let _span = debug_span!("history.record", bytes = content.len()).entered();
        let previous = std::mem::replace(&mut self.baseline, DocumentSnapshot::new(content, now));
        self.undo_stack.push_back(previous);
        if !self.redo_stack.is_empty() {
            debug!(discarded = self.redo_stack.len(), "redo stack invalidated");
            self.redo_stack.clear();
        }
        self.enforce_bound();
        debug!(undo_depth = self.undo_stack.len(), "snapshot recorded");
        true
    }

    /// Schedule [`record_snapshot`](Self::record_snapshot) after the quiet
    /// period, replacing any pending schedule.
    ///
    /// Returns `None` (and schedules nothing) while recording is paused.
    pub fn record_snapshot_debounced(&mut self, now: Instant) -> Option<TimerHandle> {
        if !self.is_recording {
            trace!("debounce skipped: recording paused");
            return None;
        }
        Some(self.timer.arm(now))
    }

    /// Fire the debounced snapshot if its quiet period has elapsed.
    ///
    /// Returns whether a new undo entry was pushed.
    pub fn poll<S: DocumentSurface + ?Sized>(&mut self, surface: &S, now: Instant) -> bool {
        match self.timer.fire_if_due(now) {
            Some(_) => self.record_snapshot(surface, now),
            None => false,
        }
    }

    /// Record a pending debounced snapshot immediately.
    ///
    /// Returns whether a new undo entry was pushed.
    pub fn flush_pending<S: DocumentSurface + ?Sized>(&mut self, surface: &S, now: Instant) -> bool {
        if self.timer.is_pending() {
            trace!("flushing pending snapshot");
            self.record_snapshot(surface, now)
        } else {
            false
        }
    }

    // ====================================================================
    // Playback
    // ====================================================================

    /// Step back one state. Returns `false` when there is nothing to undo.
    pub fn undo<S: DocumentSurface + ?Sized>(&mut self, surface: &mut S, now: Instant) -> bool {
        self.try_undo(surface, now).is_ok()
    }

    /// Step forward one state. Returns `false` when there is nothing to redo.
    pub fn redo<S: DocumentSurface + ?Sized>(&mut self, surface: &mut S, now: Instant) -> bool {
        self.try_redo(surface, now).is_ok()
    }

    /// [`undo`](Self::undo), reporting why nothing happened.
    pub fn try_undo<S: DocumentSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        now: Instant,
    ) -> Result<(), HistoryError> {
        self.flush_pending(&*surface, now);
        let Some(target) = self.undo_stack.pop_back() else {
            trace!("undo: history exhausted");
            return Err(HistoryError::exhausted(HistoryDirection::Undo));
        };

        let _span = debug_span!("history.undo", undo_depth = self.undo_stack.len()).entered();
        self.redo_stack
            .push(DocumentSnapshot::new(surface.content(), now));
        self.apply(surface, target);
        debug!(
            undo_depth = self.undo_stack.len(),
            redo_depth = self.redo_stack.len(),
            "undo applied"
        );
        Ok(())
    }

    /// [`redo`](Self::redo), reporting why nothing happened.
    pub fn try_redo<S: DocumentSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        now: Instant,
    ) -> Result<(), HistoryError> {
        self.flush_pending(&*surface, now);
        let Some(target) = self.redo_stack.pop() else {
            trace!("redo: history exhausted");
            return Err(HistoryError::exhausted(HistoryDirection::Redo));
        };

        let _span = debug_span!("history.redo", redo_depth = self.redo_stack.len()).entered();
        self.undo_stack
            .push_back(DocumentSnapshot::new(surface.content(), now));
        self.enforce_bound();
        self.apply(surface, target);
        debug!(
            undo_depth = self.undo_stack.len(),
            redo_depth = self.redo_stack.len(),
            "redo applied"
        );
        Ok(())
    }

    /// Load `target` into the document with recording paused.
    fn apply<S: DocumentSurface + ?Sized>(&mut self, surface: &mut S, target: DocumentSnapshot) {
        let was_recording = self.is_recording;
        self.pause();
        surface.replace_content(target.content());
        self.baseline = target;
        if was_recording {
            self.resume();
        }
    }

    // ====================================================================
    // Recording control
    // ====================================================================

    /// Stop capturing mutations. Cancels any pending debounced snapshot.
    pub fn pause(&mut self) {
        self.is_recording = false;
        self.timer.cancel();
    }

    /// Resume capturing mutations.
    pub fn resume(&mut self) {
        self.is_recording = true;
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    // ====================================================================
    // Query
    // ====================================================================

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    #[must_use]
    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            undo_depth: self.undo_depth(),
            redo_depth: self.redo_depth(),
        }
    }

    /// The most recently recorded or applied state.
    #[must_use]
    pub fn baseline(&self) -> &DocumentSnapshot {
        &self.baseline
    }

    /// Undo entries, oldest first.
    pub fn undo_entries(&self) -> impl DoubleEndedIterator<Item = &DocumentSnapshot> {
        self.undo_stack.iter()
    }

    /// Redo entries, next-to-redo first.
    pub fn redo_entries(&self) -> impl DoubleEndedIterator<Item = &DocumentSnapshot> {
        self.redo_stack.iter().rev()
    }

    #[must_use]
    pub fn has_pending_snapshot(&self) -> bool {
        self.timer.is_pending()
    }

    /// When the pending debounced snapshot is due.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    // ====================================================================
    // Maintenance
    // ====================================================================

    /// Forget all history; the current content becomes the baseline.
    ///
    /// Used after a programmatic full-content replacement.
    pub fn clear<S: DocumentSurface + ?Sized>(&mut self, surface: &S, now: Instant) {
        self.timer.cancel();
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.baseline = DocumentSnapshot::new(surface.content(), now);
        debug!("history cleared");
    }

    /// Evict the oldest undo entries beyond the bound.
    fn enforce_bound(&mut self) {
        while self.undo_stack.len() > self.config.max_stack_size {
            self.undo_stack.pop_front();
            trace!("evicted oldest undo entry");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
