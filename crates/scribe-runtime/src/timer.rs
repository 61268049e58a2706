#![forbid(unsafe_code)]

//! Single-shot, cancellable debounce timer.
//!
//! The editor runs on the host's single event queue, so the timer never
//! spawns anything. It records a deadline; the host's loop calls
//! [`fire_if_due`](DebounceTimer::fire_if_due) (via the coordinator's `tick`)
//! and asks [`deadline`](DebounceTimer::deadline) when to wake up next.
//!
//! # State Machine
//!
//! ```text
//!            arm(now)                 fire_if_due(now >= deadline)
//! ┌──────┐ ─────────▶ ┌─────────┐ ──────────────────────────────▶ ┌──────┐
//! │ Idle │            │ Pending │                                 │ Idle │
//! └──────┘ ◀───────── └─────────┘ ◀─┐                             └──────┘
//!            cancel()       │ arm(now): deadline replaced
//!                           └──────┘
//! ```
//!
//! # Invariants
//!
//! 1. At most one deadline is pending at any time.
//! 2. Each `arm` issues a new [`TimerHandle`]; handles from replaced or
//!    cancelled deadlines are stale and never fire.
//! 3. A pending deadline fires at most once.

use tracing::{debug, trace};
use web_time::{Duration, Instant};

/// Identity of one armed deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy)]
struct Pending {
    handle: TimerHandle,
    deadline: Instant,
}

/// Trailing-edge debounce timer.
#[derive(Debug)]
pub struct DebounceTimer {
    delay: Duration,
    pending: Option<Pending>,
    next_handle: u64,
}

impl DebounceTimer {
    /// Create an idle timer with the given quiet period.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            next_handle: 0,
        }
    }

    /// The quiet period.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm (or re-arm) the timer `delay` after `now`, replacing any pending
    /// deadline.
    ///
    /// A deadline past the clock's range is due immediately.
    pub fn arm(&mut self, now: Instant) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        let deadline = now.checked_add(self.delay).unwrap_or_else(|| {
            debug!(delay_ms = self.delay.as_millis(), "debounce deadline out of range");
            now
        });
        if let Some(prev) = self.pending.replace(Pending { handle, deadline }) {
            trace!(replaced = prev.handle.0, handle = handle.0, "debounce re-armed");
        } else {
            trace!(handle = handle.0, "debounce armed");
        }
        handle
    }

    /// Drop the pending deadline. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(p) => {
                trace!(handle = p.handle.0, "debounce cancelled");
                true
            }
            None => false,
        }
    }

    /// Consume the pending deadline if it has elapsed.
    ///
    /// Returns the handle that fired.
    pub fn fire_if_due(&mut self, now: Instant) -> Option<TimerHandle> {
        let pending = self.pending?;
        if now < pending.deadline {
            return None;
        }
        self.pending = None;
        trace!(handle = pending.handle.0, "debounce fired");
        Some(pending.handle)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether `handle` is the deadline currently pending.
    #[must_use]
    pub fn is_current(&self, handle: TimerHandle) -> bool {
        self.pending.is_some_and(|p| p.handle == handle)
    }

    /// When the pending deadline elapses.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
