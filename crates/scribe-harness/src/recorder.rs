#![forbid(unsafe_code)]

//! Listener that records every [`EditorEvent`] it receives.

use std::cell::RefCell;
use std::rc::Rc;

use scribe_core::EditorEvent;

/// Shared event log. Clones see the same log.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Rc<RefCell<Vec<EditorEvent>>>,
}

impl EventRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener closure appending to this recorder.
    pub fn listener(&self) -> impl FnMut(&EditorEvent) + 'static {
        let events = Rc::clone(&self.events);
        move |event: &EditorEvent| events.borrow_mut().push(event.clone())
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<EditorEvent> {
        self.events.borrow().clone()
    }

    /// Event kinds, in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.borrow().iter().map(EditorEvent::kind).collect()
    }

    /// Number of recorded events of `kind`.
    #[must_use]
    pub fn count(&self, kind: &str) -> usize {
        self.events.borrow().iter().filter(|e| e.kind() == kind).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}
