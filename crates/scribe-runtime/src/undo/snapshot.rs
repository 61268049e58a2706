#![forbid(unsafe_code)]

//! Immutable document snapshots.

use std::fmt;
use std::sync::Arc;

use web_time::Instant;

/// Full serialized document state captured at one point in time.
///
/// Content is held in an `Arc<str>` so moving a snapshot between stacks,
/// or handing one to a caller, never copies the document. Equality compares
/// content only; two captures of the same text at different times are equal.
#[derive(Clone)]
pub struct DocumentSnapshot {
    content: Arc<str>,
    timestamp: Instant,
}

impl DocumentSnapshot {
    #[must_use]
    pub fn new(content: impl Into<Arc<str>>, timestamp: Instant) -> Self {
        Self {
            content: content.into(),
            timestamp,
        }
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// When the snapshot was captured.
    #[must_use]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Size of the captured content in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.content.len()
    }

    /// Whether this snapshot holds exactly `content`.
    #[must_use]
    pub fn matches(&self, content: &str) -> bool {
        *self.content == *content
    }
}

impl PartialEq for DocumentSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
    }
}

impl Eq for DocumentSnapshot {}

impl fmt::Debug for DocumentSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 32;
        let mut preview: String = self.content.chars().take(PREVIEW).collect();
        if self.content.chars().nth(PREVIEW).is_some() {
            preview.push('…');
        }
        f.debug_struct("DocumentSnapshot")
            .field("content", &preview)
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use web_time::Duration;

    #[test]
    fn equality_ignores_timestamp() {
        let t0 = Instant::now();
        let a = DocumentSnapshot::new("<p>A</p>", t0);
        let b = DocumentSnapshot::new("<p>A</p>", t0 + Duration::from_secs(5));
        let c = DocumentSnapshot::new("<p>B</p>", t0);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.matches("<p>A</p>"));
    }

    #[test]
    fn clone_shares_content() {
        let a = DocumentSnapshot::new("shared", Instant::now());
        let b = a.clone();
        assert!(std::ptr::eq(a.content(), b.content()));
    }

    #[test]
    fn debug_truncates_long_content() {
        let long = "x".repeat(100);
        let s = format!("{:?}", DocumentSnapshot::new(long, Instant::now()));
        assert!(s.contains('…'));
        assert!(s.contains("size_bytes: 100"));
    }
}
