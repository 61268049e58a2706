#![no_main]

use libfuzzer_sys::fuzz_target;
use scribe_core::{
    DocumentSurface, SelectionState, SelectionTracker, offset_to_position, position_to_offset,
    text_len,
};
use scribe_harness::{MemoryDocument, markup};

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    // Canonical form is a fixed point.
    let once = markup::render(&markup::parse(source));
    let twice = markup::render(&markup::parse(&once));
    assert_eq!(once, twice, "canonical markup not stable");

    let mut doc = MemoryDocument::from_markup(source);
    assert_eq!(doc.content(), once);

    let len = text_len(&doc);
    for offset in 0..=len.min(256) {
        let position = offset_to_position(&doc, offset);
        assert_eq!(position_to_offset(&doc, position), Ok(offset));
    }

    // Restoring anything clamps into the document.
    let mut tracker = SelectionTracker::new();
    let wild = SelectionState::from_anchor_focus(data.len(), len / 2);
    let applied = tracker.restore(&mut doc, Some(wild));
    assert_eq!(tracker.current(&doc), applied);
    assert!(applied.is_some_and(|s| s.end() <= len));
});
