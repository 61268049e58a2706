#![forbid(unsafe_code)]

//! Property tests for offset mapping and selection restore against
//! [`MemoryDocument`].
//!
//! Validates:
//! - `offset_to_position` then `position_to_offset` is the identity on
//!   `0..=len`.
//! - The mapping agrees with the flattened text.
//! - Restoring any selection clamps to the document and reads back exactly.
//! - Markup canonicalization is a fixed point after one pass.

use proptest::prelude::*;
use scribe_core::{
    SelectionState, SelectionTracker, offset_to_position, position_to_offset, text_between,
    text_len,
};
use scribe_harness::{MemoryDocument, markup};

// ============================================================================
// Strategy helpers
// ============================================================================

fn inline_strategy() -> impl Strategy<Value = String> {
    (
        prop::option::of(prop::sample::select(vec!["b", "i", "u", "sub"])),
        "[a-zé ]{0,6}",
    )
        .prop_map(|(tag, text)| match tag {
            Some(tag) => format!("<{tag}>{text}</{tag}>"),
            None => text,
        })
}

fn block_strategy() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["p", "h1", "li"]),
        prop::collection::vec(inline_strategy(), 0..4),
    )
        .prop_map(|(tag, inlines)| format!("<{tag}>{}</{tag}>", inlines.concat()))
}

fn document_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(block_strategy(), 0..5).prop_map(|blocks| blocks.concat())
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn offset_round_trip(source in document_strategy()) {
        let doc = MemoryDocument::from_markup(&source);
        let len = text_len(&doc);
        prop_assert_eq!(len, doc.text().chars().count());

        for offset in 0..=len {
            let position = offset_to_position(&doc, offset);
            prop_assert_eq!(position_to_offset(&doc, position), Ok(offset));
        }
    }

    #[test]
    fn offsets_past_end_clamp(source in document_strategy(), past in 1usize..50) {
        let doc = MemoryDocument::from_markup(&source);
        let len = text_len(&doc);
        let position = offset_to_position(&doc, len + past);
        prop_assert_eq!(position_to_offset(&doc, position), Ok(len));
    }

    #[test]
    fn text_between_matches_flattened_text(
        source in document_strategy(),
        a in 0usize..40,
        b in 0usize..40,
    ) {
        let doc = MemoryDocument::from_markup(&source);
        let flat: Vec<char> = doc.text().chars().collect();
        let (start, end) = (a.min(b).min(flat.len()), a.max(b).min(flat.len()));
        let expected: String = flat[start..end].iter().collect();
        prop_assert_eq!(text_between(&doc, a, b), expected);
    }

    #[test]
    fn restore_clamps_and_reads_back(
        source in document_strategy(),
        anchor in 0usize..40,
        focus in 0usize..40,
    ) {
        let mut doc = MemoryDocument::from_markup(&source);
        let len = text_len(&doc);
        let mut tracker = SelectionTracker::new();

        let requested = SelectionState::from_anchor_focus(anchor, focus);
        let applied = tracker.restore(&mut doc, Some(requested));
        let expected = requested.clamped(len);

        prop_assert_eq!(applied, Some(expected));
        prop_assert_eq!(tracker.current(&doc), Some(expected));
        prop_assert!(expected.end() <= len);
    }

    #[test]
    fn canonical_markup_is_a_fixed_point(source in "[a-c<>/pbi &;]{0,40}") {
        let once = markup::render(&markup::parse(&source));
        let twice = markup::render(&markup::parse(&once));
        prop_assert_eq!(once, twice);
    }
}
