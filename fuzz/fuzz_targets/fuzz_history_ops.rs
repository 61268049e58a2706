#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use scribe_core::DocumentSurface;
use scribe_harness::MemoryDocument;
use scribe_runtime::{HistoryConfig, SnapshotStore};
use web_time::{Duration, Instant};

#[derive(Debug, Arbitrary)]
enum Op {
    Edit(u8),
    Record,
    Debounce,
    Advance(u16),
    Undo,
    Redo,
    Pause,
    Resume,
    Clear,
}

#[derive(Debug, Arbitrary)]
struct Input {
    max_stack_size: u8,
    delay_ms: u16,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let max = usize::from(input.max_stack_size.max(1));
    let config = HistoryConfig::new(max, u64::from(input.delay_ms.max(1)));
    let mut doc = MemoryDocument::from_markup("<p>0</p>");
    let mut now = Instant::now();
    let mut store = SnapshotStore::new(config, &doc, now);

    for op in input.ops.iter().take(512) {
        match op {
            Op::Edit(v) => doc.replace_content(&format!("<p>{v}</p>")),
            Op::Record => {
                store.record_snapshot(&doc, now);
            }
            Op::Debounce => {
                store.record_snapshot_debounced(now);
            }
            Op::Advance(ms) => {
                now += Duration::from_millis(u64::from(*ms));
                store.poll(&doc, now);
            }
            Op::Undo => {
                let before = doc.content();
                if store.undo(&mut doc, now) {
                    // Round trip: redo lands on the pre-undo content.
                    assert!(store.redo(&mut doc, now));
                    assert_eq!(doc.content(), before);
                    assert!(store.undo(&mut doc, now));
                }
            }
            Op::Redo => {
                store.redo(&mut doc, now);
            }
            Op::Pause => store.pause(),
            Op::Resume => store.resume(),
            Op::Clear => store.clear(&doc, now),
        }

        assert!(store.undo_depth() <= max, "undo stack exceeded its bound");
        assert_eq!(store.can_undo(), store.undo_depth() > 0);
        assert_eq!(store.can_redo(), store.redo_depth() > 0);
        assert!(!(store.has_pending_snapshot() && !store.is_recording()));
    }
});
