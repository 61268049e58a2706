#![forbid(unsafe_code)]

//! Selection tracking in a structure-independent offset space.
//!
//! The host addresses selections natively ([`Position`]: node + offset).
//! Everything above the host boundary works in *character offsets* into the
//! flattened text of the document instead, so a saved selection survives
//! the node structure being rebuilt (undo playback replaces every node).
//!
//! # Canonical Order
//!
//! The flattened text is the concatenation of all text nodes in depth-first
//! document order. Both directions of the mapping use [`TextNodes`], the one
//! traversal that defines that order:
//!
//! ```text
//! <p>Hi <b>there</b></p><p>!</p>
//!
//! text nodes:  "Hi "   "there"   "!"
//! offsets:     0..3    3..8      8..9
//! ```
//!
//! Element boundaries contribute no characters. An offset that sits exactly
//! between two text nodes resolves to the end of the earlier one.
//!
//! # Failure Modes
//!
//! - Querying with no native selection, or with an endpoint outside the
//!   document, yields `None` (the `try_` variants say why).
//! - Restoring offsets past the end of a document that has since shrunk
//!   clamps to the end; it never fails.

use tracing::{debug, trace};

use crate::document::{DocumentSurface, DocumentTree, NativeSelection, NodeId, Position};
use crate::error::SelectionError;

/// A normalized selection in offset space.
///
/// # Invariants
///
/// 1. `start <= end`.
/// 2. `start == end` is a collapsed caret.
///
/// Equality includes the direction, so restoring a saved state can tell a
/// reversed selection from the original. Use [`same_range`](Self::same_range)
/// to compare offsets only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionState {
    start: usize,
    end: usize,
    /// The native focus preceded the anchor when this state was captured.
    backward: bool,
}

impl SelectionState {
    /// Create a forward selection; the endpoints are ordered if needed.
    #[must_use]
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
            backward: false,
        }
    }

    /// Create a collapsed caret.
    #[must_use]
    pub const fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
            backward: false,
        }
    }

    /// Create a selection from anchor and focus offsets, remembering the
    /// direction.
    #[must_use]
    pub fn from_anchor_focus(anchor: usize, focus: usize) -> Self {
        Self {
            start: anchor.min(focus),
            end: anchor.max(focus),
            backward: focus < anchor,
        }
    }

    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    #[must_use]
    pub const fn is_backward(&self) -> bool {
        self.backward
    }

    #[must_use]
    pub const fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Whether both states cover the same offsets, ignoring direction.
    #[must_use]
    pub const fn same_range(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }

    /// Number of selected characters.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Both endpoints clamped to `len`. A selection that collapses loses its
    /// direction.
    #[must_use]
    pub fn clamped(self, len: usize) -> Self {
        let start = self.start.min(len);
        let end = self.end.min(len);
        Self {
            start,
            end,
            backward: self.backward && start != end,
        }
    }
}

// ============================================================================
// Traversal
// ============================================================================

/// Depth-first iterator over the text nodes of a document.
pub struct TextNodes<'a, T: DocumentTree + ?Sized> {
    tree: &'a T,
    stack: Vec<NodeId>,
}

impl<'a, T: DocumentTree + ?Sized> TextNodes<'a, T> {
    #[must_use]
    pub fn new(tree: &'a T) -> Self {
        Self {
            tree,
            stack: vec![tree.root()],
        }
    }
}

impl<'a, T: DocumentTree + ?Sized> Iterator for TextNodes<'a, T> {
    type Item = (NodeId, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            if let Some(text) = self.tree.text(node) {
                return Some((node, text));
            }
            self.stack
                .extend(self.tree.children(node).iter().rev().copied());
        }
        None
    }
}

/// Total length of the flattened text, in chars.
#[must_use]
pub fn text_len<T: DocumentTree + ?Sized>(tree: &T) -> usize {
    TextNodes::new(tree).map(|(_, text)| text.chars().count()).sum()
}

/// Map a native position to its offset in the flattened text.
pub fn position_to_offset<T: DocumentTree + ?Sized>(
    tree: &T,
    position: Position,
) -> Result<usize, SelectionError> {
    if !tree.contains(position.node) {
        return Err(SelectionError::Detached {
            node: position.node,
        });
    }

    // Resolve the boundary point to "just before node X" or "just after the
    // subtree of X" so a single walk can stop on it.
    enum Target {
        Text(NodeId, usize),
        Before(NodeId),
        AfterSubtree(NodeId),
    }

    let target = match tree.text(position.node) {
        Some(text) => {
            let len = text.chars().count();
            if position.offset > len {
                return Err(SelectionError::OutOfRange {
                    offset: position.offset,
                    len,
                });
            }
            Target::Text(position.node, position.offset)
        }
        None => {
            let children = tree.children(position.node);
            match children.get(position.offset) {
                Some(&child) => Target::Before(child),
                None if position.offset == children.len() => {
                    Target::AfterSubtree(position.node)
                }
                None => {
                    return Err(SelectionError::OutOfRange {
                        offset: position.offset,
                        len: children.len(),
                    });
                }
            }
        }
    };

    enum Step {
        Enter(NodeId),
        Leave(NodeId),
    }

    let mut acc = 0usize;
    let mut stack = vec![Step::Enter(tree.root())];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(node) => {
                if matches!(target, Target::Before(n) if n == node) {
                    return Ok(acc);
                }
                if let Some(text) = tree.text(node) {
                    if let Target::Text(n, offset) = target
                        && n == node
                    {
                        return Ok(acc + offset);
                    }
                    acc += text.chars().count();
                } else {
                    stack.push(Step::Leave(node));
                    stack.extend(tree.children(node).iter().rev().map(|&c| Step::Enter(c)));
                }
            }
            Step::Leave(node) => {
                if matches!(target, Target::AfterSubtree(n) if n == node) {
                    return Ok(acc);
                }
            }
        }
    }

    // `contains` said yes but the walk never reached the node: the host's
    // parent links and child lists disagree.
    Err(SelectionError::Detached {
        node: position.node,
    })
}

/// Map an offset in the flattened text to a native position.
///
/// Never fails: offsets past the end clamp to the end of the last text node,
/// and a document with no text maps everything to the end of the root.
#[must_use]
pub fn offset_to_position<T: DocumentTree + ?Sized>(tree: &T, offset: usize) -> Position {
    let mut acc = 0usize;
    let mut last = None;
    for (node, text) in TextNodes::new(tree) {
        let len = text.chars().count();
        if offset <= acc + len {
            return Position::new(node, offset - acc);
        }
        acc += len;
        last = Some(Position::new(node, len));
    }

    match last {
        Some(end) => {
            trace!(offset, len = acc, "offset clamped to document end");
            end
        }
        None => {
            let root = tree.root();
            Position::new(root, tree.children(root).len())
        }
    }
}

/// The flattened text between two offsets (clamped, order-insensitive).
#[must_use]
pub fn text_between<T: DocumentTree + ?Sized>(tree: &T, a: usize, b: usize) -> String {
    let (start, end) = (a.min(b), a.max(b));
    let mut out = String::new();
    let mut acc = 0usize;
    for (_, text) in TextNodes::new(tree) {
        if acc >= end {
            break;
        }
        let len = text.chars().count();
        if acc + len > start {
            let from = start.saturating_sub(acc);
            let to = (end - acc).min(len);
            out.extend(text.chars().skip(from).take(to - from));
        }
        acc += len;
    }
    out
}

// ============================================================================
// Tracker
// ============================================================================

/// Tracks the selection of one editing surface in offset space.
///
/// The tracker holds no reference to the surface; every call receives it
/// explicitly. It caches the state computed on the most recent
/// selection-change notification so consumers can read it without touching
/// the host.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    last: Option<SelectionState>,
}

impl SelectionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current selection, or the reason there is none.
    pub fn try_current<S: DocumentSurface + ?Sized>(
        &self,
        surface: &S,
    ) -> Result<SelectionState, SelectionError> {
        let native = surface.selection().ok_or(SelectionError::NoSelection)?;
        let anchor = position_to_offset(surface, native.anchor)?;
        let focus = position_to_offset(surface, native.focus)?;
        Ok(SelectionState::from_anchor_focus(anchor, focus))
    }

    /// The current selection; `None` when there is none or it lies outside
    /// the document.
    #[must_use]
    pub fn current<S: DocumentSurface + ?Sized>(&self, surface: &S) -> Option<SelectionState> {
        match self.try_current(surface) {
            Ok(state) => Some(state),
            Err(SelectionError::NoSelection) => None,
            Err(err) => {
                debug!(error = %err, "selection outside document");
                None
            }
        }
    }

    /// Point-in-time copy for call sites about to disturb the selection.
    #[must_use]
    pub fn save<S: DocumentSurface + ?Sized>(&self, surface: &S) -> Option<SelectionState> {
        self.current(surface)
    }

    /// Re-establish a saved selection, clamping to the current document.
    ///
    /// `None` is a no-op. Returns the state actually applied.
    pub fn restore<S: DocumentSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        state: Option<SelectionState>,
    ) -> Option<SelectionState> {
        let state = state?;
        let len = text_len(&*surface);
        let applied = state.clamped(len);
        if !applied.same_range(&state) {
            debug!(
                start = state.start,
                end = state.end,
                len,
                "restored selection clamped to document"
            );
        }

        let start = offset_to_position(&*surface, applied.start);
        let end = offset_to_position(&*surface, applied.end);
        let native = if applied.backward {
            NativeSelection::new(end, start)
        } else {
            NativeSelection::new(start, end)
        };
        surface.set_selection(native);
        self.last = Some(applied);
        Some(applied)
    }

    /// Recompute after the host reports a selection change.
    pub fn on_selection_change<S: DocumentSurface + ?Sized>(
        &mut self,
        surface: &S,
    ) -> Option<SelectionState> {
        self.last = self.current(surface);
        trace!(selection = ?self.last, "selection changed");
        self.last
    }

    /// State computed on the last notification or restore.
    #[must_use]
    pub fn last_known(&self) -> Option<SelectionState> {
        self.last
    }

    /// Forget the cached state (the document was replaced).
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// Text covered by the current selection; empty when collapsed or absent.
    #[must_use]
    pub fn selected_text<S: DocumentSurface + ?Sized>(&self, surface: &S) -> String {
        self.current(surface)
            .map(|s| text_between(surface, s.start, s.end))
            .unwrap_or_default()
    }

    /// Select the whole document.
    pub fn select_all<S: DocumentSurface + ?Sized>(&mut self, surface: &mut S) -> SelectionState {
        let len = text_len(&*surface);
        let state = SelectionState::new(0, len);
        self.restore(surface, Some(state));
        state
    }

    /// Collapse the current selection to its end. No-op without a selection.
    pub fn collapse_to_end<S: DocumentSurface + ?Sized>(
        &mut self,
        surface: &mut S,
    ) -> Option<SelectionState> {
        let end = self.current(&*surface)?.end;
        self.restore(surface, Some(SelectionState::caret(end)))
    }

    #[must_use]
    pub fn offset_to_position<T: DocumentTree + ?Sized>(&self, tree: &T, offset: usize) -> Position {
        offset_to_position(tree, offset)
    }

    pub fn position_to_offset<T: DocumentTree + ?Sized>(
        &self,
        tree: &T,
        position: Position,
    ) -> Result<usize, SelectionError> {
        position_to_offset(tree, position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal arena document: `<root><p>"Hi "<b>"there"</b></p><p>"!"</p></root>`.
    #[derive(Debug, Default)]
    struct Fixture {
        children: Vec<Vec<NodeId>>,
        texts: Vec<Option<String>>,
        parents: Vec<Option<NodeId>>,
        selection: Option<NativeSelection>,
    }

    impl Fixture {
        fn element(&mut self, parent: Option<NodeId>) -> NodeId {
            self.push(parent, None)
        }

        fn text(&mut self, parent: NodeId, text: &str) -> NodeId {
            self.push(Some(parent), Some(text.to_string()))
        }

        fn push(&mut self, parent: Option<NodeId>, text: Option<String>) -> NodeId {
            let id = NodeId::new(self.texts.len() as u32);
            self.children.push(Vec::new());
            self.texts.push(text);
            self.parents.push(parent);
            if let Some(p) = parent {
                self.children[p.raw() as usize].push(id);
            }
            id
        }

        fn sample() -> (Self, [NodeId; 7]) {
            let mut doc = Self::default();
            let root = doc.element(None);
            let p1 = doc.element(Some(root));
            let hi = Fixture::text(&mut doc, p1, "Hi ");
            let b = doc.element(Some(p1));
            let there = Fixture::text(&mut doc, b, "there");
            let p2 = doc.element(Some(root));
            let bang = Fixture::text(&mut doc, p2, "!");
            (doc, [root, p1, hi, b, there, p2, bang])
        }
    }

    impl DocumentTree for Fixture {
        fn root(&self) -> NodeId {
            NodeId::new(0)
        }
        fn children(&self, node: NodeId) -> &[NodeId] {
            self.children
                .get(node.raw() as usize)
                .map_or(&[][..], Vec::as_slice)
        }
        fn text(&self, node: NodeId) -> Option<&str> {
            self.texts.get(node.raw() as usize)?.as_deref()
        }
        fn parent(&self, node: NodeId) -> Option<NodeId> {
            *self.parents.get(node.raw() as usize)?
        }
        fn contains(&self, node: NodeId) -> bool {
            (node.raw() as usize) < self.texts.len()
        }
    }

    impl DocumentSurface for Fixture {
        fn content(&self) -> String {
            TextNodes::new(self).map(|(_, t)| t).collect()
        }
        fn replace_content(&mut self, _content: &str) {}
        fn selection(&self) -> Option<NativeSelection> {
            self.selection
        }
        fn set_selection(&mut self, selection: NativeSelection) {
            self.selection = Some(selection);
        }
        fn has_focus(&self) -> bool {
            true
        }
        fn focus(&mut self) {}
        fn exec_command(&mut self, _name: &str, _value: Option<&str>) -> bool {
            false
        }
        fn query_command_state(&self, _name: &str) -> bool {
            false
        }
    }

    #[test]
    fn text_nodes_walk_in_document_order() {
        let (doc, _) = Fixture::sample();
        let texts: Vec<&str> = TextNodes::new(&doc).map(|(_, t)| t).collect();
        assert_eq!(texts, ["Hi ", "there", "!"]);
        assert_eq!(text_len(&doc), 9);
    }

    #[test]
    fn text_positions_map_to_offsets() {
        let (doc, [_, _, hi, _, there, _, bang]) = Fixture::sample();
        assert_eq!(position_to_offset(&doc, Position::new(hi, 0)), Ok(0));
        assert_eq!(position_to_offset(&doc, Position::new(hi, 2)), Ok(2));
        assert_eq!(position_to_offset(&doc, Position::new(there, 0)), Ok(3));
        assert_eq!(position_to_offset(&doc, Position::new(there, 5)), Ok(8));
        assert_eq!(position_to_offset(&doc, Position::new(bang, 1)), Ok(9));
    }

    #[test]
    fn element_positions_use_child_boundaries() {
        let (doc, [root, p1, _, b, _, p2, _]) = Fixture::sample();
        // Before <b>.
        assert_eq!(position_to_offset(&doc, Position::new(p1, 1)), Ok(3));
        // After the last child of <p>.
        assert_eq!(position_to_offset(&doc, Position::new(p1, 2)), Ok(8));
        // Inside an element with a single text child.
        assert_eq!(position_to_offset(&doc, Position::new(b, 0)), Ok(3));
        assert_eq!(position_to_offset(&doc, Position::new(p2, 0)), Ok(8));
        assert_eq!(position_to_offset(&doc, Position::new(root, 2)), Ok(9));
    }

    #[test]
    fn out_of_range_positions_are_rejected() {
        let (doc, [_, p1, hi, ..]) = Fixture::sample();
        assert_eq!(
            position_to_offset(&doc, Position::new(hi, 4)),
            Err(SelectionError::OutOfRange { offset: 4, len: 3 })
        );
        assert!(position_to_offset(&doc, Position::new(p1, 3)).is_err());
        assert!(matches!(
            position_to_offset(&doc, Position::new(NodeId::new(99), 0)),
            Err(SelectionError::Detached { .. })
        ));
    }

    #[test]
    fn offsets_map_to_text_positions() {
        let (doc, [_, _, hi, _, there, _, bang]) = Fixture::sample();
        assert_eq!(offset_to_position(&doc, 0), Position::new(hi, 0));
        assert_eq!(offset_to_position(&doc, 2), Position::new(hi, 2));
        // Boundary resolves to the end of the earlier node.
        assert_eq!(offset_to_position(&doc, 3), Position::new(hi, 3));
        assert_eq!(offset_to_position(&doc, 4), Position::new(there, 1));
        assert_eq!(offset_to_position(&doc, 9), Position::new(bang, 1));
    }

    #[test]
    fn offsets_past_end_clamp() {
        let (doc, [.., bang]) = Fixture::sample();
        assert_eq!(offset_to_position(&doc, 500), Position::new(bang, 1));
    }

    #[test]
    fn empty_document_maps_to_root_end() {
        let mut doc = Fixture::default();
        let root = doc.element(None);
        doc.element(Some(root));
        assert_eq!(offset_to_position(&doc, 3), Position::new(root, 1));
        assert_eq!(text_len(&doc), 0);
    }

    #[test]
    fn round_trip_every_offset() {
        let (doc, _) = Fixture::sample();
        for offset in 0..=text_len(&doc) {
            let pos = offset_to_position(&doc, offset);
            assert_eq!(position_to_offset(&doc, pos), Ok(offset));
        }
    }

    #[test]
    fn multibyte_text_counts_chars() {
        let mut doc = Fixture::default();
        let root = doc.element(None);
        let t = Fixture::text(&mut doc, root, "héllo→");
        assert_eq!(text_len(&doc), 6);
        assert_eq!(offset_to_position(&doc, 6), Position::new(t, 6));
        assert_eq!(text_between(&doc, 1, 5), "éllo");
    }

    #[test]
    fn text_between_spans_nodes() {
        let (doc, _) = Fixture::sample();
        assert_eq!(text_between(&doc, 1, 5), "i th");
        assert_eq!(text_between(&doc, 5, 1), "i th");
        assert_eq!(text_between(&doc, 7, 100), "e!");
        assert_eq!(text_between(&doc, 4, 4), "");
    }

    #[test]
    fn no_selection_yields_none() {
        let (doc, _) = Fixture::sample();
        let tracker = SelectionTracker::new();
        assert_eq!(tracker.current(&doc), None);
        assert_eq!(
            tracker.try_current(&doc),
            Err(SelectionError::NoSelection)
        );
    }

    #[test]
    fn detached_selection_yields_none() {
        let (mut doc, _) = Fixture::sample();
        doc.selection = Some(NativeSelection::caret(Position::new(NodeId::new(42), 0)));
        assert_eq!(SelectionTracker::new().current(&doc), None);
    }

    #[test]
    fn backward_selection_is_normalized() {
        let (mut doc, [_, _, hi, _, there, ..]) = Fixture::sample();
        doc.selection = Some(NativeSelection::new(
            Position::new(there, 2),
            Position::new(hi, 1),
        ));
        let state = SelectionTracker::new().current(&doc).unwrap();
        assert_eq!((state.start(), state.end()), (1, 5));
        assert!(state.is_backward());
    }

    #[test]
    fn restore_none_is_noop() {
        let (mut doc, _) = Fixture::sample();
        let mut tracker = SelectionTracker::new();
        assert_eq!(tracker.restore(&mut doc, None), None);
        assert_eq!(doc.selection, None);
    }

    #[test]
    fn restore_clamps_to_document_end() {
        let (mut doc, [.., bang]) = Fixture::sample();
        let mut tracker = SelectionTracker::new();
        let applied = tracker
            .restore(&mut doc, Some(SelectionState::new(4, 40)))
            .unwrap();
        assert_eq!((applied.start(), applied.end()), (4, 9));
        assert_eq!(doc.selection.unwrap().focus, Position::new(bang, 1));
        assert_eq!(tracker.last_known(), Some(applied));
    }

    #[test]
    fn restore_preserves_direction() {
        let (mut doc, _) = Fixture::sample();
        let mut tracker = SelectionTracker::new();
        tracker.restore(&mut doc, Some(SelectionState::from_anchor_focus(6, 2)));
        let native = doc.selection.unwrap();
        assert_eq!(position_to_offset(&doc, native.anchor), Ok(6));
        assert_eq!(position_to_offset(&doc, native.focus), Ok(2));
    }

    #[test]
    fn save_then_restore_round_trips() {
        let (mut doc, [_, _, hi, _, there, ..]) = Fixture::sample();
        doc.selection = Some(NativeSelection::new(
            Position::new(hi, 1),
            Position::new(there, 2),
        ));
        let mut tracker = SelectionTracker::new();
        let saved = tracker.save(&doc);
        doc.selection = None;
        tracker.restore(&mut doc, saved);
        assert_eq!(tracker.current(&doc), saved);
    }

    #[test]
    fn selection_helpers() {
        let (mut doc, _) = Fixture::sample();
        let mut tracker = SelectionTracker::new();
        let all = tracker.select_all(&mut doc);
        assert_eq!((all.start(), all.end()), (0, 9));
        assert_eq!(tracker.selected_text(&doc), "Hi there!");

        let caret = tracker.collapse_to_end(&mut doc).unwrap();
        assert!(caret.is_collapsed());
        assert_eq!(caret.start(), 9);
        assert_eq!(tracker.selected_text(&doc), "");
    }

    #[test]
    fn selection_change_updates_cache() {
        let (mut doc, [_, _, hi, ..]) = Fixture::sample();
        let mut tracker = SelectionTracker::new();
        doc.selection = Some(NativeSelection::caret(Position::new(hi, 2)));
        assert_eq!(
            tracker.on_selection_change(&doc),
            Some(SelectionState::caret(2))
        );
        assert_eq!(tracker.last_known(), Some(SelectionState::caret(2)));
        tracker.invalidate();
        assert_eq!(tracker.last_known(), None);
    }

    #[test]
    fn state_constructors_normalize() {
        let s = SelectionState::new(7, 3);
        assert_eq!((s.start(), s.end(), s.len()), (3, 7, 4));
        assert!(!s.is_backward());
        assert!(SelectionState::caret(5).is_collapsed());
        assert_eq!(SelectionState::new(2, 10).clamped(6), SelectionState::new(2, 6));
        assert!(SelectionState::from_anchor_focus(9, 1).clamped(4).is_backward());
        assert!(!SelectionState::from_anchor_focus(9, 8).clamped(4).is_backward());
    }

    #[test]
    fn equality_tracks_direction() {
        let forward = SelectionState::from_anchor_focus(1, 4);
        let backward = SelectionState::from_anchor_focus(4, 1);
        assert_ne!(forward, backward);
        assert!(forward.same_range(&backward));
        assert!(!forward.same_range(&SelectionState::new(1, 5)));
    }
}
