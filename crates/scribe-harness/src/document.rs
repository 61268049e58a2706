#![forbid(unsafe_code)]

//! In-memory reference host document.
//!
//! [`MemoryDocument`] implements [`DocumentSurface`] over an arena tree so
//! the engine can be exercised without a real document engine. It behaves
//! like a browser editing host where that matters to the engine:
//!
//! - Replacing the content rebuilds every node; old [`NodeId`]s stay
//!   allocated but detached, and the selection is dropped.
//! - Commands need focus and a selection; unknown commands are refused.
//! - Inline formatting applies but does not toggle off.
//!
//! Supported host commands: `bold`, `italic`, `underline`, `strikeThrough`,
//! `subscript`, `superscript`, `insertText`, `formatBlock`, `removeFormat`.
//!
//! The arena only grows. That is fine for tests and demos.

use scribe_core::{
    DocumentSurface, DocumentTree, NativeSelection, NodeId, Position, TextNodes,
    offset_to_position, position_to_offset,
};
use tracing::trace;

use crate::markup::{self, Markup};

const ROOT_TAG: &str = "#root";

const INLINE_TAGS: &[(&str, &str)] = &[
    ("bold", "b"),
    ("italic", "i"),
    ("underline", "u"),
    ("strikeThrough", "s"),
    ("subscript", "sub"),
    ("superscript", "sup"),
];

fn inline_tag(command: &str) -> Option<&'static str> {
    INLINE_TAGS
        .iter()
        .find(|(name, _)| *name == command)
        .map(|(_, tag)| *tag)
}

fn is_inline_format(tag: &str) -> bool {
    INLINE_TAGS.iter().any(|(_, t)| *t == tag)
}

#[derive(Debug, Clone)]
enum NodeData {
    Element(String),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attached: bool,
}

/// One call to the host command primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRecord {
    pub name: String,
    pub value: Option<String>,
    pub accepted: bool,
}

/// Arena-backed editable document.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<Node>,
    root: NodeId,
    selection: Option<NativeSelection>,
    focused: bool,
    focus_resets_selection: bool,
    exec_log: Vec<ExecRecord>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// An empty, unfocused document.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId::new(0),
            selection: None,
            focused: false,
            focus_resets_selection: false,
            exec_log: Vec::new(),
        };
        doc.root = doc.alloc(NodeData::Element(ROOT_TAG.into()), None);
        doc
    }

    #[must_use]
    pub fn from_markup(markup: &str) -> Self {
        let mut doc = Self::new();
        doc.load(markup);
        doc
    }

    // ------------------------------------------------------------------
    // Test controls
    // ------------------------------------------------------------------

    /// Drop focus; the selection is kept.
    pub fn blur(&mut self) {
        self.focused = false;
    }

    /// Make [`focus`](DocumentSurface::focus) collapse the selection to the
    /// start of the document, as some hosts do.
    pub fn set_focus_resets_selection(&mut self, on: bool) {
        self.focus_resets_selection = on;
    }

    /// Select by flattened-text offsets, focusing the document like a user
    /// drag would.
    pub fn select_offsets(&mut self, anchor: usize, focus: usize) {
        let anchor = offset_to_position(&*self, anchor);
        let focus = offset_to_position(&*self, focus);
        self.selection = Some(NativeSelection::new(anchor, focus));
        self.focused = true;
    }

    /// Drop the selection.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Type `text` at the selection, replacing selected text. Without a
    /// selection, types at the end of the document.
    pub fn type_text(&mut self, text: &str) {
        let (start, end) = self.selection_offsets().unwrap_or_else(|| {
            let len = scribe_core::text_len(&*self);
            (len, len)
        });
        self.insert_text(start, end, text);
        self.focused = true;
    }

    /// The flattened text.
    #[must_use]
    pub fn text(&self) -> String {
        TextNodes::new(self).map(|(_, text)| text).collect()
    }

    /// Every call made to the command primitive, in order.
    #[must_use]
    pub fn exec_log(&self) -> &[ExecRecord] {
        &self.exec_log
    }

    /// Number of nodes ever allocated, attached or not.
    #[must_use]
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    // ------------------------------------------------------------------
    // Arena
    // ------------------------------------------------------------------

    fn alloc(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(Node {
            data,
            parent,
            children: Vec::new(),
            attached: true,
        });
        id
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.raw() as usize)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.raw() as usize)
    }

    fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Element(tag) => Some(tag),
            NodeData::Text(_) => None,
        }
    }

    fn load(&mut self, content: &str) {
        for node in &mut self.nodes {
            node.attached = false;
        }
        self.root = self.alloc(NodeData::Element(ROOT_TAG.into()), None);
        let root = self.root;
        for item in markup::parse(content) {
            self.build(item, root);
        }
    }

    fn build(&mut self, item: Markup, parent: NodeId) {
        let (data, children) = match item {
            Markup::Text(text) => (NodeData::Text(text), Vec::new()),
            Markup::Element { tag, children } => (NodeData::Element(tag), children),
        };
        let id = self.alloc(data, Some(parent));
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
        }
        for child in children {
            self.build(child, id);
        }
    }

    fn to_markup(&self, id: NodeId) -> Option<Markup> {
        let node = self.node(id)?;
        Some(match &node.data {
            NodeData::Text(text) => Markup::Text(text.clone()),
            NodeData::Element(tag) => Markup::Element {
                tag: tag.clone(),
                children: node
                    .children
                    .iter()
                    .filter_map(|&c| self.to_markup(c))
                    .collect(),
            },
        })
    }

    fn index_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.node(id)?.parent?;
        let idx = self.node(parent)?.children.iter().position(|&c| c == id)?;
        Some((parent, idx))
    }

    fn has_ancestor_tag(&self, mut id: NodeId, tag: &str) -> bool {
        while let Some(parent) = self.node(id).and_then(|n| n.parent) {
            if self.tag(parent) == Some(tag) {
                return true;
            }
            id = parent;
        }
        false
    }

    /// Text nodes with their `[start, end)` char range.
    fn text_ranges(&self) -> Vec<(NodeId, usize, usize)> {
        let mut acc = 0;
        TextNodes::new(self)
            .map(|(id, text)| {
                let len = text.chars().count();
                let range = (id, acc, acc + len);
                acc += len;
                range
            })
            .collect()
    }

    /// Text nodes overlapping `[start, end)` with the local overlap.
    fn overlapping(&self, start: usize, end: usize) -> Vec<(NodeId, usize, usize)> {
        self.text_ranges()
            .into_iter()
            .filter(|&(_, ns, ne)| ns < end && ne > start)
            .map(|(id, ns, ne)| (id, start.saturating_sub(ns), end.min(ne) - ns))
            .collect()
    }

    fn selection_offsets(&self) -> Option<(usize, usize)> {
        let sel = self.selection?;
        let a = position_to_offset(self, sel.anchor).ok()?;
        let b = position_to_offset(self, sel.focus).ok()?;
        Some((a.min(b), a.max(b)))
    }

    fn select_range(&mut self, start: usize, end: usize) {
        let anchor = offset_to_position(&*self, start);
        let focus = offset_to_position(&*self, end);
        self.selection = Some(NativeSelection::new(anchor, focus));
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Wrap the chars `[from, to)` of a text node in a new `tag` element.
    fn wrap_text(&mut self, id: NodeId, from: usize, to: usize, tag: &str) {
        let Some((parent, idx)) = self.index_in_parent(id) else {
            return;
        };
        let Some(NodeData::Text(text)) = self.node(id).map(|n| n.data.clone()) else {
            return;
        };
        let before: String = text.chars().take(from).collect();
        let middle: String = text.chars().skip(from).take(to - from).collect();
        let after: String = text.chars().skip(to).collect();

        let wrapper = self.alloc(NodeData::Element(tag.into()), Some(parent));
        if let Some(node) = self.node_mut(id) {
            node.data = NodeData::Text(middle);
            node.parent = Some(wrapper);
        }
        if let Some(w) = self.node_mut(wrapper) {
            w.children.push(id);
        }

        let mut replacement = Vec::with_capacity(3);
        if !before.is_empty() {
            replacement.push(self.alloc(NodeData::Text(before), Some(parent)));
        }
        replacement.push(wrapper);
        if !after.is_empty() {
            replacement.push(self.alloc(NodeData::Text(after), Some(parent)));
        }
        if let Some(p) = self.node_mut(parent) {
            p.children.splice(idx..=idx, replacement);
        }
    }

    fn apply_inline(&mut self, tag: &str, start: usize, end: usize) {
        for (id, from, to) in self.overlapping(start, end) {
            if !self.has_ancestor_tag(id, tag) {
                self.wrap_text(id, from, to, tag);
            }
        }
        self.select_range(start, end);
    }

    fn insert_text(&mut self, start: usize, end: usize, value: &str) {
        let at = offset_to_position(&*self, start);
        for (id, from, to) in self.overlapping(start, end) {
            if let Some(Node {
                data: NodeData::Text(text),
                ..
            }) = self.node_mut(id)
            {
                *text = text
                    .chars()
                    .take(from)
                    .chain(text.chars().skip(to))
                    .collect();
            }
        }

        let is_text = matches!(self.node(at.node), Some(Node { data: NodeData::Text(_), .. }));
        if is_text {
            if let Some(Node {
                data: NodeData::Text(text),
                ..
            }) = self.node_mut(at.node)
            {
                let byte = text
                    .char_indices()
                    .nth(at.offset)
                    .map_or(text.len(), |(i, _)| i);
                text.insert_str(byte, value);
            }
        } else {
            let id = self.alloc(NodeData::Text(value.into()), Some(at.node));
            if let Some(p) = self.node_mut(at.node) {
                let idx = at.offset.min(p.children.len());
                p.children.insert(idx, id);
            }
        }

        let caret = start + value.chars().count();
        self.select_range(caret, caret);
    }

    fn format_block(&mut self, start: usize, end: usize, value: &str) -> bool {
        let tag = value
            .trim()
            .trim_start_matches('<')
            .trim_end_matches('>')
            .to_ascii_lowercase();
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
            return false;
        }

        let mut block = offset_to_position(&*self, start).node;
        while let Some(parent) = self.node(block).and_then(|n| n.parent) {
            if parent == self.root {
                break;
            }
            block = parent;
        }
        if block == self.root {
            return false;
        }

        match self.node(block).map(|n| n.data.clone()) {
            Some(NodeData::Element(_)) => {
                if let Some(node) = self.node_mut(block) {
                    node.data = NodeData::Element(tag);
                }
            }
            Some(NodeData::Text(_)) => {
                let Some((parent, idx)) = self.index_in_parent(block) else {
                    return false;
                };
                let wrapper = self.alloc(NodeData::Element(tag), Some(parent));
                if let Some(w) = self.node_mut(wrapper) {
                    w.children.push(block);
                }
                if let Some(node) = self.node_mut(block) {
                    node.parent = Some(wrapper);
                }
                if let Some(p) = self.node_mut(parent) {
                    p.children[idx] = wrapper;
                }
            }
            None => return false,
        }
        self.select_range(start, end);
        true
    }

    fn remove_format(&mut self, start: usize, end: usize) {
        let mut targets = Vec::new();
        for (id, _, _) in self.overlapping(start, end) {
            let mut cur = id;
            while let Some(parent) = self.node(cur).and_then(|n| n.parent) {
                if self.tag(parent).is_some_and(is_inline_format) && !targets.contains(&parent) {
                    targets.push(parent);
                }
                cur = parent;
            }
        }

        // Innermost first, so each unwrap sees a live parent.
        for element in targets {
            let Some((parent, idx)) = self.index_in_parent(element) else {
                continue;
            };
            let children = self
                .node_mut(element)
                .map(|n| std::mem::take(&mut n.children))
                .unwrap_or_default();
            for &child in &children {
                if let Some(c) = self.node_mut(child) {
                    c.parent = Some(parent);
                }
            }
            if let Some(node) = self.node_mut(element) {
                node.attached = false;
                node.parent = None;
            }
            if let Some(p) = self.node_mut(parent) {
                p.children.splice(idx..=idx, children);
            }
        }
        self.select_range(start, end);
    }
}

impl DocumentTree for MemoryDocument {
    fn root(&self) -> NodeId {
        self.root
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map_or(&[][..], |n| n.children.as_slice())
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match &self.node(node)?.data {
            NodeData::Text(text) => Some(text),
            NodeData::Element(_) => None,
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }

    fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|n| n.attached)
    }
}

impl DocumentSurface for MemoryDocument {
    fn content(&self) -> String {
        let nodes: Vec<Markup> = self
            .children(self.root)
            .iter()
            .filter_map(|&c| self.to_markup(c))
            .collect();
        markup::render(&nodes)
    }

    fn replace_content(&mut self, content: &str) {
        self.load(content);
        self.selection = None;
    }

    fn selection(&self) -> Option<NativeSelection> {
        self.selection
    }

    fn set_selection(&mut self, selection: NativeSelection) {
        self.selection = Some(selection);
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn focus(&mut self) {
        self.focused = true;
        if self.focus_resets_selection {
            let start = offset_to_position(&*self, 0);
            self.selection = Some(NativeSelection::caret(start));
        }
    }

    fn exec_command(&mut self, name: &str, value: Option<&str>) -> bool {
        let accepted = self.dispatch(name, value);
        trace!(command = name, ?value, accepted, "exec_command");
        self.exec_log.push(ExecRecord {
            name: name.to_owned(),
            value: value.map(str::to_owned),
            accepted,
        });
        accepted
    }

    fn query_command_state(&self, name: &str) -> bool {
        let tag = match name {
            "insertOrderedList" => "ol",
            "insertUnorderedList" => "ul",
            other => match inline_tag(other) {
                Some(tag) => tag,
                None => return false,
            },
        };
        let Some((start, end)) = self.selection_offsets() else {
            return false;
        };
        if start == end {
            let at = offset_to_position(&*self, start);
            return self.has_ancestor_tag(at.node, tag) || self.tag(at.node) == Some(tag);
        }
        let covered = self.overlapping(start, end);
        !covered.is_empty() && covered.iter().all(|&(id, _, _)| self.has_ancestor_tag(id, tag))
    }
}

impl MemoryDocument {
    fn dispatch(&mut self, name: &str, value: Option<&str>) -> bool {
        if !self.focused {
            return false;
        }
        let Some((start, end)) = self.selection_offsets() else {
            return false;
        };

        if let Some(tag) = inline_tag(name) {
            if start != end {
                self.apply_inline(tag, start, end);
            }
            return true;
        }

        match (name, value) {
            ("insertText", Some(text)) => {
                self.insert_text(start, end, text);
                true
            }
            ("formatBlock", Some(block)) => self.format_block(start, end, block),
            ("removeFormat", _) => {
                self.remove_format(start, end);
                true
            }
            _ => false,
        }
    }
}

/// Build a [`Position`] inside the `n`th text node, for tests that need a
/// native position directly.
#[must_use]
pub fn text_position(doc: &MemoryDocument, n: usize, offset: usize) -> Option<Position> {
    TextNodes::new(doc)
        .nth(n)
        .map(|(id, _)| Position::new(id, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focused(markup: &str, a: usize, b: usize) -> MemoryDocument {
        let mut doc = MemoryDocument::from_markup(markup);
        doc.select_offsets(a, b);
        doc
    }

    #[test]
    fn content_round_trips_markup() {
        let doc = MemoryDocument::from_markup("<p>Hi <b>there</b></p><p>!</p>");
        assert_eq!(doc.content(), "<p>Hi <b>there</b></p><p>!</p>");
        assert_eq!(doc.text(), "Hi there!");
    }

    #[test]
    fn replace_detaches_old_nodes_and_drops_selection() {
        let mut doc = focused("<p>Hello</p>", 0, 2);
        let old = doc.selection().map(|s| s.anchor.node);
        assert_eq!(doc.arena_len(), 3);
        doc.replace_content("<p>World</p>");
        // Detached nodes keep their slots so stale ids never alias new ones.
        assert_eq!(doc.arena_len(), 6);
        assert!(doc.selection().is_none());
        assert!(old.is_some_and(|n| !doc.contains(n)));
        assert_eq!(doc.content(), "<p>World</p>");
    }

    #[test]
    fn bold_wraps_within_text_node() {
        let mut doc = focused("<p>Hello</p>", 1, 4);
        assert!(doc.exec_command("bold", None));
        assert_eq!(doc.content(), "<p>H<b>ell</b>o</p>");
        assert_eq!(doc.selection_offsets(), Some((1, 4)));
    }

    #[test]
    fn italic_spans_text_nodes() {
        let mut doc = focused("<p>ab<b>cd</b>ef</p>", 1, 5);
        assert!(doc.exec_command("italic", None));
        assert_eq!(
            doc.content(),
            "<p>a<i>b</i><b><i>cd</i></b><i>e</i>f</p>"
        );
        assert_eq!(doc.text(), "abcdef");
    }

    #[test]
    fn already_formatted_text_is_left_alone() {
        let mut doc = focused("<p><b>Hello</b></p>", 0, 5);
        assert!(doc.exec_command("bold", None));
        assert_eq!(doc.content(), "<p><b>Hello</b></p>");
    }

    #[test]
    fn commands_need_focus_and_selection() {
        let mut doc = MemoryDocument::from_markup("<p>Hello</p>");
        assert!(!doc.exec_command("bold", None));
        doc.select_offsets(0, 5);
        doc.blur();
        assert!(!doc.exec_command("bold", None));
        assert_eq!(doc.exec_log().len(), 2);
        assert!(doc.exec_log().iter().all(|r| !r.accepted));
    }

    #[test]
    fn unknown_command_is_refused() {
        let mut doc = focused("<p>Hello</p>", 0, 5);
        assert!(!doc.exec_command("insertHorizontalRule", None));
        assert!(!doc.exec_command("sparkle", None));
    }

    #[test]
    fn insert_text_replaces_selection() {
        let mut doc = focused("<p>Hello</p>", 1, 4);
        assert!(doc.exec_command("insertText", Some("ipp")));
        assert_eq!(doc.content(), "<p>Hippo</p>");
        assert_eq!(doc.selection_offsets(), Some((4, 4)));
    }

    #[test]
    fn insert_text_into_empty_document() {
        let mut doc = MemoryDocument::new();
        doc.select_offsets(0, 0);
        assert!(doc.exec_command("insertText", Some("A")));
        assert_eq!(doc.content(), "A");
    }

    #[test]
    fn type_text_appends_without_selection() {
        let mut doc = MemoryDocument::from_markup("<p>A</p>");
        doc.type_text("B");
        assert_eq!(doc.content(), "<p>AB</p>");
    }

    #[test]
    fn format_block_renames_top_level_block() {
        let mut doc = focused("<p>Title</p><p>Body</p>", 1, 1);
        assert!(doc.exec_command("formatBlock", Some("<H1>")));
        assert_eq!(doc.content(), "<h1>Title</h1><p>Body</p>");
    }

    #[test]
    fn format_block_wraps_bare_text() {
        let mut doc = focused("plain", 0, 0);
        assert!(doc.exec_command("formatBlock", Some("p")));
        assert_eq!(doc.content(), "<p>plain</p>");
    }

    #[test]
    fn remove_format_unwraps_inline_elements() {
        let mut doc = focused("<p><b><i>x</i></b>y</p>", 0, 1);
        assert!(doc.exec_command("removeFormat", None));
        assert_eq!(doc.content(), "<p>xy</p>");
    }

    #[test]
    fn query_state_follows_ancestors() {
        let doc = focused("<p><b>Hello</b> world</p>", 1, 2);
        assert!(doc.query_command_state("bold"));
        assert!(!doc.query_command_state("italic"));
        assert!(!doc.query_command_state("justifyCenter"));

        let doc = focused("<p><b>Hello</b> world</p>", 3, 8);
        assert!(!doc.query_command_state("bold"));
    }

    #[test]
    fn query_state_without_selection_is_false() {
        let doc = MemoryDocument::from_markup("<p><b>Hello</b></p>");
        assert!(!doc.query_command_state("bold"));
    }

    #[test]
    fn focus_reset_collapses_selection() {
        let mut doc = focused("<p>Hello</p>", 2, 4);
        doc.blur();
        doc.set_focus_resets_selection(true);
        doc.focus();
        assert_eq!(doc.selection_offsets(), Some((0, 0)));
    }

    #[test]
    fn text_position_helper() {
        let doc = MemoryDocument::from_markup("<p>a<b>bc</b></p>");
        let pos = text_position(&doc, 1, 1).map(|p| position_to_offset(&doc, p));
        assert_eq!(pos, Some(Ok(2)));
    }
}
