#![forbid(unsafe_code)]

//! Host document boundary.
//!
//! Scribe never owns the formatted document. The host engine does, and it
//! exposes two capabilities that every core component receives explicitly:
//!
//! - [`DocumentTree`]: read-only structural access (root, children, text
//!   nodes) used by the selection tracker to walk the document in a single
//!   canonical order.
//! - [`DocumentSurface`]: the editable surface on top of the tree. Reading and
//!   replacing the serialized content, native selection access, focus, and the
//!   host's command primitives.
//!
//! # Native Addressing
//!
//! A [`Position`] follows DOM boundary-point semantics:
//!
//! ```text
//! <p>He|llo <b>wor|ld</b></p>
//!      ^             ^
//!      text("Hello ", 2)
//!                    text("world", 3)
//!
//! <p>Hello <b>world</b>|</p>
//!                      ^
//!                      element(p, 2)   child index, after <b>
//! ```
//!
//! Text offsets count `char`s, not bytes.

use std::fmt;

/// Opaque identity of a node in the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a node identity from a raw host index.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw host index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A point in the host's native addressing scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Container node.
    pub node: NodeId,
    /// Char offset for text nodes, child index for element nodes.
    pub offset: usize,
}

impl Position {
    #[must_use]
    pub const fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// The host's selection: an anchor where it started and a focus where it
/// currently ends. The focus may precede the anchor (backward selection).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeSelection {
    pub anchor: Position,
    pub focus: Position,
}

impl NativeSelection {
    #[must_use]
    pub const fn new(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    /// A collapsed selection (caret) at `at`.
    #[must_use]
    pub const fn caret(at: Position) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }
}

/// Structural, read-only view of the host document.
///
/// Implementations must report the same children order on every call between
/// two mutations; the selection tracker relies on it for offset arithmetic.
pub trait DocumentTree {
    /// The document root. Always an element.
    fn root(&self) -> NodeId;

    /// Children of `node` in document order. Empty for text nodes and for
    /// nodes that are not part of the document.
    fn children(&self, node: NodeId) -> &[NodeId];

    /// Text of `node` if it is a text node.
    fn text(&self, node: NodeId) -> Option<&str>;

    /// Parent of `node`, `None` for the root or detached nodes.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Whether `node` is currently attached under [`root`](Self::root).
    fn contains(&self, node: NodeId) -> bool;
}

/// The editable surface the host engine exposes to Scribe.
pub trait DocumentSurface: DocumentTree {
    /// Full serialized document state.
    fn content(&self) -> String;

    /// Replace the whole document from serialized state. Any native selection
    /// pointing into replaced nodes is dropped by the host.
    fn replace_content(&mut self, content: &str);

    /// Current native selection, if any.
    fn selection(&self) -> Option<NativeSelection>;

    /// Establish a native selection. Positions are assumed valid.
    fn set_selection(&mut self, selection: NativeSelection);

    /// Whether the surface has input focus.
    fn has_focus(&self) -> bool;

    /// Give the surface input focus. Hosts may move the selection.
    fn focus(&mut self);

    /// Apply a host formatting command to the current selection.
    ///
    /// Returns `false` when the host does not support the command or could
    /// not apply it.
    fn exec_command(&mut self, name: &str, value: Option<&str>) -> bool;

    /// Whether a formatting attribute applies at the current selection.
    fn query_command_state(&self, name: &str) -> bool;
}
