//! The content-tree capability boundary.
//!
//! The selection core never owns document content. It consumes a hierarchical
//! content tree through the [`ContentTree`] trait: leaf/line lookup by model
//! index, node inspection for normalizing raw platform positions, and hosting
//! of the zero-width cursor marker. Any tree that renders the document for
//! editing (a browser DOM layer, an in-memory host) can implement it.

use smol_str::SmolStr;

/// What a tree node is, for mixed-node dispatch.
///
/// `Text` is a raw character run, `Container` is an element with addressable
/// children (lines, inline format wrappers, the editable root), and `Leaf` is
/// a childless addressable unit (an embed) or the cursor marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Text,
    Container,
    Leaf,
}

/// Scope of a format attribute, as reported by the tree's registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatScope {
    /// Character-level attribute; may be pre-armed at a collapsed caret.
    Inline,
    /// Line-level attribute; never applies to a caret.
    Block,
}

/// Value recorded for a pending format attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatValue {
    Flag(bool),
    Name(SmolStr),
}

/// One endpoint of a native selection: a tree node plus an offset into it.
///
/// For `Text` nodes the offset counts characters; for containers it counts
/// children (an offset equal to the child count means "after everything").
#[derive(Clone, Debug, PartialEq)]
pub struct NativePosition<N> {
    pub node: N,
    pub offset: usize,
}

impl<N> NativePosition<N> {
    pub fn new(node: N, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A raw platform selection: anchor-to-focus endpoint pair, in whatever order
/// the platform reported them.
#[derive(Clone, Debug, PartialEq)]
pub struct RawRange<N> {
    pub start: NativePosition<N>,
    pub end: NativePosition<N>,
}

impl<N: Clone> RawRange<N> {
    pub fn new(start: NativePosition<N>, end: NativePosition<N>) -> Self {
        Self { start, end }
    }

    /// A collapsed raw range with both endpoints at `position`.
    pub fn caret(position: NativePosition<N>) -> Self {
        Self {
            start: position.clone(),
            end: position,
        }
    }
}

impl<N: PartialEq> RawRange<N> {
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// A raw range whose endpoints have been descended to addressable leaf-level
/// positions. The original raw pair is kept so the platform selection can be
/// restored without a redundant native call.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedRange<N> {
    pub start: NativePosition<N>,
    pub end: NativePosition<N>,
    pub raw: RawRange<N>,
}

/// The capability set the selection core needs from the content tree.
///
/// Model addressing: every leaf covers a contiguous span of the document,
/// lines additionally own a trailing newline slot, and `length()` is the sum
/// over all lines. Boundary indexes stay with the preceding leaf unless the
/// following sibling is zero-length (the attached marker), which is entered
/// instead. That is what routes a caret at a split point into the marker.
pub trait ContentTree {
    /// Handle to a tree node. Handles stay comparable after the node is
    /// detached; detached nodes simply stop being `contains`-reachable.
    type Node: Clone + PartialEq + std::fmt::Debug;

    /// The editable root.
    fn root(&self) -> Self::Node;

    /// Parent of `node`, if attached and not the root.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Whether `node` is the root or a live descendant of it.
    fn contains(&self, node: &Self::Node) -> bool {
        let root = self.root();
        let mut current = node.clone();
        loop {
            if current == root {
                return true;
            }
            match self.parent(&current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn kind(&self, node: &Self::Node) -> NodeKind;

    fn child_count(&self, node: &Self::Node) -> usize;

    fn child(&self, node: &Self::Node, index: usize) -> Option<Self::Node>;

    /// Character count of a `Text` node; zero for any other kind.
    fn text_len(&self, node: &Self::Node) -> usize;

    /// Total document length, including each line's trailing newline slot.
    fn length(&self) -> usize;

    /// Span length of `node` in model coordinates (a line includes its
    /// newline slot; the marker is zero).
    fn node_length(&self, node: &Self::Node) -> usize;

    /// Cumulative model offset of `node` relative to the document start.
    fn offset_of(&self, node: &Self::Node) -> usize;

    /// The addressable unit owning `node`: the node itself when it is
    /// leaf-level, otherwise the nearest registered ancestor (the marker's
    /// inner text node resolves to the marker).
    fn nearest_blot(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Deepest addressable unit at model `index`, with the residual offset
    /// into it. May resolve to a line when `index` sits in its newline slot.
    fn leaf_at(&self, index: usize) -> Option<(Self::Node, usize)>;

    /// Line containing model `index`, with the residual offset into it.
    fn line_at(&self, index: usize) -> Option<(Self::Node, usize)>;

    /// Model offset of `(node, offset)` within `leaf`.
    fn leaf_index(&self, leaf: &Self::Node, node: &Self::Node, offset: usize) -> usize;

    /// Concrete native position for a local offset within `leaf`.
    ///
    /// With `prefer_end` set (used for the end endpoint of a selection), an
    /// offset sitting exactly at the leaf's end is re-attached to the start
    /// of the following non-empty leaf, so a selection spanning a boundary
    /// attaches to the leaf that visually contains it.
    fn leaf_position(
        &self,
        leaf: &Self::Node,
        offset: usize,
        prefer_end: bool,
    ) -> NativePosition<Self::Node>;

    /// Registry scope of a format name; `None` for unknown formats.
    fn format_scope(&self, name: &str) -> Option<FormatScope>;

    // === Cursor marker hosting ===
    //
    // The marker is owned by the tree: one zero-length leaf, created with the
    // tree and attached/detached repeatedly for its lifetime.

    fn marker_attached(&self) -> bool;

    /// The marker's inner text node, while attached.
    fn marker_text_node(&self) -> Option<Self::Node>;

    /// Caret position at the end of the marker's text content.
    fn marker_caret(&self) -> Option<NativePosition<Self::Node>>;

    /// Split a leaf-level node at `offset`, returning the node that now
    /// follows the split point: the node itself at offset zero, the next
    /// sibling (if any) at the end, otherwise the newly created right half.
    fn split_leaf(&mut self, leaf: &Self::Node, offset: usize) -> Option<Self::Node>;

    /// Attach the marker under `parent`, before `before` (at the end when
    /// `None`). Detaches first if currently attached elsewhere.
    fn attach_marker(&mut self, parent: &Self::Node, before: Option<&Self::Node>);

    /// Record a pending format on the attached marker.
    fn set_marker_format(&mut self, name: &str, value: FormatValue);

    /// Detach the marker and return the equivalent native caret position,
    /// or `None` when it was not attached.
    fn restore_marker(&mut self) -> Option<RawRange<Self::Node>>;

    /// Re-optimize structure after a mutation (merge adjacent runs, drop
    /// empty nodes). Must leave the attached marker in place.
    fn optimize(&mut self);
}
