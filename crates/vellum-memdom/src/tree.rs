//! Arena-backed in-memory content tree.
//!
//! Mirrors the shape the selection core sees in a rendered document: an
//! editable root containing line containers, whose children are raw text
//! runs, inline format wrappers (each wrapping a text run), childless embeds,
//! and, while armed, the zero-width cursor marker. Model addressing follows
//! the rendered-document convention: each line owns a trailing newline slot,
//! so a line's span is its content length plus one.
//!
//! Node handles are arena indexes and are never reused; detaching a node
//! leaves the handle comparable but unreachable from the root.

use std::collections::HashMap;

use smol_str::SmolStr;
use vellum_selection::{
    ContentTree, FormatScope, FormatValue, NativePosition, NodeKind, RawRange,
};

/// Zero-width placeholder carried by the marker's text node.
const MARKER_TEXT: &str = "\u{FEFF}";

/// Placeholder character embeds contribute to the plain-text rendering.
const EMBED_CHAR: char = '\u{FFFC}';

/// Handle to a node in the arena. Stable for the life of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MemKind {
    Root,
    Line,
    Inline,
    Text,
    Embed,
    Marker,
}

#[derive(Debug)]
struct NodeData {
    kind: MemKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    text: String,
    formats: HashMap<SmolStr, FormatValue>,
}

impl NodeData {
    fn new(kind: MemKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            text: String::new(),
            formats: HashMap::new(),
        }
    }
}

/// In-memory content tree implementing the selection core's tree capability.
#[derive(Debug)]
pub struct MemoryTree {
    nodes: Vec<NodeData>,
    root: NodeId,
    marker: NodeId,
    marker_text: NodeId,
}

impl MemoryTree {
    /// An empty document: a root with a single empty line. The cursor marker
    /// is created here, detached, and lives as long as the tree.
    pub fn new() -> Self {
        let mut nodes = Vec::new();
        nodes.push(NodeData::new(MemKind::Root));
        let root = NodeId(0);

        nodes.push(NodeData::new(MemKind::Marker));
        let marker = NodeId(1);
        let mut marker_text = NodeData::new(MemKind::Text);
        marker_text.text = MARKER_TEXT.to_string();
        marker_text.parent = Some(marker);
        nodes.push(marker_text);
        let marker_text = NodeId(2);
        nodes[marker.0].children.push(marker_text);

        let mut tree = Self {
            nodes,
            root,
            marker,
            marker_text,
        };
        tree.add_line();
        tree
    }

    /// Build a document from plain text; one line per `\n`-separated segment,
    /// each non-empty segment a single unformatted run.
    pub fn with_text(content: &str) -> Self {
        let mut tree = Self::new();
        for (i, segment) in content.split('\n').enumerate() {
            let line = if i == 0 {
                tree.line(0)
            } else {
                Some(tree.add_line())
            };
            if let (Some(line), false) = (line, segment.is_empty()) {
                tree.append_text(line, segment);
            }
        }
        tree
    }

    // === Construction & mutation (the external editor's side of the tree) ===

    /// Append a new empty line to the root.
    pub fn add_line(&mut self) -> NodeId {
        let line = self.alloc(NodeData::new(MemKind::Line));
        self.adopt(self.root, line, None);
        line
    }

    /// Append an unformatted text run to a line.
    pub fn append_text(&mut self, line: NodeId, text: &str) -> NodeId {
        let node = self.alloc_text(text);
        self.adopt(line, node, None);
        node
    }

    /// Append a format wrapper holding one text run; returns
    /// `(wrapper, text)`.
    pub fn append_formatted_text(
        &mut self,
        line: NodeId,
        text: &str,
        formats: impl IntoIterator<Item = (SmolStr, FormatValue)>,
    ) -> (NodeId, NodeId) {
        let wrapper = self.alloc(NodeData::new(MemKind::Inline));
        self.nodes[wrapper.0].formats = formats.into_iter().collect();
        let node = self.alloc_text(text);
        self.adopt(wrapper, node, None);
        self.adopt(line, wrapper, None);
        (wrapper, node)
    }

    /// Append a childless embed (length one) to a line.
    pub fn append_embed(&mut self, line: NodeId) -> NodeId {
        let node = self.alloc(NodeData::new(MemKind::Embed));
        self.adopt(line, node, None);
        node
    }

    /// Detach a node (and its subtree) from the document.
    pub fn remove_node(&mut self, node: NodeId) {
        self.detach(node);
    }

    /// Commit one typed character at the marker: the character takes the
    /// marker's pending formats, lands at the marker's position, and the
    /// marker detaches. Returns `false` when the marker is not attached.
    pub fn commit_typed_char(&mut self, ch: char) -> bool {
        let Some(parent) = self.nodes[self.marker.0].parent else {
            return false;
        };
        let Some(index) = self.index_in_parent(self.marker) else {
            return false;
        };
        let formats = self.nodes[self.marker.0].formats.clone();
        let node = if formats.is_empty() {
            self.alloc_text(&ch.to_string())
        } else {
            let wrapper = self.alloc(NodeData::new(MemKind::Inline));
            self.nodes[wrapper.0].formats = formats;
            let text = self.alloc_text(&ch.to_string());
            self.adopt(wrapper, text, None);
            wrapper
        };
        self.adopt(parent, node, Some(index));
        self.restore_marker();
        self.optimize();
        true
    }

    // === Inspection helpers ===

    /// Line node at position `index` under the root.
    pub fn line(&self, index: usize) -> Option<NodeId> {
        self.nodes[self.root.0].children.get(index).copied()
    }

    /// Content of a text node.
    pub fn node_text(&self, node: NodeId) -> Option<&str> {
        match self.nodes[node.0].kind {
            MemKind::Text => Some(&self.nodes[node.0].text),
            _ => None,
        }
    }

    /// Formats recorded on an inline wrapper (or pending on the marker).
    pub fn node_formats(&self, node: NodeId) -> &HashMap<SmolStr, FormatValue> {
        &self.nodes[node.0].formats
    }

    /// Pending formats currently recorded on the marker.
    pub fn marker_formats(&self) -> &HashMap<SmolStr, FormatValue> {
        &self.nodes[self.marker.0].formats
    }

    /// First attached text node whose content equals `content`.
    pub fn find_text(&self, content: &str) -> Option<NodeId> {
        (0..self.nodes.len())
            .map(NodeId)
            .find(|&id| {
                self.nodes[id.0].kind == MemKind::Text
                    && id != self.marker_text
                    && self.nodes[id.0].text == content
                    && self.contains(&id)
            })
    }

    /// Plain-text rendering: line contents joined with a newline per line.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for &line in &self.nodes[self.root.0].children {
            self.collect_text(line, &mut out);
            out.push('\n');
        }
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match self.nodes[node.0].kind {
            MemKind::Text => out.push_str(&self.nodes[node.0].text),
            MemKind::Embed => out.push(EMBED_CHAR),
            MemKind::Marker => {}
            _ => {
                for &child in &self.nodes[node.0].children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    // === Internals ===

    fn alloc(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(data);
        NodeId(self.nodes.len() - 1)
    }

    fn alloc_text(&mut self, text: &str) -> NodeId {
        let mut data = NodeData::new(MemKind::Text);
        data.text = text.to_string();
        self.alloc(data)
    }

    /// Insert `child` under `parent` at `index` (append when `None`),
    /// detaching it from any previous parent first.
    fn adopt(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        match index {
            Some(i) if i <= children.len() => children.insert(i, child),
            _ => children.push(child),
        }
        self.nodes[child.0].parent = Some(parent);
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.nodes[node.0].parent?;
        self.nodes[parent.0].children.iter().position(|&c| c == node)
    }

    fn is_leaf_level(&self, node: NodeId) -> bool {
        matches!(
            self.nodes[node.0].kind,
            MemKind::Text | MemKind::Embed | MemKind::Marker
        )
    }

    fn length_of(&self, node: NodeId) -> usize {
        match self.nodes[node.0].kind {
            MemKind::Text => {
                if node == self.marker_text {
                    0
                } else {
                    self.nodes[node.0].text.chars().count()
                }
            }
            MemKind::Embed => 1,
            MemKind::Marker => 0,
            MemKind::Inline | MemKind::Root => self.nodes[node.0]
                .children
                .iter()
                .map(|&c| self.length_of(c))
                .sum(),
            MemKind::Line => {
                let content: usize = self.nodes[node.0]
                    .children
                    .iter()
                    .map(|&c| self.length_of(c))
                    .sum();
                content + 1
            }
        }
    }

    /// Document-order successor of `leaf` with nonzero length, if its span
    /// starts exactly at `target` (the bias must preserve the model index).
    fn following_leaf_at(&self, leaf: NodeId, target: usize) -> Option<NodeId> {
        let mut current = leaf;
        loop {
            let parent = self.nodes[current.0].parent?;
            let index = self.index_in_parent(current)?;
            let siblings = &self.nodes[parent.0].children;
            if let Some(&next) = siblings.get(index + 1) {
                let mut node = next;
                while !self.is_leaf_level(node) {
                    match self.nodes[node.0].children.first() {
                        Some(&child) => node = child,
                        None => break,
                    }
                }
                if self.is_leaf_level(node) && self.length_of(node) > 0 {
                    if self.offset_of(&node) == target {
                        return Some(node);
                    }
                    return None;
                }
                current = next;
                continue;
            }
            current = parent;
        }
    }

    fn leaf_start(&self, leaf: NodeId) -> NativePosition<NodeId> {
        match self.nodes[leaf.0].kind {
            MemKind::Embed => {
                if let (Some(parent), Some(index)) =
                    (self.nodes[leaf.0].parent, self.index_in_parent(leaf))
                {
                    NativePosition::new(parent, index)
                } else {
                    NativePosition::new(leaf, 0)
                }
            }
            _ => NativePosition::new(leaf, 0),
        }
    }

    fn optimize_container(&mut self, node: NodeId) {
        // Recurse first so nested wrappers settle before merging here.
        let children = self.nodes[node.0].children.clone();
        for child in children {
            if self.nodes[child.0].kind == MemKind::Inline {
                self.optimize_container(child);
            }
        }

        // Drop empty text runs and emptied wrappers.
        let empties: Vec<NodeId> = self.nodes[node.0]
            .children
            .iter()
            .copied()
            .filter(|&c| match self.nodes[c.0].kind {
                MemKind::Text => self.nodes[c.0].text.is_empty(),
                MemKind::Inline => self.nodes[c.0].children.is_empty(),
                _ => false,
            })
            .collect();
        for empty in empties {
            self.detach(empty);
        }

        // Merge adjacent raw text runs. The attached marker sits between
        // split halves and keeps them apart.
        let mut i = 0;
        while i + 1 < self.nodes[node.0].children.len() {
            let a = self.nodes[node.0].children[i];
            let b = self.nodes[node.0].children[i + 1];
            if self.nodes[a.0].kind == MemKind::Text && self.nodes[b.0].kind == MemKind::Text {
                let tail = self.nodes[b.0].text.clone();
                self.nodes[a.0].text.push_str(&tail);
                self.detach(b);
            } else {
                i += 1;
            }
        }
    }
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentTree for MemoryTree {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.root
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn kind(&self, node: &NodeId) -> NodeKind {
        match self.nodes[node.0].kind {
            MemKind::Text => NodeKind::Text,
            MemKind::Root | MemKind::Line | MemKind::Inline => NodeKind::Container,
            MemKind::Embed | MemKind::Marker => NodeKind::Leaf,
        }
    }

    fn child_count(&self, node: &NodeId) -> usize {
        self.nodes[node.0].children.len()
    }

    fn child(&self, node: &NodeId, index: usize) -> Option<NodeId> {
        self.nodes[node.0].children.get(index).copied()
    }

    fn text_len(&self, node: &NodeId) -> usize {
        match self.nodes[node.0].kind {
            MemKind::Text => self.nodes[node.0].text.chars().count(),
            _ => 0,
        }
    }

    fn length(&self) -> usize {
        self.length_of(self.root)
    }

    fn node_length(&self, node: &NodeId) -> usize {
        self.length_of(*node)
    }

    fn offset_of(&self, node: &NodeId) -> usize {
        let mut offset = 0;
        let mut current = *node;
        while let Some(parent) = self.nodes[current.0].parent {
            for &sibling in &self.nodes[parent.0].children {
                if sibling == current {
                    break;
                }
                offset += self.length_of(sibling);
            }
            current = parent;
        }
        offset
    }

    fn nearest_blot(&self, node: &NodeId) -> Option<NodeId> {
        // The marker's inner text node has no identity of its own; it
        // resolves to the marker.
        if *node == self.marker_text {
            Some(self.marker)
        } else {
            Some(*node)
        }
    }

    fn leaf_at(&self, index: usize) -> Option<(NodeId, usize)> {
        let mut node = self.root;
        let mut idx = index;
        loop {
            if self.is_leaf_level(node) {
                return Some((node, idx));
            }
            let entry_idx = idx;
            let children = &self.nodes[node.0].children;
            let mut matched = None;
            for (i, &child) in children.iter().enumerate() {
                let len = self.length_of(child);
                let next_len = children.get(i + 1).map(|&n| self.length_of(n));
                // A boundary index stays with this child unless the next
                // sibling is zero-length (the marker), which is entered
                // instead.
                if idx < len || (idx == len && next_len.is_none_or(|l| l != 0)) {
                    matched = Some(child);
                    break;
                }
                idx -= len;
            }
            match matched {
                Some(child) => node = child,
                // Bottomed out on a container (a line's newline slot, or an
                // empty line): the container itself is the addressable unit.
                None => return Some((node, entry_idx)),
            }
        }
    }

    fn line_at(&self, index: usize) -> Option<(NodeId, usize)> {
        let mut idx = index;
        let children = &self.nodes[self.root.0].children;
        for (i, &line) in children.iter().enumerate() {
            let len = self.length_of(line);
            let last = i + 1 == children.len();
            if idx < len || (idx == len && last) {
                return Some((line, idx));
            }
            idx -= len;
        }
        None
    }

    fn leaf_index(&self, leaf: &NodeId, node: &NodeId, offset: usize) -> usize {
        match self.nodes[leaf.0].kind {
            MemKind::Marker => 0,
            MemKind::Text => {
                if node == leaf {
                    offset.min(self.text_len(leaf))
                } else {
                    0
                }
            }
            MemKind::Embed => {
                if node == leaf {
                    offset.min(1)
                } else {
                    0
                }
            }
            _ => 0,
        }
    }

    fn leaf_position(&self, leaf: &NodeId, offset: usize, prefer_end: bool) -> NativePosition<NodeId> {
        match self.nodes[leaf.0].kind {
            MemKind::Text => {
                let len = self.text_len(leaf);
                if prefer_end && offset == len {
                    let target = self.offset_of(leaf) + offset;
                    if let Some(next) = self.following_leaf_at(*leaf, target) {
                        return self.leaf_start(next);
                    }
                }
                NativePosition::new(*leaf, offset.min(len))
            }
            MemKind::Marker => NativePosition::new(self.marker_text, 1),
            MemKind::Embed => {
                if let (Some(parent), Some(index)) =
                    (self.nodes[leaf.0].parent, self.index_in_parent(*leaf))
                {
                    NativePosition::new(parent, index + usize::from(offset > 0))
                } else {
                    NativePosition::new(*leaf, 0)
                }
            }
            // A line (or the root) reached through its newline slot:
            // position after the element when the offset is inside it.
            MemKind::Line | MemKind::Inline => {
                if let (Some(parent), Some(index)) =
                    (self.nodes[leaf.0].parent, self.index_in_parent(*leaf))
                {
                    NativePosition::new(parent, index + usize::from(offset > 0))
                } else {
                    NativePosition::new(*leaf, 0)
                }
            }
            MemKind::Root => NativePosition::new(self.root, 0),
        }
    }

    fn format_scope(&self, name: &str) -> Option<FormatScope> {
        match name {
            "bold" | "italic" | "underline" | "strike" | "code" | "link" | "color" => {
                Some(FormatScope::Inline)
            }
            "header" | "list" | "align" | "blockquote" | "code-block" => Some(FormatScope::Block),
            _ => None,
        }
    }

    fn marker_attached(&self) -> bool {
        self.nodes[self.marker.0].parent.is_some()
    }

    fn marker_text_node(&self) -> Option<NodeId> {
        if self.marker_attached() {
            Some(self.marker_text)
        } else {
            None
        }
    }

    fn marker_caret(&self) -> Option<NativePosition<NodeId>> {
        if self.marker_attached() {
            Some(NativePosition::new(self.marker_text, 1))
        } else {
            None
        }
    }

    fn split_leaf(&mut self, leaf: &NodeId, offset: usize) -> Option<NodeId> {
        if offset == 0 {
            return Some(*leaf);
        }
        match self.nodes[leaf.0].kind {
            MemKind::Text => {
                let len = self.text_len(leaf);
                if offset >= len {
                    return self.next_sibling(*leaf);
                }
                let byte = self.nodes[leaf.0]
                    .text
                    .char_indices()
                    .nth(offset)
                    .map(|(b, _)| b)?;
                let tail = self.nodes[leaf.0].text.split_off(byte);
                let parent = self.nodes[leaf.0].parent?;
                let index = self.index_in_parent(*leaf)?;
                let right = self.alloc_text(&tail);
                self.adopt(parent, right, Some(index + 1));
                Some(right)
            }
            _ => self.next_sibling(*leaf),
        }
    }

    fn attach_marker(&mut self, parent: &NodeId, before: Option<&NodeId>) {
        let index = before.and_then(|b| {
            self.nodes[parent.0].children.iter().position(|c| c == b)
        });
        self.adopt(*parent, self.marker, index);
        self.nodes[self.marker_text.0].text = MARKER_TEXT.to_string();
        tracing::trace!(target: "vellum::memdom", parent = ?parent, "attached cursor marker");
    }

    fn set_marker_format(&mut self, name: &str, value: FormatValue) {
        self.nodes[self.marker.0]
            .formats
            .insert(SmolStr::new(name), value);
    }

    fn restore_marker(&mut self) -> Option<RawRange<NodeId>> {
        if !self.marker_attached() {
            return None;
        }
        let parent = self.nodes[self.marker.0].parent?;
        let index = self.index_in_parent(self.marker)?;
        let siblings = &self.nodes[parent.0].children;
        let previous = index.checked_sub(1).and_then(|i| siblings.get(i).copied());
        let next = siblings.get(index + 1).copied();

        let position = match (previous, next) {
            (Some(prev), _) if self.nodes[prev.0].kind == MemKind::Text => {
                NativePosition::new(prev, self.text_len(&prev))
            }
            (_, Some(next)) if self.nodes[next.0].kind == MemKind::Text => {
                NativePosition::new(next, 0)
            }
            _ => NativePosition::new(parent, index),
        };

        self.detach(self.marker);
        self.nodes[self.marker.0].formats.clear();
        self.nodes[self.marker_text.0].text = MARKER_TEXT.to_string();
        tracing::trace!(target: "vellum::memdom", restored = ?position, "restored cursor marker");
        Some(RawRange::caret(position))
    }

    fn optimize(&mut self) {
        let lines = self.nodes[self.root.0].children.clone();
        for line in lines {
            self.optimize_container(line);
        }
    }
}

impl MemoryTree {
    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes[node.0].parent?;
        let index = self.index_in_parent(node)?;
        self.nodes[parent.0].children.get(index + 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths_include_newline_slots() {
        let tree = MemoryTree::with_text("ab\ncde");
        // "ab" + newline, "cde" + newline
        assert_eq!(tree.length(), 7);
        let line = tree.line(0).unwrap();
        assert_eq!(tree.node_length(&line), 3);
    }

    #[test]
    fn test_empty_document_has_one_line() {
        let tree = MemoryTree::new();
        assert_eq!(tree.length(), 1);
        assert_eq!(tree.plain_text(), "\n");
    }

    #[test]
    fn test_leaf_at_interior_and_boundary() {
        let tree = MemoryTree::with_text("ab\ncde");
        let text_ab = tree.find_text("ab").unwrap();
        let text_cde = tree.find_text("cde").unwrap();

        assert_eq!(tree.leaf_at(1), Some((text_ab, 1)));
        // Newline slot stays with the line's last run.
        assert_eq!(tree.leaf_at(2), Some((text_ab, 2)));
        assert_eq!(tree.leaf_at(4), Some((text_cde, 1)));
    }

    #[test]
    fn test_leaf_at_enters_zero_length_marker() {
        let mut tree = MemoryTree::with_text("ab");
        let text = tree.find_text("ab").unwrap();
        let right = tree.split_leaf(&text, 1);
        let line = tree.line(0).unwrap();
        tree.attach_marker(&line, right.as_ref());

        let (leaf, offset) = tree.leaf_at(1).unwrap();
        assert_eq!(tree.marker_text_node(), Some(NodeId(2)));
        assert_eq!(offset, 0);
        assert_eq!(tree.leaf_position(&leaf, offset, false).node, NodeId(2));
    }

    #[test]
    fn test_offset_of_nested_runs() {
        let mut tree = MemoryTree::with_text("ab");
        let line = tree.line(0).unwrap();
        let (_, bold_text) = tree.append_formatted_text(
            line,
            "cd",
            [(SmolStr::new("bold"), FormatValue::Flag(true))],
        );
        assert_eq!(tree.offset_of(&bold_text), 2);
        assert_eq!(tree.length(), 5);
    }

    #[test]
    fn test_split_and_optimize_merge() {
        let mut tree = MemoryTree::with_text("hello");
        let text = tree.find_text("hello").unwrap();
        let right = tree.split_leaf(&text, 2).unwrap();
        assert_eq!(tree.node_text(text), Some("he"));
        assert_eq!(tree.node_text(right), Some("llo"));
        assert_eq!(tree.length(), 6);

        tree.optimize();
        assert_eq!(tree.node_text(text), Some("hello"));
        assert!(!tree.contains(&right));
    }

    #[test]
    fn test_optimize_keeps_marker_split() {
        let mut tree = MemoryTree::with_text("ab");
        let text = tree.find_text("ab").unwrap();
        let right = tree.split_leaf(&text, 1);
        let line = tree.line(0).unwrap();
        tree.attach_marker(&line, right.as_ref());

        tree.optimize();
        assert_eq!(tree.node_text(tree.find_text("a").unwrap()), Some("a"));
        assert_eq!(tree.node_text(tree.find_text("b").unwrap()), Some("b"));
        assert!(tree.marker_attached());
    }

    #[test]
    fn test_split_at_edges() {
        let mut tree = MemoryTree::with_text("ab");
        let text = tree.find_text("ab").unwrap();
        // At the start the leaf itself follows the split point.
        assert_eq!(tree.split_leaf(&text, 0), Some(text));
        // At the end there is nothing after it.
        assert_eq!(tree.split_leaf(&text, 2), None);
    }

    #[test]
    fn test_restore_marker_prefers_text_neighbor() {
        let mut tree = MemoryTree::with_text("ab");
        let text = tree.find_text("ab").unwrap();
        let right = tree.split_leaf(&text, 1);
        let line = tree.line(0).unwrap();
        tree.attach_marker(&line, right.as_ref());
        tree.set_marker_format("bold", FormatValue::Flag(true));

        let restored = tree.restore_marker().unwrap();
        assert_eq!(restored.start, NativePosition::new(text, 1));
        assert!(!tree.marker_attached());
        assert!(tree.node_formats(NodeId(1)).is_empty());
        assert_eq!(tree.restore_marker(), None);
    }

    #[test]
    fn test_commit_typed_char_donates_formats() {
        let mut tree = MemoryTree::with_text("ab");
        let text = tree.find_text("ab").unwrap();
        let right = tree.split_leaf(&text, 1);
        let line = tree.line(0).unwrap();
        tree.attach_marker(&line, right.as_ref());
        tree.set_marker_format("bold", FormatValue::Flag(true));

        assert!(tree.commit_typed_char('c'));
        assert_eq!(tree.plain_text(), "acb\n");
        assert!(!tree.marker_attached());

        let typed = tree.find_text("c").unwrap();
        let wrapper = tree.parent(&typed).unwrap();
        assert_eq!(
            tree.node_formats(wrapper).get("bold"),
            Some(&FormatValue::Flag(true))
        );
    }

    #[test]
    fn test_remove_node_detaches_subtree() {
        let mut tree = MemoryTree::with_text("ab\ncd");
        let text = tree.find_text("cd").unwrap();
        let line = tree.parent(&text).unwrap();
        tree.remove_node(line);
        assert!(!tree.contains(&text));
        assert_eq!(tree.length(), 3);
    }

    #[test]
    fn test_embed_contributes_length_one() {
        let mut tree = MemoryTree::with_text("ab");
        let line = tree.line(0).unwrap();
        let embed = tree.append_embed(line);
        assert_eq!(tree.length(), 4);
        assert_eq!(tree.offset_of(&embed), 2);
        // Position before/after the embed is expressed in the parent line.
        assert_eq!(
            tree.leaf_position(&embed, 0, false),
            NativePosition::new(line, 1)
        );
        assert_eq!(
            tree.leaf_position(&embed, 1, false),
            NativePosition::new(line, 2)
        );
    }
}
