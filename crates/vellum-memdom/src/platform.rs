//! In-memory selection platform.
//!
//! Plays the role the browser plays for the real editor: it holds the
//! current native selection, tracks focus, and answers geometry queries from
//! a relayout snapshot (a fixed-pitch layout: one line of text per line
//! container, monospace columns). Geometry is only available for nodes seen
//! by the last [`MemoryPlatform::relayout`] call, exactly like asking the
//! renderer about a node it has not painted.

use std::collections::{HashMap, HashSet};

use vellum_selection::{
    ContentTree, NativePosition, NodeKind, PlatformError, RawRange, Rect, ScrollRegion,
    SelectionPlatform,
};

use crate::tree::{MemoryTree, NodeId};

/// Horizontal advance per character column.
pub const CHAR_WIDTH: f64 = 8.0;
/// Vertical advance per line.
pub const LINE_HEIGHT: f64 = 18.0;

#[derive(Clone, Debug, Default)]
struct NodeGeometry {
    line: usize,
    start_col: usize,
    end_col: usize,
    /// Start columns of direct children, for container positions.
    child_cols: Vec<usize>,
}

/// In-memory implementation of the native selection API.
#[derive(Debug, Default)]
pub struct MemoryPlatform {
    selection: Option<RawRange<NodeId>>,
    focused: bool,
    geometry: HashMap<NodeId, NodeGeometry>,
    detached: HashSet<NodeId>,
    root: Option<NodeId>,
    line_count: usize,
    apply_calls: usize,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the layout snapshot from the current tree structure.
    pub fn relayout(&mut self, tree: &MemoryTree) {
        self.geometry.clear();
        let root = tree.root();
        self.root = Some(root);
        self.line_count = tree.child_count(&root);
        for line_index in 0..self.line_count {
            if let Some(line) = tree.child(&root, line_index) {
                let mut col = 0;
                self.layout_subtree(tree, line, line_index, &mut col);
            }
        }
        tracing::trace!(
            target: "vellum::memdom",
            lines = self.line_count,
            nodes = self.geometry.len(),
            "relayout"
        );
    }

    fn layout_subtree(&mut self, tree: &MemoryTree, node: NodeId, line: usize, col: &mut usize) {
        let start = *col;
        let mut child_cols = Vec::new();
        match tree.kind(&node) {
            NodeKind::Text => {
                *col += tree.text_len(&node);
            }
            NodeKind::Container => {
                for i in 0..tree.child_count(&node) {
                    if let Some(child) = tree.child(&node, i) {
                        child_cols.push(*col);
                        self.layout_subtree(tree, child, line, col);
                    }
                }
            }
            NodeKind::Leaf => {
                // Embeds advance one column; the marker none. Either way the
                // inner text node (if any) shares the leaf's geometry.
                if let Some(inner) = tree.child(&node, 0) {
                    self.geometry.insert(
                        inner,
                        NodeGeometry {
                            line,
                            start_col: start,
                            end_col: start,
                            child_cols: Vec::new(),
                        },
                    );
                }
                *col += tree.node_length(&node);
            }
        }
        self.geometry.insert(
            node,
            NodeGeometry {
                line,
                start_col: start,
                end_col: *col,
                child_cols,
            },
        );
    }

    /// Simulate the user (or the platform itself) moving the selection.
    pub fn set_user_selection(&mut self, selection: Option<RawRange<NodeId>>) {
        self.selection = selection;
    }

    /// Simulate a node disappearing from the rendered document, so the next
    /// selection operation on it fails.
    pub fn mark_detached(&mut self, node: NodeId) {
        self.detached.insert(node);
    }

    /// How many times a selection was actually applied (redundant applies
    /// are suppressed upstream and do not count).
    pub fn apply_calls(&self) -> usize {
        self.apply_calls
    }

    fn point(&self, position: &NativePosition<NodeId>) -> Option<(usize, f64)> {
        if self.root == Some(position.node) {
            let line = position.offset.min(self.line_count.saturating_sub(1));
            return Some((line, 0.0));
        }
        let geometry = self.geometry.get(&position.node)?;
        let col = if position.offset < geometry.child_cols.len() {
            geometry.child_cols[position.offset]
        } else if !geometry.child_cols.is_empty() {
            geometry.end_col
        } else {
            let width = geometry.end_col - geometry.start_col;
            geometry.start_col + position.offset.min(width)
        };
        Some((geometry.line, col as f64 * CHAR_WIDTH))
    }
}

impl SelectionPlatform for MemoryPlatform {
    type Node = NodeId;

    fn active_range(&self) -> Option<RawRange<NodeId>> {
        self.selection.clone()
    }

    fn apply_range(
        &mut self,
        start: &NativePosition<NodeId>,
        end: &NativePosition<NodeId>,
    ) -> Result<(), PlatformError> {
        if self.detached.contains(&start.node) || self.detached.contains(&end.node) {
            return Err(PlatformError::DetachedNode);
        }
        self.selection = Some(RawRange::new(start.clone(), end.clone()));
        self.apply_calls += 1;
        Ok(())
    }

    fn clear_range(&mut self) {
        self.selection = None;
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn focus_editor(&mut self) {
        self.focused = true;
    }

    fn focus_neutral(&mut self) {
        self.focused = false;
    }

    fn range_rect(
        &self,
        start: &NativePosition<NodeId>,
        end: &NativePosition<NodeId>,
    ) -> Option<Rect> {
        let (start_line, start_x) = self.point(start)?;
        let (end_line, end_x) = self.point(end)?;
        let top = start_line.min(end_line);
        let bottom = start_line.max(end_line);
        let left = start_x.min(end_x);
        let right = start_x.max(end_x);
        Some(Rect::new(
            left,
            top as f64 * LINE_HEIGHT,
            right - left,
            (bottom - top + 1) as f64 * LINE_HEIGHT,
        ))
    }

    fn node_rect(&self, node: &NodeId) -> Option<Rect> {
        let geometry = self.geometry.get(node)?;
        Some(Rect::new(
            geometry.start_col as f64 * CHAR_WIDTH,
            geometry.line as f64 * LINE_HEIGHT,
            (geometry.end_col - geometry.start_col) as f64 * CHAR_WIDTH,
            LINE_HEIGHT,
        ))
    }
}

/// A scrollable window over the laid-out document.
#[derive(Debug)]
pub struct MemoryViewport {
    height: f64,
    scroll_top: f64,
}

impl MemoryViewport {
    pub fn new(height: f64) -> Self {
        Self {
            height,
            scroll_top: 0.0,
        }
    }
}

impl ScrollRegion for MemoryViewport {
    fn viewport(&self) -> Rect {
        Rect::new(0.0, self.scroll_top, 800.0, self.height)
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn set_scroll_top(&mut self, top: f64) {
        self.scroll_top = top;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laid_out(content: &str) -> (MemoryTree, MemoryPlatform) {
        let tree = MemoryTree::with_text(content);
        let mut platform = MemoryPlatform::new();
        platform.relayout(&tree);
        (tree, platform)
    }

    #[test]
    fn test_text_position_geometry() {
        let (tree, platform) = laid_out("ab\ncde");
        let cde = tree.find_text("cde").unwrap();
        let rect = platform
            .range_rect(
                &NativePosition::new(cde, 1),
                &NativePosition::new(cde, 3),
            )
            .unwrap();
        assert_eq!(rect, Rect::new(CHAR_WIDTH, LINE_HEIGHT, 2.0 * CHAR_WIDTH, LINE_HEIGHT));
    }

    #[test]
    fn test_unrendered_node_has_no_geometry() {
        let (mut tree, platform) = laid_out("ab");
        let line = tree.line(0).unwrap();
        let late = tree.append_text(line, "xyz");
        assert!(platform.node_rect(&late).is_none());
    }

    #[test]
    fn test_apply_range_rejects_detached_nodes() {
        let (tree, mut platform) = laid_out("ab");
        let text = tree.find_text("ab").unwrap();
        platform.mark_detached(text);
        let position = NativePosition::new(text, 0);
        assert!(platform.apply_range(&position, &position).is_err());
        assert_eq!(platform.apply_calls(), 0);
    }

    #[test]
    fn test_apply_and_clear() {
        let (tree, mut platform) = laid_out("ab");
        let text = tree.find_text("ab").unwrap();
        let position = NativePosition::new(text, 1);
        platform.apply_range(&position, &position).unwrap();
        assert_eq!(
            platform.active_range(),
            Some(RawRange::caret(position))
        );
        platform.clear_range();
        assert_eq!(platform.active_range(), None);
    }
}
