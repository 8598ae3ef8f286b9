//! Range geometry and minimal scrolling.

use crate::platform::{Rect, ScrollRegion, SelectionPlatform};
use crate::range::Range;
use crate::tree::{ContentTree, NativePosition, NodeKind};

/// Bounding rect of a model span, in the platform's coordinate space.
///
/// A non-collapsed span merges the rects of its two boundary positions. A
/// caret measures the character at (or, at a line end, before) the caret and
/// collapses the rect to the matching side. Returns `None` when geometry
/// cannot be computed (empty document, unrendered nodes).
pub fn bounds<T, P>(tree: &T, platform: &P, index: usize, length: usize) -> Option<Rect>
where
    T: ContentTree,
    P: SelectionPlatform<Node = T::Node>,
{
    let doc_len = tree.length();
    if doc_len == 0 {
        return None;
    }
    let limit = doc_len - 1;
    let index = index.min(limit);
    let length = (index + length).min(limit) - index;

    let (leaf, offset) = tree.leaf_at(index)?;
    let start = tree.leaf_position(&leaf, offset, true);
    if length > 0 {
        let (end_leaf, end_offset) = tree.leaf_at(index + length)?;
        let end = tree.leaf_position(&end_leaf, end_offset, true);
        return platform.range_rect(&start, &end);
    }

    if tree.kind(&start.node) == NodeKind::Text {
        let text_len = tree.text_len(&start.node);
        if start.offset < text_len {
            let next = NativePosition::new(start.node.clone(), start.offset + 1);
            platform
                .range_rect(&start, &next)
                .map(|rect| rect.collapsed_to(false))
        } else if start.offset > 0 {
            let prev = NativePosition::new(start.node.clone(), start.offset - 1);
            platform
                .range_rect(&prev, &start)
                .map(|rect| rect.collapsed_to(true))
        } else {
            platform
                .node_rect(&start.node)
                .map(|rect| rect.collapsed_to(false))
        }
    } else {
        platform
            .node_rect(&leaf)
            .map(|rect| rect.collapsed_to(start.offset > 0))
    }
}

/// Adjust `region`'s scroll offset by the minimal amount that brings the
/// span's rect inside the visible bounds. No-op when already visible or when
/// either boundary line cannot be resolved.
pub fn scroll_into_view<T, P, R>(tree: &T, platform: &P, region: &mut R, range: &Range)
where
    T: ContentTree,
    P: SelectionPlatform<Node = T::Node>,
    R: ScrollRegion,
{
    let Some(bounds) = bounds(tree, platform, range.index, range.length) else {
        return;
    };
    let limit = tree.length().saturating_sub(1);
    if tree.line_at(range.index.min(limit)).is_none() {
        return;
    }
    if range.length > 0 && tree.line_at(range.end().min(limit)).is_none() {
        return;
    }
    let viewport = region.viewport();
    if bounds.top() < viewport.top() {
        region.set_scroll_top(region.scroll_top() - (viewport.top() - bounds.top()));
    } else if bounds.bottom() > viewport.bottom() {
        region.set_scroll_top(region.scroll_top() + (bounds.bottom() - viewport.bottom()));
    }
}
