//! Converting between model ranges and native node/offset pairs.
//!
//! Both directions clamp rather than fail: a model index beyond the document
//! is pulled back to the last addressable position, and a native endpoint
//! that resolves past the end is capped the same way. The two directions are
//! approximately inverse; the only asymmetry is the documented end-endpoint
//! bias at leaf boundaries (see [`ContentTree::leaf_position`]).

use crate::range::Range;
use crate::tree::{ContentTree, NativePosition, NodeKind, NormalizedRange};

/// Derive the model range addressed by a normalized native range.
///
/// Each endpoint resolves through its owning addressable unit to a model
/// offset; the maximum becomes the end and the minimum the start, so an
/// inverted (focus-before-anchor) platform selection normalizes to a
/// forward range. Offsets are clamped to `[0, len - 1]`.
pub fn normalized_to_range<T: ContentTree>(tree: &T, range: &NormalizedRange<T::Node>) -> Range {
    let mut positions = vec![&range.start];
    if !range.raw.is_collapsed() {
        positions.push(&range.end);
    }
    let indexes: Vec<usize> = positions
        .into_iter()
        .map(|position| resolve_endpoint(tree, position))
        .collect();
    let limit = tree.length().saturating_sub(1);
    let end = indexes.iter().copied().max().unwrap_or(0).min(limit);
    let start = indexes.iter().copied().min().unwrap_or(0).min(end);
    Range::new(start, end - start)
}

fn resolve_endpoint<T: ContentTree>(tree: &T, position: &NativePosition<T::Node>) -> usize {
    let Some(blot) = tree.nearest_blot(&position.node) else {
        return 0;
    };
    let base = tree.offset_of(&blot);
    match tree.kind(&blot) {
        // Leaf-level unit: its own local index arithmetic applies.
        NodeKind::Text | NodeKind::Leaf => {
            base + tree.leaf_index(&blot, &position.node, position.offset)
        }
        NodeKind::Container => {
            if position.offset == 0 {
                // Before this ancestor's content.
                base
            } else {
                // After this ancestor's content.
                base + tree.node_length(&blot)
            }
        }
    }
}

/// Resolve a model range to a native endpoint pair.
///
/// A collapsed range produces one position, duplicated for both endpoints.
/// The end endpoint is resolved with the boundary bias enabled. Returns
/// `None` when the tree has no addressable unit at a resolved index (empty
/// or degenerate document).
pub fn range_to_native<T: ContentTree>(
    tree: &T,
    range: &Range,
) -> Option<(NativePosition<T::Node>, NativePosition<T::Node>)> {
    let indexes = if range.is_collapsed() {
        vec![range.index]
    } else {
        vec![range.index, range.end()]
    };
    let limit = tree.length().saturating_sub(1);
    let mut resolved = Vec::with_capacity(2);
    for (i, index) in indexes.into_iter().enumerate() {
        let index = index.min(limit);
        let (leaf, offset) = tree.leaf_at(index)?;
        resolved.push(tree.leaf_position(&leaf, offset, i != 0));
    }
    let start = resolved.first()?.clone();
    let end = resolved.get(1).cloned().unwrap_or_else(|| start.clone());
    tracing::trace!(
        target: "vellum::mapping",
        index = range.index,
        length = range.length,
        start = ?start,
        end = ?end,
        "resolved model range to native positions"
    );
    Some((start, end))
}
