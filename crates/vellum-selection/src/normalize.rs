//! Descending raw platform positions to addressable leaf-level positions.
//!
//! Platforms report selection endpoints wherever the hit-test landed: on the
//! editable root, on a line element, on an inline wrapper. Mapping needs
//! endpoints at text nodes or childless-node boundaries, so each endpoint is
//! walked down into the nearest addressable position first.

use crate::tree::{ContentTree, NativePosition, NodeKind, NormalizedRange, RawRange};

/// Normalize a raw platform range, or `None` when either endpoint lies
/// outside the editable root. `None` means "no relevant selection", not a
/// failure.
pub fn normalize_raw<T: ContentTree>(
    tree: &T,
    raw: RawRange<T::Node>,
) -> Option<NormalizedRange<T::Node>> {
    if !tree.contains(&raw.start.node) {
        return None;
    }
    if !raw.is_collapsed() && !tree.contains(&raw.end.node) {
        return None;
    }
    let start = descend(tree, raw.start.clone());
    let end = descend(tree, raw.end.clone());
    tracing::trace!(
        target: "vellum::mapping",
        start = ?start,
        end = ?end,
        "normalized raw selection"
    );
    Some(NormalizedRange { start, end, raw })
}

/// Walk one endpoint down until it rests on a text position or a childless
/// node boundary.
fn descend<T: ContentTree>(tree: &T, mut position: NativePosition<T::Node>) -> NativePosition<T::Node> {
    loop {
        if tree.kind(&position.node) == NodeKind::Text {
            break;
        }
        let children = tree.child_count(&position.node);
        if children == 0 {
            break;
        }
        if position.offset < children {
            // The offset indexes an existing child: enter it from the front.
            let Some(child) = tree.child(&position.node, position.offset) else {
                break;
            };
            position.node = child;
            position.offset = 0;
        } else if position.offset == children {
            // Position after the last child: enter it from the back.
            let Some(last) = tree.child(&position.node, children - 1) else {
                break;
            };
            position.offset = if tree.kind(&last) == NodeKind::Text {
                tree.text_len(&last)
            } else {
                // "After everything" sentinel for a non-text node.
                tree.child_count(&last) + 1
            };
            position.node = last;
        } else {
            // Offset points strictly beyond live children; leave the
            // boundary case as-is.
            break;
        }
    }
    position
}
