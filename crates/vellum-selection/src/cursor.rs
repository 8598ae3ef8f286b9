//! Arming formats at a collapsed caret via the tree's zero-width marker.
//!
//! A format toggled with nothing selected has nowhere to live until the next
//! character arrives. The tree hosts a zero-length marker leaf for exactly
//! this: it is spliced into the content at the caret, records the pending
//! attributes, and donates them to the next typed character before detaching
//! itself.

use crate::tree::{ContentTree, FormatScope, FormatValue, NativePosition, NodeKind};

/// Splice the marker in at `caret` (if not already there) and record a
/// pending format on it. Returns `false` without touching the tree when the
/// format is unknown or block-scoped; caret formatting only applies to
/// character-level attributes.
pub fn arm_format<T: ContentTree>(
    tree: &mut T,
    caret: &NativePosition<T::Node>,
    name: &str,
    value: FormatValue,
) -> bool {
    match tree.format_scope(name) {
        Some(FormatScope::Inline) => {}
        Some(FormatScope::Block) | None => return false,
    }
    let at_marker = tree
        .marker_text_node()
        .is_some_and(|text| text == caret.node);
    if !at_marker {
        let Some(blot) = tree.nearest_blot(&caret.node) else {
            return false;
        };
        match tree.kind(&blot) {
            NodeKind::Text | NodeKind::Leaf => {
                // Split the leaf at the caret and slot the marker between
                // the halves.
                let after = tree.split_leaf(&blot, caret.offset);
                let Some(parent) = tree.parent(&blot) else {
                    return false;
                };
                tree.attach_marker(&parent, after.as_ref());
            }
            NodeKind::Container => {
                // Caret normalized onto a childless-container boundary.
                let before = tree.child(&blot, caret.offset);
                tree.attach_marker(&blot, before.as_ref());
            }
        }
    }
    tree.set_marker_format(name, value);
    tracing::debug!(
        target: "vellum::selection",
        format = name,
        "armed caret format on marker"
    );
    true
}
