//! vellum-selection: model-range/native-range synchronization for an
//! editable rich-text surface.
//!
//! Every user interaction originates as a native range (node + offset pairs
//! in the rendered content tree); every programmatic edit originates as a
//! flat model [`Range`]. This crate owns the bidirectional translation
//! between the two, change detection, reconciliation after structural
//! edits, and pre-armed caret formatting, and nothing else. The content
//! tree and the native selection API are consumed through the
//! [`ContentTree`] and [`SelectionPlatform`] traits.

pub mod composition;
pub mod cursor;
pub mod events;
pub mod mapping;
pub mod normalize;
pub mod platform;
pub mod range;
pub mod reconciler;
pub mod scroll;
pub mod tree;

pub use composition::CompositionTracker;
pub use events::{Emitter, SelectionChange, Source};
pub use mapping::{normalized_to_range, range_to_native};
pub use normalize::normalize_raw;
pub use platform::{PlatformError, Rect, ScrollRegion, SelectionPlatform};
pub use range::Range;
pub use reconciler::SelectionReconciler;
pub use scroll::{bounds, scroll_into_view};
pub use tree::{
    ContentTree, FormatScope, FormatValue, NativePosition, NodeKind, NormalizedRange, RawRange,
};
