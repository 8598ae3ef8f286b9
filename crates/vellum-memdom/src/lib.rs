//! vellum-memdom: in-memory content tree and selection platform.
//!
//! The native host used to exercise `vellum-selection` without a browser: a
//! [`MemoryTree`] implements the content-tree capability (including cursor
//! marker hosting and an optimize pass), and a [`MemoryPlatform`] implements
//! the native selection API over a fixed-pitch relayout snapshot. Together
//! they make every reconciler behavior (mapping roundtrips, structural-edit
//! snapshots, caret formatting, scrolling) observable from plain tests.

pub mod platform;
pub mod tree;

pub use platform::{CHAR_WIDTH, LINE_HEIGHT, MemoryPlatform, MemoryViewport};
pub use tree::{MemoryTree, NodeId};
