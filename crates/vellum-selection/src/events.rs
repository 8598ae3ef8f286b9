//! Change notifications for selection movement.
//!
//! A minimal single-threaded emitter: the reconciler publishes every change
//! on the generic channel, and additionally on the selection-specific channel
//! unless the change was tagged [`Source::Silent`]. Hosts that already have a
//! richer event bus can bridge from these callbacks.

use crate::range::Range;

/// Who caused a selection change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    /// A platform interaction (click, drag, keyboard, IME).
    User,
    /// A programmatic `set_range` call.
    Api,
    /// An internal or remote-edit update that must not re-trigger UI-level
    /// reactions.
    Silent,
}

/// Payload carried by every selection-change notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionChange {
    /// The range after the change; `None` when the selection left the
    /// editable area.
    pub new: Option<Range>,
    /// The range before the change.
    pub old: Option<Range>,
    /// What caused the change.
    pub source: Source,
}

type Handler = Box<dyn FnMut(&SelectionChange)>;

/// Single-threaded callback registry for selection changes.
#[derive(Default)]
pub struct Emitter {
    editor_change: Vec<Handler>,
    selection_change: Vec<Handler>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to the generic channel, which fires on every change
    /// regardless of source.
    pub fn on_editor_change(&mut self, handler: impl FnMut(&SelectionChange) + 'static) {
        self.editor_change.push(Box::new(handler));
    }

    /// Subscribe to the selection-specific channel, which is suppressed for
    /// [`Source::Silent`] changes.
    pub fn on_selection_change(&mut self, handler: impl FnMut(&SelectionChange) + 'static) {
        self.selection_change.push(Box::new(handler));
    }

    /// Publish a change on both channels, honoring silent suppression.
    pub fn emit(&mut self, change: &SelectionChange) {
        for handler in &mut self.editor_change {
            handler(change);
        }
        if change.source != Source::Silent {
            for handler in &mut self.selection_change {
                handler(change);
            }
        }
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("editor_change", &self.editor_change.len())
            .field("selection_change", &self.selection_change.len())
            .finish()
    }
}
