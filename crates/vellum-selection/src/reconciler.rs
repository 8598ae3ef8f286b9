//! The selection reconciler: owns the last-known model range, detects
//! changes, and keeps the native selection consistent across tree mutations.
//!
//! All state here is single-threaded and owned exclusively by the
//! reconciler; collaborators only ever receive snapshots. Reactions that
//! must not race platform-internal settling (the platform's own
//! selection-change signal, the post-composition caret restore) are queued
//! as deferred tasks and executed when the host drains the queue after the
//! current event pass: exactly one step later, never sooner.

use std::collections::VecDeque;
use std::fmt;

use crate::composition::CompositionTracker;
use crate::cursor;
use crate::events::{Emitter, SelectionChange, Source};
use crate::mapping::{normalized_to_range, range_to_native};
use crate::normalize::normalize_raw;
use crate::platform::SelectionPlatform;
use crate::range::Range;
use crate::scroll;
use crate::tree::{ContentTree, FormatValue, NormalizedRange, RawRange};

/// Work postponed past the current event pass.
enum Deferred<N> {
    /// Re-derive the model range from the platform and notify on change.
    Update { source: Source },
    /// Reapply a previously captured native position. `None` records a
    /// composition restore that found no marker attached, which is a
    /// deliberate no-op.
    RestoreNative { range: Option<RawRange<N>> },
}

/// Orchestrates model-range/native-range synchronization.
pub struct SelectionReconciler<N> {
    /// Range derived from the most recent platform query; `None` while the
    /// selection is outside the editable area.
    last_range: Option<Range>,
    /// Last non-null range; the fallback applied when focus returns without
    /// an explicit selection.
    saved_range: Range,
    composition: CompositionTracker,
    mouse_down: bool,
    pending: VecDeque<Deferred<N>>,
    /// Native position captured before a structural edit, consumed by the
    /// edit's own update notification.
    restore_after_update: Option<RawRange<N>>,
    events: Emitter,
}

impl<N: Clone + PartialEq + fmt::Debug> SelectionReconciler<N> {
    /// Build a reconciler and derive the initial range silently.
    pub fn new<T, P>(tree: &mut T, platform: &mut P) -> Self
    where
        T: ContentTree<Node = N>,
        P: SelectionPlatform<Node = N>,
    {
        let mut reconciler = Self {
            last_range: None,
            saved_range: Range::caret(0),
            composition: CompositionTracker::new(),
            mouse_down: false,
            pending: VecDeque::new(),
            restore_after_update: None,
            events: Emitter::new(),
        };
        reconciler.update(tree, platform, Source::Silent);
        reconciler
    }

    /// Subscription point for change notifications.
    pub fn events_mut(&mut self) -> &mut Emitter {
        &mut self.events
    }

    pub fn last_range(&self) -> Option<Range> {
        self.last_range
    }

    pub fn saved_range(&self) -> Range {
        self.saved_range
    }

    pub fn is_composing(&self) -> bool {
        self.composition.is_composing()
    }

    pub fn is_dragging(&self) -> bool {
        self.mouse_down
    }

    /// Number of tasks waiting for the next [`run_pending`] drain.
    ///
    /// [`run_pending`]: Self::run_pending
    pub fn pending_tasks(&self) -> usize {
        self.pending.len()
    }

    /// Current platform selection, normalized; `None` when there is none or
    /// it lies outside the editable root.
    pub fn native_range<T, P>(&self, tree: &T, platform: &P) -> Option<NormalizedRange<N>>
    where
        T: ContentTree<Node = N>,
        P: SelectionPlatform<Node = N>,
    {
        let raw = platform.active_range()?;
        normalize_raw(tree, raw)
    }

    /// Current model range together with the normalized native range it was
    /// derived from.
    pub fn get_range<T, P>(
        &self,
        tree: &T,
        platform: &P,
    ) -> (Option<Range>, Option<NormalizedRange<N>>)
    where
        T: ContentTree<Node = N>,
        P: SelectionPlatform<Node = N>,
    {
        match self.native_range(tree, platform) {
            Some(native) => {
                let range = normalized_to_range(tree, &native);
                (Some(range), Some(native))
            }
            None => (None, None),
        }
    }

    /// Re-derive the model range and notify subscribers if it moved.
    pub fn update<T, P>(&mut self, tree: &mut T, platform: &mut P, source: Source)
    where
        T: ContentTree<Node = N>,
        P: SelectionPlatform<Node = N>,
    {
        let old_range = self.last_range;
        let (new_range, native) = self.get_range(tree, platform);
        self.last_range = new_range;
        if let Some(range) = self.last_range {
            self.saved_range = range;
        }
        if old_range == self.last_range {
            return;
        }
        // A collapsed selection that moved away from the marker means any
        // armed formats are stale; restore so the marker never lingers.
        let at_marker = match (&native, tree.marker_text_node()) {
            (Some(native), Some(text)) => native.start.node == text,
            _ => false,
        };
        if !self.composition.is_composing()
            && native.as_ref().is_some_and(|n| n.raw.is_collapsed())
            && !at_marker
        {
            tree.restore_marker();
        }
        tracing::debug!(
            target: "vellum::selection",
            old = ?old_range,
            new = ?self.last_range,
            source = ?source,
            "selection changed"
        );
        self.events.emit(&SelectionChange {
            new: self.last_range,
            old: old_range,
            source,
        });
    }

    /// Apply a model range to the platform selection, or clear it when
    /// `range` is `None`. Concludes with an [`update`] so state and
    /// notifications reflect what the platform actually accepted.
    ///
    /// [`update`]: Self::update
    pub fn set_range<T, P>(
        &mut self,
        tree: &mut T,
        platform: &mut P,
        range: Option<Range>,
        source: Source,
    ) where
        T: ContentTree<Node = N>,
        P: SelectionPlatform<Node = N>,
    {
        self.set_range_with(tree, platform, range, false, source);
    }

    /// [`set_range`] with an explicit `force` flag: a forced apply skips the
    /// redundant-native-call suppression.
    ///
    /// [`set_range`]: Self::set_range
    pub fn set_range_with<T, P>(
        &mut self,
        tree: &mut T,
        platform: &mut P,
        range: Option<Range>,
        force: bool,
        source: Source,
    ) where
        T: ContentTree<Node = N>,
        P: SelectionPlatform<Node = N>,
    {
        tracing::debug!(target: "vellum::selection", range = ?range, "set range");
        match range {
            Some(range) => {
                if let Some((start, end)) = range_to_native(tree, &range) {
                    self.apply_native(tree, platform, &RawRange::new(start, end), force);
                }
            }
            None => {
                platform.clear_range();
                platform.focus_neutral();
            }
        }
        self.update(tree, platform, source);
    }

    /// Focus the editable surface, falling back to the saved range when no
    /// selection survives the focus change.
    pub fn focus<T, P>(&mut self, tree: &mut T, platform: &mut P)
    where
        T: ContentTree<Node = N>,
        P: SelectionPlatform<Node = N>,
    {
        if platform.has_focus() {
            return;
        }
        platform.focus_editor();
        let saved = self.saved_range;
        self.set_range(tree, platform, Some(saved), Source::Api);
    }

    /// Pre-arm a character-level format at the collapsed caret. No-op for
    /// block-scoped or unknown formats, or when the selection is not
    /// collapsed.
    pub fn format<T, P>(&mut self, tree: &mut T, platform: &mut P, name: &str, value: FormatValue)
    where
        T: ContentTree<Node = N>,
        P: SelectionPlatform<Node = N>,
    {
        let Some(native) = self.native_range(tree, platform) else {
            return;
        };
        if !native.raw.is_collapsed() {
            return;
        }
        if !cursor::arm_format(tree, &native.start, name, value) {
            return;
        }
        tree.optimize();
        if let Some(caret) = tree.marker_caret() {
            self.apply_native(tree, platform, &RawRange::caret(caret), false);
        }
        self.update(tree, platform, Source::User);
    }

    // === Platform event entry points ===

    /// The platform reported a selection change. The reaction is deferred by
    /// one pass to avoid racing platform-internal state settling, and
    /// suppressed entirely while a drag is in progress.
    pub fn handle_selection_changed(&mut self) {
        if !self.mouse_down {
            self.pending.push_back(Deferred::Update {
                source: Source::User,
            });
        }
    }

    /// The document text changed (local or remote edit).
    pub fn handle_content_changed<T, P>(&mut self, tree: &mut T, platform: &mut P)
    where
        T: ContentTree<Node = N>,
        P: SelectionPlatform<Node = N>,
    {
        self.update(tree, platform, Source::Silent);
    }

    pub fn handle_composition_start(&mut self) {
        self.composition.begin();
    }

    /// A composition session ended. If the marker is attached it is restored
    /// now, and reapplying the platform selection at the restored position
    /// is deferred by one pass.
    pub fn handle_composition_end<T>(&mut self, tree: &mut T)
    where
        T: ContentTree<Node = N>,
    {
        self.composition.finish();
        let range = tree.restore_marker();
        self.pending.push_back(Deferred::RestoreNative { range });
    }

    pub fn handle_mouse_down(&mut self) {
        self.mouse_down = true;
    }

    /// Drag released: reactive updates resume, and one runs immediately.
    pub fn handle_mouse_up<T, P>(&mut self, tree: &mut T, platform: &mut P)
    where
        T: ContentTree<Node = N>,
        P: SelectionPlatform<Node = N>,
    {
        self.mouse_down = false;
        self.update(tree, platform, Source::User);
    }

    // === Structural edit hooks ===

    /// The tree is about to mutate: snapshot the native position so it can
    /// be reapplied afterwards. Skipped when the caret sits on the marker,
    /// which restores itself.
    pub fn before_structure_update<T, P>(&mut self, tree: &T, platform: &P)
    where
        T: ContentTree<Node = N>,
        P: SelectionPlatform<Node = N>,
    {
        if !platform.has_focus() {
            return;
        }
        let Some(native) = self.native_range(tree, platform) else {
            return;
        };
        if let Some(text) = tree.marker_text_node() {
            if native.start.node == text {
                return;
            }
        }
        self.restore_after_update = Some(RawRange::new(native.start, native.end));
    }

    /// The mutation completed: reapply the snapshot, if one was taken.
    /// Nodes may have been removed by the edit; failures are discarded.
    pub fn structure_updated<T, P>(&mut self, tree: &T, platform: &mut P)
    where
        T: ContentTree<Node = N>,
        P: SelectionPlatform<Node = N>,
    {
        if let Some(range) = self.restore_after_update.take() {
            self.apply_native(tree, platform, &range, false);
        }
    }

    /// The tree's optimize pass preserved a range context across a
    /// structural rewrite: reapply it.
    pub fn structure_optimized<T, P>(
        &mut self,
        tree: &T,
        platform: &mut P,
        preserved: Option<RawRange<N>>,
    ) where
        T: ContentTree<Node = N>,
        P: SelectionPlatform<Node = N>,
    {
        if let Some(range) = preserved {
            self.apply_native(tree, platform, &range, false);
        }
    }

    /// Drain deferred tasks. Tasks queued while draining run on the next
    /// drain, preserving one-step-later semantics.
    pub fn run_pending<T, P>(&mut self, tree: &mut T, platform: &mut P)
    where
        T: ContentTree<Node = N>,
        P: SelectionPlatform<Node = N>,
    {
        let mut batch = std::mem::take(&mut self.pending);
        while let Some(task) = batch.pop_front() {
            match task {
                Deferred::Update { source } => self.update(tree, platform, source),
                Deferred::RestoreNative { range: Some(range) } => {
                    self.apply_native(tree, platform, &range, false);
                }
                Deferred::RestoreNative { range: None } => {
                    tracing::trace!(
                        target: "vellum::selection",
                        "deferred restore had no marker attached; nothing to do"
                    );
                }
            }
        }
    }

    // === Geometry ===

    /// Bounding rect for an explicit model span.
    pub fn bounds<T, P>(&self, tree: &T, platform: &P, index: usize, length: usize) -> Option<crate::platform::Rect>
    where
        T: ContentTree<Node = N>,
        P: SelectionPlatform<Node = N>,
    {
        scroll::bounds(tree, platform, index, length)
    }

    /// Minimally adjust `region` so the last known range is visible.
    pub fn scroll_into_view<T, P, R>(&self, tree: &T, platform: &P, region: &mut R)
    where
        T: ContentTree<Node = N>,
        P: SelectionPlatform<Node = N>,
        R: crate::platform::ScrollRegion,
    {
        let Some(range) = self.last_range else {
            return;
        };
        scroll::scroll_into_view(tree, platform, region, &range);
    }

    /// Apply a native range, guarding against detached nodes, focusing the
    /// surface first, and skipping the call when the platform already holds
    /// the requested range (unless `force`). Platform rejections are
    /// discarded; availability wins over strict reporting.
    fn apply_native<T, P>(&mut self, tree: &T, platform: &mut P, raw: &RawRange<N>, force: bool)
    where
        T: ContentTree<Node = N>,
        P: SelectionPlatform<Node = N>,
    {
        if !tree.contains(&raw.start.node) || !tree.contains(&raw.end.node) {
            tracing::debug!(
                target: "vellum::selection",
                "skipping native selection update onto detached nodes"
            );
            return;
        }
        if !platform.has_focus() {
            platform.focus_editor();
        }
        if !force {
            if let Some(current) = platform.active_range() {
                if current == *raw {
                    return;
                }
            }
        }
        if let Err(error) = platform.apply_range(&raw.start, &raw.end) {
            tracing::debug!(
                target: "vellum::selection",
                %error,
                "discarding failed native selection update"
            );
        }
    }
}

impl<N: Clone + PartialEq + fmt::Debug> fmt::Debug for SelectionReconciler<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionReconciler")
            .field("last_range", &self.last_range)
            .field("saved_range", &self.saved_range)
            .field("composing", &self.composition.is_composing())
            .field("mouse_down", &self.mouse_down)
            .field("pending", &self.pending.len())
            .finish()
    }
}
