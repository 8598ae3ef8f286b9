//! Input-method composition session tracking.

/// Phase of the platform's composition session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Phase {
    #[default]
    Idle,
    Composing,
}

/// Tracks whether an IME composition session is in progress.
///
/// While composing, the reconciler suppresses caret-restore side effects:
/// the platform owns the text under composition and moving the caret out
/// from under it would corrupt the session.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompositionTracker {
    phase: Phase,
}

impl CompositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a composition session.
    pub fn begin(&mut self) {
        self.phase = Phase::Composing;
    }

    /// Leave the composition session. Returns whether one was in progress.
    pub fn finish(&mut self) -> bool {
        let was_composing = self.phase == Phase::Composing;
        self.phase = Phase::Idle;
        was_composing
    }

    pub fn is_composing(&self) -> bool {
        self.phase == Phase::Composing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let mut tracker = CompositionTracker::new();
        assert!(!tracker.is_composing());

        tracker.begin();
        assert!(tracker.is_composing());

        assert!(tracker.finish());
        assert!(!tracker.is_composing());
    }

    #[test]
    fn test_finish_without_session() {
        let mut tracker = CompositionTracker::new();
        assert!(!tracker.finish());
    }

    #[test]
    fn test_begin_is_idempotent() {
        let mut tracker = CompositionTracker::new();
        tracker.begin();
        tracker.begin();
        assert!(tracker.is_composing());
        assert!(tracker.finish());
        assert!(!tracker.finish());
    }
}
