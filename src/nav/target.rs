//! Navigation target state.
//!
//! The current target is a single signal cell: written by the fragment
//! listener, read by every section's force flag and by the scroll
//! reconciler. Unrecognized fragments resolve to "no target" - only the
//! known section set participates in navigation.

use spark_signals::{signal, Signal};

use crate::types::SectionId;

/// Reactive holder for the page's current navigation target.
///
/// Single writer (the fragment-change listener), many readers. Cloning
/// shares the underlying signal.
#[derive(Clone)]
pub struct TargetState {
    current: Signal<Option<SectionId>>,
}

impl TargetState {
    /// Create target state with an initial target (usually parsed from the
    /// fragment present at mount time).
    pub fn new(initial: Option<SectionId>) -> Self {
        Self {
            current: signal(initial),
        }
    }

    /// Update from a raw fragment. Writes only on actual change, so a
    /// repeated notification for the same fragment does not restart a live
    /// retry chain.
    pub fn set_from_fragment(&self, fragment: Option<&str>) {
        let next = fragment.and_then(SectionId::from_fragment);
        if self.current.get() != next {
            self.current.set(next);
        }
    }

    /// Current target. Creates a reactive dependency inside effects.
    pub fn get(&self) -> Option<SectionId> {
        self.current.get()
    }

    /// The underlying signal, for reactive composition.
    pub fn signal(&self) -> Signal<Option<SectionId>> {
        self.current.clone()
    }

    /// Whether `section` is the current target (reactive read).
    pub fn is_current(&self, section: SectionId) -> bool {
        self.current.get() == Some(section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_signals::effect;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_initial_target() {
        let state = TargetState::new(Some(SectionId::About));
        assert_eq!(state.get(), Some(SectionId::About));
        assert!(state.is_current(SectionId::About));
        assert!(!state.is_current(SectionId::Skills));
    }

    #[test]
    fn test_set_from_fragment_parses_known_set() {
        let state = TargetState::new(None);

        state.set_from_fragment(Some("#projects"));
        assert_eq!(state.get(), Some(SectionId::Projects));

        state.set_from_fragment(Some("contact"));
        assert_eq!(state.get(), Some(SectionId::Contact));

        state.set_from_fragment(Some("#no-such-section"));
        assert_eq!(state.get(), None);

        state.set_from_fragment(None);
        assert_eq!(state.get(), None);
    }

    #[test]
    fn test_repeated_fragment_does_not_rewrite() {
        let state = TargetState::new(None);
        let runs = Rc::new(Cell::new(0u32));

        let sig = state.signal();
        let counter = runs.clone();
        let _stop = effect(move || {
            let _ = sig.get();
            counter.set(counter.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        state.set_from_fragment(Some("#about"));
        assert_eq!(runs.get(), 2);

        // Same fragment again: no write, no effect run.
        state.set_from_fragment(Some("#about"));
        assert_eq!(runs.get(), 2);

        state.set_from_fragment(Some("#skills"));
        assert_eq!(runs.get(), 3);
    }
}
