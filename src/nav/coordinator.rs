//! Hash navigation coordinator.
//!
//! `Navigator` ties the pieces together: it keeps [`TargetState`] in sync
//! with the URL fragment, hands out force-flag getters for the deferred
//! sections, and runs one scroll retry chain per target transition.
//!
//! Chain discipline: the chain-management effect cancels the previous
//! chain *before* starting the next one, in the same synchronous run, so
//! two chains can never race to scroll to different targets.

use std::cell::RefCell;
use std::rc::Rc;

use spark_signals::effect;
use tracing::debug;

use crate::env::Environment;
use crate::types::{Cleanup, SectionId};

use super::retry::{RetryPolicy, RetryState, ScrollRetry};
use super::target::TargetState;

/// Page-level navigation coordinator.
///
/// Owns the current navigation target and the single live retry chain.
/// Unmounting (or dropping) detaches the fragment listener and cancels any
/// in-flight chain - no callback outlives its owner usefully.
pub struct Navigator {
    target: TargetState,
    chain: Rc<RefCell<Option<ScrollRetry>>>,
    stop_effect: Option<Cleanup>,
    fragment_unsub: Option<Cleanup>,
}

impl Navigator {
    /// Mount the coordinator against an environment.
    ///
    /// Reads the fragment immediately: a page loaded with `#projects`
    /// starts reconciling on its first animation frame.
    pub fn mount(env: Rc<dyn Environment>, policy: RetryPolicy) -> Navigator {
        let initial = env.fragment().as_deref().and_then(SectionId::from_fragment);
        debug!(section = ?initial, "navigator mounted");
        let target = TargetState::new(initial);

        // The fragment listener is the target's single writer.
        let fragment_unsub = {
            let reader = env.clone();
            let target = target.clone();
            env.on_fragment_change(Rc::new(move || {
                target.set_from_fragment(reader.fragment().as_deref());
            }))
        };

        // Every target transition swaps the chain: cancel, then start.
        let chain: Rc<RefCell<Option<ScrollRetry>>> = Rc::new(RefCell::new(None));
        let stop_effect: Cleanup = {
            let env = env.clone();
            let chain = chain.clone();
            let current = target.signal();
            let stop = effect(move || {
                let section = current.get();
                if let Some(previous) = chain.borrow_mut().take() {
                    previous.cancel();
                }
                if let Some(section) = section {
                    *chain.borrow_mut() = Some(ScrollRetry::start(env.clone(), section, policy));
                }
            });
            Box::new(stop)
        };

        Navigator {
            target,
            chain,
            stop_effect: Some(stop_effect),
            fragment_unsub: Some(fragment_unsub),
        }
    }

    /// Current navigation target.
    pub fn target(&self) -> Option<SectionId> {
        self.target.get()
    }

    /// Force-flag getter for a section's mount gate.
    ///
    /// The getter reads the target signal, so the gate it feeds re-evaluates
    /// on every target change.
    pub fn force_flag(&self, section: SectionId) -> impl Fn() -> bool + 'static {
        let current = self.target.signal();
        move || current.get() == Some(section)
    }

    /// State of the live retry chain, if any.
    pub fn retry_state(&self) -> Option<RetryState> {
        self.chain.borrow().as_ref().map(ScrollRetry::state)
    }

    /// Detach listeners and cancel the live chain.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(unsub) = self.fragment_unsub.take() {
            unsub();
        }
        if let Some(stop) = self.stop_effect.take() {
            stop();
        }
        if let Some(chain) = self.chain.borrow_mut().take() {
            chain.cancel();
        }
    }
}

impl Drop for Navigator {
    fn drop(&mut self) {
        self.teardown();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::SimEnv;
    use std::time::Duration;

    const INTERVAL: Duration = Duration::from_millis(120);

    fn test_policy() -> RetryPolicy {
        RetryPolicy::new(12, INTERVAL)
    }

    fn sim_with_hero() -> (SimEnv, Rc<dyn Environment>) {
        let sim = SimEnv::new();
        let hero = sim.insert_region(2400.0);
        sim.set_region_id(hero, Some("home"));
        let env: Rc<dyn Environment> = Rc::new(sim.clone());
        (sim, env)
    }

    #[test]
    fn test_initial_fragment_starts_chain() {
        let (sim, env) = sim_with_hero();
        let projects = env.insert_region(1200.0);
        env.set_region_id(projects, Some("projects"));
        sim.set_fragment(Some("#projects"));

        let nav = Navigator::mount(env, test_policy());
        assert_eq!(nav.target(), Some(SectionId::Projects));
        assert!(sim.scroll_commands().is_empty(), "first attempt waits for a frame");

        sim.run_frame();
        assert_eq!(sim.scroll_commands_for("projects"), 1);
        assert_eq!(nav.retry_state(), Some(RetryState::Succeeded));
    }

    #[test]
    fn test_no_fragment_no_chain() {
        let (sim, env) = sim_with_hero();
        let nav = Navigator::mount(env, test_policy());

        assert_eq!(nav.target(), None);
        assert_eq!(nav.retry_state(), None);
        sim.run_frame();
        sim.advance(Duration::from_secs(2));
        assert!(sim.scroll_commands().is_empty());
    }

    #[test]
    fn test_unrecognized_fragment_is_no_target() {
        let (sim, env) = sim_with_hero();
        sim.set_fragment(Some("#resume"));

        let nav = Navigator::mount(env, test_policy());
        assert_eq!(nav.target(), None);
        assert_eq!(nav.retry_state(), None);
    }

    #[test]
    fn test_retarget_cancels_old_chain() {
        let (sim, env) = sim_with_hero();
        // "about" never exists; "skills" does.
        let skills = env.insert_region(700.0);
        env.set_region_id(skills, Some("skills"));

        let nav = Navigator::mount(env, test_policy());
        sim.set_fragment(Some("#about"));
        sim.run_frame();
        sim.advance(INTERVAL);
        assert_eq!(
            nav.retry_state(),
            Some(RetryState::Waiting {
                attempts_remaining: 10
            })
        );

        // Switch targets while A's chain is in flight.
        sim.set_fragment(Some("#skills"));
        sim.run_frame();
        assert_eq!(nav.retry_state(), Some(RetryState::Succeeded));
        assert_eq!(sim.scroll_commands_for("skills"), 1);
        assert_eq!(sim.scroll_commands_for("about"), 0);

        // A's revoked timers never come back.
        sim.advance(Duration::from_secs(5));
        assert_eq!(sim.scroll_commands_for("about"), 0);
    }

    #[test]
    fn test_clearing_fragment_cancels_chain() {
        let (sim, env) = sim_with_hero();
        let nav = Navigator::mount(env, test_policy());

        sim.set_fragment(Some("#contact"));
        sim.run_frame();
        assert!(matches!(
            nav.retry_state(),
            Some(RetryState::Waiting { .. })
        ));

        sim.set_fragment(None);
        assert_eq!(nav.retry_state(), None);
        assert_eq!(sim.pending_timer_count(), 0);
    }

    #[test]
    fn test_force_flags_follow_target() {
        let (sim, env) = sim_with_hero();
        let nav = Navigator::mount(env, test_policy());

        let force_about = nav.force_flag(SectionId::About);
        let force_skills = nav.force_flag(SectionId::Skills);
        assert!(!force_about());
        assert!(!force_skills());

        sim.set_fragment(Some("#about"));
        assert!(force_about());
        assert!(!force_skills());

        sim.set_fragment(Some("#skills"));
        assert!(!force_about());
        assert!(force_skills());
    }

    #[test]
    fn test_unmount_cancels_and_detaches() {
        let (sim, env) = sim_with_hero();
        let nav = Navigator::mount(env, test_policy());

        sim.set_fragment(Some("#about"));
        sim.run_frame();
        assert_eq!(sim.pending_timer_count(), 1);

        nav.unmount();
        assert_eq!(sim.pending_timer_count(), 0);

        // Fragment changes after unmount reach nobody.
        sim.set_fragment(Some("#skills"));
        sim.run_frame();
        sim.advance(Duration::from_secs(2));
        assert!(sim.scroll_commands().is_empty());
    }

    #[test]
    fn test_drop_cancels_chain() {
        let (sim, env) = sim_with_hero();
        {
            let _nav = Navigator::mount(env, test_policy());
            sim.set_fragment(Some("#contact"));
            sim.run_frame();
            assert_eq!(sim.pending_timer_count(), 1);
        }
        assert_eq!(sim.pending_timer_count(), 0);
    }
}
