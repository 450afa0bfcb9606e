//! Bounded scroll retry - pure state machine plus scheduling driver.
//!
//! When a navigation target is set, its element may not exist yet: the
//! matching section's gate is still completing a deferred render. The
//! reconciler polls for the element a bounded number of times at a fixed
//! short interval, scrolls on the first hit, and gives up silently after
//! the last miss - a missed scroll-to-anchor is cosmetic, never an error.
//!
//! The retry logic itself is a pure state machine ([`RetryState`]) so the
//! bound and cancellation semantics are unit-testable without any clock;
//! [`ScrollRetry`] is the side-effecting driver that schedules attempts
//! through the environment port (first attempt on the next animation
//! frame, the rest on fixed-interval timers).
//!
//! # Determinism
//!
//! Delays use a fixed interval (no jitter) so simulated-clock tests can
//! reproduce exact attempt sequences.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::env::Environment;
use crate::types::{Cleanup, SectionId};

// =============================================================================
// Retry policy
// =============================================================================

/// How persistently to look for a scroll target.
///
/// `max_attempts` counts element lookups: a target that never appears is
/// looked up exactly that many times. The defaults mirror the tuned values
/// this page family ships with (12 × 120ms ≈ 1.4s of patience).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of element lookups (at least 1).
    pub max_attempts: u32,
    /// Fixed delay between consecutive lookups.
    pub interval: Duration,
}

impl RetryPolicy {
    /// Default lookup bound.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 12;

    /// Default delay between lookups.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(120);

    /// Create a policy. `max_attempts` is clamped up to 1.
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            interval: Self::DEFAULT_INTERVAL,
        }
    }
}

// =============================================================================
// Pure state machine
// =============================================================================

/// Outcome of one element lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Found,
    NotFound,
}

/// State of one retry chain.
///
/// Transitions are pure; `Succeeded`, `Cancelled` and `Exhausted` are
/// terminal and absorb every further event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryState {
    /// Chain constructed but not started.
    #[default]
    Idle,
    /// Chain live, this many lookups left.
    Waiting { attempts_remaining: u32 },
    /// Target found, scroll command issued.
    Succeeded,
    /// Chain invalidated (target changed or owner torn down).
    Cancelled,
    /// Lookup bound spent without finding the target.
    Exhausted,
}

impl RetryState {
    /// Enter the live state with the policy's full lookup budget.
    pub fn begin(policy: &RetryPolicy) -> RetryState {
        RetryState::Waiting {
            attempts_remaining: policy.max_attempts.max(1),
        }
    }

    /// Account for one lookup.
    pub fn on_lookup(self, lookup: Lookup) -> RetryState {
        match (self, lookup) {
            (RetryState::Waiting { .. }, Lookup::Found) => RetryState::Succeeded,
            (RetryState::Waiting { attempts_remaining }, Lookup::NotFound) => {
                if attempts_remaining > 1 {
                    RetryState::Waiting {
                        attempts_remaining: attempts_remaining - 1,
                    }
                } else {
                    RetryState::Exhausted
                }
            }
            (state, _) => state,
        }
    }

    /// Invalidate the chain. Terminal states stay what they are.
    pub fn cancel(self) -> RetryState {
        match self {
            RetryState::Idle | RetryState::Waiting { .. } => RetryState::Cancelled,
            state => state,
        }
    }

    /// Whether no further lookups will happen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RetryState::Succeeded | RetryState::Cancelled | RetryState::Exhausted
        )
    }
}

// =============================================================================
// Driver
// =============================================================================

struct RetryInner {
    env: Rc<dyn Environment>,
    target: SectionId,
    policy: RetryPolicy,
    state: RefCell<RetryState>,
    cancelled: Cell<bool>,
    timer: RefCell<Option<Cleanup>>,
}

/// One run of the bounded polling loop for a navigation target.
///
/// Cancellation is cooperative: [`ScrollRetry::cancel`] revokes the pending
/// timer best-effort AND raises a flag that every attempt checks first, so
/// a callback that outlives the revocation still no-ops.
pub struct ScrollRetry {
    inner: Rc<RetryInner>,
}

impl ScrollRetry {
    /// Start a chain for `target`.
    ///
    /// The first lookup is deferred to the next animation frame so a
    /// force-mount triggered by the same target change lands in the
    /// document first.
    pub fn start(env: Rc<dyn Environment>, target: SectionId, policy: RetryPolicy) -> ScrollRetry {
        let inner = Rc::new(RetryInner {
            env: env.clone(),
            target,
            policy,
            state: RefCell::new(RetryState::begin(&policy)),
            cancelled: Cell::new(false),
            timer: RefCell::new(None),
        });

        debug!(section = %target, attempts = policy.max_attempts, "starting scroll retry chain");

        let attempt_inner = inner.clone();
        env.request_frame(Box::new(move || Self::attempt(&attempt_inner)));

        ScrollRetry { inner }
    }

    fn attempt(inner: &Rc<RetryInner>) {
        // Cancellation flag first: a frame or timer callback that fires
        // after invalidation must not look anything up.
        if inner.cancelled.get() {
            trace!(section = %inner.target, "attempt after cancellation, ignoring");
            return;
        }

        match inner.env.find_element(inner.target.as_str()) {
            Some(key) => {
                inner.env.scroll_into_view(key);
                let next = inner.state.borrow().on_lookup(Lookup::Found);
                *inner.state.borrow_mut() = next;
                debug!(section = %inner.target, "scroll target found");
            }
            None => {
                let next = inner.state.borrow().on_lookup(Lookup::NotFound);
                *inner.state.borrow_mut() = next;
                match next {
                    RetryState::Waiting { attempts_remaining } => {
                        trace!(section = %inner.target, attempts_remaining, "scroll target not present yet");
                        let again = inner.clone();
                        let revoke = inner.env.set_timeout(
                            inner.policy.interval,
                            Box::new(move || Self::attempt(&again)),
                        );
                        *inner.timer.borrow_mut() = Some(revoke);
                    }
                    RetryState::Exhausted => {
                        debug!(section = %inner.target, "scroll retries exhausted, giving up");
                    }
                    _ => {}
                }
            }
        }
    }

    /// Invalidate the chain: raise the flag, revoke the pending timer,
    /// settle the state.
    pub fn cancel(&self) {
        self.inner.cancelled.set(true);
        let next = self.inner.state.borrow().cancel();
        *self.inner.state.borrow_mut() = next;
        if let Some(revoke) = self.inner.timer.borrow_mut().take() {
            revoke();
        }
    }

    /// Current machine state.
    pub fn state(&self) -> RetryState {
        *self.inner.state.borrow()
    }

    /// The target this chain is reconciling.
    pub fn target(&self) -> SectionId {
        self.inner.target
    }
}

// =============================================================================
// Tests
// =============================================================================
