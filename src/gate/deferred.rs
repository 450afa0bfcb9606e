//! Deferred mount gate - render on force or proximity, never unrender.
//!
//! The gate's render decision is `force() OR has_become_proximate`:
//!
//! - Constructed with the force flag already true, it renders during
//!   construction and starts no observation at all.
//! - Otherwise it parks a one-shot proximity observation on its placeholder
//!   and renders on the first notification, disconnecting the observation.
//! - If the force flag turns true later (the user navigated to the
//!   section), it renders immediately and cancels the pending observation.
//! - Once rendered, nothing reverses the decision: the force flag dropping
//!   back to false or the region leaving the viewport are both ignored.
//!
//! If the environment cannot provide proximity observation the gate fails
//! open - the section mounts as if it were immediately proximate. Never
//! mounting would be the one unrecoverable outcome.
//!
//! # Pattern: EffectScope-based Cleanup
//!
//! The reactive machinery lives in an EffectScope:
//! 1. An effect inside the scope watches `force() || proximate` and runs
//!    the render exactly once.
//! 2. Content cleanup is registered with `on_scope_dispose()`.
//! 3. The handle's teardown stops the scope, releases the registry index
//!    (which disconnects any pending observation) and removes the
//!    placeholder region.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_signals::{effect, effect_scope, on_scope_dispose, signal, Signal};
use tracing::warn;

use crate::engine::{allocate_index, on_destroy, release_index};
use crate::env::{Environment, RegionKey};
use crate::types::{Cleanup, Margin};

/// Height a gate's placeholder occupies while unmounted.
///
/// Non-zero so the region is measurable for proximity and the layout does
/// not collapse before content exists.
pub const PLACEHOLDER_MIN_HEIGHT: f32 = 1.0;

// =============================================================================
// Gate Handle
// =============================================================================

/// Handle to a deferred mount gate.
///
/// Holds the mount latch signal and the teardown for the wrapper, its
/// placeholder region, any pending observation and any mounted content.
pub struct GateHandle {
    mounted: Signal<bool>,
    region: RegionKey,
    teardown: Option<Cleanup>,
}

impl GateHandle {
    /// Whether content has been rendered. Creates a reactive dependency
    /// when read from an effect or derived.
    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    /// The mount latch signal itself, for reactive composition.
    pub fn mounted_signal(&self) -> Signal<bool> {
        self.mounted.clone()
    }

    /// The wrapper's placeholder region.
    pub fn region(&self) -> RegionKey {
        self.region
    }

    /// Tear the gate down: content cleanup, observation disconnect,
    /// placeholder removal, index release.
    pub fn unmount(mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for GateHandle {
    fn drop(&mut self) {
        // Best effort for handles that were never explicitly unmounted.
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

// =============================================================================
// Gate Construction
// =============================================================================

/// Create a deferred mount gate.
///
/// # Arguments
///
/// * `env` - The environment port the gate lives against.
/// * `margin` - Proximity margin: distance from the viewport at which the
///   placeholder counts as "about to be visible".
/// * `force` - Getter for the force flag (creates a reactive dependency,
///   so a signal-backed getter re-evaluates the gate when it changes).
/// * `render` - Renders the content into the placeholder region once the
///   gate opens; runs at most once; returns the content's cleanup.
///
/// # Example
///
/// ```ignore
/// use viewgate::{deferred, Margin, SimEnv};
///
/// let target = signal(false);
/// let flag = target.clone();
/// let gate = deferred(
///     env.clone(),
///     Margin::DEFAULT,
///     move || flag.get(),
///     |region| Box::new(|| {}),
/// );
///
/// target.set(true); // escalation: mounts immediately
/// assert!(gate.is_mounted());
/// ```
pub fn deferred<F, R>(env: Rc<dyn Environment>, margin: Margin, force: F, render: R) -> GateHandle
where
    F: Fn() -> bool + 'static,
    R: FnOnce(RegionKey) -> Cleanup + 'static,
{
    let wrapper_index = allocate_index(None);
    let region = env.insert_region(PLACEHOLDER_MIN_HEIGHT);

    let mounted = signal(false);
    let proximate = signal(false);
    let rendered = Rc::new(Cell::new(false));
    let render_fn: Rc<RefCell<Option<R>>> = Rc::new(RefCell::new(Some(render)));
    let content_cleanup: Rc<RefCell<Option<Cleanup>>> = Rc::new(RefCell::new(None));
    let observation: Rc<RefCell<Option<Cleanup>>> = Rc::new(RefCell::new(None));

    let scope = effect_scope(false);

    {
        let mounted = mounted.clone();
        let proximate = proximate.clone();
        let rendered = rendered.clone();
        let render_fn = render_fn.clone();
        let content_cleanup = content_cleanup.clone();
        let content_for_dispose = content_cleanup.clone();
        let observation = observation.clone();

        scope.run(move || {
            // Initial render happens on the effect's first run, so a gate
            // constructed with force() == true mounts synchronously here.
            let _stop = effect(move || {
                let should = force() || proximate.get();
                if !should || rendered.get() {
                    return;
                }
                rendered.set(true);

                // One-shot: a pending observation has nothing left to say.
                if let Some(disconnect) = observation.borrow_mut().take() {
                    disconnect();
                }

                if let Some(render) = render_fn.borrow_mut().take() {
                    let content_index = allocate_index(None);
                    let inner = render(region);
                    *content_cleanup.borrow_mut() = Some(Box::new(move || {
                        inner();
                        release_index(content_index);
                    }));
                }

                mounted.set(true);
            });

            on_scope_dispose(move || {
                if let Some(cleanup) = content_for_dispose.borrow_mut().take() {
                    cleanup();
                }
            });
        });
    }

    // Only observe when the first effect run did not already mount.
    if !rendered.get() {
        let notify = proximate.clone();
        match env.observe_proximity(region, margin, Box::new(move || {
            notify.set(true);
        })) {
            Ok(disconnect) => {
                if rendered.get() {
                    // The observation fired during registration.
                    disconnect();
                } else {
                    *observation.borrow_mut() = Some(disconnect);
                }
            }
            Err(err) => {
                // Fail open: an eagerly mounted section beats one that
                // never appears.
                warn!(error = %err, "proximity observation unavailable, mounting immediately");
                proximate.set(true);
            }
        }
    }

    // Releasing the wrapper disconnects whatever observation is still parked.
    {
        let observation = observation.clone();
        on_destroy(wrapper_index, move || {
            if let Some(disconnect) = observation.borrow_mut().take() {
                disconnect();
            }
        });
    }

    let teardown: Cleanup = {
        let env = env.clone();
        Box::new(move || {
            scope.stop();
            release_index(wrapper_index);
            env.remove_region(region);
        })
    };

    GateHandle {
        mounted,
        region,
        teardown: Some(teardown),
    }
}

// =============================================================================
// Tests
// =============================================================================
