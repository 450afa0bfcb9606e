//! Environment port - the injected host capability surface.
//!
//! The page runtime never touches a real window, document or event loop
//! directly. Everything it needs from the hosting environment goes through
//! the [`Environment`] trait: fragment state, the document's region flow,
//! scrolling, pointer input, scheduling and proximity observation. This is
//! what makes the mount gates and the navigation coordinator testable
//! without a rendering host.
//!
//! # Model
//!
//! The document is a vertical flow of *regions*: each region occupies the
//! full page width and a height, stacked in insertion order. A region may
//! carry an element id (`"about"`, `"projects"`); anchored lookups and
//! scroll commands address regions by id.
//!
//! # Callback discipline
//!
//! All callbacks are delivered on the single UI thread, one at a time.
//! Subscriptions return a [`Cleanup`] that detaches the callback; timer
//! cleanups are best-effort revocation only, so timed callbacks must also
//! guard with their own cancellation flags.

use std::rc::Rc;
use std::time::Duration;

use bitflags::bitflags;

use crate::error::EnvError;
use crate::types::{Cleanup, Margin, Point, Px, Rect, ScrollMetrics};

mod sim;

pub use sim::SimEnv;

// =============================================================================
// Capabilities
// =============================================================================

bitflags! {
    /// What the hosting environment can do.
    ///
    /// Consumers use these to pick fallbacks up front (a host without
    /// `PROXIMITY` makes every gate fail open, a host without
    /// `POINTER_EVENTS` simply never moves the pointer mirror).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EnvCaps: u8 {
        /// Proximity observation ("notify when region nears the viewport").
        const PROXIMITY = 1 << 0;
        /// Smooth scrolling to an element.
        const SMOOTH_SCROLL = 1 << 1;
        /// Fragment-change notifications without full navigation.
        const FRAGMENT_EVENTS = 1 << 2;
        /// Pointer-move notifications.
        const POINTER_EVENTS = 1 << 3;
    }
}

// =============================================================================
// Region handle
// =============================================================================

/// Opaque handle to a document region.
///
/// Stable for the region's lifetime; never reused while the region exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionKey(pub(crate) u64);

// =============================================================================
// Environment trait
// =============================================================================

/// The host capability surface the page runtime runs against.
///
/// Implementations are single-threaded; methods take `&self` and use
/// interior mutability. The crate ships [`SimEnv`], a deterministic
/// implementation driven by a manual clock.
pub trait Environment {
    /// Capability flags for this host.
    fn caps(&self) -> EnvCaps;

    // -------------------------------------------------------------------------
    // Fragment
    // -------------------------------------------------------------------------

    /// Current URL fragment, without the leading `#`. `None` when absent.
    fn fragment(&self) -> Option<String>;

    /// Subscribe to fragment changes. The callback fires after the new
    /// fragment is readable via [`Environment::fragment`].
    fn on_fragment_change(&self, callback: Rc<dyn Fn()>) -> Cleanup;

    // -------------------------------------------------------------------------
    // Document
    // -------------------------------------------------------------------------

    /// Append a region to the document flow with the given minimum height.
    fn insert_region(&self, min_height: Px) -> RegionKey;

    /// Set or clear the element id carried by a region.
    fn set_region_id(&self, key: RegionKey, id: Option<&str>);

    /// Resize a region (content mounted or grew). Clamped to the region's
    /// minimum height.
    fn set_region_height(&self, key: RegionKey, height: Px);

    /// Remove a region from the flow. Pending observations on it lapse.
    fn remove_region(&self, key: RegionKey);

    /// Look up a region by element id.
    fn find_element(&self, id: &str) -> Option<RegionKey>;

    /// Bounding rectangle of a region in page coordinates.
    fn element_rect(&self, key: RegionKey) -> Option<Rect>;

    // -------------------------------------------------------------------------
    // Scrolling
    // -------------------------------------------------------------------------

    /// Request a smooth scroll bringing the region into view. Easing and
    /// duration are the host's concern.
    fn scroll_into_view(&self, key: RegionKey);

    /// Snapshot of the current scroll state.
    fn scroll_metrics(&self) -> ScrollMetrics;

    /// Subscribe to scroll-position changes.
    fn on_scroll(&self, callback: Rc<dyn Fn()>) -> Cleanup;

    // -------------------------------------------------------------------------
    // Pointer
    // -------------------------------------------------------------------------

    /// Subscribe to pointer movement in page coordinates.
    fn on_pointer_move(&self, callback: Rc<dyn Fn(Point)>) -> Cleanup;

    // -------------------------------------------------------------------------
    // Scheduling
    // -------------------------------------------------------------------------

    /// Run a callback on the next animation frame.
    fn request_frame(&self, callback: Box<dyn FnOnce()>);

    /// Run a callback after `delay`. The returned cleanup revokes the timer
    /// best-effort; a callback that races the revocation must no-op on its
    /// own cancellation flag.
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Cleanup;

    // -------------------------------------------------------------------------
    // Proximity
    // -------------------------------------------------------------------------

    /// One-shot notification when the region enters the viewport expanded
    /// by `margin`. Fires immediately if the region is already proximate.
    /// The returned cleanup disconnects a not-yet-fired observation.
    fn observe_proximity(
        &self,
        key: RegionKey,
        margin: Margin,
        callback: Box<dyn FnOnce()>,
    ) -> Result<Cleanup, EnvError>;
}
