//! Simulated environment - deterministic host for tests and demos.
//!
//! `SimEnv` implements the full [`Environment`] port with a manual clock:
//! nothing happens between explicit [`SimEnv::advance`] / [`SimEnv::run_frame`]
//! calls, so every interleaving of timers, frames and observer notifications
//! is reproducible.
//!
//! # Model
//!
//! - Document: regions stacked vertically in insertion order, full page
//!   width. A region's y is the sum of the heights before it.
//! - Proximity: observers are bounding-box polls, re-checked after every
//!   mutation that can move rectangles (scroll, resize, region changes).
//!   An observation registered against an already-proximate region fires
//!   during registration.
//! - Scrolling: `scroll_into_view` applies the final position immediately
//!   (smoothness is presentational) and records the command in a log that
//!   tests can assert against.
//!
//! # Clock
//!
//! ```ignore
//! let sim = SimEnv::new();
//! sim.run_frame();                        // flush animation-frame callbacks
//! sim.advance(Duration::from_millis(120)); // fire due timers in order
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::error::EnvError;
use crate::types::{Cleanup, Margin, Point, Px, Rect, ScrollMetrics};

use super::{EnvCaps, Environment, RegionKey};

/// Page width used for every region rectangle.
pub const PAGE_WIDTH: Px = 1280.0;

/// Viewport height a fresh `SimEnv` starts with.
pub const DEFAULT_VIEWPORT_HEIGHT: Px = 800.0;

// =============================================================================
// Internal state
// =============================================================================

struct SimRegion {
    key: u64,
    id: Option<String>,
    min_height: Px,
    height: Px,
}

struct ProximityObserver {
    sub: u64,
    region: u64,
    margin: Margin,
    callback: Box<dyn FnOnce()>,
}

struct SimTimer {
    sub: u64,
    fire_at: u64,
    callback: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct SimState {
    now_ms: u64,
    next_key: u64,
    next_sub: u64,
    regions: Vec<SimRegion>,
    fragment: Option<String>,
    fragment_subs: Vec<(u64, Rc<dyn Fn()>)>,
    scroll_subs: Vec<(u64, Rc<dyn Fn()>)>,
    pointer_subs: Vec<(u64, Rc<dyn Fn(Point)>)>,
    observers: Vec<ProximityObserver>,
    timers: Vec<SimTimer>,
    frames: Vec<Box<dyn FnOnce()>>,
    scroll_top: Px,
    viewport_height: Px,
    scroll_log: Vec<String>,
    observation_unavailable: bool,
}

impl SimState {
    fn next_sub(&mut self) -> u64 {
        let sub = self.next_sub;
        self.next_sub += 1;
        sub
    }

    fn region_index(&self, key: u64) -> Option<usize> {
        self.regions.iter().position(|r| r.key == key)
    }

    fn region_rect(&self, key: u64) -> Option<Rect> {
        let index = self.region_index(key)?;
        let y: Px = self.regions[..index].iter().map(|r| r.height).sum();
        Some(Rect::new(0.0, y, PAGE_WIDTH, self.regions[index].height))
    }

    fn document_height(&self) -> Px {
        self.regions.iter().map(|r| r.height).sum()
    }

    fn viewport_rect(&self) -> Rect {
        Rect::new(0.0, self.scroll_top, PAGE_WIDTH, self.viewport_height)
    }

    fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            scroll_top: self.scroll_top,
            scroll_height: self.document_height(),
            viewport_height: self.viewport_height,
        }
    }

    fn is_proximate(&self, region: u64, margin: Margin) -> bool {
        match self.region_rect(region) {
            Some(rect) => rect.intersects(&self.viewport_rect().expand(margin)),
            None => false,
        }
    }
}

// =============================================================================
// SimEnv
// =============================================================================

/// Deterministic [`Environment`] implementation.
///
/// Cheap to clone; clones share the same simulated host, so tests keep one
/// clone to drive the clock while the runtime holds another as
/// `Rc<dyn Environment>`.
#[derive(Clone)]
pub struct SimEnv {
    state: Rc<RefCell<SimState>>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEnv {
    /// Create a fresh simulated host with an empty document.
    pub fn new() -> Self {
        let state = SimState {
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            ..SimState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    // -------------------------------------------------------------------------
    // Clock
    // -------------------------------------------------------------------------

    /// Current simulated time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.state.borrow().now_ms
    }

    /// Advance the clock, firing due timers in (fire time, registration)
    /// order. Callbacks run outside the state borrow and may schedule
    /// further timers inside the window.
    pub fn advance(&self, delta: Duration) {
        let target = self.state.borrow().now_ms + delta.as_millis() as u64;
        loop {
            let due = {
                let mut state = self.state.borrow_mut();
                let next = state
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.fire_at <= target)
                    .min_by_key(|(_, t)| (t.fire_at, t.sub))
                    .map(|(i, _)| i);
                match next {
                    Some(i) => {
                        let timer = state.timers.remove(i);
                        state.now_ms = timer.fire_at;
                        Some(timer.callback)
                    }
                    None => None,
                }
            };
            match due {
                Some(callback) => callback(),
                None => break,
            }
        }
        self.state.borrow_mut().now_ms = target;
    }

    /// Run every queued animation-frame callback. Callbacks queued while
    /// running belong to the next frame.
    pub fn run_frame(&self) {
        let frames = std::mem::take(&mut self.state.borrow_mut().frames);
        for callback in frames {
            callback();
        }
    }

    // -------------------------------------------------------------------------
    // Host-side controls
    // -------------------------------------------------------------------------

    /// Set the fragment (leading `#` tolerated, empty means none) and fire
    /// change notifications.
    pub fn set_fragment(&self, fragment: Option<&str>) {
        let normalized = fragment
            .map(|f| f.strip_prefix('#').unwrap_or(f).to_string())
            .filter(|f| !f.is_empty());
        let subs: Vec<Rc<dyn Fn()>> = {
            let mut state = self.state.borrow_mut();
            state.fragment = normalized;
            state.fragment_subs.iter().map(|(_, cb)| cb.clone()).collect()
        };
        for callback in subs {
            callback();
        }
    }

    /// Scroll the viewport to an absolute offset (clamped) and notify.
    pub fn scroll_to(&self, y: Px) {
        self.apply_scroll(y);
    }

    /// Resize the viewport and re-check proximity.
    pub fn set_viewport_height(&self, height: Px) {
        self.state.borrow_mut().viewport_height = height;
        self.check_observers();
    }

    /// Inject a pointer movement.
    pub fn move_pointer(&self, position: Point) {
        let subs: Vec<Rc<dyn Fn(Point)>> = self
            .state
            .borrow()
            .pointer_subs
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for callback in subs {
            callback(position);
        }
    }

    /// Make subsequent `observe_proximity` calls fail, to exercise the
    /// fail-open path.
    pub fn set_observation_unavailable(&self, unavailable: bool) {
        self.state.borrow_mut().observation_unavailable = unavailable;
    }

    // -------------------------------------------------------------------------
    // Introspection for assertions
    // -------------------------------------------------------------------------

    /// Element ids (or `region-<key>` for anonymous regions) of every
    /// scroll command issued so far, in order.
    pub fn scroll_commands(&self) -> Vec<String> {
        self.state.borrow().scroll_log.clone()
    }

    /// Number of scroll commands issued for a given element id.
    pub fn scroll_commands_for(&self, id: &str) -> usize {
        self.state
            .borrow()
            .scroll_log
            .iter()
            .filter(|entry| entry.as_str() == id)
            .count()
    }

    /// Current scroll offset.
    pub fn scroll_top(&self) -> Px {
        self.state.borrow().scroll_top
    }

    /// Total document height.
    pub fn document_height(&self) -> Px {
        self.state.borrow().document_height()
    }

    /// Pending (not yet fired) proximity observations.
    pub fn pending_observer_count(&self) -> usize {
        self.state.borrow().observers.len()
    }

    /// Pending timers.
    pub fn pending_timer_count(&self) -> usize {
        self.state.borrow().timers.len()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn apply_scroll(&self, y: Px) {
        let subs: Vec<Rc<dyn Fn()>> = {
            let mut state = self.state.borrow_mut();
            let max = state.metrics().max_scroll();
            state.scroll_top = y.clamp(0.0, max);
            state.scroll_subs.iter().map(|(_, cb)| cb.clone()).collect()
        };
        for callback in subs {
            callback();
        }
        self.check_observers();
    }

    /// Fire every observer whose region now intersects its expanded
    /// viewport. Fired observers are removed before their callbacks run
    /// (one-shot); callbacks may mutate the document, so keep looping until
    /// a pass fires nothing.
    fn check_observers(&self) {
        loop {
            let fired: Vec<Box<dyn FnOnce()>> = {
                let mut state = self.state.borrow_mut();
                let mut fired = Vec::new();
                let mut index = 0;
                while index < state.observers.len() {
                    let observer = &state.observers[index];
                    if state.is_proximate(observer.region, observer.margin) {
                        fired.push(state.observers.remove(index).callback);
                    } else {
                        index += 1;
                    }
                }
                fired
            };
            if fired.is_empty() {
                break;
            }
            for callback in fired {
                callback();
            }
        }
    }
}

// =============================================================================
// Environment implementation
// =============================================================================

impl Environment for SimEnv {
    fn caps(&self) -> EnvCaps {
        let mut caps = EnvCaps::all();
        if self.state.borrow().observation_unavailable {
            caps.remove(EnvCaps::PROXIMITY);
        }
        caps
    }

    fn fragment(&self) -> Option<String> {
        self.state.borrow().fragment.clone()
    }

    fn on_fragment_change(&self, callback: Rc<dyn Fn()>) -> Cleanup {
        let sub = {
            let mut state = self.state.borrow_mut();
            let sub = state.next_sub();
            state.fragment_subs.push((sub, callback));
            sub
        };
        let state = self.state.clone();
        Box::new(move || {
            state.borrow_mut().fragment_subs.retain(|(s, _)| *s != sub);
        })
    }

    fn insert_region(&self, min_height: Px) -> RegionKey {
        let key = {
            let mut state = self.state.borrow_mut();
            let key = state.next_key;
            state.next_key += 1;
            state.regions.push(SimRegion {
                key,
                id: None,
                min_height,
                height: min_height,
            });
            key
        };
        self.check_observers();
        RegionKey(key)
    }

    fn set_region_id(&self, key: RegionKey, id: Option<&str>) {
        let mut state = self.state.borrow_mut();
        if let Some(index) = state.region_index(key.0) {
            state.regions[index].id = id.map(str::to_string);
        }
    }

    fn set_region_height(&self, key: RegionKey, height: Px) {
        {
            let mut state = self.state.borrow_mut();
            if let Some(index) = state.region_index(key.0) {
                let min = state.regions[index].min_height;
                state.regions[index].height = height.max(min);
            }
        }
        self.check_observers();
    }

    fn remove_region(&self, key: RegionKey) {
        {
            let mut state = self.state.borrow_mut();
            state.regions.retain(|r| r.key != key.0);
            state.observers.retain(|o| o.region != key.0);
        }
        self.check_observers();
    }

    fn find_element(&self, id: &str) -> Option<RegionKey> {
        self.state
            .borrow()
            .regions
            .iter()
            .find(|r| r.id.as_deref() == Some(id))
            .map(|r| RegionKey(r.key))
    }

    fn element_rect(&self, key: RegionKey) -> Option<Rect> {
        self.state.borrow().region_rect(key.0)
    }

    fn scroll_into_view(&self, key: RegionKey) {
        let target = {
            let mut state = self.state.borrow_mut();
            let rect = state.region_rect(key.0);
            if let Some(rect) = rect {
                let entry = state
                    .regions
                    .iter()
                    .find(|r| r.key == key.0)
                    .and_then(|r| r.id.clone())
                    .unwrap_or_else(|| format!("region-{}", key.0));
                state.scroll_log.push(entry);
                Some(rect.y)
            } else {
                None
            }
        };
        if let Some(y) = target {
            self.apply_scroll(y);
        }
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        self.state.borrow().metrics()
    }

    fn on_scroll(&self, callback: Rc<dyn Fn()>) -> Cleanup {
        let sub = {
            let mut state = self.state.borrow_mut();
            let sub = state.next_sub();
            state.scroll_subs.push((sub, callback));
            sub
        };
        let state = self.state.clone();
        Box::new(move || {
            state.borrow_mut().scroll_subs.retain(|(s, _)| *s != sub);
        })
    }

    fn on_pointer_move(&self, callback: Rc<dyn Fn(Point)>) -> Cleanup {
        let sub = {
            let mut state = self.state.borrow_mut();
            let sub = state.next_sub();
            state.pointer_subs.push((sub, callback));
            sub
        };
        let state = self.state.clone();
        Box::new(move || {
            state.borrow_mut().pointer_subs.retain(|(s, _)| *s != sub);
        })
    }

    fn request_frame(&self, callback: Box<dyn FnOnce()>) {
        self.state.borrow_mut().frames.push(callback);
    }

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Cleanup {
        let sub = {
            let mut state = self.state.borrow_mut();
            let sub = state.next_sub();
            let fire_at = state.now_ms + delay.as_millis() as u64;
            state.timers.push(SimTimer {
                sub,
                fire_at,
                callback,
            });
            sub
        };
        let state = self.state.clone();
        Box::new(move || {
            state.borrow_mut().timers.retain(|t| t.sub != sub);
        })
    }

    fn observe_proximity(
        &self,
        key: RegionKey,
        margin: Margin,
        callback: Box<dyn FnOnce()>,
    ) -> Result<Cleanup, EnvError> {
        let immediate = {
            let state = self.state.borrow();
            if state.observation_unavailable {
                return Err(EnvError::ObservationUnavailable(
                    "simulated host has observation disabled".into(),
                ));
            }
            state.is_proximate(key.0, margin)
        };

        if immediate {
            callback();
            return Ok(Box::new(|| {}));
        }

        let sub = {
            let mut state = self.state.borrow_mut();
            let sub = state.next_sub();
            state.observers.push(ProximityObserver {
                sub,
                region: key.0,
                margin,
                callback,
            });
            sub
        };
        let state = self.state.clone();
        Ok(Box::new(move || {
            state.borrow_mut().observers.retain(|o| o.sub != sub);
        }))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn flag() -> (Rc<Cell<bool>>, Box<dyn FnOnce()>) {
        let cell = Rc::new(Cell::new(false));
        let clone = cell.clone();
        (cell, Box::new(move || clone.set(true)))
    }

    #[test]
    fn test_region_flow_geometry() {
        let sim = SimEnv::new();
        let a = sim.insert_region(100.0);
        let b = sim.insert_region(50.0);

        assert_eq!(
            sim.element_rect(a),
            Some(Rect::new(0.0, 0.0, PAGE_WIDTH, 100.0))
        );
        assert_eq!(
            sim.element_rect(b),
            Some(Rect::new(0.0, 100.0, PAGE_WIDTH, 50.0))
        );

        sim.set_region_height(a, 300.0);
        assert_eq!(
            sim.element_rect(b),
            Some(Rect::new(0.0, 300.0, PAGE_WIDTH, 50.0))
        );
    }

    #[test]
    fn test_height_clamped_to_min() {
        let sim = SimEnv::new();
        let a = sim.insert_region(10.0);
        sim.set_region_height(a, 1.0);
        assert_eq!(sim.element_rect(a).unwrap().height, 10.0);
    }

    #[test]
    fn test_find_element_by_id() {
        let sim = SimEnv::new();
        let a = sim.insert_region(100.0);
        assert_eq!(sim.find_element("about"), None);

        sim.set_region_id(a, Some("about"));
        assert_eq!(sim.find_element("about"), Some(a));

        sim.set_region_id(a, None);
        assert_eq!(sim.find_element("about"), None);
    }

    #[test]
    fn test_timers_fire_in_order() {
        let sim = SimEnv::new();
        let order: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));

        let o = order.clone();
        sim.set_timeout(Duration::from_millis(50), Box::new(move || o.borrow_mut().push(2)));
        let o = order.clone();
        sim.set_timeout(Duration::from_millis(10), Box::new(move || o.borrow_mut().push(1)));
        let o = order.clone();
        sim.set_timeout(Duration::from_millis(90), Box::new(move || o.borrow_mut().push(3)));

        sim.advance(Duration::from_millis(60));
        assert_eq!(*order.borrow(), vec![1, 2]);
        assert_eq!(sim.pending_timer_count(), 1);

        sim.advance(Duration::from_millis(60));
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
        assert_eq!(sim.now_ms(), 120);
    }

    #[test]
    fn test_timer_chain_within_one_advance() {
        let sim = SimEnv::new();
        let count = Rc::new(Cell::new(0u32));

        fn schedule(sim: &SimEnv, count: Rc<Cell<u32>>) {
            let sim_clone = sim.clone();
            sim.set_timeout(
                Duration::from_millis(10),
                Box::new(move || {
                    count.set(count.get() + 1);
                    if count.get() < 3 {
                        schedule(&sim_clone, count);
                    }
                }),
            );
        }

        schedule(&sim, count.clone());
        sim.advance(Duration::from_millis(100));
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_timer_cleanup_revokes() {
        let sim = SimEnv::new();
        let (fired, callback) = flag();
        let cancel = sim.set_timeout(Duration::from_millis(10), callback);
        cancel();
        sim.advance(Duration::from_millis(50));
        assert!(!fired.get());
    }

    #[test]
    fn test_frames_run_once() {
        let sim = SimEnv::new();
        let (fired, callback) = flag();
        sim.request_frame(callback);
        sim.run_frame();
        assert!(fired.get());
        sim.run_frame(); // queue is empty now
    }

    #[test]
    fn test_observer_fires_on_scroll() {
        let sim = SimEnv::new();
        let _hero = sim.insert_region(5000.0);
        let below = sim.insert_region(1.0);

        let (fired, callback) = flag();
        let cleanup = sim
            .observe_proximity(below, Margin::px_value(900.0), callback)
            .unwrap();
        assert!(!fired.get());
        assert_eq!(sim.pending_observer_count(), 1);

        // viewport [3000, 3800] + 900 margin reaches 4700 < 5000: not yet
        sim.scroll_to(3000.0);
        assert!(!fired.get());

        // viewport [3400, 4200] + 900 margin reaches 5100 > 5000: fires
        sim.scroll_to(3400.0);
        assert!(fired.get());
        assert_eq!(sim.pending_observer_count(), 0);

        cleanup(); // disconnecting after the fire is a no-op
    }

    #[test]
    fn test_observer_fires_immediately_when_proximate() {
        let sim = SimEnv::new();
        let near = sim.insert_region(100.0);
        let (fired, callback) = flag();
        sim.observe_proximity(near, Margin::DEFAULT, callback).unwrap();
        assert!(fired.get());
        assert_eq!(sim.pending_observer_count(), 0);
    }

    #[test]
    fn test_observer_disconnect() {
        let sim = SimEnv::new();
        let _hero = sim.insert_region(5000.0);
        let below = sim.insert_region(1.0);
        let (fired, callback) = flag();
        let cleanup = sim
            .observe_proximity(below, Margin::px_value(100.0), callback)
            .unwrap();
        cleanup();
        sim.scroll_to(4500.0);
        assert!(!fired.get());
    }

    #[test]
    fn test_observation_unavailable() {
        let sim = SimEnv::new();
        let region = sim.insert_region(100.0);
        sim.set_observation_unavailable(true);
        assert!(!sim.caps().contains(EnvCaps::PROXIMITY));

        let result = sim.observe_proximity(region, Margin::DEFAULT, Box::new(|| {}));
        assert!(matches!(result, Err(EnvError::ObservationUnavailable(_))));
    }

    #[test]
    fn test_scroll_into_view_logs_and_clamps() {
        let sim = SimEnv::new();
        let hero = sim.insert_region(2000.0);
        let about = sim.insert_region(600.0);
        sim.set_region_id(hero, Some("home"));
        sim.set_region_id(about, Some("about"));

        sim.scroll_into_view(about);
        // document 2600, viewport 800: max scroll 1800 < about's y 2000
        assert_eq!(sim.scroll_top(), 1800.0);
        assert_eq!(sim.scroll_commands(), vec!["about".to_string()]);
        assert_eq!(sim.scroll_commands_for("about"), 1);
        assert_eq!(sim.scroll_commands_for("home"), 0);
    }

    #[test]
    fn test_fragment_normalization_and_notify() {
        let sim = SimEnv::new();
        let count = Rc::new(Cell::new(0u32));
        let seen = count.clone();
        let unsub = sim.on_fragment_change(Rc::new(move || seen.set(seen.get() + 1)));

        sim.set_fragment(Some("#about"));
        assert_eq!(sim.fragment().as_deref(), Some("about"));
        assert_eq!(count.get(), 1);

        sim.set_fragment(Some(""));
        assert_eq!(sim.fragment(), None);
        assert_eq!(count.get(), 2);

        unsub();
        sim.set_fragment(Some("skills"));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_pointer_subscription() {
        let sim = SimEnv::new();
        let last: Rc<Cell<Point>> = Rc::new(Cell::new(Point::default()));
        let seen = last.clone();
        let unsub = sim.on_pointer_move(Rc::new(move |p| seen.set(p)));

        sim.move_pointer(Point::new(12.0, 34.0));
        assert_eq!(last.get(), Point::new(12.0, 34.0));

        unsub();
        sim.move_pointer(Point::new(1.0, 1.0));
        assert_eq!(last.get(), Point::new(12.0, 34.0));
    }

    #[test]
    fn test_scroll_metrics() {
        let sim = SimEnv::new();
        sim.insert_region(1600.0);
        sim.scroll_to(400.0);
        let metrics = sim.scroll_metrics();
        assert_eq!(metrics.scroll_top, 400.0);
        assert_eq!(metrics.scroll_height, 1600.0);
        assert_eq!(metrics.viewport_height, DEFAULT_VIEWPORT_HEIGHT);
        assert_eq!(metrics.progress(), 0.5);
    }
}
