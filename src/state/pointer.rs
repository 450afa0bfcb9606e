//! Pointer position mirror.
//!
//! Backs the floating cursor-glow element: the host reports pointer
//! movement, the mirror keeps the latest coordinates in a signal, and the
//! presentation layer positions the glow from it. Rendering the glow is
//! not this crate's concern.

use std::rc::Rc;

use spark_signals::{signal, Signal};

use crate::env::{EnvCaps, Environment};
use crate::types::{Cleanup, Point};

/// Handle to a live pointer mirror.
pub struct PointerHandle {
    position: Signal<Point>,
    unsub: Option<Cleanup>,
}

impl PointerHandle {
    /// Latest pointer position.
    pub fn get(&self) -> Point {
        self.position.get()
    }

    /// The position signal, for reactive composition.
    pub fn signal(&self) -> Signal<Point> {
        self.position.clone()
    }

    /// Stop mirroring.
    pub fn unmount(mut self) {
        if let Some(unsub) = self.unsub.take() {
            unsub();
        }
    }
}

impl Drop for PointerHandle {
    fn drop(&mut self) {
        if let Some(unsub) = self.unsub.take() {
            unsub();
        }
    }
}

/// Start mirroring pointer movement.
///
/// On hosts without pointer events the mirror stays parked at the origin
/// and no subscription is made.
pub fn track_pointer(env: &Rc<dyn Environment>) -> PointerHandle {
    let position = signal(Point::default());

    if !env.caps().contains(EnvCaps::POINTER_EVENTS) {
        return PointerHandle {
            position,
            unsub: None,
        };
    }

    let unsub = {
        let position = position.clone();
        env.on_pointer_move(Rc::new(move |point| {
            position.set(point);
        }))
    };

    PointerHandle {
        position,
        unsub: Some(unsub),
    }
}
