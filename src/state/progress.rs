//! Scroll progress tracking.
//!
//! Mirrors the document's scroll ratio into a signal on every scroll
//! notification. The ratio itself is [`ScrollMetrics::progress`]:
//! `scroll_top / (scroll_height - viewport_height)`, clamped to `[0, 1]`,
//! `0` when the document does not scroll.

use std::rc::Rc;

use spark_signals::{signal, Signal};

use crate::env::Environment;
use crate::types::Cleanup;

/// Handle to a live scroll-progress mirror.
pub struct ProgressHandle {
    progress: Signal<f32>,
    unsub: Option<Cleanup>,
}

impl ProgressHandle {
    /// Current progress ratio in `[0, 1]`.
    pub fn get(&self) -> f32 {
        self.progress.get()
    }

    /// The progress signal, for reactive composition (e.g. a bar whose
    /// width derives from it).
    pub fn signal(&self) -> Signal<f32> {
        self.progress.clone()
    }

    /// Stop mirroring.
    pub fn unmount(mut self) {
        if let Some(unsub) = self.unsub.take() {
            unsub();
        }
    }
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        if let Some(unsub) = self.unsub.take() {
            unsub();
        }
    }
}

/// Start mirroring scroll progress.
///
/// The signal is primed from the current metrics, then updated on every
/// scroll notification.
pub fn track_progress(env: &Rc<dyn Environment>) -> ProgressHandle {
    let progress = signal(env.scroll_metrics().progress());

    let unsub = {
        let reader = env.clone();
        let progress = progress.clone();
        env.on_scroll(Rc::new(move || {
            progress.set(reader.scroll_metrics().progress());
        }))
    };

    ProgressHandle {
        progress,
        unsub: Some(unsub),
    }
}
