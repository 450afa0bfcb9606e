//! Page Observers - auxiliary reactive state.
//!
//! Pure, synchronous observers that mirror host state into signals:
//!
//! - **Progress** - scroll-position ratio driving a visual progress bar
//! - **Pointer** - cursor coordinates driving a floating glow element
//!
//! Neither has retry or state-machine structure; they subscribe, mirror,
//! and unsubscribe on teardown.

mod pointer;
mod progress;

pub use pointer::{track_pointer, PointerHandle};
pub use progress::{track_progress, ProgressHandle};
