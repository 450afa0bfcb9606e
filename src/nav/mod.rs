//! Navigation - fragment targets and scroll reconciliation.
//!
//! The navigator owns the page's current navigation target (derived from
//! the URL fragment), fans it out as force flags to the section mount
//! gates, and reconciles the scroll position with a bounded retry chain
//! once the target's element exists in the document.
//!
//! # Data Flow
//!
//! ```text
//! fragment change → TargetState signal → force flags → mount gates
//!                                      ↘ ScrollRetry (frame + timers) → scroll command
//! ```
//!
//! At most one retry chain is live per navigator; a new target cancels the
//! old chain before the new one's first tick.

mod coordinator;
mod retry;
mod target;

pub use coordinator::Navigator;
pub use retry::{Lookup, RetryPolicy, RetryState, ScrollRetry};
pub use target::TargetState;
