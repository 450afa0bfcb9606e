//! # viewgate
//!
//! Reactive viewport-gated section mounting and hash navigation for
//! single-page layouts.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! fine-grained reactivity.
//!
//! ## Architecture
//!
//! A page is a vertical flow of sections. Below-the-fold sections sit
//! behind mount gates that defer their content until the placeholder nears
//! the viewport, or until the URL fragment makes them the navigation
//! target; the navigator then reconciles the scroll position with a
//! bounded retry chain.
//!
//! ```text
//! fragment change → TargetState → force flags → mount gates → document
//!                              ↘ ScrollRetry (frame + timers) → scroll command
//! proximity notifications ─────────────────────↗
//! ```
//!
//! The hosting environment is injected behind the [`env::Environment`]
//! port, so the whole runtime runs unmodified against the deterministic
//! [`env::SimEnv`] in tests and demos.
//!
//! ## Modules
//!
//! - [`types`] - Core types (Rect, Margin, ScrollMetrics, SectionId, etc.)
//! - [`env`] - Environment port and the simulated host
//! - [`engine`] - Part registry (wrappers and mounted contents)
//! - [`gate`] - Deferred mount gate (force OR proximity, one-way latch)
//! - [`nav`] - Navigation target, retry state machine, coordinator
//! - [`state`] - Scroll-progress and pointer mirrors
//! - [`page`] - The assembled portfolio page
//! - [`config`] - TOML configuration (retry policy, margins)

pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod gate;
pub mod nav;
pub mod page;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{ConfigError, EnvError};

pub use env::{EnvCaps, Environment, RegionKey, SimEnv};

pub use engine::{
    allocate_index, get_allocated_count, get_allocated_indices, get_id, get_index, is_allocated,
    on_destroy, release_index, reset_registry,
};

pub use gate::{deferred, GateHandle, PLACEHOLDER_MIN_HEIGHT};

pub use nav::{Lookup, Navigator, RetryPolicy, RetryState, ScrollRetry, TargetState};

pub use state::{track_pointer, track_progress, PointerHandle, ProgressHandle};

pub use page::{mount_page, PageHandle, PageSections, SectionRender};

pub use config::{MarginPlan, PageConfig};
