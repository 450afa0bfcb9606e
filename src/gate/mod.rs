//! Mount Gate - Deferred section mounting.
//!
//! A gate wraps a section's content and decides whether to instantiate it
//! at all: immediately when forced (the section is the navigation target),
//! otherwise only once its placeholder nears the viewport. Mounting is a
//! one-way latch - content created by a gate is never torn down by
//! scrolling away or by the force flag dropping.

mod deferred;

pub use deferred::{deferred, GateHandle, PLACEHOLDER_MIN_HEIGHT};
