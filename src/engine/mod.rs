//! Page Engine - Part registry.
//!
//! The engine tracks the page's live parts (section wrappers and mounted
//! contents) as indices into a registry rather than as objects:
//!
//! ```text
//! Index 0: wrapper  "about-wrapper"   (placeholder in the flow)
//! Index 1: content  "about"           (mounted section content)
//! ```
//!
//! Allocation is reactive: deriveds that count parts re-run when parts
//! mount or unmount.

mod registry;

pub use registry::*;
