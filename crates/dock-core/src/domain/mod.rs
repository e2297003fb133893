//! Domain entities for the edge dock.
//!
//! Everything in here is plain data and arithmetic.  Code in the outer layers
//! (shell adapters, file storage, the event loop) depends on these types, but
//! nothing in this module depends on them.

/// Persisted dock configuration and launch items.
pub mod config;

/// Screen edges, rectangles and the per-edge reservation rectangle.
pub mod geometry;

/// Content-driven size of the icon strip.
pub mod layout;
