//! dock-app library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the dock do?
//!
//! The dock is a thin always-on-top strip of launch buttons pinned to one
//! screen edge.  Unlike an ordinary top-most window it *reserves* that edge:
//! the shell shrinks the work area so maximised windows stop short of it.
//!
//! The application:
//!
//! 1. Loads `dock_apps.json` (creating it, upgrading it, or repairing it as
//!    needed).
//! 2. Registers the dock window as a desktop toolbar on the configured edge
//!    and negotiates its rectangle with the shell.
//! 3. Re-negotiates whenever the shell reports that toolbar positions changed
//!    (resolution change, taskbar moved, another toolbar appeared).
//! 4. Watches the configuration file and applies edits live, after a short
//!    quiet period.
//! 5. Releases the edge and saves its settings on exit.

/// Application layer: the reservation engine and the session coordinator.
pub mod application;

/// Infrastructure layer: shell hosts, file storage, file watching.
pub mod infrastructure;
