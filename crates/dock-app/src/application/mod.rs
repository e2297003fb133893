//! Application layer use cases for the dock.
//!
//! # What use cases does the dock have?
//!
//! - **`reserve_edge`** – Owns the desktop-toolbar registration: claims a
//!   screen edge from the shell, negotiates the rectangle, and re-negotiates
//!   when the shell asks.  The OS calls go through a `ShellHost` injected at
//!   construction time.
//!
//! - **`persistence`** – The `ConfigRepository` contract and its error and
//!   result types.  The file-backed implementation lives in infrastructure.
//!
//! - **`dock_session`** – Ties the two together on the owner thread: startup,
//!   edge switching, live reload, saving, and shutdown.

pub mod dock_session;
pub mod persistence;
pub mod reserve_edge;
