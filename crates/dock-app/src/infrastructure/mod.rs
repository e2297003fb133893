//! Infrastructure layer for the dock.
//!
//! Contains OS-facing adapters: the desktop-toolbar shell host, the
//! configuration file store, the file watcher, and a log-only view.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `dock_core`, but MUST NOT be imported by `dock_core`.
//!
//! # Sub-modules
//!
//! - **`shell`** – `ShellHost` implementations.  The Win32 host is selected
//!   at compile time with `#[cfg(target_os = "windows")]`; a `MockShellHost`
//!   is always compiled for tests and headless runs.
//!
//! - **`storage`** – `ConfigStore`, the JSON configuration file with locked
//!   reads, legacy upgrade and atomic writes.
//!
//! - **`watcher`** – `ReloadWatcher` and the debouncer that turns bursts of
//!   file notifications into a single reload.
//!
//! - **`view`** – `TracingDockView`, a `DockView` that computes the strip
//!   layout and reports UI callbacks to the log.

pub mod shell;
pub mod storage;
pub mod view;
pub mod watcher;
