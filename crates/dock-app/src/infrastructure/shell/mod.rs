//! Desktop-toolbar shell hosts.
//!
//! On Windows, [`windows::Win32ShellHost`] owns a hidden tool window and
//! forwards toolbar calls to `SHAppBarMessage`.  Everywhere else, and on
//! Windows with `--headless`, the dock runs against [`mock::MockShellHost`].

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

pub use mock::MockShellHost;
