//! Edge dock entry point.
//!
//! Wires the configuration store, the shell host, the session and the file
//! watcher together, then runs the owner-thread event loop.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ background tokio runtime (1 worker)   -- debounce timers, Ctrl-C
//!  └─ DockSession::start()                  -- load config, reserve edge
//!  └─ ReloadWatcher::start()                -- file changes -> Debouncer
//!  └─ owner-thread loop
//!       ├─ Shell(message)   -> reposition / activate
//!       ├─ ReloadRequested  -> reload + re-layout
//!       └─ Shutdown         -> save + release edge
//! ```
//!
//! On Windows the owner thread is the window thread and events arrive as
//! window messages.  Headless runs (any other OS, or `--headless`) use a
//! channel and a mock shell with a 1920×1080 screen.

use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};

use anyhow::Context;
use clap::Parser;
use tokio::runtime::Runtime;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use dock_app::application::dock_session::{DockEvent, DockSession};
use dock_app::application::reserve_edge::EdgeReservation;
use dock_app::infrastructure::shell::MockShellHost;
use dock_app::infrastructure::storage::ConfigStore;
use dock_app::infrastructure::view::TracingDockView;
use dock_app::infrastructure::watcher::{Debouncer, ReloadWatcher, RELOAD_DEBOUNCE};
use dock_core::Edge;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Always-on-top launcher dock that reserves a screen edge.
#[derive(Debug, Parser)]
#[command(name = "dock-app", version, about)]
struct Cli {
    /// Path of the configuration file.
    ///
    /// Defaults to `dock_apps.json` next to the executable.
    #[arg(long, env = "DOCK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info", env = "DOCK_LOG_LEVEL")]
    log_level: String,

    /// Run against the mock shell even where a real one is available.
    #[arg(long)]
    headless: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    // Timers and signal handling only; all dock state stays on this thread.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("dock-timers")
        .enable_all()
        .build()
        .context("failed to start the background runtime")?;

    let path = cli.config.unwrap_or_else(ConfigStore::default_path);
    info!("edge dock starting (config {})", path.display());
    let store = ConfigStore::new(&path);

    #[cfg(target_os = "windows")]
    {
        if !cli.headless {
            return run_windows(&runtime, store, &path);
        }
    }
    if cli.headless {
        info!("headless mode requested");
    }

    run_headless(&runtime, store, &path)
}

/// Starts the file watcher.  A dock without live reload is still useful, so
/// failure is only logged.
fn start_watcher(path: &Path, debouncer: Arc<Debouncer>) -> Option<ReloadWatcher> {
    match ReloadWatcher::start(path, debouncer) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!("live reload disabled: {e}");
            None
        }
    }
}

fn run_headless(runtime: &Runtime, store: ConfigStore, path: &Path) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel::<DockEvent>();

    let reservation = EdgeReservation::new(MockShellHost::single_1080p(), Edge::default());
    let mut session = DockSession::new(store, reservation, TracingDockView::new());
    session.start();

    let reload_tx = tx.clone();
    let debouncer = Arc::new(Debouncer::new(
        runtime.handle().clone(),
        RELOAD_DEBOUNCE,
        move || {
            let _ = reload_tx.send(DockEvent::ReloadRequested);
        },
    ));
    let _watcher = start_watcher(path, debouncer);

    runtime.spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                let _ = tx.send(DockEvent::Shutdown);
            }
            Err(e) => error!("failed to listen for Ctrl-C: {e}"),
        }
    });

    info!("edge dock ready (headless).  Press Ctrl-C to exit.");
    for event in rx {
        if !session.dispatch(event) {
            break;
        }
    }

    info!("edge dock stopped");
    Ok(())
}

#[cfg(target_os = "windows")]
fn run_windows(runtime: &Runtime, store: ConfigStore, path: &Path) -> anyhow::Result<()> {
    use dock_app::infrastructure::shell::windows::{run_message_loop, Win32ShellHost};

    let host = Win32ShellHost::create().context("failed to create the dock window")?;
    let messenger = host.messenger();

    let reservation = EdgeReservation::new(host, Edge::default());
    let mut session = DockSession::new(store, reservation, TracingDockView::new());
    session.start();

    let debouncer = Arc::new(Debouncer::new(
        runtime.handle().clone(),
        RELOAD_DEBOUNCE,
        move || messenger.request_reload(),
    ));
    let _watcher = start_watcher(path, debouncer);

    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            messenger.request_close();
        }
    });

    info!("edge dock ready.  Close the dock or press Ctrl-C to exit.");
    run_message_loop(|event| session.dispatch(event));

    info!("edge dock stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["dock-app"]);
        assert_eq!(cli.config, None);
        assert_eq!(cli.log_level, "info");
        assert!(!cli.headless);
    }

    #[test]
    fn test_cli_accepts_config_path_and_headless_flag() {
        let cli = Cli::parse_from(["dock-app", "--config", "/tmp/dock.json", "--headless"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/dock.json")));
        assert!(cli.headless);
    }
}
