//! Configuration file watching.
//!
//! [`ReloadWatcher`] watches the directory that holds the configuration file
//! rather than the file itself: editors and our own atomic save replace the
//! file by renaming over it, and a watch on the old inode would go quiet
//! after the first save.  Events for other files in the directory are
//! filtered out by exact file name.
//!
//! Raw notifications only *schedule* a reload through the [`Debouncer`]; the
//! debouncer's action is responsible for getting the reload onto the thread
//! that owns the dock state.

pub mod debounce;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use debounce::{Debouncer, RELOAD_DEBOUNCE};

/// Error type for setting up the file watcher.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The platform watcher could not be created or attached.
    #[error("could not watch configuration directory: {0}")]
    Setup(#[from] notify::Error),

    /// The configuration path has no file name to match events against.
    #[error("configuration path {0} does not name a file")]
    NoFileName(PathBuf),
}

/// Watches one configuration file and debounces changes to it.
///
/// Dropping the watcher stops notifications and cancels a pending reload.
pub struct ReloadWatcher {
    _watcher: RecommendedWatcher,
    debouncer: Arc<Debouncer>,
    path: PathBuf,
}

impl ReloadWatcher {
    /// Starts watching `config_path`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::NoFileName`] for a path like `/` or `..`, and
    /// [`WatchError::Setup`] if the directory cannot be watched (for example
    /// because it does not exist).
    pub fn start(config_path: &Path, debouncer: Arc<Debouncer>) -> Result<Self, WatchError> {
        let file_name = config_path
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| WatchError::NoFileName(config_path.to_path_buf()))?;
        let dir = match config_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let trigger = Arc::clone(&debouncer);
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_change_to(&event, &file_name) => {
                    debug!("configuration changed ({:?})", event.kind);
                    trigger.schedule();
                }
                Ok(_) => {}
                Err(e) => warn!("file watcher error: {e}"),
            },
            Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        info!(
            "watching {} for changes (debounce {:?})",
            config_path.display(),
            debouncer.delay()
        );
        Ok(Self {
            _watcher: watcher,
            debouncer,
            path: config_path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ReloadWatcher {
    fn drop(&mut self) {
        self.debouncer.cancel();
        debug!("stopped watching {}", self.path.display());
    }
}

/// `true` for create/modify events that touch a file called `file_name`.
fn is_change_to(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(file_name.as_os_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_modify_of_the_config_file_is_a_change() {
        let name = OsString::from("dock_apps.json");
        let ev = event(EventKind::Modify(ModifyKind::Any), "/tmp/dock/dock_apps.json");
        assert!(is_change_to(&ev, &name));
    }

    #[test]
    fn test_create_of_the_config_file_is_a_change() {
        let name = OsString::from("dock_apps.json");
        let ev = event(EventKind::Create(CreateKind::File), "/tmp/dock/dock_apps.json");
        assert!(is_change_to(&ev, &name));
    }

    #[test]
    fn test_other_files_in_the_directory_are_ignored() {
        let name = OsString::from("dock_apps.json");
        let ev = event(EventKind::Modify(ModifyKind::Any), "/tmp/dock/dock_apps.json.bak");
        assert!(!is_change_to(&ev, &name));
    }

    #[test]
    fn test_removal_is_not_a_change() {
        let name = OsString::from("dock_apps.json");
        let ev = event(EventKind::Remove(RemoveKind::File), "/tmp/dock/dock_apps.json");
        assert!(!is_change_to(&ev, &name));
    }

    #[test]
    fn test_path_without_file_name_is_rejected() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let debouncer = Arc::new(Debouncer::new(
            runtime.handle().clone(),
            RELOAD_DEBOUNCE,
            || {},
        ));

        let result = ReloadWatcher::start(Path::new("/"), debouncer);

        assert!(matches!(result, Err(WatchError::NoFileName(_))));
    }

    #[test]
    fn test_writing_the_file_schedules_one_reload() {
        // Arrange
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_time()
            .build()
            .unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dock_apps.json");
        let (tx, rx) = mpsc::channel();
        let debouncer = Arc::new(Debouncer::new(
            runtime.handle().clone(),
            Duration::from_millis(100),
            move || {
                let _ = tx.send(());
            },
        ));
        let _watcher = ReloadWatcher::start(&path, debouncer).expect("watch");

        // Act: several writes in a burst.
        for i in 0..3 {
            std::fs::write(&path, format!("{{\"DockHeight\": {}}}", 30 + i)).unwrap();
        }

        // Assert
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok(), "no reload");
        assert!(
            rx.recv_timeout(Duration::from_millis(400)).is_err(),
            "burst should coalesce into one reload"
        );
    }
}
