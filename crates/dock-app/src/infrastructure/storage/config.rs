//! JSON file persistence for the dock configuration.
//!
//! The file lives next to the executable as `dock_apps.json` unless the
//! `--config` flag points elsewhere.  It is meant to be hand-editable, which
//! is why the store is forgiving on the way in:
//!
//! - **Missing file** – defaults are returned; the caller decides whether to
//!   write them.
//! - **Locked file** – another program (often an editor saving) may hold the
//!   file.  Reads take a shared lock and are retried a bounded number of
//!   times before giving up.
//! - **Legacy file** – a bare array of items is upgraded and written back in
//!   the current format straight away.
//! - **Broken file** – defaults are used and written back, so the next start
//!   is clean.
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the target, so a concurrent reader sees either the old or the new
//! document and never a half-written one.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use dock_core::{parse_document_bytes, render_document, DockConfiguration, DocumentShape};
use fs2::FileExt;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::application::persistence::{ConfigError, ConfigRepository, LoadOrigin, LoadedConfig};

/// File name of the configuration document.
pub const CONFIG_FILE_NAME: &str = "dock_apps.json";

/// How hard to try before reporting a locked file as unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of read attempts (at least one is always made).
    pub attempts: u32,
    /// Pause between attempts.
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            pause: Duration::from_millis(100),
        }
    }
}

/// File-backed [`ConfigRepository`].
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    retry: RetryPolicy,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `dock_apps.json` in the executable's directory, or in the working
    /// directory if the executable path is unavailable.
    pub fn default_path() -> PathBuf {
        match std::env::current_exe() {
            Ok(exe) => exe
                .parent()
                .map(|dir| dir.join(CONFIG_FILE_NAME))
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME)),
            Err(e) => {
                warn!("could not resolve executable path ({e}); using working directory");
                PathBuf::from(CONFIG_FILE_NAME)
            }
        }
    }

    /// Reads the file, retrying while it is locked.
    ///
    /// `Ok(None)` means the file does not exist.  Only I/O and lock errors
    /// consume attempts; what the bytes mean is decided by the caller.
    fn read_with_retry(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match read_once(&self.path) {
                Ok(bytes) => return Ok(bytes),
                Err(source) if attempt >= attempts => {
                    return Err(ConfigError::ReadFailed {
                        path: self.path.clone(),
                        attempts: attempt,
                        source,
                    });
                }
                Err(e) => {
                    debug!(
                        "read attempt {attempt}/{attempts} of {} failed: {e}",
                        self.path.display()
                    );
                    thread::sleep(self.retry.pause);
                }
            }
        }
    }

    /// Writes `config` and reports whether it worked, for the load paths
    /// that rewrite the file as a side effect.
    fn rewrite(&self, config: &DockConfiguration) -> bool {
        match self.save(config) {
            Ok(()) => true,
            Err(e) => {
                warn!("{e}");
                false
            }
        }
    }
}

/// One read attempt under a shared lock.  The lock is released when the
/// file handle drops.
fn read_once(path: &Path) -> io::Result<Option<Vec<u8>>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    FileExt::try_lock_shared(&file)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}

impl ConfigRepository for ConfigStore {
    fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let Some(bytes) = self.read_with_retry()? else {
            info!("no configuration at {}; using defaults", self.path.display());
            return Ok(LoadedConfig {
                config: DockConfiguration::default(),
                origin: LoadOrigin::Missing,
            });
        };

        let parsed = match parse_document_bytes(&bytes) {
            Ok(parsed) => parsed,
            Err(source) => {
                let err = ConfigError::ParseFailed {
                    path: self.path.clone(),
                    source,
                };
                warn!("{err}; restoring defaults");
                let config = DockConfiguration::default();
                let persisted = self.rewrite(&config);
                return Ok(LoadedConfig {
                    config,
                    origin: LoadOrigin::Recovered {
                        reason: err.to_string(),
                        persisted,
                    },
                });
            }
        };

        let mut config = parsed.config;
        let origin = match parsed.shape {
            DocumentShape::Envelope => LoadOrigin::File,
            DocumentShape::Legacy => {
                info!(
                    "upgrading legacy item list in {} ({} item(s))",
                    self.path.display(),
                    config.items.len()
                );
                let persisted = self.rewrite(&config);
                LoadOrigin::MigratedLegacy { persisted }
            }
        };

        // In memory only; the file keeps what the user wrote until the next save.
        if config.normalize_height() {
            debug!("raised configured height to {}", config.height);
        }

        Ok(LoadedConfig { config, origin })
    }

    fn save(&self, config: &DockConfiguration) -> Result<(), ConfigError> {
        let write_failed = |source: io::Error| ConfigError::WriteFailed {
            path: self.path.clone(),
            source,
        };

        let text = render_document(config)
            .map_err(|e| write_failed(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(write_failed)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(write_failed)?;
        tmp.write_all(text.as_bytes()).map_err(write_failed)?;
        tmp.as_file().sync_all().map_err(write_failed)?;
        tmp.persist(&self.path).map_err(|e| write_failed(e.error))?;

        debug!("saved configuration to {}", self.path.display());
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use dock_core::{parse_document, Edge, LaunchItem, DOCK_HEIGHT_FLOOR};
    use std::time::Instant;
    use tempfile::TempDir;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            pause: Duration::from_millis(1),
        }
    }

    fn store_in(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join(CONFIG_FILE_NAME)).with_retry(fast_retry())
    }

    #[test]
    fn test_default_retry_policy_is_five_attempts_of_100ms() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 5);
        assert_eq!(policy.pause, Duration::from_millis(100));
    }

    #[test]
    fn test_missing_file_returns_defaults_without_writing() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        // Act
        let loaded = store.load().expect("load");

        // Assert
        assert_eq!(loaded.origin, LoadOrigin::Missing);
        assert_eq!(loaded.config, DockConfiguration::default());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_saved_configuration_loads_back() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let cfg = DockConfiguration {
            height: 32,
            edge: Edge::Right,
            items: vec![LaunchItem::new("Calc", "calc.exe")],
            ..DockConfiguration::default()
        };

        // Act
        store.save(&cfg).expect("save");
        let loaded = store.load().expect("load");

        // Assert
        assert_eq!(loaded.origin, LoadOrigin::File);
        assert_eq!(loaded.config, cfg);
    }

    #[test]
    fn test_save_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("a").join("b").join(CONFIG_FILE_NAME));

        store.save(&DockConfiguration::default()).expect("save");

        assert!(store.path().exists());
    }

    #[test]
    fn test_save_leaves_no_temporary_files_behind() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.save(&DockConfiguration::default()).unwrap();
        store.save(&DockConfiguration::default()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "only the configuration file should remain");
    }

    #[test]
    fn test_save_into_unwritable_location_is_write_failed() {
        // Arrange: the "directory" is a regular file.
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();
        let store = ConfigStore::new(blocker.join(CONFIG_FILE_NAME));

        // Act
        let result = store.save(&DockConfiguration::default());

        // Assert
        assert!(matches!(result, Err(ConfigError::WriteFailed { .. })));
    }

    #[test]
    fn test_below_floor_height_is_raised_in_memory_only() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let text = r#"{"DockHeight": 10, "DockEdge": 1, "Applications": []}"#;
        fs::write(store.path(), text).unwrap();

        // Act
        let loaded = store.load().expect("load");

        // Assert
        assert_eq!(loaded.config.height, DOCK_HEIGHT_FLOOR);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), text);
    }

    #[test]
    fn test_legacy_array_is_upgraded_and_rewritten() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            r#"[{"Name": "A", "Path": "a.exe", "IsVisible": false}]"#,
        )
        .unwrap();

        // Act
        let loaded = store.load().expect("load");

        // Assert
        assert_eq!(loaded.origin, LoadOrigin::MigratedLegacy { persisted: true });
        assert!(loaded.config.items[0].visible);
        let on_disk = parse_document(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk.shape, DocumentShape::Envelope);
        assert_eq!(on_disk.config.items, loaded.config.items);
    }

    #[test]
    fn test_malformed_file_is_replaced_with_defaults() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{ this is not json").unwrap();

        // Act
        let loaded = store.load().expect("parse failures self-heal");

        // Assert
        assert!(matches!(
            loaded.origin,
            LoadOrigin::Recovered { persisted: true, .. }
        ));
        assert_eq!(loaded.config, DockConfiguration::default());
        let on_disk = parse_document(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk.config, DockConfiguration::default());
    }

    #[test]
    fn test_binary_file_is_replaced_with_defaults_without_retrying() {
        // Arrange: bytes that are not UTF-8 at all.
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join(CONFIG_FILE_NAME)).with_retry(RetryPolicy {
            attempts: 5,
            pause: Duration::from_secs(1),
        });
        fs::write(store.path(), [0xFF, 0xFE, 0x7B, 0x80]).unwrap();

        // Act
        let started = Instant::now();
        let loaded = store.load().expect("undecodable files self-heal");

        // Assert
        assert!(started.elapsed() < Duration::from_secs(1), "decode errors must not retry");
        match &loaded.origin {
            LoadOrigin::Recovered { reason, persisted } => {
                assert!(*persisted);
                assert!(reason.contains("not UTF-8"), "{reason}");
            }
            other => panic!("expected Recovered, got {other:?}"),
        }
        assert_eq!(loaded.config, DockConfiguration::default());
        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.origin, LoadOrigin::File);
    }

    #[test]
    fn test_unreadable_path_fails_after_every_attempt() {
        // Arrange: a directory where the file should be cannot be read as text.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::create_dir(&path).unwrap();
        let store = ConfigStore::new(&path).with_retry(RetryPolicy {
            attempts: 2,
            pause: Duration::from_millis(1),
        });

        // Act
        let result = store.load();

        // Assert
        match result {
            Err(ConfigError::ReadFailed { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("expected ReadFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_locked_file_is_read_once_the_lock_is_released() {
        // Arrange: hold an exclusive lock for a little while on another thread.
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join(CONFIG_FILE_NAME)).with_retry(RetryPolicy {
            attempts: 20,
            pause: Duration::from_millis(25),
        });
        store.save(&DockConfiguration::default()).unwrap();
        let holder = File::open(store.path()).unwrap();
        FileExt::lock_exclusive(&holder).unwrap();
        let release = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            drop(holder);
        });

        // Act
        let started = Instant::now();
        let loaded = store.load();
        release.join().unwrap();

        // Assert
        assert!(loaded.is_ok(), "{loaded:?}");
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
