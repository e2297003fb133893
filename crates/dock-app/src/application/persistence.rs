//! Configuration persistence contract.
//!
//! The session only ever talks to a [`ConfigRepository`]; the file-backed
//! implementation lives in `infrastructure::storage`.

use std::io;
use std::path::PathBuf;

use dock_core::{DocumentError, DockConfiguration};
use thiserror::Error;

/// Error type for configuration persistence.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read, even after retrying.
    #[error("could not read {path} after {attempts} attempt(s): {source}")]
    ReadFailed {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    /// The file was read but its contents are not a configuration document.
    #[error("could not parse {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    /// The configuration could not be written.
    #[error("could not write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// How a loaded configuration came to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOrigin {
    /// Read from a current-format file.
    File,
    /// No file existed; defaults were returned and nothing was written.
    Missing,
    /// A legacy bare-array file was upgraded.  `persisted` is `false` if the
    /// upgraded file could not be written back.
    MigratedLegacy { persisted: bool },
    /// The file was unreadable as a configuration and defaults were used.
    /// `persisted` is `false` if the defaults could not be written back.
    Recovered { reason: String, persisted: bool },
}

impl LoadOrigin {
    /// `false` when the store tried to write a file back and failed.
    pub fn persisted(&self) -> bool {
        match self {
            LoadOrigin::MigratedLegacy { persisted } | LoadOrigin::Recovered { persisted, .. } => {
                *persisted
            }
            LoadOrigin::File | LoadOrigin::Missing => true,
        }
    }
}

/// A configuration plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub config: DockConfiguration,
    pub origin: LoadOrigin,
}

/// Loads and saves the dock configuration.
pub trait ConfigRepository {
    /// Loads the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadFailed`] when the file stays unreadable
    /// after every retry.  Parse failures are healed (defaults are returned
    /// with [`LoadOrigin::Recovered`]) rather than reported.
    fn load(&self) -> Result<LoadedConfig, ConfigError>;

    /// Saves the configuration in the current format.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::WriteFailed`] on any I/O failure.
    fn save(&self, config: &DockConfiguration) -> Result<(), ConfigError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_persisted_flag() {
        assert!(LoadOrigin::File.persisted());
        assert!(LoadOrigin::Missing.persisted());
        assert!(LoadOrigin::MigratedLegacy { persisted: true }.persisted());
        assert!(!LoadOrigin::Recovered {
            reason: "bad".into(),
            persisted: false
        }
        .persisted());
    }

    #[test]
    fn test_read_failed_message_names_attempts() {
        let err = ConfigError::ReadFailed {
            path: PathBuf::from("dock_apps.json"),
            attempts: 5,
            source: io::Error::new(io::ErrorKind::PermissionDenied, "locked"),
        };
        let text = err.to_string();
        assert!(text.contains("5 attempt"), "{text}");
        assert!(text.contains("dock_apps.json"), "{text}");
    }
}
