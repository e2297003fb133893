//! Storage infrastructure: configuration file persistence.
//!
//! [`config::ConfigStore`] is the only writer of the configuration file.  It
//! implements the application-layer `ConfigRepository` contract so the
//! session can be tested against an in-memory repository.

pub mod config;

pub use config::{ConfigStore, RetryPolicy, CONFIG_FILE_NAME};
