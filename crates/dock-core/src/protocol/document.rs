//! JSON codec for the configuration file.
//!
//! # Current format
//!
//! ```json
//! {
//!   "DockHeight": 26,
//!   "DockColor": "#40546A",
//!   "RunAtStartup": false,
//!   "DockEdge": 1,
//!   "Applications": [
//!     { "Name": "Notepad", "Path": "notepad.exe", "IsVisible": true }
//!   ]
//! }
//! ```
//!
//! # Legacy format
//!
//! Early versions stored only the item list as a bare array.  It is still
//! accepted; every legacy item is treated as visible and the rest of the
//! configuration takes its defaults.  The caller is expected to rewrite the
//! file in the current format (see [`DocumentShape::Legacy`]).
//!
//! Missing fields take their defaults, so hand-written files can be sparse.
//! A missing `Applications` list means "no items", not "the default items".

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::domain::config::{
    DockConfiguration, LaunchItem, DEFAULT_DOCK_COLOR, DEFAULT_DOCK_HEIGHT,
};
use crate::domain::geometry::Edge;

/// Error type for the configuration document codec.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The text is not valid JSON, or a field has the wrong type.
    #[error("malformed configuration JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Valid JSON, but neither an object nor an array at the top level.
    #[error("configuration must be a JSON object or array, found {0}")]
    UnexpectedShape(&'static str),

    /// The file is not UTF-8 text.
    #[error("configuration is not UTF-8 text: {0}")]
    NotText(#[from] std::str::Utf8Error),
}

/// Which top-level shape a parsed document had.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    /// The current object envelope.
    Envelope,
    /// A bare array of items; should be rewritten as an envelope.
    Legacy,
}

/// A parsed configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub config: DockConfiguration,
    pub shape: DocumentShape,
}

// ── Serde schema types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    path: String,
    #[serde(default = "default_true")]
    is_visible: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConfigRecord {
    #[serde(default = "default_height")]
    dock_height: i64,
    #[serde(default = "default_color")]
    dock_color: String,
    #[serde(default)]
    run_at_startup: bool,
    #[serde(default = "default_edge_code")]
    dock_edge: i64,
    #[serde(default)]
    applications: Vec<ItemRecord>,
}

fn default_true() -> bool {
    true
}
fn default_height() -> i64 {
    DEFAULT_DOCK_HEIGHT as i64
}
fn default_color() -> String {
    DEFAULT_DOCK_COLOR.to_string()
}
fn default_edge_code() -> i64 {
    Edge::default().code() as i64
}

impl From<&LaunchItem> for ItemRecord {
    fn from(item: &LaunchItem) -> Self {
        Self {
            name: item.name.clone(),
            path: item.target_path.clone(),
            is_visible: item.visible,
        }
    }
}

impl From<ItemRecord> for LaunchItem {
    fn from(record: ItemRecord) -> Self {
        Self {
            name: record.name,
            target_path: record.path,
            visible: record.is_visible,
        }
    }
}

impl From<ConfigRecord> for DockConfiguration {
    fn from(record: ConfigRecord) -> Self {
        let edge = Edge::from_code(record.dock_edge).unwrap_or_else(|| {
            warn!(
                "DockEdge {} is not a valid edge; using {}",
                record.dock_edge,
                Edge::default()
            );
            Edge::default()
        });
        Self {
            height: record.dock_height.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            background_color: record.dock_color,
            run_at_startup: record.run_at_startup,
            edge,
            items: record.applications.into_iter().map(LaunchItem::from).collect(),
        }
    }
}

// ── Codec ─────────────────────────────────────────────────────────────────────

/// Parses a configuration file's raw bytes.
///
/// A leading UTF-8 byte-order mark is skipped, as Notepad writes one.
///
/// # Errors
///
/// Returns [`DocumentError::NotText`] for bytes that are not UTF-8, and
/// otherwise the same errors as [`parse_document`].
pub fn parse_document_bytes(bytes: &[u8]) -> Result<ParsedDocument, DocumentError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    parse_document(std::str::from_utf8(bytes)?)
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parses a configuration file's text.
///
/// The height is returned exactly as written; applying the floor is the
/// caller's decision.
///
/// # Errors
///
/// Returns [`DocumentError::Malformed`] for invalid JSON or wrongly typed
/// fields, and [`DocumentError::UnexpectedShape`] for a top-level value that
/// is neither an object nor an array.
pub fn parse_document(text: &str) -> Result<ParsedDocument, DocumentError> {
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Object(_) => {
            let record: ConfigRecord = serde_json::from_value(value)?;
            Ok(ParsedDocument {
                config: record.into(),
                shape: DocumentShape::Envelope,
            })
        }
        Value::Array(_) => {
            let records: Vec<ItemRecord> = serde_json::from_value(value)?;
            let items = records
                .into_iter()
                .map(|record| LaunchItem {
                    visible: true,
                    ..LaunchItem::from(record)
                })
                .collect();
            Ok(ParsedDocument {
                config: DockConfiguration {
                    items,
                    ..DockConfiguration::default()
                },
                shape: DocumentShape::Legacy,
            })
        }
        Value::Null => Err(DocumentError::UnexpectedShape("null")),
        Value::Bool(_) => Err(DocumentError::UnexpectedShape("a boolean")),
        Value::Number(_) => Err(DocumentError::UnexpectedShape("a number")),
        Value::String(_) => Err(DocumentError::UnexpectedShape("a string")),
    }
}

/// Renders `config` in the current (envelope) format, pretty-printed.
///
/// The height floor is applied on the way out so a below-floor height is
/// never written.
///
/// # Errors
///
/// Returns [`DocumentError::Malformed`] if serialization fails, which only
/// happens for non-string map keys and so is not expected in practice.
pub fn render_document(config: &DockConfiguration) -> Result<String, DocumentError> {
    let record = ConfigRecord {
        dock_height: config.effective_height() as i64,
        dock_color: config.background_color.clone(),
        run_at_startup: config.run_at_startup,
        dock_edge: config.edge.code() as i64,
        applications: config.items.iter().map(ItemRecord::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&record)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
