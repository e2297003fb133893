//! # dock-core
//!
//! Shared library for the edge dock containing the configuration model, the
//! per-edge reservation geometry, the JSON configuration document codec and
//! the desktop-toolbar ("AppBar") wire records.
//!
//! It has zero dependencies on OS APIs, UI frameworks, or the file system.
//!
//! # Architecture overview
//!
//! The dock is a thin always-on-top strip reserved against one screen edge.
//! Reserving the strip means negotiating with the OS shell so that maximised
//! windows stop short of it.  This crate defines the pieces of that
//! negotiation that are pure data and arithmetic:
//!
//! - **`domain`** – What the dock *is*: its edge, its thickness, its launch
//!   items, and where on screen it should sit for a given edge.
//!
//! - **`protocol`** – How the dock talks to the outside world: the JSON file
//!   the user can edit by hand, and the fixed-size records exchanged with the
//!   shell's desktop-toolbar protocol.

pub mod domain;
pub mod protocol;

pub use domain::config::{
    DockConfiguration, LaunchItem, Rgb, DOCK_HEIGHT_CEILING, DOCK_HEIGHT_FLOOR,
};
pub use domain::geometry::{dock_rect, taskbar_allowance, Edge, LayoutExtent, Rect};
pub use domain::layout::StripLayout;
pub use protocol::appbar::{AppBarData, AppBarOp, ShellMessage, WindowId};
pub use protocol::document::{
    parse_document, parse_document_bytes, render_document, DocumentError, DocumentShape,
    ParsedDocument,
};
