//! A [`DockView`] that lays the strip out with [`StripLayout`] and reports
//! everything else to the log.
//!
//! Used by headless runs and integration tests.  It also keeps the notices
//! it was asked to show so callers can inspect them.

use dock_core::{DockConfiguration, Edge, LayoutExtent, StripLayout};
use tracing::{info, warn};

use crate::application::dock_session::DockView;

#[derive(Debug, Default)]
pub struct TracingDockView {
    notices: Vec<String>,
    reloads: usize,
    last_edge: Option<Edge>,
}

impl TracingDockView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices shown so far, oldest first.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// How many times a configuration was applied.
    pub fn reloads(&self) -> usize {
        self.reloads
    }

    /// The edge reported by the last `on_edge_changed`, if any.
    pub fn last_edge(&self) -> Option<Edge> {
        self.last_edge
    }
}

impl DockView for TracingDockView {
    fn visible_layout_extent(&self, config: &DockConfiguration, _edge: Edge) -> LayoutExtent {
        StripLayout::extent(config)
    }

    fn on_configuration_reloaded(&mut self, config: &DockConfiguration) {
        self.reloads += 1;
        let names: Vec<&str> = config.visible_items().map(|i| i.name.as_str()).collect();
        info!(
            "showing {} item(s) on {} edge, color {}: {names:?}",
            names.len(),
            config.edge,
            config.color().to_hex()
        );
    }

    fn on_edge_changed(&mut self, edge: Edge) {
        self.last_edge = Some(edge);
        info!("items re-laid out for {edge} edge");
    }

    fn show_notice(&mut self, message: &str) {
        warn!("notice: {message}");
        self.notices.push(message.to_string());
    }
}
