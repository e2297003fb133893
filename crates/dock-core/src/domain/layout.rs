//! Size of the icon strip, derived from the visible items.
//!
//! Icons are square buttons laid out in a single row (Top/Bottom) or column
//! (Left/Right):
//!
//! ```text
//!  ┌─────────────────────────────────────────────┐
//!  │ 4px │ icon │ 6px │ icon │ 6px │ icon │ 6px │ 4px │
//!  └─────────────────────────────────────────────┘
//! ```
//!
//! The button side is the dock height minus a 1 px border on each side, but
//! never smaller than 22 px.

use super::config::{DockConfiguration, DOCK_HEIGHT_CEILING, DOCK_HEIGHT_FLOOR};
use super::geometry::LayoutExtent;

/// Strip thickness used when the configured height is not above the floor.
pub const FALLBACK_THICKNESS: i32 = 40;

/// Smallest icon button side, in pixels.
pub const MIN_ITEM_SIZE: i32 = 22;

/// Gap after each icon, in pixels.
pub const ITEM_PADDING: i32 = 6;

/// Margin before the first icon and after the last gap, in pixels.
pub const STRIP_MARGIN: i32 = 4;

/// Default icon-strip layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StripLayout;

impl StripLayout {
    /// Thickness of the strip for `config`, never above the height ceiling.
    pub fn thickness(config: &DockConfiguration) -> i32 {
        if config.height > DOCK_HEIGHT_FLOOR {
            config.height.min(DOCK_HEIGHT_CEILING)
        } else {
            FALLBACK_THICKNESS
        }
    }

    /// Side of one square icon button.
    pub fn item_size(config: &DockConfiguration) -> i32 {
        (Self::thickness(config) - 2).max(MIN_ITEM_SIZE)
    }

    /// Thickness and length needed to show every visible item.
    pub fn extent(config: &DockConfiguration) -> LayoutExtent {
        let item = Self::item_size(config);
        let count = i32::try_from(config.visible_items().count()).unwrap_or(i32::MAX);
        let length = count
            .saturating_mul(item + ITEM_PADDING)
            .saturating_add(2 * STRIP_MARGIN);
        LayoutExtent {
            thickness: Self::thickness(config),
            length,
        }
    }
}
