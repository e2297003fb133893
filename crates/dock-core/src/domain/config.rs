//! The persisted dock configuration.
//!
//! [`DockConfiguration`] is the in-memory form of the JSON file the user can
//! edit by hand (see [`crate::protocol::document`] for the on-disk shape).
//! The item list is ordered: its order is the order icons appear in the dock.

use super::geometry::Edge;

/// Minimum usable dock thickness in pixels.
///
/// Heights below this are raised when loaded and never written back.
pub const DOCK_HEIGHT_FLOOR: i32 = 24;

/// Largest dock thickness in pixels.
///
/// Hand-edited files can hold any integer; heights above this are lowered
/// the same way low heights are raised.
pub const DOCK_HEIGHT_CEILING: i32 = 512;

/// Thickness used for a fresh configuration.
pub const DEFAULT_DOCK_HEIGHT: i32 = 26;

/// Background color used for a fresh configuration and as the fallback for
/// unparseable color strings.
pub const DEFAULT_DOCK_COLOR: &str = "#40546A";

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// The default dock background (`#40546A`).
    pub const DEFAULT: Rgb = Rgb {
        r: 64,
        g: 84,
        b: 106,
    };

    /// Parses `#RRGGBB` (the leading `#` is required, hex digits are
    /// case-insensitive).
    pub fn parse_hex(text: &str) -> Option<Rgb> {
        let hex = text.trim().strip_prefix('#')?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Formats the color as upper-case `#RRGGBB`.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// One launcher icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchItem {
    /// Display label (tooltip text).
    pub name: String,
    /// Executable location.  Not validated: a missing target just renders
    /// as a text button.
    pub target_path: String,
    /// Hidden items stay in the list but take no space in the strip.
    pub visible: bool,
}

impl LaunchItem {
    pub fn new(name: impl Into<String>, target_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_path: target_path.into(),
            visible: true,
        }
    }
}

/// Everything the dock persists between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockConfiguration {
    /// Thickness along the minor axis, in pixels.
    pub height: i32,
    /// Background color as written in the file (`#RRGGBB`).  Kept verbatim
    /// so a hand-edited value survives a save; use [`Self::color`] to
    /// resolve it.
    pub background_color: String,
    /// Mirrors the OS autostart entry.
    pub run_at_startup: bool,
    /// The edge the dock is reserved against.
    pub edge: Edge,
    /// Launch items in display order.
    pub items: Vec<LaunchItem>,
}

impl Default for DockConfiguration {
    fn default() -> Self {
        Self {
            height: DEFAULT_DOCK_HEIGHT,
            background_color: DEFAULT_DOCK_COLOR.to_string(),
            run_at_startup: false,
            edge: Edge::Top,
            items: default_items(),
        }
    }
}

impl DockConfiguration {
    /// Resolves the background color, falling back to [`Rgb::DEFAULT`] when
    /// the stored string is not a valid `#RRGGBB` value.
    pub fn color(&self) -> Rgb {
        Rgb::parse_hex(&self.background_color).unwrap_or(Rgb::DEFAULT)
    }

    /// Height brought into `DOCK_HEIGHT_FLOOR..=DOCK_HEIGHT_CEILING`.
    pub fn effective_height(&self) -> i32 {
        self.height.clamp(DOCK_HEIGHT_FLOOR, DOCK_HEIGHT_CEILING)
    }

    /// Applies [`effective_height`](Self::effective_height) in place.
    ///
    /// Returns `true` if the height was changed.
    pub fn normalize_height(&mut self) -> bool {
        let height = self.effective_height();
        let changed = height != self.height;
        self.height = height;
        changed
    }

    /// Items that take part in layout, in display order.
    pub fn visible_items(&self) -> impl Iterator<Item = &LaunchItem> {
        self.items.iter().filter(|item| item.visible)
    }
}

/// The two launch items a first run starts with.
pub fn default_items() -> Vec<LaunchItem> {
    vec![
        LaunchItem::new("Notepad", "notepad.exe"),
        LaunchItem::new("WordPad (Write)", "write.exe"),
    ]
}

// ── Tests ─────────────────────────────────────────────────────────────────────
