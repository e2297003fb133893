//! Edge geometry: where the dock sits for a given screen edge.
//!
//! All coordinates are screen coordinates in pixels.  A [`Rect`] uses the
//! same convention as the shell protocol: `right` and `bottom` are exclusive,
//! so `width = right - left`.
//!
//! # The bottom-edge allowance
//!
//! The system taskbar usually lives at the bottom of the screen and does not
//! take part in the reservation protocol the way the dock does.  A dock placed
//! at the bottom therefore sits *above* the taskbar, offset by a fixed
//! allowance that depends on the OS generation (the taskbar grew taller in
//! Windows 11).

use std::fmt;

/// First Windows build number that ships the taller Windows 11 taskbar.
pub const WINDOWS_11_FIRST_BUILD: u32 = 22000;

/// Taskbar height on Windows 11 and later, in pixels.
pub const TASKBAR_ALLOWANCE_MODERN: i32 = 48;

/// Taskbar height on Windows 10 and earlier, in pixels.
pub const TASKBAR_ALLOWANCE_LEGACY: i32 = 40;

/// The four screen edges a dock can be reserved against.
///
/// The numeric codes match the shell protocol (`ABE_LEFT` = 0 … `ABE_BOTTOM`
/// = 3) and the `DockEdge` field of the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Edge {
    Left,
    #[default]
    Top,
    Right,
    Bottom,
}

impl Edge {
    /// All edges in protocol-code order.
    pub const ALL: [Edge; 4] = [Edge::Left, Edge::Top, Edge::Right, Edge::Bottom];

    /// Returns the protocol / file code for this edge.
    pub const fn code(self) -> u32 {
        match self {
            Edge::Left => 0,
            Edge::Top => 1,
            Edge::Right => 2,
            Edge::Bottom => 3,
        }
    }

    /// Maps a protocol / file code back to an edge.
    ///
    /// Returns `None` for anything outside `0..=3`.
    pub fn from_code(code: i64) -> Option<Edge> {
        match code {
            0 => Some(Edge::Left),
            1 => Some(Edge::Top),
            2 => Some(Edge::Right),
            3 => Some(Edge::Bottom),
            _ => None,
        }
    }

    /// `true` for Left and Right, where the dock is a vertical strip.
    pub const fn is_vertical(self) -> bool {
        matches!(self, Edge::Left | Edge::Right)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Edge::Left => "left",
            Edge::Top => "top",
            Edge::Right => "right",
            Edge::Bottom => "bottom",
        };
        f.write_str(name)
    }
}

/// A rectangle in screen coordinates (`right`/`bottom` exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// A rectangle anchored at the origin with the given size.
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub const fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    pub const fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    /// `true` when either dimension is zero or negative.
    pub const fn is_degenerate(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Grows `right`/`bottom` so the rectangle is at least `min_width` ×
    /// `min_height`.  The top-left corner never moves.
    pub fn ensure_min_size(self, min_width: i32, min_height: i32) -> Self {
        Self {
            right: self.right.max(self.left.saturating_add(min_width)),
            bottom: self.bottom.max(self.top.saturating_add(min_height)),
            ..self
        }
    }

    /// Re-establishes `thickness` along the axis perpendicular to `edge`,
    /// keeping the side that touches the screen edge fixed.
    ///
    /// The shell's position query may move a requested rectangle to avoid
    /// other reserved regions; the side facing the edge is authoritative and
    /// the opposite side is recomputed from it.
    pub fn with_thickness(self, edge: Edge, thickness: i32) -> Self {
        match edge {
            Edge::Left => Self {
                right: self.left.saturating_add(thickness),
                ..self
            },
            Edge::Right => Self {
                left: self.right.saturating_sub(thickness),
                ..self
            },
            Edge::Top => Self {
                bottom: self.top.saturating_add(thickness),
                ..self
            },
            Edge::Bottom => Self {
                top: self.bottom.saturating_sub(thickness),
                ..self
            },
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {})–({}, {}) [{}×{}]",
            self.left,
            self.top,
            self.right,
            self.bottom,
            self.width(),
            self.height()
        )
    }
}

/// Content-driven size of the dock, supplied by the icon layout before every
/// geometry computation.
///
/// `thickness` is the size along the minor axis (height for Top/Bottom, width
/// for Left/Right); `length` is the size along the major axis needed to show
/// every visible item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutExtent {
    pub thickness: i32,
    pub length: i32,
}

/// Returns the bottom-edge taskbar allowance for a Windows build number.
pub fn taskbar_allowance(os_build: u32) -> i32 {
    if os_build >= WINDOWS_11_FIRST_BUILD {
        TASKBAR_ALLOWANCE_MODERN
    } else {
        TASKBAR_ALLOWANCE_LEGACY
    }
}

/// Computes the rectangle to request from the shell for `edge`.
///
/// The strip spans the full screen dimension parallel to the edge and is
/// `thickness` pixels deep.  At the bottom edge the strip is lifted by
/// `bottom_allowance` so it does not overlap the system taskbar.
///
/// A zero-sized screen (no display attached) is treated as 1×1 and a
/// non-positive thickness as 1 so the result is never degenerate.
pub fn dock_rect(edge: Edge, thickness: i32, screen: Rect, bottom_allowance: i32) -> Rect {
    let screen = screen.ensure_min_size(1, 1);
    let thickness = thickness.max(1);

    match edge {
        Edge::Left => Rect::new(
            screen.left,
            screen.top,
            screen.left.saturating_add(thickness),
            screen.bottom,
        ),
        Edge::Right => Rect::new(
            screen.right.saturating_sub(thickness),
            screen.top,
            screen.right,
            screen.bottom,
        ),
        Edge::Top => Rect::new(
            screen.left,
            screen.top,
            screen.right,
            screen.top.saturating_add(thickness),
        ),
        Edge::Bottom => {
            let bottom = screen.bottom.saturating_sub(bottom_allowance);
            Rect::new(screen.left, bottom.saturating_sub(thickness), screen.right, bottom)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
