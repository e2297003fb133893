//! Desktop-toolbar ("AppBar") protocol records.
//!
//! The shell keeps a list of registered toolbars and hands out screen space
//! to them.  Every request is a single call carrying one fixed-size record:
//!
//! | Field              | Meaning                                              |
//! |--------------------|------------------------------------------------------|
//! | registrant         | the window that owns the reservation                 |
//! | callback message   | window message id the shell uses for notifications   |
//! | edge               | the screen edge the reservation is for               |
//! | rect               | requested / approved rectangle in screen coordinates |
//!
//! The shell answers asynchronously by posting the callback message to the
//! registrant; the `wParam` of that message carries a notification code.

use crate::domain::geometry::{Edge, Rect};

/// Window message name registered once per process to obtain the callback id.
pub const CALLBACK_MESSAGE_NAME: &str = "APPBAR_CALLBACK_MESSAGE";

/// Notification code (`ABN_POSCHANGED`) telling a toolbar to recompute its
/// position.
pub const NOTIFY_POS_CHANGED: usize = 0x0000_0001;

/// `WM_ACTIVATE`: the registrant window was activated or deactivated.
pub const WM_ACTIVATE: u32 = 0x0006;

/// Operations the dock issues to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppBarOp {
    /// `ABM_NEW`: register a new toolbar.
    New,
    /// `ABM_REMOVE`: drop the registration.
    Remove,
    /// `ABM_QUERYPOS`: ask where a requested rectangle may go.
    QueryPos,
    /// `ABM_SETPOS`: commit a rectangle.
    SetPos,
    /// `ABM_ACTIVATE`: tell the shell the toolbar was activated.
    Activate,
    /// `ABM_WINDOWPOSCHANGED`: tell the shell the toolbar window moved.
    WindowPosChanged,
}

impl AppBarOp {
    /// The numeric `ABM_*` code.
    pub const fn code(self) -> u32 {
        match self {
            AppBarOp::New => 0x0000_0000,
            AppBarOp::Remove => 0x0000_0001,
            AppBarOp::QueryPos => 0x0000_0002,
            AppBarOp::SetPos => 0x0000_0003,
            AppBarOp::Activate => 0x0000_0006,
            AppBarOp::WindowPosChanged => 0x0000_0007,
        }
    }
}

/// Opaque identity of the registrant window (the raw `HWND` value on Windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowId(pub isize);

/// The record exchanged with the shell on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppBarData {
    pub window: WindowId,
    pub callback_message: u32,
    pub edge: Edge,
    pub rect: Rect,
}

impl AppBarData {
    /// A record that only identifies the registrant.
    pub fn for_window(window: WindowId) -> Self {
        Self {
            window,
            callback_message: 0,
            edge: Edge::default(),
            rect: Rect::default(),
        }
    }
}

/// Inbound window messages the reservation engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellMessage {
    /// The shell wants every toolbar to recompute its rectangle.
    PositionChanged,
    /// The dock window was activated; the shell must be told.
    Activate,
    /// A callback notification the dock does not act on.
    Ignored,
}

impl ShellMessage {
    /// Classifies a window message.
    ///
    /// Returns `None` for messages that are not part of the shell protocol
    /// at all (they should go to the default window procedure).
    pub fn classify(callback_message: u32, message: u32, wparam: usize) -> Option<ShellMessage> {
        if callback_message != 0 && message == callback_message {
            return Some(if wparam == NOTIFY_POS_CHANGED {
                ShellMessage::PositionChanged
            } else {
                ShellMessage::Ignored
            });
        }
        if message == WM_ACTIVATE {
            return Some(ShellMessage::Activate);
        }
        None
    }
}
