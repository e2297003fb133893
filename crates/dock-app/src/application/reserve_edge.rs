//! EdgeReservation: the desktop-toolbar registration state machine.
//!
//! # The handshake
//!
//! ```text
//!            register(edge)                      set_edge(new)
//!  Unregistered ─────────────▶ Registered ─────────────────────┐
//!       ▲                        │   ▲                         │
//!       │      unregister()      │   └── unregister + register ┘
//!       └────────────────────────┘
//! ```
//!
//! `register` always removes any stale registration first, then registers
//! with the callback message id, waits a short settle delay for the shell to
//! catch up, and finally positions the window.
//!
//! Positioning is a three-step exchange with the shell:
//!
//! 1. **query** – send the rectangle we would like; the shell may move it
//!    to avoid other toolbars.  The dock thickness is restored on the
//!    shell's answer, keeping the side that faces the edge.
//! 2. **set** – commit that proposal.  The shell may adjust it again, and
//!    its answer is final.
//! 3. **window moved** – move the real window there and tell the shell.
//!
//! The rectangle the shell committed, not the one we asked for, is what the
//! window ends up with.  Only an empty answer is overridden.
//!
//! # Failure handling
//!
//! Shell calls return a status code.  A zero status is reported as
//! [`ShellError::RegistrationFailed`] in the log and otherwise ignored: the
//! shell is tolerant of redundant calls and there is nothing useful to retry.

use std::thread;
use std::time::Duration;

use dock_core::{
    dock_rect, taskbar_allowance, AppBarData, AppBarOp, Edge, LayoutExtent, Rect, ShellMessage,
    WindowId,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Pause between registering and positioning, giving the shell time to add
/// the new toolbar to its bookkeeping.
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Error type for shell host operations.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The shell returned a failure status for a toolbar call.
    #[error("shell declined {op:?} (status {status})")]
    RegistrationFailed { op: AppBarOp, status: usize },

    /// The dock window could not be created.
    #[error("failed to create dock window: {0}")]
    WindowCreation(String),

    /// The dock window could not be moved to the approved rectangle.
    #[error("failed to move dock window: {0}")]
    WindowPlacement(String),
}

/// Everything EdgeReservation needs from the OS.
///
/// The production implementation talks to the Windows shell; tests use
/// `infrastructure::shell::mock::MockShellHost`.
pub trait ShellHost {
    /// Identity of the dock window.
    fn window(&self) -> WindowId;

    /// Window message id the shell should use for notifications.
    fn callback_message(&self) -> u32;

    /// Issues one toolbar call.  The shell may rewrite `data.rect` in place
    /// (query and set).  Returns the raw status; zero means failure.
    fn send(&mut self, op: AppBarOp, data: &mut AppBarData) -> usize;

    /// Bounds of the primary screen.
    fn screen_bounds(&self) -> Rect;

    /// OS build number, used to pick the bottom-edge taskbar allowance.
    fn os_build(&self) -> u32;

    /// Moves the dock window to `rect`.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::WindowPlacement`] if the OS refuses the move.
    fn place_window(&mut self, rect: Rect) -> Result<(), ShellError>;
}

/// In-memory registration state.  Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationState {
    /// The edge the dock is (or will be) reserved against.
    pub current_edge: Edge,
    /// `true` while a registration is held with the shell.
    pub registered: bool,
    /// The registrant window.
    pub window: WindowId,
    /// The shell-approved rectangle last applied to the window.
    pub last_applied_rect: Option<Rect>,
}

/// Owns the single toolbar registration of the dock window.
pub struct EdgeReservation<H: ShellHost> {
    host: H,
    state: ReservationState,
    settle_delay: Duration,
}

impl<H: ShellHost> EdgeReservation<H> {
    /// Creates an unregistered reservation that will start on `edge`.
    pub fn new(host: H, edge: Edge) -> Self {
        let window = host.window();
        Self {
            host,
            state: ReservationState {
                current_edge: edge,
                registered: false,
                window,
                last_applied_rect: None,
            },
            settle_delay: SETTLE_DELAY,
        }
    }

    /// Overrides the settle delay (tests use zero).
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn state(&self) -> &ReservationState {
        &self.state
    }

    pub fn current_edge(&self) -> Edge {
        self.state.current_edge
    }

    pub fn is_registered(&self) -> bool {
        self.state.registered
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Registers the dock on `edge` and positions it.
    ///
    /// Returns the rectangle applied to the window.
    pub fn register(&mut self, edge: Edge, extent: LayoutExtent) -> Rect {
        let mut data = self.record();

        // Clear anything left over from an earlier registration.
        self.send_logged(AppBarOp::Remove, &mut data);

        data.callback_message = self.host.callback_message();
        self.send_logged(AppBarOp::New, &mut data);

        self.state.registered = true;
        self.state.current_edge = edge;
        info!("dock registered on {edge} edge");

        if !self.settle_delay.is_zero() {
            thread::sleep(self.settle_delay);
        }

        self.apply_geometry(extent)
    }

    /// Drops the registration.  Safe to call when not registered.
    pub fn unregister(&mut self) {
        let mut data = self.record();
        self.send_logged(AppBarOp::Remove, &mut data);
        if self.state.registered {
            info!("dock unregistered from {} edge", self.state.current_edge);
        }
        self.state.registered = false;
        self.state.last_applied_rect = None;
    }

    /// Moves the registration to `new_edge`: unregister, then register.
    pub fn switch_edge(&mut self, new_edge: Edge, extent: LayoutExtent) -> Rect {
        debug!("switching dock edge {} -> {new_edge}", self.state.current_edge);
        self.unregister();
        self.register(new_edge, extent)
    }

    /// Recomputes and reapplies geometry for the current edge.
    ///
    /// Returns `None` without touching the shell when not registered.
    pub fn reposition(&mut self, extent: LayoutExtent) -> Option<Rect> {
        if !self.state.registered {
            debug!("reposition skipped: dock is not registered");
            return None;
        }
        Some(self.apply_geometry(extent))
    }

    /// Handles a shell message delivered to the dock window.
    ///
    /// Position changes recompute geometry for the current edge; activation
    /// is forwarded to the shell.  Returns the newly applied rectangle, if
    /// any.
    pub fn handle_message(&mut self, message: ShellMessage, extent: LayoutExtent) -> Option<Rect> {
        match message {
            ShellMessage::PositionChanged => {
                debug!("shell reported a position change");
                self.reposition(extent)
            }
            ShellMessage::Activate => {
                let mut data = self.record();
                self.send_logged(AppBarOp::Activate, &mut data);
                None
            }
            ShellMessage::Ignored => None,
        }
    }

    /// Runs the query / set / window-moved exchange for the current edge.
    fn apply_geometry(&mut self, extent: LayoutExtent) -> Rect {
        let edge = self.state.current_edge;
        let thickness = extent.thickness.max(1);
        let screen = self.host.screen_bounds();
        if screen.is_degenerate() {
            warn!("screen bounds {screen} are empty; clamping to a minimal screen");
        }
        let requested = dock_rect(edge, thickness, screen, taskbar_allowance(self.host.os_build()));

        let mut data = self.record();
        data.edge = edge;
        data.rect = requested;
        self.send_logged(AppBarOp::QueryPos, &mut data);
        data.rect = non_degenerate(data.rect.with_thickness(edge, thickness), requested, "query");

        let proposed = data.rect;
        self.send_logged(AppBarOp::SetPos, &mut data);
        data.rect = non_degenerate(data.rect, proposed, "set");

        let approved = data.rect;
        if let Err(e) = self.host.place_window(approved) {
            warn!("{e}");
        }
        self.send_logged(AppBarOp::WindowPosChanged, &mut data);

        debug!("dock geometry on {edge}: requested {requested}, applied {approved}");
        self.state.last_applied_rect = Some(approved);
        approved
    }

    fn record(&self) -> AppBarData {
        AppBarData::for_window(self.state.window)
    }

    fn send_logged(&mut self, op: AppBarOp, data: &mut AppBarData) {
        let status = self.host.send(op, data);
        if status == 0 {
            let err = ShellError::RegistrationFailed { op, status };
            warn!("{err}");
        }
    }
}

/// Returns `answer` unless it is empty, in which case the rectangle sent for
/// that step is kept.
fn non_degenerate(answer: Rect, sent: Rect, step: &str) -> Rect {
    if answer.is_degenerate() {
        warn!("shell returned degenerate rectangle {answer} on {step}; keeping {sent}");
        sent
    } else {
        answer
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
