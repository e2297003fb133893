//! Mock shell host for unit testing and headless runs.
//!
//! Records every toolbar call so tests can assert on call order and on the
//! records sent, and lets tests script how the "shell" adjusts rectangles.

use std::sync::{Arc, Mutex};

use dock_core::{AppBarData, AppBarOp, Rect, WindowId};

use crate::application::reserve_edge::{ShellError, ShellHost};

/// Callback message id handed out by the mock unless overridden.
pub const MOCK_CALLBACK_MESSAGE: u32 = 0xC0FE;

/// Build number reported by the mock unless overridden (a Windows 11 build).
pub const MOCK_OS_BUILD: u32 = 22631;

type Adjustment = Arc<dyn Fn(AppBarOp, Rect) -> Rect + Send + Sync>;

/// One recorded toolbar call, with the record as the dock sent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellCall {
    pub op: AppBarOp,
    pub data: AppBarData,
}

#[derive(Default)]
struct ShellLog {
    calls: Vec<ShellCall>,
    placements: Vec<Rect>,
    registered: bool,
    statuses: Vec<(AppBarOp, usize)>,
    screen: Rect,
    fail_placement: bool,
}

/// A [`ShellHost`] that talks to nobody.
///
/// Clones share the same log, so a test can keep one handle while the
/// reservation owns another.
#[derive(Clone)]
pub struct MockShellHost {
    window: WindowId,
    callback_message: u32,
    os_build: u32,
    adjustment: Option<Adjustment>,
    log: Arc<Mutex<ShellLog>>,
}

impl MockShellHost {
    /// Creates a mock with the given primary screen bounds.
    pub fn new(screen: Rect) -> Self {
        Self {
            window: WindowId(0x1000),
            callback_message: MOCK_CALLBACK_MESSAGE,
            os_build: MOCK_OS_BUILD,
            adjustment: None,
            log: Arc::new(Mutex::new(ShellLog {
                screen,
                ..ShellLog::default()
            })),
        }
    }

    /// A single 1920×1080 primary screen.
    pub fn single_1080p() -> Self {
        Self::new(Rect::from_size(1920, 1080))
    }

    pub fn with_callback_message(mut self, id: u32) -> Self {
        self.callback_message = id;
        self
    }

    pub fn with_os_build(mut self, build: u32) -> Self {
        self.os_build = build;
        self
    }

    /// Lets the fake shell rewrite rectangles on query and set.
    pub fn with_adjustment<F>(mut self, adjust: F) -> Self
    where
        F: Fn(AppBarOp, Rect) -> Rect + Send + Sync + 'static,
    {
        self.adjustment = Some(Arc::new(adjust));
        self
    }

    /// Forces the status returned for `op`.
    pub fn with_status(self, op: AppBarOp, status: usize) -> Self {
        self.lock().statuses.push((op, status));
        self
    }

    /// Makes every subsequent `place_window` fail.
    pub fn with_failing_placement(self) -> Self {
        self.lock().fail_placement = true;
        self
    }

    /// Changes the reported screen bounds (simulates a resolution change).
    pub fn set_screen(&self, screen: Rect) {
        self.lock().screen = screen;
    }

    /// All recorded calls, oldest first.
    pub fn calls(&self) -> Vec<ShellCall> {
        self.lock().calls.clone()
    }

    /// The operations of all recorded calls, oldest first.
    pub fn ops(&self) -> Vec<AppBarOp> {
        self.lock().calls.iter().map(|c| c.op).collect()
    }

    /// Every rectangle the window was moved to, oldest first.
    pub fn placements(&self) -> Vec<Rect> {
        self.lock().placements.clone()
    }

    /// `true` while the fake shell holds a registration for the window.
    pub fn is_registered(&self) -> bool {
        self.lock().registered
    }

    /// Forgets recorded calls and placements; registration is kept.
    pub fn clear(&self) {
        let mut log = self.lock();
        log.calls.clear();
        log.placements.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ShellLog> {
        self.log.lock().expect("lock poisoned")
    }
}

impl ShellHost for MockShellHost {
    fn window(&self) -> WindowId {
        self.window
    }

    fn callback_message(&self) -> u32 {
        self.callback_message
    }

    fn send(&mut self, op: AppBarOp, data: &mut AppBarData) -> usize {
        let mut log = self.lock();
        log.calls.push(ShellCall { op, data: *data });

        let forced = log
            .statuses
            .iter()
            .rev()
            .find(|(o, _)| *o == op)
            .map(|(_, status)| *status);

        let status = match op {
            AppBarOp::New if log.registered => 0,
            AppBarOp::New => {
                log.registered = true;
                1
            }
            AppBarOp::Remove => {
                log.registered = false;
                1
            }
            AppBarOp::QueryPos | AppBarOp::SetPos => {
                if let Some(adjust) = &self.adjustment {
                    data.rect = adjust(op, data.rect);
                }
                1
            }
            AppBarOp::Activate | AppBarOp::WindowPosChanged => 1,
        };
        forced.unwrap_or(status)
    }

    fn screen_bounds(&self) -> Rect {
        self.lock().screen
    }

    fn os_build(&self) -> u32 {
        self.os_build
    }

    fn place_window(&mut self, rect: Rect) -> Result<(), ShellError> {
        let mut log = self.lock();
        if log.fail_placement {
            return Err(ShellError::WindowPlacement(format!("refused {rect}")));
        }
        log.placements.push(rect);
        Ok(())
    }
}
