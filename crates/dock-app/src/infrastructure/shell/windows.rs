//! Win32 desktop-toolbar host.
//!
//! Owns the dock's top-most tool window and forwards toolbar calls to
//! `SHAppBarMessage`.  The window procedure never touches dock state: it
//! classifies the message, queues a [`DockEvent`] on a thread-local queue and
//! returns.  [`run_message_loop`] drains that queue after each dispatched
//! message, so the session is never re-entered from inside a shell call that
//! happens to send a message to our window synchronously.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::c_void;
use std::mem::size_of;
use std::sync::OnceLock;

use dock_core::protocol::appbar::CALLBACK_MESSAGE_NAME;
use dock_core::{AppBarData, AppBarOp, Rect, ShellMessage, WindowId};
use tracing::{debug, info, warn};
use windows::core::{w, HSTRING};
use windows::Wdk::System::SystemServices::RtlGetVersion;
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::SystemInformation::OSVERSIONINFOW;
use windows::Win32::UI::Shell::{SHAppBarMessage, APPBARDATA};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
    GetSystemMetrics, PostMessageW, PostQuitMessage, RegisterClassW, RegisterWindowMessageW,
    SetWindowPos, ShowWindow, TranslateMessage, HWND_TOPMOST, MSG, SM_CXSCREEN, SM_CYSCREEN,
    SWP_NOACTIVATE, SW_SHOWNOACTIVATE, WM_APP, WM_CLOSE, WNDCLASSW, WS_EX_TOOLWINDOW,
    WS_EX_TOPMOST, WS_POPUP,
};

use crate::application::dock_session::DockEvent;
use crate::application::reserve_edge::{ShellError, ShellHost};

/// Private message asking the dock window's thread to reload its settings.
pub const WM_DOCK_RELOAD: u32 = WM_APP + 1;

/// Callback message id, registered once per process.
static CALLBACK_MESSAGE: OnceLock<u32> = OnceLock::new();

thread_local! {
    /// Events produced by the window procedure, drained by the message loop.
    static PENDING: RefCell<VecDeque<DockEvent>> = const { RefCell::new(VecDeque::new()) };
}

fn callback_message_id() -> u32 {
    *CALLBACK_MESSAGE.get_or_init(|| {
        let name = HSTRING::from(CALLBACK_MESSAGE_NAME);
        // SAFETY: `name` is a valid null-terminated wide string for the call.
        let id = unsafe { RegisterWindowMessageW(&name) };
        if id == 0 {
            warn!("RegisterWindowMessageW failed; shell notifications will be missed");
        }
        id
    })
}

fn hwnd(window: WindowId) -> HWND {
    HWND(window.0 as *mut c_void)
}

fn to_win_rect(rect: Rect) -> RECT {
    RECT {
        left: rect.left,
        top: rect.top,
        right: rect.right,
        bottom: rect.bottom,
    }
}

fn from_win_rect(rc: RECT) -> Rect {
    Rect::new(rc.left, rc.top, rc.right, rc.bottom)
}

/// Build number from `RtlGetVersion`, which (unlike `GetVersionEx`) is not
/// subject to compatibility shims.  Zero if the call fails.
fn os_build_number() -> u32 {
    let mut info = OSVERSIONINFOW {
        dwOSVersionInfoSize: size_of::<OSVERSIONINFOW>() as u32,
        ..Default::default()
    };
    // SAFETY: `info` is a properly sized, writable OSVERSIONINFOW.
    let status = unsafe { RtlGetVersion(&mut info) };
    if status.is_ok() {
        info.dwBuildNumber
    } else {
        warn!("RtlGetVersion failed ({status:?}); assuming a pre-Windows 11 build");
        0
    }
}

/// Window procedure for the dock window.
///
/// # Safety
///
/// Called by Windows on the thread that created the window.
unsafe extern "system" fn dock_window_proc(
    window: HWND,
    msg: u32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    let event = match msg {
        WM_DOCK_RELOAD => Some(DockEvent::ReloadRequested),
        WM_CLOSE => Some(DockEvent::Shutdown),
        _ => ShellMessage::classify(callback_message_id(), msg, w_param.0).map(DockEvent::Shell),
    };

    match event {
        Some(event) => {
            PENDING.with(|queue| queue.borrow_mut().push_back(event));
            if matches!(event, DockEvent::Shell(ShellMessage::Activate)) {
                // Activation still needs the default handling.
                DefWindowProcW(window, msg, w_param, l_param)
            } else {
                LRESULT(0)
            }
        }
        None => DefWindowProcW(window, msg, w_param, l_param),
    }
}

/// [`ShellHost`] backed by a real top-most tool window.
pub struct Win32ShellHost {
    window: HWND,
    callback_message: u32,
    os_build: u32,
}

impl Win32ShellHost {
    /// Registers the window class and creates the dock window on the
    /// calling thread.  That thread must run [`run_message_loop`].
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::WindowCreation`] if the window cannot be
    /// created.
    pub fn create() -> Result<Self, ShellError> {
        let class_name = w!("EdgeDockWindow");

        // SAFETY: GetModuleHandleW(None) returns the handle of the current
        // executable and has no preconditions.
        let module = unsafe { GetModuleHandleW(None) }
            .map_err(|e| ShellError::WindowCreation(e.to_string()))?;
        let instance: HINSTANCE = module.into();

        let class = WNDCLASSW {
            lpfnWndProc: Some(dock_window_proc),
            hInstance: instance,
            lpszClassName: class_name,
            ..Default::default()
        };
        // SAFETY: `class` is fully initialised and its strings are 'static.
        if unsafe { RegisterClassW(&class) } == 0 {
            // Already registered by an earlier host in this process, or a
            // real failure that CreateWindowExW below will report.
            debug!("RegisterClassW returned 0");
        }

        // SAFETY: The class was registered above; all pointers are valid.
        let window = unsafe {
            CreateWindowExW(
                WS_EX_TOOLWINDOW | WS_EX_TOPMOST,
                class_name,
                w!("Dock"),
                WS_POPUP,
                0,
                0,
                1,
                1,
                None,
                None,
                instance,
                None,
            )
        }
        .map_err(|e| ShellError::WindowCreation(e.to_string()))?;

        // SAFETY: `window` is the valid handle created above.
        let _ = unsafe { ShowWindow(window, SW_SHOWNOACTIVATE) };

        let host = Self {
            window,
            callback_message: callback_message_id(),
            os_build: os_build_number(),
        };
        info!(
            "dock window created (callback message {:#x}, build {})",
            host.callback_message, host.os_build
        );
        Ok(host)
    }

    /// A `Send` handle for posting to the dock window from other threads.
    pub fn messenger(&self) -> WindowMessenger {
        WindowMessenger(self.window.0 as isize)
    }
}

impl Drop for Win32ShellHost {
    fn drop(&mut self) {
        // SAFETY: The handle belongs to this host; destroying an already
        // destroyed window fails harmlessly.
        if let Err(e) = unsafe { DestroyWindow(self.window) } {
            debug!("DestroyWindow: {e}");
        }
    }
}

impl ShellHost for Win32ShellHost {
    fn window(&self) -> WindowId {
        WindowId(self.window.0 as isize)
    }

    fn callback_message(&self) -> u32 {
        self.callback_message
    }

    fn send(&mut self, op: AppBarOp, data: &mut AppBarData) -> usize {
        let mut record = APPBARDATA {
            cbSize: size_of::<APPBARDATA>() as u32,
            hWnd: hwnd(data.window),
            uCallbackMessage: data.callback_message,
            uEdge: data.edge.code(),
            rc: to_win_rect(data.rect),
            lParam: LPARAM(0),
        };
        // SAFETY: `record` is a fully initialised APPBARDATA with a correct
        // cbSize; the shell only reads and writes within it.
        let status = unsafe { SHAppBarMessage(op.code(), &mut record) };
        data.rect = from_win_rect(record.rc);
        debug!("SHAppBarMessage({op:?}) -> {status}");
        status
    }

    fn screen_bounds(&self) -> Rect {
        // SAFETY: GetSystemMetrics has no preconditions.
        let (width, height) =
            unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
        Rect::from_size(width, height)
    }

    fn os_build(&self) -> u32 {
        self.os_build
    }

    fn place_window(&mut self, rect: Rect) -> Result<(), ShellError> {
        // SAFETY: `self.window` is a live window owned by this host.
        unsafe {
            SetWindowPos(
                self.window,
                HWND_TOPMOST,
                rect.left,
                rect.top,
                rect.width(),
                rect.height(),
                SWP_NOACTIVATE,
            )
        }
        .map_err(|e| ShellError::WindowPlacement(e.to_string()))
    }
}

/// Posts private messages to the dock window.  Safe to use from any thread.
#[derive(Debug, Clone, Copy)]
pub struct WindowMessenger(isize);

impl WindowMessenger {
    /// Asks the window thread to reload the configuration.
    pub fn request_reload(&self) {
        self.post(WM_DOCK_RELOAD);
    }

    /// Asks the window thread to shut the dock down.
    pub fn request_close(&self) {
        self.post(WM_CLOSE);
    }

    fn post(&self, msg: u32) {
        // SAFETY: PostMessageW only queues the message; a stale handle makes
        // the call fail, which is logged.
        if let Err(e) = unsafe {
            PostMessageW(hwnd(WindowId(self.0)), msg, WPARAM(0), LPARAM(0))
        } {
            warn!("PostMessageW({msg:#x}) failed: {e}");
        }
    }
}

/// Runs the window thread's message loop, handing each queued event to
/// `on_event` until it returns `false` or the thread receives `WM_QUIT`.
pub fn run_message_loop<F>(mut on_event: F)
where
    F: FnMut(DockEvent) -> bool,
{
    let mut msg = MSG::default();
    // SAFETY: Standard Win32 GetMessage/DispatchMessage loop pattern on the
    // thread that owns the dock window.
    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);

            while let Some(event) = PENDING.with(|queue| queue.borrow_mut().pop_front()) {
                if !on_event(event) {
                    PostQuitMessage(0);
                    PENDING.with(|queue| queue.borrow_mut().clear());
                    return;
                }
            }
        }
    }
}
