//! Trailing-edge debouncer.
//!
//! Editors rarely save a file in one write: a save can show up as a
//! truncate, several writes and a rename in quick succession.  Every
//! notification calls [`Debouncer::schedule`], which replaces any pending
//! timer with a fresh full-length one.  The action runs once, `delay` after
//! the *last* notification of a burst.
//!
//! The timer is a task on a tokio runtime.  Its `JoinHandle` is swapped
//! under a mutex, so notifications may arrive from any thread.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

/// Quiet period before a configuration reload.
pub const RELOAD_DEBOUNCE: Duration = Duration::from_millis(500);

/// The timer currently allowed to fire.
///
/// `generation` advances on every schedule and cancel.  A timer that wakes
/// up after it was replaced sees a newer generation and does nothing, which
/// covers the window where `abort` can no longer reach it.
#[derive(Default)]
struct Pending {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Pending {
    /// Invalidates the current timer and returns the next generation.
    fn advance(&mut self) -> u64 {
        if let Some(previous) = self.handle.take() {
            previous.abort();
        }
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }
}

/// Runs an action once a burst of triggers has gone quiet.
pub struct Debouncer {
    runtime: Handle,
    delay: Duration,
    action: Arc<dyn Fn() + Send + Sync>,
    pending: Arc<Mutex<Pending>>,
}

impl Debouncer {
    /// Creates a debouncer whose timers run on `runtime`.
    ///
    /// `action` runs on a runtime worker thread; it should only hand work
    /// over to the thread that owns the state it touches.
    pub fn new<F>(runtime: Handle, delay: Duration, action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            runtime,
            delay,
            action: Arc::new(action),
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Starts (or restarts) the timer.
    pub fn schedule(&self) {
        let mut pending = lock(&self.pending);
        let generation = pending.advance();

        let slot = Arc::clone(&self.pending);
        let action = Arc::clone(&self.action);
        let delay = self.delay;
        pending.handle = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if fire_if_current(&slot, generation, action.as_ref()) {
                trace!("debounce timer fired after {delay:?}");
            }
        }));
    }

    /// Drops the pending timer, if any, without running the action.
    pub fn cancel(&self) {
        lock(&self.pending).advance();
    }

    /// `true` while a timer is waiting to fire.
    pub fn is_pending(&self) -> bool {
        lock(&self.pending)
            .handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Runs `action` if `generation` is still the latest timer.
///
/// The action runs under the lock, so a concurrent `schedule` either lands
/// before (and this timer stands down) or after (and gets its own full
/// delay).
fn fire_if_current(
    slot: &Mutex<Pending>,
    generation: u64,
    action: &(dyn Fn() + Send + Sync),
) -> bool {
    let mut pending = lock(slot);
    if pending.generation != generation {
        trace!("stale debounce timer {generation} ignored");
        return false;
    }
    pending.handle = None;
    action();
    true
}

fn lock(slot: &Mutex<Pending>) -> MutexGuard<'_, Pending> {
    // The guarded value is a counter and a handle; a panic elsewhere cannot
    // leave it half-updated.
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
