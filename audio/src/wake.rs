//! Wake-up of a parked audio task.

use core::sync::atomic::{AtomicBool, Ordering};

/// Request for the audio task to run before its next deadline.
///
/// Once `Player::service` returns `None`, the audio task has nothing
/// scheduled and may park. Whoever starts a new source raises the signal
/// and the task, seeing `is_pending`, services the player again. Raising
/// and checking never lock.
#[derive(Debug, Default)]
pub struct WakeSignal {
    pending: AtomicBool,
}

impl WakeSignal {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    pub fn notify(&self) {
        self.pending.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Consume the request, returning whether there was one.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::Acquire)
    }
}
