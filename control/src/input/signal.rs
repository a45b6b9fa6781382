//! Hand-over of expander interrupts to the input worker.

use core::sync::atomic::{AtomicU32, Ordering};

/// Count of expander edges not yet serviced.
///
/// `notify` is the only thing the interrupt handler does: a single atomic
/// increment, without locking, allocation or bus access. The input worker
/// calls `take` when woken up and learns how many edges happened since the
/// last time, which tells it whether servicing the single last reported pin
/// is enough.
#[derive(Debug, Default)]
pub struct EdgeSignal {
    pending: AtomicU32,
}

impl EdgeSignal {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: AtomicU32::new(0),
        }
    }

    /// Record an edge. Safe to call from an interrupt handler.
    pub fn notify(&self) {
        self.pending.fetch_add(1, Ordering::Release);
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire) != 0
    }

    /// Consume all edges recorded so far, returning their count.
    pub fn take(&self) -> u32 {
        self.pending.swap(0, Ordering::Acquire)
    }
}
