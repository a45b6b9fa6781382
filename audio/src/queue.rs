//! FIFO of compiled events waiting for the player.

use heapless::Deque;

use crate::event::NoteEvent;

/// Returned when a batch does not fit, the queue is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueFull;

#[derive(Debug)]
pub struct PlaybackQueue<const N: usize> {
    events: Deque<NoteEvent, N>,
}

impl<const N: usize> Default for PlaybackQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PlaybackQueue<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            events: Deque::new(),
        }
    }

    /// Append the whole batch to the tail, or nothing at all.
    ///
    /// # Errors
    ///
    /// Fails with `QueueFull` when there is not enough room for every event
    /// of the batch.
    pub fn append(&mut self, batch: &[NoteEvent]) -> Result<(), QueueFull> {
        if self.free() < batch.len() {
            return Err(QueueFull);
        }
        for event in batch {
            // Room was checked above.
            let _ = self.events.push_back(*event);
        }
        Ok(())
    }

    pub fn pop(&mut self) -> Option<NoteEvent> {
        self.events.pop_front()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn free(&self) -> usize {
        N - self.events.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NoteEvent> {
        self.events.iter()
    }
}
