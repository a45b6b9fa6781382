//! Arbitrate the speaker between notes and sound files, play notes in time.

use crate::event::NoteEvent;
use crate::log;
use crate::path;
use crate::queue::{PlaybackQueue, QueueFull};
use crate::transport::Transport;
use crate::{Duration, Instant};

/// How often a running file is checked for completion.
pub const FILE_POLL_INTERVAL: Duration = Duration::from_ticks(10);

pub const MAX_FILE_VOLUME: u8 = 10;

/// Which source currently owns the speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AudioSource {
    #[default]
    Idle,
    PlayingNotes,
    PlayingFile,
}

/// Background audio player.
///
/// Requests (`enqueue`, `play_file`, `stop`) switch the source immediately.
/// The passing of time is driven from outside by calling `service` from a
/// background task, which emits queued events once the previous one ran out.
#[derive(Debug)]
pub struct Player<T, const N: usize> {
    transport: T,
    queue: PlaybackQueue<N>,
    source: AudioSource,
    event_deadline: Option<Instant>,
}

impl<T: Transport, const N: usize> Player<T, N> {
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            queue: PlaybackQueue::new(),
            source: AudioSource::Idle,
            event_deadline: None,
        }
    }

    /// Append a compiled batch behind the notes already waiting.
    ///
    /// Takes the speaker over from a playing file. An empty batch is
    /// accepted and leaves the source as it was.
    ///
    /// # Errors
    ///
    /// Fails with `QueueFull` if the batch does not fit. Nothing changes in
    /// that case.
    pub fn enqueue(&mut self, batch: &[NoteEvent]) -> Result<(), QueueFull> {
        if batch.is_empty() {
            return Ok(());
        }
        // A playing file implies an empty queue.
        if batch.len() > self.queue.free() {
            return Err(QueueFull);
        }
        if self.source == AudioSource::PlayingFile {
            self.halt();
        }
        self.queue.append(batch)?;
        if self.source == AudioSource::Idle {
            log::debug!("Starting notes playback");
            self.source = AudioSource::PlayingNotes;
            self.event_deadline = None;
        }
        Ok(())
    }

    /// Start a file in the background, dropping any queued notes.
    ///
    /// Returns `false` when the path is invalid or the file is not available.
    /// Whatever was playing keeps playing then. If the transport fails to
    /// start an available file, the player ends up idle.
    pub fn play_file(&mut self, path: &str) -> bool {
        let Some(path) = path::normalize(path) else {
            log::warning!("Invalid sound file path");
            return false;
        };

        if !self.transport.file_available(&path) {
            log::warning!("Sound file not available");
            return false;
        }

        self.halt();

        if self.transport.start_file(&path) {
            self.source = AudioSource::PlayingFile;
            true
        } else {
            log::warning!("Failed to start sound file");
            false
        }
    }

    pub fn set_file_volume(&mut self, volume: u8) {
        self.transport.set_file_volume(volume.min(MAX_FILE_VOLUME));
    }

    /// Silence the speaker right away, regardless of the source.
    pub fn stop(&mut self) {
        self.halt();
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.source != AudioSource::Idle
    }

    #[must_use]
    pub fn source(&self) -> AudioSource {
        self.source
    }

    #[must_use]
    pub fn queue(&self) -> &PlaybackQueue<N> {
        &self.queue
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Advance playback to the given time.
    ///
    /// Returns when `service` should be called next, `None` once idle.
    pub fn service(&mut self, now: Instant) -> Option<Instant> {
        match self.source {
            AudioSource::Idle => None,
            AudioSource::PlayingFile => {
                if self.transport.transport_busy() {
                    Some(now + FILE_POLL_INTERVAL)
                } else {
                    log::debug!("Sound file finished");
                    self.source = AudioSource::Idle;
                    None
                }
            }
            AudioSource::PlayingNotes => self.service_notes(now),
        }
    }

    fn service_notes(&mut self, now: Instant) -> Option<Instant> {
        loop {
            if let Some(deadline) = self.event_deadline {
                if now < deadline {
                    return Some(deadline);
                }
            }

            let Some(event) = self.queue.pop() else {
                log::debug!("Notes playback finished");
                self.transport.stop_transport();
                self.source = AudioSource::Idle;
                self.event_deadline = None;
                return None;
            };

            match event.pitch {
                Some(pitch) => self
                    .transport
                    .emit_tone(pitch, event.duration_ms, event.volume),
                None => self.transport.emit_silence(event.duration_ms),
            }
            self.event_deadline = Some(now + Duration::from_ticks(event.duration_ms.into()));
        }
    }

    fn halt(&mut self) {
        if self.source != AudioSource::Idle {
            self.transport.stop_transport();
        }
        self.queue.clear();
        self.source = AudioSource::Idle;
        self.event_deadline = None;
    }
}
