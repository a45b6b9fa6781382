//! Note notation compiler and background audio player.
//!
//! The board has a single speaker output that is shared by two sources: a
//! queue of notes compiled from a small textual notation, and sound files.
//! This crate holds everything that decides what the speaker should do and
//! when, leaving the actual transport to the caller:
//!
//! ```text
//!    "T160 C D E8 R"
//!          |
//!    [ Notation ]  -- pure, no hardware
//!          | (NoteEvent)
//!          V
//!   [ PlaybackQueue ] --> [ Player ] --> {Transport}
//!                            A
//!                            | service(now)
//!                     [ Background task ] <-- [ WakeSignal ]
//! ```

#![no_std]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]

#[cfg(test)]
#[macro_use]
extern crate approx;

mod log;

pub mod event;
pub mod notation;
pub mod path;
pub mod player;
pub mod queue;
pub mod transport;
pub mod wake;

/// Maximum number of note events waiting for playback.
pub const QUEUE_CAPACITY: usize = 256;

/// Monotonic time as seen by the player, in milliseconds.
pub type Instant = fugit::TimerInstantU64<1000>;

/// Span of time as seen by the player, in milliseconds.
pub type Duration = fugit::MillisDurationU64;
