//! Control core of the YBoard, caching user inputs and owning the speaker.
//!
//! It is mainly targetted to run in a firmware where an interrupt handler,
//! an input worker, an audio task and the application loop run in different
//! contexts. Everything here is hardware independent, peripherals are
//! reached through small traits implemented by the firmware.
//!
//! ```text
//!   (expander edge)
//!          |
//!    [ Interrupt ] --notify--> {EdgeSignal}
//!                                   |
//!                            [ InputWorker ] <--------> {ExpanderBus}
//!                                   |
//!                                   V
//!   [ Application ] --read--> {InputCache}     {QuadratureCounter}
//!          |                                           A
//!          +-------------------- knob ------------------+
//!          |
//!          +-- notes/files --> {Player} <--service-- [ AudioTask ]
//!                                 |
//!                                 V
//!                            {Transport}
//! ```
//!
//! All of the shared state lives in a single [`Board`](board::Board),
//! created once at start-up and shared by reference with every context.

#![no_std]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

#[cfg(test)]
extern crate std;

mod log;
#[cfg(test)]
mod testlib;

pub mod board;
pub mod config;
pub mod input;
pub mod knob;

pub use board::Board;
pub use config::{CoalescedEdges, Config};
pub use yboard_audio as audio;
