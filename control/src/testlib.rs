//! Doubles of the board peripherals used across tests.

use core::cell::Cell;

use heapless::Vec;
use yboard_audio::transport::Transport;

use crate::input::{ExpanderBus, Pin, PinMap};
use crate::knob::QuadratureCounter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusError;

/// Expander with settable pin levels.
#[derive(Debug, Clone, Default)]
pub struct FakeBus {
    pub levels: [bool; 16],
    pub last_pin: Pin,
    pub failing_pins: u32,
    pub latch_cleared: u32,
    pub reads: u32,
    pub reads_since_clear: u32,
}

impl FakeBus {
    /// Put every mapped pin to the level of a released button or switch.
    pub fn set_all_released(&mut self, pin_map: &PinMap) {
        for (pin, channel) in pin_map.channels() {
            self.levels[pin as usize] = channel.kind.is_active_low();
        }
    }
}

impl ExpanderBus for FakeBus {
    type Error = BusError;

    fn read_pin(&mut self, pin: Pin) -> Result<bool, Self::Error> {
        self.reads += 1;
        self.reads_since_clear += 1;
        if self.failing_pins & (1 << pin) != 0 {
            return Err(BusError);
        }
        Ok(self.levels[pin as usize])
    }

    fn last_interrupt_pin(&mut self) -> Result<Pin, Self::Error> {
        Ok(self.last_pin)
    }

    fn clear_interrupt_latch(&mut self) -> Result<(), Self::Error> {
        self.latch_cleared += 1;
        self.reads_since_clear = 0;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeCounter {
    pub value: i64,
}

impl QuadratureCounter for FakeCounter {
    fn count(&self) -> i64 {
        self.value
    }

    fn set_count(&mut self, value: i64) {
        self.value = value;
    }

    fn clear_count(&mut self) {
        self.value = 0;
    }
}

/// Transport remembering emitted tones. Started files stay busy for the
/// given number of polls.
#[derive(Debug, Default)]
pub struct FakeTransport {
    pub emitted: Vec<Option<i16>, 64>,
    pub file_busy_polls: u32,
    pub file_volume: u8,
    remaining_polls: Cell<u32>,
}

impl FakeTransport {
    pub const fn new() -> Self {
        Self {
            emitted: Vec::new(),
            file_busy_polls: 0,
            file_volume: 0,
            remaining_polls: Cell::new(0),
        }
    }

    pub fn tones(&self) -> impl Iterator<Item = i16> + '_ {
        self.emitted.iter().filter_map(|pitch| *pitch)
    }
}

impl Transport for FakeTransport {
    fn emit_tone(&mut self, pitch: i16, _duration_ms: u32, _volume: u8) {
        self.emitted.push(Some(pitch)).unwrap();
    }

    fn emit_silence(&mut self, _duration_ms: u32) {
        self.emitted.push(None).unwrap();
    }

    fn file_available(&mut self, _path: &str) -> bool {
        true
    }

    fn start_file(&mut self, _path: &str) -> bool {
        self.remaining_polls.set(self.file_busy_polls);
        true
    }

    fn stop_transport(&mut self) {
        self.remaining_polls.set(0);
    }

    fn transport_busy(&self) -> bool {
        let remaining = self.remaining_polls.get();
        self.remaining_polls.set(remaining.saturating_sub(1));
        remaining > 0
    }

    fn set_file_volume(&mut self, volume: u8) {
        self.file_volume = volume;
    }
}
