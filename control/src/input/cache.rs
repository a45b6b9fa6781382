//! Bitmask cache of buttons and switches.

use core::sync::atomic::{AtomicU8, Ordering};

use super::expander::ExpanderBus;
use super::pin_map::{Channel, ChannelKind, Pin, PinMap};

/// Last known state of all expander inputs.
///
/// Every channel kind is kept in its own atomic byte, so readers in any
/// context always see a whole bitmask. There must be only a single writer,
/// calling `recache_all` or `recache_on_signal`, at a time.
///
/// Stored bits are logical: `1` means pressed or switched on, regardless of
/// the electrical polarity of the pin.
#[derive(Debug, Default)]
pub struct InputCache {
    masks: [AtomicU8; 4],
}

impl InputCache {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            masks: [
                AtomicU8::new(0),
                AtomicU8::new(0),
                AtomicU8::new(0),
                AtomicU8::new(0),
            ],
        }
    }

    /// State of a single channel, `index` counts from 1.
    ///
    /// Out of range indices read as `false`.
    #[must_use]
    pub fn get(&self, kind: ChannelKind, index: u8) -> bool {
        if index == 0 || index > kind.count() {
            return false;
        }
        self.get_all(kind) & (1 << (index - 1)) != 0
    }

    /// Bitmask of all channels of the kind, bit 0 holding channel 1.
    #[must_use]
    pub fn get_all(&self, kind: ChannelKind) -> u8 {
        self.masks[kind.slot()].load(Ordering::Acquire)
    }

    /// Read every mapped pin and rebuild all bitmasks.
    ///
    /// Pins that fail to read keep their previous value. Each bitmask is
    /// published at once.
    ///
    /// # Errors
    ///
    /// Returns the first read failure, after all other pins were updated.
    pub fn recache_all<B: ExpanderBus>(
        &self,
        pin_map: &PinMap,
        bus: &mut B,
    ) -> Result<(), B::Error> {
        let mut first_error = None;

        for kind in ChannelKind::ALL {
            let slot = &self.masks[kind.slot()];
            let mut mask = slot.load(Ordering::Relaxed);
            for (bit, pin) in pin_map.pins(kind).iter().enumerate() {
                match bus.read_pin(*pin) {
                    Ok(high) => {
                        mask = with_bit(mask, bit as u8, kind.is_asserted(high));
                    }
                    Err(error) => {
                        if first_error.is_none() {
                            first_error = Some(error);
                        }
                    }
                }
            }
            slot.store(mask, Ordering::Release);
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Update the single channel that triggered the latest interrupt.
    ///
    /// The interrupt latch is cleared before the pin is read, so a change
    /// following the read raises a new edge. It is cleared even if a bus
    /// transaction failed, so the expander can report further changes.
    /// Returns the updated channel, or `None` if the pin is not mapped.
    ///
    /// # Errors
    ///
    /// Fails if any of the bus transactions failed. The cached bit stays
    /// unchanged in that case.
    pub fn recache_on_signal<B: ExpanderBus>(
        &self,
        pin_map: &PinMap,
        bus: &mut B,
    ) -> Result<Option<Channel>, B::Error> {
        let pin = bus.last_interrupt_pin();
        let cleared = bus.clear_interrupt_latch();
        let channel = self.recache_pin(pin_map, bus, pin?)?;
        cleared?;
        Ok(channel)
    }

    fn recache_pin<B: ExpanderBus>(
        &self,
        pin_map: &PinMap,
        bus: &mut B,
        pin: Pin,
    ) -> Result<Option<Channel>, B::Error> {
        let Some(channel) = pin_map.lookup(pin) else {
            return Ok(None);
        };
        let high = bus.read_pin(pin)?;
        self.set(channel, channel.kind.is_asserted(high));
        Ok(Some(channel))
    }

    fn set(&self, channel: Channel, asserted: bool) {
        let slot = &self.masks[channel.kind.slot()];
        if asserted {
            slot.fetch_or(channel.mask(), Ordering::AcqRel);
        } else {
            slot.fetch_and(!channel.mask(), Ordering::AcqRel);
        }
    }
}

fn with_bit(mask: u8, bit: u8, value: bool) -> u8 {
    (mask & !(1 << bit)) | (u8::from(value) << bit)
}
