//! Board configuration chosen at start-up.

use crate::input::PinMap;

/// What the input worker does when several edges arrived before it woke up.
///
/// The expander only remembers the last pin that triggered. Servicing just
/// that one pin would silently drop changes of the other pins until they
/// change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoalescedEdges {
    /// Re-read all pins. This catches every change that raised its own edge.
    /// A second pin changing while the latch is still set raises none, so
    /// after a single edge it is only seen on its next change.
    #[default]
    Resync,
    /// Update only the last reported pin, as the expander suggests.
    LastPinOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub pin_map: PinMap,
    pub coalesced_edges: CoalescedEdges,
}

impl Config {
    /// Configuration with the given pin layout and default policies.
    #[must_use]
    pub const fn new(pin_map: PinMap) -> Self {
        Self {
            pin_map,
            coalesced_edges: CoalescedEdges::Resync,
        }
    }
}
