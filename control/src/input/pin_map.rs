//! Assignment of expander pins to logical channels.

pub type Pin = u8;

pub const BUTTONS: usize = 5;
pub const SWITCHES: usize = 4;
pub const DIP_SWITCHES: usize = 6;

/// Class of an input channel.
///
/// Each kind is cached in its own bitmask, with channel 1 at bit 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelKind {
    Button,
    Switch,
    DipSwitch,
    KnobButton,
}

impl ChannelKind {
    pub const ALL: [Self; 4] = [
        Self::Button,
        Self::Switch,
        Self::DipSwitch,
        Self::KnobButton,
    ];

    /// Number of channels of this kind.
    #[must_use]
    pub const fn count(self) -> u8 {
        match self {
            Self::Button => BUTTONS as u8,
            Self::Switch => SWITCHES as u8,
            Self::DipSwitch => DIP_SWITCHES as u8,
            Self::KnobButton => 1,
        }
    }

    /// Buttons and DIP switches pull the line low when engaged. Toggle
    /// switches are wired the other way around.
    #[must_use]
    pub const fn is_active_low(self) -> bool {
        !matches!(self, Self::Switch)
    }

    /// Whether the channel is engaged given the electrical level of its pin.
    #[must_use]
    pub const fn is_asserted(self, high: bool) -> bool {
        high != self.is_active_low()
    }

    pub(crate) const fn slot(self) -> usize {
        match self {
            Self::Button => 0,
            Self::Switch => 1,
            Self::DipSwitch => 2,
            Self::KnobButton => 3,
        }
    }
}

/// Single channel, `bit` is the zero-based position within its bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel {
    pub kind: ChannelKind,
    pub bit: u8,
}

impl Channel {
    #[must_use]
    pub const fn mask(&self) -> u8 {
        1 << self.bit
    }
}

/// Expander pins of every channel, indexed by their zero-based bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinMap {
    pub buttons: [Pin; BUTTONS],
    pub switches: [Pin; SWITCHES],
    pub dip_switches: [Pin; DIP_SWITCHES],
    pub knob_button: Pin,
}

impl Default for PinMap {
    fn default() -> Self {
        Self::V4
    }
}

impl PinMap {
    /// Layout of the v4 board.
    pub const V4: Self = Self {
        dip_switches: [0, 1, 2, 3, 4, 5],
        knob_button: 6,
        buttons: [7, 8, 9, 10, 11],
        switches: [12, 13, 14, 15],
    };

    #[must_use]
    pub fn pins(&self, kind: ChannelKind) -> &[Pin] {
        match kind {
            ChannelKind::Button => &self.buttons,
            ChannelKind::Switch => &self.switches,
            ChannelKind::DipSwitch => &self.dip_switches,
            ChannelKind::KnobButton => core::slice::from_ref(&self.knob_button),
        }
    }

    /// Find which channel is wired to the given pin.
    #[must_use]
    pub fn lookup(&self, pin: Pin) -> Option<Channel> {
        self.channels()
            .find(|(p, _)| *p == pin)
            .map(|(_, channel)| channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = (Pin, Channel)> + '_ {
        ChannelKind::ALL.into_iter().flat_map(move |kind| {
            self.pins(kind).iter().enumerate().map(move |(bit, pin)| {
                (
                    *pin,
                    Channel {
                        kind,
                        bit: bit as u8,
                    },
                )
            })
        })
    }
}
