//! Single compiled unit of audio output.

/// Pitch index of A above middle C, tuned to 440 Hz.
const A4_PITCH: i16 = 69;
const A4_FREQUENCY: f32 = 440.0;

/// A tone or a rest with fixed duration and volume.
///
/// Pitch is counted in semitones, twelve per octave, so that C in octave 5
/// lands on 60. Rests carry no pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoteEvent {
    pub pitch: Option<i16>,
    pub duration_ms: u32,
    pub volume: u8,
}

impl NoteEvent {
    #[must_use]
    pub fn tone(pitch: i16, duration_ms: u32, volume: u8) -> Self {
        Self {
            pitch: Some(pitch),
            duration_ms,
            volume,
        }
    }

    #[must_use]
    pub fn rest(duration_ms: u32, volume: u8) -> Self {
        Self {
            pitch: None,
            duration_ms,
            volume,
        }
    }

    #[must_use]
    pub fn is_rest(&self) -> bool {
        self.pitch.is_none()
    }

    /// Frequency of the tone in Hz, using equal temperament.
    ///
    /// Returns `None` for rests.
    #[must_use]
    pub fn frequency(&self) -> Option<f32> {
        self.pitch.map(pitch_to_frequency)
    }
}

#[must_use]
pub fn pitch_to_frequency(pitch: i16) -> f32 {
    let semitones = (pitch - A4_PITCH) as f32;
    A4_FREQUENCY * libm::powf(2.0, semitones / 12.0)
}
