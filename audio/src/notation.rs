//! Compile the textual note notation into playable events.
//!
//! ```text
//! A-G         a note, R is a rest
//! + or #      raise the note by a half-step
//! -           lower the note by a half-step
//! > and <     shift the note an octave up or down, may repeat
//! 1-2000      length as a fraction of a whole note, 4 when omitted
//! O<n>        set octave, 4-7
//! T<n>        set tempo in BPM, 40-240
//! V<n>        set volume, 1-10
//! !           reset octave, tempo and volume
//! ```
//!
//! Tokens may be separated by whitespace, but a token must not contain any.
//! Modifiers of a note may come in any order, so `C#4` and `C4#` are the
//! same note. Letters are case-insensitive.

use heapless::Vec;

use crate::event::NoteEvent;

pub const DEFAULT_OCTAVE: u8 = 5;
pub const DEFAULT_TEMPO: u16 = 120;
pub const DEFAULT_VOLUME: u8 = 5;

pub const OCTAVE_RANGE: (u8, u8) = (4, 7);
pub const TEMPO_RANGE: (u16, u16) = (40, 240);
pub const VOLUME_RANGE: (u8, u8) = (1, 10);
pub const DIVISOR_RANGE: (u32, u32) = (1, 2000);

const DEFAULT_DIVISOR: u32 = 4;

// Octave shifts may take a note out of the range settable through `O`,
// but not below the lowest or above the highest octave a pitch can express.
const SHIFTED_OCTAVE_RANGE: (i16, i16) = (0, 10);

// Length of a whole note at 1 BPM, in milliseconds.
const WHOLE_NOTE_MS: u32 = 4 * 60_000;

/// Failure to compile notation, pointing to the offending token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Error {
    pub position: usize,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    UnexpectedCharacter(u8),
    MissingValue,
    OctaveOutOfRange,
    TempoOutOfRange,
    VolumeOutOfRange,
    DivisorOutOfRange,
    DuplicateAccidental,
    DuplicateDivisor,
    ModifierOnRest,
    PitchOutOfRange,
    TooManyEvents,
}

/// Modifiers applied to notes compiled after them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackState {
    pub octave: u8,
    pub tempo: u16,
    pub volume: u8,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            octave: DEFAULT_OCTAVE,
            tempo: DEFAULT_TEMPO,
            volume: DEFAULT_VOLUME,
        }
    }
}

/// Single-pass scanner over notation text.
///
/// Yields one `NoteEvent` per note or rest. Commands only change the state
/// applied to the following notes. After the first error the iterator is
/// exhausted.
pub struct Notation<'a> {
    bytes: &'a [u8],
    position: usize,
    state: PlaybackState,
    failed: bool,
}

impl<'a> Notation<'a> {
    #[must_use]
    pub fn new(notes: &'a str) -> Self {
        Self {
            bytes: notes.as_bytes(),
            position: 0,
            state: PlaybackState::default(),
            failed: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.position).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, |b| b.is_ascii_whitespace()) {
            self.position += 1;
        }
    }

    /// Read a decimal number, saturating on overflow.
    fn number(&mut self) -> Option<u32> {
        let start = self.position;
        let mut value: u32 = 0;
        while let Some(digit) = self.peek().filter(u8::is_ascii_digit) {
            value = value
                .saturating_mul(10)
                .saturating_add(u32::from(digit - b'0'));
            self.position += 1;
        }
        if self.position == start {
            None
        } else {
            Some(value)
        }
    }

    fn command_value(&mut self, start: usize) -> Result<u32, Error> {
        self.number().ok_or(Error {
            position: start,
            kind: ErrorKind::MissingValue,
        })
    }

    fn command(&mut self, command: u8, start: usize) -> Result<(), Error> {
        let error = |kind| Error {
            position: start,
            kind,
        };
        match command {
            b'O' => {
                let octave = self.command_value(start)?;
                if !in_range(octave, OCTAVE_RANGE.0.into(), OCTAVE_RANGE.1.into()) {
                    return Err(error(ErrorKind::OctaveOutOfRange));
                }
                self.state.octave = octave as u8;
            }
            b'T' => {
                let tempo = self.command_value(start)?;
                if !in_range(tempo, TEMPO_RANGE.0.into(), TEMPO_RANGE.1.into()) {
                    return Err(error(ErrorKind::TempoOutOfRange));
                }
                self.state.tempo = tempo as u16;
            }
            b'V' => {
                let volume = self.command_value(start)?;
                if !in_range(volume, VOLUME_RANGE.0.into(), VOLUME_RANGE.1.into()) {
                    return Err(error(ErrorKind::VolumeOutOfRange));
                }
                self.state.volume = volume as u8;
            }
            b'!' => {
                self.state = PlaybackState::default();
            }
            other => return Err(error(ErrorKind::UnexpectedCharacter(other))),
        }
        Ok(())
    }

    fn modifiers(&mut self, start: usize) -> Result<Modifiers, Error> {
        let error = |kind| Error {
            position: start,
            kind,
        };

        let mut modifiers = Modifiers::default();
        loop {
            match self.peek() {
                Some(b'+' | b'#') => {
                    if modifiers.accidental.replace(1).is_some() {
                        return Err(error(ErrorKind::DuplicateAccidental));
                    }
                    self.position += 1;
                }
                Some(b'-') => {
                    if modifiers.accidental.replace(-1).is_some() {
                        return Err(error(ErrorKind::DuplicateAccidental));
                    }
                    self.position += 1;
                }
                Some(b'>') => {
                    modifiers.octave_shift = modifiers.octave_shift.saturating_add(1);
                    self.position += 1;
                }
                Some(b'<') => {
                    modifiers.octave_shift = modifiers.octave_shift.saturating_sub(1);
                    self.position += 1;
                }
                Some(b) if b.is_ascii_digit() => {
                    let divisor = self.number().unwrap_or(DEFAULT_DIVISOR);
                    if !in_range(divisor, DIVISOR_RANGE.0, DIVISOR_RANGE.1) {
                        return Err(error(ErrorKind::DivisorOutOfRange));
                    }
                    if modifiers.divisor.replace(divisor).is_some() {
                        return Err(error(ErrorKind::DuplicateDivisor));
                    }
                }
                _ => return Ok(modifiers),
            }
        }
    }

    fn duration_ms(&self, divisor: u32) -> u32 {
        WHOLE_NOTE_MS / (u32::from(self.state.tempo) * divisor)
    }

    fn note(&mut self, semitone: i16, start: usize) -> Result<NoteEvent, Error> {
        let modifiers = self.modifiers(start)?;

        let octave = i16::from(self.state.octave).saturating_add(modifiers.octave_shift);
        if !(SHIFTED_OCTAVE_RANGE.0..=SHIFTED_OCTAVE_RANGE.1).contains(&octave) {
            return Err(Error {
                position: start,
                kind: ErrorKind::PitchOutOfRange,
            });
        }
        let pitch = octave * 12 + semitone + modifiers.accidental.unwrap_or(0);

        let duration_ms = self.duration_ms(modifiers.divisor.unwrap_or(DEFAULT_DIVISOR));
        Ok(NoteEvent::tone(pitch, duration_ms, self.state.volume))
    }

    fn rest(&mut self, start: usize) -> Result<NoteEvent, Error> {
        let modifiers = self.modifiers(start)?;
        if modifiers.accidental.is_some() || modifiers.octave_shift != 0 {
            return Err(Error {
                position: start,
                kind: ErrorKind::ModifierOnRest,
            });
        }
        let duration_ms = self.duration_ms(modifiers.divisor.unwrap_or(DEFAULT_DIVISOR));
        Ok(NoteEvent::rest(duration_ms, self.state.volume))
    }
}

impl Iterator for Notation<'_> {
    type Item = Result<NoteEvent, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            self.skip_whitespace();
            let start = self.position;
            let token = self.peek()?.to_ascii_uppercase();
            self.position += 1;

            let result = match token {
                b'A'..=b'G' | b'R' => {
                    let event = match semitone(token) {
                        Some(semitone) => self.note(semitone, start),
                        None => self.rest(start),
                    };
                    Some(event)
                }
                _ => self.command(token, start).err().map(Err),
            };

            if let Some(result) = result {
                self.failed = result.is_err();
                return Some(result);
            }
        }
    }
}

#[derive(Default)]
struct Modifiers {
    accidental: Option<i16>,
    octave_shift: i16,
    divisor: Option<u32>,
}

fn semitone(letter: u8) -> Option<i16> {
    match letter {
        b'C' => Some(0),
        b'D' => Some(2),
        b'E' => Some(4),
        b'F' => Some(5),
        b'G' => Some(7),
        b'A' => Some(9),
        b'B' => Some(11),
        _ => None,
    }
}

fn in_range(value: u32, min: u32, max: u32) -> bool {
    (min..=max).contains(&value)
}

/// Compile the whole notation text at once.
///
/// Either all events are returned, or none of them.
///
/// # Errors
///
/// Fails on the first malformed token, or with `TooManyEvents` when the
/// text holds more than `N` notes and rests.
pub fn compile<const N: usize>(notes: &str) -> Result<Vec<NoteEvent, N>, Error> {
    let mut events = Vec::new();
    let mut notation = Notation::new(notes);
    #[allow(clippy::while_let_on_iterator)]
    while let Some(event) = notation.next() {
        if events.push(event?).is_err() {
            return Err(Error {
                position: notation.position,
                kind: ErrorKind::TooManyEvents,
            });
        }
    }
    Ok(events)
}
