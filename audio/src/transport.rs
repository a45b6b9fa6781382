//! Hardware side of audio playback.
//!
//! The player only decides what to play and when. Producing the actual
//! samples, streaming files from storage, and driving I2S is done by an
//! implementation of [`Transport`] provided by the firmware.

pub trait Transport {
    /// Start sounding the given pitch. It should keep sounding until the
    /// next call on the transport, `duration_ms` is informative.
    fn emit_tone(&mut self, pitch: i16, duration_ms: u32, volume: u8);

    /// Keep the output silent for the given duration.
    fn emit_silence(&mut self, duration_ms: u32);

    /// Whether the sound file exists and storage is ready, without touching
    /// the output.
    fn file_available(&mut self, path: &str) -> bool;

    /// Start streaming a sound file. Returns `false` if the file cannot be
    /// opened or storage is not available.
    fn start_file(&mut self, path: &str) -> bool;

    /// Halt whatever is being played.
    fn stop_transport(&mut self);

    /// Whether a started file is still being streamed.
    fn transport_busy(&self) -> bool;

    /// Volume of file playback, 0-10. Notes carry their own volume.
    fn set_file_volume(&mut self, volume: u8);
}
