//! Backend stream abstractions

use std::io::Write;

use crate::error::Result;
use crate::types::{AudioConfigBase, PresentationPosition};

/// Operations common to playback and capture streams.
pub trait StreamHal: Send + Sync {
    /// Sample rate, channel mask and format the stream actually runs at.
    fn audio_properties(&self) -> Result<AudioConfigBase>;

    /// Size in bytes of one I/O period.
    fn buffer_size(&self) -> Result<usize>;

    /// Release hardware resources until the next read/write.
    fn standby(&self) -> Result<()>;

    /// Write human-readable diagnostic state to `out`.
    fn dump(&self, out: &mut dyn Write) -> Result<()>;

    /// Apply `key=value;key=value` parameters.
    fn set_parameters(&self, kv_pairs: &str) -> Result<()>;

    /// Look up `;`-separated `keys`, answering in `key=value;…` form.
    fn parameters(&self, keys: &str) -> Result<String>;
}

/// A playback stream.
pub trait StreamOutHal: StreamHal {
    /// Estimated output latency in milliseconds.
    fn latency(&self) -> Result<u32>;

    /// Per-channel software volume, `0.0..=1.0`.
    fn set_volume(&self, left: f32, right: f32) -> Result<()>;

    /// Write interleaved frames, returning how many bytes were consumed.
    ///
    /// May consume fewer bytes than offered. Blocks as the backend decides.
    fn write(&self, buffer: &[u8]) -> Result<usize>;

    /// Frames rendered by the DSP since the last standby.
    fn render_position(&self) -> Result<u32>;

    /// Frames presented and the monotonic time of the measurement.
    fn presentation_position(&self) -> Result<PresentationPosition>;

    /// Local time in microseconds at which the next write is rendered.
    fn next_write_timestamp(&self) -> Result<i64>;
}

/// A capture stream.
pub trait StreamInHal: StreamHal {
    /// Input gain, `0.0..=1.0`.
    fn set_gain(&self, gain: f32) -> Result<()>;

    /// Read interleaved frames into `buffer`, returning how many bytes were filled.
    fn read(&self, buffer: &mut [u8]) -> Result<usize>;

    /// Frames dropped to overrun since the previous call.
    fn input_frames_lost(&self) -> Result<u32>;
}
