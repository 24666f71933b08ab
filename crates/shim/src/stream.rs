//! Stream records: one per opened legacy stream.
//!
//! A record owns the only adapter-side reference to its backend stream. The
//! backend stream is released when the record is dropped, which the C surface
//! does exactly once, on close.
//!
//! Getters that the legacy ABI declares as plain values (`u32`, `size_t`)
//! cannot report failure; they answer `0` / the empty value when the backend
//! fails, and log the failure.

use std::io::Write;
use std::sync::Arc;

use hal::{
    AudioConfigBase, AudioFormat, ChannelMask, EffectHandle, HalError, PresentationPosition,
    Result, StreamHal, StreamInHal, StreamOutHal,
};

/// Adapter record around a backend stream.
pub struct Stream<S: ?Sized> {
    hal: Arc<S>,
}

/// Playback stream record.
pub type AudioStreamOut = Stream<dyn StreamOutHal>;
/// Capture stream record.
pub type AudioStreamIn = Stream<dyn StreamInHal>;

impl<S: StreamHal + ?Sized> Stream<S> {
    /// Wrap a backend stream.
    pub fn new(hal: Arc<S>) -> Self {
        Self { hal }
    }

    /// The backend stream.
    pub fn hal(&self) -> &Arc<S> {
        &self.hal
    }

    /// Sample rate, channel mask and format as the backend reports them.
    ///
    /// All-zero when the backend fails.
    pub fn properties(&self) -> AudioConfigBase {
        self.hal.audio_properties().unwrap_or_else(|err| {
            tracing::warn!(%err, "stream audio properties query failed");
            AudioConfigBase::default()
        })
    }

    /// Current sample rate, `0` on failure.
    pub fn sample_rate(&self) -> u32 {
        let rate = self.properties().sample_rate;
        tracing::trace!(rate, "get_sample_rate");
        rate
    }

    /// Sample rate is fixed at open.
    pub fn set_sample_rate(&self, rate: u32) -> Result<()> {
        tracing::trace!(rate, "set_sample_rate");
        Err(HalError::NotImplemented)
    }

    /// Current channel mask, [`ChannelMask::NONE`] on failure.
    pub fn channel_mask(&self) -> ChannelMask {
        let mask = self.properties().channel_mask;
        tracing::trace!(mask = mask.0, "get_channels");
        mask
    }

    /// Channel mask is fixed at open.
    pub fn set_channel_mask(&self, mask: ChannelMask) -> Result<()> {
        tracing::trace!(mask = mask.0, "set_channels");
        Err(HalError::NotImplemented)
    }

    /// Current sample format, [`AudioFormat::DEFAULT`] on failure.
    pub fn format(&self) -> AudioFormat {
        let format = self.properties().format;
        tracing::trace!(format = format.0, "get_format");
        format
    }

    /// Sample format is fixed at open.
    pub fn set_format(&self, format: AudioFormat) -> Result<()> {
        tracing::trace!(format = format.0, "set_format");
        Err(HalError::NotImplemented)
    }

    /// Period size in bytes, `0` on failure.
    pub fn buffer_size(&self) -> usize {
        let size = self.hal.buffer_size().unwrap_or_else(|err| {
            tracing::warn!(%err, "stream buffer size query failed");
            0
        });
        tracing::trace!(size, "get_buffer_size");
        size
    }

    /// Put the stream into standby.
    pub fn standby(&self) -> Result<()> {
        tracing::trace!("standby");
        self.hal.standby()
    }

    /// Write the backend's diagnostic state to `out`.
    pub fn dump(&self, out: &mut dyn Write) -> Result<()> {
        tracing::trace!("dump");
        self.hal.dump(out)
    }

    /// Forward `key=value;…` parameters.
    pub fn set_parameters(&self, kv_pairs: &str) -> Result<()> {
        tracing::trace!(kv_pairs, "set_parameters");
        self.hal.set_parameters(kv_pairs)
    }

    /// Query parameters for the `;`-separated `keys`.
    pub fn parameters(&self, keys: &str) -> Result<String> {
        tracing::trace!(keys, "get_parameters");
        self.hal.parameters(keys)
    }

    /// Effects are not attached through this adapter.
    pub fn add_audio_effect(&self, effect: EffectHandle) -> Result<()> {
        tracing::trace!(effect = effect.0, "add_audio_effect");
        Err(HalError::Unsupported)
    }

    /// Effects are not attached through this adapter.
    pub fn remove_audio_effect(&self, effect: EffectHandle) -> Result<()> {
        tracing::trace!(effect = effect.0, "remove_audio_effect");
        Err(HalError::Unsupported)
    }
}

/// A successful transfer never reports more than it was offered.
fn check_transfer(op: &'static str, offered: usize, moved: usize) -> Result<usize> {
    if moved > offered {
        tracing::error!(op, offered, moved, "backend reported an oversized transfer");
        return Err(HalError::InvalidOperation);
    }
    Ok(moved)
}

impl Stream<dyn StreamOutHal> {
    /// Output latency in milliseconds, `0` on failure.
    pub fn latency(&self) -> u32 {
        let latency = self.hal.latency().unwrap_or_else(|err| {
            tracing::warn!(%err, "output latency query failed");
            0
        });
        tracing::trace!(latency, "get_latency");
        latency
    }

    /// Per-channel volume.
    pub fn set_volume(&self, left: f32, right: f32) -> Result<()> {
        tracing::trace!(left, right, "set_volume");
        self.hal.set_volume(left, right)
    }

    /// Write interleaved frames; bytes consumed, never a partial count on failure.
    pub fn write(&self, buffer: &[u8]) -> Result<usize> {
        tracing::trace!(bytes = buffer.len(), "write");
        let written = self.hal.write(buffer).map_err(|err| {
            tracing::debug!(%err, "write failed");
            err
        })?;
        check_transfer("write", buffer.len(), written)
    }

    /// DSP frames rendered since the last standby.
    pub fn render_position(&self) -> Result<u32> {
        let position = self.hal.render_position();
        tracing::trace!(dsp_frames = position.as_ref().copied().unwrap_or(0), "get_render_position");
        position
    }

    /// Frames presented plus their monotonic timestamp.
    pub fn presentation_position(&self) -> Result<PresentationPosition> {
        let position = self.hal.presentation_position();
        tracing::trace!(
            frames = position.as_ref().map_or(0, |p| p.frames),
            "get_presentation_position"
        );
        position
    }

    /// Time the next write will be presented, in microseconds.
    pub fn next_write_timestamp(&self) -> Result<i64> {
        let timestamp = self.hal.next_write_timestamp();
        tracing::trace!(
            timestamp = timestamp.as_ref().copied().unwrap_or(0),
            "get_next_write_timestamp"
        );
        timestamp
    }
}

impl Stream<dyn StreamInHal> {
    /// Input gain.
    pub fn set_gain(&self, gain: f32) -> Result<()> {
        tracing::trace!(gain, "set_gain");
        self.hal.set_gain(gain)
    }

    /// Read interleaved frames; bytes filled, never a partial count on failure.
    pub fn read(&self, buffer: &mut [u8]) -> Result<usize> {
        let offered = buffer.len();
        tracing::trace!(bytes = offered, "read");
        let filled = self.hal.read(buffer).map_err(|err| {
            tracing::debug!(%err, "read failed");
            err
        })?;
        check_transfer("read", offered, filled)
    }

    /// Frames lost to overrun since the previous call, `0` on failure.
    pub fn input_frames_lost(&self) -> u32 {
        let lost = self.hal.input_frames_lost().unwrap_or_else(|err| {
            tracing::warn!(%err, "input frames lost query failed");
            0
        });
        tracing::trace!(lost, "get_input_frames_lost");
        lost
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use hal::null::NullDevicesFactory;
    use hal::{AudioConfig, DeviceType, DevicesFactoryHal, IoHandle, OutputFlags};

    fn null_output() -> AudioStreamOut {
        let device = NullDevicesFactory::new().open_device("primary").unwrap();
        let mut config = AudioConfig::default();
        let hal = device
            .open_output_stream(IoHandle(1), DeviceType::OUT_SPEAKER, OutputFlags::NONE, &mut config, "")
            .unwrap();
        Stream::new(hal)
    }

    #[test]
    fn setters_are_not_implemented() {
        let out = null_output();
        assert_eq!(out.set_sample_rate(44_100), Err(HalError::NotImplemented));
        assert_eq!(out.set_format(AudioFormat::PCM_FLOAT), Err(HalError::NotImplemented));
        assert_eq!(out.set_channel_mask(ChannelMask::OUT_MONO), Err(HalError::NotImplemented));
    }

    #[test]
    fn effects_are_unsupported() {
        let out = null_output();
        assert_eq!(out.add_audio_effect(EffectHandle(0x1000)), Err(HalError::Unsupported));
        assert_eq!(out.remove_audio_effect(EffectHandle(0x1000)), Err(HalError::Unsupported));
    }

    #[test]
    fn oversized_transfer_is_rejected() {
        assert_eq!(check_transfer("write", 4, 8), Err(HalError::InvalidOperation));
        assert_eq!(check_transfer("write", 8, 4), Ok(4));
    }
}
