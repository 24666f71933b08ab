//! Device record: one per opened legacy device.

use std::io::Write;
use std::sync::Arc;

use hal::{
    AudioConfig, AudioMode, AudioSource, DeviceHal, DeviceType, HalError, InputFlags, IoHandle,
    OutputFlags, PatchHandle, PortConfig, Result,
};

use crate::stream::{AudioStreamIn, AudioStreamOut, Stream};

/// Adapter record around a backend device.
///
/// Every method is a single forwarding call. Stream opens additionally write
/// the negotiated configuration back into the caller's request.
pub struct AudioHwDevice {
    hal: Arc<dyn DeviceHal>,
}

impl AudioHwDevice {
    /// Wrap a backend device.
    pub fn new(hal: Arc<dyn DeviceHal>) -> Self {
        Self { hal }
    }

    /// The backend device.
    pub fn hal(&self) -> &Arc<dyn DeviceHal> {
        &self.hal
    }

    /// Backend initialisation status.
    pub fn init_check(&self) -> Result<()> {
        tracing::trace!("init_check");
        self.hal.init_check()
    }

    /// In-call voice volume.
    pub fn set_voice_volume(&self, volume: f32) -> Result<()> {
        tracing::trace!(volume, "set_voice_volume");
        self.hal.set_voice_volume(volume)
    }

    /// Master volume.
    pub fn set_master_volume(&self, volume: f32) -> Result<()> {
        tracing::trace!(volume, "set_master_volume");
        self.hal.set_master_volume(volume)
    }

    /// Current master volume.
    pub fn master_volume(&self) -> Result<f32> {
        let volume = self.hal.master_volume();
        tracing::trace!(volume = volume.as_ref().copied().unwrap_or(0.0), "get_master_volume");
        volume
    }

    /// Master mute.
    pub fn set_master_mute(&self, muted: bool) -> Result<()> {
        tracing::trace!(muted, "set_master_mute");
        self.hal.set_master_mute(muted)
    }

    /// Current master mute state.
    pub fn master_mute(&self) -> Result<bool> {
        let muted = self.hal.master_mute();
        tracing::trace!(muted = muted.as_ref().copied().unwrap_or(false), "get_master_mute");
        muted
    }

    /// Audio mode.
    pub fn set_mode(&self, mode: AudioMode) -> Result<()> {
        tracing::trace!(mode = mode.0, "set_mode");
        self.hal.set_mode(mode)
    }

    /// Microphone mute.
    pub fn set_mic_mute(&self, muted: bool) -> Result<()> {
        tracing::trace!(muted, "set_mic_mute");
        self.hal.set_mic_mute(muted)
    }

    /// Current microphone mute state.
    pub fn mic_mute(&self) -> Result<bool> {
        tracing::trace!("get_mic_mute");
        self.hal.mic_mute()
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

    /// Capture buffer size for `config`, `0` on failure.
    pub fn input_buffer_size(&self, config: &AudioConfig) -> usize {
        let size = self.hal.input_buffer_size(config).unwrap_or_else(|err| {
            tracing::warn!(%err, "input buffer size query failed");
            0
        });
        tracing::trace!(size, "get_input_buffer_size");
        size
    }

    /// Open a playback stream and report the negotiated configuration in `config`.
    ///
    /// Any backend failure is reported as [`HalError::InvalidArgument`].
    pub fn open_output_stream(
        &self,
        handle: IoHandle,
        devices: DeviceType,
        flags: OutputFlags,
        config: &mut AudioConfig,
        address: &str,
    ) -> Result<AudioStreamOut> {
        tracing::trace!(handle = handle.0, devices = devices.0, flags = flags.0, "open_output_stream");
        let hal = self
            .hal
            .open_output_stream(handle, devices, flags, config, address)
            .map_err(|err| {
                tracing::error!(%err, status = err.to_status(), "backend open_output_stream failed");
                HalError::InvalidArgument
            })?;
        let stream = Stream::new(hal);
        config.apply(stream.properties());
        tracing::info!(
            channel_mask = config.channel_mask.0,
            rate = config.sample_rate,
            format = config.format.0,
            "open_output_stream selects"
        );
        Ok(stream)
    }

    /// Release a playback stream.
    pub fn close_output_stream(&self, stream: AudioStreamOut) {
        tracing::trace!("close_output_stream");
        drop(stream);
    }

    /// Open a capture stream and report the negotiated configuration in `config`.
    ///
    /// Backend failures are passed through unchanged.
    pub fn open_input_stream(
        &self,
        handle: IoHandle,
        devices: DeviceType,
        config: &mut AudioConfig,
        flags: InputFlags,
        address: &str,
        source: AudioSource,
    ) -> Result<AudioStreamIn> {
        tracing::trace!(
            handle = handle.0,
            devices = devices.0,
            flags = flags.0,
            source = source.0,
            "open_input_stream"
        );
        let hal = self
            .hal
            .open_input_stream(handle, devices, config, flags, address, source)
            .map_err(|err| {
                tracing::error!(%err, status = err.to_status(), "backend open_input_stream failed");
                err
            })?;
        let stream = Stream::new(hal);
        config.apply(stream.properties());
        tracing::info!(
            channel_mask = config.channel_mask.0,
            rate = config.sample_rate,
            format = config.format.0,
            "open_input_stream selects"
        );
        Ok(stream)
    }

    /// Release a capture stream.
    pub fn close_input_stream(&self, stream: AudioStreamIn) {
        tracing::trace!("close_input_stream");
        drop(stream);
    }

    /// Create or update a routing patch.
    pub fn create_audio_patch(
        &self,
        sources: &[PortConfig],
        sinks: &[PortConfig],
        handle: PatchHandle,
    ) -> Result<PatchHandle> {
        tracing::trace!(
            sources = sources.len(),
            sinks = sinks.len(),
            handle = handle.0,
            "create_audio_patch"
        );
        self.hal.create_audio_patch(sources, sinks, handle)
    }

    /// Tear down a routing patch.
    pub fn release_audio_patch(&self, handle: PatchHandle) -> Result<()> {
        tracing::trace!(handle = handle.0, "release_audio_patch");
        self.hal.release_audio_patch(handle)
    }

    /// Write the backend's diagnostic state to `out`.
    pub fn dump(&self, out: &mut dyn Write) -> Result<()> {
        tracing::trace!("dump");
        self.hal.dump(out, &[])
    }
}

impl Drop for AudioHwDevice {
    fn drop(&mut self) {
        tracing::trace!("close device");
    }
}
