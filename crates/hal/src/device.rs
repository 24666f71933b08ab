//! Backend device abstraction

use std::io::Write;
use std::sync::Arc;

use crate::error::Result;
use crate::stream::{StreamInHal, StreamOutHal};
use crate::types::{
    AudioConfig, AudioMode, AudioSource, DeviceType, InputFlags, IoHandle, OutputFlags,
    PatchHandle, PortConfig,
};

/// A backend audio device (one hardware module).
///
/// Methods take `&self`: the device is shared between the adapter record and
/// any streams it opened, and whatever locking the backend needs is its own
/// business. Calls block for as long as the backend blocks.
pub trait DeviceHal: Send + Sync {
    /// Report whether the backend finished initialising.
    fn init_check(&self) -> Result<()>;

    /// Set the in-call voice volume, `0.0..=1.0`.
    fn set_voice_volume(&self, volume: f32) -> Result<()>;

    /// Set the master volume applied to every output, `0.0..=1.0`.
    fn set_master_volume(&self, volume: f32) -> Result<()>;

    /// Current master volume.
    fn master_volume(&self) -> Result<f32>;

    /// Mute or unmute every output.
    fn set_master_mute(&self, muted: bool) -> Result<()>;

    /// Current master mute state.
    fn master_mute(&self) -> Result<bool>;

    /// Switch the audio mode (normal, ringtone, call, communication).
    fn set_mode(&self, mode: AudioMode) -> Result<()>;

    /// Mute or unmute the microphone.
    fn set_mic_mute(&self, muted: bool) -> Result<()>;

    /// Current microphone mute state.
    fn mic_mute(&self) -> Result<bool>;

    /// Apply `key=value;key=value` parameters.
    fn set_parameters(&self, kv_pairs: &str) -> Result<()>;

    /// Look up `;`-separated `keys`, answering in `key=value;…` form.
    fn parameters(&self, keys: &str) -> Result<String>;

    /// Capture buffer size in bytes for `config`.
    fn input_buffer_size(&self, config: &AudioConfig) -> Result<usize>;

    /// Open a playback stream.
    ///
    /// `config` carries the request in and may be updated with what the
    /// backend picked; callers must still read the stream's properties for the
    /// authoritative values.
    fn open_output_stream(
        &self,
        handle: IoHandle,
        devices: DeviceType,
        flags: OutputFlags,
        config: &mut AudioConfig,
        address: &str,
    ) -> Result<Arc<dyn StreamOutHal>>;

    /// Open a capture stream. See [`DeviceHal::open_output_stream`].
    fn open_input_stream(
        &self,
        handle: IoHandle,
        devices: DeviceType,
        config: &mut AudioConfig,
        flags: InputFlags,
        address: &str,
        source: AudioSource,
    ) -> Result<Arc<dyn StreamInHal>>;

    /// Create (or, if `handle` is live, update) a routing patch.
    ///
    /// Returns the handle of the patch, newly allocated when `handle` is
    /// [`PatchHandle::NONE`].
    fn create_audio_patch(
        &self,
        sources: &[PortConfig],
        sinks: &[PortConfig],
        handle: PatchHandle,
    ) -> Result<PatchHandle>;

    /// Tear down a routing patch.
    fn release_audio_patch(&self, handle: PatchHandle) -> Result<()>;

    /// Write human-readable diagnostic state to `out`.
    fn dump(&self, out: &mut dyn Write, args: &[String]) -> Result<()>;
}
