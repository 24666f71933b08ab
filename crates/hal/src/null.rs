//! Null backend: a complete in-process device with no hardware behind it.
//!
//! Output streams swallow every byte written and count frames; input streams
//! produce silence. Volumes, mute state, mode, parameters and patches are
//! remembered so that a host talking to the exported module sees a coherent
//! device. Nothing here sleeps: pacing is left to the caller.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::device::DeviceHal;
use crate::error::{HalError, Result};
use crate::factory::DevicesFactoryHal;
use crate::params::KeyValuePairs;
use crate::stream::{StreamHal, StreamInHal, StreamOutHal};
use crate::types::{
    AudioConfig, AudioConfigBase, AudioFormat, AudioMode, AudioSource, ChannelMask, DeviceType,
    InputFlags, IoHandle, OutputFlags, PatchHandle, PortConfig, PresentationPosition,
};

/// Sample rate picked when the request leaves it at `0`.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;
/// Period length used for buffer sizing, in milliseconds.
pub const PERIOD_MS: u32 = 20;
/// Periods of buffering reported as output latency.
const LATENCY_PERIODS: u32 = 2;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn check_unit_range(value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(HalError::InvalidArgument)
    }
}

/// `CLOCK_MONOTONIC` as a `Duration`.
pub fn monotonic_now() -> Duration {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: `ts` is a valid, writable timespec for the duration of the call.
    let rc = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
    if rc != 0 {
        return Duration::ZERO;
    }
    let secs = u64::try_from(ts.tv_sec).unwrap_or(0);
    let nanos = u32::try_from(ts.tv_nsec).unwrap_or(0);
    Duration::new(secs, nanos)
}

/// Fill the unset fields of a request with defaults and reject non-PCM formats.
///
/// On rejection `config` is left holding a supported suggestion.
fn negotiate(config: &mut AudioConfig, default_mask: ChannelMask) -> Result<AudioConfigBase> {
    if config.sample_rate == 0 {
        config.sample_rate = DEFAULT_SAMPLE_RATE;
    }
    if config.channel_mask == ChannelMask::NONE {
        config.channel_mask = default_mask;
    }
    if config.format == AudioFormat::DEFAULT {
        config.format = AudioFormat::PCM_16_BIT;
    }
    let base = config.base();
    if base.frame_size().is_none() {
        tracing::warn!(
            format = config.format.0,
            channel_mask = config.channel_mask.0,
            "null backend: unsupported stream config"
        );
        config.format = AudioFormat::PCM_16_BIT;
        config.channel_mask = default_mask;
        return Err(HalError::InvalidArgument);
    }
    Ok(base)
}

fn period_frames(config: &AudioConfig) -> u32 {
    if config.frame_count > 0 {
        config.frame_count
    } else {
        (config.sample_rate.saturating_mul(PERIOD_MS) / 1000).max(1)
    }
}

// ── Factory ──────────────────────────────────────────────────────────────────

/// Factory handing out [`NullDevice`]s for any module identifier.
#[derive(Debug, Default)]
pub struct NullDevicesFactory;

impl NullDevicesFactory {
    /// Create the factory.
    pub fn new() -> Self {
        Self
    }
}

impl DevicesFactoryHal for NullDevicesFactory {
    fn open_device(&self, module: &str) -> Result<Arc<dyn DeviceHal>> {
        if module.is_empty() {
            return Err(HalError::NotFound);
        }
        tracing::debug!(module, "null backend: opening device");
        Ok(Arc::new(NullDevice::new(module)))
    }
}

// ── Device ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Patch {
    sources: usize,
    sinks: usize,
}

#[derive(Debug)]
struct DeviceState {
    voice_volume: f32,
    master_volume: f32,
    master_mute: bool,
    mic_mute: bool,
    mode: AudioMode,
    parameters: KeyValuePairs,
    patches: BTreeMap<PatchHandle, Patch>,
    next_patch: i32,
}

/// In-process device with remembered state and no hardware.
#[derive(Debug)]
pub struct NullDevice {
    module: String,
    state: Mutex<DeviceState>,
}

impl NullDevice {
    /// Create a device for `module`.
    pub fn new(module: &str) -> Self {
        Self {
            module: module.to_owned(),
            state: Mutex::new(DeviceState {
                voice_volume: 1.0,
                master_volume: 1.0,
                master_mute: false,
                mic_mute: false,
                mode: AudioMode::NORMAL,
                parameters: KeyValuePairs::new(),
                patches: BTreeMap::new(),
                next_patch: 1,
            }),
        }
    }

    /// Module identifier this device was opened for.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Number of live patches.
    pub fn patch_count(&self) -> usize {
        lock(&self.state).patches.len()
    }
}

impl DeviceHal for NullDevice {
    fn init_check(&self) -> Result<()> {
        Ok(())
    }

    fn set_voice_volume(&self, volume: f32) -> Result<()> {
        check_unit_range(volume)?;
        lock(&self.state).voice_volume = volume;
        Ok(())
    }

    fn set_master_volume(&self, volume: f32) -> Result<()> {
        check_unit_range(volume)?;
        lock(&self.state).master_volume = volume;
        Ok(())
    }

    fn master_volume(&self) -> Result<f32> {
        Ok(lock(&self.state).master_volume)
    }

    fn set_master_mute(&self, muted: bool) -> Result<()> {
        lock(&self.state).master_mute = muted;
        Ok(())
    }

    fn master_mute(&self) -> Result<bool> {
        Ok(lock(&self.state).master_mute)
    }

    fn set_mode(&self, mode: AudioMode) -> Result<()> {
        if mode.0 < AudioMode::CURRENT.0 {
            return Err(HalError::InvalidArgument);
        }
        if mode != AudioMode::CURRENT {
            lock(&self.state).mode = mode;
        }
        Ok(())
    }

    fn set_mic_mute(&self, muted: bool) -> Result<()> {
        lock(&self.state).mic_mute = muted;
        Ok(())
    }

    fn mic_mute(&self) -> Result<bool> {
        Ok(lock(&self.state).mic_mute)
    }

    fn set_parameters(&self, kv_pairs: &str) -> Result<()> {
        lock(&self.state)
            .parameters
            .merge(KeyValuePairs::parse(kv_pairs));
        Ok(())
    }

    fn parameters(&self, keys: &str) -> Result<String> {
        Ok(lock(&self.state).parameters.subset(keys).to_string())
    }

    fn input_buffer_size(&self, config: &AudioConfig) -> Result<usize> {
        let mut request = *config;
        let base = negotiate(&mut request, ChannelMask::IN_MONO)?;
        let frames = usize::try_from(period_frames(&request)).map_err(|_| HalError::InvalidArgument)?;
        base.frame_size()
            .map(|size| size * frames)
            .ok_or(HalError::InvalidArgument)
    }

    fn open_output_stream(
        &self,
        handle: IoHandle,
        devices: DeviceType,
        flags: OutputFlags,
        config: &mut AudioConfig,
        _address: &str,
    ) -> Result<Arc<dyn StreamOutHal>> {
        let base = negotiate(config, ChannelMask::OUT_STEREO)?;
        tracing::debug!(
            handle = handle.0,
            devices = devices.0,
            flags = flags.0,
            sample_rate = base.sample_rate,
            "null backend: output stream opened"
        );
        Ok(Arc::new(NullStreamOut::new(base, period_frames(config))))
    }

    fn open_input_stream(
        &self,
        handle: IoHandle,
        devices: DeviceType,
        config: &mut AudioConfig,
        flags: InputFlags,
        _address: &str,
        source: AudioSource,
    ) -> Result<Arc<dyn StreamInHal>> {
        let base = negotiate(config, ChannelMask::IN_MONO)?;
        tracing::debug!(
            handle = handle.0,
            devices = devices.0,
            flags = flags.0,
            source = source.0,
            sample_rate = base.sample_rate,
            "null backend: input stream opened"
        );
        Ok(Arc::new(NullStreamIn::new(base, period_frames(config))))
    }

    fn create_audio_patch(
        &self,
        sources: &[PortConfig],
        sinks: &[PortConfig],
        handle: PatchHandle,
    ) -> Result<PatchHandle> {
        if sources.is_empty() || sinks.is_empty() {
            return Err(HalError::InvalidArgument);
        }
        let patch = Patch {
            sources: sources.len(),
            sinks: sinks.len(),
        };
        let mut state = lock(&self.state);
        if handle == PatchHandle::NONE {
            let handle = PatchHandle(state.next_patch);
            state.next_patch = state.next_patch.checked_add(1).unwrap_or(1);
            state.patches.insert(handle, patch);
            Ok(handle)
        } else if let Some(existing) = state.patches.get_mut(&handle) {
            *existing = patch;
            Ok(handle)
        } else {
            Err(HalError::InvalidArgument)
        }
    }

    fn release_audio_patch(&self, handle: PatchHandle) -> Result<()> {
        lock(&self.state)
            .patches
            .remove(&handle)
            .map(|_| ())
            .ok_or(HalError::InvalidArgument)
    }

    fn dump(&self, out: &mut dyn Write, _args: &[String]) -> Result<()> {
        let state = lock(&self.state);
        writeln!(out, "Null audio device '{}':", self.module)?;
        writeln!(out, "  mode: {}", state.mode.0)?;
        writeln!(out, "  voice volume: {:.3}", state.voice_volume)?;
        writeln!(
            out,
            "  master volume: {:.3} (muted: {})",
            state.master_volume, state.master_mute
        )?;
        writeln!(out, "  mic muted: {}", state.mic_mute)?;
        writeln!(out, "  parameters: {}", state.parameters)?;
        for (handle, patch) in &state.patches {
            writeln!(
                out,
                "  patch {}: {} source(s) -> {} sink(s)",
                handle.0, patch.sources, patch.sinks
            )?;
        }
        Ok(())
    }
}

// ── Streams ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct OutState {
    frames_presented: u64,
    frames_since_standby: u64,
    standby: bool,
    volume: (f32, f32),
    parameters: KeyValuePairs,
}

/// Output stream that counts and discards frames.
#[derive(Debug)]
pub struct NullStreamOut {
    config: AudioConfigBase,
    period_frames: u32,
    state: Mutex<OutState>,
}

impl NullStreamOut {
    fn new(config: AudioConfigBase, period_frames: u32) -> Self {
        Self {
            config,
            period_frames,
            state: Mutex::new(OutState {
                standby: true,
                volume: (1.0, 1.0),
                ..OutState::default()
            }),
        }
    }

    fn frame_size(&self) -> usize {
        self.config.frame_size().unwrap_or(1)
    }
}

impl StreamHal for NullStreamOut {
    fn audio_properties(&self) -> Result<AudioConfigBase> {
        Ok(self.config)
    }

    fn buffer_size(&self) -> Result<usize> {
        let frames = usize::try_from(self.period_frames).map_err(|_| HalError::InvalidOperation)?;
        Ok(frames * self.frame_size())
    }

    fn standby(&self) -> Result<()> {
        let mut state = lock(&self.state);
        state.standby = true;
        state.frames_since_standby = 0;
        Ok(())
    }

    fn dump(&self, out: &mut dyn Write) -> Result<()> {
        let state = lock(&self.state);
        writeln!(
            out,
            "Null output stream: {} Hz, mask {:#x}, format {:#x}",
            self.config.sample_rate, self.config.channel_mask.0, self.config.format.0
        )?;
        writeln!(
            out,
            "  standby: {}, frames presented: {}",
            state.standby, state.frames_presented
        )?;
        writeln!(out, "  volume: {:.3}/{:.3}", state.volume.0, state.volume.1)?;
        Ok(())
    }

    fn set_parameters(&self, kv_pairs: &str) -> Result<()> {
        lock(&self.state)
            .parameters
            .merge(KeyValuePairs::parse(kv_pairs));
        Ok(())
    }

    fn parameters(&self, keys: &str) -> Result<String> {
        Ok(lock(&self.state).parameters.subset(keys).to_string())
    }
}

impl StreamOutHal for NullStreamOut {
    fn latency(&self) -> Result<u32> {
        Ok(PERIOD_MS * LATENCY_PERIODS)
    }

    fn set_volume(&self, left: f32, right: f32) -> Result<()> {
        check_unit_range(left)?;
        check_unit_range(right)?;
        lock(&self.state).volume = (left, right);
        Ok(())
    }

    fn write(&self, buffer: &[u8]) -> Result<usize> {
        let frame_size = self.frame_size();
        let frames = u64::try_from(buffer.len() / frame_size).map_err(|_| HalError::InvalidArgument)?;
        let mut state = lock(&self.state);
        state.standby = false;
        state.frames_presented = state.frames_presented.saturating_add(frames);
        state.frames_since_standby = state.frames_since_standby.saturating_add(frames);
        Ok(buffer.len())
    }

    #[allow(clippy::cast_possible_truncation)] // DSP frame counter wraps at 32 bits
    fn render_position(&self) -> Result<u32> {
        Ok(lock(&self.state).frames_since_standby as u32)
    }

    fn presentation_position(&self) -> Result<PresentationPosition> {
        let frames = lock(&self.state).frames_presented;
        Ok(PresentationPosition {
            frames,
            timestamp: monotonic_now(),
        })
    }

    fn next_write_timestamp(&self) -> Result<i64> {
        Err(HalError::InvalidOperation)
    }
}

#[derive(Debug, Default)]
struct InState {
    frames_captured: u64,
    gain: f32,
    parameters: KeyValuePairs,
}

/// Input stream that produces silence.
#[derive(Debug)]
pub struct NullStreamIn {
    config: AudioConfigBase,
    period_frames: u32,
    state: Mutex<InState>,
}

impl NullStreamIn {
    fn new(config: AudioConfigBase, period_frames: u32) -> Self {
        Self {
            config,
            period_frames,
            state: Mutex::new(InState {
                gain: 1.0,
                ..InState::default()
            }),
        }
    }

    fn frame_size(&self) -> usize {
        self.config.frame_size().unwrap_or(1)
    }
}

impl StreamHal for NullStreamIn {
    fn audio_properties(&self) -> Result<AudioConfigBase> {
        Ok(self.config)
    }

    fn buffer_size(&self) -> Result<usize> {
        let frames = usize::try_from(self.period_frames).map_err(|_| HalError::InvalidOperation)?;
        Ok(frames * self.frame_size())
    }

    fn standby(&self) -> Result<()> {
        Ok(())
    }

    fn dump(&self, out: &mut dyn Write) -> Result<()> {
        let state = lock(&self.state);
        writeln!(
            out,
            "Null input stream: {} Hz, mask {:#x}, format {:#x}",
            self.config.sample_rate, self.config.channel_mask.0, self.config.format.0
        )?;
        writeln!(
            out,
            "  gain: {:.3}, frames captured: {}",
            state.gain, state.frames_captured
        )?;
        Ok(())
    }

    fn set_parameters(&self, kv_pairs: &str) -> Result<()> {
        lock(&self.state)
            .parameters
            .merge(KeyValuePairs::parse(kv_pairs));
        Ok(())
    }

    fn parameters(&self, keys: &str) -> Result<String> {
        Ok(lock(&self.state).parameters.subset(keys).to_string())
    }
}

impl StreamInHal for NullStreamIn {
    fn set_gain(&self, gain: f32) -> Result<()> {
        check_unit_range(gain)?;
        lock(&self.state).gain = gain;
        Ok(())
    }

    fn read(&self, buffer: &mut [u8]) -> Result<usize> {
        let whole = buffer.len() - buffer.len() % self.frame_size();
        let filled = buffer.get_mut(..whole).ok_or(HalError::InvalidArgument)?;
        filled.fill(0);
        let frames = u64::try_from(whole / self.frame_size()).map_err(|_| HalError::InvalidArgument)?;
        let mut state = lock(&self.state);
        state.frames_captured = state.frames_captured.saturating_add(frames);
        Ok(whole)
    }

    fn input_frames_lost(&self) -> Result<u32> {
        Ok(0)
    }
}
