//! Mock implementations for testing
//!
//! Recording fakes of every backend trait. Each mock logs the name of every
//! trait method it receives and can be told to fail with a fixed
//! [`HalError`], so the adapter's forwarding and status mapping can be
//! checked without a real backend.

#![cfg(any(test, feature = "mock"))]

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::*;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Call log plus an optional forced failure.
#[derive(Debug, Default)]
struct Recorder {
    calls: Mutex<Vec<&'static str>>,
    failure: Mutex<Option<HalError>>,
}

impl Recorder {
    fn hit(&self, name: &'static str) -> Result<()> {
        lock(&self.calls).push(name);
        match *lock(&self.failure) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn calls(&self) -> Vec<&'static str> {
        lock(&self.calls).clone()
    }

    fn count(&self, name: &str) -> usize {
        lock(&self.calls).iter().filter(|c| **c == name).count()
    }

    fn set_failure(&self, failure: Option<HalError>) {
        *lock(&self.failure) = failure;
    }
}

/// Configuration reported by mock streams unless a test overrides it.
pub const MOCK_STREAM_CONFIG: AudioConfigBase = AudioConfigBase {
    sample_rate: 44_100,
    channel_mask: ChannelMask::OUT_STEREO,
    format: AudioFormat::PCM_16_BIT,
};

// ── Factory ──────────────────────────────────────────────────────────────────

/// Mock factory that hands out one shared [`MockDevice`].
#[derive(Debug)]
pub struct MockDevicesFactory {
    device: Arc<MockDevice>,
    opened: Mutex<Vec<String>>,
    failure: Mutex<Option<HalError>>,
}

impl MockDevicesFactory {
    /// Create a factory around a fresh [`MockDevice`].
    pub fn new() -> Self {
        Self {
            device: Arc::new(MockDevice::new()),
            opened: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    /// Make every subsequent `open_device` fail with `err`.
    pub fn fail_open(&self, err: HalError) {
        *lock(&self.failure) = Some(err);
    }

    /// The device every successful open returns.
    pub fn device(&self) -> Arc<MockDevice> {
        Arc::clone(&self.device)
    }

    /// Module identifiers passed to `open_device`, in call order.
    pub fn opened_modules(&self) -> Vec<String> {
        lock(&self.opened).clone()
    }
}

impl Default for MockDevicesFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl DevicesFactoryHal for MockDevicesFactory {
    fn open_device(&self, module: &str) -> Result<Arc<dyn DeviceHal>> {
        lock(&self.opened).push(module.to_owned());
        if let Some(err) = *lock(&self.failure) {
            return Err(err);
        }
        let device: Arc<dyn DeviceHal> = self.device.clone();
        Ok(device)
    }
}

// ── Device ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct DeviceValues {
    voice_volume: f32,
    master_volume: f32,
    master_mute: bool,
    mic_mute: bool,
    mode: AudioMode,
    last_kv_pairs: Option<String>,
    last_keys: Option<String>,
    parameters_reply: String,
    input_buffer_size: usize,
    stream_config: AudioConfigBase,
    last_open_request: Option<AudioConfig>,
    last_open_address: Option<String>,
    last_patch: Option<(Vec<PortConfig>, Vec<PortConfig>, PatchHandle)>,
    released_patches: Vec<PatchHandle>,
    dump_args: Vec<String>,
}

/// Mock device recording every call.
#[derive(Debug)]
pub struct MockDevice {
    recorder: Recorder,
    values: Mutex<DeviceValues>,
    output: Mutex<Weak<MockStreamOut>>,
    input: Mutex<Weak<MockStreamIn>>,
    outputs_released: Arc<AtomicUsize>,
    inputs_released: Arc<AtomicUsize>,
}

impl MockDevice {
    /// Create a device with unit volumes and [`MOCK_STREAM_CONFIG`] streams.
    pub fn new() -> Self {
        Self {
            recorder: Recorder::default(),
            values: Mutex::new(DeviceValues {
                voice_volume: 1.0,
                master_volume: 1.0,
                master_mute: false,
                mic_mute: false,
                mode: AudioMode::NORMAL,
                last_kv_pairs: None,
                last_keys: None,
                parameters_reply: String::new(),
                input_buffer_size: 4096,
                stream_config: MOCK_STREAM_CONFIG,
                last_open_request: None,
                last_open_address: None,
                last_patch: None,
                released_patches: Vec::new(),
                dump_args: Vec::new(),
            }),
            output: Mutex::new(Weak::new()),
            input: Mutex::new(Weak::new()),
            outputs_released: Arc::new(AtomicUsize::new(0)),
            inputs_released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Method names received, in call order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.recorder.calls()
    }

    /// How many times `name` was called.
    pub fn call_count(&self, name: &str) -> usize {
        self.recorder.count(name)
    }

    /// Make every subsequent device call fail with `failure`, or succeed with `None`.
    pub fn set_failure(&self, failure: Option<HalError>) {
        self.recorder.set_failure(failure);
    }

    /// Configuration the next opened stream negotiates to.
    pub fn set_stream_config(&self, config: AudioConfigBase) {
        lock(&self.values).stream_config = config;
    }

    /// Reply returned from `parameters`.
    pub fn set_parameters_reply(&self, reply: &str) {
        reply.clone_into(&mut lock(&self.values).parameters_reply);
    }

    /// Value returned from `input_buffer_size`.
    pub fn set_input_buffer_size(&self, size: usize) {
        lock(&self.values).input_buffer_size = size;
    }

    /// Last voice volume set.
    pub fn voice_volume(&self) -> f32 {
        lock(&self.values).voice_volume
    }

    /// Last mode set.
    pub fn mode(&self) -> AudioMode {
        lock(&self.values).mode
    }

    /// Last string given to `set_parameters`.
    pub fn last_kv_pairs(&self) -> Option<String> {
        lock(&self.values).last_kv_pairs.clone()
    }

    /// Last key list given to `parameters`.
    pub fn last_keys(&self) -> Option<String> {
        lock(&self.values).last_keys.clone()
    }

    /// Configuration as received by the last stream open, before negotiation.
    pub fn last_open_request(&self) -> Option<AudioConfig> {
        lock(&self.values).last_open_request
    }

    /// Address given to the last stream open.
    pub fn last_open_address(&self) -> Option<String> {
        lock(&self.values).last_open_address.clone()
    }

    /// Sources, sinks and handle of the last `create_audio_patch`.
    pub fn last_patch(&self) -> Option<(Vec<PortConfig>, Vec<PortConfig>, PatchHandle)> {
        lock(&self.values).last_patch.clone()
    }

    /// Handles passed to `release_audio_patch`.
    pub fn released_patches(&self) -> Vec<PatchHandle> {
        lock(&self.values).released_patches.clone()
    }

    /// Arguments of the last `dump`.
    pub fn dump_args(&self) -> Vec<String> {
        lock(&self.values).dump_args.clone()
    }

    /// Most recently opened output stream, if something still holds it.
    pub fn last_output(&self) -> Option<Arc<MockStreamOut>> {
        lock(&self.output).upgrade()
    }

    /// Most recently opened input stream, if something still holds it.
    pub fn last_input(&self) -> Option<Arc<MockStreamIn>> {
        lock(&self.input).upgrade()
    }

    /// Output streams dropped so far.
    pub fn outputs_released(&self) -> usize {
        self.outputs_released.load(Ordering::SeqCst)
    }

    /// Input streams dropped so far.
    pub fn inputs_released(&self) -> usize {
        self.inputs_released.load(Ordering::SeqCst)
    }

    fn negotiate(&self, config: &mut AudioConfig, address: &str) -> AudioConfigBase {
        let mut values = lock(&self.values);
        values.last_open_request = Some(*config);
        values.last_open_address = Some(address.to_owned());
        config.apply(values.stream_config);
        values.stream_config
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceHal for MockDevice {
    fn init_check(&self) -> Result<()> {
        self.recorder.hit("init_check")
    }

    fn set_voice_volume(&self, volume: f32) -> Result<()> {
        self.recorder.hit("set_voice_volume")?;
        lock(&self.values).voice_volume = volume;
        Ok(())
    }

    fn set_master_volume(&self, volume: f32) -> Result<()> {
        self.recorder.hit("set_master_volume")?;
        lock(&self.values).master_volume = volume;
        Ok(())
    }

    fn master_volume(&self) -> Result<f32> {
        self.recorder.hit("master_volume")?;
        Ok(lock(&self.values).master_volume)
    }

    fn set_master_mute(&self, muted: bool) -> Result<()> {
        self.recorder.hit("set_master_mute")?;
        lock(&self.values).master_mute = muted;
        Ok(())
    }

    fn master_mute(&self) -> Result<bool> {
        self.recorder.hit("master_mute")?;
        Ok(lock(&self.values).master_mute)
    }

    fn set_mode(&self, mode: AudioMode) -> Result<()> {
        self.recorder.hit("set_mode")?;
        lock(&self.values).mode = mode;
        Ok(())
    }

    fn set_mic_mute(&self, muted: bool) -> Result<()> {
        self.recorder.hit("set_mic_mute")?;
        lock(&self.values).mic_mute = muted;
        Ok(())
    }

    fn mic_mute(&self) -> Result<bool> {
        self.recorder.hit("mic_mute")?;
        Ok(lock(&self.values).mic_mute)
    }

    fn set_parameters(&self, kv_pairs: &str) -> Result<()> {
        self.recorder.hit("set_parameters")?;
        lock(&self.values).last_kv_pairs = Some(kv_pairs.to_owned());
        Ok(())
    }

    fn parameters(&self, keys: &str) -> Result<String> {
        self.recorder.hit("parameters")?;
        let mut values = lock(&self.values);
        values.last_keys = Some(keys.to_owned());
        Ok(values.parameters_reply.clone())
    }

    fn input_buffer_size(&self, _config: &AudioConfig) -> Result<usize> {
        self.recorder.hit("input_buffer_size")?;
        Ok(lock(&self.values).input_buffer_size)
    }

    fn open_output_stream(
        &self,
        _handle: IoHandle,
        _devices: DeviceType,
        _flags: OutputFlags,
        config: &mut AudioConfig,
        address: &str,
    ) -> Result<Arc<dyn StreamOutHal>> {
        self.recorder.hit("open_output_stream")?;
        let negotiated = self.negotiate(config, address);
        let stream = Arc::new(MockStreamOut::new(
            negotiated,
            Arc::clone(&self.outputs_released),
        ));
        *lock(&self.output) = Arc::downgrade(&stream);
        Ok(stream)
    }

    fn open_input_stream(
        &self,
        _handle: IoHandle,
        _devices: DeviceType,
        config: &mut AudioConfig,
        _flags: InputFlags,
        address: &str,
        _source: AudioSource,
    ) -> Result<Arc<dyn StreamInHal>> {
        self.recorder.hit("open_input_stream")?;
        let negotiated = self.negotiate(config, address);
        let stream = Arc::new(MockStreamIn::new(
            negotiated,
            Arc::clone(&self.inputs_released),
        ));
        *lock(&self.input) = Arc::downgrade(&stream);
        Ok(stream)
    }

    fn create_audio_patch(
        &self,
        sources: &[PortConfig],
        sinks: &[PortConfig],
        handle: PatchHandle,
    ) -> Result<PatchHandle> {
        self.recorder.hit("create_audio_patch")?;
        lock(&self.values).last_patch = Some((sources.to_vec(), sinks.to_vec(), handle));
        if handle == PatchHandle::NONE {
            Ok(PatchHandle(7))
        } else {
            Ok(handle)
        }
    }

    fn release_audio_patch(&self, handle: PatchHandle) -> Result<()> {
        self.recorder.hit("release_audio_patch")?;
        lock(&self.values).released_patches.push(handle);
        Ok(())
    }

    fn dump(&self, out: &mut dyn Write, args: &[String]) -> Result<()> {
        self.recorder.hit("dump")?;
        lock(&self.values).dump_args = args.to_vec();
        writeln!(out, "mock device")?;
        Ok(())
    }
}

// ── Streams ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct StreamValues {
    buffer_size: usize,
    latency: u32,
    io_limit: Option<usize>,
    bytes_transferred: usize,
    render_position: u32,
    presentation: PresentationPosition,
    next_write_timestamp: i64,
    volume: (f32, f32),
    gain: f32,
    frames_lost: u32,
    last_kv_pairs: Option<String>,
    last_keys: Option<String>,
    parameters_reply: String,
}

macro_rules! mock_stream_common {
    ($name:ident) => {
        impl $name {
            /// Method names received, in call order.
            pub fn calls(&self) -> Vec<&'static str> {
                self.recorder.calls()
            }

            /// How many times `name` was called.
            pub fn call_count(&self, name: &str) -> usize {
                self.recorder.count(name)
            }

            /// Make every subsequent call fail with `failure`, or succeed with `None`.
            pub fn set_failure(&self, failure: Option<HalError>) {
                self.recorder.set_failure(failure);
            }

            /// Cap the bytes accepted by a single read or write.
            pub fn set_io_limit(&self, limit: Option<usize>) {
                lock(&self.values).io_limit = limit;
            }

            /// Value returned from `buffer_size`.
            pub fn set_buffer_size(&self, size: usize) {
                lock(&self.values).buffer_size = size;
            }

            /// Reply returned from `parameters`.
            pub fn set_parameters_reply(&self, reply: &str) {
                reply.clone_into(&mut lock(&self.values).parameters_reply);
            }

            /// Total bytes moved by reads or writes.
            pub fn bytes_transferred(&self) -> usize {
                lock(&self.values).bytes_transferred
            }

            /// Last string given to `set_parameters`.
            pub fn last_kv_pairs(&self) -> Option<String> {
                lock(&self.values).last_kv_pairs.clone()
            }

            /// Last key list given to `parameters`.
            pub fn last_keys(&self) -> Option<String> {
                lock(&self.values).last_keys.clone()
            }

            fn transfer_len(&self, offered: usize) -> usize {
                let mut values = lock(&self.values);
                let len = values.io_limit.map_or(offered, |limit| offered.min(limit));
                values.bytes_transferred += len;
                len
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                self.released.fetch_add(1, Ordering::SeqCst);
            }
        }

        impl StreamHal for $name {
            fn audio_properties(&self) -> Result<AudioConfigBase> {
                self.recorder.hit("audio_properties")?;
                Ok(self.config)
            }

            fn buffer_size(&self) -> Result<usize> {
                self.recorder.hit("buffer_size")?;
                Ok(lock(&self.values).buffer_size)
            }

            fn standby(&self) -> Result<()> {
                self.recorder.hit("standby")
            }

            fn dump(&self, out: &mut dyn Write) -> Result<()> {
                self.recorder.hit("dump")?;
                writeln!(out, concat!("mock ", stringify!($name)))?;
                Ok(())
            }

            fn set_parameters(&self, kv_pairs: &str) -> Result<()> {
                self.recorder.hit("set_parameters")?;
                lock(&self.values).last_kv_pairs = Some(kv_pairs.to_owned());
                Ok(())
            }

            fn parameters(&self, keys: &str) -> Result<String> {
                self.recorder.hit("parameters")?;
                let mut values = lock(&self.values);
                values.last_keys = Some(keys.to_owned());
                Ok(values.parameters_reply.clone())
            }
        }
    };
}

/// Mock playback stream.
#[derive(Debug)]
pub struct MockStreamOut {
    config: AudioConfigBase,
    recorder: Recorder,
    values: Mutex<StreamValues>,
    released: Arc<AtomicUsize>,
}

impl MockStreamOut {
    fn new(config: AudioConfigBase, released: Arc<AtomicUsize>) -> Self {
        Self {
            config,
            recorder: Recorder::default(),
            values: Mutex::new(StreamValues {
                buffer_size: 4096,
                latency: 20,
                volume: (1.0, 1.0),
                gain: 1.0,
                ..StreamValues::default()
            }),
            released,
        }
    }

    /// Value returned from `latency`.
    pub fn set_latency(&self, latency_ms: u32) {
        lock(&self.values).latency = latency_ms;
    }

    /// Value returned from `render_position`.
    pub fn set_render_position(&self, frames: u32) {
        lock(&self.values).render_position = frames;
    }

    /// Value returned from `presentation_position`.
    pub fn set_presentation_position(&self, position: PresentationPosition) {
        lock(&self.values).presentation = position;
    }

    /// Value returned from `next_write_timestamp`.
    pub fn set_next_write_timestamp(&self, timestamp_us: i64) {
        lock(&self.values).next_write_timestamp = timestamp_us;
    }

    /// Last `(left, right)` volume set.
    pub fn volume(&self) -> (f32, f32) {
        lock(&self.values).volume
    }
}

mock_stream_common!(MockStreamOut);

impl StreamOutHal for MockStreamOut {
    fn latency(&self) -> Result<u32> {
        self.recorder.hit("latency")?;
        Ok(lock(&self.values).latency)
    }

    fn set_volume(&self, left: f32, right: f32) -> Result<()> {
        self.recorder.hit("set_volume")?;
        lock(&self.values).volume = (left, right);
        Ok(())
    }

    fn write(&self, buffer: &[u8]) -> Result<usize> {
        self.recorder.hit("write")?;
        Ok(self.transfer_len(buffer.len()))
    }

    fn render_position(&self) -> Result<u32> {
        self.recorder.hit("render_position")?;
        Ok(lock(&self.values).render_position)
    }

    fn presentation_position(&self) -> Result<PresentationPosition> {
        self.recorder.hit("presentation_position")?;
        Ok(lock(&self.values).presentation)
    }

    fn next_write_timestamp(&self) -> Result<i64> {
        self.recorder.hit("next_write_timestamp")?;
        Ok(lock(&self.values).next_write_timestamp)
    }
}

/// Byte pattern mock capture streams fill buffers with.
pub const MOCK_CAPTURE_BYTE: u8 = 0x5A;

/// Mock capture stream.
#[derive(Debug)]
pub struct MockStreamIn {
    config: AudioConfigBase,
    recorder: Recorder,
    values: Mutex<StreamValues>,
    released: Arc<AtomicUsize>,
}

impl MockStreamIn {
    fn new(config: AudioConfigBase, released: Arc<AtomicUsize>) -> Self {
        Self {
            config,
            recorder: Recorder::default(),
            values: Mutex::new(StreamValues {
                buffer_size: 2048,
                volume: (1.0, 1.0),
                gain: 1.0,
                ..StreamValues::default()
            }),
            released,
        }
    }

    /// Value returned from `input_frames_lost`.
    pub fn set_frames_lost(&self, frames: u32) {
        lock(&self.values).frames_lost = frames;
    }

    /// Last gain set.
    pub fn gain(&self) -> f32 {
        lock(&self.values).gain
    }
}

mock_stream_common!(MockStreamIn);

impl StreamInHal for MockStreamIn {
    fn set_gain(&self, gain: f32) -> Result<()> {
        self.recorder.hit("set_gain")?;
        lock(&self.values).gain = gain;
        Ok(())
    }

    fn read(&self, buffer: &mut [u8]) -> Result<usize> {
        self.recorder.hit("read")?;
        let len = self.transfer_len(buffer.len());
        if let Some(filled) = buffer.get_mut(..len) {
            filled.fill(MOCK_CAPTURE_BYTE);
        }
        Ok(len)
    }

    fn input_frames_lost(&self) -> Result<u32> {
        self.recorder.hit("input_frames_lost")?;
        Ok(lock(&self.values).frames_lost)
    }
}
