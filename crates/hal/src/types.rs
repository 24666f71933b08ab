//! Audio domain newtypes shared by the backend traits and the C surface.
//!
//! The legacy ABI passes most of these as bare integers. Keeping them as
//! `#[repr(transparent)]` newtypes means the shim can hand them across the
//! boundary unchanged while Rust code cannot confuse a format with a mask.

use core::time::Duration;

// ── AudioFormat ──────────────────────────────────────────────────────────────

/// Sample format (`audio_format_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct AudioFormat(pub u32);

impl AudioFormat {
    /// Let the backend choose.
    pub const DEFAULT: Self = Self(0x0);
    /// Signed 16-bit PCM.
    pub const PCM_16_BIT: Self = Self(0x1);
    /// Unsigned 8-bit PCM.
    pub const PCM_8_BIT: Self = Self(0x2);
    /// Signed 32-bit PCM.
    pub const PCM_32_BIT: Self = Self(0x3);
    /// Signed 8.24 fixed point in a 32-bit container.
    pub const PCM_8_24_BIT: Self = Self(0x4);
    /// 32-bit float PCM.
    pub const PCM_FLOAT: Self = Self(0x5);
    /// Signed 24-bit PCM, packed into 3 bytes.
    pub const PCM_24_BIT_PACKED: Self = Self(0x6);

    /// Bytes per sample for linear PCM formats, `None` for anything else.
    pub const fn bytes_per_sample(self) -> Option<usize> {
        match self.0 {
            0x1 => Some(2),
            0x2 => Some(1),
            0x3..=0x5 => Some(4),
            0x6 => Some(3),
            _ => None,
        }
    }
}

// ── ChannelMask ──────────────────────────────────────────────────────────────

/// Channel layout (`audio_channel_mask_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct ChannelMask(pub u32);

impl ChannelMask {
    /// No channels / let the backend choose.
    pub const NONE: Self = Self(0x0);
    /// Output front-left only.
    pub const OUT_MONO: Self = Self(0x1);
    /// Output front-left + front-right.
    pub const OUT_STEREO: Self = Self(0x3);
    /// Input front.
    pub const IN_MONO: Self = Self(0x10);
    /// Input left + right.
    pub const IN_STEREO: Self = Self(0xC);

    const REPRESENTATION_SHIFT: u32 = 30;
    const INDEX_REPRESENTATION: u32 = 2;
    const BITS_MASK: u32 = (1 << Self::REPRESENTATION_SHIFT) - 1;

    /// Number of channels described by the mask.
    ///
    /// Positional and index masks both count set bits below the
    /// representation field.
    pub const fn channel_count(self) -> usize {
        let representation = self.0 >> Self::REPRESENTATION_SHIFT;
        if representation != 0 && representation != Self::INDEX_REPRESENTATION {
            return 0;
        }
        (self.0 & Self::BITS_MASK).count_ones() as usize
    }
}

// ── Handles and enum-like integers ───────────────────────────────────────────

/// Audio mode (`audio_mode_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct AudioMode(pub i32);

impl AudioMode {
    /// Invalid mode marker.
    pub const INVALID: Self = Self(-2);
    /// Keep the current mode.
    pub const CURRENT: Self = Self(-1);
    /// Media playback / no call.
    pub const NORMAL: Self = Self(0);
    /// Ringtone playing.
    pub const RINGTONE: Self = Self(1);
    /// Telephony call.
    pub const IN_CALL: Self = Self(2);
    /// VoIP or other communication session.
    pub const IN_COMMUNICATION: Self = Self(3);
}

/// Capture source (`audio_source_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct AudioSource(pub i32);

impl AudioSource {
    /// Default capture source.
    pub const DEFAULT: Self = Self(0);
    /// Main microphone.
    pub const MIC: Self = Self(1);
    /// Voice communication tuned capture.
    pub const VOICE_COMMUNICATION: Self = Self(7);
}

/// Device type bitfield (`audio_devices_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct DeviceType(pub u32);

impl DeviceType {
    /// No device.
    pub const NONE: Self = Self(0x0);
    /// Earpiece.
    pub const OUT_EARPIECE: Self = Self(0x1);
    /// Built-in speaker.
    pub const OUT_SPEAKER: Self = Self(0x2);
    /// Wired headset.
    pub const OUT_WIRED_HEADSET: Self = Self(0x4);
    /// Built-in microphone.
    pub const IN_BUILTIN_MIC: Self = Self(0x8000_0004);
}

/// Output stream flags (`audio_output_flags_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct OutputFlags(pub u32);

impl OutputFlags {
    /// No flags.
    pub const NONE: Self = Self(0x0);
    /// The primary output of the device.
    pub const PRIMARY: Self = Self(0x2);
    /// Low-latency fast track.
    pub const FAST: Self = Self(0x4);
    /// Deep buffer for background playback.
    pub const DEEP_BUFFER: Self = Self(0x8);
}

/// Input stream flags (`audio_input_flags_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct InputFlags(pub u32);

impl InputFlags {
    /// No flags.
    pub const NONE: Self = Self(0x0);
    /// Low-latency fast capture.
    pub const FAST: Self = Self(0x1);
}

/// I/O handle assigned by the host to a stream (`audio_io_handle_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct IoHandle(pub i32);

/// Audio patch handle (`audio_patch_handle_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct PatchHandle(pub i32);

impl PatchHandle {
    /// "Allocate a new patch" on create; never a live patch.
    pub const NONE: Self = Self(0);
}

/// Audio port handle (`audio_port_handle_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct PortHandle(pub i32);

/// Hardware module handle (`audio_module_handle_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ModuleHandle(pub i32);

/// Opaque effect handle, kept as an address so it can cross threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EffectHandle(pub usize);

// ── Configurations ───────────────────────────────────────────────────────────

/// The three properties negotiated at stream open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioConfigBase {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel layout.
    pub channel_mask: ChannelMask,
    /// Sample format.
    pub format: AudioFormat,
}

impl AudioConfigBase {
    /// Bytes per interleaved frame, `None` for non-PCM formats or empty masks.
    pub const fn frame_size(&self) -> Option<usize> {
        let channels = self.channel_mask.channel_count();
        match self.format.bytes_per_sample() {
            Some(bytes) if channels > 0 => Some(bytes * channels),
            _ => None,
        }
    }
}

/// Compressed-offload description attached to a stream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OffloadInfo {
    /// Sample rate of the compressed content.
    pub sample_rate: u32,
    /// Channel layout of the compressed content.
    pub channel_mask: ChannelMask,
    /// Compressed format.
    pub format: AudioFormat,
    /// Stream type (`audio_stream_type_t`).
    pub stream_type: i32,
    /// Bit rate in bits per second.
    pub bit_rate: u32,
    /// Duration in microseconds, `-1` if unknown.
    pub duration_us: i64,
    /// Content has a video track.
    pub has_video: bool,
    /// Content is streamed rather than local.
    pub is_streaming: bool,
    /// PCM bit width after decode.
    pub bit_width: u32,
    /// Offload buffer size in bytes.
    pub offload_buffer_size: u32,
    /// Usage (`audio_usage_t`).
    pub usage: i32,
}

/// Full stream configuration (`struct audio_config`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel layout.
    pub channel_mask: ChannelMask,
    /// Sample format.
    pub format: AudioFormat,
    /// Offload description, meaningful only for compressed output.
    pub offload_info: OffloadInfo,
    /// Requested buffer size in frames, `0` for backend default.
    pub frame_count: u32,
}

impl AudioConfig {
    /// The negotiable part of the configuration.
    pub const fn base(&self) -> AudioConfigBase {
        AudioConfigBase {
            sample_rate: self.sample_rate,
            channel_mask: self.channel_mask,
            format: self.format,
        }
    }

    /// Overwrite the negotiable part with `base`, leaving the rest untouched.
    pub fn apply(&mut self, base: AudioConfigBase) {
        self.sample_rate = base.sample_rate;
        self.channel_mask = base.channel_mask;
        self.format = base.format;
    }
}

// ── Ports and patches ────────────────────────────────────────────────────────

/// Role of a port in a patch (`audio_port_role_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PortRole {
    /// Unset.
    #[default]
    None,
    /// Produces audio into the patch.
    Source,
    /// Consumes audio from the patch.
    Sink,
}

/// Gain setting on a port (`struct audio_gain_config`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GainConfig {
    /// Index of the gain controller on the port.
    pub index: i32,
    /// Gain mode bitfield.
    pub mode: u32,
    /// Channels the values apply to.
    pub channel_mask: ChannelMask,
    /// Gain values in millibel, one per channel in `channel_mask`.
    pub values: [i32; 32],
    /// Ramp duration in milliseconds.
    pub ramp_duration_ms: u32,
}

/// Type-specific part of a port configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PortConfigExt {
    /// No extension (`AUDIO_PORT_TYPE_NONE`).
    #[default]
    None,
    /// A physical device port.
    Device {
        /// Module the device belongs to.
        hw_module: ModuleHandle,
        /// Device type.
        device_type: DeviceType,
        /// Device address (e.g. a bus name), possibly empty.
        address: String,
    },
    /// A mix port (an I/O stream).
    Mix {
        /// Module the mix belongs to.
        hw_module: ModuleHandle,
        /// I/O handle of the stream.
        handle: IoHandle,
        /// Stream type or capture source, depending on role.
        usecase: i32,
    },
    /// An audio session.
    Session {
        /// Session id.
        session: i32,
    },
}

/// One end of an audio patch (`struct audio_port_config`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortConfig {
    /// Port handle.
    pub id: PortHandle,
    /// Source or sink.
    pub role: PortRole,
    /// Which of the optional fields below are valid.
    pub config_mask: u32,
    /// Sample rate in Hz, valid with [`PortConfig::MASK_SAMPLE_RATE`].
    pub sample_rate: u32,
    /// Channel layout, valid with [`PortConfig::MASK_CHANNEL_MASK`].
    pub channel_mask: ChannelMask,
    /// Sample format, valid with [`PortConfig::MASK_FORMAT`].
    pub format: AudioFormat,
    /// Gain, present with [`PortConfig::MASK_GAIN`].
    pub gain: Option<GainConfig>,
    /// Output or input flags, depending on role; valid with [`PortConfig::MASK_FLAGS`].
    pub flags: u32,
    /// Type-specific part.
    pub ext: PortConfigExt,
}

impl PortConfig {
    /// `sample_rate` is valid.
    pub const MASK_SAMPLE_RATE: u32 = 0x1;
    /// `channel_mask` is valid.
    pub const MASK_CHANNEL_MASK: u32 = 0x2;
    /// `format` is valid.
    pub const MASK_FORMAT: u32 = 0x4;
    /// `gain` is valid.
    pub const MASK_GAIN: u32 = 0x8;
    /// `flags` is valid.
    pub const MASK_FLAGS: u32 = 0x10;
}

// ── Timing ───────────────────────────────────────────────────────────────────

/// Frames presented to the listener, with the monotonic time they were counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresentationPosition {
    /// Frames presented since the stream left standby.
    pub frames: u64,
    /// `CLOCK_MONOTONIC` time of the measurement.
    pub timestamp: Duration,
}
