//! Conversions between C arguments and `hal` types.

use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::fs::File;
use std::io::Write;
use std::mem::ManuallyDrop;
use std::os::fd::{FromRawFd, RawFd};
use std::ptr;
use std::slice;

use hal::{
    AudioConfig, AudioFormat, ChannelMask, DeviceType, GainConfig, HalError, IoHandle,
    ModuleHandle, OffloadInfo, PortConfig, PortConfigExt, PortHandle, PortRole, Result,
};
use libc::{c_char, c_int, c_uint};

use super::types::{
    audio_config, audio_offload_info_t, audio_port_config, AUDIO_PORT_ROLE_SINK,
    AUDIO_PORT_ROLE_SOURCE, AUDIO_PORT_TYPE_DEVICE, AUDIO_PORT_TYPE_MIX, AUDIO_PORT_TYPE_SESSION,
};

// ── Strings ──────────────────────────────────────────────────────────────────

/// Borrow a C string argument. `NULL` reads as empty; invalid UTF-8 is replaced.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn str_arg<'a>(ptr: *const c_char) -> Cow<'a, str> {
    if ptr.is_null() {
        return Cow::Borrowed("");
    }
    // SAFETY: non-null and NUL-terminated per the caller.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy()
}

/// Copy `value` into a `malloc`ed C string the host releases with `free`.
///
/// Interior NULs truncate the string. Returns `NULL` if `malloc` fails.
pub(crate) fn to_c_string(value: &str) -> *mut c_char {
    let head = value.split('\0').next().unwrap_or_default();
    let Ok(owned) = CString::new(head) else {
        return ptr::null_mut();
    };
    // SAFETY: `owned` is a valid NUL-terminated string for the call.
    let copy = unsafe { libc::strdup(owned.as_ptr()) };
    if copy.is_null() {
        tracing::error!(len = head.len(), "strdup failed");
    }
    copy
}

// ── Diagnostic sink ──────────────────────────────────────────────────────────

/// Run `dump` against the host's file descriptor without taking ownership of it.
pub(crate) fn with_fd_writer(
    fd: c_int,
    dump: impl FnOnce(&mut dyn Write) -> Result<()>,
) -> Result<()> {
    if fd < 0 {
        return Err(HalError::InvalidArgument);
    }
    let raw: RawFd = fd;
    // SAFETY: the host keeps `fd` open for the duration of the call and the
    // `ManuallyDrop` wrapper never closes it.
    let mut file = ManuallyDrop::new(unsafe { File::from_raw_fd(raw) });
    let result = dump(&mut *file);
    file.flush()?;
    result
}

// ── Stream configuration ─────────────────────────────────────────────────────

impl From<&audio_offload_info_t> for OffloadInfo {
    fn from(raw: &audio_offload_info_t) -> Self {
        Self {
            sample_rate: raw.sample_rate,
            channel_mask: ChannelMask(raw.channel_mask),
            format: AudioFormat(raw.format),
            stream_type: raw.stream_type,
            bit_rate: raw.bit_rate,
            duration_us: raw.duration_us,
            has_video: raw.has_video,
            is_streaming: raw.is_streaming,
            bit_width: raw.bit_width,
            offload_buffer_size: raw.offload_buffer_size,
            usage: raw.usage,
        }
    }
}

impl From<&audio_config> for AudioConfig {
    fn from(raw: &audio_config) -> Self {
        Self {
            sample_rate: raw.sample_rate,
            channel_mask: ChannelMask(raw.channel_mask),
            format: AudioFormat(raw.format),
            offload_info: OffloadInfo::from(&raw.offload_info),
            frame_count: raw.frame_count,
        }
    }
}

/// Write the negotiated fields of `config` back into the caller's struct.
pub(crate) fn store_negotiated(raw: &mut audio_config, config: &AudioConfig) {
    raw.sample_rate = config.sample_rate;
    raw.channel_mask = config.channel_mask.0;
    raw.format = config.format.0;
}

// ── Ports ────────────────────────────────────────────────────────────────────

fn address_from_raw(raw: &[c_char]) -> String {
    let bytes: Vec<u8> = raw
        .iter()
        .take_while(|c| **c != 0)
        .map(|c| c.to_ne_bytes()[0])
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

impl From<&audio_port_config> for PortConfig {
    fn from(raw: &audio_port_config) -> Self {
        let role = match raw.role {
            AUDIO_PORT_ROLE_SOURCE => PortRole::Source,
            AUDIO_PORT_ROLE_SINK => PortRole::Sink,
            _ => PortRole::None,
        };
        let gain = (raw.config_mask & PortConfig::MASK_GAIN != 0).then(|| GainConfig {
            index: raw.gain.index,
            mode: raw.gain.mode,
            channel_mask: ChannelMask(raw.gain.channel_mask),
            values: raw.gain.values,
            ramp_duration_ms: raw.gain.ramp_duration_ms,
        });
        // SAFETY: `type_` selects the active union member; every member is
        // plain integers, so reading the selected one is always defined.
        let ext = unsafe {
            match raw.type_ {
                AUDIO_PORT_TYPE_DEVICE => PortConfigExt::Device {
                    hw_module: ModuleHandle(raw.ext.device.hw_module),
                    device_type: DeviceType(raw.ext.device.type_),
                    address: address_from_raw(&raw.ext.device.address),
                },
                AUDIO_PORT_TYPE_MIX => PortConfigExt::Mix {
                    hw_module: ModuleHandle(raw.ext.mix.hw_module),
                    handle: IoHandle(raw.ext.mix.handle),
                    usecase: raw.ext.mix.usecase.stream,
                },
                AUDIO_PORT_TYPE_SESSION => PortConfigExt::Session {
                    session: raw.ext.session.session,
                },
                _ => PortConfigExt::None,
            }
        };
        Self {
            id: PortHandle(raw.id),
            role,
            config_mask: raw.config_mask,
            sample_rate: raw.sample_rate,
            channel_mask: ChannelMask(raw.channel_mask),
            format: AudioFormat(raw.format),
            gain,
            flags: raw.flags,
            ext,
        }
    }
}

/// Copy `count` port configs out of a C array.
///
/// # Safety
///
/// When `count` is non-zero, `ptr` must point to `count` initialised
/// `audio_port_config` values.
pub(crate) unsafe fn ports_from_raw(
    ptr: *const audio_port_config,
    count: c_uint,
) -> Result<Vec<PortConfig>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if ptr.is_null() {
        return Err(HalError::InvalidArgument);
    }
    let len = usize::try_from(count).map_err(|_| HalError::InvalidArgument)?;
    // SAFETY: non-null with `len` elements per the caller.
    let raw = unsafe { slice::from_raw_parts(ptr, len) };
    Ok(raw.iter().map(PortConfig::from).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ffi::types::{
        audio_gain_config, audio_port_config_device_ext, audio_port_config_ext,
    };

    fn device_port(address: &[u8]) -> audio_port_config {
        let mut addr = [0 as c_char; 32];
        for (dst, src) in addr.iter_mut().zip(address) {
            *dst = c_char::from_ne_bytes([*src]);
        }
        audio_port_config {
            id: 4,
            role: AUDIO_PORT_ROLE_SINK,
            type_: AUDIO_PORT_TYPE_DEVICE,
            config_mask: PortConfig::MASK_SAMPLE_RATE,
            sample_rate: 48_000,
            channel_mask: 0,
            format: 0,
            gain: audio_gain_config {
                index: 0,
                mode: 0,
                channel_mask: 0,
                values: [0; 32],
                ramp_duration_ms: 0,
            },
            flags: 0,
            ext: audio_port_config_ext {
                device: audio_port_config_device_ext {
                    hw_module: 10,
                    type_: DeviceType::OUT_SPEAKER.0,
                    address: addr,
                },
            },
        }
    }

    #[test]
    fn device_port_converts() {
        let port = PortConfig::from(&device_port(b"bus0"));
        assert_eq!(port.role, PortRole::Sink);
        assert_eq!(port.gain, None);
        assert_eq!(
            port.ext,
            PortConfigExt::Device {
                hw_module: ModuleHandle(10),
                device_type: DeviceType::OUT_SPEAKER,
                address: "bus0".to_owned(),
            }
        );
    }

    /// A device port laid out byte by byte at the header's offsets.
    #[test]
    fn device_port_decodes_from_header_offsets() {
        let mut bytes = [0u8; core::mem::size_of::<audio_port_config>()];
        let mut put = |offset: usize, value: u32| {
            bytes[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
        };
        put(0, 9); // id
        put(4, AUDIO_PORT_ROLE_SOURCE);
        put(8, AUDIO_PORT_TYPE_DEVICE);
        put(12, PortConfig::MASK_FLAGS);
        put(172, 0x4); // flags
        put(176, 11); // ext.device.hw_module
        put(180, DeviceType::IN_BUILTIN_MIC.0); // ext.device.type
        bytes[184..190].copy_from_slice(b"bottom");

        // SAFETY: every field is a plain integer, so any bit pattern is valid,
        // and `read_unaligned` tolerates the byte array's alignment.
        let raw: audio_port_config = unsafe { ptr::read_unaligned(bytes.as_ptr().cast()) };
        let port = PortConfig::from(&raw);
        assert_eq!(port.id, PortHandle(9));
        assert_eq!(port.role, PortRole::Source);
        assert_eq!(port.flags, 0x4);
        assert_eq!(
            port.ext,
            PortConfigExt::Device {
                hw_module: ModuleHandle(11),
                device_type: DeviceType::IN_BUILTIN_MIC,
                address: "bottom".to_owned(),
            }
        );
    }

    #[test]
    fn null_port_array_with_count_is_rejected() {
        // SAFETY: the null pointer is never dereferenced.
        let result = unsafe { ports_from_raw(ptr::null(), 1) };
        assert_eq!(result, Err(HalError::InvalidArgument));
        // SAFETY: zero elements are read.
        assert!(unsafe { ports_from_raw(ptr::null(), 0) }.unwrap().is_empty());
    }

    #[test]
    fn c_string_round_trip() {
        let raw = to_c_string("routing=2");
        assert!(!raw.is_null());
        // SAFETY: `raw` came from strdup.
        unsafe {
            assert_eq!(str_arg(raw), "routing=2");
            libc::free(raw.cast());
        }
    }

    #[test]
    fn null_string_reads_empty() {
        // SAFETY: null is accepted.
        assert_eq!(unsafe { str_arg(ptr::null()) }, "");
    }

    #[test]
    fn negative_fd_is_rejected() {
        assert_eq!(with_fd_writer(-1, |_| Ok(())), Err(HalError::InvalidArgument));
    }
}
