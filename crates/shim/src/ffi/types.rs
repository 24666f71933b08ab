//! `#[repr(C)]` mirrors of the legacy hardware-module and audio HAL headers.
//!
//! Field order and widths follow `hardware/hardware.h` and `hardware/audio.h`
//! (device API 2.0 with the stream metadata extensions). Entries the adapter
//! never fills are still declared so that offsets line up; the host checks
//! for `NULL` before calling them.

#![allow(non_camel_case_types)]
#![allow(missing_docs)]

use libc::{c_char, c_int, c_uint, c_void, size_t, ssize_t, timespec};
use static_assertions::{assert_eq_size, const_assert_eq};

/// `effect_handle_t`, opaque to the adapter.
pub type effect_handle_t = *mut c_void;

/// `stream_callback_t`, used by the non-blocking write API.
pub type stream_callback_t =
    Option<unsafe extern "C" fn(event: c_int, param: *mut c_void, cookie: *mut c_void) -> c_int>;

// ── hardware.h ───────────────────────────────────────────────────────────────

#[repr(C)]
pub struct hw_module_methods_t {
    pub open: Option<
        unsafe extern "C" fn(
            module: *const hw_module_t,
            id: *const c_char,
            device: *mut *mut hw_device_t,
        ) -> c_int,
    >,
}

#[repr(C)]
pub struct hw_module_t {
    pub tag: u32,
    pub module_api_version: u16,
    pub hal_api_version: u16,
    pub id: *const c_char,
    pub name: *const c_char,
    pub author: *const c_char,
    pub methods: *mut hw_module_methods_t,
    pub dso: *mut c_void,
    /// `uint64_t[25]` on LP64, `uint32_t[25]` otherwise.
    pub reserved: [usize; 32 - 7],
}

#[repr(C)]
pub struct hw_device_t {
    pub tag: u32,
    pub version: u32,
    pub module: *mut hw_module_t,
    pub reserved: [usize; 12],
    pub close: Option<unsafe extern "C" fn(device: *mut hw_device_t) -> c_int>,
}

// ── audio.h: configuration ───────────────────────────────────────────────────

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct audio_offload_info_t {
    pub version: u16,
    pub size: u16,
    pub sample_rate: u32,
    pub channel_mask: u32,
    pub format: u32,
    pub stream_type: i32,
    pub bit_rate: u32,
    pub duration_us: i64,
    pub has_video: bool,
    pub is_streaming: bool,
    pub bit_width: u32,
    pub offload_buffer_size: u32,
    pub usage: i32,
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct audio_config {
    pub sample_rate: u32,
    pub channel_mask: u32,
    pub format: u32,
    pub offload_info: audio_offload_info_t,
    pub frame_count: u32,
}

// ── audio.h: ports ───────────────────────────────────────────────────────────

pub const AUDIO_PORT_ROLE_NONE: u32 = 0;
pub const AUDIO_PORT_ROLE_SOURCE: u32 = 1;
pub const AUDIO_PORT_ROLE_SINK: u32 = 2;

pub const AUDIO_PORT_TYPE_NONE: u32 = 0;
pub const AUDIO_PORT_TYPE_DEVICE: u32 = 1;
pub const AUDIO_PORT_TYPE_MIX: u32 = 2;
pub const AUDIO_PORT_TYPE_SESSION: u32 = 3;

pub const AUDIO_DEVICE_MAX_ADDRESS_LEN: usize = 32;
pub const AUDIO_GAIN_MAX_VALUES: usize = 32;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct audio_gain_config {
    pub index: c_int,
    pub mode: u32,
    pub channel_mask: u32,
    pub values: [c_int; AUDIO_GAIN_MAX_VALUES],
    pub ramp_duration_ms: c_uint,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct audio_port_config_device_ext {
    pub hw_module: i32,
    pub type_: u32,
    pub address: [c_char; AUDIO_DEVICE_MAX_ADDRESS_LEN],
}

/// Stream type for sources, capture source for sinks.
#[repr(C)]
#[derive(Clone, Copy)]
pub union audio_port_config_mix_ext_usecase {
    pub stream: i32,
    pub source: i32,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct audio_port_config_mix_ext {
    pub hw_module: i32,
    pub handle: i32,
    pub usecase: audio_port_config_mix_ext_usecase,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct audio_port_config_session_ext {
    pub session: i32,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union audio_port_config_ext {
    pub device: audio_port_config_device_ext,
    pub mix: audio_port_config_mix_ext,
    pub session: audio_port_config_session_ext,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct audio_port_config {
    pub id: i32,
    pub role: u32,
    pub type_: u32,
    pub config_mask: u32,
    pub sample_rate: u32,
    pub channel_mask: u32,
    pub format: u32,
    pub gain: audio_gain_config,
    /// `union audio_io_flags`: output or input flags, both 32-bit.
    pub flags: u32,
    pub ext: audio_port_config_ext,
}

// ── audio.h: streams ─────────────────────────────────────────────────────────

#[repr(C)]
pub struct audio_stream {
    pub get_sample_rate: Option<unsafe extern "C" fn(stream: *const audio_stream) -> u32>,
    pub set_sample_rate: Option<unsafe extern "C" fn(stream: *mut audio_stream, rate: u32) -> c_int>,
    pub get_buffer_size: Option<unsafe extern "C" fn(stream: *const audio_stream) -> size_t>,
    pub get_channels: Option<unsafe extern "C" fn(stream: *const audio_stream) -> u32>,
    pub get_format: Option<unsafe extern "C" fn(stream: *const audio_stream) -> u32>,
    pub set_format: Option<unsafe extern "C" fn(stream: *mut audio_stream, format: u32) -> c_int>,
    pub standby: Option<unsafe extern "C" fn(stream: *mut audio_stream) -> c_int>,
    pub dump: Option<unsafe extern "C" fn(stream: *const audio_stream, fd: c_int) -> c_int>,
    pub get_device: Option<unsafe extern "C" fn(stream: *const audio_stream) -> u32>,
    pub set_device: Option<unsafe extern "C" fn(stream: *mut audio_stream, device: u32) -> c_int>,
    pub set_parameters:
        Option<unsafe extern "C" fn(stream: *mut audio_stream, kv_pairs: *const c_char) -> c_int>,
    pub get_parameters: Option<
        unsafe extern "C" fn(stream: *const audio_stream, keys: *const c_char) -> *mut c_char,
    >,
    pub add_audio_effect:
        Option<unsafe extern "C" fn(stream: *const audio_stream, effect: effect_handle_t) -> c_int>,
    pub remove_audio_effect:
        Option<unsafe extern "C" fn(stream: *const audio_stream, effect: effect_handle_t) -> c_int>,
}

#[repr(C)]
pub struct audio_stream_out {
    pub common: audio_stream,
    pub get_latency: Option<unsafe extern "C" fn(stream: *const audio_stream_out) -> u32>,
    pub set_volume:
        Option<unsafe extern "C" fn(stream: *mut audio_stream_out, left: f32, right: f32) -> c_int>,
    pub write: Option<
        unsafe extern "C" fn(
            stream: *mut audio_stream_out,
            buffer: *const c_void,
            bytes: size_t,
        ) -> ssize_t,
    >,
    pub get_render_position:
        Option<unsafe extern "C" fn(stream: *const audio_stream_out, dsp_frames: *mut u32) -> c_int>,
    pub get_next_write_timestamp:
        Option<unsafe extern "C" fn(stream: *const audio_stream_out, timestamp: *mut i64) -> c_int>,
    pub set_callback: Option<
        unsafe extern "C" fn(
            stream: *mut audio_stream_out,
            callback: stream_callback_t,
            cookie: *mut c_void,
        ) -> c_int,
    >,
    pub pause: Option<unsafe extern "C" fn(stream: *mut audio_stream_out) -> c_int>,
    pub resume: Option<unsafe extern "C" fn(stream: *mut audio_stream_out) -> c_int>,
    pub drain: Option<unsafe extern "C" fn(stream: *mut audio_stream_out, kind: c_int) -> c_int>,
    pub flush: Option<unsafe extern "C" fn(stream: *mut audio_stream_out) -> c_int>,
    pub get_presentation_position: Option<
        unsafe extern "C" fn(
            stream: *const audio_stream_out,
            frames: *mut u64,
            timestamp: *mut timespec,
        ) -> c_int,
    >,
    pub start: Option<unsafe extern "C" fn(stream: *const audio_stream_out) -> c_int>,
    pub stop: Option<unsafe extern "C" fn(stream: *const audio_stream_out) -> c_int>,
    pub create_mmap_buffer: Option<
        unsafe extern "C" fn(
            stream: *const audio_stream_out,
            min_size_frames: i32,
            info: *mut c_void,
        ) -> c_int,
    >,
    pub get_mmap_position:
        Option<unsafe extern "C" fn(stream: *const audio_stream_out, position: *mut c_void) -> c_int>,
    pub update_source_metadata:
        Option<unsafe extern "C" fn(stream: *mut audio_stream_out, metadata: *const c_void)>,
}

#[repr(C)]
pub struct audio_stream_in {
    pub common: audio_stream,
    pub set_gain: Option<unsafe extern "C" fn(stream: *mut audio_stream_in, gain: f32) -> c_int>,
    pub read: Option<
        unsafe extern "C" fn(
            stream: *mut audio_stream_in,
            buffer: *mut c_void,
            bytes: size_t,
        ) -> ssize_t,
    >,
    pub get_input_frames_lost: Option<unsafe extern "C" fn(stream: *mut audio_stream_in) -> u32>,
    pub get_capture_position: Option<
        unsafe extern "C" fn(stream: *const audio_stream_in, frames: *mut i64, time: *mut i64) -> c_int,
    >,
    pub start: Option<unsafe extern "C" fn(stream: *const audio_stream_in) -> c_int>,
    pub stop: Option<unsafe extern "C" fn(stream: *const audio_stream_in) -> c_int>,
    pub create_mmap_buffer: Option<
        unsafe extern "C" fn(
            stream: *const audio_stream_in,
            min_size_frames: i32,
            info: *mut c_void,
        ) -> c_int,
    >,
    pub get_mmap_position:
        Option<unsafe extern "C" fn(stream: *const audio_stream_in, position: *mut c_void) -> c_int>,
    pub get_active_microphones: Option<
        unsafe extern "C" fn(
            stream: *const audio_stream_in,
            mic_array: *mut c_void,
            mic_count: *mut size_t,
        ) -> c_int,
    >,
    pub set_microphone_direction:
        Option<unsafe extern "C" fn(stream: *const audio_stream_in, direction: c_int) -> c_int>,
    pub set_microphone_field_dimension:
        Option<unsafe extern "C" fn(stream: *const audio_stream_in, zoom: f32) -> c_int>,
    pub update_sink_metadata:
        Option<unsafe extern "C" fn(stream: *mut audio_stream_in, metadata: *const c_void)>,
}

// ── audio.h: module and device ───────────────────────────────────────────────

#[repr(C)]
pub struct audio_module {
    pub common: hw_module_t,
}

#[repr(C)]
pub struct audio_hw_device {
    pub common: hw_device_t,
    pub get_supported_devices: Option<unsafe extern "C" fn(dev: *const audio_hw_device) -> u32>,
    pub init_check: Option<unsafe extern "C" fn(dev: *const audio_hw_device) -> c_int>,
    pub set_voice_volume: Option<unsafe extern "C" fn(dev: *mut audio_hw_device, volume: f32) -> c_int>,
    pub set_master_volume:
        Option<unsafe extern "C" fn(dev: *mut audio_hw_device, volume: f32) -> c_int>,
    pub get_master_volume:
        Option<unsafe extern "C" fn(dev: *mut audio_hw_device, volume: *mut f32) -> c_int>,
    pub set_mode: Option<unsafe extern "C" fn(dev: *mut audio_hw_device, mode: c_int) -> c_int>,
    pub set_mic_mute: Option<unsafe extern "C" fn(dev: *mut audio_hw_device, state: bool) -> c_int>,
    pub get_mic_mute:
        Option<unsafe extern "C" fn(dev: *const audio_hw_device, state: *mut bool) -> c_int>,
    pub set_parameters:
        Option<unsafe extern "C" fn(dev: *mut audio_hw_device, kv_pairs: *const c_char) -> c_int>,
    pub get_parameters: Option<
        unsafe extern "C" fn(dev: *const audio_hw_device, keys: *const c_char) -> *mut c_char,
    >,
    pub get_input_buffer_size: Option<
        unsafe extern "C" fn(dev: *const audio_hw_device, config: *const audio_config) -> size_t,
    >,
    pub open_output_stream: Option<
        unsafe extern "C" fn(
            dev: *mut audio_hw_device,
            handle: i32,
            devices: u32,
            flags: u32,
            config: *mut audio_config,
            stream_out: *mut *mut audio_stream_out,
            address: *const c_char,
        ) -> c_int,
    >,
    pub close_output_stream:
        Option<unsafe extern "C" fn(dev: *mut audio_hw_device, stream_out: *mut audio_stream_out)>,
    pub open_input_stream: Option<
        unsafe extern "C" fn(
            dev: *mut audio_hw_device,
            handle: i32,
            devices: u32,
            config: *mut audio_config,
            stream_in: *mut *mut audio_stream_in,
            flags: u32,
            address: *const c_char,
            source: c_int,
        ) -> c_int,
    >,
    pub close_input_stream:
        Option<unsafe extern "C" fn(dev: *mut audio_hw_device, stream_in: *mut audio_stream_in)>,
    pub get_microphones: Option<
        unsafe extern "C" fn(
            dev: *const audio_hw_device,
            mic_array: *mut c_void,
            mic_count: *mut size_t,
        ) -> c_int,
    >,
    pub dump: Option<unsafe extern "C" fn(dev: *const audio_hw_device, fd: c_int) -> c_int>,
    pub set_master_mute: Option<unsafe extern "C" fn(dev: *mut audio_hw_device, mute: bool) -> c_int>,
    pub get_master_mute:
        Option<unsafe extern "C" fn(dev: *mut audio_hw_device, mute: *mut bool) -> c_int>,
    pub create_audio_patch: Option<
        unsafe extern "C" fn(
            dev: *mut audio_hw_device,
            num_sources: c_uint,
            sources: *const audio_port_config,
            num_sinks: c_uint,
            sinks: *const audio_port_config,
            handle: *mut i32,
        ) -> c_int,
    >,
    pub release_audio_patch: Option<unsafe extern "C" fn(dev: *mut audio_hw_device, handle: i32) -> c_int>,
    pub get_audio_port: Option<unsafe extern "C" fn(dev: *mut audio_hw_device, port: *mut c_void) -> c_int>,
    pub set_audio_port_config: Option<
        unsafe extern "C" fn(dev: *mut audio_hw_device, config: *const audio_port_config) -> c_int,
    >,
}

// ── Layout checks ────────────────────────────────────────────────────────────

assert_eq_size!(Option<unsafe extern "C" fn()>, *const c_void);
const_assert_eq!(core::mem::size_of::<audio_gain_config>(), 144);
const_assert_eq!(core::mem::size_of::<audio_port_config_ext>(), 40);
const_assert_eq!(core::mem::size_of::<audio_port_config>(), 216);
const_assert_eq!(core::mem::offset_of!(audio_port_config, gain), 28);
const_assert_eq!(core::mem::offset_of!(audio_port_config, flags), 172);
const_assert_eq!(core::mem::offset_of!(audio_port_config, ext), 176);
const_assert_eq!(core::mem::offset_of!(audio_config, offload_info), 16);

#[cfg(target_pointer_width = "64")]
mod lp64 {
    use super::*;

    const_assert_eq!(core::mem::size_of::<hw_module_t>(), 248);
    const_assert_eq!(core::mem::size_of::<hw_device_t>(), 120);
    const_assert_eq!(core::mem::size_of::<audio_stream>(), 14 * 8);
    const_assert_eq!(core::mem::size_of::<audio_stream_out>(), (14 + 16) * 8);
    const_assert_eq!(core::mem::size_of::<audio_stream_in>(), (14 + 12) * 8);
    const_assert_eq!(core::mem::size_of::<audio_hw_device>(), 120 + 23 * 8);
    const_assert_eq!(core::mem::offset_of!(hw_device_t, close), 112);
}
