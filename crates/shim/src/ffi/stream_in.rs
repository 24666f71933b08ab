//! `audio_stream_in` entry points.

use std::ptr::NonNull;
use std::slice;

use hal::{status_of, AudioFormat, EffectHandle, HalError};
use libc::{c_char, c_int, c_void, size_t, ssize_t};

use super::marshal::{str_arg, to_c_string, with_fd_writer};
use super::types::{audio_stream, audio_stream_in, effect_handle_t};
use super::{effect_status, ssize_count, ssize_status};
use crate::stream::AudioStreamIn;

/// Heap record behind every `audio_stream_in*` handed to the host.
#[repr(C)]
pub(crate) struct StreamInRecord {
    table: audio_stream_in,
    stream: AudioStreamIn,
}

impl StreamInRecord {
    pub(crate) fn new(stream: AudioStreamIn) -> Self {
        Self {
            table: table(),
            stream,
        }
    }
}

/// # Safety
///
/// `ptr` must be null or a table pointer produced by `open_input_stream`
/// that has not been closed.
unsafe fn stream<'a, T>(ptr: *const T) -> Option<&'a AudioStreamIn> {
    // SAFETY: the table is at offset 0 of a live `StreamInRecord`.
    let record = unsafe { ptr.cast::<StreamInRecord>().as_ref() };
    if record.is_none() {
        tracing::error!("audio_stream_in: bad stream reference");
    }
    record.map(|r| &r.stream)
}

/// Reclaim an input record from the pointer the host passes to close.
///
/// # Safety
///
/// As for [`stream`]; the record must not be used afterwards.
pub(crate) unsafe fn reclaim(ptr: *mut audio_stream_in) -> Option<AudioStreamIn> {
    let ptr = NonNull::new(ptr.cast::<StreamInRecord>())?;
    // SAFETY: per the caller, `ptr` came from `Slot::fill` and is live.
    Some(unsafe { super::alloc::reclaim(ptr) }.stream)
}

fn table() -> audio_stream_in {
    audio_stream_in {
        common: audio_stream {
            get_sample_rate: Some(in_get_sample_rate),
            set_sample_rate: Some(in_set_sample_rate),
            get_buffer_size: Some(in_get_buffer_size),
            get_channels: Some(in_get_channels),
            get_format: Some(in_get_format),
            set_format: Some(in_set_format),
            standby: Some(in_standby),
            dump: Some(in_dump),
            get_device: None,
            set_device: None,
            set_parameters: Some(in_set_parameters),
            get_parameters: Some(in_get_parameters),
            add_audio_effect: Some(in_add_audio_effect),
            remove_audio_effect: Some(in_remove_audio_effect),
        },
        set_gain: Some(in_set_gain),
        read: Some(in_read),
        get_input_frames_lost: Some(in_get_input_frames_lost),
        get_capture_position: None,
        start: None,
        stop: None,
        create_mmap_buffer: None,
        get_mmap_position: None,
        get_active_microphones: None,
        set_microphone_direction: None,
        set_microphone_field_dimension: None,
        update_sink_metadata: None,
    }
}

// ── audio_stream ─────────────────────────────────────────────────────────────

unsafe extern "C" fn in_get_sample_rate(ptr: *const audio_stream) -> u32 {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(0, AudioStreamIn::sample_rate)
}

unsafe extern "C" fn in_set_sample_rate(ptr: *mut audio_stream, rate: u32) -> c_int {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(HalError::NotImplemented.to_status(), |input| {
        status_of(input.set_sample_rate(rate))
    })
}

unsafe extern "C" fn in_get_buffer_size(ptr: *const audio_stream) -> size_t {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(0, AudioStreamIn::buffer_size)
}

unsafe extern "C" fn in_get_channels(ptr: *const audio_stream) -> u32 {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(0, |input| input.channel_mask().0)
}

unsafe extern "C" fn in_get_format(ptr: *const audio_stream) -> u32 {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(0, |input| input.format().0)
}

unsafe extern "C" fn in_set_format(ptr: *mut audio_stream, format: u32) -> c_int {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(HalError::NotImplemented.to_status(), |input| {
        status_of(input.set_format(AudioFormat(format)))
    })
}

unsafe extern "C" fn in_standby(ptr: *mut audio_stream) -> c_int {
    // SAFETY: the host passes back the table it was given.
    let Some(input) = (unsafe { stream(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    status_of(input.standby())
}

unsafe extern "C" fn in_dump(ptr: *const audio_stream, fd: c_int) -> c_int {
    // SAFETY: the host passes back the table it was given.
    let Some(input) = (unsafe { stream(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    status_of(with_fd_writer(fd, |sink| input.dump(sink)))
}

unsafe extern "C" fn in_set_parameters(ptr: *mut audio_stream, kv_pairs: *const c_char) -> c_int {
    // SAFETY: the host passes back the table it was given.
    let Some(input) = (unsafe { stream(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    // SAFETY: `kv_pairs` is null or a C string owned by the host for the call.
    let kv_pairs = unsafe { str_arg(kv_pairs) };
    status_of(input.set_parameters(&kv_pairs))
}

unsafe extern "C" fn in_get_parameters(ptr: *const audio_stream, keys: *const c_char) -> *mut c_char {
    // SAFETY: the host passes back the table it was given.
    let Some(input) = (unsafe { stream(ptr) }) else {
        return to_c_string("");
    };
    // SAFETY: `keys` is null or a C string owned by the host for the call.
    let keys = unsafe { str_arg(keys) };
    let values = input.parameters(&keys).unwrap_or_else(|err| {
        tracing::warn!(%err, "input get_parameters failed");
        String::new()
    });
    to_c_string(&values)
}

unsafe extern "C" fn in_add_audio_effect(ptr: *const audio_stream, effect: effect_handle_t) -> c_int {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(0, |input| {
        effect_status(input.add_audio_effect(EffectHandle(effect as usize)))
    })
}

unsafe extern "C" fn in_remove_audio_effect(ptr: *const audio_stream, effect: effect_handle_t) -> c_int {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(0, |input| {
        effect_status(input.remove_audio_effect(EffectHandle(effect as usize)))
    })
}

// ── audio_stream_in ──────────────────────────────────────────────────────────

unsafe extern "C" fn in_set_gain(ptr: *mut audio_stream_in, gain: f32) -> c_int {
    // SAFETY: the host passes back the table it was given.
    let Some(input) = (unsafe { stream(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    status_of(input.set_gain(gain))
}

unsafe extern "C" fn in_read(ptr: *mut audio_stream_in, buffer: *mut c_void, bytes: size_t) -> ssize_t {
    // SAFETY: the host passes back the table it was given.
    let Some(input) = (unsafe { stream(ptr) }) else {
        return ssize_status(HalError::InvalidArgument.to_status());
    };
    let data: &mut [u8] = if bytes == 0 {
        &mut []
    } else if buffer.is_null() {
        return ssize_status(HalError::InvalidArgument.to_status());
    } else {
        // SAFETY: the host guarantees `bytes` writable bytes at `buffer`.
        unsafe { slice::from_raw_parts_mut(buffer.cast::<u8>(), bytes) }
    };
    match input.read(data) {
        Ok(filled) => ssize_count(filled),
        Err(err) => ssize_status(err.to_status()),
    }
}

unsafe extern "C" fn in_get_input_frames_lost(ptr: *mut audio_stream_in) -> u32 {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(0, AudioStreamIn::input_frames_lost)
}
