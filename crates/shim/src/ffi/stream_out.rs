//! `audio_stream_out` entry points.

use std::ptr::NonNull;
use std::slice;

use hal::{status_of, EffectHandle, HalError};
use libc::{c_char, c_int, c_long, c_void, size_t, ssize_t, time_t, timespec};

use super::marshal::{str_arg, to_c_string, with_fd_writer};
use super::types::{audio_stream, audio_stream_out, effect_handle_t};
use super::{effect_status, ssize_count, ssize_status};
use crate::stream::AudioStreamOut;

/// Heap record behind every `audio_stream_out*` handed to the host.
#[repr(C)]
pub(crate) struct StreamOutRecord {
    table: audio_stream_out,
    stream: AudioStreamOut,
}

impl StreamOutRecord {
    pub(crate) fn new(stream: AudioStreamOut) -> Self {
        Self {
            table: table(),
            stream,
        }
    }
}

/// # Safety
///
/// `ptr` must be null or a table pointer produced by `open_output_stream`
/// that has not been closed.
unsafe fn stream<'a, T>(ptr: *const T) -> Option<&'a AudioStreamOut> {
    // SAFETY: the table is at offset 0 of a live `StreamOutRecord`.
    let record = unsafe { ptr.cast::<StreamOutRecord>().as_ref() };
    if record.is_none() {
        tracing::error!("audio_stream_out: bad stream reference");
    }
    record.map(|r| &r.stream)
}

/// Reclaim an output record from the pointer the host passes to close.
///
/// # Safety
///
/// As for [`stream`]; the record must not be used afterwards.
pub(crate) unsafe fn reclaim(ptr: *mut audio_stream_out) -> Option<AudioStreamOut> {
    let ptr = NonNull::new(ptr.cast::<StreamOutRecord>())?;
    // SAFETY: per the caller, `ptr` came from `Slot::fill` and is live.
    Some(unsafe { super::alloc::reclaim(ptr) }.stream)
}

fn table() -> audio_stream_out {
    audio_stream_out {
        common: audio_stream {
            get_sample_rate: Some(out_get_sample_rate),
            set_sample_rate: Some(out_set_sample_rate),
            get_buffer_size: Some(out_get_buffer_size),
            get_channels: Some(out_get_channels),
            get_format: Some(out_get_format),
            set_format: Some(out_set_format),
            standby: Some(out_standby),
            dump: Some(out_dump),
            get_device: None,
            set_device: None,
            set_parameters: Some(out_set_parameters),
            get_parameters: Some(out_get_parameters),
            add_audio_effect: Some(out_add_audio_effect),
            remove_audio_effect: Some(out_remove_audio_effect),
        },
        get_latency: Some(out_get_latency),
        set_volume: Some(out_set_volume),
        write: Some(out_write),
        get_render_position: Some(out_get_render_position),
        get_next_write_timestamp: Some(out_get_next_write_timestamp),
        set_callback: None,
        pause: None,
        resume: None,
        drain: None,
        flush: None,
        get_presentation_position: Some(out_get_presentation_position),
        start: None,
        stop: None,
        create_mmap_buffer: None,
        get_mmap_position: None,
        update_source_metadata: None,
    }
}

// ── audio_stream ─────────────────────────────────────────────────────────────

unsafe extern "C" fn out_get_sample_rate(ptr: *const audio_stream) -> u32 {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(0, AudioStreamOut::sample_rate)
}

unsafe extern "C" fn out_set_sample_rate(ptr: *mut audio_stream, rate: u32) -> c_int {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(HalError::NotImplemented.to_status(), |out| {
        status_of(out.set_sample_rate(rate))
    })
}

unsafe extern "C" fn out_get_buffer_size(ptr: *const audio_stream) -> size_t {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(0, AudioStreamOut::buffer_size)
}

unsafe extern "C" fn out_get_channels(ptr: *const audio_stream) -> u32 {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(0, |out| out.channel_mask().0)
}

unsafe extern "C" fn out_get_format(ptr: *const audio_stream) -> u32 {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(0, |out| out.format().0)
}

unsafe extern "C" fn out_set_format(ptr: *mut audio_stream, format: u32) -> c_int {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(HalError::NotImplemented.to_status(), |out| {
        status_of(out.set_format(hal::AudioFormat(format)))
    })
}

unsafe extern "C" fn out_standby(ptr: *mut audio_stream) -> c_int {
    // SAFETY: the host passes back the table it was given.
    let Some(out) = (unsafe { stream(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    status_of(out.standby())
}

unsafe extern "C" fn out_dump(ptr: *const audio_stream, fd: c_int) -> c_int {
    // SAFETY: the host passes back the table it was given.
    let Some(out) = (unsafe { stream(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    status_of(with_fd_writer(fd, |sink| out.dump(sink)))
}

unsafe extern "C" fn out_set_parameters(ptr: *mut audio_stream, kv_pairs: *const c_char) -> c_int {
    // SAFETY: the host passes back the table it was given.
    let Some(out) = (unsafe { stream(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    // SAFETY: `kv_pairs` is null or a C string owned by the host for the call.
    let kv_pairs = unsafe { str_arg(kv_pairs) };
    status_of(out.set_parameters(&kv_pairs))
}

unsafe extern "C" fn out_get_parameters(ptr: *const audio_stream, keys: *const c_char) -> *mut c_char {
    // SAFETY: the host passes back the table it was given.
    let Some(out) = (unsafe { stream(ptr) }) else {
        return to_c_string("");
    };
    // SAFETY: `keys` is null or a C string owned by the host for the call.
    let keys = unsafe { str_arg(keys) };
    let values = out.parameters(&keys).unwrap_or_else(|err| {
        tracing::warn!(%err, "output get_parameters failed");
        String::new()
    });
    to_c_string(&values)
}

unsafe extern "C" fn out_add_audio_effect(ptr: *const audio_stream, effect: effect_handle_t) -> c_int {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(0, |out| {
        effect_status(out.add_audio_effect(EffectHandle(effect as usize)))
    })
}

unsafe extern "C" fn out_remove_audio_effect(
    ptr: *const audio_stream,
    effect: effect_handle_t,
) -> c_int {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(0, |out| {
        effect_status(out.remove_audio_effect(EffectHandle(effect as usize)))
    })
}

// ── audio_stream_out ─────────────────────────────────────────────────────────

unsafe extern "C" fn out_get_latency(ptr: *const audio_stream_out) -> u32 {
    // SAFETY: the host passes back the table it was given.
    unsafe { stream(ptr) }.map_or(0, AudioStreamOut::latency)
}

unsafe extern "C" fn out_set_volume(ptr: *mut audio_stream_out, left: f32, right: f32) -> c_int {
    // SAFETY: the host passes back the table it was given.
    let Some(out) = (unsafe { stream(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    status_of(out.set_volume(left, right))
}

unsafe extern "C" fn out_write(
    ptr: *mut audio_stream_out,
    buffer: *const c_void,
    bytes: size_t,
) -> ssize_t {
    // SAFETY: the host passes back the table it was given.
    let Some(out) = (unsafe { stream(ptr) }) else {
        return ssize_status(HalError::InvalidArgument.to_status());
    };
    let data: &[u8] = if bytes == 0 {
        &[]
    } else if buffer.is_null() {
        return ssize_status(HalError::InvalidArgument.to_status());
    } else {
        // SAFETY: the host guarantees `bytes` readable bytes at `buffer`.
        unsafe { slice::from_raw_parts(buffer.cast::<u8>(), bytes) }
    };
    match out.write(data) {
        Ok(written) => ssize_count(written),
        Err(err) => ssize_status(err.to_status()),
    }
}

unsafe extern "C" fn out_get_render_position(
    ptr: *const audio_stream_out,
    dsp_frames: *mut u32,
) -> c_int {
    // SAFETY: the host passes back the table it was given.
    let Some(out) = (unsafe { stream(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    // SAFETY: `dsp_frames` is null or valid for writes.
    let Some(dsp_frames) = (unsafe { dsp_frames.as_mut() }) else {
        return HalError::InvalidArgument.to_status();
    };
    *dsp_frames = 0;
    match out.render_position() {
        Ok(frames) => {
            *dsp_frames = frames;
            0
        }
        Err(err) => err.to_status(),
    }
}

unsafe extern "C" fn out_get_next_write_timestamp(
    ptr: *const audio_stream_out,
    timestamp: *mut i64,
) -> c_int {
    // SAFETY: the host passes back the table it was given.
    let Some(out) = (unsafe { stream(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    // SAFETY: `timestamp` is null or valid for writes.
    let Some(timestamp) = (unsafe { timestamp.as_mut() }) else {
        return HalError::InvalidArgument.to_status();
    };
    *timestamp = 0;
    match out.next_write_timestamp() {
        Ok(next) => {
            *timestamp = next;
            0
        }
        Err(err) => err.to_status(),
    }
}

unsafe extern "C" fn out_get_presentation_position(
    ptr: *const audio_stream_out,
    frames: *mut u64,
    timestamp: *mut timespec,
) -> c_int {
    // SAFETY: the host passes back the table it was given.
    let Some(out) = (unsafe { stream(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    // SAFETY: both out-params are null or valid for writes.
    let (Some(frames), Some(timestamp)) = (unsafe { (frames.as_mut(), timestamp.as_mut()) }) else {
        return HalError::InvalidArgument.to_status();
    };
    *frames = 0;
    match out.presentation_position() {
        Ok(position) => {
            *frames = position.frames;
            timestamp.tv_sec = time_t::try_from(position.timestamp.as_secs()).unwrap_or(time_t::MAX);
            timestamp.tv_nsec = c_long::try_from(position.timestamp.subsec_nanos()).unwrap_or(0);
            0
        }
        Err(err) => err.to_status(),
    }
}
