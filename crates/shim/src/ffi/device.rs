//! `audio_hw_device` entry points.

use std::ptr::{self, NonNull};

use hal::{
    status_of, AudioConfig, AudioMode, AudioSource, DeviceType, HalError, InputFlags, IoHandle,
    OutputFlags, PatchHandle,
};
use libc::{c_char, c_int, c_uint, size_t};

use super::alloc::{self, Slot};
use super::marshal::{ports_from_raw, store_negotiated, str_arg, to_c_string, with_fd_writer};
use super::stream_in::{self, StreamInRecord};
use super::stream_out::{self, StreamOutRecord};
use super::types::{
    audio_config, audio_hw_device, audio_port_config, audio_stream_in, audio_stream_out,
    hw_device_t, hw_module_t,
};
use crate::config::{AUDIO_DEVICE_API_VERSION_2_0, HARDWARE_DEVICE_TAG};
use crate::device::AudioHwDevice;

/// Heap record behind the `hw_device_t*` returned from module open.
#[repr(C)]
pub(crate) struct DeviceRecord {
    table: audio_hw_device,
    device: AudioHwDevice,
}

impl DeviceRecord {
    pub(crate) fn new(module: *const hw_module_t, device: AudioHwDevice) -> Self {
        Self {
            table: table(module),
            device,
        }
    }
}

fn table(module: *const hw_module_t) -> audio_hw_device {
    audio_hw_device {
        common: hw_device_t {
            tag: HARDWARE_DEVICE_TAG,
            version: AUDIO_DEVICE_API_VERSION_2_0,
            module: module.cast_mut(),
            reserved: [0; 12],
            close: Some(adev_close),
        },
        get_supported_devices: None,
        init_check: Some(adev_init_check),
        set_voice_volume: Some(adev_set_voice_volume),
        set_master_volume: Some(adev_set_master_volume),
        get_master_volume: Some(adev_get_master_volume),
        set_mode: Some(adev_set_mode),
        set_mic_mute: Some(adev_set_mic_mute),
        get_mic_mute: Some(adev_get_mic_mute),
        set_parameters: Some(adev_set_parameters),
        get_parameters: Some(adev_get_parameters),
        get_input_buffer_size: Some(adev_get_input_buffer_size),
        open_output_stream: Some(adev_open_output_stream),
        close_output_stream: Some(adev_close_output_stream),
        open_input_stream: Some(adev_open_input_stream),
        close_input_stream: Some(adev_close_input_stream),
        get_microphones: None,
        dump: Some(adev_dump),
        set_master_mute: Some(adev_set_master_mute),
        get_master_mute: Some(adev_get_master_mute),
        create_audio_patch: Some(adev_create_audio_patch),
        release_audio_patch: Some(adev_release_audio_patch),
        get_audio_port: None,
        set_audio_port_config: None,
    }
}

/// # Safety
///
/// `ptr` must be null or a device pointer produced by module open that has
/// not been closed.
unsafe fn device<'a, T>(ptr: *const T) -> Option<&'a AudioHwDevice> {
    // SAFETY: the table is at offset 0 of a live `DeviceRecord`.
    let record = unsafe { ptr.cast::<DeviceRecord>().as_ref() };
    if record.is_none() {
        tracing::error!("audio_hw_device: bad device reference");
    }
    record.map(|r| &r.device)
}

/// Write `value` through an out-pointer, or fail with `-EINVAL` when it is null.
///
/// # Safety
///
/// `out` must be null or valid for writes.
unsafe fn store<T>(out: *mut T, value: T) -> c_int {
    // SAFETY: null or valid per the caller.
    match unsafe { out.as_mut() } {
        Some(slot) => {
            *slot = value;
            0
        }
        None => HalError::InvalidArgument.to_status(),
    }
}

unsafe extern "C" fn adev_close(ptr: *mut hw_device_t) -> c_int {
    let Some(ptr) = NonNull::new(ptr.cast::<DeviceRecord>()) else {
        tracing::error!("audio_hw_device: bad device reference");
        return HalError::InvalidArgument.to_status();
    };
    // SAFETY: the host closes each device it opened exactly once.
    drop(unsafe { alloc::reclaim(ptr) });
    0
}

unsafe extern "C" fn adev_init_check(ptr: *const audio_hw_device) -> c_int {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    status_of(adev.init_check())
}

unsafe extern "C" fn adev_set_voice_volume(ptr: *mut audio_hw_device, volume: f32) -> c_int {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    status_of(adev.set_voice_volume(volume))
}

unsafe extern "C" fn adev_set_master_volume(ptr: *mut audio_hw_device, volume: f32) -> c_int {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    status_of(adev.set_master_volume(volume))
}

unsafe extern "C" fn adev_get_master_volume(ptr: *mut audio_hw_device, volume: *mut f32) -> c_int {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    match adev.master_volume() {
        // SAFETY: `volume` is null or valid for writes.
        Ok(value) => unsafe { store(volume, value) },
        Err(err) => err.to_status(),
    }
}

unsafe extern "C" fn adev_set_master_mute(ptr: *mut audio_hw_device, muted: bool) -> c_int {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    status_of(adev.set_master_mute(muted))
}

unsafe extern "C" fn adev_get_master_mute(ptr: *mut audio_hw_device, muted: *mut bool) -> c_int {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    match adev.master_mute() {
        // SAFETY: `muted` is null or valid for writes.
        Ok(value) => unsafe { store(muted, value) },
        Err(err) => err.to_status(),
    }
}

unsafe extern "C" fn adev_set_mode(ptr: *mut audio_hw_device, mode: c_int) -> c_int {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    status_of(adev.set_mode(AudioMode(mode)))
}

unsafe extern "C" fn adev_set_mic_mute(ptr: *mut audio_hw_device, muted: bool) -> c_int {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    status_of(adev.set_mic_mute(muted))
}

unsafe extern "C" fn adev_get_mic_mute(ptr: *const audio_hw_device, muted: *mut bool) -> c_int {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    match adev.mic_mute() {
        // SAFETY: `muted` is null or valid for writes.
        Ok(value) => unsafe { store(muted, value) },
        Err(err) => err.to_status(),
    }
}

unsafe extern "C" fn adev_set_parameters(ptr: *mut audio_hw_device, kv_pairs: *const c_char) -> c_int {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    // SAFETY: `kv_pairs` is null or a C string owned by the host for the call.
    let kv_pairs = unsafe { str_arg(kv_pairs) };
    status_of(adev.set_parameters(&kv_pairs))
}

unsafe extern "C" fn adev_get_parameters(ptr: *const audio_hw_device, keys: *const c_char) -> *mut c_char {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return to_c_string("");
    };
    // SAFETY: `keys` is null or a C string owned by the host for the call.
    let keys = unsafe { str_arg(keys) };
    let values = adev.parameters(&keys).unwrap_or_else(|err| {
        tracing::warn!(%err, "device get_parameters failed");
        String::new()
    });
    to_c_string(&values)
}

unsafe extern "C" fn adev_get_input_buffer_size(
    ptr: *const audio_hw_device,
    config: *const audio_config,
) -> size_t {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return 0;
    };
    // SAFETY: `config` is null or points to an initialised struct.
    let Some(config) = (unsafe { config.as_ref() }) else {
        tracing::error!("get_input_buffer_size: null config");
        return 0;
    };
    adev.input_buffer_size(&AudioConfig::from(config))
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn adev_open_output_stream(
    ptr: *mut audio_hw_device,
    handle: i32,
    devices: u32,
    flags: u32,
    config: *mut audio_config,
    stream_out: *mut *mut audio_stream_out,
    address: *const c_char,
) -> c_int {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    // SAFETY: both out-params are null or valid for reads and writes.
    let (Some(raw_config), Some(stream_out)) = (unsafe { (config.as_mut(), stream_out.as_mut()) })
    else {
        tracing::error!("open_output_stream: null config or stream pointer");
        return HalError::InvalidArgument.to_status();
    };
    *stream_out = ptr::null_mut();
    let slot = match Slot::<StreamOutRecord>::try_new() {
        Ok(slot) => slot,
        Err(err) => return err.to_status(),
    };
    // SAFETY: `address` is null or a C string owned by the host for the call.
    let address = unsafe { str_arg(address) };
    let mut config = AudioConfig::from(&*raw_config);
    let opened = adev.open_output_stream(
        IoHandle(handle),
        DeviceType(devices),
        OutputFlags(flags),
        &mut config,
        &address,
    );
    store_negotiated(raw_config, &config);
    match opened {
        Ok(stream) => {
            *stream_out = slot.fill(StreamOutRecord::new(stream)).as_ptr().cast();
            0
        }
        Err(err) => err.to_status(),
    }
}

unsafe extern "C" fn adev_close_output_stream(ptr: *mut audio_hw_device, stream: *mut audio_stream_out) {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return;
    };
    // SAFETY: the host closes each stream it opened exactly once.
    match unsafe { stream_out::reclaim(stream) } {
        Some(stream) => adev.close_output_stream(stream),
        None => tracing::error!("close_output_stream: bad stream reference"),
    }
}

#[allow(clippy::too_many_arguments)]
unsafe extern "C" fn adev_open_input_stream(
    ptr: *mut audio_hw_device,
    handle: i32,
    devices: u32,
    config: *mut audio_config,
    stream_in: *mut *mut audio_stream_in,
    flags: u32,
    address: *const c_char,
    source: c_int,
) -> c_int {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    // SAFETY: both out-params are null or valid for reads and writes.
    let (Some(raw_config), Some(stream_in)) = (unsafe { (config.as_mut(), stream_in.as_mut()) })
    else {
        tracing::error!("open_input_stream: null config or stream pointer");
        return HalError::InvalidArgument.to_status();
    };
    *stream_in = ptr::null_mut();
    let slot = match Slot::<StreamInRecord>::try_new() {
        Ok(slot) => slot,
        Err(err) => return err.to_status(),
    };
    // SAFETY: `address` is null or a C string owned by the host for the call.
    let address = unsafe { str_arg(address) };
    let mut config = AudioConfig::from(&*raw_config);
    let opened = adev.open_input_stream(
        IoHandle(handle),
        DeviceType(devices),
        &mut config,
        InputFlags(flags),
        &address,
        AudioSource(source),
    );
    store_negotiated(raw_config, &config);
    match opened {
        Ok(stream) => {
            *stream_in = slot.fill(StreamInRecord::new(stream)).as_ptr().cast();
            0
        }
        Err(err) => err.to_status(),
    }
}

unsafe extern "C" fn adev_close_input_stream(ptr: *mut audio_hw_device, stream: *mut audio_stream_in) {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return;
    };
    // SAFETY: the host closes each stream it opened exactly once.
    match unsafe { stream_in::reclaim(stream) } {
        Some(stream) => adev.close_input_stream(stream),
        None => tracing::error!("close_input_stream: bad stream reference"),
    }
}

unsafe extern "C" fn adev_dump(ptr: *const audio_hw_device, fd: c_int) -> c_int {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    status_of(with_fd_writer(fd, |sink| adev.dump(sink)))
}

unsafe extern "C" fn adev_create_audio_patch(
    ptr: *mut audio_hw_device,
    num_sources: c_uint,
    sources: *const audio_port_config,
    num_sinks: c_uint,
    sinks: *const audio_port_config,
    handle: *mut i32,
) -> c_int {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    // SAFETY: `handle` is null or valid for reads and writes.
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        tracing::error!("create_audio_patch: null handle");
        return HalError::InvalidArgument.to_status();
    };
    // SAFETY: the host supplies `num_*` initialised entries behind each array.
    let ports = unsafe { (ports_from_raw(sources, num_sources), ports_from_raw(sinks, num_sinks)) };
    let (sources, sinks) = match ports {
        (Ok(sources), Ok(sinks)) => (sources, sinks),
        (Err(err), _) | (_, Err(err)) => {
            tracing::error!(%err, "create_audio_patch: bad port array");
            return err.to_status();
        }
    };
    match adev.create_audio_patch(&sources, &sinks, PatchHandle(*handle)) {
        Ok(patch) => {
            *handle = patch.0;
            0
        }
        Err(err) => err.to_status(),
    }
}

unsafe extern "C" fn adev_release_audio_patch(ptr: *mut audio_hw_device, handle: i32) -> c_int {
    // SAFETY: the host passes back the device it was given.
    let Some(adev) = (unsafe { device(ptr) }) else {
        return HalError::InvalidArgument.to_status();
    };
    status_of(adev.release_audio_patch(PatchHandle(handle)))
}
