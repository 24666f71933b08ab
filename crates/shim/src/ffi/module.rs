//! The `HMI` module descriptor and its `open` entry point.

use std::ffi::CStr;
use std::ptr::{self, addr_of};

use hal::HalError;
use libc::{c_char, c_int};

use super::alloc::Slot;
use super::device::DeviceRecord;
use super::marshal::str_arg;
use super::types::{audio_module, hw_device_t, hw_module_methods_t, hw_module_t};
use crate::config::{
    ShimConfig, AUDIO_MODULE_API_VERSION_0_1, HARDWARE_HAL_API_VERSION, HARDWARE_MODULE_TAG,
};
use crate::logging;
use crate::module::HalModule;
use crate::registry;

const MODULE_ID: &CStr = c"audio";
const MODULE_NAME: &CStr = c"Legacy audio HAL adapter";
const MODULE_AUTHOR: &CStr = c"The Android Open Source Project";

/// `hw_module_t` wrapper the host reads through a shared static.
#[repr(transparent)]
pub struct ModuleDescriptor(pub audio_module);

// SAFETY: the descriptor is immutable after link time; its pointers refer to
// static C strings and the static method table.
unsafe impl Sync for ModuleDescriptor {}

static METHODS: hw_module_methods_t = hw_module_methods_t {
    open: Some(adev_open),
};

/// Symbol the host loader resolves in `audio.primary.*.so`.
#[no_mangle]
pub static HMI: ModuleDescriptor = ModuleDescriptor(audio_module {
    common: hw_module_t {
        tag: HARDWARE_MODULE_TAG,
        module_api_version: AUDIO_MODULE_API_VERSION_0_1,
        hal_api_version: HARDWARE_HAL_API_VERSION,
        id: MODULE_ID.as_ptr(),
        name: MODULE_NAME.as_ptr(),
        author: MODULE_AUTHOR.as_ptr(),
        methods: addr_of!(METHODS).cast_mut(),
        dso: ptr::null_mut(),
        reserved: [0; 25],
    },
});

unsafe extern "C" fn adev_open(
    module: *const hw_module_t,
    name: *const c_char,
    device: *mut *mut hw_device_t,
) -> c_int {
    let config = ShimConfig::from_env();
    logging::init(&config);
    let hal_module = HalModule::with_config(registry::devices_factory(), config);
    // SAFETY: the host passes a NUL-terminated name and a writable out-pointer.
    unsafe { open_hw_device(module, name, device, &hal_module) }
}

/// Open an audio device through `hal_module` and hand the host its table.
///
/// This is the body of the exported `open` entry point with the module made
/// explicit, so embedding hosts and tests can supply their own factory. On
/// success `*device` points at an `audio_hw_device` whose `common.close`
/// releases it.
///
/// Returns `-EINVAL` for a null `device` or an interface name other than
/// `"audio_hw_if"` (nothing is allocated in that case), `-ENOMEM` if the
/// record cannot be allocated, or the backend's status if it cannot open the
/// primary device.
///
/// # Safety
///
/// `name` must be null or a NUL-terminated string, and `device` must be null
/// or valid for writes. `module` is stored in the returned device unchanged.
pub unsafe fn open_hw_device(
    module: *const hw_module_t,
    name: *const c_char,
    device: *mut *mut hw_device_t,
    hal_module: &HalModule,
) -> c_int {
    // SAFETY: null or valid for writes per the caller.
    let Some(device) = (unsafe { device.as_mut() }) else {
        tracing::error!("adev_open: null device pointer");
        return HalError::InvalidArgument.to_status();
    };
    *device = ptr::null_mut();
    // SAFETY: null or NUL-terminated per the caller.
    let name = unsafe { str_arg(name) };
    if let Err(err) = HalModule::validate_interface(&name) {
        return err.to_status();
    }
    let slot = match Slot::<DeviceRecord>::try_new() {
        Ok(slot) => slot,
        Err(err) => return err.to_status(),
    };
    match hal_module.open(&name) {
        Ok(adev) => {
            *device = slot.fill(DeviceRecord::new(module, adev)).as_ptr().cast();
            0
        }
        Err(err) => err.to_status(),
    }
}
