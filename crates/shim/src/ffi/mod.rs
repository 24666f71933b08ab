//! The legacy C surface.
//!
//! Each opened device or stream is a heap record whose first field is the
//! function table handed to the host. The host passes the table pointer back
//! as `this`, and the entry points cast it to the record (both are
//! `#[repr(C)]` with the table at offset 0). Records are created by the open
//! entry points and reclaimed by the matching close entry point. Closing a
//! record twice is undefined; the host owns that guarantee.

use hal::{HalError, Result};
use libc::{c_int, ssize_t};

mod alloc;
mod device;
mod marshal;
mod module;
mod stream_in;
mod stream_out;
pub mod types;

pub use module::{open_hw_device, ModuleDescriptor, HMI};

/// Effect attach/detach is accepted and ignored at the C surface.
fn effect_status(result: Result<()>) -> c_int {
    match result {
        Ok(()) | Err(HalError::Unsupported) => 0,
        Err(err) => err.to_status(),
    }
}

/// Widen a negative status into the `ssize_t` return of read/write.
fn ssize_status(status: c_int) -> ssize_t {
    ssize_t::try_from(status).unwrap_or(ssize_t::MIN)
}

/// Byte count as `ssize_t`, or the status of an unrepresentable count.
fn ssize_count(count: usize) -> ssize_t {
    ssize_t::try_from(count).unwrap_or_else(|_| ssize_status(HalError::InvalidOperation.to_status()))
}
