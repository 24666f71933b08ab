//! Legacy audio HAL adapter
//!
//! Presents the legacy C audio HAL function tables (`audio_hw_device`,
//! `audio_stream_out`, `audio_stream_in`) and the `HMI` module descriptor, and
//! forwards every entry point to a backend implementing the [`hal`] traits.
//!
//! # Architecture Layers
//!
//! ```text
//! Host loader / audio server
//!         ↓   dlsym("HMI") → methods->open → function tables
//! ffi       (extern "C" entry points, #[repr(C)] records)
//!         ↓   resolve `this`, marshal arguments, flatten Result to status
//! Safe records (HalModule, AudioHwDevice, AudioStreamOut, AudioStreamIn)
//!         ↓   Arc<dyn DeviceHal>, Arc<dyn StreamOutHal>, Arc<dyn StreamInHal>
//! Backend (registered factory, or the hal null backend)
//! ```
//!
//! The safe records carry the adapter policy (negotiated config write-back,
//! unsupported setters, zero defaults for value getters) and are usable
//! without going through C. The `ffi` layer only translates.
//!
//! # Embedding
//!
//! A host that links this crate registers its backend before the loader opens
//! the device:
//!
//! ```
//! use std::sync::Arc;
//! use hal::null::NullDevicesFactory;
//!
//! let _ = shim::register_devices_factory(Arc::new(NullDevicesFactory::new()));
//! ```
//!
//! # Configuration
//!
//! See [`ShimConfig`]: `AUDIO_HAL_SHIM_LOG` sets the `tracing` filter and
//! `AUDIO_HAL_SHIM_MODULE` the backend module identifier.

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // a panic in an extern "C" entry aborts the host
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod device;
pub mod ffi;
pub mod logging;
pub mod module;
pub mod registry;
pub mod stream;

pub use config::ShimConfig;
pub use device::AudioHwDevice;
pub use module::HalModule;
pub use registry::{devices_factory, register_devices_factory, RegistryError};
pub use stream::{AudioStreamIn, AudioStreamOut, Stream};
