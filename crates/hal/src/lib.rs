//! Backend audio HAL interface
//!
//! This crate defines the capability traits a backend audio service implements,
//! so that the legacy function-table adapter (`shim` crate) can forward every
//! call without knowing which backend it is talking to.
//!
//! # Architecture Layers
//!
//! ```text
//! Host platform (C loader, audio server)
//!         ↓   legacy function tables
//! Adapter shim (shim crate)
//!         ↓   Arc<dyn DeviceHal>, Arc<dyn StreamOutHal>, Arc<dyn StreamInHal>
//! Backend HAL interface (this crate - trait abstractions)
//!         ↓
//! Concrete backend (null backend, mocks, or a platform service)
//! ```
//!
//! # Capability traits
//!
//! - [`DevicesFactoryHal`] - Opens a backend device by module identifier
//! - [`DeviceHal`] - Volume, mute, mode, parameters, streams, patches
//! - [`StreamHal`] - Properties and control shared by both directions
//! - [`StreamOutHal`] - Playback: write, latency, positions
//! - [`StreamInHal`] - Capture: read, gain, overrun accounting
//!
//! # Features
//!
//! - `mock`: Recording fake backend ([`mocks`]) for contract tests
//!
//! # Example
//!
//! ```
//! use hal::null::NullDevicesFactory;
//! use hal::DevicesFactoryHal;
//!
//! let factory = NullDevicesFactory::new();
//! let device = factory.open_device("primary").unwrap();
//! device.init_check().unwrap();
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer tracing over println! in lib code
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)] // status accessors — callers decide

pub mod device;
pub mod error;
pub mod factory;
pub mod null;
pub mod params;
pub mod stream;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mocks;

// Re-export main capability traits
pub use device::DeviceHal;
pub use error::{status_of, HalError, Result};
pub use factory::DevicesFactoryHal;
pub use stream::{StreamHal, StreamInHal, StreamOutHal};

// Re-export domain types
pub use params::KeyValuePairs;
pub use types::{
    AudioConfig, AudioConfigBase, AudioFormat, AudioMode, AudioSource, ChannelMask, DeviceType,
    EffectHandle, GainConfig, InputFlags, IoHandle, ModuleHandle, OffloadInfo, OutputFlags,
    PatchHandle, PortConfig, PortConfigExt, PortHandle, PortRole, PresentationPosition,
};
