//! Module lifecycle: validate the interface name and open a device.

use std::sync::Arc;

use hal::{DevicesFactoryHal, HalError, Result};

use crate::config::{ShimConfig, AUDIO_HARDWARE_INTERFACE};
use crate::device::AudioHwDevice;

/// The hardware module: a factory plus the settings used to open devices.
pub struct HalModule {
    factory: Arc<dyn DevicesFactoryHal>,
    config: ShimConfig,
}

impl HalModule {
    /// Module with default settings.
    pub fn new(factory: Arc<dyn DevicesFactoryHal>) -> Self {
        Self::with_config(factory, ShimConfig::default())
    }

    /// Module with explicit settings.
    pub fn with_config(factory: Arc<dyn DevicesFactoryHal>, config: ShimConfig) -> Self {
        Self { factory, config }
    }

    /// Settings in use.
    pub fn config(&self) -> &ShimConfig {
        &self.config
    }

    /// Check that `name` is the audio device interface.
    pub fn validate_interface(name: &str) -> Result<()> {
        if name == AUDIO_HARDWARE_INTERFACE {
            Ok(())
        } else {
            tracing::warn!(name, expected = AUDIO_HARDWARE_INTERFACE, "unknown device interface");
            Err(HalError::InvalidArgument)
        }
    }

    /// Open the audio device named `name` (must be `"audio_hw_if"`).
    ///
    /// The backend device is always the configured primary module.
    pub fn open(&self, name: &str) -> Result<AudioHwDevice> {
        tracing::trace!(name, "adev_open");
        Self::validate_interface(name)?;
        let module = self.config.primary_module.as_str();
        let hal = self.factory.open_device(module).map_err(|err| {
            tracing::error!(%err, status = err.to_status(), module, "backend open_device failed");
            err
        })?;
        Ok(AudioHwDevice::new(hal))
    }
}
