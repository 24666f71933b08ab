//! Backend device factory

use std::sync::Arc;

use crate::device::DeviceHal;
use crate::error::Result;

/// Opens backend devices by hardware module identifier (`"primary"`, `"usb"`, …).
pub trait DevicesFactoryHal: Send + Sync {
    /// Open the device for `module`.
    ///
    /// Every call yields an independent handle; the shim opens one per
    /// legacy device it hands out.
    fn open_device(&self, module: &str) -> Result<Arc<dyn DeviceHal>>;
}
