//! Process-wide backend factory used by the exported `HMI` descriptor.
//!
//! The C loader gives the module no way to receive a factory, so an embedding
//! host registers one before the first device open. Without a registration
//! the built-in null backend is used.

use std::sync::{Arc, OnceLock};

use hal::null::NullDevicesFactory;
use hal::DevicesFactoryHal;
use thiserror::Error;

static FACTORY: OnceLock<Arc<dyn DevicesFactoryHal>> = OnceLock::new();

/// Registration was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A factory is already in place (registered, or defaulted by a device open).
    #[error("a devices factory is already registered")]
    AlreadyRegistered,
}

/// Install the factory the exported module opens devices with.
///
/// Must happen before the first device open; the factory cannot be replaced.
pub fn register_devices_factory(factory: Arc<dyn DevicesFactoryHal>) -> Result<(), RegistryError> {
    FACTORY
        .set(factory)
        .map_err(|_| RegistryError::AlreadyRegistered)?;
    tracing::info!("devices factory registered");
    Ok(())
}

/// The registered factory, installing the null backend if there is none.
pub fn devices_factory() -> Arc<dyn DevicesFactoryHal> {
    Arc::clone(FACTORY.get_or_init(|| {
        tracing::warn!("no devices factory registered, using the null backend");
        Arc::new(NullDevicesFactory::new())
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn second_registration_is_refused() {
        // The first call may lose to a default installed elsewhere; the second never wins.
        let _ = register_devices_factory(Arc::new(NullDevicesFactory::new()));
        let second = register_devices_factory(Arc::new(NullDevicesFactory::new()));
        assert_eq!(second, Err(RegistryError::AlreadyRegistered));
        assert!(devices_factory().open_device("primary").is_ok());
    }
}
