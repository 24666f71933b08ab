//! Fixed ABI identifiers and runtime configuration.
//!
//! The identifiers below are what the host loader matches on; they are not
//! configurable. [`ShimConfig`] covers the knobs an integrator may want to
//! change without rebuilding.

use std::env;

// ── Loader identifiers ───────────────────────────────────────────────────────

/// Module id the host looks up (`AUDIO_HARDWARE_MODULE_ID`).
pub const AUDIO_HARDWARE_MODULE_ID: &str = "audio";
/// Device interface name the host passes to `open` (`AUDIO_HARDWARE_INTERFACE`).
pub const AUDIO_HARDWARE_INTERFACE: &str = "audio_hw_if";
/// Backend module opened for every device (`AUDIO_HARDWARE_MODULE_ID_PRIMARY`).
pub const AUDIO_HARDWARE_MODULE_ID_PRIMARY: &str = "primary";

/// Human-readable module name in the descriptor.
pub const MODULE_NAME: &str = "Legacy audio HAL adapter";
/// Author string in the descriptor.
pub const MODULE_AUTHOR: &str = "The Android Open Source Project";

const fn make_tag(tag: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*tag)
}

/// `'HWMT'`, first word of every module descriptor.
pub const HARDWARE_MODULE_TAG: u32 = make_tag(b"HWMT");
/// `'HWDT'`, first word of every device.
pub const HARDWARE_DEVICE_TAG: u32 = make_tag(b"HWDT");

/// Version of the module/device header layout (1.0).
pub const HARDWARE_HAL_API_VERSION: u16 = 0x0100;
/// Audio module API version advertised by the descriptor (0.1).
pub const AUDIO_MODULE_API_VERSION_0_1: u16 = 0x0001;
/// Audio device API version of the function table (2.0).
pub const AUDIO_DEVICE_API_VERSION_2_0: u32 = 0x0200;

// ── Runtime configuration ────────────────────────────────────────────────────

/// Environment variable holding a `tracing` filter directive.
pub const LOG_FILTER_ENV: &str = "AUDIO_HAL_SHIM_LOG";
/// Environment variable overriding the backend module identifier.
pub const PRIMARY_MODULE_ENV: &str = "AUDIO_HAL_SHIM_MODULE";
/// Filter used when none is configured.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Runtime settings of the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimConfig {
    /// `tracing` filter directive, e.g. `"shim=trace,info"`.
    pub log_filter: String,
    /// Module identifier passed to the backend factory on device open.
    pub primary_module: String,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            primary_module: AUDIO_HARDWARE_MODULE_ID_PRIMARY.to_owned(),
        }
    }
}

impl ShimConfig {
    /// Read [`LOG_FILTER_ENV`] and [`PRIMARY_MODULE_ENV`], keeping defaults for
    /// unset or empty variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            log_filter: non_empty(LOG_FILTER_ENV).unwrap_or(defaults.log_filter),
            primary_module: non_empty(PRIMARY_MODULE_ENV).unwrap_or(defaults.primary_module),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_spell_their_ascii() {
        assert_eq!(HARDWARE_MODULE_TAG, 0x4857_4D54);
        assert_eq!(HARDWARE_DEVICE_TAG, 0x4857_4454);
    }

    #[test]
    fn defaults_target_primary_module() {
        let config = ShimConfig::default();
        assert_eq!(config.primary_module, "primary");
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config = ShimConfig::from_lookup(|key| match key {
            LOG_FILTER_ENV => Some("shim=trace".to_owned()),
            PRIMARY_MODULE_ENV => Some("usb".to_owned()),
            _ => None,
        });
        assert_eq!(config.log_filter, "shim=trace");
        assert_eq!(config.primary_module, "usb");
    }

    #[test]
    fn empty_values_fall_back() {
        let config = ShimConfig::from_lookup(|_| Some("  ".to_owned()));
        assert_eq!(config, ShimConfig::default());
    }
}
