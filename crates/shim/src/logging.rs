//! `tracing` subscriber setup for hosts that do not install one.

use std::sync::Once;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{ShimConfig, DEFAULT_LOG_FILTER};

static INIT: Once = Once::new();

/// Install a stderr `fmt` subscriber filtered by `config.log_filter`.
///
/// Runs at most once per process. If the host already set a global
/// subscriber, that one is kept and this is a no-op.
pub fn init(config: &ShimConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_new(&config.log_filter)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .is_ok();
        if installed {
            tracing::debug!(filter = %config.log_filter, "audio HAL shim logging initialised");
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[test]
    fn init_is_idempotent() {
        let config = ShimConfig {
            log_filter: "not a [valid filter".to_owned(),
            ..ShimConfig::default()
        };
        init(&config);
        assert!(tracing::dispatcher::has_been_set());
        let installed = LevelFilter::current();

        let verbose = ShimConfig {
            log_filter: "trace".to_owned(),
            ..ShimConfig::default()
        };
        init(&verbose);
        assert!(tracing::dispatcher::has_been_set());
        assert_eq!(LevelFilter::current(), installed);
    }
}
