//! Tracing setup for processes that embed the engine.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::EngineConfig;

/// Builds the log filter: `RUST_LOG` when set, the configured level otherwise.
pub fn env_filter(config: &EngineConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into())
}

/// Installs a global JSON subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(config: &EngineConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
        .context("failed to install tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let config = EngineConfig::default();
        // Another test may have installed a subscriber first; either way the
        // second call in this test must report an error rather than panic.
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
