//! Structured logging.
//!
//! Installs the global `tracing` subscriber. `RUST_LOG` takes precedence
//! over the configured level so operators can raise verbosity without
//! touching config.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Build the filter: `RUST_LOG` if set and valid, otherwise the configured level.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},tower_http={level},async_nats=warn",
            level = config.log_level
        ))
    })
}

/// Install the global subscriber. An already installed subscriber is kept.
pub fn init_tracing(config: &ObservabilityConfig) {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    let result = match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };

    if let Err(e) = result {
        tracing::warn!(error = %e, "Tracing subscriber already installed; keeping it");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_keeps_first_subscriber() {
        let config = ObservabilityConfig::default();
        init_tracing(&config);
        init_tracing(&ObservabilityConfig {
            log_format: LogFormat::Json,
            ..config
        });
        tracing::info!("still logging");
    }
}
