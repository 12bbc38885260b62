//! Notification service configuration.
//!
//! Defaults, then the optional TOML file, then the environment.

use std::path::Path;

use crate::config::{
    loader, validate_app_config, AppConfig, ConfigError, DatabaseConfig, EnvOverlay, ServiceConfig,
};

pub const SERVICE_NAME: &str = "NotificationService";

pub const DATABASE_URL: &str = "postgres://postgres@127.0.0.1:5432/notification-service";

/// Configuration used when neither a file nor the environment says otherwise.
pub fn default_config() -> AppConfig {
    AppConfig {
        service: ServiceConfig {
            service_name: SERVICE_NAME.to_string(),
            db: DatabaseConfig {
                url: DATABASE_URL.to_string(),
                ..DatabaseConfig::default()
            },
            ..ServiceConfig::default()
        },
        ..AppConfig::default()
    }
}

/// Build the application configuration for the HTTP modes.
pub fn app_config<F>(path: Option<&Path>, env: &EnvOverlay<F>) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => loader::layer_toml(&default_config(), path)?,
        None => default_config(),
    };
    env.apply_app(&mut config)?;
    validate_app_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the service configuration for the socket mode.
///
/// HTTP-only variables are ignored.
pub fn service_config<F>(path: Option<&Path>, env: &EnvOverlay<F>) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => loader::layer_toml(&default_config().service, path)?,
        None => default_config().service,
    };
    env.apply_service(&mut config)?;
    crate::config::validate_service_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
