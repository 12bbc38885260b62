//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::schema::{AppConfig, LogFormat, ServiceConfig};
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration file: {0}")]
    Layer(serde_json::Error),

    #[error("Invalid value for {var}: {reason}")]
    Env { var: String, reason: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Layer a TOML file over `base`.
///
/// Keys the file sets replace the base value; tables merge key by key, so
/// a file naming only `port` keeps every other field of `base`.
pub fn layer_toml<T>(base: &T, path: &Path) -> Result<T, ConfigError>
where
    T: Serialize + DeserializeOwned,
{
    let content = fs::read_to_string(path)?;
    let file: toml::Table = toml::from_str(&content)?;

    let mut merged = serde_json::to_value(base).map_err(ConfigError::Layer)?;
    merge(&mut merged, serde_json::to_value(file).map_err(ConfigError::Layer)?);
    serde_json::from_value(merged).map_err(ConfigError::Layer)
}

fn merge(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Environment overlay.
///
/// `lookup` is the variable source; the process passes `std::env::var`,
/// tests pass a map. Unset variables keep the current value, set but
/// unparseable ones are an error.
pub struct EnvOverlay<F> {
    lookup: F,
}

impl<F> EnvOverlay<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }

    /// Raw value of a variable, blank values treated as unset.
    pub fn get(&self, var: &str) -> Option<String> {
        (self.lookup)(var).filter(|v| !v.trim().is_empty())
    }

    fn parse<T>(&self, var: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(var) {
            Some(raw) => raw.trim().parse().map(Some).map_err(|e: T::Err| ConfigError::Env {
                var: var.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(None),
        }
    }

    /// Apply the shared variables to a service configuration.
    pub fn apply_service(&self, config: &mut ServiceConfig) -> Result<(), ConfigError> {
        if let Some(name) = self.get("SERVICE_NAME") {
            config.service_name = name;
        }
        if let Some(url) = self.get("DATABASE_URL") {
            config.db.url = url;
        }
        if let Some(url) = self.get("NATS_URL") {
            config.nats.url = url;
        }
        if let Some(queue) = self.get("NATS_QUEUE") {
            config.nats.queue = Some(queue);
        }
        if let Some(host) = self.get("TRANSPORT_HOST") {
            config.tcp.host = host;
        }
        if let Some(port) = self.parse("TRANSPORT_PORT")? {
            config.tcp.port = port;
        }
        if let Some(level) = self.get("LOG_LEVEL") {
            config.observability.log_level = level;
        }
        if let Some(format) = self.get("LOG_FORMAT") {
            config.observability.log_format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                other => {
                    return Err(ConfigError::Env {
                        var: "LOG_FORMAT".to_string(),
                        reason: format!("expected 'pretty' or 'json', got '{}'", other),
                    })
                }
            };
        }
        if let Some(address) = self.get("METRICS_ADDRESS") {
            config.observability.metrics_enabled = true;
            config.observability.metrics_address = address;
        }
        Ok(())
    }

    /// Apply the shared and HTTP variables to an application configuration.
    pub fn apply_app(&self, config: &mut AppConfig) -> Result<(), ConfigError> {
        self.apply_service(&mut config.service)?;
        if let Some(host) = self.get("HOST") {
            config.host = host;
        }
        if let Some(port) = self.parse("PORT")? {
            config.port = port;
        }
        if let Some(prefix) = self.get("PREFIX") {
            config.prefix = prefix;
        }
        Ok(())
    }
}
