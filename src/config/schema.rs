//! Configuration schema definitions.
//!
//! This module defines the configuration records handed to the launcher.
//! All types derive Serde traits for deserialization from config files and
//! carry defaults so a minimal file (or no file at all) is enough.

use std::collections::BTreeMap;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// Configuration shared by every launch mode.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Display name, used for log context and the API document title.
    pub service_name: String,

    /// Database connection options. Carried for the service, never opened here.
    pub db: DatabaseConfig,

    /// Message broker options (publish/subscribe transport).
    pub nats: NatsConfig,

    /// Point-to-point socket transport options.
    pub tcp: TcpTransportConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: "service".to_string(),
            db: DatabaseConfig::default(),
            nats: NatsConfig::default(),
            tcp: TcpTransportConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Configuration for modes that serve HTTP.
///
/// Extends [`ServiceConfig`]; the shared fields are reachable through `Deref`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(flatten)]
    pub service: ServiceConfig,

    /// Interface to bind (e.g., "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port. `0` asks the OS for a free port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path prefix every route and the API document are mounted under.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_prefix() -> String {
    "/api".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            host: default_host(),
            port: default_port(),
            prefix: default_prefix(),
        }
    }
}

impl Deref for AppConfig {
    type Target = ServiceConfig;

    fn deref(&self) -> &ServiceConfig {
        &self.service
    }
}

impl AsRef<ServiceConfig> for AppConfig {
    fn as_ref(&self) -> &ServiceConfig {
        &self.service
    }
}

impl AppConfig {
    /// `host:port` as handed to the socket layer.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database connection options.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Driver name (e.g., "postgres").
    pub kind: String,

    /// Connection URL.
    pub url: String,

    /// Driver-specific extras, passed through untouched.
    pub options: BTreeMap<String, serde_json::Value>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            kind: "postgres".to_string(),
            url: "postgres://postgres@127.0.0.1:5432/postgres".to_string(),
            options: BTreeMap::new(),
        }
    }
}

/// NATS broker options.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NatsConfig {
    /// Broker URL (e.g., "nats://127.0.0.1:4222").
    pub url: String,

    /// Client connection name reported to the broker.
    pub name: Option<String>,

    /// Queue group; when set, instances share the subscription load.
    pub queue: Option<String>,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://127.0.0.1:4222".to_string(),
            name: None,
            queue: None,
        }
    }
}

/// Point-to-point transport options.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TcpTransportConfig {
    /// Interface to bind.
    pub host: String,

    /// Port to bind. `0` asks the OS for a free port.
    pub port: u16,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// Largest accepted frame payload in bytes.
    pub max_frame_bytes: usize,
}

impl Default for TcpTransportConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            max_connections: 1_024,
            max_frame_bytes: 1024 * 1024,
        }
    }
}

impl TcpTransportConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Human readable or JSON lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_derefs_to_service_config() {
        let mut config = AppConfig::default();
        config.service.service_name = "NotificationService".into();

        assert_eq!(config.service_name, "NotificationService");
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            service_name = "Mailer"
            port = 8080

            [nats]
            url = "nats://broker:4222"
            "#,
        )
        .unwrap();

        assert_eq!(config.service_name, "Mailer");
        assert_eq!(config.port, 8080);
        assert_eq!(config.prefix, "/api");
        assert_eq!(config.nats.url, "nats://broker:4222");
        assert_eq!(config.tcp.port, 3001);
        assert_eq!(config.db.kind, "postgres");
    }

    #[test]
    fn test_db_options_pass_through() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [db]
            url = "postgres://db/notifications"
            options = { ssl = true, pool = 4 }
            "#,
        )
        .unwrap();

        assert_eq!(config.db.options["ssl"], serde_json::json!(true));
        assert_eq!(config.db.options["pool"], serde_json::json!(4));
    }
}
