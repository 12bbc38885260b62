//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the broker URL parses with a scheme the client understands (HTTP
//!   modes only; the socket mode never dials the broker)
//! - Database options are carried untouched
//! - Validate value ranges (connection limits, frame sizes)
//! - Check the HTTP path prefix is mountable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function over the config records
//! - Runs before the launcher binds anything

use thiserror::Error;
use url::Url;

use crate::config::schema::{AppConfig, ServiceConfig};

/// A single semantic problem in a configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., "nats.url").
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

const BROKER_SCHEMES: &[&str] = &["nats", "tls", "ws", "wss"];

/// Validate the fields every launch mode relies on.
pub fn validate_service_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    check_service(config, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate an HTTP-serving configuration, including the shared fields.
pub fn validate_app_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    check_service(&config.service, &mut errors);
    check_broker(&config.service, &mut errors);

    if config.host.trim().is_empty() {
        errors.push(ValidationError::new("host", "must not be empty"));
    }
    if !config.prefix.is_empty() && !config.prefix.starts_with('/') {
        errors.push(ValidationError::new("prefix", "must start with '/'"));
    }
    if config.prefix.chars().any(|c| c.is_whitespace() || c == '{' || c == '}' || c == '*') {
        errors.push(ValidationError::new(
            "prefix",
            "must not contain whitespace or route parameters",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_service(config: &ServiceConfig, errors: &mut Vec<ValidationError>) {
    if config.service_name.trim().is_empty() {
        errors.push(ValidationError::new("service_name", "must not be empty"));
    }

    if config.tcp.host.trim().is_empty() {
        errors.push(ValidationError::new("tcp.host", "must not be empty"));
    }
    if config.tcp.max_connections == 0 {
        errors.push(ValidationError::new("tcp.max_connections", "must be greater than 0"));
    }
    if config.tcp.max_frame_bytes == 0 {
        errors.push(ValidationError::new("tcp.max_frame_bytes", "must be greater than 0"));
    }
}

fn check_broker(config: &ServiceConfig, errors: &mut Vec<ValidationError>) {
    match Url::parse(&config.nats.url) {
        Ok(url) if !BROKER_SCHEMES.contains(&url.scheme()) => {
            errors.push(ValidationError::new(
                "nats.url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new("nats.url", format!("invalid URL: {}", e))),
    }

    if let Some(queue) = &config.nats.queue {
        if queue.trim().is_empty() {
            errors.push(ValidationError::new("nats.queue", "must not be blank when set"));
        }
    }
}
