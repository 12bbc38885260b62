//! Launcher error types.

use thiserror::Error;

use crate::config::ValidationError;
use crate::net::ListenerError;
use crate::transport::BrokerError;

/// Why an instance failed to start.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Invalid configuration: {}", join(.0))]
    InvalidConfig(Vec<ValidationError>),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Hybrid mode needs at least one message handler to subscribe")]
    NoMessageHandlers,

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
