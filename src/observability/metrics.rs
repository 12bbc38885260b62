//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bootstrap_messages_total` (counter): messages by transport, pattern, outcome
//! - `bootstrap_validation_failures_total` (counter): rejected inputs by surface
//! - `bootstrap_instances_started_total` (counter): listeners started by kind

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Outcome label for a dispatched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Rejected,
    Failed,
    Unhandled,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Rejected => "rejected",
            Outcome::Failed => "failed",
            Outcome::Unhandled => "unhandled",
        }
    }
}

/// `pattern` label for messages no handler is registered for.
pub const UNKNOWN_PATTERN: &str = "unknown";

/// `pattern` must be a registered pattern or [`UNKNOWN_PATTERN`].
pub fn record_message(transport: &'static str, pattern: &str, outcome: Outcome) {
    metrics::counter!(
        "bootstrap_messages_total",
        "transport" => transport,
        "pattern" => pattern.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn record_validation_failure(surface: &'static str) {
    metrics::counter!("bootstrap_validation_failures_total", "surface" => surface).increment(1);
}

pub fn record_listener_started(kind: &'static str) {
    metrics::counter!("bootstrap_instances_started_total", "kind" => kind).increment(1);
}
