//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (tracing subscriber, structured events)
//!     → logger.rs  (the launcher's logger sink: started lines, startup errors)
//!     → metrics.rs (message and validation counters)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - The logger sink is a trait so callers can route launcher output anywhere
//! - The default sink forwards to tracing, tagged with the service name
//! - Metrics are cheap (atomic increments) and off the request path

pub mod logger;
pub mod logging;
pub mod metrics;

pub use logger::{Logger, RequestLogger, SharedLogger, TracingLogger};
