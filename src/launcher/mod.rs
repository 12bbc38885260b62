//! Bootstrap launcher.
//!
//! # Data Flow
//! ```text
//! ServiceDescriptor + config + logger?
//!     → validate config (nothing bound on failure)
//!     → application.rs: routes → prefix mount + docs.rs document → CORS,
//!                       request id, validation pipe, logger → axum::serve
//!     → microservice.rs: message handlers → transport::tcp
//!     → hybrid.rs: application.rs, then message handlers → transport::nats
//!     → instance.rs RunningInstance (listeners, tasks, shutdown)
//! ```
//!
//! # Design Decisions
//! - The launcher holds no state; each call owns exactly one instance
//! - Configs are borrowed and never mutated
//! - `run_*` wrappers never lose a startup error: it goes to the logger sink
//! - Without a supplied logger a tracing logger named after the service is used

mod application;
pub mod docs;
mod error;
mod hybrid;
pub mod instance;
mod microservice;

pub use error::LaunchError;
pub use instance::{Listening, RunningInstance};

use crate::observability::SharedLogger;

/// Entry point for starting a service in one of its launch modes.
///
/// See [`Launcher::application`], [`Launcher::service`] and [`Launcher::hybrid`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Launcher;

fn report(result: Result<RunningInstance, LaunchError>, logger: &SharedLogger) -> Option<RunningInstance> {
    match result {
        Ok(instance) => Some(instance),
        Err(e) => {
            logger.error(&e.to_string());
            None
        }
    }
}
