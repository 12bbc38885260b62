//! Service bootstrap library.
//!
//! Starts a service described by a [`ServiceDescriptor`] as an HTTP
//! application, a point-to-point microservice, or both HTTP and a NATS
//! subscriber, with one validation policy across every transport.

pub mod config;
pub mod descriptor;
pub mod entry;
pub mod launcher;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod services;
pub mod transport;
pub mod validation;

pub use config::{AppConfig, ServiceConfig};
pub use descriptor::{MessageRouter, ServiceDescriptor};
pub use launcher::{LaunchError, Launcher, Listening, RunningInstance};
pub use lifecycle::Shutdown;
pub use observability::{Logger, SharedLogger, TracingLogger};
pub use validation::{RpcException, Valid, ValidQuery, ValidationPipe};
