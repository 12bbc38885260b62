//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger → every listener task stops accepting → in-flight work drains
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → process entry point triggers shutdown
//! ```
//!
//! # Design Decisions
//! - One broadcast channel per running instance
//! - Signal handling stays in the binary; library callers own their lifecycle

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
