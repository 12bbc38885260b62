//! Message transports.
//!
//! # Data Flow
//! ```text
//! socket bytes ──→ codec.rs (len#json frames) ──┐
//!                                              ├→ envelope.rs → dispatch.rs → MessageRouter
//! broker message payload ──────────────────────┘        ↓
//!                                              OutgoingResponse (requests only)
//!                                                       ↓
//!                              same connection / reply subject
//! ```
//!
//! # Design Decisions
//! - One dispatcher per instance, shared by every connection and subscription
//! - Events (no id) are never answered; their failures go to the logger
//! - Protocol errors close the offending connection, nothing else

pub mod codec;
pub mod dispatch;
pub mod envelope;
pub mod nats;
pub mod tcp;

pub use dispatch::Dispatcher;
pub use envelope::{IncomingRequest, OutgoingResponse};
pub use nats::{BrokerError, NatsTransport};
pub use tcp::{ClientError, TcpClient, TcpTransport};
