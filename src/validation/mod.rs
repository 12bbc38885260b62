//! Validation stage.
//!
//! # Data Flow
//! ```text
//! HTTP body / query          message `data`
//!     → extract.rs (Valid<T>, ValidQuery<T>)   → transport::dispatch
//!                      ↘                      ↙
//!                 pipe.rs (whitelist → decode → constraints)
//!                      → typed payload, or
//!                      → error.rs RpcException { status: "error", message: [FieldError] }
//! ```
//!
//! # Design Decisions
//! - One policy for every transport; failures always take the RPC shape
//! - Undeclared properties are an error under the strict policy, never dropped
//! - Field errors name the property and constraint, never the rejected value

pub mod error;
pub mod extract;
pub mod introspect;
pub mod pipe;

pub use error::{FieldError, RpcException, RpcMessage};
pub use extract::{Valid, ValidQuery};
pub use pipe::{ValidationOptions, ValidationPipe};
