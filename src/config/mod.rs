//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)        environment (.env + process env)
//!     → loader.rs (parse & deserialize)  → loader.rs EnvOverlay
//!                     ↘                 ↙
//!                  ServiceConfig / AppConfig
//!     → validation.rs (semantic checks)
//!     → handed to the launcher by reference, never mutated
//! ```
//!
//! # Design Decisions
//! - Config is built once at process start and lives for the process
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Environment access goes through an injected lookup, not globals

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigError, EnvOverlay};
pub use schema::{
    AppConfig, DatabaseConfig, LogFormat, NatsConfig, ObservabilityConfig, ServiceConfig,
    TcpTransportConfig,
};
pub use validation::{validate_app_config, validate_service_config, ValidationError};
