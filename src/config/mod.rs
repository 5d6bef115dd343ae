//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults / optional TOML file
//!     → loader.rs (parse, apply PORT / REG_KEY / UPSTREAM_URL / LOG_LEVEL)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → moved into AppState at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow running with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::CorsConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::RelayConfig;
pub use schema::UpstreamConfig;
