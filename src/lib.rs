//! DLSL Student Relay Library

pub mod config;
pub mod http;
pub mod identifier;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod upstream;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
