//! Registration portal integration.
//!
//! # Data Flow
//! ```text
//! Identifier (from gateway)
//!     → client.rs (form POST: action, regKey, card_tag)
//!     → portal reply body
//!     → types.rs (JSON decode, email_address check)
//!     → StudentRecord back to gateway
//! ```
//!
//! # Design Decisions
//! - The portal payload stays untyped; only `email_address` is inspected
//! - One attempt per lookup, no retries
//! - No timeout unless configured

pub mod client;
pub mod types;

pub use client::PortalClient;
pub use types::{has_email, StudentRecord, UpstreamError, UpstreamResult};
