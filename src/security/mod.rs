//! Security-related HTTP policy.
//!
//! The relay performs no caller authentication; the only policy applied to
//! inbound traffic is the cross-origin one.

pub mod cors;

pub use cors::cors_layer;
