//! Portal payloads and error definitions.

use serde_json::Value;
use thiserror::Error;

/// Field the portal fills in when a student record exists.
pub const EMAIL_FIELD: &str = "email_address";

/// Errors that can occur while talking to the registration portal.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, TLS, timeout, or request send failure.
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Response body could not be read.
    #[error("Failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    /// Response body was not JSON.
    #[error("Invalid JSON from portal (status {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for portal operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// A decoded portal response.
///
/// Keeps the original body so a valid record can be relayed byte for byte.
#[derive(Debug, Clone)]
pub struct StudentRecord {
    body: String,
    value: Value,
}

impl StudentRecord {
    /// Parse a raw portal body.
    pub fn from_body(body: String) -> Result<Self, serde_json::Error> {
        let value = serde_json::from_str(&body)?;
        Ok(Self { body, value })
    }

    /// Whether the portal actually found a student.
    pub fn is_valid(&self) -> bool {
        has_email(&self.value)
    }

    /// The body exactly as the portal sent it.
    pub fn into_body(self) -> String {
        self.body
    }
}

/// True when `value` is an object whose `email_address` is a non-empty string.
pub fn has_email(value: &Value) -> bool {
    value
        .as_object()
        .and_then(|object| object.get(EMAIL_FIELD))
        .and_then(Value::as_str)
        .is_some_and(|email| !email.is_empty())
}
