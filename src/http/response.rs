//! Response construction and error mapping.
//!
//! # Responsibilities
//! - Map gateway failures to status codes and `{"error": ...}` bodies
//! - Relay a portal body unchanged as `application/json`
//! - Answer panics with a generic 500
//!
//! # Design Decisions
//! - Error bodies carry fixed public messages; portal and transport
//!   details only reach the logs

use std::any::Any;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::upstream::UpstreamError;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Everything that can end a request without a student record.
#[derive(Debug, Error)]
pub enum ApiError {
    /// `id` query parameter absent or empty.
    #[error("Missing id parameter")]
    MissingId,

    /// Portal answered but the payload has no usable `email_address`.
    #[error("Student not found")]
    StudentNotFound,

    /// No route for this method and path.
    #[error("Not found")]
    RouteNotFound,

    /// Portal call failed.
    #[error("Upstream lookup failed: {0}")]
    Upstream(#[from] UpstreamError),

    /// Anything else, including caught panics.
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingId => StatusCode::BAD_REQUEST,
            ApiError::StudentNotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            ApiError::MissingId => "Missing id parameter",
            ApiError::StudentNotFound => "Student not found",
            ApiError::RouteNotFound => "Not found",
            ApiError::Upstream(_) | ApiError::Internal => "Internal server error",
        }
    }
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Upstream(e) = &self {
            tracing::error!(error = %e, "Error in /api/student");
        }

        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// 200 response carrying a portal body exactly as received.
pub fn relay_json(body: String) -> Response {
    (
        [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
        body,
    )
        .into_response()
}

/// Panic handler for `CatchPanicLayer`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = %detail, "Unhandled error while handling request");

    ApiError::Internal.into_response()
}
