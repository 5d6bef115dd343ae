//! Route handlers for the public API.

use std::time::Instant;

use axum::{
    extract::{RawQuery, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::response::{relay_json, ApiError};
use crate::http::server::AppState;
use crate::identifier::Identifier;
use crate::observability::metrics;

#[derive(Debug, Serialize)]
pub struct ApiDescriptor {
    pub message: &'static str,
    pub endpoints: Endpoints,
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub student: &'static str,
}

/// `GET /api/student?id=...`
///
/// 400 without an id, 404 when the portal has no usable record, 500 when
/// the portal call fails, otherwise the portal body verbatim.
pub async fn student_handler(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Response {
    let start = Instant::now();

    let response = match lookup_student(&state, query.as_deref()).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };

    metrics::record_request("student", response.status().as_u16(), start);
    response
}

async fn lookup_student(state: &AppState, query: Option<&str>) -> Result<Response, ApiError> {
    let raw = id_param(query);
    let identifier = Identifier::parse(raw.as_deref()).ok_or(ApiError::MissingId)?;

    // Both kinds go to the portal as `card_tag`.
    tracing::debug!(kind = %identifier.kind(), "Looking up student");

    let record = state.portal.fetch_student(&identifier).await?;

    if record.is_valid() {
        Ok(relay_json(record.into_body()))
    } else {
        tracing::debug!("Portal returned no usable email_address");
        Err(ApiError::StudentNotFound)
    }
}

/// Every non-empty `id` value in `query`, decoded and joined with `,`.
///
/// `?id=1&id=2` yields `1,2`; no usable value yields `None`.
pub fn id_param(query: Option<&str>) -> Option<String> {
    let values: Vec<String> = url::form_urlencoded::parse(query?.as_bytes())
        .filter(|(key, value)| key == "id" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}

/// `GET /`
pub async fn index_handler() -> Json<ApiDescriptor> {
    Json(ApiDescriptor {
        message: "DLSL Student API Server",
        endpoints: Endpoints {
            student: "/api/student?id={studentId or cardTag}",
        },
    })
}

/// Fallback for unknown paths and unsupported methods.
pub async fn not_found_handler() -> ApiError {
    ApiError::RouteNotFound
}
