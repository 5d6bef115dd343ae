//! Registration portal client.
//!
//! # Responsibilities
//! - Send one form-encoded POST per lookup
//! - Carry the shared registration key on every call
//! - Decode the portal's JSON reply
//! - Log and propagate every failure to the gateway

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::UpstreamConfig;
use crate::identifier::Identifier;
use crate::observability::metrics;
use crate::upstream::types::{StudentRecord, UpstreamError, UpstreamResult};

/// HTTP client for the registration portal.
///
/// Cheap to clone; the connection pool and config are shared.
#[derive(Clone)]
pub struct PortalClient {
    http: reqwest::Client,
    config: Arc<UpstreamConfig>,
}

impl PortalClient {
    /// Create a new portal client.
    ///
    /// No timeout is applied unless `timeout_secs` is set.
    pub fn new(config: UpstreamConfig) -> UpstreamResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build().map_err(UpstreamError::Client)?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    /// Look up a student by ID or card tag.
    ///
    /// Exactly one attempt is made. The returned record may still describe a
    /// missing student; callers check [`StudentRecord::is_valid`].
    pub async fn fetch_student(&self, identifier: &Identifier) -> UpstreamResult<StudentRecord> {
        let start = Instant::now();
        let result = self.post_lookup(identifier).await;

        match &result {
            Ok(record) => {
                let outcome = if record.is_valid() { "found" } else { "not_found" };
                metrics::record_upstream(outcome, start);
            }
            Err(e) => {
                metrics::record_upstream("error", start);
                tracing::error!(error = %e, url = %self.config.url, "Error fetching student info");
            }
        }

        result
    }

    async fn post_lookup(&self, identifier: &Identifier) -> UpstreamResult<StudentRecord> {
        let form = [
            ("action", self.config.action.as_str()),
            ("regKey", self.config.reg_key.as_str()),
            ("card_tag", identifier.as_str()),
        ];

        let response = self
            .http
            .post(&self.config.url)
            .form(&form)
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        // Non-2xx replies are decoded like any other; the portal reports
        // lookup misses in the body.
        let status = response.status();
        tracing::debug!(status = %status, "Portal responded");

        let body = response.text().await.map_err(UpstreamError::Body)?;

        StudentRecord::from_body(body).map_err(|source| UpstreamError::Decode {
            status: status.as_u16(),
            source,
        })
    }

    /// Endpoint this client posts to.
    pub fn url(&self) -> &str {
        &self.config.url
    }
}
