//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, CORS, panic catching)
//! - Normalize paths (trailing slash, letter case) before routing
//! - Bind server to listener
//! - Stop gracefully on shutdown notice or OS signal

use std::future::Future;

use axum::{body::Body, http::Request, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::{util::MapRequest, ServiceBuilder};
use tower_http::{catch_panic::CatchPanicLayer, normalize_path::NormalizePath, trace::TraceLayer};

use crate::config::RelayConfig;
use crate::http::handlers::{index_handler, not_found_handler, student_handler};
use crate::http::request::{lowercase_path, propagate_request_id_layer, set_request_id_layer};
use crate::http::response::panic_response;
use crate::lifecycle::until_shutdown;
use crate::observability::tracing::make_request_span;
use crate::security::cors_layer;
use crate::upstream::{PortalClient, UpstreamResult};

/// The router wrapped in path normalization.
///
/// Normalization has to sit outside the `Router`: layers added with
/// `Router::layer` only run after a route has been picked.
pub type RelayService = NormalizePath<MapRequest<Router, fn(Request<Body>) -> Request<Body>>>;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub portal: PortalClient,
}

/// HTTP server for the student relay.
pub struct HttpServer {
    service: RelayService,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Fails only if the portal HTTP client cannot be built.
    pub fn new(config: RelayConfig) -> UpstreamResult<Self> {
        let portal = PortalClient::new(config.upstream.clone())?;
        let state = AppState { portal };

        let service = normalize_paths(Self::build_router(&config, state));
        Ok(Self { service, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let routes = Router::new()
            .route("/", get(index_handler).fallback(not_found_handler))
            .route(
                "/api/student",
                get(student_handler).fallback(not_found_handler),
            )
            .fallback(not_found_handler)
            .with_state(state);

        apply_layers(routes, config)
    }

    /// The complete service, e.g. for in-process tests.
    pub fn service(&self) -> RelayService {
        self.service.clone()
    }

    /// Run the server until `shutdown` fires or an OS stop signal arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        self.run_until(listener, until_shutdown(shutdown)).await
    }

    /// Run the server until `signal` resolves, then drain in-flight
    /// requests.
    pub async fn run_until<F>(self, listener: TcpListener, signal: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.url,
            "HTTP server starting"
        );

        let app = axum::ServiceExt::<Request<Body>>::into_make_service(self.service);
        axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Middleware stack shared by every route. Outermost first: request ID,
/// trace span, ID propagation, CORS, panic catching.
pub fn apply_layers(router: Router, config: &RelayConfig) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(propagate_request_id_layer())
            .layer(cors_layer(&config.cors))
            .layer(CatchPanicLayer::custom(panic_response)),
    )
}

/// Trim trailing slashes and lowercase the path before routing.
pub fn normalize_paths(router: Router) -> RelayService {
    let lowercase: fn(Request<Body>) -> Request<Body> = lowercase_path;
    NormalizePath::trim_trailing_slash(MapRequest::new(router, lowercase))
}
