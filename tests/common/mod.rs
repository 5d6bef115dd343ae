//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use student_relay::config::RelayConfig;
use student_relay::lifecycle::Shutdown;
use student_relay::HttpServer;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const PORTAL_PATH: &str = "/registration/event/helper.php";

/// One request as seen by the mock portal.
#[derive(Debug, Clone)]
pub struct PortalCall {
    pub content_type: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl PortalCall {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

type Reply = Arc<dyn Fn(&str) -> (u16, String) + Send + Sync>;

#[derive(Clone)]
struct PortalState {
    calls: Arc<Mutex<Vec<PortalCall>>>,
    reply: Reply,
    delay: Duration,
}

/// A local stand-in for the registration portal.
pub struct MockPortal {
    pub addr: SocketAddr,
    calls: Arc<Mutex<Vec<PortalCall>>>,
}

impl MockPortal {
    pub fn url(&self) -> String {
        format!("http://{}{}", self.addr, PORTAL_PATH)
    }

    pub fn calls(&self) -> Vec<PortalCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

async fn helper(State(state): State<PortalState>, headers: HeaderMap, body: String) -> Response {
    let fields: Vec<(String, String)> = url::form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect();
    let call = PortalCall {
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        fields,
    };
    let card_tag = call.field("card_tag").unwrap_or_default().to_string();
    state.calls.lock().unwrap().push(call);

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    let (status, body) = (state.reply)(&card_tag);
    (StatusCode::from_u16(status).unwrap(), body).into_response()
}

/// Start a mock portal answering every lookup with `reply(card_tag)`.
pub async fn start_mock_portal<F>(reply: F) -> MockPortal
where
    F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
{
    start_slow_mock_portal(Duration::ZERO, reply).await
}

/// Like [`start_mock_portal`] but waits `delay` before answering.
pub async fn start_slow_mock_portal<F>(delay: Duration, reply: F) -> MockPortal
where
    F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
{
    let calls = Arc::new(Mutex::new(Vec::new()));
    let state = PortalState {
        calls: calls.clone(),
        reply: Arc::new(reply),
        delay,
    };

    let app = Router::new()
        .route(PORTAL_PATH, post(helper))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockPortal { addr, calls }
}

/// A relay running on an ephemeral port.
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl RunningRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Config pointing at `portal_url`, bypassing any system proxy.
pub fn relay_config(portal_url: String) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.upstream.url = portal_url;
    config.upstream.reg_key = "test-reg-key".into();
    config.upstream.use_system_proxy = false;
    config
}

pub async fn start_relay(config: RelayConfig) -> RunningRelay {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let notice = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, notice).await });

    RunningRelay {
        addr,
        shutdown,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
