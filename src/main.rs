//! DLSL Student Relay
//!
//! Looks students up in the DLSL registration portal on behalf of browser
//! clients.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client                ┌──────────────────────────────────────────────┐
//!     GET /api/student?id=  │                STUDENT RELAY                 │
//!     ──────────────────────┼─▶ http gateway ──▶ identifier ──▶ upstream ──┼──▶ Registration
//!                           │   (axum)           (id / tag)     client     │    portal
//!     ◀─────────────────────┼── JSON relay  ◀── email_address check ◀──────┼─── (form POST)
//!                           │                                              │
//!                           │  config · observability · lifecycle · cors   │
//!                           └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use student_relay::config::load_config;
use student_relay::lifecycle::signals::shutdown_signal;
use student_relay::observability::{logging, metrics};
use student_relay::HttpServer;

#[derive(Parser)]
#[command(name = "student-relay")]
#[command(about = "Relay student lookups to the DLSL registration portal", long_about = None)]
struct Cli {
    /// Optional TOML config file. PORT, REG_KEY, UPSTREAM_URL and LOG_LEVEL
    /// override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    logging::init_logging(&config.observability.log_level);

    tracing::info!("student-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.bind_address(),
        upstream = %config.upstream.url,
        timeout_secs = ?config.upstream.timeout_secs,
        "Configuration loaded"
    );

    if config.upstream.reg_key.is_empty() {
        tracing::warn!("REG_KEY is not set; portal lookups will be sent with an empty regKey");
    }

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Server started"
    );

    let server = HttpServer::new(config)?;
    server.run_until(listener, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
