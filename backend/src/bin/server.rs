//! Concurrency insights HTTP server.
//!
//! Loads `insights.toml`, initializes the gateway and serves the three
//! concurrency views.
//!
//! # Usage
//!
//! ```bash
//! # Run with the in-memory gateway (default)
//! cargo run --bin insights-server
//!
//! # Run against the capacity-monitoring service
//! GATEWAY_TYPE=remote GATEWAY_BASE_URL=https://monitor.example.com/api \
//!   cargo run --bin insights-server --features "remote-gateway,http-server"
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `GATEWAY_TYPE`, `GATEWAY_BASE_URL`, `GATEWAY_API_TOKEN`: gateway overrides
//! - `INSIGHTS_UTC_OFFSET_MINUTES`: offset used for days and labels
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use concurrency_insights::config::InsightsConfig;
use concurrency_insights::gateway;
use concurrency_insights::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting concurrency insights server");

    let config = InsightsConfig::load();
    gateway::init_gateway(&config)?;
    let gateway = Arc::clone(gateway::get_gateway()?);
    info!(
        "Gateway '{}' initialized, UTC offset {} minutes",
        config.gateway.gateway_type, config.analytics.utc_offset_minutes
    );

    let state = AppState::new(gateway, &config.analytics).context("Invalid analytics settings")?;
    let app = create_router(state);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
