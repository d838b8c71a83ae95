//! REST history server for the BEMS dashboard.

use anyhow::Context;
use bems_api::{router, ApiConfig, AppState};
use bems_core::Aggregator;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let state = AppState {
        client: redis::Client::open(config.redis_url.as_str())
            .with_context(|| format!("invalid redis url {}", config.redis_url))?,
        aggregator: Aggregator::new(config.policy),
        limits: config.limits,
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, policy = ?config.policy, "history API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("server error")
}
