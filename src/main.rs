//! Streaming chat relay for a local Ollama server
//!
//! (c) Softlandia 2025

use ollama_chat_relay::config::AppConfig;

use anyhow::Context;
use log::{error, info};
use tokio::net::TcpListener;
use tokio::runtime::{Builder, Runtime};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    info!(
        "Relaying to {} with model {} (timeout {:?})",
        config.ollama_url, config.model_name, config.request_timeout
    );

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(web_server_task(config))
}

async fn web_server_task(config: AppConfig) -> anyhow::Result<()> {
    let bind_address = config.bind_address.clone();
    let app = ollama_chat_relay::app(config)?;

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
    }
}
