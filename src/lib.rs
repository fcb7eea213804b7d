//! Streaming chat relay for a local Ollama server - Library exports for testing
//!
//! (c) Softlandia 2025

pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod infrastructure;

use crate::config::AppConfig;
use crate::core::services::OllamaChatService;
use crate::infrastructure::ollama::OllamaBackend;
use anyhow::anyhow;
use axum::Router;
use di::{Injectable, Ref, ServiceCollection, singleton_factory};
use di_axum::RouterServiceProviderExtensions;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Builds the application router with its service provider.
pub fn app(config: AppConfig) -> anyhow::Result<Router> {
    let client = reqwest::Client::builder().build()?;

    let provider = ServiceCollection::new()
        .add(singleton_factory(move |_| Ref::new(config.clone())))
        .add(singleton_factory(move |_| Ref::new(client.clone())))
        .add(OllamaBackend::singleton())
        .add(OllamaChatService::scoped())
        .build_provider()
        .map_err(|e| anyhow!("invalid service registrations: {e}"))?;

    Ok(api::router()
        .layer(CatchPanicLayer::custom(api::handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_provider(provider))
}

/// First `max_chars` characters of `text`, for log lines.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_owned(),
    }
}
