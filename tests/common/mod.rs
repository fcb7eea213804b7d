//! Mock Ollama server shared by the integration tests.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures_util::{StreamExt, stream};
use ollama_chat_relay::config::AppConfig;
use serde_json::Value;
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// How the mock answers `/api/generate`.
#[derive(Clone)]
pub struct MockReply {
    pub status: StatusCode,
    pub body: &'static str,
    pub delay: Option<Duration>,
    /// Keep the connection open after sending the body.
    pub hang_after_body: bool,
    /// Send the body line by line, pausing before each line.
    pub line_gap: Option<Duration>,
}

impl MockReply {
    pub fn ok(body: &'static str) -> MockReply {
        MockReply {
            status: StatusCode::OK,
            body,
            delay: None,
            hang_after_body: false,
            line_gap: None,
        }
    }
}

#[derive(Clone)]
struct MockState {
    reply: MockReply,
    calls: Arc<AtomicUsize>,
    last_payload: Arc<Mutex<Option<Value>>>,
}

pub struct MockBackend {
    pub url: String,
    calls: Arc<AtomicUsize>,
    last_payload: Arc<Mutex<Option<Value>>>,
}

impl MockBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_payload(&self) -> Option<Value> {
        self.last_payload.lock().unwrap().clone()
    }
}

async fn generate(State(state): State<MockState>, Json(payload): Json<Value>) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    *state.last_payload.lock().unwrap() = Some(payload);

    if let Some(delay) = state.reply.delay {
        tokio::time::sleep(delay).await;
    }

    let MockReply {
        status,
        body,
        hang_after_body,
        line_gap,
        ..
    } = state.reply;

    if let Some(gap) = line_gap {
        let lines: Vec<&'static str> = body.split_inclusive('\n').collect();
        let body = stream::iter(lines).then(move |line| async move {
            tokio::time::sleep(gap).await;
            Ok::<_, Infallible>(Bytes::from_static(line.as_bytes()))
        });
        return (status, Body::from_stream(body)).into_response();
    }

    if hang_after_body {
        let body = stream::once(async move {
            Ok::<_, Infallible>(Bytes::from_static(body.as_bytes()))
        })
        .chain(stream::pending());
        return (status, Body::from_stream(body)).into_response();
    }

    (status, body).into_response()
}

/// Starts a mock Ollama server on an ephemeral local port.
pub async fn start_mock_backend(reply: MockReply) -> MockBackend {
    let calls = Arc::new(AtomicUsize::new(0));
    let last_payload = Arc::new(Mutex::new(None));

    let app = Router::new()
        .route("/api/generate", post(generate))
        .with_state(MockState {
            reply,
            calls: calls.clone(),
            last_payload: last_payload.clone(),
        });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        url: format!("http://{addr}/api/generate"),
        calls,
        last_payload,
    }
}

/// A URL on which nothing is listening.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api/generate")
}

pub fn test_config(ollama_url: &str) -> AppConfig {
    AppConfig {
        ollama_url: ollama_url.to_owned(),
        model_name: "test-model".to_owned(),
        title: "Test Chat".to_owned(),
        ..AppConfig::default()
    }
}
