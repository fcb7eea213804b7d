use crate::core::relay::panic_message;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::error;
use serde::Serialize;
use std::any::Any;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;

pub mod chat;
pub mod pages;

pub const INVALID_PAYLOAD: &str = "Format JSON salah atau 'message' tidak ditemukan";
pub const EMPTY_MESSAGE: &str = "Pesan tidak boleh kosong";
pub const INTERNAL_ERROR: &str = "Terjadi kesalahan internal pada server";
pub const MESSAGE_TOO_LARGE: &str = "Pesan terlalu panjang";

/// Largest accepted `/chat` request body.
pub const MAX_CHAT_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Errors returned before the event stream starts, while the status can still be chosen.
#[derive(Debug, Error, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{}", MESSAGE_TOO_LARGE)]
    PayloadTooLarge,

    #[error("{}", INTERNAL_ERROR)]
    Internal,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route(
            "/chat",
            post(chat::chat).layer(DefaultBodyLimit::max(MAX_CHAT_BODY_BYTES)),
        )
        .nest_service(
            "/static",
            ServiceBuilder::new().service(ServeDir::new("static")),
        )
}

/// Response for a handler that panicked before streaming started.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    error!("panic while handling request: {}", panic_message(panic.as_ref()));
    ApiError::Internal.into_response()
}
