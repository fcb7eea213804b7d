//! Chat endpoint

use crate::api::chat::schemas::ChatRequest;
use crate::core::relay::ClientEvent;
use crate::core::traits::ChatService;
use crate::preview;
use axum::response::Sse;
use axum::response::sse::Event;
use di_axum::Inject;
use futures_util::{Stream, StreamExt};
use log::{error, info};
use std::convert::Infallible;

/// Sent in place of an event that could not be encoded.
const FALLBACK_FRAME: &str =
    r#"{"error":"Terjadi kesalahan tak terduga saat streaming","done":true}"#;

pub async fn chat(
    Inject(chat_service): Inject<dyn ChatService>,
    request: ChatRequest,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(
        "Received chat message: '{}'",
        preview(&request.message, 100)
    );

    let events = chat_service
        .reply(request.message)
        .map(|event| Ok(to_sse_event(&event)));

    Sse::new(events)
}

fn to_sse_event(event: &ClientEvent) -> Event {
    Event::default().json_data(event).unwrap_or_else(|e| {
        error!("failed to encode event {event:?}: {e}");
        Event::default().data(FALLBACK_FRAME)
    })
}

pub mod schemas {
    use crate::api::{ApiError, EMPTY_MESSAGE, INVALID_PAYLOAD};
    use async_trait::async_trait;
    use axum::body::Bytes;
    use axum::extract::{FromRequest, Request};
    use axum::http::StatusCode;
    use log::warn;
    use serde_json::Value;

    /// A validated chat message.
    ///
    /// Rejects with 400 when the body is not a JSON object with a non-blank string `message`.
    /// The message itself is kept untrimmed.
    #[derive(Debug, PartialEq)]
    pub struct ChatRequest {
        pub message: String,
    }

    impl ChatRequest {
        pub fn parse(body: &[u8]) -> Result<ChatRequest, ApiError> {
            let payload: Value = serde_json::from_slice(body).map_err(|e| {
                warn!("Chat request body is not valid JSON: {e}");
                ApiError::BadRequest(INVALID_PAYLOAD)
            })?;

            let Some(message) = payload
                .as_object()
                .and_then(|fields| fields.get("message"))
            else {
                warn!("Chat request without 'message' field");
                return Err(ApiError::BadRequest(INVALID_PAYLOAD));
            };

            match message {
                Value::String(message) if !message.trim().is_empty() => Ok(ChatRequest {
                    message: message.clone(),
                }),
                other => {
                    warn!("Chat request with empty or invalid message: {other}");
                    Err(ApiError::BadRequest(EMPTY_MESSAGE))
                }
            }
        }
    }

    #[async_trait]
    impl<S> FromRequest<S> for ChatRequest
    where
        S: Send + Sync,
    {
        type Rejection = ApiError;

        async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
            let body = Bytes::from_request(req, state).await.map_err(|e| {
                warn!("Failed to read chat request body: {e}");
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    ApiError::PayloadTooLarge
                } else {
                    ApiError::BadRequest(INVALID_PAYLOAD)
                }
            })?;

            ChatRequest::parse(&body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::schemas::ChatRequest;
    use crate::api::{ApiError, EMPTY_MESSAGE, INVALID_PAYLOAD};

    #[test]
    fn test_parse_valid_message_is_kept_untrimmed() {
        let request = ChatRequest::parse(br#"{"message":"  Halo  "}"#).unwrap();
        assert_eq!(request.message, "  Halo  ");
    }

    #[test]
    fn test_parse_rejects_missing_message() {
        let bodies: [&[u8]; 5] = [br#"{}"#, br#"{"text":"hi"}"#, b"null", b"[]", b"\"message\""];
        for body in bodies {
            assert_eq!(
                ChatRequest::parse(body),
                Err(ApiError::BadRequest(INVALID_PAYLOAD)),
                "body: {}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert_eq!(
            ChatRequest::parse(b"message=hi"),
            Err(ApiError::BadRequest(INVALID_PAYLOAD))
        );
        assert_eq!(
            ChatRequest::parse(b""),
            Err(ApiError::BadRequest(INVALID_PAYLOAD))
        );
    }

    #[test]
    fn test_parse_rejects_blank_or_non_string_message() {
        let bodies: [&[u8]; 6] = [
            br#"{"message":""}"#,
            br#"{"message":"   "}"#,
            br#"{"message":"\n\t"}"#,
            br#"{"message":42}"#,
            br#"{"message":null}"#,
            br#"{"message":["hi"]}"#,
        ];
        for body in bodies {
            assert_eq!(
                ChatRequest::parse(body),
                Err(ApiError::BadRequest(EMPTY_MESSAGE)),
                "body: {}",
                String::from_utf8_lossy(body)
            );
        }
    }
}
