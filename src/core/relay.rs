//! Stream translator.
//!
//! Turns the newline-delimited JSON body of an Ollama generate call into the events pushed to
//! the browser. Every stream produced here is lazy, single-pass and always ends with a terminal
//! event: either a token carrying `done: true` or an error carrying `done: true`.

use crate::error::RelayError;
use crate::infrastructure::entities::GenerateChunk;
use crate::infrastructure::traits::InferenceBackend;
use async_stream::stream;
use axum::body::Bytes;
use di::Ref;
use futures_util::{Stream, StreamExt, pin_mut};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// One event pushed to the browser.
///
/// Serializes to `{"token":..}`, `{"token":..,"done":true}` or `{"error":..,"done":true}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub done: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ClientEvent {
    pub fn token(text: impl Into<String>, done: bool) -> ClientEvent {
        ClientEvent {
            token: Some(text.into()),
            error: None,
            done,
        }
    }

    pub fn error(message: impl Into<String>) -> ClientEvent {
        ClientEvent {
            token: None,
            error: Some(message.into()),
            done: true,
        }
    }
}

impl From<&RelayError> for ClientEvent {
    fn from(error: &RelayError) -> Self {
        ClientEvent::error(error.to_string())
    }
}

/// Runs one inference session against `backend` and yields its events.
///
/// The backend call is only issued once the stream is first polled. Dropping the stream drops
/// the backend response, which aborts the outbound request.
pub fn relay(
    backend: Ref<dyn InferenceBackend>,
    model: String,
    prompt: String,
) -> impl Stream<Item = ClientEvent> + Send + 'static {
    stream! {
        match backend.generate(&model, &prompt).await {
            Ok(chunks) => {
                let events = translate(chunks);
                pin_mut!(events);
                while let Some(event) = events.next().await {
                    yield event;
                }
            }
            Err(e) => {
                error!("{e}");
                yield ClientEvent::from(&e);
            }
        }
    }
}

/// Maps raw backend body chunks to client events, stopping at the first terminal event.
pub fn translate<S>(chunks: S) -> impl Stream<Item = ClientEvent>
where
    S: Stream<Item = Result<Bytes, RelayError>>,
{
    stream! {
        let lines = split_lines(chunks);
        pin_mut!(lines);

        while let Some(line) = lines.next().await {
            match line.and_then(|line| decode_line(&line)) {
                Ok(chunk) => {
                    let done = chunk.done;
                    yield ClientEvent::token(chunk.response, done);
                    if done {
                        info!("Ollama stream finished (done=true)");
                        return;
                    }
                }
                Err(e) => {
                    error!("{e}");
                    yield ClientEvent::from(&e);
                    return;
                }
            }
        }

        let e = RelayError::UnexpectedEof;
        warn!("Ollama closed the stream without done=true");
        yield ClientEvent::from(&e);
    }
}

/// Catches a panic raised while producing events and ends the stream with an internal error
/// event instead of tearing down the connection without a terminal frame.
pub fn guard<S>(events: S) -> impl Stream<Item = ClientEvent> + Send + 'static
where
    S: Stream<Item = ClientEvent> + Send + 'static,
{
    AssertUnwindSafe(events).catch_unwind().map(|outcome| {
        outcome.unwrap_or_else(|panic| {
            let message = panic_message(panic.as_ref());
            error!("panic while streaming response: {message}");
            ClientEvent::from(&RelayError::Internal(message))
        })
    })
}

/// Best-effort text of a panic payload.
pub fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}

fn decode_line(line: &[u8]) -> Result<GenerateChunk, RelayError> {
    let chunk: GenerateChunk =
        serde_json::from_slice(line).map_err(|source| RelayError::MalformedLine {
            line: String::from_utf8_lossy(line).into_owned(),
            source,
        })?;

    match chunk.error {
        Some(message) => Err(RelayError::Backend(message)),
        None => Ok(chunk),
    }
}

/// Reassembles complete lines from arbitrarily split body chunks.
///
/// Blank lines are skipped, `\r\n` endings are accepted and a final line without a trailing
/// newline is still emitted. A transport error is passed through and ends the stream.
fn split_lines<S>(chunks: S) -> impl Stream<Item = Result<Vec<u8>, RelayError>>
where
    S: Stream<Item = Result<Bytes, RelayError>>,
{
    stream! {
        pin_mut!(chunks);
        let mut buffer: Vec<u8> = Vec::new();
        // Bytes of `buffer` already known to hold no newline.
        let mut scanned = 0;

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => {
                    buffer.extend_from_slice(&bytes);
                    let mut start = 0;
                    while let Some(pos) = buffer[scanned..].iter().position(|b| *b == b'\n') {
                        let end = scanned + pos + 1;
                        let line = trim_line(&buffer[start..end]).map(<[u8]>::to_vec);
                        start = end;
                        scanned = end;
                        if let Some(line) = line {
                            yield Ok(line);
                        }
                    }
                    buffer.drain(..start);
                    scanned = buffer.len();
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        if let Some(line) = trim_line(&buffer) {
            yield Ok(line.to_vec());
        }
    }
}

fn trim_line(line: &[u8]) -> Option<&[u8]> {
    let end = line
        .iter()
        .rposition(|b| !matches!(b, b'\n' | b'\r'))
        .map_or(0, |pos| pos + 1);

    if end == 0 { None } else { Some(&line[..end]) }
}
