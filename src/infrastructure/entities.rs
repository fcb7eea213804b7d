//! Ollama `/api/generate` wire entities

use serde::{Deserialize, Serialize};

/// Body of the outbound generate call.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
}

/// One newline-delimited object of a streamed generate response.
///
/// Ollama sends more fields (timings, context) which are ignored.
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct GenerateChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}
