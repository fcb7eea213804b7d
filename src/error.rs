//! Failures that can end a relayed stream.
//!
//! Once the event stream has started the HTTP status is already committed, so every variant is
//! reported to the browser as a single terminal error frame. The `Display` text is what the
//! browser sees.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Error: Permintaan ke Ollama timeout.")]
    Timeout,

    #[error("Error koneksi ke Ollama di {url}. Pastikan Ollama berjalan. Detail: {source}")]
    Unreachable {
        url: String,
        source: reqwest::Error,
    },

    /// Any other transport failure, including a non-success HTTP status.
    #[error("Error saat request ke Ollama: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Error decoding JSON chunk dari Ollama: {line}. Detail: {source}")]
    MalformedLine {
        line: String,
        source: serde_json::Error,
    },

    #[error("Ollama melaporkan error: {0}")]
    Backend(String),

    #[error("stream ended unexpectedly")]
    UnexpectedEof,

    #[error("Terjadi kesalahan tak terduga saat streaming: {0}")]
    Internal(String),
}

impl RelayError {
    /// Sorts a reqwest failure into timeout, unreachable or generic transport.
    pub fn from_transport(url: &str, error: reqwest::Error) -> RelayError {
        if error.is_timeout() {
            RelayError::Timeout
        } else if error.is_connect() {
            RelayError::Unreachable {
                url: url.to_owned(),
                source: error,
            }
        } else {
            RelayError::Transport(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_line_message_contains_raw_line() {
        let source = serde_json::from_str::<serde_json::Value>("not-json").unwrap_err();
        let err = RelayError::MalformedLine {
            line: "not-json".to_owned(),
            source,
        };

        let message = err.to_string();
        assert!(message.starts_with("Error decoding JSON chunk dari Ollama: not-json."));
        assert!(message.contains("Detail: "));
    }

    #[test]
    fn test_unexpected_eof_message() {
        assert_eq!(
            RelayError::UnexpectedEof.to_string(),
            "stream ended unexpectedly"
        );
    }
}
