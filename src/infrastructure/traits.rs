//! Infrastructure traits, used for DI on higher levels

use crate::error::RelayError;
use async_trait::async_trait;
use axum::body::Bytes;
use futures_util::stream::BoxStream;

/// Raw response body of a generate call, chunked however the transport delivers it.
pub type ChunkStream = BoxStream<'static, Result<Bytes, RelayError>>;

#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Starts one streaming generation for `prompt`.
    ///
    /// Returns `Err` when the call cannot be established or the backend answers with a
    /// non-success status. Failures after that arrive as items of the returned stream.
    async fn generate(&self, model: &str, prompt: &str) -> Result<ChunkStream, RelayError>;
}
