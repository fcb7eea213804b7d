//! Streaming client for a local Ollama server

use crate::config::AppConfig;
use crate::error::RelayError;
use crate::infrastructure::entities::GenerateRequest;
use crate::infrastructure::traits::{ChunkStream, InferenceBackend};
use crate::preview;
use async_stream::stream;
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use futures_util::{StreamExt, pin_mut};
use log::{info, warn};
use std::time::Duration;
use tokio::time::timeout;

pub struct OllamaBackend {
    client: Ref<reqwest::Client>,
    url: String,
    timeout: Duration,
}

#[injectable(InferenceBackend)]
impl OllamaBackend {
    #[inject]
    pub fn create(config: Ref<AppConfig>, client: Ref<reqwest::Client>) -> OllamaBackend {
        OllamaBackend {
            client,
            url: config.ollama_url.clone(),
            timeout: config.request_timeout,
        }
    }
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    async fn generate(&self, model: &str, prompt: &str) -> Result<ChunkStream, RelayError> {
        info!(
            "Sending prompt to Ollama at {} with model {model}: '{}'",
            self.url,
            preview(prompt, 50)
        );

        // The timeout bounds each wait on the backend: connecting plus response headers, then
        // every gap between body chunks. A reply that keeps producing bytes is never cut off.
        let request = self.client.post(&self.url).json(&GenerateRequest {
            model,
            prompt,
            stream: true,
        });

        let response = timeout(self.timeout, request.send())
            .await
            .map_err(|_| {
                warn!("No response from Ollama within {:?}", self.timeout);
                RelayError::Timeout
            })?
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RelayError::from_transport(&self.url, e))?;

        let url = self.url.clone();
        let idle = self.timeout;
        Ok(stream! {
            let chunks = response.bytes_stream();
            pin_mut!(chunks);

            loop {
                match timeout(idle, chunks.next()).await {
                    Ok(Some(chunk)) => {
                        yield chunk.map_err(|e| RelayError::from_transport(&url, e));
                    }
                    Ok(None) => break,
                    Err(_) => {
                        warn!("Ollama stream stalled for {idle:?}");
                        yield Err(RelayError::Timeout);
                        break;
                    }
                }
            }
        }
        .boxed())
    }
}
