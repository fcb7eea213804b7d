//! Implementations for the service the app needs.
//!

use crate::config::AppConfig;
use crate::core::relay::{guard, relay};
use crate::core::traits::{ChatService, EventStream};
use crate::infrastructure::traits::InferenceBackend;
use di::{Ref, injectable};
use futures_util::StreamExt;

#[injectable(ChatService)]
pub struct OllamaChatService {
    backend: Ref<dyn InferenceBackend>,
    config: Ref<AppConfig>,
}

impl ChatService for OllamaChatService {
    fn reply(&self, message: String) -> EventStream {
        guard(relay(
            self.backend.clone(),
            self.config.model_name.clone(),
            message,
        ))
        .boxed()
    }
}
