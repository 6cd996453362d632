//! Completion provider integration
//!
//! Talks to OpenAI and Ollama through their OpenAI-compatible chat
//! completions API, selecting the model per request and hiding provider
//! quirks behind [`crate::models::AiProvider`].

pub mod client;
pub mod dispatch;
pub mod mock;
pub mod provider;
pub mod types;

pub use client::CompletionClient;
pub use dispatch::{select_model, Dispatcher};
pub use mock::MockCompletionClient;

use crate::Result;
use async_trait::async_trait;
use types::{ChatCompletionRequest, ChatCompletionResponse};

#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse>;
}
