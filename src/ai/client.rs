use super::types::{ChatCompletionRequest, ChatCompletionResponse};
use super::CompletionService;
use crate::models::AiProvider;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
pub struct CompletionClient {
    client: Client,
    provider: AiProvider,
    api_key: Option<String>,
    base_url: String,
}

impl CompletionClient {
    pub fn new_with_client(
        provider: AiProvider,
        api_key: Option<String>,
        base_url: String,
        client: Client,
    ) -> Self {
        Self {
            client,
            provider,
            api_key,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let url = format!("{}{}", self.base_url, CHAT_COMPLETIONS_PATH);
        let mut builder = self.client.post(&url).json(request);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!("Failed to send request to {} at {}: {}", self.provider, url, e);
            Error::Connectivity {
                provider: self.provider.to_string(),
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                "{} API error (status {}): {}",
                self.provider,
                status,
                error_text
            );

            let detail = self.provider.extract_error_message(&error_text);
            let message = if status == StatusCode::UNAUTHORIZED {
                format!("{} ({})", self.provider.unauthorized_hint(), detail)
            } else {
                detail
            };

            return Err(Error::Provider {
                provider: self.provider.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                "Failed to parse {} response: {}\nBody: {}",
                self.provider,
                e,
                body
            );
            Error::Serialization(e)
        })
    }
}

#[async_trait]
impl CompletionService for CompletionClient {
    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        tracing::debug!(
            "Sending chat completion request to {} (model {})",
            self.provider,
            request.model
        );
        self.post(request).await
    }
}
