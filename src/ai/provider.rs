//! Per-provider capabilities.
//!
//! The set of providers is closed, so quirks are expressed as methods on
//! [`AiProvider`] rather than through a trait object.

use super::client::CompletionClient;
use crate::models::{AiProvider, ProviderConfig};
use crate::Result;

impl AiProvider {
    pub fn default_text_model(self) -> &'static str {
        match self {
            AiProvider::OpenAi => "gpt-4o-mini",
            AiProvider::Ollama => "llama3.2",
        }
    }

    pub fn default_vision_model(self) -> &'static str {
        match self {
            AiProvider::OpenAi => "gpt-4o",
            AiProvider::Ollama => "llama3.2-vision:11b",
        }
    }

    /// Whether a JSON `response_format` hint may be sent. Only honoured for
    /// text-only requests; vision responses ignore it.
    pub fn supports_response_format_hint(self) -> bool {
        matches!(self, AiProvider::OpenAi)
    }

    /// Whether one request can return several choices via `n`.
    pub fn supports_multiple_choices(self) -> bool {
        matches!(self, AiProvider::OpenAi)
    }

    /// OpenAI takes `max_completion_tokens`; Ollama's compatibility layer
    /// only reads `max_tokens`.
    pub fn uses_max_completion_tokens(self) -> bool {
        matches!(self, AiProvider::OpenAi)
    }

    pub fn requires_api_key(self) -> bool {
        matches!(self, AiProvider::OpenAi)
    }

    pub fn default_endpoint(self) -> Option<&'static str> {
        match self {
            AiProvider::OpenAi => Some("https://api.openai.com"),
            AiProvider::Ollama => None,
        }
    }

    /// Guidance attached to a 401 response.
    pub fn unauthorized_hint(self) -> &'static str {
        match self {
            AiProvider::OpenAi => {
                "the API key was rejected; check FLASHCARDS_API_KEY and that the key is still active"
            }
            AiProvider::Ollama => {
                "the endpoint refused the request; check FLASHCARDS_ENDPOINT points at the Ollama server and that any proxy in front of it accepts your credentials"
            }
        }
    }

    /// Pulls the human-readable message out of an error body.
    ///
    /// OpenAI nests it as `{"error": {"message": ...}}`; Ollama returns
    /// `{"error": "..."}`. Anything else is returned verbatim.
    pub fn extract_error_message(self, body: &str) -> String {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let error = parsed.as_ref().and_then(|v| v.get("error"));

        let message = match (self, error) {
            (AiProvider::OpenAi, Some(error)) => error
                .get("message")
                .and_then(|m| m.as_str())
                .or_else(|| error.as_str()),
            (AiProvider::Ollama, Some(error)) => error
                .as_str()
                .or_else(|| error.get("message").and_then(|m| m.as_str())),
            (_, None) => None,
        };

        message
            .map(str::to_string)
            .unwrap_or_else(|| body.trim().to_string())
    }

    /// Builds the HTTP client for this provider after validating `config`.
    pub fn build_client(
        self,
        config: &ProviderConfig,
        http: reqwest::Client,
    ) -> Result<CompletionClient> {
        config.validate()?;
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        Ok(CompletionClient::new_with_client(
            self,
            api_key,
            config.base_url()?,
            http,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_default_models() {
        assert_eq!(AiProvider::Ollama.default_text_model(), "llama3.2");
        assert_eq!(
            AiProvider::Ollama.default_vision_model(),
            "llama3.2-vision:11b"
        );
        assert_eq!(AiProvider::OpenAi.default_vision_model(), "gpt-4o");
    }

    #[test]
    fn test_capabilities() {
        assert!(AiProvider::OpenAi.supports_response_format_hint());
        assert!(!AiProvider::Ollama.supports_response_format_hint());
        assert!(AiProvider::OpenAi.supports_multiple_choices());
        assert!(!AiProvider::Ollama.supports_multiple_choices());
        assert!(AiProvider::OpenAi.requires_api_key());
        assert!(AiProvider::Ollama.default_endpoint().is_none());
    }

    #[test]
    fn test_extract_openai_error_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(
            AiProvider::OpenAi.extract_error_message(body),
            "Incorrect API key provided"
        );
    }

    #[test]
    fn test_extract_ollama_error_message() {
        let body = r#"{"error":"model \"llava\" not found"}"#;
        assert_eq!(
            AiProvider::Ollama.extract_error_message(body),
            "model \"llava\" not found"
        );
    }

    #[test]
    fn test_extract_error_message_falls_back_to_body() {
        assert_eq!(
            AiProvider::OpenAi.extract_error_message("  Bad Gateway \n"),
            "Bad Gateway"
        );
    }

    #[test]
    fn test_build_client_validates_config() {
        assert!(matches!(
            AiProvider::OpenAi
                .build_client(&ProviderConfig::new(AiProvider::OpenAi), reqwest::Client::new()),
            Err(Error::Configuration(_))
        ));

        let config = ProviderConfig::new(AiProvider::Ollama).with_endpoint("http://localhost:11434");
        let client = AiProvider::Ollama
            .build_client(&config, reqwest::Client::new())
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }
}
