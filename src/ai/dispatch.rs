use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatMessageContent, MessagePart,
    ResponseFormat,
};
use super::CompletionService;
use crate::flashcards::prompt::{ContentSegment, MessageContent, PromptMessage};
use crate::media::mime;
use crate::models::{GenerationOptions, ProviderConfig};
use crate::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Picks the model for a request.
///
/// Text-only requests use the per-call override, then the configured model,
/// then the provider default. Requests with media use the configured vision
/// model or the provider's default vision model.
pub fn select_model(
    config: &ProviderConfig,
    has_media: bool,
    model_override: Option<&str>,
) -> String {
    let configured = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    if has_media {
        configured(config.vision_model.as_deref())
            .unwrap_or_else(|| config.provider.default_vision_model().to_string())
    } else {
        configured(model_override)
            .or_else(|| configured(config.model.as_deref()))
            .unwrap_or_else(|| config.provider.default_text_model().to_string())
    }
}

fn to_wire(message: &PromptMessage) -> ChatMessage {
    let content = match message {
        PromptMessage::System(text) | PromptMessage::Assistant(text) => {
            ChatMessageContent::Text(text.clone())
        }
        PromptMessage::User(MessageContent::Text(text)) => ChatMessageContent::Text(text.clone()),
        PromptMessage::User(MessageContent::Segments(segments)) => ChatMessageContent::Parts(
            segments
                .iter()
                .map(|segment| match segment {
                    ContentSegment::Text(text) => MessagePart::text(text.clone()),
                    ContentSegment::Media { mime_type, encoded } => {
                        MessagePart::image_url(mime::data_uri(*mime_type, encoded))
                    }
                })
                .collect(),
        ),
    };

    ChatMessage {
        role: message.role().to_string(),
        content: Some(content),
    }
}

/// Sends prompts to the configured provider and collects choice contents.
pub struct Dispatcher<'a> {
    config: &'a ProviderConfig,
    service: Arc<dyn CompletionService>,
}

impl<'a> Dispatcher<'a> {
    /// Builds the provider's HTTP client; fails if `config` is incomplete.
    pub fn new(config: &'a ProviderConfig, http: reqwest::Client) -> Result<Self> {
        let client = config.provider.build_client(config, http)?;
        Ok(Self::with_service(config, Arc::new(client)))
    }

    pub fn with_service(config: &'a ProviderConfig, service: Arc<dyn CompletionService>) -> Self {
        Self { config, service }
    }

    /// Builds the wire request for `samples` completions of `messages`.
    pub fn build_request(
        &self,
        messages: &[PromptMessage],
        has_media: bool,
        question_count: usize,
        samples: usize,
        options: &GenerationOptions,
    ) -> ChatCompletionRequest {
        let provider = self.config.provider;
        let max_tokens = options.max_tokens(question_count);

        ChatCompletionRequest {
            model: select_model(self.config, has_media, options.model_override.as_deref()),
            messages: messages.iter().map(to_wire).collect(),
            temperature: options.temperature,
            top_p: options.top_p,
            frequency_penalty: options.frequency_penalty,
            presence_penalty: options.presence_penalty,
            n: provider
                .supports_multiple_choices()
                .then(|| u32::try_from(samples).unwrap_or(u32::MAX)),
            max_completion_tokens: provider.uses_max_completion_tokens().then_some(max_tokens),
            max_tokens: (!provider.uses_max_completion_tokens()).then_some(max_tokens),
            response_format: (provider.supports_response_format_hint() && !has_media)
                .then(ResponseFormat::json_object),
        }
    }

    /// Submits the prompt and returns the text of every returned choice.
    ///
    /// Providers that ignore `n` get one request per sample, sent in order.
    pub async fn submit(
        &self,
        messages: &[PromptMessage],
        has_media: bool,
        question_count: usize,
        samples: usize,
        options: &GenerationOptions,
    ) -> Result<Vec<Option<String>>> {
        let provider = self.config.provider;
        let request = self.build_request(messages, has_media, question_count, samples, options);

        info!(
            "Requesting {} sample(s) of {} flashcards from {} (model {}, media: {})",
            samples, question_count, provider, request.model, has_media
        );

        let rounds = if provider.supports_multiple_choices() {
            1
        } else {
            samples
        };

        let mut contents = Vec::with_capacity(samples);
        for _ in 0..rounds {
            let response = self.service.chat_completion(&request).await?;
            contents.extend(choice_contents(response));
        }

        Ok(contents)
    }

    /// Like [`Dispatcher::submit`], but logs failures and returns no choices.
    pub async fn dispatch(
        &self,
        messages: &[PromptMessage],
        has_media: bool,
        question_count: usize,
        samples: usize,
        options: &GenerationOptions,
    ) -> Vec<Option<String>> {
        match self
            .submit(messages, has_media, question_count, samples, options)
            .await
        {
            Ok(contents) => contents,
            Err(e) => {
                error!("Flashcard request to {} failed: {}", self.config.provider, e);
                Vec::new()
            }
        }
    }
}

fn choice_contents(response: ChatCompletionResponse) -> Vec<Option<String>> {
    response
        .choices
        .into_iter()
        .enumerate()
        .map(|(index, choice)| {
            if choice.finish_reason.as_deref() == Some("length") {
                warn!(
                    "Choice {} was cut off by the token limit; its JSON may be incomplete",
                    index
                );
            }
            choice.message.content.map(|c| c.text())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockCompletionClient;
    use crate::flashcards::prompt::build_note_prompt;
    use crate::media::{MediaItem, MimeType};
    use crate::models::AiProvider;
    use crate::Error;
    use pretty_assertions::assert_eq;

    fn ollama() -> ProviderConfig {
        ProviderConfig::new(AiProvider::Ollama)
            .with_endpoint("http://localhost:11434")
            .with_model("llama3.2")
    }

    fn openai() -> ProviderConfig {
        ProviderConfig::new(AiProvider::OpenAi).with_api_key("sk-test")
    }

    fn png() -> MediaItem {
        MediaItem {
            source_path: "img/cell.png".to_string(),
            encoded_content: "iVBORw==".to_string(),
            mime_type: MimeType::Png,
            alt_text: None,
        }
    }

    #[test]
    fn test_select_model_ollama() {
        let config = ollama();
        assert_eq!(select_model(&config, false, None), "llama3.2");
        assert_eq!(select_model(&config, true, None), "llama3.2-vision:11b");
    }

    #[test]
    fn test_select_model_prefers_configured_vision_model() {
        let config = ollama().with_vision_model("llava:13b");
        assert_eq!(select_model(&config, true, Some("ignored")), "llava:13b");
    }

    #[test]
    fn test_select_model_override_and_defaults() {
        let config = openai();
        assert_eq!(select_model(&config, false, None), "gpt-4o-mini");
        assert_eq!(select_model(&config, false, Some("gpt-4.1")), "gpt-4.1");
        assert_eq!(select_model(&config, false, Some("  ")), "gpt-4o-mini");
        assert_eq!(select_model(&config, true, None), "gpt-4o");
    }

    #[test]
    fn test_openai_text_request_has_json_hint_and_n() {
        let config = openai();
        let dispatcher = Dispatcher::with_service(&config, Arc::new(MockCompletionClient::new()));
        let messages = build_note_prompt("notes", 4, &[], None);
        let options = GenerationOptions {
            max_tokens_per_question: 50,
            ..Default::default()
        };

        let request = dispatcher.build_request(&messages, false, 4, 3, &options);
        assert_eq!(request.n, Some(3));
        assert_eq!(request.max_completion_tokens, Some(200));
        assert_eq!(request.max_tokens, None);
        assert_eq!(request.response_format, Some(ResponseFormat::json_object()));
        assert_eq!(request.messages.len(), 4);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[2].role, "assistant");
    }

    #[test]
    fn test_openai_media_request_drops_json_hint() {
        let config = openai();
        let dispatcher = Dispatcher::with_service(&config, Arc::new(MockCompletionClient::new()));
        let messages = build_note_prompt("notes", 2, &[png()], None);

        let request = dispatcher.build_request(&messages, true, 2, 1, &GenerationOptions::default());
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.response_format, None);

        let json = serde_json::to_value(&request.messages[3]).unwrap();
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][1]["type"], "image_url");
        assert_eq!(
            json["content"][1]["image_url"]["url"],
            "data:image/png;base64,iVBORw=="
        );
    }

    #[test]
    fn test_ollama_request_uses_max_tokens_without_n() {
        let config = ollama();
        let dispatcher = Dispatcher::with_service(&config, Arc::new(MockCompletionClient::new()));
        let messages = build_note_prompt("notes", 3, &[], None);

        let request = dispatcher.build_request(&messages, false, 3, 2, &GenerationOptions::default());
        assert_eq!(request.n, None);
        assert_eq!(request.max_tokens, Some(300));
        assert_eq!(request.max_completion_tokens, None);
        assert_eq!(request.response_format, None);
    }

    #[tokio::test]
    async fn test_ollama_submits_one_request_per_sample() {
        let config = ollama();
        let mock = MockCompletionClient::new()
            .with_choices(&["one"])
            .with_choices(&["two"]);
        let handle = mock.clone();
        let dispatcher = Dispatcher::with_service(&config, Arc::new(mock));
        let messages = build_note_prompt("notes", 1, &[], None);

        let contents = dispatcher
            .submit(&messages, false, 1, 2, &GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(
            contents,
            vec![Some("one".to_string()), Some("two".to_string())]
        );
        assert_eq!(handle.get_call_count(), 2);
    }

    #[tokio::test]
    async fn test_openai_submits_once_for_all_samples() {
        let config = openai();
        let mock = MockCompletionClient::new().with_choices(&["a", "b", "c"]);
        let handle = mock.clone();
        let dispatcher = Dispatcher::with_service(&config, Arc::new(mock));
        let messages = build_note_prompt("notes", 1, &[], None);

        let contents = dispatcher
            .submit(&messages, false, 1, 3, &GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(contents.len(), 3);
        assert_eq!(handle.get_call_count(), 1);
        assert_eq!(handle.recorded_requests()[0]["n"], 3);
    }

    #[tokio::test]
    async fn test_dispatch_returns_empty_on_failure() {
        let config = ollama();
        let mock = MockCompletionClient::new().with_failure(500, "model crashed");
        let dispatcher = Dispatcher::with_service(&config, Arc::new(mock));
        let messages = build_note_prompt("notes", 1, &[], None);
        let options = GenerationOptions::default();

        assert!(matches!(
            dispatcher.submit(&messages, false, 1, 1, &options).await,
            Err(Error::Provider { status: 500, .. })
        ));
        assert!(dispatcher
            .dispatch(&messages, false, 1, 1, &options)
            .await
            .is_empty());
    }

    #[test]
    fn test_new_rejects_incomplete_config() {
        let config = ProviderConfig::new(AiProvider::OpenAi);
        assert!(matches!(
            Dispatcher::new(&config, reqwest::Client::new()),
            Err(Error::Configuration(_))
        ));
    }
}
