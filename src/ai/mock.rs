use super::types::{
    ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatMessageContent,
};
use super::CompletionService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
enum MockResponse {
    Choices(Vec<String>),
    Failure { status: u16, message: String },
}

/// Scripted completion service. Responses are replayed in order and cycle
/// once exhausted; every request is recorded as JSON.
#[derive(Clone)]
pub struct MockCompletionClient {
    responses: Arc<Mutex<Vec<MockResponse>>>,
    requests: Arc<Mutex<Vec<serde_json::Value>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Queues one response whose choices carry the given contents.
    pub fn with_choices(self, contents: &[&str]) -> Self {
        self.responses.lock().unwrap().push(MockResponse::Choices(
            contents.iter().map(|c| c.to_string()).collect(),
        ));
        self
    }

    pub fn with_failure(self, status: u16, message: &str) -> Self {
        self.responses.lock().unwrap().push(MockResponse::Failure {
            status,
            message: message.to_string(),
        });
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn recorded_requests(&self) -> Vec<serde_json::Value> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockCompletionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionService for MockCompletionClient {
    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.requests
            .lock()
            .unwrap()
            .push(serde_json::to_value(request)?);

        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        let responses = self.responses.lock().unwrap();
        let response = if responses.is_empty() {
            MockResponse::Choices(vec![
                r#"{"questions_answers":[{"q":"Mock question","a":"Mock answer"}]}"#.to_string(),
            ])
        } else {
            responses[(*count - 1) % responses.len()].clone()
        };

        match response {
            MockResponse::Choices(contents) => Ok(ChatCompletionResponse {
                choices: contents
                    .into_iter()
                    .map(|content| ChatChoice {
                        message: ChatMessage {
                            role: "assistant".to_string(),
                            content: Some(ChatMessageContent::Text(content)),
                        },
                        finish_reason: Some("stop".to_string()),
                    })
                    .collect(),
            }),
            MockResponse::Failure { status, message } => Err(Error::Provider {
                provider: "Mock".to_string(),
                status,
                message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "mock-model".to_string(),
            messages: vec![],
            temperature: 0.0,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            n: Some(2),
            max_completion_tokens: None,
            max_tokens: None,
            response_format: None,
        }
    }

    #[tokio::test]
    async fn test_mock_default_response() {
        let client = MockCompletionClient::new();
        let response = client.chat_completion(&request()).await.unwrap();
        assert_eq!(response.choices.len(), 1);
    }

    #[tokio::test]
    async fn test_mock_cycles_responses_and_records_requests() {
        let client = MockCompletionClient::new()
            .with_choices(&["first"])
            .with_failure(500, "boom");
        let handle = client.clone();

        assert!(client.chat_completion(&request()).await.is_ok());
        assert!(matches!(
            client.chat_completion(&request()).await,
            Err(Error::Provider { status: 500, .. })
        ));
        assert!(client.chat_completion(&request()).await.is_ok());

        assert_eq!(handle.get_call_count(), 3);
        let requests = handle.recorded_requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0]["model"], "mock-model");
        assert_eq!(requests[0]["n"], 2);
    }
}
