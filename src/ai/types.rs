//! OpenAI-compatible chat-completion payloads.
//!
//! Both supported providers speak this wire format; Ollama through its
//! `/v1` compatibility endpoint.

use serde::{Deserialize, Serialize};

/// Request body for chat completions.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

/// Structured response-format directive for chat completions.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

/// Message content union.
///
/// Variant order matters for `#[serde(untagged)]` decoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChatMessageContent {
    Text(String),
    Parts(Vec<MessagePart>),
}

impl ChatMessageContent {
    /// Text of the content; multipart content joins its text parts.
    pub fn text(&self) -> String {
        match self {
            ChatMessageContent::Text(text) => text.clone(),
            ChatMessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

/// One content segment in multipart message input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessagePart {
    #[serde(rename = "type")]
    pub part_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<ImageUrl>,
}

impl MessagePart {
    pub fn text(text: String) -> Self {
        Self {
            part_type: "text".to_string(),
            text: Some(text),
            image_url: None,
        }
    }

    pub fn image_url(url: String) -> Self {
        Self {
            part_type: "image_url".to_string(),
            text: None,
            image_url: Some(ImageUrl { url }),
        }
    }
}

/// Image URL wrapper; carries `data:` URIs for attached media.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

/// Chat message object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ChatMessageContent>,
}

/// Top-level chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// Single choice item returned by chat completions.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_content_serializes_as_string() {
        let message = ChatMessage {
            role: "user".to_string(),
            content: Some(ChatMessageContent::Text("hi".to_string())),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            serde_json::json!({ "role": "user", "content": "hi" })
        );
    }

    #[test]
    fn test_multipart_content_serializes_image_url() {
        let message = ChatMessage {
            role: "user".to_string(),
            content: Some(ChatMessageContent::Parts(vec![
                MessagePart::text("look".to_string()),
                MessagePart::image_url("data:image/png;base64,AAAA".to_string()),
            ])),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            serde_json::json!({
                "role": "user",
                "content": [
                    { "type": "text", "text": "look" },
                    { "type": "image_url", "image_url": { "url": "data:image/png;base64,AAAA" } }
                ]
            })
        );
    }

    #[test]
    fn test_request_omits_unset_options() {
        let request = ChatCompletionRequest {
            model: "m".to_string(),
            messages: vec![],
            temperature: 0.5,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            n: None,
            max_completion_tokens: None,
            max_tokens: Some(300),
            response_format: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("n").is_none());
        assert!(json.get("response_format").is_none());
        assert!(json.get("max_completion_tokens").is_none());
        assert_eq!(json["max_tokens"], 300);
    }

    #[test]
    fn test_response_tolerates_null_content() {
        let response: ChatCompletionResponse = serde_json::from_value(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": null }, "finish_reason": "stop" }]
        }))
        .unwrap();
        assert!(response.choices[0].message.content.is_none());
    }
}
