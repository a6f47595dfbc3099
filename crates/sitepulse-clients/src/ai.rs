//! AI inference collaborator.
//!
//! Speaks the OpenAI-compatible chat-completions protocol, so any hosted
//! gateway exposing that surface works. Photo analysis sends the image as a
//! base64 data URL content part.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClientError, Result};

const SERVICE: &str = "ai";

/// Per-request timeout. Generation is slower than the other collaborators.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SUMMARIZE_PROMPT: &str = "You are the site coordinator for a high-rise construction \
project. Summarize the day's chat log below into a short report paragraph covering manpower, \
machinery, activities, and any reported problems. Answer in Arabic.";

const ANALYZE_IMAGE_PROMPT: &str = "Analyze this construction site photo briefly (2-3 \
sentences). Focus on safety, progress, and main hazards.";

const SAFETY_TIP_PROMPT: &str = "You are a site safety manager for a high-rise construction \
project. Provide a single, short, impactful safety tip in Arabic for the site workers. Focus on \
either PPE, working at heights, electrical safety, or crane operations. Start with an emoji. \
Keep it under 30 words.";

/// The AI inference collaborator interface.
#[async_trait]
pub trait SiteAnalyst: Send + Sync {
    /// Summarizes a block of site log text.
    async fn summarize(&self, text: &str) -> Result<String>;

    /// Describes a site photo; `caption` is the author's caption, if any.
    async fn analyze_image(&self, image: &[u8], caption: Option<&str>) -> Result<String>;

    /// Produces one short safety tip.
    async fn safety_tip(&self) -> Result<String>;
}

/// Chat-completions-backed [`SiteAnalyst`].
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionClient {
    /// Creates a client against `base_url` (e.g. an OpenRouter-style
    /// gateway root ending in `/v1`).
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
        };

        let url = format!(
            "{}/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::from_request(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::from_status(SERVICE, status));
        }

        let body: ChatResponse =
            response.json().await.map_err(|e| ClientError::InvalidResponse {
                service: SERVICE,
                reason: e.to_string(),
            })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ClientError::InvalidResponse {
                service: SERVICE,
                reason: "empty choices".to_string(),
            })?;

        debug!(chars = content.len(), "chat completion received");
        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl SiteAnalyst for ChatCompletionClient {
    async fn summarize(&self, text: &str) -> Result<String> {
        self.chat(vec![
            ChatMessage::system(SUMMARIZE_PROMPT),
            ChatMessage::user(text),
        ])
        .await
    }

    async fn analyze_image(&self, image: &[u8], caption: Option<&str>) -> Result<String> {
        let mut prompt = ANALYZE_IMAGE_PROMPT.to_string();
        if let Some(caption) = caption {
            prompt.push_str(&format!(" User caption: {caption}"));
        }
        self.chat(vec![ChatMessage::user_with_image(&prompt, image)])
            .await
    }

    async fn safety_tip(&self) -> Result<String> {
        self.chat(vec![ChatMessage::user(SAFETY_TIP_PROMPT)]).await
    }
}

/// Chat completion request.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

/// A message in the chat request.
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

impl ChatMessage {
    fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(text.into()),
        }
    }

    fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Text(text.into()),
        }
    }

    fn user_with_image(text: &str, image: &[u8]) -> Self {
        let data_url = format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(image)
        );
        Self {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: text.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: data_url },
                },
            ]),
        }
    }
}

/// Plain text, or multimodal content parts.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

/// Chat completion response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_request_serialization() {
        let request = ChatRequest {
            model: "test-model".to_string(),
            messages: vec![
                ChatMessage::system("You are helpful."),
                ChatMessage::user("Hello"),
            ],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Hello");
    }

    #[test]
    fn test_image_message_is_multipart_data_url() {
        let message = ChatMessage::user_with_image("describe", &[0xFF, 0xD8]);
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][1]["type"], "image_url");
        let url = json["content"][1]["image_url"]["url"].as_str().unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{
            "id": "gen-123",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Two pours completed."},
                "finish_reason": "stop"
            }]
        }"#;

        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.choices[0].message.content.as_deref(),
            Some("Two pours completed.")
        );
    }

    #[test]
    fn test_null_content_handled() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(response.choices[0].message.content.is_none());
    }
}
