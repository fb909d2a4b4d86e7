//! OpenAI-compatible chat completions.
//!
//! Every request carries exactly one user message. The reply's first choice
//! is returned verbatim; nothing is parsed out of the model's text here.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Credential;
use crate::error::{RcaError, RcaResult};
use crate::llm::transport::Transport;

/// Content of the single user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    /// Plain text prompt.
    Text(String),
    /// Instruction plus an inlined image (`data:` URI).
    TextWithImage { text: String, image_data_uri: String },
}

/// A hosted model that answers one user message with text.
pub trait ChatModel: Send + Sync {
    fn complete(&self, credential: &Credential, content: MessageContent) -> RcaResult<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: WireContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

impl From<MessageContent> for WireContent {
    fn from(content: MessageContent) -> Self {
        match content {
            MessageContent::Text(text) => WireContent::Text(text),
            MessageContent::TextWithImage {
                text,
                image_data_uri,
            } => WireContent::Parts(vec![
                ContentPart::Text { text },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_data_uri,
                    },
                },
            ]),
        }
    }
}

/// [`ChatModel`] speaking the chat-completions wire format over a [`Transport`].
pub struct ChatClient {
    transport: Arc<dyn Transport>,
    url: String,
    model: String,
}

impl ChatClient {
    pub fn new(transport: Arc<dyn Transport>, url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
            model: model.into(),
        }
    }

    fn build_body(&self, content: MessageContent) -> RcaResult<serde_json::Value> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: content.into(),
            }],
        };
        Ok(serde_json::to_value(&request)?)
    }
}

impl ChatModel for ChatClient {
    fn complete(&self, credential: &Credential, content: MessageContent) -> RcaResult<String> {
        let start = Instant::now();
        let body = self.build_body(content)?;

        debug!(model = %self.model, url = %self.url, "Sending chat completion request");
        let reply = self.transport.post_json(&self.url, credential.expose(), &body)?;

        match reply.status {
            401 | 403 => {
                return Err(RcaError::auth("chat completion", reply.text())
                    .with_recovery_suggestion("Check the API key in Settings or the environment"));
            }
            status if !reply.is_success() => {
                return Err(RcaError::api(Some(status), reply.text()));
            }
            _ => {}
        }

        let parsed: ChatResponse = serde_json::from_slice(&reply.body)
            .map_err(|e| RcaError::api(Some(reply.status), format!("malformed response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| RcaError::api(Some(reply.status), "model returned no content"))?;

        debug!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            chars = content.len(),
            "Chat completion received"
        );
        Ok(content)
    }
}
