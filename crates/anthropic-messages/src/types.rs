//! Request and response types for the Messages API.

use serde::{Deserialize, Serialize};

/// Anthropic API version header value
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Maximum tokens default
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single-string message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }
}

/// Request body for `POST /v1/messages`
#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    /// Model identifier
    pub model: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Messages in the conversation
    pub messages: Vec<Message>,
    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Temperature for sampling (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl MessagesRequest {
    /// Build a single-turn request carrying one user prompt.
    pub fn single_turn(model: impl Into<String>, max_tokens: u32, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            messages: vec![Message::user(prompt)],
            system: None,
            temperature: None,
        }
    }
}

/// Content block in a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content
    Text { text: String },
    /// Any block type this client does not consume (tool use, thinking, ...)
    #[serde(other)]
    Unsupported,
}

/// Usage statistics in the response
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

/// Response from the Messages API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    /// Unique ID for the response
    #[serde(default)]
    pub id: String,
    /// Model that generated the response
    #[serde(default)]
    pub model: String,
    /// Content blocks
    pub content: Vec<ContentBlock>,
    /// Reason the model stopped generating
    #[serde(default)]
    pub stop_reason: Option<String>,
    /// Token usage statistics
    #[serde(default)]
    pub usage: Usage,
}

impl MessagesResponse {
    /// Text of the first content block, if it is a text block.
    pub fn first_text(&self) -> Option<&str> {
        match self.content.first() {
            Some(ContentBlock::Text { text }) => Some(text.as_str()),
            _ => None,
        }
    }
}

/// Error envelope returned with non-success statuses
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub message: String,
}
