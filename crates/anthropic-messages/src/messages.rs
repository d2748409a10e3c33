//! Single-turn text completion against the Messages API.

use crate::client::Client;
use crate::error::AnthropicError;
use crate::types::{ErrorEnvelope, MessagesRequest, MessagesResponse, DEFAULT_MAX_TOKENS};

/// Handle to one model on one client.
#[derive(Clone)]
pub struct MessagesModel {
    client: Client,
    model: String,
    max_tokens: u32,
}

impl MessagesModel {
    /// Create a new model handle.
    pub fn new(client: Client, model: String) -> Self {
        Self {
            client,
            model,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Set the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Get the model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a single user prompt and return the text of the first content block.
    pub async fn complete(&self, prompt: &str) -> Result<String, AnthropicError> {
        let request = MessagesRequest::single_turn(&self.model, self.max_tokens, prompt);
        let response = self.send(&request).await?;

        response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| AnthropicError::ParseError("response has no leading text block".to_string()))
    }

    /// Send a raw request and decode the response envelope.
    pub async fn send(&self, request: &MessagesRequest) -> Result<MessagesResponse, AnthropicError> {
        let url = self.client.endpoint_url();
        let headers = self.client.build_headers()?;

        tracing::debug!(model = %request.model, max_tokens = request.max_tokens, "POST {}", url);

        let response = self
            .client
            .http_client()
            .post(&url)
            .headers(headers)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            tracing::warn!(status, "Messages API returned an error: {}", message);
            return Err(AnthropicError::ApiError { status, message });
        }

        let body = response.text().await?;
        let parsed: MessagesResponse = serde_json::from_str(&body)?;

        tracing::debug!(
            id = %parsed.id,
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "Messages API call completed"
        );

        Ok(parsed)
    }
}

impl std::fmt::Debug for MessagesModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagesModel")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}
