//! Generative text service abstraction.
//!
//! The explorer only needs "prompt in, text out, or an error". The trait
//! keeps the navigation core independent of the HTTP transport so tests
//! can script responses.

use std::time::Duration;

use anthropic_messages::{Client, ClientConfig, MessagesModel};
use async_trait::async_trait;

use crate::error::Result;

/// A single-turn text completion service.
///
/// Each call completes or fails exactly once; no ordering between calls is
/// assumed.
#[async_trait]
pub trait GenerativeClient: Send + Sync + 'static {
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "generative"
    }
}

/// Connection settings for [`AnthropicGenerativeClient`].
#[derive(Debug, Clone)]
pub struct AnthropicClientConfig<'a> {
    pub api_key: Option<&'a str>,
    pub model: &'a str,
    pub max_tokens: u32,
    pub base_url: &'a str,
    pub anthropic_version: &'a str,
    pub timeout_secs: u64,
}

/// [`GenerativeClient`] backed by the Anthropic Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicGenerativeClient {
    model: MessagesModel,
}

impl AnthropicGenerativeClient {
    pub fn new(config: AnthropicClientConfig<'_>) -> Result<Self> {
        let client_config = ClientConfig {
            base_url: config.base_url.to_string(),
            anthropic_version: config.anthropic_version.to_string(),
            timeout: (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs)),
        };
        let client = Client::with_config(config.api_key.map(str::to_string), client_config)?;
        let model = client
            .messages_model(config.model)
            .with_max_tokens(config.max_tokens);

        Ok(Self { model })
    }

    pub fn model_name(&self) -> &str {
        self.model.model()
    }
}

#[async_trait]
impl GenerativeClient for AnthropicGenerativeClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        Ok(self.model.complete(prompt).await?)
    }

    fn name(&self) -> &str {
        self.model.model()
    }
}
