//! Client for the Anthropic Messages API.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

use crate::error::AnthropicError;
use crate::messages::MessagesModel;
use crate::types::{ANTHROPIC_VERSION, DEFAULT_BASE_URL};

/// Messages endpoint path, appended to the base URL
const MESSAGES_PATH: &str = "/v1/messages";

/// Connection settings for a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL, without trailing `/v1/messages`
    pub base_url: String,
    /// Value of the `anthropic-version` header
    pub anthropic_version: String,
    /// Whole-request timeout
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            anthropic_version: ANTHROPIC_VERSION.to_string(),
            timeout: Some(Duration::from_secs(120)),
        }
    }
}

/// Client for the Anthropic Messages API.
///
/// Cheap to clone; the underlying `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct Client {
    /// HTTP client for making requests
    http_client: reqwest::Client,
    /// API key sent as `x-api-key` (omitted when absent, e.g. behind a proxy)
    api_key: Option<String>,
    /// Base URL of the service
    base_url: String,
    /// `anthropic-version` header value
    anthropic_version: String,
}

impl Client {
    /// Create a client for the public endpoint with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, AnthropicError> {
        Self::with_config(Some(api_key.into()), ClientConfig::default())
    }

    /// Create a client with explicit connection settings.
    ///
    /// # Arguments
    /// * `api_key` - API key, or `None` when the endpoint does not need one
    /// * `config` - Base URL, version header and timeout
    pub fn with_config(
        api_key: Option<String>,
        config: ClientConfig,
    ) -> Result<Self, AnthropicError> {
        if let Some(key) = &api_key {
            if key.trim().is_empty() {
                return Err(AnthropicError::ConfigError("API key is empty".to_string()));
            }
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(AnthropicError::HttpError)?;

        Ok(Self {
            http_client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            anthropic_version: config.anthropic_version,
        })
    }

    /// Get a messages model handle for the specified model ID.
    pub fn messages_model(&self, model: &str) -> MessagesModel {
        MessagesModel::new(self.clone(), model.to_string())
    }

    /// Full URL of the messages endpoint.
    pub(crate) fn endpoint_url(&self) -> String {
        format!("{}{}", self.base_url, MESSAGES_PATH)
    }

    /// Build request headers.
    pub(crate) fn build_headers(&self) -> Result<HeaderMap, AnthropicError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_str(&self.anthropic_version)
                .map_err(|e| AnthropicError::ConfigError(e.to_string()))?,
        );
        if let Some(key) = &self.api_key {
            headers.insert(
                HeaderName::from_static("x-api-key"),
                HeaderValue::from_str(key)
                    .map_err(|e| AnthropicError::ConfigError(e.to_string()))?,
            );
        }

        Ok(headers)
    }

    /// Get the HTTP client.
    pub(crate) fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("anthropic_version", &self.anthropic_version)
            .finish_non_exhaustive()
    }
}
