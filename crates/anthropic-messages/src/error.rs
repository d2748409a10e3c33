//! Error types for the Messages API client.

use thiserror::Error;

/// Errors that can occur when calling the Messages API.
#[derive(Debug, Error)]
pub enum AnthropicError {
    /// HTTP request could not be sent or the body could not be read
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned a non-success status
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for AnthropicError {
    fn from(err: serde_json::Error) -> Self {
        AnthropicError::ParseError(err.to_string())
    }
}
