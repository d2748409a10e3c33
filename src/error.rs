use anthropic_messages::AnthropicError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlmanacError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid date: {0}")]
    InputValidation(String),

    #[error("No active session; pick a date first")]
    NoSession,

    #[error("A session is already active; go back to the cover first")]
    SessionActive,

    #[error("Card not found: {0}")]
    UnknownCard(String),

    #[error("Event not found: {0}")]
    UnknownEvent(String),

    #[error("Card {card_id} has no exploration anchor #{index}")]
    UnknownAnchor { card_id: String, index: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AnthropicError> for AlmanacError {
    fn from(err: AnthropicError) -> Self {
        match err {
            AnthropicError::HttpError(e) => AlmanacError::Network(e.to_string()),
            AnthropicError::ApiError { status, message } => {
                AlmanacError::RequestFailed { status, message }
            }
            AnthropicError::ParseError(msg) => AlmanacError::Parse(msg),
            AnthropicError::ConfigError(msg) => AlmanacError::Internal(msg),
        }
    }
}

// Events carry errors as plain strings
impl Serialize for AlmanacError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AlmanacError>;
