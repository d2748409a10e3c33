//! Minimal client for the Anthropic Messages API.
//!
//! Only the single-turn, non-streaming text path is covered: a user prompt
//! goes in, the text of the first content block comes out.
//!
//! # Example
//!
//! ```rust,no_run
//! use anthropic_messages::{Client, models};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("sk-ant-...")?;
//!     let model = client.messages_model(models::CLAUDE_SONNET_4);
//!     let text = model.complete("Tell me about July 20").await?;
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod messages;
mod types;

pub use client::{Client, ClientConfig};
pub use error::AnthropicError;
pub use messages::MessagesModel;
pub use types::*;

/// Model identifiers accepted by the Messages API
pub mod models {
    /// Claude Sonnet 4
    pub const CLAUDE_SONNET_4: &str = "claude-sonnet-4-20250514";
}
