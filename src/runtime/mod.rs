// Runtime abstraction between the explorer core and whatever presents it.
//
// The navigation controller mutates state synchronously and reports what
// happened as `RuntimeEvent`s; a presenter (the CLI output loop) renders
// them. Generation tasks finishing later report through the same channel.

use std::any::Any;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::explorer::cards::Card;
use crate::explorer::events::Event;

/// Runtime-specific errors
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Event receiver closed")]
    ReceiverClosed,
}

/// Events emitted to the presenter
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    /// Event-list generation for a date has started
    EventsRequested { date: String },

    /// Event-list generation failed; still on the cover
    EventsFailed { date: String, message: String },

    /// A session is active with its main card focused
    SessionStarted {
        session_id: Uuid,
        date: String,
        events: Vec<Event>,
    },

    /// A card was appended and focused
    ///
    /// `content` is set when the card's text was already cached.
    CardOpened {
        session_id: Uuid,
        index: usize,
        total: usize,
        card: Card,
        content: Option<String>,
    },

    /// Focus moved without adding a card
    ///
    /// Carries the newly focused card and its cached text, if any.
    FocusChanged {
        session_id: Uuid,
        index: usize,
        total: usize,
        card: Card,
        content: Option<String>,
    },

    /// Content generation for a card was issued
    GenerationStarted { session_id: Uuid, card_id: String },

    /// Content generation for a card resolved (possibly into an apology)
    GenerationCompleted {
        session_id: Uuid,
        card_id: String,
        text: String,
        failed: bool,
    },

    /// Session discarded; back on the cover
    SessionReset { session_id: Uuid },
}

/// Runtime abstraction for presenting explorer state
///
/// # Object Safety
/// This trait is object-safe and intended to be used as `Arc<dyn ExplorerRuntime>`.
#[async_trait]
pub trait ExplorerRuntime: Send + Sync + 'static {
    /// Emit an event to the presenter
    ///
    /// # Errors
    /// Returns `RuntimeError::ReceiverClosed` if the presenter is gone.
    fn emit(&self, event: RuntimeEvent) -> Result<(), RuntimeError>;

    /// Check if running in interactive mode (has a TTY)
    fn is_interactive(&self) -> bool;

    /// Graceful shutdown - flush events, close channels, etc.
    async fn shutdown(&self) -> Result<(), RuntimeError>;

    /// Get as Any for downcasting to concrete type.
    fn as_any(&self) -> &dyn Any;
}

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "cli")]
pub use cli::CliRuntime;
