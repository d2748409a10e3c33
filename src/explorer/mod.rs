//! History explorer core.
//!
//! A session starts when a date is selected on the cover: the generative
//! service lists five events for that day, which become the main card.
//! Opening an event or one of its exploration anchors appends a card whose
//! narrative is generated once per session and remembered for export.

pub mod anchors;
pub mod cache;
pub mod cards;
pub mod date;
pub mod events;
pub mod export;
pub mod generative;
pub mod navigation;
pub mod prompts;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use anchors::extract_anchors;
pub use cache::{ContentCache, ContentEntry, GeneratedEntry};
pub use cards::{Card, CardStack, MAIN_CARD_ID};
pub use date::ExploreDate;
pub use events::Event;
pub use generative::{AnthropicClientConfig, AnthropicGenerativeClient, GenerativeClient};
pub use navigation::{NavigationController, ViewState};
pub use session::SessionState;
