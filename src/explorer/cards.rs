//! Cards and the append-only card stack behind the carousel.
//!
//! Cards remember their parent for provenance only; navigation order is
//! the order of insertion.

use serde::Serialize;

use super::date::ExploreDate;
use super::events::Event;

/// Id of the root card holding the event list.
pub const MAIN_CARD_ID: &str = "main";

/// Id of the `index`-th extension opened from `parent_id`.
pub fn extension_id(parent_id: &str, index: usize) -> String {
    format!("{}_ext{}", parent_id, index)
}

/// One navigable unit of the carousel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Card {
    /// The event list for the selected date
    Main {
        id: String,
        title: String,
        events: Vec<Event>,
    },
    /// Narrative for one event
    EventDetail {
        id: String,
        title: String,
        emoji: String,
        category: String,
        parent_id: String,
        event: Event,
    },
    /// Narrative for a follow-up topic
    Extension {
        id: String,
        title: String,
        parent_id: String,
    },
}

impl Card {
    pub fn main(date: &ExploreDate, events: Vec<Event>) -> Self {
        Card::Main {
            id: MAIN_CARD_ID.to_string(),
            title: format!("Historical events on {}", date.display_name()),
            events,
        }
    }

    pub fn event_detail(event: &Event) -> Self {
        Card::EventDetail {
            id: event.id.clone(),
            title: event.display_title(),
            emoji: event.emoji.clone(),
            category: event.category.clone(),
            parent_id: MAIN_CARD_ID.to_string(),
            event: event.clone(),
        }
    }

    pub fn extension(parent_id: &str, label: &str, index: usize) -> Self {
        Card::Extension {
            id: extension_id(parent_id, index),
            title: label.to_string(),
            parent_id: parent_id.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Card::Main { id, .. } | Card::EventDetail { id, .. } | Card::Extension { id, .. } => id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Card::Main { title, .. }
            | Card::EventDetail { title, .. }
            | Card::Extension { title, .. } => title,
        }
    }

    /// `None` for the main card.
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Card::Main { .. } => None,
            Card::EventDetail { parent_id, .. } | Card::Extension { parent_id, .. } => {
                Some(parent_id)
            }
        }
    }

    /// Whether this card's body comes from the content cache.
    pub fn has_generated_content(&self) -> bool {
        !matches!(self, Card::Main { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Card::Main { .. } => "main",
            Card::EventDetail { .. } => "detail",
            Card::Extension { .. } => "extension",
        }
    }
}

/// Ordered, append-only sequence of cards with one focused index.
///
/// Invariants: the first card is the main card, the stack is never empty,
/// and `focused < len`.
#[derive(Debug, Clone, Serialize)]
pub struct CardStack {
    cards: Vec<Card>,
    focused: usize,
}

impl CardStack {
    /// Start a stack whose root is `main`, focused on it.
    pub fn new(main: Card) -> Self {
        debug_assert!(matches!(main, Card::Main { .. }));
        Self {
            cards: vec![main],
            focused: 0,
        }
    }

    /// Append a card and focus it. Returns the new index.
    pub fn push(&mut self, card: Card) -> usize {
        self.cards.push(card);
        self.focused = self.cards.len() - 1;
        self.focused
    }

    /// Focus card `index`, clamped into range. Returns the focused index.
    pub fn focus(&mut self, index: usize) -> usize {
        self.focused = index.min(self.cards.len() - 1);
        self.focused
    }

    pub fn next(&mut self) -> usize {
        self.focus(self.focused.saturating_add(1))
    }

    pub fn prev(&mut self) -> usize {
        self.focus(self.focused.saturating_sub(1))
    }

    pub fn focused_index(&self) -> usize {
        self.focused
    }

    pub fn focused_card(&self) -> &Card {
        &self.cards[self.focused]
    }

    pub fn main_card(&self) -> &Card {
        &self.cards[0]
    }

    pub fn get(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    /// First card with this id.
    pub fn find(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id() == id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }
}
