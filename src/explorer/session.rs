//! Aggregate state of one exploration session.

use std::sync::Arc;

use uuid::Uuid;

use super::cache::{ContentCache, GeneratedEntry};
use super::cards::{Card, CardStack};
use super::date::ExploreDate;
use super::events::Event;

/// Everything that lives from a successful date selection until the user
/// returns to the cover. Owned by the navigation controller; the cache is
/// shared with in-flight generation tasks.
#[derive(Debug)]
pub struct SessionState {
    pub id: Uuid,
    pub selected_date: ExploreDate,
    pub events: Vec<Event>,
    pub cards: CardStack,
    pub cache: Arc<ContentCache>,
}

impl SessionState {
    /// Seed a session whose only card is the main list.
    pub fn new(selected_date: ExploreDate, events: Vec<Event>) -> Self {
        let cards = CardStack::new(Card::main(&selected_date, events.clone()));
        Self {
            id: Uuid::new_v4(),
            selected_date,
            events,
            cards,
            cache: Arc::new(ContentCache::new()),
        }
    }

    pub fn focused_index(&self) -> usize {
        self.cards.focused_index()
    }

    pub fn find_event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Event at 1-based list position `number`.
    pub fn event_at(&self, number: usize) -> Option<&Event> {
        number.checked_sub(1).and_then(|i| self.events.get(i))
    }

    pub fn generated_log(&self) -> Vec<GeneratedEntry> {
        self.cache.generated_log()
    }
}
