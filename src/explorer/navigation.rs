//! Navigation state machine: cover screen and card carousel.
//!
//! ```text
//!            select_date (ok)
//!   Cover ───────────────────▶ Exploring ──┐ open_event / open_extension
//!     ▲                            │  ▲     │ focus / next / prev / retry
//!     └──────────── back ──────────┘  └─────┘
//! ```
//!
//! Card mutations happen synchronously. Content generation runs in spawned
//! tasks that only touch their own cache slot and report completion
//! through the runtime.

use std::sync::Arc;

use chrono::Local;
use futures::future::join_all;
use serde::Serialize;
use tokio::task::JoinHandle;

use super::anchors::extract_anchors;
use super::cards::Card;
use super::date::ExploreDate;
use super::events::decode;
use super::export;
use super::generative::GenerativeClient;
use super::prompts::{build_event_list_prompt, build_extension_prompt};
use super::session::SessionState;
use crate::error::{AlmanacError, Result};
use crate::runtime::{ExplorerRuntime, RuntimeEvent};

/// Top-level view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    Cover,
    Exploring,
}

/// Single owner of the session; all user actions go through here.
pub struct NavigationController {
    client: Arc<dyn GenerativeClient>,
    runtime: Arc<dyn ExplorerRuntime>,
    session: Option<SessionState>,
    pending: Vec<JoinHandle<()>>,
}

impl NavigationController {
    pub fn new(client: Arc<dyn GenerativeClient>, runtime: Arc<dyn ExplorerRuntime>) -> Self {
        Self {
            client,
            runtime,
            session: None,
            pending: Vec::new(),
        }
    }

    pub fn view(&self) -> ViewState {
        if self.session.is_some() {
            ViewState::Exploring
        } else {
            ViewState::Cover
        }
    }

    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    fn session_ref(&self) -> Result<&SessionState> {
        self.session.as_ref().ok_or(AlmanacError::NoSession)
    }

    fn session_mut(&mut self) -> Result<&mut SessionState> {
        self.session.as_mut().ok_or(AlmanacError::NoSession)
    }

    /// Cover -> Exploring.
    ///
    /// On any failure the controller stays on the cover and the error is
    /// returned to the caller.
    pub async fn select_date(&mut self, date: ExploreDate) -> Result<&SessionState> {
        if self.session.is_some() {
            return Err(AlmanacError::SessionActive);
        }

        let day = date.display_name();
        tracing::info!(date = %date.mm_dd(), "exploring date");
        self.emit(RuntimeEvent::EventsRequested { date: day.clone() });

        let prompt = build_event_list_prompt(&date);
        let events = match self.client.complete(&prompt).await {
            Ok(text) => decode(&text, &date),
            Err(e) => Err(e),
        };

        let events = match events {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(date = %date.mm_dd(), "event list generation failed: {}", e);
                self.emit(RuntimeEvent::EventsFailed {
                    date: day,
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        let session = SessionState::new(date, events);
        tracing::debug!(session_id = %session.id, "session started");
        self.emit(RuntimeEvent::SessionStarted {
            session_id: session.id,
            date: day,
            events: session.events.clone(),
        });

        Ok(&*self.session.insert(session))
    }

    /// Append a detail card for `event_id`, focus it, and generate its
    /// narrative unless the cache already has or is fetching it.
    ///
    /// Opening the same event twice appends a second card.
    pub fn open_event(&mut self, event_id: &str) -> Result<usize> {
        let session = self.session_mut()?;
        let event = session
            .find_event(event_id)
            .cloned()
            .ok_or_else(|| AlmanacError::UnknownEvent(event_id.to_string()))?;

        let index = session.cards.push(Card::event_detail(&event));
        tracing::debug!(card_id = %event.id, index, "opened event card");

        self.card_opened(index);
        self.ensure_generation(&event.id, event.prompt);
        Ok(index)
    }

    /// [`Self::open_event`] by 1-based position in the main list.
    pub fn open_event_number(&mut self, number: usize) -> Result<usize> {
        let event_id = self
            .session_ref()?
            .event_at(number)
            .map(|e| e.id.clone())
            .ok_or_else(|| AlmanacError::UnknownEvent(format!("#{}", number)))?;
        self.open_event(&event_id)
    }

    /// Append an extension card for anchor `index` of `parent_id`.
    pub fn open_extension(&mut self, parent_id: &str, label: &str, index: usize) -> Result<usize> {
        let session = self.session_mut()?;
        if session.cards.find(parent_id).is_none() {
            return Err(AlmanacError::UnknownCard(parent_id.to_string()));
        }

        let card = Card::extension(parent_id, label, index);
        let card_id = card.id().to_string();
        let position = session.cards.push(card);
        tracing::debug!(card_id = %card_id, index = position, "opened extension card");

        self.card_opened(position);
        self.ensure_generation(&card_id, build_extension_prompt(label));
        Ok(position)
    }

    /// Open anchor `number` (1-based) listed under the focused card.
    pub fn open_anchor(&mut self, number: usize) -> Result<usize> {
        let parent_id = self.session_ref()?.cards.focused_card().id().to_string();
        let anchors = self.anchors_for(&parent_id)?;
        let index = number.checked_sub(1).filter(|i| *i < anchors.len()).ok_or_else(|| {
            AlmanacError::UnknownAnchor {
                card_id: parent_id.clone(),
                index: number,
            }
        })?;
        self.open_extension(&parent_id, &anchors[index], index)
    }

    /// Follow-up topics under `card_id`, from its generated text.
    pub fn anchors_for(&self, card_id: &str) -> Result<Vec<String>> {
        let session = self.session_ref()?;
        Ok(session
            .cache
            .get(card_id)
            .and_then(|entry| entry.text)
            .map(|text| extract_anchors(&text))
            .unwrap_or_default())
    }

    /// Focus card `index`, clamped to the stack.
    pub fn focus(&mut self, index: usize) -> Result<usize> {
        let focused = self.session_mut()?.cards.focus(index);
        self.focus_changed();
        Ok(focused)
    }

    pub fn next(&mut self) -> Result<usize> {
        let focused = self.session_mut()?.cards.next();
        self.focus_changed();
        Ok(focused)
    }

    pub fn prev(&mut self) -> Result<usize> {
        let focused = self.session_mut()?.cards.prev();
        self.focus_changed();
        Ok(focused)
    }

    /// Exploring -> Cover. In-flight generations finish into the dropped
    /// session's cache and are never shown.
    pub fn back(&mut self) -> Result<()> {
        let session = self.session.take().ok_or(AlmanacError::NoSession)?;
        self.pending.retain(|handle| !handle.is_finished());
        tracing::info!(session_id = %session.id, in_flight = self.pending.len(), "session reset");
        self.emit(RuntimeEvent::SessionReset {
            session_id: session.id,
        });
        Ok(())
    }

    /// Regenerate the focused card if its last generation failed.
    ///
    /// Returns `false` when there was nothing to retry.
    pub fn retry_focused(&mut self) -> Result<bool> {
        let session = self.session_ref()?;
        let card = session.cards.focused_card().clone();
        let prompt = match &card {
            Card::Main { .. } => return Ok(false),
            Card::EventDetail { event, .. } => event.prompt.clone(),
            Card::Extension { title, .. } => build_extension_prompt(title),
        };

        if !session.cache.clear_failed(card.id()) {
            return Ok(false);
        }

        tracing::info!(card_id = %card.id(), "retrying failed generation");
        self.ensure_generation(card.id(), prompt);
        Ok(true)
    }

    /// Export blob for the active session.
    pub fn export(&self) -> Result<String> {
        Ok(export::format(self.session_ref()?, Local::now()))
    }

    /// Wait for every generation issued so far, including ones from
    /// discarded sessions.
    pub async fn wait_idle(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for result in join_all(pending).await {
            if let Err(e) = result {
                tracing::warn!("generation task failed to join: {}", e);
            }
        }
    }

    fn ensure_generation(&mut self, card_id: &str, prompt: String) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.cache.has_text(card_id) || session.cache.is_generating(card_id) {
            tracing::debug!(card_id = %card_id, "content already cached or in flight");
            return;
        }

        let session_id = session.id;
        let cache = session.cache.clone();
        cache.mark_generating(card_id);
        self.emit(RuntimeEvent::GenerationStarted {
            session_id,
            card_id: card_id.to_string(),
        });

        let client = self.client.clone();
        let runtime = self.runtime.clone();
        let card_id = card_id.to_string();
        let handle = tokio::spawn(async move {
            let text = cache.request_generate(&card_id, &prompt, client.as_ref()).await;
            let failed = cache.get(&card_id).is_some_and(|entry| entry.failed);
            if let Err(e) = runtime.emit(RuntimeEvent::GenerationCompleted {
                session_id,
                card_id,
                text,
                failed,
            }) {
                tracing::debug!("dropping generation result: {}", e);
            }
        });

        self.pending.retain(|handle| !handle.is_finished());
        self.pending.push(handle);
    }

    fn card_opened(&self, index: usize) {
        if let Some(session) = &self.session {
            if let Some(card) = session.cards.get(index) {
                let content = session.cache.get(card.id()).and_then(|entry| entry.text);
                self.emit(RuntimeEvent::CardOpened {
                    session_id: session.id,
                    index,
                    total: session.cards.len(),
                    card: card.clone(),
                    content,
                });
            }
        }
    }

    fn focus_changed(&self) {
        if let Some(session) = &self.session {
            let card = session.cards.focused_card();
            let content = session.cache.get(card.id()).and_then(|entry| entry.text);
            self.emit(RuntimeEvent::FocusChanged {
                session_id: session.id,
                index: session.cards.focused_index(),
                total: session.cards.len(),
                card: card.clone(),
                content,
            });
        }
    }

    fn emit(&self, event: RuntimeEvent) {
        if let Err(e) = self.runtime.emit(event) {
            tracing::debug!("runtime emit failed: {}", e);
        }
    }
}
