//! Session-scoped memo of generated card content.
//!
//! Each card id moves through `absent -> generating -> text` once. Concurrent
//! requests for the same id share one call to the generative service and
//! observe the same result. Successful generations are appended to the
//! export log exactly once.
//!
//! A failed generation stores an apology text in place of the narrative, so
//! revisiting the card does not retry on its own. [`ContentCache::clear_failed`]
//! is the explicit way back to `absent`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::OnceCell;

use super::generative::GenerativeClient;
use crate::error::AlmanacError;

/// Snapshot of one cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentEntry {
    pub text: Option<String>,
    pub is_generating: bool,
    /// `text` holds the apology for a failed generation
    pub failed: bool,
}

/// One successful generation, in completion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedEntry {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone)]
struct Outcome {
    text: String,
    failed: bool,
}

#[derive(Debug, Default)]
struct Slot {
    started: AtomicBool,
    outcome: OnceCell<Outcome>,
}

impl Slot {
    fn entry(&self) -> ContentEntry {
        match self.outcome.get() {
            Some(outcome) => ContentEntry {
                text: Some(outcome.text.clone()),
                is_generating: false,
                failed: outcome.failed,
            },
            None => ContentEntry {
                text: None,
                is_generating: self.started.load(Ordering::SeqCst),
                failed: false,
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct ContentCache {
    slots: Mutex<HashMap<String, Arc<Slot>>>,
    log: Mutex<Vec<GeneratedEntry>>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `id`, or `None` if nothing was ever requested.
    pub fn get(&self, id: &str) -> Option<ContentEntry> {
        self.slots.lock().get(id).map(|slot| slot.entry())
    }

    /// Whether `id` holds text (success or apology).
    pub fn has_text(&self, id: &str) -> bool {
        self.get(id).is_some_and(|entry| entry.text.is_some())
    }

    pub fn is_generating(&self, id: &str) -> bool {
        self.get(id).is_some_and(|entry| entry.is_generating)
    }

    /// Mark `id` as in flight before its generation task first runs.
    ///
    /// No effect if the slot already holds text.
    pub fn mark_generating(&self, id: &str) {
        let slot = self.slot(id);
        if slot.outcome.get().is_none() {
            slot.started.store(true, Ordering::SeqCst);
        }
    }

    /// Return the text for `id`, generating it with `client` on a miss.
    ///
    /// Never fails: a generation error is turned into the apology text,
    /// which is cached but not logged for export.
    pub async fn request_generate(
        &self,
        id: &str,
        prompt: &str,
        client: &dyn GenerativeClient,
    ) -> String {
        let slot = self.slot(id);

        if let Some(outcome) = slot.outcome.get() {
            tracing::debug!(card_id = %id, "content cache hit");
            return outcome.text.clone();
        }

        let outcome = slot
            .outcome
            .get_or_init(|| async {
                slot.started.store(true, Ordering::SeqCst);
                tracing::debug!(card_id = %id, client = client.name(), "generating content");

                match client.complete(prompt).await {
                    Ok(text) => {
                        self.log.lock().push(GeneratedEntry {
                            id: id.to_string(),
                            text: text.clone(),
                        });
                        tracing::info!(card_id = %id, chars = text.chars().count(), "content generated");
                        Outcome { text, failed: false }
                    }
                    Err(e) => {
                        tracing::warn!(card_id = %id, "content generation failed: {}", e);
                        Outcome {
                            text: apology_text(&e),
                            failed: true,
                        }
                    }
                }
            })
            .await;

        outcome.text.clone()
    }

    /// Drop a failed entry so the next request generates again.
    ///
    /// Returns `false` (and changes nothing) unless `id` holds an apology.
    pub fn clear_failed(&self, id: &str) -> bool {
        let mut slots = self.slots.lock();
        let failed = slots
            .get(id)
            .and_then(|slot| slot.outcome.get())
            .is_some_and(|outcome| outcome.failed);
        if failed {
            slots.remove(id);
            tracing::debug!(card_id = %id, "cleared failed content");
        }
        failed
    }

    /// Successful generations in completion order.
    pub fn generated_log(&self) -> Vec<GeneratedEntry> {
        self.log.lock().clone()
    }

    pub fn generated_count(&self) -> usize {
        self.log.lock().len()
    }

    fn slot(&self, id: &str) -> Arc<Slot> {
        self.slots
            .lock()
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Slot::default()))
            .clone()
    }
}

/// User-facing narrative shown in place of a failed generation.
pub fn apology_text(error: &AlmanacError) -> String {
    format!(
        "Oh no... the pages of history got stuck together this time.\n\n{}\n\nPlease try again in a little while.",
        error
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::test_support::ScriptedClient;

    #[tokio::test]
    async fn miss_then_hit() {
        let cache = ContentCache::new();
        let client = ScriptedClient::new(|prompt| Ok(format!("story for {prompt}")));

        assert!(cache.get("event1").is_none());
        let first = cache.request_generate("event1", "p1", &client).await;
        let second = cache.request_generate("event1", "other prompt", &client).await;

        assert_eq!(first, "story for p1");
        assert_eq!(second, first);
        assert_eq!(client.calls(), 1);
        assert_eq!(
            cache.get("event1"),
            Some(ContentEntry {
                text: Some("story for p1".to_string()),
                is_generating: false,
                failed: false,
            })
        );
        assert_eq!(cache.generated_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_call() {
        let cache = ContentCache::new();
        let (client, gate) = ScriptedClient::gated(|_| Ok("shared".to_string()));

        let release = async {
            tokio::task::yield_now().await;
            assert!(cache.is_generating("event2"));
            gate.add_permits(1);
        };

        let (a, b, ()) = tokio::join!(
            cache.request_generate("event2", "p", &client),
            cache.request_generate("event2", "p", &client),
            release,
        );

        assert_eq!(a, "shared");
        assert_eq!(b, "shared");
        assert_eq!(client.calls(), 1);
        assert_eq!(cache.generated_log().len(), 1);
        assert!(!cache.is_generating("event2"));
    }

    #[tokio::test]
    async fn distinct_ids_generate_independently() {
        let cache = ContentCache::new();
        let client = ScriptedClient::new(|prompt| Ok(prompt.to_uppercase()));

        cache.request_generate("a", "one", &client).await;
        cache.request_generate("b", "two", &client).await;

        let log = cache.generated_log();
        assert_eq!(client.calls(), 2);
        assert_eq!(log[0], GeneratedEntry { id: "a".into(), text: "ONE".into() });
        assert_eq!(log[1], GeneratedEntry { id: "b".into(), text: "TWO".into() });
    }

    #[tokio::test]
    async fn failure_caches_apology_without_logging() {
        let cache = ContentCache::new();
        let client = ScriptedClient::new(|_| {
            Err(AlmanacError::RequestFailed {
                status: 503,
                message: "overloaded".to_string(),
            })
        });

        let text = cache.request_generate("event1", "p", &client).await;
        assert!(text.contains("503"));
        assert!(text.contains("try again"));

        let again = cache.request_generate("event1", "p", &client).await;
        assert_eq!(again, text);
        assert_eq!(client.calls(), 1);
        assert_eq!(cache.generated_count(), 0);
        assert!(cache.get("event1").unwrap().failed);
    }

    #[tokio::test]
    async fn clear_failed_allows_regeneration() {
        let cache = ContentCache::new();
        let failing = ScriptedClient::new(|_| Err(AlmanacError::Network("down".into())));
        cache.request_generate("event1", "p", &failing).await;

        assert!(cache.clear_failed("event1"));
        assert!(cache.get("event1").is_none());

        let working = ScriptedClient::new(|_| Ok("back online".to_string()));
        let text = cache.request_generate("event1", "p", &working).await;
        assert_eq!(text, "back online");
        assert_eq!(cache.generated_count(), 1);
    }

    #[test]
    fn mark_generating_is_visible_immediately() {
        let cache = ContentCache::new();
        cache.mark_generating("event2");
        assert_eq!(
            cache.get("event2"),
            Some(ContentEntry {
                text: None,
                is_generating: true,
                failed: false,
            })
        );
    }

    #[tokio::test]
    async fn clear_failed_keeps_successes() {
        let cache = ContentCache::new();
        let client = ScriptedClient::new(|_| Ok("fine".to_string()));
        cache.request_generate("event1", "p", &client).await;

        assert!(!cache.clear_failed("event1"));
        assert!(!cache.clear_failed("missing"));
        assert!(cache.has_text("event1"));
    }
}
