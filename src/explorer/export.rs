//! Plain-text export of everything generated in a session.

use chrono::{DateTime, Local};

use super::session::SessionState;

const HEADER_RULE_WIDTH: usize = 50;
const BLOCK_RULE_WIDTH: usize = 50;

/// Render the session's generated log as one copyable text blob.
///
/// Blocks follow the log's insertion order. A block whose id is one of the
/// session's events is labelled with its category and title; anything else
/// is labelled as an extension with its 1-based position in the log.
pub fn format(session: &SessionState, generated_at: DateTime<Local>) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "✨ History explorer log - {} ✨\n",
        session.selected_date.display_name()
    ));
    out.push_str(&format!(
        "Generated at: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&"=".repeat(HEADER_RULE_WIDTH));
    out.push_str("\n\n");

    for (position, entry) in session.generated_log().iter().enumerate() {
        match session.find_event(&entry.id) {
            Some(event) => {
                out.push_str(&format!("[{}] {}\n\n", event.category, event.display_title()));
            }
            None => {
                out.push_str(&format!("[Extension #{}]\n\n", position + 1));
            }
        }
        out.push_str(&entry.text);
        out.push_str("\n\n");
        out.push_str(&"-".repeat(BLOCK_RULE_WIDTH));
        out.push_str("\n\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::date::ExploreDate;
    use crate::explorer::events::{decode, tests::sample_list_json};
    use crate::explorer::test_support::ScriptedClient;
    use chrono::TimeZone;

    fn session() -> SessionState {
        let date = ExploreDate::new(7, 20).unwrap();
        SessionState::new(date, decode(&sample_list_json(), &date).unwrap())
    }

    fn timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 7, 20, 20, 17, 40).unwrap()
    }

    #[test]
    fn empty_session_has_only_header() {
        let text = format(&session(), timestamp());
        assert_eq!(
            text,
            format!(
                "✨ History explorer log - July 20 ✨\nGenerated at: 2024-07-20 20:17:40\n{}\n\n",
                "=".repeat(50)
            )
        );
    }

    #[tokio::test]
    async fn blocks_follow_generation_order_with_labels() {
        let session = session();
        let client = ScriptedClient::new(|prompt| Ok(format!("text:{}", prompt)));

        session.cache.request_generate("event4", "moon", &client).await;
        session.cache.request_generate("event4_ext1", "velcro", &client).await;
        session.cache.request_generate("event1", "alexander", &client).await;

        let text = format(&session, timestamp());

        let moon = text.find("[Science] 1969 - Apollo 11 lands on the Moon\n\ntext:moon").unwrap();
        let ext = text.find("[Extension #2]\n\ntext:velcro").unwrap();
        let alex = text.find("[Politics] 356 - Birth of Alexander the Great\n\ntext:alexander").unwrap();
        assert!(moon < ext && ext < alex);
        assert_eq!(text.matches(&"-".repeat(50)).count(), 3);
    }

    #[tokio::test]
    async fn failed_generations_are_not_exported() {
        let session = session();
        let client = ScriptedClient::new(|_| Err(crate::error::AlmanacError::Network("x".into())));
        session.cache.request_generate("event2", "p", &client).await;

        let text = format(&session, timestamp());
        assert!(!text.contains("[Politics]"));
        assert!(!text.contains(&"-".repeat(50)));
    }
}
