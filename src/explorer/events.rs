//! Historical events and decoding of the list-generation response.

use serde::{Deserialize, Serialize};

use super::date::ExploreDate;
use super::prompts::{build_event_detail_prompt, EVENTS_PER_DATE};
use crate::error::{AlmanacError, Result};

/// One generated historical event. Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// `event1` .. `event5`, in the order the service returned them
    pub id: String,
    pub title: String,
    pub emoji: String,
    pub category: String,
    pub description: String,
    pub year: i32,
    /// Pre-built narrative prompt for this event
    pub prompt: String,
}

impl Event {
    /// Title as shown on cards, e.g. `1969 - Apollo 11 lands on the Moon`.
    pub fn display_title(&self) -> String {
        format!("{} - {}", self.year, self.title)
    }
}

/// Wire shape of one list entry.
#[derive(Debug, Deserialize)]
struct RawEvent {
    year: i32,
    title: String,
    #[serde(default)]
    emoji: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    description: String,
}

/// Decode the raw list-generation text into exactly [`EVENTS_PER_DATE`] events.
///
/// Fenced-code markers are stripped first. Order is preserved as received.
pub fn decode(raw_text: &str, date: &ExploreDate) -> Result<Vec<Event>> {
    let cleaned = strip_code_fences(raw_text);

    let raw: Vec<RawEvent> = serde_json::from_str(&cleaned)
        .map_err(|e| AlmanacError::Parse(format!("event list is not a valid JSON array: {}", e)))?;

    if raw.len() != EVENTS_PER_DATE {
        return Err(AlmanacError::Parse(format!(
            "expected {} events, got {}",
            EVENTS_PER_DATE,
            raw.len()
        )));
    }

    if let Some(pos) = raw.iter().position(|e| e.title.trim().is_empty()) {
        return Err(AlmanacError::Parse(format!("event {} has an empty title", pos + 1)));
    }

    let events = raw
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let prompt = build_event_detail_prompt(entry.year, &entry.title, date);
            Event {
                id: format!("event{}", index + 1),
                title: entry.title,
                emoji: entry.emoji,
                category: entry.category,
                description: entry.description,
                year: entry.year,
                prompt,
            }
        })
        .collect();

    Ok(events)
}

/// Remove ```` ```json ```` / ```` ``` ```` markers and surrounding whitespace.
fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json\n", "")
        .replace("```json", "")
        .replace("```\n", "")
        .replace("```", "")
        .trim()
        .to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A well-formed five-event response for July 20.
    pub(crate) fn sample_list_json() -> String {
        serde_json::json!([
            {"year": 356, "title": "Birth of Alexander the Great", "emoji": "👑", "category": "Politics", "description": "A future conqueror is born in Pella."},
            {"year": 1810, "title": "Colombian independence declared", "emoji": "🇨🇴", "category": "Politics", "description": "Bogotá declares independence from Spain."},
            {"year": 1960, "title": "Sirimavo Bandaranaike elected", "emoji": "🗳️", "category": "Society", "description": "The world's first female prime minister."},
            {"year": 1969, "title": "Apollo 11 lands on the Moon", "emoji": "🚀", "category": "Science", "description": "Humans walk on the Moon for the first time."},
            {"year": 1976, "title": "Viking 1 lands on Mars", "emoji": "🔴", "category": "Science", "description": "First successful Mars landing by a US probe."}
        ])
        .to_string()
    }

    fn july_20() -> ExploreDate {
        ExploreDate::new(7, 20).unwrap()
    }

    #[test]
    fn decodes_plain_array_in_order() {
        let events = decode(&sample_list_json(), &july_20()).unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["event1", "event2", "event3", "event4", "event5"]);
        assert_eq!(events[3].title, "Apollo 11 lands on the Moon");
        assert_eq!(events[3].year, 1969);
        assert_eq!(events[3].display_title(), "1969 - Apollo 11 lands on the Moon");
    }

    #[test]
    fn attaches_detail_prompt() {
        let events = decode(&sample_list_json(), &july_20()).unwrap();
        assert_eq!(
            events[3].prompt,
            build_event_detail_prompt(1969, "Apollo 11 lands on the Moon", &july_20())
        );
    }

    #[test]
    fn strips_fenced_code_markers() {
        let fenced = format!("```json\n{}\n```", sample_list_json());
        assert_eq!(decode(&fenced, &july_20()).unwrap().len(), 5);

        let bare_fence = format!("```\n{}```  ", sample_list_json());
        assert_eq!(decode(&bare_fence, &july_20()).unwrap().len(), 5);
    }

    #[test]
    fn does_not_resort_by_year() {
        let mut value: serde_json::Value = serde_json::from_str(&sample_list_json()).unwrap();
        value.as_array_mut().unwrap().reverse();
        let events = decode(&value.to_string(), &july_20()).unwrap();
        assert_eq!(events[0].year, 1976);
        assert_eq!(events[0].id, "event1");
    }

    #[test]
    fn wrong_count_is_parse_error() {
        let mut value: serde_json::Value = serde_json::from_str(&sample_list_json()).unwrap();
        value.as_array_mut().unwrap().pop();
        let err = decode(&value.to_string(), &july_20()).unwrap_err();
        assert!(matches!(err, AlmanacError::Parse(ref m) if m.contains("got 4")));

        let mut six: serde_json::Value = serde_json::from_str(&sample_list_json()).unwrap();
        let extra = six[0].clone();
        six.as_array_mut().unwrap().push(extra);
        assert!(matches!(
            decode(&six.to_string(), &july_20()),
            Err(AlmanacError::Parse(_))
        ));

        assert!(matches!(decode("[]", &july_20()), Err(AlmanacError::Parse(_))));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        for raw in ["", "not json", "{\"year\": 1}", "[{\"title\": \"no year\"}]"] {
            assert!(
                matches!(decode(raw, &july_20()), Err(AlmanacError::Parse(_))),
                "{raw:?} should fail"
            );
        }
    }

    #[test]
    fn blank_title_is_parse_error() {
        let mut value: serde_json::Value = serde_json::from_str(&sample_list_json()).unwrap();
        value[2]["title"] = serde_json::json!("  ");
        assert!(matches!(
            decode(&value.to_string(), &july_20()),
            Err(AlmanacError::Parse(_))
        ));
    }
}
