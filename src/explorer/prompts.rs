//! Prompt templates sent to the generative service.
//!
//! The list prompt asks for strict JSON that [`super::events::decode`]
//! can read. Both narrative prompts end with the same three-marker footer
//! that [`super::anchors::extract_anchors`] relies on, so the footer text
//! lives in one place.

use super::date::ExploreDate;

/// Number of events requested per date.
pub const EVENTS_PER_DATE: usize = 5;

/// Marker for the "concept" exploration anchor.
pub const CONCEPT_MARKER: &str = "💭";
/// Marker for the "cross-domain" exploration anchor.
pub const CROSS_DOMAIN_MARKER: &str = "🔗";
/// Marker for the "practical application" exploration anchor.
pub const APPLICATION_MARKER: &str = "✨";

/// All anchor markers, in footer order.
pub const ANCHOR_MARKERS: [&str; 3] = [CONCEPT_MARKER, CROSS_DOMAIN_MARKER, APPLICATION_MARKER];

/// Prompt for the five events of a calendar day.
pub fn build_event_list_prompt(date: &ExploreDate) -> String {
    let day = date.display_name();
    format!(
        r#"List {count} important historical events that happened on {day} (any year).

Requirements:
1. Every event must really have happened on {day}, in any year
2. Cover different themes: science, politics, culture, nature, society
3. Pick events that are representative in significance and influence
4. Return JSON in exactly this shape:

[
  {{
    "year": <year as a number>,
    "title": "<short event title>",
    "emoji": "<one fitting emoji>",
    "category": "<category, one or two words>",
    "description": "<one-sentence summary>"
  }}
]

Notes:
- Return exactly {count} events
- Sort by year, earliest first
- The emoji must be a single glyph
- Return only the JSON array, with no other text
- Only real historical events"#,
        count = EVENTS_PER_DATE,
        day = day,
    )
}

/// Prompt for the narrative of one event.
pub fn build_event_detail_prompt(year: i32, title: &str, date: &ExploreDate) -> String {
    let subject = format!("the event \"{}\" on {}, {}", title, date.display_name(), year);
    narrative_prompt(
        &subject,
        "Cover the background, what happened, and the impact",
    )
}

/// Prompt for the narrative of a follow-up topic.
pub fn build_extension_prompt(topic_label: &str) -> String {
    let subject = format!("\"{}\"", topic_label.trim());
    narrative_prompt(
        &subject,
        "Explain the concept or piece of knowledge from the ground up",
    )
}

fn narrative_prompt(subject: &str, focus: &str) -> String {
    format!(
        r#"As a playful, curious history storyteller, tell the story of {subject}.

Requirements:
1. Keep a lively, warm tone
2. Use vivid metaphors and concrete imagery
3. {focus}
4. Keep it between 300 and 400 words
5. Finish with three follow-up directions, formatted exactly like this:
{footer}
Start the story directly, without any title or preamble."#,
        subject = subject,
        focus = focus,
        footer = anchor_footer(),
    )
}

/// The fixed footer describing the three anchor lines.
fn anchor_footer() -> String {
    format!(
        "Exploration anchors:\n{} [specific concept] - [why it is intriguing]\n{} [cross-domain link] - [why it is interesting]\n{} [practical application] - [real-world relevance]",
        CONCEPT_MARKER, CROSS_DOMAIN_MARKER, APPLICATION_MARKER
    )
}
