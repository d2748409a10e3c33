//! CLI output handling - Event receiver loop and card rendering.
//!
//! Events from the navigation controller arrive through the runtime channel
//! and are rendered based on output mode (terminal, JSON, or quiet). Card
//! text goes to stdout; progress and errors go to stderr.

use std::io::{self, Write};

use anyhow::Result;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::explorer::cards::extension_id;
use crate::explorer::{extract_anchors, Card, Event, SessionState, MAIN_CARD_ID};
use crate::runtime::RuntimeEvent;

/// Shown on the cover and for `/help`.
pub const INSTRUCTIONS: &str = "\
On the cover:
  today            explore today's date
  random           explore a random date
  date MM-DD       explore a specific date, e.g. date 07-20
While exploring:
  open N           open event N of the list
  ext N            follow exploration anchor N of the focused card
  focus N | next | prev | main
                   move between cards (main is the event list)
  show             print the focused card again
  cards            list open cards
  export [PATH]    write everything generated so far to PATH or the screen
  retry            regenerate the focused card after a failure
  back             return to the cover
Anytime:
  dismiss          stop showing this guide on the cover
  /config [get KEY | set KEY VALUE | reload]
                   inspect or edit ~/.almanac/settings.toml
  /help            show this text
  /quit            exit";

const BANNER: &str = "📜 almanac - what happened on this day?";

/// Run the event loop until every sender is dropped.
///
/// Generation events from a discarded session are dropped. A story that
/// finishes for a card other than the focused one is announced in one line;
/// its text shows when that card is focused or `show`n.
pub async fn run_event_loop(
    mut event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
    json_mode: bool,
    quiet_mode: bool,
) -> Result<()> {
    let mut presenter = Presenter::default();

    while let Some(event) = event_rx.recv().await {
        let placement = presenter.place(&event);
        if placement == Placement::Stale {
            tracing::debug!("dropping event from a discarded session");
            continue;
        }

        if json_mode {
            println!("{}", serde_json::to_string(&event)?);
            io::stdout().flush()?;
        } else {
            let rendered = render_event(&event, placement, quiet_mode);
            let mut stdout = io::stdout();
            for line in &rendered.stdout {
                writeln!(stdout, "{}", line)?;
            }
            stdout.flush()?;
            for line in &rendered.stderr {
                eprintln!("{}", line);
            }
        }
    }

    Ok(())
}

/// How an event relates to what is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Belongs to a session that is no longer live
    Stale,
    /// Live session, but about a card that is not focused
    Background,
    Foreground,
}

/// Tracks the live session and its focused card as events stream past.
#[derive(Debug, Default)]
struct Presenter {
    live_session: Option<Uuid>,
    focused_card: Option<String>,
}

impl Presenter {
    fn place(&mut self, event: &RuntimeEvent) -> Placement {
        match event {
            RuntimeEvent::EventsRequested { .. } | RuntimeEvent::EventsFailed { .. } => {
                Placement::Foreground
            }
            RuntimeEvent::SessionStarted { session_id, .. } => {
                self.live_session = Some(*session_id);
                self.focused_card = Some(MAIN_CARD_ID.to_string());
                Placement::Foreground
            }
            RuntimeEvent::SessionReset { session_id } => {
                if !self.is_live(session_id) {
                    return Placement::Stale;
                }
                self.live_session = None;
                self.focused_card = None;
                Placement::Foreground
            }
            RuntimeEvent::CardOpened {
                session_id, card, ..
            }
            | RuntimeEvent::FocusChanged {
                session_id, card, ..
            } => {
                if !self.is_live(session_id) {
                    return Placement::Stale;
                }
                self.focused_card = Some(card.id().to_string());
                Placement::Foreground
            }
            RuntimeEvent::GenerationStarted {
                session_id,
                card_id,
            }
            | RuntimeEvent::GenerationCompleted {
                session_id,
                card_id,
                ..
            } => {
                if !self.is_live(session_id) {
                    Placement::Stale
                } else if self.focused_card.as_deref() == Some(card_id.as_str()) {
                    Placement::Foreground
                } else {
                    Placement::Background
                }
            }
        }
    }

    fn is_live(&self, session_id: &Uuid) -> bool {
        self.live_session.as_ref() == Some(session_id)
    }
}

/// Terminal lines for one event.
#[derive(Debug, Default)]
struct Rendered {
    stdout: Vec<String>,
    stderr: Vec<String>,
}

fn render_event(event: &RuntimeEvent, placement: Placement, quiet_mode: bool) -> Rendered {
    let mut out = Rendered::default();
    if placement == Placement::Stale {
        return out;
    }

    match event {
        RuntimeEvent::EventsRequested { date } => {
            if !quiet_mode {
                out.stderr
                    .push(format!("⏳ Looking up {} in the history books...", date));
            }
        }
        RuntimeEvent::EventsFailed { date, message } => {
            out.stderr
                .push(format!("Could not load events for {}: {}", date, message));
        }
        RuntimeEvent::SessionStarted { date, events, .. } => {
            out.stdout.push(format_event_list(date, events, |_| false));
        }
        RuntimeEvent::CardOpened {
            index,
            total,
            card,
            content,
            ..
        } => {
            if !quiet_mode {
                out.stdout.push(format_card_header(*index, *total, card));
            }
            if let Some(text) = content {
                out.stdout.push(format_story(text));
            }
        }
        RuntimeEvent::FocusChanged {
            index,
            total,
            card,
            content,
            ..
        } => {
            if !quiet_mode {
                out.stdout.push(format_card_header(*index, *total, card));
            }
            match (card, content) {
                (Card::Main { events, .. }, _) => {
                    out.stdout.push(format_event_items(events, |_| false));
                }
                (_, Some(text)) => out.stdout.push(format_story(text)),
                (_, None) => {
                    if !quiet_mode {
                        out.stderr.push("⏳ Still writing...".to_string());
                    }
                }
            }
        }
        RuntimeEvent::GenerationStarted { card_id, .. } => {
            if !quiet_mode && placement == Placement::Foreground {
                out.stderr
                    .push(format!("⏳ Writing the story for {}...", card_id));
            }
        }
        RuntimeEvent::GenerationCompleted {
            card_id,
            text,
            failed,
            ..
        } => {
            let status = if *failed { "failed" } else { "ready" };
            if placement == Placement::Background {
                if !quiet_mode {
                    out.stderr.push(format!(
                        "✓ {} is {}; focus it or use `show` to read it",
                        card_id, status
                    ));
                }
            } else {
                if !quiet_mode {
                    out.stdout.push(format!("\n── {} ({}) ──", card_id, status));
                }
                out.stdout.push(format_story(text));
            }
        }
        RuntimeEvent::SessionReset { .. } => {
            if !quiet_mode {
                out.stderr.push("Back on the cover.".to_string());
            }
        }
    }

    out
}

/// Startup text for the cover.
pub fn format_cover(show_instructions: bool, hide_banner: bool) -> String {
    let mut out = String::new();
    if !hide_banner {
        out.push_str(BANNER);
        out.push('\n');
    }
    if show_instructions {
        out.push('\n');
        out.push_str(INSTRUCTIONS);
        out.push('\n');
    }
    out
}

/// The main card: numbered events, with a badge on those already generated.
pub fn format_event_list(date: &str, events: &[Event], generated: impl Fn(&str) -> bool) -> String {
    format!(
        "Historical events on {}\n{}",
        date,
        format_event_items(events, generated)
    )
}

fn format_event_items(events: &[Event], generated: impl Fn(&str) -> bool) -> String {
    let mut out = String::new();
    for (i, event) in events.iter().enumerate() {
        let badge = if generated(&event.id) { "  ✓ generated" } else { "" };
        out.push_str(&format!(
            "\n{}. {} {}  [{}]{}\n",
            i + 1,
            event.emoji,
            event.display_title(),
            event.category,
            badge
        ));
        if !event.description.is_empty() {
            out.push_str(&format!("   {}\n", event.description));
        }
    }
    out
}

/// Position indicator and title of a card.
pub fn format_card_header(index: usize, total: usize, card: &Card) -> String {
    let title = match card {
        Card::EventDetail { emoji, title, .. } if !emoji.is_empty() => format!("{} {}", emoji, title),
        _ => card.title().to_string(),
    };
    format!("\n[card {} / {}] {}", index + 1, total, title)
}

/// Narrative text followed by its numbered exploration anchors.
pub fn format_story(text: &str) -> String {
    format_story_with_badges(text, |_| false)
}

/// [`format_story`], marking anchors whose extension already has content.
/// `generated` receives the 0-based anchor index.
pub fn format_story_with_badges(text: &str, generated: impl Fn(usize) -> bool) -> String {
    let anchors = extract_anchors(text);
    let mut out = text.trim_end().to_string();
    if !anchors.is_empty() {
        out.push_str("\n\nFollow up with `ext N`:");
        for (i, anchor) in anchors.iter().enumerate() {
            let badge = if generated(i) { "  ✓ generated" } else { "" };
            out.push_str(&format!("\n  {}. {}{}", i + 1, anchor, badge));
        }
    }
    out
}

/// Focused card of `session`, as printed by `show`.
pub fn format_focused(session: &SessionState) -> String {
    let index = session.focused_index();
    let card = session.cards.focused_card();

    if let Card::Main { events, .. } = card {
        let date = session.selected_date.display_name();
        return format!(
            "[card {} / {}] {}",
            index + 1,
            session.cards.len(),
            format_event_list(&date, events, |id| session.cache.has_text(id))
        );
    }

    let mut out = format_card_header(index, session.cards.len(), card);
    out.push_str("\n\n");
    match session.cache.get(card.id()) {
        Some(entry) => match entry.text {
            Some(text) => out.push_str(&format_story_with_badges(&text, |i| {
                session.cache.has_text(&extension_id(card.id(), i))
            })),
            None if entry.is_generating => out.push_str("⏳ Still writing..."),
            None => out.push_str("(no content yet)"),
        },
        None => out.push_str("(no content yet)"),
    }
    out
}

/// One line per open card, marking the focused one.
pub fn format_card_list(session: &SessionState) -> String {
    session
        .cards
        .iter()
        .enumerate()
        .map(|(i, card)| {
            let marker = if i == session.focused_index() { ">" } else { " " };
            let state = if !card.has_generated_content() {
                ""
            } else if session.cache.has_text(card.id()) {
                "  ✓"
            } else if session.cache.is_generating(card.id()) {
                "  ⏳"
            } else {
                ""
            };
            format!("{} {}. {}{}", marker, i + 1, card.title(), state)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
