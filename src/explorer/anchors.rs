//! Extraction of exploration anchors from generated narrative text.

use super::prompts::ANCHOR_MARKERS;

/// Maximum anchors offered under one card.
pub const MAX_ANCHORS: usize = 3;

/// Lines that start with one of the anchor markers, trimmed, in order of
/// appearance, at most [`MAX_ANCHORS`].
pub fn extract_anchors(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| ANCHOR_MARKERS.iter().any(|marker| line.starts_with(marker)))
        .take(MAX_ANCHORS)
        .map(str::to_string)
        .collect()
}
