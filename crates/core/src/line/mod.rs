use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest minute value a two-digit tag can hold.
const MAX_TAG_MINUTES: u64 = 99;

/// One timed utterance of a transcript.
///
/// The text is trimmed on construction, so a `Line` never carries leading or
/// trailing whitespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    timestamp: f64,
    text: String,
}

impl Line {
    pub fn new(timestamp: f64, text: impl AsRef<str>) -> Self {
        Self {
            timestamp,
            text: text.as_ref().trim().to_string(),
        }
    }

    /// Seconds from the start of playback at which the line becomes active.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Timestamp rounded to whole hundredths of a second.
    pub fn centiseconds(&self) -> u64 {
        (self.timestamp.max(0.0) * 100.0).round() as u64
    }

    /// Renders the line back into the `[MM:SS.HH]text` transcript form.
    ///
    /// Minutes saturate at 99 with the remainder left in the seconds field,
    /// so every timestamp the parser accepts renders as a parseable tag.
    pub fn to_lrc(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.centiseconds();
        let minutes = (total / 6_000).min(MAX_TAG_MINUTES);
        let seconds = total / 100 - minutes * 60;
        let hundredths = total % 100;
        write!(
            f,
            "[{minutes:02}:{seconds:02}.{hundredths:02}]{}",
            self.text
        )
    }
}
