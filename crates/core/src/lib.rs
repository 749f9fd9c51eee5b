//! Core library for synchronising timed transcripts with audio playback.
//!
//! A transcript of `[MM:SS.HH]text` lines is parsed once into an immutable,
//! timestamp-sorted [`Timeline`]. A playback clock then polls the timeline to
//! learn which line is being spoken and which one comes next. Each module owns
//! one piece of that flow (line model, parser, queries, shared slot, config).

pub mod config;
pub mod error;
pub mod line;
pub mod parser;
pub mod shared;
pub mod timeline;

pub use config::{AppConfig, ParserConfig, PlaybackConfig};
pub use error::{LyricsError, Result};
pub use line::Line;
pub use parser::{
    parse, parse_line, parse_strict, parse_with_mode, parse_with_report, ParseMode, ParseReport,
    SkippedLine,
};
pub use shared::SharedTimeline;
pub use timeline::{PlaybackClock, Position, Timeline, TimelineCursor};
