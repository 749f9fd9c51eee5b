//! Transcript parser.
//!
//! A transcript is newline-delimited text where each useful physical line
//! starts with a `[MM:SS.HH]` tag followed by the spoken text. Anything else is
//! skipped. `\n`, `\r\n` and a lone `\r` all terminate a physical line.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Line, LyricsError, Result, Timeline};

/// How the parser treats physical lines that do not carry a timestamp tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Drop malformed lines and keep going.
    #[default]
    Lenient,
    /// Reject the whole transcript at the first malformed line.
    Strict,
}

/// A non-blank physical line that did not match the timestamp grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    /// 1-based physical line number in the source text.
    pub line_number: usize,
    /// The line after trimming surrounding whitespace.
    pub content: String,
}

/// Outcome of a lenient parse together with what was dropped along the way.
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    pub timeline: Timeline,
    pub skipped: Vec<SkippedLine>,
}

impl ParseReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Returns `true` when every non-blank line produced a timeline entry.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Fails with the first skipped line, if any.
    pub fn ensure_clean(&self) -> Result<()> {
        match self.skipped.first() {
            Some(first) => Err(LyricsError::MalformedLine {
                line_number: first.line_number,
                content: first.content.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Parses a transcript into a timeline, silently dropping malformed lines.
pub fn parse(text: &str) -> Timeline {
    parse_with_report(text).timeline
}

/// Parses a transcript and records every skipped non-blank line.
pub fn parse_with_report(text: &str) -> ParseReport {
    let mut lines = Vec::new();
    let mut skipped = Vec::new();

    for (index, raw) in physical_lines(text).enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_line(trimmed) {
            Some(line) => lines.push(line),
            None => {
                tracing::trace!(line_number = index + 1, content = trimmed, "skipping untimed line");
                skipped.push(SkippedLine {
                    line_number: index + 1,
                    content: trimmed.to_string(),
                });
            }
        }
    }

    let timeline = Timeline::from_unsorted(lines);
    tracing::debug!(
        parsed = timeline.len(),
        skipped = skipped.len(),
        "parsed transcript"
    );

    ParseReport { timeline, skipped }
}

/// Parses a transcript, failing on the first non-blank line without a tag.
pub fn parse_strict(text: &str) -> Result<Timeline> {
    let report = parse_with_report(text);
    report.ensure_clean()?;
    Ok(report.timeline)
}

/// Parses a transcript using the requested [`ParseMode`].
pub fn parse_with_mode(text: &str, mode: ParseMode) -> Result<Timeline> {
    match mode {
        ParseMode::Lenient => Ok(parse(text)),
        ParseMode::Strict => parse_strict(text),
    }
}

/// Parses one already-trimmed physical line.
///
/// Only the leading tag is interpreted; later bracketed content stays part of
/// the text.
pub fn parse_line(line: &str) -> Option<Line> {
    let captures = line_pattern().captures(line)?;

    let minutes: u32 = captures[1].parse().ok()?;
    let seconds: u32 = captures[2].parse().ok()?;
    let hundredths: u32 = captures[3].parse().ok()?;
    let text = captures[4].trim();
    if text.is_empty() {
        return None;
    }

    let timestamp = f64::from(minutes * 60 + seconds) + f64::from(hundredths) / 100.0;
    Some(Line::new(timestamp, text))
}

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\[([0-9]{1,2}):([0-9]{2})\.([0-9]{2})\](.+)$")
            .expect("timestamp tag pattern is valid")
    })
}

/// Splits on `\n`, `\r\n` and `\r`. A `\r\n` pair yields a single break.
fn physical_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .flat_map(|segment| segment.strip_suffix('\r').unwrap_or(segment).split('\r'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn parses_minutes_seconds_and_hundredths() {
        let line = parse_line("[02:15.30]Good morning.").unwrap();
        assert!(close(line.timestamp(), 135.30));
        assert_eq!(line.text(), "Good morning.");

        let line = parse_line("[7:05.01] single digit minutes ").unwrap();
        assert!(close(line.timestamp(), 425.01));
        assert_eq!(line.text(), "single digit minutes");
    }

    #[test]
    fn seconds_are_not_range_checked() {
        let line = parse_line("[00:75.00]late").unwrap();
        assert!(close(line.timestamp(), 75.0));
    }

    #[test]
    fn rejects_tags_without_text() {
        assert!(parse_line("[0:00.00]").is_none());
        assert!(parse("[0:00.00]\n[00:01.00]   ").is_empty());
    }

    #[test]
    fn rejects_malformed_tags() {
        for bad in [
            "not a timestamp",
            "[bad:format]text",
            "[123:00.00]three digit minutes",
            "[00:0.00]one digit seconds",
            "[00:00.0]one digit hundredths",
            "[00:00.000]three digit hundredths",
            "[00:00:00]wrong separator",
            "text [00:01.00]tag not leading",
            "[-1:00.00]negative",
            "[٠٠:٠٠.٠٠]non ascii digits",
        ] {
            assert!(parse_line(bad).is_none(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn keeps_later_brackets_as_text() {
        let timeline = parse("[00:01.00]first [00:02.00]second");
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.lines()[0].text(), "first [00:02.00]second");
    }

    #[test]
    fn accepts_every_newline_style() {
        let timeline = parse("[00:01.00]a\r\n[00:02.00]b\r[00:03.00]c\n[00:04.00]d");
        let texts: Vec<_> = timeline.iter().map(Line::text).collect();
        assert_eq!(texts, ["a", "b", "c", "d"]);
    }

    #[test]
    fn trims_physical_lines_before_matching() {
        let timeline = parse("   [00:01.00]indented\t\n");
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.lines()[0].text(), "indented");
    }

    #[test]
    fn sorts_out_of_order_input() {
        let timeline = parse("[00:01.50]Hello\n[00:00.00]World");
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.lines()[0].text(), "World");
        assert!(close(timeline.lines()[0].timestamp(), 0.0));
        assert_eq!(timeline.lines()[1].text(), "Hello");
        assert!(close(timeline.lines()[1].timestamp(), 1.5));
    }

    #[test]
    fn keeps_source_order_for_equal_timestamps() {
        let timeline = parse("[00:05.00]C\n[00:05.00]A\n[00:01.00]first\n[00:05.00]B");
        let texts: Vec<_> = timeline.iter().map(Line::text).collect();
        assert_eq!(texts, ["first", "C", "A", "B"]);
    }

    #[test]
    fn malformed_transcript_is_empty() {
        assert!(parse("not a timestamp\n[bad:format]text").is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn report_lists_skipped_lines_but_not_blank_ones() {
        let report = parse_with_report("[00:01.00]ok\n\n  \nnoise\r\n[xx]y\n[00:02.00]ok");
        assert_eq!(report.timeline.len(), 2);
        assert_eq!(report.skipped_count(), 2);
        assert!(!report.is_clean());
        assert_eq!(
            report.skipped[0],
            SkippedLine {
                line_number: 4,
                content: "noise".to_string()
            }
        );
        assert_eq!(report.skipped[1].line_number, 5);
        assert_eq!(report.skipped[1].content, "[xx]y");
    }

    #[test]
    fn strict_mode_rejects_first_malformed_line() {
        let err = parse_strict("[00:01.00]ok\n\nbroken\nalso broken").unwrap_err();
        match err {
            LyricsError::MalformedLine {
                line_number,
                content,
            } => {
                assert_eq!(line_number, 3);
                assert_eq!(content, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }

        let timeline = parse_strict("[00:01.00]ok\n\n[00:00.50]earlier\n").unwrap();
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn reparses_timestamps_past_ninety_nine_minutes() {
        let timeline = parse("[99:99.00]late\n[99:60.50]edge");
        assert_eq!(timeline.len(), 2);

        let reparsed = parse(&timeline.to_lrc());
        assert_eq!(reparsed.len(), 2);
        for (a, b) in timeline.iter().zip(reparsed.iter()) {
            assert_eq!(a.centiseconds(), b.centiseconds());
            assert_eq!(a.text(), b.text());
        }
        assert_eq!(reparsed.lines()[1].centiseconds(), 603_900);
    }

    #[test]
    fn ensure_clean_reports_first_skipped_line() {
        assert!(parse_with_report("[00:01.00]ok\n\n").ensure_clean().is_ok());
        let err = parse_with_report("noise\n[00:01.00]ok\nmore")
            .ensure_clean()
            .unwrap_err();
        assert!(matches!(err, LyricsError::MalformedLine { line_number: 1, .. }));
    }

    #[test]
    fn mode_selects_behaviour() {
        let text = "[00:01.00]ok\nbroken";
        assert_eq!(parse_with_mode(text, ParseMode::Lenient).unwrap().len(), 1);
        assert!(parse_with_mode(text, ParseMode::Strict).is_err());
        assert_eq!(ParseMode::default(), ParseMode::Lenient);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn timed_line() -> impl Strategy<Value = (u32, u32, u32, String)> {
            (0u32..100, 0u32..100, 0u32..100, "[a-zA-Z][a-zA-Z ,.!?]{0,20}")
        }

        fn render(lines: &[(u32, u32, u32, String)]) -> String {
            lines
                .iter()
                .map(|(m, s, h, text)| format!("[{m:02}:{s:02}.{h:02}]{text}"))
                .collect::<Vec<_>>()
                .join("\n")
        }

        proptest! {
            #[test]
            fn prop_timestamps_are_non_decreasing(lines in prop::collection::vec(timed_line(), 0..40)) {
                let timeline = parse(&render(&lines));
                prop_assert_eq!(timeline.len(), lines.len());
                for pair in timeline.lines().windows(2) {
                    prop_assert!(pair[0].timestamp() <= pair[1].timestamp());
                }
            }

            #[test]
            fn prop_equal_timestamps_keep_source_order(
                stamps in prop::collection::vec(0u32..4, 1..30)
            ) {
                // Text carries the source position so order can be checked after sorting.
                let text = stamps
                    .iter()
                    .enumerate()
                    .map(|(i, s)| format!("[00:0{s}.00]{i}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                let timeline = parse(&text);
                for pair in timeline.lines().windows(2) {
                    if pair[0].timestamp() == pair[1].timestamp() {
                        let a: usize = pair[0].text().parse().unwrap();
                        let b: usize = pair[1].text().parse().unwrap();
                        prop_assert!(a < b);
                    }
                }
            }

            #[test]
            fn prop_reserialising_is_idempotent(lines in prop::collection::vec(timed_line(), 0..40)) {
                let first = parse(&render(&lines));
                let second = parse(&first.to_lrc());
                prop_assert_eq!(first.len(), second.len());
                for (a, b) in first.iter().zip(second.iter()) {
                    prop_assert_eq!(a.centiseconds(), b.centiseconds());
                    prop_assert!((a.timestamp() - b.timestamp()).abs() < 0.005);
                    prop_assert_eq!(a.text(), b.text());
                }
            }

            #[test]
            fn prop_noise_lines_never_contribute(noise in prop::collection::vec("[^\\[\r\n]{0,30}", 0..20)) {
                let report = parse_with_report(&noise.join("\n"));
                prop_assert!(report.timeline.is_empty());
                let non_blank = noise.iter().filter(|line| !line.trim().is_empty()).count();
                prop_assert_eq!(report.skipped_count(), non_blank);
            }
        }
    }
}
