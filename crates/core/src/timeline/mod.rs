use std::fmt;

use serde::Serialize;

use crate::Line;

/// Forward steps the cursor takes before handing over to a binary search.
const CURSOR_LINEAR_STEPS: usize = 8;

/// Monotonic playback position fed to timeline queries.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PlaybackClock {
    pub time_seconds: f64,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
    }

    pub fn advance(&mut self, delta: f64) {
        self.time_seconds = (self.time_seconds + delta).max(0.0);
    }

    /// Jumps to an arbitrary position, forwards or backwards.
    pub fn seek(&mut self, time_seconds: f64) {
        self.time_seconds = time_seconds.max(0.0);
    }
}

/// Immutable, timestamp-sorted sequence of transcript lines.
///
/// Lines with equal timestamps keep the order in which they appeared in the
/// transcript. Timelines are only built by the parser; a new transcript means
/// a new timeline. [`Timeline::default`] is the "no transcript loaded" state
/// and answers `None` to every query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Timeline {
    lines: Vec<Line>,
}

/// Result of resolving one playback time against a timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    /// Last line whose timestamp is at or before the queried time.
    pub current: Option<usize>,
    /// First line whose timestamp is strictly after the queried time.
    pub next: Option<usize>,
}

impl Position {
    fn from_boundary(boundary: usize, len: usize) -> Self {
        Self {
            current: boundary.checked_sub(1),
            next: (boundary < len).then_some(boundary),
        }
    }

    /// Returns `true` when the highlighted line differs from `previous`.
    pub fn changed_from(&self, previous: &Position) -> bool {
        self.current != previous.current
    }
}

impl Timeline {
    /// Stable-sorts `lines` by timestamp.
    pub(crate) fn from_unsorted(mut lines: Vec<Line>) -> Self {
        lines.sort_by(|a, b| a.timestamp().total_cmp(&b.timestamp()));
        Self { lines }
    }

    pub(crate) fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Line> {
        self.lines.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn first(&self) -> Option<&Line> {
        self.lines.first()
    }

    pub fn last(&self) -> Option<&Line> {
        self.lines.last()
    }

    /// Timestamp of the final line, the earliest point at which nothing is
    /// left to come.
    pub fn last_timestamp(&self) -> Option<f64> {
        self.last().map(Line::timestamp)
    }

    /// Index of the last line whose timestamp is `<= t`.
    pub fn current_line(&self, t: f64) -> Option<usize> {
        self.position(t).current
    }

    /// Index of the first line whose timestamp is `> t`.
    pub fn next_line(&self, t: f64) -> Option<usize> {
        self.position(t).next
    }

    pub fn current(&self, t: f64) -> Option<&Line> {
        self.current_line(t).and_then(|index| self.get(index))
    }

    pub fn next(&self, t: f64) -> Option<&Line> {
        self.next_line(t).and_then(|index| self.get(index))
    }

    /// Resolves both queries with a single binary search.
    pub fn position(&self, t: f64) -> Position {
        if t.is_nan() {
            return Position::default();
        }
        Position::from_boundary(self.boundary(t), self.len())
    }

    /// Starts a cursor for answering queries during monotonic playback.
    pub fn cursor(&self) -> TimelineCursor<'_> {
        TimelineCursor::new(self)
    }

    /// Renders the timeline back into transcript text, one line per entry.
    pub fn to_lrc(&self) -> String {
        self.to_string()
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of lines whose timestamp is `<= t`.
    fn boundary(&self, t: f64) -> usize {
        self.lines.partition_point(|line| line.timestamp() <= t)
    }
}

impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{line}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Line;
    type IntoIter = std::slice::Iter<'a, Line>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Incremental query helper for a playback clock that mostly moves forward.
///
/// While the queried time keeps increasing the cursor walks forward from its
/// last answer. Any backwards jump falls back to a full binary search, so
/// the answers always match [`Timeline::position`].
#[derive(Debug, Clone)]
pub struct TimelineCursor<'a> {
    timeline: &'a Timeline,
    last_time: Option<f64>,
    boundary: usize,
    seeks: u64,
}

impl<'a> TimelineCursor<'a> {
    pub fn new(timeline: &'a Timeline) -> Self {
        Self {
            timeline,
            last_time: None,
            boundary: 0,
            seeks: 0,
        }
    }

    pub fn timeline(&self) -> &'a Timeline {
        self.timeline
    }

    /// Number of queries that needed a full binary search.
    pub fn seeks(&self) -> u64 {
        self.seeks
    }

    /// Forgets the previous query so the next one starts from scratch.
    pub fn reset(&mut self) {
        self.last_time = None;
        self.boundary = 0;
    }

    pub fn advance(&mut self, t: f64) -> Position {
        if t.is_nan() {
            self.reset();
            return Position::default();
        }

        let lines = self.timeline.lines();
        match self.last_time {
            Some(previous) if t >= previous => {
                let mut steps = 0;
                while self.boundary < lines.len() && lines[self.boundary].timestamp() <= t {
                    self.boundary += 1;
                    steps += 1;
                    if steps == CURSOR_LINEAR_STEPS {
                        self.boundary += lines[self.boundary..]
                            .partition_point(|line| line.timestamp() <= t);
                        break;
                    }
                }
            }
            _ => {
                self.seeks += 1;
                self.boundary = self.timeline.boundary(t);
                tracing::trace!(time = t, boundary = self.boundary, "cursor seek");
            }
        }

        self.last_time = Some(t);
        Position::from_boundary(self.boundary, lines.len())
    }
}
