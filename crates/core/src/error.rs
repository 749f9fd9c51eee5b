/// Result alias that carries the custom [`LyricsError`] type.
pub type Result<T> = std::result::Result<T, LyricsError>;

/// Common error type for the core crate.
///
/// Parsing in lenient mode and every timeline query are infallible; these
/// variants only surface from strict parsing, configuration loading and the
/// shared timeline slot.
#[derive(Debug, thiserror::Error)]
pub enum LyricsError {
    /// Invalid caller input that has no dedicated variant, such as a
    /// playback window that never ends.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration or export documents that are not valid JSON.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// A non-blank transcript line that does not start with a `[MM:SS.HH]` tag.
    #[error("line {line_number} is not a timed transcript line: {content:?}")]
    MalformedLine { line_number: usize, content: String },
    /// A lock guarding shared state was poisoned by a panicking writer.
    #[error("{0} has been poisoned")]
    Poisoned(&'static str),
}

impl LyricsError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}
