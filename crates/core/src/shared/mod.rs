use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{parse_with_mode, LyricsError, ParseMode, Result, Timeline};

/// Slot holding the timeline for whatever is playing right now.
///
/// Readers take an [`Arc`] snapshot and query it without holding the lock;
/// loading a new transcript swaps the whole `Arc`, so a reader always sees
/// either the old timeline or the new one in full.
#[derive(Debug, Clone, Default)]
pub struct SharedTimeline {
    slot: Arc<RwLock<Arc<Timeline>>>,
}

impl SharedTimeline {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Arc::new(timeline))),
        }
    }

    /// Returns the timeline currently installed.
    pub fn snapshot(&self) -> Result<Arc<Timeline>> {
        let guard = self.read()?;
        Ok(Arc::clone(&*guard))
    }

    /// Installs `timeline` and hands back the one it replaced.
    pub fn replace(&self, timeline: Timeline) -> Result<Arc<Timeline>> {
        let next = Arc::new(timeline);
        let mut guard = self.write()?;
        Ok(std::mem::replace(&mut *guard, next))
    }

    /// Parses `text`, installs the result and returns it. A strict-mode
    /// failure leaves the previous timeline in place.
    pub fn load_transcript(&self, text: &str, mode: ParseMode) -> Result<Arc<Timeline>> {
        let timeline = Arc::new(parse_with_mode(text, mode)?);
        tracing::info!(lines = timeline.len(), "installing new timeline");
        let mut guard = self.write()?;
        *guard = Arc::clone(&timeline);
        Ok(timeline)
    }

    /// Drops the current timeline, e.g. when playback stops.
    pub fn clear(&self) -> Result<()> {
        self.replace(Timeline::empty())?;
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Arc<Timeline>>> {
        self.slot
            .read()
            .map_err(|_| LyricsError::Poisoned("shared timeline"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Arc<Timeline>>> {
        self.slot
            .write()
            .map_err(|_| LyricsError::Poisoned("shared timeline"))
    }
}
