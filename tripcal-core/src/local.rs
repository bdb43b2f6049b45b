//! Local persistence: a small synchronous key/value store on disk.
//!
//! Each key is one file holding JSON text. The whole itinerary lives under a
//! single key, so a read or write always covers the full collection.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::TripCalResult;
use crate::event::EventRecord;

/// Key holding the serialized collection.
pub const EVENTS_KEY: &str = "events";

#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LocalStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Raw text stored under `key`, or `None` if it was never written.
    pub fn get_item(&self, key: &str) -> TripCalResult<Option<String>> {
        match std::fs::read_to_string(self.item_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the text stored under `key`. The file is swapped in atomically.
    pub fn set_item(&self, key: &str, value: &str) -> TripCalResult<()> {
        std::fs::create_dir_all(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(self.item_path(key)).map_err(|e| e.error)?;

        Ok(())
    }

    /// Load the saved collection. `None` means nothing was ever saved, which
    /// is different from a saved empty collection.
    pub fn load_local(&self) -> TripCalResult<Option<Vec<EventRecord>>> {
        let Some(content) = self.get_item(EVENTS_KEY)? else {
            return Ok(None);
        };

        let events: Vec<EventRecord> = serde_json::from_str(&content)?;
        debug!(count = events.len(), "Loaded events from {}", self.dir.display());
        Ok(Some(events))
    }

    pub fn save_local(&self, events: &[EventRecord]) -> TripCalResult<()> {
        let content = serde_json::to_string(events)?;
        self.set_item(EVENTS_KEY, &content)?;
        debug!(count = events.len(), "Saved events to {}", self.dir.display());
        Ok(())
    }
}
