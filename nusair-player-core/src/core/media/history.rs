use chrono::{DateTime, Utc};
use log::trace;
use serde::{Deserialize, Serialize};

/// The maximum number of entries kept within the watch history.
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// A single watched video within the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The url of the watched video.
    pub url: String,
    /// The display title of the watched video.
    pub title: String,
    /// The moment the video was last loaded.
    pub timestamp: DateTime<Utc>,
}

/// The watch history of the player, ordered most-recent-first and unique by url.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchHistory {
    entries: Vec<HistoryEntry>,
}

impl WatchHistory {
    /// The history entries, most recently loaded first.
    pub fn entries(&self) -> &[HistoryEntry] {
        self.entries.as_slice()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Verify if the given url is present within the history.
    pub fn contains(&self, url: &str) -> bool {
        self.entries.iter().any(|e| e.url == url)
    }

    /// Insert the given entry at the front of the history.
    ///
    /// An existing entry with the same url is removed before inserting, reordering
    /// the history by recency of load. Entries beyond [MAX_HISTORY_ENTRIES] are dropped.
    pub fn insert(&mut self, entry: HistoryEntry) {
        trace!("Adding {} to the watch history", entry.url);
        self.entries.retain(|e| e.url != entry.url);
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_HISTORY_ENTRIES);
    }

    /// Remove all entries from the history.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
