use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::trace;
use serde::{Deserialize, Serialize};

/// The last known playback offset of a video, persisted independent of the
/// watch history list membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// The playback position in seconds.
    pub position: f64,
    /// The moment the position was last updated.
    pub last_played: DateTime<Utc>,
    /// The display title of the video at the time of recording.
    pub title: String,
}

/// The resume positions of all videos that received at least one time-position
/// update while loaded, mapped by url.
///
/// Entries are never expired or capped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionTable {
    positions: HashMap<String, PositionRecord>,
}

impl PositionTable {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Retrieve the position record of the given url.
    pub fn get(&self, url: &str) -> Option<&PositionRecord> {
        self.positions.get(url)
    }

    /// Retrieve the resume position in seconds for the given url.
    ///
    /// It returns the last known position when present, else [None].
    pub fn resume_position(&self, url: &str) -> Option<f64> {
        self.positions.get(url).map(|e| e.position)
    }

    /// Write or overwrite the position record of the given url.
    pub fn record(&mut self, url: &str, record: PositionRecord) {
        trace!("Recording position {} for {}", record.position, url);
        self.positions.insert(url.to_string(), record);
    }
}
