use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::core::media;
use crate::core::media::{
    HistoryEntry, PositionRecord, PositionTable, VideoReference, WatchHistory,
};

/// The volume used when nothing has been persisted yet.
pub const DEFAULT_VOLUME: f32 = 0.7;
/// The playback rate used at startup, never persisted across sessions.
pub const DEFAULT_PLAYBACK_RATE: f32 = 1.0;
/// The discrete playback rates accepted by the store.
pub const PLAYBACK_RATES: [f32; 8] = [0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];
/// The error message surfaced when a video url fails validation.
pub const INVALID_URL_MESSAGE: &str =
    "Invalid video URL. Please provide a URL ending with a valid video extension.";

/// The schema version written to the persisted state file.
pub const SCHEMA_VERSION: u32 = 1;

/// The subset of the player state which is persisted across sessions.
///
/// A payload with an unknown [SCHEMA_VERSION] is ignored and replaced by the
/// defaults on the next write-through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub schema_version: u32,
    pub positions: PositionTable,
    pub history: WatchHistory,
    pub volume: f32,
}

impl PersistedState {
    /// Verify if this payload carries a schema version known to this build.
    pub fn is_supported(&self) -> bool {
        self.schema_version == SCHEMA_VERSION
    }
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            positions: PositionTable::default(),
            history: WatchHistory::default(),
            volume: DEFAULT_VOLUME,
        }
    }
}

/// The in-memory state of the player store.
///
/// All transitions are pure and free of IO; persistence is applied by the
/// owning store when a transition reports that the persisted subset changed.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStoreState {
    pub current_video: Option<VideoReference>,
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: f64,
    pub volume: f32,
    pub playback_rate: f32,
    pub is_fullscreen: bool,
    pub is_sidebar_open: bool,
    pub error: Option<String>,
    pub positions: PositionTable,
    pub history: WatchHistory,
}

impl PlayerStoreState {
    /// Create the state from a persisted payload.
    pub fn from_persisted(persisted: PersistedState) -> Self {
        Self {
            volume: persisted.volume.clamp(0.0, 1.0),
            positions: persisted.positions,
            history: persisted.history,
            ..Self::default()
        }
    }

    /// Create the snapshot of the persisted subset of this state.
    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            schema_version: SCHEMA_VERSION,
            positions: self.positions.clone(),
            history: self.history.clone(),
            volume: self.volume,
        }
    }

    /// Load a new video into the state.
    ///
    /// On validation failure, the error message is set and no video or history
    /// state is mutated. On success the video becomes current, the resume
    /// position is restored, the history is reordered and playback starts.
    ///
    /// It returns the loaded reference, which also indicates the persisted
    /// subset changed.
    pub fn load_video(&mut self, url: &str) -> media::Result<VideoReference> {
        match VideoReference::from_url(url) {
            Ok(video) => {
                let resume_position = self.positions.resume_position(url).unwrap_or(0.0);

                self.history.insert(HistoryEntry {
                    url: video.url.clone(),
                    title: video.title.clone(),
                    timestamp: Utc::now(),
                });
                self.current_video = Some(video.clone());
                self.current_time = resume_position;
                self.is_playing = true;
                self.error = None;

                Ok(video)
            }
            Err(e) => {
                self.error = Some(INVALID_URL_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    pub fn set_playback_state(&mut self, is_playing: bool) {
        self.is_playing = is_playing;
    }

    /// Update the volume, clamped to `[0, 1]`.
    ///
    /// It returns `true` when the persisted subset changed.
    pub fn set_volume(&mut self, volume: f32) -> bool {
        let volume = volume.clamp(0.0, 1.0);
        let changed = self.volume != volume;
        self.volume = volume;
        changed
    }

    /// Update the playback rate.
    ///
    /// It returns `false` when the given rate is not one of the [PLAYBACK_RATES],
    /// in which case the state is left untouched.
    pub fn set_playback_rate(&mut self, rate: f32) -> bool {
        if !PLAYBACK_RATES.iter().any(|e| *e == rate) {
            return false;
        }

        self.playback_rate = rate;
        true
    }

    /// Update the media duration, negative values are clamped to zero.
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration.max(0.0);
    }

    /// Update the playback position of the current video.
    ///
    /// This is the sole write path into the position table. It is a no-op when
    /// no video is loaded.
    ///
    /// It returns `true` when the persisted subset changed.
    pub fn set_current_time(&mut self, time: f64) -> bool {
        if let Some(video) = self.current_video.as_ref() {
            self.current_time = time;
            self.positions.record(
                video.url.as_str(),
                PositionRecord {
                    position: time,
                    last_played: Utc::now(),
                    title: video.title.clone(),
                },
            );
            return true;
        }

        false
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        self.is_sidebar_open = !self.is_sidebar_open;
        self.is_sidebar_open
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.is_fullscreen = !self.is_fullscreen;
        self.is_fullscreen
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Remove all history entries, leaving the position table untouched.
    ///
    /// It returns `true` when the persisted subset changed.
    pub fn clear_history(&mut self) -> bool {
        if self.history.is_empty() {
            return false;
        }

        self.history.clear();
        true
    }
}

impl Default for PlayerStoreState {
    fn default() -> Self {
        Self {
            current_video: None,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: DEFAULT_VOLUME,
            playback_rate: DEFAULT_PLAYBACK_RATE,
            is_fullscreen: false,
            is_sidebar_open: false,
            error: None,
            positions: PositionTable::default(),
            history: WatchHistory::default(),
        }
    }
}
