use std::sync::Arc;

use derive_more::Display;
use fx_callback::{Callback, MultiThreadedCallback, Subscriber, Subscription};
use log::{debug, error, info, trace, warn};
use tokio::sync::Mutex;

use crate::core::media;
use crate::core::media::{PositionTable, VideoReference, WatchHistory};
use crate::core::storage::{Storage, StorageError};
use crate::core::store::{PersistedState, PlayerStoreState};

const FILENAME: &str = "player-state.json";

/// The events invoked by the [PlayerStore] when its state changes.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum PlayerStoreEvent {
    /// Invoked when a new video has been loaded into the store.
    #[display("Video {} has been loaded", _0.url)]
    VideoLoaded(VideoReference),
    /// Invoked when the playing flag changed.
    #[display("Playback state changed to playing: {_0}")]
    PlaybackStateChanged(bool),
    /// Invoked when the volume changed.
    #[display("Volume changed to {_0}")]
    VolumeChanged(f32),
    /// Invoked when the fullscreen flag changed.
    #[display("Fullscreen changed to {_0}")]
    FullscreenChanged(bool),
    /// Invoked when the watch history has been cleared.
    #[display("Watch history has been cleared")]
    HistoryCleared,
}

/// The state container of the player.
///
/// The store holds the current video, transport state and watch data, and writes
/// the persisted subset (positions, history, volume) through to storage on every
/// mutation of those fields. Write failures are logged and never surfaced; the
/// in-memory session continues unaffected.
///
/// The store is explicitly constructed and shared by reference with its
/// consumers, it doesn't rely on any global lookup.
#[derive(Debug, Clone)]
pub struct PlayerStore {
    inner: Arc<InnerPlayerStore>,
}

impl PlayerStore {
    /// Create a new player store which persists its state within the given
    /// storage directory.
    ///
    /// A missing state file yields the defaults; a file that fails to parse or
    /// carries an unknown schema version is ignored and replaced on the next
    /// write-through.
    pub fn new(storage_directory: &str) -> Self {
        let storage = Storage::from(storage_directory);
        let state = Self::load_state(&storage);

        Self {
            inner: Arc::new(InnerPlayerStore {
                storage,
                state: Mutex::new(state),
                callbacks: MultiThreadedCallback::new(),
            }),
        }
    }

    fn load_state(storage: &Storage) -> PlayerStoreState {
        match storage.options().serializer(FILENAME).read::<PersistedState>() {
            Ok(e) if e.is_supported() => {
                debug!("Player state has been loaded from storage");
                PlayerStoreState::from_persisted(e)
            }
            Ok(e) => {
                warn!(
                    "Player state carries unsupported schema version {}, using defaults",
                    e.schema_version
                );
                PlayerStoreState::default()
            }
            Err(StorageError::NotFound(file)) => {
                debug!("Creating new player state file {}", file);
                PlayerStoreState::default()
            }
            Err(e) => {
                warn!("Failed to read player state, using defaults, {}", e);
                PlayerStoreState::default()
            }
        }
    }

    /// Load a new video into the store.
    ///
    /// On success, the video becomes current with its resume position restored,
    /// the history is updated and playback is started.
    /// On validation failure, the error message is set within the store and no
    /// video or history state is mutated.
    pub async fn load_video(&self, url: &str) -> media::Result<VideoReference> {
        trace!("Loading video {}", url);
        let result = {
            let mut state = self.inner.state.lock().await;
            state.load_video(url)
        };

        match result {
            Ok(video) => {
                info!("Video {} has been loaded", video.url);
                self.inner.save().await;
                self.inner
                    .callbacks
                    .invoke(PlayerStoreEvent::VideoLoaded(video.clone()));
                Ok(video)
            }
            Err(e) => {
                debug!("Failed to load video, {}", e);
                Err(e)
            }
        }
    }

    /// Update the playing flag of the current playback.
    pub async fn set_playback_state(&self, is_playing: bool) {
        let mut state = self.inner.state.lock().await;
        state.set_playback_state(is_playing);
        drop(state);
        self.inner
            .callbacks
            .invoke(PlayerStoreEvent::PlaybackStateChanged(is_playing));
    }

    /// Update the volume of the player, clamped to `[0, 1]`.
    pub async fn set_volume(&self, volume: f32) {
        let (changed, volume) = {
            let mut state = self.inner.state.lock().await;
            let changed = state.set_volume(volume);
            (changed, state.volume)
        };

        if changed {
            self.inner.save().await;
            self.inner
                .callbacks
                .invoke(PlayerStoreEvent::VolumeChanged(volume));
        }
    }

    /// Update the playback rate.
    /// Rates outside the supported discrete set are ignored.
    ///
    /// It returns `true` when the rate has been accepted.
    pub async fn set_playback_rate(&self, rate: f32) -> bool {
        let mut state = self.inner.state.lock().await;
        let accepted = state.set_playback_rate(rate);
        if !accepted {
            warn!("Playback rate {} is not supported, ignoring", rate);
        }
        accepted
    }

    /// Update the media duration as reported by the transport.
    pub async fn set_duration(&self, duration: f64) {
        let mut state = self.inner.state.lock().await;
        state.set_duration(duration);
    }

    /// Update the playback position of the current video, recording it as the
    /// resume position. This is a no-op when no video is loaded.
    pub async fn set_current_time(&self, time: f64) {
        let changed = {
            let mut state = self.inner.state.lock().await;
            state.set_current_time(time)
        };

        if changed {
            self.inner.save().await;
        }
    }

    /// Toggle the sidebar visibility, returning the new value.
    pub async fn toggle_sidebar(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        state.toggle_sidebar()
    }

    /// Toggle the fullscreen flag, returning the new value.
    pub async fn toggle_fullscreen(&self) -> bool {
        let is_fullscreen = {
            let mut state = self.inner.state.lock().await;
            state.toggle_fullscreen()
        };
        self.inner
            .callbacks
            .invoke(PlayerStoreEvent::FullscreenChanged(is_fullscreen));
        is_fullscreen
    }

    /// Update the fullscreen flag to the status reported by the platform.
    pub async fn set_fullscreen(&self, is_fullscreen: bool) {
        let changed = {
            let mut state = self.inner.state.lock().await;
            let changed = state.is_fullscreen != is_fullscreen;
            state.is_fullscreen = is_fullscreen;
            changed
        };

        if changed {
            self.inner
                .callbacks
                .invoke(PlayerStoreEvent::FullscreenChanged(is_fullscreen));
        }
    }

    /// Clear the current error message.
    pub async fn clear_error(&self) {
        let mut state = self.inner.state.lock().await;
        state.clear_error();
    }

    /// Clear the watch history.
    /// The resume positions survive the history clearing.
    pub async fn clear_history(&self) {
        let changed = {
            let mut state = self.inner.state.lock().await;
            state.clear_history()
        };

        if changed {
            info!("Watch history has been cleared");
            self.inner.save().await;
            self.inner.callbacks.invoke(PlayerStoreEvent::HistoryCleared);
        }
    }

    /// The currently loaded video, if any.
    pub async fn current_video(&self) -> Option<VideoReference> {
        self.inner.state.lock().await.current_video.clone()
    }

    pub async fn is_playing(&self) -> bool {
        self.inner.state.lock().await.is_playing
    }

    pub async fn current_time(&self) -> f64 {
        self.inner.state.lock().await.current_time
    }

    pub async fn duration(&self) -> f64 {
        self.inner.state.lock().await.duration
    }

    pub async fn volume(&self) -> f32 {
        self.inner.state.lock().await.volume
    }

    pub async fn playback_rate(&self) -> f32 {
        self.inner.state.lock().await.playback_rate
    }

    pub async fn is_fullscreen(&self) -> bool {
        self.inner.state.lock().await.is_fullscreen
    }

    pub async fn is_sidebar_open(&self) -> bool {
        self.inner.state.lock().await.is_sidebar_open
    }

    /// The current error message, if any.
    pub async fn error(&self) -> Option<String> {
        self.inner.state.lock().await.error.clone()
    }

    /// A copy of the current watch history.
    pub async fn history(&self) -> WatchHistory {
        self.inner.state.lock().await.history.clone()
    }

    /// A copy of the current resume positions.
    pub async fn positions(&self) -> PositionTable {
        self.inner.state.lock().await.positions.clone()
    }
}

impl Callback<PlayerStoreEvent> for PlayerStore {
    fn subscribe(&self) -> Subscription<PlayerStoreEvent> {
        self.inner.callbacks.subscribe()
    }

    fn subscribe_with(&self, subscriber: Subscriber<PlayerStoreEvent>) {
        self.inner.callbacks.subscribe_with(subscriber)
    }
}

#[derive(Debug)]
struct InnerPlayerStore {
    storage: Storage,
    state: Mutex<PlayerStoreState>,
    callbacks: MultiThreadedCallback<PlayerStoreEvent>,
}

impl InnerPlayerStore {
    /// Write the persisted subset through to storage.
    /// Failures are fatal to persistence only and never surface to the caller.
    async fn save(&self) {
        let snapshot = { self.state.lock().await.snapshot() };
        match self
            .storage
            .options()
            .serializer(FILENAME)
            .write_async(&snapshot)
            .await
        {
            Ok(_) => debug!("Player state has been saved"),
            Err(e) => error!("Failed to save player state, {}", e),
        }
    }
}
