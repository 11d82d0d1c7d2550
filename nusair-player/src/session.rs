use std::sync::Arc;
use std::time::{Duration, Instant};

use derive_more::Display;
use fx_callback::{Callback, MultiThreadedCallback, Subscriber, Subscription};
use log::{debug, error, trace, warn};
use tokio::select;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use nusair_player_core::core::media;
use nusair_player_core::core::media::VideoReference;
use nusair_player_core::core::playback::{PlaybackControlEvent, PlaybackState};
use nusair_player_core::core::players::{Player, PlayerEvent};
use nusair_player_core::core::store::{PlayerStore, DEFAULT_VOLUME};

use crate::controls::ControlsTracker;
use crate::platform::FullscreenHandle;

/// The amount of media seconds that should elapse between persisted progress writes.
const PROGRESS_WRITE_INTERVAL_SECS: f64 = 1.0;
/// The debounce window before a buffering stall shows the loading indicator.
const BUFFERING_INDICATOR_DELAY: Duration = Duration::from_millis(500);
/// The interval of the session maintenance tick.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// The amount of seconds of the long forward skip control.
pub const LONG_SEEK_STEP_SECS: f64 = 30.0;

/// The commands accepted by the playback session.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum SessionCommand {
    /// Apply the given playback control event, e.g. coming from a keyboard shortcut.
    #[display("Control event: {_0}")]
    Control(PlaybackControlEvent),
    /// Toggle between playing and paused.
    #[display("Toggle playback")]
    TogglePlayback,
    /// Seek to the given time in seconds, as a single discrete jump.
    #[display("Seek to {_0} seconds")]
    SeekTo(f64),
    /// Seek relative to the current time by the given amount of seconds.
    #[display("Seek by {_0} seconds")]
    SeekBy(f64),
    /// Start a scrub interaction on the progress bar.
    #[display("Start scrubbing")]
    ScrubStart,
    /// Update the scrub position while the pointer is held down.
    #[display("Scrub to {_0} seconds")]
    ScrubMove(f64),
    /// Release the scrub, committing exactly one seek.
    #[display("Commit scrub")]
    ScrubEnd,
    /// Change the volume of the playback.
    #[display("Change volume to {_0}")]
    SetVolume(f32),
    /// Toggle between muted and the remembered volume.
    #[display("Toggle mute")]
    ToggleMute,
    /// Change the playback rate.
    #[display("Change playback rate to {_0}")]
    SetRate(f32),
    /// Toggle the fullscreen mode of the playback surface.
    #[display("Toggle fullscreen")]
    ToggleFullscreen,
    /// The fullscreen status as reported by the platform.
    #[display("Platform reported fullscreen: {_0}")]
    FullscreenReported(bool),
    /// User pointer activity on the playback surface.
    #[display("User activity")]
    Activity,
}

/// The events invoked by the playback session.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum SessionEvent {
    /// Invoked when the playback state of the session changed.
    #[display("Playback state changed to {_0}")]
    StateChanged(PlaybackState),
    /// Invoked when the playback time changed.
    #[display("Playback time changed to {_0}")]
    TimeChanged(f64),
    /// Invoked when the buffering indicator visibility changed.
    #[display("Buffering indicator visible: {_0}")]
    BufferingIndicatorChanged(bool),
    /// Invoked when the control surface visibility changed.
    #[display("Controls visible: {_0}")]
    ControlsVisibilityChanged(bool),
}

/// The playback session reconciles the transport surface events against the
/// player store, keeping the on-screen controls and persisted state consistent.
///
/// The session drives the transport one-way from the store state, throttles the
/// persisted progress writes, debounces the buffering indicator and tracks the
/// auto-hiding control surface. It processes its commands and the transport
/// events on a single main loop, which guarantees the ordering of the store
/// mutations.
#[derive(Debug)]
pub struct PlaybackSession {
    inner: Arc<InnerPlaybackSession>,
}

impl PlaybackSession {
    pub fn builder() -> PlaybackSessionBuilder {
        PlaybackSessionBuilder::default()
    }

    /// The underlying player store of this session.
    pub fn store(&self) -> &PlayerStore {
        &self.inner.store
    }

    /// Load a new video into the session.
    ///
    /// This supersedes any previous playback; there is no explicit close
    /// transition. On success, the transport is seeked to the resume position
    /// of the video and playback is started.
    pub async fn load(&self, url: &str) -> media::Result<VideoReference> {
        self.inner.load(url).await
    }

    /// Send the given command to the session main loop.
    pub fn send(&self, command: SessionCommand) {
        self.inner.send_command(command)
    }

    /// The current playback state of the session.
    pub async fn playback_state(&self) -> PlaybackState {
        self.inner.state.lock().await.playback
    }

    /// Verify if the control surface is currently visible.
    pub async fn is_controls_visible(&self) -> bool {
        self.inner.state.lock().await.controls_visible
    }

    /// Verify if the buffering indicator is currently visible.
    pub async fn is_buffering_indicator_visible(&self) -> bool {
        self.inner.state.lock().await.buffering_indicator
    }
}

impl Callback<SessionEvent> for PlaybackSession {
    fn subscribe(&self) -> Subscription<SessionEvent> {
        self.inner.callbacks.subscribe()
    }

    fn subscribe_with(&self, subscriber: Subscriber<SessionEvent>) {
        self.inner.callbacks.subscribe_with(subscriber)
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.inner.cancellation_token.cancel();
    }
}

/// A builder for `PlaybackSession`.
#[derive(Default)]
pub struct PlaybackSessionBuilder {
    store: Option<PlayerStore>,
    player: Option<Arc<dyn Player>>,
    fullscreen: Option<Arc<dyn FullscreenHandle>>,
}

impl PlaybackSessionBuilder {
    /// Sets the player store backing the session.
    pub fn store(mut self, store: PlayerStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the transport surface driven by the session.
    pub fn player(mut self, player: Arc<dyn Player>) -> Self {
        self.player = Some(player);
        self
    }

    /// Sets the platform fullscreen handle.
    /// When not set, fullscreen requests only update the store flag.
    pub fn fullscreen(mut self, fullscreen: Arc<dyn FullscreenHandle>) -> Self {
        self.fullscreen = Some(fullscreen);
        self
    }

    /// Builds a new `PlaybackSession` and starts its main loop.
    ///
    /// # Panics
    ///
    /// Panics if the `store` or `player` is not set.
    pub fn build(self) -> PlaybackSession {
        let player = self.player.expect("Player not set");
        let player_events = player.subscribe();
        let (command_sender, command_receiver) = unbounded_channel();
        let instance = PlaybackSession {
            inner: Arc::new(InnerPlaybackSession {
                store: self.store.expect("Player store not set"),
                player,
                fullscreen: self.fullscreen,
                command_sender,
                state: Mutex::new(SessionState::default()),
                callbacks: MultiThreadedCallback::new(),
                cancellation_token: Default::default(),
            }),
        };

        let inner = instance.inner.clone();
        tokio::spawn(async move {
            inner.start(command_receiver, player_events).await;
        });

        instance
    }
}

/// The session-local transient state.
/// Scrub positions and debounce timestamps never reach the store.
#[derive(Debug)]
struct SessionState {
    playback: PlaybackState,
    buffering_since: Option<Instant>,
    buffering_indicator: bool,
    scrub_position: Option<f64>,
    last_persisted_time: f64,
    remembered_volume: f32,
    controls: ControlsTracker,
    controls_visible: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            playback: PlaybackState::default(),
            buffering_since: None,
            buffering_indicator: false,
            scrub_position: None,
            last_persisted_time: 0.0,
            remembered_volume: DEFAULT_VOLUME,
            controls: ControlsTracker::default(),
            controls_visible: true,
        }
    }
}

#[derive(Debug)]
struct InnerPlaybackSession {
    store: PlayerStore,
    player: Arc<dyn Player>,
    fullscreen: Option<Arc<dyn FullscreenHandle>>,
    command_sender: UnboundedSender<SessionCommand>,
    state: Mutex<SessionState>,
    callbacks: MultiThreadedCallback<SessionEvent>,
    cancellation_token: CancellationToken,
}

impl InnerPlaybackSession {
    async fn start(
        &self,
        mut commands: UnboundedReceiver<SessionCommand>,
        mut player_events: Subscription<PlayerEvent>,
    ) {
        let mut tick = interval(TICK_INTERVAL);
        loop {
            select! {
                _ = self.cancellation_token.cancelled() => break,
                Some(command) = commands.recv() => self.handle_command(command).await,
                Some(event) = player_events.recv() => self.handle_player_event(&event).await,
                _ = tick.tick() => self.tick().await,
            }
        }
        debug!("Playback session main loop ended");
    }

    fn send_command(&self, command: SessionCommand) {
        if let Err(e) = self.command_sender.send(command) {
            warn!("Playback session failed to queue command, {}", e);
        }
    }

    async fn load(&self, url: &str) -> media::Result<VideoReference> {
        let video = self.store.load_video(url).await?;
        let resume_position = self.store.current_time().await;

        {
            let mut state = self.state.lock().await;
            state.buffering_since = None;
            state.buffering_indicator = false;
            state.scrub_position = None;
            state.last_persisted_time = resume_position;
        }

        trace!("Seeking transport to resume position {}", resume_position);
        self.player.seek(resume_position).await;
        self.player.play().await;
        self.transition(PlaybackState::Ready).await;
        Ok(video)
    }

    async fn handle_command(&self, command: SessionCommand) {
        trace!("Handling session command: {}", command);
        match command {
            SessionCommand::Control(event) => self.handle_control_event(event).await,
            SessionCommand::TogglePlayback => self.toggle_playback().await,
            SessionCommand::SeekTo(time) => self.seek_to(time).await,
            SessionCommand::SeekBy(delta) => self.seek_by(delta).await,
            SessionCommand::ScrubStart => self.scrub_start().await,
            SessionCommand::ScrubMove(time) => self.scrub_move(time).await,
            SessionCommand::ScrubEnd => self.scrub_end().await,
            SessionCommand::SetVolume(volume) => self.set_volume(volume).await,
            SessionCommand::ToggleMute => self.toggle_mute().await,
            SessionCommand::SetRate(rate) => self.set_rate(rate).await,
            SessionCommand::ToggleFullscreen => self.toggle_fullscreen().await,
            SessionCommand::FullscreenReported(active) => self.fullscreen_reported(active).await,
            SessionCommand::Activity => self.activity().await,
        }
    }

    async fn handle_control_event(&self, event: PlaybackControlEvent) {
        match event {
            PlaybackControlEvent::TogglePlaybackState => self.toggle_playback().await,
            PlaybackControlEvent::Forward(seconds) => self.seek_by(seconds).await,
            PlaybackControlEvent::Rewind(seconds) => self.seek_by(-seconds).await,
            PlaybackControlEvent::ToggleFullscreen => self.toggle_fullscreen().await,
            PlaybackControlEvent::ToggleMute => self.toggle_mute().await,
        }
    }

    async fn handle_player_event(&self, event: &PlayerEvent) {
        {
            let state = self.state.lock().await;
            if !state.playback.is_active() {
                trace!("Ignoring transport event without a loaded video: {}", event);
                return;
            }
        }

        match event {
            PlayerEvent::ProgressChanged { played_seconds } => {
                self.on_progress(*played_seconds).await
            }
            PlayerEvent::DurationChanged(duration) => {
                debug!("Media duration resolved to {} seconds", duration);
                self.store.set_duration(*duration).await;
            }
            PlayerEvent::BufferingStarted => self.on_buffering_started().await,
            PlayerEvent::BufferingEnded => self.on_buffering_ended().await,
        }
    }

    async fn toggle_playback(&self) {
        {
            let state = self.state.lock().await;
            if !state.playback.is_active() {
                trace!("Ignoring playback toggle without a loaded video");
                return;
            }
        }

        let is_playing = !self.store.is_playing().await;
        debug!("Toggling playback to playing: {}", is_playing);
        self.store.set_playback_state(is_playing).await;
        // the store state drives the transport, one-way
        if is_playing {
            self.player.play().await;
        } else {
            self.player.pause().await;
        }

        let next = if is_playing {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        };
        self.transition(next).await;
    }

    async fn seek_to(&self, time: f64) {
        {
            let state = self.state.lock().await;
            if !state.playback.is_active() {
                trace!("Ignoring seek without a loaded video");
                return;
            }
        }

        let mut duration = self.store.duration().await;
        if duration <= 0.0 {
            if let Some(e) = self.player.duration().await {
                self.store.set_duration(e).await;
                duration = e;
            }
        }
        let time = if duration > 0.0 {
            time.clamp(0.0, duration)
        } else {
            time.max(0.0)
        };

        debug!("Seeking to {} seconds", time);
        self.store.set_current_time(time).await;
        self.player.seek(time).await;

        {
            let mut state = self.state.lock().await;
            state.last_persisted_time = time;
            state.controls.activity(Instant::now());
        }
        self.callbacks.invoke(SessionEvent::TimeChanged(time));
    }

    async fn seek_by(&self, delta: f64) {
        let time = self.store.current_time().await + delta;
        self.seek_to(time).await
    }

    async fn scrub_start(&self) {
        let current_time = self.store.current_time().await;
        let mut state = self.state.lock().await;
        if !state.playback.is_active() {
            trace!("Ignoring scrub without a loaded video");
            return;
        }

        trace!("Starting scrub at {} seconds", current_time);
        state.scrub_position = Some(current_time);
        state.controls.activity(Instant::now());
    }

    async fn scrub_move(&self, time: f64) {
        let mut state = self.state.lock().await;
        if state.scrub_position.is_none() {
            trace!("Ignoring scrub update without an active scrub");
            return;
        }

        // intermediate positions stay session-local until the pointer releases
        state.scrub_position = Some(time.max(0.0));
        state.controls.activity(Instant::now());
    }

    async fn scrub_end(&self) {
        let position = {
            let mut state = self.state.lock().await;
            state.scrub_position.take()
        };

        if let Some(time) = position {
            debug!("Committing scrub to {} seconds", time);
            self.seek_to(time).await;
        }
    }

    async fn set_volume(&self, volume: f32) {
        self.store.set_volume(volume).await;
        let volume = self.store.volume().await;
        self.player.set_volume(volume).await;
        self.activity().await;
    }

    async fn toggle_mute(&self) {
        let volume = self.store.volume().await;
        let target = if volume > 0.0 {
            let mut state = self.state.lock().await;
            state.remembered_volume = volume;
            0.0
        } else {
            self.state.lock().await.remembered_volume
        };

        debug!("Toggling mute, volume {} -> {}", volume, target);
        self.store.set_volume(target).await;
        self.player.set_volume(target).await;
    }

    async fn set_rate(&self, rate: f32) {
        if self.store.set_playback_rate(rate).await {
            self.player.set_rate(rate).await;
        }
    }

    async fn toggle_fullscreen(&self) {
        let active = self.store.toggle_fullscreen().await;
        if let Some(handle) = self.fullscreen.as_ref() {
            // best effort, the platform report corrects any divergence
            if let Err(e) = handle.request_fullscreen(active).await {
                error!("Failed to change fullscreen mode, {}", e);
            }
        }
        self.activity().await;
    }

    async fn fullscreen_reported(&self, active: bool) {
        // the platform reported status always wins over the store flag
        self.store.set_fullscreen(active).await;
    }

    async fn on_progress(&self, played_seconds: f64) {
        let should_persist = {
            let mut state = self.state.lock().await;
            if state.scrub_position.is_some() {
                trace!("Ignoring transport progress while scrubbing");
                return;
            }

            let should_persist = (played_seconds - state.last_persisted_time).abs()
                >= PROGRESS_WRITE_INTERVAL_SECS;
            if should_persist {
                state.last_persisted_time = played_seconds;
            }
            should_persist
        };

        let playback = self.state.lock().await.playback;
        if playback == PlaybackState::Ready && self.store.is_playing().await {
            self.transition(PlaybackState::Playing).await;
        }

        if should_persist {
            self.store.set_current_time(played_seconds).await;
        }
        self.callbacks
            .invoke(SessionEvent::TimeChanged(played_seconds));
    }

    async fn on_buffering_started(&self) {
        debug!("Transport started buffering");
        {
            let mut state = self.state.lock().await;
            state.buffering_since = Some(Instant::now());
        }
        self.transition(PlaybackState::Buffering).await;
    }

    async fn on_buffering_ended(&self) {
        debug!("Transport stopped buffering");
        let indicator_was_visible = {
            let mut state = self.state.lock().await;
            state.buffering_since = None;
            let was_visible = state.buffering_indicator;
            state.buffering_indicator = false;
            was_visible
        };

        if indicator_was_visible {
            self.callbacks
                .invoke(SessionEvent::BufferingIndicatorChanged(false));
        }

        let next = if self.store.is_playing().await {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        };
        self.transition(next).await;
    }

    /// Transition the session to the given playback state.
    /// State changes count as activity for the control surface.
    async fn transition(&self, next: PlaybackState) {
        let changed = {
            let mut state = self.state.lock().await;
            let changed = state.playback != next;
            state.playback = next;
            state.controls.activity(Instant::now());
            changed
        };

        if changed {
            debug!("Playback session state changed to {}", next);
            self.callbacks.invoke(SessionEvent::StateChanged(next));
        }
    }

    async fn activity(&self) {
        let mut state = self.state.lock().await;
        state.controls.activity(Instant::now());
        if !state.controls_visible {
            state.controls_visible = true;
            drop(state);
            self.callbacks
                .invoke(SessionEvent::ControlsVisibilityChanged(true));
        }
    }

    async fn tick(&self) {
        let now = Instant::now();
        let mut events = Vec::new();

        {
            let mut state = self.state.lock().await;
            if let Some(since) = state.buffering_since {
                if !state.buffering_indicator
                    && now.duration_since(since) >= BUFFERING_INDICATOR_DELAY
                {
                    debug!("Buffering persisted beyond the debounce window, showing indicator");
                    state.buffering_indicator = true;
                    events.push(SessionEvent::BufferingIndicatorChanged(true));
                }
            }

            let pinned = matches!(
                state.playback,
                PlaybackState::Paused | PlaybackState::Buffering
            ) || state.buffering_indicator
                || state.scrub_position.is_some();
            let visible = pinned || state.controls.is_visible(now);
            if visible != state.controls_visible {
                debug!("Controls visibility changed to {}", visible);
                state.controls_visible = visible;
                events.push(SessionEvent::ControlsVisibilityChanged(visible));
            }
        }

        for event in events {
            self.callbacks.invoke(event);
        }
    }
}

#[cfg(test)]
mod test {
    use std::future::Future;

    use tempfile::{tempdir, TempDir};
    use tokio::sync::mpsc::error::SendError;
    use tokio::time::timeout;

    use nusair_player_core::core::players::MockPlayer;
    use nusair_player_core::init_logger;

    use crate::controls::CONTROLS_IDLE_TIMEOUT;
    use crate::platform::{MockFullscreenHandle, PlatformError};

    use super::*;

    const VIDEO_URL: &str = "https://cdn.example.com/clips/My-Trip_2024.mp4";

    struct TestInstance {
        session: PlaybackSession,
        events: Subscriber<PlayerEvent>,
        _temp_dir: TempDir,
    }

    impl TestInstance {
        fn send_player_event(&self, event: PlayerEvent) -> Result<(), SendError<Arc<PlayerEvent>>> {
            self.events.send(Arc::new(event))
        }
    }

    fn default_player() -> (MockPlayer, Subscriber<PlayerEvent>) {
        let (tx, rx) = unbounded_channel();
        let mut player = MockPlayer::new();
        player.expect_subscribe().return_once(move || rx);
        player.expect_play().returning(|| ());
        player.expect_pause().returning(|| ());
        player.expect_seek().returning(|_| ());
        player.expect_set_volume().returning(|_| ());
        player.expect_set_rate().returning(|_| ());
        (player, tx)
    }

    fn new_instance(player: MockPlayer, fullscreen: Option<Arc<dyn FullscreenHandle>>, events: Subscriber<PlayerEvent>) -> TestInstance {
        let temp_dir = tempdir().unwrap();
        let store = PlayerStore::new(temp_dir.path().to_str().unwrap());
        let mut builder = PlaybackSession::builder()
            .store(store)
            .player(Arc::new(player));
        if let Some(handle) = fullscreen {
            builder = builder.fullscreen(handle);
        }

        TestInstance {
            session: builder.build(),
            events,
            _temp_dir: temp_dir,
        }
    }

    async fn await_event<P>(receiver: &mut Subscription<SessionEvent>, predicate: P) -> SessionEvent
    where
        P: Fn(&SessionEvent) -> bool,
    {
        await_event_within(receiver, Duration::from_secs(2), predicate).await
    }

    async fn await_event_within<P>(
        receiver: &mut Subscription<SessionEvent>,
        limit: Duration,
        predicate: P,
    ) -> SessionEvent
    where
        P: Fn(&SessionEvent) -> bool,
    {
        let deadline = Instant::now() + limit;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let event = timeout(remaining, receiver.recv())
                .await
                .expect("expected an event to have been invoked in time")
                .expect("expected the event channel to be open");
            if predicate(&event) {
                return (*event).clone();
            }
        }
    }

    async fn wait_for<F, Fut>(mut condition: F, message: &str)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("{}", message);
    }

    #[tokio::test]
    async fn test_load() {
        init_logger!();
        let (mut player, events) = default_player();
        player.expect_seek().times(1).withf(|time| *time == 0.0).returning(|_| ());
        player.expect_play().times(1).returning(|| ());
        let instance = new_instance(player, None, events);
        let session = &instance.session;

        let video = session
            .load(VIDEO_URL)
            .await
            .expect("expected the video to load");

        assert_eq!("My Trip 2024", video.title.as_str());
        assert_eq!(PlaybackState::Ready, session.playback_state().await);
        assert_eq!(Some(video), session.store().current_video().await);
        assert_eq!(true, session.store().is_playing().await);
    }

    #[tokio::test]
    async fn test_load_invalid_url() {
        init_logger!();
        let (player, events) = default_player();
        let instance = new_instance(player, None, events);
        let session = &instance.session;

        let result = session.load("not a url").await;

        assert!(result.is_err(), "expected the load to have failed");
        assert_eq!(PlaybackState::Empty, session.playback_state().await);
        assert_ne!(None, session.store().error().await);
    }

    #[tokio::test]
    async fn test_toggle_playback() {
        init_logger!();
        let (mut player, events) = default_player();
        player.expect_pause().times(1).returning(|| ());
        let instance = new_instance(player, None, events);
        let session = &instance.session;
        session.load(VIDEO_URL).await.unwrap();
        let mut receiver = session.subscribe();

        session.send(SessionCommand::TogglePlayback);
        await_event(&mut receiver, |e| {
            matches!(e, SessionEvent::StateChanged(PlaybackState::Paused))
        })
        .await;
        assert_eq!(false, session.store().is_playing().await);

        session.send(SessionCommand::TogglePlayback);
        await_event(&mut receiver, |e| {
            matches!(e, SessionEvent::StateChanged(PlaybackState::Playing))
        })
        .await;
        assert_eq!(true, session.store().is_playing().await);
    }

    #[tokio::test]
    async fn test_toggle_playback_without_video() {
        init_logger!();
        let (player, events) = default_player();
        let instance = new_instance(player, None, events);
        let session = &instance.session;

        session.send(SessionCommand::TogglePlayback);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(PlaybackState::Empty, session.playback_state().await);
        assert_eq!(false, session.store().is_playing().await);
    }

    #[tokio::test]
    async fn test_progress_write_throttling() {
        init_logger!();
        let (player, events) = default_player();
        let instance = new_instance(player, None, events);
        let session = &instance.session;
        session.load(VIDEO_URL).await.unwrap();
        let mut receiver = session.subscribe();

        instance
            .send_player_event(PlayerEvent::ProgressChanged { played_seconds: 0.4 })
            .unwrap();
        await_event(&mut receiver, |e| e == &SessionEvent::TimeChanged(0.4)).await;
        assert_eq!(
            None,
            session.store().positions().await.resume_position(VIDEO_URL),
            "expected progress below the write interval to not be persisted"
        );

        instance
            .send_player_event(PlayerEvent::ProgressChanged { played_seconds: 1.5 })
            .unwrap();
        await_event(&mut receiver, |e| e == &SessionEvent::TimeChanged(1.5)).await;
        assert_eq!(
            Some(1.5),
            session.store().positions().await.resume_position(VIDEO_URL)
        );

        instance
            .send_player_event(PlayerEvent::ProgressChanged { played_seconds: 2.0 })
            .unwrap();
        await_event(&mut receiver, |e| e == &SessionEvent::TimeChanged(2.0)).await;
        assert_eq!(
            Some(1.5),
            session.store().positions().await.resume_position(VIDEO_URL),
            "expected the persisted position to be throttled"
        );
    }

    #[tokio::test]
    async fn test_progress_transitions_ready_to_playing() {
        init_logger!();
        let (player, events) = default_player();
        let instance = new_instance(player, None, events);
        let session = &instance.session;
        session.load(VIDEO_URL).await.unwrap();
        let mut receiver = session.subscribe();

        instance
            .send_player_event(PlayerEvent::ProgressChanged { played_seconds: 0.2 })
            .unwrap();

        await_event(&mut receiver, |e| {
            matches!(e, SessionEvent::StateChanged(PlaybackState::Playing))
        })
        .await;
    }

    #[tokio::test]
    async fn test_seek_clamping() {
        init_logger!();
        let (player, events) = default_player();
        let instance = new_instance(player, None, events);
        let session = &instance.session;
        session.load(VIDEO_URL).await.unwrap();
        session.store().set_duration(100.0).await;
        let mut receiver = session.subscribe();

        session.send(SessionCommand::SeekTo(5.0));
        await_event(&mut receiver, |e| e == &SessionEvent::TimeChanged(5.0)).await;

        session.send(SessionCommand::SeekBy(-10.0));
        await_event(&mut receiver, |e| e == &SessionEvent::TimeChanged(0.0)).await;
        assert_eq!(0.0, session.store().current_time().await, "expected the backward seek to clamp at zero");

        session.send(SessionCommand::SeekTo(95.0));
        await_event(&mut receiver, |e| e == &SessionEvent::TimeChanged(95.0)).await;

        session.send(SessionCommand::SeekBy(LONG_SEEK_STEP_SECS));
        await_event(&mut receiver, |e| e == &SessionEvent::TimeChanged(100.0)).await;
        assert_eq!(100.0, session.store().current_time().await, "expected the forward seek to clamp at the duration");
    }

    #[tokio::test]
    async fn test_seek_queries_transport_duration_when_unknown() {
        init_logger!();
        let (mut player, events) = default_player();
        player.expect_duration().returning(|| Some(60.0));
        let instance = new_instance(player, None, events);
        let session = &instance.session;
        session.load(VIDEO_URL).await.unwrap();
        let mut receiver = session.subscribe();

        session.send(SessionCommand::SeekTo(90.0));

        await_event(&mut receiver, |e| e == &SessionEvent::TimeChanged(60.0)).await;
        assert_eq!(60.0, session.store().duration().await);
    }

    #[tokio::test]
    async fn test_scrub_commits_single_seek() {
        init_logger!();
        let (mut player, events) = default_player();
        // one seek for the load, one for the scrub commit
        player.expect_seek().times(2).returning(|_| ());
        let instance = new_instance(player, None, events);
        let session = &instance.session;
        session.load(VIDEO_URL).await.unwrap();
        session.store().set_duration(100.0).await;
        let mut receiver = session.subscribe();

        session.send(SessionCommand::ScrubStart);
        session.send(SessionCommand::ScrubMove(10.0));
        session.send(SessionCommand::ScrubMove(40.0));
        session.send(SessionCommand::ScrubEnd);

        await_event(&mut receiver, |e| e == &SessionEvent::TimeChanged(40.0)).await;
        assert_eq!(40.0, session.store().current_time().await);
        assert_eq!(
            Some(40.0),
            session.store().positions().await.resume_position(VIDEO_URL),
            "expected a single position write on scrub release"
        );
    }

    #[tokio::test]
    async fn test_buffering_indicator_debounce() {
        init_logger!();
        let (player, events) = default_player();
        let instance = new_instance(player, None, events);
        let session = &instance.session;
        session.load(VIDEO_URL).await.unwrap();
        let mut receiver = session.subscribe();

        let start = Instant::now();
        instance.send_player_event(PlayerEvent::BufferingStarted).unwrap();

        await_event(&mut receiver, |e| {
            matches!(e, SessionEvent::StateChanged(PlaybackState::Buffering))
        })
        .await;
        await_event(&mut receiver, |e| {
            e == &SessionEvent::BufferingIndicatorChanged(true)
        })
        .await;
        assert!(
            start.elapsed() >= Duration::from_millis(400),
            "expected the indicator to be debounced"
        );
        assert!(session.is_buffering_indicator_visible().await);

        instance.send_player_event(PlayerEvent::BufferingEnded).unwrap();
        await_event(&mut receiver, |e| {
            e == &SessionEvent::BufferingIndicatorChanged(false)
        })
        .await;
        await_event(&mut receiver, |e| {
            matches!(e, SessionEvent::StateChanged(PlaybackState::Playing))
        })
        .await;
    }

    #[tokio::test]
    async fn test_buffering_brief_stall_shows_no_indicator() {
        init_logger!();
        let (player, events) = default_player();
        let instance = new_instance(player, None, events);
        let session = &instance.session;
        session.load(VIDEO_URL).await.unwrap();

        instance.send_player_event(PlayerEvent::BufferingStarted).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        instance.send_player_event(PlayerEvent::BufferingEnded).unwrap();

        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(
            false,
            session.is_buffering_indicator_visible().await,
            "expected a brief stall to not show the indicator"
        );
        assert_eq!(PlaybackState::Playing, session.playback_state().await);
    }

    #[tokio::test]
    async fn test_transport_events_ignored_when_empty() {
        init_logger!();
        let (player, events) = default_player();
        let instance = new_instance(player, None, events);
        let session = &instance.session;

        instance
            .send_player_event(PlayerEvent::ProgressChanged { played_seconds: 5.0 })
            .unwrap();
        instance.send_player_event(PlayerEvent::BufferingStarted).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(PlaybackState::Empty, session.playback_state().await);
        assert!(session.store().positions().await.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_fullscreen() {
        init_logger!();
        let (player, events) = default_player();
        let mut handle = MockFullscreenHandle::new();
        handle
            .expect_request_fullscreen()
            .times(2)
            .returning(|active| {
                if active {
                    Ok(())
                } else {
                    Err(PlatformError::FullscreenRequestFailed("denied".to_string()))
                }
            });
        let instance = new_instance(player, Some(Arc::new(handle)), events);
        let session = &instance.session;
        let store = session.store().clone();

        session.send(SessionCommand::ToggleFullscreen);
        let assert_store = store.clone();
        wait_for(
            move || {
                let store = assert_store.clone();
                async move { store.is_fullscreen().await }
            },
            "expected the fullscreen flag to be set",
        )
        .await;

        // the platform rejection is logged only, the flag still toggles
        session.send(SessionCommand::ToggleFullscreen);
        let assert_store = store.clone();
        wait_for(
            move || {
                let store = assert_store.clone();
                async move { !store.is_fullscreen().await }
            },
            "expected the fullscreen flag to be cleared",
        )
        .await;
    }

    #[tokio::test]
    async fn test_fullscreen_reported_wins() {
        init_logger!();
        let (player, events) = default_player();
        let instance = new_instance(player, None, events);
        let session = &instance.session;
        let store = session.store().clone();

        session.send(SessionCommand::ToggleFullscreen);
        let assert_store = store.clone();
        wait_for(
            move || {
                let store = assert_store.clone();
                async move { store.is_fullscreen().await }
            },
            "expected the fullscreen flag to be set",
        )
        .await;

        // e.g. the user pressed the platform escape key
        session.send(SessionCommand::FullscreenReported(false));
        let assert_store = store.clone();
        wait_for(
            move || {
                let store = assert_store.clone();
                async move { !store.is_fullscreen().await }
            },
            "expected the platform status to win",
        )
        .await;
    }

    #[tokio::test]
    async fn test_toggle_mute_remembers_volume() {
        init_logger!();
        let (player, events) = default_player();
        let instance = new_instance(player, None, events);
        let session = &instance.session;
        let store = session.store().clone();

        session.send(SessionCommand::SetVolume(0.4));
        let assert_store = store.clone();
        wait_for(
            move || {
                let store = assert_store.clone();
                async move { store.volume().await == 0.4 }
            },
            "expected the volume to be updated",
        )
        .await;

        session.send(SessionCommand::ToggleMute);
        let assert_store = store.clone();
        wait_for(
            move || {
                let store = assert_store.clone();
                async move { store.volume().await == 0.0 }
            },
            "expected the volume to be muted",
        )
        .await;

        session.send(SessionCommand::ToggleMute);
        let assert_store = store.clone();
        wait_for(
            move || {
                let store = assert_store.clone();
                async move { store.volume().await == 0.4 }
            },
            "expected the remembered volume to be restored",
        )
        .await;
    }

    #[tokio::test]
    async fn test_set_rate_ignores_unsupported() {
        init_logger!();
        let (mut player, events) = default_player();
        player
            .expect_set_rate()
            .times(1)
            .withf(|rate| *rate == 1.5)
            .returning(|_| ());
        let instance = new_instance(player, None, events);
        let session = &instance.session;
        let store = session.store().clone();

        session.send(SessionCommand::SetRate(1.5));
        session.send(SessionCommand::SetRate(3.0));

        let assert_store = store.clone();
        wait_for(
            move || {
                let store = assert_store.clone();
                async move { store.playback_rate().await == 1.5 }
            },
            "expected the supported rate to be applied",
        )
        .await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(1.5, store.playback_rate().await);
    }

    #[tokio::test]
    async fn test_keyboard_control_events() {
        init_logger!();
        let (player, events) = default_player();
        let instance = new_instance(player, None, events);
        let session = &instance.session;
        session.load(VIDEO_URL).await.unwrap();
        session.store().set_duration(100.0).await;
        let mut receiver = session.subscribe();

        session.send(SessionCommand::Control(PlaybackControlEvent::Forward(10.0)));
        await_event(&mut receiver, |e| e == &SessionEvent::TimeChanged(10.0)).await;

        session.send(SessionCommand::Control(PlaybackControlEvent::Rewind(10.0)));
        await_event(&mut receiver, |e| e == &SessionEvent::TimeChanged(0.0)).await;

        session.send(SessionCommand::Control(
            PlaybackControlEvent::TogglePlaybackState,
        ));
        await_event(&mut receiver, |e| {
            matches!(e, SessionEvent::StateChanged(PlaybackState::Paused))
        })
        .await;
    }

    #[tokio::test]
    async fn test_reload_does_not_repeat_ready_event() {
        init_logger!();
        let (player, events) = default_player();
        let instance = new_instance(player, None, events);
        let session = &instance.session;
        session.load(VIDEO_URL).await.unwrap();
        let mut receiver = session.subscribe();

        session.load(VIDEO_URL).await.unwrap();
        session.send(SessionCommand::TogglePlayback);

        let event = await_event(&mut receiver, |e| {
            matches!(e, SessionEvent::StateChanged(_))
        })
        .await;
        assert_eq!(
            SessionEvent::StateChanged(PlaybackState::Paused),
            event,
            "expected the reload to not repeat the ready state event"
        );
    }

    #[tokio::test]
    async fn test_controls_hide_after_idle_while_playing() {
        init_logger!();
        let (player, events) = default_player();
        let instance = new_instance(player, None, events);
        let session = &instance.session;
        session.load(VIDEO_URL).await.unwrap();
        let mut receiver = session.subscribe();

        await_event_within(
            &mut receiver,
            CONTROLS_IDLE_TIMEOUT + Duration::from_secs(2),
            |e| e == &SessionEvent::ControlsVisibilityChanged(false),
        )
        .await;
        assert_eq!(false, session.is_controls_visible().await);

        session.send(SessionCommand::Activity);
        await_event(&mut receiver, |e| {
            e == &SessionEvent::ControlsVisibilityChanged(true)
        })
        .await;
        assert_eq!(true, session.is_controls_visible().await);
    }

    #[tokio::test]
    async fn test_controls_stay_visible_while_paused() {
        init_logger!();
        let (player, events) = default_player();
        let instance = new_instance(player, None, events);
        let session = &instance.session;
        session.load(VIDEO_URL).await.unwrap();
        let mut receiver = session.subscribe();
        session.send(SessionCommand::TogglePlayback);
        await_event(&mut receiver, |e| {
            matches!(e, SessionEvent::StateChanged(PlaybackState::Paused))
        })
        .await;

        tokio::time::sleep(CONTROLS_IDLE_TIMEOUT + Duration::from_millis(600)).await;

        assert_eq!(
            true,
            session.is_controls_visible().await,
            "expected the controls to stay visible while paused"
        );
    }
}
