use std::fmt::{Debug, Display};
#[cfg(any(test, feature = "testing"))]
use std::fmt::Formatter;

use async_trait::async_trait;
use derive_more::Display;
use fx_callback::Callback;
#[cfg(any(test, feature = "testing"))]
use fx_callback::{Subscriber, Subscription};
#[cfg(any(test, feature = "testing"))]
use mockall::mock;

/// The transport surface of the player backend.
///
/// Implementations wrap the opaque external component that actually decodes and
/// renders the media. The backend only drives it through these primitives and
/// reacts to its [PlayerEvent] callbacks; failures within the transport are
/// expected to be handled by the implementation itself.
#[async_trait]
pub trait Player: Debug + Display + Callback<PlayerEvent> + Send + Sync {
    /// Start or resume the playback of the current media.
    async fn play(&self);

    /// Pause the playback of the current media.
    async fn pause(&self);

    /// Seek to the given time, in seconds, within the current media.
    async fn seek(&self, time: f64);

    /// Update the volume of the player, as a value within `[0, 1]`.
    async fn set_volume(&self, volume: f32);

    /// Update the playback rate of the player.
    async fn set_rate(&self, rate: f32);

    /// Get the duration of the current media in seconds.
    ///
    /// It returns [None] when the media metadata hasn't been resolved yet.
    async fn duration(&self) -> Option<f64>;
}

/// The events emitted by the transport surface.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum PlayerEvent {
    /// Invoked at a bounded interval while the media is playing.
    #[display("Playback progressed to {played_seconds} seconds")]
    ProgressChanged {
        /// The current playback position in seconds.
        played_seconds: f64,
    },
    /// Invoked once the media metadata has been resolved.
    #[display("Media duration resolved to {_0} seconds")]
    DurationChanged(f64),
    /// Invoked when the transport starts buffering media data.
    #[display("Buffering started")]
    BufferingStarted,
    /// Invoked when the transport stops buffering media data.
    #[display("Buffering ended")]
    BufferingEnded,
}

#[cfg(any(test, feature = "testing"))]
mock! {
    #[derive(Debug)]
    pub Player {}

    #[async_trait]
    impl Player for Player {
        async fn play(&self);
        async fn pause(&self);
        async fn seek(&self, time: f64);
        async fn set_volume(&self, volume: f32);
        async fn set_rate(&self, rate: f32);
        async fn duration(&self) -> Option<f64>;
    }

    impl Callback<PlayerEvent> for Player {
        fn subscribe(&self) -> Subscription<PlayerEvent>;
        fn subscribe_with(&self, subscriber: Subscriber<PlayerEvent>);
    }
}

#[cfg(any(test, feature = "testing"))]
impl Display for MockPlayer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockPlayer")
    }
}
