use derive_more::Display;

/// Control events for the playback session, triggered by user input surfaces
/// such as keyboard shortcuts or the transport control bar.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum PlaybackControlEvent {
    /// Toggle between playing and paused.
    #[display("Toggle the playback state")]
    TogglePlaybackState,
    /// Seek forward by the given amount of seconds.
    #[display("Forward media by {_0} seconds")]
    Forward(f64),
    /// Seek backward by the given amount of seconds.
    #[display("Rewind media by {_0} seconds")]
    Rewind(f64),
    /// Toggle the fullscreen mode of the playback surface.
    #[display("Toggle fullscreen")]
    ToggleFullscreen,
    /// Toggle between muted and the remembered volume.
    #[display("Toggle mute")]
    ToggleMute,
}
