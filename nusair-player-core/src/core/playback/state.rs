use derive_more::Display;

/// The playback state of the current session.
///
/// The state is an explicit tagged value so that invalid combinations, such as
/// buffering without a loaded video, can't be represented by the session.
#[derive(Debug, Clone, Copy, Display, PartialEq, Eq)]
pub enum PlaybackState {
    /// No video has been loaded into the session.
    Empty,
    /// A video has been loaded, the transport hasn't reported any activity yet.
    Ready,
    /// The transport is playing the current video.
    Playing,
    /// The playback of the current video has been paused.
    Paused,
    /// The transport reported that it is buffering media data.
    Buffering,
}

impl PlaybackState {
    /// Verify if the state has a loaded video.
    pub fn is_active(&self) -> bool {
        *self != PlaybackState::Empty
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::Empty
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_is_active() {
        assert!(!PlaybackState::Empty.is_active());
        assert!(PlaybackState::Ready.is_active());
        assert!(PlaybackState::Playing.is_active());
        assert!(PlaybackState::Paused.is_active());
        assert!(PlaybackState::Buffering.is_active());
    }
}
