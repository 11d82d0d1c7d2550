use nusair_player_core::core::playback::PlaybackControlEvent;

/// The amount of seconds used by the arrow key seek shortcuts.
pub const SEEK_STEP_SECS: f64 = 10.0;

/// A key press received from the user input surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Space,
    ArrowLeft,
    ArrowRight,
    Character(char),
}

/// Map the given key press onto a playback control event.
///
/// It returns [None] for unmapped keys, or when `is_typing` indicates that the
/// focus is currently inside a text input, in which case all shortcuts are
/// suppressed.
pub fn map_key(key: &Key, is_typing: bool) -> Option<PlaybackControlEvent> {
    if is_typing {
        return None;
    }

    match key {
        Key::Space => Some(PlaybackControlEvent::TogglePlaybackState),
        Key::ArrowRight => Some(PlaybackControlEvent::Forward(SEEK_STEP_SECS)),
        Key::ArrowLeft => Some(PlaybackControlEvent::Rewind(SEEK_STEP_SECS)),
        Key::Character('f') => Some(PlaybackControlEvent::ToggleFullscreen),
        Key::Character('m') => Some(PlaybackControlEvent::ToggleMute),
        Key::Character(_) => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_map_key() {
        assert_eq!(
            Some(PlaybackControlEvent::TogglePlaybackState),
            map_key(&Key::Space, false)
        );
        assert_eq!(
            Some(PlaybackControlEvent::Forward(10.0)),
            map_key(&Key::ArrowRight, false)
        );
        assert_eq!(
            Some(PlaybackControlEvent::Rewind(10.0)),
            map_key(&Key::ArrowLeft, false)
        );
        assert_eq!(
            Some(PlaybackControlEvent::ToggleFullscreen),
            map_key(&Key::Character('f'), false)
        );
        assert_eq!(
            Some(PlaybackControlEvent::ToggleMute),
            map_key(&Key::Character('m'), false)
        );
    }

    #[test]
    fn test_map_key_unmapped() {
        assert_eq!(None, map_key(&Key::Character('x'), false));
        assert_eq!(None, map_key(&Key::Character('F'), false));
    }

    #[test]
    fn test_map_key_suppressed_while_typing() {
        assert_eq!(None, map_key(&Key::Space, true));
        assert_eq!(None, map_key(&Key::Character('m'), true));
    }
}
