use std::time::{Duration, Instant};

/// The idle timeout after which the control surface is hidden.
pub const CONTROLS_IDLE_TIMEOUT: Duration = Duration::from_secs(5);
/// The window within which a second clear-history request confirms the action.
pub const CLEAR_CONFIRM_WINDOW: Duration = Duration::from_secs(3);

/// Tracks the user activity for the auto-hiding control surface.
///
/// Each activity resets the idle timer (debounce, not throttle); pinning the
/// controls, e.g. while paused or buffering, is handled by the caller.
#[derive(Debug)]
pub struct ControlsTracker {
    last_activity: Instant,
}

impl ControlsTracker {
    pub fn new(now: Instant) -> Self {
        Self { last_activity: now }
    }

    /// Register user activity, resetting the idle timer.
    pub fn activity(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Verify if the controls should be visible at the given moment.
    pub fn is_visible(&self, now: Instant) -> bool {
        now.duration_since(self.last_activity) < CONTROLS_IDLE_TIMEOUT
    }
}

impl Default for ControlsTracker {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

/// The two-click confirmation for clearing the watch history.
///
/// The first request arms the confirmation; a second request within
/// [CLEAR_CONFIRM_WINDOW] confirms it, after which the pending request
/// automatically reverts.
#[derive(Debug, Default)]
pub struct ClearConfirm {
    requested_at: Option<Instant>,
}

impl ClearConfirm {
    /// Register a clear request at the given moment.
    ///
    /// It returns `true` when the request confirms a previously armed request
    /// within the confirmation window.
    pub fn request(&mut self, now: Instant) -> bool {
        match self.requested_at.take() {
            Some(requested_at)
                if now.duration_since(requested_at) <= CLEAR_CONFIRM_WINDOW =>
            {
                true
            }
            _ => {
                self.requested_at = Some(now);
                false
            }
        }
    }

    /// Verify if a confirmation is currently pending at the given moment.
    pub fn is_pending(&self, now: Instant) -> bool {
        self.requested_at
            .map(|e| now.duration_since(e) <= CLEAR_CONFIRM_WINDOW)
            .unwrap_or(false)
    }

    /// Revert any pending confirmation.
    pub fn reset(&mut self) {
        self.requested_at = None;
    }
}
