use std::fmt::Debug;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// The result type for platform actions.
pub type Result<T> = std::result::Result<T, PlatformError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlatformError {
    /// The platform rejected the fullscreen request.
    #[error("fullscreen request failed, {0}")]
    FullscreenRequestFailed(String),
}

/// The handle into the platform's fullscreen api for the playback surface.
///
/// Requests are asynchronous and best effort; the session logs failures without
/// surfacing them to the user. The platform remains the source of truth for the
/// actual fullscreen status, which it reports back through
/// [crate::SessionCommand::FullscreenReported].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FullscreenHandle: Debug + Send + Sync {
    /// Request the platform to enter or exit fullscreen mode.
    async fn request_fullscreen(&self, active: bool) -> Result<()>;
}
