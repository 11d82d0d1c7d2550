use thiserror::Error;

/// The result type for media actions.
pub type Result<T> = std::result::Result<T, MediaError>;

/// The errors which are thrown by the media package.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MediaError {
    /// The given input couldn't be validated as a playable video reference.
    #[error("{0} is not a valid video url")]
    InvalidUrl(String),
}
