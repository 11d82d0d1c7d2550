use thiserror::Error;

/// The result type for storage actions.
pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(PartialEq, Debug, Error)]
pub enum StorageError {
    /// The given file couldn't be found within the storage.
    #[error("file {0} not found")]
    NotFound(String),
    /// The given file contains invalid data and couldn't be read.
    #[error("file {0} is corrupt and cannot be read, {1}")]
    ReadingFailed(String, String),
    /// The given file path couldn't be written.
    #[error("failed to write to {0}, {1}")]
    WritingFailed(String, String),
}
