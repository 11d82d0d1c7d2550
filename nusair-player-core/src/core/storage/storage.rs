use std::fmt::Debug;
use std::fs;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use log::{debug, trace, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::core::storage;
use crate::core::storage::StorageError;

/// The storage module is responsible for storing and retrieving the player state files
/// from the file system.
///
/// The `Storage` struct is thread-safe and can be safely shared across multiple threads.
#[derive(Debug, Clone)]
pub struct Storage {
    base_path: PathBuf,
}

impl Storage {
    /// Creates a new instance of `StorageOptions` for configuring storage operations.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use nusair_player_core::core::storage::Storage;
    ///
    /// let storage = Storage::from("/path/to/storage");
    /// let serializer = storage.options().serializer("player-state.json");
    /// ```
    pub fn options(&self) -> StorageOptions {
        StorageOptions::new(self.base_path.clone())
    }
}

impl From<&str> for Storage {
    fn from(value: &str) -> Self {
        Self {
            base_path: PathBuf::from(value),
        }
    }
}

impl From<&PathBuf> for Storage {
    fn from(value: &PathBuf) -> Self {
        Self {
            base_path: value.clone(),
        }
    }
}

/// Options for configuring storage behavior.
#[derive(Debug)]
pub struct StorageOptions {
    path: PathBuf,
    make_dirs: bool,
}

impl StorageOptions {
    fn new<P: AsRef<Path>>(initial_path: P) -> Self {
        Self {
            path: PathBuf::from(initial_path.as_ref()),
            make_dirs: true,
        }
    }

    /// Appends a directory to the storage path.
    pub fn directory(mut self, directory: &str) -> Self {
        self.path = self.path.join(directory);
        self
    }

    /// Sets whether the parent directories of the file should be created when writing.
    pub fn make_dirs(mut self, make_dirs: bool) -> Self {
        self.make_dirs = make_dirs;
        self
    }

    /// Creates a `Serializer` storage instance with the provided filename.
    pub fn serializer<F: AsRef<str>>(self, filename: F) -> SerializerStorage {
        SerializerStorage {
            base: BaseStorage {
                path: self.path.join(filename.as_ref()),
                make_dirs: self.make_dirs,
            },
        }
    }
}

/// Base storage information for a file.
#[derive(Debug)]
struct BaseStorage {
    path: PathBuf,
    make_dirs: bool,
}

impl BaseStorage {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn absolute_path(&self) -> &str {
        self.path.to_str().expect("expected a valid utf-8 path")
    }

    fn read_open(&self) -> storage::Result<File> {
        trace!("Opening storage file {}", self.absolute_path());
        OpenOptions::new()
            .read(true)
            .open(self.path.as_path())
            .map_err(|e| {
                let absolute_path = self.absolute_path();
                trace!("File {} couldn't be opened, {}", absolute_path, e);

                if e.kind() == ErrorKind::NotFound {
                    StorageError::NotFound(absolute_path.to_string())
                } else {
                    StorageError::ReadingFailed(absolute_path.to_string(), e.to_string())
                }
            })
    }

    async fn write_open_async(&self) -> storage::Result<tokio::fs::File> {
        self.create_parent_directories_if_needed()?;

        trace!("Opening storage file {}", self.absolute_path());
        tokio::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(self.path.as_path())
            .await
            .map_err(|e| {
                let absolute_path = self.absolute_path();
                trace!("File {} couldn't be opened, {}", absolute_path, e);
                StorageError::WritingFailed(absolute_path.to_string(), e.to_string())
            })
    }

    fn create_parent_directories_if_needed(&self) -> storage::Result<()> {
        if self.make_dirs {
            let parent = self
                .path
                .parent()
                .expect("expected a parent directory to have been present for the file");
            let parent_absolute_path = parent.to_str().expect("expected a valid utf-8 path");
            trace!("Creating parent directories {}", parent_absolute_path);
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Failed to create parent directories, {}", e);
                return Err(StorageError::WritingFailed(
                    parent_absolute_path.to_string(),
                    e.to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Storage for serializing and deserializing data.
#[derive(Debug)]
pub struct SerializerStorage {
    base: BaseStorage,
}

impl SerializerStorage {
    /// Checks if the storage file exists.
    pub fn exists(&self) -> bool {
        self.base.exists()
    }

    /// Reads the stored data from the storage file.
    ///
    /// It returns the deserialized data if successful, or a [StorageError] when reading failed.
    pub fn read<T>(self) -> storage::Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut file = self.base.read_open()?;

        trace!("Storage file {} exists", self.base.absolute_path());
        let mut data = String::new();
        file.read_to_string(&mut data).map_err(|e| {
            StorageError::ReadingFailed(self.base.absolute_path().to_string(), e.to_string())
        })?;

        match serde_json::from_str::<T>(data.as_str()) {
            Ok(e) => {
                debug!("File {} has been loaded", self.base.absolute_path());
                Ok(e)
            }
            Err(e) => {
                debug!("File {} is invalid, {}", self.base.absolute_path(), &e);
                Err(StorageError::ReadingFailed(
                    self.base.absolute_path().to_string(),
                    e.to_string(),
                ))
            }
        }
    }

    /// Writes the given value to the storage file.
    ///
    /// It returns the path of the storage file if successful, or a [StorageError] when writing failed.
    pub async fn write_async<T>(self, value: &T) -> storage::Result<PathBuf>
    where
        T: Serialize + DeserializeOwned,
    {
        let display_path = self.base.absolute_path().to_string();

        trace!("Serializing storage data to {}", display_path);
        match serde_json::to_string(value) {
            Ok(e) => {
                let mut file = self.base.write_open_async().await?;
                trace!("Writing to storage {}, {}", display_path, &e);
                file.write_all(e.as_bytes())
                    .await
                    .map_err(|e| StorageError::WritingFailed(display_path.clone(), e.to_string()))?;
                debug!("Storage file {} has been saved", display_path);
                Ok(self.base.path.clone())
            }
            Err(e) => Err(StorageError::WritingFailed(display_path, e.to_string())),
        }
    }
}
