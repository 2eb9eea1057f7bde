/// Key-value persistence
///
/// The client keeps its session and, in fallback mode, its whole dataset in a
/// flat key-value store holding JSON strings. [`FileStore`] writes one file
/// per key under the data directory; [`MemoryStore`] keeps everything in
/// memory for tests and throwaway sessions.
///
/// # Keys
///
/// | key                   | value                         |
/// |-----------------------|-------------------------------|
/// | `token`               | bearer token (JSON string)    |
/// | `user`                | signed-in user                |
/// | `musicEventUsers`     | fallback users with digests   |
/// | `musicEventEvents`    | fallback events               |
/// | `musicEventBookings`  | fallback bookings             |
/// | `musicEventContracts` | fallback contracts            |

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::NamedTempFile;

use crate::config::ClientConfig;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const USERS_KEY: &str = "musicEventUsers";
pub const EVENTS_KEY: &str = "musicEventEvents";
pub const BOOKINGS_KEY: &str = "musicEventBookings";
pub const CONTRACTS_KEY: &str = "musicEventContracts";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt data under {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Flat string store
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Shared handle to a store
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Opens the file store under the configured data directory
pub fn open(config: &ClientConfig) -> Result<SharedStore, StorageError> {
    Ok(Arc::new(FileStore::new(&config.data_dir)?))
}

/// Reads and decodes the JSON value under `key`
pub fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Encodes `value` as JSON under `key`
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Corrupt {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

/// One JSON file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Uses `dir`, creating it if needed
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)?) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    /// Writes to a temporary file in the data directory and renames it over
    /// the old value, so a failed write never leaves a truncated file behind.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path(key)?;
        let io_error = |source: std::io::Error| StorageError::Io {
            key: key.to_string(),
            source,
        };

        let mut file = NamedTempFile::new_in(&self.dir).map_err(io_error)?;
        file.write_all(value.as_bytes()).map_err(io_error)?;
        file.as_file().sync_all().map_err(io_error)?;
        file.persist(&path).map_err(|e| io_error(e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}
