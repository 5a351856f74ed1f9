//! Durable key-value storage for progression and settings.
//!
//! Two independent records live under fixed keys. Writes are synchronous:
//! they complete or fail before the calling engine operation returns.

use crate::state::ProgressionState;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Storage key for the progression record.
pub const SAVE_KEY: &str = "ruang-hampa-save";

/// Storage key for the settings record.
pub const SETTINGS_KEY: &str = "ruang-hampa-settings";

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage quota exceeded")]
    QuotaExceeded,
}

/// Errors from writing a record.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from reading the progression record. Every variant means
/// "no usable save".
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("No saved game")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Malformed save: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Saved node \"{0}\" does not exist in the story")]
    UnknownNode(String),

    #[error("Saved {field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("Saved keepsake \"{0}\" appears more than once")]
    DuplicateKeepsake(String),
}

// ============================================================================
// Storage Providers
// ============================================================================

/// A durable string-keyed store.
pub trait StorageProvider: Send + Sync {
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Returns `Ok(None)` if nothing is stored under `key`.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Existence check without reading the value.
    fn contains(&self, key: &str) -> bool {
        matches!(self.load(key), Ok(Some(_)))
    }
}

/// One `<key>.json` file per record inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a file store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform data directory for the game, if one can be determined.
    pub fn default_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("id", "hampa", "ruang-hampa")
            .map(|dirs| dirs.data_dir().to_path_buf())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let sanitized = key
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect::<String>();
        self.dir.join(format!("{sanitized}.json"))
    }
}

impl StorageProvider for FileStorage {
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;

        // Write beside the target and rename so a crash never leaves half a record.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }
}

/// In-process store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: Arc<RwLock<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total stored bytes; writes past it fail with `QuotaExceeded`.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Seed a raw record, bypassing the quota.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.records.write().insert(key.into(), value.into());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.records.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl StorageProvider for MemoryStorage {
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut records = self.records.write();

        if let Some(quota) = self.quota {
            let others: usize = records
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            if others + value.len() > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }

        records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.records.read().get(key).cloned())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.records.write().remove(key);
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.records.read().contains_key(key)
    }
}

// ============================================================================
// Record Helpers
// ============================================================================

/// Serialize `value` and write it under `key`.
pub fn write_record<T: Serialize>(
    storage: &dyn StorageProvider,
    key: &str,
    value: &T,
) -> Result<(), PersistError> {
    let content = serde_json::to_string(value)?;
    storage.save(key, &content)?;
    Ok(())
}

/// Read and deserialize the record under `key`, if present.
pub fn read_record<T: DeserializeOwned>(
    storage: &dyn StorageProvider,
    key: &str,
) -> Result<Option<T>, LoadError> {
    match storage.load(key)? {
        Some(content) => Ok(Some(serde_json::from_str(&content)?)),
        None => Ok(None),
    }
}

/// Read the progression record, checking the node key before trusting the rest.
///
/// `is_known_node` decides whether the saved node id still exists. Nothing is
/// repaired: an unknown node, an out-of-range value or a repeated keepsake
/// rejects the whole record.
pub fn read_progression(
    storage: &dyn StorageProvider,
    is_known_node: impl Fn(&str) -> bool,
) -> Result<ProgressionState, LoadError> {
    let content = storage.load(SAVE_KEY)?.ok_or(LoadError::NotFound)?;

    // Parse just enough to check the node key
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Partial {
        current_node_id: String,
    }

    let partial: Partial = serde_json::from_str(&content)?;
    if !is_known_node(&partial.current_node_id) {
        return Err(LoadError::UnknownNode(partial.current_node_id));
    }

    let state: ProgressionState = serde_json::from_str(&content)?;
    if let Some((field, value)) = state.out_of_range_field() {
        return Err(LoadError::OutOfRange { field, value });
    }
    if let Some(name) = state.duplicate_keepsake() {
        return Err(LoadError::DuplicateKeepsake(name.to_string()));
    }

    Ok(state)
}
