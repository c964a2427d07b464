//! Session-scoped key/value storage backends.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage quota exceeded ({needed} bytes needed, {quota} allowed)")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// String key/value storage with the shape of the browser Storage API.
pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage that lives as long as the tab (the value).
///
/// Counts successful writes so callers can check for redundant storage churn.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    writes: usize,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes once keys and values exceed `bytes` in total
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    /// Number of successful `set_item` calls
    pub fn write_count(&self) -> usize {
        self.writes
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let needed = self.used_bytes_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Session file name in the storage directory
const SESSION_FILE: &str = "session.json";

/// Storage persisted as one JSON object in a directory, for native hosts
/// that have no browser session storage. Deleting the file ends the session.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
    items: HashMap<String, String>,
}

impl FileStorage {
    /// Open the storage in `dir`, loading any existing session file
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        let path = dir.join(SESSION_FILE);
        let items = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            HashMap::new()
        };
        Ok(Self { dir, items })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    /// Remove the session file and forget everything
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.items.clear();
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Write `items` to disk, then adopt them as the in-memory state.
    /// On failure memory keeps matching the file.
    fn commit(&mut self, items: HashMap<String, String>) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let contents = serde_json::to_string(&items)?;
        write_atomic(&self.path(), &contents)?;
        self.items = items;
        Ok(())
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), StorageError> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

impl SessionStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.clone();
        items.insert(key.to_string(), value.to_string());
        self.commit(items)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        if !self.items.contains_key(key) {
            return Ok(());
        }
        let mut items = self.items.clone();
        items.remove(key);
        self.commit(items)
    }
}
