//! Key-value persistence for the workspace blob and small flags.
//!
//! Every value is replaced whole; there is no partial-field write.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

pub const STORAGE_KEY: &str = "resume-storage";
pub const ONBOARDED_KEY: &str = "hasOnboarded";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid key: {0:?}")]
    InvalidKey(String),
}

impl StorageError {
    fn io(key: &str, source: io::Error) -> Self {
        Self::Io {
            key: key.to_string(),
            source,
        }
    }
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removes every key or none of them.
    async fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError>;
}

// ────────────────────────────────────────────────────────────────────────────
// File store
// ────────────────────────────────────────────────────────────────────────────

/// One file per key under `root`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `data_dir/resume-studio`, or `./resume-studio` when the platform has no data dir.
    pub fn default_root() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("resume-studio");
        path
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::io(key, e))?;

        let temp = self.root.join(format!(".{key}.{}.tmp", Uuid::new_v4().simple()));
        if let Err(e) = tokio::fs::write(&temp, value).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(StorageError::io(key, e));
        }
        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(StorageError::io(key, e));
        }
        debug!(key, bytes = value.len(), "stored value");
        Ok(())
    }

    async fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        let paths = keys
            .iter()
            .map(|key| Ok((*key, self.path_for(key)?)))
            .collect::<Result<Vec<_>, StorageError>>()?;

        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();
        for (key, path) in paths {
            let trash = self.root.join(format!(".{key}.{}.trash", Uuid::new_v4().simple()));
            match tokio::fs::rename(&path, &trash).await {
                Ok(()) => staged.push((path, trash)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    // Put back what was already moved aside.
                    for (original, moved) in staged.into_iter().rev() {
                        if let Err(undo) = tokio::fs::rename(&moved, &original).await {
                            warn!(path = %original.display(), "failed to restore after aborted removal: {undo}");
                        }
                    }
                    return Err(StorageError::io(key, e));
                }
            }
        }
        for (_, trash) in staged {
            if let Err(e) = tokio::fs::remove_file(&trash).await {
                warn!(path = %trash.display(), "failed to delete removed value: {e}");
            }
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Memory store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut values = self.values();
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}
