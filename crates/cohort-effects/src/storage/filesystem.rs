//! Filesystem-backed storage handler.
//!
//! One file per key, `<base>/<key>.dat`. Study keys are flat (`study.*`), so
//! keys containing path separators are rejected rather than mapped onto
//! subdirectories.

use async_trait::async_trait;
use cohort_core::effects::{StorageEffects, StorageError};
use std::path::{Path, PathBuf};
use tokio::fs;

const EXTENSION: &str = "dat";

/// Filesystem-based storage handler for production use
#[derive(Debug, Clone)]
pub struct FilesystemStorageHandler {
    /// Base directory for storage files
    base_path: PathBuf,
}

impl FilesystemStorageHandler {
    /// Create a new filesystem storage handler
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Base directory.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn file_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                reason: "Key cannot be empty".to_string(),
            });
        }
        if key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(StorageError::InvalidKey {
                reason: format!("Key '{key}' is not a flat file name"),
            });
        }
        Ok(self.base_path.join(format!("{key}.{EXTENSION}")))
    }
}

#[async_trait]
impl StorageEffects for FilesystemStorageHandler {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let file_path = self.file_for(key)?;
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create directory: {e}"))
        })?;

        // Write-then-rename so a crash never leaves a truncated value
        let tmp_path = file_path.with_extension("tmp");
        fs::write(&tmp_path, value)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("Failed to write file: {e}")))?;
        fs::rename(&tmp_path, &file_path)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("Failed to replace file: {e}")))?;
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let file_path = self.file_for(key)?;
        match fs::read(&file_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed(format!(
                "Failed to read file: {e}"
            ))),
        }
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let file_path = self.file_for(key)?;
        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to remove file: {e}"
            ))),
        }
    }

    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::ReadFailed(format!(
                    "Failed to read directory: {e}"
                )))
            }
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to read directory entry: {e}"))
        })? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if prefix.map_or(true, |p| key.starts_with(p)) {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_survive_a_new_handler() {
        let dir = tempfile::tempdir().unwrap();
        let first = FilesystemStorageHandler::new(dir.path());
        first
            .store("study.variation", b"\"control\"".to_vec())
            .await
            .unwrap();

        let second = FilesystemStorageHandler::new(dir.path());
        assert_eq!(
            second.retrieve("study.variation").await.unwrap(),
            Some(b"\"control\"".to_vec())
        );
    }

    #[tokio::test]
    async fn missing_directory_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStorageHandler::new(dir.path().join("absent"));
        assert_eq!(store.retrieve("study.expireAt").await.unwrap(), None);
        assert!(store.list_keys(None).await.unwrap().is_empty());
        assert!(!store.remove("study.expireAt").await.unwrap());
    }

    #[tokio::test]
    async fn list_keys_strips_extension_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStorageHandler::new(dir.path());
        store.store("study.variation", vec![1]).await.unwrap();
        store.store("study.apiEnabled", vec![1]).await.unwrap();
        store.store("unrelated", vec![1]).await.unwrap();
        assert_eq!(
            store.list_keys(Some("study.")).await.unwrap(),
            vec!["study.apiEnabled".to_string(), "study.variation".to_string()]
        );
    }

    #[tokio::test]
    async fn path_like_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemStorageHandler::new(dir.path());
        assert!(matches!(
            store.store("../escape", vec![]).await,
            Err(StorageError::InvalidKey { .. })
        ));
    }
}
