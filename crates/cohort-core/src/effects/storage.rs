//! Durable key/value storage effect.
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `cohort-effects` (memory, filesystem)
//! - **Usage**: Enrollment record and prompt state persistence
//!
//! Values are opaque bytes; [`crate::state::PersistedState`] layers the typed
//! `get/set/clear` contract on top.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Storage operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum StorageError {
    /// Read failed
    #[error("Read failed: {0}")]
    ReadFailed(String),
    /// Write failed
    #[error("Write failed: {0}")]
    WriteFailed(String),
    /// Delete failed
    #[error("Delete failed: {0}")]
    DeleteFailed(String),
    /// Key rejected by the backend
    #[error("Invalid key: {reason}")]
    InvalidKey {
        /// Why the key was rejected
        reason: String,
    },
    /// Stored bytes did not decode as the requested type
    #[error("Corrupt value for {key}: {reason}")]
    Corrupt {
        /// Key that failed to decode
        key: String,
        /// Decoder message
        reason: String,
    },
}

/// Durable key/value store surviving process restarts.
#[async_trait]
pub trait StorageEffects: Send + Sync {
    /// Store a value, replacing any previous one.
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Retrieve a value, `None` when absent.
    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Remove a value, reporting whether one existed.
    async fn remove(&self, key: &str) -> Result<bool, StorageError>;

    /// List keys, optionally restricted to a prefix. Sorted.
    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError>;
}

/// Blanket implementation for Arc<T> where T: StorageEffects
#[async_trait]
impl<T: StorageEffects + ?Sized> StorageEffects for std::sync::Arc<T> {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        (**self).store(key, value).await
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).retrieve(key).await
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        (**self).remove(key).await
    }

    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
        (**self).list_keys(prefix).await
    }
}
