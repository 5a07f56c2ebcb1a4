//! Record store abstraction
//!
//! One opaque string value per key. Backends must keep absence and I/O
//! failure distinct: `get` returns `Ok(None)` for a missing key and `Err`
//! only for a real storage fault.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid record key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist `value` under `key`, overwriting any prior value.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Fetch the value stored under `key`, or `None` when absent.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Test whether `key` holds a value.
    async fn has(&self, key: &str) -> StoreResult<bool>;

    /// Remove the entry under `key`, returning whether one existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;
}

/// Keys become file names in the durable backend, so they must not be able
/// to escape the storage root.
pub(crate) fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() || key.contains(['/', '\\']) || key.contains("..") {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

pub async fn create_store(config: &StorageConfig) -> StoreResult<Arc<dyn RecordStore>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageBackend::File => Ok(Arc::new(FileStore::new(&config.root).await?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_plain_ids() {
        assert!(validate_key("a1B2c3D4").is_ok());
        assert!(validate_key("ticket-42").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(matches!(validate_key(""), Err(StoreError::InvalidKey(_))));
        assert!(matches!(validate_key("../etc"), Err(StoreError::InvalidKey(_))));
        assert!(matches!(validate_key("a/b"), Err(StoreError::InvalidKey(_))));
        assert!(matches!(validate_key("a\\b"), Err(StoreError::InvalidKey(_))));
    }
}
