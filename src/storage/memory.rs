use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{validate_key, RecordStore, StoreResult};

/// In-memory record store. Interchangeable with [`super::FileStore`]; used
/// for tests and ephemeral development runs.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        validate_key(key)?;
        self.records
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        validate_key(key)?;
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn has(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        Ok(self.records.read().await.contains_key(key))
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        Ok(self.records.write().await.remove(key).is_some())
    }
}
