//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory blob storage for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn save(&self, key: &str, blob: &[u8]) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let blob = blob.to_vec();
        Box::pin(async move {
            let mut blobs = self.blobs.write().map_err(lock_error)?;
            blobs.insert(key, blob);
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<Vec<u8>>>> {
        let key = key.to_string();
        Box::pin(async move {
            let blobs = self.blobs.read().map_err(lock_error)?;
            Ok(blobs.get(&key).cloned())
        })
    }

    fn list_all(&self) -> BoxFuture<'_, StorageResult<Vec<Vec<u8>>>> {
        Box::pin(async move {
            let blobs = self.blobs.read().map_err(lock_error)?;
            Ok(blobs.values().cloned().collect())
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut blobs = self.blobs.write().map_err(lock_error)?;
            blobs.remove(&key);
            Ok(())
        })
    }
}
