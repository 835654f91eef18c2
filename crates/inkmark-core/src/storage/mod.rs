//! Blob storage used to persist annotation sets and sketches.

mod autosave;
mod file;
mod memory;
mod persistence;

pub use autosave::{AutoSaveManager, DEFAULT_AUTOSAVE_INTERVAL_SECS, LAST_DOCUMENT_KEY};
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use persistence::{AnnotationPersistence, annotations_key, sketch_key};

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Opaque key/value blob store.
///
/// Keys are free-form strings; values are raw bytes the store never inspects.
pub trait Storage: Send + Sync {
    /// Store a blob, replacing any previous value.
    fn save(&self, key: &str, blob: &[u8]) -> BoxFuture<'_, StorageResult<()>>;

    /// Fetch a blob; `None` when the key is unknown.
    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<Vec<u8>>>>;

    /// Every stored blob, in no particular order.
    fn list_all(&self) -> BoxFuture<'_, StorageResult<Vec<Vec<u8>>>>;

    /// Remove a blob. Deleting an unknown key is not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;
}
