//! File-based blob storage.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};

const BLOB_EXTENSION: &str = "blob";

/// File name stem for a key: `[a-z0-9-]` bytes pass through, every other
/// byte becomes `_xx`. Distinct keys never share a file, even on
/// case-insensitive file systems.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'0'..=b'9' | b'-' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("_{:02x}", byte)),
        }
    }
    encoded
}

/// Stores each blob as one file in a base directory.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// File storage under the platform's local data directory (`.../inkmark/`).
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("inkmark"))
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.{}", encode_key(key), BLOB_EXTENSION))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn save(&self, key: &str, blob: &[u8]) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.blob_path(key);
        let blob = blob.to_vec();
        Box::pin(async move {
            fs::write(&path, blob)
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<Vec<u8>>>> {
        let path = self.blob_path(key);
        Box::pin(async move {
            if !path.exists() {
                return Ok(None);
            }
            fs::read(&path)
                .map(Some)
                .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))
        })
    }

    fn list_all(&self) -> BoxFuture<'_, StorageResult<Vec<Vec<u8>>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }
            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut blobs = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|e| e == BLOB_EXTENSION) {
                    let blob = fs::read(&path).map_err(|e| {
                        StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
                    })?;
                    blobs.push(blob);
                }
            }
            Ok(blobs)
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.blob_path(key);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }
}
