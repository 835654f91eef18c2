//! Typed persistence of annotation sets and sketches on top of a blob store.

use super::Storage;
use crate::annotation::PageAnnotationSet;
use crate::interchange::SketchRecord;
use std::sync::Arc;

/// Storage key of a document's annotation set.
pub fn annotations_key(document_id: &str) -> String {
    format!("annotations:{}", document_id)
}

/// Storage key of a sketch record.
pub fn sketch_key(sketch_id: &str) -> String {
    format!("sketch:{}", sketch_id)
}

/// Saves and restores annotations through a [`Storage`] backend.
///
/// Failures are logged and reported as `false`/`None`; nothing here touches
/// the caller's in-memory state.
pub struct AnnotationPersistence<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> Clone for AnnotationPersistence<S> {
    fn clone(&self) -> Self {
        Self { storage: Arc::clone(&self.storage) }
    }
}

impl<S: Storage> AnnotationPersistence<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Persist a document's annotations. Returns whether the write succeeded.
    pub async fn save_annotations(&self, document_id: &str, annotations: &PageAnnotationSet) -> bool {
        let json = match annotations.to_json() {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize annotations for {}: {}", document_id, e);
                return false;
            }
        };
        match self.storage.save(&annotations_key(document_id), json.as_bytes()).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to save annotations for {}: {}", document_id, e);
                false
            }
        }
    }

    /// Restore a document's annotations, if any were saved and still parse.
    pub async fn load_annotations(&self, document_id: &str) -> Option<PageAnnotationSet> {
        let blob = match self.storage.load(&annotations_key(document_id)).await {
            Ok(blob) => blob?,
            Err(e) => {
                log::warn!("Failed to load annotations for {}: {}", document_id, e);
                return None;
            }
        };
        let parsed = std::str::from_utf8(&blob)
            .map_err(|e| e.to_string())
            .and_then(|json| PageAnnotationSet::from_json(json).map_err(|e| e.to_string()));
        match parsed {
            Ok(set) => Some(set),
            Err(e) => {
                log::warn!("Discarding unreadable annotations for {}: {}", document_id, e);
                None
            }
        }
    }

    pub async fn delete_annotations(&self, document_id: &str) -> bool {
        match self.storage.delete(&annotations_key(document_id)).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to delete annotations for {}: {}", document_id, e);
                false
            }
        }
    }

    pub async fn save_sketch(&self, sketch: &SketchRecord) -> bool {
        let json = match sketch.to_json() {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize sketch {}: {}", sketch.id, e);
                return false;
            }
        };
        match self.storage.save(&sketch_key(&sketch.id), json.as_bytes()).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to save sketch {}: {}", sketch.id, e);
                false
            }
        }
    }

    pub async fn load_sketch(&self, sketch_id: &str) -> Option<SketchRecord> {
        let blob = match self.storage.load(&sketch_key(sketch_id)).await {
            Ok(blob) => blob?,
            Err(e) => {
                log::warn!("Failed to load sketch {}: {}", sketch_id, e);
                return None;
            }
        };
        parse_sketch(&blob)
    }

    /// Every readable sketch in the store, newest first.
    ///
    /// Blobs that are not sketch records are skipped.
    pub async fn list_sketches(&self) -> Vec<SketchRecord> {
        let blobs = match self.storage.list_all().await {
            Ok(blobs) => blobs,
            Err(e) => {
                log::warn!("Failed to list stored sketches: {}", e);
                return Vec::new();
            }
        };
        let mut sketches: Vec<SketchRecord> = blobs.iter().filter_map(|b| parse_sketch(b)).collect();
        sketches.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sketches
    }

    pub async fn delete_sketch(&self, sketch_id: &str) -> bool {
        match self.storage.delete(&sketch_key(sketch_id)).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to delete sketch {}: {}", sketch_id, e);
                false
            }
        }
    }
}

fn parse_sketch(blob: &[u8]) -> Option<SketchRecord> {
    let json = std::str::from_utf8(blob).ok()?;
    match SketchRecord::from_json(json) {
        Ok(sketch) => Some(sketch),
        Err(e) => {
            log::debug!("Skipping non-sketch blob: {}", e);
            None
        }
    }
}
