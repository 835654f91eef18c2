//! Periodic saving of the annotation store.

use super::{AnnotationPersistence, Storage};
use crate::annotation::PageAnnotationSet;
use crate::store::AnnotationStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Key holding the id of the last saved document.
pub const LAST_DOCUMENT_KEY: &str = "__last_document__";

/// Saves a document's annotations when dirty and the interval has elapsed.
pub struct AutoSaveManager<S: Storage> {
    persistence: AnnotationPersistence<S>,
    interval: Duration,
    last_save: Option<Instant>,
    dirty: bool,
    document_id: String,
}

impl<S: Storage> AutoSaveManager<S> {
    pub fn new(storage: Arc<S>, document_id: impl Into<String>) -> Self {
        Self {
            persistence: AnnotationPersistence::new(storage),
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            dirty: false,
            document_id: document_id.into(),
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Record that the store changed since the last save.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Switch to another document. Pending changes of the previous one are dropped.
    pub fn set_document_id(&mut self, id: impl Into<String>) {
        self.document_id = id.into();
        self.dirty = false;
        self.last_save = None;
    }

    pub fn should_save(&self) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save if dirty and due. Returns true if a save succeeded.
    pub async fn maybe_save(&mut self, store: &AnnotationStore) -> bool {
        if !self.should_save() {
            return false;
        }
        self.save(store).await
    }

    /// Save immediately. On failure the dirty flag stays set.
    pub async fn save(&mut self, store: &AnnotationStore) -> bool {
        if !self
            .persistence
            .save_annotations(&self.document_id, store.annotation_set())
            .await
        {
            return false;
        }
        if let Err(e) = self
            .persistence
            .storage()
            .save(LAST_DOCUMENT_KEY, self.document_id.as_bytes())
            .await
        {
            log::warn!("Failed to record last document: {}", e);
        }
        self.last_save = Some(Instant::now());
        self.dirty = false;
        log::debug!("Auto-saved annotations for {}", self.document_id);
        true
    }

    /// Load the current document's annotations into `store`.
    /// Returns false (leaving the store untouched) when nothing was restored.
    pub async fn restore(&mut self, store: &mut AnnotationStore) -> bool {
        match self.persistence.load_annotations(&self.document_id).await {
            Some(set) => {
                store.load_annotation_set(set);
                self.dirty = false;
                self.last_save = Some(Instant::now());
                true
            }
            None => false,
        }
    }

    /// Id and annotations of the last saved document, if any.
    pub async fn load_last(&mut self) -> Option<(String, PageAnnotationSet)> {
        let blob = match self.persistence.storage().load(LAST_DOCUMENT_KEY).await {
            Ok(blob) => blob?,
            Err(e) => {
                log::warn!("Failed to read last document key: {}", e);
                return None;
            }
        };
        let id = String::from_utf8(blob).ok()?;
        let set = self.persistence.load_annotations(&id).await?;
        self.set_document_id(id.clone());
        self.last_save = Some(Instant::now());
        Some((id, set))
    }

    pub fn persistence(&self) -> &AnnotationPersistence<S> {
        &self.persistence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Stroke;
    use crate::storage::MemoryStorage;
    use kurbo::Point;
    use pollster::block_on;

    fn store_with_stroke() -> AnnotationStore {
        let mut store = AnnotationStore::new();
        store.add_stroke(1, Stroke::from_points(vec![Point::ZERO, Point::new(4.0, 4.0)]));
        store
    }

    #[test]
    fn test_autosave_manager_creation() {
        let manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()), "doc");
        assert!(!manager.is_dirty());
        assert!(!manager.should_save());
    }

    #[test]
    fn test_autosave_dirty_flag() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()), "doc");
        manager.mark_dirty();
        assert!(manager.should_save());
    }

    #[test]
    fn test_autosave_save_clears_dirty() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()), "doc");
        manager.mark_dirty();
        assert!(block_on(manager.maybe_save(&store_with_stroke())));
        assert!(!manager.is_dirty());
        assert!(!block_on(manager.maybe_save(&store_with_stroke())));
    }

    #[test]
    fn test_interval_gates_second_save() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()), "doc");
        manager.set_interval(Duration::from_secs(3600));
        manager.mark_dirty();
        assert!(block_on(manager.maybe_save(&store_with_stroke())));
        manager.mark_dirty();
        assert!(!manager.should_save());
    }

    #[test]
    fn test_restore_and_load_last() {
        let storage = Arc::new(MemoryStorage::new());
        let mut manager = AutoSaveManager::new(Arc::clone(&storage), "thesis.pdf");
        let store = store_with_stroke();
        block_on(manager.save(&store));

        let mut restored = AnnotationStore::new();
        let mut other = AutoSaveManager::new(Arc::clone(&storage), "thesis.pdf");
        assert!(block_on(other.restore(&mut restored)));
        assert_eq!(restored.annotation_set(), store.annotation_set());

        let mut fresh = AutoSaveManager::new(storage, "untitled");
        let (id, set) = block_on(fresh.load_last()).expect("last document");
        assert_eq!(id, "thesis.pdf");
        assert_eq!(fresh.document_id(), "thesis.pdf");
        assert_eq!(&set, store.annotation_set());
    }
}
