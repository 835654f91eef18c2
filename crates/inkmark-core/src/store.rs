//! Per-page annotation store with undo/redo.

use crate::annotation::{PageAnnotationSet, PageAnnotations, Stroke, StrokeId, TextAnnotation, TextId};
use crate::capture::EraserSample;
use crate::classify::{ShapeClassifier, ShapeKind};
use crate::history::History;
use kurbo::Point;
use std::collections::HashMap;

/// Owns every committed stroke and text note.
///
/// Stroke mutations record a snapshot in the page's [`History`]. Histories
/// are local to a visit: activating a page starts it over from the page's
/// current content. Unknown pages behave as empty pages.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    annotations: PageAnnotationSet,
    histories: HashMap<u32, History<Vec<Stroke>>>,
    active_page: u32,
    shape_correction: Option<ShapeClassifier>,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationStore {
    /// Empty store with page 1 active.
    pub fn new() -> Self {
        Self::from_annotation_set(PageAnnotationSet::new())
    }

    /// Store over previously saved annotations.
    pub fn from_annotation_set(annotations: PageAnnotationSet) -> Self {
        let mut store = Self {
            annotations,
            histories: HashMap::new(),
            active_page: 1,
            shape_correction: None,
        };
        store.reset_history(1);
        store
    }

    /// Enable or disable shape correction for [`AnnotationStore::commit_drawn_stroke`].
    pub fn set_shape_correction(&mut self, classifier: Option<ShapeClassifier>) {
        self.shape_correction = classifier;
    }

    pub fn shape_correction(&self) -> Option<&ShapeClassifier> {
        self.shape_correction.as_ref()
    }

    pub fn active_page(&self) -> u32 {
        self.active_page
    }

    /// Switch pages. The outgoing page keeps its content but loses its
    /// history; the incoming page starts a single-entry history.
    pub fn set_active_page(&mut self, page_number: u32) {
        if page_number == self.active_page {
            return;
        }
        log::debug!("Switching active page {} -> {}", self.active_page, page_number);
        self.histories.remove(&self.active_page);
        self.active_page = page_number;
        self.reset_history(page_number);
    }

    fn reset_history(&mut self, page_number: u32) {
        let strokes = self.strokes(page_number).to_vec();
        self.histories.insert(page_number, History::new(strokes));
    }

    fn history_mut(&mut self, page_number: u32) -> &mut History<Vec<Stroke>> {
        let annotations = &self.annotations;
        self.histories.entry(page_number).or_insert_with(|| {
            History::new(
                annotations
                    .page(page_number)
                    .map(|p| p.strokes.clone())
                    .unwrap_or_default(),
            )
        })
    }

    /// Record the page's current strokes as a new history entry.
    fn commit(&mut self, page_number: u32) {
        let strokes = self.strokes(page_number).to_vec();
        self.history_mut(page_number).commit(strokes);
    }

    fn set_strokes(&mut self, page_number: u32, strokes: Vec<Stroke>) {
        self.annotations.page_mut(page_number).strokes = strokes;
    }

    /// Strokes of a page in paint order.
    pub fn strokes(&self, page_number: u32) -> &[Stroke] {
        self.annotations
            .page(page_number)
            .map(|p| p.strokes.as_slice())
            .unwrap_or(&[])
    }

    /// Text notes of a page.
    pub fn texts(&self, page_number: u32) -> &[TextAnnotation] {
        self.annotations
            .page(page_number)
            .map(|p| p.texts.as_slice())
            .unwrap_or(&[])
    }

    /// A page's full content (empty for unknown pages).
    pub fn page(&self, page_number: u32) -> PageAnnotations {
        self.annotations.page(page_number).cloned().unwrap_or_default()
    }

    /// Page numbers with at least one stroke or note.
    pub fn pages_with_content(&self) -> Vec<u32> {
        self.annotations.pages_with_content()
    }

    /// All committed annotations.
    pub fn annotation_set(&self) -> &PageAnnotationSet {
        &self.annotations
    }

    /// Replace everything with loaded annotations; histories restart.
    pub fn load_annotation_set(&mut self, annotations: PageAnnotationSet) {
        self.annotations = annotations;
        self.histories.clear();
        self.reset_history(self.active_page);
    }

    /// Append a stroke and record a snapshot.
    pub fn add_stroke(&mut self, page_number: u32, stroke: Stroke) -> StrokeId {
        let id = stroke.id();
        self.history_mut(page_number);
        self.annotations.page_mut(page_number).strokes.push(stroke);
        self.commit(page_number);
        log::debug!("Added stroke {} to page {}", id, page_number);
        id
    }

    /// Commit a freshly drawn stroke, applying shape correction when enabled.
    pub fn commit_drawn_stroke(&mut self, page_number: u32, mut stroke: Stroke) -> (StrokeId, Option<ShapeKind>) {
        let shape = self
            .shape_correction
            .as_ref()
            .and_then(|classifier| classifier.apply(&mut stroke));
        (self.add_stroke(page_number, stroke), shape)
    }

    /// Remove one stroke by id.
    pub fn remove_stroke(&mut self, page_number: u32, id: StrokeId) -> Option<Stroke> {
        self.history_mut(page_number);
        let strokes = &mut self.annotations.page_mut(page_number).strokes;
        let index = strokes.iter().position(|s| s.id() == id)?;
        let removed = strokes.remove(index);
        self.commit(page_number);
        Some(removed)
    }

    /// Remove every stroke with a point within `radius` of `point`.
    /// Returns how many were removed; a miss records no snapshot.
    pub fn erase_at(&mut self, page_number: u32, point: Point, radius: f64) -> usize {
        self.history_mut(page_number);
        let strokes = &mut self.annotations.page_mut(page_number).strokes;
        let before = strokes.len();
        strokes.retain(|s| !s.hit_by_eraser(point, radius));
        let removed = before - strokes.len();
        if removed > 0 {
            log::debug!("Eraser removed {} stroke(s) from page {}", removed, page_number);
            self.commit(page_number);
        }
        removed
    }

    /// [`AnnotationStore::erase_at`] driven by a session's eraser sample.
    pub fn erase(&mut self, sample: EraserSample) -> usize {
        self.erase_at(sample.page_number, sample.point, sample.radius)
    }

    /// Remove all strokes of a page as one mutation. Text notes stay.
    pub fn clear_page(&mut self, page_number: u32) -> bool {
        if self.strokes(page_number).is_empty() {
            return false;
        }
        self.history_mut(page_number);
        self.set_strokes(page_number, Vec::new());
        self.commit(page_number);
        true
    }

    /// Step the page's history back. Returns false at the oldest snapshot.
    pub fn undo(&mut self, page_number: u32) -> bool {
        match self.history_mut(page_number).undo().cloned() {
            Some(strokes) => {
                self.set_strokes(page_number, strokes);
                true
            }
            None => false,
        }
    }

    /// Step the page's history forward. Returns false at the newest snapshot.
    pub fn redo(&mut self, page_number: u32) -> bool {
        match self.history_mut(page_number).redo().cloned() {
            Some(strokes) => {
                self.set_strokes(page_number, strokes);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self, page_number: u32) -> bool {
        self.histories.get(&page_number).is_some_and(History::can_undo)
    }

    pub fn can_redo(&self, page_number: u32) -> bool {
        self.histories.get(&page_number).is_some_and(History::can_redo)
    }

    /// Add a text note.
    pub fn add_text(&mut self, page_number: u32, text: TextAnnotation) -> TextId {
        let id = text.id();
        self.annotations.page_mut(page_number).texts.push(text);
        id
    }

    fn text_mut(&mut self, page_number: u32, id: TextId) -> Option<&mut TextAnnotation> {
        self.annotations
            .page_mut(page_number)
            .texts
            .iter_mut()
            .find(|t| t.id() == id)
    }

    /// Replace a note's text.
    pub fn update_text(&mut self, page_number: u32, id: TextId, text: impl Into<String>) -> bool {
        match self.text_mut(page_number, id) {
            Some(note) => {
                note.set_text(text);
                true
            }
            None => false,
        }
    }

    /// Move a note's anchor.
    pub fn move_text(&mut self, page_number: u32, id: TextId, position: Point) -> bool {
        match self.text_mut(page_number, id) {
            Some(note) => {
                note.move_to(position);
                true
            }
            None => false,
        }
    }

    /// Delete a note.
    pub fn remove_text(&mut self, page_number: u32, id: TextId) -> Option<TextAnnotation> {
        let texts = &mut self.annotations.page_mut(page_number).texts;
        let index = texts.iter().position(|t| t.id() == id)?;
        Some(texts.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::EditSession;

    fn stroke_at(x: f64, y: f64) -> Stroke {
        Stroke::from_points(vec![Point::new(x, y), Point::new(x + 10.0, y)])
    }

    #[test]
    fn test_undo_all_then_redo_all() {
        let mut store = AnnotationStore::new();
        let n = 5;
        for i in 0..n {
            store.add_stroke(1, stroke_at(i as f64 * 20.0, 0.0));
        }
        let full = store.strokes(1).to_vec();

        for _ in 0..n {
            assert!(store.undo(1));
        }
        assert!(store.strokes(1).is_empty());
        assert!(!store.undo(1));

        for _ in 0..n {
            assert!(store.redo(1));
        }
        assert_eq!(store.strokes(1), full.as_slice());
        assert!(!store.redo(1));
    }

    #[test]
    fn test_long_sessions_undo_to_empty() {
        let mut store = AnnotationStore::new();
        let n = 150;
        for i in 0..n {
            store.add_stroke(1, stroke_at(i as f64, 0.0));
        }
        let undone = (0..n).filter(|_| store.undo(1)).count();
        assert_eq!(undone, n);
        assert!(store.strokes(1).is_empty());
    }

    #[test]
    fn test_commit_after_undo_discards_redo() {
        let mut store = AnnotationStore::new();
        store.add_stroke(1, stroke_at(0.0, 0.0));
        let second = store.add_stroke(1, stroke_at(0.0, 50.0));
        store.undo(1);
        store.add_stroke(1, stroke_at(0.0, 100.0));
        assert!(!store.can_redo(1));
        assert!(!store.redo(1));
        assert!(store.strokes(1).iter().all(|s| s.id() != second));
        assert_eq!(store.strokes(1).len(), 2);
    }

    #[test]
    fn test_eraser_radius_boundary() {
        let pen_size = 2.0;
        let radius = pen_size * 3.0;
        let mut store = AnnotationStore::new();
        let near = store.add_stroke(1, Stroke::from_points(vec![Point::new(0.0, radius)]));
        let far = store.add_stroke(1, Stroke::from_points(vec![Point::new(100.0, radius + 1e-6)]));

        assert_eq!(store.erase_at(1, Point::new(0.0, 0.0), radius), 1);
        assert_eq!(store.erase_at(1, Point::new(100.0, 0.0), radius), 0);
        let ids: Vec<_> = store.strokes(1).iter().map(Stroke::id).collect();
        assert_eq!(ids, vec![far]);
        assert_ne!(ids[0], near);
    }

    #[test]
    fn test_eraser_drag_removes_incrementally() {
        let mut store = AnnotationStore::new();
        for i in 0..3 {
            store.add_stroke(1, stroke_at(i as f64 * 100.0, 0.0));
        }
        let session = EditSession::new(1);
        let mut removed = 0;
        for x in (0..=200).step_by(50) {
            removed += store.erase(session.eraser_sample(Point::new(x as f64, 0.0)));
        }
        assert_eq!(removed, 3);
        // Each removal was its own snapshot.
        assert!(store.undo(1));
        assert_eq!(store.strokes(1).len(), 1);
    }

    #[test]
    fn test_missed_erase_records_nothing() {
        let mut store = AnnotationStore::new();
        store.add_stroke(1, stroke_at(0.0, 0.0));
        assert_eq!(store.erase_at(1, Point::new(500.0, 500.0), 6.0), 0);
        assert!(store.undo(1));
        assert!(store.strokes(1).is_empty());
    }

    #[test]
    fn test_clear_page_is_one_mutation() {
        let mut store = AnnotationStore::new();
        store.add_stroke(1, stroke_at(0.0, 0.0));
        store.add_stroke(1, stroke_at(0.0, 20.0));
        assert!(store.clear_page(1));
        assert!(store.strokes(1).is_empty());
        assert!(!store.clear_page(1));
        assert!(store.undo(1));
        assert_eq!(store.strokes(1).len(), 2);
    }

    #[test]
    fn test_page_switch_resets_history() {
        let mut store = AnnotationStore::new();
        store.add_stroke(1, stroke_at(0.0, 0.0));
        store.set_active_page(2);
        store.add_stroke(2, stroke_at(0.0, 0.0));
        store.set_active_page(1);

        assert_eq!(store.strokes(1).len(), 1);
        assert!(!store.can_undo(1));
        assert!(!store.undo(1));
        assert_eq!(store.strokes(2).len(), 1);
    }

    #[test]
    fn test_unknown_page_is_empty() {
        let mut store = AnnotationStore::new();
        assert!(store.strokes(42).is_empty());
        assert!(!store.undo(42));
        assert!(!store.redo(42));
        assert_eq!(store.erase_at(42, Point::ZERO, 10.0), 0);
        assert!(store.page(42).is_empty());
    }

    #[test]
    fn test_text_notes() {
        let mut store = AnnotationStore::new();
        let id = store.add_text(3, TextAnnotation::new(Point::new(1.0, 2.0), "note"));
        assert!(store.update_text(3, id, "edited"));
        assert!(store.move_text(3, id, Point::new(9.0, 9.0)));
        assert_eq!(store.texts(3)[0].text, "edited");
        assert_eq!(store.texts(3)[0].position(), Point::new(9.0, 9.0));
        assert_eq!(store.pages_with_content(), vec![3]);
        assert!(store.remove_text(3, id).is_some());
        assert!(store.remove_text(3, id).is_none());
    }

    #[test]
    fn test_commit_drawn_stroke_with_correction() {
        let mut store = AnnotationStore::new();
        store.set_shape_correction(Some(ShapeClassifier::new()));
        let points: Vec<Point> = (0..10).map(|i| Point::new(i as f64 * 3.0, 0.0)).collect();
        let (_, shape) = store.commit_drawn_stroke(1, Stroke::from_points(points));
        assert_eq!(shape, Some(ShapeKind::Line));
        assert_eq!(store.strokes(1)[0].len(), 2);
    }
}
