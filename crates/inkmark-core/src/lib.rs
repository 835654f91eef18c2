//! Inkmark Core Library
//!
//! Data model and editing logic for freehand PDF annotation: pointer capture,
//! shape correction, per-page undo/redo and persistence.

pub mod annotation;
pub mod capture;
pub mod classify;
pub mod history;
pub mod interchange;
pub mod storage;
pub mod store;

pub use annotation::{
    PageAnnotationSet, PageAnnotations, PenStyle, SerializableColor, Stroke, StrokeId, StrokeTool,
    TextAnnotation, TextId,
};
pub use capture::{BrushSettings, CaptureError, DisplayTransform, EditSession, EraserSample, StrokeDraft};
pub use classify::{Classification, ClassifierThresholds, ShapeClassifier, ShapeKind};
pub use history::History;
pub use interchange::{InterchangeError, SketchRecord};
pub use store::AnnotationStore;
