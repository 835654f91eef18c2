//! Inkmark Export Library
//!
//! Rasterizes annotation layers and composites them, with text notes, onto
//! the pages of a PDF document.

mod compositor;
mod error;
mod layer;
pub mod pdf;

pub use compositor::{DEFAULT_PIXEL_DENSITY, ExportCompositor, ExportOptions, annotated_file_name};
pub use error::{ExportError, ExportResult};
pub use layer::{AnnotationLayer, PageGeometry};
