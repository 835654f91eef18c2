//! Export errors.

use inkmark_render::RendererError;
use thiserror::Error;

/// Reasons an export is aborted. No output is produced in any of these cases.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to load document: {0}")]
    Load(#[source] lopdf::Error),
    #[error("Document has no page {0}")]
    MissingPage(u32),
    #[error("No page geometry supplied for page {0}")]
    MissingGeometry(u32),
    #[error("Rasterization failed: {0}")]
    Raster(#[from] RendererError),
    #[error("Image encoding failed: {0}")]
    Encode(String),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
