//! Flattening a document's annotations into its pages.

use crate::error::{ExportError, ExportResult};
use crate::layer::{AnnotationLayer, PageGeometry};
use crate::pdf::{PageOverlay, load_document, overlay_page, save_document};
use inkmark_core::PageAnnotationSet;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Default raster resolution in pixels per document unit.
pub const DEFAULT_PIXEL_DENSITY: f64 = 2.0;

/// Export tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    pub pixel_density: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { pixel_density: DEFAULT_PIXEL_DENSITY }
    }
}

impl ExportOptions {
    /// Non-finite or non-positive densities fall back to the default.
    pub fn with_pixel_density(mut self, pixel_density: f64) -> Self {
        self.pixel_density = if pixel_density.is_finite() && pixel_density > 0.0 {
            pixel_density
        } else {
            DEFAULT_PIXEL_DENSITY
        };
        self
    }
}

/// Produces annotated copies of documents.
#[derive(Debug, Clone, Default)]
pub struct ExportCompositor {
    options: ExportOptions,
}

impl ExportCompositor {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Rasterize the strokes of every annotated page, in page order.
    ///
    /// `geometry[n - 1]` describes page `n`.
    pub fn rasterize(
        &self,
        annotations: &PageAnnotationSet,
        geometry: &[PageGeometry],
    ) -> ExportResult<Vec<AnnotationLayer>> {
        annotations
            .iter()
            .filter(|(_, page)| !page.strokes.is_empty())
            .map(|(n, page)| {
                let g = page_geometry(geometry, n)?;
                AnnotationLayer::rasterize(n, page, g, self.options.pixel_density)
            })
            .collect()
    }

    /// Return `document` with every annotated page's ink and notes drawn on top.
    ///
    /// Pages are handled one at a time in ascending order. Any failure aborts
    /// the whole export.
    pub async fn export(
        &self,
        document: &[u8],
        annotations: &PageAnnotationSet,
        geometry: &[PageGeometry],
    ) -> ExportResult<Vec<u8>> {
        let mut doc = load_document(document)?;
        let pages = doc.get_pages();
        let annotated = annotations.pages_with_content();
        log::info!("Exporting {} annotated page(s) of {}", annotated.len(), pages.len());

        for page_number in annotated {
            let Some(page) = annotations.page(page_number) else { continue };
            let page_id = *pages
                .get(&page_number)
                .ok_or(ExportError::MissingPage(page_number))?;
            let g = page_geometry(geometry, page_number)?;

            let layer = if page.strokes.is_empty() {
                None
            } else {
                Some(AnnotationLayer::rasterize(page_number, page, g, self.options.pixel_density)?)
            };
            let overlay = PageOverlay {
                layer: layer.as_ref(),
                texts: &page.texts,
                scale: g.scale(),
            };
            overlay_page(&mut doc, page_id, &overlay)?;
            log::debug!("Composited page {}", page_number);

            // Drop the page's raster before starting the next one.
            drop(layer);
            YieldNow::default().await;
        }

        let bytes = save_document(&mut doc)?;
        log::info!("Export finished ({} bytes)", bytes.len());
        Ok(bytes)
    }
}

fn page_geometry(geometry: &[PageGeometry], page_number: u32) -> ExportResult<&PageGeometry> {
    (page_number as usize)
        .checked_sub(1)
        .and_then(|i| geometry.get(i))
        .ok_or(ExportError::MissingGeometry(page_number))
}

/// `<stem>_annotated.<ext>` for a document file name.
pub fn annotated_file_name(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    match path.extension() {
        Some(ext) => format!("{}_annotated.{}", stem, ext.to_string_lossy()),
        None => format!("{}_annotated", stem),
    }
}

/// Yields once to the executor.
#[derive(Default)]
struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
