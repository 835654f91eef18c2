//! Transparent per-page ink layers.

use crate::error::{ExportError, ExportResult};
use inkmark_core::PageAnnotations;
use inkmark_render::{InkBackend, RasterBackend, render_page};
use kurbo::{Affine, Size, Vec2};
use tiny_skia::Pixmap;

/// Editing-time and native size of one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Page size in document units (PDF points).
    pub native: Size,
    /// Width/height the page was displayed at while annotating.
    pub display: Size,
}

impl PageGeometry {
    pub fn new(native: Size, display: Size) -> Self {
        Self { native, display }
    }

    /// Geometry for a page annotated at its native size.
    pub fn native(size: Size) -> Self {
        Self { native: size, display: size }
    }

    /// Factor mapping stored points onto the native page, per axis.
    /// Degenerate display sizes map 1:1.
    pub fn scale(&self) -> Vec2 {
        let axis = |native: f64, display: f64| {
            if display.is_finite() && display > 0.0 { native / display } else { 1.0 }
        };
        Vec2::new(
            axis(self.native.width, self.display.width),
            axis(self.native.height, self.display.height),
        )
    }
}

/// Rasterized ink of a single page, transparent wherever nothing was drawn.
pub struct AnnotationLayer {
    page_number: u32,
    native: Size,
    pixmap: Pixmap,
}

impl AnnotationLayer {
    /// Render a page's strokes at `pixel_density` pixels per document unit.
    pub fn rasterize(
        page_number: u32,
        page: &PageAnnotations,
        geometry: &PageGeometry,
        pixel_density: f64,
    ) -> ExportResult<Self> {
        let width = (geometry.native.width * pixel_density).ceil().max(1.0) as u32;
        let height = (geometry.native.height * pixel_density).ceil().max(1.0) as u32;
        let mut backend = RasterBackend::new(width, height)?;

        let scale = geometry.scale();
        let commands = render_page(page, Affine::scale_non_uniform(scale.x, scale.y));
        backend.execute(&commands, Affine::scale(pixel_density))?;

        Ok(Self {
            page_number,
            native: geometry.native,
            pixmap: backend.into_pixmap(),
        })
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Page size the layer covers, in document units.
    pub fn native_size(&self) -> Size {
        self.native
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn has_ink(&self) -> bool {
        self.pixmap.pixels().iter().any(|p| p.alpha() > 0)
    }

    /// Straight (non-premultiplied) RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Straight RGBA bytes, row-major.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.pixmap.pixels().len() * 4);
        for p in self.pixmap.pixels() {
            let c = p.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        rgba
    }

    /// Color and alpha planes, as image XObjects want them.
    pub fn to_rgb_and_alpha(&self) -> (Vec<u8>, Vec<u8>) {
        let count = self.pixmap.pixels().len();
        let mut rgb = Vec::with_capacity(count * 3);
        let mut alpha = Vec::with_capacity(count);
        for p in self.pixmap.pixels() {
            let c = p.demultiply();
            rgb.extend_from_slice(&[c.red(), c.green(), c.blue()]);
            alpha.push(c.alpha());
        }
        (rgb, alpha)
    }

    /// Encode as a transparent PNG.
    pub fn encode_png(&self) -> ExportResult<Vec<u8>> {
        let mut png_data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_data, self.width(), self.height());
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);

            let mut writer = encoder
                .write_header()
                .map_err(|e| ExportError::Encode(format!("PNG header: {}", e)))?;
            writer
                .write_image_data(&self.to_rgba())
                .map_err(|e| ExportError::Encode(format!("PNG data: {}", e)))?;
        }
        Ok(png_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkmark_core::Stroke;
    use kurbo::Point;

    fn page_with_line() -> PageAnnotations {
        let mut page = PageAnnotations::new();
        page.strokes
            .push(Stroke::from_points(vec![Point::new(10.0, 10.0), Point::new(50.0, 50.0)]));
        page
    }

    #[test]
    fn test_geometry_scale() {
        let g = PageGeometry::new(Size::new(600.0, 800.0), Size::new(300.0, 400.0));
        assert_eq!(g.scale(), Vec2::new(2.0, 2.0));
        let degenerate = PageGeometry::new(Size::new(600.0, 800.0), Size::ZERO);
        assert_eq!(degenerate.scale(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_layer_size_follows_density() {
        let g = PageGeometry::native(Size::new(100.0, 50.0));
        let layer = AnnotationLayer::rasterize(1, &page_with_line(), &g, 2.0).unwrap();
        assert_eq!((layer.width(), layer.height()), (200, 100));
    }

    #[test]
    fn test_background_stays_transparent() {
        let g = PageGeometry::native(Size::new(100.0, 100.0));
        let layer = AnnotationLayer::rasterize(1, &page_with_line(), &g, 1.0).unwrap();
        assert_eq!(layer.pixel(90, 10), Some([0, 0, 0, 0]));
        let on_line = layer.pixel(30, 30).unwrap();
        assert_eq!(on_line[3], 255);
        assert_eq!(&on_line[..3], &[0, 0, 0]);
    }

    #[test]
    fn test_display_scale_maps_points() {
        // Annotated at half size: (10,10)-(50,50) lands on (20,20)-(100,100).
        let g = PageGeometry::new(Size::new(200.0, 200.0), Size::new(100.0, 100.0));
        let layer = AnnotationLayer::rasterize(1, &page_with_line(), &g, 1.0).unwrap();
        assert!(layer.pixel(90, 90).unwrap()[3] > 0);
        assert_eq!(layer.pixel(5, 5).unwrap()[3], 0);
    }

    #[test]
    fn test_png_signature() {
        let g = PageGeometry::native(Size::new(20.0, 20.0));
        let layer = AnnotationLayer::rasterize(1, &page_with_line(), &g, 1.0).unwrap();
        let png = layer.encode_png().unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }
}
