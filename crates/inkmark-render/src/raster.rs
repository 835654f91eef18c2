//! CPU rasterization of draw commands with tiny-skia.

use crate::command::{DrawCommand, LineCap};
use crate::renderer::{InkBackend, RenderResult, RendererError};
use inkmark_core::SerializableColor;
use kurbo::{Affine, BezPath, PathEl};
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

/// Paints commands onto a transparent pixmap.
pub struct RasterBackend {
    pixmap: Pixmap,
}

impl RasterBackend {
    /// A fully transparent surface of `width` x `height` pixels.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(RendererError::InvalidSize { width, height })?;
        Ok(Self { pixmap })
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

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    /// Whether any pixel has non-zero alpha.
    pub fn has_ink(&self) -> bool {
        self.pixmap.pixels().iter().any(|p| p.alpha() > 0)
    }

    fn paint(color: SerializableColor) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = true;
        paint
    }

    fn draw(&mut self, command: &DrawCommand, transform: Transform) {
        match command {
            DrawCommand::StrokePath { path, width, color, cap } => {
                let Some(path) = to_skia_path(path) else { return };
                let stroke = Stroke {
                    width: *width as f32,
                    line_cap: to_skia_cap(*cap),
                    line_join: tiny_skia::LineJoin::Round,
                    ..Stroke::default()
                };
                self.pixmap.stroke_path(&path, &Self::paint(*color), &stroke, transform, None);
            }
            DrawCommand::FillPath { path, color } => {
                let Some(path) = to_skia_path(path) else { return };
                self.pixmap
                    .fill_path(&path, &Self::paint(*color), FillRule::Winding, transform, None);
            }
            DrawCommand::FillCircle { center, radius, color } => {
                let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, *radius as f32)
                else {
                    return;
                };
                self.pixmap
                    .fill_path(&path, &Self::paint(*color), FillRule::Winding, transform, None);
            }
            DrawCommand::FillEllipse { center, radii, color } => {
                let Some(oval) = tiny_skia::Rect::from_xywh(
                    (center.x - radii.x) as f32,
                    (center.y - radii.y) as f32,
                    (radii.x * 2.0) as f32,
                    (radii.y * 2.0) as f32,
                ) else {
                    return;
                };
                let Some(path) = PathBuilder::from_oval(oval) else { return };
                self.pixmap
                    .fill_path(&path, &Self::paint(*color), FillRule::Winding, transform, None);
            }
            DrawCommand::FillRect { rect, color } => {
                let Some(rect) = tiny_skia::Rect::from_ltrb(
                    rect.x0 as f32,
                    rect.y0 as f32,
                    rect.x1 as f32,
                    rect.y1 as f32,
                ) else {
                    return;
                };
                self.pixmap.fill_rect(rect, &Self::paint(*color), transform, None);
            }
        }
    }
}

impl InkBackend for RasterBackend {
    fn execute(&mut self, commands: &[DrawCommand], transform: Affine) -> RenderResult<()> {
        let transform = to_skia_transform(transform);
        for command in commands {
            self.draw(command, transform);
        }
        Ok(())
    }
}

/// Convert a kurbo affine to a tiny-skia transform.
pub fn to_skia_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn to_skia_cap(cap: LineCap) -> tiny_skia::LineCap {
    match cap {
        LineCap::Round => tiny_skia::LineCap::Round,
        LineCap::Butt => tiny_skia::LineCap::Butt,
        LineCap::Square => tiny_skia::LineCap::Square,
    }
}

/// Convert a kurbo path; `None` for paths tiny-skia cannot represent (e.g. empty).
pub fn to_skia_path(path: &BezPath) -> Option<Path> {
    let mut builder = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => builder.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32),
            PathEl::CurveTo(p1, p2, p3) => builder.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::render_stroke_seeded;
    use inkmark_core::{PenStyle, Stroke};
    use kurbo::Point;

    fn alpha_at(backend: &RasterBackend, x: u32, y: u32) -> u8 {
        backend.pixmap().pixel(x, y).map(|p| p.alpha()).unwrap_or(0)
    }

    #[test]
    fn test_new_surface_is_transparent() {
        let backend = RasterBackend::new(16, 16).unwrap();
        assert!(!backend.has_ink());
        assert!(RasterBackend::new(0, 10).is_err());
    }

    #[test]
    fn test_line_is_painted_under_transform() {
        let mut backend = RasterBackend::new(120, 120).unwrap();
        let stroke = Stroke::from_points(vec![Point::new(10.0, 10.0), Point::new(50.0, 50.0)]);
        backend
            .execute(&render_stroke_seeded(&stroke), Affine::scale(2.0))
            .unwrap();
        assert!(alpha_at(&backend, 60, 60) > 0);
        assert_eq!(alpha_at(&backend, 60, 20), 0);
        let px = backend.pixmap().pixel(60, 60).unwrap();
        assert_eq!((px.red(), px.green(), px.blue()), (0, 0, 0));
    }

    #[test]
    fn test_every_style_rasterizes() {
        for style in PenStyle::all() {
            let mut backend = RasterBackend::new(64, 64).unwrap();
            let stroke = Stroke::new(
                vec![Point::new(8.0, 8.0), Point::new(30.0, 40.0), Point::new(56.0, 20.0)],
                vec![],
                Default::default(),
                4.0,
                *style,
                1.0,
            );
            backend.execute(&render_stroke_seeded(&stroke), Affine::IDENTITY).unwrap();
            assert!(backend.has_ink(), "{} left no ink", style.name());
        }
    }

    #[test]
    fn test_transform_conversion() {
        let t = to_skia_transform(Affine::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
        assert_eq!((t.sx, t.ky, t.kx, t.sy, t.tx, t.ty), (1.0, 2.0, 3.0, 4.0, 5.0, 6.0));
        assert!(to_skia_path(&BezPath::new()).is_none());
    }
}
