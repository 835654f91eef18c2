//! Stroke and page rendering entry points plus the backend seam.

use crate::command::DrawCommand;
use crate::rng::SimpleRng;
use crate::styles::{Ink, render_ink};
use inkmark_core::{PageAnnotations, Stroke, StrokeTool};
use kurbo::Affine;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Executes draw commands on some surface.
pub trait InkBackend {
    /// Paint `commands` in order, mapping their coordinates through `transform`.
    fn execute(&mut self, commands: &[DrawCommand], transform: Affine) -> RenderResult<()>;
}

/// Commands for one stroke, drawing randomness from `rng`.
pub fn render_stroke(stroke: &Stroke, rng: &mut SimpleRng) -> Vec<DrawCommand> {
    if stroke.tool() == StrokeTool::Eraser {
        return Vec::new();
    }
    render_ink(&Ink::from_stroke(stroke), rng)
}

/// [`render_stroke`] with the stroke's own seed, so repeated calls agree.
pub fn render_stroke_seeded(stroke: &Stroke) -> Vec<DrawCommand> {
    render_stroke(stroke, &mut SimpleRng::new(stroke.seed()))
}

/// Commands for every stroke of a page in paint order.
///
/// `transform` is applied to stroke points before styling; widths stay in
/// the stroke's own units.
pub fn render_page(page: &PageAnnotations, transform: Affine) -> Vec<DrawCommand> {
    let mut commands = Vec::new();
    for stroke in &page.strokes {
        if stroke.is_empty() {
            log::debug!("Skipping stroke {} with no points", stroke.id());
            continue;
        }
        if transform == Affine::IDENTITY {
            commands.extend(render_stroke_seeded(stroke));
        } else {
            commands.extend(render_stroke_seeded(&stroke.transformed(transform)));
        }
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkmark_core::PenStyle;
    use kurbo::Point;

    #[test]
    fn test_empty_strokes_are_skipped() {
        let mut page = PageAnnotations::new();
        page.strokes.push(Stroke::from_points(vec![]));
        page.strokes.push(Stroke::from_points(vec![Point::ZERO, Point::new(5.0, 5.0)]));
        assert_eq!(render_page(&page, Affine::IDENTITY).len(), 1);
    }

    #[test]
    fn test_eraser_strokes_draw_nothing() {
        let stroke = Stroke::from_points(vec![Point::ZERO, Point::new(1.0, 1.0)]).with_tool(StrokeTool::Eraser);
        assert!(render_stroke_seeded(&stroke).is_empty());
    }

    #[test]
    fn test_page_transform_scales_points_not_width() {
        let mut page = PageAnnotations::new();
        page.strokes.push(Stroke::from_points(vec![Point::new(10.0, 10.0), Point::new(50.0, 50.0)]));
        let cmds = render_page(&page, Affine::scale(2.0));
        match &cmds[0] {
            DrawCommand::StrokePath { path, width, .. } => {
                assert_eq!(*width, 2.0);
                let bounds = kurbo::Shape::bounding_box(path);
                assert_eq!(bounds, kurbo::Rect::new(20.0, 20.0, 100.0, 100.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_textured_styles_repeat_with_seed() {
        for style in [PenStyle::Pencil, PenStyle::Brush] {
            let stroke = Stroke::new(
                vec![Point::new(5.0, 5.0)],
                vec![0.8],
                Default::default(),
                3.0,
                style,
                1.0,
            )
            .with_seed(1234);
            assert_eq!(render_stroke_seeded(&stroke), render_stroke_seeded(&stroke));
        }
    }
}
