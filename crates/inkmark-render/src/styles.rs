//! Pen styles: turn ink geometry into draw commands.
//!
//! Every style is expressed per segment so that the live tail and the bulk
//! redraw share the same formulas. Widths are in the same units as the points.

use crate::command::{DrawCommand, LineCap};
use crate::rng::SimpleRng;
use crate::spline::{catmull_rom_path, catmull_rom_segment_path, polyline_path};
use inkmark_core::annotation::DEFAULT_PRESSURE;
use inkmark_core::capture::StrokeDraft;
use inkmark_core::{PenStyle, SerializableColor, Stroke};
use kurbo::{BezPath, Point, Rect, Vec2};

/// Layers drawn by the drawing style.
pub const DRAWING_LAYERS: usize = 3;
/// Passes drawn per segment by the pencil style.
pub const PENCIL_LAYERS: usize = 4;
/// Pencil jitter as a fraction of the pen size.
pub const PENCIL_JITTER: f64 = 0.3;
/// Scattered grains around a pencil dot.
pub const PENCIL_DOT_GRAINS: usize = 12;
/// Bristle marks around a brush dab.
pub const BRUSH_BRISTLES: usize = 8;
/// Highlighter opacity caps for the wide and narrow passes.
pub const HIGHLIGHTER_OUTER_MAX_OPACITY: f64 = 0.5;
pub const HIGHLIGHTER_INNER_MAX_OPACITY: f64 = 0.7;

const INNER_HIGHLIGHT_SHARE: f64 = 0.3;
const MIN_SEGMENT_LENGTH: f64 = 1e-9;

/// Geometry and pen settings a style renders from.
#[derive(Debug, Clone, Copy)]
pub struct Ink<'a> {
    pub points: &'a [Point],
    pub pressure: &'a [f64],
    pub color: SerializableColor,
    pub size: f64,
    pub opacity: f64,
    pub style: PenStyle,
}

impl<'a> Ink<'a> {
    pub fn from_stroke(stroke: &'a Stroke) -> Self {
        Self {
            points: stroke.points(),
            pressure: stroke.pressure(),
            color: stroke.color(),
            size: stroke.size(),
            opacity: stroke.opacity(),
            style: stroke.style(),
        }
    }

    pub fn from_draft(draft: &'a StrokeDraft) -> Self {
        let brush = draft.brush();
        Self {
            points: draft.points(),
            pressure: draft.pressure(),
            color: brush.color,
            size: brush.size,
            opacity: brush.opacity.clamp(0.0, 1.0),
            style: brush.style,
        }
    }

    /// The same ink restricted to `points[start..]`.
    pub fn tail(&self, start: usize) -> Self {
        Self {
            points: &self.points[start..],
            pressure: self.pressure.get(start..).unwrap_or(&[]),
            ..*self
        }
    }

    pub fn pressure_at(&self, i: usize) -> f64 {
        self.pressure.get(i).copied().unwrap_or(DEFAULT_PRESSURE)
    }

    fn tint(&self, alpha: f64) -> SerializableColor {
        self.color.scale_alpha(self.opacity * alpha)
    }

    fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }
}

/// Commands for a whole stroke. Empty input yields nothing.
pub fn render_ink(ink: &Ink, rng: &mut SimpleRng) -> Vec<DrawCommand> {
    let mut out = Vec::new();
    match ink.points.len() {
        0 => {}
        1 => render_dot(ink, rng, &mut out),
        _ => match ink.style {
            PenStyle::Writing => writing_path(ink, catmull_rom_path(ink.points), &mut out),
            PenStyle::Drawing => drawing_layers(ink, None, &mut out),
            PenStyle::Ballpoint => ballpoint_path(ink, catmull_rom_path(ink.points), &mut out),
            PenStyle::Highlighter => highlighter_path(ink, polyline_path(ink.points), &mut out),
            PenStyle::Calligraphy | PenStyle::Fountain | PenStyle::Brush | PenStyle::Pencil => {
                for i in 0..ink.segment_count() {
                    render_segment_into(ink, i, rng, &mut out);
                }
            }
        },
    }
    out
}

/// Commands for the single segment `points[i]..points[i + 1]`.
pub fn render_segment(ink: &Ink, i: usize, rng: &mut SimpleRng) -> Vec<DrawCommand> {
    let mut out = Vec::new();
    if i + 1 < ink.points.len() {
        render_segment_into(ink, i, rng, &mut out);
    }
    out
}

fn render_segment_into(ink: &Ink, i: usize, rng: &mut SimpleRng, out: &mut Vec<DrawCommand>) {
    match ink.style {
        PenStyle::Writing => writing_path(ink, catmull_rom_segment_path(ink.points, i), out),
        PenStyle::Drawing => drawing_layers(ink, Some(i), out),
        PenStyle::Ballpoint => ballpoint_path(ink, catmull_rom_segment_path(ink.points, i), out),
        PenStyle::Highlighter => highlighter_path(ink, polyline_path(&ink.points[i..i + 2]), out),
        PenStyle::Calligraphy => calligraphy_segment(ink, i, out),
        PenStyle::Fountain => fountain_segment(ink, i, out),
        PenStyle::Brush => brush_segment(ink, i, out),
        PenStyle::Pencil => pencil_segment(ink, i, rng, out),
    }
}

fn stroke_path(path: BezPath, width: f64, color: SerializableColor, cap: LineCap) -> DrawCommand {
    DrawCommand::StrokePath { path, width, color, cap }
}

/// Filled quadrilateral perpendicular to `a -> b`, `wa` wide at `a` and `wb` at `b`.
fn ribbon(a: Point, b: Point, wa: f64, wb: f64) -> Option<BezPath> {
    let d = b - a;
    let len = d.hypot();
    if len < MIN_SEGMENT_LENGTH {
        return None;
    }
    let normal = Vec2::new(-d.y / len, d.x / len);
    let mut path = BezPath::new();
    path.move_to(a + normal * (wa / 2.0));
    path.line_to(b + normal * (wb / 2.0));
    path.line_to(b - normal * (wb / 2.0));
    path.line_to(a - normal * (wa / 2.0));
    path.close_path();
    Some(path)
}

fn writing_path(ink: &Ink, path: BezPath, out: &mut Vec<DrawCommand>) {
    out.push(stroke_path(path, ink.size, ink.tint(1.0), LineCap::Round));
}

fn drawing_layer(ink: &Ink, s: usize) -> (Vec2, f64, f64) {
    let s = s as f64;
    let offset = (s - 1.0) * 0.3;
    (Vec2::new(offset, offset), 0.4 + s * 0.2, ink.size * (0.7 + s * 0.15))
}

fn drawing_layers(ink: &Ink, segment: Option<usize>, out: &mut Vec<DrawCommand>) {
    for s in 0..DRAWING_LAYERS {
        let (offset, alpha, width) = drawing_layer(ink, s);
        let shifted: Vec<Point> = ink.points.iter().map(|p| *p + offset).collect();
        let path = match segment {
            Some(i) => catmull_rom_segment_path(&shifted, i),
            None => catmull_rom_path(&shifted),
        };
        out.push(stroke_path(path, width, ink.tint(alpha), LineCap::Round));
    }
}

fn ballpoint_path(ink: &Ink, path: BezPath, out: &mut Vec<DrawCommand>) {
    out.push(stroke_path(path.clone(), ink.size * 1.4, ink.tint(0.25), LineCap::Round));
    out.push(stroke_path(path, ink.size * 1.1, ink.tint(0.95), LineCap::Round));
}

fn highlighter_alphas(ink: &Ink) -> (SerializableColor, SerializableColor) {
    let outer = ink.opacity.min(HIGHLIGHTER_OUTER_MAX_OPACITY);
    let inner = ink.opacity.min(HIGHLIGHTER_INNER_MAX_OPACITY) * INNER_HIGHLIGHT_SHARE;
    (ink.color.scale_alpha(outer), ink.color.scale_alpha(inner))
}

fn highlighter_path(ink: &Ink, path: BezPath, out: &mut Vec<DrawCommand>) {
    let (outer, inner) = highlighter_alphas(ink);
    out.push(stroke_path(path.clone(), ink.size * 1.5, outer, LineCap::Butt));
    out.push(stroke_path(path, ink.size * 1.2, inner, LineCap::Butt));
}

/// Chisel width: thin for horizontal motion, full for vertical.
pub fn calligraphy_width(size: f64, a: Point, b: Point) -> f64 {
    let angle = (b.y - a.y).atan2(b.x - a.x);
    size * (0.25 + 0.75 * angle.sin().abs())
}

fn calligraphy_segment(ink: &Ink, i: usize, out: &mut Vec<DrawCommand>) {
    let (a, b) = (ink.points[i], ink.points[i + 1]);
    let width = calligraphy_width(ink.size, a, b);
    let color = ink.tint(1.0);
    if let Some(path) = ribbon(a, b, width, width) {
        out.push(DrawCommand::FillPath { path, color });
    }
    for center in [a, b] {
        out.push(DrawCommand::FillCircle { center, radius: width / 2.0, color });
    }
}

/// Fountain nib width for a pressure sample.
pub fn fountain_width(size: f64, pressure: f64) -> f64 {
    size * (0.5 + 0.9 * pressure)
}

fn fountain_segment(ink: &Ink, i: usize, out: &mut Vec<DrawCommand>) {
    let (a, b) = (ink.points[i], ink.points[i + 1]);
    let wa = fountain_width(ink.size, ink.pressure_at(i));
    let wb = fountain_width(ink.size, ink.pressure_at(i + 1));
    let color = ink.tint(1.0);

    out.push(stroke_path(
        catmull_rom_segment_path(ink.points, i),
        (wa + wb) / 2.0 * 1.3,
        ink.tint(0.2),
        LineCap::Round,
    ));
    if let Some(path) = ribbon(a, b, wa, wb) {
        out.push(DrawCommand::FillPath { path, color });
    }
    out.push(DrawCommand::FillCircle { center: a, radius: wa / 2.0, color });
    out.push(DrawCommand::FillCircle { center: b, radius: wb / 2.0, color });
}

/// Brush width; far more pressure-sensitive than the fountain pen.
pub fn brush_width(size: f64, pressure: f64) -> f64 {
    size * (0.2 + 1.8 * pressure)
}

fn brush_segment(ink: &Ink, i: usize, out: &mut Vec<DrawCommand>) {
    let (a, b) = (ink.points[i], ink.points[i + 1]);
    let wa = brush_width(ink.size, ink.pressure_at(i));
    let wb = brush_width(ink.size, ink.pressure_at(i + 1));
    let color = ink.tint(1.0);

    if let Some(path) = ribbon(a, b, wa, wb) {
        out.push(DrawCommand::FillPath { path, color });
    }
    out.push(stroke_path(
        catmull_rom_segment_path(ink.points, i),
        wa.min(wb) * 0.5,
        color,
        LineCap::Round,
    ));
    out.push(DrawCommand::FillCircle { center: a, radius: wa / 2.0, color });
    out.push(DrawCommand::FillCircle { center: b, radius: wb / 2.0, color });
}

/// Width of pencil pass `layer` at pressure `pressure`.
pub fn pencil_width(size: f64, pressure: f64, layer: usize) -> f64 {
    size * (0.6 + 0.6 * pressure) * (0.7 + layer as f64 * 0.15)
}

fn pencil_segment(ink: &Ink, i: usize, rng: &mut SimpleRng, out: &mut Vec<DrawCommand>) {
    let (a, b) = (ink.points[i], ink.points[i + 1]);
    let pressure = (ink.pressure_at(i) + ink.pressure_at(i + 1)) / 2.0;
    let jitter = ink.size * PENCIL_JITTER;

    for layer in 0..PENCIL_LAYERS {
        let alpha = 0.15 + layer as f64 * 0.15;
        let ja = a + Vec2::new(rng.offset(jitter), rng.offset(jitter));
        let jb = b + Vec2::new(rng.offset(jitter), rng.offset(jitter));
        out.push(stroke_path(
            polyline_path(&[ja, jb]),
            pencil_width(ink.size, pressure, layer),
            ink.tint(alpha),
            LineCap::Round,
        ));
    }
}

fn render_dot(ink: &Ink, rng: &mut SimpleRng, out: &mut Vec<DrawCommand>) {
    let center = ink.points[0];
    let pressure = ink.pressure_at(0);
    let size = ink.size;

    match ink.style {
        PenStyle::Writing => out.push(DrawCommand::FillCircle {
            center,
            radius: size / 2.0,
            color: ink.tint(1.0),
        }),
        PenStyle::Drawing => {
            for s in 0..DRAWING_LAYERS {
                let (offset, alpha, width) = drawing_layer(ink, s);
                out.push(DrawCommand::FillCircle {
                    center: center + offset,
                    radius: width / 2.0,
                    color: ink.tint(alpha),
                });
            }
        }
        PenStyle::Calligraphy => out.push(DrawCommand::FillEllipse {
            center,
            radii: Vec2::new(size * 0.125, size * 0.5),
            color: ink.tint(1.0),
        }),
        PenStyle::Fountain => {
            let w = fountain_width(size, pressure);
            out.push(DrawCommand::FillEllipse {
                center,
                radii: Vec2::new(w * 0.6, w * 0.55),
                color: ink.tint(0.3),
            });
            out.push(DrawCommand::FillEllipse {
                center,
                radii: Vec2::new(w * 0.5, w * 0.45),
                color: ink.tint(1.0),
            });
            out.push(DrawCommand::FillCircle {
                center: center + Vec2::new(w * 0.35, -w * 0.2),
                radius: w * 0.12,
                color: ink.tint(0.6),
            });
        }
        PenStyle::Ballpoint => {
            out.push(DrawCommand::FillCircle {
                center,
                radius: size * 1.2 / 2.0,
                color: ink.tint(0.25),
            });
            out.push(DrawCommand::FillCircle {
                center,
                radius: size * 1.1 / 2.0,
                color: ink.tint(0.95),
            });
        }
        PenStyle::Brush => {
            let w = brush_width(size, pressure);
            out.push(DrawCommand::FillCircle { center, radius: w / 2.0, color: ink.tint(1.0) });
            for _ in 0..BRUSH_BRISTLES {
                let angle = rng.angle();
                let distance = w / 2.0 * (0.6 + 0.6 * rng.next_unit());
                let radius = size * (0.05 + 0.1 * rng.next_unit());
                out.push(DrawCommand::FillCircle {
                    center: center + Vec2::from_angle(angle) * distance,
                    radius,
                    color: ink.tint(0.7),
                });
            }
        }
        PenStyle::Pencil => {
            for _ in 0..PENCIL_DOT_GRAINS {
                let angle = rng.angle();
                let distance = rng.next_unit() * size * 0.8;
                let radius = size * (0.1 + 0.1 * rng.next_unit());
                let alpha = 0.3 + 0.3 * rng.next_unit();
                out.push(DrawCommand::FillCircle {
                    center: center + Vec2::from_angle(angle) * distance,
                    radius,
                    color: ink.tint(alpha),
                });
            }
        }
        PenStyle::Highlighter => {
            let (outer, inner) = highlighter_alphas(ink);
            out.push(DrawCommand::FillRect {
                rect: Rect::from_center_size(center, (size * 0.5, size * 1.5)),
                color: outer,
            });
            out.push(DrawCommand::FillRect {
                rect: Rect::from_center_size(center, (size * 0.4, size * 1.2)),
                color: inner,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkmark_core::annotation::DEFAULT_PRESSURE;

    fn ink(style: PenStyle, points: &[Point], pressure: &[f64]) -> Vec<DrawCommand> {
        let ink = Ink {
            points,
            pressure,
            color: SerializableColor::black(),
            size: 4.0,
            opacity: 1.0,
            style,
        };
        render_ink(&ink, &mut SimpleRng::new(9))
    }

    fn line() -> Vec<Point> {
        vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(20.0, 10.0)]
    }

    #[test]
    fn test_empty_input_draws_nothing() {
        for style in PenStyle::all() {
            assert!(ink(*style, &[], &[]).is_empty());
        }
    }

    #[test]
    fn test_every_style_draws_dots_and_lines() {
        for style in PenStyle::all() {
            assert!(!ink(*style, &[Point::new(5.0, 5.0)], &[DEFAULT_PRESSURE]).is_empty());
            assert!(!ink(*style, &line(), &[0.5; 3]).is_empty());
        }
    }

    #[test]
    fn test_writing_is_single_constant_width_stroke() {
        let cmds = ink(PenStyle::Writing, &line(), &[0.1, 0.9, 0.3]);
        assert_eq!(cmds.len(), 1);
        match &cmds[0] {
            DrawCommand::StrokePath { width, cap, .. } => {
                assert_eq!(*width, 4.0);
                assert_eq!(*cap, LineCap::Round);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_drawing_layers() {
        let cmds = ink(PenStyle::Drawing, &line(), &[0.5; 3]);
        let widths: Vec<f64> = cmds
            .iter()
            .map(|c| match c {
                DrawCommand::StrokePath { width, .. } => *width,
                _ => 0.0,
            })
            .collect();
        assert_eq!(widths.len(), 3);
        assert!((widths[0] - 2.8).abs() < 1e-9);
        assert!((widths[1] - 3.4).abs() < 1e-9);
        assert!((widths[2] - 4.0).abs() < 1e-9);
        let alphas: Vec<u8> = cmds.iter().map(|c| c.color().a).collect();
        assert_eq!(alphas, vec![102, 153, 204]);
    }

    #[test]
    fn test_calligraphy_width_follows_direction() {
        let horizontal = calligraphy_width(4.0, Point::ZERO, Point::new(10.0, 0.0));
        let vertical = calligraphy_width(4.0, Point::ZERO, Point::new(0.0, 10.0));
        assert!((horizontal - 1.0).abs() < 1e-9);
        assert!((vertical - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_pressure_widths() {
        assert!((fountain_width(10.0, 0.0) - 5.0).abs() < 1e-9);
        assert!((fountain_width(10.0, 1.0) - 14.0).abs() < 1e-9);
        assert!((brush_width(10.0, 0.0) - 2.0).abs() < 1e-9);
        assert!((brush_width(10.0, 1.0) - 20.0).abs() < 1e-9);
        assert!((pencil_width(10.0, 0.5, 0) - 6.3).abs() < 1e-9);
    }

    #[test]
    fn test_ballpoint_ignores_pressure() {
        let soft = ink(PenStyle::Ballpoint, &line(), &[0.1; 3]);
        let hard = ink(PenStyle::Ballpoint, &line(), &[1.0; 3]);
        assert_eq!(soft, hard);
    }

    #[test]
    fn test_highlighter_caps_opacity_and_is_flat() {
        let cmds = ink(PenStyle::Highlighter, &line(), &[0.5; 3]);
        for cmd in &cmds {
            assert!(cmd.color().a <= (255.0 * HIGHLIGHTER_OUTER_MAX_OPACITY).round() as u8);
            if let DrawCommand::StrokePath { cap, .. } = cmd {
                assert_eq!(*cap, LineCap::Butt);
            }
        }
        let dot = ink(PenStyle::Highlighter, &[Point::ZERO], &[0.5]);
        assert!(dot.iter().all(|c| matches!(c, DrawCommand::FillRect { .. })));
    }

    #[test]
    fn test_brush_and_pencil_dots_scatter() {
        let brush = ink(PenStyle::Brush, &[Point::ZERO], &[0.5]);
        assert_eq!(brush.len(), 1 + BRUSH_BRISTLES);
        let pencil = ink(PenStyle::Pencil, &[Point::ZERO], &[0.5]);
        assert_eq!(pencil.len(), PENCIL_DOT_GRAINS);
    }

    #[test]
    fn test_pencil_is_deterministic_per_seed() {
        let pts = line();
        let ink = Ink {
            points: &pts,
            pressure: &[0.5; 3],
            color: SerializableColor::black(),
            size: 3.0,
            opacity: 1.0,
            style: PenStyle::Pencil,
        };
        let a = render_ink(&ink, &mut SimpleRng::new(5));
        let b = render_ink(&ink, &mut SimpleRng::new(5));
        let c = render_ink(&ink, &mut SimpleRng::new(6));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), PENCIL_LAYERS * 2);
    }

    #[test]
    fn test_opacity_multiplies_style_alpha() {
        let pts = line();
        let ink = Ink {
            points: &pts,
            pressure: &[0.5; 3],
            color: SerializableColor::black(),
            size: 2.0,
            opacity: 0.5,
            style: PenStyle::Writing,
        };
        let cmds = render_ink(&ink, &mut SimpleRng::new(1));
        assert_eq!(cmds[0].color().a, 128);
    }
}
