//! Pointer capture: turns a gesture into a deduplicated stroke.
//!
//! Pointer samples arrive in display pixels and are converted into
//! document-native units through the session's [`DisplayTransform`].

use crate::annotation::{PenStyle, SerializableColor, Stroke, StrokeTool, normalize_pressure};
use kurbo::{Affine, Point};
use thiserror::Error;

/// Samples closer than this (document units) to the previous one are dropped.
pub const MIN_POINT_DISTANCE: f64 = 0.5;

/// Eraser hit radius as a multiple of the pen size.
pub const ERASER_RADIUS_FACTOR: f64 = 3.0;

/// Capture protocol errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("a stroke is already being captured")]
    DraftOpen,
    #[error("no stroke is being captured")]
    NoDraft,
    #[error("the eraser does not produce strokes")]
    EraserTool,
}

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Maps display pixels to document units and back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    scale: f64,
}

impl Default for DisplayTransform {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl DisplayTransform {
    /// Transform for a page displayed at `scale` pixels per document unit.
    /// Non-finite or non-positive scales fall back to 1.
    pub fn new(scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        Self { scale }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Document units to display pixels.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.scale)
    }

    /// Display pixels to document units.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale)
    }

    pub fn screen_to_document(&self, screen_point: Point) -> Point {
        Point::new(screen_point.x / self.scale, screen_point.y / self.scale)
    }

    pub fn document_to_screen(&self, document_point: Point) -> Point {
        Point::new(document_point.x * self.scale, document_point.y * self.scale)
    }
}

/// Pen settings applied to new strokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushSettings {
    pub color: SerializableColor,
    pub size: f64,
    pub style: PenStyle,
    pub opacity: f64,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            color: SerializableColor::black(),
            size: 2.0,
            style: PenStyle::Writing,
            opacity: 1.0,
        }
    }
}

/// An in-progress, uncommitted stroke (document units).
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeDraft {
    points: Vec<Point>,
    pressure: Vec<f64>,
    brush: BrushSettings,
}

impl StrokeDraft {
    /// Start a draft at `point`.
    pub fn begin(point: Point, pressure: Option<f64>, brush: BrushSettings) -> Self {
        Self {
            points: vec![point],
            pressure: vec![normalize_pressure(pressure)],
            brush,
        }
    }

    /// Append a sample unless it is within [`MIN_POINT_DISTANCE`] of the last one.
    /// Returns whether the sample was kept.
    pub fn extend(&mut self, point: Point, pressure: Option<f64>) -> bool {
        if let Some(last) = self.points.last() {
            if last.distance(point) < MIN_POINT_DISTANCE {
                return false;
            }
        }
        self.points.push(point);
        self.pressure.push(normalize_pressure(pressure));
        true
    }

    /// Finish into a normalized stroke. A single-point draft becomes a dot.
    pub fn end(self) -> Stroke {
        Stroke::new(
            self.points,
            self.pressure,
            self.brush.color,
            self.brush.size,
            self.brush.style,
            self.brush.opacity,
        )
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn pressure(&self) -> &[f64] {
        &self.pressure
    }

    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Eraser position and reach for one pointer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EraserSample {
    pub page_number: u32,
    pub point: Point,
    pub radius: f64,
}

/// Short-lived state of one editing gesture stream.
///
/// Owns at most one open draft; independent sessions never share state.
#[derive(Debug, Clone)]
pub struct EditSession {
    page_number: u32,
    tool: StrokeTool,
    brush: BrushSettings,
    display: DisplayTransform,
    draft: Option<StrokeDraft>,
}

impl EditSession {
    pub fn new(page_number: u32) -> Self {
        Self {
            page_number,
            tool: StrokeTool::Pen,
            brush: BrushSettings::default(),
            display: DisplayTransform::default(),
            draft: None,
        }
    }

    pub fn with_tool(mut self, tool: StrokeTool) -> Self {
        self.tool = tool;
        self
    }

    pub fn with_brush(mut self, brush: BrushSettings) -> Self {
        self.brush = brush;
        self
    }

    pub fn with_display_scale(mut self, scale: f64) -> Self {
        self.display = DisplayTransform::new(scale);
        self
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn tool(&self) -> StrokeTool {
        self.tool
    }

    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    pub fn display(&self) -> DisplayTransform {
        self.display
    }

    /// Change the display zoom; points already captured stay in document units.
    pub fn set_display_scale(&mut self, scale: f64) {
        self.display = DisplayTransform::new(scale);
    }

    /// Switch tools. Any open draft is dropped.
    pub fn set_tool(&mut self, tool: StrokeTool) {
        self.tool = tool;
        self.draft = None;
    }

    pub fn set_brush(&mut self, brush: BrushSettings) {
        self.brush = brush;
    }

    pub fn draft(&self) -> Option<&StrokeDraft> {
        self.draft.as_ref()
    }

    /// Start a stroke at a display-pixel position.
    pub fn begin(&mut self, screen_point: Point, pressure: Option<f64>) -> CaptureResult<&StrokeDraft> {
        if self.tool == StrokeTool::Eraser {
            return Err(CaptureError::EraserTool);
        }
        if self.draft.is_some() {
            return Err(CaptureError::DraftOpen);
        }
        let point = self.display.screen_to_document(screen_point);
        let draft = self.draft.insert(StrokeDraft::begin(point, pressure, self.brush));
        Ok(&*draft)
    }

    /// Feed a display-pixel sample into the open draft.
    pub fn extend(&mut self, screen_point: Point, pressure: Option<f64>) -> CaptureResult<bool> {
        let point = self.display.screen_to_document(screen_point);
        let draft = self.draft.as_mut().ok_or(CaptureError::NoDraft)?;
        Ok(draft.extend(point, pressure))
    }

    /// Close the open draft into a stroke.
    pub fn end(&mut self) -> CaptureResult<Stroke> {
        self.draft.take().map(StrokeDraft::end).ok_or(CaptureError::NoDraft)
    }

    /// Abandon the open draft, if any.
    pub fn cancel(&mut self) {
        self.draft = None;
    }

    /// Eraser reach for a display-pixel position (`size * 3`).
    pub fn eraser_sample(&self, screen_point: Point) -> EraserSample {
        EraserSample {
            page_number: self.page_number,
            point: self.display.screen_to_document(screen_point),
            radius: self.brush.size * ERASER_RADIUS_FACTOR,
        }
    }
}
