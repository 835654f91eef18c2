//! Freehand ink stroke.

use super::{PenStyle, SerializableColor, StrokeTool, generate_seed};
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for strokes.
pub type StrokeId = Uuid;

/// Pressure used when the input device reports none.
pub const DEFAULT_PRESSURE: f64 = 0.5;

/// Normalize a reported pressure sample.
///
/// Missing, non-finite and exactly-zero readings all become [`DEFAULT_PRESSURE`];
/// anything else is clamped to `0..=1`.
pub fn normalize_pressure(pressure: Option<f64>) -> f64 {
    match pressure {
        Some(p) if p.is_finite() && p != 0.0 => p.clamp(0.0, 1.0),
        _ => DEFAULT_PRESSURE,
    }
}

/// A committed ink stroke in document-native units.
///
/// Always fully populated: one pressure sample per point, opacity in `0..=1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StrokeRecord")]
pub struct Stroke {
    pub(crate) id: StrokeId,
    points: Vec<Point>,
    color: SerializableColor,
    size: f64,
    tool: StrokeTool,
    style: PenStyle,
    opacity: f64,
    pressure: Vec<f64>,
    seed: u32,
}

impl Stroke {
    /// Create a pen stroke with explicit pressure samples.
    ///
    /// Missing trailing samples are filled with [`DEFAULT_PRESSURE`], extra ones dropped.
    pub fn new(
        points: Vec<Point>,
        pressure: Vec<f64>,
        color: SerializableColor,
        size: f64,
        style: PenStyle,
        opacity: f64,
    ) -> Self {
        let mut stroke = Self {
            id: Uuid::new_v4(),
            points,
            color,
            size,
            tool: StrokeTool::Pen,
            style,
            opacity,
            pressure,
            seed: generate_seed(),
        };
        stroke.normalize();
        stroke
    }

    /// Create a writing-style black stroke from bare points.
    pub fn from_points(points: Vec<Point>) -> Self {
        Self::new(points, Vec::new(), SerializableColor::black(), 2.0, PenStyle::Writing, 1.0)
    }

    /// Builder: set the tool.
    pub fn with_tool(mut self, tool: StrokeTool) -> Self {
        self.tool = tool;
        self
    }

    /// Builder: set the random seed used for textured styles.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    fn normalize(&mut self) {
        if !self.opacity.is_finite() {
            self.opacity = 1.0;
        }
        self.opacity = self.opacity.clamp(0.0, 1.0);
        if !self.size.is_finite() || self.size <= 0.0 {
            self.size = 1.0;
        }
        self.pressure.truncate(self.points.len());
        for p in &mut self.pressure {
            *p = normalize_pressure(Some(*p));
        }
        self.pressure.resize(self.points.len(), DEFAULT_PRESSURE);
    }

    pub fn id(&self) -> StrokeId {
        self.id
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Pressure samples, parallel to [`Stroke::points`].
    pub fn pressure(&self) -> &[f64] {
        &self.pressure
    }

    /// Pressure at point `i`, or the default when out of range.
    pub fn pressure_at(&self, i: usize) -> f64 {
        self.pressure.get(i).copied().unwrap_or(DEFAULT_PRESSURE)
    }

    pub fn color(&self) -> SerializableColor {
        self.color
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn tool(&self) -> StrokeTool {
        self.tool
    }

    pub fn style(&self) -> PenStyle {
        self.style
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Explicit color edit.
    pub fn set_color(&mut self, color: SerializableColor) {
        self.color = color;
    }

    /// Explicit size edit.
    pub fn set_size(&mut self, size: f64) {
        if size.is_finite() && size > 0.0 {
            self.size = size;
        }
    }

    /// Replace the geometry with canonical points; pressure falls back to the default.
    pub fn replace_points(&mut self, points: Vec<Point>) {
        self.pressure = vec![DEFAULT_PRESSURE; points.len()];
        self.points = points;
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A single-point stroke renders as a dot.
    pub fn is_dot(&self) -> bool {
        self.points.len() == 1
    }

    /// Bounding box of the points (not inflated by pen size).
    pub fn bounds(&self) -> Rect {
        if self.points.is_empty() {
            return Rect::ZERO;
        }

        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;

        for point in &self.points {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }

        Rect::new(min_x, min_y, max_x, max_y)
    }

    /// Eraser hit test: any sample point within `radius` of `point`.
    pub fn hit_by_eraser(&self, point: Point, radius: f64) -> bool {
        self.points.iter().any(|p| p.distance(point) <= radius)
    }

    /// Apply an affine transform to every point.
    pub fn transform(&mut self, affine: Affine) {
        for point in &mut self.points {
            *point = affine * *point;
        }
    }

    /// Copy of this stroke with its points mapped through `affine`.
    pub fn transformed(&self, affine: Affine) -> Self {
        let mut copy = self.clone();
        copy.transform(affine);
        copy
    }
}

/// Wire form of a stroke; optional fields get their defaults on the way in.
#[derive(Deserialize)]
struct StrokeRecord {
    #[serde(default = "Uuid::new_v4")]
    id: StrokeId,
    points: Vec<Point>,
    #[serde(default)]
    color: SerializableColor,
    #[serde(default = "default_size")]
    size: f64,
    #[serde(default)]
    tool: StrokeTool,
    #[serde(default)]
    style: PenStyle,
    #[serde(default)]
    opacity: Option<f64>,
    #[serde(default)]
    pressure: Option<Vec<f64>>,
    #[serde(default)]
    seed: Option<u32>,
}

fn default_size() -> f64 {
    2.0
}

impl From<StrokeRecord> for Stroke {
    fn from(record: StrokeRecord) -> Self {
        let mut stroke = Stroke {
            id: record.id,
            points: record.points,
            color: record.color,
            size: record.size,
            tool: record.tool,
            style: record.style,
            opacity: record.opacity.unwrap_or(1.0),
            pressure: record.pressure.unwrap_or_default(),
            seed: record.seed.unwrap_or_else(generate_seed),
        };
        stroke.normalize();
        stroke
    }
}
