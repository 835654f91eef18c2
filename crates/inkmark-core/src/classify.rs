//! Shape recognition for freshly drawn strokes.
//!
//! Rules run in a fixed order (line, circle, rectangle, arrow); the first one
//! whose confidence clears its acceptance threshold wins.

use crate::annotation::{Stroke, StrokeTool};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_4, PI, TAU};

/// Minimum points before any classification is attempted.
pub const MIN_CLASSIFY_POINTS: usize = 5;
/// Minimum points for circle detection.
pub const MIN_CIRCLE_POINTS: usize = 10;
/// Minimum points for rectangle detection.
pub const MIN_RECTANGLE_POINTS: usize = 15;
/// Minimum points for arrow detection (shaft plus a head sample).
pub const MIN_ARROW_POINTS: usize = 10;

/// Allowed deviation from a perfectly straight path.
pub const LINE_TOLERANCE: f64 = 0.15;
/// Closing gap allowed, as a fraction of path length.
pub const CLOSED_PATH_RATIO: f64 = 0.15;
/// Roundness needed to call something a circle.
pub const MIN_ROUNDNESS: f64 = 0.8;
/// Vertices of the canonical circle polygon.
pub const CIRCLE_SEGMENTS: usize = 64;
/// Fraction of the path length separating two rectangle corners.
pub const CORNER_SEPARATION_RATIO: f64 = 0.1;
/// Confidence reported for rectangles and arrows.
pub const FIXED_SHAPE_CONFIDENCE: f64 = 0.75;
/// Share of points forming an arrow's shaft.
pub const ARROW_SHAFT_RATIO: f64 = 0.7;
/// Arrow head wing length relative to the shaft.
pub const ARROW_HEAD_RATIO: f64 = 0.2;

/// Recognized shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Line,
    Circle,
    Rectangle,
    Arrow,
}

/// A candidate match.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub kind: ShapeKind,
    /// 0..=1 match quality.
    pub confidence: f64,
    /// Idealized replacement geometry.
    pub canonical_points: Vec<Point>,
}

/// Acceptance thresholds, one per rule. A match is applied only when its
/// confidence is strictly greater than the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    pub line: f64,
    pub circle: f64,
    pub rectangle: f64,
    pub arrow: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            line: 0.8,
            circle: 0.7,
            rectangle: 0.7,
            arrow: 0.75,
        }
    }
}

/// Replaces sloppy strokes with canonical shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShapeClassifier {
    pub thresholds: ClassifierThresholds,
}

impl ShapeClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    /// Best accepted match for a pen stroke, if any.
    pub fn classify(&self, stroke: &Stroke) -> Option<Classification> {
        if stroke.tool() == StrokeTool::Eraser || stroke.len() < MIN_CLASSIFY_POINTS {
            return None;
        }
        self.classify_points(stroke.points())
    }

    /// Run the ordered rules over raw points.
    pub fn classify_points(&self, points: &[Point]) -> Option<Classification> {
        let t = &self.thresholds;
        let rules: [(fn(&[Point]) -> Option<Classification>, f64); 4] = [
            (detect_line, t.line),
            (detect_circle, t.circle),
            (detect_rectangle, t.rectangle),
            (detect_arrow, t.arrow),
        ];
        rules
            .iter()
            .find_map(|(detect, threshold)| detect(points).filter(|c| c.confidence > *threshold))
    }

    /// Classify and, on a match, swap the stroke's geometry for the canonical
    /// points. Pressure data is discarded.
    pub fn apply(&self, stroke: &mut Stroke) -> Option<ShapeKind> {
        let classification = self.classify(stroke)?;
        log::debug!(
            "Recognized {:?} (confidence {:.3}) for stroke {}",
            classification.kind,
            classification.confidence,
            stroke.id()
        );
        stroke.replace_points(classification.canonical_points);
        Some(classification.kind)
    }
}

/// Sum of segment lengths.
pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

fn is_closed(points: &[Point], total: f64) -> bool {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => first.distance(*last) <= CLOSED_PATH_RATIO * total,
        _ => false,
    }
}

/// Drop a trailing point that duplicates the first one.
fn without_closing_point(points: &[Point]) -> &[Point] {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() > 1 && first.distance(*last) < 1e-9 => {
            &points[..points.len() - 1]
        }
        _ => points,
    }
}

fn centroid(points: &[Point]) -> Point {
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / n, sy / n)
}

/// Line rule: direct distance over path length.
pub fn detect_line(points: &[Point]) -> Option<Classification> {
    if points.len() < 2 {
        return None;
    }
    let total = path_length(points);
    if total <= f64::EPSILON {
        return None;
    }
    let first = points[0];
    let last = points[points.len() - 1];
    let straightness = first.distance(last) / total;
    if straightness > 1.0 - LINE_TOLERANCE {
        Some(Classification {
            kind: ShapeKind::Line,
            confidence: straightness,
            canonical_points: vec![first, last],
        })
    } else {
        None
    }
}

/// Circle rule: closed path whose radii deviate little from their mean.
pub fn detect_circle(points: &[Point]) -> Option<Classification> {
    if points.len() < MIN_CIRCLE_POINTS {
        return None;
    }
    let total = path_length(points);
    if total <= f64::EPSILON || !is_closed(points, total) {
        return None;
    }

    let samples = without_closing_point(points);
    let center = centroid(samples);
    let radii: Vec<f64> = samples.iter().map(|p| p.distance(center)).collect();
    let avg_radius = radii.iter().sum::<f64>() / radii.len() as f64;
    if avg_radius <= f64::EPSILON {
        return None;
    }
    let mean_deviation = radii.iter().map(|r| (r - avg_radius).abs()).sum::<f64>() / radii.len() as f64;
    let roundness = 1.0 - mean_deviation / avg_radius;
    if roundness <= MIN_ROUNDNESS {
        return None;
    }

    let mut canonical: Vec<Point> = (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let angle = TAU * i as f64 / CIRCLE_SEGMENTS as f64;
            Point::new(center.x + avg_radius * angle.cos(), center.y + avg_radius * angle.sin())
        })
        .collect();
    canonical.push(canonical[0]);

    Some(Classification {
        kind: ShapeKind::Circle,
        confidence: roundness,
        canonical_points: canonical,
    })
}

/// Turning angle at `i` between the chords `p[i-2]→p[i]` and `p[i]→p[i+2]`.
fn turn_angle(a: Point, b: Point, c: Point) -> Option<f64> {
    let v1: Vec2 = b - a;
    let v2: Vec2 = c - b;
    if v1.hypot2() <= f64::EPSILON || v2.hypot2() <= f64::EPSILON {
        return None;
    }
    let mut delta = v2.atan2() - v1.atan2();
    while delta > PI {
        delta -= TAU;
    }
    while delta < -PI {
        delta += TAU;
    }
    Some(delta.abs())
}

/// Corner points of a closed path, sharpest turn per run of candidates.
pub fn detect_corners(points: &[Point]) -> Vec<Point> {
    let samples = without_closing_point(points);
    let n = samples.len();
    if n < 5 {
        return Vec::new();
    }
    let total = path_length(points);
    let min_separation = CORNER_SEPARATION_RATIO * total;
    let at = |i: isize| samples[i.rem_euclid(n as isize) as usize];

    let angles: Vec<Option<f64>> = (0..n as isize)
        .map(|i| turn_angle(at(i - 2), at(i), at(i + 2)).filter(|a| *a > FRAC_PI_4))
        .collect();

    // Start scanning just after a non-candidate so runs don't straddle the seam.
    let start = angles.iter().position(Option::is_none).unwrap_or(0);
    let mut corners: Vec<Point> = Vec::new();
    let mut best: Option<(usize, f64)> = None;

    let flush = |best: &mut Option<(usize, f64)>, corners: &mut Vec<Point>| {
        if let Some((idx, _)) = best.take() {
            let candidate = samples[idx];
            if corners.iter().all(|c| c.distance(candidate) >= min_separation) {
                corners.push(candidate);
            }
        }
    };

    for offset in 0..n {
        let idx = (start + offset) % n;
        match angles[idx] {
            Some(angle) => {
                if best.is_none_or(|(_, a)| angle > a) {
                    best = Some((idx, angle));
                }
            }
            None => flush(&mut best, &mut corners),
        }
    }
    flush(&mut best, &mut corners);
    corners
}

/// Rectangle rule: closed path with exactly four corners.
pub fn detect_rectangle(points: &[Point]) -> Option<Classification> {
    if points.len() < MIN_RECTANGLE_POINTS {
        return None;
    }
    let total = path_length(points);
    if total <= f64::EPSILON || !is_closed(points, total) {
        return None;
    }
    let corners = detect_corners(points);
    if corners.len() != 4 {
        return None;
    }

    let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    Some(Classification {
        kind: ShapeKind::Rectangle,
        confidence: FIXED_SHAPE_CONFIDENCE,
        canonical_points: vec![
            Point::new(min_x, min_y),
            Point::new(max_x, min_y),
            Point::new(max_x, max_y),
            Point::new(min_x, max_y),
            Point::new(min_x, min_y),
        ],
    })
}

/// Arrow rule: a straight shaft followed by a head starting at its tip.
pub fn detect_arrow(points: &[Point]) -> Option<Classification> {
    if points.len() < MIN_ARROW_POINTS {
        return None;
    }
    let split = (points.len() as f64 * ARROW_SHAFT_RATIO).floor() as usize;
    let (shaft, head) = points.split_at(split);
    let line = detect_line(shaft).filter(|l| l.confidence >= 0.8)?;
    let start = line.canonical_points[0];
    let end = line.canonical_points[1];
    let line_length = start.distance(end);
    if line_length <= f64::EPSILON {
        return None;
    }
    if head.first()?.distance(end) > 0.1 * line_length {
        return None;
    }

    let direction = (end - start).atan2();
    let wing_length = ARROW_HEAD_RATIO * line_length;
    let wing = |offset: f64| {
        let angle = direction + PI + offset;
        Point::new(end.x + wing_length * angle.cos(), end.y + wing_length * angle.sin())
    };
    let spread = PI / 6.0;

    Some(Classification {
        kind: ShapeKind::Arrow,
        confidence: FIXED_SHAPE_CONFIDENCE,
        canonical_points: vec![start, end, wing(spread), end, wing(-spread)],
    })
}
