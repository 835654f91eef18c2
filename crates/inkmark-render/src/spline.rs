//! Catmull-Rom smoothing backbone shared by the pen styles.

use kurbo::{BezPath, CubicBez, Point};

/// Cubic segment from `points[i]` to `points[i + 1]`.
///
/// Neighbors past either end are clamped to the nearest endpoint.
/// `None` when `points[i + 1]` does not exist.
pub fn catmull_rom_segment(points: &[Point], i: usize) -> Option<CubicBez> {
    let p1 = *points.get(i)?;
    let p2 = *points.get(i + 1)?;
    let last = points.len() - 1;
    let p0 = points[i.saturating_sub(1)];
    let p3 = points[(i + 2).min(last)];

    let cp1 = p1 + (p2 - p0) / 6.0;
    let cp2 = p2 - (p3 - p1) / 6.0;
    Some(CubicBez::new(p1, cp1, cp2, p2))
}

/// Smooth path through every point.
///
/// Two points give a straight segment; fewer give an empty path.
pub fn catmull_rom_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    match points {
        [] | [_] => {}
        [a, b] => {
            path.move_to(*a);
            path.line_to(*b);
        }
        _ => {
            path.move_to(points[0]);
            for seg in (0..points.len()).map_while(|i| catmull_rom_segment(points, i)) {
                path.curve_to(seg.p1, seg.p2, seg.p3);
            }
        }
    }
    path
}

/// Path for the single segment ending at `points[i + 1]`, smoothed with the
/// same neighbors the full path would use. Empty when there is no such segment.
pub fn catmull_rom_segment_path(points: &[Point], i: usize) -> BezPath {
    let mut path = BezPath::new();
    if let [a, b] = points {
        path.move_to(*a);
        path.line_to(*b);
        return path;
    }
    if let Some(seg) = catmull_rom_segment(points, i) {
        path.move_to(seg.p0);
        path.curve_to(seg.p1, seg.p2, seg.p3);
    }
    path
}

/// Straight polyline through every point.
pub fn polyline_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some((first, rest)) = points.split_first() {
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;

    #[test]
    fn test_two_points_are_straight() {
        let path = catmull_rom_path(&[Point::new(0.0, 0.0), Point::new(10.0, 5.0)]);
        let els: Vec<_> = path.elements().to_vec();
        assert_eq!(els, vec![PathEl::MoveTo(Point::new(0.0, 0.0)), PathEl::LineTo(Point::new(10.0, 5.0))]);
    }

    #[test]
    fn test_control_points_follow_formula() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(6.0, 0.0),
            Point::new(12.0, 6.0),
            Point::new(18.0, 6.0),
        ];
        let seg = catmull_rom_segment(&pts, 1).unwrap();
        assert_eq!(seg.p0, pts[1]);
        assert_eq!(seg.p3, pts[2]);
        // cp1 = p1 + (p2 - p0) / 6
        assert!((seg.p1.x - 8.0).abs() < 1e-12);
        assert!((seg.p1.y - 1.0).abs() < 1e-12);
        // cp2 = p2 - (p3 - p1) / 6
        assert!((seg.p2.x - 10.0).abs() < 1e-12);
        assert!((seg.p2.y - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_endpoints_clamped() {
        let pts = [Point::new(0.0, 0.0), Point::new(6.0, 0.0), Point::new(12.0, 0.0)];
        let first = catmull_rom_segment(&pts, 0).unwrap();
        // p0 clamps to p1: cp1 = p1 + (p2 - p1) / 6
        assert!((first.p1.x - 1.0).abs() < 1e-12);
        let last = catmull_rom_segment(&pts, 1).unwrap();
        // p3 clamps to p2: cp2 = p2 - (p2 - p1) / 6
        assert!((last.p2.x - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_segment_out_of_range_is_none() {
        let pts = [Point::new(0.0, 0.0), Point::new(6.0, 0.0)];
        assert!(catmull_rom_segment(&[], 0).is_none());
        assert!(catmull_rom_segment(&pts, 1).is_none());
        assert!(catmull_rom_segment_path(&[], 0).elements().is_empty());
        assert!(catmull_rom_segment_path(&pts[..1], 0).elements().is_empty());
    }

    #[test]
    fn test_path_passes_through_points() {
        let pts = [Point::new(0.0, 0.0), Point::new(5.0, 5.0), Point::new(10.0, 0.0)];
        let path = catmull_rom_path(&pts);
        let ends: Vec<Point> = path.elements().iter().filter_map(|el| el.end_point()).collect();
        assert_eq!(ends, pts.to_vec());
        assert!(catmull_rom_path(&pts[..1]).elements().is_empty());
    }
}
