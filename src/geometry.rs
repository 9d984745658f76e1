//! Planar geometry primitives.
//!
//! Everything operates in a metric coordinate system (metres) and the hot
//! paths work on squared Euclidean distances, so thresholds elsewhere in the
//! crate are squared as well.

use geo::{Coord, FrechetDistance, LineInterpolatePoint, LineLocatePoint, LineString, Point as GeoPoint};

use crate::Point;

/// Squared Euclidean distance between two points.
#[inline]
pub fn dist2(a: Point, b: Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Squared distance from `p` to the segment `[a, b]`.
///
/// Degenerate segments (`a == b`) fall back to the point distance.
pub fn seg_dist2(p: Point, a: Point, b: Point) -> f64 {
    let len2 = dist2(a, b);
    if len2 == 0.0 {
        return dist2(p, a);
    }
    let t = ((p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y)) / len2;
    let t = t.clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y));
    dist2(p, proj)
}

/// Total Euclidean length of a polyline in metres.
pub fn polyline_length(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    use geo::EuclideanLength;
    to_line_string(points).euclidean_length()
}

/// Project `p` onto a polyline, returning the projected point and its
/// squared distance to `p`.
///
/// Returns `None` for polylines with fewer than two vertices.
pub fn project_onto_polyline(p: Point, points: &[Point]) -> Option<(Point, f64)> {
    if points.len() < 2 {
        return None;
    }
    let line = to_line_string(points);
    // Locate the fractional position along the line, then interpolate it
    // back to a concrete point.
    let frac = line.line_locate_point(&GeoPoint::new(p.x, p.y))?;
    let projected = line.line_interpolate_point(frac)?;
    let projected = Point::new(projected.x(), projected.y());
    Some((projected, dist2(p, projected)))
}

/// Discrete Fréchet distance between two polylines, in metres.
///
/// Used as a similarity measure between an observed trace and a candidate
/// path through the road graph.
pub fn polyline_frechet(a: &[Point], b: &[Point]) -> f64 {
    to_line_string(a).frechet_distance(&to_line_string(b))
}

fn to_line_string(points: &[Point]) -> LineString<f64> {
    LineString::from(
        points
            .iter()
            .map(|p| Coord { x: p.x, y: p.y })
            .collect::<Vec<_>>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dist2() {
        assert_eq!(dist2(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 25.0);
        assert_eq!(dist2(Point::new(1.0, 1.0), Point::new(1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_seg_dist2_perpendicular() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        // Foot of the perpendicular lies inside the segment.
        assert_eq!(seg_dist2(Point::new(5.0, 3.0), a, b), 9.0);
    }

    #[test]
    fn test_seg_dist2_clamped_to_endpoint() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(seg_dist2(Point::new(-3.0, 4.0), a, b), 25.0);
        assert_eq!(seg_dist2(Point::new(13.0, 4.0), a, b), 25.0);
    }

    #[test]
    fn test_seg_dist2_degenerate() {
        let a = Point::new(2.0, 2.0);
        assert_eq!(seg_dist2(Point::new(5.0, 6.0), a, a), 25.0);
    }

    #[test]
    fn test_polyline_length() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(3.0, 4.0),
            Point::new(3.0, 14.0),
        ];
        assert!((polyline_length(&pts) - 15.0).abs() < 1e-9);
        assert_eq!(polyline_length(&pts[..1]), 0.0);
    }

    #[test]
    fn test_project_onto_polyline() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        let (proj, d2) = project_onto_polyline(Point::new(40.0, 5.0), &pts).unwrap();
        assert!((proj.x - 40.0).abs() < 1e-6);
        assert!(proj.y.abs() < 1e-6);
        assert!((d2 - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_polyline_frechet_identical() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(50.0, 0.0),
            Point::new(100.0, 0.0),
        ];
        assert!(polyline_frechet(&pts, &pts) < 1e-9);
    }

    #[test]
    fn test_polyline_frechet_offset() {
        let a = vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        let b = vec![Point::new(0.0, 10.0), Point::new(100.0, 10.0)];
        assert!((polyline_frechet(&a, &b) - 10.0).abs() < 1e-9);
    }
}
