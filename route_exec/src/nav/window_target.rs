//! Finds the point at which a route leaves the currently visible window of the map.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::path::{Path, PathSegment};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An axis aligned rectangle, usually centred on the current position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub centre: Point2<f64>,

    /// Full width and height of the window
    pub size: Vector2<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Window {
    pub fn new(centre: Point2<f64>, size: Vector2<f64>) -> Self {
        Self { centre, size }
    }

    pub fn min(&self) -> Point2<f64> {
        self.centre - self.size / 2.0
    }

    pub fn max(&self) -> Point2<f64> {
        self.centre + self.size / 2.0
    }

    /// Returns true if the point is inside the window or on its boundary.
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        let (min, max) = (self.min(), self.max());

        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    /// The top, right, bottom and left edges of the window.
    pub fn edges(&self) -> [PathSegment; 4] {
        let (min, max) = (self.min(), self.max());
        let top_right = Point2::new(max.x, min.y);
        let bottom_left = Point2::new(min.x, max.y);

        [
            PathSegment::new(min, top_right),
            PathSegment::new(top_right, max),
            PathSegment::new(max, bottom_left),
            PathSegment::new(bottom_left, min),
        ]
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Get the first point along the path at which it crosses the boundary of the window.
///
/// Segments are checked in path order. If a segment crosses more than one edge the crossing
/// closest to the segment's start is used. Returns `None` if the path never reaches the boundary.
pub fn window_target(path: &Path, window: &Window) -> Option<Point2<f64>> {
    let edges = window.edges();

    for segment in path.segments() {
        let crossing = edges
            .iter()
            .filter_map(|e| segment.intersect(e))
            .min_by(|a, b| {
                let da = (a - segment.start).norm_squared();
                let db = (b - segment.start).norm_squared();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            });

        if crossing.is_some() {
            return crossing;
        }
    }

    None
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn path(points: &[(f64, f64)]) -> Path {
        Path {
            points: points.iter().map(|&(x, y)| Point2::new(x, y)).collect(),
        }
    }

    fn window() -> Window {
        Window::new(Point2::new(0.0, 0.0), Vector2::new(10.0, 10.0))
    }

    #[test]
    fn test_window_bounds() {
        let w = window();

        assert_eq!(w.min(), Point2::new(-5.0, -5.0));
        assert_eq!(w.max(), Point2::new(5.0, 5.0));
        assert!(w.contains(&Point2::new(5.0, -5.0)));
        assert!(!w.contains(&Point2::new(5.1, 0.0)));
    }

    #[test]
    fn test_exit_right_edge() {
        let p = path(&[(0.0, 0.0), (2.0, 1.0), (12.0, 1.0)]);

        assert_eq!(window_target(&p, &window()), Some(Point2::new(5.0, 1.0)));
    }

    #[test]
    fn test_inside_window() {
        let p = path(&[(0.0, 0.0), (2.0, 1.0), (-3.0, 4.0)]);

        assert_eq!(window_target(&p, &window()), None);
        assert_eq!(window_target(&Path::new_empty(), &window()), None);
    }

    #[test]
    fn test_first_crossing_along_path() {
        // Leaves through the bottom, comes back in and leaves through the top
        let p = path(&[(0.0, 0.0), (0.0, 8.0), (-2.0, 8.0), (-2.0, -8.0)]);

        assert_eq!(window_target(&p, &window()), Some(Point2::new(0.0, 5.0)));
    }

    #[test]
    fn test_segment_crossing_two_edges() {
        // A single segment passing through the whole window, the crossing nearest its start wins
        let p = path(&[(-8.0, 1.0), (8.0, 1.0)]);

        assert_eq!(window_target(&p, &window()), Some(Point2::new(-5.0, 1.0)));
    }
}
