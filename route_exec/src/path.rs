//! # Path
//!
//! This module defines the paths produced by the route planner:
//!
//! - [`RawPath`] - the chain of grid cells found by the A* search, from start to end inclusive.
//! - [`Path`] - a sequence of floating point waypoints, produced by simplifying a raw path and
//!   then humanizing it.
//!
//! It also provides [`PathSegment`], the straight line between two consecutive path points, which
//! can be intersected with other segments.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Point2, Vector2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::map::Cell;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default tolerance on the cross product below which three points are considered collinear.
pub const DEFAULT_COLLINEAR_TOLERANCE: f64 = 1e-6;

/// Default maximum per-axis offset applied to humanized midpoints.
pub const DEFAULT_HUMANIZE_MAX_OFFSET: f64 = 2.5;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A path of grid cells produced by the A* search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawPath {
    /// Cells along the path, the first being the start and the last the end.
    pub cells: Vec<Cell>,

    /// The accumulated cost (`g`) at which each cell was reached, same length as `cells`.
    pub costs: Vec<f64>,
}

/// A path of waypoints, in grid coordinates.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Path {
    pub points: Vec<Point2<f64>>,
}

/// A segment between two path points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathSegment {
    /// The start point of the segment
    pub start: Point2<f64>,

    /// The target of the segment
    pub target: Point2<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RawPath {
    /// Get the number of cells in the path
    pub fn get_num_points(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The total cost of the path, i.e. the cost at which the end cell was reached.
    pub fn total_cost(&self) -> Option<f64> {
        self.costs.last().copied()
    }

    /// Convert the cells into a waypoint path without any simplification.
    pub fn to_path(&self) -> Path {
        Path {
            points: self
                .cells
                .iter()
                .map(|c| Point2::new(c.x as f64, c.y as f64))
                .collect(),
        }
    }
}

impl Path {
    /// Create a new empty path
    pub fn new_empty() -> Self {
        Path { points: Vec::new() }
    }

    /// Get the number of points in the path
    pub fn get_num_points(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Return the length of the path.
    ///
    /// If the path is empty (not enough points) then `None` is returned.
    pub fn get_length(&self) -> Option<f64> {
        if self.points.len() < 2 {
            return None;
        }

        Some(self.segments().map(|s| s.length()).sum())
    }

    /// Iterate over the segments joining consecutive points of the path.
    pub fn segments(&self) -> impl Iterator<Item = PathSegment> + '_ {
        self.points.windows(2).map(|w| PathSegment {
            start: w[0],
            target: w[1],
        })
    }

    /// Remove all points which are collinear with their neighbours, keeping only the turning
    /// points and both endpoints.
    ///
    /// Each interior point is tested against the last kept point and the next point in this path.
    /// If the magnitude of the cross product of `(prev -> current)` and `(prev -> next)` is no
    /// greater than `tolerance` the point is dropped.
    ///
    /// Simplifying an already simplified path returns it unchanged. Negative or NaN tolerances
    /// are treated as zero.
    pub fn simplify(&self, tolerance: f64) -> Path {
        let tolerance = tolerance.max(0.0);

        let mut simplified = Path {
            points: Vec::with_capacity(self.points.len()),
        };

        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => return simplified,
        };

        simplified.points.push(first);
        if self.points.len() == 1 {
            return simplified;
        }

        for window in self.points.windows(3) {
            let current = window[1];
            let next = window[2];

            // Safe to index, the first point is always kept
            let prev = simplified.points[simplified.points.len() - 1];

            if cross(&(current - prev), &(next - prev)).abs() > tolerance {
                simplified.points.push(current);
            }
        }

        simplified.points.push(last);

        simplified
    }

    /// Produce a humanized version of this path.
    ///
    /// Between every pair of consecutive points a midpoint is inserted, offset on each axis by an
    /// independent uniform random value in `[-max_offset, max_offset]`. The endpoints are
    /// unchanged, and a path of `n >= 1` points produces `2(n - 1) + 1` points.
    ///
    /// A `max_offset` which isn't finite and positive inserts the exact midpoints.
    pub fn humanize<R: Rng>(&self, rng: &mut R, max_offset: f64) -> Path {
        let mut humanized = Path {
            points: Vec::with_capacity(self.points.len() * 2),
        };

        for segment in self.segments() {
            humanized.points.push(segment.start);

            let offset = if max_offset.is_finite() && max_offset > 0.0 {
                Vector2::new(
                    rng.gen_range(-max_offset..=max_offset),
                    rng.gen_range(-max_offset..=max_offset),
                )
            } else {
                Vector2::zeros()
            };

            humanized.points.push(segment.midpoint() + offset);
        }

        if let Some(last) = self.points.last() {
            humanized.points.push(*last);
        }

        humanized
    }
}

impl PathSegment {
    pub fn new(start: Point2<f64>, target: Point2<f64>) -> Self {
        Self { start, target }
    }

    /// The length of the segment
    pub fn length(&self) -> f64 {
        (self.target - self.start).norm()
    }

    /// The point halfway along the segment
    pub fn midpoint(&self) -> Point2<f64> {
        nalgebra::center(&self.start, &self.target)
    }

    /// Returns `true` if the point lies inside the axis aligned bounding box of the segment,
    /// including its boundary.
    pub fn bounds_contain(&self, point: &Point2<f64>) -> bool {
        point.x >= self.start.x.min(self.target.x)
            && point.x <= self.start.x.max(self.target.x)
            && point.y >= self.start.y.min(self.target.y)
            && point.y <= self.start.y.max(self.target.y)
    }

    /// Get the point at which this segment crosses `other`.
    ///
    /// The lines through both segments are intersected, then the intersection is checked to lie
    /// within the bounding boxes of both segments. Parallel and collinear segments never
    /// intersect.
    pub fn intersect(&self, other: &PathSegment) -> Option<Point2<f64>> {
        let (x1, y1) = (self.start.x, self.start.y);
        let (x2, y2) = (self.target.x, self.target.y);
        let (x3, y3) = (other.start.x, other.start.y);
        let (x4, y4) = (other.target.x, other.target.y);

        let det = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
        if det == 0.0 {
            return None;
        }

        let a = x1 * y2 - y1 * x2;
        let b = x3 * y4 - y3 * x4;

        let point = Point2::new(
            (a * (x3 - x4) - (x1 - x2) * b) / det,
            (a * (y3 - y4) - (y1 - y2) * b) / det,
        );

        if self.bounds_contain(&point) && other.bounds_contain(&point) {
            Some(point)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Z component of the cross product of two 2D vectors.
fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn path(points: &[(f64, f64)]) -> Path {
        Path {
            points: points.iter().map(|&(x, y)| Point2::new(x, y)).collect(),
        }
    }

    #[test]
    fn test_simplify_straight_diagonal() {
        let diag = path(&(0..10).map(|i| (i as f64, i as f64)).collect::<Vec<_>>());

        let simplified = diag.simplify(DEFAULT_COLLINEAR_TOLERANCE);

        assert_eq!(simplified, path(&[(0.0, 0.0), (9.0, 9.0)]));
    }

    #[test]
    fn test_simplify_keeps_turns() {
        // Along x, then diagonal, then along y
        let raw = path(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (3.0, 1.0),
            (4.0, 2.0),
            (4.0, 3.0),
            (4.0, 4.0),
        ]);

        let simplified = raw.simplify(DEFAULT_COLLINEAR_TOLERANCE);

        assert_eq!(
            simplified,
            path(&[(0.0, 0.0), (2.0, 0.0), (4.0, 2.0), (4.0, 4.0)])
        );

        // Idempotent
        assert_eq!(simplified.simplify(DEFAULT_COLLINEAR_TOLERANCE), simplified);
    }

    #[test]
    fn test_simplify_degenerate() {
        assert!(Path::new_empty()
            .simplify(DEFAULT_COLLINEAR_TOLERANCE)
            .is_empty());

        let single = path(&[(3.0, 4.0)]);
        assert_eq!(single.simplify(DEFAULT_COLLINEAR_TOLERANCE), single);

        let pair = path(&[(3.0, 4.0), (5.0, 4.0)]);
        assert_eq!(pair.simplify(DEFAULT_COLLINEAR_TOLERANCE), pair);
    }

    #[test]
    fn test_humanize_length_and_endpoints() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let simplified = path(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (20.0, 20.0)]);

        let humanized = simplified.humanize(&mut rng, DEFAULT_HUMANIZE_MAX_OFFSET);

        assert_eq!(humanized.get_num_points(), 2 * (4 - 1) + 1);
        assert_eq!(humanized.points[0], simplified.points[0]);
        assert_eq!(humanized.points[6], simplified.points[3]);

        // Input points are kept at even indices, midpoints are within the offset bounds
        for (i, segment) in simplified.segments().enumerate() {
            assert_eq!(humanized.points[2 * i], segment.start);

            let offset = humanized.points[2 * i + 1] - segment.midpoint();
            assert!(offset.x.abs() <= DEFAULT_HUMANIZE_MAX_OFFSET + 1e-9);
            assert!(offset.y.abs() <= DEFAULT_HUMANIZE_MAX_OFFSET + 1e-9);
        }
    }

    #[test]
    fn test_degenerate_parameters() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let line = path(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 0.0)]);
        let ends = path(&[(0.0, 0.0), (4.0, 0.0)]);

        assert_eq!(line.simplify(-1.0), ends);
        assert_eq!(line.simplify(std::f64::NAN), ends);

        // Turns are still kept with a NaN tolerance
        let corner = path(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0)]);
        assert_eq!(corner.simplify(std::f64::NAN), corner);

        let midpoints = path(&[(0.0, 0.0), (2.0, 0.0), (4.0, 0.0)]);
        assert_eq!(ends.humanize(&mut rng, std::f64::INFINITY), midpoints);
        assert_eq!(ends.humanize(&mut rng, std::f64::NAN), midpoints);
        assert_eq!(ends.humanize(&mut rng, -1.0), midpoints);
    }

    #[test]
    fn test_humanize_is_reproducible() {
        let simplified = path(&[(0.0, 0.0), (10.0, 5.0), (12.0, 30.0)]);

        let a = simplified.humanize(&mut ChaCha8Rng::seed_from_u64(42), 2.5);
        let b = simplified.humanize(&mut ChaCha8Rng::seed_from_u64(42), 2.5);

        assert_eq!(a, b);
    }

    #[test]
    fn test_humanize_degenerate() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        assert!(Path::new_empty().humanize(&mut rng, 2.5).is_empty());

        let single = path(&[(1.0, 1.0)]);
        assert_eq!(single.humanize(&mut rng, 2.5), single);

        // No offset gives exact midpoints
        let pair = path(&[(0.0, 0.0), (4.0, 2.0)]);
        assert_eq!(
            pair.humanize(&mut rng, 0.0),
            path(&[(0.0, 0.0), (2.0, 1.0), (4.0, 2.0)])
        );
    }

    #[test]
    fn test_segment_intersection() {
        let horizontal = PathSegment::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
        let vertical = PathSegment::new(Point2::new(5.0, -5.0), Point2::new(5.0, 5.0));

        assert_eq!(horizontal.intersect(&vertical), Some(Point2::new(5.0, 0.0)));
        assert_eq!(vertical.intersect(&horizontal), Some(Point2::new(5.0, 0.0)));

        // Parallel
        let parallel = PathSegment::new(Point2::new(0.0, 1.0), Point2::new(10.0, 1.0));
        assert_eq!(horizontal.intersect(&parallel), None);

        // Collinear and overlapping
        let collinear = PathSegment::new(Point2::new(5.0, 0.0), Point2::new(15.0, 0.0));
        assert_eq!(horizontal.intersect(&collinear), None);

        // Lines cross but outside the segments
        let short = PathSegment::new(Point2::new(5.0, 1.0), Point2::new(5.0, 5.0));
        assert_eq!(horizontal.intersect(&short), None);

        // Touching at an endpoint counts
        let touching = PathSegment::new(Point2::new(10.0, 0.0), Point2::new(10.0, 5.0));
        assert_eq!(horizontal.intersect(&touching), Some(Point2::new(10.0, 0.0)));
    }

    #[test]
    fn test_length() {
        let p = path(&[(0.0, 0.0), (3.0, 4.0), (3.0, 10.0)]);
        assert_eq!(p.get_length(), Some(11.0));
        assert_eq!(path(&[(1.0, 1.0)]).get_length(), None);
    }
}
