//! Complete route planning, from a pair of cells to the final humanized waypoints.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use log::{debug, info};
use nalgebra::Point2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    map::{Cell, CostMap, CostMapError},
    path::{Path, RawPath, DEFAULT_COLLINEAR_TOLERANCE, DEFAULT_HUMANIZE_MAX_OFFSET},
};

use super::{BlockedEndpoint, NavError, NoPathReason, PathPlanner, SearchOutcome};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Colour of the path cells and waypoints in route overlays
const PATH_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);

const START_COLOUR: Rgb<u8> = Rgb([255, 0, 0]);

const END_COLOUR: Rgb<u8> = Rgb([0, 0, 255]);

/// Radius in pixels of the start and end markers
const MARKER_RADIUS: f64 = 3.0;

/// Radius in pixels of the waypoint markers
const WAYPOINT_RADIUS: f64 = 1.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RoutePlanner {
    planner: PathPlanner,
    params: RouteParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteParams {
    /// Points whose cross product with their neighbours is below this are removed as collinear.
    pub collinear_tolerance: f64,

    /// Maximum offset on each axis applied to the inserted midpoints.
    pub humanize_max_offset: f64,
}

/// A planned route at each stage of processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub raw: RawPath,
    pub simplified: Path,
    pub waypoints: Path,
}

/// Summary of a planning request, saved into the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteReport {
    pub start: Cell,
    pub end: Cell,
    pub outcome: RouteOutcome,
    pub num_iterations: usize,
    pub num_nodes: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RouteOutcome {
    Found(Route),

    Blocked(BlockedEndpoint),

    NoPath {
        reason: NoPathReason,
        num_iterations: usize,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for RouteParams {
    fn default() -> Self {
        Self {
            collinear_tolerance: DEFAULT_COLLINEAR_TOLERANCE,
            humanize_max_offset: DEFAULT_HUMANIZE_MAX_OFFSET,
        }
    }
}

impl RoutePlanner {
    pub fn new(planner: PathPlanner, params: RouteParams) -> Self {
        Self { planner, params }
    }

    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    /// Plan a route from the start to the end cell.
    ///
    /// The raw path found by the [`PathPlanner`] is simplified and then humanized using `rng`. A
    /// [`RouteReport`] is saved into the current session, if there is one.
    pub fn plan_route<R: Rng>(
        &self,
        cost_map: &CostMap,
        start: Cell,
        end: Cell,
        rng: &mut R,
    ) -> Result<RouteOutcome, NavError> {
        if !self.params.collinear_tolerance.is_finite() || self.params.collinear_tolerance < 0.0 {
            return Err(NavError::InvalidParams(format!(
                "collinear_tolerance must be finite and non-negative, got {}",
                self.params.collinear_tolerance
            )));
        }
        if !self.params.humanize_max_offset.is_finite() || self.params.humanize_max_offset < 0.0 {
            return Err(NavError::InvalidParams(format!(
                "humanize_max_offset must be finite and non-negative, got {}",
                self.params.humanize_max_offset
            )));
        }

        let result = self.planner.plan(cost_map, start, end)?;
        let (num_iterations, num_nodes) = (result.num_iterations, result.num_nodes);

        let outcome = match result.outcome {
            SearchOutcome::Found(raw) => {
                let simplified = raw.to_path().simplify(self.params.collinear_tolerance);
                let waypoints = simplified.humanize(rng, self.params.humanize_max_offset);

                debug!(
                    "Route has {} raw points, {} after simplification and {} waypoints",
                    raw.get_num_points(),
                    simplified.get_num_points(),
                    waypoints.get_num_points()
                );

                RouteOutcome::Found(Route {
                    raw,
                    simplified,
                    waypoints,
                })
            }
            SearchOutcome::Blocked(b) => RouteOutcome::Blocked(b),
            SearchOutcome::NoPath(reason) => RouteOutcome::NoPath {
                reason,
                num_iterations,
            },
        };

        let report = RouteReport {
            start,
            end,
            outcome,
            num_iterations,
            num_nodes,
        };
        util::session::save_with_timestamp("route/report.json", &report);

        if let RouteOutcome::Found(ref r) = report.outcome {
            info!(
                "Route from {} to {} planned with {} waypoints",
                start,
                end,
                r.waypoints.get_num_points()
            );
        }

        Ok(report.outcome)
    }
}

impl Route {
    /// Draw the route over the map.
    ///
    /// Raw path cells and waypoints are drawn in green on top of the grayscale map, then the
    /// start is marked in red and the end in blue.
    pub fn render_overlay(&self, cost_map: &CostMap) -> Result<RgbImage, CostMapError> {
        let mut image = cost_map.to_rgb_image()?;

        for cell in self.raw.cells.iter() {
            fill_disc(&mut image, &cell_centre(cell), 0.0, PATH_COLOUR);
        }
        for point in self.waypoints.points.iter() {
            fill_disc(&mut image, point, WAYPOINT_RADIUS, PATH_COLOUR);
        }

        if let (Some(start), Some(end)) = (self.raw.cells.first(), self.raw.cells.last()) {
            fill_disc(&mut image, &cell_centre(start), MARKER_RADIUS, START_COLOUR);
            fill_disc(&mut image, &cell_centre(end), MARKER_RADIUS, END_COLOUR);
        }

        Ok(image)
    }

    /// Draw the route over the map and save it as an image.
    pub fn save_overlay<P: AsRef<std::path::Path>>(
        &self,
        cost_map: &CostMap,
        path: P,
    ) -> Result<(), CostMapError> {
        self.render_overlay(cost_map)?
            .save(path)
            .map_err(CostMapError::ImageError)
    }
}

impl RouteOutcome {
    pub fn route(&self) -> Option<&Route> {
        match self {
            RouteOutcome::Found(r) => Some(r),
            _ => None,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn cell_centre(cell: &Cell) -> Point2<f64> {
    Point2::new(cell.x as f64, cell.y as f64)
}

/// Colour every pixel within `radius` of `centre`, clipped to the image.
fn fill_disc(image: &mut RgbImage, centre: &Point2<f64>, radius: f64, colour: Rgb<u8>) {
    let (cx, cy) = (centre.x.round() as i64, centre.y.round() as i64);
    let r = radius.ceil() as i64;
    let (width, height) = (image.width() as i64, image.height() as i64);

    for y in (cy - r).max(0)..=(cy + r).min(height - 1) {
        for x in (cx - r).max(0)..=(cx + r).min(width - 1) {
            let (dx, dy) = ((x - cx) as f64, (y - cy) as f64);
            if dx * dx + dy * dy <= radius * radius {
                image.put_pixel(x as u32, y as u32, colour);
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
