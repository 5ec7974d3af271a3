//! # Navigation
//!
//! This module provides route planning across a [`CostMap`](crate::map::CostMap).
//!
//! - [`PathPlanner`] - A* search producing the raw cell path between two cells.
//! - [`RoutePlanner`] - Runs the planner then simplifies and humanizes the result into the final
//!   waypoints.
//! - [`window_target`] - Finds where a route leaves a rectangular window, the next target when
//!   only part of the map is visible.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::map::Cell;

pub use path_planner::{
    BlockedEndpoint, NoPathReason, PathPlanner, PathPlannerParams, SearchOutcome, SearchResult,
};
pub use route::{Route, RouteOutcome, RouteParams, RoutePlanner, RouteReport};
pub use window_target::{window_target, Window};

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod arena;
mod path_planner;
mod route;
mod window_target;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("The point {1} given to {0} is outside the map")]
    PointOutsideMap(String, Cell),

    #[error("Invalid navigation parameters: {0}")]
    InvalidParams(String),

    #[error("The cost of cell {0} evaluated to NaN")]
    NanCost(Cell),

    #[error("The parent chain from {0} does not lead back to the start")]
    BrokenParentChain(Cell),
}
