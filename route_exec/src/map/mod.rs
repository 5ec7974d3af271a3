//! # Map
//!
//! This module implements the [`CostMap`] type, a read-only traversability grid which the
//! [`PathPlanner`](crate::nav::PathPlanner) searches through. Cells are addressed by [`Cell`]
//! coordinates, with `x` the column and `y` the row, and the origin at the top-left of the grid.

// ------------------------------------------------------------------------------------------------
// MODS
// ------------------------------------------------------------------------------------------------

/// Implements the [`CostMap`] type
mod cost_map;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use cost_map::{is_obstacle, CostMap, CostMapError, CostMapParams};

/// Integer grid coordinate, `x` being the column and `y` the row.
///
/// Coordinates are signed so that neighbours of edge cells can be formed and then rejected by the
/// bounds check rather than underflowing.
pub type Cell = nalgebra::Point2<isize>;
