//! # Route library.
//!
//! This library provides route planning over obstacle grids, and allows the executables in this
//! crate to share it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Map module - provides the cost map searched by the planners
pub mod map;

/// Navigation module - A* path planning and the route pipeline
pub mod nav;

/// Defines path types along with simplification and humanization
pub mod path;

/// Parameters for the route executables
pub mod params;
