//! # Route Executable Parameters
//!
//! This module provides the parameters for the route executables, loaded from
//! `params/route_exec.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::{
    map::CostMapParams,
    nav::{PathPlannerParams, RouteParams},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// All parameters of the route executable. Missing sections and keys take their default values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteExecParams {
    pub cost_map: CostMapParams,

    pub path_planner: PathPlannerParams,

    pub route: RouteParams,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_params() {
        let params: RouteExecParams = util::params::from_str(
            r#"
            [cost_map]
            obstacle_threshold = 128.0
            search_radius = 4

            [path_planner]
            iteration_cap_factor = 3

            [route]
            humanize_max_offset = 0.0
            "#,
        )
        .unwrap();

        assert_eq!(params.cost_map.obstacle_threshold, 128.0);
        assert_eq!(params.cost_map.search_radius, 4);
        assert_eq!(params.cost_map.proximity_weight, 10.0);
        assert_eq!(params.path_planner.iteration_cap_factor, 3);
        assert_eq!(params.route.humanize_max_offset, 0.0);
        assert_eq!(params.route.collinear_tolerance, 1e-6);
    }

    #[test]
    fn test_shipped_params() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("params")
            .join("route_exec.toml");
        let params: RouteExecParams = util::params::load_path(path).unwrap();

        assert_eq!(params.cost_map.obstacle_threshold, 200.0);
        assert_eq!(params.cost_map.search_radius, 10);
        assert_eq!(params.path_planner.iteration_cap_factor, 2);
        assert_eq!(params.route.humanize_max_offset, 2.5);
    }
}
