//! # Random Map Test
//!
//! Generates a random Perlin noise map, plans a route from its top left to its bottom right
//! corner and saves the map image, the route and an image of the route drawn over the map into a
//! new session.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::{eyre::WrapErr, Result};
use log::{info, warn};
use nalgebra::{Point2, Vector2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use route_lib::{
    map::{Cell, CostMap},
    nav::{PathPlanner, RoutePlanner},
    params::RouteExecParams,
};
use util::{
    logger::{logger_init, LogLevels},
    session::Session,
};

fn main() -> Result<()> {
    color_eyre::install()?;

    let session = Session::new("random_map", "sessions").wrap_err("Failed to create the session")?;
    logger_init(LogLevels::default(), &session).wrap_err("Failed to initialise logging")?;

    let params = RouteExecParams::default();

    // Generate a random map
    let cost_map = CostMap::generate_random(
        Vector2::new(200, 150),
        Point2::new(0.05, 0.05),
        Point2::new(0.0, 0.0),
        params.cost_map.clone(),
    )?;

    info!("Generated map with {} obstacle cells", cost_map.num_obstacles());

    cost_map
        .save_image(session.session_root.join("random_map.png"))
        .wrap_err("Failed to save the map image")?;
    session
        .save("random_map.json", &cost_map)
        .wrap_err("Failed to save the map")?;

    // Plan corner to corner
    let planner = RoutePlanner::new(PathPlanner::new(params.path_planner), params.route);
    let start = Cell::new(0, 0);
    let end = Cell::new(cost_map.num_cols() as isize - 1, cost_map.num_rows() as isize - 1);

    let outcome = planner.plan_route(&cost_map, start, end, &mut ChaCha8Rng::seed_from_u64(0))?;

    match outcome.route() {
        Some(r) => {
            info!(
                "Route found, length {:.1}",
                r.waypoints.get_length().unwrap_or(0.0)
            );
            r.save_overlay(&cost_map, session.session_root.join("path_planning_result.png"))
                .wrap_err("Failed to save the route image")?;
        }
        None => warn!("No route found: {:?}", outcome),
    }

    session
        .save("random_route.json", &outcome)
        .wrap_err("Failed to save the route")?;

    Ok(())
}
