//! Main route planning executable entry point.
//!
//! Loads a map image, plans a route between the two given cells and prints the resulting
//! waypoints as JSON on stdout. If a window is given the point at which the route leaves it is
//! also printed.
//!
//! The process exits with an error if no route could be found.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use nalgebra::{Point2, Vector2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::path::PathBuf;
use structopt::StructOpt;

// Internal
use route_lib::{
    map::{Cell, CostMap},
    nav::{window_target, PathPlanner, RouteOutcome, RoutePlanner, Window},
    params::RouteExecParams,
};
use util::{
    logger::{logger_init, LevelFilter, LogLevels},
    session::Session,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "route_exec", about = "Plan a route across a map image")]
struct Opt {
    /// Map image, bright pixels are obstacles
    #[structopt(parse(from_os_str))]
    map_image: PathBuf,

    start_x: isize,
    start_y: isize,
    end_x: isize,
    end_y: isize,

    /// Seed for the waypoint jitter, random if not given
    #[structopt(long)]
    seed: Option<u64>,

    /// Parameter file to use instead of `params/route_exec.toml`
    #[structopt(long, parse(from_os_str))]
    params: Option<PathBuf>,

    /// Centre of the visible window, as `X Y`
    #[structopt(long, number_of_values = 2)]
    window_centre: Option<Vec<f64>>,

    /// Width and height of the visible window
    #[structopt(long, number_of_values = 2)]
    window_size: Option<Vec<f64>>,

    /// Save an image of the route drawn over the map to this path
    #[structopt(long, parse(from_os_str))]
    output_image: Option<PathBuf>,

    /// Also print debug messages on the console
    #[structopt(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct Output {
    waypoints: Vec<Point2<f64>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    window_target: Option<Point2<f64>>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("route_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    let levels = LogLevels {
        console: if opt.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        ..Default::default()
    };
    logger_init(levels, &session).wrap_err("Failed to initialise logging")?;

    info!("Route Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let params: RouteExecParams = match opt.params {
        Some(ref p) => util::params::load_path(p),
        None => util::params::load("route_exec.toml"),
    }
    .wrap_err("Could not load route_exec params")?;

    info!("Exec parameters loaded");
    debug!("{:#?}", params);

    // ---- LOAD MAP ----

    let cost_map = CostMap::from_image(&opt.map_image, params.cost_map)
        .wrap_err_with(|| format!("Could not load the map from {:?}", opt.map_image))?;

    info!(
        "Loaded {}x{} map with {} obstacle cells",
        cost_map.num_cols(),
        cost_map.num_rows(),
        cost_map.num_obstacles()
    );

    // ---- PLAN ----

    let mut rng = match opt.seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };

    let planner = RoutePlanner::new(PathPlanner::new(params.path_planner), params.route);

    let start = Cell::new(opt.start_x, opt.start_y);
    let end = Cell::new(opt.end_x, opt.end_y);

    let route = match planner
        .plan_route(&cost_map, start, end, &mut rng)
        .wrap_err("Failed to plan the route")?
    {
        RouteOutcome::Found(r) => r,
        RouteOutcome::Blocked(b) => {
            return Err(eyre!("No route: the {:?} endpoint(s) are blocked", b));
        }
        RouteOutcome::NoPath {
            reason,
            num_iterations,
        } => {
            return Err(eyre!(
                "No route found ({:?} after {} iterations)",
                reason,
                num_iterations
            ));
        }
    };

    // ---- WINDOW TARGET ----

    let window = match (opt.window_centre, opt.window_size) {
        (Some(c), Some(s)) => Some(Window::new(
            Point2::new(c[0], c[1]),
            Vector2::new(s[0], s[1]),
        )),
        (None, None) => None,
        _ => {
            return Err(eyre!(
                "--window-centre and --window-size must be given together"
            ))
        }
    };

    let target = window.and_then(|w| {
        let t = window_target(&route.waypoints, &w);
        if t.is_none() {
            warn!("The route does not leave the window");
        }
        t
    });

    // ---- OUTPUT ----

    if let Some(ref path) = opt.output_image {
        route
            .save_overlay(&cost_map, path)
            .wrap_err_with(|| format!("Could not save the route image to {:?}", path))?;
        info!("Route image saved to {:?}", path);
    }

    let output = Output {
        waypoints: route.waypoints.points,
        window_target: target,
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&output).wrap_err("Could not serialise the route")?
    );

    info!("End of execution");

    Ok(())
}
