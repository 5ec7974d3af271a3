//! Plans minimum cost paths through a [`CostMap`], using an A* algorithm.
//!
//! The cost of moving into a cell is the move length (1 for orthogonal moves, √2 for diagonal
//! ones) plus the cell's [proximity cost](CostMap::proximity_cost), which biases paths away from
//! obstacles without forbidding them from passing close by. The heuristic is the Manhattan
//! distance to the end.
//!
//! Failing to find a path is a normal outcome of a search and is reported through
//! [`SearchOutcome`], only malformed inputs produce a [`NavError`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, trace, warn};
use nalgebra::Vector2;
use ordered_float::NotNan;
use serde::{Deserialize, Serialize};

use crate::{
    map::{Cell, CostMap},
    path::RawPath,
};

use super::{
    arena::{NodeArena, OpenSet},
    NavError,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The 8 possible moves from a cell, orthogonal moves first.
const MOVES: [(isize, isize); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PathPlanner {
    params: PathPlannerParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathPlannerParams {
    /// The search gives up after `iteration_cap_factor * rows * cols` node expansions.
    pub iteration_cap_factor: usize,
}

/// The result of a single search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub outcome: SearchOutcome,

    /// Number of nodes expanded by the search
    pub num_iterations: usize,

    /// Number of nodes discovered by the search
    pub num_nodes: usize,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SearchOutcome {
    /// A path from the start to the end was found
    Found(RawPath),

    /// The start and/or end cell is an obstacle, no search was performed
    Blocked(BlockedEndpoint),

    /// The search ended without reaching the end
    NoPath(NoPathReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockedEndpoint {
    Start,
    End,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoPathReason {
    /// Every reachable cell was expanded, the end is unreachable
    Exhausted,

    /// The iteration cap was hit before the end was reached
    IterationCap,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl Default for PathPlannerParams {
    fn default() -> Self {
        Self {
            iteration_cap_factor: 2,
        }
    }
}

impl PathPlanner {
    pub fn new(params: PathPlannerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PathPlannerParams {
        &self.params
    }

    /// Plans a minimum cost path from the start to the end cell.
    ///
    /// Every call builds its own search state, so a single planner and cost map can be shared
    /// between threads planning independently.
    pub fn plan(&self, cost_map: &CostMap, start: Cell, end: Cell) -> Result<SearchResult, NavError> {
        // Check both start and end are in the map
        if !cost_map.contains(&start) {
            return Err(NavError::PointOutsideMap(
                "PathPlanner::plan::start".into(),
                start,
            ));
        }
        if !cost_map.contains(&end) {
            return Err(NavError::PointOutsideMap("PathPlanner::plan::end".into(), end));
        }

        let weight = cost_map.params().proximity_weight;
        if !weight.is_finite() || weight < 0.0 {
            return Err(NavError::InvalidParams(format!(
                "proximity_weight must be finite and non-negative, got {}",
                weight
            )));
        }

        // Both endpoints must be traversable, otherwise don't bother searching
        let blocked = match (cost_map.is_free(&start), cost_map.is_free(&end)) {
            (true, true) => None,
            (false, true) => Some(BlockedEndpoint::Start),
            (true, false) => Some(BlockedEndpoint::End),
            (false, false) => Some(BlockedEndpoint::Both),
        };
        if let Some(b) = blocked {
            warn!("Cannot plan from {} to {}, {:?} is blocked", start, end, b);
            return Ok(SearchResult {
                outcome: SearchOutcome::Blocked(b),
                num_iterations: 0,
                num_nodes: 0,
            });
        }

        let max_iterations = self
            .params
            .iteration_cap_factor
            .saturating_mul(cost_map.num_cells());

        let mut arena = NodeArena::new();
        let mut open = OpenSet::new();
        let mut num_iterations = 0;

        // Initialise the start node
        let start_h = heuristic(&start, &end);
        let start_node = arena.get_or_alloc(start);
        start_node.g = 0.0;
        start_node.h = start_h;
        start_node.f = start_h;
        start_node.open = true;
        open.push(start, not_nan(start_h, &start)?);

        // Main loop
        let reason = loop {
            // Get the minimum cost node, if there's nothing in the heap the end is unreachable
            let (cell, f) = match open.pop() {
                Some(e) => e,
                None => break NoPathReason::Exhausted,
            };

            // Skip entries superseded by a cheaper one, or for nodes which were already closed
            let current = match arena.get_mut(&cell) {
                Some(n) if n.open && n.f == f.into_inner() => n,
                _ => continue,
            };

            if num_iterations >= max_iterations {
                break NoPathReason::IterationCap;
            }
            num_iterations += 1;

            // Close the node
            current.open = false;
            let current_g = current.g;

            if cell == end {
                // The end node was just popped so its parent chain is complete
                let path = arena
                    .reconstruct_path(end)
                    .ok_or(NavError::BrokenParentChain(end))?;

                info!(
                    "Path found from {} to {}: {} cells, cost {:.3}, {} iterations",
                    start,
                    end,
                    path.get_num_points(),
                    current_g,
                    num_iterations
                );

                return Ok(SearchResult {
                    outcome: SearchOutcome::Found(path),
                    num_iterations,
                    num_nodes: arena.len(),
                });
            }

            for &(dx, dy) in MOVES.iter() {
                let neighbour = cell + Vector2::new(dx, dy);

                // Outside the map or blocked
                if !cost_map.is_free(&neighbour) {
                    continue;
                }

                let move_cost = if dx != 0 && dy != 0 {
                    std::f64::consts::SQRT_2
                } else {
                    1.0
                };

                let tentative_g = current_g + move_cost + cost_map.proximity_cost(&neighbour);

                let node = arena.get_or_alloc(neighbour);
                if tentative_g < node.g {
                    node.g = tentative_g;
                    node.h = heuristic(&neighbour, &end);
                    node.f = node.g + node.h;
                    node.parent = Some(cell);
                    node.open = true;

                    let f = not_nan(node.f, &neighbour)?;
                    open.push(neighbour, f);

                    trace!("Opened {} with f = {:.3}", neighbour, f);
                }
            }
        };

        warn!(
            "No path found from {} to {} ({:?} after {} iterations)",
            start, end, reason, num_iterations
        );
        debug!(
            "Search discovered {} nodes, {} entries left in the open set",
            arena.len(),
            open.len()
        );

        Ok(SearchResult {
            outcome: SearchOutcome::NoPath(reason),
            num_iterations,
            num_nodes: arena.len(),
        })
    }
}

impl SearchResult {
    /// The path found by the search, if there is one.
    pub fn path(&self) -> Option<&RawPath> {
        match self.outcome {
            SearchOutcome::Found(ref p) => Some(p),
            _ => None,
        }
    }

    pub fn into_path(self) -> Option<RawPath> {
        match self.outcome {
            SearchOutcome::Found(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.path().is_some()
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Manhattan distance between the two cells.
pub fn heuristic(from: &Cell, to: &Cell) -> f64 {
    ((from.x - to.x).abs() + (from.y - to.y).abs()) as f64
}

fn not_nan(value: f64, cell: &Cell) -> Result<NotNan<f64>, NavError> {
    NotNan::new(value).map_err(|_| NavError::NanCost(*cell))
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::{sync::Arc, thread};

    use super::*;
    use crate::map::CostMapParams;
    use ndarray::Array2;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const OBSTACLE: f64 = 255.0;

    fn cost_map(data: Array2<f64>) -> CostMap {
        CostMap::new(
            data,
            CostMapParams {
                obstacle_threshold: 200.0,
                search_radius: 3,
                proximity_weight: 10.0,
            },
        )
        .unwrap()
    }

    fn planner() -> PathPlanner {
        PathPlanner::new(PathPlannerParams::default())
    }

    /// Planner with a cap high enough that it's never reached on the test maps.
    fn uncapped_planner() -> PathPlanner {
        PathPlanner::new(PathPlannerParams {
            iteration_cap_factor: 10,
        })
    }

    /// Check all the invariants a found path must hold, returning it.
    fn check_path(map: &CostMap, result: &SearchResult, start: Cell, end: Cell) -> RawPath {
        let path = result.path().expect("Expected a path").clone();

        assert_eq!(path.cells.first(), Some(&start));
        assert_eq!(path.cells.last(), Some(&end));
        assert_eq!(path.cells.len(), path.costs.len());

        for cell in path.cells.iter() {
            assert!(map.is_free(cell), "{} on the path is not free", cell);
        }

        for pair in path.cells.windows(2) {
            let step = pair[1] - pair[0];
            assert_eq!(step.x.abs().max(step.y.abs()), 1, "Invalid move {}", step);
        }

        for pair in path.costs.windows(2) {
            assert!(pair[1] >= pair[0]);
        }

        path
    }

    #[test]
    fn test_free_grid_diagonal() {
        let map = cost_map(Array2::zeros((10, 10)));
        let (start, end) = (Cell::new(0, 0), Cell::new(9, 9));

        let result = planner().plan(&map, start, end).unwrap();
        let path = check_path(&map, &result, start, end);

        assert!(path.get_num_points() >= 10 && path.get_num_points() <= 19);

        let simplified = path.to_path().simplify(crate::path::DEFAULT_COLLINEAR_TOLERANCE);
        assert_eq!(simplified.get_num_points(), 2);
    }

    #[test]
    fn test_free_grid_random_pairs() {
        let map = cost_map(Array2::zeros((15, 20)));
        let mut rng = ChaCha8Rng::seed_from_u64(1234);

        for _ in 0..20 {
            let start = Cell::new(rng.gen_range(0..20), rng.gen_range(0..15));
            let end = Cell::new(rng.gen_range(0..20), rng.gen_range(0..15));

            let result = planner().plan(&map, start, end).unwrap();
            check_path(&map, &result, start, end);
        }
    }

    #[test]
    fn test_start_is_end() {
        let map = cost_map(Array2::zeros((3, 3)));
        let cell = Cell::new(1, 2);

        let result = planner().plan(&map, cell, cell).unwrap();

        assert_eq!(result.path().unwrap().cells, vec![cell]);
        assert_eq!(result.num_iterations, 1);
    }

    #[test]
    fn test_blocked_endpoints() {
        let mut data = Array2::zeros((5, 5));
        data[[0, 0]] = OBSTACLE;
        data[[4, 4]] = OBSTACLE;
        let map = cost_map(data);

        let result = planner().plan(&map, Cell::new(0, 0), Cell::new(2, 2)).unwrap();
        assert_eq!(result.outcome, SearchOutcome::Blocked(BlockedEndpoint::Start));
        assert_eq!(result.num_iterations, 0);

        let result = planner().plan(&map, Cell::new(2, 2), Cell::new(4, 4)).unwrap();
        assert_eq!(result.outcome, SearchOutcome::Blocked(BlockedEndpoint::End));
        assert_eq!(result.num_iterations, 0);

        let result = planner().plan(&map, Cell::new(0, 0), Cell::new(4, 4)).unwrap();
        assert_eq!(result.outcome, SearchOutcome::Blocked(BlockedEndpoint::Both));
        assert_eq!(result.num_iterations, 0);
        assert!(!result.is_found());
    }

    #[test]
    fn test_outside_map() {
        let map = cost_map(Array2::zeros((5, 5)));

        let res = planner().plan(&map, Cell::new(-1, 0), Cell::new(2, 2));
        assert!(matches!(res, Err(NavError::PointOutsideMap(_, _))));

        let res = planner().plan(&map, Cell::new(0, 0), Cell::new(2, 5));
        assert!(matches!(res, Err(NavError::PointOutsideMap(_, _))));
    }

    #[test]
    fn test_invalid_proximity_weight() {
        let map = CostMap::new(
            Array2::zeros((5, 5)),
            CostMapParams {
                proximity_weight: std::f64::NAN,
                ..Default::default()
            },
        )
        .unwrap();

        let res = planner().plan(&map, Cell::new(0, 0), Cell::new(4, 4));
        assert!(matches!(res, Err(NavError::InvalidParams(_))));
    }

    #[test]
    fn test_wall_without_gap() {
        // Full height wall down the middle column
        let mut data = Array2::zeros((10, 10));
        for row in 0..10 {
            data[[row, 5]] = OBSTACLE;
        }
        let map = cost_map(data);

        let result = planner().plan(&map, Cell::new(0, 0), Cell::new(9, 9)).unwrap();
        assert!(matches!(result.outcome, SearchOutcome::NoPath(_)));

        let result = uncapped_planner()
            .plan(&map, Cell::new(0, 0), Cell::new(9, 9))
            .unwrap();
        assert_eq!(result.outcome, SearchOutcome::NoPath(NoPathReason::Exhausted));

        // Every free cell left of the wall must have been expanded
        assert!(result.num_iterations >= 50);
    }

    #[test]
    fn test_iteration_cap() {
        let mut data = Array2::zeros((10, 10));
        for row in 0..10 {
            data[[row, 5]] = OBSTACLE;
        }
        let map = cost_map(data);

        // No iterations allowed at all
        let planner = PathPlanner::new(PathPlannerParams {
            iteration_cap_factor: 0,
        });

        let result = planner.plan(&map, Cell::new(0, 0), Cell::new(9, 9)).unwrap();

        assert_eq!(
            result.outcome,
            SearchOutcome::NoPath(NoPathReason::IterationCap)
        );
        assert_eq!(result.num_iterations, 0);
    }

    #[test]
    fn test_huge_iteration_cap() {
        let map = cost_map(Array2::zeros((4, 4)));
        let planner = PathPlanner::new(PathPlannerParams {
            iteration_cap_factor: usize::MAX,
        });

        let result = planner.plan(&map, Cell::new(0, 0), Cell::new(3, 3)).unwrap();
        check_path(&map, &result, Cell::new(0, 0), Cell::new(3, 3));
    }

    #[test]
    fn test_wall_with_gap() {
        // Wall down the middle column with a single gap at the bottom
        let mut data = Array2::zeros((12, 12));
        for row in 0..11 {
            data[[row, 6]] = OBSTACLE;
        }
        let map = cost_map(data);
        let (start, end) = (Cell::new(0, 0), Cell::new(11, 0));

        let result = uncapped_planner().plan(&map, start, end).unwrap();
        let path = check_path(&map, &result, start, end);

        assert!(path.cells.contains(&Cell::new(6, 11)));
    }

    #[test]
    fn test_deterministic() {
        let mut data = Array2::zeros((30, 30));
        for row in 5..25 {
            data[[row, 15]] = OBSTACLE;
        }
        let map = cost_map(data);

        let a = planner().plan(&map, Cell::new(2, 15), Cell::new(28, 14)).unwrap();
        let b = planner().plan(&map, Cell::new(2, 15), Cell::new(28, 14)).unwrap();

        assert_eq!(a.outcome, b.outcome);
        assert_eq!(a.num_iterations, b.num_iterations);
    }

    #[test]
    fn test_concurrent_searches() {
        let mut data = Array2::zeros((30, 30));
        for row in 0..20 {
            data[[row, 10]] = OBSTACLE;
            data[[29 - row, 20]] = OBSTACLE;
        }
        let map = Arc::new(cost_map(data));
        let planner = Arc::new(uncapped_planner());

        let expected = planner
            .plan(&map, Cell::new(0, 0), Cell::new(29, 29))
            .unwrap();
        assert!(expected.is_found());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let map = Arc::clone(&map);
                let planner = Arc::clone(&planner);
                thread::spawn(move || planner.plan(&map, Cell::new(0, 0), Cell::new(29, 29)))
            })
            .collect();

        for h in handles {
            let result = h.join().unwrap().unwrap();
            assert_eq!(result.outcome, expected.outcome);
        }
    }
}
