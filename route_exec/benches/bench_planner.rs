//! # Planner Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use nalgebra::{Point2, Vector2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use route_lib::{
    map::{Cell, CostMap, CostMapParams},
    nav::{PathPlanner, PathPlannerParams, RouteParams, RoutePlanner},
};

fn planner_benchmark(c: &mut Criterion) {
    // ---- Build a random map ----

    let cost_map = CostMap::generate_random(
        Vector2::new(200, 200),
        Point2::new(0.05, 0.05),
        Point2::new(0.0, 0.0),
        CostMapParams::default(),
    )
    .unwrap();

    // Pick the first free cells from opposite corners so the search always has valid endpoints
    let start = (0..cost_map.num_cells())
        .map(|i| cost_map.cell(i))
        .find(|c| cost_map.is_free(c))
        .unwrap();
    let end = (0..cost_map.num_cells())
        .rev()
        .map(|i| cost_map.cell(i))
        .find(|c| cost_map.is_free(c))
        .unwrap();

    c.bench_function("CostMap::proximity_cost", |b| {
        b.iter(|| cost_map.proximity_cost(black_box(&Cell::new(100, 100))))
    });

    let planner = PathPlanner::new(PathPlannerParams::default());

    c.bench_function("PathPlanner::plan", |b| {
        b.iter(|| planner.plan(&cost_map, start, end).unwrap())
    });

    let route_planner = RoutePlanner::new(planner.clone(), RouteParams::default());
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    c.bench_function("RoutePlanner::plan_route", |b| {
        b.iter(|| {
            route_planner
                .plan_route(&cost_map, start, end, &mut rng)
                .unwrap()
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = planner_benchmark
}
criterion_main!(benches);
