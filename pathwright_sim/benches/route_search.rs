// Route planning throughput on generated grid meshes.
//
// Plans corner-to-corner across square grids of increasing size, which is
// the worst case for the A* open set on an obstacle-free mesh. A second
// group re-plans from a spread of start areas on one grid, closer to what a
// navigator does while walking.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pathwright_sim::planner::PathPlanner;
use pathwright_sim::route::Route;
use pathwright_sim::{AreaId, NavMesh};

fn corner_to_corner(c: &mut Criterion) {
    let mut group = c.benchmark_group("corner_to_corner");
    for side in [16u32, 32, 64] {
        let mesh = NavMesh::grid("bench", side, side, 100.0).unwrap();
        let goal = AreaId(side * side);
        group.bench_with_input(BenchmarkId::from_parameter(side), &mesh, |b, mesh| {
            let mut planner = PathPlanner::new();
            let mut route = Route::new(512);
            b.iter(|| {
                planner
                    .plan(mesh, &mut route, black_box(AreaId(1)), black_box(goal))
                    .unwrap();
                black_box(route.path.len())
            });
        });
    }
    group.finish();
}

fn replan_spread(c: &mut Criterion) {
    let side = 48u32;
    let mesh = NavMesh::grid("bench", side, side, 100.0).unwrap();
    let goal = AreaId(side * side / 2 + side / 2);
    let starts: Vec<AreaId> = (1..=side * side).step_by(37).map(AreaId).collect();

    c.bench_function("replan_spread_48", |b| {
        let mut planner = PathPlanner::new();
        let mut route = Route::new(512);
        b.iter(|| {
            for &start in &starts {
                let _ = planner.plan(&mesh, &mut route, start, goal);
            }
            black_box(planner.searches())
        });
    });
}

criterion_group!(benches, corner_to_corner, replan_spread);
criterion_main!(benches);
