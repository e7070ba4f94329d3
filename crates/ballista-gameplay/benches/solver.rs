//! Ballistic solver benchmarks.

use ballista_gameplay::solver::{solve, solve_traced, SolverConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;

const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

fn bench_solve(c: &mut Criterion) {
    let config = SolverConfig::default();

    c.bench_function("solve_level_target", |b| {
        b.iter(|| {
            solve(
                black_box(Vec3::ZERO),
                black_box(Vec3::new(10.0, 0.5, 0.0)),
                GRAVITY,
                &config,
            )
        });
    });

    // Exhausts the iteration budget.
    c.bench_function("solve_unreachable", |b| {
        b.iter(|| {
            solve(
                black_box(Vec3::ZERO),
                black_box(Vec3::new(100.0, -200.0, 0.0)),
                GRAVITY,
                &config,
            )
        });
    });

    let flat = SolverConfig::default().with_time_per_distance(0.0);
    c.bench_function("solve_traced_search", |b| {
        b.iter(|| {
            solve_traced(
                black_box(Vec3::ZERO),
                black_box(Vec3::new(40.0, 2.0, 25.0)),
                GRAVITY,
                &flat,
            )
        });
    });
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
