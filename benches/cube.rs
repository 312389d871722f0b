//! Benchmarks for cube generation and face turns.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rubiks::animation::Scheduler;
use rubiks::grid::{generate_positions, CubeSize};
use rubiks::{Cube, CubeConfig, Face};

/// Benchmark generating the position grid of a 5x5x5 cube.
fn bench_generate_positions(c: &mut Criterion) {
    let size = CubeSize::new(5).unwrap();

    c.bench_function("generate_positions_5", |b| {
        b.iter(|| generate_positions(black_box(size)))
    });
}

/// Benchmark building a complete cube: scene graph, pieces, stickers, groups.
fn bench_cube_new(c: &mut Criterion) {
    let config = CubeConfig::with_size(5);

    c.bench_function("cube_new_5", |b| b.iter(|| Cube::new(black_box(&config))));
}

/// Benchmark one face turn driven to completion through the scheduler.
fn bench_face_turn(c: &mut Criterion) {
    let mut group = c.benchmark_group("face_turn");
    for size in [3, 5] {
        let mut cube = Cube::new(&CubeConfig::with_size(size)).unwrap();
        let mut scheduler = Scheduler::new();

        group.bench_function(format!("size_{size}"), |b| {
            b.iter(|| {
                cube.rotate_face(&mut scheduler, black_box(Face::R), 1);
                while scheduler.is_running() {
                    scheduler.update(&mut cube, 16.0);
                }
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_generate_positions,
    bench_cube_new,
    bench_face_turn
);
criterion_main!(benches);
