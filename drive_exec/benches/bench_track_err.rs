//! # Cross Track Error Benchmark

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Vector2;

use drive_lib::{path::Path, track_err};

fn track_err_benchmark(c: &mut Criterion) {
    // ---- Build a long gently curving path ----

    let path = Path {
        points_m: (0..2000)
            .map(|i| {
                let s = i as f64 * 0.05;
                Vector2::new(s, (s * 0.2).sin())
            })
            .collect(),
    };

    let position_m = Vector2::new(42.3, 0.6);

    c.bench_function("track_err::estimate", |b| {
        b.iter(|| track_err::estimate(&path, position_m).unwrap())
    });
}

criterion_group!(benches, track_err_benchmark);
criterion_main!(benches);
