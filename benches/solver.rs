use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

use faer::{mat, Mat, Parallelism};
use nnls_rs::{NnlsSolver, SolverOptions};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn bench_small_cubic_fit(c: &mut Criterion) {
    let a = mat![
        [1.0, 1.0, 1.0],
        [2.0, 4.0, 8.0],
        [3.0, 9.0, 27.0],
        [4.0, 16.0, 64.0],
    ];
    let b = [0.73, 3.24, 8.31, 16.72];
    let mut solver = NnlsSolver::new(a.as_ref(), Parallelism::None).unwrap();
    let options = SolverOptions::default();
    let mut x = vec![0.0; 3];
    c.bench_function("nnls_4x3", |bench| {
        bench.iter(|| {
            let stats = solver
                .solve(black_box(&b), &mut x, &options, None)
                .unwrap();
            black_box(stats.residual_norm);
        });
    });
}

fn bench_constrained_cubic_fit(c: &mut Criterion) {
    let a = mat![
        [1.0, 1.0, 1.0],
        [2.0, 4.0, 8.0],
        [3.0, 9.0, 27.0],
        [4.0, 16.0, 64.0],
    ];
    let b = [0.13, 0.84, 2.91, 7.12];
    let mut solver = NnlsSolver::new(a.as_ref(), Parallelism::None).unwrap();
    let options = SolverOptions::default();
    let mut x = vec![0.0; 3];
    c.bench_function("nnls_4x3_constrained", |bench| {
        bench.iter(|| {
            let stats = solver
                .solve(black_box(&b), &mut x, &options, None)
                .unwrap();
            black_box(stats.residual_norm);
        });
    });
}

fn bench_random_200x100(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0x6e6e6c73);
    let a = Mat::from_fn(200, 100, |_, _| rng.gen_range(-1.0..1.0));
    let b: Vec<f64> = (0..200).map(|_| rng.gen_range(-1.0..1.0)).collect();

    let mut solver = NnlsSolver::new(a.as_ref(), Parallelism::None).unwrap();
    let options = SolverOptions {
        max_iters: 300,
        ..SolverOptions::default()
    };
    let mut x = vec![0.0; 100];
    c.bench_function("nnls_200x100_random", |bench| {
        bench.iter(|| {
            let stats = solver
                .solve(black_box(&b), &mut x, &options, None)
                .unwrap();
            black_box(stats.residual_norm);
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(10)
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_millis(1000));
    targets =
        bench_small_cubic_fit,
        bench_constrained_cubic_fit,
        bench_random_200x100
}
criterion_main!(benches);
