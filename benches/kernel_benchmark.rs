//! Kernel, cache and training benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ovosvm::kernel::{Kernel, LinearKernel, QMatrix, SvcQMatrix};
use ovosvm::{Parameters, Problem};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `n` examples in `dim` dimensions spread over `classes` shifted clouds
fn generate_problem(n: usize, dim: usize, classes: usize, seed: u64) -> Problem {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for k in 0..n {
        let class = k % classes;
        let center = class as f64 * 2.0;
        features.push((0..dim).map(|_| center + rng.gen_range(-1.5..1.5)).collect());
        labels.push(class as f64);
    }
    Problem::new(features, labels).expect("generated problem is valid")
}

fn bench_linear_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernel/linear");
    let mut rng = StdRng::seed_from_u64(1);

    for &dim in &[16usize, 256, 4096] {
        let x: Vec<f64> = (0..dim).map(|_| rng.gen()).collect();
        let y: Vec<f64> = (0..dim).map(|_| rng.gen()).collect();
        group.throughput(Throughput::Elements(dim as u64));
        group.bench_with_input(BenchmarkId::from_parameter(dim), &(x, y), |b, (x, y)| {
            b.iter(|| black_box(LinearKernel.compute(black_box(x), black_box(y))));
        });
    }
    group.finish();
}

fn bench_q_rows(c: &mut Criterion) {
    let problem = generate_problem(1000, 32, 2, 3);
    let rows: Vec<&[f64]> = problem.features().iter().map(Vec::as_slice).collect();
    let y: Vec<i8> = problem
        .labels()
        .iter()
        .map(|&label| if label > 0.0 { 1 } else { -1 })
        .collect();
    let l = rows.len();

    let mut group = c.benchmark_group("qmatrix/row");
    group.throughput(Throughput::Elements(l as u64));

    // every row fits: repeated requests are cache hits
    group.bench_function("cached", |b| {
        let mut q = SvcQMatrix::new(LinearKernel, &rows, &y, l * l * 4);
        b.iter(|| {
            for i in 0..16 {
                black_box(q.row(i, l).expect("row fits"));
            }
        });
    });

    // room for a handful of rows: most requests recompute
    group.bench_function("thrashing", |b| {
        let mut q = SvcQMatrix::new(LinearKernel, &rows, &y, 8 * l * 4);
        b.iter(|| {
            for i in 0..16 {
                black_box(q.row(i, l).expect("row fits"));
            }
        });
    });
    group.finish();
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("train");
    group.sample_size(10);

    for &(n, classes) in &[(200usize, 2usize), (300, 3), (400, 4)] {
        let problem = generate_problem(n, 8, classes, 7);
        let params = Parameters::default();
        group.bench_with_input(
            BenchmarkId::new(format!("{classes}_classes"), n),
            &problem,
            |b, problem| {
                b.iter(|| black_box(ovosvm::train(black_box(problem), &params).expect("trains")));
            },
        );
    }

    let problem = generate_problem(200, 8, 3, 11);
    let params = Parameters {
        probability: true,
        seed: Some(5),
        ..Parameters::default()
    };
    group.bench_function("probability/3_classes", |b| {
        b.iter(|| black_box(ovosvm::train(&problem, &params).expect("trains")));
    });
    group.finish();
}

criterion_group!(benches, bench_linear_kernel, bench_q_rows, bench_training);
criterion_main!(benches);
