use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use matmul_bench::{Kernel, Matrix, Pooled, Schedule, Sequential, Strategy, Threaded};

const SIZES: [usize; 3] = [64, 128, 256];
const WORKERS: usize = 4;

fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernels");

    for &size in &SIZES {
        let a = Matrix::random(size, 1).unwrap();
        let b = Matrix::random(size, 2).unwrap();
        let mut out = Matrix::new(size).unwrap();

        for kernel in [Kernel::Naive, Kernel::blocked(32), Kernel::blocked(64)] {
            group.bench_with_input(
                BenchmarkId::new(kernel.to_string(), size),
                &size,
                |bench, _| {
                    bench.iter(|| {
                        Sequential
                            .multiply_into(black_box(&a), black_box(&b), kernel, &mut out)
                            .unwrap()
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategies");
    group.sample_size(20);

    let threads = Threaded::new(WORKERS).unwrap();
    let pool_static = Pooled::new(WORKERS, Schedule::Static).unwrap();
    let pool_dynamic = Pooled::new(WORKERS, Schedule::Dynamic).unwrap();
    let strategies: [&dyn Strategy; 4] = [&Sequential, &threads, &pool_static, &pool_dynamic];

    for &size in &SIZES {
        let a = Matrix::random(size, 3).unwrap();
        let b = Matrix::random(size, 4).unwrap();
        let mut out = Matrix::new(size).unwrap();

        for strategy in strategies {
            group.bench_with_input(
                BenchmarkId::new(strategy.name(), size),
                &size,
                |bench, _| {
                    bench.iter(|| {
                        let kernel = Kernel::blocked(32);
                        strategy
                            .multiply_into(black_box(&a), black_box(&b), kernel, &mut out)
                            .unwrap()
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_kernels, bench_strategies);
criterion_main!(benches);
