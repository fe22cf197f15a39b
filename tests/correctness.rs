use matmul_bench::blocked::tiled::multiply_blocked_rows;
use matmul_bench::matrix::naive::multiply_naive_rows;
use matmul_bench::matrix::partition::split_bands;
#[cfg(unix)]
use matmul_bench::parallel::Forked;
use matmul_bench::parallel::generate_pair;
use matmul_bench::{
    Kernel, Matrix, Pooled, RowRange, Schedule, Sequential, Strategy, Threaded, multiply,
    multiply_blocked, multiply_naive, multiply_parallel, partition_rows,
};

fn assert_matrices_equal(expected: &Matrix, actual: &Matrix, name: &str) {
    assert_eq!(expected.n(), actual.n(), "{}: size mismatch", name);
    if let Some((i, j)) = expected.first_difference(actual) {
        panic!(
            "{}: mismatch at ({}, {}): expected {}, got {}",
            name,
            i,
            j,
            expected.get(i, j),
            actual.get(i, j)
        );
    }
}

fn example_2x2() -> (Matrix, Matrix, Matrix) {
    let a = Matrix::from_rows(&[[1, 2], [3, 4]]).unwrap();
    let b = Matrix::from_rows(&[[5, 6], [7, 8]]).unwrap();
    let c = Matrix::from_rows(&[[19, 22], [43, 50]]).unwrap();
    (a, b, c)
}

/// Every strategy the platform supports, with `workers` workers.
fn all_strategies(workers: usize) -> Vec<Box<dyn Strategy>> {
    let mut strategies: Vec<Box<dyn Strategy>> = vec![
        Box::new(Sequential),
        Box::new(Threaded::new(workers).unwrap()),
        Box::new(Pooled::new(workers, Schedule::Static).unwrap()),
        Box::new(Pooled::new(workers, Schedule::Dynamic).unwrap()),
    ];
    #[cfg(unix)]
    strategies.push(Box::new(Forked::new(workers).unwrap()));
    strategies
}

// ============================================================
// Small matrix tests
// ============================================================

#[test]
fn test_2x2_multiply() {
    let (a, b, expected) = example_2x2();

    assert_matrices_equal(&expected, &multiply_naive(&a, &b).unwrap(), "2x2 naive");
    assert_matrices_equal(&expected, &multiply(&a, &b).unwrap(), "2x2 blocked");
    assert_matrices_equal(
        &expected,
        &multiply_parallel(&a, &b, 2).unwrap(),
        "2x2 parallel",
    );
}

#[test]
fn test_2x2_every_strategy() {
    let (a, b, expected) = example_2x2();

    for strategy in all_strategies(2) {
        for kernel in [Kernel::Naive, Kernel::blocked(1), Kernel::blocked(32)] {
            let c = strategy.multiply(&a, &b, kernel).unwrap();
            assert_matrices_equal(&expected, &c, &format!("2x2 {} {}", strategy.name(), kernel));
        }
    }
}

#[test]
fn test_1x1() {
    let a = Matrix::from_rows(&[[7]]).unwrap();
    let b = Matrix::from_rows(&[[-3]]).unwrap();
    for strategy in all_strategies(1) {
        let c = strategy.multiply(&a, &b, Kernel::blocked(4)).unwrap();
        assert_eq!(c.get(0, 0), -21, "{}", strategy.name());
    }
}

// ============================================================
// Tile boundary tests
// ============================================================

#[test]
fn test_tile_boundaries() {
    let test_sizes = [3, 4, 5, 7, 8, 9, 15, 16, 17, 31, 32, 33];
    let block_sizes = [1, 4, 8, 16, 32, 64];

    for size in test_sizes {
        let a = Matrix::random(size, size as u64).unwrap();
        let b = Matrix::random(size, 1000 + size as u64).unwrap();
        let expected = multiply_naive(&a, &b).unwrap();

        for block_size in block_sizes {
            let c = multiply_blocked(&a, &b, block_size).unwrap();
            assert_matrices_equal(
                &expected,
                &c,
                &format!("size_{}_block_{}", size, block_size),
            );
        }
    }
}

#[test]
fn test_block_larger_than_matrix_matches_smaller_block() {
    let n = 100;
    let a = Matrix::random(n, 100).unwrap();
    let b = Matrix::random(n, 101).unwrap();

    let small = Threaded::new(4)
        .unwrap()
        .multiply(&a, &b, Kernel::blocked(32))
        .unwrap();
    let large = Threaded::new(4)
        .unwrap()
        .multiply(&a, &b, Kernel::blocked(128))
        .unwrap();

    assert_matrices_equal(&small, &large, "block_32_vs_128");
    assert_matrices_equal(&multiply_naive(&a, &b).unwrap(), &large, "block_128_vs_naive");
}

// ============================================================
// Direct kernel tests (bypassing strategies)
// ============================================================

#[test]
fn test_kernels_on_hand_split_bands() {
    let n = 23;
    let a = Matrix::random(n, 5).unwrap();
    let b = Matrix::random(n, 6).unwrap();
    let expected = multiply_naive(&a, &b).unwrap();

    let ranges = partition_rows(n, 4).unwrap();

    let mut naive = Matrix::new(n).unwrap();
    for (band, &rows) in split_bands(naive.as_mut_slice(), n, &ranges)
        .unwrap()
        .into_iter()
        .zip(&ranges)
    {
        multiply_naive_rows(&a, &b, band, rows).unwrap();
    }
    assert_matrices_equal(&expected, &naive, "naive_bands");

    let mut blocked = Matrix::new(n).unwrap();
    for (band, &rows) in split_bands(blocked.as_mut_slice(), n, &ranges)
        .unwrap()
        .into_iter()
        .zip(&ranges)
    {
        multiply_blocked_rows(&a, &b, band, rows, 5).unwrap();
    }
    assert_matrices_equal(&expected, &blocked, "blocked_bands");
}

#[test]
fn test_kernel_never_writes_outside_band() {
    let n = 12;
    let a = Matrix::random(n, 40).unwrap();
    let b = Matrix::random(n, 41).unwrap();

    let sentinel = -7;
    let mut c = Matrix::from_vec(n, vec![sentinel; n * n]).unwrap();
    let rows = RowRange::new(4, 9);
    let band = c.band_mut(rows).unwrap();
    Kernel::blocked(5).run(&a, &b, band, rows).unwrap();

    for i in (0..4).chain(9..n) {
        assert!(c.row(i).iter().all(|&x| x == sentinel), "row {} touched", i);
    }
}

// ============================================================
// Parallel strategy tests
// ============================================================

#[test]
fn test_parallel_matches_sequential_for_every_worker_count() {
    let n = 17;
    let a = Matrix::random(n, 17).unwrap();
    let b = Matrix::random(n, 13).unwrap();
    let expected = Sequential.multiply(&a, &b, Kernel::Naive).unwrap();

    for workers in 1..=n {
        for strategy in all_strategies(workers) {
            let c = strategy.multiply(&a, &b, Kernel::blocked(4)).unwrap();
            assert_matrices_equal(
                &expected,
                &c,
                &format!("{}_workers_{}", strategy.name(), workers),
            );
        }
    }
}

#[test]
fn test_parallel_larger_matrices() {
    let test_sizes = [64, 100, 130];

    for size in test_sizes {
        let a = Matrix::random(size, 7).unwrap();
        let b = Matrix::random(size, 8).unwrap();
        let expected = multiply_naive(&a, &b).unwrap();

        for strategy in all_strategies(4) {
            let c = strategy.multiply(&a, &b, Kernel::blocked(32)).unwrap();
            assert_matrices_equal(
                &expected,
                &c,
                &format!("{}_size_{}", strategy.name(), size),
            );
        }
    }
}

#[test]
fn test_dynamic_pool_tiles_with_default_block_size() {
    let a = Matrix::random(150, 70).unwrap();
    let b = Matrix::random(150, 71).unwrap();
    let expected = multiply_naive(&a, &b).unwrap();

    let pool = Pooled::new(4, Schedule::Dynamic).unwrap();
    for kernel in [Kernel::blocked(64), Kernel::blocked(7), Kernel::Naive] {
        let c = pool.multiply(&a, &b, kernel).unwrap();
        assert_matrices_equal(&expected, &c, &format!("pool_dynamic_{}", kernel));
    }
}

#[test]
fn test_workers_exceeding_size_are_clamped() {
    let ranges = partition_rows(3, 4).unwrap();
    assert_eq!(ranges.len(), 3);
    assert!(ranges.iter().all(|r| r.len() == 1));

    let a = Matrix::random(3, 1).unwrap();
    let b = Matrix::random(3, 2).unwrap();
    let expected = multiply_naive(&a, &b).unwrap();
    for strategy in all_strategies(4) {
        let c = strategy.multiply(&a, &b, Kernel::blocked(2)).unwrap();
        assert_matrices_equal(&expected, &c, strategy.name());
    }
}

#[test]
fn test_large_values_wrap_identically() {
    let n = 9;
    let values: Vec<i32> = (0..n * n)
        .map(|i| (i as i32).wrapping_mul(0x1234_5677))
        .collect();
    let a = Matrix::from_vec(n, values.clone()).unwrap();
    let b = Matrix::from_vec(n, values.into_iter().rev().collect()).unwrap();
    let expected = multiply_naive(&a, &b).unwrap();

    for strategy in all_strategies(3) {
        let c = strategy.multiply(&a, &b, Kernel::blocked(2)).unwrap();
        assert_matrices_equal(&expected, &c, &format!("wrap_{}", strategy.name()));
    }
}

// ============================================================
// Error handling
// ============================================================

#[test]
fn test_mismatched_operands_rejected() {
    let a = Matrix::new(3).unwrap();
    let b = Matrix::new(4).unwrap();
    for strategy in all_strategies(2) {
        assert!(strategy.multiply(&a, &b, Kernel::Naive).is_err(), "{}", strategy.name());
    }
}

#[test]
fn test_zero_block_size_rejected_by_every_strategy() {
    let a = Matrix::random(4, 1).unwrap();
    for strategy in all_strategies(2) {
        assert!(
            strategy.multiply(&a, &a, Kernel::blocked(0)).is_err(),
            "{}",
            strategy.name()
        );
    }
}

#[test]
fn test_zero_workers_rejected() {
    assert!(Threaded::new(0).is_err());
    assert!(Pooled::new(0, Schedule::Static).is_err());
    #[cfg(unix)]
    assert!(Forked::new(0).is_err());
    assert!(multiply_parallel(&Matrix::new(2).unwrap(), &Matrix::new(2).unwrap(), 0).is_err());
}

// ============================================================
// Matrix generation
// ============================================================

#[test]
fn test_fixed_seed_generation_is_reproducible() {
    assert_eq!(Matrix::random(50, 9).unwrap(), Matrix::random(50, 9).unwrap());
    assert_eq!(generate_pair(20, 9).unwrap(), generate_pair(20, 9).unwrap());

    let pool = Pooled::new(3, Schedule::Static).unwrap();
    let mut m1 = Matrix::new(20).unwrap();
    let mut m2 = Matrix::new(20).unwrap();
    pool.fill_random(&mut m1, 9);
    pool.fill_random(&mut m2, 9);
    assert_eq!(m1, m2);
}
