//! Benchmark harness.
//!
//! A run generates A and B, multiplies them twice under the configured
//! strategy (naive kernel first, blocked kernel second) into the same C,
//! checks both results agree and reports the timings. All output is plain
//! text on stdout; it is meant for people, not for parsing.

use std::time::{Duration, Instant};

use crate::config::{BenchConfig, Mode};
use crate::error::{MatmulError, Result};
use crate::kernels::Kernel;
use crate::matrix::dense::{Matrix, clock_seed};
#[cfg(unix)]
use crate::parallel::Forked;
use crate::parallel::{Pooled, Schedule, Sequential, Strategy, Threaded, fill_pair};

pub mod memory;
pub mod report;

pub use memory::resident_kb;
pub use report::Comparison;

use memory::describe;

/// Run `f` and measure its wall-clock duration.
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed())
}

/// What a completed run measured.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub comparison: Comparison,
    pub generation: Duration,
    /// Checksum of the blocked result.
    pub checksum: i64,
    pub verified: bool,
}

/// Execute one benchmark run and print its report.
pub fn run(config: &BenchConfig) -> Result<Outcome> {
    let n = config.size;

    println!("=== MATRIX MULTIPLICATION: {} ===", config.mode.title());
    println!("Matrix size: {}x{}", n, n);
    if config.mode.is_parallel() {
        println!("Workers: {}", config.workers);
    }
    println!("Block size: {}", config.block_size);
    println!("Initial memory: {}\n", describe(resident_kb()));

    let generator = Generator::for_config(config)?;
    let (reference, variant) = strategies(config)?;
    let base = config.seed.unwrap_or_else(clock_seed);

    let mut a = Matrix::new(n)?;
    let mut b = Matrix::new(n)?;
    let mut c = Matrix::new(n)?;
    println!("Memory after allocating matrices: {}", describe(resident_kb()));

    let (filled, generation) = timed(|| generator.fill(&mut a, &mut b, base));
    filled?;
    println!("Memory after filling matrices: {}", describe(resident_kb()));
    println!(
        "Generation time: {:.2} microseconds\n",
        generation.as_secs_f64() * 1e6
    );

    println!("--- {} / {} ---", reference.name(), Kernel::Naive);
    let (result, t_reference) = timed(|| reference.multiply_into(&a, &b, Kernel::Naive, &mut c));
    result?;
    println!("Multiplication time: {:.6} seconds", t_reference.as_secs_f64());
    println!("Memory: {}\n", describe(resident_kb()));

    let expected = if config.verify {
        let mut copy = Matrix::new(n)?;
        copy.as_mut_slice().copy_from_slice(c.as_slice());
        Some(copy)
    } else {
        None
    };
    c.fill_zero();

    let kernel = Kernel::blocked(config.block_size);
    println!("--- {} / {} ---", variant.name(), kernel);
    let (result, t_variant) = timed(|| variant.multiply_into(&a, &b, kernel, &mut c));
    result?;
    println!("Multiplication time: {:.6} seconds", t_variant.as_secs_f64());
    println!("Memory: {}\n", describe(resident_kb()));

    let verified = match expected {
        Some(expected) => {
            verify(&expected, &c)?;
            println!("Verification: naive and blocked results match");
            true
        }
        None => false,
    };

    let comparison = Comparison {
        reference: t_reference,
        variant: t_variant,
        workers: config.mode.is_parallel().then_some(config.workers),
    };
    println!("=== RESULTS ===");
    println!("{}", comparison);
    println!("Final memory: {}", describe(resident_kb()));
    println!("=== DONE ===");

    Ok(Outcome {
        comparison,
        generation,
        checksum: c.checksum(),
        verified,
    })
}

/// How A and B are produced for a given mode.
enum Generator {
    Sequential,
    Threads,
    Pool(Pooled),
}

impl Generator {
    fn for_config(config: &BenchConfig) -> Result<Self> {
        Ok(match config.mode {
            Mode::Threads => Generator::Threads,
            Mode::Pool => Generator::Pool(Pooled::new(config.workers, Schedule::Static)?),
            _ => Generator::Sequential,
        })
    }

    // A is seeded from `base`, B from its complement.
    fn fill(&self, a: &mut Matrix, b: &mut Matrix, base: u64) -> Result<()> {
        match self {
            Generator::Sequential => {
                a.fill_random(base);
                b.fill_random(!base);
            }
            Generator::Threads => fill_pair(a, b, base)?,
            Generator::Pool(pool) => {
                pool.fill_random(a, base);
                pool.fill_random(b, !base);
            }
        }
        Ok(())
    }
}

/// Fail with [`MatmulError::Mismatch`] at the first cell where `actual`
/// differs from `expected`.
pub fn verify(expected: &Matrix, actual: &Matrix) -> Result<()> {
    if expected.n() != actual.n() {
        return Err(MatmulError::DimensionMismatch {
            left: expected.n(),
            right: actual.n(),
        });
    }
    match expected.first_difference(actual) {
        Some((row, col)) => Err(MatmulError::Mismatch {
            row,
            col,
            expected: expected.get(row, col),
            actual: actual.get(row, col),
        }),
        None => Ok(()),
    }
}

fn boxed<S: Strategy + 'static>(strategy: S) -> Box<dyn Strategy> {
    Box::new(strategy)
}

/// Reference and variant strategies for a mode.
fn strategies(config: &BenchConfig) -> Result<(Box<dyn Strategy>, Box<dyn Strategy>)> {
    let workers = config.workers;
    Ok(match config.mode {
        Mode::Sequential => (boxed(Sequential), boxed(Sequential)),
        Mode::Threads => (boxed(Threaded::new(workers)?), boxed(Threaded::new(workers)?)),
        #[cfg(unix)]
        Mode::Processes => (boxed(Forked::new(workers)?), boxed(Forked::new(workers)?)),
        #[cfg(not(unix))]
        Mode::Processes => {
            return Err(MatmulError::InvalidArgument(
                "the processes strategy needs fork, which this platform lacks".to_string(),
            ));
        }
        Mode::Pool => (
            boxed(Pooled::new(workers, Schedule::Static)?),
            boxed(Pooled::new(workers, Schedule::Dynamic)?),
        ),
    })
}
