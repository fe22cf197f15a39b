//! Sequential vs parallel integer matrix multiplication.
//!
//! Two kernels compute C = A × B for square `i32` matrices: the textbook
//! i-j-k loop and a cache-blocked version that walks the same iteration
//! space tile by tile. Both wrap on overflow, so they agree bit for bit.
//!
//! Each kernel can run under four strategies, all of which split C into
//! disjoint bands of rows so no worker ever needs a lock on the matrix:
//! a single thread, scoped OS threads, forked processes writing into a
//! shared mapping, and a rayon pool with static or dynamic scheduling.
//!
//! ## Usage
//!
//! ```
//! use matmul_bench::{Matrix, multiply};
//!
//! let a = Matrix::from_rows(&[[1, 2], [3, 4]]).unwrap();
//! let b = Matrix::from_rows(&[[5, 6], [7, 8]]).unwrap();
//!
//! let c = multiply(&a, &b).unwrap();
//! assert_eq!(c, Matrix::from_rows(&[[19, 22], [43, 50]]).unwrap());
//! ```
//!
//! For large matrices, use the multi-threaded version:
//!
//! ```
//! use matmul_bench::{Matrix, multiply_parallel};
//!
//! let a = Matrix::random(256, 1).unwrap();
//! let b = Matrix::random(256, 2).unwrap();
//!
//! let c = multiply_parallel(&a, &b, 4).unwrap();
//! assert_eq!(c.n(), 256);
//! ```
//!
//! ## What's inside
//!
//! - `matrix`: the matrix type, the naive kernel, row partitioning
//! - `blocked`: the tiled kernel
//! - `kernels`: [`Kernel`], picking one of the two for a band of rows
//! - `parallel`: the [`Strategy`] trait and its implementations
//! - `harness`: timing and the speedup/efficiency report used by the CLI

pub mod blocked;
pub mod config;
pub mod error;
pub mod harness;
pub mod kernels;
pub mod matrix;
pub mod parallel;

pub use blocked::multiply_blocked;
pub use error::{MatmulError, Result};
pub use kernels::{DEFAULT_BLOCK_SIZE, Kernel, WORKER_BLOCK_SIZE};
pub use matrix::{Matrix, RowRange, multiply_naive, partition_rows};
#[cfg(unix)]
pub use parallel::Forked;
pub use parallel::{Pooled, Schedule, Sequential, Strategy, Threaded};

/// Matrix multiply: C = A × B, single-threaded, blocked kernel.
///
/// # Errors
///
/// Fails if A and B differ in size or C cannot be allocated.
pub fn multiply(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    Sequential.multiply(a, b, Kernel::blocked(DEFAULT_BLOCK_SIZE))
}

/// Same as [`multiply`] but on `num_threads` threads, each owning a band of
/// rows. More threads than rows are clamped to one row per thread.
pub fn multiply_parallel(a: &Matrix, b: &Matrix, num_threads: usize) -> Result<Matrix> {
    Threaded::new(num_threads)?.multiply(a, b, Kernel::blocked(WORKER_BLOCK_SIZE))
}
