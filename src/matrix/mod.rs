//! The matrix type, the naive reference kernel and row partitioning.
//!
//! Everything else in the crate is built on these: the blocked kernel and
//! the parallel strategies consume `Matrix` inputs and write into bands
//! produced by `partition`.

pub mod dense;
pub mod naive;
pub mod partition;

pub use dense::{Matrix, VALUE_RANGE, clock_seed, derive_seed, worker_seed};
pub use naive::{multiply_naive, multiply_naive_rows, multiply_naive_tile};
pub use partition::{RowRange, clamp_workers, partition_rows, split_bands};
