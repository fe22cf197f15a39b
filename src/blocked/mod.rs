//! Cache-blocked matrix multiplication.
//!
//! The blocked kernel breaks the (row, column, reduction) iteration space
//! into cubic tiles small enough to stay in L1/L2 while they are reused.
//! Only the iteration order changes; the arithmetic does not.

pub mod tiled;

pub use tiled::{multiply_blocked, multiply_blocked_rows, multiply_blocked_tile};
