//! Kernel selection.
//!
//! A [`Kernel`] is what a worker runs on its band of rows. Every strategy is
//! generic over it, so each strategy can time the naive loop against the
//! blocked one on identical inputs.

use std::fmt;
use std::ops::Range;

use crate::blocked::tiled::{multiply_blocked_rows, multiply_blocked_tile};
use crate::error::{MatmulError, Result};
use crate::matrix::dense::Matrix;
use crate::matrix::naive::{multiply_naive_rows, multiply_naive_tile};
use crate::matrix::partition::RowRange;

/// Tile side for single-threaded and pooled runs.
pub const DEFAULT_BLOCK_SIZE: usize = 64;

/// Tile side when each worker already owns a narrow band of rows.
pub const WORKER_BLOCK_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    /// Plain i-j-k triple loop.
    Naive,
    /// Cache-blocked loop with cubic tiles of side `block_size`.
    Blocked { block_size: usize },
}

impl Kernel {
    pub fn blocked(block_size: usize) -> Self {
        Kernel::Blocked { block_size }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Kernel::Naive => "naive",
            Kernel::Blocked { .. } => "blocked",
        }
    }

    /// (rows, columns) of one unit of work when the kernel is scheduled
    /// dynamically on an n×n output: a single row for the naive loop, one
    /// `block_size` square tile for the blocked one. Clipped to n.
    pub fn tile_shape(&self, n: usize) -> (usize, usize) {
        let n = n.max(1);
        match *self {
            Kernel::Naive => (1, n),
            Kernel::Blocked { block_size } => {
                let side = block_size.clamp(1, n);
                (side, side)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            Kernel::Blocked { block_size: 0 } => Err(MatmulError::InvalidArgument(
                "block size must be positive".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Compute rows `rows` of A × B into `band`.
    pub fn run(&self, a: &Matrix, b: &Matrix, band: &mut [i32], rows: RowRange) -> Result<()> {
        match *self {
            Kernel::Naive => multiply_naive_rows(a, b, band, rows),
            Kernel::Blocked { block_size } => {
                multiply_blocked_rows(a, b, band, rows, block_size)
            }
        }
    }

    /// Compute the tile of A × B covering rows `rows` and columns `cols`.
    /// `segments[r]` holds those columns of row `rows.start + r`.
    pub fn run_tile(
        &self,
        a: &Matrix,
        b: &Matrix,
        segments: &mut [&mut [i32]],
        rows: RowRange,
        cols: Range<usize>,
    ) -> Result<()> {
        match *self {
            Kernel::Naive => multiply_naive_tile(a, b, segments, rows, cols),
            Kernel::Blocked { block_size } => {
                multiply_blocked_tile(a, b, segments, rows, cols, block_size)
            }
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kernel::Naive => write!(f, "naive"),
            Kernel::Blocked { block_size } => write!(f, "blocked({})", block_size),
        }
    }
}

/// Both operands must be the same size; returns that size.
pub(crate) fn check_operands(a: &Matrix, b: &Matrix) -> Result<usize> {
    if a.n() != b.n() {
        return Err(MatmulError::DimensionMismatch {
            left: a.n(),
            right: b.n(),
        });
    }
    Ok(a.n())
}

/// Operands match, `rows` lies inside the matrix and `band` holds exactly
/// those rows. Returns n.
pub(crate) fn check_band(
    a: &Matrix,
    b: &Matrix,
    band: &[i32],
    rows: RowRange,
) -> Result<usize> {
    let n = check_operands(a, b)?;
    if rows.start > rows.end || rows.end > n {
        return Err(MatmulError::InvalidArgument(format!(
            "rows {} out of bounds for a {}x{} matrix",
            rows, n, n
        )));
    }
    if band.len() != rows.len() * n {
        return Err(MatmulError::InvalidArgument(format!(
            "band of {} cells cannot hold rows {} of width {}",
            band.len(),
            rows,
            n
        )));
    }
    Ok(n)
}

/// Operands match and `segments` holds exactly columns `cols` of each row
/// in `rows`. Returns n.
pub(crate) fn check_tile(
    a: &Matrix,
    b: &Matrix,
    segments: &[&mut [i32]],
    rows: RowRange,
    cols: &Range<usize>,
) -> Result<usize> {
    let n = check_operands(a, b)?;
    if rows.start > rows.end || rows.end > n || cols.start > cols.end || cols.end > n {
        return Err(MatmulError::InvalidArgument(format!(
            "tile rows {} columns {}..{} out of bounds for a {}x{} matrix",
            rows, cols.start, cols.end, n, n
        )));
    }
    if segments.len() != rows.len() || segments.iter().any(|seg| seg.len() != cols.len()) {
        return Err(MatmulError::InvalidArgument(format!(
            "segments do not match a tile of rows {} and columns {}..{}",
            rows, cols.start, cols.end
        )));
    }
    Ok(n)
}
