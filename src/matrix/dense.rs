//! Square, dense, row-major integer matrices.

use std::mem::size_of;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use super::partition::RowRange;
use crate::error::{MatmulError, Result};

/// Cells produced by [`Matrix::fill_random`] lie in `0..VALUE_RANGE`.
pub const VALUE_RANGE: i32 = 100;

/// An n×n matrix of `i32`, stored row-major in one flat buffer.
///
/// Cell `(i, j)` lives at `i * n + j`. A matrix is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    n: usize,
    data: Vec<i32>,
}

impl Matrix {
    /// Allocate a zero-filled n×n matrix.
    ///
    /// The buffer is reserved fallibly, so running out of memory surfaces as
    /// [`MatmulError::Allocation`] instead of aborting.
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(MatmulError::InvalidArgument(
                "matrix size must be positive".to_string(),
            ));
        }
        let cells = n
            .checked_mul(n)
            .ok_or(MatmulError::Allocation { bytes: usize::MAX })?;
        let bytes = cells.saturating_mul(size_of::<i32>());

        let mut data = Vec::new();
        data.try_reserve_exact(cells)
            .map_err(|_| MatmulError::Allocation { bytes })?;
        data.resize(cells, 0);

        Ok(Self { n, data })
    }

    /// Build a matrix from its rows. Every row must have as many cells as
    /// there are rows.
    ///
    /// ```
    /// use matmul_bench::Matrix;
    ///
    /// let m = Matrix::from_rows(&[[1, 2], [3, 4]]).unwrap();
    /// assert_eq!(m.get(1, 0), 3);
    /// ```
    pub fn from_rows<R: AsRef<[i32]>>(rows: &[R]) -> Result<Self> {
        let n = rows.len();
        let mut m = Self::new(n)?;
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != n {
                return Err(MatmulError::InvalidArgument(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            m.data[i * n..(i + 1) * n].copy_from_slice(row);
        }
        Ok(m)
    }

    /// Wrap a flat row-major buffer of exactly `n * n` cells.
    pub fn from_vec(n: usize, data: Vec<i32>) -> Result<Self> {
        if n == 0 {
            return Err(MatmulError::InvalidArgument(
                "matrix size must be positive".to_string(),
            ));
        }
        if Some(data.len()) != n.checked_mul(n) {
            return Err(MatmulError::InvalidArgument(format!(
                "buffer of {} cells cannot hold a {}x{} matrix",
                data.len(),
                n,
                n
            )));
        }
        Ok(Self { n, data })
    }

    /// Allocate an n×n matrix and fill it from `seed`.
    pub fn random(n: usize, seed: u64) -> Result<Self> {
        let mut m = Self::new(n)?;
        m.fill_random(seed);
        Ok(m)
    }

    /// Overwrite every cell with a value drawn uniformly from `0..VALUE_RANGE`.
    ///
    /// The same seed always produces the same matrix.
    pub fn fill_random(&mut self, seed: u64) {
        fill_cells(&mut self.data, seed);
    }

    pub fn fill_zero(&mut self) {
        self.data.fill(0);
    }

    /// Side length.
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn get(&self, i: usize, j: usize) -> i32 {
        self.data[i * self.n + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: i32) {
        self.data[i * self.n + j] = value;
    }

    pub fn row(&self, i: usize) -> &[i32] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [i32] {
        &mut self.data
    }

    /// The cells of rows `rows`, as one contiguous band.
    pub fn band_mut(&mut self, rows: RowRange) -> Result<&mut [i32]> {
        if rows.start > rows.end || rows.end > self.n {
            return Err(MatmulError::InvalidArgument(format!(
                "rows {} out of bounds for a {}x{} matrix",
                rows, self.n, self.n
            )));
        }
        Ok(&mut self.data[rows.start * self.n..rows.end * self.n])
    }

    /// Wrapping sum of every cell, for quick diagnostics.
    pub fn checksum(&self) -> i64 {
        self.data
            .iter()
            .fold(0i64, |acc, &x| acc.wrapping_add(x as i64))
    }

    /// First cell (row, column) at which `self` and `other` disagree.
    pub fn first_difference(&self, other: &Matrix) -> Option<(usize, usize)> {
        if self.n != other.n {
            return Some((0, 0));
        }
        self.data
            .iter()
            .zip(&other.data)
            .position(|(x, y)| x != y)
            .map(|idx| (idx / self.n, idx % self.n))
    }
}

/// Fill a run of cells from a ChaCha stream seeded with `seed`.
pub(crate) fn fill_cells(cells: &mut [i32], seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for cell in cells {
        *cell = rng.gen_range(0..VALUE_RANGE);
    }
}

/// Wall-clock time in nanoseconds, used as the base of per-run seeds.
pub fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Seed for worker `worker_id` given a base seed: `base + worker_id * 1000`.
pub fn derive_seed(base: u64, worker_id: usize) -> u64 {
    base.wrapping_add((worker_id as u64).wrapping_mul(1000))
}

/// Seed combining the current time with a worker id, so concurrent workers
/// draw from independent streams.
pub fn worker_seed(worker_id: usize) -> u64 {
    derive_seed(clock_seed(), worker_id)
}
