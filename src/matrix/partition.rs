//! Splitting the rows of the output matrix between workers.
//!
//! Every parallel strategy writes into C without locks. That is sound only
//! because each worker owns a disjoint band of rows, so the bands are built
//! here, once, and handed out as separate `&mut` slices.

use std::fmt;
use std::ops::Range;

use crate::error::{MatmulError, Result};

/// Half-open range of row indices `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn indices(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<RowRange> for Range<usize> {
    fn from(r: RowRange) -> Self {
        r.start..r.end
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Validate a worker count for an n×n problem.
///
/// More workers than rows would leave some with nothing to do, so the count
/// is clamped to `n` (with a warning) rather than rejected.
pub fn clamp_workers(n: usize, workers: usize) -> Result<usize> {
    if n == 0 {
        return Err(MatmulError::InvalidArgument(
            "matrix size must be positive".to_string(),
        ));
    }
    if workers == 0 {
        return Err(MatmulError::InvalidArgument(
            "worker count must be positive".to_string(),
        ));
    }
    if workers > n {
        log::warn!(
            "clamping worker count from {} to {} (one row per worker at most)",
            workers,
            n
        );
        return Ok(n);
    }
    Ok(workers)
}

/// Divide `n` rows into `workers` contiguous ranges.
///
/// The first `n % workers` ranges get one extra row. The result covers
/// `[0, n)` exactly once, in order, and no range is empty.
///
/// ```
/// use matmul_bench::matrix::partition::{partition_rows, RowRange};
///
/// let parts = partition_rows(10, 3).unwrap();
/// assert_eq!(parts, vec![RowRange::new(0, 4), RowRange::new(4, 7), RowRange::new(7, 10)]);
/// ```
pub fn partition_rows(n: usize, workers: usize) -> Result<Vec<RowRange>> {
    let workers = clamp_workers(n, workers)?;
    let base = n / workers;
    let extra = n % workers;

    let mut start = 0;
    let ranges = (0..workers)
        .map(|w| {
            let len = base + usize::from(w < extra);
            let range = RowRange::new(start, start + len);
            start += len;
            range
        })
        .collect();
    Ok(ranges)
}

/// Split a row-major n-wide buffer into one mutable band per range.
///
/// Ranges must be ascending and contiguous from row 0, which is exactly what
/// [`partition_rows`] returns; anything else is rejected.
pub fn split_bands<'a>(
    data: &'a mut [i32],
    n: usize,
    ranges: &[RowRange],
) -> Result<Vec<&'a mut [i32]>> {
    let mut rest = data;
    let mut next_row = 0;
    let mut bands = Vec::with_capacity(ranges.len());

    for range in ranges {
        if range.start != next_row || range.end < range.start {
            return Err(MatmulError::InvalidArgument(format!(
                "row range {} does not continue from row {}",
                range, next_row
            )));
        }
        let cells = range.len() * n;
        if cells > rest.len() {
            return Err(MatmulError::InvalidArgument(format!(
                "row range {} runs past the end of the matrix",
                range
            )));
        }
        let (band, tail) = std::mem::take(&mut rest).split_at_mut(cells);
        bands.push(band);
        rest = tail;
        next_row = range.end;
    }

    Ok(bands)
}
