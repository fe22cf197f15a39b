use std::ops::Range;

use super::dense::Matrix;
use super::partition::RowRange;
use crate::error::Result;
use crate::kernels::{check_band, check_operands, check_tile};

/// Naive matrix multiplication using i-j-k loop order, over a band of rows.
///
/// This is the textbook triple loop. The innermost loop walks B with stride
/// `n` (down a column), so it misses cache on nearly every step; that is the
/// point of keeping it as the reference the blocked kernel is timed against.
///
/// Arithmetic wraps on overflow, so the result is exactly defined for any
/// input and matches the blocked kernel bit for bit.
///
/// # Arguments
///
/// * `band` - the cells of C for rows `rows` only, row-major
/// * `rows` - which rows of C the band holds
pub fn multiply_naive_rows(
    a: &Matrix,
    b: &Matrix,
    band: &mut [i32],
    rows: RowRange,
) -> Result<()> {
    let n = check_band(a, b, band, rows)?;
    let b = b.as_slice();

    for (local, i) in rows.indices().enumerate() {
        let a_row = a.row(i);
        let c_row = &mut band[local * n..(local + 1) * n];
        for (j, c) in c_row.iter_mut().enumerate() {
            let mut sum = 0i32;
            for (p, &a_ip) in a_row.iter().enumerate() {
                sum = sum.wrapping_add(a_ip.wrapping_mul(b[p * n + j]));
            }
            *c = sum;
        }
    }
    Ok(())
}

/// Naive i-j-k loop over the tile of rows `rows` and columns `cols`.
///
/// `segments[r]` holds columns `cols` of row `rows.start + r`; every cell in
/// them is overwritten.
pub fn multiply_naive_tile(
    a: &Matrix,
    b: &Matrix,
    segments: &mut [&mut [i32]],
    rows: RowRange,
    cols: Range<usize>,
) -> Result<()> {
    let n = check_tile(a, b, segments, rows, &cols)?;
    let b = b.as_slice();

    for (i, seg) in rows.indices().zip(segments.iter_mut()) {
        let a_row = a.row(i);
        for (j, c) in cols.clone().zip(seg.iter_mut()) {
            let mut sum = 0i32;
            for (p, &a_ip) in a_row.iter().enumerate() {
                sum = sum.wrapping_add(a_ip.wrapping_mul(b[p * n + j]));
            }
            *c = sum;
        }
    }
    Ok(())
}

/// C = A × B with the naive kernel, single-threaded.
pub fn multiply_naive(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    let n = check_operands(a, b)?;
    let mut c = Matrix::new(n)?;
    multiply_naive_rows(a, b, c.as_mut_slice(), RowRange::new(0, n))?;
    Ok(c)
}
