//! Tiled GEMM over a band of rows.

use std::ops::Range;

use crate::error::{MatmulError, Result};
use crate::kernels::{check_band, check_operands, check_tile};
use crate::matrix::dense::Matrix;
use crate::matrix::partition::RowRange;

/// Cache-blocked multiplication of rows `rows` of A × B into `band`.
///
/// Three blocking loops walk the row, column and reduction dimensions in
/// steps of `block_size`; inside each tile a plain triple loop accumulates
/// into C. Tiles at the right and bottom edges are clipped, so any block
/// size works: 1 degenerates to the naive loop order and anything `>= n`
/// to a single tile.
///
/// The band is zeroed first. Nothing outside `band` is written, which is
/// what lets several workers run this on disjoint bands of one matrix.
///
/// # Arguments
///
/// * `band` - the cells of C for rows `rows` only, row-major
/// * `rows` - which rows of C the band holds
/// * `block_size` - tile side, must be positive
pub fn multiply_blocked_rows(
    a: &Matrix,
    b: &Matrix,
    band: &mut [i32],
    rows: RowRange,
    block_size: usize,
) -> Result<()> {
    if block_size == 0 {
        return Err(MatmulError::InvalidArgument(
            "block size must be positive".to_string(),
        ));
    }
    let n = check_band(a, b, band, rows)?;
    band.fill(0);

    for ii in (rows.start..rows.end).step_by(block_size) {
        let i_end = (ii + block_size).min(rows.end);

        for jj in (0..n).step_by(block_size) {
            let j_end = (jj + block_size).min(n);

            for kk in (0..n).step_by(block_size) {
                let k_end = (kk + block_size).min(n);

                let tile = Tile {
                    rows: ii..i_end,
                    cols: jj..j_end,
                    depth: kk..k_end,
                };
                accumulate_tile(a, b, band, rows.start, n, &tile);
            }
        }
    }
    Ok(())
}

/// Cache-blocked multiplication of one (row block, column block) tile.
///
/// `segments[r]` holds columns `cols` of row `rows.start + r` of C. The
/// segments are zeroed, then the reduction dimension is walked in steps of
/// `block_size`. Used by the dynamic pool schedule, where each tile is a
/// separate unit of work.
pub fn multiply_blocked_tile(
    a: &Matrix,
    b: &Matrix,
    segments: &mut [&mut [i32]],
    rows: RowRange,
    cols: Range<usize>,
    block_size: usize,
) -> Result<()> {
    if block_size == 0 {
        return Err(MatmulError::InvalidArgument(
            "block size must be positive".to_string(),
        ));
    }
    let n = check_tile(a, b, segments, rows, &cols)?;
    for seg in segments.iter_mut() {
        seg.fill(0);
    }

    for kk in (0..n).step_by(block_size) {
        let depth = kk..(kk + block_size).min(n);
        for (i, seg) in rows.indices().zip(segments.iter_mut()) {
            accumulate_segment(a, b, n, i, &cols, &depth, seg);
        }
    }
    Ok(())
}

/// C = A × B with the blocked kernel, single-threaded.
pub fn multiply_blocked(a: &Matrix, b: &Matrix, block_size: usize) -> Result<Matrix> {
    let n = check_operands(a, b)?;
    let mut c = Matrix::new(n)?;
    multiply_blocked_rows(a, b, c.as_mut_slice(), RowRange::new(0, n), block_size)?;
    Ok(c)
}

struct Tile {
    rows: Range<usize>,
    cols: Range<usize>,
    depth: Range<usize>,
}

fn accumulate_tile(
    a: &Matrix,
    b: &Matrix,
    band: &mut [i32],
    band_start: usize,
    n: usize,
    tile: &Tile,
) {
    for i in tile.rows.clone() {
        let local = (i - band_start) * n;
        let c_seg = &mut band[local + tile.cols.start..local + tile.cols.end];
        accumulate_segment(a, b, n, i, &tile.cols, &tile.depth, c_seg);
    }
}

// C[i][j] += sum over k in `depth` of A[i][k] * B[k][j], for j in `cols`
fn accumulate_segment(
    a: &Matrix,
    b: &Matrix,
    n: usize,
    i: usize,
    cols: &Range<usize>,
    depth: &Range<usize>,
    c_seg: &mut [i32],
) {
    let b = b.as_slice();
    let a_seg = &a.row(i)[depth.clone()];

    for (j, c) in cols.clone().zip(c_seg.iter_mut()) {
        let mut sum = *c;
        for (k, &a_ik) in depth.clone().zip(a_seg) {
            sum = sum.wrapping_add(a_ik.wrapping_mul(b[k * n + j]));
        }
        *c = sum;
    }
}
