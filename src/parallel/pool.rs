//! Data-parallel loop scheduling on a rayon pool.

use std::fmt;
use std::ops::Range;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::{Phase, Strategy, check_invocation, enter, positive_workers};
use crate::error::{MatmulError, Result};
use crate::kernels::Kernel;
use crate::matrix::dense::{Matrix, derive_seed, fill_cells};
use crate::matrix::partition::RowRange;

/// How rows are handed to pool threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schedule {
    /// One precomputed contiguous chunk of rows per worker.
    #[default]
    Static,
    /// Workers pull the next unclaimed unit, one at a time: a
    /// `block_size` square (row block, column block) tile for the blocked
    /// kernel, a single row for the naive one.
    Dynamic,
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Static => f.write_str("static"),
            Schedule::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// A fixed pool of worker threads, built once and reused for every call.
///
/// Zeroing C always runs under the static schedule; the multiply itself
/// runs under `schedule`. Static chunks are bands of whole rows and dynamic
/// tiles are disjoint row segments, so each cell still has exactly one
/// writer.
#[derive(Debug)]
pub struct Pooled {
    pool: ThreadPool,
    workers: usize,
    schedule: Schedule,
}

impl Pooled {
    pub fn new(workers: usize, schedule: Schedule) -> Result<Self> {
        let workers = positive_workers(workers)?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("matmul-pool-{}", i))
            .build()
            .map_err(|e| MatmulError::WorkerSpawn(e.to_string()))?;

        Ok(Self {
            pool,
            workers,
            schedule,
        })
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Fill `matrix` with random cells on the pool.
    ///
    /// Rows are split statically into one chunk per worker, and chunk `id`
    /// draws from a stream seeded with `derive_seed(base, id)`, so the
    /// output depends only on `base` and the worker count.
    pub fn fill_random(&self, matrix: &mut Matrix, base: u64) {
        let n = matrix.n();
        let chunk = static_chunk_rows(n, self.workers) * n;
        self.pool.install(|| {
            matrix
                .as_mut_slice()
                .par_chunks_mut(chunk)
                .enumerate()
                .for_each(|(id, cells)| fill_cells(cells, derive_seed(base, id)));
        });
    }
}

impl Strategy for Pooled {
    fn name(&self) -> &str {
        match self.schedule {
            Schedule::Static => "pool-static",
            Schedule::Dynamic => "pool-dynamic",
        }
    }

    fn workers(&self) -> usize {
        self.workers
    }

    fn multiply_into(
        &self,
        a: &Matrix,
        b: &Matrix,
        kernel: Kernel,
        c: &mut Matrix,
    ) -> Result<()> {
        let n = check_invocation(a, b, kernel, c)?;
        enter(self.name(), Phase::Idle);

        let static_rows = static_chunk_rows(n, self.workers);
        let (tile_rows, tile_cols) = kernel.tile_shape(n);
        match self.schedule {
            Schedule::Static => log::debug!(
                "{}: {} rows per chunk, {} chunks",
                self.name(),
                static_rows,
                n.div_ceil(static_rows)
            ),
            Schedule::Dynamic => log::debug!(
                "{}: {}x{} tiles, {} units",
                self.name(),
                tile_rows,
                tile_cols,
                n.div_ceil(tile_rows) * n.div_ceil(tile_cols)
            ),
        }
        enter(self.name(), Phase::Partitioned);

        let cells = c.as_mut_slice();
        let outcome = self.pool.install(|| {
            cells
                .par_chunks_mut(static_rows * n)
                .for_each(|band| band.fill(0));
            enter(self.name(), Phase::Executing);

            match self.schedule {
                Schedule::Static => cells
                    .par_chunks_mut(static_rows * n)
                    .enumerate()
                    .try_for_each(|(idx, band)| {
                        let start = idx * static_rows;
                        let rows = RowRange::new(start, start + band.len() / n);
                        kernel.run(a, b, band, rows)
                    }),
                Schedule::Dynamic => split_tiles(cells, n, tile_rows, tile_cols)
                    .into_par_iter()
                    .with_max_len(1)
                    .try_for_each(|mut unit| {
                        kernel.run_tile(a, b, &mut unit.segments, unit.rows, unit.cols)
                    }),
            }
        });
        enter(self.name(), Phase::Joined);
        outcome?;

        enter(self.name(), Phase::Done);
        Ok(())
    }
}

/// One dynamically scheduled unit: the cells of C in rows `rows` and columns
/// `cols`, one segment per row.
struct TileUnit<'a> {
    rows: RowRange,
    cols: Range<usize>,
    segments: Vec<&'a mut [i32]>,
}

// Cut an n-wide row-major buffer into tiles of `tile_rows` x `tile_cols`,
// clipped at the edges. Every cell lands in exactly one tile.
fn split_tiles(
    cells: &mut [i32],
    n: usize,
    tile_rows: usize,
    tile_cols: usize,
) -> Vec<TileUnit<'_>> {
    let col_blocks = n.div_ceil(tile_cols);
    let mut tiles = Vec::with_capacity(n.div_ceil(tile_rows) * col_blocks);

    for (bi, band) in cells.chunks_mut(tile_rows * n).enumerate() {
        let start = bi * tile_rows;
        let rows = RowRange::new(start, start + band.len() / n);
        let mut row_tiles: Vec<TileUnit<'_>> = (0..col_blocks)
            .map(|bj| TileUnit {
                rows,
                cols: bj * tile_cols..((bj + 1) * tile_cols).min(n),
                segments: Vec::with_capacity(rows.len()),
            })
            .collect();

        for row in band.chunks_mut(n) {
            for (tile, seg) in row_tiles.iter_mut().zip(row.chunks_mut(tile_cols)) {
                tile.segments.push(seg);
            }
        }
        tiles.extend(row_tiles);
    }
    tiles
}

// Rows per chunk when n rows are spread evenly over at most n workers.
fn static_chunk_rows(n: usize, workers: usize) -> usize {
    n.div_ceil(workers.clamp(1, n.max(1))).max(1)
}
