//! Shared-memory threads.

use std::thread;

use super::progress::Progress;
use super::{Phase, Strategy, check_invocation, enter, positive_workers};
use crate::error::{MatmulError, Result};
use crate::kernels::Kernel;
use crate::matrix::dense::{Matrix, derive_seed};
use crate::matrix::partition::{partition_rows, split_bands};

/// One OS thread per band of rows.
///
/// A and B are shared read-only; C is split into disjoint `&mut` bands
/// before any thread starts, so no lock is needed on the matrix itself.
/// Thread count adapts to the matrix: never more threads than rows.
#[derive(Debug, Clone)]
pub struct Threaded {
    workers: usize,
}

impl Threaded {
    pub fn new(workers: usize) -> Result<Self> {
        Ok(Self {
            workers: positive_workers(workers)?,
        })
    }
}

impl Strategy for Threaded {
    fn name(&self) -> &str {
        "threads"
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

        let ranges = partition_rows(n, self.workers)?;
        let bands = split_bands(c.as_mut_slice(), n, &ranges)?;
        enter(self.name(), Phase::Partitioned);

        let progress = &Progress::new();
        thread::scope(|s| -> Result<()> {
            let handles = bands
                .into_iter()
                .zip(&ranges)
                .enumerate()
                .map(|(id, (band, &rows))| {
                    thread::Builder::new()
                        .name(format!("matmul-{}", id))
                        .spawn_scoped(s, move || -> Result<()> {
                            log::debug!("thread {}: rows {} ({})", id, rows, kernel);
                            kernel.run(a, b, band, rows)?;
                            let done = progress.record(rows.len());
                            log::debug!("thread {}: rows {} done ({}/{})", id, rows, done, n);
                            Ok(())
                        })
                        .map_err(|e| MatmulError::WorkerSpawn(format!("thread {}: {}", id, e)))
                })
                .collect::<Result<Vec<_>>>()?;
            enter(self.name(), Phase::Executing);

            // Join everything before reporting, so no thread outlives a failure.
            let mut first_err = None;
            for (id, handle) in handles.into_iter().enumerate() {
                let outcome = handle
                    .join()
                    .map_err(|_| MatmulError::WorkerFailed {
                        worker: id,
                        reason: "thread panicked".to_string(),
                    })
                    .and_then(|r| r);
                if let Err(e) = outcome {
                    first_err.get_or_insert(e);
                }
            }
            first_err.map_or(Ok(()), Err)
        })?;
        enter(self.name(), Phase::Joined);

        debug_assert_eq!(progress.rows_done(), n);
        enter(self.name(), Phase::Done);
        Ok(())
    }
}

/// Generate A and B at the same time on two threads.
///
/// Thread 1 fills A and thread 2 fills B, each from its own stream seeded
/// with `derive_seed(base, id)`.
pub fn generate_pair(n: usize, base: u64) -> Result<(Matrix, Matrix)> {
    let mut a = Matrix::new(n)?;
    let mut b = Matrix::new(n)?;
    fill_pair(&mut a, &mut b, base)?;
    Ok((a, b))
}

/// Refill two already allocated matrices the way [`generate_pair`] does.
pub fn fill_pair(a: &mut Matrix, b: &mut Matrix, base: u64) -> Result<()> {
    thread::scope(|s| -> Result<()> {
        let jobs = [(1usize, 'A', a), (2, 'B', b)];
        let handles = jobs
            .into_iter()
            .map(|(id, name, m)| {
                thread::Builder::new()
                    .name(format!("generate-{}", name))
                    .spawn_scoped(s, move || {
                        let n = m.n();
                        log::debug!("thread {}: generating matrix {} ({}x{})", id, name, n, n);
                        m.fill_random(derive_seed(base, id));
                        log::debug!("thread {}: matrix {} done", id, name);
                    })
                    .map_err(|e| MatmulError::WorkerSpawn(format!("thread {}: {}", id, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut first_err = None;
        for (idx, handle) in handles.into_iter().enumerate() {
            if handle.join().is_err() {
                first_err.get_or_insert(MatmulError::WorkerFailed {
                    worker: idx + 1,
                    reason: "generator thread panicked".to_string(),
                });
            }
        }
        first_err.map_or(Ok(()), Err)
    })
}
