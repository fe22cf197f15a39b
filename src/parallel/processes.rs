//! Forked child processes writing into a shared mapping.

use std::io;
use std::panic::{self, AssertUnwindSafe};

use super::shared::SharedRegion;
use super::{Phase, Strategy, check_invocation, enter, positive_workers};
use crate::error::{MatmulError, Result};
use crate::kernels::Kernel;
use crate::matrix::dense::Matrix;
use crate::matrix::partition::{RowRange, partition_rows, split_bands};

/// One child process per band of rows.
///
/// C lives in a [`SharedRegion`] mapped before the first `fork`. Each child
/// inherits a copy-on-write view of A and B, computes its band straight into
/// the region and exits; the parent waits for every child, then copies the
/// region into the caller's matrix.
///
/// Children neither allocate nor log: the parent may have other threads
/// holding the allocator or logger locks at the moment of `fork`.
#[derive(Debug, Clone)]
pub struct Forked {
    workers: usize,
}

impl Forked {
    pub fn new(workers: usize) -> Result<Self> {
        Ok(Self {
            workers: positive_workers(workers)?,
        })
    }
}

impl Strategy for Forked {
    fn name(&self) -> &str {
        "processes"
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
        let mut region = SharedRegion::new(n * n)?;
        enter(self.name(), Phase::Partitioned);

        let mut children: Vec<(usize, libc::pid_t)> = Vec::with_capacity(ranges.len());
        let bands = split_bands(region.as_mut_slice(), n, &ranges)?;
        for (id, (band, &rows)) in bands.into_iter().zip(&ranges).enumerate() {
            log::debug!("process {}: rows {} ({})", id, rows, kernel);

            // SAFETY: the child only runs the kernel on memory it already
            // owns and leaves through `_exit`.
            match unsafe { libc::fork() } {
                -1 => {
                    let err = io::Error::last_os_error();
                    reap(&children);
                    return Err(MatmulError::WorkerSpawn(format!(
                        "fork for process {}: {}",
                        id, err
                    )));
                }
                0 => run_child(a, b, band, rows, kernel),
                pid => children.push((id, pid)),
            }
        }
        enter(self.name(), Phase::Executing);

        let mut first_err = None;
        for &(id, pid) in &children {
            match wait_child(id, pid) {
                Ok(()) => log::debug!("process {} (pid {}) finished", id, pid),
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        enter(self.name(), Phase::Joined);
        if let Some(e) = first_err {
            return Err(e);
        }

        c.as_mut_slice().copy_from_slice(region.as_slice());
        drop(region);
        enter(self.name(), Phase::Done);
        Ok(())
    }
}

fn run_child(a: &Matrix, b: &Matrix, band: &mut [i32], rows: RowRange, kernel: Kernel) -> ! {
    let ok = panic::catch_unwind(AssertUnwindSafe(|| kernel.run(a, b, band, rows).is_ok()))
        .unwrap_or(false);
    // SAFETY: `_exit` skips atexit handlers and stdio flushing that belong
    // to the parent.
    unsafe { libc::_exit(if ok { 0 } else { 1 }) }
}

fn wait_child(worker: usize, pid: libc::pid_t) -> Result<()> {
    let mut status: libc::c_int = 0;
    loop {
        // SAFETY: `pid` is a child of this process that has not been reaped.
        let rc = unsafe { libc::waitpid(pid, &mut status, 0) };
        if rc == pid {
            break;
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(MatmulError::Io(err));
        }
    }

    if libc::WIFEXITED(status) {
        match libc::WEXITSTATUS(status) {
            0 => Ok(()),
            code => Err(MatmulError::WorkerFailed {
                worker,
                reason: format!("exited with status {}", code),
            }),
        }
    } else if libc::WIFSIGNALED(status) {
        Err(MatmulError::WorkerFailed {
            worker,
            reason: format!("killed by signal {}", libc::WTERMSIG(status)),
        })
    } else {
        Err(MatmulError::WorkerFailed {
            worker,
            reason: "terminated abnormally".to_string(),
        })
    }
}

// Best effort: collect children that were already running when a later
// fork failed. Their output is discarded.
fn reap(children: &[(usize, libc::pid_t)]) {
    for &(id, pid) in children {
        if let Err(e) = wait_child(id, pid) {
            log::warn!("process {} (pid {}): {}", id, pid, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::naive::multiply_naive;

    #[test]
    fn test_2x2() {
        let a = Matrix::from_rows(&[[1, 2], [3, 4]]).unwrap();
        let b = Matrix::from_rows(&[[5, 6], [7, 8]]).unwrap();
        let c = Forked::new(2).unwrap().multiply(&a, &b, Kernel::Naive).unwrap();
        assert_eq!(c, Matrix::from_rows(&[[19, 22], [43, 50]]).unwrap());
    }

    #[test]
    fn test_matches_naive() {
        let n = 37;
        let a = Matrix::random(n, 8).unwrap();
        let b = Matrix::random(n, 9).unwrap();
        let expected = multiply_naive(&a, &b).unwrap();

        for workers in [1, 2, 3, 5] {
            let strategy = Forked::new(workers).unwrap();
            for kernel in [Kernel::Naive, Kernel::blocked(8)] {
                let c = strategy.multiply(&a, &b, kernel).unwrap();
                assert_eq!(c, expected, "workers={} kernel={}", workers, kernel);
            }
        }
    }

    // Runs `body` in a child that then exits with status 0.
    fn fork_child(body: impl FnOnce()) -> libc::pid_t {
        match unsafe { libc::fork() } {
            -1 => panic!("fork failed: {}", io::Error::last_os_error()),
            0 => {
                body();
                unsafe { libc::_exit(0) }
            }
            pid => pid,
        }
    }

    #[test]
    fn test_wait_child_reports_exit_status() {
        let pid = fork_child(|| unsafe { libc::_exit(3) });
        match wait_child(7, pid) {
            Err(MatmulError::WorkerFailed { worker, reason }) => {
                assert_eq!(worker, 7);
                assert!(reason.contains('3'), "{}", reason);
            }
            other => panic!("expected WorkerFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_wait_child_reports_signal() {
        let pid = fork_child(|| unsafe {
            libc::raise(libc::SIGKILL);
        });
        match wait_child(1, pid) {
            Err(MatmulError::WorkerFailed { reason, .. }) => {
                assert!(reason.contains("signal"), "{}", reason);
            }
            other => panic!("expected WorkerFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_wait_child_success() {
        let pid = fork_child(|| {});
        assert!(wait_child(0, pid).is_ok());
    }

    #[test]
    fn test_failing_kernel_exits_nonzero() {
        let a = Matrix::random(4, 1).unwrap();
        let b = Matrix::random(4, 2).unwrap();
        let mut short_band = vec![0; 3];
        let pid = fork_child(|| {
            run_child(&a, &b, &mut short_band, RowRange::new(0, 1), Kernel::Naive);
        });
        assert!(matches!(
            wait_child(2, pid),
            Err(MatmulError::WorkerFailed { worker: 2, .. })
        ));
    }

    #[test]
    fn test_overwrites_output() {
        let a = Matrix::random(6, 1).unwrap();
        let b = Matrix::random(6, 2).unwrap();
        let mut c = Matrix::random(6, 3).unwrap();
        Forked::new(4)
            .unwrap()
            .multiply_into(&a, &b, Kernel::blocked(2), &mut c)
            .unwrap();
        assert_eq!(c, multiply_naive(&a, &b).unwrap());
    }
}
