//! Parallel execution strategies.
//!
//! All strategies compute the same thing, C = A × B, by giving each worker
//! a disjoint band of output rows. They differ only in what a worker is:
//!
//! - [`Sequential`]: the calling thread, one band covering every row
//! - [`Threaded`]: scoped OS threads sharing A, B and C
//! - [`Forked`]: child processes writing into a shared mapping (unix only)
//! - [`Pooled`]: a rayon pool with static or dynamic row scheduling
//!
//! An invocation moves through [`Phase`]s in order and cannot be cancelled:
//! it either returns a complete C or fails as a whole.

use std::fmt::{self, Debug};

use crate::error::{MatmulError, Result};
use crate::kernels::Kernel;
use crate::matrix::dense::Matrix;

pub mod pool;
#[cfg(unix)]
pub mod processes;
pub mod progress;
pub mod sequential;
#[cfg(unix)]
pub mod shared;
pub mod threads;

pub use pool::{Pooled, Schedule};
#[cfg(unix)]
pub use processes::Forked;
pub use progress::Progress;
pub use sequential::Sequential;
#[cfg(unix)]
pub use shared::SharedRegion;
pub use threads::{Threaded, fill_pair, generate_pair};

/// A way of running a [`Kernel`] across workers.
pub trait Strategy: Send + Sync + Debug {
    /// Short name for reports, e.g. "threads".
    fn name(&self) -> &str;

    /// Requested worker count. The effective count is clamped to n.
    fn workers(&self) -> usize;

    /// Compute A × B into `c`, overwriting every cell.
    fn multiply_into(
        &self,
        a: &Matrix,
        b: &Matrix,
        kernel: Kernel,
        c: &mut Matrix,
    ) -> Result<()>;

    /// Compute A × B into a freshly allocated matrix.
    fn multiply(&self, a: &Matrix, b: &Matrix, kernel: Kernel) -> Result<Matrix> {
        let mut c = Matrix::new(a.n())?;
        self.multiply_into(a, b, kernel, &mut c)?;
        Ok(c)
    }
}

/// Lifecycle of one strategy invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Partitioned,
    Executing,
    Joined,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Partitioned => "partitioned",
            Phase::Executing => "executing",
            Phase::Joined => "joined",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

pub(crate) fn enter(strategy: &str, phase: Phase) {
    log::trace!("{}: {}", strategy, phase);
}

/// Operands and output agree in size and the kernel is usable. Returns n.
pub(crate) fn check_invocation(
    a: &Matrix,
    b: &Matrix,
    kernel: Kernel,
    c: &Matrix,
) -> Result<usize> {
    let n = crate::kernels::check_operands(a, b)?;
    if c.n() != n {
        return Err(MatmulError::DimensionMismatch {
            left: n,
            right: c.n(),
        });
    }
    kernel.validate()?;
    Ok(n)
}

pub(crate) fn positive_workers(workers: usize) -> Result<usize> {
    if workers == 0 {
        return Err(MatmulError::InvalidArgument(
            "worker count must be positive".to_string(),
        ));
    }
    Ok(workers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Idle.to_string(), "idle");
        assert_eq!(Phase::Done.to_string(), "done");
    }

    #[test]
    fn test_output_size_checked() {
        let a = Matrix::new(3).unwrap();
        let c = Matrix::new(4).unwrap();
        assert!(check_invocation(&a, &a, Kernel::Naive, &c).is_err());
        assert!(check_invocation(&a, &a, Kernel::blocked(0), &a).is_err());
        assert_eq!(check_invocation(&a, &a, Kernel::Naive, &a).unwrap(), 3);
    }
}
