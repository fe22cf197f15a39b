use super::{Phase, Strategy, check_invocation, enter};
use crate::error::Result;
use crate::kernels::Kernel;
use crate::matrix::dense::Matrix;
use crate::matrix::partition::RowRange;

/// Single worker: the calling thread computes every row.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl Sequential {
    pub fn new() -> Self {
        Sequential
    }
}

impl Strategy for Sequential {
    fn name(&self) -> &str {
        "sequential"
    }

    fn workers(&self) -> usize {
        1
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
        let rows = RowRange::new(0, n);
        enter(self.name(), Phase::Partitioned);

        enter(self.name(), Phase::Executing);
        kernel.run(a, b, c.as_mut_slice(), rows)?;

        enter(self.name(), Phase::Joined);
        enter(self.name(), Phase::Done);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::naive::multiply_naive;

    #[test]
    fn test_overwrites_previous_contents() {
        let a = Matrix::random(12, 1).unwrap();
        let b = Matrix::random(12, 2).unwrap();
        let expected = multiply_naive(&a, &b).unwrap();

        let mut c = Matrix::random(12, 3).unwrap();
        Sequential
            .multiply_into(&a, &b, Kernel::blocked(5), &mut c)
            .unwrap();
        assert_eq!(c, expected);
    }
}
