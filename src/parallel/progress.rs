use std::sync::{Mutex, PoisonError};

/// Count of output rows finished so far, shared by the workers of one run.
///
/// The lock guards only the counter and is held only for the increment;
/// matrix writes never go through it.
#[derive(Debug, Default)]
pub struct Progress {
    rows_done: Mutex<usize>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `rows` finished rows and return the new total.
    pub fn record(&self, rows: usize) -> usize {
        let mut done = self.rows_done.lock().unwrap_or_else(PoisonError::into_inner);
        *done += rows;
        *done
    }

    pub fn rows_done(&self) -> usize {
        *self.rows_done.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
