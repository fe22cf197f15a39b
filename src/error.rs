use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatmulError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("dimension mismatch: {left}x{left} @ {right}x{right}")]
    DimensionMismatch { left: usize, right: usize },
    #[error("could not allocate {bytes} bytes")]
    Allocation { bytes: usize },
    #[error("failed to spawn worker: {0}")]
    WorkerSpawn(String),
    #[error("worker {worker} failed: {reason}")]
    WorkerFailed { worker: usize, reason: String },
    #[error("results differ at ({row}, {col}): expected {expected}, got {actual}")]
    Mismatch {
        row: usize,
        col: usize,
        expected: i32,
        actual: i32,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MatmulError>;
