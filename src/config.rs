//! Command-line configuration.
//!
//! There are no config files; everything comes from the command line, and
//! `RUST_LOG` controls log verbosity.

use std::fmt;

use clap::{Args, Parser, Subcommand};

use crate::error::{MatmulError, Result};
use crate::kernels::{DEFAULT_BLOCK_SIZE, WORKER_BLOCK_SIZE};
use crate::matrix::partition::clamp_workers;

#[derive(Parser, Debug)]
#[command(
    name = "matmul-bench",
    version,
    about = "Naive vs cache-blocked integer matrix multiplication, sequential and parallel"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// One thread: naive loop vs blocked loop
    Sequential(SequentialArgs),
    /// Shared-memory threads, one band of rows each
    Threads(ParallelArgs),
    /// Forked processes writing into a shared mapping (unix only)
    Processes(ParallelArgs),
    /// Worker pool: static schedule for the naive run, dynamic for the blocked run
    Pool(ParallelArgs),
}

#[derive(Args, Debug)]
pub struct SequentialArgs {
    /// Side length of the square matrices
    pub size: usize,
    #[command(flatten)]
    pub options: RunOptions,
}

#[derive(Args, Debug)]
pub struct ParallelArgs {
    /// Side length of the square matrices
    pub size: usize,
    /// Number of workers (clamped to the matrix size)
    pub workers: usize,
    #[command(flatten)]
    pub options: RunOptions,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunOptions {
    /// Tile side for the blocked kernel [default: 64, or 32 for threads and processes]
    #[arg(long, value_name = "B")]
    pub block_size: Option<usize>,
    /// Fixed seed for A and B [default: derived from the clock]
    #[arg(long, value_name = "S")]
    pub seed: Option<u64>,
    /// Skip checking that the naive and blocked results agree
    #[arg(long)]
    pub no_verify: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sequential,
    Threads,
    Processes,
    Pool,
}

impl Mode {
    pub fn default_block_size(self) -> usize {
        match self {
            Mode::Sequential | Mode::Pool => DEFAULT_BLOCK_SIZE,
            _ => WORKER_BLOCK_SIZE,
        }
    }

    pub fn is_parallel(self) -> bool {
        self != Mode::Sequential
    }

    pub fn title(self) -> &'static str {
        match self {
            Mode::Sequential => "SEQUENTIAL",
            Mode::Threads => "THREADS",
            Mode::Processes => "PROCESSES",
            Mode::Pool => "WORKER POOL",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Sequential => "sequential",
            Mode::Threads => "threads",
            Mode::Processes => "processes",
            Mode::Pool => "pool",
        };
        f.write_str(name)
    }
}

/// A validated benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    pub mode: Mode,
    pub size: usize,
    /// Effective worker count, already clamped to `size`.
    pub workers: usize,
    pub block_size: usize,
    pub seed: Option<u64>,
    pub verify: bool,
}

impl BenchConfig {
    /// Validate `size` and `workers` and pick the mode's default block size.
    /// Sequential runs always use one worker.
    pub fn new(mode: Mode, size: usize, workers: usize) -> Result<Self> {
        let workers = if mode.is_parallel() { workers } else { 1 };
        let workers = clamp_workers(size, workers)?;
        Ok(Self {
            mode,
            size,
            workers,
            block_size: mode.default_block_size(),
            seed: None,
            verify: true,
        })
    }

    pub fn with_block_size(mut self, block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(MatmulError::InvalidArgument(
                "block size must be positive".to_string(),
            ));
        }
        self.block_size = block_size;
        Ok(self)
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    fn with_options(self, options: RunOptions) -> Result<Self> {
        let config = match options.block_size {
            Some(block_size) => self.with_block_size(block_size)?,
            None => self,
        };
        Ok(config
            .with_seed(options.seed)
            .with_verify(!options.no_verify))
    }
}

impl TryFrom<Cli> for BenchConfig {
    type Error = MatmulError;

    fn try_from(cli: Cli) -> Result<Self> {
        match cli.command {
            Command::Sequential(args) => {
                BenchConfig::new(Mode::Sequential, args.size, 1)?.with_options(args.options)
            }
            Command::Threads(args) => parallel(Mode::Threads, args),
            Command::Processes(args) => parallel(Mode::Processes, args),
            Command::Pool(args) => parallel(Mode::Pool, args),
        }
    }
}

fn parallel(mode: Mode, args: ParallelArgs) -> Result<BenchConfig> {
    BenchConfig::new(mode, args.size, args.workers)?.with_options(args.options)
}
