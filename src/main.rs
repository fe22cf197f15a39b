//! Benchmark runner: naive vs blocked matrix multiplication under one
//! execution strategy.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use matmul_bench::config::{BenchConfig, Cli};
use matmul_bench::harness;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too, and are not failures.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = BenchConfig::try_from(cli).context("invalid arguments")?;
    log::info!(
        "running {} benchmark: n={}, workers={}, block size={}",
        config.mode,
        config.size,
        config.workers,
        config.block_size
    );
    harness::run(&config).with_context(|| format!("{} benchmark failed", config.mode))?;
    Ok(())
}
