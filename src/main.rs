//! # Main — CLI Entry Point
//!
//! Parses the command line, configures logging, threads and tuning
//! factors, then routes to the requested prime counting function.
//! The heavy lifting lives in the `primecount` library; `cli.rs` holds
//! the execution logic so this entry point stays slim.
//!
//! ## Global Options
//!
//! - `-t/--threads` / `PRIMECOUNT_THREADS`: worker threads (0 = all cores)
//! - `-a/--alpha` / `PRIMECOUNT_ALPHA`, `--alpha-y`, `--alpha-z`: tuning
//! - `--backup` / `--resume`: checkpoint file for long runs
//! - `-s/--status`: live progress on stderr
//! - `LOG_FORMAT=json`: structured logs for machine consumption

mod cli;

use anyhow::Result;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(
    name = "primecount",
    about = "Count the primes below x using combinatorial prime counting algorithms",
    version,
    disable_version_flag = true
)]
pub struct Cli {
    /// The upper bound x, as decimal, base**exp or base^exp (e.g. 10**14)
    pub x: Option<String>,

    /// Number of worker threads (0 = all logical cores)
    #[arg(short = 't', long, env = "PRIMECOUNT_THREADS")]
    pub threads: Option<usize>,

    /// Tuning factor y = alpha * x^(1/3) for LMO and Deleglise-Rivat (0 = auto)
    #[arg(short = 'a', long, env = "PRIMECOUNT_ALPHA")]
    pub alpha: Option<f64>,

    /// Gourdon tuning factor y = alpha_y * x^(1/3) (0 = auto)
    #[arg(long)]
    pub alpha_y: Option<f64>,

    /// Gourdon tuning factor z = alpha_z * y (0 = auto)
    #[arg(long)]
    pub alpha_z: Option<f64>,

    /// Count primes using Xavier Gourdon's algorithm (default)
    #[arg(short = 'g', long)]
    pub gourdon: bool,

    /// Count primes using the Deleglise-Rivat algorithm
    #[arg(short = 'd', long)]
    pub deleglise_rivat: bool,

    /// Count primes using the Lagarias-Miller-Odlyzko algorithm
    #[arg(long)]
    pub lmo: bool,

    /// Count primes using Legendre's formula
    #[arg(short = 'l', long)]
    pub legendre: bool,

    /// Count primes using Meissel's formula
    #[arg(short = 'm', long)]
    pub meissel: bool,

    /// Count primes using Lehmer's formula
    #[arg(long)]
    pub lehmer: bool,

    /// Count primes using the sieve of Eratosthenes
    #[arg(short = 'p', long)]
    pub primesieve: bool,

    /// Calculate the nth prime instead of pi(x)
    #[arg(short = 'n', long)]
    pub nth_prime: bool,

    /// Compute phi(x, A): numbers <= x coprime to the first A primes
    #[arg(long, value_name = "A")]
    pub phi: Option<i64>,

    /// Approximate pi(x) with the logarithmic integral Li(x)
    #[arg(long = "Li")]
    pub li: bool,

    /// Approximate the nth prime with Li^-1(x)
    #[arg(long = "Li-inverse", alias = "Li_inverse")]
    pub li_inverse: bool,

    /// Approximate pi(x) with Riemann's R(x)
    #[arg(long = "Ri")]
    pub ri: bool,

    /// Approximate the nth prime with R^-1(x)
    #[arg(long = "Ri-inverse", alias = "Ri_inverse")]
    pub ri_inverse: bool,

    /// Print progress to stderr, optionally with N decimal digits
    #[arg(short = 's', long, value_name = "N", num_args = 0..=1, require_equals = true, default_missing_value = "0")]
    pub status: Option<usize>,

    /// Print elapsed seconds after the result
    #[arg(long)]
    pub time: bool,

    /// Periodically write a resumable checkpoint to FILE
    #[arg(long, value_name = "FILE", num_args = 0..=1, require_equals = true, default_missing_value = "primecount.backup")]
    pub backup: Option<PathBuf>,

    /// Resume from a checkpoint written by --backup
    #[arg(long, value_name = "FILE", num_args = 0..=1, require_equals = true, default_missing_value = "primecount.backup")]
    pub resume: Option<PathBuf>,

    /// Run correctness tests and exit
    #[arg(long)]
    pub test: bool,

    /// Print version information
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // LOG_FORMAT=json for machine consumption, human-readable otherwise
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_target(false)
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }

    // usage errors exit 1; --help and --version exit 0
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(err)
            if matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) =>
        {
            let _ = err.print();
            return Ok(());
        }
        Err(err) => {
            let _ = err.print();
            std::process::exit(1);
        }
    };
    cli::run(&args)
}
