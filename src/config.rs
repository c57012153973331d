//! # Config — Process-Wide Tuning Knobs
//!
//! The pi(x) algorithms expose three tuning factors and a thread count,
//! all process-wide so that a CLI flag or a test can pin them before any
//! computation starts:
//!
//! - `alpha`: y = alpha * x^(1/3) for LMO and Deleglise-Rivat. Larger
//!   alpha trades memory (bigger mu/lpf tables) for fewer special leaves.
//! - `alpha_y` / `alpha_z`: Gourdon's y = alpha_y * x^(1/3) and
//!   z = alpha_z * y.
//! - `threads`: worker count for the parallel stages; 0 means one per
//!   logical CPU.
//!
//! The sentinel 0 (or 0.0) always means "derive from x". Environment
//! variables `PRIMECOUNT_ALPHA` and `PRIMECOUNT_THREADS` provide defaults
//! that explicit setters override.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Pass to `set_num_threads` to return to "use all logical cores".
pub const MAX_THREADS: usize = 0;

static ALPHA: AtomicU64 = AtomicU64::new(0); // f64 bits; 0.0 = auto
static ALPHA_Y: AtomicU64 = AtomicU64::new(0);
static ALPHA_Z: AtomicU64 = AtomicU64::new(0);
static NUM_THREADS: AtomicUsize = AtomicUsize::new(0);
static STATUS: AtomicBool = AtomicBool::new(false);
static STATUS_PRECISION: AtomicUsize = AtomicUsize::new(0);

fn load_f64(cell: &AtomicU64) -> f64 {
    f64::from_bits(cell.load(Ordering::Relaxed))
}

fn store_f64(cell: &AtomicU64, v: f64) {
    cell.store(v.to_bits(), Ordering::Relaxed);
}

/// Set the LMO / Deleglise-Rivat tuning factor; 0.0 restores auto.
pub fn set_alpha(alpha: f64) {
    store_f64(&ALPHA, alpha.max(0.0));
}

/// Set Gourdon's y tuning factor; 0.0 restores auto.
pub fn set_alpha_y(alpha_y: f64) {
    store_f64(&ALPHA_Y, alpha_y.max(0.0));
}

/// Set Gourdon's z tuning factor; 0.0 restores auto.
pub fn set_alpha_z(alpha_z: f64) {
    store_f64(&ALPHA_Z, alpha_z.max(0.0));
}

fn env_alpha() -> f64 {
    std::env::var("PRIMECOUNT_ALPHA")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0.0)
}

/// Resolve alpha for a given x, clamped into the admissible [1, x^(1/6)].
///
/// The auto curve grows with log(x): more memory is worth spending on
/// bigger inputs because the special-leaf count shrinks roughly as 1/alpha.
pub fn get_alpha(x: u128) -> f64 {
    let set = load_f64(&ALPHA);
    let raw = if set > 0.0 {
        set
    } else {
        let env = env_alpha();
        if env > 0.0 {
            env
        } else {
            let log10x = (x.max(10) as f64).log10();
            (log10x * log10x) / 18.0
        }
    };
    clamp_alpha(raw, x)
}

/// Resolve Gourdon's alpha_y, same auto curve as `get_alpha`.
pub fn get_alpha_y(x: u128) -> f64 {
    let set = load_f64(&ALPHA_Y);
    if set > 0.0 {
        clamp_alpha(set, x)
    } else {
        get_alpha(x)
    }
}

/// Resolve Gourdon's alpha_z (z = alpha_z * y); default 2.
pub fn get_alpha_z(x: u128) -> f64 {
    let set = load_f64(&ALPHA_Z);
    if set > 0.0 {
        clamp_alpha(set, x)
    } else {
        2.0
    }
}

fn clamp_alpha(alpha: f64, x: u128) -> f64 {
    let max = crate::imath::iroot::<6>(x).max(1) as f64;
    alpha.clamp(1.0, max)
}

/// Set the worker thread count; `MAX_THREADS` (0) means all logical cores.
pub fn set_num_threads(threads: usize) {
    NUM_THREADS.store(threads, Ordering::Relaxed);
}

/// The worker thread count the parallel stages will use.
pub fn get_num_threads() -> usize {
    let set = NUM_THREADS.load(Ordering::Relaxed);
    if set > 0 {
        return set;
    }
    if let Ok(v) = std::env::var("PRIMECOUNT_THREADS") {
        if let Ok(n) = v.parse::<usize>() {
            if n > 0 {
                return n;
            }
        }
    }
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

/// Cap the thread count by the amount of work: no point spawning a worker
/// for fewer than `threshold` iterations.
pub fn ideal_num_threads(work: u64, threads: usize, threshold: u64) -> usize {
    let max_useful = (work / threshold.max(1)).max(1);
    threads.clamp(1, max_useful as usize)
}

/// Enable or disable live status printing (the CLI --status flag).
pub fn set_print_status(on: bool) {
    STATUS.store(on, Ordering::Relaxed);
}

pub fn print_status() -> bool {
    STATUS.load(Ordering::Relaxed)
}

/// Decimal digits shown by the status display.
pub fn set_status_precision(digits: usize) {
    STATUS_PRECISION.store(digits.min(5), Ordering::Relaxed);
}

pub fn status_precision() -> usize {
    STATUS_PRECISION.load(Ordering::Relaxed)
}

static BACKUP_FILE: std::sync::Mutex<Option<std::path::PathBuf>> = std::sync::Mutex::new(None);

/// Checkpoint file for the special-leaf load balancer; None disables
/// backup and resume.
pub fn set_backup_file(path: Option<std::path::PathBuf>) {
    *BACKUP_FILE.lock().unwrap() = path;
}

pub fn backup_file() -> Option<std::path::PathBuf> {
    BACKUP_FILE.lock().unwrap().clone()
}
