//! # Status — Progress Display for the Special-Leaf Stage
//!
//! Raw progress through the sieve interval is a poor clock: the leaf sum
//! accumulates much faster than `low` advances because the leaves are
//! densest at the bottom of the interval. The displayed percent therefore
//! takes the larger of (low / limit) and (sum / sum_approx) and feeds it
//! through a fourth-order polynomial fitted so that displayed progress is
//! near-linear in wall time, pinned at (0, 0) and (100, 100).
//!
//! Purely cosmetic: nothing here feeds back into the numeric result.

use std::io::Write;
use std::time::Instant;

/// Fitted quartic mapping raw percent to displayed percent (max fit error
/// 1.3 over [0, 100]).
const C1: f64 = 3.705_597_965_854_855;
const C2: f64 = -0.073_304_534_886_526;
const C3: f64 = 6.789_531_238_482_789e-4;
const C4: f64 = -2.164_675_715_685_044_6e-6;

/// Map raw percent through the skew curve, clamped to [0, 100].
pub fn skewed_percent(p: f64) -> f64 {
    let p = p.clamp(0.0, 100.0);
    (C1 * p + C2 * p * p + C3 * p * p * p + C4 * p * p * p * p).clamp(0.0, 100.0)
}

/// Combined progress estimate from interval position and sum accumulation.
pub fn percent(low: u64, limit: u64, sum: i128, sum_approx: i128) -> f64 {
    let p1 = if limit == 0 {
        100.0
    } else {
        100.0 * low as f64 / limit as f64
    };
    let p2 = if sum_approx <= 0 {
        0.0
    } else {
        100.0 * sum as f64 / sum_approx as f64
    };
    skewed_percent(p1.max(p2))
}

/// Rate-limited "\rStatus: N%" printer for the --status option.
pub struct Status {
    last_print: Option<Instant>,
    last_percent: f64,
    precision: usize,
}

impl Status {
    pub fn new(precision: usize) -> Self {
        Status {
            last_print: None,
            last_percent: -1.0,
            precision,
        }
    }

    /// Print at most every 100ms, and never let the display move backwards.
    pub fn print(&mut self, low: u64, limit: u64, sum: i128, sum_approx: i128) {
        if !crate::config::print_status() {
            return;
        }
        let now = Instant::now();
        if let Some(last) = self.last_print {
            if now.duration_since(last).as_secs_f64() < 0.1 {
                return;
            }
        }
        self.last_print = Some(now);
        let pct = percent(low, limit, sum, sum_approx).max(self.last_percent);
        self.last_percent = pct;
        eprint!("\rStatus: {:.*}%", self.precision, pct);
        let _ = std::io::stderr().flush();
    }

    /// Terminate the status line once the computation is done.
    pub fn finish(&mut self) {
        if crate::config::print_status() && self.last_print.is_some() {
            eprintln!("\rStatus: 100%   ");
        }
    }
}
