//! # Deleglise-Rivat — Parallel pi(x)
//!
//! LMO with the special leaves S2 split by how cheaply each leaf's
//! phi(x/n, b-1) can be resolved:
//!
//! - **trivial** (x/n < primes[b]): phi = 1, a closed-form count;
//! - **easy** (primes[b] > sqrt(z)): phi = pi(x/n) - b + 2, one PiTable
//!   lookup per leaf;
//! - **hard** (primes[b] <= sqrt(z)): resolved by the segmented sieve and
//!   binary indexed tree, distributed over threads by the load balancer.
//!
//! z = x/y is the sieve interval bound; every special leaf value x/n lies
//! below it.
//!
//!   pi(x) = S1 + S2_trivial + S2_easy + S2_hard + a - 1 - P2(x, y)
//!
//! ## References
//!
//! - M. Deleglise, J. Rivat, "Computing pi(x): the Meissel, Lehmer,
//!   Lagarias, Miller, Odlyzko method", Mathematics of Computation,
//!   65(213):235-245, 1996.

use rayon::prelude::*;
use tracing::debug;

use crate::balancer::BackupConfig;
use crate::config;
use crate::factor_table::FactorTable;
use crate::imath::{iroot, isqrt, isqrt128};
use crate::li::Ri;
use crate::meissel::pi_meissel;
use crate::p2::p2;
use crate::pi_table::PiTable;
use crate::primes::generate_primes_indexed;
use crate::s1::s1;
use crate::s2::{hard_leaves, EngineParams, LeafRange};

/// Below this the factor-table machinery has no room to work; the phi
/// recursion answers directly.
const SMALL_X: u128 = 2_048;

/// pi(x) by the Deleglise-Rivat method.
pub fn pi_deleglise_rivat(x: u128) -> i128 {
    pi_dr_params(x, config::get_alpha(x), config::get_num_threads())
}

pub fn pi_dr_params(x: u128, alpha: f64, threads: usize) -> i128 {
    if x < 2 {
        return 0;
    }
    if x < SMALL_X {
        return pi_meissel(x);
    }
    let x13 = iroot::<3>(x);
    let y = ((alpha * x13 as f64) as u64).clamp(x13, isqrt128(x));
    let z_wide = x / y as u128;
    assert!(
        z_wide < u64::MAX as u128,
        "x too large for the Deleglise-Rivat sieve interval"
    );
    let z = z_wide as u64;

    let primes = generate_primes_indexed(y);
    let a = primes.len() as i128 - 1;
    // the pre-sieve level must stay below every leaf level: c <= pi(sqrt(z))
    let pi_sqrt_z = primes.partition_point(|&p| p <= isqrt(z)) - 1;
    let c = 8.min(a as usize).min(pi_sqrt_z);
    if c < 4 {
        return pi_meissel(x);
    }
    let factors = FactorTable::new(y, &primes[1..]);
    debug!(%x, y, z, a, threads, "deleglise-rivat parameters");

    let s1 = s1(x, y, c, &primes, &factors);
    let s2t = s2_trivial(x, y, z, &primes);
    let s2e = easy_leaves(x, y, z, c, &primes, threads);
    let s2_approx = (Ri(x as f64) * 0.9) as i128;
    let backup = config::backup_file().map(|path| BackupConfig {
        path,
        formula: "dr_s2_hard",
        x,
        y,
        z,
        k: c as u64,
    });
    let params = EngineParams {
        x,
        y,
        c,
        sieve_limit: z + 1,
        leaf_range: LeafRange::All,
        primes: &primes,
        factors: &factors,
    };
    let s2h = hard_leaves(&params, s2_approx, threads, backup);
    debug!(%s1, %s2t, %s2e, %s2h, "deleglise-rivat terms");

    s1 + s2t + s2e + s2h + a - 1 - p2(x, y, threads)
}

/// Leaves whose phi value is exactly 1: primes[b] * q with
/// q > max(primes[b], x / primes[b]^2). Pure counting, no sieving.
pub(crate) fn s2_trivial(x: u128, y: u64, z: u64, primes: &[u64]) -> i128 {
    let pi = PiTable::new(y);
    let pi_y = pi.pi(y);
    let mut sum = 0i128;
    for &prime in &primes[primes.partition_point(|&p| p <= isqrt(z))..] {
        let lo = (x / (prime as u128 * prime as u128))
            .max(prime as u128)
            .max((y / prime) as u128);
        if lo < y as u128 {
            sum += (pi_y - pi.pi(lo as u64)) as i128;
        }
    }
    sum
}

/// Easy leaves primes[b] * q, q prime, for primes[b] > sqrt(z): each
/// resolves to pi(x / (primes[b] * q)) - b + 2.
pub(crate) fn easy_leaves(
    x: u128,
    y: u64,
    z: u64,
    c: usize,
    primes: &[u64],
    threads: usize,
) -> i128 {
    let a = primes.len() - 1;
    let start = (primes.partition_point(|&p| p <= isqrt(z)) - 1).max(c);
    if start >= a {
        return 0;
    }
    let pi = PiTable::new(z.max(y));
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config::ideal_num_threads((a - start) as u64, threads.max(1), 64))
        .build()
        .expect("failed to build thread pool");

    pool.install(|| {
        (start + 1..=a)
            .into_par_iter()
            .map(|b| {
                let prime = primes[b];
                let lo = (y / prime).max(prime);
                let hi = ((x / (prime as u128 * prime as u128)).min(y as u128)) as u64;
                let mut sum = 0i128;
                let mut q = primes.partition_point(|&p| p <= lo);
                while q <= a && primes[q] <= hi {
                    let u = (x / (prime as u128 * primes[q] as u128)) as u64;
                    sum += pi.pi(u) as i128 - b as i128 + 2;
                    q += 1;
                }
                sum
            })
            .sum()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primes::generate_pi;

    #[test]
    fn exhaustive_up_to_300() {
        let pi = generate_pi(300);
        for x in 0..=300u64 {
            assert_eq!(
                pi_dr_params(x as u128, 1.0, 1),
                pi[x as usize] as i128,
                "x = {}",
                x
            );
        }
    }

    #[test]
    fn known_values() {
        assert_eq!(pi_deleglise_rivat(1_000_000), 78_498);
        assert_eq!(pi_deleglise_rivat(10_000_000), 664_579);
    }

    #[test]
    fn crossing_the_small_x_boundary() {
        let pi = generate_pi(4_200);
        for x in 2_040..2_060u64 {
            assert_eq!(pi_dr_params(x as u128, 1.0, 2), pi[x as usize] as i128);
        }
        assert_eq!(pi_dr_params(4_096, 1.0, 2), pi[4_096] as i128);
    }

    #[test]
    fn alpha_and_thread_invariance() {
        let pi = generate_pi(3_000_000);
        for &x in &[123_456u64, 1_000_003, 2_999_999] {
            let expect = pi[x as usize] as i128;
            for alpha in [1.0, 2.0, 4.0] {
                for threads in [1usize, 4] {
                    assert_eq!(
                        pi_dr_params(x as u128, alpha, threads),
                        expect,
                        "x={} alpha={} threads={}",
                        x,
                        alpha,
                        threads
                    );
                }
            }
        }
    }
}
