//! # Gourdon — pi(x) = A - B + C + D + Phi0 + Sigma
//!
//! The production path. Xavier Gourdon's refinement of Deleglise-Rivat
//! regroups the special-leaf work so that most leaves become pi-table
//! lookups and only a residue needs the segmented sieve:
//!
//! - **Phi0**: the ordinary leaves, sum of mu(n) * phi(x/n, k) over
//!   n <= y with lpf(n) > primes[k]. Closed form over the factor table.
//! - **Sigma**: the closed-form corrections: pi(y) - 1, the prime-index
//!   part of P2, and the trivial leaves whose phi value is 1.
//! - **A**: easy leaves primes[b] * q with primes[b] > sqrt(x/y); every
//!   companion q is prime and the leaf value is one pi lookup.
//! - **B**: sum of pi(x/p) over y < p <= sqrt(x), the raw second partial
//!   sieve term, by segmented sieve sweep.
//! - **C**: easy leaves of the low levels (primes[b] <= sqrt(x/y)) whose
//!   value x/(primes[b]*m) is at most z, resolved by pi lookups from a
//!   table of size z = alpha_z * y. Raising alpha_z moves leaves from the
//!   expensive D into C, trading memory for sieve time.
//! - **D**: the remaining hard leaves, resolved by the segmented bit
//!   sieve + binary indexed tree engine under the load balancer.
//!
//! Run time O(x^(2/3) / log^2 x)-ish, memory O(x^(1/3) log^3 x).

use rayon::prelude::*;
use tracing::debug;

use crate::balancer::BackupConfig;
use crate::config;
use crate::dr::{easy_leaves, s2_trivial};
use crate::factor_table::FactorTable;
use crate::imath::{iroot, isqrt, isqrt128};
use crate::li::Ri;
use crate::meissel::pi_meissel;
use crate::p2::p2;
use crate::pi_table::PiTable;
use crate::primes::{count_primes, generate_primes_indexed};
use crate::s1::{s1, s1_dense};
use crate::s2::{hard_leaves, EngineParams, LeafRange};

const SMALL_X: u128 = 2_048;

/// pi(x) by Xavier Gourdon's algorithm.
pub fn pi_gourdon(x: u128) -> i128 {
    pi_gourdon_params(
        x,
        config::get_alpha_y(x),
        config::get_alpha_z(x),
        None,
        config::get_num_threads(),
    )
}

/// Gourdon with explicit tuning, for the invariance tests. `k` of None
/// picks the wheel size from the magnitude of x.
pub fn pi_gourdon_params(
    x: u128,
    alpha_y: f64,
    alpha_z: f64,
    k: Option<usize>,
    threads: usize,
) -> i128 {
    if x < 2 {
        return 0;
    }
    if x < SMALL_X {
        return pi_meissel(x);
    }
    let x13 = iroot::<3>(x);
    let y = ((alpha_y * x13 as f64) as u64).clamp(x13, isqrt128(x));
    let zl_wide = x / y as u128;
    assert!(
        zl_wide < u64::MAX as u128,
        "x too large for the sieve interval; raise alpha_y"
    );
    let zl = zl_wide as u64; // sieve interval bound x/y
    let z = ((alpha_z * y as f64) as u64).clamp(y, zl.max(y));

    let primes = generate_primes_indexed(y);
    let a = primes.len() as i128 - 1;
    // the wheel must stay below every leaf level: k <= pi(sqrt(x/y))
    let pi_sqrt_zl = primes.partition_point(|&p| p <= isqrt(zl)) - 1;
    let k = k
        .unwrap_or(default_k(x))
        .clamp(4, 8)
        .min(a as usize)
        .min(pi_sqrt_zl);
    if k < 4 {
        return pi_meissel(x);
    }
    let factors = FactorTable::new(y, &primes[1..]);
    debug!(%x, y, z, zl, k, a, threads, "gourdon parameters");

    let phi0 = s1(x, y, k, &primes, &factors);
    let sigma = sigma_term(x, y, zl, a, &primes);
    let b_term = b_term_impl(x, y, threads);
    let a_term = easy_leaves(x, y, zl, k, &primes, threads);
    let c_term = c_term_impl(x, y, zl, z, k, &primes, &factors, threads);
    let backup = config::backup_file().map(|path| BackupConfig {
        path,
        formula: "gourdon_d",
        x,
        y,
        z,
        k: k as u64,
    });
    let params = EngineParams {
        x,
        y,
        c: k,
        sieve_limit: zl + 1,
        leaf_range: LeafRange::BelowZ(z),
        primes: &primes,
        factors: &factors,
    };
    let d_term = hard_leaves(&params, (Ri(x as f64) * 0.5) as i128, threads, backup);
    debug!(%a_term, %b_term, %c_term, %d_term, %phi0, %sigma, "gourdon terms");

    a_term - b_term + c_term + d_term + phi0 + sigma
}

/// Wheel size by input magnitude: deeper wheels pay off once the leaf
/// counts dwarf the phi_tiny table builds.
fn default_k(x: u128) -> usize {
    match x {
        0..=99_999_999 => 4,
        100_000_000..=999_999_999_999 => 6,
        1_000_000_000_000..=999_999_999_999_999 => 7,
        _ => 8,
    }
}

/// Phi0(x, y, z, k): the ordinary leaves. z is accepted for signature
/// parity with the other Gourdon terms; the leaf set only depends on
/// (x, y, k).
pub fn phi0(x: u128, y: u64, _z: u64, k: usize) -> i128 {
    assert!((1..=8).contains(&k), "phi0 requires 1 <= k <= 8");
    let primes = generate_primes_indexed(y.max(19));
    if k >= 4 {
        let factors = FactorTable::new(y, &primes[1..]);
        s1(x, y, k, &primes, &factors)
    } else {
        s1_dense(x, y, k, &primes)
    }
}

/// B(x, y) = sum_{y < p <= sqrt(x)} pi(x/p): P2 plus the closed-form
/// prime-index sum it removed.
fn b_term_impl(x: u128, y: u64, threads: usize) -> i128 {
    p2(x, y, threads) + sigma1(x, y)
}

/// sum_{i = pi(y)+1}^{pi(sqrt(x))} (i - 1)
fn sigma1(x: u128, y: u64) -> i128 {
    let sqrtx = isqrt128(x);
    if y >= sqrtx {
        return 0;
    }
    let a = count_primes(y) as i128;
    let b = count_primes(sqrtx) as i128;
    (b * (b - 1) - a * (a - 1)) / 2
}

/// Sigma: pi(y) - 1, the P2 index correction, and the trivial leaves.
fn sigma_term(x: u128, y: u64, zl: u64, a: i128, primes: &[u64]) -> i128 {
    (a - 1) + sigma1(x, y) + s2_trivial(x, y, zl, primes)
}

/// C: easy leaves of the hard levels. For k < b <= pi(sqrt(x/y)) the
/// companions m > max(y/p, x/p^3, x/(p*z)) give leaf values
/// x/(primes[b]*m) <= min(primes[b]^2, z), each one pi lookup:
///
///   C = sum_b sum_m -mu(m) * (pi(x/(primes[b]*m)) - b + 2)
#[allow(clippy::too_many_arguments)]
fn c_term_impl(
    x: u128,
    y: u64,
    zl: u64,
    z: u64,
    k: usize,
    primes: &[u64],
    factors: &FactorTable,
    threads: usize,
) -> i128 {
    let pi_sqrt_zl = primes.partition_point(|&p| p <= isqrt(zl)) - 1;
    if pi_sqrt_zl <= k {
        return 0;
    }
    let pi = PiTable::new(z);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config::ideal_num_threads((pi_sqrt_zl - k) as u64, threads.max(1), 8))
        .build()
        .expect("failed to build thread pool");

    pool.install(|| {
        (k + 1..=pi_sqrt_zl)
            .into_par_iter()
            .map(|b| {
                let prime = primes[b];
                let xp = x / prime as u128;
                let min_m = (y / prime)
                    .max((xp / (prime as u128 * prime as u128)).min(y as u128) as u64)
                    .max((xp / z as u128).min(y as u128) as u64);
                let mut sum = 0i128;
                let mut i = factors.index_above(min_m);
                loop {
                    let m = factors.number(i);
                    if m > y {
                        break;
                    }
                    let mu = factors.mu(i);
                    if mu != 0 && prime < factors.lpf(i) {
                        let u = (xp / m as u128) as u64;
                        sum -= mu as i128 * (pi.pi(u) as i128 - b as i128 + 2);
                    }
                    i += 1;
                }
                sum
            })
            .sum()
    })
}
