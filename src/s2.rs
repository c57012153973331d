//! # Segment Engine — Hard Special Leaves
//!
//! The computational core shared by Deleglise-Rivat (S2 hard) and
//! Gourdon's D term. A worker owns one bit sieve and one binary indexed
//! tree; for every segment [low, high) of its work unit it
//!
//! 1. pre-sieves the multiples of the first c primes,
//! 2. initializes the tree from the sieve,
//! 3. for each prime level b walks the factor-table window of companions
//!    m, resolving each leaf x/(primes[b]*m) with one O(log n) prefix
//!    count,
//! 4. crosses off the multiples of primes[b], mirroring every bit
//!    transition into the tree.
//!
//! Within a level the leaves are visited in increasing m (decreasing
//! x/(primes[b]*m)); the tree is only modified after a level finishes, so
//! every query observes the sieve state for level b - 1.
//!
//! Leaf values are accumulated against the unit's zero baseline together
//! with per-level signed leaf counts; the load balancer's ordered merge
//! re-bases them (see `balancer`). Each prime's next-multiple cursor is
//! plain data in a per-worker dense array, recomputed at unit start from
//! `((low + p - 1) / p) * p`.

use crate::balancer::{BackupConfig, LoadBalancer, ThreadData, UnitResult};
use crate::bit_sieve::BitSieve;
use crate::factor_table::FactorTable;
use crate::fastdiv::PrimeDivisors;
use crate::fenwick::BinaryIndexedTree;
use crate::imath::isqrt;
use crate::lmo::cross_off_counted;

/// Which companions m belong to this run of the engine.
#[derive(Clone, Copy)]
pub enum LeafRange {
    /// Deleglise-Rivat S2 hard: every m in (y/p, y].
    All,
    /// Gourdon's D: only the m whose leaves the C formula cannot resolve
    /// by pi lookup, i.e. m <= max(y/p, x/p^3, x/(p*z)).
    BelowZ(u64),
}

pub struct EngineParams<'a> {
    pub x: u128,
    pub y: u64,
    /// phi_tiny level used for pre-sieving (first c primes)
    pub c: usize,
    /// exclusive end of the sieve interval
    pub sieve_limit: u64,
    pub leaf_range: LeafRange,
    /// 1-indexed prime vector covering at least sqrt(sieve_limit) and y
    pub primes: &'a [u64],
    pub factors: &'a FactorTable,
}

/// Sum the hard special leaves over [1, sieve_limit) with `threads`
/// workers fed by an adaptive load balancer.
pub fn hard_leaves(
    params: &EngineParams<'_>,
    sum_approx: i128,
    threads: usize,
    backup: Option<BackupConfig>,
) -> i128 {
    // the last sieved value is sieve_limit - 1; a prime is a hard level
    // iff its square fits below that, matching the easy/trivial boundary
    let pi_sqrt_limit = params
        .primes
        .partition_point(|&p| p <= isqrt(params.sieve_limit.saturating_sub(1)))
        - 1;
    if pi_sqrt_limit <= params.c || params.sieve_limit <= 1 {
        return 0;
    }
    let levels = pi_sqrt_limit + 1;
    let divisors = PrimeDivisors::new(params.primes[..=pi_sqrt_limit].to_vec());
    let balancer = LoadBalancer::new(params.sieve_limit, levels, sum_approx, threads, backup);

    std::thread::scope(|scope| {
        for thread_id in 0..threads.max(1) {
            let balancer = &balancer;
            let divisors = &divisors;
            scope.spawn(move || {
                let mut thread = ThreadData::new(thread_id);
                while balancer.get_work(&mut thread) {
                    thread.start_time();
                    let result = process_unit(params, divisors, pi_sqrt_limit, &mut thread);
                    thread.stop_time();
                    balancer.update_result(&mut thread, result);
                }
            });
        }
    });
    balancer.sum()
}

/// Sieve one work unit [low, low + segment_size * segments) and resolve
/// every leaf inside it against the unit-local baseline.
fn process_unit(
    params: &EngineParams<'_>,
    divisors: &PrimeDivisors,
    pi_sqrt_limit: usize,
    thread: &mut ThreadData,
) -> UnitResult {
    let x = params.x;
    let y = params.y;
    let primes = params.primes;
    let unit_low = thread.low;
    let unit_high = params
        .sieve_limit
        .min(thread.low + thread.segment_size * thread.segments);
    // resumed units may carry arbitrary spans; the sieve granularity
    // stays L2-sized regardless
    let seg_size = thread.segment_size.clamp(16, 1 << 22);

    let levels = pi_sqrt_limit + 1;
    let mut leaf_counts = vec![0i64; levels];
    let mut phi = vec![0u64; levels];
    let mut sum = 0i128;

    let mut next: Vec<u64> = (0..levels)
        .map(|b| {
            if b == 0 {
                0
            } else {
                unit_low.div_ceil(primes[b]) * primes[b]
            }
        })
        .collect();
    let mut sieve = BitSieve::new(seg_size as usize);
    let mut tree = BinaryIndexedTree::new();
    thread.init_finished();

    let mut low = unit_low;
    while low < unit_high {
        let high = unit_high.min(low + seg_size);
        let seg_len = (high - low) as usize;
        sieve.fill();

        for b in 1..=params.c {
            next[b] = sieve.cross_off(primes[b], low, high, next[b]);
        }
        tree.init(&sieve, seg_len);

        for b in params.c + 1..=pi_sqrt_limit {
            let prime = primes[b];
            let xp = divisors.div(x, b); // x / prime

            let mut max_m = ((xp / low as u128).min(y as u128)) as u64;
            if let LeafRange::BelowZ(z) = params.leaf_range {
                let cap = (y / prime)
                    .max((xp / (prime as u128 * prime as u128)).min(y as u128) as u64)
                    .max((xp / z as u128).min(y as u128) as u64);
                // cap = max(y/p, x/p^3, x/(p*z)) clamped into the m domain
                max_m = max_m.min(cap);
            }
            let min_m_wide = (xp / high as u128).max((y / prime) as u128);

            if (prime as u128) < max_m as u128 && min_m_wide < max_m as u128 {
                let min_m = min_m_wide as u64;
                let mut i = params.factors.index_above(min_m);
                loop {
                    let m = params.factors.number(i);
                    if m > max_m {
                        break;
                    }
                    let mu = params.factors.mu(i);
                    if mu != 0 && prime < params.factors.lpf(i) {
                        let xn = (xp / m as u128) as u64;
                        let count = phi[b] + tree.count((xn - low) as usize);
                        sum -= mu as i128 * count as i128;
                        leaf_counts[b] -= mu;
                    }
                    i += 1;
                }
            }

            phi[b] += tree.count(seg_len - 1);
            next[b] = cross_off_counted(&mut sieve, &mut tree, prime, low, high, next[b]);
        }
        low = high;
    }

    UnitResult {
        low: unit_low,
        high: unit_high,
        sum,
        leaf_counts,
        phi_deltas: phi,
    }
}
