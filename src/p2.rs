//! # P2 — Second Partial Sieve Term
//!
//! P2(x, y) counts the numbers <= x with exactly two prime factors, both
//! larger than y:
//!
//!   P2(x, y) = sum_{y < p <= sqrt(x)} (pi(x/p) - pi(p) + 1)
//!
//! The pi(p) part is a closed form over prime indices. The pi(x/p) part
//! needs prime counts at up to pi(sqrt(x)) - pi(y) points spread over
//! [sqrt(x), x/y]; a single segmented sieve sweep over [2, x/y] answers
//! them all: the query points are visited in ascending order while the
//! sweep accumulates its running prime count.
//!
//! The sweep is chunked and the chunks sieved in parallel; each chunk
//! reports its local prime count and per-query local counts, and a cheap
//! sequential pass prefix-sums the chunk counts to fix the offsets.

use rayon::prelude::*;

use crate::imath::isqrt128;
use crate::primes::generate_primes;

/// P2(x, y). Zero when x < 4 or y >= sqrt(x).
pub fn p2(x: u128, y: u64, threads: usize) -> i128 {
    match survey(x, y, threads) {
        None => 0,
        Some(s) => {
            // sum of (pi(p) - 1) over the queried primes = sum_{i=a+1}^{b} (i - 1)
            let skip = (s.b as i128 * (s.b as i128 - 1) - s.a as i128 * (s.a as i128 - 1)) / 2;
            s.big_pi_sum - skip
        }
    }
}

/// B(x, y) = sum_{y < p <= sqrt(x)} pi(x/p), the raw form of P2 used by
/// Gourdon's formula.
pub fn b_sum(x: u128, y: u64, threads: usize) -> i128 {
    survey(x, y, threads).map_or(0, |s| s.big_pi_sum)
}

struct Survey {
    /// sum of pi(x/p) over primes p in (y, sqrt(x)]
    big_pi_sum: i128,
    /// pi(y)
    a: u64,
    /// pi(sqrt(x))
    b: u64,
}

fn survey(x: u128, y: u64, threads: usize) -> Option<Survey> {
    if x < 4 {
        return None;
    }
    let sqrtx = isqrt128(x);
    if y >= sqrtx {
        return None;
    }
    let y = y.max(1);
    let primes = generate_primes(sqrtx);
    let a = primes.partition_point(|&p| p <= y) as u64;
    let b = primes.len() as u64;
    if a == b {
        return None;
    }

    // ascending query points x/p for p in (y, sqrt(x)] descending
    let queries: Vec<u128> = primes[a as usize..].iter().rev().map(|&p| x / p as u128).collect();
    let limit = x / y as u128; // every query is < limit + 1

    let base = generate_primes(isqrt128(limit));
    let chunk_len: u128 = 1 << 22;
    let chunks: Vec<(u128, u128)> = {
        let mut v = Vec::new();
        let mut lo = 2u128;
        while lo <= limit {
            let hi = (lo + chunk_len).min(limit + 1);
            v.push((lo, hi));
            lo = hi;
        }
        v
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .expect("failed to build thread pool");

    // per chunk: (prime count, [(query index, local prime count up to query)])
    let results: Vec<(u64, Vec<(usize, u64)>)> = pool.install(|| {
        chunks
            .par_iter()
            .map(|&(lo, hi)| sieve_chunk(lo, hi, &base, &queries))
            .collect()
    });

    let mut running: u64 = 0;
    let mut big_pi_sum: i128 = 0;
    for (count, locals) in results {
        for (_, local) in &locals {
            big_pi_sum += (running + local) as i128;
        }
        running += count;
    }
    Some(Survey { big_pi_sum, a, b })
}

/// Sieve [lo, hi), count its primes, and resolve the queries falling in it
/// with chunk-local prefix counts.
fn sieve_chunk(
    lo: u128,
    hi: u128,
    base: &[u64],
    queries: &[u128],
) -> (u64, Vec<(usize, u64)>) {
    let len = (hi - lo) as usize;
    let mut sieve = vec![true; len];
    for &p in base {
        let p = p as u128;
        let start = (p * p).max(lo.div_ceil(p) * p);
        if start >= hi {
            if p * p >= hi {
                break;
            }
            continue;
        }
        let mut pos = (start - lo) as usize;
        while pos < len {
            sieve[pos] = false;
            pos += p as usize;
        }
    }

    let first = queries.partition_point(|&q| q < lo);
    let last = queries.partition_point(|&q| q < hi);
    let mut locals = Vec::with_capacity(last - first);
    let mut pos = 0usize;
    let mut running = 0u64;
    for (qi, &q) in queries.iter().enumerate().take(last).skip(first) {
        let end = (q - lo) as usize + 1;
        running += sieve[pos..end].iter().filter(|&&b| b).count() as u64;
        pos = end;
        locals.push((qi, running));
    }
    let count = running + sieve[pos..].iter().filter(|&&b| b).count() as u64;
    (count, locals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imath::iroot;
    use crate::primes::generate_pi;

    /// Direct count of n <= x with exactly two prime factors > y.
    fn p2_brute(x: u64, y: u64) -> i128 {
        let primes = generate_primes(x / 2 + 1);
        let mut count = 0i128;
        for (i, &p) in primes.iter().enumerate() {
            if p <= y {
                continue;
            }
            if p * p > x {
                break;
            }
            for &q in &primes[i..] {
                if p * q > x {
                    break;
                }
                count += 1;
            }
        }
        count
    }

    #[test]
    fn matches_brute_force() {
        for &(x, y) in &[
            (100u64, 4u64),
            (1_000, 10),
            (10_000, 21),
            (100_000, 46),
            (654_321, 86),
            (1_000_000, 100),
        ] {
            assert_eq!(p2(x as u128, y, 2), p2_brute(x, y), "P2({}, {})", x, y);
        }
    }

    #[test]
    fn meissel_parameter_shape() {
        // the drivers call p2 with y = x^(1/3) or x^(1/4)
        for x in [50_000u64, 250_000, 999_999] {
            let y = iroot::<3>(x as u128);
            assert_eq!(p2(x as u128, y, 1), p2_brute(x, y));
            let y = iroot::<4>(x as u128);
            assert_eq!(p2(x as u128, y, 3), p2_brute(x, y));
        }
    }

    #[test]
    fn zero_cases() {
        assert_eq!(p2(0, 1, 1), 0);
        assert_eq!(p2(3, 1, 1), 0);
        assert_eq!(p2(100, 10, 1), 0); // y = sqrt(x)
        assert_eq!(p2(100, 11, 1), 0); // y > sqrt(x)
    }

    #[test]
    fn b_sum_matches_direct_pi_summation() {
        let x = 1_000_000u128;
        let y = 100u64;
        let pi = generate_pi(10_000);
        let primes = generate_primes(1_000);
        let expect: i128 = primes
            .iter()
            .filter(|&&p| p > y && p <= 1_000)
            .map(|&p| pi[(x / p as u128) as usize] as i128)
            .sum();
        assert_eq!(b_sum(x, y, 2), expect);
    }
}
