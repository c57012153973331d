//! # Prime Generation and Arithmetic Function Tables
//!
//! Number-theoretic ground truth for every pi(x) algorithm in this crate:
//!
//! 1. **Prime generation** via a wheel-30 sieve of Eratosthenes (26.7%
//!    memory of a naive sieve — stores only residues coprime to {2, 3, 5}).
//! 2. **Moebius function** mu(n) and **least prime factor** lpf(n) tables,
//!    consumed by the ordinary- and special-leaf enumerations.
//! 3. **Prime counting** over [0, max] as a dense `Vec` for algorithms that
//!    need pi at many small arguments.
//!
//! ## Algorithm: Wheel-30 Sieve
//!
//! The sieve tracks only integers coprime to 30 = 2·3·5 (8 residues per 30).
//! Each segment of 30 consecutive integers is packed into a single byte.
//! Complexity: O(n log log n) time, O(n/30) space.

/// Residues modulo 30 that are coprime to 30.
const RESIDUES: [u8; 8] = [1, 7, 11, 13, 17, 19, 23, 29];

/// Map residue -> bit index in the wheel, 255 for residues divisible by 2, 3 or 5.
const RES_TO_IDX: [u8; 30] = [
    255, 0, 255, 255, 255, 255, 255, 1, 255, 255, 255, 2, 255, 3, 255, 255, 255, 4, 255, 5, 255,
    255, 255, 6, 255, 255, 255, 255, 255, 7,
];

/// Generate all primes <= limit using a wheel-30 sieve.
pub fn generate_primes(limit: u64) -> Vec<u64> {
    if limit < 2 {
        return vec![];
    }
    if limit < 7 {
        return [2, 3, 5].iter().copied().filter(|&p| p <= limit).collect();
    }

    let limit = limit as usize;
    let num_segments = limit / 30 + 1;
    let mut sieve = vec![0xFFu8; num_segments]; // all bits set = all residues prime

    let sqrt_limit = crate::imath::isqrt(limit as u64) as usize;
    for seg in 0..=(sqrt_limit / 30) {
        for &ri in &RESIDUES {
            let n = seg * 30 + ri as usize;
            if n < 7 || n > sqrt_limit {
                continue;
            }
            if sieve[seg] & (1 << RES_TO_IDX[ri as usize]) == 0 {
                continue; // already marked composite
            }
            let mut m = n * n;
            while m <= limit {
                let idx = RES_TO_IDX[m % 30];
                if idx != 255 {
                    sieve[m / 30] &= !(1 << idx);
                }
                m += n;
            }
        }
    }

    let mut primes = Vec::with_capacity(estimate_prime_count(limit));
    primes.extend_from_slice(&[2, 3, 5]);
    for (seg, &byte) in sieve.iter().enumerate() {
        if byte == 0 {
            continue;
        }
        for (bit_idx, &r) in RESIDUES.iter().enumerate() {
            if byte & (1 << bit_idx) != 0 {
                let n = seg * 30 + r as usize;
                if n > 5 && n <= limit {
                    primes.push(n as u64);
                }
            }
        }
    }
    primes
}

/// Generate the 1-indexed prime vector used throughout the leaf formulas:
/// `primes[1] = 2, primes[2] = 3, ...` with a placeholder at index 0.
pub fn generate_primes_indexed(limit: u64) -> Vec<u64> {
    let mut v = vec![0];
    v.extend(generate_primes(limit));
    v
}

/// Estimate pi(n) from above for Vec pre-allocation.
fn estimate_prime_count(n: usize) -> usize {
    if n < 10 {
        return 4;
    }
    let nf = n as f64;
    (1.3 * nf / nf.ln()) as usize
}

/// Count the primes <= limit with a plain segmented odd sieve.
///
/// This is the brute-force cross-check for the combinatorial algorithms;
/// O(n log log n) time, O(sqrt(n)) space.
pub fn count_primes(limit: u64) -> u64 {
    if limit < 2 {
        return 0;
    }
    let small = generate_primes(crate::imath::isqrt(limit));
    let mut count = 1u64; // the prime 2
    const SEGMENT_ODDS: u64 = 1 << 21;
    let mut low = 3u64; // always odd
    while low <= limit {
        let high = limit.min(low + 2 * (SEGMENT_ODDS - 1)); // inclusive
        let len = ((high - low) / 2 + 1) as usize; // one flag per odd in [low, high]
        let mut sieve = vec![true; len];
        for &p in small.iter().skip(1) {
            if p * p > high {
                break;
            }
            let mut m = p * p;
            if m < low {
                m = (low + p - 1) / p * p;
                if m % 2 == 0 {
                    m += p;
                }
            }
            while m <= high {
                sieve[((m - low) / 2) as usize] = false;
                m += 2 * p;
            }
        }
        count += sieve.iter().filter(|&&b| b).count() as u64;
        low = (high + 1) | 1;
    }
    count
}

/// All primes in [low, high), for callers walking outward from a guess.
pub fn primes_in_range(low: u64, high: u64) -> Vec<u64> {
    if high <= low || high <= 2 {
        return vec![];
    }
    let low = low.max(2);
    let len = (high - low) as usize;
    let mut sieve = vec![true; len];
    for &p in &generate_primes(crate::imath::isqrt(high - 1)) {
        let start = (p * p).max(low.div_ceil(p) * p);
        let mut m = start;
        while m < high {
            sieve[(m - low) as usize] = false;
            m += p;
        }
    }
    sieve
        .iter()
        .enumerate()
        .filter(|(_, &keep)| keep)
        .map(|(i, _)| low + i as u64)
        .collect()
}

/// Moebius function table: mu[n] for 0 <= n <= max (mu[0] unused).
pub fn generate_moebius(max: u64) -> Vec<i8> {
    let max = max as usize;
    let mut mu = vec![1i8; max + 1];
    for p in generate_primes(max as u64) {
        let p = p as usize;
        let mut m = p;
        while m <= max {
            mu[m] = -mu[m];
            m += p;
        }
        if let Some(p2) = p.checked_mul(p) {
            let mut m = p2;
            while m <= max {
                mu[m] = 0;
                m += p2;
            }
        }
    }
    mu
}

/// Least prime factor table: lpf[n] for 0 <= n <= max.
///
/// lpf[1] is set above every prime so that the leaf filters
/// `lpf(m) > primes[b]` treat 1 as coprime to everything.
pub fn generate_lpf(max: u64) -> Vec<u32> {
    let max = max as usize;
    let mut lpf = vec![0u32; max + 1];
    if max >= 1 {
        lpf[1] = u32::MAX;
    }
    for p in generate_primes(max as u64) {
        let p = p as usize;
        let mut m = p;
        while m <= max {
            if lpf[m] == 0 {
                lpf[m] = p as u32;
            }
            m += p;
        }
    }
    lpf
}

/// Dense prime counting table: pi[n] for 0 <= n <= max.
pub fn generate_pi(max: u64) -> Vec<u32> {
    let max = max as usize;
    let mut is_prime = vec![true; max + 1];
    is_prime[0] = false;
    if max >= 1 {
        is_prime[1] = false;
    }
    let mut i = 2;
    while i * i <= max {
        if is_prime[i] {
            let mut m = i * i;
            while m <= max {
                is_prime[m] = false;
                m += i;
            }
        }
        i += 1;
    }
    let mut pi = vec![0u32; max + 1];
    let mut count = 0;
    for n in 0..=max {
        if is_prime[n] {
            count += 1;
        }
        pi[n] = count;
    }
    pi
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_primes() {
        assert_eq!(
            generate_primes(50),
            vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47]
        );
    }

    #[test]
    fn small_limits() {
        assert!(generate_primes(0).is_empty());
        assert!(generate_primes(1).is_empty());
        assert_eq!(generate_primes(2), vec![2]);
        assert_eq!(generate_primes(6), vec![2, 3, 5]);
        assert_eq!(generate_primes(7), vec![2, 3, 5, 7]);
    }

    #[test]
    fn prime_counts_at_powers_of_ten() {
        assert_eq!(generate_primes(10).len(), 4);
        assert_eq!(generate_primes(100).len(), 25);
        assert_eq!(generate_primes(1_000).len(), 168);
        assert_eq!(generate_primes(10_000).len(), 1_229);
        assert_eq!(generate_primes(100_000).len(), 9_592);
        assert_eq!(generate_primes(1_000_000).len(), 78_498);
    }

    #[test]
    fn generated_primes_match_trial_division() {
        let primes = generate_primes(2_000);
        let mut idx = 0;
        for n in 2..=2_000u64 {
            let is_p = (2..n).take_while(|d| d * d <= n).all(|d| n % d != 0);
            if is_p {
                assert_eq!(primes[idx], n);
                idx += 1;
            }
        }
        assert_eq!(idx, primes.len());
    }

    #[test]
    fn count_primes_matches_generate() {
        for limit in [0u64, 1, 2, 10, 100, 12_345, 1_000_000, 3_000_001] {
            assert_eq!(
                count_primes(limit),
                generate_primes(limit).len() as u64,
                "limit {}",
                limit
            );
        }
    }

    #[test]
    fn primes_in_range_matches_filtered_full_sieve() {
        let all = generate_primes(10_000);
        for &(lo, hi) in &[(0u64, 100u64), (2, 3), (90, 150), (4_000, 5_000), (9_990, 10_001)] {
            let expect: Vec<u64> = all.iter().copied().filter(|&p| p >= lo && p < hi).collect();
            assert_eq!(primes_in_range(lo, hi), expect, "[{}, {})", lo, hi);
        }
        assert!(primes_in_range(50, 50).is_empty());
        assert!(primes_in_range(50, 40).is_empty());
    }

    #[test]
    fn moebius_known_values() {
        let mu = generate_moebius(50);
        // OEIS A008683
        let expect: [i8; 12] = [1, -1, -1, 0, -1, 1, -1, 0, 0, 1, -1, 0];
        for (n, &e) in expect.iter().enumerate() {
            assert_eq!(mu[n + 1], e, "mu({})", n + 1);
        }
        assert_eq!(mu[30], -1); // 2*3*5
        assert_eq!(mu[36], 0); // 6^2
    }

    #[test]
    fn moebius_brute_force() {
        let mu = generate_moebius(500);
        for n in 1..=500usize {
            let mut m = n;
            let mut factors = 0;
            let mut square_free = true;
            let mut d = 2;
            while d * d <= m {
                if m % d == 0 {
                    m /= d;
                    factors += 1;
                    if m % d == 0 {
                        square_free = false;
                        break;
                    }
                }
                d += 1;
            }
            if m > 1 {
                factors += 1;
            }
            let expect = if !square_free {
                0
            } else if factors % 2 == 0 {
                1
            } else {
                -1
            };
            assert_eq!(mu[n], expect, "mu({})", n);
        }
    }

    #[test]
    fn lpf_brute_force() {
        let lpf = generate_lpf(500);
        assert_eq!(lpf[1], u32::MAX);
        for n in 2..=500u32 {
            let expect = (2..=n).find(|d| n % d == 0).unwrap();
            assert_eq!(lpf[n as usize], expect, "lpf({})", n);
        }
    }

    #[test]
    fn pi_table_vector() {
        let pi = generate_pi(1_000);
        assert_eq!(pi[0], 0);
        assert_eq!(pi[1], 0);
        assert_eq!(pi[2], 1);
        assert_eq!(pi[10], 4);
        assert_eq!(pi[100], 25);
        assert_eq!(pi[1_000], 168);
    }
}
