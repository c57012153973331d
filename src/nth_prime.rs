//! # nth_prime — Inverting pi(x)
//!
//! Riemann's R is such a sharp approximation of pi that R^-1(n) lands
//! within ~sqrt(p_n) of the nth prime. One pi(x) evaluation at the guess
//! pins the count, then a segmented sieve walks the remaining gap prime
//! by prime. Small n skips all of that and sieves directly.

use anyhow::{bail, Result};

use crate::li::Ri_inverse;
use crate::primes::{generate_primes, primes_in_range};

/// Chunk width for walking from the guess toward the answer.
const CHUNK: u64 = 1 << 17;

/// The nth prime: nth_prime(1) = 2. Errors when n < 1 or the answer
/// would overflow the supported range.
pub fn nth_prime(n: i64) -> Result<i64> {
    if n < 1 {
        bail!("nth_prime: n must be >= 1, got {}", n);
    }
    let n = n as u64;
    if n <= 100_000 {
        // p_n < n (ln n + ln ln n) for n >= 6
        let nf = (n as f64).max(6.0);
        let bound = (nf * (nf.ln() + nf.ln().ln())) as u64 + 16;
        let primes = generate_primes(bound);
        return Ok(primes[n as usize - 1] as i64);
    }

    let guess = Ri_inverse(n as f64) as u64;
    let mut count = crate::pi128(guess as i128) as u64;

    if count >= n {
        // overshot: walk down until fewer than n primes remain below
        let mut hi = guess + 1;
        loop {
            let lo = hi.saturating_sub(CHUNK).max(2);
            let chunk = primes_in_range(lo, hi);
            let before = count - chunk.len() as u64;
            if before < n {
                return Ok(chunk[(n - before - 1) as usize] as i64);
            }
            count = before;
            hi = lo;
        }
    } else {
        // undershot: walk up counting primes until the nth appears
        let mut lo = guess + 1;
        loop {
            let chunk = primes_in_range(lo, lo + CHUNK);
            if count + (chunk.len() as u64) >= n {
                return Ok(chunk[(n - count - 1) as usize] as i64);
            }
            count += chunk.len() as u64;
            lo += CHUNK;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_primes() {
        assert_eq!(nth_prime(1).unwrap(), 2);
        assert_eq!(nth_prime(2).unwrap(), 3);
        assert_eq!(nth_prime(3).unwrap(), 5);
        assert_eq!(nth_prime(25).unwrap(), 97);
        assert_eq!(nth_prime(168).unwrap(), 997);
    }

    #[test]
    fn known_large_values() {
        assert_eq!(nth_prime(78_498).unwrap(), 999_983);
        assert_eq!(nth_prime(1_000_000).unwrap(), 15_485_863);
        assert_eq!(nth_prime(5_761_455).unwrap(), 99_999_989);
    }

    #[test]
    fn invalid_input_is_an_error() {
        assert!(nth_prime(0).is_err());
        assert!(nth_prime(-5).is_err());
    }

    #[test]
    fn round_trips_with_pi() {
        for n in [1i64, 10, 1_000, 100_000, 200_000] {
            let p = nth_prime(n).unwrap();
            assert_eq!(crate::pi(p), n, "pi(p_{}) = {}", n, n);
            assert_eq!(crate::pi(p - 1), n - 1);
        }
    }
}
