//! # Lehmer's Formula
//!
//! Meissel with y lowered once more to x^(1/4), paying for it with the
//! third partial sieve term:
//!
//!   pi(x) = phi(x, a) + a - 1 - P2(x, y) - P3(x, y),   y = x^(1/4)

use crate::imath::iroot;
use crate::p2::p2;
use crate::p3::p3;
use crate::phi::phi;
use crate::primes::count_primes;

/// Count the primes <= x using Lehmer's formula.
pub fn pi_lehmer(x: u128) -> i128 {
    pi_lehmer_threads(x, 1)
}

pub fn pi_lehmer_threads(x: u128, threads: usize) -> i128 {
    if x < 2 {
        return 0;
    }
    debug_assert!(x <= i64::MAX as u128, "Lehmer is a 64-bit cross-check");
    let y = iroot::<4>(x);
    let a = count_primes(y) as i128;
    phi(x as i64, a as i64) as i128 + a - 1 - p2(x, y, threads) - p3(x, y, threads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primes::generate_pi;

    #[test]
    fn exhaustive_small() {
        let pi = generate_pi(2_000);
        for x in 0..=2_000u64 {
            assert_eq!(pi_lehmer(x as u128), pi[x as usize] as i128, "x = {}", x);
        }
    }

    #[test]
    fn known_values() {
        assert_eq!(pi_lehmer(1_000_000), 78_498);
        assert_eq!(pi_lehmer(50_000_000), 3_001_134);
    }
}
