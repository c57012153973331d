//! # Meissel's Formula
//!
//! Legendre with y lowered from sqrt(x) to x^(1/3), which shrinks phi's
//! recursion dramatically at the cost of the P2 correction term:
//!
//!   pi(x) = phi(x, a) + a - 1 - P2(x, y),   y = x^(1/3), a = pi(y)

use crate::imath::iroot;
use crate::p2::p2;
use crate::phi::phi;
use crate::primes::count_primes;

/// Count the primes <= x using Meissel's formula.
pub fn pi_meissel(x: u128) -> i128 {
    pi_meissel_threads(x, 1)
}

pub fn pi_meissel_threads(x: u128, threads: usize) -> i128 {
    if x < 2 {
        return 0;
    }
    debug_assert!(x <= i64::MAX as u128, "Meissel is a 64-bit cross-check");
    let y = iroot::<3>(x);
    let a = count_primes(y) as i128;
    phi(x as i64, a as i64) as i128 + a - 1 - p2(x, y, threads)
}
