//! # Legendre's Formula
//!
//! The simplest combinatorial prime count. All other formulas in this
//! crate (Meissel, Lehmer, LMO, Deleglise-Rivat, Gourdon) are extensions
//! of it that run faster but are also more complex.
//!
//!   pi(x) = phi(x, a) + a - 1,   a = pi(sqrt(x))
//!
//! Run time O(x / log log x)-ish, memory O(sqrt(x)).

use crate::imath::isqrt128;
use crate::phi::phi;
use crate::primes::count_primes;

/// Count the primes <= x using Legendre's formula.
pub fn pi_legendre(x: u128) -> i128 {
    if x < 2 {
        return 0;
    }
    debug_assert!(x <= i64::MAX as u128, "Legendre is a 64-bit cross-check");
    let y = isqrt128(x);
    let a = count_primes(y) as i128;
    phi(x as i64, a as i64) as i128 + a - 1
}
