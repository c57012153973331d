//! # Integer Math — Exact Roots and Powers
//!
//! Floating point `sqrt()`/`powf()` give estimates that are off by a few ulps
//! for large inputs, which is fatal when the result feeds an exact
//! combinatorial formula: an integer square root that is off by one changes
//! pi(x) by thousands. Every function here therefore computes a cheap float
//! estimate first and then corrects it with exact integer arithmetic, the
//! same scheme hardware `sqrt` libraries use for their final rounding step.
//!
//! All roots take `u128` input because x may exceed 64 bits (pi(x) supports
//! x up to ~10^31); the results always fit in 64 bits since
//! sqrt(2^128) = 2^64.

/// Exact integer square root of a 64-bit number.
///
/// The f64 estimate of sqrt(x) for x < 2^64 is accurate to within 1-2 ulps,
/// so the correction loops run at most a couple of iterations.
#[inline]
pub fn isqrt(x: u64) -> u64 {
    if x == 0 {
        return 0;
    }
    let mut r = (x as f64).sqrt() as u64;
    // sqrt(u64::MAX) < 2^32, clamp so r*r below cannot overflow
    r = r.min(u32::MAX as u64);
    while r * r > x {
        r -= 1;
    }
    while (r + 1).checked_mul(r + 1).is_some_and(|s| s <= x) {
        r += 1;
    }
    r
}

/// Exact integer square root of a 128-bit number.
///
/// The f64 estimate near 2^127 can be off by thousands (53-bit mantissa), so
/// an integer Newton iteration closes the gap before the final fixup.
pub fn isqrt128(x: u128) -> u64 {
    if x == 0 {
        return 0;
    }
    let mut r = ((x as f64).sqrt() as u128).saturating_add(1);
    r = r.min(1 << 64);
    // Newton's method with integer division converges to floor(sqrt(x))
    // from above: r' = (r + x/r) / 2
    loop {
        let q = x / r;
        if r <= q {
            break;
        }
        r = (r + q) / 2;
    }
    while r * r > x {
        r -= 1;
    }
    while (r + 1).checked_mul(r + 1).is_some_and(|s| s <= x) {
        r += 1;
    }
    r as u64
}

/// Exact integer Nth root: the largest r with r^N <= x.
///
/// Used with N = 3 (Meissel's y = x^(1/3)), N = 4 (Lehmer's y = x^(1/4))
/// and N = 6 (the upper bound of the alpha tuning range).
pub fn iroot<const N: u32>(x: u128) -> u64 {
    assert!(N >= 1);
    if x == 0 {
        return 0;
    }
    let mut r = (x as f64).powf(1.0 / N as f64) as u128;
    // float estimates of high roots drift further than sqrt does
    r = r.saturating_add(2);
    while r.checked_pow(N).map_or(true, |p| p > x) {
        r -= 1;
    }
    while (r + 1).checked_pow(N).is_some_and(|p| p <= x) {
        r += 1;
    }
    r as u64
}

/// x^n with overflow panic in debug builds, like the standard library `pow`.
#[inline]
pub fn ipow(x: u64, n: u32) -> u64 {
    x.pow(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isqrt_exhaustive_small() {
        let mut root = 0u64;
        for x in 0..100_000u64 {
            if (root + 1) * (root + 1) <= x {
                root += 1;
            }
            assert_eq!(isqrt(x), root, "isqrt({})", x);
        }
    }

    #[test]
    fn isqrt_perfect_square_boundaries() {
        for r in [1u64, 2, 10, 255, 256, 65535, 65536, 4_000_000_000] {
            let sq = r * r;
            assert_eq!(isqrt(sq), r);
            assert_eq!(isqrt(sq - 1), r - 1);
            assert_eq!(isqrt(sq + 1), r);
        }
    }

    #[test]
    fn isqrt_u64_max() {
        assert_eq!(isqrt(u64::MAX), u32::MAX as u64);
    }

    #[test]
    fn isqrt128_matches_isqrt_in_64_bit_range() {
        for x in [0u64, 1, 2, 3, 99, 10_000, 123_456_789, u64::MAX] {
            assert_eq!(isqrt128(x as u128), isqrt(x));
        }
    }

    #[test]
    fn isqrt128_large() {
        // (10^15)^2 = 10^30
        let x: u128 = 10u128.pow(30);
        assert_eq!(isqrt128(x), 10u64.pow(15));
        assert_eq!(isqrt128(x - 1), 10u64.pow(15) - 1);
        // near the top of the supported range
        let r = u64::MAX as u128;
        assert_eq!(isqrt128(r * r), u64::MAX);
        assert_eq!(isqrt128(r * r + 2 * r), u64::MAX);
    }

    #[test]
    fn iroot_cubes_and_fourth_powers() {
        for r in [1u128, 2, 3, 10, 99, 100, 10_000, 2_097_151] {
            assert_eq!(iroot::<3>(r * r * r), r as u64);
            assert_eq!(iroot::<3>(r * r * r - 1), r as u64 - 1);
            assert_eq!(iroot::<4>(r * r * r * r), r as u64);
            if r > 1 {
                assert_eq!(iroot::<4>(r * r * r * r - 1), r as u64 - 1);
            }
        }
    }

    #[test]
    fn iroot_brute_force() {
        for x in 1..20_000u128 {
            let r3 = iroot::<3>(x) as u128;
            assert!(r3 * r3 * r3 <= x && (r3 + 1) * (r3 + 1) * (r3 + 1) > x, "iroot3({})", x);
            let r6 = iroot::<6>(x) as u128;
            assert!(r6.pow(6) <= x && (r6 + 1).pow(6) > x, "iroot6({})", x);
        }
    }

    #[test]
    fn iroot_of_powers_of_ten() {
        assert_eq!(iroot::<3>(10u128.pow(15)), 100_000);
        assert_eq!(iroot::<3>(10u128.pow(30)), 10u64.pow(10));
        assert_eq!(iroot::<4>(10u128.pow(20)), 100_000);
        assert_eq!(iroot::<6>(10u128.pow(30)), 100_000);
    }

    #[test]
    fn ipow_small_values() {
        assert_eq!(ipow(2, 10), 1024);
        assert_eq!(ipow(10, 0), 1);
        assert_eq!(ipow(3, 5), 243);
    }
}
