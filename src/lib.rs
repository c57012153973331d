//! # primecount — Core Library
//!
//! Counts primes below x for very large x (up to ~10^31 with 128-bit
//! arithmetic) without enumerating them, using the combinatorial
//! prime-counting algorithms in increasing order of sophistication:
//!
//! - [`legendre`] — pi(x) = phi(x, a) + a - 1
//! - [`meissel`] — Legendre plus the P2 correction
//! - [`lehmer`] — Meissel plus the P3 correction
//! - [`lmo`] — Lagarias-Miller-Odlyzko special leaves (canonical,
//!   single-threaded)
//! - [`dr`] — Deleglise-Rivat: parallel S2 split into trivial / easy /
//!   hard leaves
//! - [`gourdon`] — Xavier Gourdon's A - B + C + D + Phi0 + Sigma, the
//!   fastest production path and the default behind [`pi`]
//!
//! **Infrastructure modules** (the machinery under the leaf formulas):
//! - [`bit_sieve`], [`fenwick`] — segment bit array + binary indexed tree,
//!   the O(log n) unsieved-position counter behind the hard leaves
//! - [`factor_table`] — compressed mu/lpf lookup
//! - [`pi_table`], [`phi`], [`p2`], [`p3`], [`s1`], [`s2`] — the shared
//!   terms and their evaluators
//! - [`balancer`], [`status`], [`checkpoint`] — adaptive thread
//!   scheduling, progress display, resumable backups
//! - [`fastdiv`], [`imath`], [`primes`], [`li`] — reciprocal division,
//!   exact integer roots, prime generation, Li/Ri approximations
//!
//! ## Semantics
//!
//! All algorithms agree bit-for-bit: the slower ones exist as
//! cross-checks for the faster ones, and the test suites hold them to
//! exact equality. Arithmetic inside the formulas is exact integer
//! arithmetic; floats appear only in tuning heuristics, progress display
//! and the Li/Ri approximations, none of which feed back into results.
//!
//! Negative x counts zero primes; x beyond the 128-bit signed range is
//! unrepresentable by the API.

pub mod balancer;
pub mod bit_sieve;
pub mod checkpoint;
pub mod config;
pub mod dr;
pub mod factor_table;
pub mod fastdiv;
pub mod fenwick;
pub mod gourdon;
pub mod imath;
pub mod legendre;
pub mod lehmer;
pub mod li;
pub mod lmo;
pub mod meissel;
pub mod nth_prime;
pub mod p2;
pub mod p3;
pub mod phi;
pub mod pi_table;
pub mod primes;
pub mod s1;
pub mod s2;
pub mod status;

use std::sync::OnceLock;

pub use config::{
    get_num_threads, set_alpha, set_alpha_y, set_alpha_z, set_num_threads, MAX_THREADS,
};
pub use dr::pi_deleglise_rivat;
pub use gourdon::{phi0, pi_gourdon};
pub use legendre::pi_legendre;
pub use lehmer::pi_lehmer;
pub use li::{Li, Li_inverse, Ri, Ri_inverse};
pub use lmo::pi_lmo;
pub use meissel::pi_meissel;
pub use nth_prime::nth_prime;
pub use phi::{phi, phi_tiny};

/// Largest x answered from the cached small table.
const CACHE_MAX: u64 = 1 << 16;

static PI_CACHE: OnceLock<pi_table::PiTable> = OnceLock::new();

fn pi_cache(x: u64) -> i128 {
    PI_CACHE
        .get_or_init(|| pi_table::PiTable::new(CACHE_MAX))
        .pi(x) as i128
}

/// The number of primes <= x. Negative x counts zero primes.
pub fn pi(x: i64) -> i64 {
    pi128(x as i128) as i64
}

/// pi(x) over the full 128-bit range.
pub fn pi128(x: i128) -> i128 {
    if x < 2 {
        return 0;
    }
    let x = x as u128;
    if x <= CACHE_MAX as u128 {
        return pi_cache(x as u64);
    }
    gourdon::pi_gourdon(x)
}

/// pi(x) by direct segmented sieve of Eratosthenes; the brute-force
/// cross-check for everything else.
pub fn pi_primesieve(x: i64) -> i64 {
    if x < 2 {
        return 0;
    }
    primes::count_primes(x as u64) as i64
}
