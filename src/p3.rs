//! # P3 — Third Partial Sieve Term
//!
//! P3(x, y) counts the numbers <= x with exactly three prime factors, all
//! larger than y. Lehmer's formula subtracts it on top of Meissel's P2.
//! For p <= q <= r with p*q*r <= x the count factors into a double loop
//! over (p, q) with an O(1) pi lookup for the r range:
//!
//!   P3 = sum_{y < p <= x^(1/3)} sum_{p <= q <= sqrt(x/p)}
//!          (pi(x/(p*q)) - pi(q) + 1)

use rayon::prelude::*;

use crate::config::ideal_num_threads;
use crate::imath::{iroot, isqrt128};
use crate::pi_table::PiTable;
use crate::primes::generate_primes_indexed;

/// P3(x, y). Zero when y >= x^(1/3).
pub fn p3(x: u128, y: u64, threads: usize) -> i128 {
    let x13 = iroot::<3>(x);
    if y >= x13 || x < 8 {
        return 0;
    }
    let y = y.max(1);
    let max_prime = x13.max(isqrt128(x / y as u128));
    let primes = generate_primes_indexed(max_prime);
    let max_pix = x13.max((x / (y as u128 * y as u128)) as u64);
    let pi = PiTable::new(max_pix);

    let a = primes.partition_point(|&p| p <= y) - 1; // pi(y), 1-indexed table
    let pi_x13 = primes.partition_point(|&p| p <= x13) - 1;
    if a >= pi_x13 {
        return 0;
    }

    let threads = ideal_num_threads((pi_x13 - a) as u64, threads.max(1), 16);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .expect("failed to build thread pool");

    pool.install(|| {
        (a + 1..=pi_x13)
            .into_par_iter()
            .map(|i| {
                let xi = x / primes[i] as u128;
                let bi = pi.pi(isqrt128(xi));
                let mut sum = 0i128;
                for j in i as u64..=bi {
                    let r = (xi / primes[j as usize] as u128) as u64;
                    sum += pi.pi(r) as i128 - (j as i128 - 1);
                }
                sum
            })
            .sum()
    })
}
