//! Benchmarks for the pi(x) algorithms and their hot primitives.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use primecount::fenwick::BinaryIndexedTree;
use primecount::imath::isqrt;
use primecount::phi::phi_tiny;
use primecount::pi_table::PiTable;
use primecount::primes::generate_primes;
use primecount::{pi_deleglise_rivat, pi_gourdon, pi_legendre, pi_lehmer, pi_lmo, pi_meissel};

fn bench_algorithms(c: &mut Criterion) {
    let mut group = c.benchmark_group("pi_1e8");
    group.sample_size(10);
    group.bench_function("legendre", |b| b.iter(|| pi_legendre(black_box(100_000_000))));
    group.bench_function("meissel", |b| b.iter(|| pi_meissel(black_box(100_000_000))));
    group.bench_function("lehmer", |b| b.iter(|| pi_lehmer(black_box(100_000_000))));
    group.bench_function("lmo", |b| b.iter(|| pi_lmo(black_box(100_000_000))));
    group.bench_function("deleglise_rivat", |b| {
        b.iter(|| pi_deleglise_rivat(black_box(100_000_000)))
    });
    group.bench_function("gourdon", |b| b.iter(|| pi_gourdon(black_box(100_000_000))));
    group.finish();
}

fn bench_primitives(c: &mut Criterion) {
    c.bench_function("generate_primes_1e7", |b| {
        b.iter(|| generate_primes(black_box(10_000_000)))
    });

    c.bench_function("pi_table_build_1e6", |b| b.iter(|| PiTable::new(black_box(1_000_000))));

    let table = PiTable::new(10_000_000);
    c.bench_function("pi_table_query", |b| {
        let mut n = 1u64;
        b.iter(|| {
            n = (n * 48_271) % 10_000_000;
            table.pi(black_box(n))
        })
    });

    c.bench_function("phi_tiny_level_7", |b| {
        let mut x = 1u128;
        b.iter(|| {
            x = (x * 6_364_136_223_846_793_005) % (1 << 62);
            phi_tiny(black_box(x), 7)
        })
    });

    c.bench_function("fenwick_init_and_count", |b| {
        let n = 1 << 16;
        let mut sieve = primecount::bit_sieve::BitSieve::new(n);
        sieve.fill();
        let mut tree = BinaryIndexedTree::new();
        b.iter(|| {
            tree.init(black_box(&sieve), n);
            let mut total = 0u64;
            let mut pos = 1;
            while pos < n {
                total += tree.count(pos);
                pos *= 2;
            }
            total
        })
    });

    c.bench_function("isqrt", |b| {
        let mut x = 3u64;
        b.iter(|| {
            x = x.wrapping_mul(0x9E37_79B9_7F4A_7C15).max(2);
            isqrt(black_box(x))
        })
    });
}

criterion_group!(benches, bench_algorithms, bench_primitives);
criterion_main!(benches);
