//! # CLI Execution Functions
//!
//! Extracted from `main.rs` to keep the entry point slim: number parsing
//! (including the `base**exp` convenience syntax), algorithm selection,
//! the self-test battery, and result printing.

use anyhow::{bail, Context, Result};
use std::time::Instant;
use tracing::info;

use primecount::{config, li, nth_prime, phi};

use super::Cli;

/// Parse x as decimal, `base**exp`, `base^exp` or integer scientific
/// notation (`5e15`).
pub fn parse_x(input: &str) -> Result<i128> {
    let s: String = input.chars().filter(|c| *c != '_' && *c != ',').collect();
    let number = |part: &str| -> Result<i128> {
        part.trim()
            .parse::<i128>()
            .with_context(|| format!("invalid number: {:?}", part))
    };

    if let Some((base, exp)) = s.split_once("**").or_else(|| s.split_once('^')) {
        let base = number(base)?;
        let exp: u32 = exp
            .trim()
            .parse()
            .with_context(|| format!("invalid exponent: {:?}", exp))?;
        return base
            .checked_pow(exp)
            .with_context(|| format!("{}**{} exceeds 128 bits", base, exp));
    }
    if let Some((mantissa, exp)) = s.split_once(['e', 'E']) {
        let mantissa = number(mantissa)?;
        let exp: u32 = exp
            .trim()
            .parse()
            .with_context(|| format!("invalid exponent: {:?}", exp))?;
        return 10i128
            .checked_pow(exp)
            .and_then(|p| mantissa.checked_mul(p))
            .with_context(|| format!("{}e{} exceeds 128 bits", mantissa, exp));
    }
    number(&s)
}

fn checked_u64(x: i128, what: &str) -> Result<u64> {
    u64::try_from(x).map_err(|_| anyhow::anyhow!("{} requires 0 <= x <= 2^64", what))
}

/// Route the parsed command line to the requested computation.
pub fn run(args: &Cli) -> Result<()> {
    if let Some(threads) = args.threads {
        config::set_num_threads(threads);
    }
    if let Some(alpha) = args.alpha {
        config::set_alpha(alpha);
    }
    if let Some(alpha_y) = args.alpha_y {
        config::set_alpha_y(alpha_y);
    }
    if let Some(alpha_z) = args.alpha_z {
        config::set_alpha_z(alpha_z);
    }
    if let Some(digits) = args.status {
        config::set_print_status(true);
        config::set_status_precision(digits);
    }
    // --resume points at an existing checkpoint; --backup keeps it current
    if let Some(path) = args.resume.as_ref().or(args.backup.as_ref()) {
        config::set_backup_file(Some(path.clone()));
    }

    if args.test {
        return run_test();
    }

    let Some(x_arg) = &args.x else {
        bail!("missing the positional argument x; try --help");
    };
    let x = parse_x(x_arg)?;
    let started = Instant::now();

    let result: String = if args.nth_prime {
        let n = i64::try_from(x).context("nth_prime requires n < 2^63")?;
        nth_prime::nth_prime(n)?.to_string()
    } else if let Some(a) = args.phi {
        let x = i64::try_from(x).context("phi requires x < 2^63")?;
        phi::phi(x, a).to_string()
    } else if args.li {
        format!("{:.0}", li::Li(x as f64))
    } else if args.li_inverse {
        format!("{:.0}", li::Li_inverse(x as f64))
    } else if args.ri {
        format!("{:.0}", li::Ri(x as f64))
    } else if args.ri_inverse {
        format!("{:.0}", li::Ri_inverse(x as f64))
    } else if args.legendre {
        primecount::pi_legendre(checked_u64(x, "--legendre")? as u128).to_string()
    } else if args.meissel {
        primecount::meissel::pi_meissel_threads(
            checked_u64(x, "--meissel")? as u128,
            config::get_num_threads(),
        )
        .to_string()
    } else if args.lehmer {
        primecount::lehmer::pi_lehmer_threads(
            checked_u64(x, "--lehmer")? as u128,
            config::get_num_threads(),
        )
        .to_string()
    } else if args.lmo {
        primecount::pi_lmo(x.max(0) as u128).to_string()
    } else if args.deleglise_rivat {
        primecount::pi_deleglise_rivat(x.max(0) as u128).to_string()
    } else if args.primesieve {
        let x = i64::try_from(x).context("--primesieve requires x < 2^63")?;
        primecount::pi_primesieve(x).to_string()
    } else if args.gourdon {
        primecount::pi_gourdon(x.max(0) as u128).to_string()
    } else {
        primecount::pi128(x).to_string()
    };

    println!("{}", result);
    if args.time {
        println!("Seconds: {:.3}", started.elapsed().as_secs_f64());
    }
    Ok(())
}

/// The --test battery: cross-check every algorithm against the direct
/// sieve and each other on deterministic pseudo-random inputs.
fn run_test() -> Result<()> {
    let mut seed = 0xC0FF_EE12_3456_789Au64;
    let mut rand = move |modulus: u64| {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        seed % modulus
    };

    fn check(name: &str, ok: bool) -> Result<()> {
        println!("{:<44} {}", name, if ok { "OK" } else { "ERROR" });
        if !ok {
            bail!("self test failed: {}", name);
        }
        Ok(())
    }

    info!("running self tests");
    for _ in 0..6 {
        let x = rand(1_000_000) as i64;
        let expect = primecount::pi_primesieve(x) as i128;
        check(
            "pi_legendre(x) == pi_primesieve(x)",
            primecount::pi_legendre(x as u128) == expect,
        )?;
        check(
            "pi_meissel(x) == pi_primesieve(x)",
            primecount::pi_meissel(x as u128) == expect,
        )?;
        check(
            "pi_lehmer(x) == pi_primesieve(x)",
            primecount::pi_lehmer(x as u128) == expect,
        )?;
        check(
            "pi_lmo(x) == pi_primesieve(x)",
            primecount::pi_lmo(x as u128) == expect,
        )?;
        check(
            "pi_deleglise_rivat(x) == pi_primesieve(x)",
            primecount::pi_deleglise_rivat(x as u128) == expect,
        )?;
        check(
            "pi_gourdon(x) == pi_primesieve(x)",
            primecount::pi_gourdon(x as u128) == expect,
        )?;
    }

    for _ in 0..4 {
        let x = 1_000_000 + rand(20_000_000) as i64;
        check(
            "pi_gourdon(x) == pi_deleglise_rivat(x)",
            primecount::pi_gourdon(x as u128) == primecount::pi_deleglise_rivat(x as u128),
        )?;
    }

    for _ in 0..10 {
        let x = rand(100_000) as i64;
        let a = rand(20) as i64 + 1;
        let brute = {
            let primes = primecount::primes::generate_primes(1_000);
            (1..=x)
                .filter(|&n| primes.iter().take(a as usize).all(|&p| n % p as i64 != 0))
                .count() as i64
        };
        check("phi(x, a) matches brute force", phi::phi(x, a) == brute)?;
    }

    let n = rand(1_000_000) as i64 + 1;
    let p = nth_prime::nth_prime(n)?;
    check("pi(nth_prime(n)) == n", primecount::pi(p) == n)?;

    println!("All tests passed successfully!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_decimal() {
        assert_eq!(parse_x("0").unwrap(), 0);
        assert_eq!(parse_x("123456789").unwrap(), 123_456_789);
        assert_eq!(parse_x("1_000_000").unwrap(), 1_000_000);
    }

    #[test]
    fn parse_power_syntax() {
        assert_eq!(parse_x("10**14").unwrap(), 10i128.pow(14));
        assert_eq!(parse_x("2**64").unwrap(), 2i128.pow(64));
        assert_eq!(parse_x("2^10").unwrap(), 1024);
        assert_eq!(parse_x("10 ** 3").unwrap(), 1000);
    }

    #[test]
    fn parse_scientific() {
        assert_eq!(parse_x("5e15").unwrap(), 5 * 10i128.pow(15));
        assert_eq!(parse_x("1E6").unwrap(), 1_000_000);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_x("").is_err());
        assert!(parse_x("ten").is_err());
        assert!(parse_x("10**").is_err());
        assert!(parse_x("2**200").is_err());
    }
}
