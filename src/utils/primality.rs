//! Primality and prime-power factorization for level counts.
//!
//! Level counts are small (at most a few thousand), so trial division by
//! 6k ± 1 candidates is exact and fast enough.

/// A prime power `prime^exponent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimePower {
    /// The prime base.
    pub prime: u32,
    /// The exponent, at least 1.
    pub exponent: u32,
}

impl PrimePower {
    /// The value `prime^exponent`.
    #[must_use]
    pub fn value(&self) -> u64 {
        u64::from(self.prime).pow(self.exponent)
    }
}

/// Smallest prime factor of `n >= 2`.
fn smallest_factor(n: u32) -> u32 {
    if n % 2 == 0 {
        return 2;
    }
    if n % 3 == 0 {
        return 3;
    }
    let n64 = u64::from(n);
    let mut d: u64 = 5;
    while d * d <= n64 {
        if n64 % d == 0 {
            return d as u32;
        }
        if n64 % (d + 2) == 0 {
            return (d + 2) as u32;
        }
        d += 6;
    }
    n
}

/// Test whether `n` is prime.
///
/// ```
/// use taguchi_doe::utils::is_prime;
///
/// assert!(is_prime(2));
/// assert!(is_prime(97));
/// assert!(!is_prime(1));
/// assert!(!is_prime(91));
/// ```
#[must_use]
pub fn is_prime(n: u32) -> bool {
    n >= 2 && smallest_factor(n) == n
}

/// Factor `n` as `p^k`, or `None` if it has two distinct prime factors.
///
/// ```
/// use taguchi_doe::utils::factor_prime_power;
///
/// let pp = factor_prime_power(27).unwrap();
/// assert_eq!((pp.prime, pp.exponent), (3, 3));
/// assert!(factor_prime_power(12).is_none());
/// ```
#[must_use]
pub fn factor_prime_power(n: u32) -> Option<PrimePower> {
    if n < 2 {
        return None;
    }
    let prime = smallest_factor(n);
    let mut rest = n;
    let mut exponent = 0;
    while rest % prime == 0 {
        rest /= prime;
        exponent += 1;
    }
    (rest == 1).then_some(PrimePower { prime, exponent })
}

/// Test whether `n` is a prime power `p^k` with `k >= 1`.
#[must_use]
pub fn is_prime_power(n: u32) -> bool {
    factor_prime_power(n).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_primes() {
        let primes: Vec<u32> = (0..60).filter(|&n| is_prime(n)).collect();
        assert_eq!(
            primes,
            vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59]
        );
    }

    #[test]
    fn test_large_values() {
        assert!(is_prime(65_521));
        assert!(!is_prime(65_537 * 3));
        assert!(is_prime(4_294_967_291));
    }

    #[test]
    fn test_prime_powers() {
        for (n, p, k) in [(2, 2, 1), (4, 2, 2), (8, 2, 3), (9, 3, 2), (25, 5, 2), (243, 3, 5)] {
            let pp = factor_prime_power(n).unwrap();
            assert_eq!((pp.prime, pp.exponent), (p, k), "n = {n}");
            assert_eq!(pp.value(), u64::from(n));
        }
        for n in [0, 1, 6, 10, 12, 36, 100] {
            assert!(!is_prime_power(n), "n = {n}");
        }
    }
}
