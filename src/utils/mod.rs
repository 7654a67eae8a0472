//! Number-theoretic and combinatorial helpers.
//!
//! Prime-power detection decides which constructions apply to a level count;
//! the combination iterator drives strength verification.

mod primality;

pub use primality::{factor_prime_power, is_prime, is_prime_power, PrimePower};

/// Binomial coefficient C(n, k), or `None` on `u64` overflow.
///
/// ```
/// use taguchi_doe::utils::binomial;
///
/// assert_eq!(binomial(5, 2), Some(10));
/// assert_eq!(binomial(3, 5), Some(0));
/// ```
#[must_use]
pub fn binomial(n: u64, k: u64) -> Option<u64> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    let mut acc: u64 = 1;
    for i in 1..=k {
        // acc * (n - k + i) is divisible by i at every step.
        acc = acc.checked_mul(n - k + i)? / i;
    }
    Some(acc)
}

/// Iterate all k-subsets of `0..n` in lexicographic order.
///
/// `combinations(n, 0)` yields the empty set once.
///
/// ```
/// use taguchi_doe::utils::combinations;
///
/// let pairs: Vec<Vec<usize>> = combinations(4, 2).collect();
/// assert_eq!(pairs.len(), 6);
/// assert_eq!(pairs[0], vec![0, 1]);
/// assert_eq!(pairs[5], vec![2, 3]);
/// ```
pub fn combinations(n: usize, k: usize) -> Combinations {
    Combinations {
        n,
        next: (k <= n).then(|| (0..k).collect()),
    }
}

/// Iterator returned by [`combinations`].
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    next: Option<Vec<usize>>,
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let k = current.len();

        // Advance the rightmost index that still has room.
        let mut succ = current.clone();
        if let Some(pos) = (0..k).rev().find(|&i| succ[i] < self.n - k + i) {
            succ[pos] += 1;
            for i in pos + 1..k {
                succ[i] = succ[i - 1] + 1;
            }
            self.next = Some(succ);
        }

        Some(current)
    }
}
