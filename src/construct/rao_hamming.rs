//! Rao-Hamming construction for orthogonal arrays.
//!
//! Produces OA(q^m, k, q, 2) with k ≤ (q^m - 1) / (q - 1), the most factors
//! any strength-2 array on q^m runs can carry.
//!
//! ## Algorithm
//!
//! 1. Take every non-zero vector of length m over GF(q) whose first non-zero
//!    entry is 1, in increasing order of its big-endian digit encoding. These
//!    are pairwise linearly independent.
//! 2. Each row is a vector u ∈ GF(q)^m; the entry in column g is the dot
//!    product u·g.
//!
//! ```
//! use taguchi_doe::construct::{Constructor, RaoHamming};
//!
//! // L27 with 13 three-level columns
//! let rh = RaoHamming::try_new(3, 3).unwrap();
//! let oa = rh.construct(13).unwrap();
//! assert_eq!(oa.runs(), 27);
//! assert_eq!(oa.factors(), 13);
//! ```

use ndarray::Array2;

use super::Constructor;
use crate::error::{Error, Result};
use crate::gf::Field;
use crate::oa::{OAParams, OA};
use crate::utils::is_prime_power;

/// Rao-Hamming construction for strength-2 orthogonal arrays.
#[derive(Debug, Clone)]
pub struct RaoHamming {
    q: u32,
    m: u32,
    field: Field,
}

impl RaoHamming {
    /// Create a Rao-Hamming constructor with q^m runs.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedLevels` if `q` is not a prime power and
    /// `InvalidParams` if `m < 2` or q^m overflows.
    pub fn try_new(q: u32, m: u32) -> Result<Self> {
        if !is_prime_power(q) {
            return Err(Error::UnsupportedLevels {
                levels: q,
                requirement: "must be a prime power",
                algorithm: "Rao-Hamming",
            });
        }
        if m < 2 {
            return Err(Error::invalid_params(format!(
                "Rao-Hamming exponent must be at least 2, got {m}"
            )));
        }
        if q.checked_pow(m).is_none() {
            return Err(Error::invalid_params(format!("{q}^{m} runs overflows")));
        }
        Ok(Self {
            q,
            m,
            field: Field::new(q)?,
        })
    }

    /// Number of levels.
    #[must_use]
    pub fn levels(&self) -> u32 {
        self.q
    }

    /// The exponent m with N = q^m.
    #[must_use]
    pub fn exponent(&self) -> u32 {
        self.m
    }

    /// Big-endian digits of `value` over q.
    fn digits(&self, mut value: usize) -> Vec<u32> {
        let q = self.q as usize;
        let mut out = vec![0u32; self.m as usize];
        for d in out.iter_mut().rev() {
            *d = (value % q) as u32;
            value /= q;
        }
        out
    }

    /// The first `count` normalised generator columns.
    fn generators(&self, count: usize) -> Vec<Vec<u32>> {
        (1..self.runs())
            .map(|v| self.digits(v))
            .filter(|g| g.iter().find(|&&d| d != 0) == Some(&1))
            .take(count)
            .collect()
    }
}

impl Constructor for RaoHamming {
    fn name(&self) -> &'static str {
        "Rao-Hamming"
    }

    fn family(&self) -> &'static str {
        "OA(q^m, k, q, 2), k ≤ (q^m-1)/(q-1)"
    }

    fn strength(&self) -> u32 {
        2
    }

    fn runs(&self) -> usize {
        (self.q as usize).pow(self.m)
    }

    fn max_factors(&self) -> usize {
        (self.runs() - 1) / (self.q as usize - 1)
    }

    fn construct(&self, factors: usize) -> Result<OA> {
        let max = self.max_factors();
        if factors > max {
            return Err(Error::TooManyFactors {
                factors,
                max,
                algorithm: "Rao-Hamming",
            });
        }
        if factors == 0 {
            return Err(Error::invalid_params("factors must be at least 1"));
        }

        let gens = self.generators(factors);
        let runs = self.runs();
        let mut data = Array2::zeros((runs, factors));
        for r in 0..runs {
            let u = self.digits(r);
            for (c, g) in gens.iter().enumerate() {
                data[[r, c]] = u
                    .iter()
                    .zip(g)
                    .fold(0, |acc, (&a, &b)| self.field.add(acc, self.field.mul(a, b)));
            }
        }

        let strength = 2.min(factors as u32);
        let params = OAParams::new(runs, factors, self.q, strength)?;
        OA::try_new(data, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;

    #[test]
    fn test_rao_hamming_max_factors() {
        assert_eq!(RaoHamming::try_new(3, 3).unwrap().max_factors(), 13);
        assert_eq!(RaoHamming::try_new(3, 4).unwrap().max_factors(), 40);
        assert_eq!(RaoHamming::try_new(2, 4).unwrap().max_factors(), 15);
    }

    #[test]
    fn test_rao_hamming_verifies() {
        for (q, m) in [(2, 3), (3, 3), (4, 2), (5, 2), (3, 4)] {
            let rh = RaoHamming::try_new(q, m).unwrap();
            let oa = rh.construct(rh.max_factors()).unwrap();
            let report = oa.verify(&Limits::default()).unwrap();
            assert!(report.is_valid, "RH({q}, {m}): {:?}", report.issues);
        }
    }

    #[test]
    fn test_rao_hamming_invalid() {
        assert!(RaoHamming::try_new(6, 2).is_err());
        assert!(RaoHamming::try_new(3, 1).is_err());
        let rh = RaoHamming::try_new(3, 2).unwrap();
        assert!(rh.construct(5).is_err());
    }
}
