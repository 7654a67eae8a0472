//! Bose construction for orthogonal arrays.
//!
//! The Bose construction produces OA(q², k, q, 2) where:
//! - q is a prime power (the number of levels)
//! - k ≤ q + 1 (the number of factors)
//! - strength is always 2
//!
//! ## Algorithm
//!
//! For each row (i, j) where i, j ∈ GF(q):
//! - Column 0: j
//! - Column c (for c = 1, 2, ..., q): i + (c mod q)·j in GF(q)
//!
//! Column q uses the multiplier 0 and so carries i itself.
//!
//! ## Example
//!
//! ```
//! use taguchi_doe::construct::{Bose, Constructor};
//!
//! // L9: 9 runs, 4 factors, 3 levels
//! let bose = Bose::try_new(3).unwrap();
//! let oa = bose.construct(4).unwrap();
//!
//! assert_eq!(oa.runs(), 9);
//! assert_eq!(oa.factors(), 4);
//! assert_eq!(oa.symmetric_levels(), Some(3));
//! assert_eq!(oa.strength(), 2);
//! ```

use ndarray::Array2;

use super::Constructor;
use crate::error::{Error, Result};
use crate::gf::Field;
use crate::oa::{OAParams, OA};
use crate::utils::is_prime_power;

/// Bose construction for strength-2 orthogonal arrays.
#[derive(Debug, Clone)]
pub struct Bose {
    q: u32,
    field: Field,
}

impl Bose {
    /// Create a Bose constructor for `q` levels.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedLevels` if `q` is not a prime power.
    pub fn try_new(q: u32) -> Result<Self> {
        if !is_prime_power(q) {
            return Err(Error::UnsupportedLevels {
                levels: q,
                requirement: "must be a prime power",
                algorithm: "Bose",
            });
        }
        Ok(Self {
            q,
            field: Field::new(q)?,
        })
    }

    /// Number of levels.
    #[must_use]
    pub fn levels(&self) -> u32 {
        self.q
    }
}

impl Constructor for Bose {
    fn name(&self) -> &'static str {
        "Bose"
    }

    fn family(&self) -> &'static str {
        "OA(q², k, q, 2), k ≤ q+1"
    }

    fn strength(&self) -> u32 {
        2
    }

    fn runs(&self) -> usize {
        (self.q as usize).pow(2)
    }

    fn max_factors(&self) -> usize {
        self.q as usize + 1
    }

    fn construct(&self, factors: usize) -> Result<OA> {
        let max = self.max_factors();
        if factors > max {
            return Err(Error::TooManyFactors {
                factors,
                max,
                algorithm: "Bose",
            });
        }
        if factors == 0 {
            return Err(Error::invalid_params("factors must be at least 1"));
        }

        let q = self.q;
        let mut data = Array2::zeros((self.runs(), factors));
        for i in 0..q {
            for j in 0..q {
                let row = (i * q + j) as usize;
                data[[row, 0]] = j;
                for c in 1..factors {
                    let multiplier = c as u32 % q;
                    data[[row, c]] = self.field.add(i, self.field.mul(multiplier, j));
                }
            }
        }

        let strength = 2.min(factors as u32);
        let params = OAParams::new(self.runs(), factors, q, strength)?;
        OA::try_new(data, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;

    #[test]
    fn test_bose_invalid() {
        assert!(matches!(
            Bose::try_new(6),
            Err(Error::UnsupportedLevels { levels: 6, .. })
        ));
        assert!(Bose::try_new(10).is_err());
        assert!(Bose::try_new(1).is_err());
    }

    #[test]
    fn test_bose_full_arrays_verify() {
        for q in [2, 3, 4, 5, 7, 8, 9] {
            let bose = Bose::try_new(q).unwrap();
            let oa = bose.construct(bose.max_factors()).unwrap();
            assert_eq!(oa.runs(), (q * q) as usize);
            assert_eq!(oa.factors(), (q + 1) as usize);
            let report = oa.verify(&Limits::default()).unwrap();
            assert!(report.is_valid, "Bose({q}): {:?}", report.issues);
        }
    }

    #[test]
    fn test_bose_l4_rows() {
        let oa = Bose::try_new(2).unwrap().construct(3).unwrap();
        assert_eq!(
            oa.to_rows(),
            vec![vec![0, 0, 0], vec![1, 1, 0], vec![0, 1, 1], vec![1, 0, 1]]
        );
    }

    #[test]
    fn test_bose_factor_bounds() {
        let bose = Bose::try_new(3).unwrap();
        assert!(matches!(
            bose.construct(5),
            Err(Error::TooManyFactors { max: 4, .. })
        ));
        assert!(bose.construct(0).is_err());

        let single = bose.construct(1).unwrap();
        assert_eq!(single.strength(), 1);
        assert!(single.balance_report().is_balanced());
    }
}
