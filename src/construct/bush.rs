//! Bush construction for orthogonal arrays.
//!
//! The Bush construction produces OA(q^t, k, q, t) where:
//! - q is a prime power (the number of levels)
//! - t ≥ 2 is the strength
//! - k ≤ q + 1 for t ≤ q, k ≤ t + 1 otherwise (the number of factors)
//!
//! ## Algorithm
//!
//! Each row is a polynomial `a_0 + a_1 x + ... + a_{t-1} x^{t-1}` over GF(q),
//! with the coefficients read from the base-q digits of the row index
//! (least significant first).
//!
//! For t ≤ q, column c < q holds the polynomial evaluated at the field
//! element c and column q holds the leading coefficient `a_{t-1}` (the
//! evaluation at infinity). Two distinct polynomials of degree < t agree on
//! at most t - 1 points, which gives strength t.
//!
//! For t > q there are too few evaluation points, so the columns are the t
//! coefficients followed by their GF(q) sum. Any t of those columns
//! determine the remaining one, which again gives strength t.
//!
//! ```
//! use taguchi_doe::construct::{Bush, Constructor};
//!
//! let bush = Bush::try_new(3, 3).unwrap();
//! let oa = bush.construct(4).unwrap();
//!
//! assert_eq!(oa.runs(), 27);
//! assert_eq!(oa.strength(), 3);
//! ```

use ndarray::Array2;

use super::Constructor;
use crate::error::{Error, Result};
use crate::gf::Field;
use crate::oa::{OAParams, OA};
use crate::utils::is_prime_power;

/// Bush construction for strength-t orthogonal arrays.
#[derive(Debug, Clone)]
pub struct Bush {
    q: u32,
    strength: u32,
    field: Field,
}

impl Bush {
    /// Create a Bush constructor for `q` levels and strength `t`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedLevels` if `q` is not a prime power and
    /// `InvalidStrength` if `t < 2`, and `InvalidParams` if `q^t` overflows.
    pub fn try_new(q: u32, strength: u32) -> Result<Self> {
        if !is_prime_power(q) {
            return Err(Error::UnsupportedLevels {
                levels: q,
                requirement: "must be a prime power",
                algorithm: "Bush",
            });
        }
        if strength < 2 {
            return Err(Error::InvalidStrength {
                strength,
                min: 2,
                max: usize::BITS - 1,
                algorithm: "Bush",
            });
        }
        if (q as usize).checked_pow(strength).is_none() {
            return Err(Error::invalid_params(format!("{q}^{strength} runs overflow")));
        }
        Ok(Self {
            q,
            strength,
            field: Field::new(q)?,
        })
    }

    /// Number of levels.
    #[must_use]
    pub fn levels(&self) -> u32 {
        self.q
    }

    /// Factor count of the textbook array OA(q^t, t+1, q, t).
    #[must_use]
    pub fn default_factors(&self) -> usize {
        self.strength as usize + 1
    }

    /// Whether rows are evaluated as polynomials rather than laid out as
    /// coefficients plus their sum.
    fn evaluates(&self) -> bool {
        self.strength <= self.q
    }

    /// Horner evaluation of the row polynomial at `x`.
    fn evaluate(&self, coeffs: &[u32], x: u32) -> u32 {
        coeffs
            .iter()
            .rev()
            .fold(0, |acc, &a| self.field.add(self.field.mul(acc, x), a))
    }
}

impl Constructor for Bush {
    fn name(&self) -> &'static str {
        "Bush"
    }

    fn family(&self) -> &'static str {
        "OA(q^t, k, q, t), t ≥ 2, k ≤ max(q, t)+1"
    }

    fn strength(&self) -> u32 {
        self.strength
    }

    fn runs(&self) -> usize {
        (self.q as usize).pow(self.strength)
    }

    fn max_factors(&self) -> usize {
        self.q.max(self.strength) as usize + 1
    }

    fn construct(&self, factors: usize) -> Result<OA> {
        let max = self.max_factors();
        if factors > max {
            return Err(Error::TooManyFactors {
                factors,
                max,
                algorithm: "Bush",
            });
        }
        if factors == 0 {
            return Err(Error::invalid_params("factors must be at least 1"));
        }

        let q = self.q;
        let t = self.strength as usize;
        let runs = self.runs();
        let mut data = Array2::zeros((runs, factors));
        let mut coeffs = vec![0u32; t];

        for row in 0..runs {
            let mut rest = row;
            for a in &mut coeffs {
                *a = (rest % q as usize) as u32;
                rest /= q as usize;
            }
            if self.evaluates() {
                for c in 0..factors {
                    data[[row, c]] = if (c as u32) < q {
                        self.evaluate(&coeffs, c as u32)
                    } else {
                        coeffs[t - 1]
                    };
                }
            } else {
                for c in 0..factors {
                    data[[row, c]] = if c < t {
                        coeffs[c]
                    } else {
                        coeffs.iter().fold(0, |acc, &a| self.field.add(acc, a))
                    };
                }
            }
        }

        let strength = self.strength.min(factors as u32);
        let params = OAParams::new(runs, factors, q, strength)?;
        OA::try_new(data, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;

    #[test]
    fn test_bush_strength_range() {
        assert!(matches!(
            Bush::try_new(3, 1),
            Err(Error::InvalidStrength { min: 2, .. })
        ));
        assert!(Bush::try_new(6, 2).is_err());
    }

    #[test]
    fn test_bush_strength_above_levels() {
        for (q, t) in [(2, 3), (2, 4), (3, 4), (4, 5)] {
            let bush = Bush::try_new(q, t).unwrap();
            assert_eq!(bush.max_factors(), t as usize + 1);
            let oa = bush.construct(bush.max_factors()).unwrap();
            assert_eq!(oa.runs(), (q as usize).pow(t));
            assert_eq!(oa.strength(), t);
            let report = oa.verify(&Limits::default()).unwrap();
            assert!(report.is_valid, "Bush({q}, {t}): {:?}", report.issues);
        }

        let bush = Bush::try_new(2, 3).unwrap();
        assert!(matches!(
            bush.construct(5),
            Err(Error::TooManyFactors { max: 4, .. })
        ));
    }

    #[test]
    fn test_bush_verifies_at_full_width() {
        for (q, t) in [(2, 2), (3, 2), (3, 3), (4, 3), (5, 3), (4, 4)] {
            let bush = Bush::try_new(q, t).unwrap();
            let oa = bush.construct(bush.max_factors()).unwrap();
            assert_eq!(oa.runs(), (q as usize).pow(t));
            let report = oa.verify(&Limits::default()).unwrap();
            assert!(report.is_valid, "Bush({q}, {t}): {:?}", report.issues);
        }
    }

    #[test]
    fn test_bush_default_factors() {
        let bush = Bush::try_new(5, 3).unwrap();
        assert_eq!(bush.default_factors(), 4);
        let oa = bush.construct(bush.default_factors()).unwrap();
        assert_eq!(oa.factors(), 4);
        assert_eq!(oa.strength(), 3);
    }
}
