//! Addelman-Kempthorne construction for orthogonal arrays.
//!
//! Produces OA(2s², k, s, 2) for an odd prime s with up to 2s + 1 s-level
//! columns, optionally preceded by a single two-level column. L18 is the
//! s = 3 case with one two-level factor and seven three-level factors.
//!
//! ## Algorithm
//!
//! Rows come in two blocks of s² rows indexed by (i, j) ∈ GF(s)².
//!
//! **Block 0**:
//! - Column 0: j
//! - Columns 1 to s-1: i + m·j for m = 1, ..., s-1
//! - Column s: i
//! - Columns s+1 to 2s: i² + m·i + j for m = 0, ..., s-1
//!
//! **Block 1** shifts the linear columns by `b[m]` and replaces the quadratic
//! columns by `kay·i² + k[m]·i + j + c[m]`, where `kay` is the smallest
//! non-square and for m ≥ 1
//!
//! - `b[m] = (kay - 1) / (4·kay·m)`
//! - `k[m] = kay·m`
//! - `c[m] = m²·(kay - 1) / 4`
//!
//! The optional two-level column is the block index.
//!
//! ## Reference
//!
//! S. Addelman and O. Kempthorne (1961). "Some Main-Effect Plans and Orthogonal
//! Arrays of Strength Two." Annals of Mathematical Statistics, Vol 32, pp 1167-1176.
//!
//! ```
//! use taguchi_doe::construct::{AddelmanKempthorne, Constructor};
//!
//! let ak = AddelmanKempthorne::try_new(3, 1).unwrap();
//! let l18 = ak.construct(8).unwrap();
//!
//! assert_eq!(l18.runs(), 18);
//! assert_eq!(l18.levels(), &[2, 3, 3, 3, 3, 3, 3, 3]);
//! ```

use ndarray::Array2;

use super::Constructor;
use crate::error::{Error, Result};
use crate::gf::Field;
use crate::oa::{OAParams, OA};
use crate::utils::is_prime;

/// Addelman-Kempthorne construction for mixed 2/s-level arrays.
#[derive(Debug, Clone)]
pub struct AddelmanKempthorne {
    s: u32,
    two_level_factors: usize,
    field: Field,
    /// Smallest quadratic non-residue.
    kay: u32,
    b: Vec<u32>,
    c: Vec<u32>,
    k: Vec<u32>,
}

impl AddelmanKempthorne {
    /// Create a constructor over `s` levels with 0 or 1 two-level factors.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedLevels` unless `s` is an odd prime, and
    /// `InvalidParams` for more than one two-level factor.
    pub fn try_new(s: u32, two_level_factors: usize) -> Result<Self> {
        if s == 2 || !is_prime(s) {
            return Err(Error::UnsupportedLevels {
                levels: s,
                requirement: "must be an odd prime",
                algorithm: "Addelman-Kempthorne",
            });
        }
        if two_level_factors > 1 {
            return Err(Error::invalid_params(format!(
                "Addelman-Kempthorne supports at most 1 two-level factor, got {two_level_factors}"
            )));
        }

        let field = Field::new(s)?;
        let kay = field.first_non_square().ok_or_else(|| {
            Error::construction_failed(format!("GF({s}) has no quadratic non-residue"))
        })?;
        let four = 4 % s;
        let four_inv = field
            .inv(four)
            .ok_or_else(|| Error::construction_failed("4 is not invertible"))?;
        let kay_minus_one = field.sub(kay, 1);

        let size = s as usize;
        let mut b = vec![0u32; size];
        let mut c = vec![0u32; size];
        let mut k = vec![0u32; size];
        for m in 1..s {
            let denom = field.mul(field.mul(kay, four), m);
            b[m as usize] = field.div(kay_minus_one, denom)?;
            k[m as usize] = field.mul(kay, m);
            c[m as usize] = field.mul(field.mul(field.mul(m, m), kay_minus_one), four_inv);
        }

        Ok(Self {
            s,
            two_level_factors,
            field,
            kay,
            b,
            c,
            k,
        })
    }

    /// Number of s-level factors available.
    #[must_use]
    pub fn max_s_level_factors(&self) -> usize {
        2 * self.s as usize + 1
    }

    /// Level counts for a build with `factors` total columns.
    fn level_counts(&self, factors: usize) -> Vec<u32> {
        let mut levels = vec![2; self.two_level_factors];
        levels.resize(factors, self.s);
        levels
    }

    /// Entry of s-level column `col` at block row (i, j).
    fn entry(&self, block: u32, col: u32, i: u32, j: u32) -> u32 {
        let f = &self.field;
        let q = self.s;
        if col == 0 {
            j
        } else if col < q {
            let v = f.add(i, f.mul(col, j));
            if block == 0 {
                v
            } else {
                f.add(v, self.b[col as usize])
            }
        } else if col == q {
            i
        } else {
            let m = col - q - 1;
            let ii = f.mul(i, i);
            if block == 0 {
                f.add(f.add(ii, f.mul(m, i)), j)
            } else {
                let quad = f.add(f.mul(self.kay, ii), f.mul(self.k[m as usize], i));
                f.add(f.add(quad, j), self.c[m as usize])
            }
        }
    }
}

impl Constructor for AddelmanKempthorne {
    fn name(&self) -> &'static str {
        "Addelman-Kempthorne"
    }

    fn family(&self) -> &'static str {
        "OA(2s², 2^a s^k, 2), s odd prime, a ≤ 1, k ≤ 2s+1"
    }

    fn strength(&self) -> u32 {
        2
    }

    fn runs(&self) -> usize {
        2 * (self.s as usize).pow(2)
    }

    fn max_factors(&self) -> usize {
        self.two_level_factors + self.max_s_level_factors()
    }

    fn construct(&self, factors: usize) -> Result<OA> {
        let max = self.max_factors();
        if factors > max {
            return Err(Error::TooManyFactors {
                factors,
                max,
                algorithm: "Addelman-Kempthorne",
            });
        }
        if factors < 2 || factors <= self.two_level_factors {
            return Err(Error::invalid_params(
                "Addelman-Kempthorne needs at least 2 factors including one s-level factor",
            ));
        }

        let q = self.s;
        let two = self.two_level_factors;
        let s_cols = (factors - two) as u32;
        let mut data = Array2::zeros((self.runs(), factors));

        for block in 0..2u32 {
            for i in 0..q {
                for j in 0..q {
                    let row = (block * q * q + i * q + j) as usize;
                    if two == 1 {
                        data[[row, 0]] = block;
                    }
                    for col in 0..s_cols {
                        data[[row, two + col as usize]] = self.entry(block, col, i, j);
                    }
                }
            }
        }

        let params = OAParams::new_mixed(self.runs(), self.level_counts(factors), 2)?;
        OA::try_new(data, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;

    #[test]
    fn test_ak_rejects_bad_levels() {
        assert!(AddelmanKempthorne::try_new(2, 0).is_err());
        assert!(AddelmanKempthorne::try_new(9, 0).is_err());
        assert!(AddelmanKempthorne::try_new(6, 0).is_err());
        assert!(matches!(
            AddelmanKempthorne::try_new(3, 2),
            Err(Error::InvalidParams { .. })
        ));
    }

    #[test]
    fn test_ak_full_width_verifies() {
        for s in [3, 5, 7, 11] {
            for two in [0, 1] {
                let ak = AddelmanKempthorne::try_new(s, two).unwrap();
                let oa = ak.construct(ak.max_factors()).unwrap();
                assert_eq!(oa.runs(), 2 * (s * s) as usize);
                let report = oa.verify(&Limits::default()).unwrap();
                assert!(report.is_valid, "AK({s}, {two}): {:?}", report.issues);
            }
        }
    }

    #[test]
    fn test_ak_factor_bounds() {
        let ak = AddelmanKempthorne::try_new(3, 1).unwrap();
        assert_eq!(ak.max_factors(), 8);
        assert!(matches!(
            ak.construct(9),
            Err(Error::TooManyFactors { max: 8, .. })
        ));
        assert!(ak.construct(1).is_err());

        let plain = AddelmanKempthorne::try_new(5, 0).unwrap();
        assert!(plain.construct(1).is_err());
        assert_eq!(plain.construct(11).unwrap().symmetric_levels(), Some(5));
    }

    #[test]
    fn test_two_level_column_is_block() {
        let oa = AddelmanKempthorne::try_new(3, 1).unwrap().construct(4).unwrap();
        let block: Vec<u32> = oa.column(0).to_vec();
        assert_eq!(&block[..9], &[0; 9]);
        assert_eq!(&block[9..], &[1; 9]);
    }
}
