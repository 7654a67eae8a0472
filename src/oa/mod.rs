//! Orthogonal array core types.
//!
//! - [`OA`]: an N×k matrix of level indices plus its declared parameters
//! - [`OAParams`]: runs, factors, per-factor levels, strength
//! - [`verify`]: strength verification
//! - [`stats`]: balance and correlation reports
//!
//! An orthogonal array OA(N, k, s, t) has N rows, k columns over s symbols,
//! and every N×t subarray contains each t-tuple the same number of times.
//! Mixed-level arrays carry a level count per column.
//!
//! An [`OA`] is validated on creation (every entry of column i lies in
//! `0..levels[i]`) and is immutable afterwards; reshaping operations return
//! new values.

pub mod stats;
pub mod verify;

pub use stats::{balance_report, correlation_matrix, BalanceReport};
pub use verify::{compute_strength, verify_matrix, VerificationIssue, VerificationReport};

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parameters describing an orthogonal array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAParams {
    /// Number of runs (rows).
    pub runs: usize,
    /// Number of factors (columns).
    pub factors: usize,
    /// Number of levels for each factor.
    pub levels: Vec<u32>,
    /// Declared strength.
    pub strength: u32,
}

impl OAParams {
    /// Symmetric parameters OA(runs, factors, levels, strength).
    ///
    /// # Errors
    ///
    /// Returns an error if levels < 2, strength exceeds factors, or runs is not
    /// divisible by levels^strength.
    pub fn new(runs: usize, factors: usize, levels: u32, strength: u32) -> Result<Self> {
        if levels < 2 {
            return Err(Error::invalid_params("levels must be at least 2"));
        }
        let params = Self::new_mixed(runs, vec![levels; factors], strength)?;

        let s_to_t = (levels as usize)
            .checked_pow(strength)
            .ok_or_else(|| Error::invalid_params(format!("{levels}^{strength} overflows")))?;
        if runs % s_to_t != 0 {
            return Err(Error::invalid_params(format!(
                "runs {runs} must be divisible by {levels}^{strength} = {s_to_t}"
            )));
        }
        Ok(params)
    }

    /// Parameters with one level count per factor.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no factors, any level count is below 2,
    /// or the strength exceeds the number of factors.
    pub fn new_mixed(runs: usize, levels: Vec<u32>, strength: u32) -> Result<Self> {
        let factors = levels.len();
        if factors == 0 {
            return Err(Error::invalid_params("factors must be at least 1"));
        }
        if let Some((i, s)) = levels.iter().enumerate().find(|&(_, &s)| s < 2) {
            return Err(Error::invalid_params(format!(
                "levels for factor {i} must be at least 2, got {s}"
            )));
        }
        if strength as usize > factors {
            return Err(Error::invalid_params(format!(
                "strength {strength} cannot exceed factors {factors}"
            )));
        }
        Ok(Self {
            runs,
            factors,
            levels,
            strength,
        })
    }

    /// Whether every factor has the same number of levels.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        self.levels.windows(2).all(|w| w[0] == w[1])
    }

    /// The common level count of a symmetric array.
    #[must_use]
    pub fn symmetric_levels(&self) -> Option<u32> {
        match self.levels.first() {
            Some(&s) if self.is_symmetric() => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for OAParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.symmetric_levels() {
            return write!(f, "OA({}, {}, {}, {})", self.runs, self.factors, s, self.strength);
        }
        let mut tally: BTreeMap<u32, usize> = BTreeMap::new();
        for &s in &self.levels {
            *tally.entry(s).or_insert(0) += 1;
        }
        let spec: Vec<String> = tally
            .into_iter()
            .map(|(s, k)| if k == 1 { s.to_string() } else { format!("{s}^{k}") })
            .collect();
        write!(f, "OA({}, {}, {})", self.runs, spec.join(" "), self.strength)
    }
}

/// An orthogonal array (or a candidate matrix awaiting verification).
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct OA {
    data: Array2<u32>,
    params: OAParams,
}

impl OA {
    /// Create an array, checking dimensions and value ranges.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the shape disagrees with the parameters
    /// and `ValueOutOfRange` for the first entry outside its column's levels.
    pub fn try_new(data: Array2<u32>, params: OAParams) -> Result<Self> {
        if data.nrows() != params.runs {
            return Err(Error::DimensionMismatch {
                expected: format!("{} rows", params.runs),
                actual: format!("{} rows", data.nrows()),
            });
        }
        if data.ncols() != params.factors || params.levels.len() != params.factors {
            return Err(Error::DimensionMismatch {
                expected: format!("{} columns", params.factors),
                actual: format!("{} columns", data.ncols()),
            });
        }
        if let Some(((row, col), &value)) = data
            .indexed_iter()
            .find(|(idx, v)| **v >= params.levels[idx.1])
        {
            return Err(Error::ValueOutOfRange {
                row,
                col,
                value,
                levels: params.levels[col],
            });
        }
        Ok(Self { data, params })
    }

    /// Build an array from row-major rows.
    ///
    /// With `levels = None` each column's level count is inferred as
    /// `max(max value + 1, 2)`. With explicit levels, entries are checked
    /// against them.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty matrix, ragged rows, a levels vector of
    /// the wrong length, or out-of-range entries. Inferred level counts above
    /// the run count are rejected with `LimitExceeded`.
    ///
    /// ```
    /// use taguchi_doe::oa::OA;
    ///
    /// let oa = OA::from_rows(&[vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]], None, 2).unwrap();
    /// assert_eq!(oa.levels(), &[2, 2]);
    /// ```
    pub fn from_rows(rows: &[Vec<u32>], levels: Option<&[u32]>, strength: u32) -> Result<Self> {
        let data = rows_to_array(rows)?;
        let levels = match levels {
            Some(levels) => levels.to_vec(),
            None => infer_levels(data.view())?,
        };
        let params = OAParams::new_mixed(data.nrows(), levels, strength)?;
        Self::try_new(data, params)
    }

    /// Number of runs (rows).
    #[must_use]
    pub fn runs(&self) -> usize {
        self.params.runs
    }

    /// Number of factors (columns).
    #[must_use]
    pub fn factors(&self) -> usize {
        self.params.factors
    }

    /// Level counts for all factors.
    #[must_use]
    pub fn levels(&self) -> &[u32] {
        &self.params.levels
    }

    /// Level count of one factor.
    ///
    /// # Panics
    ///
    /// Panics if `factor` is out of bounds.
    #[must_use]
    pub fn levels_for(&self, factor: usize) -> u32 {
        self.params.levels[factor]
    }

    /// The common level count, if symmetric.
    #[must_use]
    pub fn symmetric_levels(&self) -> Option<u32> {
        self.params.symmetric_levels()
    }

    /// Declared strength.
    #[must_use]
    pub fn strength(&self) -> u32 {
        self.params.strength
    }

    /// The parameters.
    #[must_use]
    pub fn params(&self) -> &OAParams {
        &self.params
    }

    /// The matrix.
    #[must_use]
    pub fn data(&self) -> &Array2<u32> {
        &self.data
    }

    /// Entry at (row, col).
    ///
    /// # Panics
    ///
    /// Panics if the indices are out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.data[[row, col]]
    }

    /// One run.
    #[must_use]
    pub fn row(&self, idx: usize) -> ArrayView1<'_, u32> {
        self.data.row(idx)
    }

    /// One factor column.
    #[must_use]
    pub fn column(&self, idx: usize) -> ArrayView1<'_, u32> {
        self.data.column(idx)
    }

    /// Row-major copy of the matrix.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<u32>> {
        self.data.rows().into_iter().map(|r| r.to_vec()).collect()
    }

    /// Keep the given columns, in the given order.
    ///
    /// The declared strength is capped at the new column count.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` for an empty selection or an out-of-range column.
    pub fn select_columns(&self, cols: &[usize]) -> Result<Self> {
        if let Some(&bad) = cols.iter().find(|&&c| c >= self.factors()) {
            return Err(Error::invalid_params(format!(
                "column {bad} out of range for {} factors",
                self.factors()
            )));
        }
        let data = self.data.select(ndarray::Axis(1), cols);
        let levels = cols.iter().map(|&c| self.params.levels[c]).collect();
        let strength = self.strength().min(cols.len() as u32);
        let params = OAParams::new_mixed(self.runs(), levels, strength)?;
        Ok(Self { data, params })
    }

    /// Reduce one factor to `new_levels` by mapping `v` to `v % new_levels`.
    ///
    /// When the factor's level count is a power of the same prime as
    /// `new_levels`, this is a linear projection and preserves strength 2.
    ///
    /// # Errors
    ///
    /// Returns an error if the factor is out of range, `new_levels < 2`, or
    /// `new_levels` does not divide the current level count.
    ///
    /// ```
    /// use taguchi_doe::construct::{Bose, Constructor};
    ///
    /// let oa = Bose::try_new(4).unwrap().construct(3).unwrap();
    /// let mixed = oa.collapse_levels(0, 2).unwrap();
    /// assert_eq!(mixed.levels(), &[2, 4, 4]);
    /// ```
    pub fn collapse_levels(&self, factor: usize, new_levels: u32) -> Result<Self> {
        if factor >= self.factors() {
            return Err(Error::invalid_params(format!(
                "factor {factor} out of range for {} factors",
                self.factors()
            )));
        }
        let old = self.params.levels[factor];
        if new_levels < 2 || old % new_levels != 0 {
            return Err(Error::invalid_params(format!(
                "new levels {new_levels} must be at least 2 and divide {old}"
            )));
        }

        let mut data = self.data.clone();
        data.column_mut(factor).mapv_inplace(|v| v % new_levels);
        let mut levels = self.params.levels.clone();
        levels[factor] = new_levels;
        let params = OAParams::new_mixed(self.runs(), levels, self.strength())?;
        Ok(Self { data, params })
    }
}

/// Convert row-major rows into a matrix.
///
/// # Errors
///
/// Returns `InvalidParams` for an empty matrix and `DimensionMismatch` for
/// ragged rows.
pub fn rows_to_array(rows: &[Vec<u32>]) -> Result<Array2<u32>> {
    let cols = rows.first().map_or(0, Vec::len);
    if rows.is_empty() || cols == 0 {
        return Err(Error::invalid_params("matrix must have at least one row and one column"));
    }
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
        return Err(Error::DimensionMismatch {
            expected: format!("{cols} columns"),
            actual: format!("{} columns in row {i}", row.len()),
        });
    }
    let flat: Vec<u32> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), cols), flat)
        .map_err(|e| Error::invalid_params(e.to_string()))
}

/// Level count per column: `max(max entry + 1, 2)`.
///
/// A column cannot carry more levels than there are runs, so no inferred
/// count may exceed `max(runs, 2)`.
///
/// # Errors
///
/// Returns `LimitExceeded` for an entry at or beyond that bound.
pub fn infer_levels(data: ArrayView2<'_, u32>) -> Result<Vec<u32>> {
    let max = data.nrows().max(2) as u64;
    data.columns()
        .into_iter()
        .map(|col| {
            let levels = col.iter().copied().max().map_or(2, |m| m.saturating_add(1).max(2));
            if u64::from(levels) > max {
                return Err(Error::LimitExceeded {
                    what: "levels",
                    value: u64::from(levels),
                    max,
                });
            }
            Ok(levels)
        })
        .collect()
}

impl fmt::Debug for OA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} with data {:?}", self.params, self.data)
    }
}

impl fmt::Display for OA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.params)?;
        for row in self.data.rows() {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            writeln!(f, "  {}", cells.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn l4_rows() -> Vec<Vec<u32>> {
        vec![vec![0, 0, 0], vec![1, 1, 0], vec![0, 1, 1], vec![1, 0, 1]]
    }

    #[test]
    fn test_params_new() {
        let params = OAParams::new(9, 4, 3, 2).unwrap();
        assert_eq!(params.levels, vec![3; 4]);
        assert_eq!(params.symmetric_levels(), Some(3));
        assert!(OAParams::new(9, 4, 1, 2).is_err());
        assert!(OAParams::new(9, 2, 3, 3).is_err());
        assert!(OAParams::new(10, 4, 3, 2).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(OAParams::new(4, 3, 2, 2).unwrap().to_string(), "OA(4, 3, 2, 2)");
        let mixed = OAParams::new_mixed(18, vec![2, 3, 3, 3], 2).unwrap();
        assert_eq!(mixed.to_string(), "OA(18, 2 3^3, 2)");
    }

    #[test]
    fn test_try_new_rejects_out_of_range() {
        let params = OAParams::new(4, 3, 2, 2).unwrap();
        let data = array![[0, 0, 0], [1, 1, 0], [0, 2, 1], [1, 0, 1]];
        let err = OA::try_new(data, params).unwrap_err();
        assert_eq!(
            err,
            Error::ValueOutOfRange {
                row: 2,
                col: 1,
                value: 2,
                levels: 2
            }
        );
    }

    #[test]
    fn test_try_new_rejects_shape() {
        let params = OAParams::new(4, 3, 2, 2).unwrap();
        let data = array![[0, 0], [1, 1], [0, 1], [1, 0]];
        assert!(matches!(
            OA::try_new(data, params),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_from_rows_infers_levels() {
        let oa = OA::from_rows(&[vec![0, 2], vec![1, 0], vec![0, 0]], None, 0).unwrap();
        assert_eq!(oa.levels(), &[2, 3]);

        let constant = OA::from_rows(&[vec![0], vec![0]], None, 0).unwrap();
        assert_eq!(constant.levels(), &[2]);
    }

    #[test]
    fn test_infer_levels_bounded_by_runs() {
        let data = array![[0, 0], [1, 3], [2, 1], [3, 2]];
        assert_eq!(infer_levels(data.view()).unwrap(), vec![4, 4]);

        let single = array![[1]];
        assert_eq!(infer_levels(single.view()).unwrap(), vec![2]);

        let wide = array![[0], [20_000_000]];
        assert!(matches!(
            infer_levels(wide.view()),
            Err(Error::LimitExceeded {
                what: "levels",
                value: 20_000_001,
                max: 2,
            })
        ));
        assert!(matches!(
            OA::from_rows(&[vec![0, 0], vec![1, 4], vec![0, 1]], None, 1),
            Err(Error::LimitExceeded { what: "levels", .. })
        ));
    }

    #[test]
    fn test_from_rows_rejects_ragged_and_empty() {
        assert!(matches!(
            OA::from_rows(&[vec![0, 1], vec![1]], None, 0),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(OA::from_rows(&[], None, 0).is_err());
        assert!(matches!(
            OA::from_rows(&l4_rows(), Some(&[2, 2]), 2),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_select_columns() {
        let oa = OA::from_rows(&l4_rows(), None, 2).unwrap();
        let sub = oa.select_columns(&[2, 0]).unwrap();
        assert_eq!(sub.factors(), 2);
        assert_eq!(sub.column(0).to_vec(), vec![0, 0, 1, 1]);
        assert_eq!(sub.column(1).to_vec(), vec![0, 1, 0, 1]);
        assert!(oa.select_columns(&[3]).is_err());

        let single = oa.select_columns(&[1]).unwrap();
        assert_eq!(single.strength(), 1);
    }

    #[test]
    fn test_collapse_levels() {
        let rows: Vec<Vec<u32>> = (0..4).map(|v| vec![v, v]).collect();
        let oa = OA::from_rows(&rows, Some(&[4, 4]), 1).unwrap();
        let collapsed = oa.collapse_levels(1, 2).unwrap();
        assert_eq!(collapsed.column(1).to_vec(), vec![0, 1, 0, 1]);
        assert_eq!(collapsed.levels(), &[4, 2]);
        assert!(oa.collapse_levels(0, 3).is_err());
        assert!(oa.collapse_levels(5, 2).is_err());
    }

    #[test]
    fn test_to_rows_roundtrip() {
        let oa = OA::from_rows(&l4_rows(), None, 2).unwrap();
        assert_eq!(oa.to_rows(), l4_rows());
        assert!(oa.to_string().starts_with("OA(4, 3, 2, 2)"));
    }
}
