//! Strength verification.
//!
//! For strength t every combination of t columns must contain each possible
//! level tuple exactly `N / ∏ levels` times. The scan walks t upward from 1
//! and stops at the first t that fails, so the reported actual strength is
//! the largest t for which every t-subset is balanced.
//!
//! Work is bounded: before scanning strength t the scan adds `C(k, t) · N`
//! row visits to a running total and fails fast with `LimitExceeded` once the
//! total passes [`Limits::max_verification_work`].

use ndarray::ArrayView2;
use serde::{Serialize, Serializer};
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::OA;
use crate::config::Limits;
use crate::error::{Error, Result};
use crate::utils::{binomial, combinations};

/// Result of verifying a matrix against a claimed strength.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    /// Whether the matrix has at least the claimed strength.
    pub is_valid: bool,
    /// The claimed strength.
    pub claimed_strength: u32,
    /// Largest strength for which every column subset is balanced.
    pub actual_strength: u32,
    /// One entry per out-of-range value or per unbalanced column combination.
    pub issues: Vec<VerificationIssue>,
}

/// A specific defect found during verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationIssue {
    /// An entry lies outside its column's declared levels.
    ValueOutOfRange {
        /// Row of the entry.
        row: usize,
        /// Column of the entry.
        col: usize,
        /// The entry.
        value: u32,
        /// Declared level count of the column.
        levels: u32,
    },
    /// A column combination does not contain every tuple equally often.
    BalanceViolation {
        /// The offending columns.
        columns: Vec<usize>,
        /// `N / ∏ levels`, or `None` when N is not divisible.
        expected_count: Option<usize>,
        /// Fewest occurrences of any possible tuple.
        min_count: usize,
        /// Most occurrences of any possible tuple.
        max_count: usize,
    },
}

/// Location of an issue within the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLocation {
    /// Row index, when the issue is a single cell.
    pub row: Option<usize>,
    /// Column index, when the issue is a single cell.
    pub col: Option<usize>,
    /// Columns involved, when the issue spans a combination.
    pub columns: Option<Vec<usize>>,
}

impl VerificationIssue {
    /// Short category label.
    #[must_use]
    pub fn issue_type(&self) -> &'static str {
        match self {
            Self::ValueOutOfRange { .. } => "Value Out of Range",
            Self::BalanceViolation { .. } => "Balance Violation",
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::ValueOutOfRange {
                row,
                col,
                value,
                levels,
            } => format!(
                "Value {value} at row {row}, column {col} is outside the valid range 0..{levels}"
            ),
            Self::BalanceViolation {
                columns,
                expected_count: Some(expected),
                min_count,
                max_count,
            } => format!(
                "Columns {columns:?} are not balanced: each tuple should appear {expected} times, observed between {min_count} and {max_count}"
            ),
            Self::BalanceViolation {
                columns,
                expected_count: None,
                ..
            } => format!(
                "Columns {columns:?} cannot be balanced: the run count is not divisible by the product of their levels"
            ),
        }
    }

    /// Where the issue sits.
    #[must_use]
    pub fn location(&self) -> IssueLocation {
        match self {
            Self::ValueOutOfRange { row, col, .. } => IssueLocation {
                row: Some(*row),
                col: Some(*col),
                columns: None,
            },
            Self::BalanceViolation { columns, .. } => IssueLocation {
                row: None,
                col: None,
                columns: Some(columns.clone()),
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssueWire {
    issue_type: &'static str,
    description: String,
    location: Option<IssueLocation>,
}

impl Serialize for VerificationIssue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        IssueWire {
            issue_type: self.issue_type(),
            description: self.description(),
            location: Some(self.location()),
        }
        .serialize(serializer)
    }
}

/// Verify that `data` has the claimed strength under the given levels.
///
/// Out-of-range entries are reported as issues and skip the scan. Otherwise
/// strengths `1..=max_check` are scanned; when the first failing strength is
/// at or below `claimed`, the issues list holds one entry per unbalanced
/// combination at that strength.
///
/// # Errors
///
/// Returns `DimensionMismatch` if `levels` does not match the column count,
/// `InvalidParams` if `claimed` exceeds `max_check` or the column count, and
/// `LimitExceeded` if `max_check` is above `limits.max_check` or the scan
/// would exceed the work bound.
///
/// ```
/// use taguchi_doe::config::Limits;
/// use taguchi_doe::oa::{verify_matrix, OA};
///
/// let l4 = OA::from_rows(&[vec![0, 0, 0], vec![1, 1, 0], vec![0, 1, 1], vec![1, 0, 1]], None, 2).unwrap();
/// let report = verify_matrix(l4.data().view(), l4.levels(), 2, 3, &Limits::default()).unwrap();
/// assert!(report.is_valid);
/// assert_eq!(report.actual_strength, 2);
/// ```
pub fn verify_matrix(
    data: ArrayView2<'_, u32>,
    levels: &[u32],
    claimed: u32,
    max_check: u32,
    limits: &Limits,
) -> Result<VerificationReport> {
    check_shape(data, levels)?;
    check_max_check(max_check, limits)?;
    if claimed > max_check {
        return Err(Error::invalid_params(format!(
            "claimed strength {claimed} exceeds the checked maximum {max_check}"
        )));
    }
    if claimed as usize > data.ncols() {
        return Err(Error::invalid_params(format!(
            "strength {claimed} cannot exceed factors {}",
            data.ncols()
        )));
    }

    let range_issues: Vec<VerificationIssue> = data
        .indexed_iter()
        .filter(|(idx, v)| **v >= levels[idx.1])
        .map(|((row, col), &value)| VerificationIssue::ValueOutOfRange {
            row,
            col,
            value,
            levels: levels[col],
        })
        .collect();
    if !range_issues.is_empty() {
        return Ok(VerificationReport {
            is_valid: false,
            claimed_strength: claimed,
            actual_strength: 0,
            issues: range_issues,
        });
    }

    let (actual, mut issues) = scan(data, levels, max_check, limits)?;
    if actual >= claimed {
        issues.clear();
    }
    debug!(claimed, actual, issues = issues.len(), "verified matrix");

    Ok(VerificationReport {
        is_valid: actual >= claimed,
        claimed_strength: claimed,
        actual_strength: actual,
        issues,
    })
}

/// Largest t ≤ `max_check` for which the matrix is balanced on every t-subset.
///
/// Returns 0 when even single columns are unbalanced or an entry is out of range.
///
/// # Errors
///
/// Returns `LimitExceeded` if `max_check` is above `limits.max_check` or the
/// scan would exceed the work bound, and `DimensionMismatch` if `levels` does
/// not match the column count.
pub fn compute_strength(
    data: ArrayView2<'_, u32>,
    levels: &[u32],
    max_check: u32,
    limits: &Limits,
) -> Result<u32> {
    check_shape(data, levels)?;
    check_max_check(max_check, limits)?;
    if data.indexed_iter().any(|(idx, v)| *v >= levels[idx.1]) {
        return Ok(0);
    }
    let (actual, _) = scan(data, levels, max_check, limits)?;
    Ok(actual)
}

impl OA {
    /// Verify this array against its declared strength.
    ///
    /// # Errors
    ///
    /// See [`verify_matrix`].
    pub fn verify(&self, limits: &Limits) -> Result<VerificationReport> {
        let strength = self.strength();
        verify_matrix(self.data().view(), self.levels(), strength, strength, limits)
    }
}

fn check_shape(data: ArrayView2<'_, u32>, levels: &[u32]) -> Result<()> {
    if levels.len() != data.ncols() {
        return Err(Error::DimensionMismatch {
            expected: format!("{} level counts", data.ncols()),
            actual: format!("{} level counts", levels.len()),
        });
    }
    Ok(())
}

fn check_max_check(requested: u32, limits: &Limits) -> Result<()> {
    if requested > limits.max_check {
        return Err(Error::LimitExceeded {
            what: "strength to check",
            value: u64::from(requested),
            max: u64::from(limits.max_check),
        });
    }
    Ok(())
}

/// Scan t = 1..=min(t_max, k); return the last balanced t and the issues of
/// the first failing t.
fn scan(
    data: ArrayView2<'_, u32>,
    levels: &[u32],
    t_max: u32,
    limits: &Limits,
) -> Result<(u32, Vec<VerificationIssue>)> {
    let runs = data.nrows();
    let factors = data.ncols();
    let top = (t_max as usize).min(factors);
    let mut work: u64 = 0;

    for t in 1..=top {
        let combos = binomial(factors as u64, t as u64).unwrap_or(u64::MAX);
        work = work.saturating_add(combos.saturating_mul(runs as u64));
        if work > limits.max_verification_work {
            return Err(Error::LimitExceeded {
                what: "verification work",
                value: work,
                max: limits.max_verification_work,
            });
        }

        #[cfg(feature = "parallel")]
        let issues: Vec<VerificationIssue> = combinations(factors, t)
            .collect::<Vec<_>>()
            .into_par_iter()
            .filter_map(|cols| check_combination(data, levels, cols))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let issues: Vec<VerificationIssue> = combinations(factors, t)
            .filter_map(|cols| check_combination(data, levels, cols))
            .collect();

        if !issues.is_empty() {
            return Ok(((t - 1) as u32, issues));
        }
    }

    Ok((top as u32, Vec::new()))
}

/// Count every level tuple over `cols`; `None` when balanced.
fn check_combination(
    data: ArrayView2<'_, u32>,
    levels: &[u32],
    cols: Vec<usize>,
) -> Option<VerificationIssue> {
    let runs = data.nrows();
    let possible = cols
        .iter()
        .try_fold(1usize, |acc, &c| acc.checked_mul(levels[c] as usize));

    let possible = match possible {
        Some(p) if p <= runs && runs % p == 0 => p,
        _ => {
            return Some(VerificationIssue::BalanceViolation {
                columns: cols,
                expected_count: None,
                min_count: 0,
                max_count: 0,
            })
        }
    };

    // Mixed-radix index of each row's tuple.
    let mut counts = vec![0usize; possible];
    for row in data.rows() {
        let idx = cols
            .iter()
            .fold(0usize, |acc, &c| acc * levels[c] as usize + row[c] as usize);
        counts[idx] += 1;
    }

    let expected = runs / possible;
    let min_count = counts.iter().copied().min().unwrap_or(0);
    let max_count = counts.iter().copied().max().unwrap_or(0);
    (min_count != expected || max_count != expected).then(|| VerificationIssue::BalanceViolation {
        columns: cols,
        expected_count: Some(expected),
        min_count,
        max_count,
    })
}
