//! Balance and correlation diagnostics.

use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView2, Axis};
use serde::Serialize;

use super::OA;

/// Per-column level balance of a matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    /// Whether each column shows every level exactly `N / s` times.
    pub factor_balance: Vec<bool>,
    /// Occurrences of each declared level per column, zero counts included.
    pub level_counts: Vec<BTreeMap<u32, usize>>,
    /// `N / s` for each column (rounded down).
    pub expected_counts: Vec<usize>,
    /// The common expected count, when every column has the same level count.
    pub expected_count: Option<usize>,
}

impl BalanceReport {
    /// Whether every column is balanced.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.factor_balance.iter().all(|&b| b)
    }
}

/// Count level occurrences per column.
///
/// Values at or above a column's declared level count are counted under their
/// own key and make the column unbalanced.
#[must_use]
pub fn balance_report(data: ArrayView2<'_, u32>, levels: &[u32]) -> BalanceReport {
    let runs = data.nrows();
    let mut factor_balance = Vec::with_capacity(levels.len());
    let mut level_counts = Vec::with_capacity(levels.len());
    let mut expected_counts = Vec::with_capacity(levels.len());

    for (column, &s) in data.axis_iter(Axis(1)).zip(levels) {
        let mut counts: BTreeMap<u32, usize> = (0..s).map(|l| (l, 0)).collect();
        for &v in column {
            *counts.entry(v).or_insert(0) += 1;
        }

        let expected = runs / s.max(1) as usize;
        let balanced = s > 0
            && runs % s as usize == 0
            && counts.len() == s as usize
            && counts.values().all(|&c| c == expected);

        factor_balance.push(balanced);
        level_counts.push(counts);
        expected_counts.push(expected);
    }

    let expected_count = match expected_counts.split_first() {
        Some((first, rest)) if levels.windows(2).all(|w| w[0] == w[1]) => {
            debug_assert!(rest.iter().all(|e| e == first));
            Some(*first)
        }
        _ => None,
    };

    BalanceReport {
        factor_balance,
        level_counts,
        expected_counts,
        expected_count,
    }
}

/// Pearson correlation between columns, levels treated as numbers.
///
/// The diagonal is 1. Pairs involving a constant column are 0. For arrays of
/// strength 2 or more all off-diagonal entries are 0.
#[must_use]
pub fn correlation_matrix(data: ArrayView2<'_, u32>) -> Array2<f64> {
    let k = data.ncols();
    let centered = {
        let values = data.mapv(f64::from);
        let means = values.mean_axis(Axis(0));
        match means {
            Some(m) => values - &m,
            None => values,
        }
    };
    let norms: Vec<f64> = centered
        .axis_iter(Axis(1))
        .map(|c| c.dot(&c).sqrt())
        .collect();

    let mut corr = Array2::zeros((k, k));
    for i in 0..k {
        corr[[i, i]] = 1.0;
        for j in (i + 1)..k {
            let r = if norms[i] > 0.0 && norms[j] > 0.0 {
                centered.column(i).dot(&centered.column(j)) / (norms[i] * norms[j])
            } else {
                0.0
            };
            corr[[i, j]] = r;
            corr[[j, i]] = r;
        }
    }
    corr
}

impl OA {
    /// Balance report for this array.
    #[must_use]
    pub fn balance_report(&self) -> BalanceReport {
        balance_report(self.data().view(), self.levels())
    }

    /// Column correlation matrix for this array.
    #[must_use]
    pub fn correlation_matrix(&self) -> Array2<f64> {
        correlation_matrix(self.data().view())
    }
}
