//! Degrees-of-freedom bookkeeping for a design.
//!
//! `total = N - 1`, `factor_i = s_i - 1`, `error = total - Σ factor_i`. A
//! design with `error ≤ 0` is saturated: its error term can only come from
//! replication or pooling.
//!
//! ```
//! use taguchi_doe::accounting::DesignAccounting;
//!
//! // L4 with three two-level factors uses every degree of freedom.
//! let acc = DesignAccounting::new(4, &[2, 2, 2]);
//! assert!(acc.saturated);
//! assert_eq!(acc.min_replicates, 2);
//! assert_eq!(acc.error_df_with_replicates(2), 4);
//! ```

use serde::{Deserialize, Serialize};

use crate::oa::OA;

/// Degrees-of-freedom summary of a design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignAccounting {
    /// Number of runs N.
    pub runs: usize,
    /// `N - 1`.
    pub total_df: i64,
    /// `s_i - 1` per factor.
    pub factor_df: Vec<i64>,
    /// `total_df - Σ factor_df`; may be negative.
    pub error_df: i64,
    /// Whether `error_df ≤ 0`.
    pub saturated: bool,
    /// Fewest replicates giving positive error df: 1 when not saturated,
    /// otherwise at least 2.
    pub min_replicates: usize,
}

impl DesignAccounting {
    /// Account for a design with `runs` rows and the given level counts.
    #[must_use]
    pub fn new(runs: usize, levels: &[u32]) -> Self {
        let total_df = runs as i64 - 1;
        let factor_df: Vec<i64> = levels.iter().map(|&s| i64::from(s) - 1).collect();
        let used: i64 = factor_df.iter().sum();
        let error_df = total_df - used;
        let saturated = error_df <= 0;

        // N·r - 1 - Σdf > 0  ⇔  r > (Σdf + 1) / N
        let min_replicates = if !saturated {
            1
        } else if runs == 0 {
            usize::MAX
        } else {
            let needed = (used + 1) as usize / runs + 1;
            needed.max(2)
        };

        Self {
            runs,
            total_df,
            factor_df,
            error_df,
            saturated,
            min_replicates,
        }
    }

    /// Account for an array.
    #[must_use]
    pub fn for_array(oa: &OA) -> Self {
        Self::new(oa.runs(), oa.levels())
    }

    /// Total factor degrees of freedom.
    #[must_use]
    pub fn factor_df_sum(&self) -> i64 {
        self.factor_df.iter().sum()
    }

    /// Error df once each run is replicated `replicates` times:
    /// `N·r - 1 - Σ factor_df`.
    #[must_use]
    pub fn error_df_with_replicates(&self, replicates: usize) -> i64 {
        (self.runs * replicates) as i64 - 1 - self.factor_df_sum()
    }
}
