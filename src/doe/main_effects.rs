//! Main effects calculation.
//!
//! For each factor, the mean run response at each level, its deviation from
//! the grand mean, and the range of the level means. Factors are ranked by
//! range, largest first; equal ranges keep column order.

use ndarray::ArrayView2;

use super::types::{FactorLabel, MainEffect};
use crate::error::{Error, Result};

/// Per-level means of `values` grouped by one design column.
///
/// Returns the means and the number of runs at each level.
///
/// # Errors
///
/// Returns `InvalidParams` if any level in `0..levels` never occurs.
pub(crate) fn level_means(
    column: impl IntoIterator<Item = u32>,
    levels: u32,
    values: &[f64],
    factor: usize,
) -> Result<(Vec<f64>, Vec<usize>)> {
    let s = levels as usize;
    let mut sums = vec![0.0; s];
    let mut counts = vec![0usize; s];
    for (level, &v) in column.into_iter().zip(values) {
        let l = level as usize;
        if l >= s {
            return Err(Error::invalid_params(format!(
                "factor {factor} has level {level} outside 0..{levels}"
            )));
        }
        sums[l] += v;
        counts[l] += 1;
    }
    if let Some(missing) = counts.iter().position(|&c| c == 0) {
        return Err(Error::invalid_params(format!(
            "level {missing} of factor {factor} never occurs in the design"
        )));
    }
    let means = sums.iter().zip(&counts).map(|(s, &c)| s / c as f64).collect();
    Ok((means, counts))
}

/// `max - min` of a non-empty slice.
pub(crate) fn spread(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    max - min
}

/// Calculate main effects for each factor.
///
/// # Errors
///
/// Returns `InvalidParams` if a declared level never occurs in its column.
pub fn calculate_main_effects(
    array_data: ArrayView2<'_, u32>,
    levels: &[u32],
    run_means: &[f64],
    grand_mean: f64,
    labels: &[FactorLabel],
) -> Result<Vec<MainEffect>> {
    let mut effects = Vec::with_capacity(levels.len());

    for (factor_index, (&s, label)) in levels.iter().zip(labels).enumerate() {
        let column = array_data.column(factor_index);
        let (level_means, _) = level_means(column.iter().copied(), s, run_means, factor_index)?;
        let level_effects = level_means.iter().map(|m| m - grand_mean).collect();
        let range = spread(&level_means);

        effects.push(MainEffect {
            factor_index,
            factor_id: label.id.clone(),
            factor_name: label.name.clone(),
            level_means,
            level_effects,
            range,
            rank: 0,
        });
    }

    // Stable sort: ties keep column order.
    let mut order: Vec<usize> = (0..effects.len()).collect();
    order.sort_by(|&a, &b| effects[b].range.total_cmp(&effects[a].range));
    for (rank, idx) in order.into_iter().enumerate() {
        effects[idx].rank = rank + 1;
    }

    Ok(effects)
}
