//! Signal-to-noise ratios.
//!
//! Each run's replicates reduce to one S/N value in dB:
//!
//! - Larger-is-better: η = -10·log₁₀(mean(1/y²))
//! - Smaller-is-better: η = -10·log₁₀(mean(y²))
//! - Nominal-is-best: η = 10·log₁₀(ȳ² / mean((y - T)²))
//!
//! Every value is clamped to [`SN_FLOOR_DB`, `SN_CEILING_DB`]. A nominal run
//! that hits its target exactly has no deviation and takes the ceiling. The
//! clamped values feed level means like any other number.

use ndarray::{ArrayView1, ArrayView2, Axis};
use tracing::warn;

use super::main_effects::{level_means, spread};
use super::types::{FactorLabel, OptimizationType, SNRatioEffect};
use crate::error::{Error, Result};

/// Upper clamp for S/N values (dB).
pub const SN_CEILING_DB: f64 = 100.0;
/// Lower clamp for S/N values (dB).
pub const SN_FLOOR_DB: f64 = -100.0;

/// S/N ratio of one run.
///
/// # Errors
///
/// Returns `InvalidParams` for empty input or a nominal-is-best type without a
/// target, and `DegenerateStatistics` if the ratio is undefined (NaN).
pub fn calculate_sn_ratio(
    values: ArrayView1<'_, f64>,
    optimization_type: OptimizationType,
    target_value: Option<f64>,
) -> Result<f64> {
    if values.is_empty() {
        return Err(Error::invalid_params("S/N ratio needs at least one value"));
    }
    let n = values.len() as f64;

    let raw = match optimization_type {
        OptimizationType::LargerIsBetter => {
            let mean_inv_sq = values.iter().map(|y| 1.0 / (y * y)).sum::<f64>() / n;
            -10.0 * mean_inv_sq.log10()
        }
        OptimizationType::SmallerIsBetter => {
            let mean_sq = values.iter().map(|y| y * y).sum::<f64>() / n;
            -10.0 * mean_sq.log10()
        }
        OptimizationType::NominalIsBest => {
            let target = target_value
                .ok_or_else(|| Error::invalid_params("nominal-is-best requires a target value"))?;
            let mean = values.sum() / n;
            let msd = values.iter().map(|y| (y - target).powi(2)).sum::<f64>() / n;
            if msd == 0.0 {
                SN_CEILING_DB
            } else {
                10.0 * (mean * mean / msd).log10()
            }
        }
    };

    if raw.is_nan() {
        return Err(Error::degenerate(format!(
            "S/N ratio is undefined for responses {values}"
        )));
    }
    Ok(raw.clamp(SN_FLOOR_DB, SN_CEILING_DB))
}

/// S/N ratio for every run (row) of `responses`.
///
/// # Errors
///
/// See [`calculate_sn_ratio`].
pub fn run_sn_ratios(
    responses: ArrayView2<'_, f64>,
    optimization_type: OptimizationType,
    target_value: Option<f64>,
) -> Result<Vec<f64>> {
    responses
        .axis_iter(Axis(0))
        .enumerate()
        .map(|(run, row)| {
            let sn = calculate_sn_ratio(row, optimization_type, target_value)?;
            if sn == SN_FLOOR_DB || sn == SN_CEILING_DB {
                warn!(run, sn, "S/N ratio clamped");
            }
            Ok(sn)
        })
        .collect()
}

/// Per-factor level means of the run S/N ratios.
///
/// # Errors
///
/// Returns `InvalidParams` if a declared level never occurs in its column.
pub fn calculate_sn_effects(
    array_data: ArrayView2<'_, u32>,
    levels: &[u32],
    run_sn: &[f64],
    labels: &[FactorLabel],
) -> Result<Vec<SNRatioEffect>> {
    levels
        .iter()
        .zip(labels)
        .enumerate()
        .map(|(factor_index, (&s, label))| {
            let column = array_data.column(factor_index);
            let (level_sn_ratios, _) = level_means(column.iter().copied(), s, run_sn, factor_index)?;

            // First maximum wins.
            let optimal_level = level_sn_ratios
                .iter()
                .enumerate()
                .fold(0, |best, (l, &v)| if v > level_sn_ratios[best] { l } else { best });

            Ok(SNRatioEffect {
                factor_index,
                factor_id: label.id.clone(),
                factor_name: label.name.clone(),
                range: spread(&level_sn_ratios),
                level_sn_ratios,
                optimal_level,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2};

    fn sn(values: &[f64], t: OptimizationType, target: Option<f64>) -> Result<f64> {
        calculate_sn_ratio(Array1::from(values.to_vec()).view(), t, target)
    }

    #[test]
    fn test_larger_is_better() {
        // Single value: -10·log10(1/y²) = 20·log10(y)
        let v = sn(&[10.0], OptimizationType::LargerIsBetter, None).unwrap();
        assert!((v - 20.0).abs() < 1e-9);
        let v = sn(&[10.0, 100.0], OptimizationType::LargerIsBetter, None).unwrap();
        let expected = -10.0 * ((0.01 + 0.0001) / 2.0_f64).log10();
        assert!((v - expected).abs() < 1e-9);
    }

    #[test]
    fn test_smaller_is_better() {
        let v = sn(&[1.0, 3.0], OptimizationType::SmallerIsBetter, None).unwrap();
        assert!((v + 10.0 * 5.0_f64.log10()).abs() < 1e-9);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(
            sn(&[0.0, 5.0], OptimizationType::LargerIsBetter, None).unwrap(),
            SN_FLOOR_DB
        );
        assert_eq!(
            sn(&[0.0, 0.0], OptimizationType::SmallerIsBetter, None).unwrap(),
            SN_CEILING_DB
        );
        assert_eq!(
            sn(&[5.0, 5.0], OptimizationType::NominalIsBest, Some(5.0)).unwrap(),
            SN_CEILING_DB
        );
    }

    #[test]
    fn test_nominal_is_best_uses_target() {
        // ȳ = 10, mean((y - 12)²) = (4 + 4) / 2 = 4
        let v = sn(&[10.0, 10.0], OptimizationType::NominalIsBest, Some(12.0)).unwrap();
        assert!((v - 10.0 * 25.0_f64.log10()).abs() < 1e-9);
        assert!(sn(&[10.0], OptimizationType::NominalIsBest, None).is_err());
    }

    #[test]
    fn test_sn_effects_optimal_level() {
        let data: Array2<u32> = array![[0, 0], [0, 1], [1, 0], [1, 1]];
        let run_sn = [20.0, 26.0, 29.0, 32.0];
        let labels: Vec<_> = (0..2).map(FactorLabel::default_for).collect();
        let effects = calculate_sn_effects(data.view(), &[2, 2], &run_sn, &labels).unwrap();
        assert_eq!(effects[0].optimal_level, 1);
        assert!((effects[0].level_sn_ratios[0] - 23.0).abs() < 1e-9);

        // Ties resolve to the lowest level.
        let flat = [10.0; 4];
        let effects = calculate_sn_effects(data.view(), &[2, 2], &flat, &labels).unwrap();
        assert!(effects.iter().all(|e| e.optimal_level == 0));
    }

    #[test]
    fn test_run_sn_ratios_rows() {
        let responses = array![[10.0], [100.0]];
        let sn = run_sn_ratios(responses.view(), OptimizationType::LargerIsBetter, None).unwrap();
        assert!((sn[0] - 20.0).abs() < 1e-9);
        assert!((sn[1] - 40.0).abs() < 1e-9);
    }
}
