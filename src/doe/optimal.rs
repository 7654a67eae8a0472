//! Optimal settings prediction for DOE.
//!
//! The S/N optimum picks each factor's level. Predictions use Taguchi's
//! additive model over the factors that survived pooling; pooled factors
//! contribute no deviation.

use std::collections::BTreeMap;

use super::stats::t_value;
use super::types::{ANOVAResult, ConfidenceInterval, MainEffect, OptimalSettings, SNRatioEffect};

/// Taguchi's effective number of replications for a prediction:
/// `observations / (1 + Σ DF of the factors in the prediction)`.
///
/// ```
/// use taguchi_doe::doe::effective_sample_size;
///
/// // L9 with two unpooled 3-level factors, unreplicated.
/// assert!((effective_sample_size(9, 4) - 1.8).abs() < 1e-12);
/// ```
#[must_use]
pub fn effective_sample_size(observations: usize, unpooled_df: usize) -> f64 {
    observations as f64 / (1.0 + unpooled_df as f64)
}

/// Calculate optimal settings from the analysis stages.
///
/// - Predicted mean = `ȳ + Σ_unpooled (ȳ_opt - ȳ)`
/// - Predicted S/N = `η̄ + Σ_unpooled (η_opt - η̄)`
///
/// `main_effects`, `sn_ratio_effects` and `anova.entries` are in column
/// order. `observations` is `N·r`.
#[must_use]
pub fn predict_optimal(
    main_effects: &[MainEffect],
    sn_ratio_effects: &[SNRatioEffect],
    grand_mean: f64,
    sn_grand_mean: f64,
    anova: &ANOVAResult,
    observations: usize,
    confidence_level: f64,
) -> OptimalSettings {
    let level_indices: Vec<usize> = sn_ratio_effects.iter().map(|e| e.optimal_level).collect();
    let factor_levels: BTreeMap<String, usize> = sn_ratio_effects
        .iter()
        .map(|e| (e.factor_id.clone(), e.optimal_level))
        .collect();

    let mut predicted_mean = grand_mean;
    let mut predicted_sn_ratio = sn_grand_mean;
    for ((me, sn), entry) in main_effects.iter().zip(sn_ratio_effects).zip(&anova.entries) {
        if entry.pooled {
            continue;
        }
        let level = sn.optimal_level;
        predicted_mean += me.level_effects.get(level).copied().unwrap_or(0.0);
        predicted_sn_ratio += sn
            .level_sn_ratios
            .get(level)
            .map_or(0.0, |eta| eta - sn_grand_mean);
    }

    let unpooled_df: usize = anova.unpooled().map(|e| e.degrees_of_freedom).sum();
    let effective_sample_size = effective_sample_size(observations, unpooled_df);

    let confidence_interval = confidence_interval(
        predicted_mean,
        anova,
        effective_sample_size,
        confidence_level,
    );

    OptimalSettings {
        factor_levels,
        level_indices,
        predicted_mean,
        predicted_sn_ratio,
        effective_sample_size,
        confidence_interval,
    }
}

/// `ŷ ± t(df_e) · sqrt(MS_e / n_eff)`; absent without an error estimate.
fn confidence_interval(
    predicted_mean: f64,
    anova: &ANOVAResult,
    n_eff: f64,
    confidence_level: f64,
) -> Option<ConfidenceInterval> {
    if anova.error_ms <= 0.0 || anova.error_df == 0 || n_eff <= 0.0 {
        return None;
    }
    let t = t_value(confidence_level, anova.error_df)?;
    let margin = t * (anova.error_ms / n_eff).sqrt();

    Some(ConfidenceInterval {
        lower: predicted_mean - margin,
        upper: predicted_mean + margin,
        level: confidence_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doe::types::ANOVAEntry;

    fn main_effects() -> Vec<MainEffect> {
        vec![
            MainEffect {
                factor_index: 0,
                factor_id: "temp".into(),
                factor_name: "Temperature".into(),
                level_means: vec![10.0, 20.0, 30.0],
                level_effects: vec![-10.0, 0.0, 10.0],
                range: 20.0,
                rank: 2,
            },
            MainEffect {
                factor_index: 1,
                factor_id: "time".into(),
                factor_name: "Time".into(),
                level_means: vec![5.0, 20.0, 35.0],
                level_effects: vec![-15.0, 0.0, 15.0],
                range: 30.0,
                rank: 1,
            },
        ]
    }

    fn sn_effects() -> Vec<SNRatioEffect> {
        vec![
            SNRatioEffect {
                factor_index: 0,
                factor_id: "temp".into(),
                factor_name: "Temperature".into(),
                level_sn_ratios: vec![25.0, 28.0, 31.0],
                range: 6.0,
                optimal_level: 2,
            },
            SNRatioEffect {
                factor_index: 1,
                factor_id: "time".into(),
                factor_name: "Time".into(),
                level_sn_ratios: vec![24.0, 27.0, 33.0],
                range: 9.0,
                optimal_level: 2,
            },
        ]
    }

    fn entry(factor_index: usize, ss: f64, pooled: bool) -> ANOVAEntry {
        ANOVAEntry {
            factor_index,
            factor_id: format!("F{}", factor_index + 1),
            factor_name: format!("Factor {}", factor_index + 1),
            sum_of_squares: ss,
            degrees_of_freedom: 2,
            mean_square: ss / 2.0,
            f_ratio: None,
            p_value: None,
            contribution_percent: None,
            pooled,
        }
    }

    fn anova(pooled: [bool; 2]) -> ANOVAResult {
        ANOVAResult {
            entries: vec![entry(0, 200.0, pooled[0]), entry(1, 300.0, pooled[1])],
            error_ss: 20.0,
            error_df: 4,
            error_ms: 5.0,
            total_ss: 520.0,
            total_df: 8,
        }
    }

    #[test]
    fn test_additive_model() {
        let optimal = predict_optimal(&main_effects(), &sn_effects(), 20.0, 28.0, &anova([false; 2]), 9, 0.95);

        assert_eq!(optimal.level_indices, vec![2, 2]);
        assert_eq!(optimal.factor_levels["temp"], 2);
        // 20 + 10 + 15
        assert!((optimal.predicted_mean - 45.0).abs() < 1e-10);
        // 28 + (31 - 28) + (33 - 28)
        assert!((optimal.predicted_sn_ratio - 36.0).abs() < 1e-10);
        // 9 / (1 + 4)
        assert!((optimal.effective_sample_size - 1.8).abs() < 1e-12);
    }

    #[test]
    fn test_pooled_factor_excluded() {
        let optimal = predict_optimal(&main_effects(), &sn_effects(), 20.0, 28.0, &anova([true, false]), 9, 0.95);
        assert!((optimal.predicted_mean - 35.0).abs() < 1e-10);
        assert!((optimal.predicted_sn_ratio - 33.0).abs() < 1e-10);
        assert!((optimal.effective_sample_size - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_interval_width() {
        let optimal = predict_optimal(&main_effects(), &sn_effects(), 20.0, 28.0, &anova([false; 2]), 9, 0.95);
        let ci = optimal.confidence_interval.unwrap();

        // t(0.975, 4) = 2.776, sqrt(5 / 1.8) = 1.6667
        let half = (ci.upper - ci.lower) / 2.0;
        assert!((half - 2.776_445 * (5.0_f64 / 1.8).sqrt()).abs() < 1e-3);
        assert!(((ci.lower + ci.upper) / 2.0 - optimal.predicted_mean).abs() < 1e-10);
        assert!((ci.level - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_no_interval_without_error() {
        let mut no_error = anova([false; 2]);
        no_error.error_ms = 0.0;
        no_error.error_ss = 0.0;
        let optimal = predict_optimal(&main_effects(), &sn_effects(), 20.0, 28.0, &no_error, 9, 0.95);
        assert!(optimal.confidence_interval.is_none());
    }
}
