//! DOE (Design of Experiments) analysis module.
//!
//! This module provides complete Taguchi DOE analysis including:
//! - Response aggregation (run means, grand mean)
//! - Main effects calculation
//! - Signal-to-Noise ratio analysis
//! - ANOVA with factor pooling
//! - Optimal settings prediction with confidence intervals
//!
//! ## Quick Start
//!
//! ```rust
//! use ndarray::array;
//! use taguchi_doe::catalogue;
//! use taguchi_doe::doe::{analyze, AnalysisConfig, OptimizationType};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let oa = catalogue::get("L9")?;
//!
//! // 9 runs, 2 replicates each
//! let responses = array![
//!     [85.0, 86.0],
//!     [92.0, 91.0],
//!     [78.0, 79.0],
//!     [91.0, 90.0],
//!     [88.0, 89.0],
//!     [82.0, 83.0],
//!     [89.0, 88.0],
//!     [86.0, 87.0],
//!     [94.0, 93.0],
//! ];
//!
//! let config = AnalysisConfig {
//!     optimization_type: OptimizationType::LargerIsBetter,
//!     ..Default::default()
//! };
//! let result = analyze(&oa, &responses, &config)?;
//!
//! println!("Grand mean: {:.2}", result.grand_mean);
//! println!("Optimal levels: {:?}", result.optimal_settings.level_indices);
//! # Ok(())
//! # }
//! ```
//!
//! ## Analysis Types
//!
//! ### Main Effects
//!
//! Main effects measure how changing a factor level affects the response.
//! Factors are ranked by their effect range (larger range = more influence).
//!
//! ### S/N Ratios
//!
//! Signal-to-Noise ratios measure both mean and variation:
//! - **Larger-is-better**: Maximize response
//! - **Smaller-is-better**: Minimize response
//! - **Nominal-is-best**: Hit a target with minimum variance
//!
//! ### ANOVA
//!
//! Analysis of Variance partitions total variation into factor terms and an
//! error term. Saturated designs need replicates or pooling.
//!
//! ### Optimal Settings
//!
//! The S/N optimum chooses each level. Predictions add the unpooled factors'
//! deviations to the grand means.

mod anova;
mod experiment;
mod main_effects;
mod optimal;
mod responses;
mod sn_ratios;
mod stats;
mod types;

pub use anova::calculate_anova;
pub use experiment::{analyze_experiment, ExperimentConfig, FactorSpec, LevelValue, ResponseSpec};
pub use main_effects::calculate_main_effects;
pub use optimal::{effective_sample_size, predict_optimal};
pub use responses::{response_matrix, MeasurementSet};
pub use sn_ratios::{calculate_sn_effects, calculate_sn_ratio, run_sn_ratios, SN_CEILING_DB, SN_FLOOR_DB};
pub use stats::{f_distribution_p_value, t_value};
pub use types::{
    ANOVAEntry, ANOVAResult, AnalysisConfig, ConfidenceInterval, DOEAnalysis, FactorLabel,
    MainEffect, OptimalSettings, OptimizationType, SNRatioEffect,
};

use ndarray::Array2;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::oa::OA;

/// Run complete DOE analysis with default factor labels (`F1`, `F2`, ...).
///
/// `responses` is runs × replicates with every entry present.
///
/// # Errors
///
/// See [`analyze_labeled`].
pub fn analyze(oa: &OA, responses: &Array2<f64>, config: &AnalysisConfig) -> Result<DOEAnalysis> {
    let labels: Vec<FactorLabel> = (0..oa.factors()).map(FactorLabel::default_for).collect();
    analyze_labeled(oa, responses, &labels, config)
}

/// Run complete DOE analysis.
///
/// Stages run in a fixed order: aggregation, main effects, S/N ratios,
/// ANOVA, optimal settings. The result depends only on the inputs.
///
/// # Errors
///
/// - `DimensionMismatch` if `responses` or `labels` do not fit the array
/// - `NoResponse` if `responses` has no replicate columns
/// - `InvalidParams` for non-finite responses, invalid settings, or a
///   nominal-is-best analysis without a finite target
/// - `DegenerateStatistics` for a saturated design that cannot get an
///   error term, or an undefined S/N ratio
pub fn analyze_labeled(
    oa: &OA,
    responses: &Array2<f64>,
    labels: &[FactorLabel],
    config: &AnalysisConfig,
) -> Result<DOEAnalysis> {
    let (runs, replicates) = responses.dim();
    if runs != oa.runs() {
        return Err(Error::DimensionMismatch {
            expected: format!("{} response rows", oa.runs()),
            actual: runs.to_string(),
        });
    }
    if labels.len() != oa.factors() {
        return Err(Error::DimensionMismatch {
            expected: format!("{} factor labels", oa.factors()),
            actual: labels.len().to_string(),
        });
    }
    if replicates == 0 {
        return Err(Error::NoResponse);
    }
    if let Some(((run, replicate), _)) = responses.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(Error::invalid_params(format!(
            "response at run {run}, replicate {replicate} is not finite"
        )));
    }
    config.settings.validate()?;
    let target = effective_target(config)?;

    // Stage 1: aggregation
    let run_means: Vec<f64> = responses
        .rows()
        .into_iter()
        .map(|row| row.sum() / replicates as f64)
        .collect();
    let grand_mean = run_means.iter().sum::<f64>() / runs as f64;

    let data = oa.data().view();
    let levels = oa.levels();

    // Stage 2: main effects
    let main_effects = calculate_main_effects(data, levels, &run_means, grand_mean, labels)?;

    // Stage 3: S/N ratios
    let run_sn = run_sn_ratios(responses.view(), config.optimization_type, target)?;
    let sn_grand_mean = run_sn.iter().sum::<f64>() / runs as f64;
    let sn_ratio_effects = calculate_sn_effects(data, levels, &run_sn, labels)?;

    // Stage 4: ANOVA
    let anova = calculate_anova(
        data,
        levels,
        responses.view(),
        &run_means,
        grand_mean,
        &config.settings,
        labels,
    )?;

    // Stage 5: optimal settings
    let optimal_settings = predict_optimal(
        &main_effects,
        &sn_ratio_effects,
        grand_mean,
        sn_grand_mean,
        &anova,
        runs * replicates,
        config.settings.confidence_level,
    );

    debug!(
        runs,
        replicates,
        factors = oa.factors(),
        grand_mean,
        sn_grand_mean,
        error_df = anova.error_df,
        "analysis complete"
    );

    Ok(DOEAnalysis {
        grand_mean,
        sn_grand_mean,
        main_effects,
        sn_ratio_effects,
        anova,
        optimal_settings,
        run_means,
        run_sn_ratios: run_sn,
    })
}

/// The target the S/N stage should see.
fn effective_target(config: &AnalysisConfig) -> Result<Option<f64>> {
    if let Some(t) = config.target_value {
        if !t.is_finite() {
            return Err(Error::invalid_params("target value must be finite"));
        }
    }
    match (config.optimization_type, config.target_value) {
        (OptimizationType::NominalIsBest, None) => Err(Error::invalid_params(
            "nominal-is-best analysis requires a target value",
        )),
        (OptimizationType::NominalIsBest, target) => Ok(target),
        (optimization_type, Some(target)) => {
            warn!(?optimization_type, target, "target value ignored");
            Ok(None)
        }
        (_, None) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue;
    use crate::config::AnalysisSettings;
    use ndarray::array;

    fn l4_responses() -> Array2<f64> {
        array![[10.0], [20.0], [30.0], [40.0]]
    }

    #[test]
    fn test_l4_scenario() {
        let oa = catalogue::get("L4").unwrap();
        let result = analyze(&oa, &l4_responses(), &AnalysisConfig::default()).unwrap();

        assert!((result.grand_mean - 25.0).abs() < 1e-9);
        assert_eq!(result.main_effects.len(), 3);
        for effect in &result.main_effects {
            assert_eq!(effect.level_means.len(), 2);
            // Each level mean averages two of the four responses.
            let sum: f64 = effect.level_means.iter().sum();
            assert!((sum - 50.0).abs() < 1e-9);
        }
        for (sn, y) in result.run_sn_ratios.iter().zip([10.0_f64, 20.0, 30.0, 40.0]) {
            assert!((sn - 20.0 * y.log10()).abs() < 1e-9);
        }

        assert!(result.sn_ratio_effects.iter().all(|e| e.optimal_level == 1));
        let optimal = &result.optimal_settings;
        assert_eq!(optimal.level_indices, vec![1, 1, 1]);
        assert!(result.anova.entries[1].pooled);
        assert!((optimal.predicted_mean - 40.0).abs() < 1e-9);
        assert!(optimal.confidence_interval.is_none());
    }

    #[test]
    fn test_saturated_boundary() {
        let oa = catalogue::get("L4").unwrap();
        let config = AnalysisConfig {
            settings: AnalysisSettings {
                enable_pooling: false,
                ..AnalysisSettings::default()
            },
            ..AnalysisConfig::default()
        };
        let err = analyze(&oa, &l4_responses(), &config).unwrap_err();
        assert!(matches!(err, Error::DegenerateStatistics { .. }));

        let replicated = array![[10.0, 11.0], [20.0, 19.0], [30.0, 32.0], [40.0, 41.0]];
        let result = analyze(&oa, &replicated, &config).unwrap();
        assert!(result.anova.error_df > 0);
        assert!(result.optimal_settings.confidence_interval.is_some());
    }

    #[test]
    fn test_nominal_requires_target() {
        let oa = catalogue::get("L4").unwrap();
        let config = AnalysisConfig {
            optimization_type: OptimizationType::NominalIsBest,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            analyze(&oa, &l4_responses(), &config),
            Err(Error::InvalidParams { .. })
        ));

        let config = AnalysisConfig {
            optimization_type: OptimizationType::NominalIsBest,
            target_value: Some(f64::NAN),
            ..AnalysisConfig::default()
        };
        assert!(analyze(&oa, &l4_responses(), &config).is_err());
    }

    #[test]
    fn test_nominal_is_best_prefers_on_target_level() {
        let oa = catalogue::get("L4").unwrap();
        // Runs 1 and 3 (factor 0 at level 0) sit on the target of 100.
        let responses = array![
            [99.0, 101.0, 100.0],
            [80.0, 85.0, 75.0],
            [98.0, 102.0, 100.0],
            [60.0, 70.0, 80.0]
        ];
        let config = AnalysisConfig {
            optimization_type: OptimizationType::NominalIsBest,
            target_value: Some(100.0),
            ..AnalysisConfig::default()
        };
        let result = analyze(&oa, &responses, &config).unwrap();
        assert_eq!(result.sn_ratio_effects[0].optimal_level, 0);
    }

    #[test]
    fn test_on_target_run_carries_ceiling_through_pipeline() {
        let oa = catalogue::get("L4").unwrap();
        // Run 0 hits the target exactly; the others spread around it.
        let responses = array![[50.0, 50.0], [48.0, 52.0], [45.0, 55.0], [40.0, 60.0]];
        let config = AnalysisConfig {
            optimization_type: OptimizationType::NominalIsBest,
            target_value: Some(50.0),
            ..AnalysisConfig::default()
        };
        let result = analyze(&oa, &responses, &config).unwrap();

        let run_sn = &result.run_sn_ratios;
        assert_eq!(run_sn[0], SN_CEILING_DB);
        assert!(run_sn[1..].iter().all(|&eta| eta.is_finite() && eta < SN_CEILING_DB));

        let expected_grand = run_sn.iter().sum::<f64>() / 4.0;
        assert!((result.sn_grand_mean - expected_grand).abs() < 1e-9);
        assert!(result.sn_grand_mean > 25.0);

        for (factor, effect) in result.sn_ratio_effects.iter().enumerate() {
            let on_target = oa.get(0, factor) as usize;
            for (level, &mean) in effect.level_sn_ratios.iter().enumerate() {
                let members: Vec<f64> = (0..4)
                    .filter(|&run| oa.get(run, factor) as usize == level)
                    .map(|run| run_sn[run])
                    .collect();
                let expected = members.iter().sum::<f64>() / members.len() as f64;
                assert!((mean - expected).abs() < 1e-9);
            }
            assert!(effect.level_sn_ratios[on_target] > 50.0);
            assert_eq!(effect.optimal_level, on_target);
        }

        let optimal = &result.optimal_settings;
        let mut expected_sn = result.sn_grand_mean;
        for (effect, entry) in result.sn_ratio_effects.iter().zip(&result.anova.entries) {
            if !entry.pooled {
                expected_sn += effect.level_sn_ratios[effect.optimal_level] - result.sn_grand_mean;
            }
        }
        assert!(optimal.predicted_sn_ratio.is_finite());
        assert!((optimal.predicted_sn_ratio - expected_sn).abs() < 1e-9);
        assert!(optimal.predicted_sn_ratio >= result.sn_grand_mean);
    }

    #[test]
    fn test_target_ignored_for_larger_is_better() {
        let oa = catalogue::get("L4").unwrap();
        let with_target = AnalysisConfig {
            target_value: Some(12.0),
            ..AnalysisConfig::default()
        };
        let a = analyze(&oa, &l4_responses(), &with_target).unwrap();
        let b = analyze(&oa, &l4_responses(), &AnalysisConfig::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_input_validation() {
        let oa = catalogue::get("L4").unwrap();
        let config = AnalysisConfig::default();

        let short = array![[10.0], [20.0]];
        assert!(matches!(
            analyze(&oa, &short, &config),
            Err(Error::DimensionMismatch { .. })
        ));

        let empty = Array2::<f64>::zeros((4, 0));
        assert_eq!(analyze(&oa, &empty, &config).unwrap_err(), Error::NoResponse);

        let nan = array![[10.0], [f64::NAN], [30.0], [40.0]];
        assert!(matches!(
            analyze(&oa, &nan, &config),
            Err(Error::InvalidParams { .. })
        ));

        let labels = vec![FactorLabel::default_for(0)];
        assert!(analyze_labeled(&oa, &l4_responses(), &labels, &config).is_err());
    }

    #[test]
    fn test_idempotent() {
        let oa = catalogue::get("L9").unwrap();
        let responses = array![
            [85.0, 86.0],
            [92.0, 91.0],
            [78.0, 79.0],
            [91.0, 90.0],
            [88.0, 89.0],
            [82.0, 83.0],
            [89.0, 88.0],
            [86.0, 87.0],
            [94.0, 93.0]
        ];
        let config = AnalysisConfig::default();
        let a = analyze(&oa, &responses, &config).unwrap();
        let b = analyze(&oa, &responses, &config).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
        assert!((a.grand_mean - 87.222_222_222_222_22).abs() < 1e-9);
        assert_eq!(a.anova.total_df, 17);
    }
}
