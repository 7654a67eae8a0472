//! DOE analysis types.
//!
//! Every type serializes camelCase. Statistics that cannot be computed are
//! `Option` and serialize as `null`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::AnalysisSettings;

/// Optimization goal for Taguchi analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizationType {
    /// Maximize the response. S/N = -10·log10(mean(1/y²))
    #[default]
    LargerIsBetter,
    /// Minimize the response. S/N = -10·log10(mean(y²))
    SmallerIsBetter,
    /// Hit a target with minimum spread. S/N = 10·log10(ȳ² / mean((y-T)²))
    NominalIsBest,
}

/// Identity of one factor (array column) in results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorLabel {
    /// Stable identifier, used as the key of `OptimalSettings::factor_levels`.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl FactorLabel {
    /// Label for an unnamed column: `F1`, `Factor 1`, ...
    #[must_use]
    pub fn default_for(index: usize) -> Self {
        Self {
            id: format!("F{}", index + 1),
            name: format!("Factor {}", index + 1),
        }
    }
}

/// Main effect of a single factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainEffect {
    /// Column in the array.
    pub factor_index: usize,
    /// Factor identifier.
    pub factor_id: String,
    /// Factor display name.
    pub factor_name: String,
    /// Mean run response at each level.
    pub level_means: Vec<f64>,
    /// `level_mean - grand_mean` for each level.
    pub level_effects: Vec<f64>,
    /// `max(level_means) - min(level_means)`.
    pub range: f64,
    /// 1 for the largest range; ties keep column order.
    pub rank: usize,
}

/// S/N analysis of a single factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SNRatioEffect {
    /// Column in the array.
    pub factor_index: usize,
    /// Factor identifier.
    pub factor_id: String,
    /// Factor display name.
    pub factor_name: String,
    /// Mean S/N (dB) at each level.
    pub level_sn_ratios: Vec<f64>,
    /// `max - min` of the level S/N means.
    pub range: f64,
    /// Level with the highest mean S/N; ties resolve to the lowest index.
    pub optimal_level: usize,
}

/// ANOVA row for one factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ANOVAEntry {
    /// Column in the array.
    pub factor_index: usize,
    /// Factor identifier.
    pub factor_id: String,
    /// Factor display name.
    pub factor_name: String,
    /// `Σ n_l·r·(ȳ_l - ȳ)²`.
    pub sum_of_squares: f64,
    /// `s - 1`.
    pub degrees_of_freedom: usize,
    /// `SS / DF`.
    pub mean_square: f64,
    /// `MS / MS_error`; absent when pooled or when `MS_error = 0`.
    pub f_ratio: Option<f64>,
    /// Upper tail of F(DF, DF_error) at the F-ratio.
    pub p_value: Option<f64>,
    /// `SS / SS_total × 100`, before pooling; absent when `SS_total = 0`.
    pub contribution_percent: Option<f64>,
    /// Whether the factor was folded into the error term.
    pub pooled: bool,
}

/// Complete ANOVA table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ANOVAResult {
    /// One entry per factor, in column order.
    pub entries: Vec<ANOVAEntry>,
    /// Error sum of squares, pooled factors included.
    pub error_ss: f64,
    /// Error degrees of freedom, pooled factors included.
    pub error_df: usize,
    /// `error_ss / error_df`.
    pub error_ms: f64,
    /// Total sum of squares over every observation.
    pub total_ss: f64,
    /// `N·r - 1`.
    pub total_df: usize,
}

impl ANOVAResult {
    /// Entries that were not pooled.
    pub fn unpooled(&self) -> impl Iterator<Item = &ANOVAEntry> {
        self.entries.iter().filter(|e| !e.pooled)
    }
}

/// Confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceInterval {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
    /// Confidence level, e.g. 0.95.
    pub level: f64,
}

/// Optimal settings prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimalSettings {
    /// Chosen level per factor id.
    pub factor_levels: BTreeMap<String, usize>,
    /// Chosen level per column.
    pub level_indices: Vec<usize>,
    /// `ȳ + Σ_unpooled (ȳ_opt - ȳ)`.
    pub predicted_mean: f64,
    /// `η̄ + Σ_unpooled (η_opt - η̄)`.
    pub predicted_sn_ratio: f64,
    /// `N·r / (1 + Σ unpooled DF)`.
    pub effective_sample_size: f64,
    /// Interval on the predicted mean; absent without an error estimate.
    pub confidence_interval: Option<ConfidenceInterval>,
}

/// Complete DOE analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DOEAnalysis {
    /// Mean of all observations.
    pub grand_mean: f64,
    /// Mean of the per-run S/N ratios.
    pub sn_grand_mean: f64,
    /// Main effects, in column order.
    pub main_effects: Vec<MainEffect>,
    /// S/N effects, in column order.
    pub sn_ratio_effects: Vec<SNRatioEffect>,
    /// ANOVA table.
    pub anova: ANOVAResult,
    /// Optimal settings.
    pub optimal_settings: OptimalSettings,
    /// Mean over replicates for each run.
    pub run_means: Vec<f64>,
    /// S/N (dB) for each run.
    pub run_sn_ratios: Vec<f64>,
}

/// Configuration for one analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Optimization goal.
    #[serde(default)]
    pub optimization_type: OptimizationType,
    /// Target for nominal-is-best; ignored otherwise.
    #[serde(default)]
    pub target_value: Option<f64>,
    /// Pooling and interval settings.
    #[serde(flatten)]
    pub settings: AnalysisSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimization_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&OptimizationType::NominalIsBest).unwrap(),
            "\"nominal-is-best\""
        );
        let t: OptimizationType = serde_json::from_str("\"smaller-is-better\"").unwrap();
        assert_eq!(t, OptimizationType::SmallerIsBetter);
    }

    #[test]
    fn test_config_flattens_settings() {
        let config: AnalysisConfig = serde_json::from_value(serde_json::json!({
            "optimizationType": "nominal-is-best",
            "targetValue": 10.0,
            "enablePooling": false
        }))
        .unwrap();
        assert_eq!(config.target_value, Some(10.0));
        assert!(!config.settings.enable_pooling);
        assert!((config.settings.confidence_level - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_missing_statistics_serialize_as_null() {
        let entry = ANOVAEntry {
            factor_index: 0,
            factor_id: "F1".into(),
            factor_name: "Factor 1".into(),
            sum_of_squares: 0.0,
            degrees_of_freedom: 1,
            mean_square: 0.0,
            f_ratio: None,
            p_value: None,
            contribution_percent: None,
            pooled: true,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json["fRatio"].is_null());
        assert!(json["contributionPercent"].is_null());
    }
}
