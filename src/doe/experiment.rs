//! Experiment configuration: named factors with level values, named
//! responses with their optimization goals, replicate count and analysis
//! settings. An experiment references an array but does not own it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::responses::MeasurementSet;
use super::types::{AnalysisConfig, DOEAnalysis, FactorLabel, OptimizationType};
use crate::config::AnalysisSettings;
use crate::error::{Error, Result};
use crate::oa::OA;

/// A factor's setting at one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelValue {
    /// Numeric setting, e.g. a temperature.
    Number(f64),
    /// Categorical setting, e.g. a supplier.
    Text(String),
}

/// One factor (array column) of an experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorSpec {
    /// Stable identifier; defaults to the name.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name, unique within the experiment.
    pub name: String,
    /// Unit of the level values.
    #[serde(default)]
    pub unit: Option<String>,
    /// One value per level, in level-index order.
    pub level_values: Vec<LevelValue>,
}

impl FactorSpec {
    /// Label used in analysis results.
    #[must_use]
    pub fn label(&self) -> FactorLabel {
        FactorLabel {
            id: self.id.clone().unwrap_or_else(|| self.name.clone()),
            name: self.name.clone(),
        }
    }
}

/// One measured response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSpec {
    /// Response name.
    pub name: String,
    /// Unit of measurement.
    #[serde(default)]
    pub unit: Option<String>,
    /// Optimization goal.
    pub optimization_type: OptimizationType,
    /// Target, required for nominal-is-best.
    #[serde(default)]
    pub target_value: Option<f64>,
}

/// Full experiment setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentConfig {
    /// Factors in array column order.
    pub factors: Vec<FactorSpec>,
    /// Responses to measure.
    pub responses: Vec<ResponseSpec>,
    /// Replicates per run.
    pub replicates: usize,
    /// Pooling and interval settings.
    #[serde(default)]
    pub analysis_settings: AnalysisSettings,
}

impl ExperimentConfig {
    /// Check the configuration against the array it runs on.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the factor count differs from the
    /// array's, `NoResponse` without responses, and `InvalidParams` for bad
    /// level values, duplicate names, zero replicates, a missing or
    /// non-finite nominal target, or invalid settings.
    pub fn validate(&self, oa: &OA) -> Result<()> {
        if self.factors.len() != oa.factors() {
            return Err(Error::DimensionMismatch {
                expected: format!("{} factors", oa.factors()),
                actual: self.factors.len().to_string(),
            });
        }
        for (i, (factor, &s)) in self.factors.iter().zip(oa.levels()).enumerate() {
            if factor.level_values.len() != s as usize {
                return Err(Error::invalid_params(format!(
                    "factor '{}' has {} level values but column {i} has {s} levels",
                    factor.name,
                    factor.level_values.len()
                )));
            }
            if self.factors[..i].iter().any(|f| f.name == factor.name) {
                return Err(Error::invalid_params(format!(
                    "duplicate factor name '{}'",
                    factor.name
                )));
            }
        }

        if self.responses.is_empty() {
            return Err(Error::NoResponse);
        }
        for (i, response) in self.responses.iter().enumerate() {
            if self.responses[..i].iter().any(|r| r.name == response.name) {
                return Err(Error::invalid_params(format!(
                    "duplicate response name '{}'",
                    response.name
                )));
            }
            if response.optimization_type == OptimizationType::NominalIsBest
                && !response.target_value.is_some_and(f64::is_finite)
            {
                return Err(Error::invalid_params(format!(
                    "response '{}' is nominal-is-best and needs a finite target value",
                    response.name
                )));
            }
        }

        if self.replicates == 0 {
            return Err(Error::invalid_params("replicates must be at least 1"));
        }
        self.analysis_settings.validate()
    }

    /// Response spec by name.
    #[must_use]
    pub fn response(&self, name: &str) -> Option<&ResponseSpec> {
        self.responses.iter().find(|r| r.name == name)
    }

    /// Empty measurement set sized for this experiment.
    ///
    /// # Errors
    ///
    /// Propagates [`MeasurementSet::new`] errors.
    pub fn measurement_set(&self, oa: &OA) -> Result<MeasurementSet> {
        MeasurementSet::new(
            oa.runs(),
            self.replicates,
            self.responses.iter().map(|r| r.name.clone()).collect(),
        )
    }
}

/// Analyze one named response of an experiment.
///
/// # Errors
///
/// Fails on an invalid configuration, an unknown response, missing
/// measurements (`IncompleteData`), or any analysis error.
pub fn analyze_experiment(
    config: &ExperimentConfig,
    oa: &OA,
    measurements: &MeasurementSet,
    response_name: &str,
) -> Result<DOEAnalysis> {
    config.validate(oa)?;
    let response = config
        .response(response_name)
        .ok_or_else(|| Error::invalid_params(format!("unknown response '{response_name}'")))?;

    if measurements.runs() != oa.runs() || measurements.replicates() != config.replicates {
        return Err(Error::DimensionMismatch {
            expected: format!("{}x{} measurements", oa.runs(), config.replicates),
            actual: format!("{}x{}", measurements.runs(), measurements.replicates()),
        });
    }
    let responses = measurements.matrix(response_name)?;
    let labels: Vec<FactorLabel> = config.factors.iter().map(FactorSpec::label).collect();

    let analysis_config = AnalysisConfig {
        optimization_type: response.optimization_type,
        target_value: response.target_value,
        settings: config.analysis_settings.clone(),
    };
    debug!(response = response_name, runs = oa.runs(), "analyzing experiment response");
    super::analyze_labeled(oa, &responses, &labels, &analysis_config)
}
