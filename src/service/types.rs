//! Request and response shapes of the command boundary.
//!
//! Field names serialize camelCase. Statistics that are undefined for a
//! given input are `Option<f64>` and serialize as `null`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AnalysisSettings;
use crate::construct::{Algorithm, ConstructionOption};
use crate::doe::{FactorLabel, OptimizationType};
use crate::error::{Error, ErrorKind};
use crate::oa::OA;

/// Level counts of a build request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelSpec {
    /// Same level count for every factor.
    Symmetric(u32),
    /// One level count per factor.
    Mixed(Vec<u32>),
}

impl LevelSpec {
    /// Distinct level counts, ascending.
    #[must_use]
    pub fn distinct(&self) -> Vec<u32> {
        let mut levels = match self {
            Self::Symmetric(s) => vec![*s],
            Self::Mixed(levels) => levels.clone(),
        };
        levels.sort_unstable();
        levels.dedup();
        levels
    }

    /// The common level count, if there is one.
    #[must_use]
    pub fn symmetric(&self) -> Option<u32> {
        match self.distinct().as_slice() {
            [s] => Some(*s),
            _ => None,
        }
    }
}

fn default_strength() -> u32 {
    2
}

/// Parameters for `build_oa` and `validate_build_params`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    /// Level count(s).
    pub levels: LevelSpec,
    /// Number of factors.
    pub factors: usize,
    /// Required strength.
    #[serde(default = "default_strength")]
    pub strength: u32,
    /// Require at least this many runs.
    #[serde(default)]
    pub min_runs: Option<usize>,
    /// Use exactly this construction.
    #[serde(default)]
    pub algorithm: Option<Algorithm>,
}

/// Provenance of an array record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayMetadata {
    /// Display name, for catalogue arrays.
    pub name: Option<String>,
    /// Producing algorithm, or `Catalogue`.
    pub algorithm: String,
    /// Creation time, RFC 3339.
    pub created_at: DateTime<Utc>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// An array as handed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayRecord {
    /// Fresh identifier per record.
    pub id: Uuid,
    /// Number of runs.
    pub runs: usize,
    /// Number of factors.
    pub factors: usize,
    /// Level count per factor.
    pub levels: Vec<u32>,
    /// Declared strength.
    pub strength: u32,
    /// Row-major matrix.
    pub data: Vec<Vec<u32>>,
    /// Provenance.
    pub metadata: ArrayMetadata,
}

impl ArrayRecord {
    /// Record `oa` with a new id and the current time.
    #[must_use]
    pub fn new(oa: &OA, name: Option<String>, algorithm: impl Into<String>, notes: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            runs: oa.runs(),
            factors: oa.factors(),
            levels: oa.levels().to_vec(),
            strength: oa.strength(),
            data: oa.to_rows(),
            metadata: ArrayMetadata {
                name,
                algorithm: algorithm.into(),
                created_at: Utc::now(),
                notes,
            },
        }
    }
}

/// Outcome of `validate_build_params`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether a build with these parameters would succeed.
    pub valid: bool,
    /// Blocking problems.
    pub errors: Vec<String>,
    /// Non-blocking concerns.
    pub warnings: Vec<String>,
    /// Constructions that can carry the requested factor count.
    pub suggestions: Vec<ConstructionOption>,
}

/// Pairwise column correlations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationMatrix {
    /// `factors × factors` Pearson coefficients.
    pub matrix: Vec<Vec<f64>>,
    /// Number of factors.
    pub factors: usize,
}

/// Summary of an imported matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportValidation {
    /// Number of runs.
    pub runs: usize,
    /// Number of factors.
    pub factors: usize,
    /// Inferred level count per factor.
    pub levels: Vec<u32>,
    /// Whether level counts differ between factors.
    pub is_mixed: bool,
    /// Largest balanced strength found.
    pub estimated_strength: u32,
    /// Human-readable concerns.
    pub warnings: Vec<String>,
}

/// Analysis settings a request may override; unset fields take the
/// engine's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOverrides {
    /// F-ratio pooling threshold.
    #[serde(default)]
    pub pooling_threshold: Option<f64>,
    /// Whether to pool.
    #[serde(default)]
    pub enable_pooling: Option<bool>,
    /// Pooling floor.
    #[serde(default)]
    pub min_unpooled_factors: Option<usize>,
    /// Interval confidence level.
    #[serde(default)]
    pub confidence_level: Option<f64>,
}

impl AnalysisOverrides {
    /// `base` with every set field replaced.
    #[must_use]
    pub fn apply(&self, base: &AnalysisSettings) -> AnalysisSettings {
        AnalysisSettings {
            pooling_threshold: self.pooling_threshold.unwrap_or(base.pooling_threshold),
            enable_pooling: self.enable_pooling.unwrap_or(base.enable_pooling),
            min_unpooled_factors: self.min_unpooled_factors.unwrap_or(base.min_unpooled_factors),
            confidence_level: self.confidence_level.unwrap_or(base.confidence_level),
        }
    }
}

/// Everything `run_doe_analysis` needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DOEAnalysisRequest {
    /// Design matrix, row-major; levels are inferred per column.
    #[serde(alias = "matrix")]
    pub array_data: Vec<Vec<u32>>,
    /// `runs × replicates`; `null` marks a missing measurement.
    pub response_data: Vec<Vec<Option<f64>>>,
    /// One id per column; empty for `F1, F2, ...`.
    #[serde(default)]
    pub factor_ids: Vec<String>,
    /// One display name per column; empty for `Factor 1, ...`.
    #[serde(default)]
    pub factor_names: Vec<String>,
    /// Optimization goal.
    pub optimization_type: OptimizationType,
    /// Target for nominal-is-best.
    #[serde(default)]
    pub target_value: Option<f64>,
    /// Per-request setting overrides.
    #[serde(flatten)]
    pub settings: AnalysisOverrides,
}

impl DOEAnalysisRequest {
    /// Factor labels for `factors` columns.
    ///
    /// Missing ids fall back to names and missing names to ids.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` when a non-empty id or name list does not
    /// have one entry per column.
    pub fn labels(&self, factors: usize) -> Result<Vec<FactorLabel>, Error> {
        for (what, list) in [("factor ids", &self.factor_ids), ("factor names", &self.factor_names)] {
            if !list.is_empty() && list.len() != factors {
                return Err(Error::DimensionMismatch {
                    expected: format!("{factors} {what}"),
                    actual: list.len().to_string(),
                });
            }
        }
        Ok((0..factors)
            .map(|i| {
                let fallback = FactorLabel::default_for(i);
                let id = self.factor_ids.get(i).cloned();
                let name = self.factor_names.get(i).cloned();
                FactorLabel {
                    id: id.clone().or_else(|| name.clone()).unwrap_or(fallback.id),
                    name: name.or(id).unwrap_or(fallback.name),
                }
            })
            .collect())
    }
}

/// Payload of `verify_array`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// Row-major matrix.
    pub matrix: Vec<Vec<u32>>,
    /// Strength to check for.
    pub claimed_strength: u32,
}

/// Payload of `compute_array_strength`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthRequest {
    /// Row-major matrix.
    pub matrix: Vec<Vec<u32>>,
    /// Highest strength to scan.
    pub max_check: u32,
}

/// Payload of the single-matrix commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixRequest {
    /// Row-major matrix.
    pub matrix: Vec<Vec<u32>>,
}

/// Payload of `get_available_constructions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructionsRequest {
    /// Level count.
    pub levels: u32,
    /// Required strength.
    #[serde(default = "default_strength")]
    pub strength: u32,
}

/// Payload of `get_standard_array`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRequest {
    /// Catalogue name, e.g. `L9`.
    pub name: String,
}

/// Error returned by [`super::Engine::handle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct CommandError {
    /// Boundary category.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl From<Error> for CommandError {
    fn from(err: Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
