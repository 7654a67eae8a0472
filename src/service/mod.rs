//! Command boundary.
//!
//! [`Engine`] exposes every operation as a typed method and, through
//! [`Engine::handle`], as a `serde_json::Value` request/response pair keyed
//! by a snake_case command name. The engine holds nothing but its validated
//! configuration, so one value can serve any number of concurrent callers.
//!
//! ```
//! use serde_json::json;
//! use taguchi_doe::service::Engine;
//!
//! let engine = Engine::default();
//! let record = engine
//!     .handle("build_oa", json!({ "levels": 3, "factors": 4 }))
//!     .unwrap();
//! assert_eq!(record["runs"], 9);
//! assert_eq!(record["metadata"]["algorithm"], "Bose");
//!
//! let err = engine.handle("get_standard_array", json!({ "name": "L7" })).unwrap_err();
//! assert_eq!(serde_json::to_value(err.kind).unwrap(), "notFound");
//! ```

mod types;

pub use types::{
    AnalysisOverrides, ArrayMetadata, ArrayRecord, BuildRequest, CommandError, ConstructionsRequest,
    CorrelationMatrix, DOEAnalysisRequest, ImportValidation, LevelSpec, MatrixRequest, NameRequest,
    StrengthRequest, ValidationResult, VerifyRequest,
};

use ndarray::Array2;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::builder::OABuilder;
use crate::catalogue::{self, CatalogueFilter, StandardArrayInfo};
use crate::config::EngineConfig;
use crate::construct::{available_constructions, ConstructionOption};
use crate::doe::{self, response_matrix, AnalysisConfig, DOEAnalysis};
use crate::error::{Error, Result};
use crate::oa::{
    balance_report, compute_strength, correlation_matrix, infer_levels, rows_to_array,
    verify_matrix, BalanceReport, VerificationReport, OA,
};
use crate::utils::is_prime_power;

/// Arrays with fewer runs draw an import warning.
const FEW_RUNS: usize = 4;
/// Arrays with more factors draw an import warning.
const MANY_FACTORS: usize = 50;

/// The stateless engine.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Engine with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` if the configuration does not validate.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Construct an array.
    ///
    /// # Errors
    ///
    /// See [`OABuilder::build`].
    #[tracing::instrument(skip(self))]
    pub fn build_oa(&self, request: &BuildRequest) -> Result<ArrayRecord> {
        let (oa, algorithm) = self.builder(request).build_with_algorithm()?;
        debug!(runs = oa.runs(), algorithm = algorithm.name(), "built array");
        Ok(ArrayRecord::new(&oa, None, algorithm.name(), None))
    }

    fn builder(&self, request: &BuildRequest) -> OABuilder {
        let mut builder = match &request.levels {
            LevelSpec::Symmetric(s) => OABuilder::new().levels(*s),
            LevelSpec::Mixed(levels) => OABuilder::new().mixed_levels(levels.clone()),
        }
        .factors(request.factors)
        .strength(request.strength)
        .limits(self.config.limits.clone());
        if let Some(min_runs) = request.min_runs {
            builder = builder.min_runs(min_runs);
        }
        if let Some(algorithm) = request.algorithm {
            builder = builder.algorithm(algorithm);
        }
        builder
    }

    /// Constructions applicable to `levels` at `strength`.
    #[must_use]
    pub fn get_available_constructions(&self, levels: u32, strength: u32) -> Vec<ConstructionOption> {
        available_constructions(levels, strength, &self.config.limits)
    }

    /// Check build parameters without returning an array.
    ///
    /// Never fails; problems are reported in the result.
    #[tracing::instrument(skip(self))]
    pub fn validate_build_params(&self, request: &BuildRequest) -> ValidationResult {
        let mut result = ValidationResult::default();
        let levels = request.levels.distinct();
        let k = request.factors;
        let t = request.strength;

        if levels.is_empty() || levels.iter().any(|&s| s < 2) {
            result.errors.push("Levels must be at least 2".to_string());
        }
        if k < 1 {
            result.errors.push("Factors must be at least 1".to_string());
        }
        if t as usize > k {
            result.errors.push(format!("Strength {t} cannot exceed factors {k}"));
        }

        for &s in levels.iter().filter(|&&s| s >= 2 && !is_prime_power(s)) {
            result
                .warnings
                .push(format!("Levels {s} is not a prime power - limited constructions available"));
        }

        if result.errors.is_empty() {
            if let Err(e) = self.builder(request).build() {
                debug!(error = %e, "build parameters rejected");
                let described = match &request.levels {
                    LevelSpec::Symmetric(s) => s.to_string(),
                    LevelSpec::Mixed(levels) => format!("{levels:?}"),
                };
                result.errors.push(format!(
                    "No construction available for {described} levels, {k} factors, strength {t}"
                ));
            }
        }

        if let Some(s) = request.levels.symmetric() {
            result.suggestions = self
                .get_available_constructions(s, t.max(1))
                .into_iter()
                .filter(|option| option.max_factors >= k)
                .collect();
        }

        result.valid = result.errors.is_empty();
        result
    }

    /// Check a matrix against a claimed strength.
    ///
    /// Levels are inferred per column. The scan reaches one past the claim so
    /// a stronger array reports its extra strength.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed matrix, a claim above the configured
    /// `max_check`, or a scan beyond the work bound.
    #[tracing::instrument(skip(self, matrix), fields(runs = matrix.len()))]
    pub fn verify_array(&self, matrix: &[Vec<u32>], claimed_strength: u32) -> Result<VerificationReport> {
        let (data, levels) = parse_matrix(matrix)?;
        let max_check = (claimed_strength + 1)
            .min(self.config.limits.max_check)
            .min(u32::try_from(data.ncols()).unwrap_or(u32::MAX))
            .max(claimed_strength);
        verify_matrix(data.view(), &levels, claimed_strength, max_check, &self.config.limits)
    }

    /// Largest balanced strength of a matrix, up to `max_check`.
    ///
    /// # Errors
    ///
    /// See [`compute_strength`].
    #[tracing::instrument(skip(self, matrix), fields(runs = matrix.len()))]
    pub fn compute_array_strength(&self, matrix: &[Vec<u32>], max_check: u32) -> Result<u32> {
        let (data, levels) = parse_matrix(matrix)?;
        compute_strength(data.view(), &levels, max_check, &self.config.limits)
    }

    /// Level counts per column.
    ///
    /// # Errors
    ///
    /// Fails for an empty or ragged matrix, or an entry that implies more
    /// levels than runs.
    pub fn get_balance_report(&self, matrix: &[Vec<u32>]) -> Result<BalanceReport> {
        let (data, levels) = parse_matrix(matrix)?;
        Ok(balance_report(data.view(), &levels))
    }

    /// Pairwise Pearson correlation of the columns.
    ///
    /// # Errors
    ///
    /// Fails for an empty or ragged matrix, or more inferred levels than runs.
    pub fn get_correlation_matrix(&self, matrix: &[Vec<u32>]) -> Result<CorrelationMatrix> {
        let (data, _) = parse_matrix(matrix)?;
        let corr = correlation_matrix(data.view());
        Ok(CorrelationMatrix {
            matrix: corr.rows().into_iter().map(|row| row.to_vec()).collect(),
            factors: data.ncols(),
        })
    }

    /// Run the Taguchi pipeline on a request.
    ///
    /// Unset settings take the engine's analysis defaults.
    ///
    /// # Errors
    ///
    /// See [`doe::analyze_labeled`]; missing measurements are
    /// `IncompleteData`.
    #[tracing::instrument(skip(self, request), fields(runs = request.array_data.len()))]
    pub fn run_doe_analysis(&self, request: &DOEAnalysisRequest) -> Result<DOEAnalysis> {
        let oa = OA::from_rows(&request.array_data, None, 1)?;
        let responses = response_matrix(&request.response_data, oa.runs())?;
        let labels = request.labels(oa.factors())?;
        let config = AnalysisConfig {
            optimization_type: request.optimization_type,
            target_value: request.target_value,
            settings: request.settings.apply(&self.config.analysis),
        };
        doe::analyze_labeled(&oa, &responses, &labels, &config)
    }

    /// Every catalogue entry.
    #[must_use]
    pub fn list_standard_arrays(&self) -> Vec<StandardArrayInfo> {
        catalogue::list()
    }

    /// A catalogue array by name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown name.
    #[tracing::instrument(skip(self))]
    pub fn get_standard_array(&self, name: &str) -> Result<ArrayRecord> {
        let entry = catalogue::lookup(name)?;
        let oa = entry.build(&self.config.limits)?;
        Ok(ArrayRecord::new(
            &oa,
            Some(format!("{} - {}", entry.name, entry.description)),
            "Catalogue",
            Some(format!("Constructed by {}", entry.recipe.name())),
        ))
    }

    /// Catalogue entries matching every given predicate.
    #[must_use]
    pub fn search_catalogue(&self, filter: &CatalogueFilter) -> Vec<StandardArrayInfo> {
        catalogue::search(filter)
    }

    /// Summarize an imported matrix.
    ///
    /// The strength estimate backs off to smaller scans when the full one
    /// would pass the work bound.
    ///
    /// # Errors
    ///
    /// Fails for an empty or ragged matrix, or more inferred levels than runs.
    #[tracing::instrument(skip(self, matrix), fields(runs = matrix.len()))]
    pub fn inspect_matrix(&self, matrix: &[Vec<u32>]) -> Result<ImportValidation> {
        let (data, levels) = parse_matrix(matrix)?;
        let (runs, factors) = data.dim();
        let mut warnings = Vec::new();

        let mut max_check = self
            .config
            .limits
            .max_check
            .min(u32::try_from(factors).unwrap_or(u32::MAX));
        let estimated_strength = loop {
            match compute_strength(data.view(), &levels, max_check, &self.config.limits) {
                Ok(t) => break t,
                Err(Error::LimitExceeded { .. }) if max_check > 1 => {
                    warn!(max_check, "strength estimate exceeded the work bound, narrowing");
                    max_check -= 1;
                }
                Err(e) => return Err(e),
            }
        };

        let balance = balance_report(data.view(), &levels);
        for (i, balanced) in balance.factor_balance.iter().enumerate() {
            if !balanced {
                warnings.push(format!("Factor {} may not be balanced", i + 1));
            }
        }
        if runs < FEW_RUNS {
            warnings.push("Array has very few runs".to_string());
        }
        if factors > MANY_FACTORS {
            warnings.push("Array has many factors - analysis may be slow".to_string());
        }

        Ok(ImportValidation {
            runs,
            factors,
            is_mixed: levels.windows(2).any(|w| w[0] != w[1]),
            levels,
            estimated_strength,
            warnings,
        })
    }

    /// Dispatch a command by name.
    ///
    /// | Command | Payload |
    /// |---|---|
    /// | `build_oa`, `validate_build_params` | [`BuildRequest`] |
    /// | `get_available_constructions` | [`ConstructionsRequest`] |
    /// | `verify_array` | [`VerifyRequest`] |
    /// | `compute_array_strength` | [`StrengthRequest`] |
    /// | `get_balance_report`, `get_correlation_matrix`, `inspect_matrix` | [`MatrixRequest`] |
    /// | `run_doe_analysis` | [`DOEAnalysisRequest`] |
    /// | `list_standard_arrays` | ignored |
    /// | `get_standard_array` | [`NameRequest`] |
    /// | `search_catalogue` | [`CatalogueFilter`] |
    ///
    /// # Errors
    ///
    /// Unknown commands and undecodable payloads are `InvalidParameters`;
    /// operation errors keep their own kind.
    #[tracing::instrument(skip(self, payload))]
    pub fn handle(&self, command: &str, payload: Value) -> Result<Value, CommandError> {
        let result = match command {
            "build_oa" => self.build_oa(&decode(payload)?).and_then(encode),
            "get_available_constructions" => {
                let req: ConstructionsRequest = decode(payload)?;
                encode(self.get_available_constructions(req.levels, req.strength))
            }
            "validate_build_params" => encode(self.validate_build_params(&decode(payload)?)),
            "verify_array" => {
                let req: VerifyRequest = decode(payload)?;
                self.verify_array(&req.matrix, req.claimed_strength).and_then(encode)
            }
            "compute_array_strength" => {
                let req: StrengthRequest = decode(payload)?;
                self.compute_array_strength(&req.matrix, req.max_check).and_then(encode)
            }
            "get_balance_report" => {
                let req: MatrixRequest = decode(payload)?;
                self.get_balance_report(&req.matrix).and_then(encode)
            }
            "get_correlation_matrix" => {
                let req: MatrixRequest = decode(payload)?;
                self.get_correlation_matrix(&req.matrix).and_then(encode)
            }
            "run_doe_analysis" => self.run_doe_analysis(&decode(payload)?).and_then(encode),
            "list_standard_arrays" => encode(self.list_standard_arrays()),
            "get_standard_array" => {
                let req: NameRequest = decode(payload)?;
                self.get_standard_array(&req.name).and_then(encode)
            }
            "search_catalogue" => encode(self.search_catalogue(&decode(payload)?)),
            "inspect_matrix" => {
                let req: MatrixRequest = decode(payload)?;
                self.inspect_matrix(&req.matrix).and_then(encode)
            }
            other => Err(Error::UnknownCommand(other.to_string())),
        };
        result.map_err(|e| {
            debug!(command, error = %e, "command failed");
            CommandError::from(e)
        })
    }
}

fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, CommandError> {
    serde_json::from_value(payload).map_err(|e| Error::malformed(e.to_string()).into())
}

fn encode<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::malformed(e.to_string()))
}

fn parse_matrix(matrix: &[Vec<u32>]) -> Result<(Array2<u32>, Vec<u32>)> {
    let data = rows_to_array(matrix)?;
    let levels = infer_levels(data.view())?;
    Ok((data, levels))
}
