//! Engine configuration.
//!
//! The engine is stateless apart from this configuration: resource bounds on
//! construction and verification, and the default analysis settings applied
//! when a request leaves them unset.
//!
//! ```
//! use taguchi_doe::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "limits": { "maxCheck": 4 } }"#).unwrap();
//! assert_eq!(config.limits.max_check, 4);
//! assert_eq!(config.limits.max_hadamard_order, 1024);
//! assert!(config.analysis.enable_pooling);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Confidence levels accepted for the optimal-settings interval.
pub const SUPPORTED_CONFIDENCE_LEVELS: [f64; 4] = [0.80, 0.90, 0.95, 0.99];

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EngineConfig {
    /// Work bounds for construction and verification.
    #[serde(default)]
    pub limits: Limits,
    /// Default analysis settings.
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

impl EngineConfig {
    /// Parse a configuration from JSON and validate it.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRequest` if the JSON does not match the schema and
    /// `InvalidParams` if a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every bound and setting.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.limits.validate()?;
        self.analysis.validate()
    }
}

/// Upper bounds on combinatorial work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Limits {
    /// Largest Galois field order a construction may build.
    #[serde(default = "default_max_field_order")]
    pub max_field_order: u32,
    /// Largest Hadamard order accepted.
    #[serde(default = "default_max_hadamard_order")]
    pub max_hadamard_order: usize,
    /// Largest run count any construction may emit.
    #[serde(default = "default_max_runs")]
    pub max_runs: usize,
    /// Ceiling on the strength scanned by verification.
    #[serde(default = "default_max_check")]
    pub max_check: u32,
    /// Ceiling on `Σ C(k, t) · N` row visits during a verification scan.
    #[serde(default = "default_max_verification_work")]
    pub max_verification_work: u64,
}

fn default_max_field_order() -> u32 {
    256
}

fn default_max_hadamard_order() -> usize {
    1024
}

fn default_max_runs() -> usize {
    65_536
}

fn default_max_check() -> u32 {
    8
}

fn default_max_verification_work() -> u64 {
    50_000_000
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_field_order: default_max_field_order(),
            max_hadamard_order: default_max_hadamard_order(),
            max_runs: default_max_runs(),
            max_check: default_max_check(),
            max_verification_work: default_max_verification_work(),
        }
    }
}

impl Limits {
    /// Validate the bounds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` if a bound is too small to be useful.
    pub fn validate(&self) -> Result<()> {
        if self.max_field_order < 2 {
            return Err(Error::invalid_params("maxFieldOrder must be at least 2"));
        }
        if self.max_hadamard_order < 4 {
            return Err(Error::invalid_params("maxHadamardOrder must be at least 4"));
        }
        if self.max_runs < 4 {
            return Err(Error::invalid_params("maxRuns must be at least 4"));
        }
        if self.max_check == 0 {
            return Err(Error::invalid_params("maxCheck must be at least 1"));
        }
        if self.max_verification_work == 0 {
            return Err(Error::invalid_params("maxVerificationWork must be positive"));
        }
        Ok(())
    }

    /// Fail with `LimitExceeded` if `runs` is above `max_runs`.
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded` when the bound is crossed.
    pub fn check_runs(&self, runs: usize) -> Result<()> {
        if runs > self.max_runs {
            return Err(Error::LimitExceeded {
                what: "runs",
                value: runs as u64,
                max: self.max_runs as u64,
            });
        }
        Ok(())
    }

    /// Fail with `LimitExceeded` if `order` is above `max_field_order`.
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded` when the bound is crossed.
    pub fn check_field_order(&self, order: u32) -> Result<()> {
        if order > self.max_field_order {
            return Err(Error::LimitExceeded {
                what: "field order",
                value: u64::from(order),
                max: u64::from(self.max_field_order),
            });
        }
        Ok(())
    }
}

/// Pooling and interval settings for the Taguchi pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSettings {
    /// F-ratio below which a factor is a pooling candidate.
    #[serde(default = "default_pooling_threshold")]
    pub pooling_threshold: f64,
    /// Whether insignificant factors are pooled into error.
    #[serde(default = "default_enable_pooling")]
    pub enable_pooling: bool,
    /// Pooling never leaves fewer unpooled factors than this.
    #[serde(default = "default_min_unpooled")]
    pub min_unpooled_factors: usize,
    /// Confidence level of the optimal-settings interval.
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
}

fn default_pooling_threshold() -> f64 {
    2.0
}

fn default_enable_pooling() -> bool {
    true
}

fn default_min_unpooled() -> usize {
    1
}

fn default_confidence_level() -> f64 {
    0.95
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            pooling_threshold: default_pooling_threshold(),
            enable_pooling: default_enable_pooling(),
            min_unpooled_factors: default_min_unpooled(),
            confidence_level: default_confidence_level(),
        }
    }
}

impl AnalysisSettings {
    /// Validate threshold and confidence level.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` for a negative or non-finite threshold, or a
    /// confidence level outside [`SUPPORTED_CONFIDENCE_LEVELS`].
    pub fn validate(&self) -> Result<()> {
        if !self.pooling_threshold.is_finite() || self.pooling_threshold < 0.0 {
            return Err(Error::invalid_params(format!(
                "poolingThreshold must be a non-negative number, got {}",
                self.pooling_threshold
            )));
        }
        if !SUPPORTED_CONFIDENCE_LEVELS
            .iter()
            .any(|&c| (c - self.confidence_level).abs() < 1e-9)
        {
            return Err(Error::invalid_params(format!(
                "confidenceLevel must be one of 0.80, 0.90, 0.95, 0.99, got {}",
                self.confidence_level
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.limits.max_check, 8);
        assert_eq!(config.limits.max_field_order, 256);
        assert!((config.analysis.pooling_threshold - 2.0).abs() < 1e-12);
        assert_eq!(config.analysis.min_unpooled_factors, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "analysis": { "enablePooling": false, "confidenceLevel": 0.99 } }"#,
        )
        .unwrap();
        assert!(!config.analysis.enable_pooling);
        assert!((config.analysis.confidence_level - 0.99).abs() < 1e-12);
        assert_eq!(config.limits, Limits::default());
    }

    #[test]
    fn test_rejects_bad_confidence() {
        let err = EngineConfig::from_json_str(r#"{ "analysis": { "confidenceLevel": 0.5 } }"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParams { .. }));
    }

    #[test]
    fn test_rejects_unknown_field() {
        let err = EngineConfig::from_json_str(r#"{ "limit": {} }"#).unwrap_err();
        assert!(matches!(err, Error::MalformedRequest { .. }));
    }

    #[test]
    fn test_limit_checks() {
        let limits = Limits::default();
        assert!(limits.check_runs(65_536).is_ok());
        assert!(matches!(
            limits.check_runs(65_537),
            Err(Error::LimitExceeded { what: "runs", .. })
        ));
        assert!(limits.check_field_order(257).is_err());
    }
}
