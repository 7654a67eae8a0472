//! Error types for the DOE engine.
//!
//! Every fallible operation returns [`Error`]. Callers that only need the
//! coarse category (to decide between "fix your input" and "add replicates")
//! use [`Error::kind`], which folds the detailed variants onto [`ErrorKind`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ============ Galois Field Errors ============
    /// The requested field order is not a prime power.
    #[error("order {0} is not a prime power (must be p^k for prime p and k >= 1)")]
    InvalidFieldOrder(u32),

    /// Attempted division by zero in a Galois field.
    #[error("division by zero in GF({order})")]
    DivisionByZero {
        /// The order of the field where division by zero occurred.
        order: u32,
    },

    /// Element value is out of range for the field.
    #[error("element {value} is out of range for GF({order}), must be in 0..{order}")]
    ElementOutOfRange {
        /// The invalid element value.
        value: u32,
        /// The order of the field.
        order: u32,
    },

    // ============ Parameter Validation Errors ============
    /// Invalid parameters.
    #[error("invalid parameters: {message}")]
    InvalidParams {
        /// Description of what is invalid.
        message: String,
    },

    /// The number of factors exceeds what the construction can produce.
    #[error("factors {factors} exceeds maximum {max} for {algorithm} construction")]
    TooManyFactors {
        /// Requested number of factors.
        factors: usize,
        /// Maximum allowed factors.
        max: usize,
        /// Name of the construction algorithm.
        algorithm: &'static str,
    },

    /// The number of levels does not satisfy the construction's field requirement.
    #[error("levels {levels} is not valid for {algorithm}: {requirement}")]
    UnsupportedLevels {
        /// The rejected level count.
        levels: u32,
        /// What the construction requires.
        requirement: &'static str,
        /// Name of the construction algorithm.
        algorithm: &'static str,
    },

    /// The strength is outside the construction's range.
    #[error("strength {strength} is invalid for {algorithm} (valid range: {min}..={max})")]
    InvalidStrength {
        /// The requested strength.
        strength: u32,
        /// Minimum valid strength.
        min: u32,
        /// Maximum valid strength.
        max: u32,
        /// Name of the construction algorithm.
        algorithm: &'static str,
    },

    /// A configured work bound would be exceeded.
    #[error("{what} {value} exceeds the configured limit {max}")]
    LimitExceeded {
        /// The bounded quantity.
        what: &'static str,
        /// The requested value.
        value: u64,
        /// The configured maximum.
        max: u64,
    },

    /// Array dimensions are inconsistent.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension description.
        expected: String,
        /// Actual dimension description.
        actual: String,
    },

    /// A matrix entry lies outside its column's declared levels.
    #[error("value {value} at row {row}, column {col} is outside 0..{levels}")]
    ValueOutOfRange {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        col: usize,
        /// The entry.
        value: u32,
        /// The declared level count of the column.
        levels: u32,
    },

    // ============ Construction Errors ============
    /// Construction failed despite valid parameters.
    #[error("construction failed: {message}")]
    ConstructionFailed {
        /// Description of why construction failed.
        message: String,
    },

    /// No construction covers the requested parameters.
    #[error("no construction available for {levels} levels, {factors} factors, strength {strength}")]
    NoSuitableAlgorithm {
        /// Requested levels, rendered for display.
        levels: String,
        /// Requested number of factors.
        factors: usize,
        /// Requested strength.
        strength: u32,
    },

    // ============ Analysis Errors ============
    /// A required measurement is missing.
    #[error("measurement missing for run {run}, replicate {replicate}")]
    IncompleteData {
        /// Zero-based run index.
        run: usize,
        /// Zero-based replicate index.
        replicate: usize,
    },

    /// No response variable was supplied.
    #[error("no response variable to analyze")]
    NoResponse,

    /// A statistic is undefined and the whole result would be meaningless.
    #[error("degenerate statistics: {message}")]
    DegenerateStatistics {
        /// Description of the degenerate condition.
        message: String,
    },

    // ============ Catalogue Errors ============
    /// No catalogue entry with this name.
    #[error("standard array not found: {0}")]
    NotFound(String),

    // ============ Boundary Errors ============
    /// The command name is not recognised.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A command payload could not be decoded.
    #[error("malformed request: {message}")]
    MalformedRequest {
        /// Decoder message.
        message: String,
    },
}

/// A specialized `Result` type for engine operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse error categories reported at the command boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// The caller's parameters violate a precondition.
    InvalidParameters,
    /// Valid parameters could not be realized as an array.
    ConstructionError,
    /// Measurements are missing.
    IncompleteData,
    /// No response variable was given.
    NoResponse,
    /// Zero variance or zero error degrees of freedom made the result meaningless.
    DegenerateStatistics,
    /// Catalogue lookup miss.
    NotFound,
}

impl Error {
    /// Create a new `InvalidParams` error.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Create a new `ConstructionFailed` error.
    #[must_use]
    pub fn construction_failed(message: impl Into<String>) -> Self {
        Self::ConstructionFailed {
            message: message.into(),
        }
    }

    /// Create a new `DegenerateStatistics` error.
    #[must_use]
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateStatistics {
            message: message.into(),
        }
    }

    /// Create a new `MalformedRequest` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }

    /// The boundary category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConstructionFailed { .. }
            | Self::NoSuitableAlgorithm { .. }
            | Self::DivisionByZero { .. } => ErrorKind::ConstructionError,
            Self::IncompleteData { .. } => ErrorKind::IncompleteData,
            Self::NoResponse => ErrorKind::NoResponse,
            Self::DegenerateStatistics { .. } => ErrorKind::DegenerateStatistics,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidFieldOrder(_)
            | Self::ElementOutOfRange { .. }
            | Self::InvalidParams { .. }
            | Self::TooManyFactors { .. }
            | Self::UnsupportedLevels { .. }
            | Self::InvalidStrength { .. }
            | Self::LimitExceeded { .. }
            | Self::DimensionMismatch { .. }
            | Self::ValueOutOfRange { .. }
            | Self::UnknownCommand(_)
            | Self::MalformedRequest { .. } => ErrorKind::InvalidParameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidFieldOrder(6);
        assert!(err.to_string().contains('6'));
        assert!(err.to_string().contains("prime power"));

        let err = Error::DivisionByZero { order: 7 };
        assert!(err.to_string().contains("GF(7)"));

        let err = Error::TooManyFactors {
            factors: 10,
            max: 8,
            algorithm: "Bose",
        };
        let msg = err.to_string();
        assert!(msg.contains("10") && msg.contains('8') && msg.contains("Bose"));

        let err = Error::IncompleteData { run: 2, replicate: 1 };
        assert_eq!(err.to_string(), "measurement missing for run 2, replicate 1");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::invalid_params("x").kind(),
            ErrorKind::InvalidParameters
        );
        assert_eq!(
            Error::construction_failed("x").kind(),
            ErrorKind::ConstructionError
        );
        assert_eq!(Error::NoResponse.kind(), ErrorKind::NoResponse);
        assert_eq!(
            Error::degenerate("x").kind(),
            ErrorKind::DegenerateStatistics
        );
        assert_eq!(Error::NotFound("L7".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::LimitExceeded {
                what: "order",
                value: 4096,
                max: 1024
            }
            .kind(),
            ErrorKind::InvalidParameters
        );
        assert_eq!(
            Error::UnknownCommand("nope".into()).kind(),
            ErrorKind::InvalidParameters
        );
    }

    #[test]
    fn test_kind_serializes_camel_case() {
        let json = serde_json::to_string(&ErrorKind::DegenerateStatistics).unwrap();
        assert_eq!(json, "\"degenerateStatistics\"");
    }
}
