//! # taguchi-doe
//!
//! Orthogonal array construction, verification and Taguchi analysis.
//!
//! ## Overview
//!
//! Orthogonal arrays (OAs) lay out experiments so that every pair (or
//! t-tuple) of factor levels appears equally often. This crate provides:
//! - Construction by Bose, Bush, Hadamard, Addelman-Kempthorne and
//!   Rao-Hamming, over prime power Galois fields
//! - Verification of strength, balance and column correlation
//! - A catalogue of standard arrays (L4 ... L81)
//! - The Taguchi pipeline: main effects, S/N ratios, ANOVA with pooling,
//!   optimal settings with a confidence interval
//! - A stateless command boundary, [`service::Engine`]
//!
//! ## Quick Start
//!
//! ```rust
//! use taguchi_doe::OABuilder;
//!
//! // Automatically selects the best construction
//! let oa = OABuilder::new()
//!     .levels(3)
//!     .factors(4)
//!     .strength(2)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(oa.runs(), 9);    // Bose: 3²
//! assert_eq!(oa.factors(), 4);
//! assert_eq!(oa.symmetric_levels(), Some(3));
//! ```
//!
//! Or use a specific construction directly:
//!
//! ```rust
//! use taguchi_doe::construct::{Bose, Constructor};
//!
//! let oa = Bose::try_new(3)
//!     .and_then(|bose| bose.construct(4))
//!     .expect("Failed to construct OA");
//!
//! assert_eq!(oa.runs(), 9);
//! assert_eq!(oa.factors(), 4);
//! ```
//!
//! ## Notation
//!
//! An orthogonal array is denoted as OA(N, k, s, t) where:
//! - **N**: Number of runs (rows)
//! - **k**: Number of factors (columns)
//! - **s**: Number of levels (symbols 0, 1, ..., s-1)
//! - **t**: Strength (every t-column subarray contains all s^t tuples equally)
//!
//! ## Features
//!
//! - `parallel`: Verify column combinations in parallel using rayon

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod accounting;
pub mod builder;
pub mod catalogue;
pub mod config;
pub mod construct;
pub mod doe;
pub mod error;
pub mod gf;
pub mod oa;
pub mod service;
pub mod utils;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::accounting::DesignAccounting;
    pub use crate::builder::{build_oa, OABuilder};
    pub use crate::catalogue::{CatalogueFilter, StandardArrayInfo};
    pub use crate::config::{AnalysisSettings, EngineConfig, Limits};
    pub use crate::construct::{
        AddelmanKempthorne, Algorithm, Bose, Bush, Construction, Constructor, Hadamard, RaoHamming,
    };
    pub use crate::doe::{
        analyze, analyze_experiment, ANOVAEntry, ANOVAResult, AnalysisConfig, ConfidenceInterval,
        DOEAnalysis, ExperimentConfig, MainEffect, MeasurementSet, OptimalSettings,
        OptimizationType, SNRatioEffect,
    };
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::gf::Field;
    pub use crate::oa::{compute_strength, verify_matrix, BalanceReport, OAParams, VerificationReport, OA};
    pub use crate::service::Engine;
    pub use crate::utils::{factor_prime_power, is_prime, is_prime_power};
}

// Re-export commonly used items at crate root
pub use builder::{build_oa, OABuilder};
pub use construct::available_constructions;
pub use error::{Error, ErrorKind, Result};
pub use oa::{compute_strength, verify_matrix, OA};
pub use service::Engine;
pub use utils::{is_prime, is_prime_power};
