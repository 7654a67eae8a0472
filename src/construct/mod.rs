//! Orthogonal array construction algorithms.
//!
//! | Construction | Parameters | Requirements |
//! |-------------|------------|--------------|
//! | [`Bose`] | OA(q², k, q, 2) | Prime power q, k ≤ q+1 |
//! | [`Bush`] | OA(q^t, k, q, t) | Prime power q, t ≥ 2, k ≤ max(q, t)+1 |
//! | [`Hadamard`] | OA(n, k, 2, 2) | n ≡ 0 (mod 4) with a known matrix, k ≤ n-1 |
//! | [`AddelmanKempthorne`] | OA(2s², 2^a s^k, 2) | Odd prime s, a ≤ 1, k ≤ 2s+1 |
//! | [`RaoHamming`] | OA(q^m, k, q, 2) | Prime power q, k ≤ (q^m-1)/(q-1) |
//!
//! Each algorithm is a struct implementing [`Constructor`]. [`Construction`]
//! is the closed set of requests, one variant per algorithm, each carrying its
//! own parameters; [`Construction::build`] validates, applies [`Limits`] and
//! dispatches.
//!
//! ```
//! use taguchi_doe::config::Limits;
//! use taguchi_doe::construct::{BoseParams, Construction};
//!
//! let request = Construction::Bose(BoseParams { levels: 3, factors: None });
//! let oa = request.build(&Limits::default()).unwrap();
//! assert_eq!(oa.runs(), 9);
//! assert_eq!(oa.factors(), 4);
//! ```

mod addelman;
mod bose;
mod bush;
mod hadamard;
mod rao_hamming;

pub use addelman::AddelmanKempthorne;
pub use bose::Bose;
pub use bush::Bush;
pub use hadamard::{hadamard_matrix, is_supported_order, smallest_supported_order, Hadamard};
pub use rao_hamming::RaoHamming;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Limits;
use crate::error::{Error, Result};
use crate::oa::OA;
use crate::utils::{factor_prime_power, is_prime};

/// Common interface of the construction algorithms.
pub trait Constructor: Send + Sync {
    /// Display name of the construction.
    fn name(&self) -> &'static str;

    /// Family of arrays this constructor produces.
    fn family(&self) -> &'static str;

    /// Strength of the produced arrays.
    fn strength(&self) -> u32;

    /// Number of runs of the produced arrays.
    fn runs(&self) -> usize;

    /// Maximum number of factors.
    fn max_factors(&self) -> usize;

    /// Construct an array with the given number of factors.
    ///
    /// # Errors
    ///
    /// Returns an error if `factors` is zero or exceeds `max_factors()`.
    fn construct(&self, factors: usize) -> Result<OA>;
}

/// Construction algorithm identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// [`Bose`]
    Bose,
    /// [`Bush`]
    Bush,
    /// [`Hadamard`]
    Hadamard,
    /// [`AddelmanKempthorne`]
    AddelmanKempthorne,
    /// [`RaoHamming`]
    RaoHamming,
}

impl Algorithm {
    /// Display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bose => "Bose",
            Self::Bush => "Bush",
            Self::Hadamard => "Hadamard",
            Self::AddelmanKempthorne => "Addelman-Kempthorne",
            Self::RaoHamming => "Rao-Hamming",
        }
    }

    /// Short description for option listings.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Bose => "Primary construction for strength 2 arrays",
            Self::Bush => "Higher strength arrays (t >= 2)",
            Self::Hadamard => "Binary arrays from Hadamard matrices",
            Self::AddelmanKempthorne => "Mixed 2-level and odd prime level arrays",
            Self::RaoHamming => "Arrays from linear codes",
        }
    }
}

/// Parameters for [`Bose`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoseParams {
    /// Prime-power level count q.
    pub levels: u32,
    /// Columns to keep; defaults to q + 1.
    #[serde(default)]
    pub factors: Option<usize>,
}

/// Parameters for [`Bush`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BushParams {
    /// Prime-power level count q.
    pub levels: u32,
    /// Strength t ≥ 2.
    pub strength: u32,
    /// Columns to keep; defaults to t + 1.
    #[serde(default)]
    pub factors: Option<usize>,
}

/// Parameters for [`Hadamard`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HadamardParams {
    /// Matrix order n, a multiple of 4.
    pub order: usize,
    /// Columns to keep; defaults to n - 1.
    #[serde(default)]
    pub factors: Option<usize>,
}

/// Parameters for [`AddelmanKempthorne`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddelmanParams {
    /// Two-level factors, 0 or 1.
    pub two_level_factors: usize,
    /// s-level factors, at most 2s + 1.
    pub s_level_factors: usize,
    /// Odd prime s.
    pub s_levels: u32,
}

/// Parameters for [`RaoHamming`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaoHammingParams {
    /// Prime-power level count q.
    pub levels: u32,
    /// Exponent m, giving q^m runs.
    pub exponent: u32,
    /// Columns to keep; defaults to (q^m - 1) / (q - 1).
    #[serde(default)]
    pub factors: Option<usize>,
}

/// A construction request: one variant per algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "kebab-case")]
pub enum Construction {
    /// Bose OA(q², q+1, q, 2).
    Bose(BoseParams),
    /// Bush OA(q^t, t+1, q, t).
    Bush(BushParams),
    /// Hadamard OA(n, n-1, 2, 2).
    Hadamard(HadamardParams),
    /// Addelman-Kempthorne OA(2s², 2^a s^k, 2).
    AddelmanKempthorne(AddelmanParams),
    /// Rao-Hamming OA(q^m, (q^m-1)/(q-1), q, 2).
    RaoHamming(RaoHammingParams),
}

impl Construction {
    /// The algorithm this request runs.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Bose(_) => Algorithm::Bose,
            Self::Bush(_) => Algorithm::Bush,
            Self::Hadamard(_) => Algorithm::Hadamard,
            Self::AddelmanKempthorne(_) => Algorithm::AddelmanKempthorne,
            Self::RaoHamming(_) => Algorithm::RaoHamming,
        }
    }

    /// Display name of the algorithm.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.algorithm().name()
    }

    /// Instantiate the constructor after checking field and order limits.
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded` for fields or Hadamard orders beyond `limits`,
    /// and the constructor's own parameter errors.
    pub fn constructor(&self, limits: &Limits) -> Result<Box<dyn Constructor>> {
        Ok(match self {
            Self::Bose(p) => {
                limits.check_field_order(p.levels)?;
                Box::new(Bose::try_new(p.levels)?)
            }
            Self::Bush(p) => {
                limits.check_field_order(p.levels)?;
                Box::new(Bush::try_new(p.levels, p.strength)?)
            }
            Self::Hadamard(p) => {
                if p.order > limits.max_hadamard_order {
                    return Err(Error::LimitExceeded {
                        what: "Hadamard order",
                        value: p.order as u64,
                        max: limits.max_hadamard_order as u64,
                    });
                }
                Box::new(Hadamard::try_new(p.order)?)
            }
            Self::AddelmanKempthorne(p) => {
                limits.check_field_order(p.s_levels)?;
                Box::new(AddelmanKempthorne::try_new(p.s_levels, p.two_level_factors)?)
            }
            Self::RaoHamming(p) => {
                limits.check_field_order(p.levels)?;
                Box::new(RaoHamming::try_new(p.levels, p.exponent)?)
            }
        })
    }

    /// Requested column count, or the algorithm's default.
    fn factors(&self, constructor: &dyn Constructor) -> usize {
        match self {
            Self::Bose(p) => p.factors.unwrap_or(constructor.max_factors()),
            Self::Bush(p) => p.factors.unwrap_or(p.strength as usize + 1),
            Self::Hadamard(p) => p.factors.unwrap_or(constructor.max_factors()),
            Self::AddelmanKempthorne(p) => p.two_level_factors + p.s_level_factors,
            Self::RaoHamming(p) => p.factors.unwrap_or(constructor.max_factors()),
        }
    }

    /// Build the requested array.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams`-kind errors when the parameters violate the
    /// algorithm's preconditions or `limits`, and `ConstructionFailed` when a
    /// valid request cannot be realised (an unsupported Hadamard order).
    pub fn build(&self, limits: &Limits) -> Result<OA> {
        if let Self::AddelmanKempthorne(p) = self {
            if p.s_level_factors > 2 * p.s_levels as usize + 1 {
                return Err(Error::TooManyFactors {
                    factors: p.s_level_factors,
                    max: 2 * p.s_levels as usize + 1,
                    algorithm: "Addelman-Kempthorne",
                });
            }
        }
        let constructor = self.constructor(limits)?;
        limits.check_runs(constructor.runs())?;
        let factors = self.factors(constructor.as_ref());
        let oa = constructor.construct(factors)?;
        debug!(
            algorithm = constructor.name(),
            runs = oa.runs(),
            factors = oa.factors(),
            strength = oa.strength(),
            "constructed array"
        );
        Ok(oa)
    }
}

/// A construction that applies to a (levels, strength) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructionOption {
    /// Display name.
    pub name: String,
    /// Algorithm identifier.
    pub algorithm: Algorithm,
    /// Runs of the resulting array.
    pub runs: usize,
    /// Most factors the array can carry.
    pub max_factors: usize,
    /// What the construction is for.
    pub description: String,
    /// Preconditions and bounds, one per entry.
    pub constraints: Vec<String>,
}

impl ConstructionOption {
    fn new(algorithm: Algorithm, runs: usize, max_factors: usize, constraints: Vec<String>) -> Self {
        Self {
            name: algorithm.name().to_string(),
            algorithm,
            runs,
            max_factors,
            description: algorithm.description().to_string(),
            constraints,
        }
    }
}

/// Hadamard orders listed individually; larger orders only as powers of two.
const LISTED_HADAMARD_ORDERS: usize = 64;

/// List the constructions applicable to `levels` at `strength`.
///
/// Purely descriptive: nothing is built. Options whose run count exceeds
/// `limits.max_runs` are left out.
///
/// ```
/// use taguchi_doe::config::Limits;
/// use taguchi_doe::construct::available_constructions;
///
/// let options = available_constructions(3, 2, &Limits::default());
/// let names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
/// assert!(names.contains(&"Bose"));
/// assert!(names.contains(&"Addelman-Kempthorne"));
/// ```
#[must_use]
pub fn available_constructions(levels: u32, strength: u32, limits: &Limits) -> Vec<ConstructionOption> {
    let mut options = Vec::new();
    if strength == 0 || levels < 2 {
        return options;
    }
    let prime_power = factor_prime_power(levels).filter(|_| levels <= limits.max_field_order);
    let q = levels as usize;

    if levels == 2 && strength <= 2 {
        let max_order = limits.max_hadamard_order.min(limits.max_runs);
        options.extend(
            (4..=max_order)
                .step_by(4)
                .filter(|&n| (n <= LISTED_HADAMARD_ORDERS || n.is_power_of_two()) && is_supported_order(n))
                .map(|n| {
                    ConstructionOption::new(
                        Algorithm::Hadamard,
                        n,
                        n - 1,
                        vec![
                            "Only for 2 levels".to_string(),
                            "Runs must be a multiple of 4".to_string(),
                            format!("Max {} factors", n - 1),
                        ],
                    )
                }),
        );
    }

    if prime_power.is_some() && strength <= 2 {
        options.push(ConstructionOption::new(
            Algorithm::Bose,
            q * q,
            q + 1,
            vec![
                format!("Requires {levels} to be a prime power"),
                "Strength 2".to_string(),
                format!("Max {} factors", q + 1),
            ],
        ));

        for m in 2..=5u32 {
            let Some(runs) = q.checked_pow(m) else { break };
            if runs > limits.max_runs {
                break;
            }
            let k = (runs - 1) / (q - 1);
            options.push(ConstructionOption::new(
                Algorithm::RaoHamming,
                runs,
                k,
                vec![
                    format!("Requires {levels} to be a prime power"),
                    format!("Max {k} factors"),
                ],
            ));
        }
    }

    if is_prime(levels) && levels != 2 && strength <= 2 && levels <= limits.max_field_order {
        options.push(ConstructionOption::new(
            Algorithm::AddelmanKempthorne,
            2 * q * q,
            2 * q + 1,
            vec![
                "Requires odd prime levels".to_string(),
                "At most one 2-level factor".to_string(),
                format!("Max {} {levels}-level factors", 2 * q + 1),
            ],
        ));
    }

    if prime_power.is_some() && strength >= 2 {
        if let Some(runs) = q.checked_pow(strength).filter(|&r| r <= limits.max_runs) {
            let max_factors = q.max(strength as usize) + 1;
            options.push(ConstructionOption::new(
                Algorithm::Bush,
                runs,
                max_factors,
                vec![
                    format!("Requires {levels} to be a prime power"),
                    format!("Strength {strength} needs {levels}^{strength} runs"),
                    format!("Max {max_factors} factors"),
                ],
            ));
        }
    }

    options.retain(|o| o.runs <= limits.max_runs);
    options
}
