//! Builder pattern for constructing orthogonal arrays.
//!
//! The builder provides a convenient API for creating orthogonal arrays
//! without needing to know which construction algorithm to use.
//!
//! # Example
//!
//! ```
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
//! assert_eq!(oa.runs(), 9);    // Uses Bose: 3²
//! assert_eq!(oa.factors(), 4);
//! assert_eq!(oa.symmetric_levels(), Some(3));
//! ```
//!
//! # Construction Selection
//!
//! Candidates are tried in order and the first that builds wins:
//!
//! - **Binary factors, strength ≤ 2**: the smallest supported Hadamard order
//!   with room for the factors
//! - **Prime power levels, strength ≤ 2**: Bose, then Rao-Hamming with the
//!   smallest exponent that fits
//! - **Higher strength**: Bush
//! - **Mixed levels**: Addelman-Kempthorne for one optional 2-level factor
//!   plus odd-prime-level factors, otherwise a symmetric array over a prime
//!   power q that every level count divides, with columns collapsed by
//!   `v mod s`
//!
//! An explicit [`OABuilder::algorithm`] bypasses selection and never falls
//! back to another construction.

use tracing::debug;

use crate::config::Limits;
use crate::construct::{
    AddelmanParams, Algorithm, BoseParams, BushParams, Construction, HadamardParams,
    RaoHammingParams,
};
use crate::error::{Error, Result};
use crate::oa::OA;
use crate::utils::{is_prime, is_prime_power};

/// Largest Rao-Hamming exponent tried during selection.
const MAX_RAO_HAMMING_EXPONENT: u32 = 8;

/// Builder for constructing orthogonal arrays.
///
/// ```
/// use taguchi_doe::OABuilder;
///
/// let oa = OABuilder::new()
///     .levels(3)
///     .factors(4)
///     .strength(3)
///     .build()
///     .unwrap();
///
/// assert_eq!(oa.strength(), 3);
/// assert_eq!(oa.runs(), 27);  // Bush: 3³
/// ```
#[derive(Debug, Clone, Default)]
pub struct OABuilder {
    levels: Option<Vec<u32>>,
    factors: Option<usize>,
    strength: Option<u32>,
    min_runs: Option<usize>,
    algorithm: Option<Algorithm>,
    limits: Limits,
}

/// A per-factor level specification resolved against the factor count.
#[derive(Debug, Clone)]
struct Request {
    levels: Vec<u32>,
    factors: usize,
    strength: u32,
    min_runs: usize,
}

impl Request {
    fn symmetric(&self) -> Option<u32> {
        let first = *self.levels.first()?;
        self.levels.iter().all(|&s| s == first).then_some(first)
    }

    fn describe_levels(&self) -> String {
        match self.symmetric() {
            Some(s) => s.to_string(),
            None => format!("{:?}", self.levels),
        }
    }

    fn no_suitable(&self) -> Error {
        Error::NoSuitableAlgorithm {
            levels: self.describe_levels(),
            factors: self.factors,
            strength: self.strength,
        }
    }
}

impl OABuilder {
    /// Create a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of levels for all factors (symmetric OA).
    #[must_use]
    pub fn levels(mut self, levels: u32) -> Self {
        self.levels = Some(vec![levels]);
        self
    }

    /// Set the number of levels for each factor (mixed-level OA).
    ///
    /// Also sets the number of factors.
    #[must_use]
    pub fn mixed_levels(mut self, levels: Vec<u32>) -> Self {
        self.factors = Some(levels.len());
        self.levels = Some(levels);
        self
    }

    /// Set the number of factors.
    #[must_use]
    pub fn factors(mut self, factors: usize) -> Self {
        self.factors = Some(factors);
        self
    }

    /// Set the strength of the array. Defaults to 2.
    #[must_use]
    pub fn strength(mut self, strength: u32) -> Self {
        self.strength = Some(strength);
        self
    }

    /// Require at least this many runs.
    #[must_use]
    pub fn min_runs(mut self, min_runs: usize) -> Self {
        self.min_runs = Some(min_runs);
        self
    }

    /// Use exactly this algorithm.
    #[must_use]
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    /// Construction bounds. Defaults to [`Limits::default`].
    #[must_use]
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    fn resolve(&self) -> Result<Request> {
        let levels = self
            .levels
            .clone()
            .ok_or_else(|| Error::invalid_params("levels must be specified"))?;
        let factors = self
            .factors
            .ok_or_else(|| Error::invalid_params("factors must be specified"))?;
        let strength = self.strength.unwrap_or(2);

        if factors == 0 {
            return Err(Error::invalid_params("factors must be at least 1"));
        }
        if levels.iter().any(|&s| s < 2) || levels.is_empty() {
            return Err(Error::invalid_params("levels must be at least 2"));
        }
        if strength == 0 {
            return Err(Error::invalid_params("strength must be at least 1"));
        }
        if strength as usize > factors {
            return Err(Error::invalid_params(format!(
                "strength {strength} cannot exceed factors {factors}"
            )));
        }

        let levels = match levels.as_slice() {
            [s] => vec![*s; factors],
            _ if levels.len() == factors => levels,
            _ => {
                return Err(Error::DimensionMismatch {
                    expected: format!("{factors} level counts"),
                    actual: levels.len().to_string(),
                })
            }
        };

        Ok(Request {
            levels,
            factors,
            strength,
            min_runs: self.min_runs.unwrap_or(0),
        })
    }

    /// Build the orthogonal array.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` for missing or inconsistent parameters,
    /// `NoSuitableAlgorithm` when no construction covers them, and the
    /// algorithm's own error when one was given explicitly.
    pub fn build(self) -> Result<OA> {
        self.build_with_algorithm().map(|(oa, _)| oa)
    }

    /// Build the orthogonal array and report which algorithm produced it.
    ///
    /// # Errors
    ///
    /// See [`OABuilder::build`].
    pub fn build_with_algorithm(self) -> Result<(OA, Algorithm)> {
        let request = self.resolve()?;

        if let Some(algorithm) = self.algorithm {
            let oa = self.build_explicit(algorithm, &request)?;
            return Ok((oa, algorithm));
        }

        match request.symmetric() {
            Some(s) => self.auto_select(s, &request),
            None => self.build_mixed(&request),
        }
    }

    /// Build with the caller's algorithm; errors are final.
    fn build_explicit(&self, algorithm: Algorithm, request: &Request) -> Result<OA> {
        let k = request.factors;
        let construction = match (algorithm, request.symmetric()) {
            (Algorithm::AddelmanKempthorne, _) => {
                return self.build_addelman(request)?.ok_or_else(|| request.no_suitable());
            }
            (_, None) => {
                return Err(Error::invalid_params(format!(
                    "{} requires a single level count",
                    algorithm.name()
                )))
            }
            (Algorithm::Bose, Some(s)) => Construction::Bose(BoseParams {
                levels: s,
                factors: Some(k),
            }),
            (Algorithm::Bush, Some(s)) => Construction::Bush(BushParams {
                levels: s,
                strength: request.strength.max(2),
                factors: Some(k),
            }),
            (Algorithm::Hadamard, Some(s)) => {
                if s != 2 {
                    return Err(Error::UnsupportedLevels {
                        levels: s,
                        requirement: "must be 2",
                        algorithm: "Hadamard",
                    });
                }
                let order = hadamard_order(k, request.min_runs, &self.limits)
                    .ok_or_else(|| request.no_suitable())?;
                Construction::Hadamard(HadamardParams {
                    order,
                    factors: Some(k),
                })
            }
            (Algorithm::RaoHamming, Some(s)) => {
                let exponent = rao_hamming_exponent(s, k, request.min_runs, &self.limits)
                    .ok_or_else(|| request.no_suitable())?;
                Construction::RaoHamming(RaoHammingParams {
                    levels: s,
                    exponent,
                    factors: Some(k),
                })
            }
        };
        let oa = construction.build(&self.limits)?;
        check_fit(&oa, request)?;
        Ok(oa)
    }

    /// Try the symmetric candidates in order.
    fn auto_select(&self, s: u32, request: &Request) -> Result<(OA, Algorithm)> {
        let k = request.factors;
        let t = request.strength;
        let mut candidates = Vec::new();

        if s == 2 && t <= 2 {
            if let Some(order) = hadamard_order(k, request.min_runs, &self.limits) {
                candidates.push(Construction::Hadamard(HadamardParams {
                    order,
                    factors: Some(k),
                }));
            }
        }

        if is_prime_power(s) && t <= 2 {
            candidates.push(Construction::Bose(BoseParams {
                levels: s,
                factors: Some(k),
            }));
            if let Some(exponent) = rao_hamming_exponent(s, k, request.min_runs, &self.limits) {
                candidates.push(Construction::RaoHamming(RaoHammingParams {
                    levels: s,
                    exponent,
                    factors: Some(k),
                }));
            }
        }

        if is_prime_power(s) && t >= 3 {
            candidates.push(Construction::Bush(BushParams {
                levels: s,
                strength: t,
                factors: Some(k),
            }));
        }

        for construction in candidates {
            match construction.build(&self.limits).and_then(|oa| check_fit(&oa, request).map(|()| oa)) {
                Ok(oa) => return Ok((oa, construction.algorithm())),
                Err(e) => debug!(algorithm = construction.name(), error = %e, "candidate rejected"),
            }
        }
        Err(request.no_suitable())
    }

    /// Mixed levels: Addelman-Kempthorne, then collapse from a prime power.
    fn build_mixed(&self, request: &Request) -> Result<(OA, Algorithm)> {
        if let Some(oa) = self.build_addelman(request)? {
            return Ok((oa, Algorithm::AddelmanKempthorne));
        }

        let max_level = request.levels.iter().copied().max().unwrap_or(2);
        for q in max_level..=self.limits.max_field_order {
            if !is_prime_power(q) || request.levels.iter().any(|&s| q % s != 0) {
                continue;
            }
            let Ok((base, algorithm)) = self.auto_select(q, request) else {
                continue;
            };
            let mut oa = base;
            for (i, &s) in request.levels.iter().enumerate() {
                if s < q {
                    oa = oa.collapse_levels(i, s)?;
                }
            }
            debug!(q, algorithm = algorithm.name(), "collapsed symmetric array to mixed levels");
            return Ok((oa, algorithm));
        }
        Err(request.no_suitable())
    }

    /// Addelman-Kempthorne when the levels are `{2 at most once, s odd prime}`,
    /// with columns permuted into request order. `None` if the level set
    /// does not fit.
    fn build_addelman(&self, request: &Request) -> Result<Option<OA>> {
        if request.strength > 2 {
            return Ok(None);
        }
        let twos = request.levels.iter().filter(|&&s| s == 2).count();
        let odd: Vec<u32> = request.levels.iter().copied().filter(|&s| s != 2).collect();
        let Some(&s) = odd.first() else {
            return Ok(None);
        };
        if twos > 1 || odd.iter().any(|&x| x != s) || !is_prime(s) {
            return Ok(None);
        }
        let runs = 2 * (s as usize).pow(2);
        if runs < request.min_runs || odd.len() > 2 * s as usize + 1 {
            return Ok(None);
        }

        let oa = Construction::AddelmanKempthorne(AddelmanParams {
            two_level_factors: twos,
            s_level_factors: odd.len(),
            s_levels: s,
        })
        .build(&self.limits)?;

        // The two-level column comes first in the construction.
        let mut next_odd = twos;
        let order: Vec<usize> = request
            .levels
            .iter()
            .map(|&level| {
                if level == 2 {
                    0
                } else {
                    next_odd += 1;
                    next_odd - 1
                }
            })
            .collect();
        oa.select_columns(&order).map(Some)
    }
}

/// Smallest supported Hadamard order with room for `factors` columns.
fn hadamard_order(factors: usize, min_runs: usize, limits: &Limits) -> Option<usize> {
    let max = limits.max_hadamard_order.min(limits.max_runs);
    crate::construct::smallest_supported_order((factors + 1).max(min_runs), max)
}

/// Smallest Rao-Hamming exponent (≥ 2) fitting `factors` and `min_runs`.
fn rao_hamming_exponent(q: u32, factors: usize, min_runs: usize, limits: &Limits) -> Option<u32> {
    let q = q as usize;
    (2..=MAX_RAO_HAMMING_EXPONENT)
        .map_while(|m| q.checked_pow(m).filter(|&n| n <= limits.max_runs).map(|n| (m, n)))
        .find(|&(_, n)| (n - 1) / (q - 1) >= factors && n >= min_runs)
        .map(|(m, _)| m)
}

fn check_fit(oa: &OA, request: &Request) -> Result<()> {
    if oa.runs() < request.min_runs {
        return Err(Error::invalid_params(format!(
            "{} runs is below the requested minimum {}",
            oa.runs(),
            request.min_runs
        )));
    }
    if oa.strength() < request.strength {
        return Err(Error::InvalidStrength {
            strength: request.strength,
            min: 1,
            max: oa.strength(),
            algorithm: "selected construction",
        });
    }
    Ok(())
}

/// Convenience function to build a symmetric orthogonal array.
///
/// ```
/// use taguchi_doe::build_oa;
///
/// let oa = build_oa(3, 4, 2).unwrap();
/// assert_eq!(oa.factors(), 4);
/// assert_eq!(oa.runs(), 9);  // Bose: 3²
/// ```
///
/// # Errors
///
/// See [`OABuilder::build`].
pub fn build_oa(levels: u32, factors: usize, strength: u32) -> Result<OA> {
    OABuilder::new()
        .levels(levels)
        .factors(factors)
        .strength(strength)
        .build()
}
