//! Hadamard-matrix construction for two-level orthogonal arrays.
//!
//! A Hadamard matrix H of order n has ±1 entries and `H·Hᵀ = n·I`. Normalising
//! every row so its first entry is +1 and dropping the first column leaves
//! n - 1 mutually orthogonal balanced columns: OA(n, n-1, 2, 2).
//!
//! ## Supported orders
//!
//! Orders 1 and 2 are base cases. Beyond that n must be a multiple of 4, and
//! one of these must apply:
//!
//! - **Sylvester**: n is a power of two, built by doubling `[[H, H], [H, -H]]`
//! - **Paley I**: n - 1 is a prime power q ≡ 3 (mod 4)
//! - **Paley II**: n / 2 - 1 is a prime power q ≡ 1 (mod 4)
//! - **Doubling**: n / 2 is itself supported
//!
//! Below 200 this leaves 92, 116, 156, 172, 184 and 188 without a
//! construction.
//!
//! ```
//! use taguchi_doe::construct::{Constructor, Hadamard};
//!
//! // Plackett-Burman 12-run design from Paley I over GF(11)
//! let h = Hadamard::try_new(12).unwrap();
//! let oa = h.construct(11).unwrap();
//! assert_eq!(oa.runs(), 12);
//! assert_eq!(oa.factors(), 11);
//! ```

use ndarray::{s, Array2};
use tracing::{debug, warn};

use super::Constructor;
use crate::error::{Error, Result};
use crate::gf::Field;
use crate::oa::{OAParams, OA};
use crate::utils::factor_prime_power;

/// Two-level strength-2 arrays from a Hadamard matrix.
#[derive(Debug, Clone)]
pub struct Hadamard {
    order: usize,
    matrix: Array2<i8>,
}

impl Hadamard {
    /// Build the Hadamard matrix of the given order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParams` unless the order is a positive multiple of 4,
    /// and `ConstructionFailed` when no supported method reaches that order.
    pub fn try_new(order: usize) -> Result<Self> {
        if order == 0 || order % 4 != 0 {
            return Err(Error::invalid_params(format!(
                "Hadamard order must be a positive multiple of 4, got {order}"
            )));
        }
        let matrix = hadamard_matrix(order)?;
        debug!(order, "built Hadamard matrix");
        Ok(Self { order, matrix })
    }

    /// Order of the underlying matrix.
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    /// The ±1 matrix.
    #[must_use]
    pub fn matrix(&self) -> &Array2<i8> {
        &self.matrix
    }
}

impl Constructor for Hadamard {
    fn name(&self) -> &'static str {
        "Hadamard"
    }

    fn family(&self) -> &'static str {
        "OA(n, k, 2, 2), n ≡ 0 (mod 4), k ≤ n-1"
    }

    fn strength(&self) -> u32 {
        2
    }

    fn runs(&self) -> usize {
        self.order
    }

    fn max_factors(&self) -> usize {
        self.order - 1
    }

    fn construct(&self, factors: usize) -> Result<OA> {
        let max = self.max_factors();
        if factors > max {
            return Err(Error::TooManyFactors {
                factors,
                max,
                algorithm: "Hadamard",
            });
        }
        if factors == 0 {
            return Err(Error::invalid_params("factors must be at least 1"));
        }

        let n = self.order;
        let mut data = Array2::zeros((n, factors));
        for r in 0..n {
            let sign = self.matrix[[r, 0]];
            for c in 0..factors {
                data[[r, c]] = u32::from(self.matrix[[r, c + 1]] * sign != 1);
            }
        }

        let strength = 2.min(factors as u32);
        let params = OAParams::new(n, factors, 2, strength)?;
        OA::try_new(data, params)
    }
}

/// Whether [`hadamard_matrix`] can build the given order.
#[must_use]
pub fn is_supported_order(n: usize) -> bool {
    match n {
        0 => false,
        1 | 2 => true,
        _ if n % 4 != 0 => false,
        _ if n.is_power_of_two() => true,
        _ => paley_one_field(n).is_some() || paley_two_field(n).is_some() || is_supported_order(n / 2),
    }
}

/// Smallest supported multiple-of-4 order that is at least `min`.
#[must_use]
pub fn smallest_supported_order(min: usize, max: usize) -> Option<usize> {
    let start = min.max(4).div_ceil(4) * 4;
    (start..=max).step_by(4).find(|&n| is_supported_order(n))
}

/// Build a Hadamard matrix of order n.
///
/// # Errors
///
/// Returns `ConstructionFailed` if the order is unsupported or a Paley base
/// fails its orthogonality check.
pub fn hadamard_matrix(n: usize) -> Result<Array2<i8>> {
    match n {
        0 => Err(Error::invalid_params("Hadamard order must be positive")),
        1 => Ok(Array2::ones((1, 1))),
        2 => Ok(ndarray::array![[1, 1], [1, -1]]),
        _ if n % 4 != 0 => Err(Error::invalid_params(format!(
            "Hadamard order must be a multiple of 4, got {n}"
        ))),
        _ if n.is_power_of_two() => Ok(double(&hadamard_matrix(n / 2)?)),
        _ => {
            if let Some(q) = paley_one_field(n) {
                return checked(paley_one(q)?);
            }
            if let Some(q) = paley_two_field(n) {
                return checked(paley_two(q)?);
            }
            if is_supported_order(n / 2) {
                return Ok(double(&hadamard_matrix(n / 2)?));
            }
            warn!(order = n, "no Hadamard construction for this order");
            Err(Error::construction_failed(format!(
                "no known Hadamard construction for order {n}"
            )))
        }
    }
}

/// q = n - 1 when it is a prime power ≡ 3 (mod 4).
fn paley_one_field(n: usize) -> Option<u32> {
    let q = u32::try_from(n - 1).ok()?;
    (q % 4 == 3 && factor_prime_power(q).is_some()).then_some(q)
}

/// q = n / 2 - 1 when it is a prime power ≡ 1 (mod 4).
fn paley_two_field(n: usize) -> Option<u32> {
    let q = u32::try_from((n / 2).checked_sub(1)?).ok()?;
    (q % 4 == 1 && factor_prime_power(q).is_some()).then_some(q)
}

/// Paley I: order q + 1.
fn paley_one(q: u32) -> Result<Array2<i8>> {
    let field = Field::new(q)?;
    let n = q as usize + 1;
    let mut h = Array2::<i8>::ones((n, n));
    for i in 1..n {
        h[[i, 0]] = -1;
        for j in 1..n {
            if i != j {
                let diff = field.sub((j - 1) as u32, (i - 1) as u32);
                h[[i, j]] = field.quadratic_character(diff);
            }
        }
    }
    Ok(h)
}

/// Paley II: order 2(q + 1).
fn paley_two(q: u32) -> Result<Array2<i8>> {
    let field = Field::new(q)?;
    let m = q as usize + 1;

    // Symmetric conference matrix.
    let mut c = Array2::<i8>::zeros((m, m));
    for j in 1..m {
        c[[0, j]] = 1;
        c[[j, 0]] = 1;
    }
    for i in 1..m {
        for j in 1..m {
            let diff = field.sub((j - 1) as u32, (i - 1) as u32);
            c[[i, j]] = field.quadratic_character(diff);
        }
    }

    let mut h = Array2::<i8>::zeros((2 * m, 2 * m));
    for i in 0..m {
        for j in 0..m {
            let d = i8::from(i == j);
            let v = c[[i, j]];
            h[[i, j]] = v + d;
            h[[i, j + m]] = v - d;
            h[[i + m, j]] = v - d;
            h[[i + m, j + m]] = -v - d;
        }
    }
    Ok(h)
}

/// `[[H, H], [H, -H]]`.
fn double(h: &Array2<i8>) -> Array2<i8> {
    let n = h.nrows();
    let mut out = Array2::zeros((2 * n, 2 * n));
    out.slice_mut(s![..n, ..n]).assign(h);
    out.slice_mut(s![..n, n..]).assign(h);
    out.slice_mut(s![n.., ..n]).assign(h);
    out.slice_mut(s![n.., n..]).assign(&h.mapv(|v| -v));
    out
}

/// Confirm `H·Hᵀ = n·I`.
fn checked(h: Array2<i8>) -> Result<Array2<i8>> {
    let n = h.nrows();
    let f = h.mapv(f64::from);
    let gram = f.dot(&f.t());
    let ok = gram.indexed_iter().all(|((i, j), &v)| {
        let expected = if i == j { n as f64 } else { 0.0 };
        (v - expected).abs() < 0.5
    });
    if ok {
        Ok(h)
    } else {
        Err(Error::construction_failed(format!(
            "Paley matrix of order {n} failed the orthogonality check"
        )))
    }
}
