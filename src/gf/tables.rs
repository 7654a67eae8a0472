//! Precomputed arithmetic tables for GF(q).
//!
//! Fields used by the constructions are small (q ≤ a few hundred), so full
//! q×q addition and multiplication tables make every operation a lookup.

use tracing::debug;

use super::poly;
use crate::error::{Error, Result};
use crate::utils::factor_prime_power;

/// Lookup tables for one finite field.
#[derive(Debug, Clone)]
pub struct GfTables {
    order: u32,
    characteristic: u32,
    degree: u32,
    /// Lower coefficients of the defining polynomial; `[0]` for prime fields.
    modulus: Vec<u32>,
    add: Vec<u32>,
    mul: Vec<u32>,
    neg: Vec<u32>,
    /// `inv[0]` is unused.
    inv: Vec<u32>,
    is_square: Vec<bool>,
    primitive: u32,
}

impl GfTables {
    /// Build the tables for GF(q).
    ///
    /// # Errors
    ///
    /// Returns `InvalidFieldOrder` if `q` is not a prime power, and
    /// `ConstructionFailed` if no primitive polynomial exists (which cannot
    /// happen for a true prime power but is reported rather than assumed).
    pub fn new(q: u32) -> Result<Self> {
        let pp = factor_prime_power(q).ok_or(Error::InvalidFieldOrder(q))?;
        let (p, n) = (pp.prime, pp.exponent);

        let modulus = if n == 1 {
            vec![0]
        } else {
            poly::find_primitive_poly(p, n).ok_or_else(|| {
                Error::construction_failed(format!("no primitive polynomial for GF({q})"))
            })?
        };

        let size = q as usize;
        let mut add = vec![0u32; size * size];
        let mut mul = vec![0u32; size * size];
        for a in 0..q {
            for b in 0..q {
                let idx = (a * q + b) as usize;
                if n == 1 {
                    add[idx] = (a + b) % q;
                    mul[idx] = (a * b) % q;
                } else {
                    add[idx] = poly::add(a, b, p, n);
                    mul[idx] = poly::mul_mod(a, b, p, &modulus);
                }
            }
        }

        let find_in_row = |table: &[u32], a: u32, target: u32| -> u32 {
            let row = &table[(a * q) as usize..((a + 1) * q) as usize];
            row.iter().position(|&v| v == target).map_or(0, |b| b as u32)
        };

        let neg: Vec<u32> = (0..q).map(|a| find_in_row(&add, a, 0)).collect();
        let mut inv = vec![0u32; size];
        for a in 1..q {
            inv[a as usize] = find_in_row(&mul, a, 1);
        }

        let mut is_square = vec![false; size];
        for a in 1..q {
            is_square[mul[(a * q + a) as usize] as usize] = true;
        }

        let primitive = Self::find_generator(q, &mul);

        debug!(order = q, characteristic = p, degree = n, primitive, "built GF tables");

        Ok(Self {
            order: q,
            characteristic: p,
            degree: n,
            modulus,
            add,
            mul,
            neg,
            inv,
            is_square,
            primitive,
        })
    }

    /// Smallest element whose powers cover the multiplicative group.
    fn find_generator(q: u32, mul: &[u32]) -> u32 {
        if q == 2 {
            return 1;
        }
        (2..q)
            .find(|&g| {
                let mut e = 1;
                for k in 1..q {
                    e = mul[(e * q + g) as usize];
                    if e == 1 {
                        return k == q - 1;
                    }
                }
                false
            })
            .unwrap_or(1)
    }

    /// The field order q.
    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    /// The characteristic p.
    #[must_use]
    pub fn characteristic(&self) -> u32 {
        self.characteristic
    }

    /// The extension degree n, with q = p^n.
    #[must_use]
    pub fn degree(&self) -> u32 {
        self.degree
    }

    /// Lower coefficients of the defining polynomial.
    #[must_use]
    pub fn modulus(&self) -> &[u32] {
        &self.modulus
    }

    /// `a + b`.
    #[inline]
    #[must_use]
    pub fn add(&self, a: u32, b: u32) -> u32 {
        self.add[(a * self.order + b) as usize]
    }

    /// `a * b`.
    #[inline]
    #[must_use]
    pub fn mul(&self, a: u32, b: u32) -> u32 {
        self.mul[(a * self.order + b) as usize]
    }

    /// `-a`.
    #[inline]
    #[must_use]
    pub fn neg(&self, a: u32) -> u32 {
        self.neg[a as usize]
    }

    /// `a^-1`, or `None` for zero.
    #[inline]
    #[must_use]
    pub fn inv(&self, a: u32) -> Option<u32> {
        (a != 0).then(|| self.inv[a as usize])
    }

    /// Whether `a` is a non-zero square.
    #[inline]
    #[must_use]
    pub fn is_square(&self, a: u32) -> bool {
        self.is_square[a as usize]
    }

    /// The cached primitive element.
    #[must_use]
    pub fn primitive(&self) -> u32 {
        self.primitive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_axioms(t: &GfTables) {
        let q = t.order();
        for a in 0..q {
            assert_eq!(t.add(a, t.neg(a)), 0);
            if a != 0 {
                assert_eq!(t.mul(a, t.inv(a).unwrap()), 1, "GF({q}) inverse of {a}");
            }
            for b in 0..q {
                assert_eq!(t.add(a, b), t.add(b, a));
                assert_eq!(t.mul(a, b), t.mul(b, a));
                for c in (0..q).step_by((q as usize / 5).max(1)) {
                    assert_eq!(
                        t.mul(a, t.add(b, c)),
                        t.add(t.mul(a, b), t.mul(a, c)),
                        "GF({q}) distributivity"
                    );
                }
            }
        }
    }

    #[test]
    fn test_prime_and_extension_fields() {
        for q in [2, 3, 4, 5, 7, 8, 9, 16, 25, 27] {
            let t = GfTables::new(q).unwrap();
            check_axioms(&t);
        }
    }

    #[test]
    fn test_not_prime_power() {
        assert_eq!(GfTables::new(6).unwrap_err(), Error::InvalidFieldOrder(6));
        assert!(GfTables::new(1).is_err());
    }

    #[test]
    fn test_primitive_and_squares() {
        let t = GfTables::new(7).unwrap();
        assert_eq!(t.primitive(), 3);
        let squares: Vec<u32> = (0..7).filter(|&a| t.is_square(a)).collect();
        assert_eq!(squares, vec![1, 2, 4]);
        assert!(t.inv(0).is_none());

        assert_eq!(GfTables::new(2).unwrap().primitive(), 1);
    }
}
