//! Galois field arithmetic for array construction.
//!
//! [`Field`] is GF(q) for a prime power q = p^n. Elements are plain `u32`
//! values in `0..q`; for extension fields the value encodes the polynomial
//! `Σ a_i x^i` as `Σ a_i p^i`. Every operation is a table lookup.
//!
//! ```
//! use taguchi_doe::gf::Field;
//!
//! let gf9 = Field::new(9).unwrap();
//! let a = gf9.element(5).unwrap();
//! let b = gf9.inv(a).unwrap();
//! assert_eq!(gf9.mul(a, b), 1);
//! assert_eq!(gf9.add(a, gf9.neg(a)), 0);
//! ```

mod poly;
mod tables;

pub use tables::GfTables;

use std::sync::Arc;

use crate::error::{Error, Result};

/// The finite field GF(q).
///
/// Cloning is cheap: the tables are shared.
///
/// Methods taking elements index the tables directly and panic when given a
/// value outside `0..q`; use [`Field::element`] to validate untrusted input.
#[derive(Debug, Clone)]
pub struct Field {
    tables: Arc<GfTables>,
}

impl Field {
    /// Build GF(q).
    ///
    /// # Errors
    ///
    /// Returns `InvalidFieldOrder` if `q` is not a prime power.
    pub fn new(q: u32) -> Result<Self> {
        Ok(Self {
            tables: Arc::new(GfTables::new(q)?),
        })
    }

    /// The underlying lookup tables.
    #[must_use]
    pub fn tables(&self) -> &GfTables {
        &self.tables
    }

    /// Number of elements q.
    #[must_use]
    pub fn order(&self) -> u32 {
        self.tables.order()
    }

    /// The prime p with q = p^n.
    #[must_use]
    pub fn characteristic(&self) -> u32 {
        self.tables.characteristic()
    }

    /// The extension degree n with q = p^n.
    #[must_use]
    pub fn degree(&self) -> u32 {
        self.tables.degree()
    }

    /// Validate an element value.
    ///
    /// # Errors
    ///
    /// Returns `ElementOutOfRange` if `value >= q`.
    pub fn element(&self, value: u32) -> Result<u32> {
        if value >= self.order() {
            return Err(Error::ElementOutOfRange {
                value,
                order: self.order(),
            });
        }
        Ok(value)
    }

    /// All elements `0..q`.
    pub fn elements(&self) -> std::ops::Range<u32> {
        0..self.order()
    }

    /// `a + b`.
    #[must_use]
    pub fn add(&self, a: u32, b: u32) -> u32 {
        self.tables.add(a, b)
    }

    /// `a - b`.
    #[must_use]
    pub fn sub(&self, a: u32, b: u32) -> u32 {
        self.tables.add(a, self.tables.neg(b))
    }

    /// `a * b`.
    #[must_use]
    pub fn mul(&self, a: u32, b: u32) -> u32 {
        self.tables.mul(a, b)
    }

    /// `-a`.
    #[must_use]
    pub fn neg(&self, a: u32) -> u32 {
        self.tables.neg(a)
    }

    /// `a^-1`, or `None` for zero.
    #[must_use]
    pub fn inv(&self, a: u32) -> Option<u32> {
        self.tables.inv(a)
    }

    /// `a / b`.
    ///
    /// # Errors
    ///
    /// Returns `DivisionByZero` if `b` is zero.
    pub fn div(&self, a: u32, b: u32) -> Result<u32> {
        let inv = self.inv(b).ok_or(Error::DivisionByZero {
            order: self.order(),
        })?;
        Ok(self.mul(a, inv))
    }

    /// `a^exp` by repeated squaring. `0^0` is 1.
    #[must_use]
    pub fn pow(&self, a: u32, mut exp: u64) -> u32 {
        let mut base = a;
        let mut acc = 1;
        while exp > 0 {
            if exp & 1 == 1 {
                acc = self.mul(acc, base);
            }
            base = self.mul(base, base);
            exp >>= 1;
        }
        acc
    }

    /// A generator of the multiplicative group (the smallest one).
    #[must_use]
    pub fn primitive_element(&self) -> u32 {
        self.tables.primitive()
    }

    /// Quadratic character: 0 for zero, 1 for a non-zero square, -1 otherwise.
    #[must_use]
    pub fn quadratic_character(&self, a: u32) -> i8 {
        if a == 0 {
            0
        } else if self.tables.is_square(a) {
            1
        } else {
            -1
        }
    }

    /// The smallest non-square, if the field has one (odd q).
    #[must_use]
    pub fn first_non_square(&self) -> Option<u32> {
        (1..self.order()).find(|&a| !self.tables.is_square(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_rejects_composite() {
        assert_eq!(Field::new(12).unwrap_err(), Error::InvalidFieldOrder(12));
    }

    #[test]
    fn test_division() {
        let gf = Field::new(11).unwrap();
        assert_eq!(gf.div(6, 3).unwrap(), 2);
        assert_eq!(
            gf.div(1, 0).unwrap_err(),
            Error::DivisionByZero { order: 11 }
        );
    }

    #[test]
    fn test_primitive_element_generates_group() {
        for q in [3, 4, 5, 8, 9, 13, 16, 25, 27, 32] {
            let gf = Field::new(q).unwrap();
            let g = gf.primitive_element();
            let mut seen: Vec<u32> = (0..u64::from(q - 1)).map(|k| gf.pow(g, k)).collect();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), (q - 1) as usize, "GF({q}) generator {g}");
        }
    }

    #[test]
    fn test_quadratic_character_balance() {
        let gf = Field::new(13).unwrap();
        let total: i32 = gf.elements().map(|a| i32::from(gf.quadratic_character(a))).sum();
        assert_eq!(total, 0);
        assert_eq!(gf.quadratic_character(0), 0);
        assert_eq!(gf.first_non_square(), Some(2));
    }

    #[test]
    fn test_element_range() {
        let gf = Field::new(4).unwrap();
        assert_eq!(gf.element(3).unwrap(), 3);
        assert_eq!(
            gf.element(4).unwrap_err(),
            Error::ElementOutOfRange { value: 4, order: 4 }
        );
    }

    #[test]
    fn test_fermat() {
        let gf = Field::new(27).unwrap();
        for a in 1..27 {
            assert_eq!(gf.pow(a, 26), 1);
        }
    }
}
