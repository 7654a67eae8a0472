//! Polynomial arithmetic over GF(p) for building extension fields.
//!
//! An element of GF(p^n) is a polynomial of degree < n over GF(p), encoded
//! as the integer `Σ a_i p^i`. A modulus is stored as its lower coefficients
//! `[c_0, .., c_{n-1}]` of the monic polynomial `x^n + c_{n-1} x^{n-1} + .. + c_0`.

/// Base-p digits of `value`, least significant first, padded to `n`.
pub(crate) fn digits(mut value: u32, p: u32, n: u32) -> Vec<u32> {
    let mut out = Vec::with_capacity(n as usize);
    for _ in 0..n {
        out.push(value % p);
        value /= p;
    }
    out
}

/// Inverse of [`digits`].
pub(crate) fn encode(coeffs: &[u32], p: u32) -> u32 {
    coeffs.iter().rev().fold(0, |acc, &c| acc * p + c)
}

/// Coefficient-wise sum of two encoded elements.
pub(crate) fn add(a: u32, b: u32, p: u32, n: u32) -> u32 {
    let da = digits(a, p, n);
    let db = digits(b, p, n);
    let sum: Vec<u32> = da.iter().zip(&db).map(|(x, y)| (x + y) % p).collect();
    encode(&sum, p)
}

/// Product of two encoded elements reduced modulo `modulus`.
pub(crate) fn mul_mod(a: u32, b: u32, p: u32, modulus: &[u32]) -> u32 {
    let n = modulus.len();
    let da = digits(a, p, n as u32);
    let db = digits(b, p, n as u32);

    let mut prod = vec![0u32; 2 * n];
    for (i, &x) in da.iter().enumerate() {
        if x == 0 {
            continue;
        }
        for (j, &y) in db.iter().enumerate() {
            prod[i + j] = (prod[i + j] + x * y) % p;
        }
    }

    // x^n ≡ -(c_0 + c_1 x + ... + c_{n-1} x^{n-1})
    for k in (n..2 * n).rev() {
        let lead = prod[k];
        if lead == 0 {
            continue;
        }
        prod[k] = 0;
        for (i, &c) in modulus.iter().enumerate() {
            let idx = k - n + i;
            prod[idx] = (prod[idx] + p * p - (lead * c) % p) % p;
        }
    }

    encode(&prod[..n], p)
}

/// Find the first monic primitive polynomial of degree `n` over GF(p).
///
/// Candidates are scanned in increasing encoded order of their lower
/// coefficients. A candidate is accepted when `x` has multiplicative order
/// exactly `p^n - 1` in the quotient ring, which also proves irreducibility.
pub(crate) fn find_primitive_poly(p: u32, n: u32) -> Option<Vec<u32>> {
    let q = p.checked_pow(n)?;
    let x = p; // the polynomial `x`

    (0..q).map(|c| digits(c, p, n)).find(|modulus| {
        if modulus[0] == 0 {
            return false;
        }
        let mut power = 1;
        for k in 1..q {
            power = mul_mod(power, x, p, modulus);
            if power == 1 {
                return k == q - 1;
            }
        }
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_roundtrip() {
        assert_eq!(digits(11, 3, 3), vec![2, 0, 1]);
        assert_eq!(encode(&[2, 0, 1], 3), 11);
    }

    #[test]
    fn test_known_primitive_polys() {
        // x^2 + x + 1 over GF(2)
        assert_eq!(find_primitive_poly(2, 2), Some(vec![1, 1]));
        // x^3 + x + 1 over GF(2)
        assert_eq!(find_primitive_poly(2, 3), Some(vec![1, 1, 0]));
        // x^2 + 1 is irreducible over GF(3) but not primitive; x^2 + x + 2 is.
        assert_eq!(find_primitive_poly(3, 2), Some(vec![2, 1]));
    }

    #[test]
    fn test_mul_mod_gf4() {
        let m = [1, 1];
        // x * x = x + 1 in GF(4)
        assert_eq!(mul_mod(2, 2, 2, &m), 3);
        // x * (x + 1) = 1
        assert_eq!(mul_mod(2, 3, 2, &m), 1);
    }
}
