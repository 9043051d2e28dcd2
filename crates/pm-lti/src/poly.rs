//! Real polynomials in `s`, coefficients stored highest degree first.

use crate::error::{LtiError, LtiResult};
use crate::linalg::{self, cmp_complex};
use nalgebra::{Complex, DMatrix};
use std::fmt;

/// Polynomial `c[0]·s^n + c[1]·s^(n-1) + ... + c[n]`.
///
/// Leading zeros are stripped on construction; the zero polynomial is `[0.0]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    coeffs: Vec<f64>,
}

impl Polynomial {
    /// Build from coefficients (highest degree first). Non-finite values are rejected.
    pub fn new(coeffs: impl Into<Vec<f64>>) -> LtiResult<Self> {
        let coeffs = coeffs.into();
        linalg::ensure_finite_slice(&coeffs, "polynomial coefficients")?;
        Ok(Self::from_trusted(coeffs))
    }

    /// Caller guarantees finiteness.
    pub(crate) fn from_trusted(mut coeffs: Vec<f64>) -> Self {
        let first_nonzero = coeffs.iter().position(|&c| c != 0.0);
        match first_nonzero {
            Some(0) => {}
            Some(i) => {
                coeffs.drain(..i);
            }
            None => coeffs = vec![0.0],
        }
        Self { coeffs }
    }

    pub fn constant(c: f64) -> Self {
        Self::from_trusted(vec![c])
    }

    pub fn zero() -> Self {
        Self::constant(0.0)
    }

    pub fn one() -> Self {
        Self::constant(1.0)
    }

    /// The monomial `s`.
    pub fn s() -> Self {
        Self::from_trusted(vec![1.0, 0.0])
    }

    /// Monic polynomial with the given roots. Complex roots are expected in
    /// conjugate pairs; the imaginary residue of the expansion is discarded.
    pub fn from_roots(roots: &[Complex<f64>]) -> Self {
        let mut acc = vec![Complex::new(1.0, 0.0)];
        for &r in roots {
            let mut next = vec![Complex::new(0.0, 0.0); acc.len() + 1];
            for (i, &c) in acc.iter().enumerate() {
                next[i] += c;
                next[i + 1] -= c * r;
            }
            acc = next;
        }
        Self::from_trusted(acc.into_iter().map(|c| c.re).collect())
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0.0)
    }

    pub fn leading(&self) -> f64 {
        self.coeffs[0]
    }

    /// Value at `s = 0`.
    pub fn constant_term(&self) -> f64 {
        self.coeffs[self.coeffs.len() - 1]
    }

    /// Largest coefficient magnitude.
    pub fn max_abs(&self) -> f64 {
        self.coeffs.iter().fold(0.0, |m, c| m.max(c.abs()))
    }

    /// Horner evaluation at a real point.
    pub fn eval(&self, s: f64) -> f64 {
        self.coeffs.iter().fold(0.0, |acc, &c| acc * s + c)
    }

    /// Horner evaluation at a complex point.
    pub fn eval_complex(&self, s: Complex<f64>) -> Complex<f64> {
        self.coeffs
            .iter()
            .fold(Complex::new(0.0, 0.0), |acc, &c| acc * s + c)
    }

    pub fn mul(&self, other: &Self) -> Self {
        let mut out = vec![0.0; self.coeffs.len() + other.coeffs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in other.coeffs.iter().enumerate() {
                out[i + j] += a * b;
            }
        }
        Self::from_trusted(out)
    }

    pub fn add(&self, other: &Self) -> Self {
        let len = self.coeffs.len().max(other.coeffs.len());
        let mut out = vec![0.0; len];
        for (dst, &c) in out[len - self.coeffs.len()..].iter_mut().zip(&self.coeffs) {
            *dst += c;
        }
        for (dst, &c) in out[len - other.coeffs.len()..].iter_mut().zip(&other.coeffs) {
            *dst += c;
        }
        Self::from_trusted(out)
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.scale(-1.0))
    }

    pub fn scale(&self, k: f64) -> Self {
        Self::from_trusted(self.coeffs.iter().map(|c| c * k).collect())
    }

    /// Divide through by the leading coefficient. Returns the polynomial and the divisor.
    pub fn monic(&self) -> LtiResult<(Self, f64)> {
        let lead = self.leading();
        if lead == 0.0 {
            return Err(LtiError::param("cannot normalise the zero polynomial"));
        }
        Ok((self.scale(1.0 / lead), lead))
    }

    /// Zero out coefficients below `rel_tol · max_abs()` and re-strip leading zeros.
    pub fn trim_relative(&self, rel_tol: f64) -> Self {
        let cutoff = rel_tol * self.max_abs();
        Self::from_trusted(
            self.coeffs
                .iter()
                .map(|&c| if c.abs() <= cutoff { 0.0 } else { c })
                .collect(),
        )
    }

    /// Pad on the left with zeros to exactly `len` coefficients.
    pub(crate) fn padded(&self, len: usize) -> Vec<f64> {
        let mut out = vec![0.0; len.saturating_sub(self.coeffs.len())];
        out.extend_from_slice(&self.coeffs);
        out
    }

    /// Roots via eigenvalues of the balanced companion matrix, sorted by
    /// real part then imaginary part. Exact zeros at the tail are split off
    /// as roots at the origin first.
    pub fn roots(&self) -> LtiResult<Vec<Complex<f64>>> {
        if self.is_zero() {
            return Err(LtiError::param("the zero polynomial has no finite root set"));
        }
        let trailing_zeros = self.coeffs.iter().rev().take_while(|&&c| c == 0.0).count();
        let core = &self.coeffs[..self.coeffs.len() - trailing_zeros];
        let mut roots = vec![Complex::new(0.0, 0.0); trailing_zeros];

        let n = core.len() - 1;
        match n {
            0 => {}
            1 => roots.push(Complex::new(-core[1] / core[0], 0.0)),
            _ => {
                let mut companion = DMatrix::zeros(n, n);
                for j in 0..n {
                    companion[(0, j)] = -core[j + 1] / core[0];
                }
                for i in 1..n {
                    companion[(i, i - 1)] = 1.0;
                }
                roots.extend(linalg::eigenvalues(&companion)?);
            }
        }
        roots.sort_by(cmp_complex);
        Ok(roots)
    }

    /// Coefficient-wise comparison with a tolerance scaled by the larger magnitude.
    pub fn approx_eq(&self, other: &Self, rel_tol: f64) -> bool {
        let len = self.coeffs.len().max(other.coeffs.len());
        let scale = self.max_abs().max(other.max_abs()).max(f64::MIN_POSITIVE);
        self.padded(len)
            .iter()
            .zip(other.padded(len))
            .all(|(a, b)| (a - b).abs() <= rel_tol * scale)
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.degree();
        let mut wrote = false;
        for (i, &c) in self.coeffs.iter().enumerate() {
            if c == 0.0 && n > 0 {
                continue;
            }
            let power = n - i;
            if wrote {
                write!(f, " {} ", if c < 0.0 { '-' } else { '+' })?;
            } else if c < 0.0 {
                write!(f, "-")?;
            }
            let mag = c.abs();
            match power {
                0 => write!(f, "{mag}")?,
                1 if mag == 1.0 => write!(f, "s")?,
                1 => write!(f, "{mag} s")?,
                _ if mag == 1.0 => write!(f, "s^{power}")?,
                _ => write!(f, "{mag} s^{power}")?,
            }
            wrote = true;
        }
        if !wrote {
            write!(f, "0")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(c: &[f64]) -> Polynomial {
        Polynomial::new(c.to_vec()).unwrap()
    }

    #[test]
    fn leading_zeros_are_stripped() {
        let p = poly(&[0.0, 0.0, 1.0, 2.0]);
        assert_eq!(p.coeffs(), &[1.0, 2.0]);
        assert_eq!(p.degree(), 1);
        assert!(poly(&[0.0, 0.0]).is_zero());
        assert_eq!(poly(&[]).coeffs(), &[0.0]);
    }

    #[test]
    fn non_finite_coefficients_are_rejected() {
        assert!(Polynomial::new(vec![1.0, f64::NAN]).is_err());
    }

    #[test]
    fn multiply_and_add() {
        let a = poly(&[1.0, 1.0]);
        let b = poly(&[1.0, -1.0]);
        assert_eq!(a.mul(&b).coeffs(), &[1.0, 0.0, -1.0]);
        assert_eq!(a.add(&poly(&[3.0])).coeffs(), &[1.0, 4.0]);
        assert!(a.sub(&a).is_zero());
    }

    #[test]
    fn evaluation() {
        let p = poly(&[2.0, -3.0, 1.0]);
        assert_eq!(p.eval(2.0), 3.0);
        assert_eq!(p.constant_term(), 1.0);
        let z = p.eval_complex(Complex::new(0.0, 1.0));
        assert!((z.re - -1.0).abs() < 1e-15);
        assert!((z.im - -3.0).abs() < 1e-15);
    }

    #[test]
    fn roots_of_quadratic() {
        let r = poly(&[1.0, 3.0, 2.0]).roots().unwrap();
        assert_eq!(r.len(), 2);
        assert!((r[0].re + 2.0).abs() < 1e-12);
        assert!((r[1].re + 1.0).abs() < 1e-12);
    }

    #[test]
    fn roots_at_origin_are_exact() {
        let r = poly(&[1.0, 2.0, 0.0]).roots().unwrap();
        assert_eq!(r.len(), 2);
        assert!((r[0].re + 2.0).abs() < 1e-12);
        assert_eq!(r[1], Complex::new(0.0, 0.0));
    }

    #[test]
    fn roots_of_badly_scaled_cubic() {
        // (s + 1)(s + 100)(s + 10000)
        let p = Polynomial::from_roots(&[
            Complex::new(-1.0, 0.0),
            Complex::new(-100.0, 0.0),
            Complex::new(-10000.0, 0.0),
        ]);
        let r = p.roots().unwrap();
        assert!((r[0].re + 10000.0).abs() < 1e-6);
        assert!((r[1].re + 100.0).abs() < 1e-8);
        assert!((r[2].re + 1.0).abs() < 1e-10);
    }

    #[test]
    fn from_roots_with_conjugate_pair_is_real() {
        let p = Polynomial::from_roots(&[Complex::new(-1.0, 2.0), Complex::new(-1.0, -2.0)]);
        assert!(p.approx_eq(&poly(&[1.0, 2.0, 5.0]), 1e-14));
    }

    #[test]
    fn trim_relative_removes_noise() {
        let p = poly(&[1e-14, 2.0, 3.0]).trim_relative(1e-12);
        assert_eq!(p.coeffs(), &[2.0, 3.0]);
    }

    #[test]
    fn monic_divides_by_leading() {
        let (p, lead) = poly(&[2.0, 4.0]).monic().unwrap();
        assert_eq!(lead, 2.0);
        assert_eq!(p.coeffs(), &[1.0, 2.0]);
        assert!(Polynomial::zero().monic().is_err());
    }

    #[test]
    fn display() {
        assert_eq!(poly(&[1.0, -2.0, 0.0, 5.0]).to_string(), "s^3 - 2 s^2 + 5");
        assert_eq!(poly(&[0.001, 0.01]).to_string(), "0.001 s + 0.01");
        assert_eq!(Polynomial::zero().to_string(), "0");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn roots_reconstruct_polynomial(roots in prop::collection::vec(-50.0_f64..-0.5, 1..5)) {
            let mut sorted = roots.clone();
            sorted.sort_by(f64::total_cmp);
            sorted.dedup_by(|a, b| (*a - *b).abs() < 0.25);
            let zs: Vec<Complex<f64>> = sorted.iter().map(|&r| Complex::new(r, 0.0)).collect();
            let p = Polynomial::from_roots(&zs);
            let back = Polynomial::from_roots(&p.roots().unwrap());
            prop_assert!(p.approx_eq(&back, 1e-9));
        }

        #[test]
        fn multiplication_is_associative(
            a in prop::collection::vec(-10.0_f64..10.0, 1..4),
            b in prop::collection::vec(-10.0_f64..10.0, 1..4),
            c in prop::collection::vec(-10.0_f64..10.0, 1..4),
        ) {
            let (a, b, c) = (
                Polynomial::new(a).unwrap(),
                Polynomial::new(b).unwrap(),
                Polynomial::new(c).unwrap(),
            );
            let left = a.mul(&b).mul(&c);
            let right = a.mul(&b.mul(&c));
            prop_assert!(left.approx_eq(&right, 1e-9));
        }
    }
}
