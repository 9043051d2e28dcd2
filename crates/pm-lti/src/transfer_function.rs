//! Rational transfer functions and block-diagram algebra.
//!
//! Composition never cancels common factors: `series` and `feedback` return
//! the cross-multiplied numerator and denominator exactly as formed, so a
//! closed loop built from unreduced pieces keeps every factor it was built
//! from.

use crate::analysis::PoleSet;
use crate::error::{LtiError, LtiResult};
use crate::poly::Polynomial;
use crate::state_space::StateSpaceModel;
use nalgebra::{Complex, DMatrix};
use std::fmt;
use tracing::warn;

/// Relative size of `den(0)` below which the origin counts as a root.
pub const ORIGIN_ROOT_TOL: f64 = 1e-12;

/// Sign of the signal fed back into the summing junction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FeedbackSign {
    #[default]
    Negative,
    Positive,
}

impl FeedbackSign {
    pub fn value(self) -> f64 {
        match self {
            FeedbackSign::Negative => -1.0,
            FeedbackSign::Positive => 1.0,
        }
    }
}

/// One input→output path `num(s) / den(s)`.
#[derive(Clone, Debug, PartialEq)]
pub struct RationalFunction {
    num: Polynomial,
    den: Polynomial,
}

impl RationalFunction {
    /// # Errors
    ///
    /// `InvalidParameter` if the denominator is identically zero. An improper
    /// ratio (numerator degree above denominator degree) is accepted and logged.
    pub fn new(num: Polynomial, den: Polynomial) -> LtiResult<Self> {
        if den.is_zero() {
            return Err(LtiError::param("denominator polynomial is identically zero"));
        }
        let r = Self { num, den };
        if !r.is_proper() {
            warn!(num = %r.num, den = %r.den, "improper transfer function");
        }
        Ok(r)
    }

    pub fn from_coeffs(num: &[f64], den: &[f64]) -> LtiResult<Self> {
        Self::new(Polynomial::new(num.to_vec())?, Polynomial::new(den.to_vec())?)
    }

    pub fn gain(k: f64) -> LtiResult<Self> {
        Self::new(Polynomial::new(vec![k])?, Polynomial::one())
    }

    pub fn num(&self) -> &Polynomial {
        &self.num
    }

    pub fn den(&self) -> &Polynomial {
        &self.den
    }

    /// `deg(num) ≤ deg(den)` (the zero numerator is always proper).
    pub fn is_proper(&self) -> bool {
        self.num.is_zero() || self.num.degree() <= self.den.degree()
    }

    pub fn is_strictly_proper(&self) -> bool {
        self.num.is_zero() || self.num.degree() < self.den.degree()
    }

    /// `num(0) / den(0)`.
    ///
    /// # Errors
    ///
    /// `SingularSystem` when `den(0)` vanishes (a pole at the origin), even if
    /// the numerator vanishes there too.
    pub fn dc_gain(&self) -> LtiResult<f64> {
        let d0 = self.den.constant_term();
        if d0.abs() <= ORIGIN_ROOT_TOL * self.den.max_abs() {
            return Err(LtiError::SingularSystem {
                what: format!("denominator {} has a root at s = 0", self.den),
            });
        }
        Ok(self.num.constant_term() / d0)
    }

    pub fn poles(&self) -> LtiResult<Vec<Complex<f64>>> {
        self.den.roots()
    }

    /// Finite zeros; empty for a zero numerator.
    pub fn zeros(&self) -> LtiResult<Vec<Complex<f64>>> {
        if self.num.is_zero() {
            Ok(Vec::new())
        } else {
            self.num.roots()
        }
    }

    /// Frequency response at a complex point.
    pub fn eval(&self, s: Complex<f64>) -> Complex<f64> {
        self.num.eval_complex(s) / self.den.eval_complex(s)
    }

    /// `self · other`, factors kept.
    pub fn mul(&self, other: &Self) -> Self {
        Self {
            num: self.num.mul(&other.num),
            den: self.den.mul(&other.den),
        }
    }

    /// `self + other` over the product denominator.
    pub fn add(&self, other: &Self) -> Self {
        Self {
            num: self.num.mul(&other.den).add(&other.num.mul(&self.den)),
            den: self.den.mul(&other.den),
        }
    }

    pub fn scale(&self, k: f64) -> Self {
        Self {
            num: self.num.scale(k),
            den: self.den.clone(),
        }
    }

    /// `G / (1 − sign·G·H)`: numerator `n_G·d_H`, denominator `d_G·d_H − sign·n_G·n_H`.
    pub fn feedback(&self, h: &Self, sign: FeedbackSign) -> LtiResult<Self> {
        let num = self.num.mul(&h.den);
        let den = self
            .den
            .mul(&h.den)
            .add(&self.num.mul(&h.num).scale(-sign.value()));
        if den.is_zero() {
            return Err(LtiError::IncompatibleFeedback {
                what: "closed loop is ill-posed: 1 + G·H vanishes identically".to_string(),
            });
        }
        Self::new(num, den)
    }

    /// Same ratio with a monic denominator.
    pub fn normalized(&self) -> LtiResult<Self> {
        let (den, lead) = self.den.monic()?;
        Ok(Self {
            num: self.num.scale(1.0 / lead),
            den,
        })
    }

    /// Controllable canonical realization.
    ///
    /// With a monic denominator `sⁿ + a₁sⁿ⁻¹ + … + aₙ`, `A` carries `−a₁ … −aₙ`
    /// in its first row and ones on the sub-diagonal, `B = e₁`, and `C`/`D`
    /// come from the strictly proper remainder and the direct term.
    pub fn to_state_space(&self) -> LtiResult<StateSpaceModel> {
        if !self.is_proper() {
            return Err(LtiError::param(format!(
                "improper transfer function ({}) / ({}) has no state-space realization",
                self.num, self.den
            )));
        }
        let r = self.normalized()?;
        let n = r.den.degree();
        let d = if !r.num.is_zero() && r.num.degree() == n {
            r.num.leading()
        } else {
            0.0
        };
        if n == 0 {
            return StateSpaceModel::static_gain(DMatrix::from_element(1, 1, d));
        }

        let remainder = r.num.sub(&r.den.scale(d)).padded(n);
        let tail = &remainder[remainder.len() - n..];
        let den = r.den.coeffs();

        let mut a = DMatrix::zeros(n, n);
        for j in 0..n {
            a[(0, j)] = -den[j + 1];
        }
        for i in 1..n {
            a[(i, i - 1)] = 1.0;
        }
        let mut b = DMatrix::zeros(n, 1);
        b[(0, 0)] = 1.0;
        let c = DMatrix::from_row_slice(1, n, tail);
        StateSpaceModel::new(a, b, c, DMatrix::from_element(1, 1, d))
    }
}

impl fmt::Display for RationalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) / ({})", self.num, self.den)
    }
}

/// Matrix of rational functions, indexed `[output][input]`.
#[derive(Clone, Debug, PartialEq)]
pub struct TransferFunctionModel {
    entries: Vec<Vec<RationalFunction>>,
}

impl TransferFunctionModel {
    /// # Errors
    ///
    /// `DimensionMismatch` for an empty or ragged entry matrix.
    pub fn new(entries: Vec<Vec<RationalFunction>>) -> LtiResult<Self> {
        let inputs = entries.first().map_or(0, Vec::len);
        if inputs == 0 {
            return Err(LtiError::dims("transfer function needs at least one entry"));
        }
        if entries.iter().any(|row| row.len() != inputs) {
            return Err(LtiError::dims("transfer function rows have differing lengths"));
        }
        Ok(Self { entries })
    }

    /// Single-input single-output model from coefficient slices.
    pub fn siso(num: &[f64], den: &[f64]) -> LtiResult<Self> {
        Ok(Self::from_rational(RationalFunction::from_coeffs(num, den)?))
    }

    pub fn from_rational(r: RationalFunction) -> Self {
        Self {
            entries: vec![vec![r]],
        }
    }

    /// Static SISO gain.
    pub fn gain(k: f64) -> LtiResult<Self> {
        Ok(Self::from_rational(RationalFunction::gain(k)?))
    }

    pub fn outputs(&self) -> usize {
        self.entries.len()
    }

    pub fn inputs(&self) -> usize {
        self.entries[0].len()
    }

    pub fn is_siso(&self) -> bool {
        self.outputs() == 1 && self.inputs() == 1
    }

    pub fn entry(&self, output: usize, input: usize) -> Option<&RationalFunction> {
        self.entries.get(output).and_then(|row| row.get(input))
    }

    pub fn entries(&self) -> &[Vec<RationalFunction>] {
        &self.entries
    }

    /// The single entry of a SISO model.
    pub fn as_siso(&self) -> LtiResult<&RationalFunction> {
        if self.is_siso() {
            Ok(&self.entries[0][0])
        } else {
            Err(LtiError::dims(format!(
                "expected a SISO transfer function, got {} outputs x {} inputs",
                self.outputs(),
                self.inputs()
            )))
        }
    }

    pub fn is_proper(&self) -> bool {
        self.entries.iter().flatten().all(RationalFunction::is_proper)
    }

    fn map(&self, f: impl Fn(&RationalFunction) -> RationalFunction) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|row| row.iter().map(&f).collect())
                .collect(),
        }
    }

    /// Multiply every path by `k`.
    pub fn scale(&self, k: f64) -> LtiResult<Self> {
        if !k.is_finite() {
            return Err(LtiError::param(format!("scale factor must be finite, got {k}")));
        }
        Ok(self.map(|r| r.scale(k)))
    }

    /// Element-wise DC gains.
    pub fn dc_gain_matrix(&self) -> LtiResult<DMatrix<f64>> {
        let mut out = DMatrix::zeros(self.outputs(), self.inputs());
        for (i, row) in self.entries.iter().enumerate() {
            for (j, r) in row.iter().enumerate() {
                out[(i, j)] = r.dc_gain()?;
            }
        }
        Ok(out)
    }

    pub fn dc_gain(&self) -> LtiResult<f64> {
        self.as_siso()?.dc_gain()
    }

    /// Roots of every entry's denominator, merged as a multiset union so a
    /// pole shared by several entries is listed once.
    pub fn poles(&self) -> LtiResult<PoleSet> {
        let mut merged = PoleSet::new(Vec::new());
        for r in self.entries.iter().flatten() {
            merged = merged.union(&PoleSet::new(r.poles()?));
        }
        Ok(merged)
    }

    /// Cascade: `self` drives `next`. The result is `next · self`.
    pub fn series(&self, next: &Self) -> LtiResult<Self> {
        if next.inputs() != self.outputs() {
            return Err(LtiError::dims(format!(
                "series: {} outputs feed {} inputs",
                self.outputs(),
                next.inputs()
            )));
        }
        let mut entries = Vec::with_capacity(next.outputs());
        for i in 0..next.outputs() {
            let mut row = Vec::with_capacity(self.inputs());
            for j in 0..self.inputs() {
                let mut acc: Option<RationalFunction> = None;
                for k in 0..self.outputs() {
                    let term = next.entries[i][k].mul(&self.entries[k][j]);
                    acc = Some(match acc {
                        None => term,
                        Some(sum) => sum.add(&term),
                    });
                }
                // outputs() >= 1 by construction
                row.push(acc.ok_or_else(|| LtiError::dims("series over an empty model"))?);
            }
            entries.push(row);
        }
        Self::new(entries)
    }

    /// Sum of two models with identical shapes.
    pub fn parallel(&self, other: &Self) -> LtiResult<Self> {
        if self.outputs() != other.outputs() || self.inputs() != other.inputs() {
            return Err(LtiError::dims(format!(
                "parallel: {}x{} vs {}x{}",
                self.outputs(),
                self.inputs(),
                other.outputs(),
                other.inputs()
            )));
        }
        let entries = self
            .entries
            .iter()
            .zip(&other.entries)
            .map(|(a, b)| a.iter().zip(b).map(|(x, y)| x.add(y)).collect())
            .collect();
        Self::new(entries)
    }

    /// Close a loop around `self` with `h` in the return path.
    ///
    /// # Errors
    ///
    /// `IncompatibleFeedback` unless both models are SISO.
    pub fn feedback(&self, h: &Self, sign: FeedbackSign) -> LtiResult<Self> {
        if !self.is_siso() || !h.is_siso() {
            return Err(LtiError::IncompatibleFeedback {
                what: format!(
                    "feedback loops need SISO blocks, got {}x{} forward and {}x{} return",
                    self.outputs(),
                    self.inputs(),
                    h.outputs(),
                    h.inputs()
                ),
            });
        }
        Ok(Self::from_rational(
            self.entries[0][0].feedback(&h.entries[0][0], sign)?,
        ))
    }

    /// Unity negative feedback `G / (1 + G)`.
    pub fn unity_feedback(&self) -> LtiResult<Self> {
        self.feedback(&Self::gain(1.0)?, FeedbackSign::Negative)
    }

    /// Realize every entry canonically and stack the blocks diagonally.
    ///
    /// A SISO model yields exactly the controllable canonical form; larger
    /// models are generally non-minimal.
    pub fn to_state_space(&self) -> LtiResult<StateSpaceModel> {
        if self.is_siso() {
            return self.entries[0][0].to_state_space();
        }
        let (p, m) = (self.outputs(), self.inputs());
        let blocks: Vec<(usize, usize, StateSpaceModel)> = self
            .entries
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().enumerate().map(move |(j, r)| (i, j, r)))
            .map(|(i, j, r)| r.to_state_space().map(|ss| (i, j, ss)))
            .collect::<LtiResult<_>>()?;

        let n: usize = blocks.iter().map(|(_, _, ss)| ss.states()).sum();
        let mut a = DMatrix::zeros(n, n);
        let mut b = DMatrix::zeros(n, m);
        let mut c = DMatrix::zeros(p, n);
        let mut d = DMatrix::zeros(p, m);
        let mut offset = 0;
        for (i, j, ss) in &blocks {
            let k = ss.states();
            a.view_mut((offset, offset), (k, k)).copy_from(ss.a());
            b.view_mut((offset, *j), (k, 1)).copy_from(ss.b());
            c.view_mut((*i, offset), (1, k)).copy_from(ss.c());
            d[(*i, *j)] = ss.d()[(0, 0)];
            offset += k;
        }
        StateSpaceModel::new(a, b, c, d)
    }
}

impl fmt::Display for TransferFunctionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.entries.iter().enumerate() {
            for (j, r) in row.iter().enumerate() {
                if self.is_siso() {
                    write!(f, "{r}")?;
                } else {
                    writeln!(f, "[{i},{j}] {r}")?;
                }
            }
        }
        Ok(())
    }
}
