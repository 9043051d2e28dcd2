//! State-space representation `ẋ = A·x + B·u`, `y = C·x + D·u`.

use crate::analysis::PoleSet;
use crate::error::{LtiError, LtiResult};
use crate::feedback::StateFeedback;
use crate::linalg::{self, ensure_finite_matrix};
use crate::poly::Polynomial;
use crate::transfer_function::{RationalFunction, TransferFunctionModel};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Numerator coefficients below this fraction of the largest one are rounding noise.
const NUMERATOR_TRIM: f64 = 1e-12;

/// Continuous-time LTI system in state-space form.
///
/// Shapes: `A` is n×n, `B` is n×m, `C` is p×n, `D` is p×m. Values are
/// immutable; every transformation returns a new model.
#[derive(Clone, Debug, PartialEq)]
pub struct StateSpaceModel {
    a: DMatrix<f64>,
    b: DMatrix<f64>,
    c: DMatrix<f64>,
    d: DMatrix<f64>,
}

impl StateSpaceModel {
    /// Validate shapes and finiteness.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` if `A` is not square or `B`, `C`, `D` disagree with it.
    /// - `InvalidParameter` if any entry is NaN or infinite.
    pub fn new(
        a: DMatrix<f64>,
        b: DMatrix<f64>,
        c: DMatrix<f64>,
        d: DMatrix<f64>,
    ) -> LtiResult<Self> {
        let n = a.nrows();
        if !a.is_square() {
            return Err(LtiError::dims(format!(
                "A must be square, got {}x{}",
                a.nrows(),
                a.ncols()
            )));
        }
        if b.nrows() != n {
            return Err(LtiError::dims(format!(
                "B has {} rows, expected {n}",
                b.nrows()
            )));
        }
        if c.ncols() != n {
            return Err(LtiError::dims(format!(
                "C has {} columns, expected {n}",
                c.ncols()
            )));
        }
        if d.nrows() != c.nrows() || d.ncols() != b.ncols() {
            return Err(LtiError::dims(format!(
                "D is {}x{}, expected {}x{}",
                d.nrows(),
                d.ncols(),
                c.nrows(),
                b.ncols()
            )));
        }
        ensure_finite_matrix(&a, "A")?;
        ensure_finite_matrix(&b, "B")?;
        ensure_finite_matrix(&c, "C")?;
        ensure_finite_matrix(&d, "D")?;
        Ok(Self { a, b, c, d })
    }

    /// Build from row vectors.
    pub fn from_rows(
        a: &[Vec<f64>],
        b: &[Vec<f64>],
        c: &[Vec<f64>],
        d: &[Vec<f64>],
    ) -> LtiResult<Self> {
        let a = linalg::matrix_from_rows(a, "A")?;
        let n = a.nrows();
        let b = linalg::matrix_from_rows(b, "B")?;
        let c = linalg::matrix_from_rows(c, "C")?;
        let d = linalg::matrix_from_rows(d, "D")?;
        // An empty row list means "no states": keep the input/output widths.
        let b = if n == 0 { DMatrix::zeros(0, d.ncols()) } else { b };
        let c = if n == 0 { DMatrix::zeros(d.nrows(), 0) } else { c };
        Self::new(a, b, c, d)
    }

    /// Model with `D = 0`.
    pub fn strictly_proper(a: DMatrix<f64>, b: DMatrix<f64>, c: DMatrix<f64>) -> LtiResult<Self> {
        let d = DMatrix::zeros(c.nrows(), b.ncols());
        Self::new(a, b, c, d)
    }

    /// Memoryless system `y = D·u`.
    pub fn static_gain(d: DMatrix<f64>) -> LtiResult<Self> {
        let (p, m) = d.shape();
        Self::new(DMatrix::zeros(0, 0), DMatrix::zeros(0, m), DMatrix::zeros(p, 0), d)
    }

    pub fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    pub fn b(&self) -> &DMatrix<f64> {
        &self.b
    }

    pub fn c(&self) -> &DMatrix<f64> {
        &self.c
    }

    pub fn d(&self) -> &DMatrix<f64> {
        &self.d
    }

    pub fn states(&self) -> usize {
        self.a.nrows()
    }

    pub fn inputs(&self) -> usize {
        self.b.ncols()
    }

    pub fn outputs(&self) -> usize {
        self.c.nrows()
    }

    pub fn is_siso(&self) -> bool {
        self.inputs() == 1 && self.outputs() == 1
    }

    /// Single input/output path `input → output` sharing the same `A`.
    pub fn channel(&self, output: usize, input: usize) -> LtiResult<Self> {
        if output >= self.outputs() || input >= self.inputs() {
            return Err(LtiError::dims(format!(
                "channel ({output}, {input}) outside a {}x{} system",
                self.outputs(),
                self.inputs()
            )));
        }
        Ok(Self {
            a: self.a.clone(),
            b: self.b.columns(input, 1).into_owned(),
            c: self.c.rows(output, 1).into_owned(),
            d: DMatrix::from_element(1, 1, self.d[(output, input)]),
        })
    }

    /// Close the loop `u = r / kr − K·x`.
    ///
    /// Returns `A − B·K`, `B / kr`, `C − D·K`, `D / kr`; `kr` defaults to 1.
    ///
    /// # Errors
    ///
    /// `IncompatibleFeedback` if `K` is not m×n; `InvalidParameter` if `kr`
    /// is zero or non-finite.
    pub fn apply_state_feedback(&self, feedback: &StateFeedback) -> LtiResult<Self> {
        let k = feedback.gain();
        if k.nrows() != self.inputs() || k.ncols() != self.states() {
            return Err(LtiError::IncompatibleFeedback {
                what: format!(
                    "gain is {}x{}, plant needs {}x{} (inputs x states)",
                    k.nrows(),
                    k.ncols(),
                    self.inputs(),
                    self.states()
                ),
            });
        }
        let kr = feedback.reference_gain().unwrap_or(1.0);
        if !kr.is_finite() || kr == 0.0 {
            return Err(LtiError::param(format!(
                "reference gain must be finite and non-zero, got {kr}"
            )));
        }
        let a = &self.a - &self.b * k;
        let c = &self.c - &self.d * k;
        Self::new(a, &self.b / kr, c, &self.d / kr)
    }

    /// Scale every output by `k`.
    pub fn scale(&self, k: f64) -> LtiResult<Self> {
        if !k.is_finite() {
            return Err(LtiError::param(format!("scale factor must be finite, got {k}")));
        }
        Ok(Self {
            a: self.a.clone(),
            b: self.b.clone(),
            c: &self.c * k,
            d: &self.d * k,
        })
    }

    /// Cascade: the outputs of `self` drive the inputs of `next`.
    pub fn series(&self, next: &Self) -> LtiResult<Self> {
        if next.inputs() != self.outputs() {
            return Err(LtiError::dims(format!(
                "series: {} outputs feed {} inputs",
                self.outputs(),
                next.inputs()
            )));
        }
        let (n1, n2) = (self.states(), next.states());
        let n = n1 + n2;

        let mut a = DMatrix::zeros(n, n);
        a.view_mut((0, 0), (n1, n1)).copy_from(&self.a);
        a.view_mut((n1, 0), (n2, n1)).copy_from(&(&next.b * &self.c));
        a.view_mut((n1, n1), (n2, n2)).copy_from(&next.a);

        let mut b = DMatrix::zeros(n, self.inputs());
        b.view_mut((0, 0), (n1, self.inputs())).copy_from(&self.b);
        b.view_mut((n1, 0), (n2, self.inputs()))
            .copy_from(&(&next.b * &self.d));

        let mut c = DMatrix::zeros(next.outputs(), n);
        c.view_mut((0, 0), (next.outputs(), n1))
            .copy_from(&(&next.d * &self.c));
        c.view_mut((0, n1), (next.outputs(), n2)).copy_from(&next.c);

        Self::new(a, b, c, &next.d * &self.d)
    }

    /// Eigenvalues of `A`.
    pub fn poles(&self) -> LtiResult<PoleSet> {
        Ok(PoleSet::new(linalg::eigenvalues(&self.a)?))
    }

    /// Steady-state gain `−C·A⁻¹·B + D`.
    ///
    /// # Errors
    ///
    /// `SingularSystem` when `A` is singular (a pole at the origin, even an
    /// unobservable one); `NumericalInstability` when `A` is ill-conditioned.
    pub fn dc_gain_matrix(&self) -> LtiResult<DMatrix<f64>> {
        if self.states() == 0 {
            return Ok(self.d.clone());
        }
        let x = linalg::solve(&self.a, &self.b, "state matrix A")?;
        Ok(&self.d - &self.c * x)
    }

    /// DC gain of a SISO model.
    pub fn dc_gain(&self) -> LtiResult<f64> {
        self.require_siso("dc_gain")?;
        Ok(self.dc_gain_matrix()?[(0, 0)])
    }

    pub(crate) fn require_siso(&self, op: &str) -> LtiResult<()> {
        if self.is_siso() {
            Ok(())
        } else {
            Err(LtiError::dims(format!(
                "{op} needs a SISO model, got {} outputs x {} inputs",
                self.outputs(),
                self.inputs()
            )))
        }
    }

    /// `G(s) = C·(sI − A)⁻¹·B + D`, one rational entry per output/input pair.
    ///
    /// Each channel is first reduced to its minimal realization, so modes that
    /// the channel cannot excite or observe do not appear in its denominator.
    pub fn to_transfer_function(&self) -> LtiResult<TransferFunctionModel> {
        let mut entries = Vec::with_capacity(self.outputs());
        for i in 0..self.outputs() {
            let mut row = Vec::with_capacity(self.inputs());
            for j in 0..self.inputs() {
                let minimal = self.channel(i, j)?.minimal_realization()?;
                row.push(minimal.siso_rational()?);
            }
            entries.push(row);
        }
        TransferFunctionModel::new(entries)
    }

    /// Rational function of a SISO model without any order reduction.
    ///
    /// Denominator: characteristic polynomial from the eigenvalues of `A`.
    /// Numerator: `C·adj(sI − A)·B + D·det(sI − A)`, with the adjugate
    /// expanded through the recursion `R₀ = I`, `Rₖ = A·Rₖ₋₁ + aₖ·I`.
    pub fn siso_rational(&self) -> LtiResult<RationalFunction> {
        self.require_siso("siso_rational")?;
        let n = self.states();
        let d = self.d[(0, 0)];
        if n == 0 {
            return RationalFunction::new(Polynomial::constant(d), Polynomial::one());
        }

        let den = Polynomial::from_roots(&linalg::eigenvalues(&self.a)?);
        let a_coeffs = den.padded(n + 1);
        let b: DVector<f64> = self.b.column(0).into_owned();
        let c = self.c.row(0);

        let mut numerator = Vec::with_capacity(n);
        let mut v = b.clone();
        numerator.push(c.dot(&v.transpose()));
        for &ak in a_coeffs.iter().take(n).skip(1) {
            v = &self.a * &v + &b * ak;
            numerator.push(c.dot(&v.transpose()));
        }

        let strictly_proper = Polynomial::new(numerator)?;
        let num = strictly_proper
            .add(&den.scale(d))
            .trim_relative(NUMERATOR_TRIM);
        debug!(states = n, num = %num, den = %den, "state space to rational function");
        RationalFunction::new(num, den)
    }
}
