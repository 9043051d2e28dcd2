//! Minimal realization by orthogonal projection.
//!
//! The controllable subspace is the Krylov space of `(A, B)`; restricting the
//! model to an orthonormal basis `Q` of it gives `(QᵀAQ, QᵀB, CQ)`. The same
//! construction on the dual `(Aᵀ, Cᵀ)` removes unobservable directions. Both
//! subspaces are invariant, so the projections are exact up to rounding.

use crate::error::LtiResult;
use crate::linalg;
use crate::state_space::StateSpaceModel;
use nalgebra::DMatrix;
use tracing::debug;

/// Relative threshold for accepting a new Krylov direction.
pub const REALIZATION_TOL: f64 = 1e-10;

impl StateSpaceModel {
    /// Drop uncontrollable and unobservable modes.
    ///
    /// A model that is already minimal is returned unchanged (no rotation
    /// is applied), so its matrices stay bit-identical.
    pub fn minimal_realization(&self) -> LtiResult<StateSpaceModel> {
        let controllable = self.controllable_part()?;
        let minimal = controllable.observable_part()?;
        if minimal.states() < self.states() {
            debug!(
                from = self.states(),
                to = minimal.states(),
                "removed non-minimal modes"
            );
        }
        Ok(minimal)
    }

    /// Dimension of the controllable subspace.
    pub fn controllable_dimension(&self) -> usize {
        linalg::krylov_basis(self.a(), self.b(), REALIZATION_TOL).ncols()
    }

    /// Dimension of the observable subspace.
    pub fn observable_dimension(&self) -> usize {
        linalg::krylov_basis(&self.a().transpose(), &self.c().transpose(), REALIZATION_TOL)
            .ncols()
    }

    pub fn is_minimal(&self) -> bool {
        self.controllable_dimension() == self.states()
            && self.observable_dimension() == self.states()
    }

    fn controllable_part(&self) -> LtiResult<StateSpaceModel> {
        let q = linalg::krylov_basis(self.a(), self.b(), REALIZATION_TOL);
        self.restrict(&q)
    }

    fn observable_part(&self) -> LtiResult<StateSpaceModel> {
        let p = linalg::krylov_basis(&self.a().transpose(), &self.c().transpose(), REALIZATION_TOL);
        self.restrict(&p)
    }

    /// Project onto the orthonormal columns of `basis`.
    fn restrict(&self, basis: &DMatrix<f64>) -> LtiResult<StateSpaceModel> {
        if basis.ncols() == self.states() {
            return Ok(self.clone());
        }
        let qt = basis.transpose();
        StateSpaceModel::new(
            &qt * self.a() * basis,
            &qt * self.b(),
            self.c() * basis,
            self.d().clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poly::Polynomial;

    #[test]
    fn unobservable_integrator_is_removed() {
        // Position integrator is invisible when only speed is measured.
        let sys = StateSpaceModel::from_rows(
            &[
                vec![0.0, 1.0, 0.0],
                vec![0.0, -0.5, 250.0],
                vec![0.0, -8.33, -1066.7],
            ],
            &[vec![0.0], vec![0.0], vec![6666.7]],
            &[vec![0.0, 1.0, 0.0]],
            &[vec![0.0]],
        )
        .unwrap();
        assert_eq!(sys.controllable_dimension(), 3);
        assert_eq!(sys.observable_dimension(), 2);
        assert!(!sys.is_minimal());

        let min = sys.minimal_realization().unwrap();
        assert_eq!(min.states(), 2);
        let r = min.siso_rational().unwrap();
        let expected_den = Polynomial::new(vec![1.0, 1067.2, 0.5 * 1066.7 + 250.0 * 8.33]).unwrap();
        assert!(r.den().approx_eq(&expected_den, 1e-9));
        assert!(r.num().approx_eq(&Polynomial::constant(250.0 * 6666.7), 1e-9));
    }

    #[test]
    fn uncontrollable_mode_is_removed() {
        let sys = StateSpaceModel::from_rows(
            &[vec![-1.0, 0.0], vec![0.0, -5.0]],
            &[vec![1.0], vec![0.0]],
            &[vec![1.0, 1.0]],
            &[vec![0.0]],
        )
        .unwrap();
        let min = sys.minimal_realization().unwrap();
        assert_eq!(min.states(), 1);
        assert!((min.a()[(0, 0)] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn minimal_model_is_untouched() {
        let sys = StateSpaceModel::from_rows(
            &[vec![0.0, 1.0], vec![-2.0, -3.0]],
            &[vec![0.0], vec![1.0]],
            &[vec![1.0, 0.0]],
            &[vec![0.0]],
        )
        .unwrap();
        assert!(sys.is_minimal());
        assert_eq!(sys.minimal_realization().unwrap(), sys);
    }

    #[test]
    fn zero_input_leaves_no_states() {
        let sys = StateSpaceModel::from_rows(
            &[vec![-1.0]],
            &[vec![0.0]],
            &[vec![1.0]],
            &[vec![2.0]],
        )
        .unwrap();
        let min = sys.minimal_realization().unwrap();
        assert_eq!(min.states(), 0);
        assert_eq!(min.dc_gain().unwrap(), 2.0);
    }
}
