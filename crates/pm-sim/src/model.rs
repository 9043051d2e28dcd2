//! Continuous-time dynamics advanced by the explicit integrators.

use crate::error::SimResult;
use nalgebra::{DMatrix, DVector};
use pm_lti::StateSpaceModel;

/// Dynamics `ẋ = f(t, x)` over some state space.
///
/// Integrators only need the derivative and one update rule, so a
/// model decides how its states are stored.
pub trait TransientModel {
    type State: Clone;

    /// State at `t = 0`.
    fn initial_state(&self) -> Self::State;

    /// `ẋ` at `(t, x)`.
    fn derivative(&self, t: f64, x: &Self::State) -> SimResult<Self::State>;

    /// `x + h·dx`.
    fn advance(&self, x: &Self::State, dx: &Self::State, h: f64) -> Self::State;
}

/// `ẋ = A·x + b·u` with `u` held constant from `t = 0`, starting at rest.
#[derive(Clone, Debug)]
pub struct StepDrive {
    a: DMatrix<f64>,
    bu: DVector<f64>,
}

impl StepDrive {
    /// Drive input column `input` of `ss` with the constant `amplitude`.
    pub fn new(ss: &StateSpaceModel, input: usize, amplitude: f64) -> Self {
        Self {
            a: ss.a().clone(),
            bu: ss.b().column(input) * amplitude,
        }
    }
}

impl TransientModel for StepDrive {
    type State = DVector<f64>;

    fn initial_state(&self) -> DVector<f64> {
        DVector::zeros(self.a.nrows())
    }

    fn derivative(&self, _t: f64, x: &DVector<f64>) -> SimResult<DVector<f64>> {
        Ok(&self.a * x + &self.bu)
    }

    fn advance(&self, x: &DVector<f64>, dx: &DVector<f64>, h: f64) -> DVector<f64> {
        let mut next = x.clone();
        next.axpy(h, dx, 1.0);
        next
    }
}
