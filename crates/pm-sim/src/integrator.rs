//! Fixed-step explicit integrators.

use crate::error::SimResult;
use crate::model::TransientModel;

/// One explicit step of size `dt` from `(t, x)`.
pub trait Integrator {
    /// Global order of accuracy.
    fn order(&self) -> u32;

    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State>;
}

/// Classical fourth-order Runge-Kutta.
#[derive(Clone, Copy, Debug)]
pub struct RK4;

impl Integrator for RK4 {
    fn order(&self) -> u32 {
        4
    }

    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let half = 0.5 * dt;
        let k1 = model.derivative(t, x)?;
        let k2 = model.derivative(t + half, &model.advance(x, &k1, half))?;
        let k3 = model.derivative(t + half, &model.advance(x, &k2, half))?;
        let k4 = model.derivative(t + dt, &model.advance(x, &k3, dt))?;

        // x + dt/6 (k1 + 2 k2 + 2 k3 + k4)
        let next = model.advance(x, &k1, dt / 6.0);
        let next = model.advance(&next, &k2, dt / 3.0);
        let next = model.advance(&next, &k3, dt / 3.0);
        Ok(model.advance(&next, &k4, dt / 6.0))
    }
}

/// Forward Euler, one derivative evaluation per step.
#[derive(Clone, Copy, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn order(&self) -> u32 {
        1
    }

    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let dx = model.derivative(t, x)?;
        Ok(model.advance(x, &dx, dt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StepDrive;
    use pm_lti::StateSpaceModel;

    fn decay() -> StepDrive {
        let ss =
            StateSpaceModel::from_rows(&[vec![-1.0]], &[vec![1.0]], &[vec![1.0]], &[vec![0.0]])
                .unwrap();
        StepDrive::new(&ss, 0, 1.0)
    }

    /// Error at `t = 1` after `n` equal steps.
    fn error_at_one<I: Integrator>(integrator: &I, n: usize) -> f64 {
        let m = decay();
        let dt = 1.0 / n as f64;
        let mut x = m.initial_state();
        for k in 0..n {
            x = integrator.step(&m, k as f64 * dt, &x, dt).unwrap();
        }
        (x[0] - (1.0 - (-1.0_f64).exp())).abs()
    }

    #[test]
    fn rk4_single_step() {
        let m = decay();
        let h = 0.1;
        let x1 = RK4.step(&m, 0.0, &m.initial_state(), h).unwrap();
        assert!((x1[0] - (1.0 - (-h).exp())).abs() < 1e-6);
    }

    #[test]
    fn euler_single_step() {
        let m = decay();
        let x1 = ForwardEuler.step(&m, 0.0, &m.initial_state(), 0.1).unwrap();
        assert!((x1[0] - 0.1).abs() < 1e-15);
    }

    #[test]
    fn halving_the_step_matches_the_order() {
        let ratio = error_at_one(&RK4, 10) / error_at_one(&RK4, 20);
        let expected = 2f64.powi(RK4.order() as i32);
        assert!(ratio > 0.75 * expected && ratio < 1.25 * expected, "{ratio}");

        let ratio = error_at_one(&ForwardEuler, 100) / error_at_one(&ForwardEuler, 200);
        assert!((ratio - 2.0).abs() < 0.1, "{ratio}");
    }
}
