//! Closed-loop composition.
//!
//! Two loop shapes are supported:
//! - state feedback `u = r / kr − K·x`, which stays in state-space form;
//! - a classical loop with compensator `C`, plant `G` and optional sensor `H`,
//!   giving `C·G / (1 − sign·C·G·H)` as a transfer function.

use crate::error::{LtiError, LtiResult};
use crate::model::LtiModel;
use crate::state_space::StateSpaceModel;
use crate::transfer_function::{FeedbackSign, TransferFunctionModel};
use nalgebra::DMatrix;
use tracing::debug;

/// Static gain `K` (m×n) with an optional reference pre-scaling `kr`.
#[derive(Clone, Debug, PartialEq)]
pub struct StateFeedback {
    gain: DMatrix<f64>,
    reference_gain: Option<f64>,
}

impl StateFeedback {
    /// Single-input gain row `K = [k₁ … kₙ]`.
    pub fn new(gain: Vec<f64>) -> Self {
        let n = gain.len();
        Self {
            gain: DMatrix::from_row_slice(1, n, &gain),
            reference_gain: None,
        }
    }

    pub fn from_matrix(gain: DMatrix<f64>) -> Self {
        Self {
            gain,
            reference_gain: None,
        }
    }

    /// Divide the reference input by `kr` before it enters the plant.
    pub fn with_reference_gain(mut self, kr: f64) -> Self {
        self.reference_gain = Some(kr);
        self
    }

    pub fn gain(&self) -> &DMatrix<f64> {
        &self.gain
    }

    pub fn reference_gain(&self) -> Option<f64> {
        self.reference_gain
    }

    /// Same loop with `K` multiplied by `k`.
    pub fn scaled(&self, k: f64) -> Self {
        Self {
            gain: &self.gain * k,
            reference_gain: self.reference_gain,
        }
    }
}

/// Classical loop around a SISO plant.
#[derive(Clone, Debug, PartialEq)]
pub struct CompensatorLoop {
    compensator: TransferFunctionModel,
    sensor: Option<TransferFunctionModel>,
    sign: FeedbackSign,
}

impl CompensatorLoop {
    /// Unity negative feedback around `compensator · plant`.
    pub fn new(compensator: TransferFunctionModel) -> Self {
        Self {
            compensator,
            sensor: None,
            sign: FeedbackSign::Negative,
        }
    }

    /// Put `h` in the return path.
    pub fn with_sensor(mut self, h: TransferFunctionModel) -> Self {
        self.sensor = Some(h);
        self
    }

    pub fn with_sign(mut self, sign: FeedbackSign) -> Self {
        self.sign = sign;
        self
    }

    pub fn compensator(&self) -> &TransferFunctionModel {
        &self.compensator
    }

    pub fn sensor(&self) -> Option<&TransferFunctionModel> {
        self.sensor.as_ref()
    }

    pub fn sign(&self) -> FeedbackSign {
        self.sign
    }

    fn sensor_or_unity(&self) -> LtiResult<TransferFunctionModel> {
        match &self.sensor {
            Some(h) => Ok(h.clone()),
            None => TransferFunctionModel::gain(1.0),
        }
    }

    fn check_plant(&self, plant: &TransferFunctionModel) -> LtiResult<()> {
        let c = &self.compensator;
        if !plant.is_siso() || !c.is_siso() {
            return Err(LtiError::IncompatibleFeedback {
                what: format!(
                    "compensator is {}x{} and plant is {}x{}; classical loops need SISO blocks",
                    c.outputs(),
                    c.inputs(),
                    plant.outputs(),
                    plant.inputs()
                ),
            });
        }
        if let Some(h) = &self.sensor {
            if !h.is_siso() {
                return Err(LtiError::IncompatibleFeedback {
                    what: format!("sensor is {}x{}, expected 1x1", h.outputs(), h.inputs()),
                });
            }
        }
        Ok(())
    }

    /// Reference-to-output transfer function `C·G / (1 − sign·C·G·H)`.
    pub fn close(&self, plant: &TransferFunctionModel) -> LtiResult<TransferFunctionModel> {
        self.check_plant(plant)?;
        let forward = self.compensator.series(plant)?;
        let closed = forward.feedback(&self.sensor_or_unity()?, self.sign)?;
        debug!(closed = %closed, "closed compensator loop");
        Ok(closed)
    }

    /// Reference-to-control-signal transfer function `C / (1 − sign·C·G·H)`.
    pub fn control_effort(&self, plant: &TransferFunctionModel) -> LtiResult<TransferFunctionModel> {
        self.check_plant(plant)?;
        let loop_path = plant.series(&self.sensor_or_unity()?)?;
        self.compensator.feedback(&loop_path, self.sign)
    }
}

/// How a loop is closed around a plant.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedbackSpec {
    StateFeedback(StateFeedback),
    Compensator(CompensatorLoop),
}

impl From<StateFeedback> for FeedbackSpec {
    fn from(k: StateFeedback) -> Self {
        FeedbackSpec::StateFeedback(k)
    }
}

impl From<CompensatorLoop> for FeedbackSpec {
    fn from(c: CompensatorLoop) -> Self {
        FeedbackSpec::Compensator(c)
    }
}

/// Closed-loop model for `plant` under `spec`.
///
/// State feedback yields a state-space model (a transfer-function plant is
/// realized in controllable canonical form first, so `K` refers to those
/// states). A compensator loop yields a transfer function.
pub fn close_loop(plant: &LtiModel, spec: &FeedbackSpec) -> LtiResult<LtiModel> {
    match spec {
        FeedbackSpec::StateFeedback(k) => {
            let ss = plant.to_state_space()?;
            Ok(LtiModel::StateSpace(ss.apply_state_feedback(k)?))
        }
        FeedbackSpec::Compensator(c) => {
            let tf = plant.to_transfer_function()?;
            Ok(LtiModel::TransferFunction(c.close(&tf)?))
        }
    }
}

/// The `kr` that gives `plant` under `u = r / kr − K·x` a DC gain of one.
///
/// Evaluated on the transfer function of `A − B·K`, so modes the output
/// cannot see (such as a position integrator under speed measurement) do not
/// make the gain undefined.
///
/// # Errors
///
/// `SingularSystem` if the closed loop has a pole at the origin or a zero
/// DC gain.
pub fn reference_gain_for_unity(plant: &StateSpaceModel, k: &StateFeedback) -> LtiResult<f64> {
    let unscaled = StateFeedback::from_matrix(k.gain().clone());
    let closed = plant.apply_state_feedback(&unscaled)?;
    let dc = closed.to_transfer_function()?.dc_gain()?;
    if dc == 0.0 {
        return Err(LtiError::SingularSystem {
            what: "closed loop has zero DC gain; no reference gain reaches unity".to_string(),
        });
    }
    Ok(dc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integrator_plant() -> TransferFunctionModel {
        TransferFunctionModel::siso(&[1.0], &[1.0, 0.0]).unwrap()
    }

    #[test]
    fn state_feedback_on_transfer_function_uses_canonical_states() {
        // 1/(s^2 + 3s + 2): canonical A row 0 = [-3, -2]
        let plant = LtiModel::from(TransferFunctionModel::siso(&[1.0], &[1.0, 3.0, 2.0]).unwrap());
        let spec = FeedbackSpec::from(StateFeedback::new(vec![1.0, 4.0]));
        let closed = close_loop(&plant, &spec).unwrap();
        let LtiModel::StateSpace(ss) = closed else {
            panic!("state feedback should give a state-space model");
        };
        assert_eq!(ss.a()[(0, 0)], -4.0);
        assert_eq!(ss.a()[(0, 1)], -6.0);
    }

    #[test]
    fn proportional_loop_around_integrator() {
        let c = CompensatorLoop::new(TransferFunctionModel::gain(5.0).unwrap());
        let cl = c.close(&integrator_plant()).unwrap();
        let r = cl.as_siso().unwrap();
        assert_eq!(r.num().coeffs(), &[5.0]);
        assert_eq!(r.den().coeffs(), &[1.0, 5.0]);
        assert!((cl.dc_gain().unwrap() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn sensor_in_return_path() {
        // H = 2 halves the DC gain of a type-1 loop
        let c = CompensatorLoop::new(TransferFunctionModel::gain(5.0).unwrap())
            .with_sensor(TransferFunctionModel::gain(2.0).unwrap());
        let cl = c.close(&integrator_plant()).unwrap();
        assert!((cl.dc_gain().unwrap() - 0.5).abs() < 1e-15);
    }

    #[test]
    fn control_effort_of_proportional_loop() {
        // u/r = 5 s / (s + 5)
        let c = CompensatorLoop::new(TransferFunctionModel::gain(5.0).unwrap());
        let u = c.control_effort(&integrator_plant()).unwrap();
        let r = u.as_siso().unwrap();
        assert_eq!(r.num().coeffs(), &[5.0, 0.0]);
        assert_eq!(r.den().coeffs(), &[1.0, 5.0]);
        assert_eq!(u.dc_gain().unwrap(), 0.0);
    }

    #[test]
    fn mimo_plant_is_incompatible() {
        let ss = StateSpaceModel::from_rows(
            &[vec![-1.0]],
            &[vec![1.0]],
            &[vec![1.0], vec![2.0]],
            &[vec![0.0], vec![0.0]],
        )
        .unwrap();
        let c = CompensatorLoop::new(TransferFunctionModel::gain(1.0).unwrap());
        assert!(matches!(
            close_loop(&LtiModel::from(ss), &FeedbackSpec::from(c)),
            Err(LtiError::IncompatibleFeedback { .. })
        ));
    }

    #[test]
    fn reference_gain_restores_unity() {
        let plant = StateSpaceModel::from_rows(
            &[vec![0.0, 1.0], vec![0.0, -1.0]],
            &[vec![0.0], vec![1.0]],
            &[vec![1.0, 0.0]],
            &[vec![0.0]],
        )
        .unwrap();
        let k = StateFeedback::new(vec![4.0, 2.0]);
        let kr = reference_gain_for_unity(&plant, &k).unwrap();
        assert!((kr - 0.25).abs() < 1e-12);
        let closed = plant
            .apply_state_feedback(&k.clone().with_reference_gain(kr))
            .unwrap();
        assert!((closed.dc_gain().unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn scaled_gain_keeps_reference() {
        let k = StateFeedback::new(vec![1.0, 2.0]).with_reference_gain(3.0).scaled(2.0);
        assert_eq!(k.gain()[(0, 1)], 4.0);
        assert_eq!(k.reference_gain(), Some(3.0));
    }
}
