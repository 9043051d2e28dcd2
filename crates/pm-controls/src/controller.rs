//! PI and PID compensators as transfer functions.
//!
//! The PID derivative term is `kp·td·s / (td_filter·s + 1)`.

use crate::error::{ControlError, ControlResult};
use pm_lti::TransferFunctionModel;
use serde::{Deserialize, Serialize};

/// A controller that can be placed in the forward path of a loop.
pub trait Compensator {
    /// Continuous-time transfer function from error to control signal.
    fn to_transfer_function(&self) -> ControlResult<TransferFunctionModel>;
}

fn require(ok: bool, what: &'static str) -> ControlResult<()> {
    if ok {
        Ok(())
    } else {
        Err(ControlError::InvalidArg { what })
    }
}

/// Series-form PI controller `kp·(1 + 1/(ti·s))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PIController {
    pub kp: f64,
    /// Integral time (seconds).
    pub ti: f64,
}

impl PIController {
    pub fn new(kp: f64, ti: f64) -> ControlResult<Self> {
        require(kp.is_finite(), "kp must be finite")?;
        require(ti.is_finite() && ti > 0.0, "ti must be positive")?;
        Ok(Self { kp, ti })
    }

    /// From parallel-form gains `kp + ki/s`, both positive.
    pub fn from_gains(kp: f64, ki: f64) -> ControlResult<Self> {
        require(kp.is_finite() && kp > 0.0, "kp must be positive")?;
        require(ki.is_finite() && ki > 0.0, "ki must be positive")?;
        Self::new(kp, kp / ki)
    }

    /// Integral gain `kp / ti`.
    pub fn ki(&self) -> f64 {
        self.kp / self.ti
    }
}

impl Compensator for PIController {
    /// `(kp·s + ki) / s`
    fn to_transfer_function(&self) -> ControlResult<TransferFunctionModel> {
        Ok(TransferFunctionModel::siso(&[self.kp, self.ki()], &[1.0, 0.0])?)
    }
}

/// PI plus a derivative term rolled off by a first-order filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PIDController {
    pub kp: f64,
    pub ti: f64,
    /// Derivative time; zero reduces to a filtered PI.
    pub td: f64,
    /// Derivative filter time constant, keeps the controller proper.
    pub td_filter: f64,
}

impl PIDController {
    pub fn new(kp: f64, ti: f64, td: f64, td_filter: f64) -> ControlResult<Self> {
        require(kp.is_finite(), "kp must be finite")?;
        require(ti.is_finite() && ti > 0.0, "ti must be positive")?;
        require(td.is_finite() && td >= 0.0, "td must be non-negative")?;
        require(
            td_filter.is_finite() && td_filter > 0.0,
            "td_filter must be positive",
        )?;
        Ok(Self {
            kp,
            ti,
            td,
            td_filter,
        })
    }
}

impl Compensator for PIDController {
    /// Over the common denominator `ti·s·(td_filter·s + 1)`:
    /// numerator `kp·(ti·(td_filter + td)·s² + (ti + td_filter)·s + 1)`.
    fn to_transfer_function(&self) -> ControlResult<TransferFunctionModel> {
        let Self {
            kp,
            ti,
            td,
            td_filter,
        } = *self;
        let num = [kp * ti * (td_filter + td), kp * (ti + td_filter), kp];
        let den = [ti * td_filter, ti, 0.0];
        Ok(TransferFunctionModel::siso(&num, &den)?)
    }
}
