//! Electrical-mechanical state-space model.
//!
//! State `x = [θ, ω, i_q]` (rotor angle, speed, q-axis current), input `v_q`:
//!
//! ```text
//! θ' = ω
//! ω' = (Kt·i_q − B·ω) / J
//! i' = (v_q − Rs·i_q − Ke·ω) / Ls
//! ```

use crate::params::MotorParams;
use pm_lti::{DMatrix, LtiResult, StateSpaceModel};
use serde::{Deserialize, Serialize};

/// Which states the model exposes as outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorOutput {
    #[default]
    Speed,
    Position,
    Current,
    /// All three states (single input, three outputs).
    All,
}

impl MotorOutput {
    /// Column names for reports and CSV files.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            MotorOutput::Speed => &["speed"],
            MotorOutput::Position => &["position"],
            MotorOutput::Current => &["current"],
            MotorOutput::All => &["position", "speed", "current"],
        }
    }

    fn output_matrix(self) -> DMatrix<f64> {
        let row = |k: usize| {
            let mut c = DMatrix::zeros(1, 3);
            c[(0, k)] = 1.0;
            c
        };
        match self {
            MotorOutput::Position => row(0),
            MotorOutput::Speed => row(1),
            MotorOutput::Current => row(2),
            MotorOutput::All => DMatrix::identity(3, 3),
        }
    }
}

/// Open-loop plant for validated `params`.
pub fn state_space(params: &MotorParams, output: MotorOutput) -> LtiResult<StateSpaceModel> {
    params.validate()?;
    let kt = params.torque_constant();
    let ke = params.back_emf_constant();
    let (j, b, rs, ls) = (
        params.inertia,
        params.friction,
        params.resistance,
        params.inductance,
    );

    #[rustfmt::skip]
    let a = DMatrix::from_row_slice(3, 3, &[
        0.0, 1.0,      0.0,
        0.0, -b / j,   kt / j,
        0.0, -ke / ls, -rs / ls,
    ]);
    let input = DMatrix::from_column_slice(3, 1, &[0.0, 0.0, 1.0 / ls]);
    StateSpaceModel::strictly_proper(a, input, output.output_matrix())
}
