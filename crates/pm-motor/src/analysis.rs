//! End-to-end analysis: plant, loop, poles, DC gain and step response.

use crate::config::{AnalysisConfig, ControlConfig, validate_config};
use crate::error::{MotorError, MotorResult};
use crate::model::state_space;
use pm_controls::{Compensator, PIController, PIDController};
use pm_lti::{
    CompensatorLoop, FeedbackSpec, LtiError, LtiModel, PoleDamping, PoleSet, StateFeedback,
    StateSpaceModel, TransferFunctionModel, close_loop, damping, gain_sweep,
    reference_gain_for_unity,
};
use pm_sim::{StepInfo, StepOptions, StepResponse, TimeGrid, step_response};
use serde::Serialize;
use tracing::{info, warn};

/// One pole with its damping figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoleRecord {
    pub re: f64,
    pub im: f64,
    pub natural_frequency: f64,
    pub damping_ratio: f64,
}

impl From<PoleDamping> for PoleRecord {
    fn from(d: PoleDamping) -> Self {
        Self {
            re: d.pole.re,
            im: d.pole.im,
            natural_frequency: d.natural_frequency,
            damping_ratio: d.damping_ratio,
        }
    }
}

fn pole_records(poles: &PoleSet) -> Vec<PoleRecord> {
    damping(poles).into_iter().map(PoleRecord::from).collect()
}

/// Everything one analysis produces.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub name: String,
    pub outputs: Vec<String>,
    pub open_loop_poles: Vec<PoleRecord>,
    pub closed_loop_poles: Vec<PoleRecord>,
    /// Closed-loop pole with the largest real part.
    pub dominant_pole: Option<PoleRecord>,
    pub stable: bool,
    /// Reference gain actually applied under state feedback.
    pub reference_gain: Option<f64>,
    /// Closed-loop transfer function, one line per output.
    pub transfer_function: Vec<String>,
    /// Per-output DC gain; `None` where a pole at the origin leaves it undefined.
    pub dc_gain: Vec<Option<f64>>,
    pub step: StepResponse,
    pub step_info: Vec<StepInfo>,
    /// Controller output for a compensator loop.
    pub control_effort: Option<StepResponse>,
}

/// The closed loop described by `config`, plus the applied reference gain
/// and, for compensator loops, the loop itself.
struct ClosedLoop {
    model: LtiModel,
    reference_gain: Option<f64>,
    compensator: Option<CompensatorLoop>,
}

fn close(plant: &StateSpaceModel, control: &ControlConfig) -> MotorResult<ClosedLoop> {
    let plant_model = LtiModel::from(plant.clone());
    match control {
        ControlConfig::OpenLoop => Ok(ClosedLoop {
            model: plant_model,
            reference_gain: None,
            compensator: None,
        }),
        ControlConfig::StateFeedback {
            gain,
            reference_gain,
            unity_dc_gain,
        } => {
            let k = StateFeedback::new(gain.clone());
            let kr = if *unity_dc_gain {
                Some(reference_gain_for_unity(plant, &k)?)
            } else {
                *reference_gain
            };
            let k = match kr {
                Some(kr) => k.with_reference_gain(kr),
                None => k,
            };
            let model = close_loop(&plant_model, &FeedbackSpec::from(k))?;
            Ok(ClosedLoop {
                model,
                reference_gain: kr,
                compensator: None,
            })
        }
        ControlConfig::Pi { kp, ki } => {
            let c = PIController::from_gains(*kp, *ki)?;
            close_compensated(&plant_model, c.to_transfer_function()?)
        }
        ControlConfig::Pid {
            kp,
            ti,
            td,
            td_filter,
        } => {
            let c = PIDController::new(*kp, *ti, *td, *td_filter)?;
            close_compensated(&plant_model, c.to_transfer_function()?)
        }
    }
}

fn close_compensated(plant: &LtiModel, c: TransferFunctionModel) -> MotorResult<ClosedLoop> {
    let lp = CompensatorLoop::new(c);
    let model = close_loop(plant, &FeedbackSpec::from(lp.clone()))?;
    Ok(ClosedLoop {
        model,
        reference_gain: None,
        compensator: Some(lp),
    })
}

/// DC gain per output, `None` where a pole at the origin makes it undefined.
fn dc_gains(tf: &TransferFunctionModel) -> MotorResult<Vec<Option<f64>>> {
    let mut gains = Vec::with_capacity(tf.outputs());
    for i in 0..tf.outputs() {
        let entry = tf.entry(i, 0).ok_or_else(|| MotorError::InvalidConfig {
            what: format!("closed loop has no entry for output {i}"),
        })?;
        match entry.dc_gain() {
            Ok(g) => gains.push(Some(g)),
            Err(LtiError::SingularSystem { what }) => {
                warn!(output = i, %what, "DC gain undefined");
                gains.push(None);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(gains)
}

pub fn run_analysis(config: &AnalysisConfig) -> MotorResult<AnalysisReport> {
    validate_config(config)?;
    info!(name = %config.name, control = ?config.control, "running analysis");

    let plant = state_space(&config.motor, config.output)?;
    let open_loop_poles = plant.poles()?;
    let closed = close(&plant, &config.control)?;
    let closed_poles = closed.model.poles()?;
    let tf = closed.model.to_transfer_function()?;
    let dc_gain = dc_gains(&tf)?;

    let grid = TimeGrid::linspace(0.0, config.step.t_end, config.step.samples)?;
    let opts = StepOptions::new(grid)
        .with_amplitude(config.step.amplitude)
        .with_method(config.step.method);
    let step = step_response(&closed.model, &opts)?;
    let step_info = (0..step.outputs.len())
        .filter_map(|i| step.info(i))
        .collect();

    let control_effort = match &closed.compensator {
        Some(lp) => {
            let effort = lp.control_effort(&plant.to_transfer_function()?)?;
            Some(step_response(&LtiModel::from(effort), &opts)?)
        }
        None => None,
    };

    info!(
        stable = closed_poles.is_stable(),
        poles = closed_poles.len(),
        "analysis complete"
    );
    Ok(AnalysisReport {
        name: config.name.clone(),
        outputs: config.output.names().iter().map(|s| s.to_string()).collect(),
        open_loop_poles: pole_records(&open_loop_poles),
        closed_loop_poles: pole_records(&closed_poles),
        dominant_pole: closed_poles
            .dominant()
            .map(|p| PoleRecord::from(PoleDamping::of(p))),
        stable: closed_poles.is_stable(),
        reference_gain: closed.reference_gain,
        transfer_function: tf
            .entries()
            .iter()
            .flatten()
            .map(|r| r.to_string())
            .collect(),
        dc_gain,
        step,
        step_info,
        control_effort,
    })
}

/// Closed-loop poles at one value of the swept gain entry.
#[derive(Debug, Clone, Serialize)]
pub struct SweepRecord {
    pub gain: f64,
    pub poles: Vec<PoleRecord>,
}

/// Closed-loop poles while gain entry `index` runs over `values`, the
/// other entries staying at their configured values.
pub fn sweep_gain(
    config: &AnalysisConfig,
    index: usize,
    values: &[f64],
) -> MotorResult<Vec<SweepRecord>> {
    validate_config(config)?;
    let mut base = match &config.control {
        ControlConfig::OpenLoop => vec![0.0; 3],
        ControlConfig::StateFeedback { gain, .. } => gain.clone(),
        ControlConfig::Pi { .. } | ControlConfig::Pid { .. } => {
            return Err(MotorError::InvalidConfig {
                what: "gain sweeps need an open-loop or state-feedback configuration".to_string(),
            });
        }
    };
    if index >= base.len() {
        return Err(MotorError::InvalidConfig {
            what: format!("gain index {index} is outside a {}-state model", base.len()),
        });
    }
    base[index] = 0.0;

    let plant = state_space(&config.motor, config.output)?
        .apply_state_feedback(&StateFeedback::new(base))?;
    let mut direction = vec![0.0; 3];
    direction[index] = 1.0;
    let points = gain_sweep(&plant, &StateFeedback::new(direction), values)?;
    info!(index, points = points.len(), "gain sweep complete");
    Ok(points
        .into_iter()
        .map(|p| SweepRecord {
            gain: p.multiplier,
            poles: pole_records(&p.poles),
        })
        .collect())
}

/// `count` evenly spaced values from `from` to `to` inclusive.
pub fn sweep_values(from: f64, to: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![from],
        _ => (0..count)
            .map(|k| from + (to - from) * k as f64 / (count - 1) as f64)
            .collect(),
    }
}
