//! Step response runner.

use crate::error::{SimError, SimResult};
use crate::grid::TimeGrid;
use crate::integrator::{ForwardEuler, Integrator, RK4};
use crate::model::{StepDrive, TransientModel};
use crate::response::StepResponse;
use nalgebra::{DMatrix, DVector};
use pm_lti::{LtiError, LtiModel, StateSpaceModel, linalg};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Propagation scheme between grid samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMethod {
    /// Zero-order-hold discretization through the matrix exponential
    /// (default, exact for a step input up to rounding).
    #[default]
    Exact,
    /// 4th-order Runge-Kutta with automatic sub-stepping.
    Rk4,
    /// Forward Euler with automatic sub-stepping.
    ForwardEuler,
}

/// Options for a step response.
#[derive(Clone, Debug)]
pub struct StepOptions {
    /// Step height applied from `t = 0`.
    pub amplitude: f64,
    /// Sample times
    pub grid: TimeGrid,
    /// Input channel receiving the step
    pub input: usize,
    pub method: StepMethod,
    /// Upper bound on the integrator step (seconds); the stability bound
    /// `0.5 / ‖A‖∞` applies regardless.
    pub max_step: Option<f64>,
}

impl StepOptions {
    pub fn new(grid: TimeGrid) -> Self {
        Self {
            amplitude: 1.0,
            grid,
            input: 0,
            method: StepMethod::default(),
            max_step: None,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_method(mut self, method: StepMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_input(mut self, input: usize) -> Self {
        self.input = input;
        self
    }
}

/// Response of `model` to a step on one input, starting from rest.
///
/// A transfer function is simulated through its canonical realization.
/// Identical model and options give bit-identical samples.
pub fn step_response(model: &LtiModel, opts: &StepOptions) -> SimResult<StepResponse> {
    if !opts.amplitude.is_finite() {
        return Err(SimError::InvalidArg {
            what: "step amplitude must be finite",
        });
    }
    if let Some(h) = opts.max_step {
        if !(h.is_finite() && h > 0.0) {
            return Err(SimError::InvalidArg {
                what: "max_step must be positive",
            });
        }
    }
    let ss = model.to_state_space()?;
    if opts.input >= ss.inputs() {
        return Err(SimError::InvalidArg {
            what: "step input index is out of range",
        });
    }

    let states = match opts.method {
        StepMethod::Exact => propagate_exact(&ss, opts)?,
        StepMethod::Rk4 => propagate_integrator(&ss, opts, &RK4)?,
        StepMethod::ForwardEuler => propagate_integrator(&ss, opts, &ForwardEuler)?,
    };

    let du = ss.d().column(opts.input) * opts.amplitude;
    let mut outputs = vec![Vec::with_capacity(states.len()); ss.outputs()];
    for x in &states {
        let y = ss.c() * x + &du;
        for (trace, v) in outputs.iter_mut().zip(y.iter()) {
            trace.push(*v);
        }
    }
    if outputs.iter().flatten().any(|v| !v.is_finite()) {
        return Err(SimError::NonPhysical {
            what: "step response diverged to non-finite values".to_string(),
        });
    }
    debug!(
        samples = states.len(),
        outputs = outputs.len(),
        method = ?opts.method,
        "step response"
    );
    Ok(StepResponse {
        time: opts.grid.points().to_vec(),
        outputs,
    })
}

/// Interval lengths within this relative distance share one discretization.
const INTERVAL_REUSE_TOL: f64 = 1e-12;

/// ZOH transition over one interval: `expm([[A, b·u], [0, 0]]·h)`.
fn discretize(
    ss: &StateSpaceModel,
    bu: &DVector<f64>,
    h: f64,
) -> SimResult<(DMatrix<f64>, DVector<f64>)> {
    let n = ss.states();
    let mut aug = DMatrix::zeros(n + 1, n + 1);
    aug.view_mut((0, 0), (n, n)).copy_from(&(ss.a() * h));
    aug.view_mut((0, n), (n, 1)).copy_from(&(bu * h));
    let e = linalg::expm(&aug)?;
    let phi = e.view((0, 0), (n, n)).into_owned();
    let gamma = e.view((0, n), (n, 1)).column(0).into_owned();
    Ok((phi, gamma))
}

fn propagate_exact(ss: &StateSpaceModel, opts: &StepOptions) -> SimResult<Vec<DVector<f64>>> {
    let n = ss.states();
    let bu = ss.b().column(opts.input) * opts.amplitude;
    let mut x = DVector::zeros(n);
    let mut out = Vec::with_capacity(opts.grid.len());
    out.push(x.clone());
    if n == 0 {
        out.resize(opts.grid.len(), x);
        return Ok(out);
    }

    let mut cached: Option<(f64, DMatrix<f64>, DVector<f64>)> = None;
    for w in opts.grid.points().windows(2) {
        let h = w[1] - w[0];
        let reuse = matches!(
            &cached,
            Some((hc, _, _)) if (h - hc).abs() <= INTERVAL_REUSE_TOL * hc
        );
        if !reuse {
            let (phi, gamma) = discretize(ss, &bu, h)?;
            cached = Some((h, phi, gamma));
        }
        if let Some((_, phi, gamma)) = &cached {
            x = phi * &x + gamma;
        }
        out.push(x.clone());
    }
    Ok(out)
}

/// Upper bound on explicit sub-steps over a whole grid.
const MAX_SUBSTEPS: usize = 10_000_000;

/// Largest sub-step for the explicit integrators.
fn stable_step(ss: &StateSpaceModel, max_step: Option<f64>) -> f64 {
    let norm = linalg::inf_norm(ss.a());
    let bound = if norm > 0.0 { 0.5 / norm } else { f64::INFINITY };
    max_step.map_or(bound, |h| h.min(bound))
}

fn propagate_integrator<I: Integrator>(
    ss: &StateSpaceModel,
    opts: &StepOptions,
    integrator: &I,
) -> SimResult<Vec<DVector<f64>>> {
    let model = StepDrive::new(ss, opts.input, opts.amplitude);
    let h_max = stable_step(ss, opts.max_step);
    let substeps = |span: f64| -> f64 {
        if h_max.is_finite() {
            (span / h_max).ceil().max(1.0)
        } else {
            1.0
        }
    };
    let planned: f64 = opts
        .grid
        .points()
        .windows(2)
        .map(|w| substeps(w[1] - w[0]))
        .sum();
    if planned > MAX_SUBSTEPS as f64 {
        return Err(LtiError::NumericalInstability {
            what: format!(
                "explicit integration needs {planned:.3e} sub-steps (limit {MAX_SUBSTEPS}); \
                 the model is too stiff for this method, use the exact method"
            ),
        }
        .into());
    }

    let mut x = model.initial_state();
    let mut out = Vec::with_capacity(opts.grid.len());
    out.push(x.clone());

    let mut substeps_total = 0usize;
    for w in opts.grid.points().windows(2) {
        let (t0, span) = (w[0], w[1] - w[0]);
        let m = substeps(span) as usize;
        let dt = span / m as f64;
        for j in 0..m {
            x = integrator.step(&model, t0 + j as f64 * dt, &x, dt)?;
        }
        substeps_total += m;
        out.push(x.clone());
    }
    debug!(substeps = substeps_total, h_max, "integrated step response");
    Ok(out)
}
