//! pm-motor: permanent-magnet synchronous motor analysis.
//!
//! Contains:
//! - params (physical constants, validated)
//! - model (dq-frame state-space plant with selectable outputs)
//! - config (YAML analysis files)
//! - analysis (closed loop, poles, DC gain, step response, gain sweeps)

pub mod analysis;
pub mod config;
pub mod error;
pub mod model;
pub mod params;

pub use analysis::{
    AnalysisReport, PoleRecord, SweepRecord, run_analysis, sweep_gain, sweep_values,
};
pub use config::{
    AnalysisConfig, ControlConfig, StepConfig, load_config, save_config, validate_config,
};
pub use error::{MotorError, MotorResult};
pub use model::{MotorOutput, state_space};
pub use params::MotorParams;
