//! Error types for the motor analysis pipeline.

use pm_controls::ControlError;
use pm_lti::LtiError;
use pm_sim::SimError;
use thiserror::Error;

pub type MotorResult<T> = Result<T, MotorError>;

#[derive(Error, Debug)]
pub enum MotorError {
    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: String },

    #[error("Model error: {0}")]
    Lti(#[from] LtiError),

    #[error("Controller error: {0}")]
    Control(#[from] ControlError),

    #[error("Simulation error: {0}")]
    Sim(#[from] SimError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
