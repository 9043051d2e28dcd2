//! Error types for simulation operations.

use pm_lti::LtiError;
use thiserror::Error;

/// Errors encountered while computing a time response.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: String },

    #[error(transparent)]
    Lti(#[from] LtiError),
}

pub type SimResult<T> = Result<T, SimError>;
