//! Error types for compensator construction.

use pm_lti::LtiError;
use thiserror::Error;

/// Result type for compensator operations.
pub type ControlResult<T> = Result<T, ControlError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a controller constructor.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Building the controller transfer function failed.
    #[error(transparent)]
    Lti(#[from] LtiError),
}
