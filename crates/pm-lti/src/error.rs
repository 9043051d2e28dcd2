//! Error types for LTI modeling and analysis.

use pm_core::CoreError;
use thiserror::Error;

/// Errors raised by model construction, conversion, composition and analysis.
///
/// Every operation either returns a fully validated value or one of these;
/// no partial results are produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LtiError {
    /// Non-physical or otherwise invalid scalar input.
    #[error("Invalid parameter: {what}")]
    InvalidParameter { what: String },

    /// Matrix or polynomial shapes do not line up.
    #[error("Dimension mismatch: {what}")]
    DimensionMismatch { what: String },

    /// Feedback gain or compensator does not fit the plant.
    #[error("Incompatible feedback: {what}")]
    IncompatibleFeedback { what: String },

    /// DC gain is undefined because the system has a pole at the origin.
    #[error("Singular system: {what}")]
    SingularSystem { what: String },

    /// Ill-conditioned inversion or an eigenvalue iteration that did not converge.
    #[error("Numerical instability: {what}")]
    NumericalInstability { what: String },
}

pub type LtiResult<T> = Result<T, LtiError>;

impl LtiError {
    pub(crate) fn dims(what: impl Into<String>) -> Self {
        LtiError::DimensionMismatch { what: what.into() }
    }

    pub(crate) fn param(what: impl Into<String>) -> Self {
        LtiError::InvalidParameter { what: what.into() }
    }
}

impl From<CoreError> for LtiError {
    fn from(e: CoreError) -> Self {
        LtiError::InvalidParameter {
            what: e.to_string(),
        }
    }
}
