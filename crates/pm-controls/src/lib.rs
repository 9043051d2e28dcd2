//! Compensators for classical loops around the motor plant.
//!
//! Each controller describes itself as a continuous-time transfer function
//! through the [`Compensator`] trait; the loop itself is closed by
//! `pm_lti::CompensatorLoop`.

pub mod controller;
pub mod error;

pub use controller::{Compensator, PIController, PIDController};
pub use error::{ControlError, ControlResult};
