//! Step response simulation for LTI models.
//!
//! Provides:
//! - Time grids that start at rest and increase strictly
//! - Exact zero-order-hold propagation via the matrix exponential
//! - Fixed-step RK4 and forward Euler integrators with stability-bounded sub-stepping
//! - Step response metrics (rise, settling, overshoot, peak)

pub mod error;
pub mod grid;
pub mod integrator;
pub mod model;
pub mod response;
pub mod sim;

pub use error::{SimError, SimResult};
pub use grid::TimeGrid;
pub use integrator::{ForwardEuler, Integrator, RK4};
pub use model::{StepDrive, TransientModel};
pub use response::{StepInfo, StepResponse};
pub use sim::{StepMethod, StepOptions, step_response};
