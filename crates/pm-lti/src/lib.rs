//! Continuous-time LTI modeling and analysis.
//!
//! This crate is the numerical engine of the motor workspace:
//! - `linalg`: dense kernel on nalgebra (inverse, solve, eigenvalues, expm, Krylov bases)
//! - `poly`: real polynomials with companion-matrix root finding
//! - `state_space` / `realization`: `(A, B, C, D)` models and minimal realizations
//! - `transfer_function`: rational transfer functions and block algebra
//! - `feedback`: state-feedback and compensator loops
//! - `analysis`: poles, DC gain, damping, gain sweeps
//!
//! # Design Principles
//!
//! - **Immutable values**: every transformation returns a new model
//! - **Explicit algebra**: `series`, `parallel`, `feedback`, `scale` instead of operators
//! - **No silent fixes**: a pole at the origin is a `SingularSystem` error, not an infinite gain

pub mod analysis;
pub mod error;
pub mod feedback;
pub mod linalg;
pub mod model;
pub mod poly;
pub mod realization;
pub mod state_space;
pub mod transfer_function;

pub use analysis::{PoleDamping, PoleSet, SweepPoint, damping, gain_sweep};
pub use error::{LtiError, LtiResult};
pub use feedback::{
    CompensatorLoop, FeedbackSpec, StateFeedback, close_loop, reference_gain_for_unity,
};
pub use model::LtiModel;
pub use nalgebra::{Complex, DMatrix, DVector};
pub use poly::Polynomial;
pub use state_space::StateSpaceModel;
pub use transfer_function::{FeedbackSign, RationalFunction, TransferFunctionModel};
