//! pm-core: shared foundation for the motor LTI workspace.
//!
//! Contains:
//! - units (uom SI types + constructors for motor quantities)
//! - numeric (Real + finite/positive checks)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
