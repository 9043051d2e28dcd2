//! Physical motor constants.

use pm_core::units::{Inductance, MagneticFlux, MomentOfInertia, Resistance};
use pm_core::{ensure_non_negative, ensure_positive};
use pm_lti::{LtiError, LtiResult};
use serde::{Deserialize, Serialize};
use uom::si::electrical_resistance::ohm;
use uom::si::inductance::henry;
use uom::si::magnetic_flux::weber;
use uom::si::moment_of_inertia::kilogram_square_meter;

/// Surface-mount PMSM in the rotor (dq) frame, SI units throughout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MotorParams {
    pub pole_pairs: u32,
    /// Stator resistance (Ω).
    pub resistance: f64,
    /// Stator inductance (H).
    pub inductance: f64,
    /// Permanent-magnet flux linkage (Wb).
    pub flux_linkage: f64,
    /// Rotor inertia (kg·m²).
    pub inertia: f64,
    /// Viscous friction (N·m·s/rad).
    pub friction: f64,
}

impl Default for MotorParams {
    fn default() -> Self {
        Self {
            pole_pairs: 2,
            resistance: 0.16,
            inductance: 0.00015,
            flux_linkage: 0.00125,
            inertia: 5e-6,
            friction: 2.5e-6,
        }
    }
}

impl MotorParams {
    pub fn from_quantities(
        pole_pairs: u32,
        resistance: Resistance,
        inductance: Inductance,
        flux_linkage: MagneticFlux,
        inertia: MomentOfInertia,
        friction: f64,
    ) -> LtiResult<Self> {
        let params = Self {
            pole_pairs,
            resistance: resistance.get::<ohm>(),
            inductance: inductance.get::<henry>(),
            flux_linkage: flux_linkage.get::<weber>(),
            inertia: inertia.get::<kilogram_square_meter>(),
            friction,
        };
        params.validate()?;
        Ok(params)
    }

    /// Reject non-physical values.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for a zero pole-pair count, a non-positive
    /// resistance, inductance, flux linkage or inertia, or negative friction.
    pub fn validate(&self) -> LtiResult<()> {
        if self.pole_pairs == 0 {
            return Err(LtiError::InvalidParameter {
                what: "pole_pairs must be at least 1".to_string(),
            });
        }
        ensure_positive(self.resistance, "resistance")?;
        ensure_positive(self.inductance, "inductance")?;
        ensure_positive(self.flux_linkage, "flux_linkage")?;
        ensure_positive(self.inertia, "inertia")?;
        ensure_non_negative(self.friction, "friction")?;
        Ok(())
    }

    /// `Kt = 1.5 · pole_pairs · flux` (N·m/A).
    pub fn torque_constant(&self) -> f64 {
        1.5 * f64::from(self.pole_pairs) * self.flux_linkage
    }

    /// `Ke = flux` (V·s/rad).
    pub fn back_emf_constant(&self) -> f64 {
        self.flux_linkage
    }
}
