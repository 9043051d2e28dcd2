//! Typed constructors for motor quantities.

use uom::si::f64::{
    AngularVelocity as UomAngularVelocity, ElectricalResistance as UomElectricalResistance,
    Inductance as UomInductance, MagneticFlux as UomMagneticFlux,
    MomentOfInertia as UomMomentOfInertia,
};

// Public canonical unit types (SI, f64)
pub type AngularVelocity = UomAngularVelocity;
pub type Inductance = UomInductance;
pub type MagneticFlux = UomMagneticFlux;
pub type MomentOfInertia = UomMomentOfInertia;
pub type Resistance = UomElectricalResistance;

#[inline]
pub fn ohm(v: f64) -> Resistance {
    use uom::si::electrical_resistance::ohm;
    Resistance::new::<ohm>(v)
}

#[inline]
pub fn henry(v: f64) -> Inductance {
    use uom::si::inductance::henry;
    Inductance::new::<henry>(v)
}

#[inline]
pub fn weber(v: f64) -> MagneticFlux {
    use uom::si::magnetic_flux::weber;
    MagneticFlux::new::<weber>(v)
}

#[inline]
pub fn kg_m2(v: f64) -> MomentOfInertia {
    use uom::si::moment_of_inertia::kilogram_square_meter;
    MomentOfInertia::new::<kilogram_square_meter>(v)
}

#[inline]
pub fn rpm(v: f64) -> AngularVelocity {
    use uom::si::angular_velocity::revolution_per_minute;
    AngularVelocity::new::<revolution_per_minute>(v)
}

/// Angular velocity in rad/s.
#[inline]
pub fn rad_per_s(w: AngularVelocity) -> f64 {
    use uom::si::angular_velocity::radian_per_second;
    w.get::<radian_per_second>()
}

/// Mechanical speed in rad/s expressed in rpm.
#[inline]
pub fn to_rpm(rad_s: f64) -> f64 {
    use uom::si::angular_velocity::{radian_per_second, revolution_per_minute};
    AngularVelocity::new::<radian_per_second>(rad_s).get::<revolution_per_minute>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _r = ohm(0.16);
        let _l = henry(150e-6);
        let _f = weber(1.25e-3);
        let _j = kg_m2(5e-6);
    }

    #[test]
    fn rpm_converts_to_rad_per_s() {
        let w = rad_per_s(rpm(60.0));
        assert!((w - 2.0 * std::f64::consts::PI).abs() < 1e-12);
        assert!((to_rpm(w) - 60.0).abs() < 1e-9);
    }
}
