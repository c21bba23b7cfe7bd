// cs-core/src/units.rs
//
// The attribute surface exchanges plain f64 in the conventional district
// heating units. These helpers convert flows, heat and time at the boundary.

use uom::si::f64::{MassRate as UomMassRate, Power as UomPower, Time as UomTime};

// Public canonical unit types (SI, f64)
pub type MassRate = UomMassRate;
pub type Power = UomPower;
pub type Time = UomTime;

#[inline]
pub fn kgps(v: f64) -> MassRate {
    use uom::si::mass_rate::kilogram_per_second;
    MassRate::new::<kilogram_per_second>(v)
}

#[inline]
pub fn watts(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn as_kgps(m: MassRate) -> f64 {
    use uom::si::mass_rate::kilogram_per_second;
    m.get::<kilogram_per_second>()
}

#[inline]
pub fn as_watts(p: Power) -> f64 {
    use uom::si::power::watt;
    p.get::<watt>()
}

#[inline]
pub fn as_seconds(t: Time) -> f64 {
    use uom::si::time::second;
    t.get::<second>()
}

pub mod constants {
    /// Specific heat capacity of water, J/(kg K).
    pub const CP_WATER: f64 = 4180.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_smoke() {
        let _mdot = kgps(1.2);
        let _q = watts(5.0e3);
        let _dt = s(10.0);
    }

    #[test]
    fn exchange_units_survive_conversion() {
        assert!((as_kgps(kgps(-0.4)) + 0.4).abs() < 1e-12);
        assert!((as_watts(watts(1.5e3)) - 1.5e3).abs() < 1e-9);
        assert!((as_seconds(s(10.0)) - 10.0).abs() < 1e-12);
    }
}
