//! Lumped water-side heat balance helpers.
//!
//! Heat and mass flow are carried as `uom` quantities; temperatures stay in
//! degC because the models only ever work with differences and mixtures.

use cs_core::constants::CP_WATER;
use cs_core::{MassRate, Power, Time, as_kgps, as_seconds, as_watts};

/// Flows below this magnitude are treated as stagnant.
pub const MIN_FLOW_KGPS: f64 = 1e-6;

/// Temperature difference a water flow undergoes when it gives up `heat`.
///
/// Returns `None` for stagnant flow.
pub fn temperature_drop(heat: Power, mdot: MassRate) -> Option<f64> {
    let m = as_kgps(mdot).abs();
    if m < MIN_FLOW_KGPS {
        return None;
    }
    Some(as_watts(heat) / (m * CP_WATER))
}

/// Mass flow needed to carry `heat` across a temperature difference `dt_k`.
pub fn flow_for(heat: Power, dt_k: f64) -> Option<MassRate> {
    if dt_k <= 0.0 {
        return None;
    }
    Some(cs_core::kgps(as_watts(heat) / (CP_WATER * dt_k)))
}

/// Heat carried by `mdot` across `dt_k`.
pub fn heat_of(mdot: MassRate, dt_k: f64) -> Power {
    cs_core::watts(as_kgps(mdot) * CP_WATER * dt_k)
}

/// Flow-weighted mixture of temperature streams. Streams with non-positive
/// flow do not contribute; `fallback` is returned when nothing flows.
pub fn mix(streams: &[(MassRate, f64)], fallback: f64) -> f64 {
    let (mut flow, mut weighted) = (0.0, 0.0);
    for (mdot, temp) in streams {
        let m = as_kgps(*mdot);
        if m > MIN_FLOW_KGPS {
            flow += m;
            weighted += m * temp;
        }
    }
    if flow > MIN_FLOW_KGPS {
        weighted / flow
    } else {
        fallback
    }
}

/// Exact first-order relaxation of `current` toward `target` over `dt`.
pub fn relax(current: f64, target: f64, dt: Time, tau: Time) -> f64 {
    let alpha = 1.0 - (-as_seconds(dt) / as_seconds(tau)).exp();
    current + alpha * (target - current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_core::{kgps, s, watts};
    use proptest::prelude::*;

    #[test]
    fn drop_and_flow_are_inverse() {
        let heat = watts(41_800.0);
        let mdot = flow_for(heat, 20.0).unwrap();
        assert!((as_kgps(mdot) - 0.5).abs() < 1e-12);
        assert!((temperature_drop(heat, mdot).unwrap() - 20.0).abs() < 1e-9);
        assert!((as_watts(heat_of(mdot, 20.0)) - 41_800.0).abs() < 1e-6);
    }

    #[test]
    fn stagnant_flow_has_no_drop() {
        assert!(temperature_drop(watts(1000.0), kgps(0.0)).is_none());
        assert!(flow_for(watts(1000.0), 0.0).is_none());
    }

    #[test]
    fn mixing_ignores_reverse_streams() {
        let t = mix(&[(kgps(1.0), 80.0), (kgps(3.0), 60.0), (kgps(-2.0), 10.0)], 0.0);
        assert!((t - 65.0).abs() < 1e-12);
        assert_eq!(mix(&[(kgps(0.0), 80.0)], 42.0), 42.0);
    }

    #[test]
    fn relaxation_approaches_target() {
        let mut t = 20.0;
        for _ in 0..80 {
            t = relax(t, 70.0, s(10.0), s(60.0));
        }
        assert!((t - 70.0).abs() < 0.01);
        assert!(relax(20.0, 70.0, s(10.0), s(60.0)) < 70.0);
    }

    proptest! {
        #[test]
        fn mixture_stays_between_inputs(
            m1 in 0.01f64..10.0,
            m2 in 0.01f64..10.0,
            t1 in 0.0f64..120.0,
            t2 in 0.0f64..120.0,
        ) {
            let t = mix(&[(kgps(m1), t1), (kgps(m2), t2)], -1.0);
            prop_assert!(t >= t1.min(t2) - 1e-9);
            prop_assert!(t <= t1.max(t2) + 1e-9);
        }
    }
}
