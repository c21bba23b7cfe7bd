use crate::{CoreError, CoreResult};

/// Floating point type used throughout system
pub type Real = f64;

/// Simulated time in orchestrator ticks.
pub type SimTime = u64;

/// Strict absolute closeness: `|a - b| < eps`.
pub fn within(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

pub fn ensure_finite(v: Real, what: &'static str) -> CoreResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn within_is_strict() {
        assert!(within(70.0, 70.005, 0.01));
        assert!(!within(0.0, 0.5, 0.5));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    proptest! {
        #[test]
        fn within_is_symmetric(a in -1e6f64..1e6, b in -1e6f64..1e6, eps in 1e-6f64..10.0) {
            prop_assert_eq!(within(a, b, eps), within(b, a, eps));
        }
    }
}
