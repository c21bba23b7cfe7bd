//! Valve actuator with first-order lag and rate limit.

use cs_core::{Time, as_seconds, ensure_finite};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Valve opening in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValvePosition(f64);

impl ValvePosition {
    pub fn new(opening: f64) -> Self {
        Self(opening.clamp(0.0, 1.0))
    }

    pub fn opening(self) -> f64 {
        self.0
    }
}

/// Motorized valve.
///
/// The opening follows `d(pos)/dt = (cmd - pos) / tau`, with the speed
/// limited to `rate_limit` per second and the result clamped to `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ValveActuator {
    tau: Time,
    rate_limit: f64,
}

impl ValveActuator {
    pub fn new(tau: Time, rate_limit: f64) -> ModelResult<Self> {
        let tau_s = ensure_finite(as_seconds(tau), "valve tau")?;
        if tau_s <= 0.0 {
            return Err(ModelError::InvalidParam {
                what: "valve tau must be positive",
            });
        }
        if ensure_finite(rate_limit, "valve rate limit")? <= 0.0 {
            return Err(ModelError::InvalidParam {
                what: "valve rate limit must be positive",
            });
        }
        Ok(Self { tau, rate_limit })
    }

    /// Opening speed in 1/s for the given state and command.
    pub fn speed(&self, position: ValvePosition, command: f64) -> f64 {
        ((command - position.opening()) / as_seconds(self.tau))
            .clamp(-self.rate_limit, self.rate_limit)
    }

    /// Explicit Euler step of length `dt`.
    pub fn advance(&self, position: ValvePosition, dt: Time, command: f64) -> ValvePosition {
        let speed = self.speed(position, command);
        ValvePosition::new(position.opening() + speed * as_seconds(dt))
    }
}
