//! Discrete PI loop with output clamping and conditional integration.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// PI tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiLoop {
    pub kp: f64,
    /// Integral time in seconds.
    pub ti: f64,
    pub out_min: f64,
    pub out_max: f64,
}

/// Integrator memory of a [`PiLoop`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PiState {
    pub integral: f64,
}

impl PiLoop {
    pub fn new(kp: f64, ti: f64, out_min: f64, out_max: f64) -> ModelResult<Self> {
        if !(ti.is_finite() && ti > 0.0) {
            return Err(ModelError::InvalidParam {
                what: "PI integral time must be positive",
            });
        }
        if !(out_min < out_max) {
            return Err(ModelError::InvalidParam {
                what: "PI output range is empty",
            });
        }
        Ok(Self {
            kp,
            ti,
            out_min,
            out_max,
        })
    }

    /// Output for `measured` against `target` after `dt` seconds.
    ///
    /// The integrator holds while the output is saturated.
    pub fn update(&self, state: &mut PiState, measured: f64, target: f64, dt: f64) -> f64 {
        let error = target - measured;
        let integral = state.integral + error * dt;
        let raw = self.kp * (error + integral / self.ti);
        let out = raw.clamp(self.out_min, self.out_max);
        if out == raw {
            state.integral = integral;
        }
        out
    }
}
