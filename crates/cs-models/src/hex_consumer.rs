//! Consumer substation: a heat exchanger whose primary flow is set by a
//! motorized valve so the delivered heat returns at the target temperature.

use cs_adapter::{AdapterConfig, CatalogBuilder, Simulator, TickPolicy};
use cs_core::{SimTime, Time, as_kgps, ensure_finite, kgps, s, watts};
use serde::{Deserialize, Serialize};

use crate::actuator::{ValveActuator, ValvePosition};
use crate::error::{ModelError, ModelResult};
use crate::thermal;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HexConsumerParams {
    /// Primary return temperature the valve aims for, degC.
    #[serde(rename = "T_return_target", default = "default_t_return_target")]
    pub t_return_target: f64,
    /// Initial heat demand, W.
    #[serde(rename = "P_heat", default)]
    pub p_heat: f64,
    /// Commissioning primary flow, kg/s.
    #[serde(default)]
    pub mdot_hex_in: f64,
    /// Commissioning return flow, kg/s (negative: injected into the return).
    #[serde(default)]
    pub mdot_hex_out: f64,
    /// Fully open primary flow, kg/s.
    #[serde(default = "default_mdot_max")]
    pub mdot_max: f64,
    #[serde(default = "default_valve_tau_s")]
    pub valve_tau_s: f64,
    /// Valve speed limit, 1/s.
    #[serde(default = "default_valve_rate_limit")]
    pub valve_rate_limit: f64,
    /// Seconds per tick; one tick per unit of elapsed simulated time.
    #[serde(default = "default_tick_s")]
    pub tick_s: f64,
}

fn default_t_return_target() -> f64 {
    40.0
}
fn default_mdot_max() -> f64 {
    5.0
}
fn default_valve_tau_s() -> f64 {
    30.0
}
fn default_valve_rate_limit() -> f64 {
    0.02
}
fn default_tick_s() -> f64 {
    1.0
}

impl Default for HexConsumerParams {
    fn default() -> Self {
        Self {
            t_return_target: default_t_return_target(),
            p_heat: 0.0,
            mdot_hex_in: 0.0,
            mdot_hex_out: 0.0,
            mdot_max: default_mdot_max(),
            valve_tau_s: default_valve_tau_s(),
            valve_rate_limit: default_valve_rate_limit(),
            tick_s: default_tick_s(),
        }
    }
}

impl HexConsumerParams {
    fn validate(&self) -> ModelResult<()> {
        ensure_finite(self.t_return_target, "T_return_target")?;
        if ensure_finite(self.p_heat, "P_heat")? < 0.0 {
            return Err(ModelError::InvalidParam {
                what: "P_heat must not be negative",
            });
        }
        if !(ensure_finite(self.mdot_max, "mdot_max")? > 0.0) {
            return Err(ModelError::InvalidParam {
                what: "mdot_max must be positive",
            });
        }
        let mdot_in = ensure_finite(self.mdot_hex_in, "mdot_hex_in")?;
        if !(0.0..=self.mdot_max).contains(&mdot_in) {
            return Err(ModelError::InvalidParam {
                what: "mdot_hex_in must lie in [0, mdot_max]",
            });
        }
        ensure_finite(self.mdot_hex_out, "mdot_hex_out")?;
        if !(ensure_finite(self.tick_s, "tick_s")? > 0.0) {
            return Err(ModelError::InvalidParam {
                what: "tick_s must be positive",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct HexConsumer {
    params: HexConsumerParams,
    valve: ValveActuator,
    position: ValvePosition,
    tick: Time,

    p_heat: f64,
    t_supply: f64,
    initialized: bool,

    mdot_hex_in: f64,
    mdot_hex_out: f64,
    t_return: f64,
}

impl HexConsumer {
    pub fn valve_opening(&self) -> f64 {
        self.position.opening()
    }

    /// Flow needed to deliver the current demand at the target return
    /// temperature; fully open when the supply is not warm enough.
    pub fn required_flow(&self) -> f64 {
        let lift = self.t_supply - self.params.t_return_target;
        if lift < 1.0 {
            return self.params.mdot_max;
        }
        thermal::flow_for(watts(self.p_heat), lift)
            .map_or(self.params.mdot_max, |m| as_kgps(m).min(self.params.mdot_max))
    }

    fn update_return(&mut self) {
        let target = self.params.t_return_target;
        self.t_return = match thermal::temperature_drop(watts(self.p_heat), kgps(self.mdot_hex_in)) {
            Some(drop) => (self.t_supply - drop).max(target).min(self.t_supply),
            None => target,
        };
    }
}

impl Simulator for HexConsumer {
    const KIND: &'static str = "HEXConsumer";
    const PARAMS: &'static [&'static str] =
        &["T_return_target", "P_heat", "mdot_hex_in", "mdot_hex_out"];
    type Params = HexConsumerParams;
    type Error = ModelError;

    fn catalog() -> CatalogBuilder<Self> {
        CatalogBuilder::<Self>::new()
            .input_real("P_heat", |h| h.p_heat, |h, v| h.p_heat = v)
            .input_real("T_supply", |h| h.t_supply, |h, v| h.t_supply = v)
            .trigger()
            .input_flag("initialized", |h| h.initialized, |h, v| h.initialized = v)
            .trigger()
            .output_real("mdot_hex_out", |h| h.mdot_hex_out)
            .non_persistent()
            .output_real("mdot_hex_in", |h| h.mdot_hex_in)
            .output_real("T_return", |h| h.t_return)
    }

    fn default_config() -> AdapterConfig {
        let mut config = AdapterConfig::new("HEXConsumer").with_tick_policy(TickPolicy::Elapsed);
        config.timestamp_outputs = false;
        config
    }

    fn build(params: &HexConsumerParams) -> ModelResult<Self> {
        params.validate()?;
        let valve = ValveActuator::new(s(params.valve_tau_s), params.valve_rate_limit)?;
        let mut hex = Self {
            params: params.clone(),
            valve,
            position: ValvePosition::new(params.mdot_hex_in / params.mdot_max),
            tick: s(params.tick_s),
            p_heat: params.p_heat,
            t_supply: params.t_return_target,
            initialized: false,
            mdot_hex_in: params.mdot_hex_in,
            mdot_hex_out: params.mdot_hex_out,
            t_return: params.t_return_target,
        };
        hex.update_return();
        Ok(hex)
    }

    fn advance_one_tick(&mut self, _time: SimTime) -> ModelResult<()> {
        ensure_finite(self.t_supply, "T_supply")?;
        if ensure_finite(self.p_heat, "P_heat")? < 0.0 {
            return Err(ModelError::NonPhysical {
                what: "negative heat demand",
            });
        }

        // The substation holds its commissioning flow until the network is up.
        if self.initialized {
            let command = self.required_flow() / self.params.mdot_max;
            self.position = self.valve.advance(self.position, self.tick, command);
            self.mdot_hex_in = self.position.opening() * self.params.mdot_max;
            self.mdot_hex_out = -self.mdot_hex_in;
        }
        self.update_return();
        Ok(())
    }
}
