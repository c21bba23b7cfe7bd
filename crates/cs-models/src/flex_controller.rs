//! Power-to-heat facility controller.
//!
//! Decides per tick whether the storage tank is charged by the heat pump,
//! discharged into the network, or left alone, and splits the network
//! supply between external grid, tank and heat pump accordingly.

use cs_adapter::{AdapterConfig, CatalogBuilder, GateConfig, Simulator, TickPolicy};
use cs_core::{SimTime, ensure_finite, kgps, watts};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::pi::{PiLoop, PiState};
use crate::thermal;

const KELVIN: f64 = 273.15;

/// Operating mode, reported as the integer `state` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// External grid covers the demand; heat pump off.
    Standby,
    /// Tank covers the demand; heat pump off.
    Discharging,
    /// Heat pump charges the tank; external grid covers the demand.
    Charging,
}

impl Mode {
    pub fn code(self) -> i64 {
        match self {
            Mode::Standby => 0,
            Mode::Discharging => 1,
            Mode::Charging => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlexControllerParams {
    /// Follow the external electric setpoint `P_hp_el_setpoint` when set.
    #[serde(default)]
    pub voltage_control_enabled: bool,
    /// Charging starts below this tank temperature, degC.
    #[serde(default = "default_t_tank_min")]
    pub t_tank_min: f64,
    /// Charging stops at this tank temperature, degC.
    #[serde(default = "default_t_tank_max")]
    pub t_tank_max: f64,
    /// Discharging requires at least this tank temperature, degC.
    #[serde(default = "default_t_discharge_min")]
    pub t_discharge_min: f64,
    /// Heat pump thermal output outside voltage control, W.
    #[serde(default = "default_q_hp_nominal")]
    pub q_hp_nominal: f64,
    /// Carnot efficiency of the heat pump.
    #[serde(default = "default_carnot_efficiency")]
    pub carnot_efficiency: f64,
    /// Condenser outlet temperature the charge flow is trimmed to, degC.
    #[serde(default = "default_t_charge_target")]
    pub t_charge_target: f64,
    /// Condenser temperature lift assumed when none is measured, K.
    #[serde(default = "default_dt_cond_nominal")]
    pub dt_cond_nominal: f64,
    #[serde(default = "default_trim")]
    pub trim: PiLoop,
    /// Seconds per tick.
    #[serde(default = "default_tick_s")]
    pub tick_s: f64,
}

fn default_t_tank_min() -> f64 {
    65.0
}
fn default_t_tank_max() -> f64 {
    75.0
}
fn default_t_discharge_min() -> f64 {
    68.0
}
fn default_q_hp_nominal() -> f64 {
    100_000.0
}
fn default_carnot_efficiency() -> f64 {
    0.5
}
fn default_t_charge_target() -> f64 {
    75.0
}
fn default_dt_cond_nominal() -> f64 {
    30.0
}
fn default_trim() -> PiLoop {
    PiLoop {
        kp: 0.02,
        ti: 120.0,
        out_min: -0.5,
        out_max: 0.5,
    }
}
fn default_tick_s() -> f64 {
    10.0
}

impl Default for FlexControllerParams {
    fn default() -> Self {
        Self {
            voltage_control_enabled: false,
            t_tank_min: default_t_tank_min(),
            t_tank_max: default_t_tank_max(),
            t_discharge_min: default_t_discharge_min(),
            q_hp_nominal: default_q_hp_nominal(),
            carnot_efficiency: default_carnot_efficiency(),
            t_charge_target: default_t_charge_target(),
            dt_cond_nominal: default_dt_cond_nominal(),
            trim: default_trim(),
            tick_s: default_tick_s(),
        }
    }
}

impl FlexControllerParams {
    fn validate(&self) -> ModelResult<()> {
        ensure_finite(self.t_tank_min, "t_tank_min")?;
        ensure_finite(self.t_tank_max, "t_tank_max")?;
        ensure_finite(self.t_discharge_min, "t_discharge_min")?;
        if self.t_tank_min >= self.t_tank_max {
            return Err(ModelError::InvalidParam {
                what: "t_tank_min must be below t_tank_max",
            });
        }
        if !(ensure_finite(self.q_hp_nominal, "q_hp_nominal")? > 0.0) {
            return Err(ModelError::InvalidParam {
                what: "q_hp_nominal must be positive",
            });
        }
        let eta = ensure_finite(self.carnot_efficiency, "carnot_efficiency")?;
        if !(eta > 0.0 && eta <= 1.0) {
            return Err(ModelError::InvalidParam {
                what: "carnot_efficiency must lie in (0, 1]",
            });
        }
        if !(ensure_finite(self.dt_cond_nominal, "dt_cond_nominal")? > 0.0) {
            return Err(ModelError::InvalidParam {
                what: "dt_cond_nominal must be positive",
            });
        }
        if !(ensure_finite(self.tick_s, "tick_s")? > 0.0) {
            return Err(ModelError::InvalidParam {
                what: "tick_s must be positive",
            });
        }
        PiLoop::new(
            self.trim.kp,
            self.trim.ti,
            self.trim.out_min,
            self.trim.out_max,
        )?;
        Ok(())
    }
}

/// Heat-pump coefficient of performance from condenser and mean evaporator
/// temperatures, bounded to a plausible range.
pub fn cop(t_cond_out: f64, t_evap_mean: f64, carnot_efficiency: f64) -> f64 {
    let lift = t_cond_out - t_evap_mean;
    if lift <= 1.0 {
        return 8.0;
    }
    (carnot_efficiency * (t_cond_out + KELVIN) / lift).clamp(1.0, 8.0)
}

#[derive(Debug, Clone)]
pub struct FlexController {
    params: FlexControllerParams,
    trim_state: PiState,

    // Inputs
    mdot_hex1: f64,
    mdot_hex2: f64,
    t_tank_hot: f64,
    t_hp_cond_in: f64,
    t_hp_cond_out: f64,
    t_hp_evap_in: f64,
    t_hp_evap_out: f64,
    p_hp_el_setpoint: f64,
    p_hp_effective: f64,
    initialized: bool,

    // Outputs
    mode: Mode,
    mdot_1_supply: f64,
    mdot_2_supply: f64,
    mdot_3_supply: f64,
    q_hp_set: f64,
    mdot_hp_out: f64,
    hp_on_request: bool,
    hp_off_request: bool,
}

impl FlexController {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Total consumer demand in kg/s, independent of the producers' sign
    /// convention.
    pub fn demand(&self) -> f64 {
        self.mdot_hex1.abs() + self.mdot_hex2.abs()
    }

    fn wants_electric_setpoint(&self) -> bool {
        self.params.voltage_control_enabled && self.p_hp_el_setpoint > 0.0
    }

    fn next_mode(&self) -> Mode {
        let p = &self.params;
        if !self.initialized {
            return Mode::Standby;
        }
        let tank_full = self.t_tank_hot >= p.t_tank_max;
        let charging = match self.mode {
            Mode::Charging => !tank_full,
            _ => !tank_full && (self.t_tank_hot < p.t_tank_min || self.wants_electric_setpoint()),
        };
        if charging {
            Mode::Charging
        } else if self.t_tank_hot >= p.t_discharge_min {
            Mode::Discharging
        } else {
            Mode::Standby
        }
    }

    fn heat_setpoint(&self) -> f64 {
        let p = &self.params;
        if self.wants_electric_setpoint() {
            let t_evap = 0.5 * (self.t_hp_evap_in + self.t_hp_evap_out);
            self.p_hp_el_setpoint * cop(self.t_hp_cond_out, t_evap, p.carnot_efficiency)
        } else {
            p.q_hp_nominal
        }
    }

    /// Condenser flow for the heat actually delivered, falling back to the
    /// setpoint while the heat pump reports no power.
    fn condenser_flow(&self, q_set: f64) -> f64 {
        let p = &self.params;
        let t_evap = 0.5 * (self.t_hp_evap_in + self.t_hp_evap_out);
        let q = if self.p_hp_effective > 0.0 {
            self.p_hp_effective * cop(self.t_hp_cond_out, t_evap, p.carnot_efficiency)
        } else {
            q_set
        };
        let lift = self.t_hp_cond_out - self.t_hp_cond_in;
        let lift = if lift > 1.0 { lift } else { p.dt_cond_nominal };
        thermal::flow_for(watts(q), lift)
            .map(cs_core::as_kgps)
            .unwrap_or(0.0)
    }
}

impl Simulator for FlexController {
    const KIND: &'static str = "SimpleFlexHeatController";
    const PARAMS: &'static [&'static str] = &["voltage_control_enabled"];
    type Params = FlexControllerParams;
    type Error = ModelError;

    fn catalog() -> CatalogBuilder<Self> {
        CatalogBuilder::<Self>::new()
            .input_real("mdot_HEX1", |c| c.mdot_hex1, |c, v| c.mdot_hex1 = v)
            .flow()
            .trigger()
            .input_real("mdot_HEX2", |c| c.mdot_hex2, |c, v| c.mdot_hex2 = v)
            .flow()
            .trigger()
            .input_real("T_tank_hot", |c| c.t_tank_hot, |c, v| c.t_tank_hot = v)
            .input_real("T_hp_cond_in", |c| c.t_hp_cond_in, |c, v| c.t_hp_cond_in = v)
            .trigger()
            .input_real("T_hp_cond_out", |c| c.t_hp_cond_out, |c, v| c.t_hp_cond_out = v)
            .trigger()
            .input_real("T_hp_evap_in", |c| c.t_hp_evap_in, |c, v| c.t_hp_evap_in = v)
            .trigger()
            .input_real("T_hp_evap_out", |c| c.t_hp_evap_out, |c, v| c.t_hp_evap_out = v)
            .input_real("P_hp_el_setpoint", |c| c.p_hp_el_setpoint, |c, v| c.p_hp_el_setpoint = v)
            .input_real("P_hp_effective", |c| c.p_hp_effective, |c, v| c.p_hp_effective = v)
            .trigger()
            .input_flag("initialized", |c| c.initialized, |c, v| c.initialized = v)
            .output_real("mdot_1_supply", |c| c.mdot_1_supply)
            .output_real("mdot_2_supply", |c| c.mdot_2_supply)
            .output_real("mdot_3_supply", |c| c.mdot_3_supply)
            .non_persistent()
            .output_real("mdot_1_return", |c| -c.mdot_1_supply)
            .output_real("mdot_2_return", |c| -c.mdot_2_supply)
            .non_persistent()
            .output_real("mdot_3_return", |c| -c.mdot_3_supply)
            .output_real("Q_HP_set", |c| c.q_hp_set)
            .non_persistent()
            .output_real("mdot_HP_out", |c| c.mdot_hp_out)
            .non_persistent()
            .output_real("mdot_tank_in", |c| c.mdot_3_supply)
            .output_flag("hp_on_request", |c| c.hp_on_request)
            .output_flag("hp_off_request", |c| c.hp_off_request)
            .output_int("state", |c| c.mode.code())
    }

    fn default_config() -> AdapterConfig {
        AdapterConfig::new("FHctrl")
            .with_tick_policy(TickPolicy::PerCall)
            .with_gate(GateConfig {
                watched: ["P_hp_effective", "T_hp_cond_out", "T_hp_cond_in", "T_hp_evap_in"]
                    .map(String::from)
                    .to_vec(),
                epsilon: 0.001,
                cap: 1000,
                ..GateConfig::default()
            })
    }

    fn build(params: &FlexControllerParams) -> ModelResult<Self> {
        params.validate()?;
        Ok(Self {
            params: params.clone(),
            trim_state: PiState::default(),
            mdot_hex1: 0.0,
            mdot_hex2: 0.0,
            t_tank_hot: params.t_discharge_min,
            t_hp_cond_in: 0.0,
            t_hp_cond_out: 0.0,
            t_hp_evap_in: 0.0,
            t_hp_evap_out: 0.0,
            p_hp_el_setpoint: 0.0,
            p_hp_effective: 0.0,
            initialized: false,
            mode: Mode::Standby,
            mdot_1_supply: 0.0,
            mdot_2_supply: 0.0,
            mdot_3_supply: 0.0,
            q_hp_set: 0.0,
            mdot_hp_out: 0.0,
            hp_on_request: false,
            hp_off_request: false,
        })
    }

    fn advance_one_tick(&mut self, time: SimTime) -> ModelResult<()> {
        ensure_finite(self.t_tank_hot, "T_tank_hot")?;
        ensure_finite(self.p_hp_effective, "P_hp_effective")?;

        let previous = self.mode;
        let mode = self.next_mode();
        self.hp_on_request = mode == Mode::Charging && previous != Mode::Charging;
        self.hp_off_request = previous == Mode::Charging && mode != Mode::Charging;
        if mode != previous {
            tracing::debug!(time, from = ?previous, to = ?mode, t_tank_hot = self.t_tank_hot, "mode change");
            self.trim_state = PiState::default();
        }
        self.mode = mode;

        let demand = self.demand();
        match mode {
            Mode::Standby | Mode::Charging => {
                self.mdot_1_supply = demand;
                self.mdot_2_supply = 0.0;
            }
            Mode::Discharging => {
                self.mdot_1_supply = 0.0;
                self.mdot_2_supply = demand;
            }
        }

        if mode == Mode::Charging {
            let q_set = self.heat_setpoint();
            let base = self.condenser_flow(q_set);
            let p = &self.params;
            // Too cold at the condenser outlet: slow the charge flow down.
            let u = p.trim.update(
                &mut self.trim_state,
                self.t_hp_cond_out,
                p.t_charge_target,
                p.tick_s,
            );
            self.q_hp_set = q_set;
            self.mdot_hp_out = base;
            self.mdot_3_supply = cs_core::as_kgps(kgps(base) * (1.0 - u));
        } else {
            self.q_hp_set = 0.0;
            self.mdot_hp_out = 0.0;
            self.mdot_3_supply = 0.0;
        }
        Ok(())
    }
}
