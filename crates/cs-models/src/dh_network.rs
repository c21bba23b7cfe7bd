//! Lumped district-heating network: one external grid feed, one storage tank
//! feed, two consumer branches and a heat-pump evaporator on the return line.
//!
//! Flow setpoints arrive sign-inverted by the adapter, so injections into the
//! supply line are positive and consumer draws are negative. The grid feed is
//! the slack of the mass balance.

use cs_adapter::{AdapterConfig, CatalogBuilder, GateConfig, Simulator, TickPolicy};
use cs_core::{SimTime, Time, as_kgps, ensure_finite, kgps, s, watts};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::thermal;

/// Construction parameters of [`DhNetwork`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DhNetworkParams {
    /// Ground temperature, degC.
    #[serde(rename = "T_amb", default = "default_t_amb")]
    pub t_amb: f64,
    #[serde(default)]
    pub enable_logging: bool,
    /// Supply temperature of the external grid feed, degC.
    #[serde(rename = "T_supply_grid", default = "default_t_supply_grid")]
    pub t_supply_grid: f64,
    /// Grid supply pressure, bar.
    #[serde(rename = "P_grid_bar", default = "default_p_grid_bar")]
    pub p_grid_bar: f64,
    /// Relax temperatures with the pipe time constant instead of jumping.
    #[serde(default)]
    pub dynamic_temp_flow_enabled: bool,
    /// Seconds of network time per tick.
    #[serde(default = "default_tick_s")]
    pub tick_s: f64,
    /// Pipe thermal time constant, seconds.
    #[serde(default = "default_pipe_tau_s")]
    pub pipe_tau_s: f64,
    /// Fraction of the excess over ground temperature lost per feeder section.
    #[serde(default = "default_feeder_loss")]
    pub feeder_loss: f64,
}

fn default_t_amb() -> f64 {
    10.0
}
fn default_t_supply_grid() -> f64 {
    75.0
}
fn default_p_grid_bar() -> f64 {
    6.0
}
fn default_tick_s() -> f64 {
    10.0
}
fn default_pipe_tau_s() -> f64 {
    300.0
}
fn default_feeder_loss() -> f64 {
    0.01
}

impl Default for DhNetworkParams {
    fn default() -> Self {
        Self {
            t_amb: default_t_amb(),
            enable_logging: false,
            t_supply_grid: default_t_supply_grid(),
            p_grid_bar: default_p_grid_bar(),
            dynamic_temp_flow_enabled: false,
            tick_s: default_tick_s(),
            pipe_tau_s: default_pipe_tau_s(),
            feeder_loss: default_feeder_loss(),
        }
    }
}

impl DhNetworkParams {
    fn validate(&self) -> ModelResult<()> {
        ensure_finite(self.t_amb, "T_amb")?;
        ensure_finite(self.t_supply_grid, "T_supply_grid")?;
        if self.t_supply_grid <= self.t_amb {
            return Err(ModelError::InvalidParam {
                what: "T_supply_grid must exceed T_amb",
            });
        }
        if !(ensure_finite(self.p_grid_bar, "P_grid_bar")? > 0.0) {
            return Err(ModelError::InvalidParam {
                what: "P_grid_bar must be positive",
            });
        }
        if !(ensure_finite(self.tick_s, "tick_s")? > 0.0) {
            return Err(ModelError::InvalidParam {
                what: "tick_s must be positive",
            });
        }
        if !(ensure_finite(self.pipe_tau_s, "pipe_tau_s")? > 0.0) {
            return Err(ModelError::InvalidParam {
                what: "pipe_tau_s must be positive",
            });
        }
        if !(0.0..1.0).contains(&self.feeder_loss) {
            return Err(ModelError::InvalidParam {
                what: "feeder_loss must lie in [0, 1)",
            });
        }
        Ok(())
    }
}

/// Node temperatures, degC.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Temperatures {
    supply_cons1: f64,
    supply_cons2: f64,
    return_cons1: f64,
    return_cons2: f64,
    evap_in: f64,
    return_grid: f64,
}

impl Temperatures {
    fn uniform(t: f64) -> Self {
        Self {
            supply_cons1: t,
            supply_cons2: t,
            return_cons1: t,
            return_cons2: t,
            evap_in: t,
            return_grid: t,
        }
    }

    fn relax_toward(&mut self, target: &Self, dt: Time, tau: Time) {
        let r = |cur: &mut f64, tgt: f64| *cur = thermal::relax(*cur, tgt, dt, tau);
        r(&mut self.supply_cons1, target.supply_cons1);
        r(&mut self.supply_cons2, target.supply_cons2);
        r(&mut self.return_cons1, target.return_cons1);
        r(&mut self.return_cons2, target.return_cons2);
        r(&mut self.evap_in, target.evap_in);
        r(&mut self.return_grid, target.return_grid);
    }
}

/// Thermal network model.
#[derive(Debug, Clone)]
pub struct DhNetwork {
    params: DhNetworkParams,
    tick: Time,
    pipe_tau: Time,

    // Inputs
    t_tank_forward: f64,
    mdot_tank_in_set: f64,
    mdot_grid_set: f64,
    mdot_cons1_set: f64,
    mdot_cons2_set: f64,
    qdot_evap: f64,
    qdot_cons1: f64,
    qdot_cons2: f64,

    // Solved state
    mdot_tank_in: f64,
    mdot_grid: f64,
    mdot_cons1: f64,
    mdot_cons2: f64,
    temps: Temperatures,
    ticks: u64,
}

impl DhNetwork {
    pub fn params(&self) -> &DhNetworkParams {
        &self.params
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn solve_flows(&mut self) {
        let draw1 = (-self.mdot_cons1_set).max(0.0);
        let draw2 = (-self.mdot_cons2_set).max(0.0);
        let tank = self.mdot_tank_in_set;
        let grid = draw1 + draw2 - tank;

        if self.params.enable_logging && (grid - self.mdot_grid_set).abs() > 1e-9 {
            tracing::debug!(
                requested = self.mdot_grid_set,
                balanced = grid,
                "grid feed overridden by mass balance"
            );
        }

        self.mdot_cons1 = draw1;
        self.mdot_cons2 = draw2;
        self.mdot_tank_in = tank;
        self.mdot_grid = grid;
    }

    fn target_temperatures(&self) -> Temperatures {
        let p = &self.params;
        let supply = thermal::mix(
            &[
                (kgps(self.mdot_grid), p.t_supply_grid),
                (kgps(self.mdot_tank_in), self.t_tank_forward),
            ],
            p.t_supply_grid,
        );
        let keep = 1.0 - p.feeder_loss;
        let supply_cons1 = p.t_amb + (supply - p.t_amb) * keep;
        let supply_cons2 = p.t_amb + (supply_cons1 - p.t_amb) * keep;

        let consumer_return = |t_supply: f64, draw: f64, heat: f64| {
            thermal::temperature_drop(watts(heat), kgps(draw))
                .map_or(t_supply, |drop| t_supply - drop)
                .max(p.t_amb)
                .min(t_supply)
        };
        let return_cons1 = consumer_return(supply_cons1, self.mdot_cons1, self.qdot_cons1);
        let return_cons2 = consumer_return(supply_cons2, self.mdot_cons2, self.qdot_cons2);

        let return_flow = kgps(self.mdot_cons1 + self.mdot_cons2);
        let evap_in = thermal::mix(
            &[
                (kgps(self.mdot_cons1), return_cons1),
                (kgps(self.mdot_cons2), return_cons2),
            ],
            supply_cons2,
        );
        let return_grid = thermal::temperature_drop(watts(self.qdot_evap), return_flow)
            .map_or(evap_in, |drop| evap_in - drop)
            .max(p.t_amb);

        Temperatures {
            supply_cons1,
            supply_cons2,
            return_cons1,
            return_cons2,
            evap_in,
            return_grid,
        }
    }

    fn total_injection(&self) -> f64 {
        as_kgps(kgps(self.mdot_grid) + kgps(self.mdot_tank_in))
    }
}

impl Simulator for DhNetwork {
    const KIND: &'static str = "DHNetwork";
    const PARAMS: &'static [&'static str] = &[
        "T_amb",
        "enable_logging",
        "T_supply_grid",
        "P_grid_bar",
        "dynamic_temp_flow_enabled",
    ];
    type Params = DhNetworkParams;
    type Error = ModelError;

    fn catalog() -> CatalogBuilder<Self> {
        CatalogBuilder::<Self>::new()
            .input_real("T_tank_forward", |n| n.t_tank_forward, |n, v| n.t_tank_forward = v)
            .trigger()
            .input_real("mdot_tank_in_set", |n| n.mdot_tank_in_set, |n, v| n.mdot_tank_in_set = v)
            .flow()
            .input_real("mdot_grid_set", |n| n.mdot_grid_set, |n, v| n.mdot_grid_set = v)
            .flow()
            .input_real("mdot_cons1_set", |n| n.mdot_cons1_set, |n, v| n.mdot_cons1_set = v)
            .flow()
            .input_real("mdot_cons2_set", |n| n.mdot_cons2_set, |n, v| n.mdot_cons2_set = v)
            .flow()
            .input_real("Qdot_evap", |n| n.qdot_evap, |n, v| n.qdot_evap = v)
            .trigger()
            .input_real("Qdot_cons1", |n| n.qdot_cons1, |n, v| n.qdot_cons1 = v)
            .input_real("Qdot_cons2", |n| n.qdot_cons2, |n, v| n.qdot_cons2 = v)
            .output_real("T_supply_grid", |n| n.params.t_supply_grid)
            .output_real("T_return_grid", |n| n.temps.return_grid)
            .output_real("T_return_tank", |n| n.temps.return_grid)
            .non_persistent()
            .output_real("T_evap_in", |n| n.temps.evap_in)
            .output_real("T_supply_cons1", |n| n.temps.supply_cons1)
            .output_real("T_supply_cons2", |n| n.temps.supply_cons2)
            .output_real("T_return_cons1", |n| n.temps.return_cons1)
            .output_real("T_return_cons2", |n| n.temps.return_cons2)
            .output_real("mdot_tank_in", |n| n.mdot_tank_in)
            .output_real("mdot_grid", |n| n.mdot_grid)
            .output_real("mdot_cons1", |n| n.mdot_cons1)
            .output_real("mdot_cons2", |n| n.mdot_cons2)
            .init_status("initialized")
    }

    fn default_config() -> AdapterConfig {
        let mut config = AdapterConfig::new("DHNetwork")
            .with_tick_policy(TickPolicy::PerCall)
            .with_gate(GateConfig {
                watched: vec!["T_tank_forward".to_string(), "Qdot_evap".to_string()],
                epsilon: 0.01,
                cap: 1950,
                ..GateConfig::default()
            });
        config.warn_on_missing_input = true;
        config
    }

    fn build(params: &DhNetworkParams) -> ModelResult<Self> {
        params.validate()?;
        let mut network = Self {
            params: params.clone(),
            tick: s(params.tick_s),
            pipe_tau: s(params.pipe_tau_s),
            t_tank_forward: params.t_supply_grid,
            mdot_tank_in_set: 0.0,
            mdot_grid_set: 0.0,
            mdot_cons1_set: 0.0,
            mdot_cons2_set: 0.0,
            qdot_evap: 0.0,
            qdot_cons1: 0.0,
            qdot_cons2: 0.0,
            mdot_tank_in: 0.0,
            mdot_grid: 0.0,
            mdot_cons1: 0.0,
            mdot_cons2: 0.0,
            temps: Temperatures::uniform(params.t_supply_grid),
            ticks: 0,
        };
        network.temps = network.target_temperatures();
        if params.enable_logging {
            tracing::info!(
                t_supply_grid = params.t_supply_grid,
                p_grid_bar = params.p_grid_bar,
                dynamic = params.dynamic_temp_flow_enabled,
                "district heating network built"
            );
        }
        Ok(network)
    }

    fn advance_one_tick(&mut self, time: SimTime) -> ModelResult<()> {
        ensure_finite(self.t_tank_forward, "T_tank_forward")?;
        for q in [self.qdot_evap, self.qdot_cons1, self.qdot_cons2] {
            ensure_finite(q, "heat flow input")?;
        }

        self.solve_flows();
        let target = self.target_temperatures();
        if self.params.dynamic_temp_flow_enabled {
            self.temps.relax_toward(&target, self.tick, self.pipe_tau);
        } else {
            self.temps = target;
        }
        self.ticks += 1;

        if self.params.enable_logging {
            tracing::trace!(
                time,
                injection = self.total_injection(),
                t_supply_cons1 = self.temps.supply_cons1,
                t_return_grid = self.temps.return_grid,
                "network tick"
            );
        }
        Ok(())
    }
}
