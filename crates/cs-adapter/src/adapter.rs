//! The adapter: one simulator kind exposed through the orchestrator protocol.

use std::collections::BTreeMap;

use cs_core::{EntityId, SimTime};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::config::AdapterConfig;
use crate::error::{AdapterError, AdapterResult};
use crate::meta::{EntityDescriptor, Meta, ModelMeta};
use crate::registry::{Entity, Registry};
use crate::router::{self, Inputs, Requests};
use crate::scheduler::{NextStep, StepClock};
use crate::simulator::Simulator;
use crate::value::AttrValue;

/// Data returned by [`Adapter::get_data`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outputs {
    /// Timestamp of the reported values; absent when no timestamp applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<SimTime>,
    /// Entity id -> attribute -> value.
    #[serde(flatten)]
    pub entities: BTreeMap<EntityId, BTreeMap<String, AttrValue>>,
}

/// Exposes a set of simulator instances of kind `S` as one co-simulation
/// participant.
///
/// Lifecycle: [`Adapter::init`] once, [`Adapter::create`] any number of
/// times, then alternating [`Adapter::step`] and [`Adapter::get_data`].
/// While time is zero and some watched attribute is still collecting,
/// `step` returns [`NextStep::Wait`] and expects to be called again at
/// time zero.
pub struct Adapter<S: Simulator> {
    config: AdapterConfig,
    catalog: Catalog<S>,
    registry: Registry<S>,
    clock: StepClock,
    initialized: bool,
}

impl<S: Simulator> Adapter<S> {
    /// Adapter with the simulator's own default configuration.
    pub fn with_defaults() -> AdapterResult<Self> {
        Self::new(S::default_config())
    }

    pub fn new(config: AdapterConfig) -> AdapterResult<Self> {
        config.validate()?;
        let catalog = S::catalog().build(S::KIND, &config.gate)?;
        Ok(Self {
            clock: StepClock::new(config.step_size),
            config,
            catalog,
            registry: Registry::new(),
            initialized: false,
        })
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog<S> {
        &self.catalog
    }

    /// Static description of the served kind.
    pub fn describe(&self) -> Meta {
        Meta::hybrid(S::KIND, ModelMeta::from_catalog(&self.catalog, S::PARAMS))
    }

    /// One-time setup. Overrides the configured step size and, when given,
    /// the entity id prefix.
    pub fn init(&mut self, step_size: SimTime, eid_prefix: Option<&str>) -> AdapterResult<Meta> {
        if self.initialized {
            return Err(AdapterError::AlreadyInitialized);
        }
        let mut config = self.config.clone().with_step_size(step_size);
        if let Some(prefix) = eid_prefix {
            config.eid_prefix = prefix.to_string();
        }
        config.validate()?;

        self.clock.set_step_size(config.step_size);
        self.config = config;
        self.initialized = true;
        tracing::debug!(
            kind = S::KIND,
            step_size,
            prefix = %self.config.eid_prefix,
            "adapter initialized"
        );
        Ok(self.describe())
    }

    /// Create `count` entities of `kind` from `params`.
    pub fn create(
        &mut self,
        count: usize,
        kind: &str,
        params: S::Params,
    ) -> AdapterResult<Vec<EntityDescriptor>> {
        if kind != S::KIND {
            return Err(AdapterError::UnknownKind {
                kind: kind.to_string(),
                supported: S::KIND,
            });
        }
        let created = self.registry.create(
            count,
            kind,
            &self.config.eid_prefix,
            &params,
            &self.config.gate,
        )?;
        tracing::debug!(kind, count, ?params, "entities created");
        Ok(created)
    }

    /// Route inputs, advance every entity and decide the next step.
    ///
    /// `max_advance` is accepted for protocol compatibility and not used.
    pub fn step(
        &mut self,
        time: SimTime,
        inputs: &Inputs,
        _max_advance: Option<SimTime>,
    ) -> AdapterResult<NextStep> {
        let previous = self.clock.observe(time);
        let warmup = time == 0;
        let ticks = self.config.tick_policy.ticks(previous, time);

        for id in inputs.keys().filter(|id| !self.registry.contains(id)) {
            tracing::warn!(kind = S::KIND, entity = %id, "inputs for unknown entity ignored");
        }

        for entity in self.registry.iter_mut() {
            let (id, sim, gate) = entity.parts_mut();

            if let Some(batch) = inputs.get(id.as_str()) {
                let routed = router::route(
                    &self.catalog,
                    id,
                    sim,
                    batch,
                    self.config.warn_on_missing_input,
                )?;
                if warmup {
                    for r in &routed {
                        gate.observe(r.name, r.value.as_ref());
                    }
                }
            }

            for _ in 0..ticks {
                sim.advance_one_tick(time)
                    .map_err(|e| AdapterError::Model {
                        origin: id.to_string(),
                        message: e.to_string(),
                    })?;
            }

            if warmup {
                gate.evaluate(&self.config.gate, id);
            }
        }

        let registry = &self.registry;
        if self.clock.refresh_settled(|| registry.all_settled()) && warmup {
            tracing::debug!(kind = S::KIND, "all watched attributes settled");
        }

        Ok(self.clock.decide(time))
    }

    /// Collect the requested attributes of every entity.
    ///
    /// Entities without a request report an empty map.
    pub fn get_data(&self, requests: &Requests) -> AdapterResult<Outputs> {
        for id in requests.keys().filter(|id| !self.registry.contains(id)) {
            tracing::warn!(kind = S::KIND, entity = %id, "request for unknown entity ignored");
        }

        let mut entities = BTreeMap::new();
        for entity in self.registry.iter() {
            let requested = requests
                .get(entity.id().as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            let data = router::collect(
                &self.catalog,
                entity.id(),
                entity.sim(),
                entity.gate(),
                requested,
            )?;
            entities.insert(entity.id().clone(), data);
        }

        let time = if self.config.timestamp_outputs {
            self.clock.output_time()
        } else {
            None
        };
        Ok(Outputs { time, entities })
    }

    pub fn entity(&self, id: &str) -> Option<&Entity<S>> {
        self.registry.get(id)
    }

    /// Entities in creation order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity<S>> {
        self.registry.iter()
    }

    pub fn all_settled(&self) -> bool {
        self.clock.all_settled()
    }

    pub fn last_observed_time(&self) -> SimTime {
        self.clock.last_observed()
    }

    pub fn step_size(&self) -> SimTime {
        self.clock.step_size()
    }
}
