//! Entity registry: id generation and ownership of simulator instances.

use std::collections::HashMap;

use cs_core::EntityId;

use crate::error::{AdapterError, AdapterResult};
use crate::gate::{EntityGate, GateConfig};
use crate::meta::EntityDescriptor;
use crate::simulator::Simulator;

/// One managed simulator instance with its gate state.
pub struct Entity<S: Simulator> {
    id: EntityId,
    kind: String,
    sim: S,
    gate: EntityGate,
    params: S::Params,
}

impl<S: Simulator> Entity<S> {
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn sim(&self) -> &S {
        &self.sim
    }

    pub fn gate(&self) -> &EntityGate {
        &self.gate
    }

    /// Constructor parameters captured at creation.
    pub fn params(&self) -> &S::Params {
        &self.params
    }

    pub(crate) fn parts_mut(&mut self) -> (&EntityId, &mut S, &mut EntityGate) {
        (&self.id, &mut self.sim, &mut self.gate)
    }
}

/// Entities in creation order, with per-kind id counters.
///
/// Entities of the served kind `S::KIND` are named `<prefix>_<n>`; any other
/// kind is qualified as `<prefix>_<kind>_<n>` so counters of different kinds
/// never produce the same id.
pub struct Registry<S: Simulator> {
    entities: Vec<Entity<S>>,
    index: HashMap<EntityId, usize>,
    counters: HashMap<String, u64>,
}

impl<S: Simulator> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Simulator> Registry<S> {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            index: HashMap::new(),
            counters: HashMap::new(),
        }
    }

    /// Build `count` simulators and register them under fresh ids.
    ///
    /// All instances are built and all ids checked before any is registered,
    /// so a failing call leaves the registry and its counters unchanged.
    pub fn create(
        &mut self,
        count: usize,
        kind: &str,
        prefix: &str,
        params: &S::Params,
        gate: &GateConfig,
    ) -> AdapterResult<Vec<EntityDescriptor>> {
        let mut sims = Vec::with_capacity(count);
        for _ in 0..count {
            let sim = S::build(params).map_err(|e| AdapterError::Model {
                origin: kind.to_string(),
                message: e.to_string(),
            })?;
            sims.push(sim);
        }

        let start = self.counters.get(kind).copied().unwrap_or(0);
        let id_prefix = if kind == S::KIND {
            prefix.to_string()
        } else {
            format!("{prefix}_{kind}")
        };
        let ids: Vec<EntityId> = (start..)
            .take(sims.len())
            .map(|n| EntityId::compose(&id_prefix, n))
            .collect();
        if let Some(taken) = ids.iter().find(|id| self.index.contains_key(*id)) {
            return Err(AdapterError::DuplicateId {
                entity: taken.clone(),
            });
        }
        self.counters.insert(kind.to_string(), start + ids.len() as u64);

        let mut created = Vec::with_capacity(count);
        for (id, sim) in ids.into_iter().zip(sims) {
            created.push(EntityDescriptor {
                eid: id.to_string(),
                kind: kind.to_string(),
            });
            self.index.insert(id.clone(), self.entities.len());
            self.entities.push(Entity {
                id,
                kind: kind.to_string(),
                sim,
                gate: EntityGate::new(gate),
                params: params.clone(),
            });
        }

        Ok(created)
    }

    pub fn get(&self, id: &str) -> Option<&Entity<S>> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Entities in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity<S>> {
        self.entities.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity<S>> {
        self.entities.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// True when every watched attribute of every entity is settled.
    /// Stops at the first unsettled entity.
    pub fn all_settled(&self) -> bool {
        self.entities.iter().all(|e| e.gate.is_settled())
    }
}
