//! Attribute routing between the orchestrator's key-value exchange and
//! simulator fields.

use std::collections::BTreeMap;

use cs_core::EntityId;

use crate::catalog::Catalog;
use crate::error::{AdapterError, AdapterResult, AttrScope};
use crate::gate::EntityGate;
use crate::value::AttrValue;

/// Producer id -> value for one attribute. `None` means the producer had no value.
pub type Producers = BTreeMap<String, Option<AttrValue>>;
/// Attribute name -> producers, for one entity.
pub type EntityInputs = BTreeMap<String, Producers>;
/// Entity id -> inputs.
pub type Inputs = BTreeMap<String, EntityInputs>;
/// Entity id -> requested attribute names.
pub type Requests = BTreeMap<String, Vec<String>>;

/// A value as it was applied to the simulator (after sign conversion).
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
    pub name: &'static str,
    /// `None` when the producer delivered no value and the field was left alone.
    pub value: Option<AttrValue>,
}

/// Apply one entity's inputs to its simulator, in attribute-name order.
///
/// Errors abort the batch. Attributes applied before the failing one stay
/// applied.
pub fn route<S>(
    catalog: &Catalog<S>,
    entity: &EntityId,
    sim: &mut S,
    batch: &EntityInputs,
    warn_on_missing: bool,
) -> AdapterResult<Vec<Routed>> {
    let mut routed = Vec::with_capacity(batch.len());

    for (name, producers) in batch {
        let attr = catalog
            .input(name)
            .ok_or_else(|| AdapterError::UnknownAttribute {
                entity: entity.clone(),
                attr: name.clone(),
                scope: AttrScope::Input,
            })?;

        if producers.len() != 1 {
            return Err(AdapterError::MultiValue {
                entity: entity.clone(),
                attr: name.clone(),
                producers: producers.len(),
            });
        }

        let incoming = producers.values().next().and_then(Option::as_ref);
        let Some(incoming) = incoming else {
            if warn_on_missing {
                tracing::warn!(entity = %entity, attr = %name, "input is None, keeping current value");
            } else {
                tracing::debug!(entity = %entity, attr = %name, "input is None, keeping current value");
            }
            routed.push(Routed {
                name: attr.name(),
                value: None,
            });
            continue;
        };

        let value = if attr.is_flow() {
            incoming.negated()
        } else {
            Some(incoming.clone())
        };
        let mismatch = |expected| AdapterError::TypeMismatch {
            entity: entity.clone(),
            attr: attr.name(),
            expected,
            found: incoming.type_name(),
        };
        let value = value.ok_or_else(|| mismatch("real"))?;
        attr.write(sim, &value).map_err(mismatch)?;

        routed.push(Routed {
            name: attr.name(),
            value: Some(value),
        });
    }

    Ok(routed)
}

/// Read the requested attributes of one entity.
pub fn collect<S>(
    catalog: &Catalog<S>,
    entity: &EntityId,
    sim: &S,
    gate: &EntityGate,
    requested: &[String],
) -> AdapterResult<BTreeMap<String, AttrValue>> {
    let mut data = BTreeMap::new();
    for name in requested {
        let attr = catalog
            .get(name)
            .ok_or_else(|| AdapterError::UnknownAttribute {
                entity: entity.clone(),
                attr: name.clone(),
                scope: AttrScope::Readable,
            })?;
        data.insert(name.clone(), attr.read(sim, || gate.status()));
    }
    Ok(data)
}
