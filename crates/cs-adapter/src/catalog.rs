//! Static attribute catalogs.
//!
//! Each entity kind declares its attributes once, as a table of typed
//! accessors onto the simulator's fields. The table carries the role flags
//! the orchestrator sees (input, output, trigger, non-persistent) and the
//! `flow` flag that selects the sign inversion on ingress.
//!
//! Catalogs are validated when an adapter is constructed, so routing never
//! discovers a missing setter or a mistyped flow quantity at run time.

use std::collections::{BTreeMap, HashMap, HashSet};

use cs_core::Real;

use crate::error::{AdapterError, AdapterResult};
use crate::gate::GateConfig;
use crate::value::AttrValue;

/// Typed access to one simulator field.
pub enum Accessor<S> {
    Real {
        get: fn(&S) -> Real,
        set: Option<fn(&mut S, Real)>,
    },
    Flag {
        get: fn(&S) -> bool,
        set: Option<fn(&mut S, bool)>,
    },
    Int {
        get: fn(&S) -> i64,
    },
    Text {
        get: fn(&S) -> String,
    },
    /// Synthetic: the owning entity's convergence status, served by the adapter.
    InitStatus,
}

impl<S> Accessor<S> {
    fn is_settable(&self) -> bool {
        matches!(
            self,
            Accessor::Real { set: Some(_), .. } | Accessor::Flag { set: Some(_), .. }
        )
    }

    fn type_name(&self) -> &'static str {
        match self {
            Accessor::Real { .. } => "real",
            Accessor::Flag { .. } => "flag",
            Accessor::Int { .. } => "int",
            Accessor::Text { .. } => "text",
            Accessor::InitStatus => "status",
        }
    }
}

/// One catalog entry.
pub struct Attribute<S> {
    name: &'static str,
    accessor: Accessor<S>,
    output: bool,
    flow: bool,
    trigger: bool,
    non_persistent: bool,
}

impl<S> Attribute<S> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_input(&self) -> bool {
        self.accessor.is_settable()
    }

    pub fn is_output(&self) -> bool {
        self.output
    }

    /// Flow quantity: sign is inverted on ingress.
    pub fn is_flow(&self) -> bool {
        self.flow
    }

    pub fn is_trigger(&self) -> bool {
        self.trigger
    }

    pub fn is_non_persistent(&self) -> bool {
        self.non_persistent
    }

    pub fn is_init_status(&self) -> bool {
        matches!(self.accessor, Accessor::InitStatus)
    }

    pub fn type_name(&self) -> &'static str {
        self.accessor.type_name()
    }

    /// Read the current value. `status` is only consulted for the synthetic
    /// init-status attribute.
    pub fn read(&self, sim: &S, status: impl FnOnce() -> BTreeMap<String, bool>) -> AttrValue {
        match &self.accessor {
            Accessor::Real { get, .. } => AttrValue::Real(get(sim)),
            Accessor::Flag { get, .. } => AttrValue::Flag(get(sim)),
            Accessor::Int { get } => AttrValue::Int(get(sim)),
            Accessor::Text { get } => AttrValue::Text(get(sim)),
            Accessor::InitStatus => AttrValue::Status(status()),
        }
    }

    /// Write a value into the simulator field.
    ///
    /// Returns the expected type name when the value cannot be converted.
    pub fn write(&self, sim: &mut S, value: &AttrValue) -> Result<(), &'static str> {
        match &self.accessor {
            Accessor::Real { set: Some(set), .. } => {
                let v = value.as_real().ok_or("real")?;
                set(sim, v);
                Ok(())
            }
            Accessor::Flag { set: Some(set), .. } => {
                let v = value.as_flag().ok_or("flag")?;
                set(sim, v);
                Ok(())
            }
            other => Err(other.type_name()),
        }
    }
}

/// Builder for a kind's attribute table.
///
/// Role modifiers (`flow`, `trigger`, `non_persistent`, `also_output`) apply
/// to the most recently added attribute.
pub struct CatalogBuilder<S> {
    attrs: Vec<Attribute<S>>,
    misuse: Option<&'static str>,
}

impl<S> Default for CatalogBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> CatalogBuilder<S> {
    pub fn new() -> Self {
        Self {
            attrs: Vec::new(),
            misuse: None,
        }
    }

    fn push(mut self, name: &'static str, accessor: Accessor<S>, output: bool) -> Self {
        self.attrs.push(Attribute {
            name,
            accessor,
            output,
            flow: false,
            trigger: false,
            non_persistent: false,
        });
        self
    }

    fn modify(mut self, what: &'static str, f: impl FnOnce(&mut Attribute<S>)) -> Self {
        match self.attrs.last_mut() {
            Some(attr) => f(attr),
            None => self.misuse = Some(what),
        }
        self
    }

    pub fn input_real(self, name: &'static str, get: fn(&S) -> Real, set: fn(&mut S, Real)) -> Self {
        self.push(name, Accessor::Real { get, set: Some(set) }, false)
    }

    pub fn input_flag(self, name: &'static str, get: fn(&S) -> bool, set: fn(&mut S, bool)) -> Self {
        self.push(name, Accessor::Flag { get, set: Some(set) }, false)
    }

    pub fn output_real(self, name: &'static str, get: fn(&S) -> Real) -> Self {
        self.push(name, Accessor::Real { get, set: None }, true)
    }

    pub fn output_flag(self, name: &'static str, get: fn(&S) -> bool) -> Self {
        self.push(name, Accessor::Flag { get, set: None }, true)
    }

    pub fn output_int(self, name: &'static str, get: fn(&S) -> i64) -> Self {
        self.push(name, Accessor::Int { get }, true)
    }

    pub fn output_text(self, name: &'static str, get: fn(&S) -> String) -> Self {
        self.push(name, Accessor::Text { get }, true)
    }

    /// Synthetic convergence-status output.
    pub fn init_status(self, name: &'static str) -> Self {
        self.push(name, Accessor::InitStatus, true)
    }

    pub fn flow(self) -> Self {
        self.modify("flow() before any attribute", |a| a.flow = true)
    }

    pub fn trigger(self) -> Self {
        self.modify("trigger() before any attribute", |a| a.trigger = true)
    }

    pub fn non_persistent(self) -> Self {
        self.modify("non_persistent() before any attribute", |a| {
            a.non_persistent = true
        })
    }

    /// Also list an input in the output set.
    pub fn also_output(self) -> Self {
        self.modify("also_output() before any attribute", |a| a.output = true)
    }

    /// Validate the table against itself and the gate's watched attributes.
    pub fn build(self, kind: &'static str, gate: &GateConfig) -> AdapterResult<Catalog<S>> {
        let fail = |what: String| AdapterError::Catalog { kind, what };

        if let Some(what) = self.misuse {
            return Err(fail(what.to_string()));
        }

        let mut index = HashMap::with_capacity(self.attrs.len());
        for (i, attr) in self.attrs.iter().enumerate() {
            if index.insert(attr.name, i).is_some() {
                return Err(fail(format!("duplicate attribute {}", attr.name)));
            }
            if attr.flow && !matches!(attr.accessor, Accessor::Real { .. }) {
                return Err(fail(format!("flow attribute {} is not real-valued", attr.name)));
            }
            if attr.trigger && !attr.is_input() {
                return Err(fail(format!("trigger attribute {} is not an input", attr.name)));
            }
            if attr.non_persistent && !attr.output {
                return Err(fail(format!(
                    "non-persistent attribute {} is not an output",
                    attr.name
                )));
            }
        }

        let mut seen = HashSet::new();
        for name in &gate.watched {
            if !seen.insert(name.as_str()) {
                return Err(fail(format!("attribute {name} watched twice")));
            }
            let attr = index
                .get(name.as_str())
                .map(|&i| &self.attrs[i])
                .ok_or_else(|| fail(format!("watched attribute {name} is not declared")))?;
            if !(attr.is_input() && matches!(attr.accessor, Accessor::Real { .. })) {
                return Err(fail(format!(
                    "watched attribute {name} must be a real-valued input"
                )));
            }
        }

        Ok(Catalog {
            kind,
            attrs: self.attrs,
            index,
        })
    }
}

/// Validated attribute table of one entity kind.
pub struct Catalog<S> {
    kind: &'static str,
    attrs: Vec<Attribute<S>>,
    index: HashMap<&'static str, usize>,
}

impl<S> Catalog<S> {
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Any declared attribute (input or output).
    pub fn get(&self, name: &str) -> Option<&Attribute<S>> {
        self.index.get(name).map(|&i| &self.attrs[i])
    }

    /// Settable attribute.
    pub fn input(&self, name: &str) -> Option<&Attribute<S>> {
        self.get(name).filter(|a| a.is_input())
    }

    /// Attributes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute<S>> {
        self.attrs.iter()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    fn names_where(&self, pred: impl Fn(&Attribute<S>) -> bool) -> Vec<String> {
        self.attrs
            .iter()
            .filter(|a| pred(a))
            .map(|a| a.name.to_string())
            .collect()
    }

    pub fn input_names(&self) -> Vec<String> {
        self.names_where(Attribute::is_input)
    }

    pub fn output_names(&self) -> Vec<String> {
        self.names_where(Attribute::is_output)
    }

    pub fn trigger_names(&self) -> Vec<String> {
        self.names_where(Attribute::is_trigger)
    }

    pub fn non_persistent_names(&self) -> Vec<String> {
        self.names_where(Attribute::is_non_persistent)
    }
}
