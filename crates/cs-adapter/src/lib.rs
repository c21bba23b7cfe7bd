//! Convergence-gated co-simulation adapters.
//!
//! This crate exposes independently stepped simulators as uniform
//! participants of a time-stepped co-simulation. One generic [`Adapter`]
//! serves every simulator kind; a kind plugs in by implementing
//! [`Simulator`] and declaring its attribute [`Catalog`].
//!
//! # Architecture
//!
//! - **Router** (`router`): validates incoming values against the catalog,
//!   inverts flow quantities, writes them through typed accessors, and reads
//!   requested outputs back.
//! - **Gate** (`gate`): per entity and watched attribute, collects samples
//!   while time is zero and settles on convergence or after a bounded number
//!   of samples.
//! - **Scheduler** (`scheduler`): tick policy, `Wait` vs. next-time decision,
//!   output timestamps.
//! - **Registry** (`registry`): entity ids and ownership of the simulator
//!   instances.
//!
//! Everything runs synchronously inside the orchestrator's call; waiting for
//! warm-up is expressed by returning [`NextStep::Wait`].

pub mod adapter;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gate;
pub mod meta;
pub mod registry;
pub mod router;
pub mod scheduler;
pub mod simulator;
pub mod value;

pub use adapter::{Adapter, Outputs};
pub use catalog::{Accessor, Attribute, Catalog, CatalogBuilder};
pub use config::AdapterConfig;
pub use error::{AdapterError, AdapterResult, AttrScope};
pub use gate::{EntityGate, GateConfig, Phase, Settlement, WatchedAttribute};
pub use meta::{EntityDescriptor, Meta, ModelMeta};
pub use registry::{Entity, Registry};
pub use router::{EntityInputs, Inputs, Producers, Requests, Routed};
pub use scheduler::{NextStep, StepClock, TickPolicy};
pub use simulator::Simulator;
pub use value::AttrValue;
