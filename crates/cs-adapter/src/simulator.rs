//! Simulator trait for pluggable wrapped models.

use core::fmt;

use cs_core::SimTime;

use crate::catalog::CatalogBuilder;
use crate::config::AdapterConfig;

/// Trait for a physical simulator wrapped by an [`Adapter`](crate::Adapter).
///
/// A Simulator must provide:
/// - its entity kind and constructor parameter names (static metadata)
/// - an attribute table of typed accessors onto its fields
/// - the adapter configuration it expects (gate settings, tick policy)
/// - construction from parameters and single-tick advancement
pub trait Simulator: Sized {
    /// Entity kind served, e.g. `"DHNetwork"`.
    const KIND: &'static str;

    /// Constructor parameter names advertised by `describe`.
    const PARAMS: &'static [&'static str];

    /// Constructor parameters, kept with each entity for provenance.
    type Params: Clone + fmt::Debug;

    /// Model error type.
    type Error: std::error::Error;

    /// Attribute table of this kind. Validated once per adapter.
    fn catalog() -> CatalogBuilder<Self>;

    /// Adapter settings this model is designed for.
    fn default_config() -> AdapterConfig;

    /// Build a fresh instance.
    fn build(params: &Self::Params) -> Result<Self, Self::Error>;

    /// Advance internal state by one solver tick.
    ///
    /// `time` is the orchestrator time of the step call that triggered the tick.
    fn advance_one_tick(&mut self, time: SimTime) -> Result<(), Self::Error>;
}
