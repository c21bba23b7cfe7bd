//! Reference district-heating simulators for the co-simulation adapters.
//!
//! Three small lumped models, each implementing [`cs_adapter::Simulator`]
//! with the attribute catalog and adapter settings of its kind:
//!
//! - [`DhNetwork`] (`DHNetwork`): thermal network with grid, tank and two
//!   consumer branches
//! - [`FlexController`] (`SimpleFlexHeatController`): power-to-heat
//!   facility controller
//! - [`HexConsumer`] (`HEXConsumer`): consumer substation
//!
//! The physics is illustrative; the attribute surfaces are what the
//! co-simulation wiring depends on.

pub mod actuator;
pub mod dh_network;
pub mod error;
pub mod flex_controller;
pub mod hex_consumer;
pub mod pi;
pub mod thermal;

pub use actuator::{ValveActuator, ValvePosition};
pub use dh_network::{DhNetwork, DhNetworkParams};
pub use error::{ModelError, ModelResult};
pub use flex_controller::{FlexController, FlexControllerParams, Mode};
pub use hex_consumer::{HexConsumer, HexConsumerParams};
pub use pi::{PiLoop, PiState};
