//! Error types for the reference simulators.

use thiserror::Error;

/// Errors raised while building or advancing a reference simulator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid parameter: {what}")]
    InvalidParam { what: &'static str },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: &'static str },

    #[error("Core error: {message}")]
    Core { message: String },
}

pub type ModelResult<T> = Result<T, ModelError>;

impl From<cs_core::CoreError> for ModelError {
    fn from(e: cs_core::CoreError) -> Self {
        ModelError::Core {
            message: e.to_string(),
        }
    }
}
