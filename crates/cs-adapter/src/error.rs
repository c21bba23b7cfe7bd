//! Error types for adapter operations.

use core::fmt;

use cs_core::EntityId;
use thiserror::Error;

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Which part of the catalog a lookup was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrScope {
    /// Settable attributes (step inputs).
    Input,
    /// Inputs and outputs (collectable attributes).
    Readable,
}

impl fmt::Display for AttrScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Readable => f.write_str("readable"),
        }
    }
}

/// Errors raised by the adapter. Every variant is fatal to the call that
/// produced it; non-convergence is reported through tracing, not here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdapterError {
    /// An attribute did not have exactly one producer in one step.
    #[error("{entity}: attribute {attr} has {producers} producers, exactly one is supported")]
    MultiValue {
        entity: EntityId,
        attr: String,
        producers: usize,
    },

    /// Attribute name is not in the entity's declared catalog.
    #[error("{entity} has no {scope} attribute {attr}")]
    UnknownAttribute {
        entity: EntityId,
        attr: String,
        scope: AttrScope,
    },

    /// Value type cannot be written into the target field.
    #[error("{entity}: attribute {attr} expects {expected}, got {found}")]
    TypeMismatch {
        entity: EntityId,
        attr: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// Entity kind not served by this adapter.
    #[error("Unknown entity kind {kind} (adapter serves {supported})")]
    UnknownKind {
        kind: String,
        supported: &'static str,
    },

    /// A generated entity id is already registered.
    #[error("Entity id {entity} is already in use")]
    DuplicateId { entity: EntityId },

    /// `init` was called twice.
    #[error("Adapter already initialized")]
    AlreadyInitialized,

    /// Adapter configuration rejected.
    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: String },

    /// Static attribute catalog failed validation.
    #[error("Attribute catalog for {kind} is inconsistent: {what}")]
    Catalog { kind: &'static str, what: String },

    /// The wrapped simulator failed to build or advance.
    #[error("Model error in {origin}: {message}")]
    Model { origin: String, message: String },
}

impl From<cs_core::CoreError> for AdapterError {
    fn from(e: cs_core::CoreError) -> Self {
        AdapterError::InvalidConfig {
            what: e.to_string(),
        }
    }
}
