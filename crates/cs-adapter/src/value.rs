//! Attribute values exchanged with the orchestrator.

use std::collections::BTreeMap;

use cs_core::Real;
use serde::{Deserialize, Serialize};

/// A single attribute value as it crosses the adapter boundary.
///
/// Deserialization is untagged: JSON booleans become [`AttrValue::Flag`],
/// integral numbers [`AttrValue::Int`], other numbers [`AttrValue::Real`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Flag(bool),
    Int(i64),
    Real(Real),
    Text(String),
    /// Convergence status: watched attribute name -> settled.
    Status(BTreeMap<String, bool>),
}

impl AttrValue {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Flag(_) => "flag",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Status(_) => "status",
        }
    }

    /// Numeric view. Integers widen to `Real`.
    pub fn as_real(&self) -> Option<Real> {
        match self {
            Self::Real(v) => Some(*v),
            Self::Int(v) => Some(*v as Real),
            _ => None,
        }
    }

    /// Boolean view. A status map reads as true once every entry is settled.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            Self::Int(v) => Some(*v != 0),
            Self::Status(map) => Some(!map.is_empty() && map.values().all(|s| *s)),
            _ => None,
        }
    }

    /// Inverted numeric value, for flow quantities crossing a sign convention.
    pub fn negated(&self) -> Option<Self> {
        self.as_real().map(|v| Self::Real(-v))
    }
}

impl From<Real> for AttrValue {
    fn from(value: Real) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
