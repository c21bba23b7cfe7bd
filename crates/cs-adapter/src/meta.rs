//! Static adapter description returned by `describe` / `init`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

/// Attribute sets of one entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    pub public: bool,
    pub params: Vec<String>,
    /// Every attribute, in declaration order.
    pub attrs: Vec<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub trigger: Vec<String>,
    #[serde(rename = "non-persistent")]
    pub non_persistent: Vec<String>,
}

impl ModelMeta {
    pub fn from_catalog<S>(catalog: &Catalog<S>, params: &[&str]) -> Self {
        Self {
            public: true,
            params: params.iter().map(|p| p.to_string()).collect(),
            attrs: catalog.iter().map(|a| a.name().to_string()).collect(),
            inputs: catalog.input_names(),
            outputs: catalog.output_names(),
            trigger: catalog.trigger_names(),
            non_persistent: catalog.non_persistent_names(),
        }
    }
}

/// Adapter description: stepping type and served kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Always `hybrid`: time-stepped, with trigger attributes.
    #[serde(rename = "type")]
    pub api_type: String,
    pub models: BTreeMap<String, ModelMeta>,
}

impl Meta {
    pub fn hybrid(kind: &str, model: ModelMeta) -> Self {
        let mut models = BTreeMap::new();
        models.insert(kind.to_string(), model);
        Self {
            api_type: "hybrid".to_string(),
            models,
        }
    }
}

/// Descriptor returned for each created entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub eid: String,
    #[serde(rename = "type")]
    pub kind: String,
}
