//! Warm-up scenario file schema.

use std::collections::BTreeMap;
use std::path::Path;

use cs_adapter::{AdapterConfig, AttrValue};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// One adapter driven with constant inputs.
///
/// ```yaml
/// kind: HEXConsumer
/// count: 2
/// params:
///   T_return_target: 40
///   P_heat: 50000
/// inputs:
///   T_supply: 72.0
///   initialized: true
/// steps: 6
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub kind: String,
    #[serde(default = "default_count")]
    pub count: usize,
    /// Constructor parameters, in the model's own field names.
    #[serde(default = "empty_params")]
    pub params: serde_yaml::Value,
    /// Replaces the model's default adapter settings.
    #[serde(default)]
    pub adapter: Option<AdapterConfig>,
    /// Step size passed to `init`; the adapter's own when absent.
    #[serde(default)]
    pub step_size: Option<u64>,
    /// Values sent to every entity on every call.
    #[serde(default)]
    pub inputs: BTreeMap<String, AttrValue>,
    /// Regular steps after warm-up.
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Bound on warm-up calls at time zero.
    #[serde(default = "default_max_warmup_calls")]
    pub max_warmup_calls: usize,
}

fn default_count() -> usize {
    1
}

fn empty_params() -> serde_yaml::Value {
    serde_yaml::Value::Mapping(serde_yaml::Mapping::new())
}

fn default_steps() -> usize {
    5
}

fn default_max_warmup_calls() -> usize {
    5000
}

impl Scenario {
    pub fn from_yaml_str(content: &str) -> CliResult<Self> {
        let scenario: Self =
            serde_yaml::from_str(content).map_err(|e| CliError::Scenario(e.to_string()))?;
        if scenario.count == 0 {
            return Err(CliError::Scenario("count must be positive".to_string()));
        }
        if scenario.max_warmup_calls == 0 {
            return Err(CliError::Scenario(
                "max_warmup_calls must be positive".to_string(),
            ));
        }
        Ok(scenario)
    }

    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::ScenarioRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Constructor parameters as the model's parameter type.
    pub fn params<P: serde::de::DeserializeOwned>(&self) -> CliResult<P> {
        serde_yaml::from_value(self.params.clone()).map_err(|e| CliError::Scenario(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_models::HexConsumerParams;

    #[test]
    fn minimal_scenario_uses_defaults() {
        let scenario = Scenario::from_yaml_str("kind: DHNetwork\n").unwrap();
        assert_eq!(scenario.count, 1);
        assert_eq!(scenario.steps, 5);
        assert!(scenario.adapter.is_none());
        assert!(scenario.inputs.is_empty());
    }

    #[test]
    fn inputs_keep_their_types() {
        let yaml = "kind: HEXConsumer\ninputs:\n  T_supply: 72.5\n  initialized: true\n  P_heat: 50000\n";
        let scenario = Scenario::from_yaml_str(yaml).unwrap();
        assert_eq!(scenario.inputs["T_supply"], AttrValue::Real(72.5));
        assert_eq!(scenario.inputs["initialized"], AttrValue::Flag(true));
        assert_eq!(scenario.inputs["P_heat"], AttrValue::Int(50000));
    }

    #[test]
    fn params_deserialize_into_model_type() {
        let yaml = "kind: HEXConsumer\nparams:\n  T_return_target: 35\n  P_heat: 20000\n";
        let scenario = Scenario::from_yaml_str(yaml).unwrap();
        let params: HexConsumerParams = scenario.params().unwrap();
        assert_eq!(params.t_return_target, 35.0);
        assert_eq!(params.p_heat, 20000.0);

        let empty = Scenario::from_yaml_str("kind: HEXConsumer\n").unwrap();
        let params: HexConsumerParams = empty.params().unwrap();
        assert_eq!(params, HexConsumerParams::default());
    }

    #[test]
    fn rejects_unknown_fields_and_zero_count() {
        assert!(Scenario::from_yaml_str("kind: DHNetwork\nbogus: 1\n").is_err());
        assert!(Scenario::from_yaml_str("kind: DHNetwork\ncount: 0\n").is_err());
    }
}
