//! Adapter configuration and its YAML/JSON loaders.

use std::path::Path;

use cs_core::SimTime;
use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, AdapterResult};
use crate::gate::GateConfig;
use crate::scheduler::TickPolicy;

/// Settings of one adapter instance, fixed for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Simulated-time increment between post-warm-up steps.
    #[serde(default = "default_step_size")]
    pub step_size: SimTime,
    /// Entity id prefix; ids are `<prefix>_<n>`.
    pub eid_prefix: String,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub tick_policy: TickPolicy,
    /// Log absent input values at warn level instead of debug.
    #[serde(default)]
    pub warn_on_missing_input: bool,
    /// Attach a timestamp to collected outputs.
    #[serde(default = "default_true")]
    pub timestamp_outputs: bool,
}

fn default_step_size() -> SimTime {
    10
}

fn default_true() -> bool {
    true
}

impl AdapterConfig {
    /// Config with defaults for everything but the prefix.
    pub fn new(eid_prefix: impl Into<String>) -> Self {
        Self {
            step_size: default_step_size(),
            eid_prefix: eid_prefix.into(),
            gate: GateConfig::default(),
            tick_policy: TickPolicy::default(),
            warn_on_missing_input: false,
            timestamp_outputs: true,
        }
    }

    pub fn with_step_size(mut self, step_size: SimTime) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn with_gate(mut self, gate: GateConfig) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_tick_policy(mut self, policy: TickPolicy) -> Self {
        self.tick_policy = policy;
        self
    }

    pub fn validate(&self) -> AdapterResult<()> {
        if self.step_size == 0 {
            return Err(AdapterError::InvalidConfig {
                what: "step_size must be positive".to_string(),
            });
        }
        if self.eid_prefix.is_empty() {
            return Err(AdapterError::InvalidConfig {
                what: "eid_prefix must not be empty".to_string(),
            });
        }
        self.gate.validate()
    }

    pub fn from_yaml_str(content: &str) -> AdapterResult<Self> {
        let config: Self = serde_yaml::from_str(content).map_err(config_error)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> AdapterResult<Self> {
        let config: Self = serde_json::from_str(content).map_err(config_error)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_yaml(path: &Path) -> AdapterResult<Self> {
        let content = std::fs::read_to_string(path).map_err(config_error)?;
        Self::from_yaml_str(&content)
    }

    pub fn load_json(path: &Path) -> AdapterResult<Self> {
        let content = std::fs::read_to_string(path).map_err(config_error)?;
        Self::from_json_str(&content)
    }
}

fn config_error(e: impl std::fmt::Display) -> AdapterError {
    AdapterError::InvalidConfig {
        what: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fills_defaults() {
        let config = AdapterConfig::from_yaml_str("eid_prefix: HEXConsumer\n").unwrap();
        assert_eq!(config, AdapterConfig::new("HEXConsumer"));
        assert_eq!(config.step_size, 10);
        assert_eq!(config.gate.min_samples, 5);
        assert!(config.timestamp_outputs);
    }

    #[test]
    fn yaml_full() {
        let yaml = r#"
step_size: 60
eid_prefix: FHctrl
tick_policy: elapsed
warn_on_missing_input: true
timestamp_outputs: false
gate:
  watched: [P_hp_effective, T_hp_cond_out]
  epsilon: 0.001
  cap: 1000
"#;
        let config = AdapterConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.step_size, 60);
        assert_eq!(config.tick_policy, TickPolicy::Elapsed);
        assert_eq!(config.gate.watched.len(), 2);
        assert_eq!(config.gate.cap, 1000);
        assert!(!config.timestamp_outputs);
    }

    #[test]
    fn json_round_trip() {
        let config = AdapterConfig::new("DHNetwork").with_step_size(15);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(AdapterConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn rejects_zero_step_and_empty_prefix() {
        assert!(AdapterConfig::from_yaml_str("eid_prefix: X\nstep_size: 0\n").is_err());
        assert!(AdapterConfig::from_yaml_str("eid_prefix: ''\n").is_err());
        assert!(AdapterConfig::from_yaml_str("step_size: 10\n").is_err());
    }

    #[test]
    fn load_yaml_from_disk() {
        let path = std::env::temp_dir().join("cs_adapter_config_load.yaml");
        std::fs::write(&path, "eid_prefix: DHNetwork\nstep_size: 30\n").unwrap();
        let config = AdapterConfig::load_yaml(&path).unwrap();
        assert_eq!(config.step_size, 30);
        assert!(AdapterConfig::load_yaml(&path.with_extension("missing")).is_err());
    }
}
