//! Convergence gate for the repeated-time-zero warm-up phase.
//!
//! Several simulators iterate at time zero before their outputs are
//! physically meaningful. The orchestrator re-invokes the adapter at time
//! zero while the gate is still collecting; each watched attribute records
//! one sample per call and settles once two consecutive samples agree
//! within `epsilon`, or unconditionally once the history exceeds `cap`.
//!
//! Settlement is absorbing: an attribute never returns to collecting.

use std::collections::BTreeMap;

use cs_core::{EntityId, Real, within};
use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, AdapterResult};
use crate::value::AttrValue;

/// Gate settings of one adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Input attributes observed during warm-up.
    #[serde(default)]
    pub watched: Vec<String>,
    /// Absolute delta between consecutive samples that counts as settled.
    #[serde(default = "default_epsilon")]
    pub epsilon: Real,
    /// History length beyond which settlement is forced.
    #[serde(default = "default_cap")]
    pub cap: usize,
    /// History length that must be exceeded before the delta test applies.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

fn default_epsilon() -> Real {
    0.01
}

fn default_cap() -> usize {
    1950
}

fn default_min_samples() -> usize {
    5
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            watched: Vec::new(),
            epsilon: default_epsilon(),
            cap: default_cap(),
            min_samples: default_min_samples(),
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> AdapterResult<()> {
        cs_core::ensure_finite(self.epsilon, "gate epsilon")?;
        if self.epsilon <= 0.0 {
            return Err(AdapterError::InvalidConfig {
                what: "gate epsilon must be positive".to_string(),
            });
        }
        if self.min_samples == 0 {
            return Err(AdapterError::InvalidConfig {
                what: "gate min_samples must be at least 1".to_string(),
            });
        }
        if self.cap < self.min_samples {
            return Err(AdapterError::InvalidConfig {
                what: format!(
                    "gate cap ({}) must not be below min_samples ({})",
                    self.cap, self.min_samples
                ),
            });
        }
        Ok(())
    }
}

/// How an attribute settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Consecutive samples agreed within epsilon.
    Converged { samples: usize },
    /// History exceeded the cap without converging.
    Forced { samples: usize },
}

/// Gate phase of one watched attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Collecting,
    Settled(Settlement),
}

/// Warm-up history of one watched attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchedAttribute {
    history: Vec<Real>,
    phase: Phase,
}

impl Default for WatchedAttribute {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchedAttribute {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            phase: Phase::Collecting,
        }
    }

    pub fn history(&self) -> &[Real] {
        &self.history
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.phase, Phase::Settled(_))
    }

    /// Append one sample.
    pub fn record(&mut self, sample: Real) {
        self.history.push(sample);
    }

    /// Apply the settlement rules. Returns the settlement on the call that
    /// performs the transition, `None` otherwise.
    pub fn evaluate(&mut self, config: &GateConfig) -> Option<Settlement> {
        if self.is_settled() {
            return None;
        }

        let n = self.history.len();
        if n >= 2
            && n > config.min_samples
            && within(self.history[n - 1], self.history[n - 2], config.epsilon)
        {
            let s = Settlement::Converged { samples: n };
            self.phase = Phase::Settled(s);
            return Some(s);
        }

        if n > config.cap {
            let s = Settlement::Forced { samples: n };
            self.phase = Phase::Settled(s);
            return Some(s);
        }

        None
    }
}

/// Sample recorded for a routed value. Absent values count as zero.
pub fn sample_of(value: Option<&AttrValue>) -> Real {
    value.and_then(AttrValue::as_real).unwrap_or(0.0)
}

/// Gate state of one entity: one [`WatchedAttribute`] per configured name.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityGate {
    attrs: Vec<(String, WatchedAttribute)>,
}

impl EntityGate {
    pub fn new(config: &GateConfig) -> Self {
        Self {
            attrs: config
                .watched
                .iter()
                .map(|name| (name.clone(), WatchedAttribute::new()))
                .collect(),
        }
    }

    pub fn watched(&self, name: &str) -> Option<&WatchedAttribute> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, w)| w)
    }

    /// Record a routed value if `name` is watched.
    pub fn observe(&mut self, name: &str, value: Option<&AttrValue>) {
        if let Some((_, w)) = self.attrs.iter_mut().find(|(n, _)| n == name) {
            w.record(sample_of(value));
        }
    }

    /// Evaluate every watched attribute that has samples.
    pub fn evaluate(&mut self, config: &GateConfig, entity: &EntityId) {
        for (name, w) in &mut self.attrs {
            if w.history.is_empty() {
                continue;
            }
            match w.evaluate(config) {
                Some(Settlement::Converged { samples }) => tracing::info!(
                    entity = %entity,
                    attr = %name,
                    samples,
                    epsilon = config.epsilon,
                    "warm-up converged: delta to previous sample below epsilon"
                ),
                Some(Settlement::Forced { samples }) => tracing::warn!(
                    entity = %entity,
                    attr = %name,
                    samples,
                    cap = config.cap,
                    "no convergence within the warm-up cap, forcing settlement"
                ),
                None => {}
            }
        }
    }

    pub fn is_settled(&self) -> bool {
        self.attrs.iter().all(|(_, w)| w.is_settled())
    }

    /// Watched attribute name -> settled.
    pub fn status(&self) -> BTreeMap<String, bool> {
        self.attrs
            .iter()
            .map(|(n, w)| (n.clone(), w.is_settled()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(epsilon: Real, cap: usize) -> GateConfig {
        GateConfig {
            watched: vec!["T_tank_forward".to_string()],
            epsilon,
            cap,
            min_samples: 5,
        }
    }

    #[test]
    fn converges_only_after_min_samples() {
        let cfg = config(0.01, 1950);
        let mut w = WatchedAttribute::new();
        for i in 1..=5 {
            w.record(70.0);
            assert_eq!(w.evaluate(&cfg), None, "sample {i} must not settle");
        }
        w.record(70.0);
        assert_eq!(w.evaluate(&cfg), Some(Settlement::Converged { samples: 6 }));
        assert!(w.is_settled());
    }

    #[test]
    fn delta_equal_to_epsilon_does_not_converge() {
        let cfg = config(0.5, 1950);
        let mut w = WatchedAttribute::new();
        for i in 0..8 {
            w.record(i as Real * 0.5);
            assert_eq!(w.evaluate(&cfg), None);
        }
    }

    #[test]
    fn forced_exactly_past_cap() {
        let cfg = config(0.01, 20);
        let mut w = WatchedAttribute::new();
        for i in 0..20 {
            w.record(i as Real);
            assert_eq!(w.evaluate(&cfg), None);
        }
        w.record(20.0);
        assert_eq!(w.evaluate(&cfg), Some(Settlement::Forced { samples: 21 }));
    }

    #[test]
    fn settlement_is_reported_once() {
        let cfg = config(0.01, 1950);
        let mut w = WatchedAttribute::new();
        for _ in 0..6 {
            w.record(1.0);
        }
        assert!(w.evaluate(&cfg).is_some());
        w.record(5.0);
        assert_eq!(w.evaluate(&cfg), None);
        assert!(w.is_settled());
    }

    #[test]
    fn absent_values_sample_as_zero() {
        assert_eq!(sample_of(None), 0.0);
        assert_eq!(sample_of(Some(&AttrValue::Real(-2.5))), -2.5);
        assert_eq!(sample_of(Some(&AttrValue::Flag(true))), 0.0);
    }

    #[test]
    fn entity_gate_ignores_unwatched_and_untouched() {
        let cfg = GateConfig {
            watched: vec!["a".to_string(), "b".to_string()],
            ..GateConfig::default()
        };
        let mut gate = EntityGate::new(&cfg);
        let id = EntityId::compose("X", 0);
        for _ in 0..10 {
            gate.observe("a", Some(&AttrValue::Real(3.0)));
            gate.observe("c", Some(&AttrValue::Real(3.0)));
            gate.evaluate(&cfg, &id);
        }
        assert!(gate.watched("a").unwrap().is_settled());
        assert!(gate.watched("b").unwrap().history().is_empty());
        assert!(gate.watched("c").is_none());
        assert!(!gate.is_settled());
        let status = gate.status();
        assert_eq!(status.get("a"), Some(&true));
        assert_eq!(status.get("b"), Some(&false));
    }

    #[test]
    fn no_watched_attributes_means_settled() {
        let gate = EntityGate::new(&GateConfig::default());
        assert!(gate.is_settled());
        assert!(gate.status().is_empty());
    }

    #[test]
    fn config_validation() {
        assert!(GateConfig::default().validate().is_ok());
        assert!(config(0.0, 10).validate().is_err());
        assert!(config(Real::NAN, 10).validate().is_err());
        assert!(config(0.01, 3).validate().is_err());
    }

    proptest! {
        #[test]
        fn history_grows_and_settles_at_most_once(
            samples in proptest::collection::vec(-100.0f64..100.0, 1..80),
            cap in 5usize..60,
        ) {
            let cfg = config(0.01, cap);
            let mut w = WatchedAttribute::new();
            let mut transitions = 0;
            let mut was_settled = false;
            for (i, s) in samples.iter().enumerate() {
                w.record(*s);
                prop_assert_eq!(w.history().len(), i + 1);
                if w.evaluate(&cfg).is_some() {
                    transitions += 1;
                }
                if was_settled {
                    prop_assert!(w.is_settled());
                }
                was_settled = w.is_settled();
            }
            prop_assert!(transitions <= 1);
            if samples.len() > cap {
                prop_assert!(w.is_settled());
            }
        }
    }
}
