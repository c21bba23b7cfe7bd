//! Step scheduling: tick policy, next-time decision and output timestamps.

use cs_core::SimTime;
use serde::{Deserialize, Serialize};

/// How many internal solver ticks a step call performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickPolicy {
    /// Exactly one tick per call; the caller keeps a fixed cadence.
    #[default]
    PerCall,
    /// `time - previous_time` ticks, so a coarser caller cadence stays in sync.
    /// A repeated timestamp performs no tick.
    Elapsed,
}

impl TickPolicy {
    pub fn ticks(self, previous: SimTime, time: SimTime) -> u64 {
        match self {
            TickPolicy::PerCall => 1,
            TickPolicy::Elapsed => time.saturating_sub(previous),
        }
    }
}

/// Outcome of a step call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    /// Re-invoke at the next time.
    At(SimTime),
    /// Still warming up: re-invoke at the same time.
    Wait,
}

impl NextStep {
    /// `Some(t)` when advancing, `None` when waiting.
    pub fn time(self) -> Option<SimTime> {
        match self {
            NextStep::At(t) => Some(t),
            NextStep::Wait => None,
        }
    }

    pub fn is_wait(self) -> bool {
        matches!(self, NextStep::Wait)
    }
}

/// Time bookkeeping of one adapter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepClock {
    step_size: SimTime,
    last_observed: SimTime,
    all_settled: bool,
}

impl StepClock {
    pub fn new(step_size: SimTime) -> Self {
        Self {
            step_size,
            last_observed: 0,
            all_settled: false,
        }
    }

    pub fn step_size(&self) -> SimTime {
        self.step_size
    }

    pub fn set_step_size(&mut self, step_size: SimTime) {
        self.step_size = step_size;
    }

    pub fn last_observed(&self) -> SimTime {
        self.last_observed
    }

    pub fn all_settled(&self) -> bool {
        self.all_settled
    }

    /// Record the time of a step call; returns the previously observed time.
    pub fn observe(&mut self, time: SimTime) -> SimTime {
        std::mem::replace(&mut self.last_observed, time)
    }

    /// Recompute the settled flag while it is false. Once true it is cached
    /// and `check` is never called again.
    pub fn refresh_settled(&mut self, check: impl FnOnce() -> bool) -> bool {
        if !self.all_settled {
            self.all_settled = check();
        }
        self.all_settled
    }

    /// Next step for a call at `time`, saturating at `SimTime::MAX`.
    pub fn decide(&self, time: SimTime) -> NextStep {
        if !self.all_settled && time == 0 {
            NextStep::Wait
        } else {
            NextStep::At(time.saturating_add(self.step_size))
        }
    }

    /// Timestamp reported with collected outputs.
    ///
    /// Settled: the end of the completed step. Warming up at time zero: zero.
    /// Unsettled past time zero: no timestamp.
    pub fn output_time(&self) -> Option<SimTime> {
        if self.all_settled {
            Some(self.last_observed.saturating_add(self.step_size))
        } else if self.last_observed == 0 {
            Some(0)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_policies() {
        assert_eq!(TickPolicy::PerCall.ticks(0, 0), 1);
        assert_eq!(TickPolicy::PerCall.ticks(10, 20), 1);
        assert_eq!(TickPolicy::Elapsed.ticks(0, 0), 0);
        assert_eq!(TickPolicy::Elapsed.ticks(10, 20), 10);
        assert_eq!(TickPolicy::Elapsed.ticks(20, 10), 0);
    }

    #[test]
    fn waits_only_at_time_zero_while_unsettled() {
        let mut clock = StepClock::new(10);
        assert_eq!(clock.decide(0), NextStep::Wait);
        assert_eq!(clock.decide(30), NextStep::At(40));
        clock.refresh_settled(|| true);
        assert_eq!(clock.decide(0), NextStep::At(10));
    }

    #[test]
    fn settled_flag_is_cached() {
        let mut clock = StepClock::new(10);
        assert!(!clock.refresh_settled(|| false));
        assert!(clock.refresh_settled(|| true));
        assert!(clock.refresh_settled(|| panic!("must not be re-evaluated")));
    }

    #[test]
    fn output_time_follows_phase() {
        let mut clock = StepClock::new(10);
        assert_eq!(clock.output_time(), Some(0));
        assert_eq!(clock.observe(20), 0);
        assert_eq!(clock.output_time(), None);
        clock.refresh_settled(|| true);
        assert_eq!(clock.output_time(), Some(30));
    }

    #[test]
    fn times_saturate_at_the_end_of_the_clock() {
        let mut clock = StepClock::new(10);
        assert_eq!(clock.decide(SimTime::MAX - 1), NextStep::At(SimTime::MAX));
        clock.observe(SimTime::MAX - 3);
        clock.refresh_settled(|| true);
        assert_eq!(clock.output_time(), Some(SimTime::MAX));
    }

    #[test]
    fn next_step_accessors() {
        assert_eq!(NextStep::At(10).time(), Some(10));
        assert!(NextStep::Wait.is_wait());
        assert_eq!(NextStep::Wait.time(), None);
    }
}
