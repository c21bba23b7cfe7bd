//! Drive one adapter through warm-up and a few regular steps.

use cs_adapter::{
    Adapter, EntityInputs, Inputs, Meta, NextStep, Outputs, Producers, Requests, Simulator,
};
use cs_core::SimTime;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{CliError, CliResult};
use crate::scenario::Scenario;

const PRODUCER: &str = "scenario";

#[derive(Debug, Serialize)]
pub struct Report {
    pub kind: &'static str,
    pub entities: Vec<String>,
    /// Step calls at time zero, including the one that advanced.
    pub warmup_calls: usize,
    pub steps: Vec<StepRecord>,
}

#[derive(Debug, Serialize)]
pub struct StepRecord {
    pub time: SimTime,
    pub next: NextStep,
    pub outputs: Outputs,
}

pub fn describe<S: Simulator>() -> CliResult<Meta> {
    Ok(Adapter::<S>::with_defaults()?.describe())
}

pub fn run<S>(scenario: &Scenario) -> CliResult<Report>
where
    S: Simulator,
    S::Params: DeserializeOwned,
{
    let mut adapter = match &scenario.adapter {
        Some(config) => Adapter::<S>::new(config.clone())?,
        None => Adapter::<S>::with_defaults()?,
    };
    let step_size = scenario.step_size.unwrap_or(adapter.step_size());
    adapter.init(step_size, None)?;

    let params: S::Params = scenario.params()?;
    let created = adapter.create(scenario.count, S::KIND, params)?;
    let entities: Vec<String> = created.into_iter().map(|d| d.eid).collect();

    let inputs = constant_inputs(scenario, &entities);
    let outputs = adapter.catalog().output_names();
    let requests: Requests = entities
        .iter()
        .map(|eid| (eid.clone(), outputs.clone()))
        .collect();

    let mut steps = Vec::with_capacity(scenario.steps + 1);
    let mut warmup_calls = 0;
    let mut next = loop {
        if warmup_calls == scenario.max_warmup_calls {
            return Err(CliError::WarmupStalled {
                calls: warmup_calls,
            });
        }
        warmup_calls += 1;
        let next = adapter.step(0, &inputs, None)?;
        if let NextStep::At(_) = next {
            break next;
        }
    };
    tracing::info!(kind = S::KIND, warmup_calls, "warm-up finished");
    steps.push(StepRecord {
        time: 0,
        next,
        outputs: adapter.get_data(&requests)?,
    });

    for _ in 0..scenario.steps {
        let Some(time) = next.time() else {
            break;
        };
        next = adapter.step(time, &inputs, None)?;
        steps.push(StepRecord {
            time,
            next,
            outputs: adapter.get_data(&requests)?,
        });
    }

    Ok(Report {
        kind: S::KIND,
        entities,
        warmup_calls,
        steps,
    })
}

fn constant_inputs(scenario: &Scenario, entities: &[String]) -> Inputs {
    let batch: EntityInputs = scenario
        .inputs
        .iter()
        .map(|(attr, value)| {
            let producers = Producers::from([(PRODUCER.to_string(), Some(value.clone()))]);
            (attr.clone(), producers)
        })
        .collect();
    entities
        .iter()
        .map(|eid| (eid.clone(), batch.clone()))
        .collect()
}
