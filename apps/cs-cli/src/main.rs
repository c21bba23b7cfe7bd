use clap::{Parser, Subcommand};
use cs_adapter::Simulator;
use cs_models::{DhNetwork, FlexController, HexConsumer};
use std::path::{Path, PathBuf};

mod error;
mod scenario;
mod warmup;

use error::{CliError, CliResult};
use scenario::Scenario;

#[derive(Parser)]
#[command(name = "cs-cli")]
#[command(about = "Co-simulation adapters for district heating simulators", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the attribute catalog of an entity kind as JSON
    Describe {
        /// Entity kind (DHNetwork, SimpleFlexHeatController, HEXConsumer)
        kind: String,
    },
    /// Drive one adapter through warm-up with constant inputs
    Warmup {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
        /// Print compact JSON
        #[arg(long)]
        compact: bool,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Describe { kind } => cmd_describe(&kind),
        Commands::Warmup {
            scenario_path,
            compact,
        } => cmd_warmup(&scenario_path, compact),
    }
}

fn cmd_describe(kind: &str) -> CliResult<()> {
    let meta = match kind {
        k if k == DhNetwork::KIND => warmup::describe::<DhNetwork>()?,
        k if k == FlexController::KIND => warmup::describe::<FlexController>()?,
        k if k == HexConsumer::KIND => warmup::describe::<HexConsumer>()?,
        other => return Err(CliError::UnknownKind(other.to_string())),
    };
    println!("{}", serde_json::to_string_pretty(&meta)?);
    Ok(())
}

fn cmd_warmup(scenario_path: &Path, compact: bool) -> CliResult<()> {
    let scenario = Scenario::load(scenario_path)?;
    let report = match scenario.kind.as_str() {
        k if k == DhNetwork::KIND => warmup::run::<DhNetwork>(&scenario)?,
        k if k == FlexController::KIND => warmup::run::<FlexController>(&scenario)?,
        k if k == HexConsumer::KIND => warmup::run::<HexConsumer>(&scenario)?,
        other => return Err(CliError::UnknownKind(other.to_string())),
    };

    eprintln!(
        "{} settled after {} warm-up calls ({} entities)",
        report.kind,
        report.warmup_calls,
        report.entities.len()
    );
    let json = if compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{json}");
    Ok(())
}
