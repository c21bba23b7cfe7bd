use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read scenario file: {path}")]
    ScenarioRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid scenario: {0}")]
    Scenario(String),

    #[error("Unknown entity kind {0} (known: DHNetwork, SimpleFlexHeatController, HEXConsumer)")]
    UnknownKind(String),

    #[error("Warm-up did not settle within {calls} calls")]
    WarmupStalled { calls: usize },

    #[error(transparent)]
    Adapter(#[from] cs_adapter::AdapterError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;
