use routegate_artifact::{BuildError, StoreError};
use routegate_contract::ContractError;
use routegate_gateway::GatewayError;
use routegate_observe::{DeterminismError, ObserveError};

/// Errors from configuring or running the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Observe(#[from] ObserveError),
    #[error(transparent)]
    Determinism(#[from] DeterminismError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for PipelineError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
