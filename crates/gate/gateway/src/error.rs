use crate::state::GateState;
use routegate_contract::{ContentHash, ContractError};

/// Errors from the execution collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("engine not found: {0}")]
    EngineMissing(String),
    #[error("engine integrity check failed: expected {expected}, computed {computed}")]
    IntegrityMismatch {
        expected: ContentHash,
        computed: ContentHash,
    },
    #[error("no execution engine configured")]
    Unconfigured,
    #[error("engine could not be started: {0}")]
    Spawn(String),
    #[error("engine failed with exit code {code:?}")]
    Failed {
        code: Option<i32>,
        stdout_sha256: Option<ContentHash>,
    },
    #[error("engine produced no output")]
    EmptyOutput,
}

impl ExecutionError {
    /// Whether the engine was never started.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::EngineMissing(_) | Self::IntegrityMismatch { .. } | Self::Unconfigured
        )
    }
}

/// Errors from the gateway. Every variant leaves the gate closed.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("boundary violation: {}", .codes.join(", "))]
    Boundary { codes: Vec<String> },
    #[error("path safety violation: {0}")]
    PathSafety(ContractError),
    #[error("run {0} was already executed")]
    AlreadyExecuted(String),
    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),
    #[error("invalid gate transition {from:?} -> {to:?}")]
    InvalidTransition { from: GateState, to: GateState },
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    pub fn boundary(code: impl Into<String>) -> Self {
        Self::Boundary {
            codes: vec![code.into()],
        }
    }
}
