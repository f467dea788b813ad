use routegate_contract::{ContentHash, ContractError};

/// Errors from artifact construction. Bad proposals are never an error here.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("usage error: {0}")]
    Usage(ContractError),
    #[error("path safety violation: {0}")]
    PathSafety(ContractError),
    #[error("artifact encoding failed: {0}")]
    Encoding(ContractError),
}

/// A persisted artifact failed verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("artifact rejected: {}", .codes.join(", "))]
pub struct ArtifactViolation {
    pub codes: Vec<String>,
}

impl ArtifactViolation {
    pub fn new(codes: Vec<String>) -> Self {
        Self { codes }
    }

    pub fn single(code: impl Into<String>) -> Self {
        Self {
            codes: vec![code.into()],
        }
    }
}

/// Errors from artifact storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error("artifact sidecar missing: {0}")]
    SidecarMissing(String),
    #[error("artifact tampered: sidecar {expected}, computed {computed}")]
    Tampered {
        expected: String,
        computed: ContentHash,
    },
    #[error(transparent)]
    Invalid(#[from] ArtifactViolation),
}

impl StoreError {
    /// Whether the stored artifact itself is untrustworthy, as opposed to an
    /// I/O or conflict failure.
    pub fn is_boundary_violation(&self) -> bool {
        matches!(
            self,
            Self::SidecarMissing(_) | Self::Tampered { .. } | Self::Invalid(_)
        )
    }
}
