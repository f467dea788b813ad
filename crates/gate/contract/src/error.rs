/// Errors raised while checking contract-level identifiers and encodings.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("invalid run_id {value:?}: {reason}")]
    InvalidRunId { value: String, reason: &'static str },
    #[error("path must be repo-relative: {reason}")]
    PathSafety { reason: String },
    #[error("refusing to overwrite {path}: existing content differs")]
    Conflict { path: String },
    #[error("canonical encoding failed: {0}")]
    Encoding(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Whether this error is a path-safety violation.
    pub fn is_path_safety(&self) -> bool {
        matches!(self, Self::PathSafety { .. })
    }
}
