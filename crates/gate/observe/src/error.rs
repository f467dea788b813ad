use routegate_contract::ContractError;

/// Errors from writing or reading observability documents.
#[derive(Debug, thiserror::Error)]
pub enum ObserveError {
    #[error("trace already exists: {0}")]
    TraceExists(String),
    #[error("observability leak: {}", .findings.join(", "))]
    Leak { findings: Vec<String> },
    #[error("manifest incomplete: missing {0}")]
    Incomplete(&'static str),
    #[error("trace record {index} is malformed: {message}")]
    MalformedRecord { index: usize, message: String },
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the determinism harness.
#[derive(Debug, thiserror::Error)]
pub enum DeterminismError {
    #[error("determinism check needs at least 2 runs, got {requested}")]
    TooFewRuns { requested: usize },
    #[error("run {run_index} failed: {message}")]
    Produce { run_index: usize, message: String },
    #[error("run {run_index} diverged from run 0 in {item} at byte {offset}")]
    Diverged {
        run_index: usize,
        item: String,
        offset: usize,
    },
    #[error("run {run_index} did not produce {item}")]
    MissingItem { run_index: usize, item: String },
    #[error("run {run_index} produced {item}, which run 0 did not")]
    UnexpectedItem { run_index: usize, item: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeterminismError {
    /// Index of the first run that disagreed with run 0, if any.
    pub fn run_index(&self) -> Option<usize> {
        match self {
            Self::Produce { run_index, .. }
            | Self::Diverged { run_index, .. }
            | Self::MissingItem { run_index, .. }
            | Self::UnexpectedItem { run_index, .. } => Some(*run_index),
            Self::TooFewRuns { .. } | Self::Io(_) => None,
        }
    }
}
