use routegate_contract::RunId;
use std::path::{Path, PathBuf};

pub const TRACE_FILE: &str = "trace.jsonl";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const TIMING_FILE: &str = "timing.json";

/// Where a run's observability documents live: `observe/<run_id>/` under the
/// artifact root.
#[derive(Debug, Clone)]
pub struct ObserveLayout {
    root: PathBuf,
}

impl ObserveLayout {
    pub fn new(artifact_root: impl Into<PathBuf>) -> Self {
        Self {
            root: artifact_root.into(),
        }
    }

    pub fn dir(&self, run_id: &RunId) -> PathBuf {
        self.root.join("observe").join(run_id.as_str())
    }

    pub fn trace_path(&self, run_id: &RunId) -> PathBuf {
        self.dir(run_id).join(TRACE_FILE)
    }

    pub fn manifest_path(&self, run_id: &RunId) -> PathBuf {
        self.dir(run_id).join(MANIFEST_FILE)
    }

    pub fn timing_path(&self, run_id: &RunId) -> PathBuf {
        self.dir(run_id).join(TIMING_FILE)
    }

    /// `/`-separated path of `file` relative to the artifact root.
    pub fn relative(run_id: &RunId, file: &str) -> String {
        format!("observe/{}/{}", run_id, file)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
