use crate::error::ObserveError;
use crate::leak;
use crate::trace::{Stage, StageStatus};
use routegate_contract::vocab::{MANIFEST_SCHEMA_VERSION, RULESET_ID};
use routegate_contract::{
    to_canonical_pretty, write_once, ContentHash, ContractError, Decision, ReasonCode,
    RepoRelativePath, RunId, WriteOutcome,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// What a manifest entry points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    ProposalSet,
    DecisionArtifact,
    ArtifactSidecar,
    Trace,
    Output,
}

/// A file produced by the run. `path` is relative to the artifact root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestArtifact {
    pub kind: ArtifactKind,
    pub path: String,
    pub sha256: ContentHash,
    /// Only the engine's captured output is authoritative; everything else
    /// is derived.
    pub authoritative: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputRecord {
    /// Repo-relative path of the raw input.
    #[serde(rename = "ref")]
    pub input_ref: RepoRelativePath,
    pub sha256: ContentHash,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionRecord {
    pub invoked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputRecord {
    pub path: String,
    pub sha256: ContentHash,
}

/// Properties every manifest asserts about itself. The builder refuses to
/// produce a manifest for which they would be false.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeterminismFlags {
    pub canonical_json: bool,
    pub repo_relative_paths: bool,
    pub wall_clock_free: bool,
}

impl DeterminismFlags {
    const ASSERTED: Self = Self {
        canonical_json: true,
        repo_relative_paths: true,
        wall_clock_free: true,
    };
}

/// `manifest.json`: the closing record of a run. Its presence marks the run
/// complete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunManifest {
    pub schema_version: String,
    pub ruleset_id: String,
    pub run_id: RunId,
    pub decision: Decision,
    pub reason_code: ReasonCode,
    /// The decision artifact's content hash.
    pub content_hash: ContentHash,
    pub input: InputRecord,
    /// Sorted by kind, then path.
    pub artifacts: Vec<ManifestArtifact>,
    /// In execution order.
    pub stages: Vec<StageRecord>,
    pub execution: ExecutionRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authoritative_output: Option<OutputRecord>,
    pub determinism: DeterminismFlags,
}

impl RunManifest {
    /// Two-space pretty JSON with sorted keys and a trailing newline.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, ContractError> {
        to_canonical_pretty(self)
    }

    /// Write create-exclusively. A byte-identical manifest already in place
    /// is reported as reproduced.
    pub fn write(&self, path: &Path) -> Result<WriteOutcome, ObserveError> {
        let outcome = write_once(path, &self.to_canonical_bytes()?)?;
        info!(run_id = %self.run_id, outcome = ?outcome, "manifest written");
        Ok(outcome)
    }

    pub fn artifact(&self, kind: ArtifactKind) -> Option<&ManifestArtifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }
}

/// Accumulates what a run produced and seals it into a [`RunManifest`].
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    run_id: RunId,
    decision: Decision,
    reason_code: ReasonCode,
    content_hash: ContentHash,
    input: Option<InputRecord>,
    artifacts: Vec<ManifestArtifact>,
    stages: Vec<StageRecord>,
    execution: ExecutionRecord,
    output: Option<OutputRecord>,
}

impl ManifestBuilder {
    pub fn new(
        run_id: RunId,
        decision: Decision,
        reason_code: ReasonCode,
        content_hash: ContentHash,
    ) -> Self {
        Self {
            run_id,
            decision,
            reason_code,
            content_hash,
            input: None,
            artifacts: Vec::new(),
            stages: Vec::new(),
            execution: ExecutionRecord::default(),
            output: None,
        }
    }

    pub fn with_input(mut self, input_ref: RepoRelativePath, sha256: ContentHash) -> Self {
        self.input = Some(InputRecord { input_ref, sha256 });
        self
    }

    pub fn with_artifact(
        mut self,
        kind: ArtifactKind,
        path: impl Into<String>,
        sha256: ContentHash,
    ) -> Self {
        self.artifacts.push(ManifestArtifact {
            kind,
            path: path.into(),
            sha256,
            authoritative: false,
        });
        self
    }

    pub fn with_stage(mut self, stage: Stage, status: StageStatus) -> Self {
        self.stages.push(StageRecord { stage, status });
        self
    }

    pub fn with_execution(mut self, invoked: bool, exit_code: Option<i32>) -> Self {
        self.execution = ExecutionRecord { invoked, exit_code };
        self
    }

    /// Record the engine's captured output. It is listed among the artifacts
    /// as the single authoritative entry.
    pub fn with_output(mut self, path: impl Into<String>, sha256: ContentHash) -> Self {
        let path = path.into();
        self.artifacts.push(ManifestArtifact {
            kind: ArtifactKind::Output,
            path: path.clone(),
            sha256,
            authoritative: true,
        });
        self.output = Some(OutputRecord { path, sha256 });
        self
    }

    /// Seal the manifest, refusing anything that would leak a location or a
    /// time into it.
    pub fn build(self) -> Result<RunManifest, ObserveError> {
        let input = self.input.ok_or(ObserveError::Incomplete("input"))?;
        for artifact in &self.artifacts {
            RepoRelativePath::parse(&artifact.path)?;
        }

        let mut artifacts = self.artifacts;
        artifacts.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.path.cmp(&b.path)));

        let manifest = RunManifest {
            schema_version: MANIFEST_SCHEMA_VERSION.to_string(),
            ruleset_id: RULESET_ID.to_string(),
            run_id: self.run_id,
            decision: self.decision,
            reason_code: self.reason_code,
            content_hash: self.content_hash,
            input,
            artifacts,
            stages: self.stages,
            execution: self.execution,
            authoritative_output: self.output,
            determinism: DeterminismFlags::ASSERTED,
        };
        let value = serde_json::to_value(&manifest)
            .map_err(|e| ContractError::Encoding(e.to_string()))?;
        leak::ensure_clean(&value)?;
        Ok(manifest)
    }
}
