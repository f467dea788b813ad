use crate::error::StoreError;
use crate::model::DecisionArtifact;
use crate::validator::verify_artifact_bytes;
use routegate_contract::{write_once, ContentHash, ContractError, RunId, WriteOutcome};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const ARTIFACT_FILE: &str = "artifact.json";
pub const SIDECAR_FILE: &str = "artifact.json.sha256";
pub const PROPOSAL_SET_FILE: &str = "proposal_set.json";

/// A document written under the artifact root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedDocument {
    pub path: PathBuf,
    /// Path relative to the artifact root, `/`-separated.
    pub relative_path: String,
    pub sha256: ContentHash,
    pub outcome: WriteOutcome,
}

/// Run-id-namespaced storage for proposal sets and decision artifacts.
///
/// Layout under the root:
///
/// ```text
/// proposals/<run_id>/proposal_set.json
/// decisions/<run_id>/artifact.json
/// decisions/<run_id>/artifact.json.sha256
/// ```
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_path(&self, run_id: &RunId) -> PathBuf {
        self.root.join("decisions").join(run_id.as_str()).join(ARTIFACT_FILE)
    }

    pub fn proposal_set_path(&self, run_id: &RunId) -> PathBuf {
        self.root
            .join("proposals")
            .join(run_id.as_str())
            .join(PROPOSAL_SET_FILE)
    }

    /// Persist a proposal set's wire bytes for `run_id`.
    pub fn persist_proposal_set(
        &self,
        run_id: &RunId,
        bytes: &[u8],
    ) -> Result<PersistedDocument, StoreError> {
        let path = self.proposal_set_path(run_id);
        let outcome = write_once(&path, bytes)?;
        debug!(run_id = %run_id, outcome = ?outcome, "proposal set persisted");
        Ok(PersistedDocument {
            relative_path: format!("proposals/{}/{}", run_id, PROPOSAL_SET_FILE),
            path,
            sha256: ContentHash::hash(bytes),
            outcome,
        })
    }

    /// Persist an artifact and its hash sidecar, create-exclusively.
    ///
    /// Re-persisting a byte-identical artifact succeeds with
    /// [`WriteOutcome::Reproduced`]; anything else already at that run_id is a
    /// conflict.
    pub fn persist(&self, artifact: &DecisionArtifact) -> Result<PersistedDocument, StoreError> {
        let bytes = artifact.to_canonical_bytes()?;
        let sha256 = ContentHash::hash(&bytes);
        let path = self.artifact_path(&artifact.run_id);

        let outcome = write_once(&path, &bytes).map_err(|e| {
            if matches!(e, ContractError::Conflict { .. }) {
                warn!(run_id = %artifact.run_id, "artifact conflict: run_id already holds a different decision");
            }
            e
        })?;
        write_once(&path.with_file_name(SIDECAR_FILE), sidecar_line(&sha256).as_bytes())?;

        info!(
            run_id = %artifact.run_id,
            decision = %artifact.decision,
            sha256 = %sha256,
            outcome = ?outcome,
            "artifact persisted"
        );
        Ok(PersistedDocument {
            relative_path: format!("decisions/{}/{}", artifact.run_id, ARTIFACT_FILE),
            path,
            sha256,
            outcome,
        })
    }

    /// Read an artifact back and verify it against its sidecar, the closed
    /// schema, its content hash and its embedded proposals.
    pub fn load_verified(path: &Path) -> Result<(DecisionArtifact, ContentHash), StoreError> {
        let bytes = fs::read(path).map_err(ContractError::from)?;
        let computed = ContentHash::hash(&bytes);

        let sidecar_path = path.with_file_name(SIDECAR_FILE);
        let sidecar = match fs::read_to_string(&sidecar_path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::SidecarMissing(sidecar_path.display().to_string()))
            }
            Err(e) => return Err(ContractError::from(e).into()),
        };
        let expected = sidecar.split_whitespace().next().unwrap_or_default();
        if expected != computed.to_hex() {
            return Err(StoreError::Tampered {
                expected: expected.chars().take(64).collect(),
                computed,
            });
        }

        let artifact = verify_artifact_bytes(&bytes)?;
        Ok((artifact, computed))
    }
}

/// `sha256sum`-compatible sidecar line.
fn sidecar_line(sha256: &ContentHash) -> String {
    format!("{}  {}\n", sha256.to_hex(), ARTIFACT_FILE)
}
