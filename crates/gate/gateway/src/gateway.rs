use crate::collaborator::{ExecutionCollaborator, UnconfiguredCollaborator};
use crate::error::{ExecutionError, GatewayError};
use crate::state::GateState;
use routegate_artifact::{ArtifactStore, DecisionArtifact, StoreError};
use routegate_contract::{
    write_once, ContentHash, ContractError, Decision, ReasonCode, RepoRelativePath, RunId,
};
use routegate_proposal::RawInput;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const STDOUT_FILE: &str = "stdout.raw";
const CLAIM_FILE: &str = "execution.claim";

/// The engine's captured output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedOutput {
    pub path: PathBuf,
    /// Path relative to the artifact root, `/`-separated.
    pub relative_path: String,
    pub sha256: ContentHash,
    pub byte_len: usize,
    pub exit_code: Option<i32>,
}

/// Result of one enforcement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub run_id: RunId,
    pub decision: Decision,
    pub reason_code: ReasonCode,
    pub state: GateState,
    /// Hash of the artifact file bytes that were verified.
    pub artifact_sha256: ContentHash,
    pub content_hash: ContentHash,
    pub output: Option<CapturedOutput>,
}

impl ExecutionOutcome {
    pub fn invoked(&self) -> bool {
        self.output.is_some()
    }
}

/// The enforcement point between decision artifacts and the engine.
///
/// Enforcement runs in fixed phases:
/// 1. Verify the artifact read from disk (sidecar, schema, hash, re-derived decision)
/// 2. Check it sits at its own run's location
/// 3. Close the gate on REJECT
/// 4. Bind the raw input to the artifact (location and content)
/// 5. Check engine integrity
/// 6. Claim the run and invoke the engine once
/// 7. Capture stdout verbatim
pub struct Gateway {
    repo_root: PathBuf,
    store: ArtifactStore,
    collaborator: Box<dyn ExecutionCollaborator>,
}

impl Gateway {
    /// A gateway with no engine configured. It verifies and closes on REJECT,
    /// and fails every ACCEPT until a collaborator is supplied.
    pub fn new(repo_root: impl Into<PathBuf>, artifact_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            store: ArtifactStore::new(artifact_root),
            collaborator: Box::new(UnconfiguredCollaborator),
        }
    }

    pub fn with_collaborator(mut self, collaborator: impl ExecutionCollaborator + 'static) -> Self {
        self.collaborator = Box::new(collaborator);
        self
    }

    pub fn stdout_path(&self, run_id: &RunId) -> PathBuf {
        self.run_dir(run_id).join(STDOUT_FILE)
    }

    fn run_dir(&self, run_id: &RunId) -> PathBuf {
        self.store.root().join("runs").join(run_id.as_str())
    }

    /// Enforce the persisted artifact at `artifact_path` against the raw
    /// input at `raw_input_path`.
    pub fn enforce(
        &self,
        artifact_path: &Path,
        raw_input_path: &Path,
    ) -> Result<ExecutionOutcome, GatewayError> {
        let state = GateState::AwaitingArtifact;

        // Phase 1: verify the artifact from disk.
        let (artifact, artifact_sha256) = self.load(artifact_path)?;

        // Phase 2: the artifact must live at its own run's location.
        self.check_location(&artifact, artifact_path)?;

        let mut outcome = ExecutionOutcome {
            run_id: artifact.run_id.clone(),
            decision: artifact.decision,
            reason_code: artifact.reason_code,
            state,
            artifact_sha256,
            content_hash: artifact.content_hash,
            output: None,
        };

        // Phase 3: REJECT closes the gate without touching anything else.
        if artifact.decision != Decision::Accept {
            outcome.state = state.advance(GateState::GateClosed)?;
            warn!(
                run_id = %artifact.run_id,
                reason = %artifact.reason_code,
                "gate closed: execution refused"
            );
            return Ok(outcome);
        }
        let state = state.advance(GateState::GateOpen)?;
        info!(run_id = %artifact.run_id, "gate open");

        // Phase 4: bind the raw input. From here on the engine only ever
        // sees the location `input_ref` names under the repository root.
        let bound_input = self.check_input(&artifact, raw_input_path)?;

        // Phase 5: engine integrity.
        self.collaborator.verify_integrity().map_err(|e| {
            warn!(run_id = %artifact.run_id, error = %e, "engine integrity precondition failed");
            GatewayError::from(e)
        })?;

        // Phase 6: claim and invoke exactly once.
        self.claim(&artifact)?;
        let state = state.advance(GateState::Executing)?;
        let raw = self.collaborator.invoke(&bound_input)?;

        // Phase 7: capture.
        let captured = self.capture(&artifact.run_id, &raw.stdout, raw.exit_code)?;
        if !raw.succeeded() {
            warn!(run_id = %artifact.run_id, exit_code = ?raw.exit_code, "engine failed");
            return Err(ExecutionError::Failed {
                code: raw.exit_code,
                stdout_sha256: captured.map(|c| c.sha256),
            }
            .into());
        }
        let Some(captured) = captured else {
            warn!(run_id = %artifact.run_id, "engine produced no output");
            return Err(ExecutionError::EmptyOutput.into());
        };

        outcome.state = state.advance(GateState::Done)?;
        info!(
            run_id = %artifact.run_id,
            output_sha256 = %captured.sha256,
            bytes = captured.byte_len,
            "execution complete"
        );
        outcome.output = Some(captured);
        Ok(outcome)
    }

    fn load(&self, artifact_path: &Path) -> Result<(DecisionArtifact, ContentHash), GatewayError> {
        if !artifact_path.is_file() {
            return Err(GatewayError::boundary("ARTIFACT_MISSING"));
        }
        ArtifactStore::load_verified(artifact_path).map_err(|e| {
            let err = match e {
                StoreError::SidecarMissing(_) => GatewayError::boundary("ARTIFACT_SIDECAR_MISSING"),
                StoreError::Tampered { .. } => GatewayError::boundary("ARTIFACT_SIDECAR_MISMATCH"),
                StoreError::Invalid(v) => GatewayError::Boundary { codes: v.codes },
                StoreError::Contract(c) => GatewayError::Contract(c),
            };
            warn!(error = %err, "artifact refused");
            err
        })
    }

    fn check_location(
        &self,
        artifact: &DecisionArtifact,
        artifact_path: &Path,
    ) -> Result<(), GatewayError> {
        let expected = self.store.artifact_path(&artifact.run_id);
        let same = match (expected.canonicalize(), artifact_path.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };
        if same {
            Ok(())
        } else {
            warn!(run_id = %artifact.run_id, "artifact is not at its run's location");
            Err(GatewayError::boundary("ARTIFACT_LOCATION_MISMATCH"))
        }
    }

    /// Check that `raw_input_path` is the file `input_ref` names and still
    /// holds the gated text. Returns the absolute, canonical location of
    /// `input_ref` under the repository root.
    fn check_input(
        &self,
        artifact: &DecisionArtifact,
        raw_input_path: &Path,
    ) -> Result<PathBuf, GatewayError> {
        let input_ref = RepoRelativePath::from_path_within(&self.repo_root, raw_input_path)
            .map_err(|e| match e {
                ContractError::Io(err) if err.kind() == io::ErrorKind::NotFound => {
                    GatewayError::boundary("INPUT_MISSING")
                }
                other => GatewayError::PathSafety(other),
            })?;
        if input_ref != artifact.input_ref {
            warn!(
                run_id = %artifact.run_id,
                expected = %artifact.input_ref,
                actual = %input_ref,
                "input does not match artifact"
            );
            return Err(GatewayError::boundary("INPUT_REF_MISMATCH"));
        }

        let bound = artifact.input_ref.resolve(&self.repo_root.canonicalize()?);
        let raw = RawInput::from_file_bytes(&fs::read(&bound)?);
        let gated = artifact.proposal_set.as_ref().map(|s| s.input.raw.as_str());
        if raw.decode_error().is_some() || gated != Some(raw.as_str()) {
            warn!(run_id = %artifact.run_id, "input changed since it was gated");
            return Err(GatewayError::boundary("INPUT_DRIFT"));
        }
        Ok(bound)
    }

    fn claim(&self, artifact: &DecisionArtifact) -> Result<(), GatewayError> {
        let dir = self.run_dir(&artifact.run_id);
        fs::create_dir_all(&dir)?;
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(CLAIM_FILE))
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!(run_id = %artifact.run_id, "run already claimed");
                return Err(GatewayError::AlreadyExecuted(artifact.run_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        writeln!(file, "{}", artifact.content_hash.to_hex())?;
        file.sync_all()?;
        Ok(())
    }

    fn capture(
        &self,
        run_id: &RunId,
        stdout: &[u8],
        exit_code: Option<i32>,
    ) -> Result<Option<CapturedOutput>, GatewayError> {
        if stdout.is_empty() {
            return Ok(None);
        }
        let path = self.stdout_path(run_id);
        write_once(&path, stdout)?;
        Ok(Some(CapturedOutput {
            relative_path: format!("runs/{}/{}", run_id, STDOUT_FILE),
            path,
            sha256: ContentHash::hash(stdout),
            byte_len: stdout.len(),
            exit_code,
        }))
    }
}
