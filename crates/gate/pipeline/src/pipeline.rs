use crate::config::GateConfig;
use crate::error::PipelineError;
use routegate_artifact::store::SIDECAR_FILE;
use routegate_artifact::{ArtifactBuilder, ArtifactStore, PersistedDocument};
use routegate_contract::{ContentHash, Decision, ReasonCode, RepoRelativePath, RunId};
use routegate_gateway::{
    CapturedOutput, ExecutionCollaborator, ExecutionError, GateState, Gateway, GatewayError,
    STDOUT_FILE,
};
use routegate_observe::{
    ArtifactKind, DeterminismHarness, DeterminismReport, ManifestBuilder, ObserveLayout, Snapshot,
    Stage, StageRecord, StageStatus, Stopwatch, TraceWriter, TRACE_FILE,
};
use routegate_proposal::{generate, RawInput};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Summary of one completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: RunId,
    pub decision: Decision,
    pub reason_code: ReasonCode,
    pub content_hash: ContentHash,
    pub state: GateState,
    pub artifact_path: PathBuf,
    pub manifest_path: PathBuf,
    pub output: Option<CapturedOutput>,
}

impl RunReport {
    pub fn invoked(&self) -> bool {
        self.output.is_some()
    }
}

/// The full chain for one input: propose, persist, build, persist, enforce,
/// then trace and manifest.
#[derive(Debug, Clone)]
pub struct Pipeline<C> {
    repo_root: PathBuf,
    artifact_root: PathBuf,
    collaborator: C,
}

impl<C> Pipeline<C>
where
    C: ExecutionCollaborator + Clone + 'static,
{
    pub fn new(
        repo_root: impl Into<PathBuf>,
        artifact_root: impl Into<PathBuf>,
        collaborator: C,
    ) -> Self {
        Self {
            repo_root: repo_root.into(),
            artifact_root: artifact_root.into(),
            collaborator,
        }
    }

    pub fn from_config(config: &GateConfig, collaborator: C) -> Result<Self, PipelineError> {
        Ok(Self::new(
            config.repo_root()?,
            config.artifact_root()?,
            collaborator,
        ))
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn artifact_root(&self) -> &Path {
        &self.artifact_root
    }

    /// A gateway over this pipeline's roots and engine.
    pub fn gateway(&self) -> Gateway {
        Gateway::new(&self.repo_root, &self.artifact_root).with_collaborator(self.collaborator.clone())
    }

    /// Run every stage for the input at `input_path`.
    ///
    /// Without a `run_id` one is derived from the input bytes. Path-safety and
    /// boundary violations abort the run before a manifest exists. An engine
    /// that ran and failed still gets its manifest before the error is
    /// returned.
    pub fn run(&self, input_path: &Path, run_id: Option<RunId>) -> Result<RunReport, PipelineError> {
        let input_ref = RepoRelativePath::from_path_within(&self.repo_root, input_path)?;
        let input_bytes = fs::read(input_path)?;
        let input_sha256 = ContentHash::hash(&input_bytes);
        let run_id = run_id.unwrap_or_else(|| RunId::derive_from_input(&input_bytes));
        info!(run_id = %run_id, input = %input_ref, "run started");

        let store = ArtifactStore::new(&self.artifact_root);
        let layout = ObserveLayout::new(&self.artifact_root);
        let mut recorder = Recorder::start(&layout, &run_id)?;

        // Stage 1: propose.
        let proposal_set = generate(&RawInput::from_file_bytes(&input_bytes));
        let set_bytes = proposal_set.to_canonical_bytes()?;
        let set_doc = store.persist_proposal_set(&run_id, &set_bytes)?;
        recorder.record(Stage::Propose, Some(input_sha256), Some(set_doc.sha256), StageStatus::Ok)?;

        // Stage 2: build and persist the decision.
        let artifact = ArtifactBuilder::new().build(&set_bytes, run_id.as_str(), input_ref.as_str())?;
        let artifact_doc = store.persist(&artifact)?;
        recorder.record(
            Stage::Build,
            Some(set_doc.sha256),
            Some(artifact_doc.sha256),
            StageStatus::Ok,
        )?;

        let manifest = ManifestBuilder::new(
            run_id.clone(),
            artifact.decision,
            artifact.reason_code,
            artifact.content_hash,
        )
        .with_input(input_ref, input_sha256);

        // Stage 3 and 4: gate and execute.
        let enforced = self.gateway().enforce(&artifact_doc.path, input_path);
        let (manifest, result) = match enforced {
            Ok(outcome) if outcome.state == GateState::GateClosed => {
                recorder.record(Stage::Gate, Some(artifact_doc.sha256), None, StageStatus::Reject)?;
                recorder.record(Stage::Execute, None, None, StageStatus::Skip)?;
                (manifest.with_execution(false, None), Ok(outcome))
            }
            Ok(outcome) => {
                let output = outcome.output.as_ref();
                recorder.record(Stage::Gate, Some(artifact_doc.sha256), None, StageStatus::Ok)?;
                recorder.record(
                    Stage::Execute,
                    Some(input_sha256),
                    output.map(|o| o.sha256),
                    StageStatus::Ok,
                )?;
                let mut manifest =
                    manifest.with_execution(true, output.and_then(|o| o.exit_code));
                if let Some(o) = output {
                    manifest = manifest.with_output(o.relative_path.clone(), o.sha256);
                }
                (manifest, Ok(outcome))
            }
            Err(err) => match engine_ran(&err) {
                Some((exit_code, stdout_sha256)) => {
                    recorder.record(Stage::Gate, Some(artifact_doc.sha256), None, StageStatus::Ok)?;
                    recorder.record(Stage::Execute, Some(input_sha256), stdout_sha256, StageStatus::Fail)?;
                    let mut manifest = manifest.with_execution(true, exit_code);
                    if let Some(sha) = stdout_sha256 {
                        manifest = manifest.with_output(format!("runs/{}/{}", run_id, STDOUT_FILE), sha);
                    }
                    (manifest, Err(err))
                }
                None => {
                    recorder.record(Stage::Gate, Some(artifact_doc.sha256), None, StageStatus::Fail)?;
                    recorder.abandon(&layout, &run_id)?;
                    warn!(run_id = %run_id, error = %err, "run aborted at the gate");
                    return Err(err.into());
                }
            },
        };

        let manifest_path = recorder.seal(manifest, &layout, &run_id, &set_doc, &artifact_doc)?;
        let outcome = result?;
        info!(
            run_id = %run_id,
            decision = %outcome.decision,
            reason = %outcome.reason_code,
            invoked = outcome.invoked(),
            "run complete"
        );
        Ok(RunReport {
            run_id,
            decision: outcome.decision,
            reason_code: outcome.reason_code,
            content_hash: outcome.content_hash,
            state: outcome.state,
            artifact_path: artifact_doc.path,
            manifest_path,
            output: outcome.output,
        })
    }

    /// Run the pipeline `runs` times, each into a fresh artifact root under
    /// the same run_id, and require every derived file to match run 0 byte
    /// for byte. The engine's raw output and the timing sidecar are not
    /// compared.
    pub fn verify_determinism(
        &self,
        input_path: &Path,
        runs: usize,
    ) -> Result<DeterminismReport, PipelineError> {
        let run_id = RunId::derive_from_input(&fs::read(input_path)?);
        let harness = DeterminismHarness::new().excluding(STDOUT_FILE);
        let report = harness.verify(runs, |_| -> Result<Snapshot, PipelineError> {
            let scratch = tempfile::tempdir()?;
            let pipeline = Pipeline::new(&self.repo_root, scratch.path(), self.collaborator.clone());
            pipeline.run(input_path, Some(run_id.clone()))?;
            Ok(Snapshot::capture_dir(scratch.path())?)
        })?;
        Ok(report)
    }
}

/// Map a gateway failure to `(exit_code, stdout_sha256)` when the engine
/// actually ran.
fn engine_ran(err: &GatewayError) -> Option<(Option<i32>, Option<ContentHash>)> {
    match err {
        GatewayError::Execution(ExecutionError::Failed {
            code,
            stdout_sha256,
        }) => Some((*code, *stdout_sha256)),
        GatewayError::Execution(ExecutionError::EmptyOutput) => Some((Some(0), None)),
        _ => None,
    }
}

/// Trace, stage list and stopwatch for one run, kept in step.
struct Recorder {
    trace: TraceWriter,
    stages: Vec<StageRecord>,
    watch: Stopwatch,
}

impl Recorder {
    fn start(layout: &ObserveLayout, run_id: &RunId) -> Result<Self, PipelineError> {
        Ok(Self {
            trace: TraceWriter::create(layout.trace_path(run_id))?,
            stages: Vec::new(),
            watch: Stopwatch::start(),
        })
    }

    fn record(
        &mut self,
        stage: Stage,
        input_hash: Option<ContentHash>,
        output_hash: Option<ContentHash>,
        status: StageStatus,
    ) -> Result<(), PipelineError> {
        self.trace.record(stage, input_hash, output_hash, status)?;
        self.watch.lap(stage);
        self.stages.push(StageRecord { stage, status });
        Ok(())
    }

    /// Close the trace and timing without a manifest, leaving the run
    /// visibly incomplete.
    fn abandon(self, layout: &ObserveLayout, run_id: &RunId) -> Result<(), PipelineError> {
        self.trace.finish()?;
        self.watch.finish().write(&layout.timing_path(run_id))?;
        Ok(())
    }

    /// Close the trace, write timing, then write the manifest last.
    fn seal(
        self,
        manifest: ManifestBuilder,
        layout: &ObserveLayout,
        run_id: &RunId,
        set_doc: &PersistedDocument,
        artifact_doc: &PersistedDocument,
    ) -> Result<PathBuf, PipelineError> {
        let trace_sha256 = self.trace.finish()?;
        self.watch.finish().write(&layout.timing_path(run_id))?;

        let sidecar = artifact_doc.path.with_file_name(SIDECAR_FILE);
        let sidecar_relative = format!("decisions/{}/{}", run_id, SIDECAR_FILE);
        let manifest = self
            .stages
            .into_iter()
            .fold(manifest, |m, s| m.with_stage(s.stage, s.status))
            .with_artifact(ArtifactKind::ProposalSet, set_doc.relative_path.clone(), set_doc.sha256)
            .with_artifact(
                ArtifactKind::DecisionArtifact,
                artifact_doc.relative_path.clone(),
                artifact_doc.sha256,
            )
            .with_artifact(
                ArtifactKind::ArtifactSidecar,
                sidecar_relative,
                ContentHash::hash(&fs::read(sidecar)?),
            )
            .with_artifact(
                ArtifactKind::Trace,
                ObserveLayout::relative(run_id, TRACE_FILE),
                trace_sha256,
            )
            .build()?;

        let path = layout.manifest_path(run_id);
        manifest.write(&path)?;
        Ok(path)
    }
}
