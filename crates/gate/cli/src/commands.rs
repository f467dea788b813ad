use crate::exit::Outcome;
use crate::output;
use anyhow::Context;
use routegate_artifact::{ArtifactBuilder, ArtifactStore};
use routegate_contract::RunId;
use routegate_gateway::{
    ExecutionCollaborator, ExecutionError, GateState, Gateway, ProcessCollaborator, RawOutput,
    UnconfiguredCollaborator,
};
use routegate_pipeline::{GateConfig, Pipeline};
use routegate_proposal::{generate, RawInput};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

/// The engine named by the configuration, or none at all. Without one every
/// ACCEPT fails closed.
#[derive(Debug, Clone)]
enum Engine {
    Pinned(ProcessCollaborator),
    Unconfigured(UnconfiguredCollaborator),
}

impl Engine {
    fn from_config(config: &GateConfig) -> anyhow::Result<Self> {
        if config.engine.path.is_none() && config.engine.sha256.is_none() {
            return Ok(Engine::Unconfigured(UnconfiguredCollaborator));
        }
        Ok(Engine::Pinned(config.engine_collaborator()?))
    }
}

impl ExecutionCollaborator for Engine {
    fn verify_integrity(&self) -> Result<(), ExecutionError> {
        match self {
            Engine::Pinned(e) => e.verify_integrity(),
            Engine::Unconfigured(e) => e.verify_integrity(),
        }
    }

    fn invoke(&self, input: &Path) -> Result<RawOutput, ExecutionError> {
        match self {
            Engine::Pinned(e) => e.invoke(input),
            Engine::Unconfigured(e) => e.invoke(input),
        }
    }
}

pub fn propose(config: &GateConfig, input: &Path, run_id: Option<&str>) -> anyhow::Result<Outcome> {
    let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let set = generate(&RawInput::from_file_bytes(&bytes));
    let encoded = set.to_canonical_bytes()?;

    if let Some(run_id) = run_id {
        let run_id = RunId::parse(run_id)?;
        let doc = ArtifactStore::new(config.artifact_root()?).persist_proposal_set(&run_id, &encoded)?;
        info!(run_id = %run_id, path = %doc.relative_path, "proposal set persisted");
    }

    let mut stdout = io::stdout().lock();
    stdout.write_all(&encoded)?;
    stdout.write_all(b"\n")?;
    Ok(Outcome::Success)
}

pub fn build(
    config: &GateConfig,
    proposal_set: &Path,
    run_id: &str,
    input_ref: &str,
) -> anyhow::Result<Outcome> {
    let bytes = fs::read(proposal_set)
        .with_context(|| format!("reading {}", proposal_set.display()))?;
    let artifact = ArtifactBuilder::new().build(&bytes, run_id, input_ref)?;
    let doc = ArtifactStore::new(config.artifact_root()?).persist(&artifact)?;

    println!(
        "DECISION={} REASON={} RUN_ID={} ARTIFACT={}",
        artifact.decision, artifact.reason_code, artifact.run_id, doc.relative_path
    );
    Ok(Outcome::Success)
}

/// Enforce a persisted artifact. On ACCEPT the engine's captured output is
/// copied to stdout unchanged.
pub fn enforce(config: &GateConfig, artifact: &Path, input: &Path) -> anyhow::Result<Outcome> {
    let gateway = Gateway::new(config.repo_root()?, config.artifact_root()?)
        .with_collaborator(Engine::from_config(config)?);
    let outcome = gateway.enforce(artifact, input)?;

    if outcome.state == GateState::GateClosed {
        println!("DECISION=REJECT REASON={} RUN_ID={}", outcome.reason_code, outcome.run_id);
        return Ok(Outcome::Rejected);
    }
    if let Some(captured) = &outcome.output {
        let bytes = fs::read(&captured.path)?;
        io::stdout().lock().write_all(&bytes)?;
    }
    Ok(Outcome::Success)
}

pub fn run(config: &GateConfig, input: &Path, run_id: Option<&str>) -> anyhow::Result<Outcome> {
    let run_id = run_id.map(RunId::parse).transpose()?;
    let pipeline = Pipeline::from_config(config, Engine::from_config(config)?)?;
    let report = pipeline.run(input, run_id)?;

    eprint!("{}", output::summary(&report));
    println!("{}", output::decision_line(&report));
    if report.state == GateState::GateClosed {
        Ok(Outcome::Rejected)
    } else {
        Ok(Outcome::Success)
    }
}

pub fn verify_determinism(config: &GateConfig, input: &Path, runs: usize) -> anyhow::Result<Outcome> {
    let pipeline = Pipeline::from_config(config, Engine::from_config(config)?)?;
    let report = pipeline
        .verify_determinism(input, runs)
        .context("determinism check failed")?;

    for (item, digest) in &report.digests {
        eprintln!("  {}  {}", digest.to_hex(), item);
    }
    println!(
        "DETERMINISTIC runs={} items={} excluded={}",
        report.runs,
        report.digests.len(),
        report.excluded.len()
    );
    Ok(Outcome::Success)
}

pub fn verify_engine(config: &GateConfig) -> anyhow::Result<Outcome> {
    let engine = config.engine_collaborator()?;
    let computed = engine.engine_sha256()?;
    engine.verify_integrity()?;
    println!("ENGINE_OK sha256={} path={}", computed.to_hex(), engine.engine().display());
    Ok(Outcome::Success)
}
