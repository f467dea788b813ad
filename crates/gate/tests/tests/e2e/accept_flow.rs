//! E2E test: an actionable input flows through every stage to the engine.
//!
//! Covers the on-disk layout, the manifest contents, the trace chain and
//! the single engine invocation.

use routegate_contract::{ContentHash, Decision, ReasonCode};
use routegate_gateway::{GateState, SimulatedCollaborator};
use routegate_observe::{
    verify_trace, ArtifactKind, ObserveLayout, RunManifest, Stage, StageStatus, TRACE_FILE,
};
use routegate_tests::{list_files, run_id, ScratchRepo};
use std::fs;
use std::sync::Arc;

fn read_manifest(path: &std::path::Path) -> RunManifest {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

#[test]
fn accept_runs_every_stage() {
    let repo = ScratchRepo::new();
    let input = repo.input("restart.txt", "restart alpha subsystem gracefully");
    let engine = Arc::new(SimulatedCollaborator::passing("alpha: restarted (graceful)\n"));

    let report = repo
        .pipeline(&engine)
        .run(&input, Some(run_id("accept-1")))
        .unwrap();

    assert_eq!(report.decision, Decision::Accept);
    assert_eq!(report.reason_code, ReasonCode::SingleActionableProposal);
    assert_eq!(report.state, GateState::Done);
    assert!(report.invoked());
    assert_eq!(engine.invocations(), vec![input.canonicalize().unwrap()]);

    let output = report.output.as_ref().unwrap();
    assert_eq!(fs::read(&output.path).unwrap(), b"alpha: restarted (graceful)\n");
}

#[test]
fn accept_writes_the_expected_layout() {
    let repo = ScratchRepo::new();
    let input = repo.input("beta.txt", "status of beta");
    let engine = Arc::new(SimulatedCollaborator::passing("beta: up\n"));

    repo.pipeline(&engine)
        .run(&input, Some(run_id("layout")))
        .unwrap();

    assert_eq!(
        list_files(&repo.artifact_root()),
        vec![
            "decisions/layout/artifact.json",
            "decisions/layout/artifact.json.sha256",
            "observe/layout/manifest.json",
            "observe/layout/timing.json",
            "observe/layout/trace.jsonl",
            "proposals/layout/proposal_set.json",
            "runs/layout/execution.claim",
            "runs/layout/stdout.raw",
        ]
    );
}

#[test]
fn manifest_binds_input_artifacts_and_output() {
    let repo = ScratchRepo::new();
    let input = repo.input("beta.txt", "status of beta");
    let engine = Arc::new(SimulatedCollaborator::passing("beta: up\n"));

    let report = repo
        .pipeline(&engine)
        .run(&input, Some(run_id("m1")))
        .unwrap();
    let manifest = read_manifest(&report.manifest_path);

    assert_eq!(manifest.run_id, run_id("m1"));
    assert_eq!(manifest.decision, Decision::Accept);
    assert_eq!(manifest.content_hash, report.content_hash);
    assert_eq!(manifest.input.input_ref.as_str(), "inputs/beta.txt");
    assert_eq!(
        manifest.input.sha256,
        ContentHash::hash(&fs::read(&input).unwrap())
    );
    assert!(manifest.execution.invoked);
    assert_eq!(manifest.execution.exit_code, Some(0));

    let output = manifest.authoritative_output.as_ref().unwrap();
    assert_eq!(output.path, "runs/m1/stdout.raw");
    assert_eq!(output.sha256, ContentHash::hash(b"beta: up\n"));

    for artifact in &manifest.artifacts {
        let on_disk = fs::read(repo.artifact_root().join(&artifact.path)).unwrap();
        assert_eq!(artifact.sha256, ContentHash::hash(&on_disk), "{}", artifact.path);
        assert_eq!(artifact.authoritative, artifact.kind == ArtifactKind::Output);
    }
    let kinds: Vec<ArtifactKind> = manifest.artifacts.iter().map(|a| a.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ArtifactKind::ProposalSet,
            ArtifactKind::DecisionArtifact,
            ArtifactKind::ArtifactSidecar,
            ArtifactKind::Trace,
            ArtifactKind::Output,
        ]
    );

    let stages: Vec<(Stage, StageStatus)> =
        manifest.stages.iter().map(|s| (s.stage, s.status)).collect();
    assert_eq!(
        stages,
        vec![
            (Stage::Propose, StageStatus::Ok),
            (Stage::Build, StageStatus::Ok),
            (Stage::Gate, StageStatus::Ok),
            (Stage::Execute, StageStatus::Ok),
        ]
    );
}

#[test]
fn manifest_carries_no_absolute_paths() {
    let repo = ScratchRepo::new();
    let input = repo.input("beta.txt", "status of beta");
    let engine = Arc::new(SimulatedCollaborator::passing("beta: up\n"));

    let report = repo.pipeline(&engine).run(&input, None).unwrap();
    let text = fs::read_to_string(&report.manifest_path).unwrap();

    let root = repo.root().to_string_lossy().into_owned();
    assert!(!text.contains(&root));
    assert!(text.ends_with("}\n"));
}

#[test]
fn trace_chain_verifies() {
    let repo = ScratchRepo::new();
    let input = repo.input("beta.txt", "status of beta");
    let engine = Arc::new(SimulatedCollaborator::passing("beta: up\n"));

    let report = repo
        .pipeline(&engine)
        .run(&input, Some(run_id("t1")))
        .unwrap();

    let layout = ObserveLayout::new(repo.artifact_root());
    let trace_path = layout.trace_path(&report.run_id);
    assert!(trace_path.ends_with(TRACE_FILE));
    let verification = verify_trace(&trace_path).unwrap();
    assert!(verification.valid, "{:?}", verification.error_message);
    assert_eq!(verification.total_records, 4);
    assert_eq!(verification.verified_records, 4);
}

#[test]
fn derived_run_id_is_stable_for_the_same_input() {
    let first = ScratchRepo::new();
    let second = ScratchRepo::new();
    let engine = Arc::new(SimulatedCollaborator::passing("beta: up\n"));

    let a = first
        .pipeline(&engine)
        .run(&first.input("beta.txt", "status of beta"), None)
        .unwrap();
    let b = second
        .pipeline(&engine)
        .run(&second.input("beta.txt", "status of beta"), None)
        .unwrap();

    assert_eq!(a.run_id, b.run_id);
    assert!(a.run_id.as_str().starts_with("run_"));
    assert_eq!(a.content_hash, b.content_hash);
}
