//! E2E test: repeated runs over the same input are byte-identical.

use routegate_gateway::SimulatedCollaborator;
use routegate_observe::{DeterminismError, DeterminismHarness, Snapshot, TIMING_FILE};
use routegate_pipeline::PipelineError;
use routegate_tests::ScratchRepo;
use std::sync::Arc;

#[test]
fn accept_pipeline_is_deterministic_over_five_runs() {
    let repo = ScratchRepo::new();
    let input = repo.input("beta.txt", "status of beta");
    let engine = Arc::new(SimulatedCollaborator::passing("beta: up\n"));

    let report = repo.pipeline(&engine).verify_determinism(&input, 5).unwrap();

    assert_eq!(report.runs, 5);
    assert_eq!(engine.invocation_count(), 5);
    let names: Vec<&str> = report.digests.keys().map(String::as_str).collect();
    assert!(names.iter().any(|n| n.ends_with("artifact.json")));
    assert!(names.iter().any(|n| n.ends_with("manifest.json")));
    assert!(names.iter().any(|n| n.ends_with("trace.jsonl")));
    assert!(!names.iter().any(|n| n.ends_with(TIMING_FILE)));
    assert!(report.excluded.iter().any(|n| n.ends_with(TIMING_FILE)));
}

#[test]
fn reject_pipeline_is_deterministic() {
    let repo = ScratchRepo::new();
    let input = repo.input("vague.txt", "please do something");
    let engine = Arc::new(SimulatedCollaborator::passing("x"));

    let report = repo.pipeline(&engine).verify_determinism(&input, 5).unwrap();

    assert_eq!(report.runs, 5);
    assert_eq!(engine.invocation_count(), 0);
}

#[test]
fn verification_leaves_the_real_artifact_root_alone() {
    let repo = ScratchRepo::new();
    let input = repo.input("beta.txt", "status of beta");
    let engine = Arc::new(SimulatedCollaborator::passing("beta: up\n"));

    repo.pipeline(&engine).verify_determinism(&input, 2).unwrap();

    assert!(!repo.artifact_root().exists());
}

#[test]
fn too_few_runs_is_refused() {
    let repo = ScratchRepo::new();
    let input = repo.input("beta.txt", "status of beta");
    let engine = Arc::new(SimulatedCollaborator::passing("beta: up\n"));

    let err = repo.pipeline(&engine).verify_determinism(&input, 1).unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Determinism(DeterminismError::TooFewRuns { requested: 1 })
    ));
}

#[test]
fn harness_catches_a_drifting_producer() {
    let err = DeterminismHarness::new()
        .verify(3, |i| -> Result<Snapshot, std::io::Error> {
            let mut snapshot = Snapshot::new();
            snapshot.insert("observe/r1/manifest.json", format!("{{\"n\":{}}}", i / 2).into_bytes());
            Ok(snapshot)
        })
        .unwrap_err();

    assert!(matches!(err, DeterminismError::Diverged { run_index: 2, offset: 5, .. }));
    assert_eq!(err.run_index(), Some(2));
}
