//! Adversarial test: nothing resolves outside the repository.
//!
//! Absolute and parent-escaping input references are refused when the
//! artifact is built, and input files outside the repository root are
//! refused by the gateway and the pipeline.

use routegate_artifact::{ArtifactBuilder, BuildError};
use routegate_contract::ContractError;
use routegate_gateway::{GatewayError, SimulatedCollaborator};
use routegate_pipeline::PipelineError;
use routegate_proposal::{generate, RawInput};
use routegate_tests::ScratchRepo;
use std::fs;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn payload() -> Vec<u8> {
    generate(&RawInput::new("status of beta"))
        .to_canonical_bytes()
        .unwrap()
}

fn path_safety_message(input_ref: &str) -> String {
    match ArtifactBuilder::new().build(&payload(), "r1", input_ref) {
        Err(BuildError::PathSafety(e)) => e.to_string(),
        other => panic!("expected a path safety error for {input_ref:?}, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Tests: input_ref
// ---------------------------------------------------------------------------

#[test]
fn absolute_input_ref_is_refused() {
    assert!(path_safety_message("/tmp/absolute.txt").contains("must be repo-relative"));
}

#[test]
fn parent_escape_input_ref_is_refused() {
    assert!(path_safety_message("../escape.txt").contains("must be repo-relative"));
    assert!(path_safety_message("inputs/../../escape.txt").contains("must be repo-relative"));
}

#[test]
fn drive_and_backslash_forms_are_refused() {
    for input_ref in ["C:/inputs/x.txt", "inputs\\x.txt", "\\\\server\\share"] {
        assert!(
            matches!(
                ArtifactBuilder::new().build(&payload(), "r1", input_ref),
                Err(BuildError::PathSafety(_))
            ),
            "{input_ref:?} was accepted"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests: input files outside the repository
// ---------------------------------------------------------------------------

#[test]
fn gateway_refuses_input_outside_repo() {
    let repo = ScratchRepo::new();
    repo.input("beta.txt", "status of beta");
    let artifact = repo.persist_artifact("beta.txt", "status of beta", "r1");

    let outside = tempfile::tempdir().unwrap();
    let stray = outside.path().join("beta.txt");
    fs::write(&stray, "status of beta\n").unwrap();
    let engine = Arc::new(SimulatedCollaborator::passing("x"));

    let err = repo.gateway(&engine).enforce(&artifact, &stray).unwrap_err();

    assert!(matches!(err, GatewayError::PathSafety(_)), "got {err}");
    assert_eq!(engine.invocation_count(), 0);
}

#[test]
fn pipeline_refuses_input_outside_repo() {
    let repo = ScratchRepo::new();
    let outside = tempfile::tempdir().unwrap();
    let stray = outside.path().join("beta.txt");
    fs::write(&stray, "status of beta\n").unwrap();
    let engine = Arc::new(SimulatedCollaborator::passing("x"));

    let err = repo.pipeline(&engine).run(&stray, None).unwrap_err();

    assert!(
        matches!(err, PipelineError::Contract(ref e) if e.is_path_safety()),
        "got {err}"
    );
    assert_eq!(engine.invocation_count(), 0);
    assert!(!repo.artifact_root().exists());
}

#[test]
fn symlink_out_of_repo_is_refused() {
    let repo = ScratchRepo::new();
    let outside = tempfile::tempdir().unwrap();
    let target = outside.path().join("beta.txt");
    fs::write(&target, "status of beta\n").unwrap();

    #[cfg(unix)]
    {
        let link = repo.root().join("inputs").join("link.txt");
        std::os::unix::fs::symlink(&target, &link).unwrap();
        let err = routegate_contract::RepoRelativePath::from_path_within(repo.root(), &link)
            .unwrap_err();
        assert!(matches!(err, ContractError::PathSafety { .. }));
    }
}
