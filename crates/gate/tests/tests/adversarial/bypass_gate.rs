//! Adversarial test: the gate cannot be opened without a verified ACCEPT.
//!
//! REJECT artifacts, forged ACCEPTs, tampered or missing sidecars and
//! relocated artifacts must all leave the engine uninvoked.

use routegate_contract::{Decision, Intent, ReasonCode, Target};
use routegate_gateway::{GateState, GatewayError, SimulatedCollaborator};
use routegate_proposal::{Proposal, ProposalSet};
use routegate_tests::{forge_artifact, list_files, ScratchRepo};
use std::fs;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn boundary_codes(err: GatewayError) -> Vec<String> {
    match err {
        GatewayError::Boundary { codes } => codes,
        other => panic!("expected a boundary violation, got {other}"),
    }
}

// ---------------------------------------------------------------------------
// Tests: REJECT stays closed
// ---------------------------------------------------------------------------

#[test]
fn reject_never_invokes_the_engine() {
    let repo = ScratchRepo::new();
    let input = repo.input("vague.txt", "please do something");
    let artifact = repo.persist_artifact("vague.txt", "please do something", "r1");
    let engine = Arc::new(SimulatedCollaborator::passing("should not run"));

    let outcome = repo.gateway(&engine).enforce(&artifact, &input).unwrap();

    assert_eq!(outcome.state, GateState::GateClosed);
    assert_eq!(outcome.decision, Decision::Reject);
    assert!(!outcome.invoked());
    assert_eq!(engine.invocation_count(), 0);
    assert!(list_files(&repo.artifact_root().join("runs")).is_empty());
}

#[test]
fn ambiguous_payload_never_invokes_the_engine() {
    let repo = ScratchRepo::new();
    let input = repo.input("two.txt", "status of beta");
    let payload = ProposalSet::new("status of beta")
        .with_proposals(vec![
            Proposal::route(Intent::StatusQuery, Target::Beta, None),
            Proposal::route(Intent::StatusQuery, Target::Gamma, None),
        ])
        .to_canonical_bytes()
        .unwrap();
    let artifact = repo.persist_payload("two.txt", &payload, "r1");
    let engine = Arc::new(SimulatedCollaborator::passing("x"));

    let outcome = repo.gateway(&engine).enforce(&artifact, &input).unwrap();

    assert_eq!(outcome.reason_code, ReasonCode::AmbiguousProposals);
    assert_eq!(engine.invocation_count(), 0);
}

#[test]
fn garbage_payload_never_invokes_the_engine() {
    let repo = ScratchRepo::new();
    let input = repo.input("x.txt", "status of beta");
    let artifact = repo.persist_payload("x.txt", b"{\"proposals\": [", "r1");
    let engine = Arc::new(SimulatedCollaborator::passing("x"));

    let outcome = repo.gateway(&engine).enforce(&artifact, &input).unwrap();

    assert_eq!(outcome.reason_code, ReasonCode::InvalidProposals);
    assert_eq!(engine.invocation_count(), 0);
}

// ---------------------------------------------------------------------------
// Tests: forged and tampered artifacts
// ---------------------------------------------------------------------------

#[test]
fn forged_accept_with_recomputed_hash_is_refused() {
    let repo = ScratchRepo::new();
    let input = repo.input("vague.txt", "please do something");
    let artifact = repo.persist_artifact("vague.txt", "please do something", "r1");

    forge_artifact(&artifact, |a| {
        a.decision = Decision::Accept;
        a.reason_code = ReasonCode::SingleActionableProposal;
        a.route = Some(routegate_artifact::Route {
            intent: Intent::StatusQuery,
            target: Target::Beta,
            mode: None,
        });
        a.construction.proposal_count = 1;
        a.construction.selected_proposal_index = Some(0);
    });
    let engine = Arc::new(SimulatedCollaborator::passing("x"));

    let err = repo.gateway(&engine).enforce(&artifact, &input).unwrap_err();

    assert_eq!(boundary_codes(err), vec!["DECISION_NOT_REDERIVABLE"]);
    assert_eq!(engine.invocation_count(), 0);
}

#[test]
fn flipped_decision_without_rehash_is_refused() {
    let repo = ScratchRepo::new();
    let input = repo.input("vague.txt", "please do something");
    let artifact = repo.persist_artifact("vague.txt", "please do something", "r1");

    let text = fs::read_to_string(&artifact).unwrap();
    fs::write(&artifact, text.replace("\"REJECT\"", "\"ACCEPT\"")).unwrap();
    let engine = Arc::new(SimulatedCollaborator::passing("x"));

    let err = repo.gateway(&engine).enforce(&artifact, &input).unwrap_err();

    assert_eq!(boundary_codes(err), vec!["ARTIFACT_SIDECAR_MISMATCH"]);
    assert_eq!(engine.invocation_count(), 0);
}

#[test]
fn tampered_sidecar_is_refused() {
    let repo = ScratchRepo::new();
    let input = repo.input("beta.txt", "status of beta");
    let artifact = repo.persist_artifact("beta.txt", "status of beta", "r1");
    fs::write(
        artifact.with_file_name("artifact.json.sha256"),
        format!("{}  artifact.json\n", "0".repeat(64)),
    )
    .unwrap();
    let engine = Arc::new(SimulatedCollaborator::passing("x"));

    let err = repo.gateway(&engine).enforce(&artifact, &input).unwrap_err();

    assert_eq!(boundary_codes(err), vec!["ARTIFACT_SIDECAR_MISMATCH"]);
    assert_eq!(engine.invocation_count(), 0);
}

#[test]
fn missing_sidecar_is_refused() {
    let repo = ScratchRepo::new();
    let input = repo.input("beta.txt", "status of beta");
    let artifact = repo.persist_artifact("beta.txt", "status of beta", "r1");
    fs::remove_file(artifact.with_file_name("artifact.json.sha256")).unwrap();
    let engine = Arc::new(SimulatedCollaborator::passing("x"));

    let err = repo.gateway(&engine).enforce(&artifact, &input).unwrap_err();

    assert_eq!(boundary_codes(err), vec!["ARTIFACT_SIDECAR_MISSING"]);
    assert_eq!(engine.invocation_count(), 0);
}

#[test]
fn missing_artifact_is_refused() {
    let repo = ScratchRepo::new();
    let input = repo.input("beta.txt", "status of beta");
    let engine = Arc::new(SimulatedCollaborator::passing("x"));

    let err = repo
        .gateway(&engine)
        .enforce(&repo.artifact_root().join("decisions/r1/artifact.json"), &input)
        .unwrap_err();

    assert_eq!(boundary_codes(err), vec!["ARTIFACT_MISSING"]);
    assert_eq!(engine.invocation_count(), 0);
}

#[test]
fn accept_moved_under_another_run_is_refused() {
    let repo = ScratchRepo::new();
    let input = repo.input("beta.txt", "status of beta");
    let artifact = repo.persist_artifact("beta.txt", "status of beta", "r1");

    let other = repo.artifact_root().join("decisions").join("r2");
    fs::create_dir_all(&other).unwrap();
    fs::copy(&artifact, other.join("artifact.json")).unwrap();
    fs::copy(
        artifact.with_file_name("artifact.json.sha256"),
        other.join("artifact.json.sha256"),
    )
    .unwrap();
    let engine = Arc::new(SimulatedCollaborator::passing("x"));

    let err = repo
        .gateway(&engine)
        .enforce(&other.join("artifact.json"), &input)
        .unwrap_err();

    assert_eq!(boundary_codes(err), vec!["ARTIFACT_LOCATION_MISMATCH"]);
    assert_eq!(engine.invocation_count(), 0);
}

#[test]
fn replayed_accept_invokes_only_once() {
    let repo = ScratchRepo::new();
    let input = repo.input("beta.txt", "status of beta");
    let artifact = repo.persist_artifact("beta.txt", "status of beta", "r1");
    let engine = Arc::new(SimulatedCollaborator::passing("beta: up\n"));
    let gateway = repo.gateway(&engine);

    gateway.enforce(&artifact, &input).unwrap();
    let err = gateway.enforce(&artifact, &input).unwrap_err();

    assert!(matches!(err, GatewayError::AlreadyExecuted(_)));
    assert_eq!(engine.invocation_count(), 1);
}

#[test]
fn accept_against_edited_input_is_refused() {
    let repo = ScratchRepo::new();
    let input = repo.input("beta.txt", "status of beta");
    let artifact = repo.persist_artifact("beta.txt", "status of beta", "r1");
    fs::write(&input, "stop beta subsystem immediately\n").unwrap();
    let engine = Arc::new(SimulatedCollaborator::passing("x"));

    let err = repo.gateway(&engine).enforce(&artifact, &input).unwrap_err();

    assert_eq!(boundary_codes(err), vec!["INPUT_DRIFT"]);
    assert_eq!(engine.invocation_count(), 0);
}
