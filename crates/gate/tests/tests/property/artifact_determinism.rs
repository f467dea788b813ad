//! Property test: artifacts depend only on their decision inputs.
//!
//! Building twice from the same bytes yields identical artifacts, and the
//! run_id never reaches the content hash.

use proptest::prelude::*;
use routegate_artifact::{verify_artifact_bytes, ArtifactBuilder};
use routegate_contract::Decision;
use routegate_proposal::{generate, RawInput};

fn payload(text: &str) -> Vec<u8> {
    generate(&RawInput::new(text)).to_canonical_bytes().unwrap()
}

fn phrase() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("status of beta".to_string()),
        Just("restart alpha subsystem gracefully".to_string()),
        Just("immediate stop of gamma".to_string()),
        Just("please do something".to_string()),
        "[a-z ]{0,40}",
    ]
}

proptest! {
    #[test]
    fn build_is_idempotent(text in phrase()) {
        let bytes = payload(&text);
        let a = ArtifactBuilder::new().build(&bytes, "r1", "inputs/x.txt").unwrap();
        let b = ArtifactBuilder::new().build(&bytes, "r1", "inputs/x.txt").unwrap();
        prop_assert_eq!(a.to_canonical_bytes().unwrap(), b.to_canonical_bytes().unwrap());
    }

    #[test]
    fn content_hash_ignores_run_id(text in phrase(), run_id in "[A-Za-z0-9_-]{1,32}") {
        let bytes = payload(&text);
        let a = ArtifactBuilder::new().build(&bytes, "baseline", "inputs/x.txt").unwrap();
        let b = ArtifactBuilder::new().build(&bytes, &run_id, "inputs/x.txt").unwrap();
        prop_assert_eq!(a.content_hash, b.content_hash);
        prop_assert_eq!(a.decision, b.decision);
    }

    #[test]
    fn built_artifacts_always_verify(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
        let artifact = ArtifactBuilder::new().build(&bytes, "r1", "inputs/x.txt").unwrap();
        prop_assert_eq!(artifact.decision, Decision::Reject);
        prop_assert!(verify_artifact_bytes(&artifact.to_canonical_bytes().unwrap()).is_ok());
    }
}

#[test]
fn content_hash_follows_input_ref() {
    let bytes = payload("status of beta");
    let a = ArtifactBuilder::new().build(&bytes, "r1", "inputs/a.txt").unwrap();
    let b = ArtifactBuilder::new().build(&bytes, "r1", "inputs/b.txt").unwrap();
    assert_ne!(a.content_hash, b.content_hash);
}
