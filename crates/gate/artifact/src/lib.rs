#![deny(unsafe_code)]
//! # routegate-artifact
//!
//! Sealed decision artifacts: the only document the gateway will act on.
//!
//! The builder takes untrusted proposal bytes and emits an ACCEPT or REJECT
//! [`DecisionArtifact`]. Construction never fails on bad proposals; they
//! collapse to REJECT. It fails only on boundary violations: a malformed
//! run_id or an input reference that is not repo-relative.
//!
//! ## Invariants
//!
//! - Identical `(bytes, run_id, input_ref)` always produce byte-identical
//!   artifacts.
//! - `content_hash` covers every field except `run_id`, so the same decision
//!   under a different run_id keeps its hash.
//! - A persisted artifact is never overwritten; a different artifact for an
//!   existing run_id is a conflict.
//! - The decision recorded in an artifact must be re-derivable from the
//!   proposal set embedded in it.

pub mod builder;
pub mod error;
pub mod model;
pub mod ruleset;
pub mod store;
pub mod validator;

pub use builder::ArtifactBuilder;
pub use error::{ArtifactViolation, BuildError, StoreError};
pub use model::{Construction, DecisionArtifact, Route};
pub use ruleset::{decide, Verdict};
pub use store::{ArtifactStore, PersistedDocument};
pub use validator::{verify_artifact_bytes, ARTIFACT_SCHEMA};
