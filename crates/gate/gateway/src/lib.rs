#![deny(unsafe_code)]
//! # routegate-gateway
//!
//! The enforcement point. The gateway re-reads a persisted decision artifact,
//! verifies it from scratch, and invokes the execution engine only when the
//! verified verdict is ACCEPT.
//!
//! ## Invariants
//!
//! - No invocation without a verified ACCEPT artifact read from disk. There is
//!   no flag, environment variable or alternate path that opens the gate.
//! - At most one invocation per run_id, enforced by an exclusive claim file.
//! - The engine receives exactly one argument: the canonical location that
//!   the artifact's `input_ref` names under the repository root, never the
//!   caller's spelling of it.
//! - REJECT creates nothing under the run's output namespace.
//!
//! ## Key Types
//!
//! - [`Gateway`]: `enforce(artifact_path, raw_input_path)`
//! - [`ExecutionCollaborator`]: seam around the opaque engine, with
//!   [`ProcessCollaborator`] for the real binary and [`SimulatedCollaborator`]
//!   for tests
//! - [`GateState`]: `AwaitingArtifact → GateClosed` or
//!   `AwaitingArtifact → GateOpen → Executing → Done`

pub mod collaborator;
pub mod error;
pub mod gateway;
pub mod state;

pub use collaborator::{
    ExecutionCollaborator, ProcessCollaborator, RawOutput, SimulatedCollaborator,
    UnconfiguredCollaborator,
};
pub use error::{ExecutionError, GatewayError};
pub use gateway::{CapturedOutput, ExecutionOutcome, Gateway, STDOUT_FILE};
pub use state::GateState;
