#![deny(unsafe_code)]
//! # routegate-observe
//!
//! Derived, non-authoritative records of a run. Nothing here feeds back into a
//! decision.
//!
//! ## Key Types
//!
//! - [`TraceWriter`]: append-only `trace.jsonl`, one hash-chained record per
//!   stage, flushed as it is written; [`verify_trace`] finds the first broken
//!   record
//! - [`ManifestBuilder`] / [`RunManifest`]: the closing `manifest.json`
//! - [`DeterminismHarness`]: repeats a run and compares every produced byte
//! - [`Stopwatch`] / [`RunTiming`]: the wall-clock sidecar, kept out of every
//!   hash
//!
//! ## Invariants
//!
//! - Trace records and manifests contain no absolute path, timestamp key or
//!   timestamp-like value; [`leak::scan`] enforces this before anything is
//!   written.
//! - The manifest is written last and create-exclusively. A run without one
//!   is incomplete.

pub mod determinism;
pub mod error;
pub mod layout;
pub mod leak;
pub mod manifest;
pub mod timing;
pub mod trace;

pub use determinism::{DeterminismHarness, DeterminismReport, Snapshot};
pub use error::{DeterminismError, ObserveError};
pub use layout::{ObserveLayout, MANIFEST_FILE, TIMING_FILE, TRACE_FILE};
pub use manifest::{
    ArtifactKind, DeterminismFlags, ExecutionRecord, InputRecord, ManifestArtifact,
    ManifestBuilder, OutputRecord, RunManifest, StageRecord,
};
pub use timing::{RunTiming, StageTiming, Stopwatch};
pub use trace::{verify_trace, Stage, StageStatus, TraceRecord, TraceVerification, TraceWriter};
