#![deny(unsafe_code)]
//! # routegate-pipeline
//!
//! Wires the stages together for one input:
//!
//! ```text
//! raw input ──► generate ──► proposals/<run>/proposal_set.json
//!                              │
//!                              ▼
//!                 build ──► decisions/<run>/artifact.json (+ .sha256)
//!                              │
//!                              ▼
//!               enforce ──► runs/<run>/stdout.raw        (ACCEPT only)
//!                              │
//!                              ▼
//!               observe ──► observe/<run>/{trace.jsonl, timing.json, manifest.json}
//! ```
//!
//! [`GateConfig`] is the only source of roots and of the engine pin.

pub mod config;
pub mod error;
pub mod pipeline;

pub use crate::config::{EngineConfig, GateConfig, LoggingConfig};
pub use error::PipelineError;
pub use pipeline::{Pipeline, RunReport};
