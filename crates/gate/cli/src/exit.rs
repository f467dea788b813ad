//! Process exit statuses.
//!
//! A failing engine's own status is passed through unchanged, so statuses
//! 1-255 from `enforce` and `run` may come from either the engine or the
//! gate. The log line on stderr tells them apart.

use routegate_artifact::{BuildError, StoreError};
use routegate_contract::ContractError;
use routegate_gateway::{ExecutionError, GatewayError};
use routegate_observe::{DeterminismError, ObserveError};
use routegate_pipeline::PipelineError;
use std::process::ExitCode;

pub const SUCCESS: u8 = 0;
pub const FAILURE: u8 = 1;
pub const USAGE: u8 = 2;
pub const PATH_SAFETY: u8 = 3;
pub const BOUNDARY: u8 = 4;
pub const DETERMINISM: u8 = 5;
pub const EXECUTION: u8 = 6;
pub const REJECTED: u8 = 10;

/// How a successful command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The gate closed. Not an error, but never status 0.
    Rejected,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::from(SUCCESS),
            Outcome::Rejected => ExitCode::from(REJECTED),
        }
    }
}

/// Exit status for a failed command, from the first typed error in the chain.
pub fn status_for(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<PipelineError>() {
            return pipeline(e);
        }
        if let Some(e) = cause.downcast_ref::<GatewayError>() {
            return gateway(e);
        }
        if let Some(e) = cause.downcast_ref::<ExecutionError>() {
            return execution(e);
        }
        if let Some(e) = cause.downcast_ref::<BuildError>() {
            return build(e);
        }
        if let Some(e) = cause.downcast_ref::<StoreError>() {
            return store(e);
        }
        if let Some(e) = cause.downcast_ref::<ContractError>() {
            return contract(e);
        }
        if cause.downcast_ref::<DeterminismError>().is_some() {
            return DETERMINISM;
        }
        if cause.downcast_ref::<ObserveError>().is_some() {
            return FAILURE;
        }
    }
    FAILURE
}

fn pipeline(e: &PipelineError) -> u8 {
    match e {
        PipelineError::Config(_) => USAGE,
        PipelineError::Contract(e) => contract(e),
        PipelineError::Build(e) => build(e),
        PipelineError::Store(e) => store(e),
        PipelineError::Gateway(e) => gateway(e),
        PipelineError::Determinism(_) => DETERMINISM,
        PipelineError::Observe(_) | PipelineError::Io(_) => FAILURE,
    }
}

fn gateway(e: &GatewayError) -> u8 {
    match e {
        GatewayError::Boundary { .. } | GatewayError::AlreadyExecuted(_) => BOUNDARY,
        GatewayError::PathSafety(_) => PATH_SAFETY,
        GatewayError::Execution(e) => execution(e),
        GatewayError::Contract(e) => contract(e),
        GatewayError::InvalidTransition { .. } | GatewayError::Io(_) => FAILURE,
    }
}

fn execution(e: &ExecutionError) -> u8 {
    match e {
        ExecutionError::Failed { code: Some(code), .. } => u8::try_from(*code)
            .ok()
            .filter(|c| *c != 0)
            .unwrap_or(EXECUTION),
        _ => EXECUTION,
    }
}

fn build(e: &BuildError) -> u8 {
    match e {
        BuildError::Usage(_) => USAGE,
        BuildError::PathSafety(_) => PATH_SAFETY,
        BuildError::Encoding(_) => FAILURE,
    }
}

fn store(e: &StoreError) -> u8 {
    match e {
        StoreError::Contract(e) => contract(e),
        _ => BOUNDARY,
    }
}

fn contract(e: &ContractError) -> u8 {
    match e {
        ContractError::InvalidRunId { .. } => USAGE,
        ContractError::PathSafety { .. } => PATH_SAFETY,
        ContractError::Conflict { .. } => BOUNDARY,
        ContractError::Encoding(_) | ContractError::Io(_) => FAILURE,
    }
}
