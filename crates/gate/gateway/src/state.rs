use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gate lifecycle for one enforcement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateState {
    AwaitingArtifact,
    /// Verified REJECT. Terminal.
    GateClosed,
    /// Verified ACCEPT, engine not yet started.
    GateOpen,
    Executing,
    /// Engine ran and its output was captured. Terminal.
    Done,
}

impl GateState {
    fn permits(self, next: GateState) -> bool {
        use GateState::*;
        matches!(
            (self, next),
            (AwaitingArtifact, GateClosed)
                | (AwaitingArtifact, GateOpen)
                | (GateOpen, Executing)
                | (Executing, Done)
        )
    }

    /// Move to `next`, refusing any transition outside the lifecycle.
    pub fn advance(self, next: GateState) -> Result<GateState, GatewayError> {
        if self.permits(next) {
            Ok(next)
        } else {
            Err(GatewayError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GateState::GateClosed | GateState::Done)
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GateState::AwaitingArtifact => "AWAITING_ARTIFACT",
            GateState::GateClosed => "GATE_CLOSED",
            GateState::GateOpen => "GATE_OPEN",
            GateState::Executing => "EXECUTING",
            GateState::Done => "DONE",
        };
        f.write_str(name)
    }
}
