//! Closed vocabularies and document bounds.
//!
//! Every enumeration here is closed: the wire strings listed are the only
//! accepted spellings, and adding one is a contract change.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const PROPOSAL_SCHEMA_VERSION: &str = "m1.0";
pub const ARTIFACT_SCHEMA_VERSION: &str = "artifact_v1";
pub const MANIFEST_SCHEMA_VERSION: &str = "manifest_v1";
pub const RULESET_ID: &str = "GATE_RULESET_V1";

pub const MAX_INPUT_CHARS: usize = 4096;
pub const MAX_PROPOSALS: usize = 8;
pub const MAX_ERRORS: usize = 16;
pub const MAX_ERROR_CHARS: usize = 256;
pub const MAX_NOTES: usize = 8;
pub const MAX_NOTE_CHARS: usize = 128;
pub const MAX_REF_CHARS: usize = 512;
pub const MAX_RUN_ID_CHARS: usize = 64;

macro_rules! closed_vocabulary {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            pub const WIRE: &'static [&'static str] = &[$($wire),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            pub fn from_wire(text: &str) -> Option<Self> {
                match text {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_vocabulary! {
    /// Kind of a proposal. Only route candidates exist.
    ProposalKind {
        RouteCandidate => "ROUTE_CANDIDATE",
    }
}

closed_vocabulary! {
    /// What a route asks the engine to do.
    Intent {
        RestartSubsystem => "RESTART_SUBSYSTEM",
        StopSubsystem => "STOP_SUBSYSTEM",
        StatusQuery => "STATUS_QUERY",
    }
}

closed_vocabulary! {
    /// Subsystem a route addresses.
    Target {
        Alpha => "alpha",
        Beta => "beta",
        Gamma => "gamma",
    }
}

closed_vocabulary! {
    Mode {
        Graceful => "graceful",
        Immediate => "immediate",
    }
}

closed_vocabulary! {
    /// Gate verdict.
    Decision {
        Accept => "ACCEPT",
        Reject => "REJECT",
    }
}

closed_vocabulary! {
    /// Machine-checkable reason attached to every verdict.
    ReasonCode {
        SingleActionableProposal => "SINGLE_ACTIONABLE_PROPOSAL",
        InvalidProposals => "INVALID_PROPOSALS",
        NoProposals => "NO_PROPOSALS",
        AmbiguousProposals => "AMBIGUOUS_PROPOSALS",
    }
}

/// Whether an intent carries the `mode` slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeRule {
    Required,
    Forbidden,
}

impl Intent {
    pub fn mode_rule(&self) -> ModeRule {
        match self {
            Intent::RestartSubsystem | Intent::StopSubsystem => ModeRule::Required,
            Intent::StatusQuery => ModeRule::Forbidden,
        }
    }
}

impl Target {
    /// Case-insensitive (ASCII) match against a single word.
    pub fn from_word(word: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(word))
    }
}

impl ReasonCode {
    /// The only decision this reason code may accompany.
    pub fn decision(&self) -> Decision {
        match self {
            ReasonCode::SingleActionableProposal => Decision::Accept,
            _ => Decision::Reject,
        }
    }
}
