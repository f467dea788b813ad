use routegate_contract::vocab::PROPOSAL_SCHEMA_VERSION;
use routegate_contract::{
    to_canonical_compact, ContentHash, ContractError, Intent, Mode, ProposalKind, Target,
};
use serde::{Deserialize, Serialize};

/// Raw input for one run.
///
/// Built either from text or from file bytes. File bytes lose one trailing
/// line terminator; bytes that are not UTF-8 become empty text carrying
/// `INPUT_NOT_UTF8`, which the generator reports instead of matching.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawInput {
    text: String,
    decode_error: Option<&'static str>,
}

impl RawInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            decode_error: None,
        }
    }

    pub fn from_file_bytes(bytes: &[u8]) -> Self {
        let bytes = bytes
            .strip_suffix(b"\r\n")
            .or_else(|| bytes.strip_suffix(b"\n"))
            .unwrap_or(bytes);
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::new(text),
            Err(_) => Self {
                text: String::new(),
                decode_error: Some("INPUT_NOT_UTF8"),
            },
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn decode_error(&self) -> Option<&'static str> {
        self.decode_error
    }
}

impl From<&str> for RawInput {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Slots {
    pub target: Target,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutePayload {
    pub intent: Intent,
    pub slots: Slots,
}

/// One structural route candidate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Proposal {
    pub kind: ProposalKind,
    pub payload: RoutePayload,
}

impl Proposal {
    pub fn route(intent: Intent, target: Target, mode: Option<Mode>) -> Self {
        Self {
            kind: ProposalKind::RouteCandidate,
            payload: RoutePayload {
                intent,
                slots: Slots { target, mode },
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputEcho {
    pub raw: String,
}

/// Bounded set of proposals for one raw input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProposalSet {
    pub schema_version: String,
    pub input: InputEcho,
    pub proposals: Vec<Proposal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ProposalSet {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            schema_version: PROPOSAL_SCHEMA_VERSION.to_string(),
            input: InputEcho { raw: raw.into() },
            proposals: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_proposals(mut self, proposals: Vec<Proposal>) -> Self {
        self.proposals = proposals;
        self
    }

    pub fn with_error(mut self, code: impl Into<String>) -> Self {
        self.errors.push(code.into());
        self
    }

    /// Compact, sorted-key wire bytes.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, ContractError> {
        to_canonical_compact(self)
    }

    pub fn content_hash(&self) -> Result<ContentHash, ContractError> {
        Ok(ContentHash::hash(&self.to_canonical_bytes()?))
    }
}
