use routegate_contract::{
    to_canonical_compact, to_canonical_pretty, ContentHash, ContractError, Decision, Intent, Mode,
    ReasonCode, RepoRelativePath, RunId, Target,
};
use routegate_proposal::{Proposal, ProposalSet};
use serde::{Deserialize, Serialize};

/// The route an ACCEPT authorizes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Route {
    pub intent: Intent,
    pub target: Target,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
}

impl From<&Proposal> for Route {
    fn from(proposal: &Proposal) -> Self {
        Self {
            intent: proposal.payload.intent,
            target: proposal.payload.slots.target,
            mode: proposal.payload.slots.mode,
        }
    }
}

/// How the decision was reached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Construction {
    pub proposal_count: usize,
    pub selected_proposal_index: Option<usize>,
    pub validator_errors: Vec<String>,
    pub notes: Vec<String>,
}

/// Sealed ACCEPT/REJECT record for one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecisionArtifact {
    pub schema_version: String,
    pub ruleset_id: String,
    /// Namespacing only. Not covered by `content_hash`.
    pub run_id: RunId,
    pub input_ref: RepoRelativePath,
    pub decision: Decision,
    pub reason_code: ReasonCode,
    pub route: Option<Route>,
    /// The validated proposal set, or `None` when the payload did not validate.
    pub proposal_set: Option<ProposalSet>,
    /// Hash of the payload bytes exactly as received.
    pub proposal_set_sha256: ContentHash,
    pub construction: Construction,
    pub content_hash: ContentHash,
}

/// Every field except `run_id` and `content_hash`.
#[derive(Serialize)]
struct HashedView<'a> {
    schema_version: &'a str,
    ruleset_id: &'a str,
    input_ref: &'a RepoRelativePath,
    decision: Decision,
    reason_code: ReasonCode,
    route: &'a Option<Route>,
    proposal_set: &'a Option<ProposalSet>,
    proposal_set_sha256: &'a ContentHash,
    construction: &'a Construction,
}

impl DecisionArtifact {
    /// Compute the content hash of this artifact's decision content.
    pub fn compute_hash(&self) -> Result<ContentHash, ContractError> {
        let view = HashedView {
            schema_version: &self.schema_version,
            ruleset_id: &self.ruleset_id,
            input_ref: &self.input_ref,
            decision: self.decision,
            reason_code: self.reason_code,
            route: &self.route,
            proposal_set: &self.proposal_set,
            proposal_set_sha256: &self.proposal_set_sha256,
            construction: &self.construction,
        };
        Ok(ContentHash::hash(&to_canonical_compact(&view)?))
    }

    /// Verify the content hash matches the data.
    pub fn verify_hash(&self) -> bool {
        matches!(self.compute_hash(), Ok(computed) if computed == self.content_hash)
    }

    pub fn is_accept(&self) -> bool {
        self.decision == Decision::Accept
    }

    /// Persisted form: sorted keys, two-space indent, trailing newline.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, ContractError> {
        to_canonical_pretty(self)
    }
}
