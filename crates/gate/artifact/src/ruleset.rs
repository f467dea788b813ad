//! The fixed decision ruleset.
//!
//! Precedence, first match wins:
//!
//! 1. payload invalid → REJECT `INVALID_PROPOSALS`
//! 2. payload reports errors alongside proposals → REJECT `INVALID_PROPOSALS`
//! 3. zero proposals → REJECT `NO_PROPOSALS`
//! 4. more than one proposal → REJECT `AMBIGUOUS_PROPOSALS`
//! 5. exactly one proposal → ACCEPT `SINGLE_ACTIONABLE_PROPOSAL`
//!
//! Validation already guarantees every proposal is actionable, so rule 5
//! needs no further slot checks.

use crate::model::Route;
use routegate_contract::{Decision, ReasonCode};
use routegate_proposal::ValidationResult;

/// The outcome of applying the ruleset to a validation result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub decision: Decision,
    pub reason_code: ReasonCode,
    pub route: Option<Route>,
    pub proposal_count: usize,
    pub selected_proposal_index: Option<usize>,
    pub notes: Vec<String>,
}

impl Verdict {
    fn reject(reason_code: ReasonCode, proposal_count: usize, notes: Vec<String>) -> Self {
        Self {
            decision: Decision::Reject,
            reason_code,
            route: None,
            proposal_count,
            selected_proposal_index: None,
            notes,
        }
    }
}

/// Apply the ruleset. Pure.
pub fn decide(validation: &ValidationResult) -> Verdict {
    let set = match validation {
        ValidationResult::Invalid { proposal_count, .. } => {
            return Verdict::reject(ReasonCode::InvalidProposals, *proposal_count, Vec::new())
        }
        ValidationResult::Valid(set) => set,
    };

    let count = set.proposals.len();
    if count > 0 && !set.errors.is_empty() {
        return Verdict::reject(
            ReasonCode::InvalidProposals,
            count,
            vec!["ERRORS_WITH_PROPOSALS".to_string()],
        );
    }

    match set.proposals.as_slice() {
        [] => Verdict::reject(ReasonCode::NoProposals, 0, Vec::new()),
        [only] => Verdict {
            decision: Decision::Accept,
            reason_code: ReasonCode::SingleActionableProposal,
            route: Some(Route::from(only)),
            proposal_count: 1,
            selected_proposal_index: Some(0),
            notes: Vec::new(),
        },
        many => Verdict::reject(
            ReasonCode::AmbiguousProposals,
            many.len(),
            vec![format!("PROPOSAL_COUNT:{}", many.len())],
        ),
    }
}
