use crate::grammar::RULES;
use crate::model::{Proposal, ProposalSet, RawInput};
use crate::validator::{validate_value, ValidationResult};
use routegate_contract::schema::truncate_chars;
use routegate_contract::vocab::{MAX_INPUT_CHARS, MAX_PROPOSALS};
use tracing::{debug, warn};

/// Generate the proposal set for one raw input.
///
/// Pure and total: the same input always yields the same set, and every
/// input, including empty, overlong or undecodable text, yields a valid set.
/// Checks run in a fixed order: decode failure, length, emptiness, line
/// breaks, then grammar matching.
pub fn generate(input: &RawInput) -> ProposalSet {
    let set = build(input);
    match serde_json::to_value(&set).map(|value| validate_value(&value)) {
        Ok(ValidationResult::Valid(_)) => set,
        Ok(ValidationResult::Invalid { errors, .. }) => {
            warn!(errors = ?errors, "generated proposal set failed its own validation");
            ProposalSet::new("").with_error("GENERATOR_SELF_CHECK_FAILED")
        }
        Err(e) => {
            warn!(error = %e, "generated proposal set could not be encoded");
            ProposalSet::new("").with_error("GENERATOR_SELF_CHECK_FAILED")
        }
    }
}

fn build(input: &RawInput) -> ProposalSet {
    if let Some(code) = input.decode_error() {
        return ProposalSet::new("").with_error(code);
    }

    let raw = input.as_str();
    if raw.chars().count() > MAX_INPUT_CHARS {
        debug!(max = MAX_INPUT_CHARS, "input exceeds length bound");
        return ProposalSet::new(truncate_chars(raw, MAX_INPUT_CHARS)).with_error("INPUT_TOO_LONG");
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ProposalSet::new(raw);
    }
    if trimmed.contains(['\n', '\r']) {
        return ProposalSet::new(raw).with_error("INPUT_NOT_SINGLE_LINE");
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();
    let mut proposals: Vec<Proposal> = Vec::new();
    for rule in RULES {
        if proposals.len() == MAX_PROPOSALS {
            break;
        }
        if let Some(proposal) = rule.matches(&words) {
            if !proposals.contains(&proposal) {
                proposals.push(proposal);
            }
        }
    }
    debug!(proposal_count = proposals.len(), "grammar matched");
    ProposalSet::new(raw).with_proposals(proposals)
}
