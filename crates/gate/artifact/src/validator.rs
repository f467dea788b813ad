//! Verification of persisted artifacts.
//!
//! An artifact read back from disk is untrusted until it passes, in order:
//! strict decoding, the closed [`ARTIFACT_SCHEMA`], decision consistency,
//! the content hash, and re-derivation of the decision from the embedded
//! proposal set.

use crate::error::ArtifactViolation;
use crate::model::DecisionArtifact;
use crate::ruleset::decide;
use routegate_contract::vocab::{
    ARTIFACT_SCHEMA_VERSION, MAX_ERRORS, MAX_ERROR_CHARS, MAX_NOTES, MAX_NOTE_CHARS,
    MAX_PROPOSALS, MAX_REF_CHARS, MAX_RUN_ID_CHARS, RULESET_ID,
};
use routegate_contract::{
    decode_strict, Decision, Field, Intent, Mode, ReasonCode, Schema, Target, TextRule, TextShape,
};
use routegate_proposal::{validate_value, PROPOSAL_SET_SCHEMA};

const ROUTE: Schema = Schema::Object(&[
    Field {
        name: "intent",
        required: true,
        schema: Schema::OneOf(Intent::WIRE),
    },
    Field {
        name: "target",
        required: true,
        schema: Schema::OneOf(Target::WIRE),
    },
    Field {
        name: "mode",
        required: false,
        schema: Schema::OneOf(Mode::WIRE),
    },
]);

const SHA256: Schema = Schema::Text(TextRule {
    max_chars: 64,
    shape: TextShape::Sha256Hex,
});

const INDEX: Schema = Schema::Count {
    max: (MAX_PROPOSALS - 1) as u64,
};

const VALIDATOR_ERROR: Schema = Schema::Text(TextRule {
    max_chars: MAX_ERROR_CHARS,
    shape: TextShape::Any,
});

const NOTE: Schema = Schema::Text(TextRule {
    max_chars: MAX_NOTE_CHARS,
    shape: TextShape::Token,
});

const CONSTRUCTION: Schema = Schema::Object(&[
    Field {
        name: "proposal_count",
        required: true,
        schema: Schema::Count {
            max: MAX_PROPOSALS as u64,
        },
    },
    Field {
        name: "selected_proposal_index",
        required: true,
        schema: Schema::Nullable(&INDEX),
    },
    Field {
        name: "validator_errors",
        required: true,
        schema: Schema::Array {
            max_items: MAX_ERRORS,
            items: &VALIDATOR_ERROR,
        },
    },
    Field {
        name: "notes",
        required: true,
        schema: Schema::Array {
            max_items: MAX_NOTES,
            items: &NOTE,
        },
    },
]);

/// Closed schema of a persisted decision artifact.
pub const ARTIFACT_SCHEMA: Schema = Schema::Object(&[
    Field {
        name: "schema_version",
        required: true,
        schema: Schema::Exact(ARTIFACT_SCHEMA_VERSION),
    },
    Field {
        name: "ruleset_id",
        required: true,
        schema: Schema::Exact(RULESET_ID),
    },
    Field {
        name: "run_id",
        required: true,
        schema: Schema::Text(TextRule {
            max_chars: MAX_RUN_ID_CHARS,
            shape: TextShape::RunId,
        }),
    },
    Field {
        name: "input_ref",
        required: true,
        schema: Schema::Text(TextRule {
            max_chars: MAX_REF_CHARS,
            shape: TextShape::RepoRelative,
        }),
    },
    Field {
        name: "decision",
        required: true,
        schema: Schema::OneOf(Decision::WIRE),
    },
    Field {
        name: "reason_code",
        required: true,
        schema: Schema::OneOf(ReasonCode::WIRE),
    },
    Field {
        name: "route",
        required: true,
        schema: Schema::Nullable(&ROUTE),
    },
    Field {
        name: "proposal_set",
        required: true,
        schema: Schema::Nullable(&PROPOSAL_SET_SCHEMA),
    },
    Field {
        name: "proposal_set_sha256",
        required: true,
        schema: SHA256,
    },
    Field {
        name: "construction",
        required: true,
        schema: CONSTRUCTION,
    },
    Field {
        name: "content_hash",
        required: true,
        schema: SHA256,
    },
]);

/// Decode and fully verify artifact bytes.
pub fn verify_artifact_bytes(bytes: &[u8]) -> Result<DecisionArtifact, ArtifactViolation> {
    let value = decode_strict(bytes).map_err(|e| ArtifactViolation::single(e.code()))?;

    let violations = ARTIFACT_SCHEMA.check(&value);
    if !violations.is_empty() {
        return Err(ArtifactViolation::new(violations.into_codes()));
    }

    let artifact: DecisionArtifact = serde_json::from_value(value)
        .map_err(|_| ArtifactViolation::single("ARTIFACT_TYPE_MISMATCH"))?;

    let mut codes = consistency_violations(&artifact);
    if !artifact.verify_hash() {
        codes.push("CONTENT_HASH_MISMATCH".to_string());
    }
    if codes.is_empty() && !rederives(&artifact) {
        codes.push("DECISION_NOT_REDERIVABLE".to_string());
    }

    if codes.is_empty() {
        Ok(artifact)
    } else {
        Err(ArtifactViolation::new(codes))
    }
}

fn consistency_violations(artifact: &DecisionArtifact) -> Vec<String> {
    let mut codes = Vec::new();
    let accept = artifact.decision == Decision::Accept;
    if artifact.reason_code.decision() != artifact.decision {
        codes.push("REASON_DECISION_MISMATCH".to_string());
    }
    if accept != artifact.route.is_some() {
        codes.push("ROUTE_PRESENCE_MISMATCH".to_string());
    }
    if accept != artifact.construction.selected_proposal_index.is_some() {
        codes.push("SELECTION_PRESENCE_MISMATCH".to_string());
    }
    if accept && artifact.proposal_set.is_none() {
        codes.push("ACCEPT_WITHOUT_PROPOSALS".to_string());
    }
    codes
}

/// Apply the ruleset to the embedded proposal set and compare.
fn rederives(artifact: &DecisionArtifact) -> bool {
    let Some(set) = &artifact.proposal_set else {
        return artifact.reason_code == ReasonCode::InvalidProposals
            && !artifact.construction.validator_errors.is_empty();
    };
    let Ok(value) = serde_json::to_value(set) else {
        return false;
    };
    let verdict = decide(&validate_value(&value));
    verdict.decision == artifact.decision
        && verdict.reason_code == artifact.reason_code
        && verdict.route == artifact.route
        && verdict.proposal_count == artifact.construction.proposal_count
        && verdict.selected_proposal_index == artifact.construction.selected_proposal_index
        && verdict.notes == artifact.construction.notes
        && artifact.construction.validator_errors.is_empty()
}
