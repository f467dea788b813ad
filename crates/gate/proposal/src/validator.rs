//! Proposal contract validation.
//!
//! Untrusted bytes go through [`validate_bytes`]: strict JSON decoding, the
//! closed [`PROPOSAL_SET_SCHEMA`], then the per-intent slot rules. Every
//! failure, including bytes that are not JSON at all, comes back as
//! [`ValidationResult::Invalid`] with bounded error codes.

use crate::model::ProposalSet;
use routegate_contract::vocab::{
    MAX_ERRORS, MAX_ERROR_CHARS, MAX_INPUT_CHARS, MAX_PROPOSALS, PROPOSAL_SCHEMA_VERSION,
};
use routegate_contract::{
    decode_strict, Field, Intent, Mode, ModeRule, ProposalKind, Schema, Target, TextRule,
    TextShape, Violations,
};
use serde_json::Value;

const SLOTS: Schema = Schema::Object(&[
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

const PROPOSAL: Schema = Schema::Object(&[
    Field {
        name: "kind",
        required: true,
        schema: Schema::OneOf(ProposalKind::WIRE),
    },
    Field {
        name: "payload",
        required: true,
        schema: Schema::Object(&[
            Field {
                name: "intent",
                required: true,
                schema: Schema::OneOf(Intent::WIRE),
            },
            Field {
                name: "slots",
                required: true,
                schema: SLOTS,
            },
        ]),
    },
]);

const ERROR_ENTRY: Schema = Schema::Text(TextRule {
    max_chars: MAX_ERROR_CHARS,
    shape: TextShape::Any,
});

/// Closed schema of the proposal wire format.
pub const PROPOSAL_SET_SCHEMA: Schema = Schema::Object(&[
    Field {
        name: "schema_version",
        required: true,
        schema: Schema::Exact(PROPOSAL_SCHEMA_VERSION),
    },
    Field {
        name: "input",
        required: true,
        schema: Schema::Object(&[Field {
            name: "raw",
            required: true,
            schema: Schema::Text(TextRule {
                max_chars: MAX_INPUT_CHARS,
                shape: TextShape::Any,
            }),
        }]),
    },
    Field {
        name: "proposals",
        required: true,
        schema: Schema::Array {
            max_items: MAX_PROPOSALS,
            items: &PROPOSAL,
        },
    },
    Field {
        name: "errors",
        required: false,
        schema: Schema::Array {
            max_items: MAX_ERRORS,
            items: &ERROR_ENTRY,
        },
    },
]);

/// Outcome of validating a proposal payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationResult {
    Valid(ProposalSet),
    /// `proposal_count` is the length of the payload's `proposals` array,
    /// capped at [`MAX_PROPOSALS`], or 0 when there is no such array.
    Invalid {
        errors: Vec<String>,
        proposal_count: usize,
    },
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn errors(&self) -> &[String] {
        match self {
            Self::Valid(_) => &[],
            Self::Invalid { errors, .. } => errors,
        }
    }

    fn invalid(code: &str, proposal_count: usize) -> Self {
        Self::Invalid {
            errors: vec![code.to_string()],
            proposal_count,
        }
    }
}

/// Validate untrusted payload bytes.
pub fn validate_bytes(bytes: &[u8]) -> ValidationResult {
    match decode_strict(bytes) {
        Ok(value) => validate_value(&value),
        Err(e) => ValidationResult::invalid(e.code(), 0),
    }
}

/// Validate an already-decoded payload.
pub fn validate_value(value: &Value) -> ValidationResult {
    let proposal_count = value
        .get("proposals")
        .and_then(Value::as_array)
        .map_or(0, |proposals| proposals.len().min(MAX_PROPOSALS));

    let violations = PROPOSAL_SET_SCHEMA.check(value);
    if !violations.is_empty() {
        return ValidationResult::Invalid {
            errors: violations.into_codes(),
            proposal_count,
        };
    }

    let set: ProposalSet = match serde_json::from_value(value.clone()) {
        Ok(set) => set,
        Err(_) => return ValidationResult::invalid("PAYLOAD_TYPE_MISMATCH", proposal_count),
    };

    let violations = check_slot_rules(&set);
    if violations.is_empty() {
        ValidationResult::Valid(set)
    } else {
        ValidationResult::Invalid {
            errors: violations.into_codes(),
            proposal_count,
        }
    }
}

fn check_slot_rules(set: &ProposalSet) -> Violations {
    let mut out = Violations::new();
    for (i, proposal) in set.proposals.iter().enumerate() {
        let has_mode = proposal.payload.slots.mode.is_some();
        match (proposal.payload.intent.mode_rule(), has_mode) {
            (ModeRule::Required, false) => {
                out.push(format!("SLOT_REQUIRED:$.proposals[{i}].payload.slots.mode"))
            }
            (ModeRule::Forbidden, true) => {
                out.push(format!("SLOT_FORBIDDEN:$.proposals[{i}].payload.slots.mode"))
            }
            _ => {}
        }
    }
    out
}
