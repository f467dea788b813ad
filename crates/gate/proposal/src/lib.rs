#![deny(unsafe_code)]
//! # routegate-proposal
//!
//! Non-authoritative proposal generation and the validator that guards the
//! proposal contract.
//!
//! A [`ProposalSet`] is a structural suggestion extracted from raw input by a
//! closed grammar. It carries no confidence, ranking or authority; the
//! decision belongs to the artifact builder downstream.
//!
//! ## Key Types
//!
//! - [`generate`]: pure, total function from [`RawInput`] to [`ProposalSet`]
//! - [`validate_bytes`] / [`validate_value`]: closed-schema validation
//!   returning [`ValidationResult`]
//! - [`grammar::RULES`]: the phrase table the generator matches against

pub mod generator;
pub mod grammar;
pub mod model;
pub mod validator;

pub use generator::generate;
pub use model::{InputEcho, Proposal, ProposalSet, RawInput, RoutePayload, Slots};
pub use validator::{validate_bytes, validate_value, ValidationResult, PROPOSAL_SET_SCHEMA};
