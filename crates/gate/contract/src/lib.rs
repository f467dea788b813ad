#![deny(unsafe_code)]
//! # routegate-contract
//!
//! The closed contract every routegate stage agrees on.
//!
//! Nothing in this crate performs a decision. It defines what a well-formed
//! document looks like and gives each later stage the same primitives for
//! checking it:
//!
//! - [`vocab`]: closed enumerations (intents, targets, modes, decisions,
//!   reason codes) and the numeric bounds of every document.
//! - [`schema`]: a declarative closed-schema description and the single walker
//!   that checks a `serde_json::Value` against it.
//! - [`canonical`]: sorted-key JSON encoding and strict decoding that rejects
//!   duplicate keys.
//! - [`ContentHash`]: SHA-256 content addressing.
//! - [`RunId`] and [`RepoRelativePath`]: the two identifiers that become
//!   filesystem paths, validated before they touch the disk.
//! - [`store::write_once`]: the create-exclusive write every persisted
//!   document goes through.

pub mod canonical;
pub mod error;
pub mod hash;
pub mod path;
pub mod run_id;
pub mod schema;
pub mod store;
pub mod vocab;

pub use canonical::{decode_strict, to_canonical_compact, to_canonical_pretty, DecodeError};
pub use error::ContractError;
pub use hash::{ContentHash, ContentHashError};
pub use path::RepoRelativePath;
pub use run_id::RunId;
pub use schema::{Field, Schema, TextRule, TextShape, Violations};
pub use store::{write_once, WriteOutcome};
pub use vocab::{Decision, Intent, Mode, ModeRule, ProposalKind, ReasonCode, Target};
