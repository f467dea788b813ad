use crate::error::ContractError;
use crate::hash::ContentHash;
use crate::vocab::MAX_RUN_ID_CHARS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DERIVATION_SALT: &[u8] = b"routegate.run_id.v1";

/// Run identifier: `[A-Za-z0-9._-]{1,64}`, never `.` and never containing `..`.
///
/// A run_id only namespaces on-disk locations. It is never an input to a
/// decision and is excluded from every content hash.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(String);

impl RunId {
    pub fn parse(value: &str) -> Result<Self, ContractError> {
        let reject = |reason| ContractError::InvalidRunId {
            value: value.chars().take(80).collect(),
            reason,
        };
        if value.is_empty() {
            return Err(reject("empty"));
        }
        if value.chars().count() > MAX_RUN_ID_CHARS {
            return Err(reject("longer than 64 characters"));
        }
        if !value.bytes().all(is_run_id_byte) {
            return Err(reject("disallowed character (allowed: A-Z a-z 0-9 . _ -)"));
        }
        if value == "." {
            return Err(reject("reserved path component"));
        }
        if value.contains("..") {
            return Err(reject("contains `..`"));
        }
        Ok(Self(value.to_string()))
    }

    /// Deterministic run_id for callers that do not supply one:
    /// `run_` followed by 12 hex characters of a salted hash of the input.
    pub fn derive_from_input(input: &[u8]) -> Self {
        let digest = ContentHash::hash_parts(&[DERIVATION_SALT, input]).to_hex();
        Self(format!("run_{}", &digest[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether `text` satisfies the run_id rules.
pub fn is_valid_run_id(text: &str) -> bool {
    RunId::parse(text).is_ok()
}

fn is_run_id_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-')
}

impl FromStr for RunId {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RunId({})", self.0)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for RunId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RunId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        RunId::parse(&text).map_err(serde::de::Error::custom)
    }
}
