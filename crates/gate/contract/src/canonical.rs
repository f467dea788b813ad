//! Canonical JSON.
//!
//! Documents are converted to `serde_json::Value` before encoding. The value
//! map is ordered, so every object is written with sorted keys regardless of
//! struct field order. Decoding is strict: duplicate object keys are an
//! error instead of last-one-wins.

use crate::error::ContractError;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt;

const DUPLICATE_KEY: &str = "duplicate object key";

/// Compact, sorted-key encoding.
pub fn to_canonical_compact<T: Serialize>(doc: &T) -> Result<Vec<u8>, ContractError> {
    let value = serde_json::to_value(doc).map_err(|e| ContractError::Encoding(e.to_string()))?;
    serde_json::to_vec(&value).map_err(|e| ContractError::Encoding(e.to_string()))
}

/// Two-space pretty, sorted-key encoding with a trailing newline.
pub fn to_canonical_pretty<T: Serialize>(doc: &T) -> Result<Vec<u8>, ContractError> {
    let value = serde_json::to_value(doc).map_err(|e| ContractError::Encoding(e.to_string()))?;
    let mut bytes =
        serde_json::to_vec_pretty(&value).map_err(|e| ContractError::Encoding(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Why untrusted bytes could not be decoded into a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is empty")]
    Empty,
    #[error("payload is not valid UTF-8")]
    NotUtf8,
    #[error("payload is truncated")]
    Truncated,
    #[error("payload repeats an object key")]
    DuplicateKey,
    #[error("payload is not valid JSON")]
    NotJson,
}

impl DecodeError {
    /// Stable violation code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            DecodeError::Empty => "PAYLOAD_EMPTY",
            DecodeError::NotUtf8 => "PAYLOAD_NOT_UTF8",
            DecodeError::Truncated => "PAYLOAD_TRUNCATED",
            DecodeError::DuplicateKey => "PAYLOAD_DUPLICATE_KEY",
            DecodeError::NotJson => "PAYLOAD_NOT_JSON",
        }
    }
}

/// Decode untrusted bytes into a JSON value, rejecting duplicate keys.
pub fn decode_strict(bytes: &[u8]) -> Result<Value, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::NotUtf8)?;
    if text.trim().is_empty() {
        return Err(DecodeError::Empty);
    }
    match serde_json::from_str::<StrictValue>(text) {
        Ok(StrictValue(value)) => Ok(value),
        Err(e) => Err(match e.classify() {
            serde_json::error::Category::Eof => DecodeError::Truncated,
            serde_json::error::Category::Data if e.to_string().contains(DUPLICATE_KEY) => {
                DecodeError::DuplicateKey
            }
            _ => DecodeError::NotJson,
        }),
    }
}

struct StrictValue(Value);

impl<'de> Deserialize<'de> for StrictValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(StrictVisitor).map(StrictValue)
    }
}

struct StrictVisitor;

impl<'de> Visitor<'de> for StrictVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Number::from_f64(v)
            .map(Value::Number)
            .ok_or_else(|| E::custom("non-finite number"))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(StrictValue(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut object = Map::new();
        while let Some(key) = map.next_key::<String>()? {
            if object.contains_key(&key) {
                return Err(de::Error::custom(DUPLICATE_KEY));
            }
            let StrictValue(value) = map.next_value()?;
            object.insert(key, value);
        }
        Ok(Value::Object(object))
    }
}
