//! Scans for values that would make an observability document depend on
//! where or when it was written.

use crate::error::ObserveError;
use routegate_contract::path::looks_absolute;
use serde_json::Value;

/// Keys that only ever carry wall-clock data. Matched exactly, case-insensitively.
const TIMESTAMP_KEYS: &[&str] = &[
    "timestamp",
    "created_at",
    "modified_at",
    "updated_at",
    "created_time",
    "modified_time",
    "start_time",
    "end_time",
    "datetime",
    "date_time",
    "wall_clock",
    "epoch",
];

/// `#` stands for one ASCII digit.
const ISO_DATETIME: &[u8] = b"####-##-##T##:##:##";
const COMPACT_RUN_STAMP: &[u8] = b"run_########T######Z";

const EPOCH_LOW: i64 = 1_000_000_000;
const EPOCH_HIGH: i64 = 4_000_000_000;

/// Every leak found in `value`, as `KIND:$.path` codes.
pub fn scan(value: &Value) -> Vec<String> {
    let mut findings = Vec::new();
    scan_into(value, "$", &mut findings);
    findings
}

/// Fail with [`ObserveError::Leak`] if `value` holds anything [`scan`] flags.
pub fn ensure_clean(value: &Value) -> Result<(), ObserveError> {
    let findings = scan(value);
    if findings.is_empty() {
        Ok(())
    } else {
        Err(ObserveError::Leak { findings })
    }
}

/// True for strings embedding an ISO-8601 datetime or a compact
/// `run_YYYYMMDDTHHMMSSZ` stamp.
pub fn looks_like_timestamp(text: &str) -> bool {
    contains_shape(text.as_bytes(), ISO_DATETIME) || contains_shape(text.as_bytes(), COMPACT_RUN_STAMP)
}

fn scan_into(value: &Value, path: &str, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = format!("{path}.{key}");
                if TIMESTAMP_KEYS.iter().any(|k| key.eq_ignore_ascii_case(k)) {
                    out.push(format!("TIMESTAMP_KEY:{child_path}"));
                }
                scan_into(child, &child_path, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                scan_into(child, &format!("{path}[{i}]"), out);
            }
        }
        Value::String(text) => {
            if looks_absolute(text) {
                out.push(format!("ABSOLUTE_PATH:{path}"));
            }
            if looks_like_timestamp(text) {
                out.push(format!("TIMESTAMP_VALUE:{path}"));
            }
        }
        Value::Number(n) => {
            let epoch_like = match (n.as_i64(), n.as_u64()) {
                (Some(v), _) => v > EPOCH_LOW && v < EPOCH_HIGH,
                (None, Some(v)) => v > EPOCH_LOW as u64 && v < EPOCH_HIGH as u64,
                _ => false,
            };
            if epoch_like {
                out.push(format!("EPOCH_LIKE_INTEGER:{path}"));
            }
        }
        Value::Bool(_) | Value::Null => {}
    }
}

fn contains_shape(text: &[u8], shape: &[u8]) -> bool {
    text.windows(shape.len()).any(|window| {
        window.iter().zip(shape).all(|(&byte, &want)| match want {
            b'#' => byte.is_ascii_digit(),
            _ => byte == want,
        })
    })
}
