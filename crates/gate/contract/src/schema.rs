//! Declarative closed schemas.
//!
//! A document contract is written once as a tree of [`Schema`] nodes and
//! checked by [`Schema::check`]. Objects are closed: every field not listed is
//! a violation. Violation codes are built only from schema field names, array
//! indices and bounds, so untrusted values are never echoed back.
//!
//! Schemas are `const` items built from literals only, so nested `&` borrows
//! are promoted to `'static`.

use crate::hash::is_sha256_hex;
use crate::path::RepoRelativePath;
use crate::run_id::is_valid_run_id;
use crate::vocab::{MAX_ERRORS, MAX_ERROR_CHARS};
use serde_json::Value;

/// One node of a closed schema.
#[derive(Debug)]
pub enum Schema {
    Object(&'static [Field]),
    Array {
        max_items: usize,
        items: &'static Schema,
    },
    Text(TextRule),
    /// String drawn from a closed set.
    OneOf(&'static [&'static str]),
    /// String that must equal exactly this value.
    Exact(&'static str),
    /// Non-negative integer no larger than `max`.
    Count { max: u64 },
    Nullable(&'static Schema),
}

#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub required: bool,
    pub schema: Schema,
}

#[derive(Debug, Clone, Copy)]
pub struct TextRule {
    pub max_chars: usize,
    pub shape: TextShape,
}

/// Additional lexical constraint on a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextShape {
    Any,
    RunId,
    Sha256Hex,
    RepoRelative,
    /// Upper-case token: `[A-Z0-9_:]+`.
    Token,
}

impl TextShape {
    fn name(&self) -> &'static str {
        match self {
            TextShape::Any => "any",
            TextShape::RunId => "run_id",
            TextShape::Sha256Hex => "sha256_hex",
            TextShape::RepoRelative => "repo_relative_path",
            TextShape::Token => "token",
        }
    }

    fn admits(&self, text: &str) -> bool {
        match self {
            TextShape::Any => true,
            TextShape::RunId => is_valid_run_id(text),
            TextShape::Sha256Hex => is_sha256_hex(text),
            TextShape::RepoRelative => RepoRelativePath::parse(text).is_ok(),
            TextShape::Token => {
                !text.is_empty()
                    && text
                        .bytes()
                        .all(|b| matches!(b, b'A'..=b'Z' | b'0'..=b'9' | b'_' | b':'))
            }
        }
    }
}

/// Bounded collection of violation codes.
///
/// Holds at most [`MAX_ERRORS`] entries, each at most [`MAX_ERROR_CHARS`]
/// characters. A push beyond the limit replaces the last slot with
/// `ERROR_LIMIT_REACHED`; later pushes are dropped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Violations {
    codes: Vec<String>,
    saturated: bool,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, code: impl Into<String>) {
        if self.saturated {
            return;
        }
        if self.codes.len() < MAX_ERRORS {
            let code: String = code.into();
            self.codes.push(truncate_chars(&code, MAX_ERROR_CHARS));
            return;
        }
        if let Some(last) = self.codes.last_mut() {
            *last = "ERROR_LIMIT_REACHED".to_string();
        }
        self.saturated = true;
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn into_codes(self) -> Vec<String> {
        self.codes
    }
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

impl Schema {
    /// Check `value` against this schema, rooted at `$`.
    pub fn check(&self, value: &Value) -> Violations {
        let mut out = Violations::new();
        self.check_into(value, "$", &mut out);
        out
    }

    /// Check `value` at `path`, appending to `out`.
    pub fn check_into(&self, value: &Value, path: &str, out: &mut Violations) {
        match self {
            Schema::Object(fields) => check_object(fields, value, path, out),
            Schema::Array { max_items, items } => {
                let Some(elements) = value.as_array() else {
                    out.push(format!("TYPE_MISMATCH:{path}:expected=array"));
                    return;
                };
                if elements.len() > *max_items {
                    out.push(format!("TOO_MANY_ITEMS:{path}:max={max_items}"));
                    return;
                }
                for (i, element) in elements.iter().enumerate() {
                    items.check_into(element, &format!("{path}[{i}]"), out);
                }
            }
            Schema::Text(rule) => {
                let Some(text) = value.as_str() else {
                    out.push(format!("TYPE_MISMATCH:{path}:expected=string"));
                    return;
                };
                if text.chars().count() > rule.max_chars {
                    out.push(format!("TEXT_TOO_LONG:{path}:max={}", rule.max_chars));
                } else if !rule.shape.admits(text) {
                    out.push(format!("INVALID_FORMAT:{path}:format={}", rule.shape.name()));
                }
            }
            Schema::OneOf(allowed) => match value.as_str() {
                Some(text) if allowed.iter().any(|a| *a == text) => {}
                Some(_) => out.push(format!("INVALID_VALUE:{path}")),
                None => out.push(format!("TYPE_MISMATCH:{path}:expected=string")),
            },
            Schema::Exact(expected) => match value.as_str() {
                Some(text) if text == *expected => {}
                _ => out.push(format!("EXPECTED_CONSTANT:{path}:expected={expected}")),
            },
            Schema::Count { max } => match value.as_u64() {
                Some(n) if n <= *max => {}
                Some(_) => out.push(format!("INTEGER_OUT_OF_RANGE:{path}:max={max}")),
                None => out.push(format!("TYPE_MISMATCH:{path}:expected=integer")),
            },
            Schema::Nullable(inner) => {
                if !value.is_null() {
                    inner.check_into(value, path, out);
                }
            }
        }
    }
}

fn check_object(fields: &[Field], value: &Value, path: &str, out: &mut Violations) {
    let Some(object) = value.as_object() else {
        out.push(format!("TYPE_MISMATCH:{path}:expected=object"));
        return;
    };

    let unexpected = object
        .keys()
        .filter(|key| !fields.iter().any(|f| f.name == key.as_str()))
        .count();
    if unexpected > 0 {
        out.push(format!("UNEXPECTED_FIELDS:{path}:count={unexpected}"));
    }

    for field in fields {
        let field_path = format!("{path}.{}", field.name);
        match object.get(field.name) {
            Some(child) => field.schema.check_into(child, &field_path, out),
            None if field.required => out.push(format!("MISSING_REQUIRED_FIELD:{field_path}")),
            None => {}
        }
    }
}
