use crate::error::ContractError;
use crate::vocab::MAX_REF_CHARS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A path relative to the repository root, lexically normalized, using `/`
/// separators and never escaping the root.
///
/// Parsing is purely lexical. Use [`RepoRelativePath::from_path_within`] to
/// turn an on-disk path into a reference after resolving symlinks.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepoRelativePath(String);

impl RepoRelativePath {
    pub fn parse(text: &str) -> Result<Self, ContractError> {
        let reject = |reason: &str| ContractError::PathSafety {
            reason: reason.to_string(),
        };
        if text.is_empty() {
            return Err(reject("empty path"));
        }
        if text.chars().count() > MAX_REF_CHARS {
            return Err(reject("longer than 512 characters"));
        }
        if text.contains('\0') {
            return Err(reject("contains NUL"));
        }
        if text.starts_with('/') {
            return Err(reject("absolute path"));
        }
        if text.starts_with("\\\\") {
            return Err(reject("UNC path"));
        }
        if has_drive_prefix(text) {
            return Err(reject("drive-qualified path"));
        }
        if text.contains('\\') {
            return Err(reject("backslash separator"));
        }

        let mut parts: Vec<&str> = Vec::new();
        for segment in text.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if parts.pop().is_none() {
                        return Err(reject("escapes repository root"));
                    }
                }
                other => parts.push(other),
            }
        }
        if parts.is_empty() {
            return Err(reject("refers to the repository root itself"));
        }
        let normalized = parts.join("/");
        if has_drive_prefix(&normalized) {
            return Err(reject("drive-qualified path"));
        }
        Ok(Self(normalized))
    }

    /// Resolve `path` on disk and express it relative to `root`.
    ///
    /// Both paths are canonicalized first, so symlinks pointing outside the
    /// root are caught. `path` must exist.
    pub fn from_path_within(root: &Path, path: &Path) -> Result<Self, ContractError> {
        let root = root.canonicalize()?;
        let resolved = path.canonicalize()?;
        let relative = resolved
            .strip_prefix(&root)
            .map_err(|_| ContractError::PathSafety {
                reason: "resolves outside the repository root".to_string(),
            })?;

        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => match part.to_str() {
                    Some(s) => parts.push(s.to_string()),
                    None => {
                        return Err(ContractError::PathSafety {
                            reason: "path is not valid UTF-8".to_string(),
                        })
                    }
                },
                _ => {
                    return Err(ContractError::PathSafety {
                        reason: "unexpected path component".to_string(),
                    })
                }
            }
        }
        Self::parse(&parts.join("/"))
    }

    /// Join onto a root directory.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// True for `C:` style prefixes.
pub fn has_drive_prefix(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// True when `text` looks like an absolute path on any common platform.
pub fn looks_absolute(text: &str) -> bool {
    text.starts_with('/') || text.starts_with("\\\\") || has_drive_prefix(text)
}

impl fmt::Debug for RepoRelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RepoRelativePath({})", self.0)
    }
}

impl fmt::Display for RepoRelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for RepoRelativePath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RepoRelativePath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        RepoRelativePath::parse(&text).map_err(serde::de::Error::custom)
    }
}
