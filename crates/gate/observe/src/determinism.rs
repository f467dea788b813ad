use crate::error::DeterminismError;
use crate::layout::TIMING_FILE;
use routegate_contract::ContentHash;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

/// Every file one run produced, keyed by `/`-separated relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    items: BTreeMap<String, Vec<u8>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.items.insert(name.into(), bytes);
    }

    /// Read every regular file under `root`.
    pub fn capture_dir(root: &Path) -> io::Result<Self> {
        let mut snapshot = Self::new();
        walk(root, "", &mut snapshot)?;
        Ok(snapshot)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.items.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn walk(dir: &Path, prefix: &str, out: &mut Snapshot) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        let kind = entry.file_type()?;
        if kind.is_dir() {
            walk(&entry.path(), &relative, out)?;
        } else if kind.is_file() {
            out.insert(relative, fs::read(entry.path())?);
        }
    }
    Ok(())
}

/// Outcome of a passing determinism check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismReport {
    pub runs: usize,
    /// Hash of every compared item, identical across all runs.
    pub digests: BTreeMap<String, ContentHash>,
    /// Items present but left out of the comparison.
    pub excluded: Vec<String>,
}

/// Runs a producer repeatedly and requires byte-identical output.
///
/// Items whose final path segment is excluded are not compared. The
/// wall-clock timing sidecar is always excluded.
#[derive(Debug, Clone)]
pub struct DeterminismHarness {
    excluded: Vec<String>,
}

impl Default for DeterminismHarness {
    fn default() -> Self {
        Self {
            excluded: vec![TIMING_FILE.to_string()],
        }
    }
}

impl DeterminismHarness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn excluding(mut self, file_name: impl Into<String>) -> Self {
        self.excluded.push(file_name.into());
        self
    }

    fn is_excluded(&self, name: &str) -> bool {
        let last = name.rsplit('/').next().unwrap_or(name);
        self.excluded.iter().any(|e| e == last)
    }

    /// Call `produce(i)` for `i` in `0..runs` and compare every snapshot
    /// against run 0. Stops at the first divergence.
    pub fn verify<F, E>(&self, runs: usize, mut produce: F) -> Result<DeterminismReport, DeterminismError>
    where
        F: FnMut(usize) -> Result<Snapshot, E>,
        E: fmt::Display,
    {
        if runs < 2 {
            return Err(DeterminismError::TooFewRuns { requested: runs });
        }

        let baseline = self.produce_filtered(0, &mut produce)?;
        for run_index in 1..runs {
            let (snapshot, _) = self.produce_filtered(run_index, &mut produce)?;
            if let Err(e) = compare(&baseline.0, &snapshot, run_index) {
                warn!(error = %e, "determinism check failed");
                return Err(e);
            }
            debug!(run_index, "run matches baseline");
        }

        let (snapshot, excluded) = baseline;
        let digests: BTreeMap<String, ContentHash> = snapshot
            .items
            .iter()
            .map(|(name, bytes)| (name.clone(), ContentHash::hash(bytes)))
            .collect();
        info!(runs, items = digests.len(), "determinism verified");
        Ok(DeterminismReport {
            runs,
            digests,
            excluded,
        })
    }

    fn produce_filtered<F, E>(
        &self,
        run_index: usize,
        produce: &mut F,
    ) -> Result<(Snapshot, Vec<String>), DeterminismError>
    where
        F: FnMut(usize) -> Result<Snapshot, E>,
        E: fmt::Display,
    {
        let raw = produce(run_index).map_err(|e| DeterminismError::Produce {
            run_index,
            message: e.to_string(),
        })?;
        let mut kept = Snapshot::new();
        let mut excluded = Vec::new();
        for (name, bytes) in raw.items {
            if self.is_excluded(&name) {
                excluded.push(name);
            } else {
                kept.items.insert(name, bytes);
            }
        }
        Ok((kept, excluded))
    }
}

fn compare(baseline: &Snapshot, other: &Snapshot, run_index: usize) -> Result<(), DeterminismError> {
    for (name, expected) in &baseline.items {
        let Some(actual) = other.get(name) else {
            return Err(DeterminismError::MissingItem {
                run_index,
                item: name.clone(),
            });
        };
        if expected.as_slice() != actual {
            return Err(DeterminismError::Diverged {
                run_index,
                item: name.clone(),
                offset: first_difference(expected, actual),
            });
        }
    }
    if let Some(extra) = other.names().find(|n| !baseline.items.contains_key(*n)) {
        return Err(DeterminismError::UnexpectedItem {
            run_index,
            item: extra.to_string(),
        });
    }
    Ok(())
}

fn first_difference(a: &[u8], b: &[u8]) -> usize {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .unwrap_or_else(|| a.len().min(b.len()))
}
