use crate::error::ObserveError;
use crate::leak;
use routegate_contract::{decode_strict, to_canonical_compact, ContentHash, ContractError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Pipeline stage a trace record describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Propose,
    Build,
    Gate,
    Execute,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Propose => "PROPOSE",
            Stage::Build => "BUILD",
            Stage::Gate => "GATE",
            Stage::Execute => "EXECUTE",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a stage ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    Ok,
    /// The gate refused the run.
    Reject,
    /// The stage was not reached because an earlier stage closed the run.
    Skip,
    Fail,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageStatus::Ok => "OK",
            StageStatus::Reject => "REJECT",
            StageStatus::Skip => "SKIP",
            StageStatus::Fail => "FAIL",
        };
        f.write_str(name)
    }
}

/// One line of `trace.jsonl`.
///
/// Records carry no run_id, path or time, only hashes, so two runs over the
/// same input produce byte-identical traces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceRecord {
    pub seq: u64,
    pub stage: Stage,
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_hash: Option<ContentHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_hash: Option<ContentHash>,
    /// `record_hash` of the previous line; absent on the first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<ContentHash>,
    pub record_hash: ContentHash,
}

#[derive(Serialize)]
struct HashedRecord<'a> {
    seq: u64,
    stage: Stage,
    status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_hash: Option<&'a ContentHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_hash: Option<&'a ContentHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prev_hash: Option<&'a ContentHash>,
}

impl TraceRecord {
    fn seal(
        seq: u64,
        stage: Stage,
        status: StageStatus,
        input_hash: Option<ContentHash>,
        output_hash: Option<ContentHash>,
        prev_hash: Option<ContentHash>,
    ) -> Result<Self, ContractError> {
        let mut record = Self {
            seq,
            stage,
            status,
            input_hash,
            output_hash,
            prev_hash,
            record_hash: ContentHash::from_bytes([0; 32]),
        };
        record.record_hash = record.compute_hash()?;
        Ok(record)
    }

    /// Hash of the canonical encoding of every field except `record_hash`.
    pub fn compute_hash(&self) -> Result<ContentHash, ContractError> {
        let view = HashedRecord {
            seq: self.seq,
            stage: self.stage,
            status: self.status,
            input_hash: self.input_hash.as_ref(),
            output_hash: self.output_hash.as_ref(),
            prev_hash: self.prev_hash.as_ref(),
        };
        Ok(ContentHash::hash(&to_canonical_compact(&view)?))
    }

    pub fn verify_hash(&self) -> bool {
        matches!(self.compute_hash(), Ok(h) if h == self.record_hash)
    }
}

/// Append-only, hash-chained writer for one run's trace.
#[derive(Debug)]
pub struct TraceWriter {
    path: PathBuf,
    file: File,
    head: Option<ContentHash>,
    next_seq: u64,
}

impl TraceWriter {
    /// Create the trace file. An existing trace is never appended to.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, ObserveError> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(ObserveError::TraceExists(path.display().to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            file,
            head: None,
            next_seq: 0,
        })
    }

    /// Append one record and flush it to disk before returning.
    pub fn record(
        &mut self,
        stage: Stage,
        input_hash: Option<ContentHash>,
        output_hash: Option<ContentHash>,
        status: StageStatus,
    ) -> Result<TraceRecord, ObserveError> {
        let record = TraceRecord::seal(
            self.next_seq,
            stage,
            status,
            input_hash,
            output_hash,
            self.head,
        )?;
        let value = serde_json::to_value(&record)
            .map_err(|e| ContractError::Encoding(e.to_string()))?;
        leak::ensure_clean(&value)?;

        let mut line = to_canonical_compact(&value)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.flush()?;
        self.file.sync_data()?;

        debug!(seq = record.seq, stage = %stage, status = %status, "trace record appended");
        self.head = Some(record.record_hash);
        self.next_seq += 1;
        Ok(record)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn head_hash(&self) -> Option<&ContentHash> {
        self.head.as_ref()
    }

    pub fn record_count(&self) -> u64 {
        self.next_seq
    }

    /// Close the trace and return the hash of its full contents.
    pub fn finish(self) -> Result<ContentHash, ObserveError> {
        self.file.sync_all()?;
        drop(self.file);
        Ok(ContentHash::hash(&fs::read(&self.path)?))
    }
}

/// Result of checking a trace file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceVerification {
    pub valid: bool,
    pub total_records: usize,
    pub verified_records: usize,
    pub first_invalid_index: Option<usize>,
    pub error_message: Option<String>,
}

impl TraceVerification {
    fn broken(total: usize, index: usize, message: String) -> Self {
        Self {
            valid: false,
            total_records: total,
            verified_records: index,
            first_invalid_index: Some(index),
            error_message: Some(message),
        }
    }
}

/// Re-read a trace and check every record's hash, sequence and link.
pub fn verify_trace(path: &Path) -> Result<TraceVerification, ObserveError> {
    let text = fs::read_to_string(path)?;
    let lines: Vec<&str> = text.lines().collect();
    let total = lines.len();
    let mut prev: Option<ContentHash> = None;

    for (i, line) in lines.iter().enumerate() {
        let record = match parse_record(i, line) {
            Ok(record) => record,
            Err(e) => return Ok(TraceVerification::broken(total, i, e.to_string())),
        };
        if record.seq != i as u64 {
            return Ok(TraceVerification::broken(
                total,
                i,
                format!("record {} has seq {}", i, record.seq),
            ));
        }
        if !record.verify_hash() {
            return Ok(TraceVerification::broken(
                total,
                i,
                format!("record {} has invalid hash", i),
            ));
        }
        if record.prev_hash != prev {
            return Ok(TraceVerification::broken(
                total,
                i,
                format!("record {} has broken chain link", i),
            ));
        }
        prev = Some(record.record_hash);
    }

    Ok(TraceVerification {
        valid: true,
        total_records: total,
        verified_records: total,
        first_invalid_index: None,
        error_message: None,
    })
}

fn parse_record(index: usize, line: &str) -> Result<TraceRecord, ObserveError> {
    let value = decode_strict(line.as_bytes()).map_err(|e| ObserveError::MalformedRecord {
        index,
        message: e.code().to_string(),
    })?;
    serde_json::from_value(value).map_err(|e| ObserveError::MalformedRecord {
        index,
        message: e.to_string(),
    })
}
