use crate::error::ObserveError;
use crate::trace::Stage;
use chrono::{DateTime, Utc};
use routegate_contract::{to_canonical_pretty, write_once, WriteOutcome};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

/// Wall-clock time spent in one stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed_ms: u64,
}

/// The `timing.json` sidecar. It is never hashed, never referenced by the
/// manifest and never compared across runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTiming {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_ms: u64,
    pub stages: Vec<StageTiming>,
}

impl RunTiming {
    pub fn write(&self, path: &Path) -> Result<WriteOutcome, ObserveError> {
        Ok(write_once(path, &to_canonical_pretty(self)?)?)
    }
}

/// Collects per-stage durations for one run.
#[derive(Debug)]
pub struct Stopwatch {
    started_at: DateTime<Utc>,
    origin: Instant,
    last: Instant,
    stages: Vec<StageTiming>,
}

impl Stopwatch {
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            started_at: Utc::now(),
            origin: now,
            last: now,
            stages: Vec::new(),
        }
    }

    /// Close `stage`, charging it the time since the previous lap.
    pub fn lap(&mut self, stage: Stage) {
        let now = Instant::now();
        self.stages.push(StageTiming {
            stage,
            elapsed_ms: millis(now - self.last),
        });
        self.last = now;
    }

    pub fn finish(self) -> RunTiming {
        RunTiming {
            started_at: self.started_at,
            finished_at: Utc::now(),
            total_ms: millis(self.origin.elapsed()),
            stages: self.stages,
        }
    }
}

fn millis(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
