use crate::error::ExecutionError;
use routegate_contract::ContentHash;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Bytes and status returned by one engine run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawOutput {
    /// The authoritative output, untouched.
    pub stdout: Vec<u8>,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl RawOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// The opaque execution engine.
///
/// The gateway never builds command lines: it hands over the input path and
/// nothing else.
pub trait ExecutionCollaborator: Send + Sync {
    /// Pass/fail precondition checked before every invocation.
    fn verify_integrity(&self) -> Result<(), ExecutionError>;

    /// Run the engine once on `input`.
    fn invoke(&self, input: &Path) -> Result<RawOutput, ExecutionError>;
}

impl<T: ExecutionCollaborator + ?Sized> ExecutionCollaborator for Arc<T> {
    fn verify_integrity(&self) -> Result<(), ExecutionError> {
        (**self).verify_integrity()
    }

    fn invoke(&self, input: &Path) -> Result<RawOutput, ExecutionError> {
        (**self).invoke(input)
    }
}

/// Placeholder used until a real engine is configured. Always refuses.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredCollaborator;

impl ExecutionCollaborator for UnconfiguredCollaborator {
    fn verify_integrity(&self) -> Result<(), ExecutionError> {
        Err(ExecutionError::Unconfigured)
    }

    fn invoke(&self, _input: &Path) -> Result<RawOutput, ExecutionError> {
        Err(ExecutionError::Unconfigured)
    }
}

/// Runs the vendored engine binary as `<engine> <input-path>`.
#[derive(Debug, Clone)]
pub struct ProcessCollaborator {
    engine: PathBuf,
    expected_sha256: ContentHash,
    working_dir: Option<PathBuf>,
}

impl ProcessCollaborator {
    /// `expected_sha256` pins the exact engine binary allowed to run.
    pub fn new(engine: impl Into<PathBuf>, expected_sha256: ContentHash) -> Self {
        Self {
            engine: engine.into(),
            expected_sha256,
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn engine(&self) -> &Path {
        &self.engine
    }

    /// Hash the engine binary as it is on disk now.
    pub fn engine_sha256(&self) -> Result<ContentHash, ExecutionError> {
        match fs::read(&self.engine) {
            Ok(bytes) => Ok(ContentHash::hash(&bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ExecutionError::EngineMissing(
                self.engine.display().to_string(),
            )),
            Err(e) => Err(ExecutionError::Spawn(e.to_string())),
        }
    }
}

impl ExecutionCollaborator for ProcessCollaborator {
    fn verify_integrity(&self) -> Result<(), ExecutionError> {
        let computed = self.engine_sha256()?;
        if computed != self.expected_sha256 {
            return Err(ExecutionError::IntegrityMismatch {
                expected: self.expected_sha256,
                computed,
            });
        }
        Ok(())
    }

    fn invoke(&self, input: &Path) -> Result<RawOutput, ExecutionError> {
        let mut command = Command::new(&self.engine);
        command
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .map_err(|e| ExecutionError::Spawn(e.to_string()))?;
        debug!(
            exit_code = ?output.status.code(),
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "engine exited"
        );
        Ok(RawOutput {
            stdout: output.stdout,
            exit_code: output.status.code(),
        })
    }
}

/// In-process stand-in for the engine that records every call.
#[derive(Debug)]
pub struct SimulatedCollaborator {
    stdout: Vec<u8>,
    exit_code: i32,
    intact: bool,
    calls: Mutex<Vec<PathBuf>>,
}

impl SimulatedCollaborator {
    pub fn passing(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            exit_code: 0,
            intact: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(exit_code: i32) -> Self {
        Self {
            stdout: b"engine error\n".to_vec(),
            exit_code,
            intact: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// An engine whose integrity check fails.
    pub fn tampered() -> Self {
        Self {
            intact: false,
            ..Self::passing("")
        }
    }

    pub fn invocations(&self) -> Vec<PathBuf> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations().len()
    }
}

impl ExecutionCollaborator for SimulatedCollaborator {
    fn verify_integrity(&self) -> Result<(), ExecutionError> {
        if self.intact {
            Ok(())
        } else {
            Err(ExecutionError::IntegrityMismatch {
                expected: ContentHash::hash(b"pinned engine"),
                computed: ContentHash::hash(b"modified engine"),
            })
        }
    }

    fn invoke(&self, input: &Path) -> Result<RawOutput, ExecutionError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(input.to_path_buf());
        }
        Ok(RawOutput {
            stdout: self.stdout.clone(),
            exit_code: Some(self.exit_code),
        })
    }
}
