//! E2E test: the real process collaborator behind the gate.
//!
//! A shell script stands in for the vendored engine, pinned by hash.

#![cfg(unix)]

use routegate_contract::ContentHash;
use routegate_gateway::{ExecutionError, GatewayError, ProcessCollaborator};
use routegate_pipeline::{Pipeline, PipelineError};
use routegate_tests::{run_id, ScratchRepo};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Serializes tests that move the process working directory.
static CWD_LOCK: Mutex<()> = Mutex::new(());

/// Restores the previous working directory on drop.
struct CwdGuard {
    previous: PathBuf,
}

impl CwdGuard {
    fn enter(dir: &Path) -> Self {
        let previous = env::current_dir().unwrap();
        env::set_current_dir(dir).unwrap();
        Self { previous }
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.previous);
    }
}

/// `<argc>|<argv[1]>|<contents of argv[1]>`
const ECHO_ARGS_AND_CAT: &str = r#"printf '%s|%s|' "$#" "$1"; cat "$1""#;

// ---------------------------------------------------------------------------
// Tests: argument binding
// ---------------------------------------------------------------------------

#[test]
fn engine_receives_the_bound_input_as_its_only_argument() {
    let repo = ScratchRepo::new();
    let input = repo.input("beta.txt", "status of beta");
    let (engine, pin) = repo.shell_engine(ECHO_ARGS_AND_CAT);
    let collaborator = ProcessCollaborator::new(engine, pin).with_working_dir(repo.root());

    let report = Pipeline::new(repo.root(), repo.artifact_root(), collaborator)
        .run(&input, Some(run_id("p1")))
        .unwrap();

    let bound = repo.root().canonicalize().unwrap().join("inputs").join("beta.txt");
    let stdout = fs::read_to_string(&report.output.as_ref().unwrap().path).unwrap();
    assert_eq!(stdout, format!("1|{}|status of beta\n", bound.display()));
}

#[test]
fn relative_input_from_another_directory_runs_the_gated_file() {
    let _lock = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let repo = ScratchRepo::new();
    let sub = repo.root().join("sub");
    fs::create_dir_all(&sub).unwrap();
    fs::write(sub.join("a.txt"), "status of beta\n").unwrap();
    fs::write(repo.root().join("a.txt"), "stop gamma subsystem immediately\n").unwrap();
    let (engine, pin) = repo.shell_engine(ECHO_ARGS_AND_CAT);
    let collaborator = ProcessCollaborator::new(engine, pin).with_working_dir(repo.root());
    let pipeline = Pipeline::new(repo.root(), repo.artifact_root(), collaborator);

    let report = {
        let _cwd = CwdGuard::enter(&sub);
        pipeline.run(Path::new("a.txt"), Some(run_id("rel-1"))).unwrap()
    };

    let bound = repo.root().canonicalize().unwrap().join("sub").join("a.txt");
    let stdout = fs::read_to_string(&report.output.as_ref().unwrap().path).unwrap();
    assert_eq!(stdout, format!("1|{}|status of beta\n", bound.display()));
    assert!(!stdout.contains("gamma"));
}

// ---------------------------------------------------------------------------
// Tests: output and failures
// ---------------------------------------------------------------------------

#[test]
fn engine_output_is_kept_verbatim() {
    let repo = ScratchRepo::new();
    let input = repo.input("alpha.txt", "stop alpha subsystem immediately");
    let (engine, pin) = repo.shell_engine(r#"printf 'line one\r\n\tline two'"#);
    let collaborator = ProcessCollaborator::new(engine, pin);

    let report = Pipeline::new(repo.root(), repo.artifact_root(), collaborator)
        .run(&input, Some(run_id("p2")))
        .unwrap();

    let output = report.output.unwrap();
    assert_eq!(fs::read(&output.path).unwrap(), b"line one\r\n\tline two");
    assert_eq!(output.sha256, ContentHash::hash(b"line one\r\n\tline two"));
}

#[test]
fn modified_engine_is_never_started() {
    let repo = ScratchRepo::new();
    let input = repo.input("beta.txt", "status of beta");
    let marker = repo.root().join("started");
    let (engine, pin) = repo.shell_engine(&format!("touch '{}'", marker.display()));
    fs::write(&engine, "#!/bin/sh\necho replaced\n").unwrap();
    let collaborator = ProcessCollaborator::new(engine, pin);

    let err = Pipeline::new(repo.root(), repo.artifact_root(), collaborator)
        .run(&input, Some(run_id("p3")))
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Gateway(GatewayError::Execution(ExecutionError::IntegrityMismatch { .. }))
    ));
    assert!(!marker.exists());
}

#[test]
fn nonzero_exit_is_surfaced() {
    let repo = ScratchRepo::new();
    let input = repo.input("beta.txt", "status of beta");
    let (engine, pin) = repo.shell_engine("echo 'no route'; exit 7");
    let collaborator = ProcessCollaborator::new(engine, pin);

    let err = Pipeline::new(repo.root(), repo.artifact_root(), collaborator)
        .run(&input, Some(run_id("p4")))
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Gateway(GatewayError::Execution(ExecutionError::Failed {
            code: Some(7),
            stdout_sha256: Some(_),
        }))
    ));
}
