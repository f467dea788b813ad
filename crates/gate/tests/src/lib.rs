//! Shared fixtures for the routegate integration suites.
//!
//! Every suite works inside a [`ScratchRepo`]: a temporary repository with an
//! `inputs/` directory and an `artifacts/` root beneath it.

use routegate_artifact::{verify_artifact_bytes, ArtifactBuilder, ArtifactStore, DecisionArtifact};
use routegate_contract::{ContentHash, RunId};
use routegate_gateway::{Gateway, SimulatedCollaborator};
use routegate_pipeline::Pipeline;
use routegate_proposal::{generate, RawInput};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type SharedEngine = Arc<SimulatedCollaborator>;

/// A throwaway repository.
pub struct ScratchRepo {
    dir: tempfile::TempDir,
}

impl ScratchRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create scratch repo");
        fs::create_dir_all(dir.path().join("inputs")).expect("create inputs dir");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn artifact_root(&self) -> PathBuf {
        self.root().join("artifacts")
    }

    /// Write `text` plus a trailing newline to `inputs/<name>`.
    pub fn input(&self, name: &str, text: &str) -> PathBuf {
        let path = self.root().join("inputs").join(name);
        fs::write(&path, format!("{text}\n")).expect("write input");
        path
    }

    pub fn pipeline(&self, engine: &SharedEngine) -> Pipeline<SharedEngine> {
        Pipeline::new(self.root(), self.artifact_root(), engine.clone())
    }

    pub fn gateway(&self, engine: &SharedEngine) -> Gateway {
        Gateway::new(self.root(), self.artifact_root()).with_collaborator(engine.clone())
    }

    /// Generate, build and persist the artifact for `text`, bound to
    /// `inputs/<name>`.
    pub fn persist_artifact(&self, name: &str, text: &str, run_id: &str) -> PathBuf {
        let bytes = generate(&RawInput::new(text))
            .to_canonical_bytes()
            .expect("encode proposal set");
        self.persist_payload(name, &bytes, run_id)
    }

    /// Build and persist an artifact from arbitrary proposal bytes.
    pub fn persist_payload(&self, name: &str, proposal_bytes: &[u8], run_id: &str) -> PathBuf {
        let artifact = ArtifactBuilder::new()
            .build(proposal_bytes, run_id, &format!("inputs/{name}"))
            .expect("build artifact");
        ArtifactStore::new(self.artifact_root())
            .persist(&artifact)
            .expect("persist artifact")
            .path
    }

    /// Install an executable shell script as the engine and return its path
    /// and pinned hash.
    #[cfg(unix)]
    pub fn shell_engine(&self, body: &str) -> (PathBuf, ContentHash) {
        use std::os::unix::fs::PermissionsExt;

        let dir = self.root().join("vendor");
        fs::create_dir_all(&dir).expect("create vendor dir");
        let path = dir.join("engine.sh");
        let script = format!("#!/bin/sh\n{body}\n");
        fs::write(&path, &script).expect("write engine");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod engine");
        (path, ContentHash::hash(script.as_bytes()))
    }
}

impl Default for ScratchRepo {
    fn default() -> Self {
        Self::new()
    }
}

pub fn run_id(text: &str) -> RunId {
    RunId::parse(text).expect("valid run_id")
}

/// Load the verified artifact at `path`, apply `edit`, then rewrite the file
/// with a fresh content hash and a matching sidecar. The result is
/// internally consistent apart from whatever `edit` broke.
pub fn forge_artifact(path: &Path, edit: impl FnOnce(&mut DecisionArtifact)) {
    let bytes = fs::read(path).expect("read artifact");
    let mut artifact = verify_artifact_bytes(&bytes).expect("artifact verifies before forging");
    edit(&mut artifact);
    artifact.content_hash = artifact.compute_hash().expect("hash artifact");
    let encoded = artifact.to_canonical_bytes().expect("encode artifact");
    fs::write(path, &encoded).expect("write artifact");
    let sidecar = format!("{}  artifact.json\n", ContentHash::hash(&encoded).to_hex());
    fs::write(path.with_file_name("artifact.json.sha256"), sidecar).expect("write sidecar");
}

/// Every file under `dir`, relative and `/`-joined, sorted.
pub fn list_files(dir: &Path) -> Vec<String> {
    fn walk(base: &Path, dir: &Path, out: &mut Vec<String>) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                walk(base, &path, out);
            } else if let Ok(rel) = path.strip_prefix(base) {
                let parts: Vec<String> = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                out.push(parts.join("/"));
            }
        }
    }
    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}
