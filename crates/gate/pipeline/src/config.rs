//! Configuration for routegate

use crate::error::PipelineError;
use routegate_contract::{ContentHash, RepoRelativePath};
use routegate_gateway::ProcessCollaborator;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration. Every root the pipeline touches comes from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Repository root. Must be set by the config file or the command line.
    #[serde(default)]
    pub repo_root: Option<PathBuf>,

    /// Artifact root, relative to the repository root
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,

    /// Pinned execution engine
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            repo_root: None,
            artifact_dir: default_artifact_dir(),
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine binary, relative to the repository root
    #[serde(default)]
    pub path: Option<String>,

    /// Expected SHA-256 of the engine binary, lowercase hex
    #[serde(default)]
    pub sha256: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_artifact_dir() -> String {
    "artifacts".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl GateConfig {
    /// Load defaults, then the TOML file at `path` if one is given.
    ///
    /// There is no environment source: roots and the engine pin are never
    /// ambient.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&GateConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn repo_root(&self) -> Result<&Path, PipelineError> {
        self.repo_root
            .as_deref()
            .ok_or_else(|| PipelineError::Config("repo_root is not set".into()))
    }

    pub fn artifact_root(&self) -> Result<PathBuf, PipelineError> {
        let dir = RepoRelativePath::parse(&self.artifact_dir)?;
        Ok(dir.resolve(self.repo_root()?))
    }

    /// The pinned engine as a process collaborator run from the repository
    /// root.
    pub fn engine_collaborator(&self) -> Result<ProcessCollaborator, PipelineError> {
        let repo_root = self.repo_root()?;
        let path = self
            .engine
            .path
            .as_deref()
            .ok_or_else(|| PipelineError::Config("engine.path is not set".into()))?;
        let pin = self
            .engine
            .sha256
            .as_deref()
            .ok_or_else(|| PipelineError::Config("engine.sha256 is not set".into()))?;
        let pin = ContentHash::from_hex(pin)
            .map_err(|e| PipelineError::Config(format!("engine.sha256: {}", e)))?;
        let engine = RepoRelativePath::parse(path)?.resolve(repo_root);
        Ok(ProcessCollaborator::new(engine, pin).with_working_dir(repo_root))
    }
}
