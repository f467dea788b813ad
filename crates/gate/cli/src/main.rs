//! Routegate CLI
//!
//! Drives the gate one stage at a time (`propose`, `build`, `enforce`) or end
//! to end (`run`), and checks the installation (`verify-determinism`,
//! `verify-engine`).

use clap::{Parser, Subcommand};
use routegate_pipeline::GateConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod exit;
mod output;

/// Routegate CLI application
#[derive(Parser)]
#[command(name = "routegate")]
#[command(about = "Routegate - fail-closed gate in front of a sealed routing engine", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Repository root
    #[arg(long)]
    repo_root: Option<PathBuf>,

    /// Artifact directory, relative to the repository root
    #[arg(long)]
    artifact_dir: Option<String>,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Generate the proposal set for an input and print it
    Propose {
        #[arg(long)]
        input: PathBuf,
        /// Also persist under proposals/<run-id>/
        #[arg(long)]
        run_id: Option<String>,
    },

    /// Build and persist the decision artifact for a proposal set
    Build {
        #[arg(long)]
        proposal_set: PathBuf,
        #[arg(long)]
        run_id: String,
        /// Repo-relative path of the raw input
        #[arg(long)]
        input_ref: String,
    },

    /// Enforce a persisted artifact, invoking the engine only on ACCEPT
    Enforce {
        #[arg(long)]
        artifact: PathBuf,
        #[arg(long)]
        input: PathBuf,
    },

    /// Propose, build, enforce and record one input
    Run {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        run_id: Option<String>,
    },

    /// Run the pipeline repeatedly and require byte-identical results
    VerifyDeterminism {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = 5)]
        runs: usize,
    },

    /// Check the engine binary against its pinned hash
    VerifyEngine,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::from(exit::USAGE);
        }
    };
    init_tracing(&config);

    let result = match &cli.command {
        Commands::Propose { input, run_id } => commands::propose(&config, input, run_id.as_deref()),
        Commands::Build {
            proposal_set,
            run_id,
            input_ref,
        } => commands::build(&config, proposal_set, run_id, input_ref),
        Commands::Enforce { artifact, input } => commands::enforce(&config, artifact, input),
        Commands::Run { input, run_id } => commands::run(&config, input, run_id.as_deref()),
        Commands::VerifyDeterminism { input, runs } => {
            commands::verify_determinism(&config, input, *runs)
        }
        Commands::VerifyEngine => commands::verify_engine(&config),
    };

    match result {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {:#}", e);
            ExitCode::from(exit::status_for(&e))
        }
    }
}

/// Config file first, then command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<GateConfig> {
    let mut config = GateConfig::load(cli.config.as_deref())?;
    if let Some(root) = &cli.repo_root {
        config.repo_root = Some(root.clone());
    }
    if let Some(dir) = &cli.artifact_dir {
        config.artifact_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.log_json {
        config.logging.json = true;
    }
    Ok(config)
}

/// Logs go to stderr; stdout is reserved for documents and engine output.
fn init_tracing(config: &GateConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
