// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface
//!
//! Bootstrap-layer CLI parsing and validation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. clap::Parser::parse()           │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validate_cli()                  │  Range + path validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated config
//! └─────────────────────────────────────┘
//! ```
//!
//! Five subcommands cover every external operation spec.md names for a CLI
//! driver: `run` a pipeline, `replay` failed records from the error
//! journal, `cancel` an in-flight run, and `sync-config`/`validate-config`
//! for the config-sync workflow (spec §4.6).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating already-parsed CLI arguments.
#[derive(Debug, Error, Clone)]
pub enum ParseError {
    #[error("invalid value for --{arg}: {reason}")]
    InvalidValue { arg: String, reason: String },

    #[error("path does not exist: {0}")]
    PathNotFound(PathBuf),
}

#[derive(Parser, Debug)]
#[command(
    name = "pipeline-runtime",
    version,
    about = "Executes data-integration pipelines against commerce domain entities"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug-level logging regardless of --log-level.
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Override the bootstrap log level (error|warn|info|debug|trace).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Number of worker threads for the tokio runtime (defaults to CPU count).
    #[arg(long, global = true)]
    pub worker_threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a pipeline definition to completion (or its next checkpoint).
    Run {
        /// Path to the pipeline definition file.
        #[arg(long)]
        pipeline: PathBuf,

        /// Resume from the last checkpoint instead of starting a fresh run.
        #[arg(long)]
        resume: bool,

        /// Preview the run without writing to any entity store.
        #[arg(long)]
        dry_run: bool,

        /// Override the number of batches processed concurrently per step.
        #[arg(long)]
        max_concurrent: Option<u32>,
    },

    /// Replay failed records from the error journal for a completed run.
    Replay {
        /// The run whose error journal should be replayed.
        #[arg(long)]
        run_id: String,

        /// Replay only records with this step key (defaults to all steps).
        #[arg(long)]
        step: Option<String>,

        /// Path to a JSON file of per-record payload patches, keyed by record id.
        #[arg(long)]
        patch: Option<PathBuf>,
    },

    /// Request cooperative cancellation of an in-flight run.
    Cancel {
        /// The run to cancel.
        #[arg(long)]
        run_id: String,
    },

    /// Load a `ConfigFile` and upsert its pipelines/secrets/connections.
    SyncConfig {
        /// Path to the config-sync YAML or JSON file.
        #[arg(long)]
        config: PathBuf,

        /// Report what would change without writing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate a config-sync file or pipeline definition without applying it.
    ValidateConfig {
        /// Path to the file to validate.
        #[arg(long)]
        config: PathBuf,
    },
}

/// Validated CLI configuration: all paths confirmed to exist, all numeric
/// arguments range-checked.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub log_level: Option<String>,
    pub worker_threads: Option<usize>,
}

#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Run {
        pipeline: PathBuf,
        resume: bool,
        dry_run: bool,
        max_concurrent: Option<u32>,
    },
    Replay {
        run_id: String,
        step: Option<String>,
        patch: Option<PathBuf>,
    },
    Cancel {
        run_id: String,
    },
    SyncConfig {
        config: PathBuf,
        dry_run: bool,
    },
    ValidateConfig {
        config: PathBuf,
    },
}

/// Parses `std::env::args` with clap. Exits the process on `--help`/
/// `--version` or a parse error, matching clap's default behaviour.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parses and validates CLI arguments in one call: the entry point the
/// `pipeline-runtime` binary uses.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    validate_cli(parse_cli())
}

fn require_existing_path(path: &std::path::Path) -> Result<PathBuf, ParseError> {
    if path.exists() {
        Ok(path.to_path_buf())
    } else {
        Err(ParseError::PathNotFound(path.to_path_buf()))
    }
}

fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    if let Some(threads) = cli.worker_threads {
        if threads == 0 || threads > 1024 {
            return Err(ParseError::InvalidValue {
                arg: "worker-threads".to_string(),
                reason: "must be between 1 and 1024".to_string(),
            });
        }
    }

    if let Some(ref level) = cli.log_level {
        level.parse::<crate::config::LogLevel>().map_err(|reason| ParseError::InvalidValue {
            arg: "log-level".to_string(),
            reason,
        })?;
    }

    let command = match cli.command {
        Commands::Run {
            pipeline,
            resume,
            dry_run,
            max_concurrent,
        } => {
            let pipeline = require_existing_path(&pipeline)?;

            if let Some(max) = max_concurrent {
                if max == 0 {
                    return Err(ParseError::InvalidValue {
                        arg: "max-concurrent".to_string(),
                        reason: "must be at least 1".to_string(),
                    });
                }
            }

            ValidatedCommand::Run {
                pipeline,
                resume,
                dry_run,
                max_concurrent,
            }
        }
        Commands::Replay { run_id, step, patch } => {
            if run_id.trim().is_empty() {
                return Err(ParseError::InvalidValue {
                    arg: "run-id".to_string(),
                    reason: "must not be empty".to_string(),
                });
            }

            let patch = match patch {
                Some(path) => Some(require_existing_path(&path)?),
                None => None,
            };

            ValidatedCommand::Replay { run_id, step, patch }
        }
        Commands::Cancel { run_id } => {
            if run_id.trim().is_empty() {
                return Err(ParseError::InvalidValue {
                    arg: "run-id".to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
            ValidatedCommand::Cancel { run_id }
        }
        Commands::SyncConfig { config, dry_run } => {
            let config = require_existing_path(&config)?;
            ValidatedCommand::SyncConfig { config, dry_run }
        }
        Commands::ValidateConfig { config } => {
            let config = require_existing_path(&config)?;
            ValidatedCommand::ValidateConfig { config }
        }
    };

    Ok(ValidatedCli {
        command,
        verbose: cli.verbose,
        log_level: cli.log_level,
        worker_threads: cli.worker_threads,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_worker_threads() {
        let cli = Cli {
            command: Commands::Cancel { run_id: "r1".into() },
            verbose: false,
            log_level: None,
            worker_threads: Some(0),
        };
        assert!(validate_cli(cli).is_err());
    }

    #[test]
    fn rejects_empty_run_id() {
        let cli = Cli {
            command: Commands::Cancel { run_id: "   ".into() },
            verbose: false,
            log_level: None,
            worker_threads: None,
        };
        assert!(validate_cli(cli).is_err());
    }

    #[test]
    fn rejects_missing_pipeline_file() {
        let cli = Cli {
            command: Commands::Run {
                pipeline: PathBuf::from("/nonexistent/pipeline.yaml"),
                resume: false,
                dry_run: false,
                max_concurrent: None,
            },
            verbose: false,
            log_level: None,
            worker_threads: None,
        };
        assert!(matches!(validate_cli(cli), Err(ParseError::PathNotFound(_))));
    }

    #[test]
    fn accepts_well_formed_cancel() {
        let cli = Cli {
            command: Commands::Cancel { run_id: "run-123".into() },
            verbose: true,
            log_level: Some("debug".into()),
            worker_threads: Some(4),
        };
        let validated = validate_cli(cli).expect("should validate");
        assert!(validated.verbose);
        assert!(matches!(validated.command, ValidatedCommand::Cancel { .. }));
    }
}
