// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap-Phase Application Configuration
//!
//! `AppConfig` holds the process-level settings resolved before any pipeline
//! definition is loaded: log verbosity, the config-sync file path, the
//! worker-thread count, and whether the run is a dry run. It is distinct
//! from the `ConfigFile` schema (pipelines/secrets/connections) that
//! `sync-config` reads — this is bootstrap's own configuration, not the
//! domain's.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Log verbosity, mapped onto `tracing` levels by the logger.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Process-level bootstrap configuration, built up with a fluent builder
/// and defaulting to sensible values for local/dry-run use.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: LogLevel,
    pub config_path: Option<PathBuf>,
    pub worker_threads: usize,
    pub dry_run: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            config_path: None,
            worker_threads: default_worker_threads(),
            dry_run: false,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.max(1);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

fn default_worker_threads() -> usize {
    crate::platform::create_platform().cpu_count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_at_least_one_worker_thread() {
        let config = AppConfig::default();
        assert!(config.worker_threads >= 1);
        assert!(!config.dry_run);
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = AppConfig::new()
            .with_log_level(LogLevel::Debug)
            .with_config_path("pipelines.yaml")
            .with_worker_threads(0)
            .with_dry_run(true);

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.config_path, Some(PathBuf::from("pipelines.yaml")));
        // worker_threads is clamped to at least 1
        assert_eq!(config.worker_threads, 1);
        assert!(config.dry_run);
    }

    #[test]
    fn log_level_parses_from_str() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("bogus".parse::<LogLevel>().is_err());
    }
}
