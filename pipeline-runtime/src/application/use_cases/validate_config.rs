// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Validate Config Use Case
//!
//! Backs the `validate-config` CLI subcommand: parses a config-sync file
//! (or a bare pipeline definition) and runs every named pipeline's own
//! structural validation, without syncing anything.

use crate::application::config_sync::ConfigFile;
use anyhow::{Context, Result};
use pipeline_runtime_domain::entities::PipelineDefinition;
use std::path::Path;
use tracing::info;

pub struct ValidateConfigUseCase;

impl ValidateConfigUseCase {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(&self, config_path: &Path) -> Result<()> {
        info!("validating configuration: {}", config_path.display());
        println!("validating configuration file: {}", config_path.display());

        let contents =
            std::fs::read_to_string(config_path).with_context(|| format!("failed to read config file '{}'", config_path.display()))?;

        let pipelines = match ConfigFile::parse(config_path, &contents) {
            Ok(file) => file.pipelines,
            Err(_) => vec![parse_bare_definition(config_path, &contents)?],
        };

        if pipelines.is_empty() {
            println!("no pipeline definitions found");
            return Ok(());
        }

        for pipeline in &pipelines {
            pipeline
                .validate()
                .with_context(|| format!("pipeline '{}' failed validation", pipeline.code))?;
            println!("  {} ({} steps) - OK", pipeline.code, pipeline.steps.len());
        }

        println!("{} pipeline definition(s) valid", pipelines.len());
        Ok(())
    }
}

impl Default for ValidateConfigUseCase {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_bare_definition(path: &Path, contents: &str) -> Result<PipelineDefinition> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(contents).with_context(|| format!("'{}' is neither a valid config file nor a pipeline definition", path.display()))
        }
        _ => serde_json::from_str(contents)
            .with_context(|| format!("'{}' is neither a valid config file nor a pipeline definition", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn rejects_a_file_that_is_neither_config_nor_definition() {
        let mut file = tempfile::NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, "not valid json at all").unwrap();
        let use_case = ValidateConfigUseCase::new();
        assert!(use_case.execute(file.path()).await.is_err());
    }

    #[tokio::test]
    async fn reports_no_pipelines_for_an_empty_config_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, "{{}}").unwrap();
        let use_case = ValidateConfigUseCase::new();
        assert!(use_case.execute(file.path()).await.is_ok());
    }
}
