// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Run Pipeline Use Case
//!
//! Backs the `run` CLI subcommand: loads a [`PipelineDefinition`] from a
//! YAML or JSON file and drives it to completion (or its next checkpoint)
//! through the [`PipelineOrchestrator`].
//!
//! `--resume` carries no run id of its own — the CLI only names the
//! pipeline file — so this use case looks up the pipeline's currently
//! active run via `PipelineRunRepository::find_active_for_pipeline` before
//! asking the orchestrator to resume it.

use crate::application::orchestrator::{ExecuteOptions, PipelineOrchestrator, RunSummary};
use anyhow::{Context, Result};
use pipeline_runtime_domain::entities::PipelineDefinition;
use pipeline_runtime_domain::repositories::PipelineRunRepository;
use pipeline_runtime_domain::services::request_context::RequestContext;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct RunPipelineUseCase {
    orchestrator: Arc<PipelineOrchestrator>,
    runs: Arc<dyn PipelineRunRepository>,
}

impl RunPipelineUseCase {
    pub fn new(orchestrator: Arc<PipelineOrchestrator>, runs: Arc<dyn PipelineRunRepository>) -> Self {
        Self { orchestrator, runs }
    }

    pub async fn execute(&self, pipeline_path: &Path, resume: bool, dry_run: bool, max_concurrent: Option<u32>) -> Result<RunSummary> {
        let contents = std::fs::read_to_string(pipeline_path)
            .with_context(|| format!("failed to read pipeline definition '{}'", pipeline_path.display()))?;
        let mut definition = parse_definition(pipeline_path, &contents)?;

        if let Some(max) = max_concurrent {
            definition.parallel_execution.max_concurrent = max;
        }

        let run_id = if resume {
            self.runs
                .find_active_for_pipeline(&definition.id)
                .await?
                .into_iter()
                .next()
                .map(|run| run.id)
        } else {
            None
        };

        info!(pipeline = %definition.code, resume, dry_run, "running pipeline");

        let options = ExecuteOptions { run_id, resume, dry_run };
        let summary = self.orchestrator.execute(&definition, RequestContext::default(), options).await?;

        println!(
            "run {} finished: {} processed, {} succeeded, {} failed{}",
            summary.run_id,
            summary.processed,
            summary.succeeded,
            summary.failed,
            if summary.paused { " (paused)" } else { "" }
        );

        Ok(summary)
    }
}

fn parse_definition(path: &Path, contents: &str) -> Result<PipelineDefinition> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(contents).with_context(|| format!("invalid pipeline definition '{}'", path.display()))
        }
        _ => serde_json::from_str(contents).with_context(|| format!("invalid pipeline definition '{}'", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_definition_rejects_malformed_yaml() {
        let result = parse_definition(Path::new("pipeline.yaml"), "not: valid: yaml: [");
        assert!(result.is_err());
    }
}
