// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Replay Use Case
//!
//! Backs the `replay` CLI subcommand: re-runs the recoverable records
//! journaled for a completed run, optionally restricted to one `stepKey`
//! and optionally patched from a JSON file keyed by record id (spec §4.5).

use crate::application::orchestrator::RunSummary;
use crate::application::replay_service::ReplayService;
use anyhow::{Context, Result};
use pipeline_runtime_domain::repositories::{ErrorJournalRepository, PipelineDefinitionRepository, PipelineRunRepository};
use pipeline_runtime_domain::services::request_context::RequestContext;
use pipeline_runtime_domain::value_objects::RunId;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct ReplayUseCase {
    replay_service: Arc<ReplayService>,
    definitions: Arc<dyn PipelineDefinitionRepository>,
    runs: Arc<dyn PipelineRunRepository>,
    error_journal: Arc<dyn ErrorJournalRepository>,
}

impl ReplayUseCase {
    pub fn new(
        replay_service: Arc<ReplayService>,
        definitions: Arc<dyn PipelineDefinitionRepository>,
        runs: Arc<dyn PipelineRunRepository>,
        error_journal: Arc<dyn ErrorJournalRepository>,
    ) -> Self {
        Self {
            replay_service,
            definitions,
            runs,
            error_journal,
        }
    }

    pub async fn execute(&self, run_id: &str, step: Option<&str>, patch_path: Option<&Path>) -> Result<Vec<RunSummary>> {
        let run_id = RunId::from_string(run_id).map_err(anyhow::Error::from)?;
        let run = self
            .runs
            .find_by_id(&run_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("run '{}' not found", run_id))?;
        let definition = self
            .definitions
            .find_by_id(&run.pipeline_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("pipeline '{}' not found", run.pipeline_id))?;

        let patches = match patch_path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).with_context(|| format!("failed to read patch file '{}'", path.display()))?;
                serde_json::from_str::<HashMap<String, serde_json::Value>>(&contents)
                    .with_context(|| format!("invalid patch file '{}'", path.display()))?
            }
            None => HashMap::new(),
        };

        let errors = self.error_journal.list_recoverable_for_run(&run_id).await?;
        let mut summaries = Vec::new();

        for error in errors {
            if let Some(filter) = step {
                if error.step_key.as_str() != filter {
                    continue;
                }
            }
            let patch = patches.get(&error.id.to_string()).cloned();
            info!(error_id = %error.id, step = %error.step_key.as_str(), patched = patch.is_some(), "replaying journaled error");
            let summary = self.replay_service.replay_error(&definition, &error.id, patch, None, RequestContext::default()).await?;
            summaries.push(summary);
        }

        println!("replayed {} record(s) from run {}", summaries.len(), run_id);
        Ok(summaries)
    }
}
