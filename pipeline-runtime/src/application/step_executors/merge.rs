// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `MERGE` step executor: recombines branches tagged by an upstream
//! `BRANCH` step. Because the orchestrator threads one ordered record list
//! rather than per-branch lists (see `branch.rs`), every record already
//! arrives at the merge point; this executor's job is to drop the
//! now-irrelevant `branch` tag and pass records through as a single stream.

use async_trait::async_trait;
use pipeline_runtime_domain::entities::pipeline_definition::{StepDefinition, StepType};
use pipeline_runtime_domain::entities::{RecordEnvelope, StepMetrics};
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::run_context::RunContext;
use pipeline_runtime_domain::services::step_executor::{ResourceRequirements, StepExecutor, StepOutcome};

pub struct MergeStepExecutor;

#[async_trait]
impl StepExecutor for MergeStepExecutor {
    fn step_type(&self) -> StepType {
        StepType::Merge
    }

    fn resource_requirements(&self) -> ResourceRequirements {
        ResourceRequirements {
            cpu_intensive: false,
            io_intensive: false,
            max_concurrent_batches: 4,
        }
    }

    async fn execute(&self, _step: &StepDefinition, _ctx: &RunContext, input: Vec<RecordEnvelope>) -> Result<StepOutcome, PipelineError> {
        let mut metrics = StepMetrics::default();
        metrics.processed = input.len() as u64;
        metrics.succeeded = metrics.processed;

        let output = input
            .into_iter()
            .map(|mut record| {
                record.meta.extra.remove("branch");
                record
            })
            .collect();

        Ok(StepOutcome {
            output,
            metrics,
            record_failures: Vec::new(),
            paused: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_runtime_domain::value_objects::{PipelineId, RunId, StepKey};

    #[tokio::test]
    async fn clears_branch_tags_and_counts_all_records() {
        let executor = MergeStepExecutor;
        let step = StepDefinition::new(StepKey::new("join").unwrap(), StepType::Merge, "merge");
        let ctx = RunContext::new(PipelineId::new(), RunId::new());

        let mut tagged = RecordEnvelope::new(serde_json::json!({}));
        tagged.meta.extra.insert("branch".to_string(), serde_json::json!("highValue"));

        let outcome = executor.execute(&step, &ctx, vec![tagged]).await.unwrap();
        assert_eq!(outcome.metrics.processed, 1);
        assert!(!outcome.output[0].meta.extra.contains_key("branch"));
    }
}
