// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `GATE` step executor: evaluates a condition over the incoming batch and
//! either passes every record through unchanged or pauses the run. A step's
//! `config` shape is `{ "condition": { "field": "...", "equals": <value> } }`;
//! an absent `condition` always passes. The condition is evaluated against
//! the first record in the batch, matching the common case of a gate acting
//! on a single sentinel/approval record rather than per-record filtering —
//! per-record conditional routing belongs to `BRANCH`.

use async_trait::async_trait;
use pipeline_runtime_domain::entities::pipeline_definition::{StepDefinition, StepType};
use pipeline_runtime_domain::entities::{RecordEnvelope, StepMetrics};
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::run_context::RunContext;
use pipeline_runtime_domain::services::step_executor::{ResourceRequirements, StepExecutor, StepOutcome};

fn condition_satisfied(step: &StepDefinition, input: &[RecordEnvelope]) -> bool {
    let Some(condition) = step.config.get("condition") else {
        return true;
    };
    let field = condition.get("field").and_then(|v| v.as_str());
    let expected = condition.get("equals");

    match (field, expected) {
        (Some(field), Some(expected)) => match input.first() {
            Some(record) => record.field(field) == Some(expected),
            // Nothing to gate on yet: treat as not-yet-satisfied so the run
            // pauses until a record carrying the gated field arrives.
            None => false,
        },
        _ => true,
    }
}

pub struct GateStepExecutor;

#[async_trait]
impl StepExecutor for GateStepExecutor {
    fn step_type(&self) -> StepType {
        StepType::Gate
    }

    fn resource_requirements(&self) -> ResourceRequirements {
        ResourceRequirements {
            cpu_intensive: false,
            io_intensive: false,
            max_concurrent_batches: 1,
        }
    }

    async fn execute(&self, step: &StepDefinition, _ctx: &RunContext, input: Vec<RecordEnvelope>) -> Result<StepOutcome, PipelineError> {
        if !condition_satisfied(step, &input) {
            return Ok(StepOutcome {
                output: input,
                metrics: StepMetrics::default(),
                record_failures: Vec::new(),
                paused: true,
            });
        }

        let mut metrics = StepMetrics::default();
        metrics.processed = input.len() as u64;
        metrics.succeeded = metrics.processed;

        Ok(StepOutcome {
            output: input,
            metrics,
            record_failures: Vec::new(),
            paused: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_runtime_domain::value_objects::StepKey;

    fn gate(config: serde_json::Value) -> StepDefinition {
        StepDefinition::new(StepKey::new("gate").unwrap(), StepType::Gate, "gate").with_config(config)
    }

    #[tokio::test]
    async fn no_condition_always_passes() {
        let executor = GateStepExecutor;
        let step = gate(serde_json::json!({}));
        let ctx = RunContext::new(
            pipeline_runtime_domain::value_objects::PipelineId::new(),
            pipeline_runtime_domain::value_objects::RunId::new(),
        );
        let outcome = executor.execute(&step, &ctx, vec![RecordEnvelope::new(serde_json::json!({}))]).await.unwrap();
        assert!(!outcome.paused);
        assert_eq!(outcome.metrics.succeeded, 1);
    }

    #[tokio::test]
    async fn unmet_condition_pauses_without_counting_records() {
        let executor = GateStepExecutor;
        let step = gate(serde_json::json!({"condition": {"field": "approved", "equals": true}}));
        let ctx = RunContext::new(
            pipeline_runtime_domain::value_objects::PipelineId::new(),
            pipeline_runtime_domain::value_objects::RunId::new(),
        );
        let input = vec![RecordEnvelope::new(serde_json::json!({"approved": false}))];
        let outcome = executor.execute(&step, &ctx, input).await.unwrap();
        assert!(outcome.paused);
        assert_eq!(outcome.metrics.processed, 0);
    }

    #[tokio::test]
    async fn met_condition_passes_through() {
        let executor = GateStepExecutor;
        let step = gate(serde_json::json!({"condition": {"field": "approved", "equals": true}}));
        let ctx = RunContext::new(
            pipeline_runtime_domain::value_objects::PipelineId::new(),
            pipeline_runtime_domain::value_objects::RunId::new(),
        );
        let input = vec![RecordEnvelope::new(serde_json::json!({"approved": true}))];
        let outcome = executor.execute(&step, &ctx, input).await.unwrap();
        assert!(!outcome.paused);
        assert_eq!(outcome.metrics.succeeded, 1);
    }
}
