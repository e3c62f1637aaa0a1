// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `BRANCH` step executor: partitions a batch by predicate into the
//! `step_key`s named in `branch_targets`. A step's `config` shape is
//! `{ "predicates": [{ "target": "<stepKey>", "field": "...", "equals": <value> }],
//! "default": "<stepKey>" }`.
//!
//! The orchestrator threads a single ordered record list between steps
//! rather than materializing a full data-flow graph (spec §9's "implicit
//! edges from declaration order" note), so a branch cannot literally fork
//! execution onto divergent paths here. Instead every record is tagged with
//! the target it matched (`meta.extra["branch"]`) and passed through
//! unchanged; a downstream step can inspect the tag to decide whether a
//! record applies to it. `MERGE` is this step's inverse.

use async_trait::async_trait;
use pipeline_runtime_domain::entities::pipeline_definition::{StepDefinition, StepType};
use pipeline_runtime_domain::entities::{RecordEnvelope, StepMetrics};
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::run_context::RunContext;
use pipeline_runtime_domain::services::step_executor::{ResourceRequirements, StepExecutor, StepOutcome};

struct Predicate {
    target: String,
    field: String,
    equals: serde_json::Value,
}

fn parse_predicates(config: &serde_json::Value) -> Vec<Predicate> {
    config
        .get("predicates")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|p| {
                    let target = p.get("target")?.as_str()?.to_string();
                    let field = p.get("field")?.as_str()?.to_string();
                    let equals = p.get("equals")?.clone();
                    Some(Predicate { target, field, equals })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn branch_for(record: &RecordEnvelope, predicates: &[Predicate], default: Option<&str>) -> Option<String> {
    for predicate in predicates {
        if record.field(&predicate.field) == Some(&predicate.equals) {
            return Some(predicate.target.clone());
        }
    }
    default.map(|d| d.to_string())
}

pub struct BranchStepExecutor;

#[async_trait]
impl StepExecutor for BranchStepExecutor {
    fn step_type(&self) -> StepType {
        StepType::Branch
    }

    fn resource_requirements(&self) -> ResourceRequirements {
        ResourceRequirements {
            cpu_intensive: false,
            io_intensive: false,
            max_concurrent_batches: 4,
        }
    }

    async fn execute(&self, step: &StepDefinition, _ctx: &RunContext, input: Vec<RecordEnvelope>) -> Result<StepOutcome, PipelineError> {
        let predicates = parse_predicates(&step.config);
        let default = step.config.get("default").and_then(|v| v.as_str());

        let mut metrics = StepMetrics::default();
        let mut output = Vec::with_capacity(input.len());

        for mut record in input {
            if let Some(target) = branch_for(&record, &predicates, default) {
                record.meta.extra.insert("branch".to_string(), serde_json::Value::String(target));
            }
            metrics.processed += 1;
            metrics.succeeded += 1;
            output.push(record);
        }

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
    async fn tags_records_with_the_matching_predicate_target() {
        let executor = BranchStepExecutor;
        let mut step = StepDefinition::new(StepKey::new("split").unwrap(), StepType::Branch, "branch").with_config(serde_json::json!({
            "predicates": [{"target": "highValue", "field": "totalCents", "equals": 10_000}],
            "default": "standard",
        }));
        step.branch_targets = vec![StepKey::new("highValue").unwrap(), StepKey::new("standard").unwrap()];

        let ctx = RunContext::new(PipelineId::new(), RunId::new());
        let input = vec![
            RecordEnvelope::new(serde_json::json!({"totalCents": 10_000})),
            RecordEnvelope::new(serde_json::json!({"totalCents": 500})),
        ];

        let outcome = executor.execute(&step, &ctx, input).await.unwrap();
        assert_eq!(outcome.output[0].meta.extra.get("branch").unwrap(), "highValue");
        assert_eq!(outcome.output[1].meta.extra.get("branch").unwrap(), "standard");
        assert_eq!(outcome.metrics.processed, 2);
    }
}
