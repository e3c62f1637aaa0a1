// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `TRANSFORM` step executor: applies the configured per-field transform
//! chains to every input record. A step's `config` shape is
//! `{ "fields": { "<fieldName>": [{ "type": ..., "params": {...} }, ...] } }`.
//! Each chain step runs independently; a failing step logs and the current
//! value passes through unchanged (spec §4.2 resilience-over-strictness
//! contract). Records within a batch are transformed concurrently, bounded
//! by a `tokio::sync::Semaphore` sized from `parallelExecution.maxConcurrent`
//! (spec §5) — this step is the CPU-intensive one, so it is where
//! intra-step concurrency pays off.

use crate::application::transform_engine::TransformRegistry;
use async_trait::async_trait;
use pipeline_runtime_domain::entities::pipeline_definition::{StepDefinition, StepType};
use pipeline_runtime_domain::entities::{RecordEnvelope, StepMetrics};
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::run_context::RunContext;
use pipeline_runtime_domain::services::step_executor::{ResourceRequirements, StepExecutor, StepOutcome};
use pipeline_runtime_domain::services::transform::TransformContext;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub struct TransformStepExecutor {
    registry: Arc<TransformRegistry>,
    transform_ctx: TransformContext,
}

impl TransformStepExecutor {
    pub fn new(registry: Arc<TransformRegistry>, transform_ctx: TransformContext) -> Self {
        Self { registry, transform_ctx }
    }

    async fn apply_chain(&self, field_name: &str, chain: &[Value], record: &RecordEnvelope, log_samples: bool) -> Value {
        let mut value = record.field(field_name).cloned().unwrap_or(Value::Null);
        let before = value.clone();

        for step in chain {
            let Some(transform_type) = step.get("type").and_then(|v| v.as_str()) else {
                tracing::warn!(field = field_name, "transform chain entry missing 'type', skipping");
                continue;
            };
            let params = step.get("params").cloned().unwrap_or(Value::Null);

            let transform = match self.registry.get(transform_type) {
                Ok(t) => t,
                Err(err) => {
                    tracing::warn!(field = field_name, transform_type, %err, "unknown transform, value unchanged");
                    continue;
                }
            };

            match transform.execute(&self.transform_ctx, value.clone(), Some(record), &params).await {
                Ok(next) => value = next,
                Err(err) => {
                    tracing::warn!(field = field_name, transform_type, %err, "transform step failed, passing through current value");
                }
            }
        }

        if log_samples {
            tracing::debug!(field = field_name, before = %before, after = %value, "onTransformMapping");
        }

        value
    }

    async fn transform_record(&self, mut record: RecordEnvelope, fields: &Map<String, Value>, log_samples: bool) -> RecordEnvelope {
        for (field_name, chain_value) in fields {
            let Some(chain) = chain_value.as_array() else {
                continue;
            };
            let new_value = self.apply_chain(field_name, chain, &record, log_samples).await;
            record.set_field(field_name, new_value);
        }
        record
    }
}

#[async_trait]
impl StepExecutor for TransformStepExecutor {
    fn step_type(&self) -> StepType {
        StepType::Transform
    }

    fn resource_requirements(&self) -> ResourceRequirements {
        ResourceRequirements {
            cpu_intensive: true,
            io_intensive: false,
            max_concurrent_batches: 4,
        }
    }

    async fn execute(&self, step: &StepDefinition, ctx: &RunContext, input: Vec<RecordEnvelope>) -> Result<StepOutcome, PipelineError> {
        let fields = step
            .config
            .get("fields")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default();

        let semaphore = Semaphore::new(ctx.max_concurrency.max(1) as usize);
        let log_samples = ctx.samples_logging_enabled();
        let mut tasks = Vec::with_capacity(input.len());

        for record in input {
            if ctx.is_cancelled() {
                break;
            }
            tasks.push(async {
                let _permit = semaphore.acquire().await.expect("semaphore is never closed");
                self.transform_record(record, &fields, log_samples).await
            });
        }

        let output = futures::future::join_all(tasks).await;

        let mut metrics = StepMetrics::default();
        metrics.processed = output.len() as u64;
        metrics.succeeded = metrics.processed;

        Ok(StepOutcome {
            output,
            metrics,
            record_failures: Vec::new(),
            paused: false,
        })
    }
}
