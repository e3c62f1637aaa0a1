// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `EXTRACT` step executor: drains an extractor's paginated batches into a
//! single output, honoring cancellation between pages.

use async_trait::async_trait;
use pipeline_runtime_domain::entities::pipeline_definition::{StepDefinition, StepType};
use pipeline_runtime_domain::entities::{RecordEnvelope, StepMetrics};
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::data_extractor::{DataExtractor, ExtractorContext};
use pipeline_runtime_domain::services::run_context::RunContext;
use pipeline_runtime_domain::services::step_executor::{ResourceRequirements, StepExecutor, StepOutcome};
use std::collections::HashMap;
use std::sync::Arc;

pub struct ExtractStepExecutor {
    extractors: HashMap<String, Arc<dyn DataExtractor>>,
    batch_size: usize,
}

impl ExtractStepExecutor {
    pub fn new(extractors: HashMap<String, Arc<dyn DataExtractor>>, batch_size: usize) -> Self {
        Self { extractors, batch_size }
    }
}

#[async_trait]
impl StepExecutor for ExtractStepExecutor {
    fn step_type(&self) -> StepType {
        StepType::Extract
    }

    fn resource_requirements(&self) -> ResourceRequirements {
        ResourceRequirements {
            cpu_intensive: false,
            io_intensive: true,
            max_concurrent_batches: 1,
        }
    }

    async fn execute(&self, step: &StepDefinition, ctx: &RunContext, _input: Vec<RecordEnvelope>) -> Result<StepOutcome, PipelineError> {
        let extractor = self.extractors.get(&step.adapter_code).ok_or_else(|| {
            PipelineError::InvalidConfiguration(format!("no extractor registered for adapter code '{}'", step.adapter_code))
        })?;

        extractor.validate_config(&step.config).await?;

        let extractor_ctx = ExtractorContext {
            request: ctx.request.clone(),
            pipeline_id: ctx.pipeline_id.clone(),
            run_id: ctx.run_id.clone(),
            step_key: step.step_key.clone(),
            cancellation: ctx.cancellation.clone(),
        };

        let mut records = Vec::new();
        let mut checkpoint = None;
        let mut metrics = StepMetrics::default();

        loop {
            if ctx.is_cancelled() {
                break;
            }

            let batch = extractor.next_batch(&extractor_ctx, &step.config, checkpoint.as_ref(), self.batch_size).await?;
            metrics.processed += batch.records.len() as u64;
            metrics.succeeded += batch.records.len() as u64;
            if ctx.samples_logging_enabled() {
                for record in &batch.records {
                    tracing::debug!(step = %step.step_key, sample = %record.data, "onExtractData");
                }
            }
            records.extend(batch.records);

            if !batch.has_more {
                break;
            }
            checkpoint = batch.next_checkpoint;
        }

        Ok(StepOutcome {
            output: records,
            metrics,
            record_failures: Vec::new(),
            paused: false,
        })
    }
}
