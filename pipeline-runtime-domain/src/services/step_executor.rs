// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Step dispatch port. One `StepExecutor` implementation exists per
//! [`crate::entities::pipeline_definition::StepType`]; the orchestrator
//! (application layer) holds a registry keyed by `StepType` and never
//! matches on step behavior itself.

use crate::entities::pipeline_definition::{StepDefinition, StepType};
use crate::entities::{RecordEnvelope, StepMetrics};
use crate::error::PipelineError;
use crate::services::run_context::RunContext;
use async_trait::async_trait;

/// Scheduling hints the orchestrator uses to size its step-level
/// concurrency, mirroring the resource-aware dispatch the teacher's stage
/// executors use to decide CPU-bound vs I/O-bound batching.
#[derive(Debug, Clone, Copy)]
pub struct ResourceRequirements {
    pub cpu_intensive: bool,
    pub io_intensive: bool,
    pub max_concurrent_batches: u32,
}

impl Default for ResourceRequirements {
    fn default() -> Self {
        Self {
            cpu_intensive: false,
            io_intensive: true,
            max_concurrent_batches: 4,
        }
    }
}

/// A single record's failure inside a step, detailed enough for the
/// orchestrator to journal it and publish `RECORD_FAILED` without needing
/// to know which step type produced it.
#[derive(Debug, Clone)]
pub struct StepRecordFailure {
    pub payload: serde_json::Value,
    pub message: String,
    pub code: Option<String>,
    pub recoverable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StepOutcome {
    pub output: Vec<RecordEnvelope>,
    pub metrics: StepMetrics,
    #[allow(clippy::vec_box)]
    pub record_failures: Vec<StepRecordFailure>,
    /// Set when this step is a `GATE` that paused the run; the orchestrator
    /// must stop advancing and must not publish `PIPELINE_COMPLETED`.
    pub paused: bool,
}

#[async_trait]
pub trait StepExecutor: Send + Sync {
    fn step_type(&self) -> StepType;

    fn resource_requirements(&self) -> ResourceRequirements {
        ResourceRequirements::default()
    }

    async fn execute(&self, step: &StepDefinition, ctx: &RunContext, input: Vec<RecordEnvelope>) -> Result<StepOutcome, PipelineError>;
}
