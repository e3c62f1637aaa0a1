// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Entities and value-bearing records that make up the pipeline execution
//! data model: definitions, runs, checkpoints, envelopes, and the
//! error/rollback journals.

pub mod checkpoint;
pub mod pipeline_definition;
pub mod pipeline_run;
pub mod record_envelope;
pub mod record_error;
pub mod rollback_journal;

pub use checkpoint::Checkpoint;
pub use pipeline_definition::{
    CheckpointAfter, CheckpointingPolicy, ConfigValidationMode, ContextOverride, ErrorHandlingMode,
    ErrorHandlingPolicy, HookBindings, ParallelExecutionPolicy, PipelineDefinition, PipelineStatus, StepDefinition,
    StepType, TriggerBinding,
};
pub use pipeline_run::{PipelineRun, RecordOutcome, RunMetrics, RunStatus, StepExecutionRecord, StepMetrics};
pub use record_envelope::{EnvelopeMeta, RecordEnvelope};
pub use record_error::{classify_recoverable, RecordError, RetryAudit};
pub use rollback_journal::{RollbackOpType, RollbackOperation, RollbackStatus, RollbackTransaction};
