// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `tracing`-backed [`EventPublisher`]: the default sink wired into
//! `main.rs`, turning the six domain events (spec §6) into structured log
//! lines rather than silently dropping them.

use async_trait::async_trait;
use pipeline_runtime_domain::events::{DomainEvent, PipelineCompleted, PipelineFailed, PipelineStarted, RecordFailed, StepCompleted, StepFailed};
use pipeline_runtime_domain::services::event_publisher::EventPublisher;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn on_pipeline_started(&self, event: DomainEvent<PipelineStarted>) {
        info!(pipeline_id = %event.payload.pipeline_id, run_id = %event.payload.run_id, "pipeline started");
    }

    async fn on_pipeline_completed(&self, event: DomainEvent<PipelineCompleted>) {
        info!(
            run_id = %event.payload.run_id,
            processed = event.payload.processed,
            succeeded = event.payload.succeeded,
            failed = event.payload.failed,
            "pipeline completed"
        );
    }

    async fn on_pipeline_failed(&self, event: DomainEvent<PipelineFailed>) {
        warn!(run_id = %event.payload.run_id, reason = %event.payload.reason, "pipeline failed");
    }

    async fn on_step_completed(&self, event: DomainEvent<StepCompleted>) {
        info!(run_id = %event.payload.run_id, step = %event.payload.step_key, "step completed");
    }

    async fn on_step_failed(&self, event: DomainEvent<StepFailed>) {
        warn!(run_id = %event.payload.run_id, step = %event.payload.step_key, reason = %event.payload.reason, "step failed");
    }

    async fn on_record_failed(&self, event: DomainEvent<RecordFailed>) {
        warn!(
            run_id = %event.payload.run_id,
            step = %event.payload.step_key,
            message = %event.payload.message,
            recoverable = event.payload.recoverable,
            "record failed"
        );
    }
}
