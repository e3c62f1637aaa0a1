// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Observer-style port the orchestrator notifies at the six points spec §6
//! names. Default no-op bodies mean an implementation only has to override
//! the events it cares about (a metrics sink ignores `on_record_failed`
//! entirely, a webhook sink may only implement `on_pipeline_completed`).

use crate::events::{DomainEvent, PipelineCompleted, PipelineFailed, PipelineStarted, RecordFailed, StepCompleted, StepFailed};
use async_trait::async_trait;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn on_pipeline_started(&self, _event: DomainEvent<PipelineStarted>) {}

    async fn on_pipeline_completed(&self, _event: DomainEvent<PipelineCompleted>) {}

    async fn on_pipeline_failed(&self, _event: DomainEvent<PipelineFailed>) {}

    async fn on_step_completed(&self, _event: DomainEvent<StepCompleted>) {}

    async fn on_step_failed(&self, _event: DomainEvent<StepFailed>) {}

    async fn on_record_failed(&self, _event: DomainEvent<RecordFailed>) {}
}
