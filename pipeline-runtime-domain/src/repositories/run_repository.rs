// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence contract for run state. `append_events`/`load_events`
//! support the event-sourced [`crate::aggregates::PipelineRunAggregate`];
//! `save_snapshot`/`find_by_id` support cheap status lookups (e.g. `cancel`,
//! dashboards) without replaying full history.

use crate::aggregates::RunEvent;
use crate::entities::PipelineRun;
use crate::error::PipelineError;
use crate::value_objects::{PipelineId, RunId};
use async_trait::async_trait;

#[async_trait]
pub trait PipelineRunRepository: Send + Sync {
    async fn append_events(&self, run_id: &RunId, expected_version: u64, events: &[RunEvent]) -> Result<(), PipelineError>;

    async fn load_events(&self, run_id: &RunId) -> Result<Vec<RunEvent>, PipelineError>;

    async fn save_snapshot(&self, run: &PipelineRun) -> Result<(), PipelineError>;

    async fn find_by_id(&self, run_id: &RunId) -> Result<Option<PipelineRun>, PipelineError>;

    async fn find_active_for_pipeline(&self, pipeline_id: &PipelineId) -> Result<Vec<PipelineRun>, PipelineError>;
}
