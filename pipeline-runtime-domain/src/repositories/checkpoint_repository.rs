// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence contract for [`Checkpoint`]s. `save` must enforce the
//! monotonic-sequence invariant itself (via [`Checkpoint::assert_monotonic`])
//! before writing, not leave it to callers.

use crate::entities::Checkpoint;
use crate::error::PipelineError;
use crate::value_objects::PipelineId;
use async_trait::async_trait;

#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    async fn save(&self, checkpoint: Checkpoint) -> Result<(), PipelineError>;

    async fn load_latest(&self, pipeline_id: &PipelineId) -> Result<Option<Checkpoint>, PipelineError>;

    async fn clear(&self, pipeline_id: &PipelineId) -> Result<(), PipelineError>;
}
