// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence contract for [`PipelineDefinition`]s, the config-synced
//! declarative pipelines themselves (spec §3, §4.4).

use crate::entities::PipelineDefinition;
use crate::error::PipelineError;
use crate::value_objects::PipelineId;
use async_trait::async_trait;

#[async_trait]
pub trait PipelineDefinitionRepository: Send + Sync {
    async fn save(&self, definition: &PipelineDefinition) -> Result<(), PipelineError>;

    async fn find_by_id(&self, id: &PipelineId) -> Result<Option<PipelineDefinition>, PipelineError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<PipelineDefinition>, PipelineError>;

    async fn list(&self) -> Result<Vec<PipelineDefinition>, PipelineError>;

    async fn delete(&self, id: &PipelineId) -> Result<(), PipelineError>;
}
