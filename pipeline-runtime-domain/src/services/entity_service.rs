// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Generic CRUD-over-entity-type port used by the `LOOKUP` transform and by
//! loaders resolving cross-references (spec §4.2, §4.3). One implementation
//! backs every entity type; entity-specific behavior lives in the
//! loader/transform configuration, not in separate traits per type.

use crate::error::PipelineError;
use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct EntityRecord {
    pub id: String,
    pub data: Value,
}

#[async_trait]
pub trait EntityService: Send + Sync {
    async fn find_one(&self, entity_type: &str, field: &str, value: &Value) -> Result<Option<EntityRecord>, PipelineError>;

    async fn find_all(&self, entity_type: &str, field: &str, value: &Value) -> Result<Vec<EntityRecord>, PipelineError>;

    async fn create(&self, entity_type: &str, record: &Value) -> Result<String, PipelineError>;

    async fn update(&self, entity_type: &str, id: &str, record: &Value) -> Result<(), PipelineError>;

    async fn delete(&self, entity_type: &str, id: &str) -> Result<(), PipelineError>;
}
