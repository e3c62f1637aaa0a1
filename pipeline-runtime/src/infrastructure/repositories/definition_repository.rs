// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`PipelineDefinitionRepository`]. The whole definition is
//! stored as a JSON blob; `code`, `status`, and `updated_at` are pulled out
//! into columns so `find_by_code` and future status-filtered listing don't
//! need to deserialize every row.

use async_trait::async_trait;
use pipeline_runtime_domain::entities::{PipelineDefinition, PipelineStatus};
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::repositories::PipelineDefinitionRepository;
use pipeline_runtime_domain::value_objects::PipelineId;
use sqlx::{Row, SqlitePool};

pub struct SqlitePipelineDefinitionRepository {
    pool: SqlitePool,
}

impl SqlitePipelineDefinitionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn infra_err(context: &str, err: sqlx::Error) -> PipelineError {
        PipelineError::InfrastructureFailure(format!("{context}: {err}"))
    }
}

fn status_label(status: PipelineStatus) -> &'static str {
    match status {
        PipelineStatus::Draft => "DRAFT",
        PipelineStatus::Review => "REVIEW",
        PipelineStatus::Published => "PUBLISHED",
        PipelineStatus::Archived => "ARCHIVED",
    }
}

fn row_to_definition(row: &sqlx::sqlite::SqliteRow) -> Result<PipelineDefinition, PipelineError> {
    let data: String = row.try_get("data").map_err(|e| SqlitePipelineDefinitionRepository::infra_err("reading row", e))?;
    Ok(serde_json::from_str(&data)?)
}

#[async_trait]
impl PipelineDefinitionRepository for SqlitePipelineDefinitionRepository {
    async fn save(&self, definition: &PipelineDefinition) -> Result<(), PipelineError> {
        let data = serde_json::to_string(definition)?;
        sqlx::query(
            "INSERT INTO pipeline_definitions (id, code, status, data, updated_at) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET code = excluded.code, status = excluded.status, data = excluded.data, updated_at = excluded.updated_at",
        )
        .bind(definition.id.to_string())
        .bind(&definition.code)
        .bind(status_label(definition.status))
        .bind(data)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Self::infra_err("saving pipeline definition", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &PipelineId) -> Result<Option<PipelineDefinition>, PipelineError> {
        let row = sqlx::query("SELECT data FROM pipeline_definitions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::infra_err("loading pipeline definition", e))?;

        row.as_ref().map(row_to_definition).transpose()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<PipelineDefinition>, PipelineError> {
        let row = sqlx::query("SELECT data FROM pipeline_definitions WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::infra_err("loading pipeline definition", e))?;

        row.as_ref().map(row_to_definition).transpose()
    }

    async fn list(&self) -> Result<Vec<PipelineDefinition>, PipelineError> {
        let rows = sqlx::query("SELECT data FROM pipeline_definitions ORDER BY updated_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::infra_err("listing pipeline definitions", e))?;

        rows.iter().map(row_to_definition).collect()
    }

    async fn delete(&self, id: &PipelineId) -> Result<(), PipelineError> {
        sqlx::query("DELETE FROM pipeline_definitions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| Self::infra_err("deleting pipeline definition", e))?;
        Ok(())
    }
}
