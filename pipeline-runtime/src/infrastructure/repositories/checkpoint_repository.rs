// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`CheckpointRepository`]. One row per pipeline, upserted
//! on every `save` — `save` itself enforces the monotonic-sequence
//! invariant via [`Checkpoint::assert_monotonic`] before writing.

use async_trait::async_trait;
use pipeline_runtime_domain::entities::Checkpoint;
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::repositories::CheckpointRepository;
use pipeline_runtime_domain::value_objects::PipelineId;
use sqlx::{Row, SqlitePool};

pub struct SqliteCheckpointRepository {
    pool: SqlitePool,
}

impl SqliteCheckpointRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn infra_err(context: &str, err: sqlx::Error) -> PipelineError {
        PipelineError::InfrastructureFailure(format!("{context}: {err}"))
    }
}

#[async_trait]
impl CheckpointRepository for SqliteCheckpointRepository {
    async fn save(&self, checkpoint: Checkpoint) -> Result<(), PipelineError> {
        let current = self.load_latest(&checkpoint.pipeline_id).await?;
        if let Some(current) = &current {
            current.assert_monotonic(&checkpoint)?;
        }

        let data = serde_json::to_string(&checkpoint.data)?;
        sqlx::query(
            "INSERT INTO checkpoints (pipeline_id, sequence, data, saved_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(pipeline_id) DO UPDATE SET sequence = excluded.sequence, data = excluded.data, saved_at = excluded.saved_at",
        )
        .bind(checkpoint.pipeline_id.to_string())
        .bind(checkpoint.sequence as i64)
        .bind(data)
        .bind(checkpoint.saved_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Self::infra_err("saving checkpoint", e))?;

        Ok(())
    }

    async fn load_latest(&self, pipeline_id: &PipelineId) -> Result<Option<Checkpoint>, PipelineError> {
        let row = sqlx::query("SELECT pipeline_id, sequence, data, saved_at FROM checkpoints WHERE pipeline_id = ?")
            .bind(pipeline_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::infra_err("loading checkpoint", e))?;

        row.map(|row| row_to_checkpoint(&row)).transpose()
    }

    async fn clear(&self, pipeline_id: &PipelineId) -> Result<(), PipelineError> {
        sqlx::query("DELETE FROM checkpoints WHERE pipeline_id = ?")
            .bind(pipeline_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| Self::infra_err("clearing checkpoint", e))?;
        Ok(())
    }
}

fn row_to_checkpoint(row: &sqlx::sqlite::SqliteRow) -> Result<Checkpoint, PipelineError> {
    let pipeline_id: String = row.try_get("pipeline_id").map_err(|e| SqliteCheckpointRepository::infra_err("reading row", e))?;
    let sequence: i64 = row.try_get("sequence").map_err(|e| SqliteCheckpointRepository::infra_err("reading row", e))?;
    let data: String = row.try_get("data").map_err(|e| SqliteCheckpointRepository::infra_err("reading row", e))?;
    let saved_at: String = row.try_get("saved_at").map_err(|e| SqliteCheckpointRepository::infra_err("reading row", e))?;

    Ok(Checkpoint {
        pipeline_id: PipelineId::from_string(&pipeline_id)?,
        sequence: sequence as u64,
        data: serde_json::from_str(&data)?,
        saved_at: chrono::DateTime::parse_from_rfc3339(&saved_at)
            .map_err(|e| PipelineError::InfrastructureFailure(format!("bad saved_at timestamp: {e}")))?
            .with_timezone(&chrono::Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema::ensure_schema;

    async fn pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        ensure_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn save_then_load_latest_round_trips() {
        let repo = SqliteCheckpointRepository::new(pool().await);
        let pipeline_id = PipelineId::new();
        let checkpoint = Checkpoint::new(pipeline_id.clone(), 1, serde_json::json!({"offset": 10}));

        repo.save(checkpoint.clone()).await.unwrap();
        let loaded = repo.load_latest(&pipeline_id).await.unwrap().unwrap();
        assert_eq!(loaded.sequence, 1);
        assert_eq!(loaded.data, serde_json::json!({"offset": 10}));
    }

    #[tokio::test]
    async fn clear_removes_the_row() {
        let repo = SqliteCheckpointRepository::new(pool().await);
        let pipeline_id = PipelineId::new();
        repo.save(Checkpoint::new(pipeline_id.clone(), 1, serde_json::json!({}))).await.unwrap();

        repo.clear(&pipeline_id).await.unwrap();
        assert!(repo.load_latest(&pipeline_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_monotonic_sequence_is_rejected() {
        let repo = SqliteCheckpointRepository::new(pool().await);
        let pipeline_id = PipelineId::new();
        repo.save(Checkpoint::new(pipeline_id.clone(), 2, serde_json::json!({}))).await.unwrap();

        let stale = Checkpoint::new(pipeline_id, 1, serde_json::json!({}));
        assert!(repo.save(stale).await.is_err());
    }
}
