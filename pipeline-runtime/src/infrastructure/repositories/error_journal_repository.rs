// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`ErrorJournalRepository`]. `error_journal` is append-only
//! per spec §7; retrying a record appends to `retry_audits` rather than
//! mutating the original row.

use async_trait::async_trait;
use pipeline_runtime_domain::entities::{RecordError, RetryAudit};
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::repositories::ErrorJournalRepository;
use pipeline_runtime_domain::value_objects::{RecordId, RunId};
use sqlx::{Row, SqlitePool};

pub struct SqliteErrorJournalRepository {
    pool: SqlitePool,
}

impl SqliteErrorJournalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn infra_err(context: &str, err: sqlx::Error) -> PipelineError {
        PipelineError::InfrastructureFailure(format!("{context}: {err}"))
    }
}

fn row_to_record_error(row: &sqlx::sqlite::SqliteRow) -> Result<RecordError, PipelineError> {
    let data: String = row.try_get("data").map_err(|e| SqliteErrorJournalRepository::infra_err("reading row", e))?;
    Ok(serde_json::from_str(&data)?)
}

fn row_to_retry_audit(row: &sqlx::sqlite::SqliteRow) -> Result<RetryAudit, PipelineError> {
    let data: String = row.try_get("data").map_err(|e| SqliteErrorJournalRepository::infra_err("reading row", e))?;
    Ok(serde_json::from_str(&data)?)
}

#[async_trait]
impl ErrorJournalRepository for SqliteErrorJournalRepository {
    async fn append(&self, error: RecordError) -> Result<(), PipelineError> {
        let data = serde_json::to_string(&error)?;
        sqlx::query("INSERT INTO error_journal (id, run_id, step_key, recoverable, data, recorded_at) VALUES (?, ?, ?, ?, ?, ?)")
            .bind(error.id.to_string())
            .bind(error.run_id.to_string())
            .bind(error.step_key.as_str())
            .bind(error.recoverable as i64)
            .bind(data)
            .bind(error.timestamp.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| Self::infra_err("appending record error", e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &RecordId) -> Result<Option<RecordError>, PipelineError> {
        let row = sqlx::query("SELECT data FROM error_journal WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::infra_err("loading record error", e))?;

        row.as_ref().map(row_to_record_error).transpose()
    }

    async fn list_for_run(&self, run_id: &RunId) -> Result<Vec<RecordError>, PipelineError> {
        let rows = sqlx::query("SELECT data FROM error_journal WHERE run_id = ? ORDER BY recorded_at ASC")
            .bind(run_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::infra_err("listing record errors", e))?;

        rows.iter().map(row_to_record_error).collect()
    }

    async fn list_recoverable_for_run(&self, run_id: &RunId) -> Result<Vec<RecordError>, PipelineError> {
        let rows = sqlx::query("SELECT data FROM error_journal WHERE run_id = ? AND recoverable = 1 ORDER BY recorded_at ASC")
            .bind(run_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::infra_err("listing recoverable record errors", e))?;

        rows.iter().map(row_to_record_error).collect()
    }

    async fn append_retry_audit(&self, audit: RetryAudit) -> Result<(), PipelineError> {
        let data = serde_json::to_string(&audit)?;
        sqlx::query("INSERT INTO retry_audits (id, error_id, data, created_at) VALUES (?, ?, ?, ?)")
            .bind(audit.id.to_string())
            .bind(audit.error_id.to_string())
            .bind(data)
            .bind(audit.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| Self::infra_err("appending retry audit", e))?;
        Ok(())
    }

    async fn list_retry_audits(&self, error_id: &RecordId) -> Result<Vec<RetryAudit>, PipelineError> {
        let rows = sqlx::query("SELECT data FROM retry_audits WHERE error_id = ? ORDER BY created_at ASC")
            .bind(error_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::infra_err("listing retry audits", e))?;

        rows.iter().map(row_to_retry_audit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema::ensure_schema;
    use pipeline_runtime_domain::value_objects::StepKey;

    async fn pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        ensure_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn append_then_list_for_run_preserves_order() {
        let repo = SqliteErrorJournalRepository::new(pool().await);
        let run_id = RunId::new();
        let step_key = StepKey::new("load").unwrap();

        let first = RecordError::new(run_id.clone(), step_key.clone(), "bad sku", serde_json::json!({}));
        let second = RecordError::new(run_id.clone(), step_key, "connection timeout", serde_json::json!({}));
        repo.append(first.clone()).await.unwrap();
        repo.append(second.clone()).await.unwrap();

        let all = repo.list_for_run(&run_id).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first.id);

        let recoverable = repo.list_recoverable_for_run(&run_id).await.unwrap();
        assert_eq!(recoverable.len(), 1);
        assert_eq!(recoverable[0].id, second.id);
    }

    #[tokio::test]
    async fn retry_audit_round_trips() {
        let repo = SqliteErrorJournalRepository::new(pool().await);
        let run_id = RunId::new();
        let step_key = StepKey::new("load").unwrap();
        let error = RecordError::new(run_id, step_key, "bad sku", serde_json::json!({"sku": null}));
        repo.append(error.clone()).await.unwrap();

        let audit = RetryAudit::new(
            error.id.clone(),
            Some("operator-1".into()),
            error.payload.clone(),
            serde_json::json!({"sku": "X-1"}),
            serde_json::json!({"sku": "X-1"}),
        );
        repo.append_retry_audit(audit.clone()).await.unwrap();

        let audits = repo.list_retry_audits(&error.id).await.unwrap();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].id, audit.id);
    }
}
