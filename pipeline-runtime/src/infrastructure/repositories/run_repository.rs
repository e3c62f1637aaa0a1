// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`PipelineRunRepository`]. Event-sourced: `run_events`
//! holds the append-only history a [`PipelineRunAggregate`] replays through
//! `from_events`; `run_snapshots` holds the latest materialized
//! [`PipelineRun`] for cheap reads (`find_by_id`, `find_active_for_pipeline`)
//! that don't need to replay the whole stream.

use async_trait::async_trait;
use pipeline_runtime_domain::aggregates::RunEvent;
use pipeline_runtime_domain::entities::{PipelineRun, RunStatus};
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::repositories::PipelineRunRepository;
use pipeline_runtime_domain::value_objects::{PipelineId, RunId};
use sqlx::{Row, SqlitePool};

pub struct SqlitePipelineRunRepository {
    pool: SqlitePool,
}

impl SqlitePipelineRunRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn infra_err(context: &str, err: sqlx::Error) -> PipelineError {
        PipelineError::InfrastructureFailure(format!("{context}: {err}"))
    }
}

fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Pending => "PENDING",
        RunStatus::Running => "RUNNING",
        RunStatus::Completed => "COMPLETED",
        RunStatus::Failed => "FAILED",
        RunStatus::Cancelled => "CANCELLED",
        RunStatus::Paused => "PAUSED",
    }
}

fn row_to_run(row: &sqlx::sqlite::SqliteRow) -> Result<PipelineRun, PipelineError> {
    let data: String = row.try_get("data").map_err(|e| SqlitePipelineRunRepository::infra_err("reading row", e))?;
    Ok(serde_json::from_str(&data)?)
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<RunEvent, PipelineError> {
    let data: String = row.try_get("data").map_err(|e| SqlitePipelineRunRepository::infra_err("reading row", e))?;
    Ok(serde_json::from_str(&data)?)
}

#[async_trait]
impl PipelineRunRepository for SqlitePipelineRunRepository {
    async fn append_events(&self, run_id: &RunId, expected_version: u64, events: &[RunEvent]) -> Result<(), PipelineError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(|e| Self::infra_err("starting transaction", e))?;

        let actual_version: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM run_events WHERE run_id = ?")
            .bind(run_id.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| Self::infra_err("reading run version", e))?;

        if actual_version as u64 != expected_version {
            return Err(PipelineError::InfrastructureFailure(format!(
                "optimistic concurrency conflict on run '{}': expected version {} but found {}",
                run_id, expected_version, actual_version
            )));
        }

        for (offset, event) in events.iter().enumerate() {
            let sequence = expected_version + offset as u64 + 1;
            let data = serde_json::to_string(event)?;
            sqlx::query("INSERT INTO run_events (run_id, sequence, data, recorded_at) VALUES (?, ?, ?, ?)")
                .bind(run_id.to_string())
                .bind(sequence as i64)
                .bind(data)
                .bind(chrono::Utc::now().to_rfc3339())
                .execute(&mut *tx)
                .await
                .map_err(|e| Self::infra_err("appending run event", e))?;
        }

        tx.commit().await.map_err(|e| Self::infra_err("committing transaction", e))?;
        Ok(())
    }

    async fn load_events(&self, run_id: &RunId) -> Result<Vec<RunEvent>, PipelineError> {
        let rows = sqlx::query("SELECT data FROM run_events WHERE run_id = ? ORDER BY sequence ASC")
            .bind(run_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::infra_err("loading run events", e))?;

        rows.iter().map(row_to_event).collect()
    }

    async fn save_snapshot(&self, run: &PipelineRun) -> Result<(), PipelineError> {
        let data = serde_json::to_string(run)?;
        sqlx::query(
            "INSERT INTO run_snapshots (run_id, pipeline_id, status, data, updated_at) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(run_id) DO UPDATE SET status = excluded.status, data = excluded.data, updated_at = excluded.updated_at",
        )
        .bind(run.id.to_string())
        .bind(run.pipeline_id.to_string())
        .bind(status_label(run.status))
        .bind(data)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Self::infra_err("saving run snapshot", e))?;

        Ok(())
    }

    async fn find_by_id(&self, run_id: &RunId) -> Result<Option<PipelineRun>, PipelineError> {
        let row = sqlx::query("SELECT data FROM run_snapshots WHERE run_id = ?")
            .bind(run_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::infra_err("loading run snapshot", e))?;

        row.as_ref().map(row_to_run).transpose()
    }

    async fn find_active_for_pipeline(&self, pipeline_id: &PipelineId) -> Result<Vec<PipelineRun>, PipelineError> {
        let rows = sqlx::query(
            "SELECT data FROM run_snapshots WHERE pipeline_id = ? AND status IN ('PENDING', 'RUNNING', 'PAUSED')
             ORDER BY updated_at DESC",
        )
        .bind(pipeline_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Self::infra_err("listing active runs", e))?;

        rows.iter().map(row_to_run).collect()
    }
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
    async fn append_then_load_events_preserves_order() {
        let repo = SqlitePipelineRunRepository::new(pool().await);
        let pipeline_id = PipelineId::new();
        let run_id = RunId::new();

        repo.append_events(&run_id, 0, &[RunEvent::Started { pipeline_id: pipeline_id.clone(), run_id: run_id.clone() }])
            .await
            .unwrap();
        repo.append_events(&run_id, 1, &[RunEvent::Completed]).await.unwrap();

        let events = repo.load_events(&run_id).await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], RunEvent::Completed));
    }

    #[tokio::test]
    async fn append_events_rejects_version_conflict() {
        let repo = SqlitePipelineRunRepository::new(pool().await);
        let pipeline_id = PipelineId::new();
        let run_id = RunId::new();
        repo.append_events(&run_id, 0, &[RunEvent::Started { pipeline_id, run_id: run_id.clone() }]).await.unwrap();

        let result = repo.append_events(&run_id, 0, &[RunEvent::Completed]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn find_active_for_pipeline_excludes_terminal_runs() {
        let repo = SqlitePipelineRunRepository::new(pool().await);
        let pipeline_id = PipelineId::new();

        let mut running = pipeline_runtime_domain::entities::PipelineRun::new(pipeline_id.clone());
        running.status = RunStatus::Running;
        repo.save_snapshot(&running).await.unwrap();

        let mut completed = pipeline_runtime_domain::entities::PipelineRun::new(pipeline_id.clone());
        completed.status = RunStatus::Completed;
        repo.save_snapshot(&completed).await.unwrap();

        let active = repo.find_active_for_pipeline(&pipeline_id).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, running.id);
    }
}
