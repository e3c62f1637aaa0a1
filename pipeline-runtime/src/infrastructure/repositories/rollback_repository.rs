// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`RollbackRepository`]. `status` is pulled out of the JSON
//! blob into its own column so the stale-transaction sweep's
//! `list_pending_older_than` doesn't have to deserialize every row in the
//! table to filter by status.

use async_trait::async_trait;
use pipeline_runtime_domain::entities::{RollbackStatus, RollbackTransaction};
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::repositories::RollbackRepository;
use pipeline_runtime_domain::value_objects::RollbackTransactionId;
use sqlx::{Row, SqlitePool};
use std::time::Duration;

pub struct SqliteRollbackRepository {
    pool: SqlitePool,
}

impl SqliteRollbackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn infra_err(context: &str, err: sqlx::Error) -> PipelineError {
        PipelineError::InfrastructureFailure(format!("{context}: {err}"))
    }
}

fn status_label(status: RollbackStatus) -> &'static str {
    match status {
        RollbackStatus::Pending => "PENDING",
        RollbackStatus::Committed => "COMMITTED",
        RollbackStatus::RolledBack => "ROLLED_BACK",
        RollbackStatus::PartialRollback => "PARTIAL_ROLLBACK",
    }
}

fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<RollbackTransaction, PipelineError> {
    let data: String = row.try_get("data").map_err(|e| SqliteRollbackRepository::infra_err("reading row", e))?;
    Ok(serde_json::from_str(&data)?)
}

#[async_trait]
impl RollbackRepository for SqliteRollbackRepository {
    async fn save(&self, transaction: &RollbackTransaction) -> Result<(), PipelineError> {
        let data = serde_json::to_string(transaction)?;
        sqlx::query(
            "INSERT INTO rollback_transactions (id, status, data, created_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET status = excluded.status, data = excluded.data",
        )
        .bind(transaction.id.to_string())
        .bind(status_label(transaction.status))
        .bind(data)
        .bind(transaction.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Self::infra_err("saving rollback transaction", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &RollbackTransactionId) -> Result<Option<RollbackTransaction>, PipelineError> {
        let row = sqlx::query("SELECT data FROM rollback_transactions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::infra_err("loading rollback transaction", e))?;

        row.as_ref().map(row_to_transaction).transpose()
    }

    async fn list_pending_older_than(&self, max_age: Duration) -> Result<Vec<RollbackTransaction>, PipelineError> {
        let cutoff = chrono::Utc::now() - chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::zero());
        let rows = sqlx::query("SELECT data FROM rollback_transactions WHERE status = 'PENDING' AND created_at < ?")
            .bind(cutoff.to_rfc3339())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Self::infra_err("listing stale rollback transactions", e))?;

        rows.iter().map(row_to_transaction).collect()
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
    async fn save_then_find_by_id_round_trips() {
        let repo = SqliteRollbackRepository::new(pool().await);
        let tx = RollbackTransaction::new();

        repo.save(&tx).await.unwrap();
        let loaded = repo.find_by_id(&tx.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, tx.id);
        assert_eq!(loaded.status, RollbackStatus::Pending);
    }

    #[tokio::test]
    async fn list_pending_older_than_excludes_committed_transactions() {
        let repo = SqliteRollbackRepository::new(pool().await);
        let mut committed = RollbackTransaction::new();
        committed.status = RollbackStatus::Committed;
        repo.save(&committed).await.unwrap();

        let pending = RollbackTransaction::new();
        repo.save(&pending).await.unwrap();

        let stale = repo.list_pending_older_than(Duration::from_secs(0)).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, pending.id);
    }
}
