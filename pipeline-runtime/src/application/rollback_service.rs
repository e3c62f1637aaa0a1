// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Rollback journal replay (spec §3, §4.3). A batch transaction's
//! operations are undone in *reverse insertion order*: CREATE deletes the
//! created entity, UPDATE restores `previous_state`, DELETE re-inserts
//! `previous_state`. `rollback` rewinds the whole transaction;
//! `partial_rollback` rewinds only a suffix, matching the orchestrator's
//! spec-named `partialRollback(ctx, txId, fromIndex)`.
//!
//! Restoring a DELETE re-inserts `previous_state` through
//! `EntityLoader::create_entity`, which may mint a new downstream id rather
//! than resurrecting the original one — the same ambiguity spec §9 flags
//! for UPDATE's relation-column restore. Recorded as an open question in
//! DESIGN.md rather than resolved here.

use crate::application::loader_engine::registry::LoaderRegistry;
use crate::application::step_executors::load::RollbackJournalStore;
use pipeline_runtime_domain::entities::rollback_journal::{RollbackOpType, RollbackOperation, RollbackStatus, RollbackTransaction};
use pipeline_runtime_domain::entities::RecordEnvelope;
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::entity_loader::LoaderContext;
use pipeline_runtime_domain::value_objects::RollbackTransactionId;
use std::sync::Arc;
use std::time::Duration as StdDuration;

#[derive(Debug, Clone, Default)]
pub struct RollbackOutcome {
    pub rolled: u64,
    pub failed: u64,
}

pub struct RollbackService {
    store: Arc<RollbackJournalStore>,
    loaders: Arc<LoaderRegistry>,
}

impl RollbackService {
    pub fn new(store: Arc<RollbackJournalStore>, loaders: Arc<LoaderRegistry>) -> Self {
        Self { store, loaders }
    }

    /// Replays every operation in `tx_id`'s journal in reverse order,
    /// marking the transaction `ROLLED_BACK` when every operation inverts
    /// cleanly, or `PARTIAL_ROLLBACK` if any operation fails partway
    /// through (the journal is left as-is for later inspection either way).
    pub async fn rollback(&self, tx_id: &RollbackTransactionId) -> Result<RollbackOutcome, PipelineError> {
        self.replay(tx_id, 0).await
    }

    /// Rewinds only the suffix of the journal from `from_index` onward.
    pub async fn partial_rollback(&self, tx_id: &RollbackTransactionId, from_index: usize) -> Result<RollbackOutcome, PipelineError> {
        self.replay(tx_id, from_index).await
    }

    async fn replay(&self, tx_id: &RollbackTransactionId, from_index: usize) -> Result<RollbackOutcome, PipelineError> {
        let Some(mut tx) = self.store.snapshot(tx_id).await else {
            return Err(PipelineError::NotFound(format!("rollback transaction '{}' not found", tx_id)));
        };

        let ops: Vec<RollbackOperation> = tx.operations_in_partial_rollback_order(from_index).cloned().collect();
        let mut outcome = RollbackOutcome::default();

        for op in &ops {
            match self.invert(op).await {
                Ok(()) => outcome.rolled += 1,
                Err(_) => outcome.failed += 1,
            }
        }

        tx.status = if outcome.failed == 0 && from_index == 0 {
            RollbackStatus::RolledBack
        } else {
            RollbackStatus::PartialRollback
        };
        self.store.put(tx).await;

        Ok(outcome)
    }

    async fn invert(&self, op: &RollbackOperation) -> Result<(), PipelineError> {
        let loader = self.loaders.get(&op.entity_type)?;
        let ctx = LoaderContext::default();

        match op.op_type {
            RollbackOpType::Create => loader.delete_entity(&ctx, &op.entity_id).await,
            RollbackOpType::Update => {
                let Some(previous) = &op.previous_state else {
                    return Err(PipelineError::InvalidConfiguration(format!(
                        "rollback of UPDATE on '{}' has no previous_state to restore",
                        op.entity_id
                    )));
                };
                loader.update_entity(&ctx, &op.entity_id, &RecordEnvelope::new(previous.clone())).await
            }
            RollbackOpType::Delete => {
                let Some(previous) = &op.previous_state else {
                    return Err(PipelineError::InvalidConfiguration(format!(
                        "rollback of DELETE on '{}' has no previous_state to restore",
                        op.entity_id
                    )));
                };
                loader.create_entity(&ctx, &RecordEnvelope::new(previous.clone())).await.map(|_| ())
            }
        }
    }
}

/// Spawns the stale-transaction sweeper named in spec §5: on a fixed
/// interval, drops every rollback transaction in a terminal status or
/// older than `max_age`. Returns the task handle so the caller can abort it
/// during shutdown.
pub fn spawn_sweeper(store: Arc<RollbackJournalStore>, interval: StdDuration, max_age: chrono::Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let swept = store.sweep(max_age).await;
            if !swept.is_empty() {
                tracing::debug!(count = swept.len(), "swept stale rollback transactions");
            }
        }
    })
}
