// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `LOAD` step executor: hands a batch to the registered loader via the
//! shared [`run_batch`] loop, journaling rollback operations into the
//! transaction named by the run context (if any).

use crate::application::loader_engine::registry::LoaderRegistry;
use crate::application::loader_engine::{run_batch, LoaderSpec};
use async_trait::async_trait;
use pipeline_runtime_domain::entities::pipeline_definition::{StepDefinition, StepType};
use pipeline_runtime_domain::entities::rollback_journal::RollbackTransaction;
use pipeline_runtime_domain::entities::{RecordEnvelope, StepMetrics};
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::entity_loader::{LoaderContext, Operation};
use pipeline_runtime_domain::services::run_context::RunContext;
use pipeline_runtime_domain::services::step_executor::{ResourceRequirements, StepExecutor, StepOutcome, StepRecordFailure};
use pipeline_runtime_domain::value_objects::RollbackTransactionId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared, process-wide store of in-flight rollback transactions, keyed by
/// the id a [`RunContext`] names. Held behind a `tokio::sync::Mutex` so the
/// lock can stay taken across the awaits inside `run_batch`.
#[derive(Default)]
pub struct RollbackJournalStore {
    transactions: Mutex<HashMap<RollbackTransactionId, RollbackTransaction>>,
}

impl RollbackJournalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self, id: &RollbackTransactionId) -> Option<RollbackTransaction> {
        self.transactions.lock().await.get(id).cloned()
    }

    /// Replaces a transaction's stored state, used by the rollback service
    /// after it has mutated a snapshot (status change, or an append that
    /// happened outside `LoadStepExecutor`).
    pub async fn put(&self, transaction: RollbackTransaction) {
        self.transactions.lock().await.insert(transaction.id.clone(), transaction);
    }

    pub async fn remove(&self, id: &RollbackTransactionId) -> Option<RollbackTransaction> {
        self.transactions.lock().await.remove(id)
    }

    /// Drops every transaction in a terminal status or older than `max_age`,
    /// returning the ids removed. Backs the stale-transaction sweeper (spec
    /// §5: `CLEANUP_INTERVAL_MS` / `MAX_TRANSACTION_AGE_MS`).
    pub async fn sweep(&self, max_age: chrono::Duration) -> Vec<RollbackTransactionId> {
        let mut transactions = self.transactions.lock().await;
        let stale: Vec<RollbackTransactionId> = transactions
            .values()
            .filter(|tx| tx.is_stale(max_age))
            .map(|tx| tx.id.clone())
            .collect();
        for id in &stale {
            transactions.remove(id);
        }
        stale
    }
}

fn parse_operation(config: &serde_json::Value) -> Result<Operation, PipelineError> {
    match config.get("operation").and_then(|v| v.as_str()) {
        Some("CREATE") => Ok(Operation::Create),
        Some("UPDATE") => Ok(Operation::Update),
        Some("UPSERT") | None => Ok(Operation::Upsert),
        Some("DELETE") => Ok(Operation::Delete),
        Some(other) => Err(PipelineError::InvalidConfiguration(format!("unknown load operation '{}'", other))),
    }
}

pub struct LoadStepExecutor {
    loaders: Arc<LoaderRegistry>,
    rollback_store: Arc<RollbackJournalStore>,
    dry_run: bool,
}

impl LoadStepExecutor {
    pub fn new(loaders: Arc<LoaderRegistry>, rollback_store: Arc<RollbackJournalStore>, dry_run: bool) -> Self {
        Self {
            loaders,
            rollback_store,
            dry_run,
        }
    }
}

#[async_trait]
impl StepExecutor for LoadStepExecutor {
    fn step_type(&self) -> StepType {
        StepType::Load
    }

    fn resource_requirements(&self) -> ResourceRequirements {
        ResourceRequirements {
            cpu_intensive: false,
            io_intensive: true,
            max_concurrent_batches: 1,
        }
    }

    async fn execute(&self, step: &StepDefinition, ctx: &RunContext, input: Vec<RecordEnvelope>) -> Result<StepOutcome, PipelineError> {
        let entity_type = step.config.get("entityType").and_then(|v| v.as_str()).ok_or_else(|| {
            PipelineError::InvalidConfiguration("LOAD step config requires 'entityType'".to_string())
        })?;
        let loader = self.loaders.get(entity_type)?;

        let operation = parse_operation(&step.config)?;
        let skip_duplicates = step.config.get("skipDuplicates").and_then(|v| v.as_bool()).unwrap_or(false);
        let spec = LoaderSpec::new(operation, skip_duplicates);

        let loader_ctx = LoaderContext {
            request: ctx.request.clone(),
            dry_run: self.dry_run,
        };

        let batch_result = match &ctx.rollback_transaction_id {
            Some(tx_id) => {
                let mut transactions = self.rollback_store.transactions.lock().await;
                let tx = transactions.entry(tx_id.clone()).or_insert_with(RollbackTransaction::new);
                run_batch(loader.as_ref(), &loader_ctx, &spec, input, Some(tx)).await?
            }
            None => run_batch(loader.as_ref(), &loader_ctx, &spec, input, None).await?,
        };

        let mut metrics = StepMetrics::default();
        metrics.processed = batch_result.succeeded + batch_result.failed + batch_result.skipped;
        metrics.succeeded = batch_result.succeeded;
        metrics.failed = batch_result.failed;
        metrics.skipped = batch_result.skipped;
        metrics.created = batch_result.created;
        metrics.updated = batch_result.updated;

        let output: Vec<RecordEnvelope> = batch_result
            .affected_ids
            .iter()
            .map(|id| RecordEnvelope::new(serde_json::json!({ "id": id })))
            .collect();

        if ctx.samples_logging_enabled() {
            for record in &output {
                tracing::debug!(step = %step.step_key, entity_type, sample = %record.data, "onLoadData");
            }
        }

        let record_failures = batch_result
            .errors
            .into_iter()
            .map(|err| StepRecordFailure {
                payload: err.record.data,
                message: err.message,
                code: err.code,
                recoverable: err.recoverable,
            })
            .collect();

        Ok(StepOutcome {
            output,
            metrics,
            record_failures,
            paused: false,
        })
    }
}
