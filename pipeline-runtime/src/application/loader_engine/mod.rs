// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The loader engine's shared base loop (spec §4.3): a single
//! [`run_batch`] function drives every [`EntityLoader`] through the same
//! validate -> find-existing -> create/update sequence, so the "inheritance
//! collapse" redesign only has to live in one place instead of being
//! re-implemented by each loader.

pub mod reference;
pub mod registry;

use pipeline_runtime_domain::entities::rollback_journal::{RollbackOpType, RollbackOperation, RollbackTransaction};
use pipeline_runtime_domain::entities::RecordEnvelope;
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::entity_loader::{EntityLoader, LoaderContext, Operation};

/// Per-run loader behaviour that isn't owned by the loader implementation
/// itself: which operation this step requests and whether CREATE hits on
/// an existing entity are silently skipped or treated as failures.
#[derive(Debug, Clone, Copy)]
pub struct LoaderSpec {
    pub operation: Operation,
    pub skip_duplicates: bool,
}

impl LoaderSpec {
    pub fn new(operation: Operation, skip_duplicates: bool) -> Self {
        Self { operation, skip_duplicates }
    }
}

#[derive(Debug, Clone)]
pub struct BatchRecordError {
    pub record: RecordEnvelope,
    pub message: String,
    pub code: Option<String>,
    pub recoverable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub succeeded: u64,
    pub failed: u64,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: Vec<BatchRecordError>,
    pub affected_ids: Vec<String>,
}

impl BatchResult {
    fn record_failure(&mut self, record: RecordEnvelope, message: impl Into<String>, code: Option<&str>, recoverable: bool) {
        self.failed += 1;
        self.errors.push(BatchRecordError {
            record,
            message: message.into(),
            code: code.map(str::to_owned),
            recoverable,
        });
    }
}

/// Runs the shared loader loop over `batch`, optionally recording rollback
/// operations into `rollback_tx` as each record commits. Returns
/// `Err(InvalidConfiguration)` without processing any record if `spec`
/// requests an operation the loader doesn't declare support for (the
/// "unsupported requests fail fast" invariant).
pub async fn run_batch(
    loader: &dyn EntityLoader,
    ctx: &LoaderContext,
    spec: &LoaderSpec,
    batch: Vec<RecordEnvelope>,
    mut rollback_tx: Option<&mut RollbackTransaction>,
) -> Result<BatchResult, PipelineError> {
    if !loader.metadata().supported_operations.contains(&spec.operation) {
        return Err(PipelineError::InvalidConfiguration(format!(
            "loader '{}' does not support operation {:?}",
            loader.metadata().entity_type,
            spec.operation
        )));
    }

    let mut result = BatchResult::default();

    for record in batch {
        if let Err(err) = run_one(loader, ctx, spec, &record, &mut result, rollback_tx.as_deref_mut()).await {
            let recoverable = pipeline_runtime_domain::entities::record_error::classify_recoverable(&err.to_string());
            result.record_failure(record, err.to_string(), None, recoverable);
        }
    }

    Ok(result)
}

async fn run_one(
    loader: &dyn EntityLoader,
    ctx: &LoaderContext,
    spec: &LoaderSpec,
    record: &RecordEnvelope,
    result: &mut BatchResult,
    mut rollback_tx: Option<&mut RollbackTransaction>,
) -> Result<(), PipelineError> {
    let validation = loader.validate(ctx, record, spec.operation).await?;
    if !validation.is_valid() {
        let message = validation
            .errors
            .iter()
            .map(|e| e.message.clone())
            .collect::<Vec<_>>()
            .join("; ");
        result.record_failure(record.clone(), message, Some("VALIDATION_FAILED"), false);
        return Ok(());
    }

    let existing = loader.find_existing(ctx, record).await?;

    match (existing, spec.operation) {
        (Some(_found), Operation::Create) if spec.skip_duplicates => {
            result.skipped += 1;
        }
        (Some(_found), Operation::Create) => {
            result.record_failure(record.clone(), "entity already exists", Some("DUPLICATE"), false);
        }
        (Some(found), Operation::Update) | (Some(found), Operation::Upsert) => {
            if !ctx.dry_run {
                loader.update_entity(ctx, &found.id, record).await?;
                if let Some(tx) = rollback_tx.as_deref_mut() {
                    tx.append(RollbackOperation {
                        op_type: RollbackOpType::Update,
                        entity_type: loader.metadata().entity_type.clone(),
                        entity_id: found.id.clone(),
                        previous_state: Some(found.entity.clone()),
                        new_state: Some(record.data.clone()),
                    })?;
                }
            }
            result.updated += 1;
            result.succeeded += 1;
            result.affected_ids.push(found.id);
        }
        (Some(found), Operation::Delete) => {
            if !ctx.dry_run {
                loader.delete_entity(ctx, &found.id).await?;
                if let Some(tx) = rollback_tx.as_deref_mut() {
                    tx.append(RollbackOperation {
                        op_type: RollbackOpType::Delete,
                        entity_type: loader.metadata().entity_type.clone(),
                        entity_id: found.id.clone(),
                        previous_state: Some(found.entity.clone()),
                        new_state: None,
                    })?;
                }
            }
            result.succeeded += 1;
            result.affected_ids.push(found.id);
        }
        (None, Operation::Update) => {
            result.skipped += 1;
        }
        (None, Operation::Create) | (None, Operation::Upsert) => {
            if ctx.dry_run {
                result.created += 1;
                result.succeeded += 1;
                return Ok(());
            }
            match loader.create_entity(ctx, record).await? {
                Some(id) => {
                    if let Some(tx) = rollback_tx.as_deref_mut() {
                        tx.append(RollbackOperation {
                            op_type: RollbackOpType::Create,
                            entity_type: loader.metadata().entity_type.clone(),
                            entity_id: id.clone(),
                            previous_state: None,
                            new_state: Some(record.data.clone()),
                        })?;
                    }
                    result.created += 1;
                    result.succeeded += 1;
                    result.affected_ids.push(id);
                }
                None => {
                    result.record_failure(record.clone(), "create_entity declined the record", None, true);
                }
            }
        }
        (None, Operation::Delete) => {
            result.skipped += 1;
        }
    }

    Ok(())
}
