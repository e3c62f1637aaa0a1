// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence contract for batch rollback transactions (spec §7). The
//! sweep job that expires stale `PENDING` transactions reads through
//! `list_pending_older_than` rather than scanning every transaction.

use crate::entities::RollbackTransaction;
use crate::error::PipelineError;
use crate::value_objects::RollbackTransactionId;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait RollbackRepository: Send + Sync {
    async fn save(&self, transaction: &RollbackTransaction) -> Result<(), PipelineError>;

    async fn find_by_id(&self, id: &RollbackTransactionId) -> Result<Option<RollbackTransaction>, PipelineError>;

    async fn list_pending_older_than(&self, max_age: Duration) -> Result<Vec<RollbackTransaction>, PipelineError>;
}
