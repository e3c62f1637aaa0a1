// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Per-batch-transaction rollback journal. Append-only until the
//! transaction reaches a terminal status; on failure, operations replay in
//! *reverse insertion order* (CREATE -> delete, UPDATE -> restore previous
//! state, DELETE -> re-insert previous state).

use crate::error::PipelineError;
use crate::value_objects::RollbackTransactionId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RollbackOpType {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackOperation {
    pub op_type: RollbackOpType,
    pub entity_type: String,
    pub entity_id: String,
    pub previous_state: Option<serde_json::Value>,
    pub new_state: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RollbackStatus {
    Pending,
    Committed,
    RolledBack,
    PartialRollback,
}

impl RollbackStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RollbackStatus::Committed | RollbackStatus::RolledBack | RollbackStatus::PartialRollback
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackTransaction {
    pub id: RollbackTransactionId,
    pub status: RollbackStatus,
    pub operations: Vec<RollbackOperation>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl RollbackTransaction {
    pub fn new() -> Self {
        Self {
            id: RollbackTransactionId::new(),
            status: RollbackStatus::Pending,
            operations: Vec::new(),
            created_at: chrono::Utc::now(),
        }
    }

    /// Appends an operation. Fails if the transaction has already reached
    /// a terminal status — the journal is append-only until then.
    pub fn append(&mut self, operation: RollbackOperation) -> Result<(), PipelineError> {
        if self.status.is_terminal() {
            return Err(PipelineError::InvalidConfiguration(format!(
                "cannot append to rollback transaction {} in terminal status",
                self.id
            )));
        }
        self.operations.push(operation);
        Ok(())
    }

    /// Operations in reverse insertion order, the order `rollback` must
    /// replay them in.
    pub fn operations_in_rollback_order(&self) -> impl Iterator<Item = &RollbackOperation> {
        self.operations.iter().rev()
    }

    /// Operations from `from_index` onward, in reverse order, for
    /// `partialRollback(ctx, txId, fromIndex)`.
    pub fn operations_in_partial_rollback_order(&self, from_index: usize) -> impl Iterator<Item = &RollbackOperation> {
        self.operations[from_index.min(self.operations.len())..].iter().rev()
    }

    pub fn age(&self) -> chrono::Duration {
        chrono::Utc::now() - self.created_at
    }

    pub fn is_stale(&self, max_age: chrono::Duration) -> bool {
        self.status.is_terminal() || self.age() > max_age
    }
}

impl Default for RollbackTransaction {
    fn default() -> Self {
        Self::new()
    }
}
