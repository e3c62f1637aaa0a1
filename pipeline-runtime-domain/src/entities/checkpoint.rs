// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Opaque, per-pipeline resume state. A checkpoint is replaced wholesale on
//! each save — it is never merged — and its `sequence` is monotonic within a
//! run: once saved, a checkpoint is never re-ordered (spec §3 invariant).

use crate::error::PipelineError;
use crate::value_objects::PipelineId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub pipeline_id: PipelineId,
    pub sequence: u64,
    pub data: serde_json::Value,
    pub saved_at: chrono::DateTime<chrono::Utc>,
}

impl Checkpoint {
    pub fn new(pipeline_id: PipelineId, sequence: u64, data: serde_json::Value) -> Self {
        Self {
            pipeline_id,
            sequence,
            data,
            saved_at: chrono::Utc::now(),
        }
    }

    /// Validates that `next` does not regress the checkpoint's sequence
    /// relative to `self` before the caller persists it.
    pub fn assert_monotonic(&self, next: &Checkpoint) -> Result<(), PipelineError> {
        if next.sequence < self.sequence {
            return Err(PipelineError::InfrastructureFailure(format!(
                "checkpoint sequence regressed: {} -> {}",
                self.sequence, next.sequence
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_sequence_regression() {
        let pipeline_id = PipelineId::new();
        let first = Checkpoint::new(pipeline_id.clone(), 5, serde_json::json!({}));
        let regressed = Checkpoint::new(pipeline_id, 4, serde_json::json!({}));
        assert!(first.assert_monotonic(&regressed).is_err());
    }
}
