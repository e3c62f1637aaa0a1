// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Checkpoint lifecycle (spec §4.5): the orchestrator clears the existing
//! checkpoint on a fresh (non-resume) run, loads it back when resuming, and
//! saves a new one at every checkpoint boundary the pipeline's
//! `CheckpointingPolicy` names. This service is the single place that
//! enforces the monotonic-sequence invariant against the previously loaded
//! checkpoint before a save reaches the repository.

use pipeline_runtime_domain::entities::Checkpoint;
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::repositories::CheckpointRepository;
use pipeline_runtime_domain::value_objects::PipelineId;
use std::sync::Arc;

pub struct CheckpointService {
    repository: Arc<dyn CheckpointRepository>,
}

impl CheckpointService {
    pub fn new(repository: Arc<dyn CheckpointRepository>) -> Self {
        Self { repository }
    }

    pub async fn clear(&self, pipeline_id: &PipelineId) -> Result<(), PipelineError> {
        self.repository.clear(pipeline_id).await
    }

    pub async fn load_latest(&self, pipeline_id: &PipelineId) -> Result<Option<Checkpoint>, PipelineError> {
        self.repository.load_latest(pipeline_id).await
    }

    /// Saves the next checkpoint, rejecting a sequence regression against
    /// `previous` (the checkpoint the orchestrator loaded or last saved for
    /// this run) before it reaches the repository.
    pub async fn save_next(&self, previous: Option<&Checkpoint>, next: Checkpoint) -> Result<(), PipelineError> {
        if let Some(previous) = previous {
            previous.assert_monotonic(&next)?;
        }
        self.repository.save(next).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct InMemoryCheckpointRepository {
        latest: Mutex<Option<Checkpoint>>,
    }

    #[async_trait]
    impl CheckpointRepository for InMemoryCheckpointRepository {
        async fn save(&self, checkpoint: Checkpoint) -> Result<(), PipelineError> {
            *self.latest.lock().await = Some(checkpoint);
            Ok(())
        }

        async fn load_latest(&self, _pipeline_id: &PipelineId) -> Result<Option<Checkpoint>, PipelineError> {
            Ok(self.latest.lock().await.clone())
        }

        async fn clear(&self, _pipeline_id: &PipelineId) -> Result<(), PipelineError> {
            *self.latest.lock().await = None;
            Ok(())
        }
    }

    #[tokio::test]
    async fn save_next_rejects_sequence_regression() {
        let service = CheckpointService::new(Arc::new(InMemoryCheckpointRepository::default()));
        let pipeline_id = PipelineId::new();
        let first = Checkpoint::new(pipeline_id.clone(), 5, serde_json::json!({}));
        let regressed = Checkpoint::new(pipeline_id, 4, serde_json::json!({}));

        assert!(service.save_next(Some(&first), regressed).await.is_err());
    }

    #[tokio::test]
    async fn clear_then_load_latest_returns_none() {
        let repository = Arc::new(InMemoryCheckpointRepository::default());
        let service = CheckpointService::new(repository.clone());
        let pipeline_id = PipelineId::new();
        repository.save(Checkpoint::new(pipeline_id.clone(), 1, serde_json::json!({}))).await.unwrap();

        service.clear(&pipeline_id).await.unwrap();
        assert!(service.load_latest(&pipeline_id).await.unwrap().is_none());
    }
}
