// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Replay service (spec §4.5): re-runs one or more journaled payloads from
//! an arbitrary `stepKey`, optionally applying a patch first. Delegates the
//! actual re-execution to [`PipelineOrchestrator::replay_from_step`], which
//! already implements `ReplayFromStep` end-to-end; this service's own job
//! is resolving error ids to payloads, applying patches, and recording the
//! retry audit trail before handing off.
//!
//! "Suppressing duplicate error capture" (spec §4.5) means a replay that
//! fails again at the same step does get a fresh [`RecordError`] appended —
//! it's a new failure, possibly against a patched payload — but the
//! original error being replayed is never re-appended just because it was
//! read back out of the journal.

use crate::application::orchestrator::{PipelineOrchestrator, RunSummary};
use crate::application::retry_audit_service::RetryAuditService;
use pipeline_runtime_domain::entities::{PipelineDefinition, RecordEnvelope};
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::repositories::ErrorJournalRepository;
use pipeline_runtime_domain::services::request_context::RequestContext;
use pipeline_runtime_domain::value_objects::RecordId;
use serde_json::Value;
use std::sync::Arc;

pub struct ReplayService {
    orchestrator: Arc<PipelineOrchestrator>,
    error_journal: Arc<dyn ErrorJournalRepository>,
    retry_audit: Arc<RetryAuditService>,
}

impl ReplayService {
    pub fn new(orchestrator: Arc<PipelineOrchestrator>, error_journal: Arc<dyn ErrorJournalRepository>, retry_audit: Arc<RetryAuditService>) -> Self {
        Self {
            orchestrator,
            error_journal,
            retry_audit,
        }
    }

    /// Replays a single journaled error, applying `patch` (a JSON merge
    /// patch) to its captured payload before re-running from its step.
    pub async fn replay_error(
        &self,
        definition: &PipelineDefinition,
        error_id: &RecordId,
        patch: Option<Value>,
        user_id: Option<String>,
        request: RequestContext,
    ) -> Result<RunSummary, PipelineError> {
        let error = self
            .error_journal
            .find_by_id(error_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("record error '{}' not found", error_id)))?;

        let payload = match patch {
            Some(patch) => self.retry_audit.record_retry(&error, patch, user_id).await?,
            None => error.payload.clone(),
        };

        self.orchestrator
            .replay_from_step(definition, &error.step_key, vec![RecordEnvelope::new(payload)], request)
            .await
    }

    /// Replays every recoverable error journaled for `run_id` against the
    /// same step, grouping by step key since `replay_from_step` re-runs a
    /// single step onward per call.
    pub async fn replay_recoverable_for_run(&self, definition: &PipelineDefinition, run_id: &pipeline_runtime_domain::value_objects::RunId, request: RequestContext) -> Result<Vec<RunSummary>, PipelineError> {
        let errors = self.error_journal.list_recoverable_for_run(run_id).await?;
        let mut summaries = Vec::new();

        let mut by_step: std::collections::BTreeMap<String, Vec<Value>> = std::collections::BTreeMap::new();
        for error in errors {
            by_step.entry(error.step_key.as_str().to_string()).or_default().push(error.payload.clone());
        }

        for (step_key, payloads) in by_step {
            let key = pipeline_runtime_domain::value_objects::StepKey::new(&step_key)?;
            let envelopes = payloads.into_iter().map(RecordEnvelope::new).collect();
            let summary = self.orchestrator.replay_from_step(definition, &key, envelopes, request.clone()).await?;
            summaries.push(summary);
        }

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::checkpoint_service::CheckpointService;
    use crate::application::orchestrator::RunCancellationRegistry;
    use crate::application::step_executors::StepExecutorRegistry;
    use async_trait::async_trait;
    use pipeline_runtime_domain::entities::checkpoint::Checkpoint;
    use pipeline_runtime_domain::entities::pipeline_run::RunEvent;
    use pipeline_runtime_domain::entities::RecordError;
    use pipeline_runtime_domain::repositories::{CheckpointRepository, PipelineRunRepository};
    use pipeline_runtime_domain::services::event_publisher::EventPublisher;
    use pipeline_runtime_domain::value_objects::{PipelineId, RunId};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct NoOpCheckpointRepository;
    #[async_trait]
    impl CheckpointRepository for NoOpCheckpointRepository {
        async fn save(&self, _checkpoint: Checkpoint) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn load_latest(&self, _pipeline_id: &PipelineId) -> Result<Option<Checkpoint>, PipelineError> {
            Ok(None)
        }
        async fn clear(&self, _pipeline_id: &PipelineId) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct InMemoryRunRepository {
        events: Mutex<std::collections::HashMap<RunId, Vec<RunEvent>>>,
        snapshots: Mutex<std::collections::HashMap<RunId, pipeline_runtime_domain::entities::PipelineRun>>,
    }
    #[async_trait]
    impl PipelineRunRepository for InMemoryRunRepository {
        async fn append_events(&self, run_id: &RunId, _expected_version: u64, events: &[RunEvent]) -> Result<(), PipelineError> {
            self.events.lock().await.entry(run_id.clone()).or_default().extend_from_slice(events);
            Ok(())
        }
        async fn load_events(&self, run_id: &RunId) -> Result<Vec<RunEvent>, PipelineError> {
            Ok(self.events.lock().await.get(run_id).cloned().unwrap_or_default())
        }
        async fn save_snapshot(&self, run: &pipeline_runtime_domain::entities::PipelineRun) -> Result<(), PipelineError> {
            self.snapshots.lock().await.insert(run.id.clone(), run.clone());
            Ok(())
        }
        async fn find_by_id(&self, run_id: &RunId) -> Result<Option<pipeline_runtime_domain::entities::PipelineRun>, PipelineError> {
            Ok(self.snapshots.lock().await.get(run_id).cloned())
        }
        async fn find_active_for_pipeline(&self, _pipeline_id: &PipelineId) -> Result<Vec<pipeline_runtime_domain::entities::PipelineRun>, PipelineError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct InMemoryErrorJournal {
        errors: Mutex<Vec<RecordError>>,
    }
    #[async_trait]
    impl ErrorJournalRepository for InMemoryErrorJournal {
        async fn append(&self, error: RecordError) -> Result<(), PipelineError> {
            self.errors.lock().await.push(error);
            Ok(())
        }
        async fn find_by_id(&self, id: &RecordId) -> Result<Option<RecordError>, PipelineError> {
            Ok(self.errors.lock().await.iter().find(|e| &e.id == id).cloned())
        }
        async fn list_for_run(&self, run_id: &RunId) -> Result<Vec<RecordError>, PipelineError> {
            Ok(self.errors.lock().await.iter().filter(|e| &e.run_id == run_id).cloned().collect())
        }
        async fn list_recoverable_for_run(&self, run_id: &RunId) -> Result<Vec<RecordError>, PipelineError> {
            Ok(self.errors.lock().await.iter().filter(|e| &e.run_id == run_id && e.recoverable).cloned().collect())
        }
        async fn append_retry_audit(&self, _audit: pipeline_runtime_domain::entities::RetryAudit) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn list_retry_audits(&self, _error_id: &RecordId) -> Result<Vec<pipeline_runtime_domain::entities::RetryAudit>, PipelineError> {
            Ok(vec![])
        }
    }

    struct NoOpEvents;
    #[async_trait]
    impl EventPublisher for NoOpEvents {}

    #[tokio::test]
    async fn replay_error_returns_not_found_for_an_unknown_error_id() {
        let orchestrator = Arc::new(PipelineOrchestrator::new(
            Arc::new(StepExecutorRegistry::new()),
            Arc::new(CheckpointService::new(Arc::new(NoOpCheckpointRepository))),
            Arc::new(InMemoryRunRepository::default()),
            Arc::new(InMemoryErrorJournal::default()),
            Arc::new(NoOpEvents),
            Arc::new(RunCancellationRegistry::new()),
        ));
        let error_journal: Arc<dyn ErrorJournalRepository> = Arc::new(InMemoryErrorJournal::default());
        let retry_audit = Arc::new(RetryAuditService::new(error_journal.clone()));
        let service = ReplayService::new(orchestrator, error_journal, retry_audit);

        let definition = pipeline_runtime_domain::entities::pipeline_definition::PipelineDefinition {
            id: PipelineId::new(),
            code: "p".into(),
            name: "p".into(),
            enabled: true,
            status: pipeline_runtime_domain::entities::pipeline_definition::PipelineStatus::Published,
            version: 1,
            published_at: None,
            steps: vec![],
            triggers: vec![],
            context: Default::default(),
            error_handling: Default::default(),
            checkpointing: Default::default(),
            parallel_execution: Default::default(),
            hooks: Default::default(),
        };

        let result = service
            .replay_error(&definition, &RecordId::new(), None, None, RequestContext::default())
            .await;
        assert!(result.is_err());
    }
}
