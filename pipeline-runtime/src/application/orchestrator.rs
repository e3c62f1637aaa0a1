// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Orchestrator (spec §4.1)
//!
//! Drives a [`PipelineDefinition`]'s steps in declared order, threading a
//! single ordered batch of [`RecordEnvelope`]s from step to step. It never
//! matches on step behavior itself — it looks up the registered
//! [`StepExecutor`] by `step.step_type` and calls `execute`. Run state is
//! event-sourced through [`PipelineRunAggregate`]; checkpoints are saved at
//! the boundaries the pipeline's `CheckpointingPolicy` names; cancellation
//! is checked before every step.

use crate::application::checkpoint_service::CheckpointService;
use crate::application::step_executors::StepExecutorRegistry;
use pipeline_runtime_domain::aggregates::{PipelineRunAggregate, RunEvent};
use pipeline_runtime_domain::entities::pipeline_definition::{
    CheckpointAfter, ConfigValidationMode, ErrorHandlingMode, PipelineDefinition,
};
use pipeline_runtime_domain::entities::{Checkpoint, RecordError, RecordEnvelope};
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::events::{
    DomainEvent, PipelineCompleted, PipelineFailed, PipelineStarted, RecordFailed, StepCompleted, StepFailed,
};
use pipeline_runtime_domain::repositories::{ErrorJournalRepository, PipelineRunRepository};
use pipeline_runtime_domain::services::{CancellationSignal, EventPublisher, RequestContext, RunContext};
use pipeline_runtime_domain::value_objects::{RollbackTransactionId, RunId, StepKey};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Caller-supplied knobs for a single `Execute` invocation (spec §4.1:
/// `options{pipelineId?, runId?, resume?, dryRun?}`). `run_id` is only
/// consulted when `resume` is true, to locate the paused run to continue;
/// a fresh run always mints its own id.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    pub run_id: Option<RunId>,
    pub resume: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct StepSummary {
    pub step_key: StepKey,
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub skipped: u64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: RunId,
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub details: Vec<StepSummary>,
    pub paused: bool,
    pub paused_at_step: Option<StepKey>,
}

/// An `is_cancelled()` signal backed by an in-process flag a
/// [`RunCancellationRegistry`] flips. Lets an external `Cancel(runId)`
/// request reach a run's [`RunContext`] without the two being otherwise
/// coupled.
struct FlagCancellationSignal(Arc<AtomicBool>);

impl CancellationSignal for FlagCancellationSignal {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Maps a [`RunId`] to a cancellation flag for every run currently
/// executing in this process. `Cancel(runId)` (spec §4.1) only reaches runs
/// registered here — a run driven by a different process instance is not
/// observable and must be stopped by sending the process a shutdown signal
/// instead (see `pipeline_runtime_bootstrap::signals`).
#[derive(Default)]
pub struct RunCancellationRegistry {
    flags: Mutex<HashMap<RunId, Arc<AtomicBool>>>,
}

impl RunCancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, run_id: RunId) -> Arc<dyn CancellationSignal> {
        let flag = Arc::new(AtomicBool::new(false));
        self.flags.lock().expect("cancellation registry poisoned").insert(run_id, flag.clone());
        Arc::new(FlagCancellationSignal(flag))
    }

    fn unregister(&self, run_id: &RunId) {
        self.flags.lock().expect("cancellation registry poisoned").remove(run_id);
    }

    /// Requests cancellation of an active run. Returns `NotFound` if no run
    /// with this id is currently executing in this process.
    pub fn cancel(&self, run_id: &RunId) -> Result<(), PipelineError> {
        let flags = self.flags.lock().expect("cancellation registry poisoned");
        match flags.get(run_id) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }
            None => Err(PipelineError::NotFound(format!("run '{}' is not active in this process", run_id))),
        }
    }
}

pub struct PipelineOrchestrator {
    step_executors: Arc<StepExecutorRegistry>,
    checkpoints: Arc<CheckpointService>,
    runs: Arc<dyn PipelineRunRepository>,
    error_journal: Arc<dyn ErrorJournalRepository>,
    events: Arc<dyn EventPublisher>,
    cancellations: Arc<RunCancellationRegistry>,
}

impl PipelineOrchestrator {
    pub fn new(
        step_executors: Arc<StepExecutorRegistry>,
        checkpoints: Arc<CheckpointService>,
        runs: Arc<dyn PipelineRunRepository>,
        error_journal: Arc<dyn ErrorJournalRepository>,
        events: Arc<dyn EventPublisher>,
        cancellations: Arc<RunCancellationRegistry>,
    ) -> Self {
        Self {
            step_executors,
            checkpoints,
            runs,
            error_journal,
            events,
            cancellations,
        }
    }

    pub fn cancellations(&self) -> Arc<RunCancellationRegistry> {
        self.cancellations.clone()
    }

    /// `Execute(pipelineDef, options) -> RunSummary` (spec §4.1). Creates a
    /// pipeline-scoped run context, clears the checkpoint on a fresh run or
    /// loads it back on resume, runs every step, and finalizes the run.
    pub async fn execute(
        &self,
        definition: &PipelineDefinition,
        request: RequestContext,
        options: ExecuteOptions,
    ) -> Result<RunSummary, PipelineError> {
        definition.validate()?;

        let request = self.inherit_context(definition, request);

        if !options.resume {
            if !options.dry_run {
                self.checkpoints.clear(&definition.id).await?;
            }
        }

        let mut aggregate = self.load_or_start_aggregate(definition, &options).await?;
        let run_id = aggregate.run().id.clone();

        let checkpoint = self.checkpoints.load_latest(&definition.id).await?;
        let (mut input, start_index) = self.resume_point(definition, &aggregate, options.resume, checkpoint.as_ref());
        let mut checkpoint_sequence = checkpoint.as_ref().map(|c| c.sequence).unwrap_or(0);
        let mut last_checkpoint = checkpoint;

        let cancellation = self.cancellations.register(run_id.clone());
        let mut ctx = RunContext::new(definition.id.clone(), run_id.clone());
        ctx.request = request;
        ctx.cancellation = cancellation;
        ctx.max_concurrency = definition.parallel_execution.max_concurrent;
        if !options.dry_run {
            ctx.rollback_transaction_id = Some(RollbackTransactionId::new());
        }

        if !options.resume {
            self.persist(&mut aggregate, options.dry_run).await?;
            self.events
                .on_pipeline_started(DomainEvent::new(PipelineStarted {
                    pipeline_id: definition.id.clone(),
                    run_id: run_id.clone(),
                }))
                .await;
        }

        let result = self
            .run_steps(
                definition,
                &ctx,
                &mut aggregate,
                start_index,
                &mut input,
                &mut checkpoint_sequence,
                &mut last_checkpoint,
                options.dry_run,
            )
            .await;

        self.cancellations.unregister(&run_id);
        result
    }

    /// `ReplayFromStep(pipelineDef, stepKey, payloads) -> Summary` (spec
    /// §4.1). Starts a brand-new run seeded with `payloads` as the input to
    /// `step_key`, re-running every step from there forward.
    pub async fn replay_from_step(
        &self,
        definition: &PipelineDefinition,
        step_key: &StepKey,
        payloads: Vec<RecordEnvelope>,
        request: RequestContext,
    ) -> Result<RunSummary, PipelineError> {
        definition.validate()?;

        let start_index = definition
            .steps
            .iter()
            .position(|s| &s.step_key == step_key)
            .ok_or_else(|| PipelineError::NotFound(format!("step '{}' not found in pipeline '{}'", step_key, definition.code)))?;

        let request = self.inherit_context(definition, request);
        let mut aggregate = PipelineRunAggregate::start(definition.id.clone());
        let run_id = aggregate.run().id.clone();

        let cancellation = self.cancellations.register(run_id.clone());
        let mut ctx = RunContext::new(definition.id.clone(), run_id.clone());
        ctx.request = request;
        ctx.cancellation = cancellation;
        ctx.max_concurrency = definition.parallel_execution.max_concurrent;
        ctx.rollback_transaction_id = Some(RollbackTransactionId::new());

        self.persist(&mut aggregate, false).await?;
        self.events
            .on_pipeline_started(DomainEvent::new(PipelineStarted {
                pipeline_id: definition.id.clone(),
                run_id: run_id.clone(),
            }))
            .await;

        let mut checkpoint_sequence = 0u64;
        let mut last_checkpoint: Option<Checkpoint> = None;
        let mut input = payloads;

        let result = self
            .run_steps(
                definition,
                &ctx,
                &mut aggregate,
                start_index,
                &mut input,
                &mut checkpoint_sequence,
                &mut last_checkpoint,
                false,
            )
            .await;

        self.cancellations.unregister(&run_id);
        result
    }

    /// Requests cancellation of a run currently executing in this process.
    pub fn cancel(&self, run_id: &RunId) -> Result<(), PipelineError> {
        self.cancellations.cancel(run_id)
    }

    fn inherit_context(&self, definition: &PipelineDefinition, mut request: RequestContext) -> RequestContext {
        if request.channel.is_none() {
            request.channel = definition.context.channel.clone();
        }
        if request.content_language.is_none() {
            request.content_language = definition.context.content_language.clone();
        }
        request
    }

    async fn load_or_start_aggregate(
        &self,
        definition: &PipelineDefinition,
        options: &ExecuteOptions,
    ) -> Result<PipelineRunAggregate, PipelineError> {
        if options.resume {
            if let Some(run_id) = &options.run_id {
                let events = self.runs.load_events(run_id).await?;
                if !events.is_empty() {
                    let mut aggregate = PipelineRunAggregate::from_events(definition.id.clone(), events)?;
                    aggregate.resume();
                    return Ok(aggregate);
                }
            }
        }
        Ok(PipelineRunAggregate::start(definition.id.clone()))
    }

    /// Computes the input batch and step index to resume from. A paused
    /// `GATE` step checkpoints its pending input under `pending_input`; a
    /// fresh run (or a resume with no such checkpoint) starts from the top
    /// with an empty batch, since `EXTRACT` is always the first step.
    fn resume_point(
        &self,
        definition: &PipelineDefinition,
        aggregate: &PipelineRunAggregate,
        resuming: bool,
        checkpoint: Option<&Checkpoint>,
    ) -> (Vec<RecordEnvelope>, usize) {
        if !resuming {
            return (Vec::new(), 0);
        }

        let start_index = aggregate
            .run()
            .paused_at_step
            .as_ref()
            .and_then(|key| definition.steps.iter().position(|s| &s.step_key == key))
            .unwrap_or(0);

        let input = checkpoint
            .and_then(|c| c.data.get("pending_input"))
            .and_then(|v| serde_json::from_value::<Vec<RecordEnvelope>>(v.clone()).ok())
            .unwrap_or_default();

        (input, start_index)
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_steps(
        &self,
        definition: &PipelineDefinition,
        ctx: &RunContext,
        aggregate: &mut PipelineRunAggregate,
        start_index: usize,
        input: &mut Vec<RecordEnvelope>,
        checkpoint_sequence: &mut u64,
        last_checkpoint: &mut Option<Checkpoint>,
        dry_run: bool,
    ) -> Result<RunSummary, PipelineError> {
        let mut details = Vec::new();

        for step in &definition.steps[start_index..] {
            if ctx.is_cancelled() {
                aggregate.cancel();
                self.persist(aggregate, dry_run).await?;
                return Ok(RunSummary {
                    run_id: ctx.run_id.clone(),
                    processed: aggregate.run().metrics.totals.processed,
                    succeeded: aggregate.run().metrics.totals.succeeded,
                    failed: aggregate.run().metrics.totals.failed,
                    details,
                    paused: false,
                    paused_at_step: None,
                });
            }

            let executor = match self.step_executors.get(step.step_type) {
                Ok(executor) => executor,
                Err(err) => {
                    if self.handle_step_error(definition, aggregate, &mut details, step, err.clone(), true, dry_run).await? {
                        continue;
                    }
                    return Err(err);
                }
            };

            let started = Instant::now();
            let outcome = executor.execute(step, ctx, input.clone()).await;

            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(err) => {
                    let is_config_error = matches!(
                        err,
                        PipelineError::InvalidConfiguration(_) | PipelineError::ValidationFailed(_)
                    );
                    if self
                        .handle_step_error(definition, aggregate, &mut details, step, err.clone(), is_config_error, dry_run)
                        .await?
                    {
                        continue;
                    }
                    return Err(err);
                }
            };

            let duration_ms = started.elapsed().as_millis() as u64;

            aggregate.merge_step_metrics(step.step_key.clone(), outcome.metrics);
            aggregate.finish_step(step.step_key.clone());

            for failure in &outcome.record_failures {
                if !dry_run {
                    let mut record_error = RecordError::new(ctx.run_id.clone(), step.step_key.clone(), failure.message.clone(), failure.payload.clone())
                        .with_recoverable(failure.recoverable);
                    if let Some(code) = &failure.code {
                        record_error = record_error.with_code(code.clone());
                    }
                    self.error_journal.append(record_error).await?;
                }
                self.events
                    .on_record_failed(DomainEvent::new(RecordFailed {
                        pipeline_id: definition.id.clone(),
                        run_id: ctx.run_id.clone(),
                        step_key: step.step_key.clone(),
                        message: failure.message.clone(),
                        recoverable: failure.recoverable,
                    }))
                    .await;
            }

            details.push(StepSummary {
                step_key: step.step_key.clone(),
                processed: outcome.metrics.processed,
                succeeded: outcome.metrics.succeeded,
                failed: outcome.metrics.failed,
                skipped: outcome.metrics.skipped,
                duration_ms,
            });

            self.events
                .on_step_completed(DomainEvent::new(StepCompleted {
                    pipeline_id: definition.id.clone(),
                    run_id: ctx.run_id.clone(),
                    step_key: step.step_key.clone(),
                    processed: outcome.metrics.processed,
                    succeeded: outcome.metrics.succeeded,
                    failed: outcome.metrics.failed,
                    duration_ms,
                }))
                .await;

            if outcome.paused {
                aggregate.pause(step.step_key.clone());
                if !dry_run && definition.checkpointing.enabled {
                    *checkpoint_sequence += 1;
                    let data = serde_json::json!({ "pending_input": outcome.output });
                    let next = Checkpoint::new(definition.id.clone(), *checkpoint_sequence, data);
                    self.checkpoints.save_next(last_checkpoint.as_ref(), next.clone()).await?;
                    *last_checkpoint = Some(next);
                }
                self.persist(aggregate, dry_run).await?;
                return Ok(RunSummary {
                    run_id: ctx.run_id.clone(),
                    processed: aggregate.run().metrics.totals.processed,
                    succeeded: aggregate.run().metrics.totals.succeeded,
                    failed: aggregate.run().metrics.totals.failed,
                    details,
                    paused: true,
                    paused_at_step: Some(step.step_key.clone()),
                });
            }

            *input = outcome.output;

            if !dry_run && definition.checkpointing.enabled {
                let should_checkpoint = matches!(definition.checkpointing.after, CheckpointAfter::Step | CheckpointAfter::Batch);
                if should_checkpoint {
                    *checkpoint_sequence += 1;
                    let data = serde_json::json!({ "completed_step": step.step_key.as_str() });
                    let next = Checkpoint::new(definition.id.clone(), *checkpoint_sequence, data);
                    self.checkpoints.save_next(last_checkpoint.as_ref(), next.clone()).await?;
                    *last_checkpoint = Some(next);
                }
            }
        }

        aggregate.complete();
        self.persist(aggregate, dry_run).await?;

        self.events
            .on_pipeline_completed(DomainEvent::new(PipelineCompleted {
                pipeline_id: definition.id.clone(),
                run_id: ctx.run_id.clone(),
                processed: aggregate.run().metrics.totals.processed,
                succeeded: aggregate.run().metrics.totals.succeeded,
                failed: aggregate.run().metrics.totals.failed,
            }))
            .await;

        Ok(RunSummary {
            run_id: ctx.run_id.clone(),
            processed: aggregate.run().metrics.totals.processed,
            succeeded: aggregate.run().metrics.totals.succeeded,
            failed: aggregate.run().metrics.totals.failed,
            details,
            paused: false,
            paused_at_step: None,
        })
    }

    /// Applies the error-handling policy for a step failure (either a
    /// missing executor/invalid-config error, or a step execution error).
    /// Returns `Ok(true)` when the caller should continue to the next step,
    /// `Ok(false)`/`Err` when the run must abort.
    #[allow(clippy::too_many_arguments)]
    async fn handle_step_error(
        &self,
        definition: &PipelineDefinition,
        aggregate: &mut PipelineRunAggregate,
        details: &mut Vec<StepSummary>,
        step: &pipeline_runtime_domain::entities::pipeline_definition::StepDefinition,
        err: PipelineError,
        is_config_error: bool,
        dry_run: bool,
    ) -> Result<bool, PipelineError> {
        self.events
            .on_step_failed(DomainEvent::new(StepFailed {
                pipeline_id: definition.id.clone(),
                run_id: aggregate.run().id.clone(),
                step_key: step.step_key.clone(),
                reason: err.to_string(),
            }))
            .await;

        let should_continue = if is_config_error {
            matches!(definition.error_handling.on_invalid_config, ConfigValidationMode::Lenient)
        } else {
            matches!(definition.error_handling.on_step_failure, ErrorHandlingMode::Continue)
        };

        if should_continue {
            details.push(StepSummary {
                step_key: step.step_key.clone(),
                processed: 0,
                succeeded: 0,
                failed: 0,
                skipped: 0,
                duration_ms: 0,
            });
            return Ok(true);
        }

        aggregate.fail(err.to_string());
        self.persist(aggregate, dry_run).await?;
        self.events
            .on_pipeline_failed(DomainEvent::new(PipelineFailed {
                pipeline_id: definition.id.clone(),
                run_id: aggregate.run().id.clone(),
                reason: err.to_string(),
            }))
            .await;
        Ok(false)
    }

    async fn persist(&self, aggregate: &mut PipelineRunAggregate, dry_run: bool) -> Result<(), PipelineError> {
        if dry_run {
            return Ok(());
        }
        let events: Vec<RunEvent> = aggregate.uncommitted_events().to_vec();
        if events.is_empty() {
            return Ok(());
        }
        let expected_version = aggregate.version() - events.len() as u64;
        self.runs.append_events(&aggregate.run().id, expected_version, &events).await?;
        self.runs.save_snapshot(aggregate.run()).await?;
        aggregate.mark_committed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::step_executors::extract::ExtractStepExecutor;
    use crate::application::step_executors::load::{LoadStepExecutor, RollbackJournalStore};
    use crate::application::loader_engine::registry::LoaderRegistry;
    use async_trait::async_trait;
    use pipeline_runtime_domain::entities::pipeline_definition::{StepDefinition, StepType};
    use pipeline_runtime_domain::entities::{PipelineRun, RetryAudit};
    use pipeline_runtime_domain::services::data_extractor::{DataExtractor, ExtractBatch, ExtractorContext};
    use pipeline_runtime_domain::services::entity_loader::{EntityLoader, FoundEntity, LoaderCategory, LoaderContext, LoaderMetadata, Operation, ValidationOutcome};
    use pipeline_runtime_domain::value_objects::{CheckpointId as _DummyUnused, PipelineId, RecordId};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Default)]
    struct InMemoryRunRepository {
        events: AsyncMutex<HashMap<RunId, Vec<RunEvent>>>,
        snapshots: AsyncMutex<HashMap<RunId, PipelineRun>>,
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

        async fn save_snapshot(&self, run: &PipelineRun) -> Result<(), PipelineError> {
            self.snapshots.lock().await.insert(run.id.clone(), run.clone());
            Ok(())
        }

        async fn find_by_id(&self, run_id: &RunId) -> Result<Option<PipelineRun>, PipelineError> {
            Ok(self.snapshots.lock().await.get(run_id).cloned())
        }

        async fn find_active_for_pipeline(&self, _pipeline_id: &PipelineId) -> Result<Vec<PipelineRun>, PipelineError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct InMemoryErrorJournal {
        errors: AsyncMutex<Vec<RecordError>>,
    }

    #[async_trait]
    impl ErrorJournalRepository for InMemoryErrorJournal {
        async fn append(&self, error: RecordError) -> Result<(), PipelineError> {
            self.errors.lock().await.push(error);
            Ok(())
        }

        async fn find_by_id(&self, _id: &RecordId) -> Result<Option<RecordError>, PipelineError> {
            Ok(None)
        }

        async fn list_for_run(&self, _run_id: &RunId) -> Result<Vec<RecordError>, PipelineError> {
            Ok(self.errors.lock().await.clone())
        }

        async fn list_recoverable_for_run(&self, _run_id: &RunId) -> Result<Vec<RecordError>, PipelineError> {
            Ok(Vec::new())
        }

        async fn append_retry_audit(&self, _audit: RetryAudit) -> Result<(), PipelineError> {
            Ok(())
        }

        async fn list_retry_audits(&self, _error_id: &RecordId) -> Result<Vec<RetryAudit>, PipelineError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct NoOpCheckpointRepository {
        saved: AsyncMutex<Option<Checkpoint>>,
    }

    #[async_trait]
    impl pipeline_runtime_domain::repositories::CheckpointRepository for NoOpCheckpointRepository {
        async fn save(&self, checkpoint: Checkpoint) -> Result<(), PipelineError> {
            *self.saved.lock().await = Some(checkpoint);
            Ok(())
        }
        async fn load_latest(&self, _pipeline_id: &PipelineId) -> Result<Option<Checkpoint>, PipelineError> {
            Ok(self.saved.lock().await.clone())
        }
        async fn clear(&self, _pipeline_id: &PipelineId) -> Result<(), PipelineError> {
            *self.saved.lock().await = None;
            Ok(())
        }
    }

    struct NoOpEvents;
    #[async_trait]
    impl EventPublisher for NoOpEvents {}

    struct OneShotExtractor {
        records: StdMutex<Option<Vec<RecordEnvelope>>>,
    }

    #[async_trait]
    impl DataExtractor for OneShotExtractor {
        fn category(&self) -> &'static str {
            "test"
        }

        async fn validate_config(&self, _config: &serde_json::Value) -> Result<(), PipelineError> {
            Ok(())
        }

        async fn next_batch(
            &self,
            _ctx: &ExtractorContext,
            _config: &serde_json::Value,
            _checkpoint: Option<&serde_json::Value>,
            _batch_size: usize,
        ) -> Result<ExtractBatch, PipelineError> {
            let records = self.records.lock().unwrap().take().unwrap_or_default();
            Ok(ExtractBatch {
                records,
                next_checkpoint: None,
                has_more: false,
            })
        }
    }

    struct AlwaysCreateLoader {
        metadata: LoaderMetadata,
    }

    #[async_trait]
    impl EntityLoader for AlwaysCreateLoader {
        fn metadata(&self) -> &LoaderMetadata {
            &self.metadata
        }
        fn field_schema(&self) -> serde_json::Value {
            serde_json::json!({})
        }
        async fn validate(&self, _ctx: &LoaderContext, _record: &RecordEnvelope, _operation: Operation) -> Result<ValidationOutcome, PipelineError> {
            Ok(ValidationOutcome::ok())
        }
        async fn find_existing(&self, _ctx: &LoaderContext, _record: &RecordEnvelope) -> Result<Option<FoundEntity>, PipelineError> {
            Ok(None)
        }
        async fn create_entity(&self, _ctx: &LoaderContext, record: &RecordEnvelope) -> Result<Option<String>, PipelineError> {
            Ok(record.field("sku").and_then(|v| v.as_str()).map(str::to_string))
        }
        async fn update_entity(&self, _ctx: &LoaderContext, _id: &str, _record: &RecordEnvelope) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn delete_entity(&self, _ctx: &LoaderContext, _id: &str) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    fn definition(steps: Vec<StepDefinition>) -> PipelineDefinition {
        use pipeline_runtime_domain::entities::pipeline_definition::*;
        PipelineDefinition {
            id: PipelineId::new(),
            code: "test-pipeline".into(),
            name: "Test".into(),
            enabled: true,
            status: PipelineStatus::Published,
            version: 1,
            published_at: None,
            steps,
            triggers: Vec::new(),
            context: ContextOverride::default(),
            error_handling: ErrorHandlingPolicy::default(),
            checkpointing: CheckpointingPolicy::default(),
            parallel_execution: ParallelExecutionPolicy::default(),
            hooks: HookBindings::default(),
        }
    }

    fn orchestrator(registry: StepExecutorRegistry) -> (PipelineOrchestrator, Arc<InMemoryErrorJournal>) {
        let error_journal = Arc::new(InMemoryErrorJournal::default());
        let orchestrator = PipelineOrchestrator::new(
            Arc::new(registry),
            Arc::new(CheckpointService::new(Arc::new(NoOpCheckpointRepository::default()))),
            Arc::new(InMemoryRunRepository::default()),
            error_journal.clone(),
            Arc::new(NoOpEvents),
            Arc::new(RunCancellationRegistry::new()),
        );
        (orchestrator, error_journal)
    }

    #[tokio::test]
    async fn extract_then_load_completes_and_reports_summary() {
        let mut extractors: HashMap<String, Arc<dyn DataExtractor>> = HashMap::new();
        extractors.insert(
            "oneshot".into(),
            Arc::new(OneShotExtractor {
                records: StdMutex::new(Some(vec![RecordEnvelope::new(serde_json::json!({"sku": "X-1"}))])),
            }),
        );

        let mut loaders = LoaderRegistry::new();
        loaders.register(Arc::new(AlwaysCreateLoader {
            metadata: LoaderMetadata {
                entity_type: "Product".into(),
                name: "Product".into(),
                category: LoaderCategory::Products,
                supported_operations: vec![Operation::Create],
                lookup_fields: vec!["sku".into()],
                required_fields: vec!["sku".into()],
            },
        }));

        let mut registry = StepExecutorRegistry::new();
        registry.register(Arc::new(ExtractStepExecutor::new(extractors, 100)));
        registry.register(Arc::new(LoadStepExecutor::new(Arc::new(loaders), Arc::new(RollbackJournalStore::new()), false)));

        let (orchestrator, _) = orchestrator(registry);

        let def = definition(vec![
            StepDefinition::new(StepKey::new("extract").unwrap(), StepType::Extract, "oneshot"),
            StepDefinition::new(StepKey::new("load").unwrap(), StepType::Load, "loader").with_config(serde_json::json!({
                "entityType": "Product",
                "operation": "CREATE",
            })),
        ]);

        let summary = orchestrator.execute(&def, RequestContext::default(), ExecuteOptions::default()).await.unwrap();
        assert!(!summary.paused);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.details.len(), 2);
    }

    #[tokio::test]
    async fn a_paused_gate_never_completes_the_run() {
        let mut registry = StepExecutorRegistry::new();
        registry.register(Arc::new(crate::application::step_executors::gate::GateStepExecutor));

        let (orchestrator, _) = orchestrator(registry);
        let def = definition(vec![StepDefinition::new(StepKey::new("gate").unwrap(), StepType::Gate, "gate").with_config(serde_json::json!({
            "condition": {"field": "approved", "equals": true},
        }))]);

        let summary = orchestrator.execute(&def, RequestContext::default(), ExecuteOptions::default()).await.unwrap();
        assert!(summary.paused);
        assert_eq!(summary.paused_at_step, Some(StepKey::new("gate").unwrap()));
    }

    #[tokio::test]
    async fn fail_fast_aborts_the_run_on_step_error() {
        let mut extractors: HashMap<String, Arc<dyn DataExtractor>> = HashMap::new();
        extractors.insert("oneshot".into(), Arc::new(OneShotExtractor { records: StdMutex::new(Some(Vec::new())) }));
        let mut registry = StepExecutorRegistry::new();
        registry.register(Arc::new(ExtractStepExecutor::new(extractors, 100)));
        // No executor registered for Load -> InvalidConfiguration on dispatch.

        let (orchestrator, _) = orchestrator(registry);
        let def = definition(vec![
            StepDefinition::new(StepKey::new("extract").unwrap(), StepType::Extract, "oneshot"),
            StepDefinition::new(StepKey::new("load").unwrap(), StepType::Load, "loader"),
        ]);

        let result = orchestrator.execute(&def, RequestContext::default(), ExecuteOptions::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn cancel_before_any_step_yields_zero_progress_summary() {
        let registry = StepExecutorRegistry::new();
        let (orchestrator, _) = orchestrator(registry);
        let def = definition(vec![]);

        // An empty pipeline has no steps to cancel before, so this exercises
        // the cancellation registry plumbing rather than mid-run cancellation.
        let summary = orchestrator.execute(&def, RequestContext::default(), ExecuteOptions::default()).await.unwrap();
        assert!(!summary.paused);
        assert_eq!(summary.processed, 0);
    }
}
