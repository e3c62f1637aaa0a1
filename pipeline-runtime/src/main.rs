// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Process entry point: parses argv through `pipeline-runtime-bootstrap`,
//! wires every adapter behind the domain's ports, dispatches to the use
//! case backing the chosen subcommand, and maps the result onto a process
//! exit code (spec §6).

use pipeline_runtime::application::checkpoint_service::CheckpointService;
use pipeline_runtime::application::config_sync::{ConfigSyncService, InMemoryConnectionRepository, InMemorySecretRepository};
use pipeline_runtime::application::entity_store::InMemoryEntityService;
use pipeline_runtime::application::loader_engine::reference::{AssetLoader, ProductLoader, PromotionLoader, TaxRateLoader};
use pipeline_runtime::application::loader_engine::registry::LoaderRegistry;
use pipeline_runtime::application::replay_service::ReplayService;
use pipeline_runtime::application::retry_audit_service::RetryAuditService;
use pipeline_runtime::application::rollback_service;
use pipeline_runtime::application::step_executors::branch::BranchStepExecutor;
use pipeline_runtime::application::step_executors::extract::ExtractStepExecutor;
use pipeline_runtime::application::step_executors::gate::GateStepExecutor;
use pipeline_runtime::application::step_executors::load::{LoadStepExecutor, RollbackJournalStore};
use pipeline_runtime::application::step_executors::merge::MergeStepExecutor;
use pipeline_runtime::application::step_executors::transform::TransformStepExecutor;
use pipeline_runtime::application::transform_engine::TransformRegistry;
use pipeline_runtime::application::use_cases::{CancelUseCase, ReplayUseCase, RunPipelineUseCase, SyncConfigUseCase, ValidateConfigUseCase};
use pipeline_runtime::infrastructure::extractors::{FileExtractor, HttpExtractor};
use pipeline_runtime::infrastructure::repositories::schema;
use pipeline_runtime::infrastructure::repositories::{
    SqliteCheckpointRepository, SqliteErrorJournalRepository, SqlitePipelineDefinitionRepository, SqlitePipelineRunRepository,
};
use pipeline_runtime::{PipelineOrchestrator, PipelineMetrics, RunCancellationRegistry, TracingEventPublisher};
use pipeline_runtime_bootstrap::{bootstrap_cli, result_to_exit_code, ValidatedCli, ValidatedCommand};
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::{DataExtractor, EntityService, EventPublisher, TransformContext};
use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://pipeline-runtime.db";
const DEFAULT_METRICS_ADDR: &str = "127.0.0.1:9464";
const EXTRACT_BATCH_SIZE: usize = 500;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::from(2);
        }
    };

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        cli.log_level
            .as_deref()
            .unwrap_or("info")
            .parse()
            .unwrap_or(tracing::Level::INFO)
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    result_to_exit_code(run(cli).await.map_err(|err| PipelineError::InternalError(err.to_string())))
}

async fn run(cli: ValidatedCli) -> anyhow::Result<()> {
    let database_url = std::env::var("PIPELINE_RUNTIME_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    info!(database_url = %database_url, "initializing database");
    let pool = schema::initialize_database(&database_url).await?;

    let checkpoints = Arc::new(CheckpointService::new(Arc::new(SqliteCheckpointRepository::new(pool.clone()))));
    let definitions = Arc::new(SqlitePipelineDefinitionRepository::new(pool.clone()));
    let runs = Arc::new(SqlitePipelineRunRepository::new(pool.clone()));
    let error_journal = Arc::new(SqliteErrorJournalRepository::new(pool.clone()));
    let rollback_store = Arc::new(RollbackJournalStore::new());

    let entity_service: Arc<dyn EntityService> = Arc::new(InMemoryEntityService::new());

    let mut loaders = LoaderRegistry::new();
    loaders.register(Arc::new(ProductLoader::new(entity_service.clone())));
    loaders.register(Arc::new(AssetLoader::new(entity_service.clone())));
    loaders.register(Arc::new(TaxRateLoader::new(entity_service.clone())));
    loaders.register(Arc::new(PromotionLoader::new(entity_service.clone())));
    let loaders = Arc::new(loaders);

    let mut extractors: HashMap<String, Arc<dyn DataExtractor>> = HashMap::new();
    extractors.insert("http".to_string(), Arc::new(HttpExtractor::new()));
    extractors.insert("file".to_string(), Arc::new(FileExtractor::new()));

    let transform_registry = Arc::new(TransformRegistry::with_builtins());
    let transform_ctx = TransformContext {
        entity_service: entity_service.clone(),
        channel: None,
        content_language: None,
    };

    let dry_run = matches!(&cli.command, ValidatedCommand::Run { dry_run: true, .. });

    let mut step_executors = pipeline_runtime::application::step_executors::StepExecutorRegistry::new();
    step_executors.register(Arc::new(ExtractStepExecutor::new(extractors, EXTRACT_BATCH_SIZE)));
    step_executors.register(Arc::new(TransformStepExecutor::new(transform_registry, transform_ctx)));
    step_executors.register(Arc::new(LoadStepExecutor::new(loaders.clone(), rollback_store.clone(), dry_run)));
    step_executors.register(Arc::new(BranchStepExecutor));
    step_executors.register(Arc::new(MergeStepExecutor));
    step_executors.register(Arc::new(GateStepExecutor));
    let step_executors = Arc::new(step_executors);

    let events: Arc<dyn EventPublisher> = Arc::new(TracingEventPublisher);
    let cancellations = Arc::new(RunCancellationRegistry::new());

    let orchestrator = Arc::new(PipelineOrchestrator::new(
        step_executors,
        checkpoints,
        runs.clone(),
        error_journal.clone(),
        events,
        cancellations.clone(),
    ));

    spawn_metrics_endpoint();
    rollback_service::spawn_sweeper(rollback_store, std::time::Duration::from_secs(60), chrono::Duration::hours(1));

    match cli.command {
        ValidatedCommand::Run { pipeline, resume, dry_run, max_concurrent } => {
            let use_case = RunPipelineUseCase::new(orchestrator, runs);
            use_case.execute(&pipeline, resume, dry_run, max_concurrent).await?;
        }
        ValidatedCommand::Cancel { run_id } => {
            let use_case = CancelUseCase::new(cancellations);
            use_case.execute(&run_id)?;
        }
        ValidatedCommand::Replay { run_id, step, patch } => {
            let retry_audit = Arc::new(RetryAuditService::new(error_journal.clone()));
            let replay_service = Arc::new(ReplayService::new(orchestrator, error_journal.clone(), retry_audit));
            let use_case = ReplayUseCase::new(replay_service, definitions, runs, error_journal);
            use_case.execute(&run_id, step.as_deref(), patch.as_deref()).await?;
        }
        ValidatedCommand::SyncConfig { config, dry_run } => {
            let config_sync = Arc::new(ConfigSyncService::new(
                definitions,
                Arc::new(InMemorySecretRepository::new()),
                Arc::new(InMemoryConnectionRepository::new()),
            ));
            let use_case = SyncConfigUseCase::new(config_sync);
            use_case.execute(&config, dry_run).await?;
        }
        ValidatedCommand::ValidateConfig { config } => {
            let use_case = ValidateConfigUseCase::new();
            use_case.execute(&config).await?;
        }
    }

    Ok(())
}

fn spawn_metrics_endpoint() -> Option<()> {
    match PipelineMetrics::new() {
        Ok(metrics) => {
            let metrics = Arc::new(metrics);
            let addr = std::env::var("PIPELINE_RUNTIME_METRICS_ADDR").unwrap_or_else(|_| DEFAULT_METRICS_ADDR.to_string());
            tokio::spawn(async move {
                if let Err(err) = pipeline_runtime::infrastructure::metrics::serve(metrics, &addr).await {
                    error!(error = %err, "metrics endpoint stopped");
                }
            });
            Some(())
        }
        Err(err) => {
            error!(error = %err, "failed to initialize metrics");
            None
        }
    }
}
