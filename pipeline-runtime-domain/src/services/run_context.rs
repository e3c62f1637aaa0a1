// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Bundle of everything a [`crate::services::StepExecutor`] needs beyond the
//! step's own input batch: identity, cancellation, the active rollback
//! transaction (if any), and the configured log persistence level.

use crate::services::cancellation::{CancellationSignal, NeverCancelled};
use crate::services::request_context::RequestContext;
use crate::value_objects::{PipelineId, RollbackTransactionId, RunId};
use std::sync::Arc;

/// How much of a run's execution gets journaled, mirroring the four levels
/// named in spec §7 (`ERROR_ONLY | PIPELINE | STEP | DEBUG`). Ordered so a
/// step can ask "is this level enabled" with a plain `>=` comparison; the
/// record-sample callbacks (`onExtractData`/`onLoadData`/`onTransformMapping`)
/// only fire at `Step` or `Debug`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Default)]
pub enum LogPersistenceLevel {
    ErrorOnly,
    #[default]
    Pipeline,
    Step,
    Debug,
}

#[derive(Clone)]
pub struct RunContext {
    pub pipeline_id: PipelineId,
    pub run_id: RunId,
    pub request: RequestContext,
    pub cancellation: Arc<dyn CancellationSignal>,
    pub rollback_transaction_id: Option<RollbackTransactionId>,
    pub log_level: LogPersistenceLevel,
    /// `parallelExecution.maxConcurrent` from the pipeline definition,
    /// threaded through so a step executor can size its own
    /// `tokio::sync::Semaphore` for intra-step concurrency (spec §5).
    pub max_concurrency: u32,
}

impl RunContext {
    pub fn new(pipeline_id: PipelineId, run_id: RunId) -> Self {
        Self {
            pipeline_id,
            run_id,
            request: RequestContext::default(),
            cancellation: Arc::new(NeverCancelled),
            rollback_transaction_id: None,
            log_level: LogPersistenceLevel::default(),
            max_concurrency: 1,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Whether per-record sample logging (`onExtractData`/`onLoadData`/
    /// `onTransformMapping`, spec §7) should fire at this run's configured
    /// level. Those three callbacks are the noisiest, so they're gated to
    /// `Step` and `Debug` — `Pipeline` (the default) still gets step-level
    /// start/complete/failed events, just not a line per record.
    pub fn samples_logging_enabled(&self) -> bool {
        self.log_level >= LogPersistenceLevel::Step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_logging_enabled_only_at_step_and_above() {
        let mut ctx = RunContext::new(PipelineId::new(), RunId::new());
        ctx.log_level = LogPersistenceLevel::ErrorOnly;
        assert!(!ctx.samples_logging_enabled());
        ctx.log_level = LogPersistenceLevel::Pipeline;
        assert!(!ctx.samples_logging_enabled());
        ctx.log_level = LogPersistenceLevel::Step;
        assert!(ctx.samples_logging_enabled());
        ctx.log_level = LogPersistenceLevel::Debug;
        assert!(ctx.samples_logging_enabled());
    }
}
