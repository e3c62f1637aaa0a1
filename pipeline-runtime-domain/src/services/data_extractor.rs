// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Extractor Adapter Layer port (spec §2, §5): pulls one page of records at
//! a time from an external source, resuming from an opaque checkpoint value
//! the extractor itself defines the shape of.

use crate::entities::RecordEnvelope;
use crate::error::PipelineError;
use crate::services::cancellation::CancellationSignal;
use crate::services::request_context::RequestContext;
use crate::value_objects::{PipelineId, RunId, StepKey};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PaginationStrategy {
    None,
    Offset,
    Cursor,
    Page,
    LinkHeader,
}

#[derive(Debug, Clone)]
pub struct PaginationConfig {
    pub strategy: PaginationStrategy,
    pub data_path: String,
    pub max_pages: Option<u32>,
    pub param_names: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 200,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
            retryable_status_codes: vec![429, 502, 503, 504],
        }
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    pub requests_per_second: f64,
    pub max_concurrent: u32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            requests_per_second: 10.0,
            max_concurrent: 4,
        }
    }
}

pub struct ExtractorContext {
    pub request: RequestContext,
    pub pipeline_id: PipelineId,
    pub run_id: RunId,
    pub step_key: StepKey,
    pub cancellation: Arc<dyn CancellationSignal>,
}

/// One page pulled from an external source plus the checkpoint needed to
/// resume after it. `next_checkpoint` is `None` once `has_more` is `false`.
#[derive(Debug, Clone)]
pub struct ExtractBatch {
    pub records: Vec<RecordEnvelope>,
    pub next_checkpoint: Option<Value>,
    pub has_more: bool,
}

#[async_trait]
pub trait DataExtractor: Send + Sync {
    /// Adapter category as registered (e.g. `"http"`, `"file"`); used for
    /// config dispatch, not behavior.
    fn category(&self) -> &'static str;

    async fn validate_config(&self, config: &Value) -> Result<(), PipelineError>;

    /// Fetches the next page starting after `checkpoint` (`None` on the
    /// first call). Implementations must honor `ctx.cancellation` between
    /// network calls, not just at the start of the method.
    async fn next_batch(
        &self,
        ctx: &ExtractorContext,
        config: &Value,
        checkpoint: Option<&Value>,
        batch_size: usize,
    ) -> Result<ExtractBatch, PipelineError>;
}
