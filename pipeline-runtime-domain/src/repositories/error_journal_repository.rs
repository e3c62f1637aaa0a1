// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Persistence contract for the error journal and its retry audit trail
//! (spec §7). A [`RecordError`] is append-only; retrying one appends a
//! [`RetryAudit`] rather than mutating the original error.

use crate::entities::{RecordError, RetryAudit};
use crate::error::PipelineError;
use crate::value_objects::{RecordId, RunId};
use async_trait::async_trait;

#[async_trait]
pub trait ErrorJournalRepository: Send + Sync {
    async fn append(&self, error: RecordError) -> Result<(), PipelineError>;

    async fn find_by_id(&self, id: &RecordId) -> Result<Option<RecordError>, PipelineError>;

    async fn list_for_run(&self, run_id: &RunId) -> Result<Vec<RecordError>, PipelineError>;

    async fn list_recoverable_for_run(&self, run_id: &RunId) -> Result<Vec<RecordError>, PipelineError>;

    async fn append_retry_audit(&self, audit: RetryAudit) -> Result<(), PipelineError>;

    async fn list_retry_audits(&self, error_id: &RecordId) -> Result<Vec<RetryAudit>, PipelineError>;
}
