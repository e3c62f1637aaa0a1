// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error Taxonomy
//!
//! A single [`PipelineError`] enum covers every failure mode the domain and
//! application layers can produce. Each variant carries enough context to be
//! logged and surfaced to an operator without the caller needing to downcast.

use thiserror::Error;

/// The root error type for the pipeline execution runtime.
///
/// Variants are grouped by the taxonomy in the specification: configuration,
/// validation, duplicate detection, recoverable I/O, fatal adapter failures,
/// lookup misses, and pipeline-level infrastructure failures.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// The pipeline or step definition itself is malformed or contradictory.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A record, field, or parameter failed validation.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// An entity that should be unique already exists.
    #[error("duplicate entity: {0}")]
    Duplicate(String),

    /// A transient failure the caller may retry (network blip, lock
    /// contention, rate limit). Always [`PipelineError::is_recoverable`].
    #[error("recoverable I/O error: {0}")]
    RecoverableIo(String),

    /// An extractor or loader adapter failed in a way that cannot be
    /// retried (malformed credentials, unsupported schema).
    #[error("fatal adapter error: {0}")]
    FatalAdapter(String),

    /// A `LOOKUP` transform found no matching row and the pipeline is not
    /// configured to tolerate misses.
    #[error("lookup miss: {0}")]
    LookupMiss(String),

    /// Infrastructure supporting the run (database, checkpoint store,
    /// rollback journal) failed independently of any one record.
    #[error("pipeline infrastructure failure: {0}")]
    InfrastructureFailure(String),

    /// The requested entity, pipeline, or run could not be found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The run, step, or transaction was cancelled cooperatively.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// An error that does not fit any other category. Used sparingly.
    #[error("internal error: {0}")]
    InternalError(String),
}

impl PipelineError {
    /// Whether a caller may reasonably retry the operation that produced
    /// this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::RecoverableIo(_))
    }

    /// Coarse category name, used for metrics labels and structured logs.
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::InvalidConfiguration(_) => "configuration",
            PipelineError::ValidationFailed(_) => "validation",
            PipelineError::Duplicate(_) => "duplicate",
            PipelineError::RecoverableIo(_) => "recoverable_io",
            PipelineError::FatalAdapter(_) => "fatal_adapter",
            PipelineError::LookupMiss(_) => "lookup_miss",
            PipelineError::InfrastructureFailure(_) => "infrastructure",
            PipelineError::NotFound(_) => "not_found",
            PipelineError::Cancelled(_) => "cancelled",
            PipelineError::InternalError(_) => "internal",
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::RecoverableIo(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::ValidationFailed(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_io_is_recoverable() {
        let err = PipelineError::RecoverableIo("timeout".into());
        assert!(err.is_recoverable());
        assert_eq!(err.category(), "recoverable_io");
    }

    #[test]
    fn other_variants_are_not_recoverable() {
        assert!(!PipelineError::FatalAdapter("bad schema".into()).is_recoverable());
        assert!(!PipelineError::LookupMiss("sku=ABC".into()).is_recoverable());
    }

    #[test]
    fn io_error_converts_to_recoverable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err: PipelineError = io_err.into();
        assert!(err.is_recoverable());
    }
}
