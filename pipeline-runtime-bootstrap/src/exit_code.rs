// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Process Exit Codes
//!
//! Exactly the four statuses named in spec §6: a successful run, a run that
//! failed, a configuration that failed validation before any run started,
//! and a run that was cancelled. Deliberately narrower than a BSD sysexits
//! superset — this system does not invent exit codes the specification
//! does not call for.

use pipeline_runtime_domain::PipelineError;
use std::process::ExitCode as ProcessExitCode;

/// Process exit status for the `pipeline-runtime` binary.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ExitCode {
    /// The command completed successfully.
    Success = 0,
    /// A run started but failed (non-recoverable error, exhausted retries,
    /// or `ErrorHandlingMode::FailFast` tripped).
    RunFailed = 1,
    /// The pipeline/config definition failed validation before any run
    /// started.
    ConfigInvalid = 2,
    /// The run was cancelled cooperatively (signal, operator `cancel`).
    Cancelled = 3,
}

impl ExitCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<ExitCode> for ProcessExitCode {
    fn from(code: ExitCode) -> Self {
        ProcessExitCode::from(code.code())
    }
}

/// Maps a [`PipelineError`] onto the exit code an operator should see.
///
/// `Cancelled` maps to [`ExitCode::Cancelled`]; `InvalidConfiguration` and
/// `ValidationFailed` map to [`ExitCode::ConfigInvalid`] since both mean the
/// run never had a chance to start; everything else is a run-time failure.
pub fn map_error_to_exit_code(error: &PipelineError) -> ExitCode {
    match error {
        PipelineError::Cancelled(_) => ExitCode::Cancelled,
        PipelineError::InvalidConfiguration(_) | PipelineError::ValidationFailed(_) => {
            ExitCode::ConfigInvalid
        }
        _ => ExitCode::RunFailed,
    }
}

/// Converts the top-level `Result` a command function returns into a
/// process exit code, printing the error to stderr on failure.
pub fn result_to_exit_code(result: Result<(), PipelineError>) -> ProcessExitCode {
    match result {
        Ok(()) => ExitCode::Success.into(),
        Err(err) => {
            eprintln!("error: {}", err);
            map_error_to_exit_code(&err).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_zero() {
        assert_eq!(ExitCode::Success.code(), 0);
    }

    #[test]
    fn cancelled_maps_from_cancelled_error() {
        let err = PipelineError::Cancelled("operator requested shutdown".into());
        assert_eq!(map_error_to_exit_code(&err), ExitCode::Cancelled);
    }

    #[test]
    fn config_errors_map_to_config_invalid() {
        assert_eq!(
            map_error_to_exit_code(&PipelineError::InvalidConfiguration("bad".into())),
            ExitCode::ConfigInvalid
        );
        assert_eq!(
            map_error_to_exit_code(&PipelineError::ValidationFailed("bad".into())),
            ExitCode::ConfigInvalid
        );
    }

    #[test]
    fn other_errors_map_to_run_failed() {
        assert_eq!(
            map_error_to_exit_code(&PipelineError::FatalAdapter("boom".into())),
            ExitCode::RunFailed
        );
        assert_eq!(
            map_error_to_exit_code(&PipelineError::InfrastructureFailure("db down".into())),
            ExitCode::RunFailed
        );
    }

    #[test]
    fn result_to_exit_code_success() {
        let code = result_to_exit_code(Ok(()));
        assert_eq!(code, ProcessExitCode::from(0));
    }
}
