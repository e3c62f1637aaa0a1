// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cancel Use Case
//!
//! Backs the `cancel` CLI subcommand: requests cooperative cancellation of
//! an in-flight run via [`RunCancellationRegistry`]. Only reaches a run
//! executing in this process; a run driven elsewhere must be stopped by
//! signalling that process instead.

use crate::application::orchestrator::RunCancellationRegistry;
use anyhow::Result;
use pipeline_runtime_domain::value_objects::RunId;
use std::sync::Arc;

pub struct CancelUseCase {
    cancellations: Arc<RunCancellationRegistry>,
}

impl CancelUseCase {
    pub fn new(cancellations: Arc<RunCancellationRegistry>) -> Self {
        Self { cancellations }
    }

    pub fn execute(&self, run_id: &str) -> Result<()> {
        let run_id = RunId::from_string(run_id).map_err(anyhow::Error::from)?;
        self.cancellations.cancel(&run_id).map_err(anyhow::Error::from)?;
        println!("cancellation requested for run {}", run_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_run_id() {
        let registry = Arc::new(RunCancellationRegistry::new());
        let use_case = CancelUseCase::new(registry);
        assert!(use_case.execute("not-a-ulid").is_err());
    }
}
