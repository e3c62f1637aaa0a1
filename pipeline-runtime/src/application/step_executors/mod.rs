// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! One [`StepExecutor`] per [`StepType`], plus the registry the orchestrator
//! dispatches through. The orchestrator never matches on step behavior
//! itself (spec §4.1) — it looks the executor up by `step.step_type` and
//! calls `execute`.

pub mod branch;
pub mod extract;
pub mod gate;
pub mod load;
pub mod merge;
pub mod transform;

use pipeline_runtime_domain::entities::pipeline_definition::StepType;
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::step_executor::StepExecutor;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct StepExecutorRegistry {
    by_type: HashMap<StepType, Arc<dyn StepExecutor>>,
}

impl StepExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, executor: Arc<dyn StepExecutor>) {
        self.by_type.insert(executor.step_type(), executor);
    }

    pub fn get(&self, step_type: StepType) -> Result<Arc<dyn StepExecutor>, PipelineError> {
        self.by_type
            .get(&step_type)
            .cloned()
            .ok_or_else(|| PipelineError::InvalidConfiguration(format!("no executor registered for step type {:?}", step_type)))
    }
}
