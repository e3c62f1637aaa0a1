// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline & Step Definitions
//!
//! A [`PipelineDefinition`] is immutable once [`PipelineStatus::Published`];
//! changes happen through a new draft version rather than in-place mutation.
//! It owns an ordered list of [`StepDefinition`]s that the orchestrator turns
//! into a data-flow graph, plus the policies that govern error handling,
//! checkpointing, and parallelism for a run.

use crate::error::PipelineError;
use crate::value_objects::{PipelineId, StepKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lifecycle status of a pipeline definition.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PipelineStatus {
    Draft,
    Review,
    Published,
    Archived,
}

/// Discriminator for a step within a pipeline.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepType {
    Extract,
    Transform,
    Load,
    Gate,
    Branch,
    Merge,
}

/// How the orchestrator reacts to a step failure or invalid config.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorHandlingMode {
    /// Abort the run immediately.
    FailFast,
    /// Record the failure, increment counters, and keep going.
    Continue,
}

/// Validation strictness applied before the first step runs.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigValidationMode {
    /// An invalid adapter config aborts the run before the first step.
    Strict,
    /// An invalid adapter config is recorded and the run proceeds.
    Lenient,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ErrorHandlingPolicy {
    pub on_invalid_config: ConfigValidationMode,
    pub on_step_failure: ErrorHandlingMode,
}

impl Default for ErrorHandlingPolicy {
    fn default() -> Self {
        Self {
            on_invalid_config: ConfigValidationMode::Strict,
            on_step_failure: ErrorHandlingMode::FailFast,
        }
    }
}

/// When checkpoints are persisted during a run.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckpointAfter {
    Step,
    Batch,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CheckpointingPolicy {
    pub enabled: bool,
    pub after: CheckpointAfter,
}

impl Default for CheckpointingPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            after: CheckpointAfter::Step,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct ParallelExecutionPolicy {
    pub max_concurrent: u32,
}

impl Default for ParallelExecutionPolicy {
    fn default() -> Self {
        Self { max_concurrent: 1 }
    }
}

/// Optional channel/language override inherited by every step's
/// `RequestContext` unless a step overrides it again.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ContextOverride {
    pub channel: Option<String>,
    pub content_language: Option<String>,
}

/// Hook names the orchestrator invokes around run boundaries. The hooks
/// themselves are external collaborators; the domain only carries their
/// declared names so the application layer can dispatch them.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct HookBindings {
    pub on_pipeline_completed: Vec<String>,
    pub on_pipeline_failed: Vec<String>,
}

/// A single step in a pipeline's data-flow graph. Steps reference each
/// other only by [`StepKey`]; `branch_targets`/`merge_sources` carry the
/// explicit edges `BRANCH`/`MERGE` steps add on top of sequential order.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub step_key: StepKey,
    pub step_type: StepType,
    pub adapter_code: String,
    pub config: serde_json::Value,
    #[serde(default)]
    pub branch_targets: Vec<StepKey>,
    #[serde(default)]
    pub merge_sources: Vec<StepKey>,
}

impl StepDefinition {
    pub fn new(step_key: StepKey, step_type: StepType, adapter_code: impl Into<String>) -> Self {
        Self {
            step_key,
            step_type,
            adapter_code: adapter_code.into(),
            config: serde_json::Value::Null,
            branch_targets: Vec::new(),
            merge_sources: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }
}

/// A trigger binding external to the runtime (cron, webhook, manual). The
/// runtime only stores the declaration; dispatch is an external concern.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TriggerBinding {
    pub code: String,
    pub kind: String,
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub id: PipelineId,
    pub code: String,
    pub name: String,
    pub enabled: bool,
    pub status: PipelineStatus,
    pub version: u32,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    pub steps: Vec<StepDefinition>,
    #[serde(default)]
    pub triggers: Vec<TriggerBinding>,
    #[serde(default)]
    pub context: ContextOverride,
    #[serde(default)]
    pub error_handling: ErrorHandlingPolicy,
    #[serde(default)]
    pub checkpointing: CheckpointingPolicy,
    #[serde(default)]
    pub parallel_execution: ParallelExecutionPolicy,
    #[serde(default)]
    pub hooks: HookBindings,
}

impl PipelineDefinition {
    /// Validates the structural invariants from the data model: unique
    /// step keys, and that every `BRANCH`/`MERGE` edge resolves to a step
    /// that actually exists in this definition.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.step_key.as_str()) {
                return Err(PipelineError::ValidationFailed(format!(
                    "duplicate step key '{}'",
                    step.step_key
                )));
            }
        }

        let known: HashSet<&str> = self.steps.iter().map(|s| s.step_key.as_str()).collect();
        for step in &self.steps {
            for target in &step.branch_targets {
                if !known.contains(target.as_str()) {
                    return Err(PipelineError::ValidationFailed(format!(
                        "step '{}' branches to unknown step '{}'",
                        step.step_key, target
                    )));
                }
            }
            for source in &step.merge_sources {
                if !known.contains(source.as_str()) {
                    return Err(PipelineError::ValidationFailed(format!(
                        "step '{}' merges from unknown step '{}'",
                        step.step_key, source
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn step(&self, key: &StepKey) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| &s.step_key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(key: &str, ty: StepType) -> StepDefinition {
        StepDefinition::new(StepKey::new(key).unwrap(), ty, "noop")
    }

    fn base_definition(steps: Vec<StepDefinition>) -> PipelineDefinition {
        PipelineDefinition {
            id: PipelineId::new(),
            code: "test-pipeline".into(),
            name: "Test".into(),
            enabled: true,
            status: PipelineStatus::Draft,
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

    #[test]
    fn rejects_duplicate_step_keys() {
        let def = base_definition(vec![
            step("extract", StepType::Extract),
            step("extract", StepType::Transform),
        ]);
        assert!(def.validate().is_err());
    }

    #[test]
    fn rejects_branch_to_unknown_step() {
        let mut a = step("a", StepType::Branch);
        a.branch_targets.push(StepKey::new("missing").unwrap());
        let def = base_definition(vec![a]);
        assert!(def.validate().is_err());
    }

    #[test]
    fn accepts_well_formed_definition() {
        let def = base_definition(vec![step("extract", StepType::Extract), step("load", StepType::Load)]);
        assert!(def.validate().is_ok());
    }
}
