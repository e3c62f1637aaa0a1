// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Run & Metrics
//!
//! One [`PipelineRun`] exists per `Execute`/`ReplayFromStep` invocation. It
//! tracks the run's state-machine status, aggregated [`RunMetrics`], and a
//! per-step breakdown used for the summary returned to the caller.

use crate::value_objects::{PipelineId, RunId, StepKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `PENDING -> RUNNING -> {COMPLETED | FAILED | CANCELLED | PAUSED}`.
/// `PAUSED` transitions back to `RUNNING` on resume.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    Paused,
}

impl RunStatus {
    /// Whether this status is terminal — no further transitions are valid.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub skipped: u64,
    pub created: u64,
    pub updated: u64,
}

impl StepMetrics {
    /// The invariant from spec §8: `processed = succeeded + failed + skipped`.
    pub fn is_consistent(&self) -> bool {
        self.processed == self.succeeded + self.failed + self.skipped
    }

    pub fn add_record(&mut self, outcome: RecordOutcome) {
        self.processed += 1;
        match outcome {
            RecordOutcome::Created => {
                self.succeeded += 1;
                self.created += 1;
            }
            RecordOutcome::Updated => {
                self.succeeded += 1;
                self.updated += 1;
            }
            RecordOutcome::Succeeded => self.succeeded += 1,
            RecordOutcome::Failed => self.failed += 1,
            RecordOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Outcome of processing a single record through a step, used to keep
/// [`StepMetrics`] and [`RunMetrics`] consistent with one increment site.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RecordOutcome {
    Created,
    Updated,
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub totals: StepMetrics,
    pub per_step: HashMap<String, StepMetrics>,
}

impl RunMetrics {
    pub fn record(&mut self, step_key: &StepKey, outcome: RecordOutcome) {
        self.totals.add_record(outcome);
        self.per_step
            .entry(step_key.as_str().to_string())
            .or_default()
            .add_record(outcome);
    }

    /// Folds an already-aggregated [`StepMetrics`] (as returned by a
    /// [`crate::services::step_executor::StepOutcome`]) into the run
    /// totals and the named step's breakdown.
    pub fn merge_step(&mut self, step_key: &StepKey, metrics: StepMetrics) {
        self.totals.processed += metrics.processed;
        self.totals.succeeded += metrics.succeeded;
        self.totals.failed += metrics.failed;
        self.totals.skipped += metrics.skipped;
        self.totals.created += metrics.created;
        self.totals.updated += metrics.updated;

        let entry = self.per_step.entry(step_key.as_str().to_string()).or_default();
        entry.processed += metrics.processed;
        entry.succeeded += metrics.succeeded;
        entry.failed += metrics.failed;
        entry.skipped += metrics.skipped;
        entry.created += metrics.created;
        entry.updated += metrics.updated;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecutionRecord {
    pub step_key: StepKey,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub metrics: StepMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: RunId,
    pub pipeline_id: PipelineId,
    pub status: RunStatus,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub metrics: RunMetrics,
    pub step_executions: Vec<StepExecutionRecord>,
    pub paused_at_step: Option<StepKey>,
}

impl PipelineRun {
    pub fn new(pipeline_id: PipelineId) -> Self {
        Self {
            id: RunId::new(),
            pipeline_id,
            status: RunStatus::Pending,
            started_at: chrono::Utc::now(),
            finished_at: None,
            metrics: RunMetrics::default(),
            step_executions: Vec::new(),
            paused_at_step: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_metrics_stay_consistent_as_outcomes_accumulate() {
        let mut metrics = StepMetrics::default();
        metrics.add_record(RecordOutcome::Created);
        metrics.add_record(RecordOutcome::Failed);
        metrics.add_record(RecordOutcome::Skipped);
        assert!(metrics.is_consistent());
        assert_eq!(metrics.processed, 3);
    }

    #[test]
    fn run_metrics_aggregate_across_steps() {
        let mut metrics = RunMetrics::default();
        let a = StepKey::new("extract").unwrap();
        let b = StepKey::new("load").unwrap();
        metrics.record(&a, RecordOutcome::Succeeded);
        metrics.record(&b, RecordOutcome::Failed);
        assert_eq!(metrics.totals.processed, 2);
        assert_eq!(metrics.per_step.get("extract").unwrap().succeeded, 1);
        assert_eq!(metrics.per_step.get("load").unwrap().failed, 1);
    }

    #[test]
    fn terminal_statuses_are_flagged() {
        assert!(RunStatus::Completed.is_terminal());
        assert!(!RunStatus::Paused.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
    }
}
