// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Run Aggregate
//!
//! Event-sourced wrapper around [`PipelineRun`]. The orchestrator mutates a
//! run only by appending a [`RunEvent`] and applying it; `uncommitted_events`
//! accumulates events since the aggregate was loaded so the application
//! layer can publish them (as [`crate::events::DomainEvent`]s) and persist
//! them as the durable record of what happened, independent of whatever the
//! repository uses to snapshot current state.

use crate::entities::{PipelineRun, RecordOutcome, RunStatus, StepMetrics};
use crate::error::PipelineError;
use crate::value_objects::{PipelineId, RunId, StepKey};
use serde::{Deserialize, Serialize};

/// A state transition applied to a [`PipelineRunAggregate`]. Each variant
/// corresponds to a point in the orchestrator algorithm (spec §4.1) where
/// run state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    Started { pipeline_id: PipelineId, run_id: RunId },
    StepStarted { step_key: StepKey },
    RecordProcessed { step_key: StepKey, outcome: RecordOutcome },
    /// Folds a batch's already-aggregated metrics in one event, for step
    /// executors that report counts rather than per-record outcomes.
    StepMetricsMerged { step_key: StepKey, metrics: StepMetrics },
    StepFinished { step_key: StepKey },
    Paused { step_key: StepKey },
    Resumed,
    Completed,
    Failed { reason: String },
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct PipelineRunAggregate {
    run: PipelineRun,
    version: u64,
    uncommitted_events: Vec<RunEvent>,
}

impl PipelineRunAggregate {
    /// Starts a brand-new run aggregate and records the `Started` event.
    pub fn start(pipeline_id: PipelineId) -> Self {
        let run = PipelineRun::new(pipeline_id.clone());
        let run_id = run.id.clone();
        let mut aggregate = Self {
            run,
            version: 0,
            uncommitted_events: Vec::new(),
        };
        aggregate.add_event(RunEvent::Started { pipeline_id, run_id });
        aggregate
    }

    /// Reconstructs an aggregate by replaying a full event history, as
    /// used when resuming or auditing a run.
    pub fn from_events(pipeline_id: PipelineId, events: Vec<RunEvent>) -> Result<Self, PipelineError> {
        let mut events = events.into_iter();
        let first = events
            .next()
            .ok_or_else(|| PipelineError::InvalidConfiguration("cannot rebuild a run from no events".into()))?;

        let RunEvent::Started { run_id, .. } = &first else {
            return Err(PipelineError::InvalidConfiguration(
                "first event of a run must be Started".into(),
            ));
        };

        let mut aggregate = Self {
            run: PipelineRun::new(pipeline_id),
            version: 0,
            uncommitted_events: Vec::new(),
        };
        aggregate.run.id = run_id.clone();
        aggregate.apply(&first);
        aggregate.version += 1;

        for event in events {
            aggregate.apply(&event);
            aggregate.version += 1;
        }

        Ok(aggregate)
    }

    pub fn run(&self) -> &PipelineRun {
        &self.run
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn uncommitted_events(&self) -> &[RunEvent] {
        &self.uncommitted_events
    }

    pub fn mark_committed(&mut self) {
        self.uncommitted_events.clear();
    }

    pub fn record_outcome(&mut self, step_key: StepKey, outcome: RecordOutcome) {
        self.add_event(RunEvent::RecordProcessed { step_key, outcome });
    }

    pub fn merge_step_metrics(&mut self, step_key: StepKey, metrics: StepMetrics) {
        self.add_event(RunEvent::StepMetricsMerged { step_key, metrics });
    }

    pub fn finish_step(&mut self, step_key: StepKey) {
        self.add_event(RunEvent::StepFinished { step_key });
    }

    pub fn pause(&mut self, step_key: StepKey) {
        self.add_event(RunEvent::Paused { step_key });
    }

    pub fn resume(&mut self) {
        self.add_event(RunEvent::Resumed);
    }

    pub fn complete(&mut self) {
        self.add_event(RunEvent::Completed);
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.add_event(RunEvent::Failed { reason: reason.into() });
    }

    pub fn cancel(&mut self) {
        self.add_event(RunEvent::Cancelled);
    }

    fn add_event(&mut self, event: RunEvent) {
        self.apply(&event);
        self.version += 1;
        self.uncommitted_events.push(event);
    }

    fn apply(&mut self, event: &RunEvent) {
        match event {
            RunEvent::Started { .. } => {
                self.run.status = RunStatus::Running;
            }
            RunEvent::StepStarted { .. } => {}
            RunEvent::RecordProcessed { step_key, outcome } => {
                self.run.metrics.record(step_key, *outcome);
            }
            RunEvent::StepMetricsMerged { step_key, metrics } => {
                self.run.metrics.merge_step(step_key, *metrics);
            }
            RunEvent::StepFinished { .. } => {}
            RunEvent::Paused { step_key } => {
                self.run.status = RunStatus::Paused;
                self.run.paused_at_step = Some(step_key.clone());
            }
            RunEvent::Resumed => {
                self.run.status = RunStatus::Running;
                self.run.paused_at_step = None;
            }
            RunEvent::Completed => {
                self.run.status = RunStatus::Completed;
                self.run.finished_at = Some(chrono::Utc::now());
            }
            RunEvent::Failed { .. } => {
                self.run.status = RunStatus::Failed;
                self.run.finished_at = Some(chrono::Utc::now());
            }
            RunEvent::Cancelled => {
                self.run.status = RunStatus::Cancelled;
                self.run.finished_at = Some(chrono::Utc::now());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_transitions_to_running_and_records_one_event() {
        let aggregate = PipelineRunAggregate::start(PipelineId::new());
        assert_eq!(aggregate.run().status, RunStatus::Running);
        assert_eq!(aggregate.uncommitted_events().len(), 1);
        assert_eq!(aggregate.version(), 1);
    }

    #[test]
    fn pause_then_resume_round_trips_status() {
        let mut aggregate = PipelineRunAggregate::start(PipelineId::new());
        let step = StepKey::new("gate").unwrap();
        aggregate.pause(step.clone());
        assert_eq!(aggregate.run().status, RunStatus::Paused);
        assert_eq!(aggregate.run().paused_at_step, Some(step));
        aggregate.resume();
        assert_eq!(aggregate.run().status, RunStatus::Running);
        assert!(aggregate.run().paused_at_step.is_none());
    }

    #[test]
    fn paused_run_never_reaches_completed_without_resume() {
        let mut aggregate = PipelineRunAggregate::start(PipelineId::new());
        aggregate.pause(StepKey::new("gate").unwrap());
        assert_ne!(aggregate.run().status, RunStatus::Completed);
    }

    #[test]
    fn from_events_reconstructs_equivalent_state() {
        let pipeline_id = PipelineId::new();
        let mut original = PipelineRunAggregate::start(pipeline_id.clone());
        let step = StepKey::new("load").unwrap();
        original.record_outcome(step.clone(), RecordOutcome::Created);
        original.complete();

        let events = original.uncommitted_events().to_vec();
        let rebuilt = PipelineRunAggregate::from_events(pipeline_id, events).unwrap();

        assert_eq!(rebuilt.run().status, RunStatus::Completed);
        assert_eq!(rebuilt.run().metrics.totals.created, 1);
        assert_eq!(rebuilt.version(), original.version());
    }

    #[test]
    fn mark_committed_clears_uncommitted_events() {
        let mut aggregate = PipelineRunAggregate::start(PipelineId::new());
        aggregate.mark_committed();
        assert!(aggregate.uncommitted_events().is_empty());
    }
}
