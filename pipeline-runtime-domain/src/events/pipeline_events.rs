// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Concrete event payloads published during a run: `PIPELINE_STARTED`,
//! `PIPELINE_COMPLETED`, `PIPELINE_FAILED`, `STEP_COMPLETED`,
//! `STEP_FAILED`, `RECORD_FAILED` (spec §6).

use super::generic_event::{EventCategory, EventPayload};
use crate::value_objects::{PipelineId, RunId, StepKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStarted {
    pub pipeline_id: PipelineId,
    pub run_id: RunId,
}

impl EventPayload for PipelineStarted {
    fn event_name(&self) -> &'static str {
        "PIPELINE_STARTED"
    }
    fn event_category(&self) -> EventCategory {
        EventCategory::Pipeline
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineCompleted {
    pub pipeline_id: PipelineId,
    pub run_id: RunId,
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl EventPayload for PipelineCompleted {
    fn event_name(&self) -> &'static str {
        "PIPELINE_COMPLETED"
    }
    fn event_category(&self) -> EventCategory {
        EventCategory::Pipeline
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineFailed {
    pub pipeline_id: PipelineId,
    pub run_id: RunId,
    pub reason: String,
}

impl EventPayload for PipelineFailed {
    fn event_name(&self) -> &'static str {
        "PIPELINE_FAILED"
    }
    fn event_category(&self) -> EventCategory {
        EventCategory::Pipeline
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepCompleted {
    pub pipeline_id: PipelineId,
    pub run_id: RunId,
    pub step_key: StepKey,
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub duration_ms: u64,
}

impl EventPayload for StepCompleted {
    fn event_name(&self) -> &'static str {
        "STEP_COMPLETED"
    }
    fn event_category(&self) -> EventCategory {
        EventCategory::Step
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepFailed {
    pub pipeline_id: PipelineId,
    pub run_id: RunId,
    pub step_key: StepKey,
    pub reason: String,
}

impl EventPayload for StepFailed {
    fn event_name(&self) -> &'static str {
        "STEP_FAILED"
    }
    fn event_category(&self) -> EventCategory {
        EventCategory::Step
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordFailed {
    pub pipeline_id: PipelineId,
    pub run_id: RunId,
    pub step_key: StepKey,
    pub message: String,
    pub recoverable: bool,
}

impl EventPayload for RecordFailed {
    fn event_name(&self) -> &'static str {
        "RECORD_FAILED"
    }
    fn event_category(&self) -> EventCategory {
        EventCategory::Record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_match_spec_identifiers() {
        let started = PipelineStarted {
            pipeline_id: PipelineId::new(),
            run_id: RunId::new(),
        };
        assert_eq!(started.event_name(), "PIPELINE_STARTED");
    }
}
