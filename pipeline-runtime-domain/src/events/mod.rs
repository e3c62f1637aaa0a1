// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain events published around run/step/record boundaries.

pub mod generic_event;
pub mod pipeline_events;

pub use generic_event::{DomainEvent, EventCategory, EventPayload};
pub use pipeline_events::{PipelineCompleted, PipelineFailed, PipelineStarted, RecordFailed, StepCompleted, StepFailed};
