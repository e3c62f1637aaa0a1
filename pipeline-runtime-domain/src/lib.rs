// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # pipeline-runtime-domain
//!
//! Pure domain layer for the pipeline execution runtime: the entities,
//! value objects, aggregates, and events that describe a data-integration
//! pipeline and a single run of it, plus the port traits
//! (`Transform`, `DataExtractor`, `EntityLoader`, `StepExecutor`,
//! `EventPublisher`, and the `*Repository` traits) that the application and
//! infrastructure layers implement.
//!
//! This crate depends on `serde`, `chrono`, `ulid`, `thiserror`, and
//! `async-trait` only. It does not depend on `tokio`, `reqwest`, or `sqlx`:
//! `async-trait` lets it describe asynchronous ports without committing to
//! a runtime, the same separation the sibling crates build on.
//!
//! ```text
//! pipeline-runtime-domain
//!   value_objects  -- PipelineId, RunId, StepKey, MoneyCents, ...
//!   entities       -- PipelineDefinition, PipelineRun, Checkpoint, ...
//!   aggregates     -- PipelineRunAggregate (event-sourced run state)
//!   events         -- DomainEvent<T>, PipelineStarted, StepFailed, ...
//!   services       -- Transform, DataExtractor, EntityLoader, StepExecutor
//!   repositories   -- PipelineDefinitionRepository, CheckpointRepository, ...
//! ```

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod events;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use error::PipelineError;
