// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Port traits implemented by the application and infrastructure layers.
//! Nothing in this module touches tokio, reqwest, or sqlx directly; it
//! names capabilities (`Transform`, `DataExtractor`, `EntityLoader`,
//! `StepExecutor`, `EventPublisher`) and leaves the runtime that drives
//! them to the crates above.

pub mod cancellation;
pub mod data_extractor;
pub mod datetime_serde;
pub mod entity_loader;
pub mod entity_service;
pub mod event_publisher;
pub mod request_context;
pub mod run_context;
pub mod step_executor;
pub mod transform;

pub use cancellation::{CancellationSignal, NeverCancelled};
pub use data_extractor::{DataExtractor, ExtractBatch, ExtractorContext, PaginationConfig, PaginationStrategy, RateLimitPolicy, RetryPolicy};
pub use entity_loader::{EntityLoader, FoundEntity, LoaderCategory, LoaderContext, LoaderMetadata, Operation, ValidationError, ValidationOutcome};
pub use entity_service::{EntityRecord, EntityService};
pub use event_publisher::EventPublisher;
pub use request_context::RequestContext;
pub use run_context::{LogPersistenceLevel, RunContext};
pub use step_executor::{ResourceRequirements, StepExecutor, StepOutcome, StepRecordFailure};
pub use transform::{Transform, TransformContext};
