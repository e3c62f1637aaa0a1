// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Execution Runtime
//!
//! The application and infrastructure layers for running data-integration
//! pipelines: extract records from a source, transform them through a
//! declarative expression engine, and load them into one of a fixed set of
//! commerce entity types.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Bootstrap (pipeline-runtime-bootstrap)          │
//! │  CLI parsing, config loading, process exit codes             │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Application Layer (this crate)              │
//! │  Orchestrator, transform engine, loader engine, use cases     │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │          Domain Layer (pipeline-runtime-domain)               │
//! │  Entities, value objects, aggregates, repository ports         │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Infrastructure Layer (this crate)                │
//! │  SQLite repositories, HTTP/file extractors, Prometheus metrics │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Concepts
//!
//! A pipeline definition is a directed graph of steps (`EXTRACT`,
//! `TRANSFORM`, `LOAD`, `BRANCH`, `MERGE`, `GATE`). The [`PipelineOrchestrator`]
//! walks that graph one run at a time, persisting progress as an
//! event-sourced [`PipelineRunAggregate`] so a crashed or cancelled run can
//! resume from its last completed step rather than restarting from scratch.
//!
//! Records move between steps as [`RecordEnvelope`] values. The transform
//! engine evaluates each field mapping as a small expression tree of string,
//! numeric, date, boolean, coercion, lookup, and whole-record operators. The
//! loader engine dispatches each record to the `EntityLoader` registered for
//! its target entity type, with built-in natural-key-based loaders for the
//! platform's core commerce entities.
//!
//! Persistence is SQLite via `sqlx`, observability is `tracing` plus a small
//! Prometheus scrape endpoint, and the binary entry point lives in
//! `src/main.rs`.

pub mod application;
pub mod infrastructure;

// Tests are organized as:
// - Unit tests: #[cfg(test)] modules within each source file
// - Integration tests: separate files in tests/ directory

pub use application::orchestrator::{ExecuteOptions, PipelineOrchestrator, RunCancellationRegistry, RunSummary, StepSummary};
pub use application::use_cases::{CancelUseCase, ReplayUseCase, RunPipelineUseCase, SyncConfigUseCase, ValidateConfigUseCase};
pub use infrastructure::event_log::TracingEventPublisher;
pub use infrastructure::metrics::PipelineMetrics;
