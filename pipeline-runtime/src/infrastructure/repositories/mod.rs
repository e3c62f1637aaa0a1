// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed implementations of the domain's repository ports
//! (`CheckpointRepository`, `PipelineDefinitionRepository`,
//! `ErrorJournalRepository`, `PipelineRunRepository`, `RollbackRepository`).
//! One module per port, plus `schema` for migration bootstrap shared by all
//! of them.

pub mod checkpoint_repository;
pub mod definition_repository;
pub mod error_journal_repository;
pub mod rollback_repository;
pub mod run_repository;
pub mod schema;

pub use checkpoint_repository::SqliteCheckpointRepository;
pub use definition_repository::SqlitePipelineDefinitionRepository;
pub use error_journal_repository::SqliteErrorJournalRepository;
pub use rollback_repository::SqliteRollbackRepository;
pub use run_repository::SqlitePipelineRunRepository;
