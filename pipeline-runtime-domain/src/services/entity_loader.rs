// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Entity Loader Framework port (spec §2, §4.3). A single `EntityLoader`
//! trait replaces the spec's original per-entity-type class hierarchy
//! ("inheritance collapse", SPEC_FULL §5 REDESIGN FLAGS): every loader
//! implements the same four operations and is told apart only by its
//! [`LoaderMetadata`].

use crate::entities::RecordEnvelope;
use crate::error::PipelineError;
use crate::services::request_context::RequestContext;
use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Operation {
    Create,
    Update,
    Upsert,
    Delete,
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: Option<String>,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn ok() -> Self {
        Self::default()
    }

    pub fn with_error(mut self, field: Option<&str>, code: &str, message: impl Into<String>) -> Self {
        self.errors.push(ValidationError {
            field: field.map(str::to_owned),
            code: code.to_owned(),
            message: message.into(),
        });
        self
    }
}

/// An entity resolved by [`EntityLoader::find_existing`], identified by its
/// downstream-system id rather than the record's own natural key.
#[derive(Debug, Clone)]
pub struct FoundEntity {
    pub id: String,
    pub entity: Value,
}

/// Commerce-domain grouping used for registry lookups and dashboards; not
/// load-bearing for execution semantics (spec §4.3).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LoaderCategory {
    Products,
    Customers,
    Catalog,
    Commerce,
    Inventory,
    Media,
    Configuration,
    Other,
}

#[derive(Debug, Clone)]
pub struct LoaderMetadata {
    pub entity_type: String,
    pub name: String,
    pub category: LoaderCategory,
    pub supported_operations: Vec<Operation>,
    pub lookup_fields: Vec<String>,
    pub required_fields: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LoaderContext {
    pub request: RequestContext,
    pub dry_run: bool,
}

#[async_trait]
pub trait EntityLoader: Send + Sync {
    fn metadata(&self) -> &LoaderMetadata;

    /// JSON-schema-shaped description of the fields this loader accepts,
    /// surfaced by `validate-config` and by documentation tooling.
    fn field_schema(&self) -> Value;

    async fn validate(&self, ctx: &LoaderContext, record: &RecordEnvelope, operation: Operation) -> Result<ValidationOutcome, PipelineError>;

    /// Resolves the record against the downstream system via this loader's
    /// configured lookup fields. Returning `Ok(None)` means "no match, safe
    /// to create"; the caller decides create-vs-update from this result and
    /// the requested `Operation`.
    async fn find_existing(&self, ctx: &LoaderContext, record: &RecordEnvelope) -> Result<Option<FoundEntity>, PipelineError>;

    /// Returns the new entity's id, or `None` in `dry_run` mode.
    async fn create_entity(&self, ctx: &LoaderContext, record: &RecordEnvelope) -> Result<Option<String>, PipelineError>;

    async fn update_entity(&self, ctx: &LoaderContext, id: &str, record: &RecordEnvelope) -> Result<(), PipelineError>;

    async fn delete_entity(&self, ctx: &LoaderContext, id: &str) -> Result<(), PipelineError>;
}
