// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Port implemented by every transform operation in the string/numeric/
//! date/boolean/coercion/record/lookup families (spec §4.2). `Transform`
//! is async only because `LOOKUP` needs [`EntityService`]; pure transforms
//! simply never await.

use crate::entities::RecordEnvelope;
use crate::error::PipelineError;
use crate::services::entity_service::EntityService;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct TransformContext {
    pub entity_service: Arc<dyn EntityService>,
    pub channel: Option<String>,
    pub content_language: Option<String>,
}

#[async_trait]
pub trait Transform: Send + Sync {
    /// The name used in pipeline definitions' transform chains, e.g.
    /// `"trim"`, `"toCents"`, `"lookup"`.
    fn transform_type(&self) -> &'static str;

    /// Applies the transform to a single field value. `record` gives
    /// record-scoped transforms (e.g. ones that read sibling fields) access
    /// to the whole envelope without forcing every transform to take it.
    async fn execute(
        &self,
        ctx: &TransformContext,
        value: Value,
        record: Option<&RecordEnvelope>,
        params: &Value,
    ) -> Result<Value, PipelineError>;
}
