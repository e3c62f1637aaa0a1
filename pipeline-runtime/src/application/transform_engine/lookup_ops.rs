// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Lookup transforms: `LOOKUP` (the only async built-in; queries
//! [`EntityService`]) and `MAP` (a static value→value table).

use super::TransformRegistry;
use async_trait::async_trait;
use pipeline_runtime_domain::entities::RecordEnvelope;
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::transform::{Transform, TransformContext};
use serde_json::Value;
use std::sync::Arc;

pub struct Lookup;

#[async_trait]
impl Transform for Lookup {
    fn transform_type(&self) -> &'static str {
        "LOOKUP"
    }

    async fn execute(
        &self,
        ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        params: &Value,
    ) -> Result<Value, PipelineError> {
        let entity_type = params.get("entityType").and_then(|v| v.as_str()).ok_or_else(|| {
            PipelineError::InvalidConfiguration("LOOKUP requires 'entityType'".to_string())
        })?;
        let from_field = params.get("fromField").and_then(|v| v.as_str()).unwrap_or("code");
        let to_field = params.get("toField").and_then(|v| v.as_str()).unwrap_or("id");

        let found = ctx.entity_service.find_one(entity_type, from_field, &value).await?;
        Ok(match found {
            Some(record) if to_field == "id" => Value::String(record.id),
            Some(record) => record.data.get(to_field).cloned().unwrap_or(Value::Null),
            None => Value::Null,
        })
    }
}

pub struct Map;

#[async_trait]
impl Transform for Map {
    fn transform_type(&self) -> &'static str {
        "MAP"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        params: &Value,
    ) -> Result<Value, PipelineError> {
        let Some(values) = params.get("values").and_then(|v| v.as_object()) else {
            return Ok(value);
        };
        let case_sensitive = params.get("caseSensitive").and_then(|v| v.as_bool()).unwrap_or(true);
        let key = match &value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        let matched = if case_sensitive {
            values.get(&key).cloned()
        } else {
            let lowered = key.to_lowercase();
            values.iter().find(|(k, _)| k.to_lowercase() == lowered).map(|(_, v)| v.clone())
        };

        Ok(matched.or_else(|| params.get("defaultValue").cloned()).unwrap_or(Value::Null))
    }
}

pub fn register(registry: &mut TransformRegistry) {
    registry.register(Arc::new(Lookup));
    registry.register(Arc::new(Map));
}
