// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Coercion transforms: `TO_STRING, TO_NUMBER, TO_BOOLEAN, TO_ARRAY, TO_JSON,
//! PARSE_JSON`.

use super::TransformRegistry;
use async_trait::async_trait;
use pipeline_runtime_domain::entities::RecordEnvelope;
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::transform::{Transform, TransformContext};
use serde_json::Value;
use std::sync::Arc;

macro_rules! simple_transform {
    ($name:ident, $type_name:expr, |$value:ident| $body:expr) => {
        pub struct $name;

        #[async_trait]
        impl Transform for $name {
            fn transform_type(&self) -> &'static str {
                $type_name
            }

            async fn execute(
                &self,
                _ctx: &TransformContext,
                $value: Value,
                _record: Option<&RecordEnvelope>,
                _params: &Value,
            ) -> Result<Value, PipelineError> {
                Ok($body)
            }
        }
    };
}

simple_transform!(ToString_, "TO_STRING", |value| match value {
    Value::String(s) => Value::String(s),
    Value::Null => Value::String(String::new()),
    other => Value::String(other.to_string()),
});

simple_transform!(ToNumber, "TO_NUMBER", |value| match &value {
    Value::Number(_) => value,
    Value::String(s) => s.trim().parse::<f64>().ok().and_then(serde_json::Number::from_f64).map(Value::Number).unwrap_or(value),
    Value::Bool(b) => Value::Number((*b as i64).into()),
    _ => value,
});

simple_transform!(ToBoolean, "TO_BOOLEAN", |value| match &value {
    Value::Bool(_) => value,
    Value::Number(n) => Value::Bool(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
    Value::String(s) => Value::Bool(!s.is_empty()),
    Value::Null => Value::Bool(false),
    Value::Array(a) => Value::Bool(!a.is_empty()),
    Value::Object(o) => Value::Bool(!o.is_empty()),
});

simple_transform!(ToArray, "TO_ARRAY", |value| match value {
    Value::Array(a) => Value::Array(a),
    Value::Null => Value::Array(vec![]),
    other => Value::Array(vec![other]),
});

simple_transform!(ToJson, "TO_JSON", |value| Value::String(value.to_string()));

pub struct ParseJson;

#[async_trait]
impl Transform for ParseJson {
    fn transform_type(&self) -> &'static str {
        "PARSE_JSON"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        _params: &Value,
    ) -> Result<Value, PipelineError> {
        let Value::String(s) = &value else {
            return Ok(value);
        };
        Ok(serde_json::from_str(s).unwrap_or(value))
    }
}

pub fn register(registry: &mut TransformRegistry) {
    registry.register(Arc::new(ToString_));
    registry.register(Arc::new(ToNumber));
    registry.register(Arc::new(ToBoolean));
    registry.register(Arc::new(ToArray));
    registry.register(Arc::new(ToJson));
    registry.register(Arc::new(ParseJson));
}
