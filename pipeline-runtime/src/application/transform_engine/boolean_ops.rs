// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Boolean transforms: `PARSE_BOOLEAN, NEGATE`.

use super::TransformRegistry;
use async_trait::async_trait;
use pipeline_runtime_domain::entities::RecordEnvelope;
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::transform::{Transform, TransformContext};
use serde_json::Value;
use std::sync::Arc;

fn truthy_string(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "y" | "on" => Some(true),
        "false" | "no" | "0" | "n" | "off" | "" => Some(false),
        _ => None,
    }
}

pub struct ParseBoolean;

#[async_trait]
impl Transform for ParseBoolean {
    fn transform_type(&self) -> &'static str {
        "PARSE_BOOLEAN"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        _params: &Value,
    ) -> Result<Value, PipelineError> {
        let parsed = match &value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => truthy_string(s),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            Value::Null => Some(false),
            _ => None,
        };
        Ok(match parsed {
            Some(b) => Value::Bool(b),
            None => value,
        })
    }
}

pub struct Negate;

#[async_trait]
impl Transform for Negate {
    fn transform_type(&self) -> &'static str {
        "NEGATE"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        _params: &Value,
    ) -> Result<Value, PipelineError> {
        Ok(match value.as_bool() {
            Some(b) => Value::Bool(!b),
            None => value,
        })
    }
}

pub fn register(registry: &mut TransformRegistry) {
    registry.register(Arc::new(ParseBoolean));
    registry.register(Arc::new(Negate));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_runtime_domain::services::entity_service::{EntityRecord, EntityService};

    struct NullEntityService;

    #[async_trait]
    impl EntityService for NullEntityService {
        async fn find_one(&self, _entity_type: &str, _field: &str, _value: &Value) -> Result<Option<EntityRecord>, PipelineError> {
            Ok(None)
        }
        async fn find_all(&self, _entity_type: &str, _field: &str, _value: &Value) -> Result<Vec<EntityRecord>, PipelineError> {
            Ok(vec![])
        }
        async fn create(&self, _entity_type: &str, _record: &Value) -> Result<String, PipelineError> {
            Ok(String::new())
        }
        async fn update(&self, _entity_type: &str, _id: &str, _record: &Value) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn delete(&self, _entity_type: &str, _id: &str) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    fn ctx() -> TransformContext {
        TransformContext {
            entity_service: Arc::new(NullEntityService),
            channel: None,
            content_language: None,
        }
    }

    #[tokio::test]
    async fn parse_boolean_accepts_yes_no() {
        assert_eq!(
            ParseBoolean.execute(&ctx(), Value::String("yes".into()), None, &Value::Null).await.unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            ParseBoolean.execute(&ctx(), Value::String("no".into()), None, &Value::Null).await.unwrap(),
            Value::Bool(false)
        );
    }

    #[tokio::test]
    async fn parse_boolean_leaves_unrecognized_strings_unchanged() {
        let out = ParseBoolean.execute(&ctx(), Value::String("maybe".into()), None, &Value::Null).await.unwrap();
        assert_eq!(out, Value::String("maybe".into()));
    }

    #[tokio::test]
    async fn negate_flips_bool() {
        let out = Negate.execute(&ctx(), Value::Bool(true), None, &Value::Null).await.unwrap();
        assert_eq!(out, Value::Bool(false));
    }
}
