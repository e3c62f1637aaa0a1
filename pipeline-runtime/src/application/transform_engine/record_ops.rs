// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Record-context transforms: `IF_ELSE, COALESCE, DEFAULT, FIRST, LAST, NTH,
//! FILTER, MAP_ARRAY, FLATTEN, EXPRESSION`. These see the whole
//! [`RecordEnvelope`] in addition to the field value being transformed, so
//! predicates and substitutions can reach sibling fields.

use super::TransformRegistry;
use async_trait::async_trait;
use pipeline_runtime_domain::entities::RecordEnvelope;
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::transform::{Transform, TransformContext};
use serde_json::Value;
use std::sync::Arc;

fn record_field(record: Option<&RecordEnvelope>, name: &str) -> Value {
    record.and_then(|r| r.field(name)).cloned().unwrap_or(Value::Null)
}

fn compare(operator: &str, lhs: &Value, rhs: &Value) -> bool {
    match operator {
        "eq" => lhs == rhs,
        "ne" => lhs != rhs,
        "exists" => !lhs.is_null(),
        "gt" | "lt" | "gte" | "lte" => {
            let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) else {
                return false;
            };
            match operator {
                "gt" => a > b,
                "lt" => a < b,
                "gte" => a >= b,
                "lte" => a <= b,
                _ => unreachable!(),
            }
        }
        "contains" => match lhs {
            Value::String(s) => rhs.as_str().map(|needle| s.contains(needle)).unwrap_or(false),
            Value::Array(items) => items.contains(rhs),
            _ => false,
        },
        _ => false,
    }
}

pub struct IfElse;

#[async_trait]
impl Transform for IfElse {
    fn transform_type(&self) -> &'static str {
        "IF_ELSE"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        record: Option<&RecordEnvelope>,
        params: &Value,
    ) -> Result<Value, PipelineError> {
        let condition = params.get("condition").cloned().unwrap_or(Value::Null);
        let operator = condition.get("operator").and_then(|v| v.as_str()).unwrap_or("exists");
        let lhs = match condition.get("field").and_then(|v| v.as_str()) {
            Some(field) => record_field(record, field),
            None => value.clone(),
        };
        let rhs = condition.get("value").cloned().unwrap_or(Value::Null);
        let matched = compare(operator, &lhs, &rhs);
        Ok(if matched {
            params.get("then").cloned().unwrap_or(value)
        } else {
            params.get("else").cloned().unwrap_or(value)
        })
    }
}

pub struct Coalesce;

#[async_trait]
impl Transform for Coalesce {
    fn transform_type(&self) -> &'static str {
        "COALESCE"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        record: Option<&RecordEnvelope>,
        params: &Value,
    ) -> Result<Value, PipelineError> {
        if !value.is_null() {
            return Ok(value);
        }
        let Some(fields) = params.get("fields").and_then(|v| v.as_array()) else {
            return Ok(Value::Null);
        };
        for field in fields {
            if let Some(name) = field.as_str() {
                let candidate = record_field(record, name);
                if !candidate.is_null() {
                    return Ok(candidate);
                }
            }
        }
        Ok(Value::Null)
    }
}

pub struct DefaultValue;

#[async_trait]
impl Transform for DefaultValue {
    fn transform_type(&self) -> &'static str {
        "DEFAULT"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        params: &Value,
    ) -> Result<Value, PipelineError> {
        Ok(if value.is_null() {
            params.get("value").cloned().unwrap_or(Value::Null)
        } else {
            value
        })
    }
}

pub struct First;

#[async_trait]
impl Transform for First {
    fn transform_type(&self) -> &'static str {
        "FIRST"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        _params: &Value,
    ) -> Result<Value, PipelineError> {
        Ok(match value {
            Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
            other => other,
        })
    }
}

pub struct Last;

#[async_trait]
impl Transform for Last {
    fn transform_type(&self) -> &'static str {
        "LAST"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        _params: &Value,
    ) -> Result<Value, PipelineError> {
        Ok(match value {
            Value::Array(items) => items.into_iter().next_back().unwrap_or(Value::Null),
            other => other,
        })
    }
}

pub struct Nth;

#[async_trait]
impl Transform for Nth {
    fn transform_type(&self) -> &'static str {
        "NTH"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        params: &Value,
    ) -> Result<Value, PipelineError> {
        let index = params.get("index").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
        Ok(match value {
            Value::Array(mut items) => {
                if index < items.len() {
                    items.swap_remove(index)
                } else {
                    Value::Null
                }
            }
            other => other,
        })
    }
}

pub struct Filter;

#[async_trait]
impl Transform for Filter {
    fn transform_type(&self) -> &'static str {
        "FILTER"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        params: &Value,
    ) -> Result<Value, PipelineError> {
        let Value::Array(items) = value else {
            return Ok(value);
        };
        let field = params.get("field").and_then(|v| v.as_str());
        let operator = params.get("operator").and_then(|v| v.as_str()).unwrap_or("eq");
        let rhs = params.get("value").cloned().unwrap_or(Value::Null);
        let filtered: Vec<Value> = items
            .into_iter()
            .filter(|item| {
                let lhs = match field {
                    Some(name) => item.get(name).cloned().unwrap_or(Value::Null),
                    None => item.clone(),
                };
                compare(operator, &lhs, &rhs)
            })
            .collect();
        Ok(Value::Array(filtered))
    }
}

pub struct MapArray;

#[async_trait]
impl Transform for MapArray {
    fn transform_type(&self) -> &'static str {
        "MAP_ARRAY"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        params: &Value,
    ) -> Result<Value, PipelineError> {
        let Value::Array(items) = value else {
            return Ok(value);
        };
        let Some(field) = params.get("field").and_then(|v| v.as_str()) else {
            return Ok(Value::Array(items));
        };
        let mapped: Vec<Value> = items.into_iter().map(|item| item.get(field).cloned().unwrap_or(Value::Null)).collect();
        Ok(Value::Array(mapped))
    }
}

pub struct Flatten;

#[async_trait]
impl Transform for Flatten {
    fn transform_type(&self) -> &'static str {
        "FLATTEN"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        _params: &Value,
    ) -> Result<Value, PipelineError> {
        let Value::Array(items) = value else {
            return Ok(value);
        };
        let mut flat = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Array(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        Ok(Value::Array(flat))
    }
}

/// Narrow expression evaluator: substitutes `{{field}}` references against
/// the record, then the literal `{{value}}` placeholder against the input
/// value. No arithmetic or boolean operators; `IF_ELSE`/`MATH` cover those.
pub struct Expression;

#[async_trait]
impl Transform for Expression {
    fn transform_type(&self) -> &'static str {
        "EXPRESSION"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        record: Option<&RecordEnvelope>,
        params: &Value,
    ) -> Result<Value, PipelineError> {
        let Some(expression) = params.get("expression").and_then(|v| v.as_str()) else {
            return Ok(value);
        };
        let mut rendered = expression.replace(
            "{{value}}",
            &match &value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            },
        );
        if let Some(envelope) = record {
            if let Value::Object(fields) = &envelope.data {
                for (key, field_value) in fields {
                    let placeholder = format!("{{{{{}}}}}", key);
                    let rendered_value = match field_value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    rendered = rendered.replace(&placeholder, &rendered_value);
                }
            }
        }
        Ok(Value::String(rendered))
    }
}

pub fn register(registry: &mut TransformRegistry) {
    registry.register(Arc::new(IfElse));
    registry.register(Arc::new(Coalesce));
    registry.register(Arc::new(DefaultValue));
    registry.register(Arc::new(First));
    registry.register(Arc::new(Last));
    registry.register(Arc::new(Nth));
    registry.register(Arc::new(Filter));
    registry.register(Arc::new(MapArray));
    registry.register(Arc::new(Flatten));
    registry.register(Arc::new(Expression));
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
    async fn if_else_picks_branch_by_record_field() {
        let record = RecordEnvelope::new(serde_json::json!({"status": "active"}));
        let params = serde_json::json!({
            "condition": {"field": "status", "operator": "eq", "value": "active"},
            "then": "ACTIVE",
            "else": "INACTIVE",
        });
        let out = IfElse.execute(&ctx(), Value::Null, Some(&record), &params).await.unwrap();
        assert_eq!(out, Value::String("ACTIVE".into()));
    }

    #[tokio::test]
    async fn coalesce_returns_first_non_null_sibling_field() {
        let record = RecordEnvelope::new(serde_json::json!({"a": null, "b": "found"}));
        let params = serde_json::json!({"fields": ["a", "b"]});
        let out = Coalesce.execute(&ctx(), Value::Null, Some(&record), &params).await.unwrap();
        assert_eq!(out, Value::String("found".into()));
    }

    #[tokio::test]
    async fn filter_keeps_matching_items_only() {
        let value = serde_json::json!([{"type": "a"}, {"type": "b"}]);
        let params = serde_json::json!({"field": "type", "operator": "eq", "value": "a"});
        let out = Filter.execute(&ctx(), value, None, &params).await.unwrap();
        assert_eq!(out, serde_json::json!([{"type": "a"}]));
    }

    #[tokio::test]
    async fn flatten_merges_one_level_of_nesting() {
        let value = serde_json::json!([[1, 2], [3], 4]);
        let out = Flatten.execute(&ctx(), value, None, &Value::Null).await.unwrap();
        assert_eq!(out, serde_json::json!([1, 2, 3, 4]));
    }

    #[tokio::test]
    async fn expression_substitutes_record_fields() {
        let record = RecordEnvelope::new(serde_json::json!({"sku": "X-1"}));
        let params = serde_json::json!({"expression": "item-{{sku}}"});
        let out = Expression.execute(&ctx(), Value::Null, Some(&record), &params).await.unwrap();
        assert_eq!(out, Value::String("item-X-1".into()));
    }
}
