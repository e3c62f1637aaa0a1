// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Numeric transforms: `PARSE_NUMBER/INT/FLOAT, ROUND, FLOOR, CEIL, ABS,
//! TO_CENTS, FROM_CENTS, MATH`. `TO_CENTS`/`FROM_CENTS` route through
//! [`MoneyCents`] so the round-trip invariant holds regardless of how many
//! times a value crosses the currency boundary.

use super::TransformRegistry;
use async_trait::async_trait;
use pipeline_runtime_domain::entities::RecordEnvelope;
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::transform::{Transform, TransformContext};
use pipeline_runtime_domain::value_objects::money_cents::MoneyCents;
use serde_json::{Number, Value};
use std::sync::Arc;

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number_value(n: f64) -> Value {
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

fn scale(params: &Value) -> i64 {
    let decimals = params.get("decimals").and_then(|v| v.as_i64()).unwrap_or(2);
    10i64.pow(decimals.max(0) as u32)
}

macro_rules! numeric_transform {
    ($name:ident, $type_name:expr, |$n:ident, $params:ident| $body:expr) => {
        pub struct $name;

        #[async_trait]
        impl Transform for $name {
            fn transform_type(&self) -> &'static str {
                $type_name
            }

            async fn execute(
                &self,
                _ctx: &TransformContext,
                value: Value,
                _record: Option<&RecordEnvelope>,
                $params: &Value,
            ) -> Result<Value, PipelineError> {
                let Some($n) = as_f64(&value) else {
                    return Ok(value);
                };
                Ok($body)
            }
        }
    };
}

pub struct ParseNumber;

#[async_trait]
impl Transform for ParseNumber {
    fn transform_type(&self) -> &'static str {
        "PARSE_NUMBER"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        _params: &Value,
    ) -> Result<Value, PipelineError> {
        Ok(as_f64(&value).map(number_value).unwrap_or(Value::Null))
    }
}

pub struct ParseInt;

#[async_trait]
impl Transform for ParseInt {
    fn transform_type(&self) -> &'static str {
        "PARSE_INT"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        _params: &Value,
    ) -> Result<Value, PipelineError> {
        Ok(as_f64(&value).map(|n| Value::Number(Number::from(n.trunc() as i64))).unwrap_or(Value::Null))
    }
}

pub struct ParseFloat;

#[async_trait]
impl Transform for ParseFloat {
    fn transform_type(&self) -> &'static str {
        "PARSE_FLOAT"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        _params: &Value,
    ) -> Result<Value, PipelineError> {
        Ok(as_f64(&value).map(number_value).unwrap_or(Value::Null))
    }
}

numeric_transform!(Round, "ROUND", |n, params| {
    let precision = params.get("precision").and_then(|v| v.as_u64()).unwrap_or(0) as i32;
    let factor = 10f64.powi(precision);
    number_value((n * factor).round() / factor)
});

numeric_transform!(Floor, "FLOOR", |n, _params| number_value(n.floor()));

numeric_transform!(Ceil, "CEIL", |n, _params| number_value(n.ceil()));

numeric_transform!(Abs, "ABS", |n, _params| number_value(n.abs()));

numeric_transform!(ToCents, "TO_CENTS", |n, params| {
    let scale_value = scale(params);
    let cents = MoneyCents::from_cents((n * scale_value as f64).round() as i64);
    Value::Number(Number::from(cents.cents()))
});

numeric_transform!(FromCents, "FROM_CENTS", |n, params| {
    let scale_value = scale(params);
    let money = MoneyCents::from_cents(n.round() as i64);
    money
        .to_decimal_string(scale_value)
        .parse::<f64>()
        .map(number_value)
        .unwrap_or(Value::Null)
});

numeric_transform!(Math, "MATH", |n, params| {
    let operation = params.get("operation").and_then(|v| v.as_str()).unwrap_or("add");
    let operand = params.get("operand").and_then(as_f64).unwrap_or(0.0);
    let result = match operation {
        "add" => n + operand,
        "sub" => n - operand,
        "mul" => n * operand,
        "div" if operand != 0.0 => n / operand,
        "div" => return number_value(n),
        _ => n,
    };
    match params.get("precision").and_then(|v| v.as_u64()) {
        Some(precision) => {
            let factor = 10f64.powi(precision as i32);
            number_value((result * factor).round() / factor)
        }
        None => number_value(result),
    }
});

pub fn register(registry: &mut TransformRegistry) {
    registry.register(Arc::new(ParseNumber));
    registry.register(Arc::new(ParseInt));
    registry.register(Arc::new(ParseFloat));
    registry.register(Arc::new(Round));
    registry.register(Arc::new(Floor));
    registry.register(Arc::new(Ceil));
    registry.register(Arc::new(Abs));
    registry.register(Arc::new(ToCents));
    registry.register(Arc::new(FromCents));
    registry.register(Arc::new(Math));
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
    async fn to_cents_rounds_to_nearest_cent() {
        let out = ToCents.execute(&ctx(), number_value(19.996), None, &Value::Null).await.unwrap();
        assert_eq!(out, Value::Number(Number::from(2000)));
    }

    #[tokio::test]
    async fn from_cents_inverts_to_cents() {
        let cents = ToCents.execute(&ctx(), number_value(19.99), None, &Value::Null).await.unwrap();
        let back = FromCents.execute(&ctx(), cents, None, &Value::Null).await.unwrap();
        assert_eq!(back, number_value(19.99));
    }

    #[tokio::test]
    async fn math_add_with_precision() {
        let params = serde_json::json!({"operation": "add", "operand": 0.005, "precision": 2});
        let out = Math.execute(&ctx(), number_value(1.0), None, &params).await.unwrap();
        assert_eq!(out, number_value(1.01));
    }

    #[tokio::test]
    async fn math_division_by_zero_passes_value_through() {
        let params = serde_json::json!({"operation": "div", "operand": 0.0});
        let out = Math.execute(&ctx(), number_value(5.0), None, &params).await.unwrap();
        assert_eq!(out, number_value(5.0));
    }

    #[tokio::test]
    async fn non_numeric_input_passes_through_unchanged() {
        let out = Round.execute(&ctx(), Value::String("not-a-number".into()), None, &Value::Null).await.unwrap();
        assert_eq!(out, Value::String("not-a-number".into()));
    }
}
