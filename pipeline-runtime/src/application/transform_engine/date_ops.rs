// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Date transforms: `PARSE_DATE, FORMAT_DATE, NOW`.

use super::TransformRegistry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pipeline_runtime_domain::entities::RecordEnvelope;
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::transform::{Transform, TransformContext};
use serde_json::Value;
use std::sync::Arc;

fn parse_flexible(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
        })
}

pub struct ParseDate;

#[async_trait]
impl Transform for ParseDate {
    fn transform_type(&self) -> &'static str {
        "PARSE_DATE"
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
        Ok(match parse_flexible(s) {
            Some(dt) => Value::String(dt.to_rfc3339()),
            None => value,
        })
    }
}

pub struct FormatDate;

#[async_trait]
impl Transform for FormatDate {
    fn transform_type(&self) -> &'static str {
        "FORMAT_DATE"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        value: Value,
        _record: Option<&RecordEnvelope>,
        params: &Value,
    ) -> Result<Value, PipelineError> {
        let Value::String(s) = &value else {
            return Ok(value);
        };
        let Some(dt) = parse_flexible(s) else {
            return Ok(value);
        };
        let format = params.get("format").and_then(|v| v.as_str()).unwrap_or("%Y-%m-%d");
        Ok(Value::String(dt.format(format).to_string()))
    }
}

pub struct Now;

#[async_trait]
impl Transform for Now {
    fn transform_type(&self) -> &'static str {
        "NOW"
    }

    async fn execute(
        &self,
        _ctx: &TransformContext,
        _value: Value,
        _record: Option<&RecordEnvelope>,
        _params: &Value,
    ) -> Result<Value, PipelineError> {
        Ok(Value::String(Utc::now().to_rfc3339()))
    }
}

pub fn register(registry: &mut TransformRegistry) {
    registry.register(Arc::new(ParseDate));
    registry.register(Arc::new(FormatDate));
    registry.register(Arc::new(Now));
}
