// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Paginated HTTP extractor (spec §4.4): `GET`s a configured URL page by
//! page, retrying transient failures with exponential backoff and pacing
//! requests against a requests-per-second budget.

use async_trait::async_trait;
use pipeline_runtime_domain::entities::RecordEnvelope;
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::data_extractor::{
    DataExtractor, ExtractBatch, ExtractorContext, PaginationConfig, PaginationStrategy, RateLimitPolicy, RetryPolicy,
};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

pub struct HttpExtractor {
    client: reqwest::Client,
}

impl Default for HttpExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpExtractor {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }

    fn url(config: &Value) -> Result<&str, PipelineError> {
        config
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| PipelineError::InvalidConfiguration("http extractor config missing 'url'".into()))
    }

    fn pagination(config: &Value) -> Result<PaginationConfig, PipelineError> {
        let raw = config.get("pagination");
        let strategy = match raw.and_then(|p| p.get("strategy")).and_then(Value::as_str).unwrap_or("none") {
            "none" => PaginationStrategy::None,
            "offset" => PaginationStrategy::Offset,
            "cursor" => PaginationStrategy::Cursor,
            "page" => PaginationStrategy::Page,
            "link-header" => PaginationStrategy::LinkHeader,
            other => {
                return Err(PipelineError::InvalidConfiguration(format!("unknown pagination strategy '{other}'")));
            }
        };

        let max_pages = raw.and_then(|p| p.get("maxPages")).and_then(Value::as_u64).map(|n| n as u32);
        if strategy != PaginationStrategy::None && max_pages.is_none() {
            return Err(PipelineError::InvalidConfiguration(
                "pagination requires a 'maxPages' cap".into(),
            ));
        }

        let data_path = raw
            .and_then(|p| p.get("dataPath"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        let param_names = raw
            .and_then(|p| p.get("paramNames"))
            .and_then(Value::as_object)
            .map(|obj| obj.iter().filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string()))).collect())
            .unwrap_or_default();

        Ok(PaginationConfig { strategy, data_path, max_pages, param_names })
    }

    fn retry_policy(config: &Value) -> RetryPolicy {
        let raw = match config.get("retry") {
            Some(raw) => raw,
            None => return RetryPolicy::default(),
        };
        let default = RetryPolicy::default();
        RetryPolicy {
            max_attempts: raw.get("maxAttempts").and_then(Value::as_u64).map(|n| n as u32).unwrap_or(default.max_attempts),
            initial_delay_ms: raw.get("initialDelayMs").and_then(Value::as_u64).unwrap_or(default.initial_delay_ms),
            max_delay_ms: raw.get("maxDelayMs").and_then(Value::as_u64).unwrap_or(default.max_delay_ms),
            backoff_multiplier: raw.get("backoffMultiplier").and_then(Value::as_f64).unwrap_or(default.backoff_multiplier),
            retryable_status_codes: raw
                .get("retryableStatusCodes")
                .and_then(Value::as_array)
                .map(|a| a.iter().filter_map(|v| v.as_u64().map(|n| n as u16)).collect())
                .unwrap_or(default.retryable_status_codes),
        }
    }

    fn rate_limit(config: &Value) -> RateLimitPolicy {
        let raw = match config.get("rateLimit") {
            Some(raw) => raw,
            None => return RateLimitPolicy::default(),
        };
        let default = RateLimitPolicy::default();
        RateLimitPolicy {
            requests_per_second: raw.get("requestsPerSecond").and_then(Value::as_f64).unwrap_or(default.requests_per_second),
            max_concurrent: raw.get("maxConcurrent").and_then(Value::as_u64).map(|n| n as u32).unwrap_or(default.max_concurrent),
        }
    }

    /// Selects the array of records within a response body at `data_path`
    /// (dot-separated, empty meaning the body itself is the array).
    fn select_records(body: &Value, data_path: &str) -> Result<Vec<Value>, PipelineError> {
        let mut cursor = body;
        if !data_path.is_empty() {
            for segment in data_path.split('.') {
                cursor = cursor.get(segment).ok_or_else(|| {
                    PipelineError::FatalAdapter(format!("response missing data path segment '{segment}' of '{data_path}'"))
                })?;
            }
        }
        cursor
            .as_array()
            .cloned()
            .ok_or_else(|| PipelineError::FatalAdapter(format!("data path '{data_path}' did not select an array")))
    }

    fn page_param(pagination: &PaginationConfig, key: &str, default: &str) -> String {
        pagination.param_names.get(key).cloned().unwrap_or_else(|| default.to_string())
    }

    async fn fetch_with_retry(&self, request: reqwest::RequestBuilder, retry: &RetryPolicy) -> Result<Value, PipelineError> {
        let mut delay_ms = retry.initial_delay_ms;
        let mut last_err = None;

        for attempt in 1..=retry.max_attempts.max(1) {
            let request = request
                .try_clone()
                .ok_or_else(|| PipelineError::InternalError("http request body is not cloneable for retry".into()))?;

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<Value>()
                            .await
                            .map_err(|e| PipelineError::FatalAdapter(format!("decoding response body: {e}")));
                    }
                    if retry.retryable_status_codes.contains(&status.as_u16()) && attempt < retry.max_attempts {
                        last_err = Some(PipelineError::RecoverableIo(format!("http {status} (attempt {attempt})")));
                    } else {
                        return Err(PipelineError::FatalAdapter(format!("http request failed with status {status}")));
                    }
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    last_err = Some(PipelineError::RecoverableIo(format!("http transport error: {e}")));
                }
                Err(e) => return Err(PipelineError::FatalAdapter(format!("http request failed: {e}"))),
            }

            if attempt < retry.max_attempts {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                delay_ms = ((delay_ms as f64) * retry.backoff_multiplier).min(retry.max_delay_ms as f64) as u64;
            }
        }

        Err(last_err.unwrap_or_else(|| PipelineError::FatalAdapter("http request exhausted retries".into())))
    }
}

#[async_trait]
impl DataExtractor for HttpExtractor {
    fn category(&self) -> &'static str {
        "http"
    }

    async fn validate_config(&self, config: &Value) -> Result<(), PipelineError> {
        Self::url(config)?;
        Self::pagination(config)?;
        Ok(())
    }

    async fn next_batch(
        &self,
        ctx: &ExtractorContext,
        config: &Value,
        checkpoint: Option<&Value>,
        batch_size: usize,
    ) -> Result<ExtractBatch, PipelineError> {
        if ctx.cancellation.is_cancelled() {
            return Ok(ExtractBatch { records: Vec::new(), next_checkpoint: checkpoint.cloned(), has_more: false });
        }

        let url = Self::url(config)?;
        let pagination = Self::pagination(config)?;
        let retry = Self::retry_policy(config);
        let rate_limit = Self::rate_limit(config);

        if rate_limit.requests_per_second > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(1.0 / rate_limit.requests_per_second)).await;
        }

        let page = checkpoint.and_then(Value::as_u64).unwrap_or(0);
        let mut request = self.client.get(url);
        if let Some(token) = &ctx.request.auth_token {
            request = request.bearer_auth(token);
        }

        let mut query: HashMap<String, String> = HashMap::new();
        match pagination.strategy {
            PaginationStrategy::None => {}
            PaginationStrategy::Offset => {
                let param = Self::page_param(&pagination, "offset", "offset");
                query.insert(param, (page * batch_size as u64).to_string());
            }
            PaginationStrategy::Page | PaginationStrategy::Cursor | PaginationStrategy::LinkHeader => {
                let param = Self::page_param(&pagination, "page", "page");
                query.insert(param, (page + 1).to_string());
            }
        }
        let limit_param = Self::page_param(&pagination, "limit", "limit");
        query.insert(limit_param, batch_size.to_string());
        request = request.query(&query);

        let body = self.fetch_with_retry(request, &retry).await?;
        let raw_records = Self::select_records(&body, &pagination.data_path)?;

        let records = raw_records
            .into_iter()
            .enumerate()
            .map(|(i, data)| RecordEnvelope::new(data).with_sequence(page * batch_size as u64 + i as u64))
            .collect::<Vec<_>>();

        let reached_max_pages = pagination.max_pages.is_some_and(|max| page + 1 >= max as u64);
        let has_more = pagination.strategy != PaginationStrategy::None
            && !records.is_empty()
            && records.len() == batch_size
            && !reached_max_pages;

        Ok(ExtractBatch {
            records,
            next_checkpoint: has_more.then(|| Value::from(page + 1)),
            has_more,
        })
    }
}
