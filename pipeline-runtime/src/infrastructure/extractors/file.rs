// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Local-file batch extractor (spec §4.4): reads an entire NDJSON or JSON
//! array file once, then serves it back in `batch_size` slices, tracking
//! position via an index checkpoint. No pagination or retries needed since
//! the whole source is already resident once the file is read.

use async_trait::async_trait;
use pipeline_runtime_domain::entities::RecordEnvelope;
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::services::data_extractor::{DataExtractor, ExtractBatch, ExtractorContext};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum FileFormat {
    Ndjson,
    JsonArray,
}

pub struct FileExtractor;

impl Default for FileExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FileExtractor {
    pub fn new() -> Self {
        Self
    }

    fn path(config: &Value) -> Result<&str, PipelineError> {
        config
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| PipelineError::InvalidConfiguration("file extractor config missing 'path'".into()))
    }

    fn format(config: &Value) -> Result<FileFormat, PipelineError> {
        match config.get("format").and_then(Value::as_str).unwrap_or("ndjson") {
            "ndjson" => Ok(FileFormat::Ndjson),
            "json_array" => Ok(FileFormat::JsonArray),
            other => Err(PipelineError::InvalidConfiguration(format!("unknown file extractor format '{other}'"))),
        }
    }

    async fn load_records(path: &str, format: FileFormat) -> Result<Vec<Value>, PipelineError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PipelineError::FatalAdapter(format!("reading extractor source file '{path}': {e}")))?;

        match format {
            FileFormat::Ndjson => contents
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| {
                    serde_json::from_str(line)
                        .map_err(|e| PipelineError::FatalAdapter(format!("parsing ndjson line in '{path}': {e}")))
                })
                .collect(),
            FileFormat::JsonArray => {
                let value: Value = serde_json::from_str(&contents)
                    .map_err(|e| PipelineError::FatalAdapter(format!("parsing json array in '{path}': {e}")))?;
                value
                    .as_array()
                    .cloned()
                    .ok_or_else(|| PipelineError::FatalAdapter(format!("'{path}' does not contain a top-level JSON array")))
            }
        }
    }
}

#[async_trait]
impl DataExtractor for FileExtractor {
    fn category(&self) -> &'static str {
        "file"
    }

    async fn validate_config(&self, config: &Value) -> Result<(), PipelineError> {
        Self::path(config)?;
        Self::format(config)?;
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

        let path = Self::path(config)?;
        let format = Self::format(config)?;
        let offset = checkpoint.and_then(Value::as_u64).unwrap_or(0) as usize;

        let all_records = Self::load_records(path, format).await?;
        let end = (offset + batch_size).min(all_records.len());
        let records = all_records[offset..end]
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, data)| RecordEnvelope::new(data).with_sequence((offset + i) as u64))
            .collect::<Vec<_>>();

        let has_more = end < all_records.len();

        Ok(ExtractBatch {
            records,
            next_checkpoint: has_more.then(|| Value::from(end as u64)),
            has_more,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_runtime_domain::services::cancellation::NeverCancelled;
    use pipeline_runtime_domain::services::request_context::RequestContext;
    use pipeline_runtime_domain::value_objects::{PipelineId, RunId, StepKey};
    use std::io::Write;
    use std::sync::Arc;

    fn ctx() -> ExtractorContext {
        ExtractorContext {
            request: RequestContext::default(),
            pipeline_id: PipelineId::new(),
            run_id: RunId::new(),
            step_key: StepKey::new("extract-products").unwrap(),
            cancellation: Arc::new(NeverCancelled),
        }
    }

    #[tokio::test]
    async fn ndjson_is_served_in_batches_with_a_resumable_checkpoint() {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        writeln!(temp, r#"{{"sku":"A"}}"#).unwrap();
        writeln!(temp, r#"{{"sku":"B"}}"#).unwrap();
        writeln!(temp, r#"{{"sku":"C"}}"#).unwrap();
        temp.flush().unwrap();

        let config = serde_json::json!({"path": temp.path(), "format": "ndjson"});
        let extractor = FileExtractor::new();
        let ctx = ctx();

        let first = extractor.next_batch(&ctx, &config, None, 2).await.unwrap();
        assert_eq!(first.records.len(), 2);
        assert!(first.has_more);

        let second = extractor.next_batch(&ctx, &config, first.next_checkpoint.as_ref(), 2).await.unwrap();
        assert_eq!(second.records.len(), 1);
        assert!(!second.has_more);
        assert!(second.next_checkpoint.is_none());
    }

    #[tokio::test]
    async fn json_array_format_is_parsed_in_one_shot() {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        write!(temp, r#"[{{"sku":"A"}},{{"sku":"B"}}]"#).unwrap();
        temp.flush().unwrap();

        let config = serde_json::json!({"path": temp.path(), "format": "json_array"});
        let extractor = FileExtractor::new();
        let batch = extractor.next_batch(&ctx(), &config, None, 10).await.unwrap();
        assert_eq!(batch.records.len(), 2);
        assert!(!batch.has_more);
    }

    #[tokio::test]
    async fn rejects_unreadable_path() {
        let config = serde_json::json!({"path": "/does/not/exist.ndjson"});
        let extractor = FileExtractor::new();
        let result = extractor.next_batch(&ctx(), &config, None, 10).await;
        assert!(result.is_err());
    }
}
