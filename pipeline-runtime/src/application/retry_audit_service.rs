// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Retry audit (spec §4.5, §3): on each user-initiated retry of a journaled
//! [`RecordError`] with an optional payload patch, persists an immutable
//! `{errorId, previousPayload, patch, resultingPayload}` record. The patch
//! itself is a JSON merge patch (RFC 7396): a `null` value removes the key,
//! any other value overwrites it, nested objects merge recursively.

use pipeline_runtime_domain::entities::{RecordError, RetryAudit};
use pipeline_runtime_domain::error::PipelineError;
use pipeline_runtime_domain::repositories::ErrorJournalRepository;
use pipeline_runtime_domain::value_objects::RecordId;
use serde_json::Value;
use std::sync::Arc;

/// Applies a JSON merge patch to `base`, per RFC 7396.
pub fn apply_merge_patch(base: &Value, patch: &Value) -> Value {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            let mut merged = base_map.clone();
            for (key, patch_value) in patch_map {
                if patch_value.is_null() {
                    merged.remove(key);
                } else {
                    let existing = merged.get(key).cloned().unwrap_or(Value::Null);
                    merged.insert(key.clone(), apply_merge_patch(&existing, patch_value));
                }
            }
            Value::Object(merged)
        }
        (_, patch_value) => patch_value.clone(),
    }
}

pub struct RetryAuditService {
    error_journal: Arc<dyn ErrorJournalRepository>,
}

impl RetryAuditService {
    pub fn new(error_journal: Arc<dyn ErrorJournalRepository>) -> Self {
        Self { error_journal }
    }

    /// Computes the resulting payload from `error`'s journaled payload and
    /// `patch`, persists the audit record, and returns the resulting
    /// payload for the caller to feed back into a replay.
    pub async fn record_retry(&self, error: &RecordError, patch: Value, user_id: Option<String>) -> Result<Value, PipelineError> {
        let resulting_payload = apply_merge_patch(&error.payload, &patch);
        let audit = RetryAudit::new(error.id.clone(), user_id, error.payload.clone(), patch, resulting_payload.clone());
        self.error_journal.append_retry_audit(audit).await?;
        Ok(resulting_payload)
    }

    pub async fn history(&self, error_id: &RecordId) -> Result<Vec<RetryAudit>, PipelineError> {
        self.error_journal.list_retry_audits(error_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_runtime_domain::value_objects::{RunId, StepKey};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct InMemoryErrorJournal {
        audits: Mutex<Vec<RetryAudit>>,
    }

    #[async_trait::async_trait]
    impl ErrorJournalRepository for InMemoryErrorJournal {
        async fn append(&self, _error: RecordError) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn find_by_id(&self, _id: &RecordId) -> Result<Option<RecordError>, PipelineError> {
            Ok(None)
        }
        async fn list_for_run(&self, _run_id: &RunId) -> Result<Vec<RecordError>, PipelineError> {
            Ok(vec![])
        }
        async fn list_recoverable_for_run(&self, _run_id: &RunId) -> Result<Vec<RecordError>, PipelineError> {
            Ok(vec![])
        }
        async fn append_retry_audit(&self, audit: RetryAudit) -> Result<(), PipelineError> {
            self.audits.lock().await.push(audit);
            Ok(())
        }
        async fn list_retry_audits(&self, error_id: &RecordId) -> Result<Vec<RetryAudit>, PipelineError> {
            Ok(self.audits.lock().await.iter().filter(|a| &a.error_id == error_id).cloned().collect())
        }
    }

    fn error() -> RecordError {
        RecordError::new(RunId::new(), StepKey::new("load-products").unwrap(), "timeout talking to catalog service", serde_json::json!({"sku": "X-1", "price": 10}))
    }

    #[test]
    fn merge_patch_overwrites_and_removes_fields() {
        let base = serde_json::json!({"sku": "X-1", "price": 10, "stale": true});
        let patch = serde_json::json!({"price": 12, "stale": null});
        let merged = apply_merge_patch(&base, &patch);
        assert_eq!(merged, serde_json::json!({"sku": "X-1", "price": 12}));
    }

    #[test]
    fn merge_patch_merges_nested_objects_recursively() {
        let base = serde_json::json!({"address": {"city": "Springfield", "zip": "00000"}});
        let patch = serde_json::json!({"address": {"zip": "11111"}});
        let merged = apply_merge_patch(&base, &patch);
        assert_eq!(merged, serde_json::json!({"address": {"city": "Springfield", "zip": "11111"}}));
    }

    #[tokio::test]
    async fn record_retry_persists_an_audit_and_returns_the_resulting_payload() {
        let journal = Arc::new(InMemoryErrorJournal::default());
        let service = RetryAuditService::new(journal.clone());
        let err = error();

        let resulting = service.record_retry(&err, serde_json::json!({"price": 11}), Some("alice".into())).await.unwrap();
        assert_eq!(resulting, serde_json::json!({"sku": "X-1", "price": 11}));

        let history = service.history(&err.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user_id.as_deref(), Some("alice"));
    }
}
