// /////////////////////////////////////////////////////////////////////////////
// Pipeline Execution Runtime
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Per-record failures persisted to the error journal, and the retry audit
//! trail produced when a failed record is replayed with a payload patch.

use crate::value_objects::{RecordId, RetryAuditId, RunId, StepKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordError {
    pub id: RecordId,
    pub run_id: RunId,
    pub step_key: StepKey,
    pub message: String,
    pub code: Option<String>,
    pub payload: serde_json::Value,
    pub recoverable: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl RecordError {
    pub fn new(run_id: RunId, step_key: StepKey, message: impl Into<String>, payload: serde_json::Value) -> Self {
        let message = message.into();
        let recoverable = classify_recoverable(&message);
        Self {
            id: RecordId::new(),
            run_id,
            step_key,
            message,
            code: None,
            payload,
            recoverable,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = recoverable;
        self
    }
}

/// Classifies a failure message as recoverable per spec §7/§4.3: uncaught
/// errors are recoverable if the message matches `/timeout|connection|temporarily/i`.
pub fn classify_recoverable(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("timeout") || lower.contains("connection") || lower.contains("temporarily")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryAudit {
    pub id: RetryAuditId,
    pub error_id: RecordId,
    pub user_id: Option<String>,
    pub previous_payload: serde_json::Value,
    pub patch: serde_json::Value,
    pub resulting_payload: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl RetryAudit {
    pub fn new(
        error_id: RecordId,
        user_id: Option<String>,
        previous_payload: serde_json::Value,
        patch: serde_json::Value,
        resulting_payload: serde_json::Value,
    ) -> Self {
        Self {
            id: RetryAuditId::new(),
            error_id,
            user_id,
            previous_payload,
            patch,
            resulting_payload,
            created_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_timeout_as_recoverable() {
        assert!(classify_recoverable("Connection timeout while fetching page 3"));
        assert!(classify_recoverable("Service temporarily unavailable"));
        assert!(!classify_recoverable("Invalid URL format"));
    }
}
